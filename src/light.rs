//! Light parameters for the forward pass.
//!
//! A [`Light`] is plain shared data (colour, intensity, transform) plus a
//! [`LightKind`] tag carrying the kind-specific projection parameters. The
//! projection is computed by a pure match on the tag instead of an override
//! hierarchy, so adding a kind is a data change.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, ortho, perspective};

use crate::camera::OPENGL_TO_WGPU_MATRIX;

/// Kind-specific projection parameters.
#[derive(Clone, Copy, Debug)]
pub enum LightKind {
    /// Orthographic, `size` is the half-extent of the projection box.
    Directional { size: f32, near: f32, far: f32 },
    /// Perspective cone.
    Spot { fovy: Rad<f32>, near: f32, far: f32 },
}

#[derive(Clone, Debug)]
pub struct Light {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: Point3<f32>,
    pub direction: Vector3<f32>,
    pub kind: LightKind,
}

impl Light {
    pub fn spot<P: Into<Point3<f32>>, D: Into<Vector3<f32>>>(position: P, direction: D) -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 0.8,
            position: position.into(),
            direction: direction.into().normalize(),
            kind: LightKind::Spot {
                fovy: Rad(std::f32::consts::FRAC_PI_3),
                near: 0.1,
                far: 200.0,
            },
        }
    }

    pub fn directional<P: Into<Point3<f32>>, D: Into<Vector3<f32>>>(
        position: P,
        direction: D,
    ) -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 0.8,
            position: position.into(),
            direction: direction.into().normalize(),
            kind: LightKind::Directional {
                size: 50.0,
                near: -100.0,
                far: 100.0,
            },
        }
    }

    pub fn world_position(&self) -> Point3<f32> {
        self.position
    }

    pub fn world_forward(&self) -> Vector3<f32> {
        self.direction
    }

    pub fn view(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.direction, Vector3::unit_y())
    }

    pub fn projection(&self) -> Matrix4<f32> {
        let projection = match self.kind {
            LightKind::Directional { size, near, far } => {
                ortho(-size, size, -size, size, near, far)
            }
            LightKind::Spot { fovy, near, far } => perspective(fovy, 1.0, near, far),
        };
        OPENGL_TO_WGPU_MATRIX * projection
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection() * self.view()
    }

    /// Colour pre-multiplied by intensity, as uploaded to the light uniform.
    pub fn scaled_color(&self) -> [f32; 4] {
        [
            self.color[0] * self.intensity,
            self.color[1] * self.intensity,
            self.color[2] * self.intensity,
            1.0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_color_multiplies_intensity() {
        let mut light = Light::spot((0.0, 10.0, 0.0), (0.0, -1.0, 0.0));
        light.color = [1.0, 0.5, 0.25];
        light.intensity = 2.0;
        assert_eq!(light.scaled_color(), [2.0, 1.0, 0.5, 1.0]);
    }

    #[test]
    fn directional_projection_is_orthographic() {
        let light = Light::directional((0.0, 50.0, 0.0), (0.0, -1.0, 0.0));
        let p = light.projection();
        // Orthographic projections keep w untouched.
        let v = p * cgmath::Vector4::new(1.0, 2.0, -3.0, 1.0);
        assert!((v.w - 1.0).abs() < 1e-6);
    }

    #[test]
    fn spot_projection_divides_by_depth() {
        let light = Light::spot((0.0, 0.0, 0.0), (0.0, 0.0, -1.0));
        let v = light.projection() * cgmath::Vector4::new(0.0, 0.0, -5.0, 1.0);
        assert!((v.w - 5.0).abs() < 1e-4);
    }
}
