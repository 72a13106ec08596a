//! Camera type and view/projection math.
//!
//! The renderer only consumes matrices and world-space accessors from the
//! camera; movement and input handling live with the host application.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};

/// wgpu clip space spans z in [0, 1] while cgmath produces OpenGL-style
/// [-1, 1], so every projection gets corrected with this matrix.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// A perspective camera described by position and orientation angles.
///
/// `aspect` is settable by the host (it follows the surface dimensions);
/// everything else is plain data. Matrices are recomputed on demand — the
/// renderer uploads them once per frame anyway.
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>, Y: Into<Rad<f32>>, T: Into<Rad<f32>>>(
        position: P,
        yaw: Y,
        pitch: T,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
            aspect: 1.0,
            fovy: Rad(std::f32::consts::FRAC_PI_4),
            znear: 0.1,
            zfar: 500.0,
        }
    }

    /// Unit vector the camera is looking along.
    pub fn world_forward(&self) -> Vector3<f32> {
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize()
    }

    pub fn world_position(&self) -> Point3<f32> {
        self.position
    }

    /// World-to-view matrix.
    pub fn view(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.world_forward(), Vector3::unit_y())
    }

    pub fn projection(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection() * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Transform};

    #[test]
    fn forward_matches_yaw_pitch() {
        let camera = Camera::new((0.0, 0.0, 0.0), Deg(-90.0), Deg(0.0));
        let forward = camera.world_forward();
        assert!(forward.x.abs() < 1e-6);
        assert!((forward.z + 1.0).abs() < 1e-6);
    }

    #[test]
    fn view_moves_world_opposite_to_camera() {
        let camera = Camera::new((0.0, 0.0, 5.0), Deg(-90.0), Deg(0.0));
        let origin = camera.view().transform_point(Point3::new(0.0, 0.0, 0.0));
        // A point 5 units in front of the camera sits at view-space z = -5.
        assert!((origin.z + 5.0).abs() < 1e-5);
    }

    #[test]
    fn projection_maps_near_plane_to_zero_depth() {
        let mut camera = Camera::new((0.0, 0.0, 0.0), Deg(-90.0), Deg(0.0));
        camera.aspect = 1.0;
        let clip = camera.projection() * cgmath::Vector4::new(0.0, 0.0, -camera.znear, 1.0);
        assert!((clip.z / clip.w).abs() < 1e-5);
    }
}
