//! End-to-end frames rendered without a window.

#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
mod offscreen {
    use cgmath::Deg;
    use voxcraft::camera::Camera;
    use voxcraft::data_structures::mesh::{Mesh, MeshData};
    use voxcraft::data_structures::texture::{Texture, TextureSlot};
    use voxcraft::data_structures::world::{Chunk, World};
    use voxcraft::light::Light;
    use voxcraft::renderer::Renderer;
    use voxcraft::resources::texture_util::TextureUtilRegistry;

    use crate::common::{Gpu, acquire_gpu, output_texture, read_texture};

    pub const SIZE: u32 = 256;
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub struct Scene {
        pub gpu: Gpu,
        pub renderer: Renderer,
        pub camera: Camera,
        pub light: Light,
        pub atlas: TextureSlot,
    }

    pub fn scene() -> anyhow::Result<Scene> {
        let gpu = acquire_gpu()?;
        let mut registry = TextureUtilRegistry::new();
        let id = registry.register(&gpu.device);

        let mut camera = Camera::new((0.0, 2.5, 6.0), Deg(-90.0), Deg(-15.0));
        camera.aspect = 1.0;
        let light = Light::spot((8.0, 10.0, 8.0), (-1.0, -1.25, -1.0));

        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            64,
            64,
            image::Rgba([180, 180, 180, 255]),
        ));
        let atlas = TextureSlot::Ready(Texture::from_image(
            &gpu.device,
            &gpu.queue,
            registry.get(id),
            &img,
            "test atlas",
        )?);

        let renderer = Renderer::new(
            &gpu.device,
            &gpu.queue,
            registry.get(id),
            FORMAT,
            SIZE,
            SIZE,
            &camera,
        );
        Ok(Scene {
            gpu,
            renderer,
            camera,
            light,
            atlas,
        })
    }

    pub fn cube_world(device: &wgpu::Device, positions: &[(i32, i32, i32)]) -> World {
        let data = MeshData::unit_cube();
        let mut world = World::default();
        for (x, y, z) in positions {
            world.children.push(Chunk {
                active: true,
                mesh: Some(Mesh::new(device, &data, "test cube")),
                world_transform: cgmath::Matrix4::from_translation(cgmath::vec3(
                    *x as f32, *y as f32, *z as f32,
                )),
            });
        }
        world
    }

    pub fn render_rgba(scene: &mut Scene, world: &World, size: u32) -> anyhow::Result<Vec<u8>> {
        let output = output_texture(&scene.gpu.device, size, size, FORMAT);
        let view = output.create_view(&wgpu::TextureViewDescriptor::default());
        scene
            .renderer
            .render(&scene.camera, &scene.light, &scene.atlas, world, &view);
        read_texture(&scene.gpu, &output, size, size, 4)
    }

    pub fn pixel(frame: &[u8], size: u32, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * size + x) * 4) as usize;
        frame[offset..offset + 4].try_into().unwrap()
    }
}

#[test]
#[cfg(feature = "integration-tests")]
fn empty_world_renders_sky_gradient() {
    use offscreen::*;

    let mut scene = scene().expect("gpu unavailable");
    let frame = render_rgba(&mut scene, &Default::default(), SIZE).unwrap();

    for chunk in frame.chunks_exact(4) {
        assert_eq!(chunk[3], 255);
    }
    let top = pixel(&frame, SIZE, SIZE / 2, 4);
    let bottom = pixel(&frame, SIZE, SIZE / 2, SIZE - 4);
    assert_ne!(top, bottom, "sky should grade from zenith to horizon");
    // Both ends of the gradient stay blue-dominant.
    assert!(top[2] > top[0]);
    assert!(bottom[2] > bottom[0]);
}

#[test]
#[cfg(feature = "integration-tests")]
fn geometry_changes_the_frame_centre_but_not_the_sky() {
    use offscreen::*;

    let mut scene = scene().expect("gpu unavailable");
    let empty = render_rgba(&mut scene, &Default::default(), SIZE).unwrap();
    let world = cube_world(&scene.gpu.device, &[(0, 0, 0), (1, 0, 0), (0, 1, 0)]);
    let with_cubes = render_rgba(&mut scene, &world, SIZE).unwrap();

    assert_ne!(
        pixel(&empty, SIZE, SIZE / 2, SIZE / 2),
        pixel(&with_cubes, SIZE, SIZE / 2, SIZE / 2),
        "cubes should cover the frame centre"
    );
    assert_eq!(
        pixel(&empty, SIZE, 4, 4),
        pixel(&with_cubes, SIZE, 4, 4),
        "the sky corner should be untouched by geometry"
    );
}

#[test]
#[cfg(feature = "integration-tests")]
fn model_pool_grows_monotonically() {
    use offscreen::*;

    let mut scene = scene().expect("gpu unavailable");

    let three = cube_world(&scene.gpu.device, &[(0, 0, 0), (1, 0, 0), (2, 0, 0)]);
    render_rgba(&mut scene, &three, SIZE).unwrap();
    assert_eq!(scene.renderer.render_data.pool_len(), 3);

    // Fewer chunks reuse the pool without shrinking it.
    let one = cube_world(&scene.gpu.device, &[(0, 0, 0)]);
    render_rgba(&mut scene, &one, SIZE).unwrap();
    assert_eq!(scene.renderer.render_data.pool_len(), 3);

    let five = cube_world(
        &scene.gpu.device,
        &[(0, 0, 0), (1, 0, 0), (2, 0, 0), (0, 1, 0), (1, 1, 0)],
    );
    render_rgba(&mut scene, &five, SIZE).unwrap();
    assert_eq!(scene.renderer.render_data.pool_len(), 5);
}

#[test]
#[cfg(feature = "integration-tests")]
fn unmeshed_and_inactive_chunks_get_no_slot() {
    use offscreen::*;
    use voxcraft::data_structures::world::Chunk;

    let mut scene = scene().expect("gpu unavailable");
    let mut world = cube_world(&scene.gpu.device, &[(0, 0, 0), (1, 0, 0)]);
    world.children.insert(1, Chunk::default());
    world.children[0].active = false;

    render_rgba(&mut scene, &world, SIZE).unwrap();
    // One renderable chunk survives: the meshed active cube at (1, 0, 0).
    assert_eq!(scene.renderer.render_data.pool_len(), 1);
}

#[test]
#[cfg(feature = "integration-tests")]
fn renderer_survives_resizes_between_frames() {
    use offscreen::*;

    let mut scene = scene().expect("gpu unavailable");
    let world = cube_world(&scene.gpu.device, &[(0, 0, 0)]);
    render_rgba(&mut scene, &world, SIZE).unwrap();

    let camera = scene.camera.clone();
    scene.renderer.resize(128, 128, &camera);
    assert_eq!(scene.renderer.size(), (128, 128));
    // Every pass target follows the new size.
    let gbuffer = scene.renderer.gbuffer.targets().unwrap();
    assert_eq!((gbuffer.color.width(), gbuffer.color.height()), (128, 128));
    assert_eq!((gbuffer.depth.width(), gbuffer.depth.height()), (128, 128));
    let ssao = scene.renderer.ssao.targets().unwrap();
    assert_eq!((ssao.blurred.width(), ssao.blurred.height()), (128, 128));
    let forward = scene.renderer.forward.targets().unwrap();
    assert_eq!((forward.output.width(), forward.output.height()), (128, 128));
    let small = render_rgba(&mut scene, &world, 128).unwrap();
    assert_eq!(small.len(), 128 * 128 * 4);

    // Zero dimensions are clamped, never configured.
    scene.renderer.resize(0, 0, &camera);
    assert_eq!(scene.renderer.size(), (1, 1));

    scene.renderer.resize(SIZE, SIZE, &camera);
    let frame = render_rgba(&mut scene, &world, SIZE).unwrap();
    assert_eq!(frame.len(), (SIZE * SIZE * 4) as usize);
    for chunk in frame.chunks_exact(4) {
        assert_eq!(chunk[3], 255);
    }
}
