//! Sanity checks on the blurred occlusion target.

#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn occlusion_stays_bounded_and_spares_the_background() {
    use cgmath::Deg;
    use voxcraft::camera::Camera;
    use voxcraft::data_structures::mesh::{Mesh, MeshData};
    use voxcraft::data_structures::texture::{Texture, TextureSlot};
    use voxcraft::data_structures::world::{Chunk, World};
    use voxcraft::light::Light;
    use voxcraft::renderer::Renderer;
    use voxcraft::resources::texture_util::TextureUtilRegistry;

    use common::{acquire_gpu, as_f32, output_texture, read_texture};

    const SIZE: u32 = 256;

    let gpu = acquire_gpu().expect("gpu unavailable");
    let mut registry = TextureUtilRegistry::new();
    let id = registry.register(&gpu.device);

    let mut camera = Camera::new((0.0, 3.0, 6.0), Deg(-90.0), Deg(-25.0));
    camera.aspect = 1.0;
    let light = Light::spot((8.0, 10.0, 8.0), (-1.0, -1.25, -1.0));
    let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
        16,
        16,
        image::Rgba([200, 200, 200, 255]),
    ));
    let atlas = TextureSlot::Ready(
        Texture::from_image(&gpu.device, &gpu.queue, registry.get(id), &img, "test atlas")
            .unwrap(),
    );

    // A floor slab with one cube on top, so the frame contains flat faces,
    // concave corners and open sky.
    let data = MeshData::unit_cube();
    let mut world = World::default();
    for x in -2..=2 {
        for z in -2..=2 {
            world.children.push(Chunk {
                active: true,
                mesh: Some(Mesh::new(&gpu.device, &data, "floor cube")),
                world_transform: cgmath::Matrix4::from_translation(cgmath::vec3(
                    x as f32, 0.0, z as f32,
                )),
            });
        }
    }
    world.children.push(Chunk {
        active: true,
        mesh: Some(Mesh::new(&gpu.device, &data, "top cube")),
        world_transform: cgmath::Matrix4::from_translation(cgmath::vec3(0.0, 1.0, 0.0)),
    });

    let mut renderer = Renderer::new(
        &gpu.device,
        &gpu.queue,
        registry.get(id),
        wgpu::TextureFormat::Rgba8Unorm,
        SIZE,
        SIZE,
        &camera,
    );
    let output = output_texture(&gpu.device, SIZE, SIZE, wgpu::TextureFormat::Rgba8Unorm);
    let view = output.create_view(&wgpu::TextureViewDescriptor::default());
    renderer.render(&camera, &light, &atlas, &world, &view);

    let blurred = &renderer.ssao.targets().expect("ssao targets exist").blurred;
    let bytes = read_texture(&gpu, &blurred.texture, SIZE, SIZE, 4).unwrap();
    let values = as_f32(&bytes);
    assert_eq!(values.len(), (SIZE * SIZE) as usize);

    for value in &values {
        assert!((0.0..=1.0).contains(value), "occlusion {value} out of range");
    }
    // Top corner is open sky in this framing: full visibility.
    let corner = values[(4 * SIZE + 4) as usize];
    assert_eq!(corner, 1.0);
    // Concave corners around the stacked cube must darken at least a little.
    let min = values.iter().cloned().fold(f32::INFINITY, f32::min);
    assert!(min < 0.999, "expected some occlusion, min was {min}");
}
