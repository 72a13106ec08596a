//! Windowed application driving the renderer.
//!
//! The event loop owns the graphics context and renderer behind a user-event
//! handshake: both the context and the texture atlas are created
//! asynchronously and delivered back through the [`EventLoopProxy`], which
//! keeps native and wasm startup on the same code path.

use std::sync::Arc;

use anyhow::Result;
use cgmath::{Deg, InnerSpace};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::{Window, WindowId};

use crate::camera::Camera;
use crate::context::Context;
use crate::data_structures::mesh::{Mesh, MeshData};
use crate::data_structures::texture::{Texture, TextureSlot};
use crate::data_structures::world::{Chunk, World};
use crate::light::Light;
use crate::renderer::Renderer;
use crate::resources;

const ATLAS_FILE: &str = "atlas.png";

pub enum AppEvent {
    Context(Context),
    Atlas(Texture),
}

struct State {
    context: Context,
    renderer: Renderer,
    camera: Camera,
    light: Light,
    world: World,
    light_angle: f32,
    last_frame: instant::Instant,
}

pub struct App {
    proxy: EventLoopProxy<AppEvent>,
    #[cfg(not(target_arch = "wasm32"))]
    runtime: tokio::runtime::Runtime,
    window: Option<Arc<Window>>,
    state: Option<State>,
}

impl App {
    fn new(
        proxy: EventLoopProxy<AppEvent>,
        #[cfg(not(target_arch = "wasm32"))] runtime: tokio::runtime::Runtime,
    ) -> Self {
        Self {
            proxy,
            #[cfg(not(target_arch = "wasm32"))]
            runtime,
            window: None,
            state: None,
        }
    }

    fn redraw(&mut self) {
        let (Some(window), Some(state)) = (self.window.as_ref(), self.state.as_mut()) else {
            return;
        };

        let now = instant::Instant::now();
        let dt = now.duration_since(state.last_frame).as_secs_f32();
        state.last_frame = now;
        state.light_angle += dt * 0.3;
        let (sin, cos) = state.light_angle.sin_cos();
        state.light.position = cgmath::point3(12.0 * cos, 14.0, 12.0 * sin);
        state.light.direction =
            (cgmath::point3(0.0, 0.0, 0.0) - state.light.position).normalize();

        let frame = match state.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                state.context.resize(state.context.size);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("surface out of memory");
                return;
            }
            Err(error) => {
                log::warn!("surface frame unavailable: {error}");
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        state.renderer.render(
            &state.camera,
            &state.light,
            &state.context.atlas,
            &state.world,
            &view,
        );
        frame.present();
        window.request_redraw();
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attributes = Window::default_attributes().with_title("voxcraft");
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(error) => {
                log::error!("window creation failed: {error}");
                event_loop.exit();
                return;
            }
        };

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowExtWebSys;
            let _ = web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.body())
                .zip(window.canvas())
                .map(|(body, canvas)| body.append_child(&canvas));
        }

        self.window = Some(window.clone());

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.runtime.block_on(Context::new(window)) {
                Ok(context) => {
                    let _ = self.proxy.send_event(AppEvent::Context(context));
                }
                Err(error) => {
                    log::error!("context creation failed: {error:?}");
                    event_loop.exit();
                }
            }
        }
        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match Context::new(window).await {
                    Ok(context) => {
                        let _ = proxy.send_event(AppEvent::Context(context));
                    }
                    Err(error) => log::error!("context creation failed: {error:?}"),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Context(context) => {
                let size = context.size;
                let mut camera = Camera::new((8.0, 6.0, 12.0), Deg(-120.0), Deg(-20.0));
                camera.aspect = size.width.max(1) as f32 / size.height.max(1) as f32;
                let mut light = Light::spot((12.0, 14.0, 0.0), (-12.0, -14.0, 0.0));
                light.color = [1.0, 0.95, 0.8];
                let world = demo_world(&context.device);
                let renderer = Renderer::new(
                    &context.device,
                    &context.queue,
                    context.texture_util(),
                    context.config.format,
                    size.width,
                    size.height,
                    &camera,
                );

                #[cfg(not(target_arch = "wasm32"))]
                {
                    let loaded = self.runtime.block_on(resources::load_texture_atlas(
                        ATLAS_FILE,
                        &context.device,
                        &context.queue,
                        context.texture_util(),
                    ));
                    match loaded {
                        Ok(atlas) => {
                            let _ = self.proxy.send_event(AppEvent::Atlas(atlas));
                        }
                        Err(error) => log::error!("atlas load failed: {error:?}"),
                    }
                }
                #[cfg(target_arch = "wasm32")]
                {
                    let proxy = self.proxy.clone();
                    let device = context.device.clone();
                    let queue = context.queue.clone();
                    let util = context.texture_util().clone();
                    wasm_bindgen_futures::spawn_local(async move {
                        match resources::load_texture_atlas(ATLAS_FILE, &device, &queue, &util)
                            .await
                        {
                            Ok(atlas) => {
                                let _ = proxy.send_event(AppEvent::Atlas(atlas));
                            }
                            Err(error) => log::error!("atlas load failed: {error:?}"),
                        }
                    });
                }

                self.state = Some(State {
                    context,
                    renderer,
                    camera,
                    light,
                    world,
                    light_angle: 0.0,
                    last_frame: instant::Instant::now(),
                });
                if let Some(window) = self.window.as_ref() {
                    window.request_redraw();
                }
            }
            AppEvent::Atlas(atlas) => {
                log::info!("atlas ready, enabling geometry draws");
                if let Some(state) = self.state.as_mut() {
                    state.context.atlas = TextureSlot::Ready(atlas);
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(state) = self.state.as_mut() {
                    state.context.resize(size);
                    state.camera.aspect = size.width.max(1) as f32 / size.height.max(1) as f32;
                    state.renderer.resize(size.width, size.height, &state.camera);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

/// A small fixed scene: a ground slab of cubes with a few stacks on top.
fn demo_world(device: &wgpu::Device) -> World {
    let cube = MeshData::unit_cube();
    let mut world = World::default();
    for x in -4..=4 {
        for z in -4..=4 {
            world.children.push(chunk_at(device, &cube, x, 0, z));
        }
    }
    for y in 1..=3 {
        world.children.push(chunk_at(device, &cube, 0, y, 0));
        world.children.push(chunk_at(device, &cube, 2, y, -1));
    }
    world.children.push(chunk_at(device, &cube, -3, 1, 2));
    world
}

fn chunk_at(device: &wgpu::Device, cube: &MeshData, x: i32, y: i32, z: i32) -> Chunk {
    Chunk {
        active: true,
        mesh: Some(Mesh::new(
            device,
            cube,
            &format!("Chunk {x},{y},{z}"),
        )),
        world_transform: cgmath::Matrix4::from_translation(cgmath::vec3(
            x as f32, y as f32, z as f32,
        )),
    }
}

/// Initialize logging and run the event loop until the window closes.
pub fn run() -> Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    #[cfg(target_arch = "wasm32")]
    console_log::init_with_level(log::Level::Info).map_err(|e| anyhow::anyhow!("{e}"))?;

    let event_loop = EventLoop::<AppEvent>::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let proxy = event_loop.create_proxy();
    #[cfg(not(target_arch = "wasm32"))]
    let mut app = App::new(proxy, tokio::runtime::Runtime::new()?);
    #[cfg(target_arch = "wasm32")]
    let mut app = App::new(proxy);
    event_loop.run_app(&mut app)?;
    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    if let Err(error) = run() {
        log::error!("fatal: {error:?}");
    }
}
