//! Flow control and application event loop.
//!
//! A "flow" is a self-contained slice of the scene that handles input,
//! updates its state and draws itself each frame. The gallery and the rain
//! field are the two flows; the engine loop owns the window, distributes
//! events, drives per-frame updates and composes the render pass.
//!
//! Each redraw runs in a fixed order:
//! 1. advance the camera controller's damping state
//! 2. call `on_update` on every flow (idle motion, tweens, particles)
//! 3. apply deferred context mutations returned as [`Out::Configure`]
//! 4. upload the camera uniform and render all flows in one pass
//!
//! Pointer events are handled synchronously between redraws and only ever
//! mutate interaction state or schedule tweens, so there is nothing for a
//! frame to race against.

use std::{iter, pin::Pin, sync::Arc};

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    context::{Context, InitContext, MouseButtonState},
    data_structures::texture::Texture,
};

/// Why acquiring the next surface frame failed, restricted to the cases the
/// event loop reacts to. Mirrors the old `wgpu::SurfaceError` split that
/// wgpu now expresses as the `CurrentSurfaceTexture` enum.
enum FrameError {
    /// Surface lost or outdated; reconfigure and retry on the next frame.
    Reconfigure,
    /// Any other non-success acquisition status; logged and skipped.
    Other(&'static str),
}

/// Output of a flow's per-frame update.
///
/// `Configure` defers a context mutation (such as the background tint)
/// until after every flow has updated; `Empty` is the default when a flow
/// has nothing to change.
pub enum Out {
    Configure(Box<dyn FnOnce(&mut Context)>),
    Empty,
}

impl Default for Out {
    fn default() -> Self {
        Self::Empty
    }
}

/// Trait for a renderable scene slice.
///
/// # Lifecycle
///
/// 1. `on_init()` runs once after GPU setup; the only place to configure
///    the context (camera start, clear colour)
/// 2. `on_window_events()` runs for every winit window event
/// 3. `on_update()` runs every frame with the elapsed time
/// 4. `on_render()` runs every frame inside the shared render pass
pub trait GraphicsFlow<S> {
    fn on_init(&mut self, ctx: &mut Context, state: &mut S);

    fn on_window_events(&mut self, ctx: &Context, state: &mut S, event: &WindowEvent);

    fn on_update(&mut self, ctx: &Context, state: &mut S, dt: Duration) -> Out;

    fn on_render(&self, ctx: &Context, render_pass: &mut wgpu::RenderPass<'_>);
}

/// A flow factory: takes the init context and asynchronously builds the
/// flow, loading whatever resources it needs.
pub type FlowConstructor<S> = Box<
    dyn FnOnce(
        InitContext,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Box<dyn GraphicsFlow<S>>>>>>,
>;

/// GPU context, app state, and surface status bundled together.
struct AppState<S> {
    ctx: Context,
    state: S,
    is_surface_configured: bool,
}

impl<S> AppState<S> {
    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(width, height);
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture =
                Texture::create_depth_texture(&self.ctx.device, [width, height], "depth_texture");
        }
    }

    fn render(&mut self, flows: &[Box<dyn GraphicsFlow<S>>]) -> Result<(), FrameError> {
        // Keep the redraw loop running.
        self.ctx.window.request_redraw();

        if !self.is_surface_configured {
            return Ok(());
        }

        let output = match self.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(output)
            | wgpu::CurrentSurfaceTexture::Suboptimal(output) => output,
            wgpu::CurrentSurfaceTexture::Lost | wgpu::CurrentSurfaceTexture::Outdated => {
                return Err(FrameError::Reconfigure);
            }
            wgpu::CurrentSurfaceTexture::Timeout => return Err(FrameError::Other("timeout")),
            wgpu::CurrentSurfaceTexture::Occluded => return Err(FrameError::Other("occluded")),
            wgpu::CurrentSurfaceTexture::Validation => return Err(FrameError::Other("validation")),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            for flow in flows {
                flow.on_render(&self.ctx, &mut render_pass);
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub struct App<S: 'static> {
    async_runtime: tokio::runtime::Runtime,
    state: Option<AppState<S>>,
    graphics_flows: Vec<Box<dyn GraphicsFlow<S>>>,
    // Constructors are held until the window exists, then taken.
    constructors: Option<Vec<FlowConstructor<S>>>,
    last_time: Instant,
}

impl<S: 'static> App<S> {
    fn new(constructors: Vec<FlowConstructor<S>>) -> anyhow::Result<Self> {
        Ok(Self {
            async_runtime: tokio::runtime::Runtime::new()?,
            state: None,
            graphics_flows: Vec::new(),
            constructors: Some(constructors),
            last_time: Instant::now(),
        })
    }
}

impl<S: 'static + Default> ApplicationHandler for App<S> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window_attributes = Window::default_attributes().with_title("vitrine");
        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        let Some(constructors) = self.constructors.take() else {
            return;
        };

        let init_future = async move {
            let ctx = Context::new(window).await?;
            let init: InitContext = (&ctx).into();
            let flow_futures: Vec<_> = constructors
                .into_iter()
                .map(|constructor| constructor(init.clone()))
                .collect();
            let flows = futures::future::join_all(flow_futures)
                .await
                .into_iter()
                .collect::<anyhow::Result<Vec<_>>>()?;
            anyhow::Ok((ctx, flows))
        };

        let (ctx, flows) = match self.async_runtime.block_on(init_future) {
            Ok(initialized) => initialized,
            Err(e) => panic!("App initialization failed: {}", e),
        };

        let mut app_state = AppState {
            ctx,
            state: S::default(),
            is_surface_configured: false,
        };
        self.graphics_flows = flows;
        for flow in self.graphics_flows.iter_mut() {
            flow.on_init(&mut app_state.ctx, &mut app_state.state);
        }

        let size = app_state.ctx.window.inner_size();
        app_state.resize(size.width, size.height);
        app_state.ctx.window.request_redraw();
        self.state = Some(app_state);
        self.last_time = Instant::now();
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if let MouseButtonState::Right = state.ctx.mouse.pressed {
                state.ctx.camera.controller.handle_mouse(dx, dy);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.ctx.camera.controller.handle_window_events(&event);

        // Clicks carry no position, so track the cursor as it moves.
        if let WindowEvent::CursorMoved { position, .. } = event {
            state.ctx.mouse.coords = position;
        }

        for flow in self.graphics_flows.iter_mut() {
            flow.on_window_events(&state.ctx, &mut state.state, &event);
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                state.ctx.mouse.pressed = match (button, button_state.is_pressed()) {
                    (MouseButton::Left, true) => MouseButtonState::Left,
                    (MouseButton::Right, true) => MouseButtonState::Right,
                    _ => MouseButtonState::None,
                };
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                state
                    .ctx
                    .camera
                    .controller
                    .update(&mut state.ctx.camera.camera, dt);

                let mut outs = Vec::with_capacity(self.graphics_flows.len());
                for flow in self.graphics_flows.iter_mut() {
                    outs.push(flow.on_update(&state.ctx, &mut state.state, dt));
                }
                for out in outs {
                    if let Out::Configure(configure) = out {
                        configure(&mut state.ctx);
                    }
                }

                state
                    .ctx
                    .camera
                    .uniform
                    .update_view_proj(&state.ctx.camera.camera, &state.ctx.projection);
                state.ctx.queue.write_buffer(
                    &state.ctx.camera.buffer,
                    0,
                    bytemuck::cast_slice(&[state.ctx.camera.uniform]),
                );

                match state.render(&self.graphics_flows) {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(FrameError::Reconfigure) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(FrameError::Other(e)) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Build the window and event loop and run the flows until the window
/// closes.
pub fn run<S: Default + 'static>(constructors: Vec<FlowConstructor<S>>) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    }

    let event_loop = EventLoop::new()?;
    let mut app: App<S> = App::new(constructors)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}
