//! The image gallery: scene registry, interaction state machine and the
//! gallery's graphics flow.
//!
//! A [`Gallery`] owns the panel row and drives the two-state interaction:
//! clicking a panel expands it to the focus position while its peers
//! retreat off-screen; clicking the expanded panel restores the row. Hover
//! gives a small vertical bob while collapsed and a tilt micro-animation on
//! the expanded panel. All transitions go through the [`Animator`]; the
//! state machine itself never writes panel attributes directly.
//!
//! [`GalleryFlow`] is the GPU-facing wrapper: one shared unit quad, a
//! per-panel instance buffer rewritten each frame, and one texture bind
//! group per image.

use std::cell::Cell;
use std::rc::Rc;

use cgmath::{Quaternion, Rad, Rotation3, Vector3};
use instant::Duration;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, WindowEvent};

use crate::animate::{Animator, Channel};
use crate::camera::{Camera, Projection};
use crate::context::{Context, InitContext};
use crate::data_structures::instance::Instance;
use crate::data_structures::texture::Texture;
use crate::data_structures::vertex::{QUAD_INDICES, unit_quad};
use crate::flow::{GraphicsFlow, Out};
use crate::pick;
use crate::pipelines::panel::texture_layout;
use crate::resources::GalleryImage;

/// Every panel shares this width; height follows the image's aspect ratio.
pub const PANEL_WIDTH: f32 = 8.0;
/// Resting tilt about Y, in radians.
pub const DEFAULT_TILT: f32 = -0.1;
/// Where the expanded panel sits, directly in front of the view.
pub const FOCUS_POSITION: [f32; 3] = [5.0, 0.0, 0.0];
/// Where the peers of the expanded panel go.
pub const RETREAT_POSITION: [f32; 3] = [-30.0, 0.0, -5.0];

/// Background tint at startup (a warm dark brown).
pub const START_TINT: [f32; 3] = [0.2588, 0.1529, 0.1451];
/// Background tint while a panel is expanded.
pub const EXPAND_TINT: [f32; 3] = [0.0392, 0.2, 0.2510];
/// Background tint after restoring the row.
pub const RESTORE_TINT: [f32; 3] = [0.0510, 0.2667, 0.3294];

const SLOT_OFFSET: f32 = -1.0;
const SLOT_SPACING: f32 = 1.0;
const SLOT_DEPTH_STEP: f32 = 0.1;

const LAYOUT_SECS: f32 = 1.0;
const HOVER_TILT_SECS: f32 = 0.5;

const BOB_AMPLITUDE: f32 = 0.1;
const BOB_FREQUENCY: f32 = 2.0;
const SETTLE_DAMPING: f32 = 0.9;

/// Pseudo-target id for the background tint tween.
const BACKDROP: u32 = u32::MAX;

/// One displayable image plane.
#[derive(Clone, Debug)]
pub struct Panel {
    pub id: u32,
    /// Base layout index; reassigned on restore (see [`Gallery::restore`]).
    pub slot: usize,
    pub position: Vector3<f32>,
    pub tilt: Rad<f32>,
    pub width: f32,
    pub height: f32,
}

impl Panel {
    fn new(id: u32, slot: usize, aspect: f32) -> Self {
        Self {
            id,
            slot,
            position: slot_position(slot),
            tilt: Rad(DEFAULT_TILT),
            width: PANEL_WIDTH,
            height: PANEL_WIDTH / aspect,
        }
    }
}

fn slot_position(slot: usize) -> Vector3<f32> {
    Vector3::new(
        SLOT_OFFSET + slot as f32 * SLOT_SPACING,
        0.0,
        -(slot as f32) * SLOT_DEPTH_STEP,
    )
}

/// The single authority over what is expanded and hovered. Only the state
/// machine writes it; everything else reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InteractionState {
    pub expanded: Option<u32>,
    pub hovered: Option<u32>,
}

/// Shared application state handed to every flow.
#[derive(Debug, Default)]
pub struct ViewerState {
    pub interaction: InteractionState,
}

/// The panel row plus its interaction state machine and animator.
pub struct Gallery {
    panels: Vec<Panel>,
    animator: Animator,
    tint: Rc<Cell<[f32; 3]>>,
    /// Whether the pointer was over the expanded panel at the last check.
    hover_on_expanded: bool,
    /// Monotonic clock driving the hover bob.
    clock: f32,
}

impl Gallery {
    /// Build one panel per image aspect ratio, laid out in slot order.
    pub fn new(aspects: &[f32]) -> Self {
        let panels = aspects
            .iter()
            .enumerate()
            .map(|(i, &aspect)| Panel::new(i as u32, i, aspect))
            .collect();
        Self {
            panels,
            animator: Animator::new(),
            tint: Rc::new(Cell::new(START_TINT)),
            hover_on_expanded: false,
            clock: 0.0,
        }
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// Current background tint, re-derived every tick while a tint tween
    /// runs.
    pub fn tint(&self) -> [f32; 3] {
        self.tint.get()
    }

    /// Click transition. A hit on the expanded panel collapses; any other
    /// click while expanded is ignored; a hit while collapsed expands.
    pub fn handle_click(
        &mut self,
        interaction: &mut InteractionState,
        pointer: PhysicalPosition<f64>,
        viewport_width: f32,
        viewport_height: f32,
        camera: &Camera,
        projection: &Projection,
    ) {
        let hit = pick::pick(
            pointer,
            viewport_width,
            viewport_height,
            camera,
            projection,
            &self.panels,
        );
        match interaction.expanded {
            Some(id) => {
                if hit == Some(id) {
                    self.restore(interaction, id);
                }
            }
            None => {
                if let Some(id) = hit {
                    self.expand(interaction, id);
                }
            }
        }
    }

    /// Cursor transition. While collapsed this only retargets the hover;
    /// while expanded it toggles the tilt micro-animation on the expanded
    /// panel whenever the pointer enters or leaves it.
    pub fn handle_cursor(
        &mut self,
        interaction: &mut InteractionState,
        pointer: PhysicalPosition<f64>,
        viewport_width: f32,
        viewport_height: f32,
        camera: &Camera,
        projection: &Projection,
    ) {
        let hit = pick::pick(
            pointer,
            viewport_width,
            viewport_height,
            camera,
            projection,
            &self.panels,
        );
        match interaction.expanded {
            Some(id) => {
                let hovering = hit == Some(id);
                if hovering != self.hover_on_expanded {
                    self.hover_on_expanded = hovering;
                    let target = if hovering { 0.0 } else { DEFAULT_TILT };
                    let from = self.tilt_of(id);
                    self.animator.schedule(
                        id,
                        Channel::Tilt,
                        [from, 0.0, 0.0],
                        [target, 0.0, 0.0],
                        HOVER_TILT_SECS,
                    );
                }
            }
            None => interaction.hovered = hit,
        }
    }

    fn expand(&mut self, interaction: &mut InteractionState, id: u32) {
        log::debug!("expanding panel {id}");
        interaction.expanded = Some(id);
        self.hover_on_expanded = false;
        for panel in &self.panels {
            let to = if panel.id == id {
                FOCUS_POSITION
            } else {
                RETREAT_POSITION
            };
            self.animator.schedule(
                panel.id,
                Channel::Position,
                panel.position.into(),
                to,
                LAYOUT_SECS,
            );
        }
        self.retint(EXPAND_TINT);
    }

    /// Collapse back to the row. Slots are reassigned: the formerly
    /// expanded panel takes slot 0, panels that sat below it shift up by
    /// one, the rest keep theirs. The assignment persists across cycles.
    fn restore(&mut self, interaction: &mut InteractionState, id: u32) {
        log::debug!("restoring the row from panel {id}");
        interaction.expanded = None;
        interaction.hovered = None;
        self.hover_on_expanded = false;

        let Some(expanded_slot) = self.panels.iter().find(|p| p.id == id).map(|p| p.slot) else {
            return;
        };
        for panel in &mut self.panels {
            if panel.slot < expanded_slot {
                panel.slot += 1;
            } else if panel.slot == expanded_slot {
                panel.slot = 0;
            }
        }
        for panel in &self.panels {
            self.animator.schedule(
                panel.id,
                Channel::Position,
                panel.position.into(),
                slot_position(panel.slot).into(),
                LAYOUT_SECS,
            );
            self.animator.schedule(
                panel.id,
                Channel::Tilt,
                [panel.tilt.0, 0.0, 0.0],
                [DEFAULT_TILT, 0.0, 0.0],
                LAYOUT_SECS,
            );
        }
        self.retint(RESTORE_TINT);
    }

    fn retint(&mut self, to: [f32; 3]) {
        let cell = Rc::clone(&self.tint);
        self.animator.schedule_with(
            BACKDROP,
            Channel::Tint,
            self.tint.get(),
            to,
            LAYOUT_SECS,
            Some(Box::new(move |rgb| cell.set(rgb))),
        );
    }

    fn tilt_of(&self, id: u32) -> f32 {
        self.panels
            .iter()
            .find(|p| p.id == id)
            .map_or(DEFAULT_TILT, |p| p.tilt.0)
    }

    /// Per-frame work: idle motion while collapsed, then tween application.
    ///
    /// The hovered panel bobs on a sine keyed to the gallery clock; every
    /// other panel settles toward rest by exponential decay. Idle motion
    /// never touches a panel whose position a tween currently owns.
    pub fn update(&mut self, interaction: &InteractionState, dt: Duration) {
        self.clock += dt.as_secs_f32();

        if interaction.expanded.is_none() {
            for panel in &mut self.panels {
                if self.animator.is_active(panel.id, Channel::Position) {
                    continue;
                }
                if interaction.hovered == Some(panel.id) {
                    panel.position.y = (self.clock * BOB_FREQUENCY).sin() * BOB_AMPLITUDE;
                } else {
                    panel.position.y *= SETTLE_DAMPING;
                }
            }
        }

        let panels = &mut self.panels;
        self.animator.advance(dt, |target, channel, value| {
            let Some(panel) = panels.iter_mut().find(|p| p.id == target) else {
                // The backdrop tween has no panel; its hook did the work.
                return;
            };
            match channel {
                Channel::Position => panel.position = value.into(),
                Channel::Tilt => panel.tilt = Rad(value[0]),
                Channel::Tint => {}
            }
        });
    }
}

/// GPU resources and event plumbing for the gallery.
pub struct GalleryFlow {
    gallery: Gallery,
    materials: Vec<wgpu::BindGroup>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
}

impl GalleryFlow {
    pub fn new(init: &InitContext, images: &[GalleryImage]) -> anyhow::Result<Self> {
        let aspects: Vec<f32> = images.iter().map(|img| img.aspect).collect();
        let gallery = Gallery::new(&aspects);

        let layout = texture_layout(&init.device);
        let materials = images
            .iter()
            .enumerate()
            .map(|(i, img)| {
                let texture = Texture::from_image(
                    &init.device,
                    &init.queue,
                    &img.image,
                    Some(&format!("gallery image {i}")),
                )?;
                Ok(init.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: &layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&texture.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&texture.sampler),
                        },
                    ],
                    label: Some("panel_bind_group"),
                }))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let vertex_buffer = init
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Panel Vertex Buffer"),
                contents: bytemuck::cast_slice(&unit_quad()),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = init
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Panel Index Buffer"),
                contents: bytemuck::cast_slice(&QUAD_INDICES),
                usage: wgpu::BufferUsages::INDEX,
            });
        let instance_buffer = init
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Panel Instance Buffer"),
                contents: bytemuck::cast_slice(&instance_data(&gallery)),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });

        Ok(Self {
            gallery,
            materials,
            vertex_buffer,
            index_buffer,
            instance_buffer,
        })
    }
}

fn instance_data(gallery: &Gallery) -> Vec<crate::data_structures::instance::InstanceRaw> {
    gallery
        .panels()
        .iter()
        .map(|panel| {
            Instance {
                position: panel.position,
                rotation: Quaternion::from_angle_y(panel.tilt),
                scale: Vector3::new(panel.width, panel.height, 1.0),
            }
            .to_raw()
        })
        .collect()
}

fn tint_colour(rgb: [f32; 3]) -> wgpu::Color {
    wgpu::Color {
        r: rgb[0] as f64,
        g: rgb[1] as f64,
        b: rgb[2] as f64,
        a: 1.0,
    }
}

impl GraphicsFlow<ViewerState> for GalleryFlow {
    fn on_init(&mut self, ctx: &mut Context, _state: &mut ViewerState) {
        ctx.clear_colour = tint_colour(START_TINT);
    }

    fn on_window_events(&mut self, ctx: &Context, state: &mut ViewerState, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.gallery.handle_cursor(
                    &mut state.interaction,
                    *position,
                    ctx.config.width as f32,
                    ctx.config.height as f32,
                    &ctx.camera.camera,
                    &ctx.projection,
                );
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                self.gallery.handle_click(
                    &mut state.interaction,
                    ctx.mouse.coords,
                    ctx.config.width as f32,
                    ctx.config.height as f32,
                    &ctx.camera.camera,
                    &ctx.projection,
                );
            }
            _ => {}
        }
    }

    fn on_update(&mut self, ctx: &Context, state: &mut ViewerState, dt: Duration) -> Out {
        self.gallery.update(&state.interaction, dt);
        ctx.queue.write_buffer(
            &self.instance_buffer,
            0,
            bytemuck::cast_slice(&instance_data(&self.gallery)),
        );
        // Re-derive the clear colour from the tweened tint components.
        let colour = tint_colour(self.gallery.tint());
        Out::Configure(Box::new(move |ctx| ctx.clear_colour = colour))
    }

    fn on_render(&self, ctx: &Context, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_pipeline(&ctx.pipelines.panel);
        render_pass.set_bind_group(1, &ctx.camera.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);

        let stride = std::mem::size_of::<crate::data_structures::instance::InstanceRaw>()
            as wgpu::BufferAddress;
        for (i, material) in self.materials.iter().enumerate() {
            let offset = i as wgpu::BufferAddress * stride;
            render_pass.set_bind_group(0, material, &[]);
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(offset..offset + stride));
            render_pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);
        }
    }
}
