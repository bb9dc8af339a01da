//! The ambient rain field.
//!
//! A fixed-capacity set of falling line segments, advanced once per frame
//! and completely independent of the interaction state. Drops are recycled
//! by vertical wraparound: a drop passing the lower bound snaps back to the
//! upper bound with its horizontal position unchanged. Nothing is allocated
//! after construction.

use rand::Rng;
use rand::rngs::ThreadRng;
use wgpu::util::DeviceExt;
use winit::event::WindowEvent;

use crate::context::{Context, InitContext};
use crate::data_structures::vertex::LineVertex;
use crate::flow::{GraphicsFlow, Out};
use crate::gallery::ViewerState;
use instant::Duration;

/// Default number of drops.
pub const DROP_COUNT: usize = 15_000;

/// Rendered length of one drop.
pub const DROP_LENGTH: f32 = 0.5;

const FALL_SPEED: f32 = 0.1;
const FALL_JITTER: f32 = 0.1;
const LOWER_BOUND: f32 = -250.0;
const UPPER_BOUND: f32 = 250.0;
const SPAWN_EXTENT: f32 = 200.0;

/// Fixed-capacity buffer of drop start points.
pub struct Rain {
    drops: Vec<[f32; 3]>,
    rng: ThreadRng,
}

impl Rain {
    pub fn new(count: usize) -> Self {
        let mut rng = rand::rng();
        let drops = (0..count)
            .map(|_| {
                [
                    rng.random_range(-SPAWN_EXTENT..SPAWN_EXTENT),
                    rng.random_range(LOWER_BOUND..UPPER_BOUND),
                    rng.random_range(-SPAWN_EXTENT..SPAWN_EXTENT),
                ]
            })
            .collect();
        Self { drops, rng }
    }

    pub fn drops(&self) -> &[[f32; 3]] {
        &self.drops
    }

    /// Advance every drop by one frame: fall by the base speed plus a
    /// bounded random jitter, wrapping to exactly the upper bound below the
    /// lower one.
    pub fn advance(&mut self) {
        for drop in &mut self.drops {
            drop[1] -= FALL_SPEED + self.rng.random_range(0.0..FALL_JITTER);
            if drop[1] < LOWER_BOUND {
                drop[1] = UPPER_BOUND;
            }
        }
    }

    /// Rebuild the line-list vertices: one pair per drop, the end point
    /// re-derived a fixed length below the start so every segment keeps a
    /// constant length.
    pub fn write_vertices(&self, out: &mut Vec<LineVertex>) {
        out.clear();
        for drop in &self.drops {
            out.push(LineVertex { position: *drop });
            out.push(LineVertex {
                position: [drop[0], drop[1] - DROP_LENGTH, drop[2]],
            });
        }
    }
}

/// GPU resources for the rain: a vertex buffer rewritten every frame.
pub struct RainFlow {
    rain: Rain,
    vertices: Vec<LineVertex>,
    vertex_buffer: wgpu::Buffer,
}

impl RainFlow {
    pub fn new(init: &InitContext, count: usize) -> Self {
        let rain = Rain::new(count);
        let mut vertices = Vec::with_capacity(count * 2);
        rain.write_vertices(&mut vertices);
        let vertex_buffer = init
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Rain Vertex Buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
        Self {
            rain,
            vertices,
            vertex_buffer,
        }
    }
}

impl GraphicsFlow<ViewerState> for RainFlow {
    fn on_init(&mut self, _ctx: &mut Context, _state: &mut ViewerState) {}

    fn on_window_events(&mut self, _ctx: &Context, _state: &mut ViewerState, _event: &WindowEvent) {}

    fn on_update(&mut self, ctx: &Context, _state: &mut ViewerState, _dt: Duration) -> Out {
        self.rain.advance();
        self.rain.write_vertices(&mut self.vertices);
        ctx.queue
            .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&self.vertices));
        Out::Empty
    }

    fn on_render(&self, ctx: &Context, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_pipeline(&ctx.pipelines.rain);
        render_pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.draw(0..self.vertices.len() as u32, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_fixed_at_construction() {
        let mut rain = Rain::new(128);
        assert_eq!(rain.drops().len(), 128);
        for _ in 0..100 {
            rain.advance();
        }
        assert_eq!(rain.drops().len(), 128);
    }

    #[test]
    fn drops_stay_inside_the_vertical_bounds() {
        let mut rain = Rain::new(64);
        for _ in 0..10_000 {
            rain.advance();
            for drop in rain.drops() {
                assert!(drop[1] >= LOWER_BOUND && drop[1] <= UPPER_BOUND);
            }
        }
    }

    #[test]
    fn wraparound_resets_to_exactly_the_upper_bound() {
        let mut rain = Rain::new(32);
        let mut wraps = 0;
        for _ in 0..20_000 {
            let before: Vec<f32> = rain.drops().iter().map(|d| d[1]).collect();
            rain.advance();
            for (drop, &previous) in rain.drops().iter().zip(&before) {
                if drop[1] > previous {
                    // Only a wrap can move a drop upward.
                    assert_eq!(drop[1], UPPER_BOUND);
                    wraps += 1;
                }
            }
        }
        assert!(wraps > 0);
    }

    #[test]
    fn wraparound_keeps_the_horizontal_position() {
        let mut rain = Rain::new(32);
        let horizontal: Vec<(f32, f32)> = rain.drops().iter().map(|d| (d[0], d[2])).collect();
        for _ in 0..20_000 {
            rain.advance();
        }
        for (drop, &(x, z)) in rain.drops().iter().zip(&horizontal) {
            assert_eq!(drop[0], x);
            assert_eq!(drop[2], z);
        }
    }

    #[test]
    fn segments_keep_a_constant_length() {
        let mut rain = Rain::new(16);
        rain.advance();
        let mut vertices = Vec::new();
        rain.write_vertices(&mut vertices);
        assert_eq!(vertices.len(), 32);
        for pair in vertices.chunks_exact(2) {
            assert_eq!(pair[0].position[0], pair[1].position[0]);
            assert!((pair[0].position[1] - pair[1].position[1] - DROP_LENGTH).abs() < 1e-4);
            assert_eq!(pair[0].position[2], pair[1].position[2]);
        }
    }
}
