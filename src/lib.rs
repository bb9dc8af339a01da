//! vitrine
//!
//! An interactive 3D image gallery. A row of textured panels hangs in a
//! perspective scene with an ambient rain field behind it; hovering a panel
//! bobs it gently, clicking one expands it to a focus position while its
//! peers retreat off-screen, and clicking it again restores the row.
//!
//! High-level modules
//! - `animate`: the tween system driving every layout transition
//! - `camera`: camera types, controller and uniforms for view/projection
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: scene data models (instances, textures, vertices)
//! - `flow`: high level flow control (the event loop and per-frame driver)
//! - `gallery`: the panel row and its interaction state machine
//! - `pick`: CPU pointer hit-testing against the panel set
//! - `pipelines`: render pipeline definitions for panels and rain
//! - `rain`: the ambient particle field
//! - `resources`: image loading helpers

pub mod animate;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod gallery;
pub mod pick;
pub mod pipelines;
pub mod rain;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use wgpu::*;
pub use winit::dpi::PhysicalPosition;
pub use winit::event::WindowEvent;
