//! Scene data types shared by the render path.
//!
//! - `instance` holds per-object transformation data for GPU instancing
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `vertex` defines the vertex formats for panels and rain lines

pub mod instance;
pub mod texture;
pub mod vertex;
