//! Playback engine: coordinator + fade transition engine

pub mod coordinator;
pub mod fade;

pub use coordinator::Coordinator;
pub use fade::{FadeEngine, FadeSettings};
