// src/renderer/mod.rs
mod payload;
mod renderer;

pub use payload::DisplayPayload;
pub use renderer::{RenderOutcome, Renderer};
