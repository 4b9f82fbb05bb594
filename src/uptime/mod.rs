// src/uptime/mod.rs
mod clock;

pub use clock::{SessionClock, Uptime};
