// src/status/mod.rs
mod table;

pub use table::{EndpointState, EndpointStatus, StatusSnapshot, StatusTable};
