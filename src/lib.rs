// src/lib.rs
pub mod config;
pub mod gateway;
pub mod metrics;
pub mod prober;
pub mod registry;
pub mod renderer;
pub mod scheduler;
pub mod server;
pub mod sink;
pub mod state;
pub mod status;
pub mod uptime;
