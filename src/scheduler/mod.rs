// src/scheduler/mod.rs
mod supervisor;
mod task;

pub use supervisor::{Lifecycle, Supervisor};
pub use task::{Cycle, PeriodicTask};
