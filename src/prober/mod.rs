// src/prober/mod.rs
mod prober;

pub use prober::{CycleReport, ProbeOutcome, Prober};
