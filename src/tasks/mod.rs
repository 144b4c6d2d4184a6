//! Background Tasks Module
//!
//! # Tasks
//! - Expiry sweep: removes expired in-memory entries at a fixed interval

mod sweep;

pub use sweep::{spawn_sweep_task, SweepHandle};
