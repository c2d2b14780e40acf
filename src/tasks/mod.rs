//! Background Tasks Module
//!
//! # Tasks
//! - TTL sweep: removes expired cache entries at a fixed interval

mod cleanup;

pub use cleanup::{spawn_cleanup_task, DEFAULT_SWEEP_INTERVAL};
