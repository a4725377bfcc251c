// Module Definition
pub mod config;
#[cfg(feature = "python")]
pub mod controller; // Python-facing wrapper around the multiplier
pub mod error;
pub mod kernels; // Worker body and vector initializer
pub mod multiplier; // Fan-out/fan-in over the worker pool
pub mod partition;
pub mod scenario;
pub mod verify;
