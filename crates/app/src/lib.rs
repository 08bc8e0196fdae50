//! Streaming endpoints: the capture-side client that ships frames to a
//! remote detector, and the inference-side server that ships results back.
//!
//! Both endpoints run exactly two threads per live connection, one owning
//! the write direction and one owning the read direction, with bounded
//! most-recent-wins buffers as the only shared state between them.

pub mod cli;
pub mod client;
pub mod config;
pub mod detect;
pub mod display;
pub mod server;
pub mod telemetry;
