//! Tracing bootstrap and dispatcher-aware thread spawning.

use std::{io, thread};

use tracing_subscriber::{filter::EnvFilter, fmt};

/// Install the process-wide subscriber: `RUST_LOG`-style filtering with an
/// `info` default, uptime-relative timestamps, no targets.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_timer(fmt::time::uptime())
        .try_init();
}

/// Spawn a named thread that inherits the current tracing dispatcher, so
/// receive loops log through the same subscriber as the main thread.
pub fn spawn_thread<F, T>(name: impl Into<String>, f: F) -> io::Result<thread::JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let dispatch = tracing::dispatcher::get_default(|current| current.clone());
    thread::Builder::new()
        .name(name.into())
        .spawn(move || tracing::dispatcher::with_default(&dispatch, f))
}
