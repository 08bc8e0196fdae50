//! Inference-side endpoint.
//!
//! One connection is serviced at a time. Its receive thread reads frame
//! pairs into a one-item slot, overwriting anything unconsumed: the server
//! never queues a backlog, it always works on the freshest frame and sheds
//! the rest. The main loop polls the slot, runs the detector, and sends the
//! result quadruple back. A dropped client drains the connection and the
//! process goes back to accepting.

use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use array_wire::{ArrayReceiver, ArraySession};
use frame_relay::{wire, DetectionResult, Frame, LatestSlot};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::detect::{Detector, LumaThresholdDetector};
use crate::telemetry;

/// Backoff between polls of the pending-frame slot when it is empty.
const IDLE_POLL: Duration = Duration::from_millis(10);

/// Per-connection counters logged at drain time.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    pub frames_received: u64,
    pub frames_shed: u64,
    pub results_sent: u64,
}

pub fn run_from_args(args: &[String]) -> Result<()> {
    let config = ServerConfig::from_args(args)?;
    if config.verbose {
        debug!(threshold = config.threshold, "detector configuration");
    }
    let mut detector = LumaThresholdDetector::new(config.threshold);
    run(&config.listen_addr, &mut detector)
}

/// Accept loop. One serviced connection at a time; further clients wait on
/// the listen backlog. Connection-scoped failures are logged and the loop
/// keeps accepting.
pub fn run(listen_addr: &str, detector: &mut dyn Detector) -> Result<()> {
    let listener =
        TcpListener::bind(listen_addr).with_context(|| format!("failed to bind {listen_addr}"))?;
    let addr = listener.local_addr().context("listener has no local address")?;
    info!(%addr, "listening");

    loop {
        let (stream, peer) = listener.accept().context("accept failed")?;
        info!(%peer, "client connected");
        match serve_connection(stream, detector) {
            Ok(stats) => info!(
                frames_received = stats.frames_received,
                frames_shed = stats.frames_shed,
                results_sent = stats.results_sent,
                "connection drained"
            ),
            Err(err) => error!("connection aborted: {err:?}"),
        }
        info!("waiting for the next client");
    }
}

/// Service one accepted connection until the client hangs up or sends the
/// shutdown handshake, then drain: unblock and join the receive thread
/// before the sockets are dropped.
pub fn serve_connection(stream: TcpStream, detector: &mut dyn Detector) -> Result<ConnectionStats> {
    // Separate handle used at drain time to unblock the receive thread.
    let control = stream.try_clone().context("failed to clone connection")?;
    let session = ArraySession::from_stream(stream)?;
    let (mut sender, receiver) = session.split()?;

    let pending: LatestSlot<Frame> = LatestSlot::new();
    let stop = Arc::new(AtomicBool::new(false));
    let recv_handle = telemetry::spawn_thread("server-recv", {
        let pending = pending.clone();
        let stop = stop.clone();
        move || receive_loop(receiver, pending, stop)
    })
    .context("failed to spawn receive thread")?;

    let mut results_sent = 0u64;
    loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        let frame = match pending.try_take() {
            Some(frame) => frame,
            None => {
                thread::sleep(IDLE_POLL);
                continue;
            }
        };

        let detections = match detector.infer(&frame.image) {
            Ok(detections) => detections,
            Err(err) => {
                error!("inference failed: {err:?}");
                stop.store(true, Ordering::SeqCst);
                break;
            }
        };
        let result = DetectionResult {
            timestamp_ms: frame.timestamp_ms,
            detections,
        };
        if let Err(err) = wire::send_result(&mut sender, &result) {
            if err.is_disconnect() {
                warn!("client dropped mid-send: {err}");
            } else {
                error!("failed to send result: {err}");
            }
            stop.store(true, Ordering::SeqCst);
            break;
        }
        results_sent += 1;
        metrics::counter!("detect_results_sent_total").increment(1);
    }

    // Draining. The receive thread may still be blocked in a read; shutting
    // the socket down forces it out, and it is joined before either clone of
    // the stream is dropped.
    let _ = control.shutdown(Shutdown::Both);
    let (frames_received, frames_shed) = recv_handle
        .join()
        .map_err(|_| anyhow!("receive thread panicked"))?;

    Ok(ConnectionStats {
        frames_received,
        frames_shed,
        results_sent,
    })
}

/// Read frame pairs into the slot until the client sends the shutdown
/// handshake or the connection dies. Returns (received, shed) counts.
fn receive_loop(
    mut receiver: ArrayReceiver,
    pending: LatestSlot<Frame>,
    stop: Arc<AtomicBool>,
) -> (u64, u64) {
    let mut received = 0u64;
    let mut shed = 0u64;
    loop {
        match wire::read_frame(&mut receiver) {
            Ok(Some(frame)) => {
                received += 1;
                metrics::counter!("detect_frames_received_total").increment(1);
                if pending.publish(frame) {
                    shed += 1;
                    metrics::counter!("detect_frames_shed_total").increment(1);
                }
            }
            Ok(None) => {
                info!("client sent the shutdown handshake");
                break;
            }
            Err(err) => {
                if stop.load(Ordering::Relaxed) {
                    debug!("receive loop winding down: {err}");
                } else if err.is_disconnect() {
                    info!("client disconnected: {err}");
                } else {
                    error!("receive loop failed: {err}");
                }
                break;
            }
        }
    }
    stop.store(true, Ordering::SeqCst);
    (received, shed)
}
