//! Capture-side endpoint.
//!
//! The main thread owns the write direction: capture, remember, send, and
//! opportunistically display whatever result has come back. A dedicated
//! receive thread owns the read direction and keeps overwriting a one-item
//! slot with the freshest result, so the main loop never blocks on the
//! server and stale results are shed rather than queued.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{anyhow, Context, Result};
use array_wire::{ArrayReceiver, ArraySession, TypedArray};
use crossbeam_channel::Receiver;
use frame_relay::{wire, DetectionResult, Frame, FrameHistory, LatestSlot};
use frame_source::{spawn_synthetic_reader, CaptureError, CapturedFrame, SyntheticConfig};
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::display::{DisplaySink, LogDisplay};
use crate::telemetry;

/// Summary counters reported when a session closes.
#[derive(Debug, Default)]
pub struct SessionStats {
    pub frames_sent: u64,
    pub results_received: u64,
    pub correlation_misses: u64,
}

pub fn run_from_args(args: &[String]) -> Result<()> {
    let config = ClientConfig::from_args(args)?;

    let quit = Arc::new(AtomicBool::new(false));
    let handler_quit = quit.clone();
    ctrlc::set_handler(move || handler_quit.store(true, Ordering::SeqCst))
        .context("failed to install Ctrl+C handler")?;

    let frames = spawn_synthetic_reader(SyntheticConfig {
        width: config.width,
        height: config.height,
        fps: config.fps,
    })
    .context("failed to start capture")?;

    let session = ArraySession::connect(config.server_addr.as_str())
        .with_context(|| format!("failed to connect to {}", config.server_addr))?;
    info!(server = %config.server_addr, "connected");
    if config.verbose {
        debug!(
            width = config.width,
            height = config.height,
            fps = config.fps,
            history = config.history_capacity,
            "streaming configuration"
        );
    }

    let history = FrameHistory::new(config.history_capacity);
    let results = LatestSlot::new();
    let mut display = LogDisplay;
    let stats = run_session(session, &frames, &history, &results, &mut display, &quit)?;

    info!(
        frames_sent = stats.frames_sent,
        results_received = stats.results_received,
        correlation_misses = stats.correlation_misses,
        "session closed"
    );
    Ok(())
}

/// Drive one streaming session to completion.
///
/// Collaborators are injected so tests can run the full state machine
/// against an in-process server with a scripted capture feed. Any send or
/// receive failure is fatal to the session; the shutdown handshake and the
/// receive-thread join still run before the error is surfaced.
pub fn run_session(
    session: ArraySession,
    frames: &Receiver<Result<CapturedFrame, CaptureError>>,
    history: &FrameHistory,
    results: &LatestSlot<DetectionResult>,
    display: &mut dyn DisplaySink,
    quit: &Arc<AtomicBool>,
) -> Result<SessionStats> {
    let (mut sender, receiver) = session.split()?;

    // Local cross-thread signals: `stopping` downgrades receive-loop errors
    // to debug once termination is underway, `recv_failed` propagates a
    // receive-direction failure into the send loop.
    let stopping = Arc::new(AtomicBool::new(false));
    let recv_failed = Arc::new(AtomicBool::new(false));
    let recv_handle = telemetry::spawn_thread("client-recv", {
        let results = results.clone();
        let stopping = stopping.clone();
        let recv_failed = recv_failed.clone();
        move || receive_loop(receiver, results, stopping, recv_failed)
    })
    .context("failed to spawn receive thread")?;

    let mut stats = SessionStats::default();
    let mut failure: Option<anyhow::Error> = None;

    while !quit.load(Ordering::Relaxed) {
        if recv_failed.load(Ordering::Relaxed) {
            failure = Some(anyhow!("result stream failed; closing session"));
            break;
        }

        // The single external suspension point: wait for the next frame.
        let captured = match frames.recv() {
            Ok(Ok(captured)) => captured,
            Ok(Err(err)) => {
                failure = Some(anyhow::Error::new(err).context("capture failed"));
                break;
            }
            Err(_) => {
                debug!("capture feed ended");
                break;
            }
        };

        let frame = match TypedArray::rgb_image(captured.height, captured.width, captured.data) {
            Ok(image) => Frame {
                timestamp_ms: captured.timestamp_ms,
                image,
            },
            Err(err) => {
                failure = Some(anyhow::Error::new(err).context("capture produced a bad buffer"));
                break;
            }
        };

        history.push(frame.clone());
        if let Err(err) = wire::send_frame(&mut sender, &frame) {
            failure = Some(anyhow::Error::new(err).context("failed to send frame"));
            break;
        }
        stats.frames_sent += 1;
        metrics::counter!("stream_frames_sent_total").increment(1);

        // Non-blocking check for a returned result; display it against the
        // frame it was computed from, not the one just sent.
        if let Some(result) = results.try_take() {
            match history.correlate(result.timestamp_ms) {
                Some(original) => {
                    if let Err(err) = display.show(&original, &result.detections) {
                        failure = Some(err.context("display failed"));
                        break;
                    }
                }
                None => {
                    stats.correlation_misses += 1;
                    metrics::counter!("stream_correlation_misses_total").increment(1);
                    warn!(
                        timestamp = result.timestamp_ms,
                        "result outlived the frame history; skipping display"
                    );
                }
            }
        }
    }

    // Terminating: local flag first, then the in-band handshake, then join
    // the receive thread before the socket is dropped.
    stopping.store(true, Ordering::SeqCst);
    match wire::send_shutdown(&mut sender) {
        Ok(()) => debug!("sent shutdown handshake"),
        Err(err) if err.is_disconnect() => {
            warn!("peer was already gone before the shutdown handshake")
        }
        Err(err) => {
            if failure.is_none() {
                failure = Some(anyhow::Error::new(err).context("failed to send shutdown"));
            }
        }
    }

    match recv_handle.join() {
        Ok(received) => stats.results_received = received,
        Err(_) => {
            if failure.is_none() {
                failure = Some(anyhow!("receive thread panicked"));
            }
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(stats),
    }
}

/// Read result quadruples until the stream ends, publishing each into the
/// latest-wins slot. Returns how many results arrived.
fn receive_loop(
    mut receiver: ArrayReceiver,
    results: LatestSlot<DetectionResult>,
    stopping: Arc<AtomicBool>,
    recv_failed: Arc<AtomicBool>,
) -> u64 {
    let mut received = 0u64;
    loop {
        match wire::read_result(&mut receiver) {
            Ok(Some(result)) => {
                received += 1;
                metrics::counter!("stream_results_received_total").increment(1);
                if results.publish(result) {
                    debug!("superseded an unread result");
                }
            }
            Ok(None) => {
                debug!("server ended the result stream");
                break;
            }
            Err(err) => {
                if stopping.load(Ordering::SeqCst) {
                    debug!("receive loop winding down: {err}");
                } else {
                    error!("receive loop failed: {err}");
                    recv_failed.store(true, Ordering::SeqCst);
                }
                break;
            }
        }
    }
    received
}
