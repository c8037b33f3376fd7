//! Fan-out of one finished frame to every eligible session.

use bytes::Bytes;

use crate::session::SessionRegistry;

/// Outcome of one broadcast pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Sessions whose outbound queue accepted the frame.
    pub delivered: usize,
    /// Sessions still in the upgrade handshake.
    pub skipped: usize,
    /// Handshaked sessions whose queue was already closed.
    pub failed: usize,
}

/// Hands `frame` to every handshaked session in `registry`.
///
/// Sessions that have not finished the handshake are skipped. Enqueue
/// failures are counted and logged but never abort the pass; frames
/// already handed to other sessions stay queued.
pub fn broadcast(registry: &SessionRegistry, frame: &Bytes) -> BroadcastReport {
    let mut report = BroadcastReport::default();

    for session in registry.snapshot() {
        if !session.is_handshaked() {
            report.skipped += 1;
            continue;
        }
        match session.enqueue(frame.clone()) {
            Ok(()) => report.delivered += 1,
            Err(err) => {
                tracing::debug!(session_id = %session.id(), error = %err, "broadcast enqueue failed");
                report.failed += 1;
            }
        }
    }

    tracing::trace!(
        bytes = frame.len(),
        delivered = report.delivered,
        skipped = report.skipped,
        failed = report.failed,
        "broadcast dispatched"
    );
    report
}
