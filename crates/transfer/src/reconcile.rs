//! The reconciler: a pure fold of one partial progress event into a
//! transfer record.
//!
//! Events for the same id arrive in non-decreasing timestamp order but may
//! be partial or duplicated; the fold is total — any field it cannot
//! validate is treated as absent and the previous value (or a safe
//! default) wins.

use cumulus_protocol::{TransferStatus, TransferUpdate};

use crate::metrics::{blend, instant_rate};
use crate::types::{ReconcilePolicy, TransferRecord};

/// Folds `update` into `prev`, producing the next record state.
///
/// Pure and deterministic; never panics. The caller owns the id → record
/// map and replaces the entry with the returned value.
pub fn reconcile(
    prev: Option<&TransferRecord>,
    update: &TransferUpdate,
    policy: &ReconcilePolicy,
) -> TransferRecord {
    let mut next = prev.cloned().unwrap_or_else(|| TransferRecord {
        id: update.id.clone(),
        ..TransferRecord::default()
    });

    let now = sane_ts(update.updated_at).unwrap_or(next.updated_at);

    if let Some(kind) = update.kind {
        next.kind = kind;
    }
    if let Some(parent) = &update.parent_id {
        next.parent_id = Some(parent.clone());
    }
    if let Some(is_group) = update.is_group {
        next.is_group = is_group;
    }

    // Status only moves forward along queued → in_progress → terminal; a
    // late regressing event keeps the further-along state.
    if let Some(status) = update.status
        && status.rank() >= next.status.rank()
    {
        next.status = status;
    }

    let total = sane_bytes(update.total_bytes).or(next.total_bytes);
    let mut done = sane_bytes(update.done_bytes).or(next.done_bytes);
    if let (Some(d), Some(t)) = (done, total) {
        done = Some(d.min(t));
    }
    // A finished task must read as 100% complete.
    if next.status.is_terminal()
        && let Some(t) = total
        && t > 0
    {
        done = Some(t);
    }
    next.total_bytes = total;
    next.done_bytes = done;

    next.speed = derive_speed(prev, update, next.status, done, now, policy);
    next.eta_seconds = derive_eta(update, next.status, done, total, next.speed);

    if let Some(started) = sane_ts(update.started_at) {
        next.started_at = started;
    } else if prev.is_none() {
        next.started_at = now;
    }
    next.updated_at = now;
    if next.status.is_terminal() {
        next.finished_at = next.finished_at.or(Some(now));
    }

    if let Some(v) = sane_count(update.file_count) {
        next.file_count = v;
    }
    if let Some(v) = sane_count(update.done_count) {
        next.done_count = v;
    }
    if let Some(v) = sane_count(update.success_count) {
        next.success_count = v;
    }
    if let Some(v) = sane_count(update.error_count) {
        next.error_count = v;
    }
    if let Some(message) = &update.message {
        next.message = Some(message.clone());
    }
    if let Some(path) = &update.local_path {
        next.local_path = Some(path.clone());
    }

    next
}

/// Speed for the new record state, in bytes/sec.
///
/// While in progress: an explicit driver-supplied rate wins; otherwise the
/// rate is derived from the byte delta between the two most recent samples
/// and blended with the previous smoothed value. With no progress, the
/// previous rate survives only inside the staleness window — a stalled
/// transfer must not keep reporting a phantom rate.
fn derive_speed(
    prev: Option<&TransferRecord>,
    update: &TransferUpdate,
    status: TransferStatus,
    done: Option<i64>,
    now: i64,
    policy: &ReconcilePolicy,
) -> f64 {
    let explicit = update.speed.filter(|s| s.is_finite() && *s > 0.0);

    if status != TransferStatus::InProgress {
        // Keep the last observed rate for post-completion display.
        return explicit.unwrap_or_else(|| prev.map(|p| p.speed).unwrap_or(0.0));
    }

    if let Some(speed) = explicit {
        return speed;
    }

    let Some(prev) = prev else {
        return 0.0;
    };

    let delta_ms = now - prev.updated_at;
    let delta_done = match (done, prev.done_bytes) {
        (Some(d), Some(pd)) => d - pd,
        _ => 0,
    };

    let instant = instant_rate(delta_done, delta_ms);
    if instant > 0.0 {
        blend(prev.speed, instant, policy)
    } else if delta_ms <= policy.stale_after_ms {
        prev.speed
    } else {
        0.0
    }
}

/// ETA in seconds; 0 is the "unknown/none" sentinel (never negative or
/// infinite).
fn derive_eta(
    update: &TransferUpdate,
    status: TransferStatus,
    done: Option<i64>,
    total: Option<i64>,
    speed: f64,
) -> i64 {
    if status != TransferStatus::InProgress {
        return 0;
    }
    if let Some(eta) = update.eta_seconds.filter(|e| *e >= 0) {
        return eta;
    }
    match (done, total) {
        (Some(d), Some(t)) if t > 0 && d >= t => 0,
        (Some(d), Some(t)) if t > 0 && speed > 0.0 => ((t - d) as f64 / speed).ceil() as i64,
        _ => 0,
    }
}

fn sane_bytes(v: Option<i64>) -> Option<i64> {
    v.filter(|b| *b >= 0)
}

fn sane_count(v: Option<i64>) -> Option<i64> {
    v.filter(|c| *c >= 0)
}

fn sane_ts(v: Option<i64>) -> Option<i64> {
    v.filter(|t| *t >= 0)
}
