use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::error::{DeliveryError, Result};
use crate::models::ScanOutcome;
use crate::scanner::{ScanSource, SourceGuard};
use crate::state::DeliveryState;

/// Progress reported while a session is open.
#[derive(Debug)]
pub enum SessionEvent<'a> {
    Scanned(&'a ScanOutcome),
    NotFound(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The last scan finished a customer; show the summary.
    CustomerComplete(ScanOutcome),
    /// The source ran out of input.
    SourceClosed,
    /// Nothing imported yet, so there is nothing to scan against.
    NoRoster,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub id: Uuid,
    pub end: SessionEnd,
    pub scans: usize,
    pub misses: usize,
}

/// Feeds one source into the roster until a customer is complete.
///
/// Unknown codes keep the session open. Partial scans keep it open too, so
/// the courier can carry on with the next parcel of the same customer.
pub fn run<S, F>(
    state: &mut DeliveryState,
    source: &mut S,
    mut on_event: F,
) -> Result<SessionReport>
where
    S: ScanSource + ?Sized,
    F: FnMut(SessionEvent<'_>),
{
    let id = Uuid::new_v4();
    let span = info_span!("scan_session", %id, source = %source.kind());
    let _entered = span.enter();

    let mut report = SessionReport {
        id,
        end: SessionEnd::SourceClosed,
        scans: 0,
        misses: 0,
    };

    if state.is_empty() {
        warn!("no roster loaded, scan session not started");
        report.end = SessionEnd::NoRoster;
        return Ok(report);
    }

    let mut guard = SourceGuard::acquire(source)?;
    while let Some(event) = guard.next_event()? {
        match state.apply_scan(&event) {
            Ok(outcome) => {
                report.scans += 1;
                on_event(SessionEvent::Scanned(&outcome));
                if outcome.complete {
                    report.end = SessionEnd::CustomerComplete(outcome);
                    break;
                }
            }
            Err(DeliveryError::CodeNotFound { code }) => {
                report.misses += 1;
                on_event(SessionEvent::NotFound(&code));
            }
            Err(err) => return Err(err),
        }
    }

    info!(scans = report.scans, misses = report.misses, "scan session closed");
    Ok(report)
}
