//! Time-based cleanup of stale ledger entries.

use chrono::{DateTime, Utc};
use chunkup_protocol::constants::LEDGER_TTL;
use chunkup_store::Ledger;
use tracing::{debug, info};

use crate::error::UploadError;
use crate::types::GcReport;

/// Removes chunk entries older than the ledger TTL, measured from `now`.
///
/// Entries without a timestamp and entries that fail to parse are removed
/// too. Session metadata records are never touched. Running it twice in a
/// row removes nothing the second time.
pub fn collect_garbage(ledger: &Ledger, now: DateTime<Utc>) -> Result<GcReport, UploadError> {
    let ttl = chrono::Duration::from_std(LEDGER_TTL).unwrap_or(chrono::Duration::hours(24));
    let cutoff = now - ttl;

    let mut report = GcReport::default();
    for entry in ledger.chunk_entries()? {
        report.scanned += 1;

        let stale = match &entry.record {
            Some(record) => record.is_older_than(cutoff),
            None => true,
        };
        if stale && ledger.remove_entry(&entry.key)? {
            debug!(
                file_id = %entry.file_id,
                chunk = entry.chunk_index,
                malformed = entry.record.is_none(),
                "removed stale ledger entry"
            );
            report.removed += 1;
        }
    }

    if report.removed > 0 {
        info!(scanned = report.scanned, removed = report.removed, "ledger gc");
    }
    Ok(report)
}
