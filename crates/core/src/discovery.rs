//! Incremental account discovery from the margin router's event log.
//!
//! Replays `AccountUpdated` events from the stored cursor to the
//! current chain head in bounded windows, merging the observed
//! accounts with the retained set from prior runs. Pagination is
//! inherently sequential: each window starts where the previous one
//! ended.

use alloy::primitives::Address;
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::cursor::Cursor;
use crate::error::Result;
use crate::ledger::LedgerReader;

/// Upper bound on windows scanned per run. A cold start against a
/// deep backlog terminates here and picks the rest up next run, since
/// the cursor always advances.
pub const MAX_WINDOWS_PER_RUN: u32 = 25;

/// Result of one discovery pass.
#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    /// Retained accounts unioned with newly observed ones
    pub accounts: BTreeSet<Address>,
    /// Highest block actually scanned
    pub last_block: u64,
}

/// Scan from the cursor toward the chain head, `window` blocks per
/// log query.
pub async fn discover(
    ledger: &dyn LedgerReader,
    cursor: &Cursor,
    window: u64,
    max_windows: u32,
) -> Result<DiscoveryOutcome> {
    let head = ledger.block_number().await?;

    if head <= cursor.last_block {
        debug!(head, last_block = cursor.last_block, "No new blocks to scan");
        return Ok(DiscoveryOutcome {
            accounts: cursor.users.clone(),
            last_block: cursor.last_block,
        });
    }

    let mut accounts = cursor.users.clone();
    let mut start = cursor.last_block;
    let mut reached = cursor.last_block;
    let mut observed = 0usize;

    for _ in 0..max_windows {
        let upper = head.min(start + window.saturating_sub(1));

        let updated = ledger.account_updates(start, upper).await?;
        observed += updated.len();
        accounts.extend(updated);
        reached = upper;

        debug!(from = start, to = upper, head, "Scanned window");

        if upper >= head {
            break;
        }
        start = upper + 1;
    }

    info!(
        from = cursor.last_block,
        to = reached,
        head,
        new_events = observed,
        candidates = accounts.len(),
        backlog = head - reached,
        "Account discovery finished"
    );

    Ok(DiscoveryOutcome {
        accounts,
        last_block: reached,
    })
}
