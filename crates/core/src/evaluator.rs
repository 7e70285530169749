//! Risk evaluation over the candidate-account set.
//!
//! For each candidate the margin contract is asked for loan, holdings
//! and the raw liquidation flag; eligibility additionally requires the
//! loan to clear a configured peg-denominated floor, so economically
//! insignificant positions never cost gas. The retained set for the
//! next run keeps only accounts whose loan still exceeds a lower
//! materiality floor; pruned accounts are re-discovered from the event
//! log if they borrow again, and eligibility is always recomputed from
//! live contract state, so a pruned account can never be liquidated
//! unsafely.

use alloy::primitives::{Address, U256};
use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::error::Result;
use crate::ledger::MarginViews;
use crate::peg_math::whole_units;

/// Concurrent view-call fan-out. Account evaluations are independent,
/// so completion order never affects the result.
const EVAL_CONCURRENCY: usize = 8;

/// Fresh per-run state of one candidate account.
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    pub address: Address,
    pub loan: U256,
    pub holdings: U256,
    pub eligible: bool,
}

/// Per-run exposure sums over eligible accounts, for reporting only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateRiskTotals {
    pub loan: U256,
    pub holdings: U256,
}

/// Output of one evaluation pass.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Accounts to submit for liquidation, in address order
    pub eligible: Vec<Address>,
    /// Candidate set carried to the next run
    pub retained: BTreeSet<Address>,
    pub totals: AggregateRiskTotals,
}

/// Thresholds are raw integers in the peg's smallest unit.
pub struct RiskEvaluator<'a> {
    views: &'a dyn MarginViews,
    /// Loans at or below this are never liquidated
    minimum_loan: U256,
    /// Loans at or below this fall out of the retained set
    retention_floor: U256,
    /// Holdings above this are reported in the log
    report_threshold: U256,
    peg_decimals: u8,
}

impl<'a> RiskEvaluator<'a> {
    pub fn new(
        views: &'a dyn MarginViews,
        minimum_loan: U256,
        retention_floor: U256,
        report_threshold: U256,
        peg_decimals: u8,
    ) -> Self {
        Self {
            views,
            minimum_loan,
            retention_floor,
            report_threshold,
            peg_decimals,
        }
    }

    /// Evaluate every candidate. A single account's view-call failure
    /// is logged, the account skipped for this run and retained for
    /// the next; it never aborts the batch.
    pub async fn evaluate(&self, candidates: &BTreeSet<Address>) -> Result<Evaluation> {
        let snapshots: Vec<(Address, Result<AccountSnapshot>)> =
            stream::iter(candidates.iter().copied())
                .map(|account| async move { (account, self.snapshot(account).await) })
                .buffer_unordered(EVAL_CONCURRENCY)
                .collect()
                .await;

        let mut eligible = BTreeSet::new();
        let mut retained = BTreeSet::new();
        let mut totals = AggregateRiskTotals::default();

        for (account, snapshot) in snapshots {
            let snapshot = match snapshot {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(account = %account, error = %e, "View call failed, retrying next run");
                    retained.insert(account);
                    continue;
                }
            };

            if snapshot.eligible {
                eligible.insert(account);
                totals.loan += snapshot.loan;
                totals.holdings += snapshot.holdings;
            }

            if snapshot.holdings > self.report_threshold {
                let holdings = whole_units(snapshot.holdings, self.peg_decimals);
                let loan = whole_units(snapshot.loan, self.peg_decimals);
                info!(account = %account, %holdings, %loan, "Account position");
                if snapshot.loan > snapshot.holdings {
                    let shortfall =
                        whole_units(snapshot.loan - snapshot.holdings, self.peg_decimals);
                    info!(account = %account, %shortfall, "Shortfall");
                }
            }

            // Paid-down accounts drop out; the event log re-discovers
            // them if they borrow again.
            if snapshot.loan > self.retention_floor {
                retained.insert(account);
            }
        }

        info!(
            candidates = candidates.len(),
            eligible = eligible.len(),
            retained = retained.len(),
            total_loan = %whole_units(totals.loan, self.peg_decimals),
            total_holdings = %whole_units(totals.holdings, self.peg_decimals),
            "Risk evaluation finished"
        );

        Ok(Evaluation {
            eligible: eligible.into_iter().collect(),
            retained,
            totals,
        })
    }

    async fn snapshot(&self, account: Address) -> Result<AccountSnapshot> {
        let loan = self.views.loan_in_peg(account).await?;
        let holdings = self.views.holdings_in_peg(account).await?;
        let flagged = self.views.can_be_liquidated(account).await?;

        Ok(AccountSnapshot {
            address: account,
            loan,
            holdings,
            // The contract flag alone never suffices
            eligible: flagged && loan > self.minimum_loan,
        })
    }
}
