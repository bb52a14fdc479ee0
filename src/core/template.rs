use crate::core::monetary::BLOCK_WEIGHT_RESERVE;
use crate::core::CandidateTxn;
use crate::error::{MinerError, Result};
use log::{debug, info};
use std::cmp::Ordering;

/// How the selector treats a candidate heavier than the remaining capacity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CapacityPolicy {
    /// Admit while remaining capacity exceeds the reserve, regardless of the
    /// candidate's own weight. Remaining capacity may go negative.
    #[default]
    ReserveOnly,
    /// Additionally skip any candidate that would not fit in the remaining capacity
    Strict,
}

/// Ordered selection of transactions for one block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockTemplate {
    transactions: Vec<CandidateTxn>,
    total_weight: u64,
    total_fee: i64,
}

impl BlockTemplate {
    /// Greedily fill `capacity` weight units by descending fee-per-weight.
    ///
    /// Candidates with equal fee rates keep their original relative order.
    /// Fails if the selected fees or weights overflow their totals.
    pub fn select(
        mut candidates: Vec<CandidateTxn>,
        capacity: u64,
        policy: CapacityPolicy,
    ) -> Result<BlockTemplate> {
        // Stable sort, so equal ratios keep encounter order
        candidates.sort_by(|a, b| compare_fee_rate(b, a));

        // May go negative under ReserveOnly
        let mut remaining = i128::from(capacity);
        let mut template = BlockTemplate::default();

        for candidate in candidates {
            if remaining <= i128::from(BLOCK_WEIGHT_RESERVE) {
                break;
            }
            if policy == CapacityPolicy::Strict && i128::from(candidate.weight) > remaining {
                debug!(
                    "Skipping {} (weight {} > remaining {remaining})",
                    candidate.source, candidate.weight
                );
                continue;
            }

            template.total_fee = template
                .total_fee
                .checked_add(candidate.fee)
                .ok_or_else(|| {
                    MinerError::AmountOutOfRange(format!(
                        "total fee overflows after adding {} ({})",
                        candidate.source, candidate.fee
                    ))
                })?;
            template.total_weight = template
                .total_weight
                .checked_add(candidate.weight)
                .ok_or_else(|| {
                    MinerError::AmountOutOfRange(format!(
                        "total weight overflows after adding {}",
                        candidate.source
                    ))
                })?;
            remaining -= i128::from(candidate.weight);
            template.transactions.push(candidate);
        }

        info!(
            "Selected {} transactions (weight {}, fees {})",
            template.transactions.len(),
            template.total_weight,
            template.total_fee
        );
        Ok(template)
    }

    pub fn get_transactions(&self) -> &[CandidateTxn] {
        self.transactions.as_slice()
    }

    pub fn get_total_weight(&self) -> u64 {
        self.total_weight
    }

    pub fn get_total_fee(&self) -> i64 {
        self.total_fee
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Compare `fee / weight` exactly by cross-multiplying
fn compare_fee_rate(a: &CandidateTxn, b: &CandidateTxn) -> Ordering {
    // |i64| * u64 always fits in i128
    let lhs = i128::from(a.fee) * i128::from(b.weight);
    let rhs = i128::from(b.fee) * i128::from(a.weight);
    lhs.cmp(&rhs)
}
