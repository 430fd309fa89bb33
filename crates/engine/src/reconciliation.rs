//! Bank statement reconciliation.
//!
//! [`reconcile`] classifies the lines of a bank statement against the
//! unreconciled movements of one bank:
//!
//! - **match**: the statement line is backed by a movement with the same
//!   signed amount (within [`MatchRules::amount_epsilon`]) dated at most
//!   [`MatchRules::date_window_days`] away;
//! - **discrepancy**: the statement line has no movement;
//! - **missing**: the movement has no statement line.
//!
//! Matching is greedy and first-fit: statement lines are visited in upload
//! order and each one takes the *first* unconsumed eligible movement in the
//! order the movements were given. It does not look for the globally best
//! pairing, so the outcome depends on input order.
//!
//! The function is pure. Marking movements as reconciled or booking a
//! discrepancy is up to the caller (see `Engine::reconcile_all_matches` and
//! `Engine::materialize_discrepancy`).

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Movement, statement::ExternalRecord};

/// Tolerances used to decide whether a statement line and a movement agree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRules {
    /// Amounts match when their absolute difference is strictly below this.
    pub amount_epsilon: Decimal,
    /// Dates match when they are at most this many calendar days apart.
    pub date_window_days: i64,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            amount_epsilon: Decimal::new(1, 2),
            date_window_days: 3,
        }
    }
}

impl MatchRules {
    fn amounts_agree(&self, statement: Decimal, movement: Decimal) -> bool {
        (statement - movement).abs() < self.amount_epsilon
    }

    fn dates_agree(&self, statement: NaiveDate, movement: NaiveDate) -> bool {
        day_distance(statement, movement) <= self.date_window_days
    }

    /// Returns `true` if `movement` may back `record`.
    #[must_use]
    pub fn is_eligible(&self, record: &ExternalRecord, movement: &Movement) -> bool {
        self.amounts_agree(record.amount, movement.signed_amount())
            && self.dates_agree(record.date, movement.date)
    }
}

/// Absolute number of whole calendar days between two dates.
#[must_use]
pub fn day_distance(a: NaiveDate, b: NaiveDate) -> i64 {
    (a - b).num_days().abs()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Match,
    Discrepancy,
    Missing,
}

/// Classification of a single statement line or movement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchResult {
    Match {
        record: ExternalRecord,
        movement: Movement,
    },
    Discrepancy {
        record: ExternalRecord,
    },
    Missing {
        movement: Movement,
    },
}

impl MatchResult {
    pub fn kind(&self) -> MatchKind {
        match self {
            Self::Match { .. } => MatchKind::Match,
            Self::Discrepancy { .. } => MatchKind::Discrepancy,
            Self::Missing { .. } => MatchKind::Missing,
        }
    }

    /// The statement line, present for matches and discrepancies.
    pub fn record(&self) -> Option<&ExternalRecord> {
        match self {
            Self::Match { record, .. } | Self::Discrepancy { record } => Some(record),
            Self::Missing { .. } => None,
        }
    }

    /// The internal movement, present for matches and missing entries.
    pub fn movement(&self) -> Option<&Movement> {
        match self {
            Self::Match { movement, .. } | Self::Missing { movement } => Some(movement),
            Self::Discrepancy { .. } => None,
        }
    }
}

/// Number of results in each bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationStats {
    pub matches: usize,
    pub discrepancies: usize,
    pub missing: usize,
}

/// Outcome of one reconciliation run.
///
/// Results are stored in emission order: one entry per statement line (match
/// or discrepancy) in upload order, then the missing movements in the order
/// they were given. The bucket accessors keep that relative order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    results: Vec<MatchResult>,
}

impl ReconciliationReport {
    pub fn results(&self) -> &[MatchResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<MatchResult> {
        self.results
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn matches(&self) -> impl Iterator<Item = (&ExternalRecord, &Movement)> {
        self.results.iter().filter_map(|result| match result {
            MatchResult::Match { record, movement } => Some((record, movement)),
            _ => None,
        })
    }

    pub fn discrepancies(&self) -> impl Iterator<Item = &ExternalRecord> {
        self.results.iter().filter_map(|result| match result {
            MatchResult::Discrepancy { record } => Some(record),
            _ => None,
        })
    }

    pub fn missing(&self) -> impl Iterator<Item = &Movement> {
        self.results.iter().filter_map(|result| match result {
            MatchResult::Missing { movement } => Some(movement),
            _ => None,
        })
    }

    pub fn stats(&self) -> ReconciliationStats {
        self.results
            .iter()
            .fold(ReconciliationStats::default(), |mut stats, result| {
                match result.kind() {
                    MatchKind::Match => stats.matches += 1,
                    MatchKind::Discrepancy => stats.discrepancies += 1,
                    MatchKind::Missing => stats.missing += 1,
                }
                stats
            })
    }

    /// Ids of the movements paired with a statement line.
    pub fn matched_movement_ids(&self) -> Vec<Uuid> {
        self.matches().map(|(_, movement)| movement.id).collect()
    }
}

/// Classifies `records` against `movements`.
///
/// `movements` must be the unreconciled movements of a single bank. Every
/// record ends up in exactly one match or discrepancy, every movement in
/// exactly one match or missing entry, and no movement is used by two
/// matches.
pub fn reconcile(
    records: &[ExternalRecord],
    movements: &[Movement],
    rules: &MatchRules,
) -> ReconciliationReport {
    let mut consumed: HashSet<Uuid> = HashSet::with_capacity(records.len().min(movements.len()));
    let mut results = Vec::with_capacity(records.len() + movements.len());

    for record in records {
        let candidate = movements
            .iter()
            .find(|movement| !consumed.contains(&movement.id) && rules.is_eligible(record, movement));

        match candidate {
            Some(movement) => {
                consumed.insert(movement.id);
                results.push(MatchResult::Match {
                    record: record.clone(),
                    movement: movement.clone(),
                });
            }
            None => results.push(MatchResult::Discrepancy {
                record: record.clone(),
            }),
        }
    }

    results.extend(
        movements
            .iter()
            .filter(|movement| !consumed.contains(&movement.id))
            .map(|movement| MatchResult::Missing {
                movement: movement.clone(),
            }),
    );

    let report = ReconciliationReport { results };
    let stats = report.stats();
    tracing::debug!(
        "reconciled {} statement lines against {} movements: {} matches, {} discrepancies, {} missing",
        records.len(),
        movements.len(),
        stats.matches,
        stats.discrepancies,
        stats.missing
    );
    report
}
