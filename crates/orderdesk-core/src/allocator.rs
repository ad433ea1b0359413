//! # Identifier Allocation Rule
//!
//! The legacy schema has no sequences. Every new customer, order and line
//! item receives "highest existing identifier + 1".
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  existing ids:  [3, 7, 5]   ──► max = 7 ──► next = 8                   │
//! │  existing ids:  []          ──► next = 1                               │
//! │                                                                         │
//! │  Dual-key families (customers, orders) also hold a text number that    │
//! │  is kept equal to the id. Both are scanned; the larger one wins.       │
//! │     id 4, number "9"  ──► next = 10                                    │
//! │     id 4, number "K-9" ──► unparsable → 0 ──► next = 5                 │
//! │                                                                         │
//! │  A row already holding i64::MAX leaves no successor: the rule fails    │
//! │  with CoreError::IdentifiersExhausted instead of wrapping.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This module only holds the rule. Running it safely under concurrent
//! writers is the job of `orderdesk-db::allocator`.

use tracing::debug;

use crate::error::{CoreError, CoreResult};

/// Returns `max(extract(row)) + 1`, or 1 when there are no rows.
///
/// ## Example
/// ```rust
/// use orderdesk_core::allocator::next_id;
///
/// assert_eq!(next_id(&[3_i64, 7, 5], |id| *id).unwrap(), 8);
/// assert_eq!(next_id(&Vec::<i64>::new(), |id| *id).unwrap(), 1);
/// ```
///
/// ## Errors
/// `CoreError::IdentifiersExhausted` if the maximum is `i64::MAX`.
pub fn next_id<T>(rows: &[T], extract: impl Fn(&T) -> i64) -> CoreResult<i64> {
    match rows.iter().map(extract).max() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or(CoreError::IdentifiersExhausted { highest: max }),
    }
}

/// Parses a text business number. Unparsable values count as 0.
pub fn parse_business_number(number: &str) -> i64 {
    match number.trim().parse::<i64>() {
        Ok(value) => value,
        Err(_) => {
            debug!(number = %number, "Non-numeric business number treated as 0");
            0
        }
    }
}

/// The allocation key of a dual-key row: the larger of its id and its
/// parsed business number.
#[inline]
pub fn dual_key(id: i64, number: &str) -> i64 {
    id.max(parse_business_number(number))
}

/// [`next_id`] over `(id, number)` pairs of a dual-key family.
pub fn next_dual_id(rows: &[(i64, String)]) -> CoreResult<i64> {
    next_id(rows, |(id, number)| dual_key(*id, number))
}
