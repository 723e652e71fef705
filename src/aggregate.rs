//! Pure aggregation over the sales dataset
//!
//! Everything here is deterministic and free of I/O so the numbers shown to
//! the partner can be pinned down by unit tests. The most-frequent-item
//! count breaks ties by first occurrence in input order, never by container
//! iteration order.

use crate::data::{DataError, SalesRecord};
use std::collections::HashMap;

/// Descriptive statistics over one sales dataset
#[derive(Debug, Clone, PartialEq)]
pub struct SalesSummary {
    /// Number of orders
    pub record_count: usize,
    /// Sum of the order totals
    pub total_value: f64,
    /// Most frequent item across all orders, if any item exists
    pub top_item: Option<String>,
}

impl SalesSummary {
    /// Compute the summary for `records`.
    ///
    /// A non-numeric `total_value` cell fails the whole aggregation:
    /// under- or over-reporting revenue silently would be worse than an
    /// explicit error.
    pub fn compute(records: &[SalesRecord], separator: char) -> Result<Self, DataError> {
        let mut total_value = 0.0f64;
        for record in records {
            let value: f64 =
                record
                    .total_value
                    .parse()
                    .map_err(|_| DataError::BadTotal {
                        customer: record.customer.clone(),
                        value: record.total_value.clone(),
                    })?;
            total_value += value;
        }

        Ok(Self {
            record_count: records.len(),
            total_value,
            top_item: most_frequent_item(records.iter().map(|r| r.items.as_str()), separator),
        })
    }

    /// Sentinel-friendly view of the top item.
    pub fn top_item_label(&self) -> &str {
        self.top_item.as_deref().unwrap_or("N/A")
    }
}

/// Most frequent token across all `values`, each split on `separator`.
///
/// Tokens are trimmed and empty tokens dropped. Ties go to the token that
/// occurred first in input order. Returns `None` when no token exists.
pub fn most_frequent_item<'a>(
    values: impl Iterator<Item = &'a str>,
    separator: char,
) -> Option<String> {
    let mut counts: HashMap<&'a str, usize> = HashMap::new();
    let mut first_seen: Vec<&'a str> = Vec::new();

    for value in values {
        for token in value.split(separator) {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let count = counts.entry(token).or_insert(0);
            if *count == 0 {
                first_seen.push(token);
            }
            *count += 1;
        }
    }

    // Scan in first-seen order and only replace on a strictly higher count,
    // so a tie goes to the earliest token.
    let mut best: Option<&str> = None;
    let mut best_count = 0usize;
    for token in first_seen {
        let count = counts[token];
        if count > best_count {
            best = Some(token);
            best_count = count;
        }
    }
    best.map(str::to_string)
}

/// The favorite item of a single customer, or `None` if they have no items.
pub fn favorite_item(
    records: &[SalesRecord],
    customer: &str,
    separator: char,
) -> Option<String> {
    most_frequent_item(
        records
            .iter()
            .filter(|r| r.customer == customer)
            .map(|r| r.items.as_str()),
        separator,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(customer: &str, items: &str, total: &str) -> SalesRecord {
        SalesRecord {
            customer: customer.to_string(),
            items: items.to_string(),
            total_value: total.to_string(),
        }
    }

    #[test]
    fn summary_counts_sums_and_picks_top_item() {
        let records = vec![
            order("Ana", "Pizza+Suco", "50.0"),
            order("Ana", "Pizza", "30.0"),
        ];
        let summary = SalesSummary::compute(&records, '+').unwrap();
        assert_eq!(summary.record_count, 2);
        assert_eq!(summary.total_value, 80.0);
        assert_eq!(summary.top_item.as_deref(), Some("Pizza"));
    }

    #[test]
    fn empty_dataset_gets_sentinel_top_item() {
        let summary = SalesSummary::compute(&[], '+').unwrap();
        assert_eq!(summary.record_count, 0);
        assert_eq!(summary.total_value, 0.0);
        assert_eq!(summary.top_item, None);
        assert_eq!(summary.top_item_label(), "N/A");
    }

    #[test]
    fn tie_breaks_by_first_occurrence() {
        // "A" and "B" both occur twice; "A" was seen first.
        let top = most_frequent_item(["A+B", "B+A"].into_iter(), '+');
        assert_eq!(top.as_deref(), Some("A"));
    }

    #[test]
    fn tokens_are_trimmed_and_empties_dropped() {
        let top = most_frequent_item(["  Pizza + ", "+Pizza+Suco"].into_iter(), '+');
        assert_eq!(top.as_deref(), Some("Pizza"));
    }

    #[test]
    fn compute_is_pure() {
        let records = vec![
            order("Ana", "Pizza+Suco", "50.0"),
            order("Bruno", "Suco", "8.0"),
        ];
        let first = SalesSummary::compute(&records, '+').unwrap();
        let second = SalesSummary::compute(&records, '+').unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn non_numeric_total_fails_the_whole_aggregation() {
        let records = vec![
            order("Ana", "Pizza", "50.0"),
            order("Bruno", "Suco", "oito reais"),
        ];
        let err = SalesSummary::compute(&records, '+').unwrap_err();
        assert!(matches!(err, crate::data::DataError::BadTotal { .. }));
    }

    #[test]
    fn favorite_item_is_per_customer() {
        let records = vec![
            order("Ana", "Pizza+Suco", "50.0"),
            order("Bruno", "Hamburguer", "32.0"),
            order("Ana", "Pizza", "30.0"),
        ];
        assert_eq!(favorite_item(&records, "Ana", '+').as_deref(), Some("Pizza"));
        assert_eq!(
            favorite_item(&records, "Bruno", '+').as_deref(),
            Some("Hamburguer")
        );
        assert_eq!(favorite_item(&records, "Carla", '+'), None);
    }
}
