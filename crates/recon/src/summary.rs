use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{InventoryRecord, Status};

/// Count and cost for one status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusTotals {
    pub count: usize,
    pub cost_cents: i64,
}

/// Stock dashboard numbers: how many devices sit in each status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    /// Every status is present, zero included.
    pub by_status: BTreeMap<Status, StatusTotals>,
    pub total_records: usize,
    pub total_cost_cents: i64,
    /// Devices that a stock check would expect on the shelf.
    pub scannable: usize,
}

impl StatusSummary {
    pub fn from_records(records: &[InventoryRecord]) -> Self {
        let mut by_status: BTreeMap<Status, StatusTotals> =
            Status::ALL.iter().map(|s| (*s, StatusTotals::default())).collect();
        let mut total_cost_cents = 0i64;

        for rec in records {
            let entry = by_status.entry(rec.status).or_default();
            entry.count += 1;
            entry.cost_cents += rec.cost_cents;
            total_cost_cents += rec.cost_cents;
        }

        let scannable = by_status
            .iter()
            .filter(|(s, _)| s.is_scannable())
            .map(|(_, t)| t.count)
            .sum();

        Self {
            by_status,
            total_records: records.len(),
            total_cost_cents,
            scannable,
        }
    }

    pub fn get(&self, status: Status) -> StatusTotals {
        self.by_status.get(&status).copied().unwrap_or_default()
    }
}

/// Format minor units as a decimal amount, e.g. `-1234` → `"-12.34"`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, status: Status, cost: i64) -> InventoryRecord {
        let mut r = InventoryRecord::new(id, format!("imei-{id}"), status);
        r.cost_cents = cost;
        r
    }

    #[test]
    fn summary_counts() {
        let records = vec![
            rec("1", Status::Available, 10000),
            rec("2", Status::Available, 25050),
            rec("3", Status::Sold, 9900),
            rec("4", Status::InternalRepair, 5000),
            rec("5", Status::Lost, 100),
        ];
        let summary = StatusSummary::from_records(&records);
        assert_eq!(summary.total_records, 5);
        assert_eq!(summary.get(Status::Available), StatusTotals { count: 2, cost_cents: 35050 });
        assert_eq!(summary.get(Status::Sold).count, 1);
        assert_eq!(summary.get(Status::Reserved).count, 0);
        assert_eq!(summary.scannable, 3);
        assert_eq!(summary.total_cost_cents, 50050);
        assert_eq!(summary.by_status.len(), Status::ALL.len());
    }

    #[test]
    fn empty_summary() {
        let summary = StatusSummary::from_records(&[]);
        assert_eq!(summary.total_records, 0);
        assert_eq!(summary.scannable, 0);
    }

    #[test]
    fn cents_formatting() {
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(123456), "1234.56");
        assert_eq!(format_cents(-1234), "-12.34");
    }
}
