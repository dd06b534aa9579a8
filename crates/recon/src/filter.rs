use crate::model::{InventoryRecord, Status};

/// In-memory record filter for listing views.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Keep only these statuses. Empty keeps all.
    pub statuses: Vec<Status>,
    /// Case-insensitive substring over IMEI, model, color and storage.
    pub query: Option<String>,
}

impl RecordFilter {
    pub fn matches(&self, rec: &InventoryRecord) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&rec.status) {
            return false;
        }
        match self.query.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(q) => {
                let q = q.to_lowercase();
                [&rec.imei, &rec.model, &rec.color, &rec.storage]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&q))
            }
        }
    }

    pub fn apply<'a>(&self, records: &'a [InventoryRecord]) -> Vec<&'a InventoryRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<InventoryRecord> {
        let mut a = InventoryRecord::new("1", "356938035643809", Status::Available);
        a.model = "iPhone 13".into();
        a.color = "Midnight".into();
        let mut b = InventoryRecord::new("2", "490154203237518", Status::Sold);
        b.model = "Galaxy S22".into();
        let mut c = InventoryRecord::new("3", "353918053123456", Status::Reserved);
        c.model = "iPhone 12".into();
        c.storage = "256GB".into();
        vec![a, b, c]
    }

    #[test]
    fn empty_filter_keeps_all() {
        let recs = records();
        assert_eq!(RecordFilter::default().apply(&recs).len(), 3);
    }

    #[test]
    fn status_filter() {
        let recs = records();
        let f = RecordFilter { statuses: vec![Status::Sold, Status::Reserved], query: None };
        let ids: Vec<&str> = f.apply(&recs).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[test]
    fn query_is_case_insensitive() {
        let recs = records();
        let f = RecordFilter { statuses: vec![], query: Some("IPHONE".into()) };
        assert_eq!(f.apply(&recs).len(), 2);
        let f = RecordFilter { statuses: vec![], query: Some("256gb".into()) };
        assert_eq!(f.apply(&recs)[0].id, "3");
        let f = RecordFilter { statuses: vec![], query: Some("4901".into()) };
        assert_eq!(f.apply(&recs)[0].id, "2");
    }

    #[test]
    fn combined_filter() {
        let recs = records();
        let f = RecordFilter { statuses: vec![Status::Available], query: Some("iphone".into()) };
        let hits = f.apply(&recs);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");
    }

    #[test]
    fn blank_query_ignored() {
        let recs = records();
        let f = RecordFilter { statuses: vec![], query: Some("   ".into()) };
        assert_eq!(f.apply(&recs).len(), 3);
    }
}
