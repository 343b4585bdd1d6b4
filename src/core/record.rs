//! Transaction records and record-level cleaning.

use crate::error::{Result, SalescastError};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Date formats accepted for the order-date field, tried in order.
///
/// The first entry matches the upstream export format (`M/D/YYYY H:MM`);
/// the rest cover common ISO renderings.
const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// One row of the supply-chain transaction log.
///
/// Sales amount and order date are required for series construction;
/// everything else is carried for rollups and passes through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub category_id: Option<u32>,
    pub category_name: Option<String>,
    pub customer_country: Option<String>,
    pub department_name: Option<String>,
    pub order_country: Option<String>,
    pub order_region: Option<String>,
    /// Raw order-date string as recorded upstream.
    pub order_date: Option<String>,
    pub item_quantity: Option<u32>,
    pub sales: Option<f64>,
}

/// Hashable identity of a record, used for exact-duplicate detection.
type RecordKey<'a> = (
    Option<u32>,
    Option<&'a str>,
    Option<&'a str>,
    Option<&'a str>,
    Option<&'a str>,
    Option<&'a str>,
    Option<&'a str>,
    Option<u32>,
    Option<u64>,
);

impl TransactionRecord {
    /// Parse the order-date field into a calendar date.
    ///
    /// Returns `None` when the field is absent or matches no accepted format.
    pub fn parse_order_date(&self) -> Option<NaiveDate> {
        let raw = self.order_date.as_deref()?.trim();
        for fmt in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Some(dt.date());
            }
        }
        for fmt in DATE_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
                return Some(d);
            }
        }
        None
    }

    /// Whether both required fields are present (date still unparsed).
    pub fn has_required_fields(&self) -> bool {
        self.order_date.is_some() && self.sales.map(f64::is_finite).unwrap_or(false)
    }

    fn key(&self) -> RecordKey<'_> {
        (
            self.category_id,
            self.category_name.as_deref(),
            self.customer_country.as_deref(),
            self.department_name.as_deref(),
            self.order_country.as_deref(),
            self.order_region.as_deref(),
            self.order_date.as_deref(),
            self.item_quantity,
            self.sales.map(f64::to_bits),
        )
    }
}

/// Policy for records with missing or malformed required fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidRecordPolicy {
    /// Exclude the record and count it in the build report.
    #[default]
    Drop,
    /// Abort series construction with a `DataQuality` error.
    Abort,
}

/// Drop exact-duplicate records, preserving first occurrences.
///
/// Returns the deduplicated records and the number removed.
pub fn drop_duplicates(records: &[TransactionRecord]) -> (Vec<&TransactionRecord>, usize) {
    let mut seen = HashSet::with_capacity(records.len());
    let mut kept = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(record.key()) {
            kept.push(record);
        }
    }
    let dropped = records.len() - kept.len();
    (kept, dropped)
}

/// Validate a record's required fields, honoring the policy.
///
/// `Ok(Some(date))` means the record is usable; `Ok(None)` means it was
/// excluded under [`InvalidRecordPolicy::Drop`].
pub fn validate_record(
    record: &TransactionRecord,
    index: usize,
    policy: InvalidRecordPolicy,
) -> Result<Option<NaiveDate>> {
    if !record.has_required_fields() {
        return match policy {
            InvalidRecordPolicy::Drop => Ok(None),
            InvalidRecordPolicy::Abort => Err(SalescastError::DataQuality(format!(
                "record {index} is missing a required field (order date or sales amount)"
            ))),
        };
    }
    match record.parse_order_date() {
        Some(date) => Ok(Some(date)),
        None => match policy {
            InvalidRecordPolicy::Drop => Ok(None),
            InvalidRecordPolicy::Abort => Err(SalescastError::DataQuality(format!(
                "record {index} has an unparseable order date: {:?}",
                record.order_date.as_deref().unwrap_or("")
            ))),
        },
    }
}

/// Total sales per category name, sorted ascending by total.
///
/// Records without a category or a finite sales amount are skipped.
pub fn category_sales(records: &[TransactionRecord]) -> Vec<(String, f64)> {
    sum_by(records, |r| r.category_name.as_deref())
}

/// Total sales per order region, sorted ascending by total.
pub fn region_sales(records: &[TransactionRecord]) -> Vec<(String, f64)> {
    sum_by(records, |r| r.order_region.as_deref())
}

fn sum_by<'a, F>(records: &'a [TransactionRecord], group: F) -> Vec<(String, f64)>
where
    F: Fn(&'a TransactionRecord) -> Option<&'a str>,
{
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for record in records {
        let (Some(key), Some(sales)) = (group(record), record.sales) else {
            continue;
        };
        if sales.is_finite() {
            *totals.entry(key).or_insert(0.0) += sales;
        }
    }
    let mut out: Vec<(String, f64)> = totals
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    out.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, sales: f64) -> TransactionRecord {
        TransactionRecord {
            category_id: Some(17),
            category_name: Some("Cleats".to_string()),
            customer_country: Some("EE. UU.".to_string()),
            department_name: Some("Apparel".to_string()),
            order_country: Some("Japan".to_string()),
            order_region: Some("Eastern Asia".to_string()),
            order_date: Some(date.to_string()),
            item_quantity: Some(1),
            sales: Some(sales),
        }
    }

    #[test]
    fn parses_upstream_datetime_format() {
        let r = record("1/31/2018 22:56", 100.0);
        let d = r.parse_order_date().unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2018, 1, 31).unwrap());
    }

    #[test]
    fn parses_iso_dates() {
        let r = record("2017-10-05", 100.0);
        assert_eq!(
            r.parse_order_date(),
            Some(NaiveDate::from_ymd_opt(2017, 10, 5).unwrap())
        );

        let r = record("2017-10-05 08:30:00", 100.0);
        assert_eq!(
            r.parse_order_date(),
            Some(NaiveDate::from_ymd_opt(2017, 10, 5).unwrap())
        );
    }

    #[test]
    fn rejects_garbage_dates() {
        let r = record("not a date", 100.0);
        assert!(r.parse_order_date().is_none());
    }

    #[test]
    fn required_fields_detect_missing_sales() {
        let mut r = record("2017-10-05", 100.0);
        assert!(r.has_required_fields());

        r.sales = None;
        assert!(!r.has_required_fields());

        r.sales = Some(f64::NAN);
        assert!(!r.has_required_fields());
    }

    #[test]
    fn drop_duplicates_keeps_first_occurrence() {
        let records = vec![
            record("2017-10-05", 100.0),
            record("2017-10-05", 100.0),
            record("2017-10-06", 50.0),
        ];
        let (kept, dropped) = drop_duplicates(&records);
        assert_eq!(kept.len(), 2);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn near_duplicates_are_not_dropped() {
        let mut second = record("2017-10-05", 100.0);
        second.item_quantity = Some(2);
        let records = vec![record("2017-10-05", 100.0), second];
        let (kept, dropped) = drop_duplicates(&records);
        assert_eq!(kept.len(), 2);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn validate_drop_policy_excludes_silently() {
        let mut r = record("2017-10-05", 100.0);
        r.sales = None;
        let outcome = validate_record(&r, 0, InvalidRecordPolicy::Drop).unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn validate_abort_policy_raises_data_quality() {
        let r = record("bogus", 100.0);
        let err = validate_record(&r, 4, InvalidRecordPolicy::Abort).unwrap_err();
        assert!(matches!(err, SalescastError::DataQuality(_)));
        assert!(err.to_string().contains("record 4"));
    }

    #[test]
    fn category_sales_sums_and_sorts_ascending() {
        let mut a = record("2017-10-05", 100.0);
        a.category_name = Some("Fishing".to_string());
        let b = record("2017-10-06", 30.0);
        let c = record("2017-10-07", 20.0);

        let totals = category_sales(&[a, b, c]);
        assert_eq!(
            totals,
            vec![("Cleats".to_string(), 50.0), ("Fishing".to_string(), 100.0)]
        );
    }

    #[test]
    fn region_sales_skips_missing_regions() {
        let mut a = record("2017-10-05", 100.0);
        a.order_region = None;
        let b = record("2017-10-06", 40.0);

        let totals = region_sales(&[a, b]);
        assert_eq!(totals, vec![("Eastern Asia".to_string(), 40.0)]);
    }
}
