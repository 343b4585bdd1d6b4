//! Monthly sales series: construction from transaction records and trimming.

use crate::core::record::{drop_duplicates, validate_record, InvalidRecordPolicy, TransactionRecord};
use crate::error::{Result, SalescastError};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A calendar month, the period unit of the sales series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// Create a month; the month number must be in 1..=12.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(SalescastError::InvalidParameter(format!(
                "month number must be in 1..=12, got {month}"
            )));
        }
        Ok(Self { year, month })
    }

    /// The month containing a calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The immediately following calendar month.
    pub fn succ(&self) -> Month {
        if self.month == 12 {
            Month {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Month {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Aggregate counts of what series construction excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BuildReport {
    /// Records supplied by the caller.
    pub input_records: usize,
    /// Exact duplicates removed.
    pub duplicates_dropped: usize,
    /// Records missing a required field.
    pub missing_fields_dropped: usize,
    /// Records whose order date matched no accepted format.
    pub unparseable_dates_dropped: usize,
    /// Month buckets discarded because their total was not positive.
    pub nonpositive_months_dropped: usize,
    /// Records that contributed to the final series.
    pub aggregated_records: usize,
}

/// Result of series construction: the series plus exclusion counts.
#[derive(Debug, Clone)]
pub struct SeriesBuild {
    pub series: MonthlySeries,
    pub report: BuildReport,
}

/// An immutable monthly sales series.
///
/// Months are strictly increasing with no duplicates. Calendar gaps are
/// simply absent, never zero-filled; callers working lag arithmetic over
/// the values must account for sparse months themselves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySeries {
    months: Vec<Month>,
    values: Vec<f64>,
}

impl MonthlySeries {
    /// Construct directly from parallel month/value vectors.
    ///
    /// Validates strictly increasing months, matching lengths, and finite
    /// values.
    pub fn from_parts(months: Vec<Month>, values: Vec<f64>) -> Result<Self> {
        if months.len() != values.len() {
            return Err(SalescastError::InvalidParameter(format!(
                "months and values lengths differ: {} vs {}",
                months.len(),
                values.len()
            )));
        }
        if months.is_empty() {
            return Err(SalescastError::EmptySeries);
        }
        for pair in months.windows(2) {
            if pair[1] <= pair[0] {
                return Err(SalescastError::InvalidParameter(format!(
                    "months must be strictly increasing, got {} after {}",
                    pair[1], pair[0]
                )));
            }
        }
        if let Some(v) = values.iter().find(|v| !v.is_finite()) {
            return Err(SalescastError::InvalidParameter(format!(
                "series values must be finite, got {v}"
            )));
        }
        Ok(Self { months, values })
    }

    /// Build a monthly series from raw transaction records.
    ///
    /// Drops exact duplicates, excludes (or aborts on) records missing a
    /// required field or carrying an unparseable date, buckets by calendar
    /// month, sums sales per bucket, and discards buckets whose total is
    /// not positive.
    pub fn build(
        records: &[TransactionRecord],
        policy: InvalidRecordPolicy,
    ) -> Result<SeriesBuild> {
        let mut report = BuildReport {
            input_records: records.len(),
            ..BuildReport::default()
        };

        let (unique, duplicates) = drop_duplicates(records);
        report.duplicates_dropped = duplicates;

        let mut buckets: BTreeMap<Month, f64> = BTreeMap::new();
        for (index, record) in unique.into_iter().enumerate() {
            if !record.has_required_fields() {
                validate_record(record, index, policy)?;
                report.missing_fields_dropped += 1;
                continue;
            }
            let Some(date) = validate_record(record, index, policy)? else {
                report.unparseable_dates_dropped += 1;
                continue;
            };
            let sales = record.sales.unwrap_or(0.0);
            *buckets.entry(Month::from_date(date)).or_insert(0.0) += sales;
            report.aggregated_records += 1;
        }

        let mut months = Vec::with_capacity(buckets.len());
        let mut values = Vec::with_capacity(buckets.len());
        for (month, total) in buckets {
            if total > 0.0 {
                months.push(month);
                values.push(total);
            } else {
                report.nonpositive_months_dropped += 1;
            }
        }

        if months.is_empty() {
            return Err(SalescastError::EmptySeries);
        }

        let series = MonthlySeries { months, values };
        Ok(SeriesBuild { series, report })
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn months(&self) -> &[Month] {
        &self.months
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// First month of the series. Panics on an empty series (only
    /// reachable by trimming everything away).
    pub fn first_month(&self) -> Month {
        self.months[0]
    }

    /// Last month of the series. Panics on an empty series.
    pub fn last_month(&self) -> Month {
        self.months[self.months.len() - 1]
    }

    /// The (month, value) pair at an index.
    pub fn get(&self, index: usize) -> Option<(Month, f64)> {
        Some((*self.months.get(index)?, *self.values.get(index)?))
    }

    /// The prefix of the series up to and including `end`.
    ///
    /// Used to discard trailing months suspected of incomplete collection
    /// (e.g. a reporting cutoff). The boundary is caller policy, never
    /// auto-detected. Trimming at or beyond the last month returns the
    /// series unchanged.
    pub fn trim(&self, end: Month) -> MonthlySeries {
        let keep = self.months.partition_point(|m| *m <= end);
        MonthlySeries {
            months: self.months[..keep].to_vec(),
            values: self.values[..keep].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::InvalidRecordPolicy;

    fn record(date: &str, sales: f64) -> TransactionRecord {
        TransactionRecord {
            category_id: Some(1),
            category_name: Some("Cleats".to_string()),
            customer_country: Some("Puerto Rico".to_string()),
            department_name: Some("Apparel".to_string()),
            order_country: Some("Japan".to_string()),
            order_region: Some("Eastern Asia".to_string()),
            order_date: Some(date.to_string()),
            item_quantity: Some(1),
            sales: Some(sales),
        }
    }

    fn month(year: i32, m: u32) -> Month {
        Month::new(year, m).unwrap()
    }

    #[test]
    fn month_ordering_and_succ() {
        assert!(month(2017, 12) < month(2018, 1));
        assert_eq!(month(2017, 12).succ(), month(2018, 1));
        assert_eq!(month(2017, 6).succ(), month(2017, 7));
        assert_eq!(month(2017, 10).to_string(), "2017-10");
    }

    #[test]
    fn month_rejects_bad_month_number() {
        assert!(Month::new(2017, 0).is_err());
        assert!(Month::new(2017, 13).is_err());
    }

    #[test]
    fn build_aggregates_by_calendar_month() {
        let records = vec![
            record("1/05/2017 10:00", 100.0),
            record("1/20/2017 11:00", 50.0),
            record("3/02/2017 09:00", 75.0),
        ];
        let build = MonthlySeries::build(&records, InvalidRecordPolicy::Drop).unwrap();
        let series = build.series;

        assert_eq!(series.months(), &[month(2017, 1), month(2017, 3)]);
        assert_eq!(series.values(), &[150.0, 75.0]);
        assert_eq!(build.report.aggregated_records, 3);
    }

    #[test]
    fn build_gaps_are_absent_not_zero_filled() {
        let records = vec![record("2017-01-05", 10.0), record("2017-04-05", 20.0)];
        let build = MonthlySeries::build(&records, InvalidRecordPolicy::Drop).unwrap();

        assert_eq!(build.series.len(), 2);
        assert_eq!(
            build.series.months(),
            &[month(2017, 1), month(2017, 4)]
        );
    }

    #[test]
    fn build_drops_duplicates_and_invalid_records() {
        let mut no_sales = record("2017-02-01", 1.0);
        no_sales.sales = None;
        let records = vec![
            record("2017-01-05", 10.0),
            record("2017-01-05", 10.0),
            no_sales,
            record("garbage", 5.0),
        ];
        let build = MonthlySeries::build(&records, InvalidRecordPolicy::Drop).unwrap();

        assert_eq!(build.report.input_records, 4);
        assert_eq!(build.report.duplicates_dropped, 1);
        assert_eq!(build.report.missing_fields_dropped, 1);
        assert_eq!(build.report.unparseable_dates_dropped, 1);
        assert_eq!(build.series.values(), &[10.0]);
    }

    #[test]
    fn build_abort_policy_propagates() {
        let records = vec![record("garbage", 5.0)];
        let err = MonthlySeries::build(&records, InvalidRecordPolicy::Abort).unwrap_err();
        assert!(matches!(err, SalescastError::DataQuality(_)));
    }

    #[test]
    fn build_discards_nonpositive_months() {
        let records = vec![
            record("2017-01-05", 10.0),
            record("2017-02-05", 30.0),
            record("2017-02-06", -30.0),
        ];
        let build = MonthlySeries::build(&records, InvalidRecordPolicy::Drop).unwrap();

        assert_eq!(build.series.months(), &[month(2017, 1)]);
        assert_eq!(build.report.nonpositive_months_dropped, 1);
    }

    #[test]
    fn build_is_idempotent() {
        let records: Vec<TransactionRecord> = (1..=9)
            .map(|m| record(&format!("2017-{m:02}-10"), 100.0 * m as f64))
            .collect();
        let first = MonthlySeries::build(&records, InvalidRecordPolicy::Drop).unwrap();
        let second = MonthlySeries::build(&records, InvalidRecordPolicy::Drop).unwrap();
        assert_eq!(first.series, second.series);
    }

    #[test]
    fn build_empty_input_is_an_error() {
        let err = MonthlySeries::build(&[], InvalidRecordPolicy::Drop).unwrap_err();
        assert_eq!(err, SalescastError::EmptySeries);
    }

    #[test]
    fn from_parts_validates_ordering() {
        let err = MonthlySeries::from_parts(
            vec![month(2017, 3), month(2017, 2)],
            vec![1.0, 2.0],
        )
        .unwrap_err();
        assert!(matches!(err, SalescastError::InvalidParameter(_)));

        let err = MonthlySeries::from_parts(
            vec![month(2017, 3), month(2017, 3)],
            vec![1.0, 2.0],
        )
        .unwrap_err();
        assert!(matches!(err, SalescastError::InvalidParameter(_)));
    }

    #[test]
    fn from_parts_rejects_non_finite_values() {
        let err = MonthlySeries::from_parts(vec![month(2017, 1)], vec![f64::NAN]).unwrap_err();
        assert!(matches!(err, SalescastError::InvalidParameter(_)));
    }

    #[test]
    fn trim_before_last_shortens() {
        let months: Vec<Month> = (1..=6).map(|m| month(2017, m)).collect();
        let values: Vec<f64> = (1..=6).map(|v| v as f64).collect();
        let series = MonthlySeries::from_parts(months, values).unwrap();

        let trimmed = series.trim(month(2017, 4));
        assert_eq!(trimmed.len(), 4);
        assert_eq!(trimmed.last_month(), month(2017, 4));
    }

    #[test]
    fn trim_beyond_last_is_a_no_op() {
        let months: Vec<Month> = (1..=6).map(|m| month(2017, m)).collect();
        let values: Vec<f64> = (1..=6).map(|v| v as f64).collect();
        let series = MonthlySeries::from_parts(months, values).unwrap();

        assert_eq!(series.trim(month(2018, 1)), series);
        assert_eq!(series.trim(month(2017, 6)), series);
    }

    #[test]
    fn trim_boundary_need_not_be_present() {
        // Gap series: trimming to an absent month keeps everything before it.
        let series = MonthlySeries::from_parts(
            vec![month(2017, 1), month(2017, 4), month(2017, 7)],
            vec![1.0, 2.0, 3.0],
        )
        .unwrap();

        let trimmed = series.trim(month(2017, 5));
        assert_eq!(trimmed.months(), &[month(2017, 1), month(2017, 4)]);
    }
}
