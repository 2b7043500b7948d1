//! Reporting periods
//!
//! Two ways of cutting a date range into contiguous, non-overlapping periods:
//!
//! - [`cadence_periods`] steps from the range start at a reporting frequency,
//!   so a monthly cadence starting on the 15th yields 15th-to-14th periods;
//! - [`calendar_periods`] aligns buckets to calendar boundaries (ISO weeks
//!   start on Monday) and clips the first and last bucket to the range.
//!
//! All bounds are inclusive calendar dates.

use chrono::{Datelike, Duration, Months, NaiveDate};
use indicator_types::Frequency;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{AnalyticsError, Result};

/// Calendar bucket size for time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        };
        f.write_str(name)
    }
}

impl FromStr for GroupBy {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(Self::Day),
            "week" | "weekly" => Ok(Self::Week),
            "month" | "monthly" => Ok(Self::Month),
            "quarter" | "quarterly" => Ok(Self::Quarter),
            "year" | "yearly" => Ok(Self::Year),
            _ => Err(AnalyticsError::InvalidParameter(format!(
                "unknown groupBy '{}'",
                s
            ))),
        }
    }
}

impl From<Frequency> for GroupBy {
    fn from(frequency: Frequency) -> Self {
        match frequency {
            Frequency::Daily => Self::Day,
            Frequency::Weekly => Self::Week,
            Frequency::Monthly => Self::Month,
            Frequency::Quarterly => Self::Quarter,
            Frequency::Yearly => Self::Year,
        }
    }
}

/// An inclusive date interval with a display label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Period {
    /// Check if a date falls within this period
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{} - {}]", self.label, self.start_date, self.end_date)
    }
}

/// Reject inverted ranges
pub fn check_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(AnalyticsError::InvalidRange { start, end });
    }
    Ok(())
}

/// Step from `start` to `end` at the given reporting frequency
pub fn cadence_periods(
    frequency: Frequency,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Period>> {
    check_range(start, end)?;

    let mut periods = Vec::new();
    let mut index: u32 = 0;
    // Offsets are taken from the anchor so month-end clamping does not drift
    while let Some(period_start) = cadence_step(frequency, start, index) {
        if period_start > end {
            break;
        }
        let next = cadence_step(frequency, start, index + 1);
        let period_end = next
            .and_then(|n| n.pred_opt())
            .map_or(end, |last| last.min(end));

        periods.push(Period {
            label: period_start.format("%Y-%m-%d").to_string(),
            start_date: period_start,
            end_date: period_end,
        });

        if next.is_none() {
            break;
        }
        index += 1;
    }

    Ok(periods)
}

fn cadence_step(frequency: Frequency, anchor: NaiveDate, index: u32) -> Option<NaiveDate> {
    match frequency {
        Frequency::Daily => anchor.checked_add_signed(Duration::days(index as i64)),
        Frequency::Weekly => anchor.checked_add_signed(Duration::days(7 * index as i64)),
        Frequency::Monthly => anchor.checked_add_months(Months::new(index)),
        Frequency::Quarterly => anchor.checked_add_months(Months::new(index.checked_mul(3)?)),
        Frequency::Yearly => anchor.checked_add_months(Months::new(index.checked_mul(12)?)),
    }
}

/// Calendar-aligned buckets covering `[start, end]`
pub fn calendar_periods(group_by: GroupBy, start: NaiveDate, end: NaiveDate) -> Result<Vec<Period>> {
    check_range(start, end)?;

    let mut periods = Vec::new();
    let mut cursor = start;
    loop {
        let bucket_start = align(group_by, cursor);
        let next_bucket = next_boundary(group_by, bucket_start);
        let bucket_end = next_bucket.and_then(|n| n.pred_opt()).unwrap_or(end);

        periods.push(Period {
            label: label(group_by, bucket_start),
            start_date: cursor,
            end_date: bucket_end.min(end),
        });

        match next_bucket {
            Some(next) if next <= end => cursor = next,
            _ => break,
        }
    }

    Ok(periods)
}

/// Index of the period containing `date`, for sorted contiguous periods
pub fn locate(periods: &[Period], date: NaiveDate) -> Option<usize> {
    let index = periods.partition_point(|p| p.end_date < date);
    periods.get(index).filter(|p| p.contains(date)).map(|_| index)
}

fn align(group_by: GroupBy, date: NaiveDate) -> NaiveDate {
    let aligned = match group_by {
        GroupBy::Day => Some(date),
        GroupBy::Week => {
            date.checked_sub_signed(Duration::days(date.weekday().num_days_from_monday() as i64))
        }
        GroupBy::Month => date.with_day(1),
        GroupBy::Quarter => {
            NaiveDate::from_ymd_opt(date.year(), quarter_first_month(date.month()), 1)
        }
        GroupBy::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
    };
    aligned.unwrap_or(date)
}

fn next_boundary(group_by: GroupBy, bucket_start: NaiveDate) -> Option<NaiveDate> {
    match group_by {
        GroupBy::Day => bucket_start.succ_opt(),
        GroupBy::Week => bucket_start.checked_add_signed(Duration::days(7)),
        GroupBy::Month => bucket_start.checked_add_months(Months::new(1)),
        GroupBy::Quarter => bucket_start.checked_add_months(Months::new(3)),
        GroupBy::Year => bucket_start.checked_add_months(Months::new(12)),
    }
}

fn quarter_first_month(month: u32) -> u32 {
    (month - 1) / 3 * 3 + 1
}

fn label(group_by: GroupBy, bucket_start: NaiveDate) -> String {
    match group_by {
        GroupBy::Day => bucket_start.format("%Y-%m-%d").to_string(),
        GroupBy::Week => {
            let week = bucket_start.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        GroupBy::Month => bucket_start.format("%Y-%m").to_string(),
        GroupBy::Quarter => format!(
            "{}-Q{}",
            bucket_start.year(),
            (bucket_start.month() - 1) / 3 + 1
        ),
        GroupBy::Year => bucket_start.year().to_string(),
    }
}
