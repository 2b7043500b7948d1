//! Per-indicator submission series
//!
//! Submissions live in an append-only arena in arrival order. A separate
//! index keeps arena slots sorted by `reported_at`, ties broken by arrival,
//! so trailing windows are read by walking back from a position in the index.

use chrono::NaiveDate;
use indicator_types::Submission;

/// Where an inserted submission landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Chronological position of the new submission
    pub position: usize,
    /// True when later-dated submissions already existed
    pub out_of_order: bool,
}

/// Chronologically indexed submissions for one indicator
#[derive(Debug, Clone, Default)]
pub struct SubmissionSeries {
    arena: Vec<Submission>,
    numeric: Vec<Option<f64>>,
    order: Vec<usize>,
}

impl SubmissionSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from submissions in arrival order
    pub fn from_submissions(submissions: impl IntoIterator<Item = Submission>) -> Self {
        let mut series = Self::new();
        for submission in submissions {
            series.push(submission);
        }
        series
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Append to the arena and index the submission by date
    pub fn push(&mut self, submission: Submission) -> Placement {
        let reported_at = submission.reported_at;
        let position = self
            .order
            .partition_point(|&slot| self.arena[slot].reported_at <= reported_at);
        let out_of_order = position < self.order.len();

        let slot = self.arena.len();
        self.numeric.push(submission.numeric_value());
        self.arena.push(submission);
        self.order.insert(position, slot);

        Placement {
            position,
            out_of_order,
        }
    }

    /// Submission at a chronological position
    pub fn get(&self, position: usize) -> Option<&Submission> {
        self.order.get(position).map(|&slot| &self.arena[slot])
    }

    pub(crate) fn get_mut(&mut self, position: usize) -> Option<&mut Submission> {
        let slot = *self.order.get(position)?;
        self.arena.get_mut(slot)
    }

    /// Numeric value at a chronological position, if it parses as finite
    pub fn numeric_at(&self, position: usize) -> Option<f64> {
        self.order
            .get(position)
            .and_then(|&slot| self.numeric[slot])
    }

    /// Chronological iterator over the submissions
    pub fn iter(&self) -> impl Iterator<Item = &Submission> + '_ {
        self.order.iter().map(move |&slot| &self.arena[slot])
    }

    /// Up to `limit` most recent numeric values strictly before `position`,
    /// oldest first
    pub fn values_before(&self, position: usize, limit: usize) -> Vec<f64> {
        let end = position.min(self.order.len());
        let mut window: Vec<f64> = self.order[..end]
            .iter()
            .rev()
            .filter_map(|&slot| self.numeric[slot])
            .take(limit)
            .collect();
        window.reverse();
        window
    }

    /// All finite numeric values with their dates, oldest first
    pub fn dated_values(&self) -> Vec<(NaiveDate, f64)> {
        self.order
            .iter()
            .filter_map(|&slot| self.numeric[slot].map(|v| (self.arena[slot].reported_at, v)))
            .collect()
    }

    /// Consume the series, returning submissions in chronological order
    pub fn into_submissions(self) -> Vec<Submission> {
        let mut slots: Vec<Option<Submission>> = self.arena.into_iter().map(Some).collect();
        self.order
            .iter()
            .filter_map(|&slot| slots[slot].take())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_in_order_push() {
        let mut series = SubmissionSeries::new();
        for d in 1..=3 {
            let placement = series.push(Submission::numeric(date(d), d as f64));
            assert_eq!(placement.position, (d - 1) as usize);
            assert!(!placement.out_of_order);
        }
        assert_eq!(series.len(), 3);
        assert_eq!(series.values_before(3, 10), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_backfill_is_placed_chronologically() {
        let mut series = SubmissionSeries::new();
        series.push(Submission::numeric(date(1), 1.0));
        series.push(Submission::numeric(date(5), 5.0));
        let placement = series.push(Submission::numeric(date(3), 3.0));

        assert_eq!(placement.position, 1);
        assert!(placement.out_of_order);
        let dates: Vec<NaiveDate> = series.iter().map(|s| s.reported_at).collect();
        assert_eq!(dates, vec![date(1), date(3), date(5)]);
    }

    #[test]
    fn test_ties_keep_arrival_order() {
        let mut series = SubmissionSeries::new();
        series.push(Submission::new(date(2), "first"));
        let placement = series.push(Submission::new(date(2), "second"));
        assert_eq!(placement.position, 1);
        assert!(!placement.out_of_order);
        assert_eq!(series.get(0).unwrap().value, "first");
        assert_eq!(series.get(1).unwrap().value, "second");
    }

    #[test]
    fn test_values_before_skips_non_numeric() {
        let series = SubmissionSeries::from_submissions(vec![
            Submission::numeric(date(1), 1.0),
            Submission::new(date(2), "missing"),
            Submission::numeric(date(3), 3.0),
            Submission::numeric(date(4), 4.0),
        ]);
        assert_eq!(series.values_before(4, 2), vec![3.0, 4.0]);
        assert_eq!(series.values_before(3, 5), vec![1.0, 3.0]);
        assert!(series.values_before(0, 5).is_empty());
        assert_eq!(series.numeric_at(1), None);
    }

    #[test]
    fn test_into_submissions_chronological() {
        let series = SubmissionSeries::from_submissions(vec![
            Submission::numeric(date(9), 9.0),
            Submission::numeric(date(2), 2.0),
            Submission::numeric(date(4), 4.0),
        ]);
        let values: Vec<String> = series.into_submissions().into_iter().map(|s| s.value).collect();
        assert_eq!(values, vec!["2", "4", "9"]);
    }
}
