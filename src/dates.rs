use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::EngineError;

/// Wire format for all calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` string, naming the offending field on failure.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, EngineError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        EngineError::Validation(format!("{field}: {value:?} is not a YYYY-MM-DD date"))
    })
}

/// Half-open stay interval `[arrival, departure)` in calendar days.
/// The departure day is not occupied, so back-to-back stays on the same
/// room type do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRange {
    pub arrival: NaiveDate,
    pub departure: NaiveDate,
}

impl StayRange {
    /// A bookable stay: at least one night, departure strictly after arrival.
    pub fn new(arrival: NaiveDate, departure: NaiveDate) -> Result<Self, EngineError> {
        if departure <= arrival {
            return Err(EngineError::Validation(format!(
                "departure_date {departure} must be after arrival_date {arrival}"
            )));
        }
        Ok(Self { arrival, departure })
    }

    /// An availability query window. Unlike a stay, the degenerate
    /// zero-width `[d, d)` window is legal.
    pub fn query(arrival: NaiveDate, departure: NaiveDate) -> Result<Self, EngineError> {
        if departure < arrival {
            return Err(EngineError::Validation(format!(
                "check_out {departure} must not be before check_in {arrival}"
            )));
        }
        Ok(Self { arrival, departure })
    }

    pub fn nights(&self) -> i64 {
        (self.departure - self.arrival).num_days()
    }

    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.arrival < other.departure && other.arrival < self.departure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn parse_valid_date() {
        assert_eq!(parse_date("arrival_date", "2025-12-05").unwrap(), d("2025-12-05"));
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["12/05/2025", "2025-13-01", "2025-12-5x", "", "tomorrow"] {
            let err = parse_date("check_in", bad).unwrap_err();
            assert!(matches!(err, EngineError::Validation(_)), "{bad:?} should fail");
        }
    }

    #[test]
    fn stay_requires_at_least_one_night() {
        assert!(StayRange::new(d("2025-12-05"), d("2025-12-05")).is_err());
        assert!(StayRange::new(d("2025-12-05"), d("2025-12-04")).is_err());
        assert!(StayRange::new(d("2025-12-05"), d("2025-12-06")).is_ok());
    }

    #[test]
    fn query_allows_zero_width() {
        assert!(StayRange::query(d("2025-12-05"), d("2025-12-05")).is_ok());
        assert!(StayRange::query(d("2025-12-05"), d("2025-12-04")).is_err());
    }

    #[test]
    fn overlap_basics() {
        let a = StayRange::new(d("2025-12-01"), d("2025-12-05")).unwrap();
        let b = StayRange::new(d("2025-12-04"), d("2025-12-08")).unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn back_to_back_not_overlapping() {
        // One stay departs the day the next arrives — half-open, no overlap.
        let a = StayRange::new(d("2025-12-01"), d("2025-12-03")).unwrap();
        let b = StayRange::new(d("2025-12-03"), d("2025-12-05")).unwrap();
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn zero_width_query_overlap() {
        let q = StayRange::query(d("2025-12-05"), d("2025-12-05")).unwrap();
        // A stay strictly spanning the day overlaps the zero-width window.
        let spanning = StayRange::new(d("2025-12-04"), d("2025-12-06")).unwrap();
        assert!(spanning.overlaps(&q));
        // A stay arriving that day does not (its arrival is not before q.departure).
        let arriving = StayRange::new(d("2025-12-05"), d("2025-12-07")).unwrap();
        assert!(!arriving.overlaps(&q));
        // A stay departing that day does not either.
        let departing = StayRange::new(d("2025-12-03"), d("2025-12-05")).unwrap();
        assert!(!departing.overlaps(&q));
    }

    #[test]
    fn nights_count() {
        let stay = StayRange::new(d("2025-12-01"), d("2025-12-04")).unwrap();
        assert_eq!(stay.nights(), 3);
    }
}
