//! Rebalance schedules
//!
//! A schedule splits the return history into consecutive blocks. Weights are
//! computed at the first row of each block and held unchanged until the next
//! block starts. The first row always opens a block.

use crate::error::{BacktestError, Result};
use chrono::{Datelike, NaiveDate};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// When to recompute weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceRule {
    /// Every period
    #[display("every")]
    EveryPeriod,
    /// Every n periods
    #[display("every {_0}")]
    Every(usize),
    /// First period of each ISO week
    #[display("weekly")]
    Weekly,
    /// First period of each calendar month
    #[default]
    #[display("monthly")]
    Monthly,
}

impl RebalanceRule {
    /// Row indices at which a new block starts, in increasing order
    ///
    /// # Errors
    /// `InvalidRebalance` for `Every(0)`.
    pub fn rebalance_points(&self, dates: &[NaiveDate]) -> Result<Vec<usize>> {
        let points = match *self {
            Self::EveryPeriod => (0..dates.len()).collect(),
            Self::Every(0) => {
                return Err(BacktestError::InvalidRebalance(
                    "period count must be positive".to_string(),
                ));
            }
            Self::Every(n) => (0..dates.len()).step_by(n).collect(),
            Self::Weekly => boundaries(dates, |d| d.iso_week()),
            Self::Monthly => boundaries(dates, |d| (d.year(), d.month())),
        };
        Ok(points)
    }
}

fn boundaries<K: PartialEq>(dates: &[NaiveDate], key: impl Fn(&NaiveDate) -> K) -> Vec<usize> {
    let mut points = Vec::new();
    let mut previous = None;
    for (i, date) in dates.iter().enumerate() {
        let current = key(date);
        if previous.as_ref() != Some(&current) {
            points.push(i);
        }
        previous = Some(current);
    }
    points
}

impl FromStr for RebalanceRule {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "every" | "every_period" | "daily" => Ok(Self::EveryPeriod),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => {
                let count = other.strip_prefix("every").unwrap_or(other).trim();
                count
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .map(Self::Every)
                    .ok_or_else(|| {
                        BacktestError::InvalidRebalance(format!(
                            "'{s}' (expected every, weekly, monthly or a period count)"
                        ))
                    })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_every_period_and_every_n() {
        let dates: Vec<_> = (1..=7).map(|day| d(2024, 3, day)).collect();
        assert_eq!(
            RebalanceRule::EveryPeriod.rebalance_points(&dates).unwrap(),
            (0..7).collect::<Vec<_>>()
        );
        assert_eq!(
            RebalanceRule::Every(3).rebalance_points(&dates).unwrap(),
            vec![0, 3, 6]
        );
        assert!(matches!(
            RebalanceRule::Every(0).rebalance_points(&dates),
            Err(BacktestError::InvalidRebalance(_))
        ));
    }

    #[test]
    fn test_monthly_boundaries() {
        let dates = vec![
            d(2024, 1, 30),
            d(2024, 1, 31),
            d(2024, 2, 1),
            d(2024, 2, 29),
            d(2024, 3, 4),
            d(2025, 3, 3),
        ];
        assert_eq!(
            RebalanceRule::Monthly.rebalance_points(&dates).unwrap(),
            vec![0, 2, 4, 5]
        );
    }

    #[test]
    fn test_weekly_boundaries() {
        // 2024-01-05 is a Friday, 2024-01-08 a Monday
        let dates = vec![
            d(2024, 1, 4),
            d(2024, 1, 5),
            d(2024, 1, 8),
            d(2024, 1, 12),
            d(2024, 1, 15),
        ];
        assert_eq!(
            RebalanceRule::Weekly.rebalance_points(&dates).unwrap(),
            vec![0, 2, 4]
        );
    }

    #[test]
    fn test_empty_dates() {
        assert!(RebalanceRule::Monthly.rebalance_points(&[]).unwrap().is_empty());
    }

    #[rstest]
    #[case("every", RebalanceRule::EveryPeriod)]
    #[case("Weekly", RebalanceRule::Weekly)]
    #[case("monthly", RebalanceRule::Monthly)]
    #[case("21", RebalanceRule::Every(21))]
    #[case("every 5", RebalanceRule::Every(5))]
    fn test_parse(#[case] input: &str, #[case] expected: RebalanceRule) {
        assert_eq!(input.parse::<RebalanceRule>().unwrap(), expected);
    }

    #[rstest]
    #[case("0")]
    #[case("yearly")]
    #[case("")]
    fn test_parse_rejects(#[case] input: &str) {
        assert!(input.parse::<RebalanceRule>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for rule in [
            RebalanceRule::EveryPeriod,
            RebalanceRule::Every(10),
            RebalanceRule::Weekly,
            RebalanceRule::Monthly,
        ] {
            assert_eq!(rule.to_string().parse::<RebalanceRule>().unwrap(), rule);
        }
    }
}
