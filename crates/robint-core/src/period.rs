//! Period — the temporal anchor of a data point.
//!
//! A period is a single consistent calendar unit. The enum makes temporal
//! consistency structural: a monthly period derives its quarter, so a "month
//! without its correct quarter" cannot be represented at all. Raw
//! year/quarter/month columns are validated on the way in via
//! [`Period::from_parts`].

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A single calendar point or period.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum Period {
  Annual { year: i32 },
  Quarterly { year: i32, quarter: u8 },
  Monthly { year: i32, month: u8 },
}

impl Period {
  pub fn annual(year: i32) -> Self { Self::Annual { year } }

  pub fn quarterly(year: i32, quarter: u8) -> Result<Self> {
    if !(1..=4).contains(&quarter) {
      return Err(Error::InconsistentPeriod(format!(
        "quarter must be 1-4, got {quarter}"
      )));
    }
    Ok(Self::Quarterly { year, quarter })
  }

  pub fn monthly(year: i32, month: u8) -> Result<Self> {
    if !(1..=12).contains(&month) {
      return Err(Error::InconsistentPeriod(format!(
        "month must be 1-12, got {month}"
      )));
    }
    Ok(Self::Monthly { year, month })
  }

  /// Reassemble a period from raw columns, rejecting inconsistent
  /// combinations (a month whose stored quarter is not the month's own).
  pub fn from_parts(
    year: i32,
    quarter: Option<u8>,
    month: Option<u8>,
  ) -> Result<Self> {
    match (quarter, month) {
      (None, None) => Ok(Self::annual(year)),
      (Some(q), None) => Self::quarterly(year, q),
      (q, Some(m)) => {
        let period = Self::monthly(year, m)?;
        if let Some(q) = q {
          let derived = period.quarter().unwrap_or(0);
          if q != derived {
            return Err(Error::InconsistentPeriod(format!(
              "month {m} lies in Q{derived}, not Q{q}"
            )));
          }
        }
        Ok(period)
      }
    }
  }

  pub fn year(&self) -> i32 {
    match *self {
      Self::Annual { year }
      | Self::Quarterly { year, .. }
      | Self::Monthly { year, .. } => year,
    }
  }

  /// The quarter this period lies in; derived for monthly periods.
  pub fn quarter(&self) -> Option<u8> {
    match *self {
      Self::Annual { .. } => None,
      Self::Quarterly { quarter, .. } => Some(quarter),
      Self::Monthly { month, .. } => Some((month - 1) / 3 + 1),
    }
  }

  pub fn month(&self) -> Option<u8> {
    match *self {
      Self::Monthly { month, .. } => Some(month),
      _ => None,
    }
  }

  /// The same calendar unit, one unit earlier.
  pub fn prev(&self) -> Self {
    match *self {
      Self::Annual { year } => Self::Annual { year: year - 1 },
      Self::Quarterly { year, quarter } => {
        if quarter == 1 {
          Self::Quarterly { year: year - 1, quarter: 4 }
        } else {
          Self::Quarterly { year, quarter: quarter - 1 }
        }
      }
      Self::Monthly { year, month } => {
        if month == 1 {
          Self::Monthly { year: year - 1, month: 12 }
        } else {
          Self::Monthly { year, month: month - 1 }
        }
      }
    }
  }

  /// Compact label: `2025`, `2025-Q2`, `2025-03`.
  pub fn label(&self) -> String {
    match *self {
      Self::Annual { year } => format!("{year}"),
      Self::Quarterly { year, quarter } => format!("{year}-Q{quarter}"),
      Self::Monthly { year, month } => format!("{year}-{month:02}"),
    }
  }
}

impl std::fmt::Display for Period {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.label())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn monthly_derives_quarter() {
    assert_eq!(Period::monthly(2025, 1).unwrap().quarter(), Some(1));
    assert_eq!(Period::monthly(2025, 3).unwrap().quarter(), Some(1));
    assert_eq!(Period::monthly(2025, 4).unwrap().quarter(), Some(2));
    assert_eq!(Period::monthly(2025, 12).unwrap().quarter(), Some(4));
  }

  #[test]
  fn from_parts_accepts_consistent_quarter() {
    let p = Period::from_parts(2025, Some(2), Some(5)).unwrap();
    assert_eq!(p, Period::Monthly { year: 2025, month: 5 });
  }

  #[test]
  fn from_parts_rejects_wrong_quarter() {
    let err = Period::from_parts(2025, Some(1), Some(5)).unwrap_err();
    assert!(matches!(err, Error::InconsistentPeriod(_)));
  }

  #[test]
  fn from_parts_rejects_out_of_range() {
    assert!(Period::from_parts(2025, Some(5), None).is_err());
    assert!(Period::from_parts(2025, None, Some(13)).is_err());
  }

  #[test]
  fn prev_rolls_over_year_boundaries() {
    assert_eq!(Period::annual(2025).prev(), Period::annual(2024));
    assert_eq!(
      Period::monthly(2025, 1).unwrap().prev(),
      Period::Monthly { year: 2024, month: 12 }
    );
    assert_eq!(
      Period::quarterly(2025, 1).unwrap().prev(),
      Period::Quarterly { year: 2024, quarter: 4 }
    );
  }

  #[test]
  fn labels() {
    assert_eq!(Period::annual(2025).label(), "2025");
    assert_eq!(Period::quarterly(2025, 3).unwrap().label(), "2025-Q3");
    assert_eq!(Period::monthly(2025, 7).unwrap().label(), "2025-07");
  }
}
