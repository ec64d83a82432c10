use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Open,
    Processing,
    Completed,
}

impl BatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchStatus::Open => "open",
            BatchStatus::Processing => "processing",
            BatchStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Percentage of material reclaimed from a batch, always within [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecoveryRate(f64);

impl RecoveryRate {
    pub fn new(value: f64) -> Result<Self, String> {
        if value.is_finite() && (0.0..=100.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!("recovery rate must be between 0 and 100, got {value}"))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecyclingBatch {
    pub id: i32,
    pub facility_id: i32,
    pub name: String,
    pub notes: String,
    pub status: BatchStatus,
    pub recovery_rate: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchItem {
    pub batch_id: i32,
    pub item_id: i32,
}

#[cfg(test)]
mod tests {
    use super::RecoveryRate;

    #[test]
    fn recovery_rate_accepts_closed_range() {
        assert_eq!(RecoveryRate::new(0.0).unwrap().value(), 0.0);
        assert_eq!(RecoveryRate::new(87.5).unwrap().value(), 87.5);
        assert_eq!(RecoveryRate::new(100.0).unwrap().value(), 100.0);
    }

    #[test]
    fn recovery_rate_rejects_out_of_range() {
        assert!(RecoveryRate::new(-0.1).is_err());
        assert!(RecoveryRate::new(100.5).is_err());
        assert!(RecoveryRate::new(f64::NAN).is_err());
    }
}
