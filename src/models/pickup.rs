use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PickupStatus {
    Pending,
    Assigned,
    Collected,
    Completed,
    Cancelled,
}

impl PickupStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PickupStatus::Pending => "pending",
            PickupStatus::Assigned => "assigned",
            PickupStatus::Collected => "collected",
            PickupStatus::Completed => "completed",
            PickupStatus::Cancelled => "cancelled",
        }
    }

    /// The status a pickup moves to on its next forward transition.
    pub fn successor(self) -> Option<PickupStatus> {
        match self {
            PickupStatus::Pending => Some(PickupStatus::Assigned),
            PickupStatus::Assigned => Some(PickupStatus::Collected),
            PickupStatus::Collected => Some(PickupStatus::Completed),
            PickupStatus::Completed | PickupStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PickupStatus::Completed | PickupStatus::Cancelled)
    }

    /// Items may only be registered before the crew has weighed them.
    pub fn accepts_items(self) -> bool {
        matches!(self, PickupStatus::Pending | PickupStatus::Assigned)
    }
}

impl fmt::Display for PickupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PickupStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "pending" => Ok(PickupStatus::Pending),
            "assigned" => Ok(PickupStatus::Assigned),
            "collected" => Ok(PickupStatus::Collected),
            "completed" => Ok(PickupStatus::Completed),
            "cancelled" => Ok(PickupStatus::Cancelled),
            other => Err(format!("unknown pickup status {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupRequest {
    pub id: i32,
    pub user_id: i32,
    pub preferred_date: NaiveDate,
    pub address: String,
    pub notes: String,
    pub status: PickupStatus,
    pub total_weight_kg: f64,
    pub total_amount: f64,
    pub staff_id: Option<i32>,
    pub vehicle_id: Option<i32>,
    pub facility_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub completed_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: i32,
    pub pickup_id: i32,
    pub category_id: i32,
    pub description: String,
    pub condition: String,
    pub estimated_weight_kg: Option<f64>,
    pub actual_weight_kg: Option<f64>,
    pub is_hazardous: bool,
}

impl Item {
    /// Weighed weight once collected, the estimate before that.
    pub fn weight_kg(&self) -> f64 {
        self.actual_weight_kg
            .or(self.estimated_weight_kg)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i32,
    pub pickup_id: i32,
    pub method: String,
    pub amount: f64,
    pub transaction_ref: Option<String>,
    pub paid_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::PickupStatus;

    #[test]
    fn status_moves_forward_one_step_at_a_time() {
        assert_eq!(PickupStatus::Pending.successor(), Some(PickupStatus::Assigned));
        assert_eq!(PickupStatus::Assigned.successor(), Some(PickupStatus::Collected));
        assert_eq!(PickupStatus::Collected.successor(), Some(PickupStatus::Completed));
        assert_eq!(PickupStatus::Completed.successor(), None);
        assert_eq!(PickupStatus::Cancelled.successor(), None);
    }

    #[test]
    fn only_open_pickups_accept_items() {
        assert!(PickupStatus::Pending.accepts_items());
        assert!(PickupStatus::Assigned.accepts_items());
        assert!(!PickupStatus::Collected.accepts_items());
        assert!(!PickupStatus::Completed.accepts_items());
    }

    #[test]
    fn status_round_trips_through_store_text() {
        for status in [
            PickupStatus::Pending,
            PickupStatus::Assigned,
            PickupStatus::Collected,
            PickupStatus::Completed,
            PickupStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<PickupStatus>(), Ok(status));
        }
        assert!("shipped".parse::<PickupStatus>().is_err());
    }
}
