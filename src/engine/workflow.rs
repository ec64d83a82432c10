//! Transition guards for the pickup and batch lifecycles.
//!
//! Pickups move `pending -> assigned -> collected -> completed` and batches
//! move `open -> processing -> completed`. Every guard either allows the
//! transition or returns the [`Rejection`] the store reports back to callers.

use crate::models::batch::{BatchStatus, RecoveryRate, RecyclingBatch};
use crate::models::pickup::{PickupRequest, PickupStatus};
use crate::models::resources::{RecyclingFacility, StaffMember, Vehicle};
use crate::store::Rejection;

/// Moves a pickup exactly one step forward, refusing skips and regressions.
pub fn advance_pickup(pickup: &PickupRequest, target: PickupStatus) -> Result<PickupStatus, Rejection> {
    match pickup.status.successor() {
        Some(next) if next == target => Ok(next),
        _ => Err(Rejection::Conflict(format!(
            "pickup {} is {} and cannot move to {}",
            pickup.id, pickup.status, target
        ))),
    }
}

pub fn ensure_accepts_items(pickup: &PickupRequest) -> Result<(), Rejection> {
    if pickup.status.accepts_items() {
        Ok(())
    } else {
        Err(Rejection::Conflict(format!(
            "pickup {} is {} and no longer accepts items",
            pickup.id, pickup.status
        )))
    }
}

pub fn ensure_can_assign(
    pickup: &PickupRequest,
    staff: &StaffMember,
    vehicle: &Vehicle,
    facility: &RecyclingFacility,
) -> Result<PickupStatus, Rejection> {
    if !staff.is_available {
        return Err(Rejection::Conflict(format!(
            "staff member {} is not available",
            staff.id
        )));
    }
    if !vehicle.is_available {
        return Err(Rejection::Conflict(format!(
            "vehicle {} is not available",
            vehicle.id
        )));
    }
    if !facility.is_operational {
        return Err(Rejection::Conflict(format!(
            "facility {} is not operational",
            facility.id
        )));
    }

    advance_pickup(pickup, PickupStatus::Assigned)
}

pub fn ensure_can_collect(pickup: &PickupRequest) -> Result<PickupStatus, Rejection> {
    advance_pickup(pickup, PickupStatus::Collected)
}

pub fn ensure_can_pay(pickup: &PickupRequest) -> Result<PickupStatus, Rejection> {
    if pickup.status != PickupStatus::Collected {
        return Err(Rejection::Conflict(format!(
            "pickup {} is {}; payment requires status collected",
            pickup.id, pickup.status
        )));
    }

    advance_pickup(pickup, PickupStatus::Completed)
}

/// `current_batch` is the batch the item already belongs to, if any.
pub fn ensure_batch_accepts(
    batch: &RecyclingBatch,
    item_id: i32,
    owner_status: PickupStatus,
    current_batch: Option<i32>,
) -> Result<(), Rejection> {
    if batch.status != BatchStatus::Open {
        return Err(Rejection::Conflict(format!(
            "batch {} is {} and no longer accepts items",
            batch.id, batch.status
        )));
    }
    if let Some(existing) = current_batch {
        return Err(Rejection::Conflict(format!(
            "item {item_id} already belongs to batch {existing}"
        )));
    }
    if owner_status != PickupStatus::Completed {
        return Err(Rejection::Conflict(format!(
            "item {item_id} comes from a pickup that is {owner_status}, not completed"
        )));
    }

    Ok(())
}

pub fn ensure_can_start(batch: &RecyclingBatch) -> Result<BatchStatus, Rejection> {
    match batch.status {
        BatchStatus::Open => Ok(BatchStatus::Processing),
        other => Err(Rejection::Conflict(format!(
            "batch {} is {other}; only open batches can start processing",
            batch.id
        ))),
    }
}

pub fn ensure_can_complete(batch: &RecyclingBatch, recovery_rate: f64) -> Result<RecoveryRate, Rejection> {
    let rate = RecoveryRate::new(recovery_rate).map_err(Rejection::Invalid)?;

    match batch.status {
        BatchStatus::Processing => Ok(rate),
        other => Err(Rejection::Conflict(format!(
            "batch {} is {other}; only processing batches can complete",
            batch.id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;

    fn pickup(status: PickupStatus) -> PickupRequest {
        PickupRequest {
            id: 1,
            user_id: 1,
            preferred_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            address: "12 Elm St".to_string(),
            notes: String::new(),
            status,
            total_weight_kg: 0.0,
            total_amount: 0.0,
            staff_id: None,
            vehicle_id: None,
            facility_id: None,
            created_at: Utc::now(),
            scheduled_time: None,
            completed_time: None,
        }
    }

    fn batch(status: BatchStatus) -> RecyclingBatch {
        RecyclingBatch {
            id: 3,
            facility_id: 4,
            name: "January metals".to_string(),
            notes: String::new(),
            status,
            recovery_rate: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    fn crew(available: bool) -> (StaffMember, Vehicle, RecyclingFacility) {
        (
            StaffMember {
                id: 2,
                name: "Priya".to_string(),
                role: "collector".to_string(),
                is_available: available,
                vehicle_id: None,
            },
            Vehicle {
                id: 3,
                registration: "EW-03".to_string(),
                capacity_kg: 800.0,
                is_available: true,
            },
            RecyclingFacility {
                id: 4,
                name: "North Plant".to_string(),
                location: "Dock 7".to_string(),
                capacity_kg: 10_000.0,
                is_operational: true,
            },
        )
    }

    #[test]
    fn pickup_cannot_skip_or_regress() {
        assert!(advance_pickup(&pickup(PickupStatus::Pending), PickupStatus::Collected).is_err());
        assert!(advance_pickup(&pickup(PickupStatus::Collected), PickupStatus::Assigned).is_err());
        assert!(advance_pickup(&pickup(PickupStatus::Completed), PickupStatus::Completed).is_err());
        assert_eq!(
            advance_pickup(&pickup(PickupStatus::Assigned), PickupStatus::Collected),
            Ok(PickupStatus::Collected)
        );
    }

    #[test]
    fn assignment_needs_available_crew() {
        let (staff, vehicle, facility) = crew(false);
        let result = ensure_can_assign(&pickup(PickupStatus::Pending), &staff, &vehicle, &facility);
        assert!(matches!(result, Err(Rejection::Conflict(_))));

        let (staff, vehicle, facility) = crew(true);
        let result = ensure_can_assign(&pickup(PickupStatus::Pending), &staff, &vehicle, &facility);
        assert_eq!(result, Ok(PickupStatus::Assigned));
    }

    #[test]
    fn payment_requires_collected_pickup() {
        for status in [PickupStatus::Pending, PickupStatus::Assigned, PickupStatus::Completed] {
            assert!(ensure_can_pay(&pickup(status)).is_err(), "{status} should be rejected");
        }
        assert_eq!(
            ensure_can_pay(&pickup(PickupStatus::Collected)),
            Ok(PickupStatus::Completed)
        );
    }

    #[test]
    fn already_batched_item_is_a_conflict() {
        let result = ensure_batch_accepts(&batch(BatchStatus::Open), 5, PickupStatus::Completed, Some(2));
        assert_eq!(
            result,
            Err(Rejection::Conflict("item 5 already belongs to batch 2".to_string()))
        );
    }

    #[test]
    fn batch_only_takes_items_from_completed_pickups_while_open() {
        assert!(ensure_batch_accepts(&batch(BatchStatus::Open), 5, PickupStatus::Collected, None).is_err());
        assert!(ensure_batch_accepts(&batch(BatchStatus::Processing), 5, PickupStatus::Completed, None).is_err());
        assert!(ensure_batch_accepts(&batch(BatchStatus::Open), 5, PickupStatus::Completed, None).is_ok());
    }

    #[test]
    fn batch_lifecycle_is_ordered() {
        assert_eq!(ensure_can_start(&batch(BatchStatus::Open)), Ok(BatchStatus::Processing));
        assert!(ensure_can_start(&batch(BatchStatus::Processing)).is_err());

        assert!(ensure_can_complete(&batch(BatchStatus::Open), 50.0).is_err());
        assert!(matches!(
            ensure_can_complete(&batch(BatchStatus::Processing), 120.0),
            Err(Rejection::Invalid(_))
        ));
        assert_eq!(
            ensure_can_complete(&batch(BatchStatus::Processing), 87.5).map(|rate| rate.value()),
            Ok(87.5)
        );
    }
}
