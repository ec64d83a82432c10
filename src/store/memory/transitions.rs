use chrono::{NaiveDate, Utc};

use crate::engine::pricing::pickup_totals;
use crate::engine::workflow;
use crate::models::batch::{BatchItem, BatchStatus, RecyclingBatch};
use crate::models::pickup::{Item, Payment, PickupRequest, PickupStatus};
use crate::models::resources::Category;
use crate::store::procedures::{
    ADD_ITEM_TO_BATCH, ADD_ITEM_TO_PICKUP, ASSIGN_PICKUP_TO_STAFF, COMPLETE_BATCH_PROCESSING,
    COMPLETE_PICKUP_COLLECTION, CREATE_PICKUP_REQUEST, CREATE_RECYCLING_BATCH, PROCESS_PAYMENT,
    START_BATCH_PROCESSING,
};
use crate::store::{render_params, Rejection, SqlArg, StoreError};

use super::{lookup, next_id, Tables};

/// Positional view over one procedure call's arguments.
struct Args<'a> {
    name: &'a str,
    args: &'a [SqlArg],
}

impl<'a> Args<'a> {
    fn new(name: &'a str, args: &'a [SqlArg], arity: usize) -> Result<Self, StoreError> {
        let call = Self { name, args };
        if args.len() != arity {
            return Err(call.failure(format!(
                "expected {arity} arguments, got {}",
                args.len()
            )));
        }
        Ok(call)
    }

    fn failure(&self, message: String) -> StoreError {
        StoreError::Procedure {
            name: self.name.to_string(),
            params: render_params(self.args),
            message,
        }
    }

    fn check<T>(&self, outcome: Result<T, Rejection>) -> Result<T, StoreError> {
        outcome.map_err(|rejection| StoreError::Rejected {
            name: self.name.to_string(),
            params: render_params(self.args),
            rejection,
        })
    }

    fn reject(&self, rejection: Rejection) -> StoreError {
        StoreError::Rejected {
            name: self.name.to_string(),
            params: render_params(self.args),
            rejection,
        }
    }

    fn mismatch(&self, index: usize, expected: &str) -> StoreError {
        self.failure(format!(
            "argument {} must be {expected}, got {}",
            index + 1,
            self.args[index]
        ))
    }

    fn int(&self, index: usize) -> Result<i32, StoreError> {
        match &self.args[index] {
            SqlArg::Int(v) => Ok(*v),
            _ => Err(self.mismatch(index, "an integer")),
        }
    }

    fn numeric(&self, index: usize) -> Result<f64, StoreError> {
        match &self.args[index] {
            SqlArg::Numeric(v) => Ok(*v),
            SqlArg::Int(v) => Ok(f64::from(*v)),
            _ => Err(self.mismatch(index, "numeric")),
        }
    }

    fn opt_numeric(&self, index: usize) -> Result<Option<f64>, StoreError> {
        match &self.args[index] {
            SqlArg::Null(_) => Ok(None),
            _ => self.numeric(index).map(Some),
        }
    }

    fn text(&self, index: usize) -> Result<&'a str, StoreError> {
        match &self.args[index] {
            SqlArg::Text(v) => Ok(v.as_str()),
            _ => Err(self.mismatch(index, "text")),
        }
    }

    fn opt_text(&self, index: usize) -> Result<Option<&'a str>, StoreError> {
        match &self.args[index] {
            SqlArg::Null(_) => Ok(None),
            _ => self.text(index).map(Some),
        }
    }

    fn opt_bool(&self, index: usize) -> Result<Option<bool>, StoreError> {
        match &self.args[index] {
            SqlArg::Bool(v) => Ok(Some(*v)),
            SqlArg::Null(_) => Ok(None),
            _ => Err(self.mismatch(index, "boolean")),
        }
    }

    fn date(&self, index: usize) -> Result<NaiveDate, StoreError> {
        match &self.args[index] {
            SqlArg::Date(v) => Ok(*v),
            SqlArg::Text(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| self.reject(Rejection::Invalid(format!("{raw:?} is not a date")))),
            _ => Err(self.mismatch(index, "a date")),
        }
    }

    fn out(&self, index: usize) -> Result<(), StoreError> {
        match &self.args[index] {
            SqlArg::Out | SqlArg::Null(_) => Ok(()),
            _ => Err(self.mismatch(index, "an output placeholder")),
        }
    }
}

fn required<'a>(call: &Args<'_>, value: &'a str, field: &str) -> Result<&'a str, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(call.reject(Rejection::Invalid(format!("{field} is required"))))
    } else {
        Ok(trimmed)
    }
}

pub(super) fn apply(tables: &mut Tables, name: &str, args: &[SqlArg]) -> Result<(), StoreError> {
    match name {
        CREATE_PICKUP_REQUEST => create_pickup_request(tables, &Args::new(name, args, 5)?),
        ADD_ITEM_TO_PICKUP => add_item_to_pickup(tables, &Args::new(name, args, 7)?),
        ASSIGN_PICKUP_TO_STAFF => assign_pickup_to_staff(tables, &Args::new(name, args, 4)?),
        COMPLETE_PICKUP_COLLECTION => complete_pickup_collection(tables, &Args::new(name, args, 1)?),
        PROCESS_PAYMENT => process_payment(tables, &Args::new(name, args, 5)?),
        CREATE_RECYCLING_BATCH => create_recycling_batch(tables, &Args::new(name, args, 4)?),
        ADD_ITEM_TO_BATCH => add_item_to_batch(tables, &Args::new(name, args, 2)?),
        START_BATCH_PROCESSING => start_batch_processing(tables, &Args::new(name, args, 1)?),
        COMPLETE_BATCH_PROCESSING => complete_batch_processing(tables, &Args::new(name, args, 2)?),
        other => Err(StoreError::Procedure {
            name: other.to_string(),
            params: render_params(args),
            message: format!("procedure {other} does not exist"),
        }),
    }
}

fn create_pickup_request(t: &mut Tables, call: &Args<'_>) -> Result<(), StoreError> {
    let user_id = call.int(0)?;
    let preferred_date = call.date(1)?;
    let address = required(call, call.text(2)?, "pickup address")?;
    call.out(3)?;
    let notes = call.opt_text(4)?.unwrap_or_default();

    let user = call.check(lookup(&t.users, "user", user_id))?;
    if !user.is_active {
        return Err(call.reject(Rejection::Conflict(format!(
            "user {user_id} is inactive"
        ))));
    }

    let id = next_id(&t.pickups);
    t.pickups.insert(
        id,
        PickupRequest {
            id,
            user_id,
            preferred_date,
            address: address.to_string(),
            notes: notes.to_string(),
            status: PickupStatus::Pending,
            total_weight_kg: 0.0,
            total_amount: 0.0,
            staff_id: None,
            vehicle_id: None,
            facility_id: None,
            created_at: Utc::now(),
            scheduled_time: None,
            completed_time: None,
        },
    );
    Ok(())
}

fn add_item_to_pickup(t: &mut Tables, call: &Args<'_>) -> Result<(), StoreError> {
    let pickup_id = call.int(0)?;
    let category_id = call.int(1)?;
    let description = required(call, call.text(2)?, "item description")?;
    call.out(3)?;
    let condition = required(call, call.text(4)?, "item condition")?;
    let estimated_weight = call.opt_numeric(5)?;
    let is_hazardous = call.opt_bool(6)?.unwrap_or(false);

    let pickup = call.check(lookup(&t.pickups, "pickup", pickup_id))?;
    call.check(workflow::ensure_accepts_items(pickup))?;
    call.check(lookup(&t.categories, "category", category_id))?;
    if let Some(weight) = estimated_weight {
        if !weight.is_finite() || weight < 0.0 {
            return Err(call.reject(Rejection::Invalid(
                "estimated weight cannot be negative".to_string(),
            )));
        }
    }

    let id = next_id(&t.items);
    t.items.insert(
        id,
        Item {
            id,
            pickup_id,
            category_id,
            description: description.to_string(),
            condition: condition.to_string(),
            estimated_weight_kg: estimated_weight,
            actual_weight_kg: None,
            is_hazardous,
        },
    );
    Ok(())
}

fn assign_pickup_to_staff(t: &mut Tables, call: &Args<'_>) -> Result<(), StoreError> {
    let pickup_id = call.int(0)?;
    let staff_id = call.int(1)?;
    let vehicle_id = call.int(2)?;
    let facility_id = call.int(3)?;

    let next = {
        let pickup = call.check(lookup(&t.pickups, "pickup", pickup_id))?;
        let staff = call.check(lookup(&t.staff, "staff member", staff_id))?;
        let vehicle = call.check(lookup(&t.vehicles, "vehicle", vehicle_id))?;
        let facility = call.check(lookup(&t.facilities, "facility", facility_id))?;
        call.check(workflow::ensure_can_assign(pickup, staff, vehicle, facility))?
    };

    if let Some(pickup) = t.pickups.get_mut(&pickup_id) {
        pickup.status = next;
        pickup.staff_id = Some(staff_id);
        pickup.vehicle_id = Some(vehicle_id);
        pickup.facility_id = Some(facility_id);
        pickup.scheduled_time = Some(Utc::now());
    }
    if let Some(staff) = t.staff.get_mut(&staff_id) {
        staff.is_available = false;
        staff.vehicle_id = Some(vehicle_id);
    }
    if let Some(vehicle) = t.vehicles.get_mut(&vehicle_id) {
        vehicle.is_available = false;
    }
    Ok(())
}

/// Weighs the items, prices the pickup and releases its crew.
fn complete_pickup_collection(t: &mut Tables, call: &Args<'_>) -> Result<(), StoreError> {
    let pickup_id = call.int(0)?;

    let (next, staff_id, vehicle_id) = {
        let pickup = call.check(lookup(&t.pickups, "pickup", pickup_id))?;
        let next = call.check(workflow::ensure_can_collect(pickup))?;
        (next, pickup.staff_id, pickup.vehicle_id)
    };

    for item in t.items.values_mut().filter(|item| item.pickup_id == pickup_id) {
        if item.actual_weight_kg.is_none() {
            item.actual_weight_kg = Some(item.estimated_weight_kg.unwrap_or(0.0));
        }
    }

    let categories: Vec<Category> = t.categories.values().cloned().collect();
    let totals = pickup_totals(&t.items_of(pickup_id), &categories);

    if let Some(pickup) = t.pickups.get_mut(&pickup_id) {
        pickup.status = next;
        pickup.total_weight_kg = totals.total_weight_kg;
        pickup.total_amount = totals.total_amount;
        pickup.completed_time = Some(Utc::now());
    }
    if let Some(staff) = staff_id.and_then(|id| t.staff.get_mut(&id)) {
        staff.is_available = true;
        staff.vehicle_id = None;
    }
    if let Some(vehicle) = vehicle_id.and_then(|id| t.vehicles.get_mut(&id)) {
        vehicle.is_available = true;
    }
    Ok(())
}

fn process_payment(t: &mut Tables, call: &Args<'_>) -> Result<(), StoreError> {
    let pickup_id = call.int(0)?;
    let method = required(call, call.text(1)?, "payment method")?;
    call.out(2)?;
    call.out(3)?;
    let transaction_ref = call
        .opt_text(4)?
        .map(str::trim)
        .filter(|reference| !reference.is_empty());

    let (next, amount) = {
        let pickup = call.check(lookup(&t.pickups, "pickup", pickup_id))?;
        (call.check(workflow::ensure_can_pay(pickup))?, pickup.total_amount)
    };

    let id = next_id(&t.payments);
    t.payments.insert(
        id,
        Payment {
            id,
            pickup_id,
            method: method.to_string(),
            amount,
            transaction_ref: transaction_ref.map(str::to_string),
            paid_at: Utc::now(),
        },
    );
    if let Some(pickup) = t.pickups.get_mut(&pickup_id) {
        pickup.status = next;
    }
    Ok(())
}

fn create_recycling_batch(t: &mut Tables, call: &Args<'_>) -> Result<(), StoreError> {
    let facility_id = call.int(0)?;
    let batch_name = required(call, call.text(1)?, "batch name")?;
    call.out(2)?;
    let notes = call.opt_text(3)?.unwrap_or_default();

    let facility = call.check(lookup(&t.facilities, "facility", facility_id))?;
    if !facility.is_operational {
        return Err(call.reject(Rejection::Conflict(format!(
            "facility {facility_id} is not operational"
        ))));
    }

    let id = next_id(&t.batches);
    t.batches.insert(
        id,
        RecyclingBatch {
            id,
            facility_id,
            name: batch_name.to_string(),
            notes: notes.to_string(),
            status: BatchStatus::Open,
            recovery_rate: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        },
    );
    Ok(())
}

fn add_item_to_batch(t: &mut Tables, call: &Args<'_>) -> Result<(), StoreError> {
    let batch_id = call.int(0)?;
    let item_id = call.int(1)?;

    let batch = call.check(lookup(&t.batches, "batch", batch_id))?;
    let item = call.check(lookup(&t.items, "item", item_id))?;
    let owner = call.check(lookup(&t.pickups, "pickup", item.pickup_id))?;
    call.check(workflow::ensure_batch_accepts(
        batch,
        item_id,
        owner.status,
        t.batch_of(item_id),
    ))?;

    t.batch_items.push(BatchItem { batch_id, item_id });
    Ok(())
}

fn start_batch_processing(t: &mut Tables, call: &Args<'_>) -> Result<(), StoreError> {
    let batch_id = call.int(0)?;

    let next = call.check(workflow::ensure_can_start(call.check(lookup(
        &t.batches, "batch", batch_id,
    ))?))?;

    if let Some(batch) = t.batches.get_mut(&batch_id) {
        batch.status = next;
        batch.started_at = Some(Utc::now());
    }
    Ok(())
}

fn complete_batch_processing(t: &mut Tables, call: &Args<'_>) -> Result<(), StoreError> {
    let batch_id = call.int(0)?;
    let recovery_rate = call.numeric(1)?;

    let rate = {
        let batch = call.check(lookup(&t.batches, "batch", batch_id))?;
        call.check(workflow::ensure_can_complete(batch, recovery_rate))?
    };

    if let Some(batch) = t.batches.get_mut(&batch_id) {
        batch.status = BatchStatus::Completed;
        batch.recovery_rate = Some(rate.value());
        batch.completed_at = Some(Utc::now());
    }
    Ok(())
}
