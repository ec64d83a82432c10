//! Positional call shapes of the store's workflow procedures.
//!
//! Argument order matches each procedure's declaration, output parameters
//! included.

use chrono::NaiveDate;

use crate::models::batch::RecoveryRate;
use crate::store::{render_params, SqlArg};

pub const CREATE_PICKUP_REQUEST: &str = "create_pickup_request";
pub const ADD_ITEM_TO_PICKUP: &str = "add_item_to_pickup";
pub const ASSIGN_PICKUP_TO_STAFF: &str = "assign_pickup_to_staff";
pub const COMPLETE_PICKUP_COLLECTION: &str = "complete_pickup_collection";
pub const PROCESS_PAYMENT: &str = "process_payment";
pub const CREATE_RECYCLING_BATCH: &str = "create_recycling_batch";
pub const ADD_ITEM_TO_BATCH: &str = "add_item_to_batch";
pub const START_BATCH_PROCESSING: &str = "start_batch_processing";
pub const COMPLETE_BATCH_PROCESSING: &str = "complete_batch_processing";

#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureCall {
    pub name: &'static str,
    pub args: Vec<SqlArg>,
}

impl ProcedureCall {
    pub fn params(&self) -> String {
        render_params(&self.args)
    }
}

/// `(user_id, preferred_date, address, OUT pickup_id, notes)`
pub fn create_pickup_request(
    user_id: i32,
    preferred_date: NaiveDate,
    address: &str,
    notes: &str,
) -> ProcedureCall {
    ProcedureCall {
        name: CREATE_PICKUP_REQUEST,
        args: vec![
            SqlArg::Int(user_id),
            SqlArg::Date(preferred_date),
            SqlArg::text(address),
            SqlArg::Out,
            SqlArg::text(notes),
        ],
    }
}

/// `(pickup_id, category_id, description, OUT item_id, condition, estimated_weight, is_hazardous)`
pub fn add_item_to_pickup(
    pickup_id: i32,
    category_id: i32,
    description: &str,
    condition: &str,
    estimated_weight: Option<f64>,
    is_hazardous: Option<bool>,
) -> ProcedureCall {
    ProcedureCall {
        name: ADD_ITEM_TO_PICKUP,
        args: vec![
            SqlArg::Int(pickup_id),
            SqlArg::Int(category_id),
            SqlArg::text(description),
            SqlArg::Out,
            SqlArg::text(condition),
            SqlArg::opt_numeric(estimated_weight),
            SqlArg::opt_bool(is_hazardous),
        ],
    }
}

pub fn assign_pickup_to_staff(
    pickup_id: i32,
    staff_id: i32,
    vehicle_id: i32,
    facility_id: i32,
) -> ProcedureCall {
    ProcedureCall {
        name: ASSIGN_PICKUP_TO_STAFF,
        args: vec![
            SqlArg::Int(pickup_id),
            SqlArg::Int(staff_id),
            SqlArg::Int(vehicle_id),
            SqlArg::Int(facility_id),
        ],
    }
}

pub fn complete_pickup_collection(pickup_id: i32) -> ProcedureCall {
    ProcedureCall {
        name: COMPLETE_PICKUP_COLLECTION,
        args: vec![SqlArg::Int(pickup_id)],
    }
}

/// `(pickup_id, method, OUT payment_id, OUT amount, transaction_ref)`
pub fn process_payment(pickup_id: i32, method: &str, transaction_ref: Option<String>) -> ProcedureCall {
    ProcedureCall {
        name: PROCESS_PAYMENT,
        args: vec![
            SqlArg::Int(pickup_id),
            SqlArg::text(method),
            SqlArg::Out,
            SqlArg::Out,
            SqlArg::opt_text(transaction_ref),
        ],
    }
}

/// `(facility_id, batch_name, OUT batch_id, notes)`
pub fn create_recycling_batch(facility_id: i32, batch_name: &str, notes: &str) -> ProcedureCall {
    ProcedureCall {
        name: CREATE_RECYCLING_BATCH,
        args: vec![
            SqlArg::Int(facility_id),
            SqlArg::text(batch_name),
            SqlArg::Out,
            SqlArg::text(notes),
        ],
    }
}

pub fn add_item_to_batch(batch_id: i32, item_id: i32) -> ProcedureCall {
    ProcedureCall {
        name: ADD_ITEM_TO_BATCH,
        args: vec![SqlArg::Int(batch_id), SqlArg::Int(item_id)],
    }
}

pub fn start_batch_processing(batch_id: i32) -> ProcedureCall {
    ProcedureCall {
        name: START_BATCH_PROCESSING,
        args: vec![SqlArg::Int(batch_id)],
    }
}

pub fn complete_batch_processing(batch_id: i32, recovery_rate: RecoveryRate) -> ProcedureCall {
    ProcedureCall {
        name: COMPLETE_BATCH_PROCESSING,
        args: vec![SqlArg::Int(batch_id), SqlArg::Numeric(recovery_rate.value())],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_reserves_two_output_slots() {
        let call = process_payment(12, "bank_transfer", None);

        assert_eq!(call.name, "process_payment");
        assert_eq!(call.args.len(), 5);
        assert_eq!(call.args[2], SqlArg::Out);
        assert_eq!(call.args[3], SqlArg::Out);
        assert_eq!(call.params(), "12, 'bank_transfer', OUT, OUT, NULL");
    }

    #[test]
    fn item_intake_keeps_declared_arity() {
        let call = add_item_to_pickup(1, 2, "CRT monitor", "broken", Some(14.5), None);

        assert_eq!(call.args.len(), 7);
        assert_eq!(call.args[3], SqlArg::Out);
        assert_eq!(call.args[5], SqlArg::Numeric(14.5));
        assert!(!call.args[6].is_bound());
    }
}
