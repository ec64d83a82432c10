//! In-process store that enacts the workflow itself.
//!
//! Used for local demo runs (`STORE_BACKEND=memory`) and tests. It answers
//! the same named reads as the database views and applies the same procedure
//! calls, one at a time under a single lock, so every call is atomic.

mod transitions;
mod views;

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::models::batch::{BatchItem, RecyclingBatch};
use crate::models::pickup::{Item, Payment, PickupRequest};
use crate::models::resources::{Category, RecyclingFacility, StaffMember, User, Vehicle};
use crate::store::{render_params, Read, Rejection, Row, SqlArg, Store, StoreError};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    categories: BTreeMap<i32, Category>,
    staff: BTreeMap<i32, StaffMember>,
    vehicles: BTreeMap<i32, Vehicle>,
    facilities: BTreeMap<i32, RecyclingFacility>,
    pickups: BTreeMap<i32, PickupRequest>,
    items: BTreeMap<i32, Item>,
    batches: BTreeMap<i32, RecyclingBatch>,
    batch_items: Vec<BatchItem>,
    payments: BTreeMap<i32, Payment>,
}

fn next_id<T>(table: &BTreeMap<i32, T>) -> i32 {
    table.keys().next_back().map_or(1, |id| id + 1)
}

fn lookup<'a, T>(table: &'a BTreeMap<i32, T>, what: &str, id: i32) -> Result<&'a T, Rejection> {
    table
        .get(&id)
        .ok_or_else(|| Rejection::NotFound(format!("{what} {id} does not exist")))
}

impl Tables {
    fn items_of(&self, pickup_id: i32) -> Vec<&Item> {
        self.items
            .values()
            .filter(|item| item.pickup_id == pickup_id)
            .collect()
    }

    fn batch_of(&self, item_id: i32) -> Option<i32> {
        self.batch_items
            .iter()
            .find(|entry| entry.item_id == item_id)
            .map(|entry| entry.batch_id)
    }

    fn items_in_batch(&self, batch_id: i32) -> Vec<&Item> {
        self.batch_items
            .iter()
            .filter(|entry| entry.batch_id == batch_id)
            .filter_map(|entry| self.items.get(&entry.item_id))
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small data set for trying the service without a database.
    pub fn demo() -> Self {
        let store = Self::new();

        store.add_user("Ada Moreno", "ada@example.org");
        store.add_user("Tomas Lindqvist", "tomas@example.org");
        store.add_user("Mei Sato", "mei@example.org");

        store.add_category("Batteries", 1.8);
        store.add_category("Computers", 2.5);
        store.add_category("Mobile phones", 4.0);
        store.add_category("Monitors & TVs", 0.9);
        store.add_category("Small appliances", 0.6);

        store.add_vehicle("EW-101", 900.0);
        store.add_vehicle("EW-102", 900.0);
        store.add_vehicle("EW-201", 2500.0);

        store.add_staff("Priya Nair", "collector");
        store.add_staff("Jon Okafor", "collector");
        store.add_staff("Lena Vogel", "driver");

        store.add_facility("North Recovery Plant", "Harbour Rd 4", 20_000.0);
        store.add_facility("East Sorting Hub", "Mill Lane 12", 8_000.0);

        store
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // Procedures validate before they mutate, so a poisoned lock still
        // guards consistent tables.
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_user(&self, full_name: &str, email: &str) -> i32 {
        let mut tables = self.tables();
        let id = next_id(&tables.users);
        tables.users.insert(
            id,
            User {
                id,
                full_name: full_name.to_string(),
                email: email.to_string(),
                is_active: true,
                registered_at: Utc::now(),
            },
        );
        id
    }

    pub fn set_user_active(&self, user_id: i32, is_active: bool) {
        if let Some(user) = self.tables().users.get_mut(&user_id) {
            user.is_active = is_active;
        }
    }

    pub fn add_category(&self, name: &str, price_per_kg: f64) -> i32 {
        let mut tables = self.tables();
        let id = next_id(&tables.categories);
        tables.categories.insert(
            id,
            Category {
                id,
                name: name.to_string(),
                price_per_kg,
            },
        );
        id
    }

    pub fn add_staff(&self, name: &str, role: &str) -> i32 {
        let mut tables = self.tables();
        let id = next_id(&tables.staff);
        tables.staff.insert(
            id,
            StaffMember {
                id,
                name: name.to_string(),
                role: role.to_string(),
                is_available: true,
                vehicle_id: None,
            },
        );
        id
    }

    pub fn add_vehicle(&self, registration: &str, capacity_kg: f64) -> i32 {
        let mut tables = self.tables();
        let id = next_id(&tables.vehicles);
        tables.vehicles.insert(
            id,
            Vehicle {
                id,
                registration: registration.to_string(),
                capacity_kg,
                is_available: true,
            },
        );
        id
    }

    pub fn add_facility(&self, name: &str, location: &str, capacity_kg: f64) -> i32 {
        let mut tables = self.tables();
        let id = next_id(&tables.facilities);
        tables.facilities.insert(
            id,
            RecyclingFacility {
                id,
                name: name.to_string(),
                location: location.to_string(),
                capacity_kg,
                is_operational: true,
            },
        );
        id
    }

    pub fn set_facility_operational(&self, facility_id: i32, is_operational: bool) {
        if let Some(facility) = self.tables().facilities.get_mut(&facility_id) {
            facility.is_operational = is_operational;
        }
    }

    /// Id of the most recently created pickup, if any.
    pub fn last_pickup_id(&self) -> Option<i32> {
        self.tables().pickups.keys().next_back().copied()
    }

    pub fn last_item_id(&self) -> Option<i32> {
        self.tables().items.keys().next_back().copied()
    }

    pub fn last_batch_id(&self) -> Option<i32> {
        self.tables().batches.keys().next_back().copied()
    }

    pub fn batch_item_count(&self) -> usize {
        self.tables().batch_items.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn query(&self, read: &Read) -> Result<Vec<Row>, StoreError> {
        Ok(views::read(&self.tables(), read))
    }

    async fn call_procedure(&self, name: &str, args: &[SqlArg]) -> Result<(), StoreError> {
        transitions::apply(&mut self.tables(), name, args)
    }

    async fn call_function(&self, name: &str, args: &[SqlArg]) -> Result<Option<Value>, StoreError> {
        match name {
            "version" => Ok(Some(Value::String(format!(
                "memory store {}",
                env!("CARGO_PKG_VERSION")
            )))),
            "now" => Ok(Some(Value::String(Utc::now().to_rfc3339()))),
            other => Err(StoreError::Function {
                name: other.to_string(),
                params: render_params(args),
                message: format!("function {other} does not exist"),
            }),
        }
    }
}
