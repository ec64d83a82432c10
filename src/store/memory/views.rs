use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::engine::pricing::round_cents;
use crate::models::batch::{BatchStatus, RecyclingBatch};
use crate::models::pickup::{Item, PickupRequest, PickupStatus};
use crate::store::reads::ITEM_DETAILS_LIMIT;
use crate::store::{Read, Row};

use super::Tables;

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

pub(super) fn read(t: &Tables, read: &Read) -> Vec<Row> {
    match *read {
        Read::DashboardStats => vec![dashboard_stats(t)],
        Read::PickupSummaries => t
            .pickups
            .values()
            .rev()
            .map(|p| pickup_summary(t, p))
            .collect(),
        Read::PickupSummary { pickup_id } => t
            .pickups
            .get(&pickup_id)
            .map(|p| pickup_summary(t, p))
            .into_iter()
            .collect(),
        Read::ActiveUsers => {
            let mut users: Vec<_> = t.users.values().filter(|u| u.is_active).collect();
            users.sort_by(|a, b| a.full_name.cmp(&b.full_name));
            users
                .into_iter()
                .map(|u| {
                    row(json!({
                        "user_id": u.id,
                        "full_name": u.full_name,
                        "email": u.email,
                    }))
                })
                .collect()
        }
        Read::IntakePickups => t
            .pickups
            .values()
            .rev()
            .filter(|p| p.status.accepts_items())
            .map(|p| {
                row(json!({
                    "pickup_id": p.id,
                    "user_id": p.user_id,
                    "preferred_date": p.preferred_date,
                    "status": p.status,
                }))
            })
            .collect(),
        Read::Categories => {
            let mut categories: Vec<_> = t.categories.values().collect();
            categories.sort_by(|a, b| a.name.cmp(&b.name));
            categories
                .into_iter()
                .map(|c| {
                    row(json!({
                        "category_id": c.id,
                        "category_name": c.name,
                        "price_per_kg": c.price_per_kg,
                    }))
                })
                .collect()
        }
        Read::ItemDetails => t
            .items
            .values()
            .rev()
            .take(ITEM_DETAILS_LIMIT)
            .map(|item| item_details(t, item))
            .collect(),
        Read::PendingPickups => {
            let mut pending: Vec<_> = t
                .pickups
                .values()
                .filter(|p| p.status == PickupStatus::Pending)
                .collect();
            pending.sort_by_key(|p| (p.preferred_date, p.id));
            pending
                .into_iter()
                .map(|p| {
                    row(json!({
                        "pickup_id": p.id,
                        "full_name": t.users.get(&p.user_id).map(|u| u.full_name.as_str()),
                        "preferred_date": p.preferred_date,
                        "total_weight_kg": p.total_weight_kg,
                        "pickup_address": p.address,
                    }))
                })
                .collect()
        }
        Read::AvailableStaff => t
            .staff
            .values()
            .filter(|s| s.is_available)
            .map(|s| {
                row(json!({
                    "staff_id": s.id,
                    "staff_name": s.name,
                    "role": s.role,
                }))
            })
            .collect(),
        Read::AvailableVehicles => t
            .vehicles
            .values()
            .filter(|v| v.is_available)
            .map(|v| {
                row(json!({
                    "vehicle_id": v.id,
                    "registration_number": v.registration,
                    "capacity_kg": v.capacity_kg,
                    "is_available": v.is_available,
                }))
            })
            .collect(),
        Read::OperationalFacilities => t
            .facilities
            .values()
            .filter(|f| f.is_operational)
            .map(|f| {
                row(json!({
                    "facility_id": f.id,
                    "facility_name": f.name,
                    "location": f.location,
                    "capacity_kg": f.capacity_kg,
                    "is_operational": f.is_operational,
                }))
            })
            .collect(),
        Read::StaffWorkload => staff_workload(t),
        Read::ActivePickups => {
            let mut active: Vec<_> = t
                .pickups
                .values()
                .filter(|p| matches!(p.status, PickupStatus::Assigned | PickupStatus::Collected))
                .collect();
            active.sort_by_key(|p| (p.scheduled_time, p.id));
            active.into_iter().map(|p| pickup_summary(t, p)).collect()
        }
        Read::PaymentSummaries => t
            .payments
            .values()
            .rev()
            .map(|payment| {
                let user = t
                    .pickups
                    .get(&payment.pickup_id)
                    .and_then(|p| t.users.get(&p.user_id));
                row(json!({
                    "payment_id": payment.id,
                    "pickup_id": payment.pickup_id,
                    "full_name": user.map(|u| u.full_name.as_str()),
                    "payment_method": payment.method,
                    "amount": payment.amount,
                    "transaction_ref": payment.transaction_ref,
                    "payment_date": payment.paid_at,
                }))
            })
            .collect(),
        Read::CollectedPickups => {
            let mut collected: Vec<_> = t
                .pickups
                .values()
                .filter(|p| p.status == PickupStatus::Collected)
                .collect();
            collected.sort_by(|a, b| b.completed_time.cmp(&a.completed_time));
            collected
                .into_iter()
                .map(|p| {
                    row(json!({
                        "pickup_id": p.id,
                        "full_name": t.users.get(&p.user_id).map(|u| u.full_name.as_str()),
                        "total_weight_kg": p.total_weight_kg,
                        "total_amount": p.total_amount,
                        "completed_time": p.completed_time,
                    }))
                })
                .collect()
        }
        Read::BatchSummaries => t
            .batches
            .values()
            .rev()
            .map(|b| batch_summary(t, b))
            .collect(),
        Read::BatchSummary { batch_id } => t
            .batches
            .get(&batch_id)
            .map(|b| batch_summary(t, b))
            .into_iter()
            .collect(),
        Read::UnbatchedItems => t
            .items
            .values()
            .rev()
            .filter(|item| t.batch_of(item.id).is_none())
            .filter_map(|item| {
                let pickup = t.pickups.get(&item.pickup_id)?;
                if pickup.status != PickupStatus::Completed {
                    return None;
                }
                Some(row(json!({
                    "item_id": item.id,
                    "item_description": item.description,
                    "category_name": t.categories.get(&item.category_id).map(|c| c.name.as_str()),
                    "weight": item.actual_weight_kg.or(item.estimated_weight_kg),
                    "pickup_id": pickup.id,
                    "full_name": t.users.get(&pickup.user_id).map(|u| u.full_name.as_str()),
                })))
            })
            .collect(),
        Read::UserActivity => user_activity(t),
        Read::CategoryStatistics => category_statistics(t),
        Read::FacilityCapacity => facility_capacity(t),
        Read::PickupStatusTotals => pickup_status_totals(t),
        Read::UserStats { user_id } => t
            .users
            .get(&user_id)
            .map(|_| user_stats(t, user_id))
            .into_iter()
            .collect(),
    }
}

fn dashboard_stats(t: &Tables) -> Row {
    let completed = || {
        t.pickups
            .values()
            .filter(|p| p.status == PickupStatus::Completed)
    };

    row(json!({
        "active_users": t.users.values().filter(|u| u.is_active).count(),
        "pending_pickups": t.pickups.values().filter(|p| p.status == PickupStatus::Pending).count(),
        "completed_pickups": completed().count(),
        "total_weight": round_cents(completed().map(|p| p.total_weight_kg).sum()),
        "open_batches": t.batches.values().filter(|b| b.status == BatchStatus::Open).count(),
    }))
}

fn pickup_summary(t: &Tables, p: &PickupRequest) -> Row {
    let user = t.users.get(&p.user_id);
    let staff = p.staff_id.and_then(|id| t.staff.get(&id));
    let facility = p.facility_id.and_then(|id| t.facilities.get(&id));
    let items = t.items_of(p.id);
    let estimated: f64 = items
        .iter()
        .filter_map(|item| item.estimated_weight_kg)
        .sum();

    row(json!({
        "pickup_id": p.id,
        "user_id": p.user_id,
        "full_name": user.map(|u| u.full_name.as_str()),
        "email": user.map(|u| u.email.as_str()),
        "preferred_date": p.preferred_date,
        "pickup_address": p.address,
        "notes": p.notes,
        "status": p.status,
        "item_count": items.len(),
        "estimated_weight_kg": round_cents(estimated),
        "total_weight_kg": p.total_weight_kg,
        "total_amount": p.total_amount,
        "staff_name": staff.map(|s| s.name.as_str()),
        "vehicle_id": p.vehicle_id,
        "facility_name": facility.map(|f| f.name.as_str()),
        "scheduled_time": p.scheduled_time,
        "completed_time": p.completed_time,
    }))
}

fn item_details(t: &Tables, item: &Item) -> Row {
    let category = t.categories.get(&item.category_id);
    let pickup = t.pickups.get(&item.pickup_id);

    row(json!({
        "item_id": item.id,
        "pickup_id": item.pickup_id,
        "category_name": category.map(|c| c.name.as_str()),
        "item_description": item.description,
        "item_condition": item.condition,
        "estimated_weight_kg": item.estimated_weight_kg,
        "actual_weight_kg": item.actual_weight_kg,
        "is_hazardous": item.is_hazardous,
        "pickup_status": pickup.map(|p| p.status),
        "batch_id": t.batch_of(item.id),
    }))
}

fn batch_summary(t: &Tables, b: &RecyclingBatch) -> Row {
    let items = t.items_in_batch(b.id);
    let weight: f64 = items.iter().map(|item| item.weight_kg()).sum();

    row(json!({
        "batch_id": b.id,
        "batch_name": b.name,
        "facility_id": b.facility_id,
        "facility_name": t.facilities.get(&b.facility_id).map(|f| f.name.as_str()),
        "status": b.status,
        "item_count": items.len(),
        "total_weight_kg": round_cents(weight),
        "recovery_rate": b.recovery_rate,
        "notes": b.notes,
        "created_at": b.created_at,
        "started_at": b.started_at,
        "completed_at": b.completed_at,
    }))
}

fn staff_workload(t: &Tables) -> Vec<Row> {
    let mut workload: Vec<_> = t
        .staff
        .values()
        .map(|s| {
            let assigned = t
                .pickups
                .values()
                .filter(|p| p.staff_id == Some(s.id))
                .filter(|p| matches!(p.status, PickupStatus::Assigned | PickupStatus::Collected))
                .count();
            let handled = t
                .pickups
                .values()
                .filter(|p| p.staff_id == Some(s.id))
                .filter(|p| p.status == PickupStatus::Completed)
                .count();
            (s, assigned, handled)
        })
        .collect();
    workload.sort_by(|a, b| b.1.cmp(&a.1));

    workload
        .into_iter()
        .map(|(s, assigned, handled)| {
            row(json!({
                "staff_id": s.id,
                "staff_name": s.name,
                "role": s.role,
                "is_available": s.is_available,
                "vehicle_id": s.vehicle_id,
                "assigned_pickups": assigned,
                "completed_pickups": handled,
            }))
        })
        .collect()
}

struct UserTotals {
    total_pickups: usize,
    completed_pickups: usize,
    total_weight_kg: f64,
    total_earned: f64,
}

fn user_totals(t: &Tables, user_id: i32) -> UserTotals {
    let pickups: Vec<_> = t
        .pickups
        .values()
        .filter(|p| p.user_id == user_id)
        .collect();
    let completed: Vec<_> = pickups
        .iter()
        .filter(|p| p.status == PickupStatus::Completed)
        .collect();
    let earned: f64 = t
        .payments
        .values()
        .filter(|payment| pickups.iter().any(|p| p.id == payment.pickup_id))
        .map(|payment| payment.amount)
        .sum();

    UserTotals {
        total_pickups: pickups.len(),
        completed_pickups: completed.len(),
        total_weight_kg: round_cents(completed.iter().map(|p| p.total_weight_kg).sum()),
        total_earned: round_cents(earned),
    }
}

fn user_activity(t: &Tables) -> Vec<Row> {
    let mut activity: Vec<_> = t
        .users
        .values()
        .map(|u| (u, user_totals(t, u.id)))
        .collect();
    activity.sort_by(|a, b| descending(a.1.total_weight_kg, b.1.total_weight_kg));

    activity
        .into_iter()
        .map(|(u, totals)| {
            row(json!({
                "user_id": u.id,
                "full_name": u.full_name,
                "email": u.email,
                "total_pickups": totals.total_pickups,
                "completed_pickups": totals.completed_pickups,
                "total_weight_recycled_kg": totals.total_weight_kg,
                "total_earned": totals.total_earned,
            }))
        })
        .collect()
}

fn user_stats(t: &Tables, user_id: i32) -> Row {
    let totals = user_totals(t, user_id);
    let last_pickup = t
        .pickups
        .values()
        .filter(|p| p.user_id == user_id)
        .map(|p| p.preferred_date)
        .max();

    row(json!({
        "user_id": user_id,
        "total_pickups": totals.total_pickups,
        "completed_pickups": totals.completed_pickups,
        "total_weight_kg": totals.total_weight_kg,
        "total_earned": totals.total_earned,
        "last_pickup_date": last_pickup,
    }))
}

fn category_statistics(t: &Tables) -> Vec<Row> {
    let mut stats: Vec<_> = t
        .categories
        .values()
        .map(|c| {
            let items: Vec<_> = t
                .items
                .values()
                .filter(|item| item.category_id == c.id)
                .collect();
            let weight = round_cents(items.iter().map(|item| item.weight_kg()).sum());
            let hazardous = items.iter().filter(|item| item.is_hazardous).count();
            (c, items.len(), hazardous, weight)
        })
        .collect();
    stats.sort_by(|a, b| descending(a.3, b.3));

    stats
        .into_iter()
        .map(|(c, total, hazardous, weight)| {
            row(json!({
                "category_id": c.id,
                "category_name": c.name,
                "total_items": total,
                "hazardous_items": hazardous,
                "total_weight_kg": weight,
            }))
        })
        .collect()
}

/// Load counts items sitting in batches that have not finished processing.
fn facility_capacity(t: &Tables) -> Vec<Row> {
    let mut usage: Vec<_> = t
        .facilities
        .values()
        .map(|f| {
            let load: f64 = t
                .batches
                .values()
                .filter(|b| b.facility_id == f.id && b.status != BatchStatus::Completed)
                .flat_map(|b| t.items_in_batch(b.id))
                .map(|item| item.weight_kg())
                .sum();
            let percent = if f.capacity_kg > 0.0 {
                round_cents(load / f.capacity_kg * 100.0)
            } else {
                0.0
            };
            (f, round_cents(load), percent)
        })
        .collect();
    usage.sort_by(|a, b| descending(a.2, b.2));

    usage
        .into_iter()
        .map(|(f, load, percent)| {
            row(json!({
                "facility_id": f.id,
                "facility_name": f.name,
                "is_operational": f.is_operational,
                "capacity_kg": f.capacity_kg,
                "current_load_kg": load,
                "capacity_usage_percent": percent,
            }))
        })
        .collect()
}

fn pickup_status_totals(t: &Tables) -> Vec<Row> {
    let mut groups: BTreeMap<&'static str, (usize, f64, f64)> = BTreeMap::new();
    for p in t.pickups.values() {
        let entry = groups.entry(p.status.as_str()).or_insert((0, 0.0, 0.0));
        entry.0 += 1;
        entry.1 += p.total_weight_kg;
        entry.2 += p.total_amount;
    }

    let mut totals: Vec<_> = groups.into_iter().collect();
    totals.sort_by(|a, b| b.1.0.cmp(&a.1.0));

    totals
        .into_iter()
        .map(|(status, (count, weight, amount))| {
            row(json!({
                "status": status,
                "count": count,
                "total_weight": round_cents(weight),
                "total_amount": round_cents(amount),
            }))
        })
        .collect()
}
