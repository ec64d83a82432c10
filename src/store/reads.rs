use crate::store::SqlArg;

/// The named reads the dispatcher issues against store tables and views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Read {
    DashboardStats,
    PickupSummaries,
    PickupSummary { pickup_id: i32 },
    ActiveUsers,
    IntakePickups,
    Categories,
    ItemDetails,
    PendingPickups,
    AvailableStaff,
    AvailableVehicles,
    OperationalFacilities,
    StaffWorkload,
    ActivePickups,
    PaymentSummaries,
    CollectedPickups,
    BatchSummaries,
    BatchSummary { batch_id: i32 },
    UnbatchedItems,
    UserActivity,
    CategoryStatistics,
    FacilityCapacity,
    PickupStatusTotals,
    UserStats { user_id: i32 },
}

/// Rows returned by the item details listing.
pub const ITEM_DETAILS_LIMIT: usize = 100;

impl Read {
    pub fn name(&self) -> &'static str {
        match self {
            Read::DashboardStats => "dashboard_stats",
            Read::PickupSummaries => "pickup_summaries",
            Read::PickupSummary { .. } => "pickup_summary",
            Read::ActiveUsers => "active_users",
            Read::IntakePickups => "intake_pickups",
            Read::Categories => "categories",
            Read::ItemDetails => "item_details",
            Read::PendingPickups => "pending_pickups",
            Read::AvailableStaff => "available_staff",
            Read::AvailableVehicles => "available_vehicles",
            Read::OperationalFacilities => "operational_facilities",
            Read::StaffWorkload => "staff_workload",
            Read::ActivePickups => "active_pickups",
            Read::PaymentSummaries => "payment_summaries",
            Read::CollectedPickups => "collected_pickups",
            Read::BatchSummaries => "batch_summaries",
            Read::BatchSummary { .. } => "batch_summary",
            Read::UnbatchedItems => "unbatched_items",
            Read::UserActivity => "user_activity",
            Read::CategoryStatistics => "category_statistics",
            Read::FacilityCapacity => "facility_capacity",
            Read::PickupStatusTotals => "pickup_status_totals",
            Read::UserStats { .. } => "user_stats",
        }
    }

    pub fn params(&self) -> Vec<SqlArg> {
        match self {
            Read::PickupSummary { pickup_id } => vec![SqlArg::Int(*pickup_id)],
            Read::BatchSummary { batch_id } => vec![SqlArg::Int(*batch_id)],
            Read::UserStats { user_id } => vec![SqlArg::Int(*user_id)],
            _ => Vec::new(),
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            Read::DashboardStats => {
                "SELECT
                    (SELECT COUNT(*) FROM users WHERE is_active = TRUE) AS active_users,
                    (SELECT COUNT(*) FROM pickup_requests WHERE status = 'pending') AS pending_pickups,
                    (SELECT COUNT(*) FROM pickup_requests WHERE status = 'completed') AS completed_pickups,
                    (SELECT COALESCE(SUM(total_weight_kg), 0) FROM pickup_requests WHERE status = 'completed') AS total_weight,
                    (SELECT COUNT(*) FROM recycling_batches WHERE status = 'open') AS open_batches"
            }
            Read::PickupSummaries => "SELECT * FROM v_pickup_summary ORDER BY pickup_id DESC",
            Read::PickupSummary { .. } => "SELECT * FROM v_pickup_summary WHERE pickup_id = $1",
            Read::ActiveUsers => {
                "SELECT user_id, full_name, email FROM users WHERE is_active = TRUE ORDER BY full_name"
            }
            Read::IntakePickups => {
                "SELECT pickup_id, user_id, preferred_date, status
                 FROM pickup_requests
                 WHERE status IN ('pending', 'assigned')
                 ORDER BY pickup_id DESC"
            }
            Read::Categories => "SELECT * FROM categories ORDER BY category_name",
            Read::ItemDetails => "SELECT * FROM v_item_details ORDER BY item_id DESC LIMIT 100",
            Read::PendingPickups => {
                "SELECT p.pickup_id, u.full_name, p.preferred_date,
                        p.total_weight_kg, p.pickup_address
                 FROM pickup_requests p
                 JOIN users u ON p.user_id = u.user_id
                 WHERE p.status = 'pending'
                 ORDER BY p.preferred_date, p.pickup_id"
            }
            Read::AvailableStaff => {
                "SELECT staff_id, staff_name, role
                 FROM staff_assignments
                 WHERE is_available = TRUE
                 ORDER BY staff_id"
            }
            Read::AvailableVehicles => {
                "SELECT * FROM vehicles WHERE is_available = TRUE ORDER BY vehicle_id"
            }
            Read::OperationalFacilities => {
                "SELECT * FROM recycling_facilities WHERE is_operational = TRUE ORDER BY facility_id"
            }
            Read::StaffWorkload => "SELECT * FROM v_staff_workload ORDER BY assigned_pickups DESC",
            Read::ActivePickups => {
                "SELECT * FROM v_pickup_summary
                 WHERE status IN ('assigned', 'collected')
                 ORDER BY scheduled_time"
            }
            Read::PaymentSummaries => "SELECT * FROM v_payment_summary ORDER BY payment_id DESC",
            Read::CollectedPickups => {
                "SELECT p.pickup_id, u.full_name, p.total_weight_kg,
                        p.total_amount, p.completed_time
                 FROM pickup_requests p
                 JOIN users u ON p.user_id = u.user_id
                 WHERE p.status = 'collected'
                 ORDER BY p.completed_time DESC"
            }
            Read::BatchSummaries => "SELECT * FROM v_batch_summary ORDER BY batch_id DESC",
            Read::BatchSummary { .. } => "SELECT * FROM v_batch_summary WHERE batch_id = $1",
            Read::UnbatchedItems => {
                "SELECT i.item_id, i.item_description, c.category_name,
                        COALESCE(i.actual_weight_kg, i.estimated_weight_kg) AS weight,
                        p.pickup_id, u.full_name
                 FROM items i
                 JOIN categories c ON i.category_id = c.category_id
                 JOIN pickup_requests p ON i.pickup_id = p.pickup_id
                 JOIN users u ON p.user_id = u.user_id
                 WHERE p.status = 'completed'
                   AND NOT EXISTS (SELECT 1 FROM batch_items b WHERE b.item_id = i.item_id)
                 ORDER BY i.item_id DESC"
            }
            Read::UserActivity => {
                "SELECT * FROM v_user_activity ORDER BY total_weight_recycled_kg DESC"
            }
            Read::CategoryStatistics => {
                "SELECT * FROM v_category_statistics ORDER BY total_weight_kg DESC"
            }
            Read::FacilityCapacity => {
                "SELECT * FROM v_facility_capacity ORDER BY capacity_usage_percent DESC"
            }
            Read::PickupStatusTotals => {
                "SELECT status,
                        COUNT(*) AS count,
                        SUM(total_weight_kg) AS total_weight,
                        SUM(total_amount) AS total_amount
                 FROM pickup_requests
                 GROUP BY status
                 ORDER BY count DESC"
            }
            Read::UserStats { .. } => "SELECT * FROM get_user_stats($1)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Read;
    use crate::store::SqlArg;

    #[test]
    fn keyed_reads_bind_their_id() {
        assert_eq!(Read::PickupSummary { pickup_id: 4 }.params(), vec![SqlArg::Int(4)]);
        assert_eq!(Read::UserStats { user_id: 9 }.params(), vec![SqlArg::Int(9)]);
        assert!(Read::PickupSummaries.params().is_empty());
    }

    #[test]
    fn placeholder_count_matches_params() {
        let reads = [
            Read::DashboardStats,
            Read::PickupSummary { pickup_id: 1 },
            Read::BatchSummary { batch_id: 1 },
            Read::UnbatchedItems,
            Read::UserStats { user_id: 1 },
        ];

        for read in reads {
            let placeholders = read.sql().matches("$1").count();
            assert_eq!(placeholders, read.params().len(), "{}", read.name());
        }
    }
}
