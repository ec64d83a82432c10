use crate::models::pickup::Item;
use crate::models::resources::Category;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickupTotals {
    pub total_weight_kg: f64,
    pub total_amount: f64,
}

/// Sums item weights and pays each kilogram at its category rate.
///
/// Items whose category is unknown still count towards the weight but earn
/// nothing. Both totals are rounded to two decimals, like the NUMERIC(10,2)
/// columns they end up in.
pub fn pickup_totals(items: &[&Item], categories: &[Category]) -> PickupTotals {
    let mut weight = 0.0;
    let mut amount = 0.0;

    for item in items {
        let item_weight = item.weight_kg().max(0.0);
        weight += item_weight;

        if let Some(category) = categories.iter().find(|c| c.id == item.category_id) {
            amount += item_weight * category.price_per_kg;
        }
    }

    PickupTotals {
        total_weight_kg: round_cents(weight),
        total_amount: round_cents(amount),
    }
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::{pickup_totals, round_cents};
    use crate::models::pickup::Item;
    use crate::models::resources::Category;

    fn item(id: i32, category_id: i32, estimated: Option<f64>, actual: Option<f64>) -> Item {
        Item {
            id,
            pickup_id: 1,
            category_id,
            description: "laptop".to_string(),
            condition: "used".to_string(),
            estimated_weight_kg: estimated,
            actual_weight_kg: actual,
            is_hazardous: false,
        }
    }

    fn categories() -> Vec<Category> {
        vec![
            Category {
                id: 1,
                name: "Computers".to_string(),
                price_per_kg: 2.5,
            },
            Category {
                id: 2,
                name: "Batteries".to_string(),
                price_per_kg: 4.0,
            },
        ]
    }

    #[test]
    fn actual_weight_wins_over_estimate() {
        let weighed = item(1, 1, Some(10.0), Some(8.0));
        let totals = pickup_totals(&[&weighed], &categories());

        assert_eq!(totals.total_weight_kg, 8.0);
        assert_eq!(totals.total_amount, 20.0);
    }

    #[test]
    fn mixed_categories_are_priced_separately() {
        let laptop = item(1, 1, Some(3.2), None);
        let battery = item(2, 2, Some(1.5), None);
        let unknown = item(3, 99, Some(2.0), None);
        let totals = pickup_totals(&[&laptop, &battery, &unknown], &categories());

        assert_eq!(totals.total_weight_kg, 6.7);
        assert_eq!(totals.total_amount, 14.0);
    }

    #[test]
    fn empty_pickup_has_zero_totals() {
        let totals = pickup_totals(&[], &categories());
        assert_eq!(totals.total_weight_kg, 0.0);
        assert_eq!(totals.total_amount, 0.0);
    }

    #[test]
    fn rounding_keeps_two_decimals() {
        assert_eq!(round_cents(1.005_1), 1.01);
        assert_eq!(round_cents(2.994), 2.99);
    }
}
