use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::AppError;

/// Raw urlencoded form fields, validated field by field.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    /// Trimmed value, `None` when missing or blank.
    pub fn optional_text(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn required_text(&self, key: &str) -> Result<&str, AppError> {
        self.optional_text(key)
            .ok_or_else(|| AppError::Validation(format!("{key} is required")))
    }

    pub fn required_id(&self, key: &str) -> Result<i32, AppError> {
        let raw = self.required_text(key)?;
        match raw.parse::<i32>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(AppError::Validation(format!(
                "{key} must be a positive integer"
            ))),
        }
    }

    pub fn optional_float(&self, key: &str) -> Result<Option<f64>, AppError> {
        self.optional_text(key)
            .map(|raw| match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(value),
                _ => Err(AppError::Validation(format!("{key} must be a number"))),
            })
            .transpose()
    }

    pub fn required_float(&self, key: &str) -> Result<f64, AppError> {
        self.optional_float(key)?
            .ok_or_else(|| AppError::Validation(format!("{key} is required")))
    }

    /// Expects `YYYY-MM-DD`, the format of an HTML date input.
    pub fn required_date(&self, key: &str) -> Result<NaiveDate, AppError> {
        let raw = self.required_text(key)?;
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| AppError::Validation(format!("{key} must be a date (YYYY-MM-DD)")))
    }

    /// Checkbox semantics: absent means `None`.
    pub fn optional_flag(&self, key: &str) -> Option<bool> {
        self.optional_text(key).map(|raw| {
            matches!(
                raw.to_ascii_lowercase().as_str(),
                "on" | "true" | "1" | "yes"
            )
        })
    }
}

impl<const N: usize> From<[(&str, &str); N]> for FormFields {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::FormFields;
    use crate::error::AppError;

    #[test]
    fn ids_must_be_positive_integers() {
        let form = FormFields::from([("pickup_id", " 12 "), ("staff_id", "abc"), ("vehicle_id", "-3")]);

        assert_eq!(form.required_id("pickup_id").unwrap(), 12);
        assert!(matches!(form.required_id("staff_id"), Err(AppError::Validation(_))));
        assert!(matches!(form.required_id("vehicle_id"), Err(AppError::Validation(_))));
        assert!(matches!(form.required_id("facility_id"), Err(AppError::Validation(_))));
    }

    #[test]
    fn blank_optional_fields_are_absent() {
        let form = FormFields::from([("notes", "   "), ("estimated_weight", "")]);

        assert_eq!(form.optional_text("notes"), None);
        assert_eq!(form.optional_float("estimated_weight").unwrap(), None);
        assert!(form.required_text("notes").is_err());
    }

    #[test]
    fn floats_and_dates_are_parsed() {
        let form = FormFields::from([
            ("recovery_rate", "87.5"),
            ("estimated_weight", "heavy"),
            ("preferred_date", "2025-01-10"),
            ("bad_date", "10/01/2025"),
        ]);

        assert_eq!(form.required_float("recovery_rate").unwrap(), 87.5);
        assert!(form.optional_float("estimated_weight").is_err());
        assert_eq!(
            form.required_date("preferred_date").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
        );
        assert!(form.required_date("bad_date").is_err());
    }

    #[test]
    fn checkbox_values() {
        let form = FormFields::from([("is_hazardous", "on"), ("other", "off")]);

        assert_eq!(form.optional_flag("is_hazardous"), Some(true));
        assert_eq!(form.optional_flag("other"), Some(false));
        assert_eq!(form.optional_flag("missing"), None);
    }
}
