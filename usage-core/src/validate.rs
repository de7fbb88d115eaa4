//! Write-path validation of reading drafts.
//!
//! Rules:
//! - date present and not after "today" (supplied by the caller's clock);
//! - utility type present and inside the closed set;
//! - usage present, strictly positive and finite.
//!
//! All applicable errors are collected into one list so a caller can surface
//! every problem at once instead of one at a time. Stored rows are never
//! re-validated; these checks gate new writes only.

use serde::Deserialize;
use time::Date;

use crate::domain::{ReadingPatch, UtilityType};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    #[error("date is required")]
    MissingDate,
    #[error("date cannot be in the future")]
    FutureDate,
    #[error("valid utility type is required (electricity, gas, or water)")]
    InvalidUtilityType,
    #[error("usage value is required")]
    MissingUsage,
    #[error("usage must be a positive number")]
    InvalidUsage,
}

/// Candidate reading as submitted by a client, before any invariant holds.
/// The type is kept as a raw string so unrecognized values reach validation
/// instead of failing deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadingDraft {
    pub date: Option<Date>,
    #[serde(rename = "type")]
    pub utility_type: Option<String>,
    pub usage: Option<f64>,
    pub notes: Option<String>,
}

impl ReadingDraft {
    /// The draft's utility type, when it parses into the closed set.
    pub fn parsed_type(&self) -> Option<UtilityType> {
        self.utility_type.as_deref().and_then(|raw| raw.parse().ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub errors: Vec<FieldError>,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }
}

pub fn is_valid_date(date: Date, today: Date) -> bool {
    date <= today
}

pub fn is_valid_usage(usage: f64) -> bool {
    usage > 0.0 && usage.is_finite()
}

/// Validate a draft against "today", collecting every field error. A draft
/// can carry multiple simultaneous errors; it is valid iff the list is empty.
pub fn validate_reading(draft: &ReadingDraft, today: Date) -> ValidationOutcome {
    let mut errors = Vec::new();

    match draft.date {
        None => errors.push(FieldError::MissingDate),
        Some(date) if !is_valid_date(date, today) => errors.push(FieldError::FutureDate),
        Some(_) => {}
    }

    match draft.utility_type.as_deref() {
        Some(raw) if raw.parse::<UtilityType>().is_ok() => {}
        _ => errors.push(FieldError::InvalidUtilityType),
    }

    match draft.usage {
        None => errors.push(FieldError::MissingUsage),
        Some(usage) if !is_valid_usage(usage) => errors.push(FieldError::InvalidUsage),
        Some(_) => {}
    }

    ValidationOutcome { errors }
}

/// Validate only the fields a partial update actually carries. Absent
/// fields keep their stored, already-validated values.
pub fn validate_patch(patch: &ReadingPatch, today: Date) -> ValidationOutcome {
    let mut errors = Vec::new();

    if let Some(date) = patch.date {
        if !is_valid_date(date, today) {
            errors.push(FieldError::FutureDate);
        }
    }

    if let Some(utility_type) = patch.utility_type {
        if !utility_type.is_known() {
            errors.push(FieldError::InvalidUtilityType);
        }
    }

    if let Some(usage) = patch.usage {
        if !is_valid_usage(usage) {
            errors.push(FieldError::InvalidUsage);
        }
    }

    ValidationOutcome { errors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    const TODAY: Date = date!(2024 - 06 - 15);

    fn draft(date: Date, utility_type: &str, usage: f64) -> ReadingDraft {
        ReadingDraft {
            date: Some(date),
            utility_type: Some(utility_type.to_string()),
            usage: Some(usage),
            notes: None,
        }
    }

    #[test]
    fn dates_up_to_today_are_valid() {
        assert!(is_valid_date(date!(2024 - 06 - 15), TODAY));
        assert!(is_valid_date(date!(2020 - 01 - 01), TODAY));
        assert!(!is_valid_date(date!(2024 - 06 - 16), TODAY));
    }

    #[test]
    fn usage_must_be_positive_and_finite() {
        assert!(is_valid_usage(0.1));
        assert!(!is_valid_usage(0.0));
        assert!(!is_valid_usage(-1.0));
        assert!(!is_valid_usage(f64::NAN));
        assert!(!is_valid_usage(f64::INFINITY));
    }

    #[test]
    fn valid_draft_produces_no_errors() {
        let outcome = validate_reading(&draft(date!(2024 - 06 - 14), "water", 3.2), TODAY);
        assert!(outcome.is_valid());
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn every_field_error_is_reported_at_once() {
        // Future date, type outside the closed set, non-positive usage.
        let outcome = validate_reading(&draft(date!(2024 - 06 - 16), "solar", -1.0), TODAY);

        assert!(!outcome.is_valid());
        assert_eq!(outcome.errors.len(), 3);
        assert!(outcome.errors.contains(&FieldError::FutureDate));
        assert!(outcome.errors.contains(&FieldError::InvalidUtilityType));
        assert!(outcome.errors.contains(&FieldError::InvalidUsage));
    }

    #[test]
    fn missing_fields_are_distinct_errors() {
        let outcome = validate_reading(&ReadingDraft::default(), TODAY);

        assert_eq!(outcome.errors.len(), 3);
        assert!(outcome.errors.contains(&FieldError::MissingDate));
        assert!(outcome.errors.contains(&FieldError::InvalidUtilityType));
        assert!(outcome.errors.contains(&FieldError::MissingUsage));
    }

    #[test]
    fn empty_patch_is_valid_and_present_fields_are_checked() {
        assert!(validate_patch(&ReadingPatch::default(), TODAY).is_valid());

        let patch = ReadingPatch {
            date: Some(date!(2024 - 06 - 16)),
            utility_type: Some(UtilityType::Unknown),
            usage: Some(0.0),
            notes: None,
        };
        let outcome = validate_patch(&patch, TODAY);
        assert_eq!(outcome.errors.len(), 3);
        assert!(outcome.errors.contains(&FieldError::FutureDate));
        assert!(outcome.errors.contains(&FieldError::InvalidUtilityType));
        assert!(outcome.errors.contains(&FieldError::InvalidUsage));
    }

    #[test]
    fn messages_are_human_readable() {
        let outcome = validate_reading(&ReadingDraft::default(), TODAY);
        let messages = outcome.messages();
        assert!(messages.iter().any(|m| m == "date is required"));
    }
}
