use crate::domain::model::{ErrorSet, Field, FieldRule, InputRecord, ValidatedRecord};
use std::collections::BTreeMap;
use std::num::{IntErrorKind, ParseIntError};

/// Why a single field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Required,
    NotANumber,
    OutOfRange,
}

impl FieldError {
    pub fn message(self, field: Field) -> String {
        match self {
            FieldError::Required => field.required_message(),
            FieldError::NotANumber => field.type_message().to_string(),
            FieldError::OutOfRange => field.range_message().to_string(),
        }
    }
}

/// Check one trimmed value against a field rule.
pub fn check_value(rule: FieldRule, value: &str) -> Result<(), FieldError> {
    match rule {
        FieldRule::Integer { min, max } => {
            let parsed: i64 = value.parse().map_err(|e: ParseIntError| match e.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => FieldError::OutOfRange,
                _ => FieldError::NotANumber,
            })?;
            if parsed < min || parsed > max {
                return Err(FieldError::OutOfRange);
            }
            Ok(())
        }
        FieldRule::Float { min, max } => {
            let parsed: f64 = value.parse().map_err(|_| FieldError::NotANumber)?;
            if !parsed.is_finite() {
                return Err(FieldError::NotANumber);
            }
            if parsed < min || parsed > max {
                return Err(FieldError::OutOfRange);
            }
            Ok(())
        }
        FieldRule::Choice { allowed } => {
            if allowed.contains(&value) {
                Ok(())
            } else {
                Err(FieldError::OutOfRange)
            }
        }
    }
}

/// Validate one field of the submission. Blank counts as missing.
pub fn validate_field(field: Field, raw: Option<&str>) -> Result<String, FieldError> {
    let value = raw.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(FieldError::Required);
    }
    check_value(field.rule(), value)?;
    Ok(value.to_string())
}

/// Validate all 13 fields independently, collecting every violation.
pub fn validate(input: &InputRecord) -> Result<ValidatedRecord, ErrorSet> {
    let mut values = BTreeMap::new();
    let mut errors = ErrorSet::new();

    for field in Field::ALL {
        match validate_field(field, input.get(field)) {
            Ok(value) => {
                values.insert(field, value);
            }
            Err(err) => {
                tracing::debug!(field = field.name(), error = ?err, "field rejected");
                errors.insert(field, err.message(field));
            }
        }
    }

    if errors.is_empty() {
        Ok(ValidatedRecord::from_checked(values))
    } else {
        Err(errors)
    }
}
