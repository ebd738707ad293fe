//! Field-level checks shared by the step validators.
//!
//! Each helper returns the [`ValidationFailure`] the user should see when the
//! check fails. Text is trimmed and measured in characters, not bytes, so
//! Hebrew input counts the same as Latin input.

use crate::error::ValidationFailure;

/// Earliest practice start year accepted.
pub const MIN_START_YEAR: i32 = 1900;

fn fail(step: usize, field: &'static str, message: &str) -> ValidationFailure {
    ValidationFailure {
        step,
        field,
        message: message.to_string(),
    }
}

/// Trimmed value must contain at least one character.
pub fn require_non_blank(
    value: &str,
    step: usize,
    field: &'static str,
    message: &str,
) -> Result<(), ValidationFailure> {
    require_min_chars(value, 1, step, field, message)
}

/// Trimmed value must contain at least `min` characters.
pub fn require_min_chars(
    value: &str,
    min: usize,
    step: usize,
    field: &'static str,
    message: &str,
) -> Result<(), ValidationFailure> {
    if value.trim().chars().count() < min {
        return Err(fail(step, field, message));
    }
    Ok(())
}

/// Weak email check: non-blank and contains an `@`.
pub fn require_email(
    value: &str,
    step: usize,
    field: &'static str,
    message: &str,
) -> Result<(), ValidationFailure> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return Err(fail(step, field, message));
    }
    Ok(())
}

/// A single-select question must have an answer.
pub fn require_selected<T>(
    value: &Option<T>,
    step: usize,
    field: &'static str,
    message: &str,
) -> Result<(), ValidationFailure> {
    match value {
        Some(_) => Ok(()),
        None => Err(fail(step, field, message)),
    }
}

/// A multi-select question must have at least one answer.
pub fn require_any<T>(
    values: &[T],
    step: usize,
    field: &'static str,
    message: &str,
) -> Result<(), ValidationFailure> {
    if values.is_empty() {
        return Err(fail(step, field, message));
    }
    Ok(())
}

/// A year must be present and fall within `MIN_START_YEAR..=current_year`.
pub fn require_year(
    value: Option<i32>,
    current_year: i32,
    step: usize,
    field: &'static str,
    missing: &str,
    out_of_range: &str,
) -> Result<(), ValidationFailure> {
    match value {
        None => Err(fail(step, field, missing)),
        Some(year) if !(MIN_START_YEAR..=current_year).contains(&year) => {
            Err(fail(step, field, out_of_range))
        }
        Some(_) => Ok(()),
    }
}
