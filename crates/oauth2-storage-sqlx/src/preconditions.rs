//! Argument checks run before any statement executes.

use oauth2_core::{StoreError, StoreResult};

/// Width of the `varchar(255)` key columns.
pub const MAX_SHORT_STRING: usize = 255;

pub fn is_not_blank(value: &str, name: &str) -> StoreResult<()> {
    if value.trim().is_empty() {
        return Err(StoreError::validation(name, "should not be blank."));
    }
    Ok(())
}

pub fn has_max_length(value: &str, name: &str, max_length: usize) -> StoreResult<()> {
    if value.chars().count() > max_length {
        return Err(StoreError::validation(
            name,
            format!("must not exceed {max_length} characters."),
        ));
    }
    Ok(())
}

/// Non-blank and at most [`MAX_SHORT_STRING`] characters.
pub fn is_short_string(value: &str, name: &str) -> StoreResult<()> {
    is_not_blank(value, name)?;
    has_max_length(value, name, MAX_SHORT_STRING)
}
