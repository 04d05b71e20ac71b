//! Validation helpers for DTOs.

use std::borrow::Borrow;

use validator::ValidationError;

/// Rejects strings made only of whitespace.
///
/// `length(min = 1)` alone lets `"   "` through, which would later be trimmed to nothing.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must contain at least one non-whitespace character".into());
        return Err(err);
    }
    Ok(())
}

/// Rejects grid positions that cannot exist on any supported grid (largest is 5x5).
pub fn validate_position(position: impl Borrow<usize>) -> Result<(), ValidationError> {
    let position = *position.borrow();
    if position >= MAX_CELLS {
        let mut err = ValidationError::new("position_range");
        err.message = Some(format!("position must be below {MAX_CELLS} (got {position})").into());
        return Err(err);
    }
    Ok(())
}

/// Number of cells on the largest supported grid.
pub const MAX_CELLS: usize = 25;
