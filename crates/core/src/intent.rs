use thiserror::Error;

pub const EMPTY_TEXT_MESSAGE: &str = "Text cannot be empty.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Text cannot be empty.")]
    EmptyText,
}

/// Strips surrounding whitespace and rejects queries with nothing left.
pub fn validate_query(input: &str) -> Result<&str, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyText);
    }
    Ok(trimmed)
}
