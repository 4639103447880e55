use crate::utils::error::{Result, SquaresError};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub const ENTRY_FORM_MESSAGE: &str = "Please enter username, email, and quantity (min 1).";

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(SquaresError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(SquaresError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: i64, min_value: i64) -> Result<()> {
    if value < min_value {
        return Err(SquaresError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SquaresError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Storage keys become file names, so only a conservative character set is allowed.
pub fn validate_storage_key(field_name: &str, key: &str) -> Result<()> {
    validate_non_empty_string(field_name, key)?;
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        || key.starts_with('.')
    {
        return Err(SquaresError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: key.to_string(),
            reason: "Only ASCII letters, digits, '_', '-' and '.' are allowed".to_string(),
        });
    }
    Ok(())
}

/// Entry form fields: both trimmed strings must be present.
pub fn validate_identity(username: &str, email: &str) -> Result<()> {
    if username.trim().is_empty() || email.trim().is_empty() {
        return Err(SquaresError::validation(ENTRY_FORM_MESSAGE));
    }
    Ok(())
}

/// 數量從表單文字而來，非數字或小於 1 都視為驗證錯誤
pub fn parse_quantity(raw: &str) -> Result<usize> {
    match raw.trim().parse::<i64>() {
        Ok(qty) if qty >= 1 => Ok(qty as usize),
        _ => Err(SquaresError::validation(ENTRY_FORM_MESSAGE)),
    }
}

/// Accepts `7`, `0007` or `#0007` and returns the numeric board reference.
pub fn parse_reference_number(raw: &str) -> Result<u32> {
    let digits = raw.trim().trim_start_matches('#');
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(SquaresError::validation(format!(
            "Board number must be digits, got '{}'",
            raw
        )));
    }
    digits
        .parse::<u32>()
        .map_err(|_| SquaresError::validation(format!("Board number out of range: '{}'", raw)))
}
