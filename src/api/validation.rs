use super::ApiError;

/// Clamps a requested page size into `1..=max`, falling back to `default`.
#[must_use]
pub fn clamp_limit(limit: Option<i64>, default: u64, max: u64) -> u64 {
    match limit {
        Some(n) if n > 0 => u64::try_from(n).unwrap_or(max).min(max),
        _ => default.min(max),
    }
}

/// Negative offsets are treated as zero.
#[must_use]
pub fn clamp_offset(offset: Option<i64>) -> u64 {
    offset.and_then(|n| u64::try_from(n).ok()).unwrap_or(0)
}

pub fn validate_project_id(id: i64) -> Result<i64, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid project ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

pub fn validate_user_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("User name cannot be empty"));
    }

    if trimmed.len() > 50 {
        return Err(ApiError::validation(
            "User name must be 50 characters or less",
        ));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::validation(
            "User name can only contain letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(trimmed)
}
