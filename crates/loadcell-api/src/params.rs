// SPDX-License-Identifier: Apache-2.0

use crate::errors::ApiError;
use std::collections::HashMap;

/// Parses the `delay` query parameter for the slow operation.
///
/// Out-of-range values are rejected, never clamped; a capped delay
/// would hide caller bugs in a load-testing tool.
pub fn parse_delay_ms(
    query: &HashMap<String, String>,
    default_ms: u64,
    max_ms: u64,
) -> Result<u64, ApiError> {
    let Some(raw) = query.get("delay") else {
        return Ok(default_ms);
    };
    let value = raw
        .parse::<u64>()
        .map_err(|_| ApiError::invalid_param("delay", raw, "must be a non-negative integer"))?;
    if value > max_ms {
        return Err(ApiError::invalid_param(
            "delay",
            raw,
            &format!("must be at most {max_ms}"),
        ));
    }
    Ok(value)
}

/// Parses the `iterations` query parameter for the compute operation.
pub fn parse_iterations(
    query: &HashMap<String, String>,
    default_iterations: u64,
    max_iterations: u64,
) -> Result<u64, ApiError> {
    let Some(raw) = query.get("iterations") else {
        return Ok(default_iterations);
    };
    let value = raw
        .parse::<u64>()
        .map_err(|_| ApiError::invalid_param("iterations", raw, "must be a positive integer"))?;
    if value == 0 || value > max_iterations {
        return Err(ApiError::invalid_param(
            "iterations",
            raw,
            &format!("must be between 1 and {max_iterations}"),
        ));
    }
    Ok(value)
}

/// Validates a greeting path segment: non-blank, at most `max_chars`
/// Unicode scalar values. The name itself is never modified.
pub fn validate_name(name: &str, max_chars: usize) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::validation_failed("name", "must not be blank"));
    }
    let chars = name.chars().count();
    if chars > max_chars {
        return Err(ApiError::validation_failed(
            "name",
            &format!("must be at most {max_chars} characters"),
        ));
    }
    Ok(())
}

/// Validates an echo message: non-blank, at most `max_chars` Unicode
/// scalar values.
pub fn validate_echo_message(message: &str, max_chars: usize) -> Result<(), ApiError> {
    if message.trim().is_empty() {
        return Err(ApiError::validation_failed("message", "must not be blank"));
    }
    let chars = message.chars().count();
    if chars > max_chars {
        return Err(ApiError::validation_failed(
            "message",
            &format!("must be at most {max_chars} characters"),
        ));
    }
    Ok(())
}
