//! Input validation helpers
//!
//! Request bodies derive [`validator::Validate`]; handlers call
//! [`validate_request`] before anything reaches the core.

use std::collections::BTreeMap;

use serde_json::Value;
use validator::Validate;

use crate::utils::{AppError, AppResult};

/// Notes, reasons (status notes, cancellation reason)
pub const MAX_NOTE_LEN: u64 = 500;

/// Order, pickup and voucher codes
pub const MAX_CODE_LEN: u64 = 64;

/// Run the derive rules and turn failures into a `ValidationFailed` error
/// carrying the offending fields.
pub fn validate_request<T: Validate>(request: &T) -> AppResult<()> {
    let Err(errors) = request.validate() else {
        return Ok(());
    };

    let fields: BTreeMap<String, Vec<String>> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect();

    let summary = fields.keys().cloned().collect::<Vec<_>>().join(", ");
    let details = serde_json::to_value(&fields).unwrap_or(Value::Null);
    Err(AppError::validation(format!("Invalid fields: {summary}")).with_detail("fields", details))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 1, message = "must not be empty"))]
        reason: String,
        #[validate(range(min = 1, max = 10))]
        count: u32,
    }

    #[test]
    fn test_valid_request_passes() {
        let probe = Probe {
            reason: "x".into(),
            count: 3,
        };
        assert!(validate_request(&probe).is_ok());
    }

    #[test]
    fn test_failures_are_reported_per_field() {
        let probe = Probe {
            reason: String::new(),
            count: 0,
        };
        let err = validate_request(&probe).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(err.message.contains("count"));
        assert!(err.message.contains("reason"));
        let details = err.details.unwrap();
        assert_eq!(details["fields"]["reason"][0], "must not be empty");
        assert_eq!(details["fields"]["count"][0], "range");
    }
}
