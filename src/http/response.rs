//! Response bodies shared by handlers.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// JSON error envelope: `{"message": …, "error": …, "code": …}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub error: String,
    pub code: u16,
}

impl ErrorBody {
    pub fn new(status: StatusCode, message: &str, error: impl ToString) -> Self {
        Self {
            message: message.to_string(),
            error: error.to_string(),
            code: status.as_u16(),
        }
    }
}
