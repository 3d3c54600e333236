use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// A failed request that the API answered. Callers branch on this: `Unauthorized` means the
/// session is no longer any good, anything else can be retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The API did not accept the access token.
    Unauthorized { detail: String },
    /// The API refused the request for another reason.
    Rejected { status: u16, detail: String },
}

impl ApiError {
    /// Builds an error from a non-success response. The message is taken from the JSON `detail`
    /// field when there is one, otherwise from the raw body or the status reason.
    pub fn from_response(status: u16, reason: Option<&str>, body: &str) -> Self {
        let detail = decode_detail(body)
            .or_else(|| reason.map(str::to_string))
            .unwrap_or_else(|| format!("HTTP {status}"));
        match status {
            401 | 403 => ApiError::Unauthorized { detail },
            _ => ApiError::Rejected { status, detail },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub fn detail(&self) -> &str {
        match self {
            ApiError::Unauthorized { detail } | ApiError::Rejected { detail, .. } => detail,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Unauthorized { detail } => write!(f, "Not authorized: {detail}"),
            ApiError::Rejected { status, detail } => {
                write!(f, "Request rejected ({status}): {detail}")
            }
        }
    }
}

impl Error for ApiError {}

/// Returns true if `error`, or anything it wraps, is an `ApiError::Unauthorized`.
pub(crate) fn is_unauthorized(error: &anyhow::Error) -> bool {
    error
        .chain()
        .filter_map(|e| e.downcast_ref::<ApiError>())
        .any(ApiError::is_unauthorized)
}

fn decode_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => Some(body.to_string()),
        },
        _ => Some(body.to_string()),
    }
}
