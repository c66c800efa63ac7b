use serde::{Deserialize, Serialize};

pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed, please try again";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    LoginRequired,
    Validation,
    NotFound,
    Understocked,
    Rejected,
}

impl ErrorCode {
    /// Best-effort classification of a backend `errmsg`.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("login required") {
            Self::LoginRequired
        } else if lower.contains("understocked") {
            Self::Understocked
        } else if lower.contains("not exist") {
            Self::NotFound
        } else if lower.contains("invalid") || lower.contains("lack of data") {
            Self::Validation
        } else {
            Self::Rejected
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Builds an error from a failed reply; a missing `errmsg` becomes the generic message.
    pub fn from_errmsg(errmsg: Option<&str>) -> Self {
        match errmsg.map(str::trim).filter(|m| !m.is_empty()) {
            Some(message) => Self::new(ErrorCode::classify(message), message),
            None => Self::new(ErrorCode::Rejected, GENERIC_FAILURE_MESSAGE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_backend_messages() {
        assert_eq!(ErrorCode::classify("Login required"), ErrorCode::LoginRequired);
        assert_eq!(ErrorCode::classify("Understocked"), ErrorCode::Understocked);
        assert_eq!(ErrorCode::classify("Item not exist"), ErrorCode::NotFound);
        assert_eq!(ErrorCode::classify("Order does not exist"), ErrorCode::NotFound);
        assert_eq!(ErrorCode::classify("Invalid form data"), ErrorCode::Validation);
        assert_eq!(
            ErrorCode::classify("Passwords does not match"),
            ErrorCode::Rejected
        );
    }

    #[test]
    fn blank_errmsg_falls_back_to_generic_message() {
        let err = ApiError::from_errmsg(Some("   "));
        assert_eq!(err.code, ErrorCode::Rejected);
        assert_eq!(err.message, GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn errmsg_text_is_kept_and_classified() {
        let err = ApiError::from_errmsg(Some(" Understocked "));
        assert_eq!(err, ApiError::new(ErrorCode::Understocked, "Understocked"));
    }
}
