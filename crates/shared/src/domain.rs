use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(SkuId);
id_newtype!(OrderId);
id_newtype!(OrderProductId);
id_newtype!(AddressId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "NW")]
    New,
    #[serde(rename = "CF")]
    Confirmed,
    #[serde(rename = "CL")]
    Cancelling,
    #[serde(rename = "CX")]
    Cancelled,
    #[serde(rename = "SP")]
    Shipped,
    #[serde(rename = "RT")]
    Returning,
    #[serde(rename = "CP")]
    Completed,
}

impl OrderStatus {
    /// Orders can be cancelled until they ship.
    pub fn can_request_cancel(self) -> bool {
        matches!(self, Self::New | Self::Confirmed)
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "NW" => Some(Self::New),
            "CF" => Some(Self::Confirmed),
            "CL" => Some(Self::Cancelling),
            "CX" => Some(Self::Cancelled),
            "SP" => Some(Self::Shipped),
            "RT" => Some(Self::Returning),
            "CP" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::New => "NW",
            Self::Confirmed => "CF",
            Self::Cancelling => "CL",
            Self::Cancelled => "CX",
            Self::Shipped => "SP",
            Self::Returning => "RT",
            Self::Completed => "CP",
        }
    }
}

/// Review rating. The backend only stores 1 through 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ReviewStar {
    VeryUnsatisfied = 1,
    Unsatisfied = 2,
    Neutral = 3,
    Satisfied = 4,
    VerySatisfied = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rating must be between 1 and 5, got {0}")]
pub struct InvalidStar(pub i64);

impl TryFrom<i64> for ReviewStar {
    type Error = InvalidStar;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::VeryUnsatisfied),
            2 => Ok(Self::Unsatisfied),
            3 => Ok(Self::Neutral),
            4 => Ok(Self::Satisfied),
            5 => Ok(Self::VerySatisfied),
            other => Err(InvalidStar(other)),
        }
    }
}

impl From<ReviewStar> for i64 {
    fn from(value: ReviewStar) -> Self {
        value as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Warning,
    Success,
}

/// A transient, dismissible message shown to the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.level {
            NoticeLevel::Warning => "warning",
            NoticeLevel::Success => "success",
        };
        write!(f, "[{label}] {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_codes_round_trip() {
        for status in [
            OrderStatus::New,
            OrderStatus::Confirmed,
            OrderStatus::Cancelling,
            OrderStatus::Cancelled,
            OrderStatus::Shipped,
            OrderStatus::Returning,
            OrderStatus::Completed,
        ] {
            assert_eq!(OrderStatus::from_code(status.code()), Some(status));
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.code()));
        }
        assert_eq!(OrderStatus::from_code(" cf "), Some(OrderStatus::Confirmed));
        assert_eq!(OrderStatus::from_code("XX"), None);
    }

    #[test]
    fn only_new_and_confirmed_orders_cancel() {
        assert!(OrderStatus::New.can_request_cancel());
        assert!(OrderStatus::Confirmed.can_request_cancel());
        assert!(!OrderStatus::Shipped.can_request_cancel());
        assert!(!OrderStatus::Cancelling.can_request_cancel());
    }

    #[test]
    fn review_star_rejects_out_of_range() {
        assert_eq!(ReviewStar::try_from(3), Ok(ReviewStar::Neutral));
        assert_eq!(ReviewStar::try_from(0), Err(InvalidStar(0)));
        assert!(serde_json::from_str::<ReviewStar>("6").is_err());
        assert_eq!(serde_json::to_string(&ReviewStar::VerySatisfied).unwrap(), "5");
    }

    #[test]
    fn notice_renders_level_prefix() {
        assert_eq!(Notice::warning("Out of inventory").to_string(), "[warning] Out of inventory");
        assert_eq!(Notice::success("Item deleted").to_string(), "[success] Item deleted");
    }
}
