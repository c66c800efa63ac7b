use shared::{
    domain::{Notice, SkuId},
    error::ApiError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid storefront url: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {route} failed: {source}")]
    Request {
        route: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{route} answered with HTTP {status}")]
    Status { route: &'static str, status: u16 },
    #[error("{route} returned an unreadable body: {source}")]
    Decode {
        route: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("no line item for sku {0}")]
    UnknownItem(SkuId),
    #[error("sku {0} appears more than once in the cart snapshot")]
    DuplicateItem(SkuId),
    #[error("line item {sku_id} has no stock")]
    NoStock { sku_id: SkuId },
    #[error("quantity {quantity} for sku {sku_id} is outside 1..={stock}")]
    QuantityOutOfRange {
        sku_id: SkuId,
        quantity: u32,
        stock: u32,
    },
}

/// Local form validation failures. The display text is what the shopper sees.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Form is read-only")]
    ReadOnly,
    #[error("Passwords does not match")]
    PasswordMismatch,
    #[error("Same as current password")]
    PasswordUnchanged,
    #[error("Password cannot be empty")]
    EmptyPassword,
    #[error("Unknown country: {0}")]
    UnknownCountry(String),
    #[error("Please select a rating star")]
    MissingStar,
    #[error("Review already submitted")]
    ReviewLocked,
    #[error("Order in status {0} cannot be cancelled")]
    NotCancellable(&'static str),
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Invalid(#[from] FormError),
    #[error("{}", .0.message)]
    Remote(ApiError),
}

impl ActionError {
    pub fn notice(&self) -> Notice {
        Notice::warning(self.to_string())
    }
}

impl From<ApiError> for ActionError {
    fn from(value: ApiError) -> Self {
        Self::Remote(value)
    }
}
