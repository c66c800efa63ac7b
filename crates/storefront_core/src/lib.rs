use async_trait::async_trait;
use shared::{
    domain::Notice,
    error::{ApiError, GENERIC_FAILURE_MESSAGE},
    protocol::{
        Accepted, AddressDeleteRequest, AddressExtra, AddressUpdateRequest, CartCountExtra,
        CartDeleteExtra, CartLineRequest, FormFields, NoExtra, OrderRequest, PaymentRenewExtra,
        Reply, ReviewRequest, WishlistExtra, WishlistRequest,
    },
};
use tracing::warn;

pub mod account;
pub mod cart;
pub mod countries;
pub mod error;
pub mod http;
pub mod orders;

pub use account::{
    toggle_wishlist, AccountInfoForm, AddressBook, AddressEntry, PasswordChange, WishlistPage,
    WishlistToggle,
};
pub use cart::{
    AddToCartOutcome, CartAggregate, CartEvent, CartReconciler, CartRow, CartSnapshot,
    CheckoutQuote, ControlScope, QuantityOutcome, Rejection, RemovalOutcome, Step,
};
pub use countries::{Country, CountryDirectory};
pub use error::{ActionError, CartError, FormError, TransportError};
pub use http::{cookie_value, csrf_token_from_cookies, Credentials, HttpStorefront};
pub use orders::{cancel_order, checkout_session, delete_order, ReviewForm};

pub type ApiResult<T = NoExtra> = std::result::Result<Reply<T>, TransportError>;

/// The backend endpoints the page scripts talk to. One method per route and verb.
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    async fn update_cart(&self, request: CartLineRequest) -> ApiResult;
    async fn add_to_cart(&self, request: CartLineRequest) -> ApiResult<CartCountExtra>;
    async fn delete_cart_item(&self, request: CartLineRequest) -> ApiResult<CartDeleteExtra>;
    async fn toggle_wishlist(&self, request: WishlistRequest) -> ApiResult<WishlistExtra>;
    async fn update_account(&self, fields: FormFields) -> ApiResult;
    async fn reset_password(&self, fields: FormFields) -> ApiResult;
    async fn create_address(&self, fields: FormFields) -> ApiResult<AddressExtra>;
    async fn update_address(&self, request: AddressUpdateRequest) -> ApiResult<AddressExtra>;
    async fn delete_address(&self, request: AddressDeleteRequest) -> ApiResult;
    async fn cancel_order(&self, request: OrderRequest) -> ApiResult;
    async fn delete_order(&self, request: OrderRequest) -> ApiResult;
    async fn submit_review(&self, request: ReviewRequest) -> ApiResult;
    async fn renew_payment(&self, request: OrderRequest) -> ApiResult<PaymentRenewExtra>;
}

/// Collapses a transport failure and a `res != 1` reply into the same `ApiError`.
/// Shoppers get one generic warning either way; the transport detail only goes to the log.
pub(crate) fn settle<T>(route: &'static str, result: ApiResult<T>) -> Result<Accepted<T>, ApiError> {
    match result {
        Ok(reply) => reply.into_result().map_err(|err| {
            warn!(route, code = ?err.code, message = %err.message, "storefront rejected request");
            err
        }),
        Err(err) => {
            warn!(route, error = %err, "storefront request failed");
            Err(ApiError::new(
                shared::error::ErrorCode::Rejected,
                GENERIC_FAILURE_MESSAGE,
            ))
        }
    }
}

/// Success notice for an accepted reply; the backend normally supplies the text.
pub(crate) fn success_notice(msg: Option<String>, fallback: &str) -> Notice {
    Notice::success(msg.filter(|m| !m.trim().is_empty()).unwrap_or_else(|| fallback.to_string()))
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
