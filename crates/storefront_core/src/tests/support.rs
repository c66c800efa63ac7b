//! Scriptable in-memory backend for unit tests.

use std::{collections::VecDeque, sync::Mutex, time::Duration};

use async_trait::async_trait;
use shared::protocol::{
    AddressDeleteRequest, AddressExtra, AddressUpdateRequest, CartCountExtra, CartDeleteExtra,
    CartLineRequest, CheckoutSession, FormFields, NoExtra, OrderRequest, PaymentRenewExtra, Reply,
    ReviewRequest, WishlistExtra, WishlistRequest,
};
use tokio::sync::oneshot;

use crate::{error::TransportError, ApiResult, StorefrontApi};

#[derive(Debug, Clone)]
pub(crate) enum Call {
    UpdateCart(CartLineRequest),
    AddToCart(CartLineRequest),
    DeleteCartItem(CartLineRequest),
    ToggleWishlist(WishlistRequest),
    UpdateAccount(FormFields),
    ResetPassword(FormFields),
    CreateAddress(FormFields),
    UpdateAddress(AddressUpdateRequest),
    DeleteAddress(AddressDeleteRequest),
    CancelOrder(OrderRequest),
    DeleteOrder(OrderRequest),
    SubmitReview(ReviewRequest),
    RenewPayment(OrderRequest),
}

#[derive(Debug, Clone)]
pub(crate) enum Script {
    Accept,
    Reject(String),
    Unreachable,
}

#[derive(Default)]
pub(crate) struct FakeStorefront {
    calls: Mutex<Vec<Call>>,
    scripts: Mutex<VecDeque<Script>>,
    hold_updates: Mutex<bool>,
    held: Mutex<Vec<oneshot::Sender<Script>>>,
    cart_count: Option<u32>,
    wish_count: Option<u32>,
    new_address_id: Option<i64>,
    renewed_session: Option<String>,
}

impl FakeStorefront {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_cart_count(mut self, count: u32) -> Self {
        self.cart_count = Some(count);
        self
    }

    pub(crate) fn with_wish_count(mut self, count: u32) -> Self {
        self.wish_count = Some(count);
        self
    }

    pub(crate) fn with_new_address_id(mut self, id: i64) -> Self {
        self.new_address_id = Some(id);
        self
    }

    pub(crate) fn with_renewed_session(mut self, id: impl Into<String>) -> Self {
        self.renewed_session = Some(id.into());
        self
    }

    /// Queues outcomes for the next calls, in order; once empty every call is accepted.
    pub(crate) fn script(&self, outcomes: impl IntoIterator<Item = Script>) {
        self.scripts.lock().unwrap().extend(outcomes);
    }

    /// Parks every `update_cart` call until released by `release`.
    pub(crate) fn hold_updates(&self) {
        *self.hold_updates.lock().unwrap() = true;
    }

    pub(crate) fn held_count(&self) -> usize {
        self.held.lock().unwrap().len()
    }

    pub(crate) async fn wait_for_held(&self, count: usize) {
        for _ in 0..500 {
            if self.held_count() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("expected {count} held update(s), saw {}", self.held_count());
    }

    /// Answers the held update at `index` (in arrival order).
    pub(crate) fn release(&self, index: usize, script: Script) {
        let sender = self.held.lock().unwrap().remove(index);
        let _ = sender.send(script);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: Call) -> Script {
        self.calls.lock().unwrap().push(call);
        self.scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Script::Accept)
    }

    fn answer<T: Default>(route: &'static str, script: Script, msg: &str, extra: T) -> ApiResult<T> {
        match script {
            Script::Accept => Ok(Reply::success(msg, extra)),
            Script::Reject(errmsg) => Ok(Reply::failure(errmsg)),
            Script::Unreachable => Err(TransportError::Status { route, status: 503 }),
        }
    }
}

#[async_trait]
impl StorefrontApi for FakeStorefront {
    async fn update_cart(&self, request: CartLineRequest) -> ApiResult {
        let mut script = self.record(Call::UpdateCart(request));
        let held = *self.hold_updates.lock().unwrap();
        if held {
            let (tx, rx) = oneshot::channel();
            self.held.lock().unwrap().push(tx);
            script = rx.await.unwrap_or(Script::Unreachable);
        }
        Self::answer("/cart/update/", script, "Cart updated", NoExtra {})
    }

    async fn add_to_cart(&self, request: CartLineRequest) -> ApiResult<CartCountExtra> {
        let script = self.record(Call::AddToCart(request));
        Self::answer(
            "/cart/add/",
            script,
            "Added to cart",
            CartCountExtra {
                cart_count: self.cart_count,
            },
        )
    }

    async fn delete_cart_item(&self, request: CartLineRequest) -> ApiResult<CartDeleteExtra> {
        let script = self.record(Call::DeleteCartItem(request));
        Self::answer(
            "/cart/delete/",
            script,
            "Item deleted",
            CartDeleteExtra {
                total_count: None,
                cart_count: self.cart_count,
            },
        )
    }

    async fn toggle_wishlist(&self, request: WishlistRequest) -> ApiResult<WishlistExtra> {
        let script = self.record(Call::ToggleWishlist(request));
        Self::answer(
            "/account/wishlist/",
            script,
            "Item added to wishlist",
            WishlistExtra {
                wish_count: self.wish_count,
            },
        )
    }

    async fn update_account(&self, fields: FormFields) -> ApiResult {
        let script = self.record(Call::UpdateAccount(fields));
        Self::answer("/account/", script, "Data updated", NoExtra {})
    }

    async fn reset_password(&self, fields: FormFields) -> ApiResult {
        let script = self.record(Call::ResetPassword(fields));
        Self::answer("/account/passwordreset/", script, "Password changed", NoExtra {})
    }

    async fn create_address(&self, fields: FormFields) -> ApiResult<AddressExtra> {
        let script = self.record(Call::CreateAddress(fields));
        Self::answer(
            "/account/address/",
            script,
            "New address added",
            AddressExtra {
                new_id: self.new_address_id.map(shared::domain::AddressId),
                updated_id: None,
            },
        )
    }

    async fn update_address(&self, request: AddressUpdateRequest) -> ApiResult<AddressExtra> {
        let updated_id = request.addr_id;
        let script = self.record(Call::UpdateAddress(request));
        Self::answer(
            "/account/address/",
            script,
            "Address updated",
            AddressExtra {
                new_id: None,
                updated_id: Some(updated_id),
            },
        )
    }

    async fn delete_address(&self, request: AddressDeleteRequest) -> ApiResult {
        let script = self.record(Call::DeleteAddress(request));
        Self::answer("/account/address/", script, "Address deleted", NoExtra {})
    }

    async fn cancel_order(&self, request: OrderRequest) -> ApiResult {
        let script = self.record(Call::CancelOrder(request));
        Self::answer("/order/cancel/", script, "Cancellation requested", NoExtra {})
    }

    async fn delete_order(&self, request: OrderRequest) -> ApiResult {
        let script = self.record(Call::DeleteOrder(request));
        Self::answer("/order/cancel/", script, "Order deleted", NoExtra {})
    }

    async fn submit_review(&self, request: ReviewRequest) -> ApiResult {
        let script = self.record(Call::SubmitReview(request));
        Self::answer("/order/comment/", script, "Review submitted", NoExtra {})
    }

    async fn renew_payment(&self, request: OrderRequest) -> ApiResult<PaymentRenewExtra> {
        let script = self.record(Call::RenewPayment(request));
        Self::answer(
            "/order/paymentrenew/",
            script,
            "Payment renewed",
            PaymentRenewExtra {
                session: self
                    .renewed_session
                    .clone()
                    .map(|id| CheckoutSession { id }),
            },
        )
    }
}
