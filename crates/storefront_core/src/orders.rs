use shared::{
    domain::{Notice, OrderId, OrderProductId, OrderStatus, ReviewStar},
    error::{ApiError, ErrorCode, GENERIC_FAILURE_MESSAGE},
    protocol::{routes, OrderRequest, ReviewRequest},
};
use tracing::{info, warn};

use crate::{
    error::{ActionError, FormError},
    settle, success_notice, StorefrontApi,
};

/// Requests cancellation. When the caller knows the order status, orders
/// past confirmation are refused without a request.
pub async fn cancel_order(
    api: &dyn StorefrontApi,
    order_id: OrderId,
    status: Option<OrderStatus>,
) -> Result<Notice, ActionError> {
    if let Some(status) = status.filter(|status| !status.can_request_cancel()) {
        return Err(FormError::NotCancellable(status.code()).into());
    }
    let accepted = settle(routes::ORDER_CANCEL, api.cancel_order(OrderRequest { order_id }).await)?;
    info!(order_id = order_id.0, "order cancellation requested");
    Ok(success_notice(accepted.msg, "Cancellation requested"))
}

pub async fn delete_order(api: &dyn StorefrontApi, order_id: OrderId) -> Result<Notice, ActionError> {
    let accepted = settle(routes::ORDER_CANCEL, api.delete_order(OrderRequest { order_id }).await)?;
    info!(order_id = order_id.0, "order deleted");
    Ok(success_notice(accepted.msg, "Order deleted"))
}

/// Payment session id to hand to the checkout redirect. An empty existing id
/// means the previous session expired and must be renewed.
pub async fn checkout_session(
    api: &dyn StorefrontApi,
    order_id: OrderId,
    existing: Option<&str>,
) -> Result<String, ActionError> {
    if let Some(id) = existing.map(str::trim).filter(|id| !id.is_empty()) {
        return Ok(id.to_string());
    }
    let accepted = settle(routes::PAYMENT_RENEW, api.renew_payment(OrderRequest { order_id }).await)?;
    match accepted.extra.session {
        Some(session) if !session.id.is_empty() => {
            info!(order_id = order_id.0, "payment session renewed");
            Ok(session.id)
        }
        _ => {
            warn!(order_id = order_id.0, "payment renewal returned no session");
            Err(ApiError::new(ErrorCode::Rejected, GENERIC_FAILURE_MESSAGE).into())
        }
    }
}

/// Review form for one purchased product. Locked after a successful submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewForm {
    order_product_id: OrderProductId,
    submitted: bool,
}

impl ReviewForm {
    pub fn new(order_product_id: OrderProductId) -> Self {
        Self {
            order_product_id,
            submitted: false,
        }
    }

    pub fn order_product_id(&self) -> OrderProductId {
        self.order_product_id
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// `star` is the raw select value; anything outside 1..=5 never reaches the backend.
    pub async fn submit(
        &mut self,
        api: &dyn StorefrontApi,
        star: Option<i64>,
        comment: &str,
    ) -> Result<Notice, ActionError> {
        if self.submitted {
            return Err(FormError::ReviewLocked.into());
        }
        let star = star
            .and_then(|raw| ReviewStar::try_from(raw).ok())
            .ok_or(FormError::MissingStar)?;

        let request = ReviewRequest {
            order_product_id: self.order_product_id,
            star,
            comment: comment.to_string(),
        };
        let accepted = settle(routes::ORDER_COMMENT, api.submit_review(request).await)?;
        self.submitted = true;
        info!(order_product_id = self.order_product_id.0, star = i64::from(star), "review submitted");
        Ok(success_notice(accepted.msg, "Review submitted"))
    }
}

#[cfg(test)]
#[path = "tests/orders_tests.rs"]
mod tests;
