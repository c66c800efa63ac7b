//! Cart quantity reconciliation.
//!
//! Keeps each line item's quantity in step with the backend cart and keeps the
//! derived totals consistent with local quantities. A quantity is committed
//! locally only after the backend confirmed it; totals are recomputed from
//! scratch after every commit and every removal.

use std::{collections::HashSet, sync::Arc};

use serde::{Deserialize, Serialize};
use shared::{
    domain::{Notice, SkuId},
    protocol::{routes, CartLineRequest},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{error::CartError, settle, success_notice, StorefrontApi};

mod aggregate;
mod quantity;
mod sync;

pub use aggregate::{shipping_fee, CartAggregate, CheckoutQuote, LineTotal};
pub use quantity::{
    parse_direct_input, plan_step, Rejection, Step, BELOW_MINIMUM_MESSAGE, INVALID_COUNT_MESSAGE,
    OUT_OF_INVENTORY_MESSAGE,
};
pub use sync::{sync_quantity, SyncResult};

/// Whether quantity controls are bound to persisted cart rows or to the
/// product page picker, which has no remote counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlScope {
    CartRow,
    ProductPicker,
}

/// One rendered row as captured at page load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartRow {
    pub sku_id: SkuId,
    pub quantity: u32,
    pub unit_price: u64,
    pub stock: u32,
}

/// Immutable price/stock snapshot taken once per page load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartRow>", into = "Vec<CartRow>")]
pub struct CartSnapshot {
    rows: Vec<CartRow>,
}

impl TryFrom<Vec<CartRow>> for CartSnapshot {
    type Error = CartError;

    fn try_from(rows: Vec<CartRow>) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<CartSnapshot> for Vec<CartRow> {
    fn from(snapshot: CartSnapshot) -> Self {
        snapshot.rows
    }
}

impl CartSnapshot {
    pub fn new(rows: Vec<CartRow>) -> Result<Self, CartError> {
        let snapshot = Self { rows };
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn rows(&self) -> &[CartRow] {
        &self.rows
    }

    pub fn validate(&self) -> Result<(), CartError> {
        let mut seen = HashSet::new();
        for row in &self.rows {
            if !seen.insert(row.sku_id) {
                return Err(CartError::DuplicateItem(row.sku_id));
            }
            if row.stock == 0 {
                return Err(CartError::NoStock { sku_id: row.sku_id });
            }
            if row.quantity == 0 || row.quantity > row.stock {
                return Err(CartError::QuantityOutOfRange {
                    sku_id: row.sku_id,
                    quantity: row.quantity,
                    stock: row.stock,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub sku_id: SkuId,
    pub quantity: u32,
    pub unit_price: u64,
    pub stock: u32,
    rollback: Option<u32>,
    issued_revision: u64,
    committed_revision: u64,
}

impl LineItem {
    pub(crate) fn from_row(row: &CartRow) -> Self {
        Self {
            sku_id: row.sku_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            stock: row.stock,
            rollback: None,
            issued_revision: 0,
            committed_revision: 0,
        }
    }

    fn to_row(&self) -> CartRow {
        CartRow {
            sku_id: self.sku_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
            stock: self.stock,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityOutcome {
    Committed {
        sku_id: SkuId,
        quantity: u32,
        aggregate: CartAggregate,
    },
    Kept {
        sku_id: SkuId,
        quantity: u32,
        rejection: Rejection,
    },
}

impl QuantityOutcome {
    pub fn quantity(&self) -> u32 {
        match self {
            Self::Committed { quantity, .. } | Self::Kept { quantity, .. } => *quantity,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Kept { rejection, .. } => Some(rejection),
            Self::Committed { .. } => None,
        }
    }

    pub fn notice(&self) -> Option<Notice> {
        self.rejection().and_then(Rejection::notice)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed {
        sku_id: SkuId,
        aggregate: CartAggregate,
    },
    Kept {
        sku_id: SkuId,
        rejection: Rejection,
    },
}

impl RemovalOutcome {
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::Kept { rejection, .. } => rejection.notice(),
            Self::Removed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddToCartOutcome {
    pub notice: Notice,
    pub cart_count: Option<u32>,
    pub added: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    Notice(Notice),
    QuantityCommitted { sku_id: SkuId, quantity: u32 },
    LineRemoved { sku_id: SkuId },
    AggregateChanged(CartAggregate),
    CartCountChanged(u32),
}

struct CartState {
    items: Vec<LineItem>,
}

impl CartState {
    fn item(&self, sku_id: SkuId) -> Result<&LineItem, CartError> {
        self.items
            .iter()
            .find(|item| item.sku_id == sku_id)
            .ok_or(CartError::UnknownItem(sku_id))
    }

    fn item_mut(&mut self, sku_id: SkuId) -> Result<&mut LineItem, CartError> {
        self.items
            .iter_mut()
            .find(|item| item.sku_id == sku_id)
            .ok_or(CartError::UnknownItem(sku_id))
    }

    fn aggregate(&self) -> CartAggregate {
        CartAggregate::compute(&self.items)
    }
}

/// Owns the page's line items. Handlers may overlap at their network call; the
/// state lock is never held across one.
pub struct CartReconciler {
    api: Arc<dyn StorefrontApi>,
    scope: ControlScope,
    inner: Mutex<CartState>,
    events: broadcast::Sender<CartEvent>,
}

impl CartReconciler {
    pub fn new(api: Arc<dyn StorefrontApi>, snapshot: &CartSnapshot, scope: ControlScope) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            api,
            scope,
            inner: Mutex::new(CartState {
                items: snapshot.rows().iter().map(LineItem::from_row).collect(),
            }),
            events,
        }
    }

    pub fn scope(&self) -> ControlScope {
        self.scope
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CartEvent> {
        self.events.subscribe()
    }

    pub async fn quantity(&self, sku_id: SkuId) -> Result<u32, CartError> {
        Ok(self.inner.lock().await.item(sku_id)?.quantity)
    }

    pub async fn aggregate(&self) -> CartAggregate {
        self.inner.lock().await.aggregate()
    }

    pub async fn checkout_quote(&self) -> CheckoutQuote {
        CheckoutQuote::from_aggregate(&self.aggregate().await)
    }

    /// Current rows, in render order, with committed quantities.
    pub async fn snapshot(&self) -> CartSnapshot {
        let guard = self.inner.lock().await;
        CartSnapshot {
            rows: guard.items.iter().map(LineItem::to_row).collect(),
        }
    }

    /// Increment/decrement control.
    pub async fn step(&self, sku_id: SkuId, step: Step) -> Result<QuantityOutcome, CartError> {
        let (current, stock) = {
            let guard = self.inner.lock().await;
            let item = guard.item(sku_id)?;
            (item.quantity, item.stock)
        };

        match plan_step(current, stock, step) {
            Ok(candidate) => self.apply(sku_id, candidate, None).await,
            Err(rejection) => Ok(self.keep(sku_id, current, rejection)),
        }
    }

    /// Quantity field gained focus: remember the value to roll back to.
    pub async fn focus(&self, sku_id: SkuId) -> Result<u32, CartError> {
        let mut guard = self.inner.lock().await;
        let item = guard.item_mut(sku_id)?;
        item.rollback = Some(item.quantity);
        Ok(item.quantity)
    }

    /// Quantity field lost focus with `raw` typed into it.
    pub async fn blur(&self, sku_id: SkuId, raw: &str) -> Result<QuantityOutcome, CartError> {
        let (rollback, stock) = {
            let mut guard = self.inner.lock().await;
            let item = guard.item_mut(sku_id)?;
            let rollback = item.rollback.take().unwrap_or(item.quantity);
            (rollback, item.stock)
        };

        match parse_direct_input(raw, stock) {
            Ok(candidate) => self.apply(sku_id, candidate, Some(rollback)).await,
            Err(rejection) => {
                debug!(sku_id = sku_id.0, raw, "rejected typed quantity");
                self.inner.lock().await.item_mut(sku_id)?.quantity = rollback;
                Ok(self.keep(sku_id, rollback, rejection))
            }
        }
    }

    /// Deletes the row remotely, then locally. Never removes before confirmation.
    pub async fn remove(&self, sku_id: SkuId) -> Result<RemovalOutcome, CartError> {
        let quantity = self.quantity(sku_id).await?;
        let result = self
            .api
            .delete_cart_item(CartLineRequest {
                sku_id,
                count: quantity,
                rev: None,
            })
            .await;

        match settle(routes::CART_DELETE, result) {
            Ok(_) => {
                let aggregate = {
                    let mut guard = self.inner.lock().await;
                    guard.items.retain(|item| item.sku_id != sku_id);
                    guard.aggregate()
                };
                info!(sku_id = sku_id.0, "cart line removed");
                let _ = self.events.send(CartEvent::LineRemoved { sku_id });
                let _ = self
                    .events
                    .send(CartEvent::AggregateChanged(aggregate.clone()));
                Ok(RemovalOutcome::Removed { sku_id, aggregate })
            }
            Err(err) => {
                let rejection = Rejection::Remote(err.message);
                self.publish_rejection(&rejection);
                Ok(RemovalOutcome::Kept { sku_id, rejection })
            }
        }
    }

    /// Posts the picker's quantity for `sku_id` to the backend cart.
    pub async fn add_to_cart(&self, sku_id: SkuId) -> Result<AddToCartOutcome, CartError> {
        let count = self.quantity(sku_id).await?;
        let result = self
            .api
            .add_to_cart(CartLineRequest {
                sku_id,
                count,
                rev: None,
            })
            .await;

        let outcome = match settle(routes::CART_ADD, result) {
            Ok(accepted) => {
                if let Some(cart_count) = accepted.extra.cart_count {
                    let _ = self.events.send(CartEvent::CartCountChanged(cart_count));
                }
                AddToCartOutcome {
                    notice: success_notice(accepted.msg, "Added to cart"),
                    cart_count: accepted.extra.cart_count,
                    added: true,
                }
            }
            Err(err) => AddToCartOutcome {
                notice: Notice::warning(err.message),
                cart_count: None,
                added: false,
            },
        };
        let _ = self.events.send(CartEvent::Notice(outcome.notice.clone()));
        Ok(outcome)
    }

    async fn apply(
        &self,
        sku_id: SkuId,
        candidate: u32,
        rollback: Option<u32>,
    ) -> Result<QuantityOutcome, CartError> {
        if self.scope == ControlScope::ProductPicker {
            let mut guard = self.inner.lock().await;
            guard.item_mut(sku_id)?.quantity = candidate;
            let aggregate = guard.aggregate();
            drop(guard);

            debug!(sku_id = sku_id.0, quantity = candidate, "picker quantity set");
            let _ = self.events.send(CartEvent::QuantityCommitted {
                sku_id,
                quantity: candidate,
            });
            let _ = self
                .events
                .send(CartEvent::AggregateChanged(aggregate.clone()));
            return Ok(QuantityOutcome::Committed {
                sku_id,
                quantity: candidate,
                aggregate,
            });
        }

        let revision = {
            let mut guard = self.inner.lock().await;
            let item = guard.item_mut(sku_id)?;
            item.issued_revision += 1;
            item.issued_revision
        };

        let result = sync_quantity(self.api.as_ref(), sku_id, candidate, revision).await;

        let mut guard = self.inner.lock().await;
        let item = guard.item_mut(sku_id)?;
        if revision < item.committed_revision {
            debug!(
                sku_id = sku_id.0,
                revision,
                committed = item.committed_revision,
                "dropping superseded cart update"
            );
            return Ok(QuantityOutcome::Kept {
                sku_id,
                quantity: item.quantity,
                rejection: Rejection::Superseded,
            });
        }

        match result {
            SyncResult::Applied => {
                item.quantity = candidate;
                item.committed_revision = revision;
                let aggregate = guard.aggregate();
                drop(guard);

                info!(sku_id = sku_id.0, quantity = candidate, revision, "cart quantity committed");
                let _ = self.events.send(CartEvent::QuantityCommitted {
                    sku_id,
                    quantity: candidate,
                });
                let _ = self
                    .events
                    .send(CartEvent::AggregateChanged(aggregate.clone()));
                Ok(QuantityOutcome::Committed {
                    sku_id,
                    quantity: candidate,
                    aggregate,
                })
            }
            SyncResult::Failed { message } => {
                if let Some(previous) = rollback {
                    item.quantity = previous;
                }
                let quantity = item.quantity;
                drop(guard);
                Ok(self.keep(sku_id, quantity, Rejection::Remote(message)))
            }
        }
    }

    fn keep(&self, sku_id: SkuId, quantity: u32, rejection: Rejection) -> QuantityOutcome {
        if rejection.is_local() {
            warn!(sku_id = sku_id.0, quantity, ?rejection, "quantity change rejected");
        }
        self.publish_rejection(&rejection);
        QuantityOutcome::Kept {
            sku_id,
            quantity,
            rejection,
        }
    }

    fn publish_rejection(&self, rejection: &Rejection) {
        if let Some(notice) = rejection.notice() {
            let _ = self.events.send(CartEvent::Notice(notice));
        }
    }
}

#[cfg(test)]
#[path = "../tests/cart_tests.rs"]
mod tests;
