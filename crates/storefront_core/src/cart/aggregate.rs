use serde::{Deserialize, Serialize};
use shared::domain::SkuId;

use super::LineItem;

/// Orders above this subtotal ship for free.
pub const FREE_SHIPPING_THRESHOLD: u64 = 10_000;
pub const SHIPPING_FEE_PER_ITEM: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTotal {
    pub sku_id: SkuId,
    pub amount: u64,
}

/// Everything the cart page derives from its rows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartAggregate {
    pub total_count: u64,
    pub subtotal: u64,
    pub total_price: u64,
    pub cart_count: usize,
    pub line_totals: Vec<LineTotal>,
}

impl CartAggregate {
    /// Recomputes from scratch; never patched incrementally.
    pub fn compute<'a>(items: impl IntoIterator<Item = &'a LineItem>) -> Self {
        let mut aggregate = Self::default();
        for item in items {
            let amount = u64::from(item.quantity).saturating_mul(item.unit_price);
            aggregate.line_totals.push(LineTotal {
                sku_id: item.sku_id,
                amount,
            });
            aggregate.subtotal = aggregate.subtotal.saturating_add(amount);
            aggregate.total_count = aggregate
                .total_count
                .saturating_add(u64::from(item.quantity));
            aggregate.cart_count += 1;
        }
        aggregate.total_price = aggregate.subtotal;
        aggregate
    }

    pub fn line_total(&self, sku_id: SkuId) -> Option<u64> {
        self.line_totals
            .iter()
            .find(|line| line.sku_id == sku_id)
            .map(|line| line.amount)
    }
}

pub fn shipping_fee(subtotal: u64, total_count: u64) -> u64 {
    if subtotal > FREE_SHIPPING_THRESHOLD {
        0
    } else {
        total_count.saturating_mul(SHIPPING_FEE_PER_ITEM)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutQuote {
    pub subtotal: u64,
    pub shipping_fee: u64,
    pub total_price: u64,
}

impl CheckoutQuote {
    pub fn from_aggregate(aggregate: &CartAggregate) -> Self {
        let fee = shipping_fee(aggregate.subtotal, aggregate.total_count);
        Self {
            subtotal: aggregate.subtotal,
            shipping_fee: fee,
            total_price: aggregate.subtotal.saturating_add(fee),
        }
    }

    pub fn ships_free(&self) -> bool {
        self.shipping_fee == 0
    }
}
