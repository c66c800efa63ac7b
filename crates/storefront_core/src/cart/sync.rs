use shared::{domain::SkuId, protocol::routes, protocol::CartLineRequest};
use tracing::{debug, warn};

use crate::{settle, StorefrontApi};

/// Outcome of one "set quantity" call, consumed by the handler for that item only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncResult {
    Applied,
    Failed { message: String },
}

/// Sets the remote quantity for `sku_id` to an absolute value. Not a delta, so a
/// replayed request converges on the same state. No retry.
pub async fn sync_quantity(
    api: &dyn StorefrontApi,
    sku_id: SkuId,
    quantity: u32,
    revision: u64,
) -> SyncResult {
    debug!(sku_id = sku_id.0, quantity, revision, "syncing cart quantity");
    let result = api
        .update_cart(CartLineRequest {
            sku_id,
            count: quantity,
            rev: Some(revision),
        })
        .await;

    match settle(routes::CART_UPDATE, result) {
        Ok(_) => SyncResult::Applied,
        Err(err) => {
            warn!(sku_id = sku_id.0, quantity, revision, "cart quantity not applied");
            SyncResult::Failed {
                message: err.message,
            }
        }
    }
}
