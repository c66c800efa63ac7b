use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    domain::{AddressId, OrderId, OrderProductId, ReviewStar, SkuId},
    error::ApiError,
};

pub mod routes {
    pub const CART_UPDATE: &str = "/cart/update/";
    pub const CART_ADD: &str = "/cart/add/";
    pub const CART_DELETE: &str = "/cart/delete/";
    pub const WISHLIST: &str = "/account/wishlist/";
    pub const ACCOUNT: &str = "/account/";
    pub const PASSWORD_RESET: &str = "/account/passwordreset/";
    pub const ADDRESS: &str = "/account/address/";
    pub const ORDER_CANCEL: &str = "/order/cancel/";
    pub const ORDER_COMMENT: &str = "/order/comment/";
    pub const PAYMENT_RENEW: &str = "/order/paymentrenew/";
}

/// The `res` discriminator. The backend emits it both as a string and as a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultCode {
    Success,
    Failure,
    Other(String),
}

impl ResultCode {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    fn from_raw(raw: &str) -> Self {
        match raw.trim() {
            "1" => Self::Success,
            "0" => Self::Failure,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawResultCode {
    Int(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for ResultCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawResultCode::deserialize(deserializer)? {
            RawResultCode::Int(value) => Self::from_raw(&value.to_string()),
            RawResultCode::Text(value) => Self::from_raw(&value),
        })
    }
}

impl Serialize for ResultCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Success => serializer.serialize_str("1"),
            Self::Failure => serializer.serialize_str("0"),
            Self::Other(raw) => serializer.serialize_str(raw),
        }
    }
}

/// Every endpoint answers with this envelope; `extra` carries the endpoint-specific fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply<T = NoExtra> {
    pub res: ResultCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errmsg: Option<String>,
    #[serde(flatten)]
    pub extra: T,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted<T> {
    pub msg: Option<String>,
    pub extra: T,
}

impl<T> Reply<T> {
    pub fn success(msg: impl Into<String>, extra: T) -> Self {
        Self {
            res: ResultCode::Success,
            msg: Some(msg.into()),
            errmsg: None,
            extra,
        }
    }

    pub fn failure(errmsg: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            res: ResultCode::Failure,
            msg: None,
            errmsg: Some(errmsg.into()),
            extra: T::default(),
        }
    }

    pub fn into_result(self) -> Result<Accepted<T>, ApiError> {
        if self.res.is_success() {
            Ok(Accepted {
                msg: self.msg,
                extra: self.extra,
            })
        } else {
            Err(ApiError::from_errmsg(self.errmsg.as_deref()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NoExtra {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineRequest {
    pub sku_id: SkuId,
    pub count: u32,
    /// Per-item revision; lets the backend drop updates older than the last one it applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistRequest {
    pub sku_id: SkuId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub order_id: OrderId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub order_product_id: OrderProductId,
    pub star: ReviewStar,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressDeleteRequest {
    pub addr_id: AddressId,
}

/// Free-form form submission, serialized as a flat JSON object of strings.
pub type FormFields = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressUpdateRequest {
    pub addr_id: AddressId,
    #[serde(flatten)]
    pub fields: FormFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartCountExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_count: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartDeleteExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_count: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WishlistExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wish_count: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AddressExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_id: Option<AddressId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_id: Option<AddressId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentRenewExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<CheckoutSession>,
}
