use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, COOKIE, REFERER},
    Client, Method,
};
use serde::{de::DeserializeOwned, Serialize};
use shared::protocol::{
    routes, AddressDeleteRequest, AddressExtra, AddressUpdateRequest, CartCountExtra,
    CartDeleteExtra, CartLineRequest, FormFields, OrderRequest, PaymentRenewExtra, Reply,
    ReviewRequest, WishlistExtra, WishlistRequest,
};
use tracing::debug;
use url::Url;

use crate::{error::TransportError, ApiResult, StorefrontApi};

pub const CSRF_COOKIE: &str = "csrftoken";
pub const SESSION_COOKIE: &str = "sessionid";
/// Sent lowercase; header names are case-insensitive on the wire.
pub const CSRF_HEADER: &str = "x-csrftoken";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Looks up one cookie in a `Cookie` header value. Empty values count as missing.
pub fn cookie_value(raw: &str, name: &str) -> Option<String> {
    raw.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Pulls the anti-forgery token out of a `Cookie` header value.
pub fn csrf_token_from_cookies(raw: &str) -> Option<String> {
    cookie_value(raw, CSRF_COOKIE)
}

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub csrf_token: Option<String>,
    pub session_id: Option<String>,
}

impl Credentials {
    /// Takes both the token and the session from a browser `Cookie` header.
    pub fn from_cookie_header(raw: &str) -> Self {
        Self {
            csrf_token: csrf_token_from_cookies(raw),
            session_id: cookie_value(raw, SESSION_COOKIE),
        }
    }

    fn cookie_header(&self) -> Option<String> {
        let mut pairs = Vec::new();
        if let Some(token) = &self.csrf_token {
            pairs.push(format!("{CSRF_COOKIE}={token}"));
        }
        if let Some(session) = &self.session_id {
            pairs.push(format!("{SESSION_COOKIE}={session}"));
        }
        (!pairs.is_empty()).then(|| pairs.join("; "))
    }
}

/// Same-origin JSON client. Every call is a single request; nothing is retried.
pub struct HttpStorefront {
    http: Client,
    base_url: Url,
    credentials: Credentials,
}

impl HttpStorefront {
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self, TransportError> {
        Self::with_timeout(base_url, credentials, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = self
            .credentials
            .csrf_token
            .as_deref()
            .and_then(|t| HeaderValue::from_str(t).ok())
        {
            headers.insert(CSRF_HEADER, token);
        }
        if let Some(cookie) = self
            .credentials
            .cookie_header()
            .and_then(|c| HeaderValue::from_str(&c).ok())
        {
            headers.insert(COOKIE, cookie);
        }
        if let Ok(referer) = HeaderValue::from_str(self.base_url.as_str()) {
            headers.insert(REFERER, referer);
        }
        headers
    }

    async fn send<B, T>(&self, method: Method, route: &'static str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned + Send,
    {
        let url = self.base_url.join(route.trim_start_matches('/'))?;
        debug!(%method, %url, "storefront request");
        let response = self
            .http
            .request(method, url)
            .headers(self.headers())
            .json(body)
            .send()
            .await
            .map_err(|source| TransportError::Request { route, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                route,
                status: status.as_u16(),
            });
        }

        response
            .json::<Reply<T>>()
            .await
            .map_err(|source| TransportError::Decode { route, source })
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, url::ParseError> {
    let trimmed = raw.trim();
    if trimmed.ends_with('/') {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("{trimmed}/"))
    }
}

#[async_trait]
impl StorefrontApi for HttpStorefront {
    async fn update_cart(&self, request: CartLineRequest) -> ApiResult {
        self.send(Method::POST, routes::CART_UPDATE, &request).await
    }

    async fn add_to_cart(&self, request: CartLineRequest) -> ApiResult<CartCountExtra> {
        self.send(Method::POST, routes::CART_ADD, &request).await
    }

    async fn delete_cart_item(&self, request: CartLineRequest) -> ApiResult<CartDeleteExtra> {
        self.send(Method::POST, routes::CART_DELETE, &request).await
    }

    async fn toggle_wishlist(&self, request: WishlistRequest) -> ApiResult<WishlistExtra> {
        self.send(Method::POST, routes::WISHLIST, &request).await
    }

    async fn update_account(&self, fields: FormFields) -> ApiResult {
        self.send(Method::POST, routes::ACCOUNT, &fields).await
    }

    async fn reset_password(&self, fields: FormFields) -> ApiResult {
        self.send(Method::POST, routes::PASSWORD_RESET, &fields).await
    }

    async fn create_address(&self, fields: FormFields) -> ApiResult<AddressExtra> {
        self.send(Method::POST, routes::ADDRESS, &fields).await
    }

    async fn update_address(&self, request: AddressUpdateRequest) -> ApiResult<AddressExtra> {
        self.send(Method::PUT, routes::ADDRESS, &request).await
    }

    async fn delete_address(&self, request: AddressDeleteRequest) -> ApiResult {
        self.send(Method::DELETE, routes::ADDRESS, &request).await
    }

    async fn cancel_order(&self, request: OrderRequest) -> ApiResult {
        self.send(Method::POST, routes::ORDER_CANCEL, &request).await
    }

    async fn delete_order(&self, request: OrderRequest) -> ApiResult {
        self.send(Method::DELETE, routes::ORDER_CANCEL, &request).await
    }

    async fn submit_review(&self, request: ReviewRequest) -> ApiResult {
        self.send(Method::POST, routes::ORDER_COMMENT, &request).await
    }

    async fn renew_payment(&self, request: OrderRequest) -> ApiResult<PaymentRenewExtra> {
        self.send(Method::POST, routes::PAYMENT_RENEW, &request).await
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
