//! HTTP client for the POS API, as used by front-end code.
//!
//! Every listing call yields a `Vec` (a `null` or empty body is an empty list) or a
//! [`ClientError`] the caller can branch on. UI code that prefers an empty screen over an
//! error dialog wraps the call in [`list_or_empty`].

pub mod error;
pub mod models;

pub use error::ClientError;
pub use models::{
    ApiOrder, ApiOrderItem, ApiSale, ApiSaleItem, Category, CreateOrderRequest,
    CreateSaleRequest, Expense, InventoryItem, UpdateOrderRequest,
};

use crate::{
    config::app::ApiConfig,
    core::{
        line_item::{LineItem, ProductRef},
        order::NewOrder,
    },
};
use models::{LoginRequest, TokenResponse};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

/// Result alias for client calls
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Bearer-token client over `reqwest`
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Builds a client for `config.base_url` with the configured timeout.
    ///
    /// # Errors
    /// Returns `ClientError::Network` if the TLS backend cannot be initialised.
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("pos-ledger/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()
            .map_err(ClientError::Network)?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Uses an already issued token instead of logging in.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Current bearer token, if authenticated
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{path}", self.base_url));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn checked(builder: RequestBuilder) -> ClientResult<Response> {
        let response = builder.send().await.map_err(ClientError::Network)?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ClientError::Authentication {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body
            };
            warn!("API returned {}: {}", status, message);
            return Err(ClientError::Server {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(builder: RequestBuilder) -> ClientResult<T> {
        let body = Self::checked(builder)
            .await?
            .bytes()
            .await
            .map_err(ClientError::Network)?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn fetch_list<T: DeserializeOwned>(builder: RequestBuilder) -> ClientResult<Vec<T>> {
        let body = Self::checked(builder)
            .await?
            .bytes()
            .await
            .map_err(ClientError::Network)?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        let items: Option<Vec<T>> = serde_json::from_slice(&body)?;
        Ok(items.unwrap_or_default())
    }

    /// Logs in and keeps the issued bearer token for later calls.
    ///
    /// # Errors
    /// Returns `ClientError::Authentication` for rejected credentials.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&mut self, username: &str, password: &str) -> ClientResult<()> {
        let response: TokenResponse = Self::fetch(
            self.request(Method::POST, "/auth/login")
                .json(&LoginRequest { username, password }),
        )
        .await?;
        self.token = Some(response.access_token);
        info!("Authenticated as {}", username);
        Ok(())
    }

    /// `GET /orders`
    ///
    /// # Errors
    /// Any [`ClientError`].
    pub async fn get_orders(&self) -> ClientResult<Vec<ApiOrder>> {
        Self::fetch_list(self.request(Method::GET, "/orders")).await
    }

    /// `POST /orders`
    ///
    /// # Errors
    /// Any [`ClientError`].
    #[instrument(skip(self, order), fields(lines = order.items.len()))]
    pub async fn create_order(&self, order: &NewOrder) -> ClientResult<ApiOrder> {
        let created: ApiOrder = Self::fetch(
            self.request(Method::POST, "/orders")
                .json(&CreateOrderRequest::from(order)),
        )
        .await?;
        debug!("API created order {}", created.id);
        Ok(created)
    }

    /// `PUT /orders/{id}`
    ///
    /// # Errors
    /// Any [`ClientError`].
    #[instrument(skip(self, update))]
    pub async fn update_order(
        &self,
        order_id: i64,
        update: &UpdateOrderRequest,
    ) -> ClientResult<ApiOrder> {
        Self::fetch(
            self.request(Method::PUT, &format!("/orders/{order_id}"))
                .json(update),
        )
        .await
    }

    /// `GET /orders/{id}/items`
    ///
    /// # Errors
    /// Any [`ClientError`].
    pub async fn get_order_items(&self, order_id: i64) -> ClientResult<Vec<ApiOrderItem>> {
        Self::fetch_list(self.request(Method::GET, &format!("/orders/{order_id}/items"))).await
    }

    /// `GET /sales`
    ///
    /// # Errors
    /// Any [`ClientError`].
    pub async fn get_sales_history(&self) -> ClientResult<Vec<ApiSale>> {
        Self::fetch_list(self.request(Method::GET, "/sales")).await
    }

    /// `GET /sales/{id}/items`
    ///
    /// # Errors
    /// Any [`ClientError`].
    pub async fn get_sale_details(&self, sale_id: i64) -> ClientResult<Vec<ApiSaleItem>> {
        Self::fetch_list(self.request(Method::GET, &format!("/sales/{sale_id}/items"))).await
    }

    /// `POST /sales`
    ///
    /// # Errors
    /// Any [`ClientError`].
    pub async fn create_sale(&self, lines: &[LineItem<ProductRef>]) -> ClientResult<ApiSale> {
        Self::fetch(
            self.request(Method::POST, "/sales")
                .json(&CreateSaleRequest::from(lines)),
        )
        .await
    }

    /// `GET /categories`
    ///
    /// # Errors
    /// Any [`ClientError`].
    pub async fn get_categories(&self) -> ClientResult<Vec<Category>> {
        Self::fetch_list(self.request(Method::GET, "/categories")).await
    }

    /// `GET /inventory`
    ///
    /// # Errors
    /// Any [`ClientError`].
    pub async fn get_inventory(&self) -> ClientResult<Vec<InventoryItem>> {
        Self::fetch_list(self.request(Method::GET, "/inventory")).await
    }

    /// `GET /expenses`
    ///
    /// # Errors
    /// Any [`ClientError`].
    pub async fn get_expenses(&self) -> ClientResult<Vec<Expense>> {
        Self::fetch_list(self.request(Method::GET, "/expenses")).await
    }
}

/// Unwraps a listing result, logging a warning and yielding an empty list on error.
#[must_use]
pub fn list_or_empty<T>(result: ClientResult<Vec<T>>, what: &str) -> Vec<T> {
    result.unwrap_or_else(|err| {
        warn!("Could not load {}: {}", what, err);
        Vec::new()
    })
}
