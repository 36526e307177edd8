//! # Catalog Source
//!
//! Where `LoadCatalog` gets its products from.
//!
//! ```text
//! ┌──────────────┐  fetch_products()  ┌──────────────────────────────────────┐
//! │ LoadCatalog  │───────────────────►│ dyn CatalogSource                    │
//! └──────────────┘                    │  ├── HttpCatalogSource (reqwest)     │
//!                                     │  │     GET {origin}/api/weblarek/... │
//!                                     │  └── StaticCatalog (in memory)       │
//!                                     └──────────────────────────────────────┘
//! ```
//!
//! The API answers either with a bare array of products or with
//! `{ "total": n, "items": [...] }`; both are accepted. An empty list is an
//! error, the storefront has nothing to show without products.

use async_trait::async_trait;
use larek_core::Product;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::ApiSettings;
use crate::error::{CatalogError, CatalogResult};

/// Supplies the product list.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_products(&self) -> CatalogResult<Vec<Product>>;
}

/// Both response shapes of the product endpoint.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProductList {
    Bare(Vec<Product>),
    Wrapped { items: Vec<Product> },
}

/// Decodes a product endpoint body.
pub fn decode_products(body: &[u8]) -> CatalogResult<Vec<Product>> {
    let list: ProductList =
        serde_json::from_slice(body).map_err(|e| CatalogError::Decode(e.to_string()))?;

    let items = match list {
        ProductList::Bare(items) | ProductList::Wrapped { items } => items,
    };

    if items.is_empty() {
        return Err(CatalogError::Empty);
    }
    Ok(items)
}

// =============================================================================
// HTTP Source
// =============================================================================

/// Fetches the catalog from the storefront API.
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    client: Client,
    url: String,
}

impl HttpCatalogSource {
    /// Builds a client with the configured timeout.
    pub fn new(api: &ApiSettings) -> CatalogResult<Self> {
        let client = Client::builder().timeout(api.timeout()).build()?;

        Ok(HttpCatalogSource {
            client,
            url: api.product_url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_products(&self) -> CatalogResult<Vec<Product>> {
        debug!(url = %self.url, "Fetching catalog");

        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        decode_products(&body)
    }
}

// =============================================================================
// In-Memory Source
// =============================================================================

/// A fixed product list, for offline runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    products: Vec<Product>,
}

impl StaticCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        StaticCatalog { products }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn fetch_products(&self) -> CatalogResult<Vec<Product>> {
        if self.products.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(self.products.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use larek_core::Money;

    const PRODUCT_JSON: &str = r#"{
        "id": "854cef69-976d-4c2a-a18c-2aa45046c390",
        "description": "Если планируете решать задачи в тренажёре, берите два.",
        "image": "/5_Dots.svg",
        "title": "+1 час в сутках",
        "category": "софт-скил",
        "price": 750
    }"#;

    #[test]
    fn test_decode_bare_array() {
        let body = format!("[{PRODUCT_JSON}]");
        let items = decode_products(body.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price, Some(Money::from_units(750)));
        assert_eq!(items[0].image, "/5_Dots.svg");
    }

    #[test]
    fn test_decode_wrapped_list_with_null_price() {
        let body = r#"{ "total": 1, "items": [
            { "id": "x", "title": "Мамка-таймер", "image": "/Asterisk_2.svg",
              "category": "другое", "description": "", "price": null }
        ] }"#;
        let items = decode_products(body.as_bytes()).unwrap();
        assert_eq!(items[0].price, None);
    }

    #[test]
    fn test_decode_rejects_empty_and_garbage() {
        assert!(matches!(decode_products(b"[]"), Err(CatalogError::Empty)));
        assert!(matches!(
            decode_products(br#"{ "items": [] }"#),
            Err(CatalogError::Empty)
        ));
        assert!(matches!(
            decode_products(b"<html>"),
            Err(CatalogError::Decode(_))
        ));
    }

    #[test]
    fn test_http_source_url() {
        let source = HttpCatalogSource::new(&ApiSettings::default()).unwrap();
        assert_eq!(
            source.url(),
            "https://larek-api.nomoreparties.co/api/weblarek/product"
        );
    }

    #[tokio::test]
    async fn test_static_catalog() {
        let product = Product::new("p1", "Widget", None);
        let source = StaticCatalog::new(vec![product.clone()]);
        assert_eq!(source.fetch_products().await.unwrap(), vec![product]);

        let empty = StaticCatalog::default();
        assert!(matches!(empty.fetch_products().await, Err(CatalogError::Empty)));
    }
}
