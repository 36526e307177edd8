//! Catalog command.

use std::sync::Arc;

use async_trait::async_trait;
use larek_core::{CatalogState, Product};
use tracing::{debug, info, warn};

use super::{Command, CommandContext};
use crate::bus::Event;
use crate::catalog::CatalogSource;
use crate::error::CommandResult;

/// Message stored in `catalog.error` and shown to the shopper.
pub const CATALOG_ERROR_MESSAGE: &str = "Failed to load catalog";

/// Loads the product list from a [`CatalogSource`].
///
/// ## Outcomes
/// - Catalog already loaded and no `force_refresh`: nothing happens, the
///   command stays unexecuted and its undo is a no-op
/// - Source succeeds: items stored with CDN image URLs, `catalog:loaded`
/// - Source fails: `catalog.error` set, `catalog:error`, error toast;
///   the command itself still succeeds
pub struct LoadCatalog {
    ctx: CommandContext,
    source: Arc<dyn CatalogSource>,
    cdn_url: String,
    force_refresh: bool,
    executed: bool,
    previous: Option<CatalogState>,
}

impl LoadCatalog {
    const SOURCE: &'static str = "load_catalog";

    pub fn new(
        ctx: CommandContext,
        source: Arc<dyn CatalogSource>,
        cdn_url: impl Into<String>,
        force_refresh: bool,
    ) -> Self {
        LoadCatalog {
            ctx,
            source,
            cdn_url: cdn_url.into(),
            force_refresh,
            executed: false,
            previous: None,
        }
    }
}

#[async_trait]
impl Command for LoadCatalog {
    fn can_execute(&self) -> bool {
        !self.executed
    }

    async fn execute(&mut self) -> CommandResult<()> {
        let current = self.ctx.store.state().catalog.clone();
        if !self.force_refresh && !current.items.is_empty() && !current.loading {
            debug!(items = current.items.len(), "Catalog already loaded, skipping fetch");
            return Ok(());
        }

        self.previous = Some(current);
        self.ctx.store.update_catalog(|catalog| CatalogState {
            loading: true,
            error: None,
            ..catalog.clone()
        });

        match self.source.fetch_products().await {
            Ok(products) => {
                let items: Vec<Product> = products
                    .into_iter()
                    .map(|p| p.with_image_base(&self.cdn_url))
                    .collect();
                info!(items = items.len(), "Catalog loaded");

                let stored = items.clone();
                self.ctx.store.update_catalog(|_| CatalogState {
                    items: stored,
                    loading: false,
                    error: None,
                });
                self.executed = true;

                self.ctx
                    .emit(Event::CatalogLoaded { items }, Self::SOURCE)
                    .await
            }
            Err(e) => {
                warn!(error = %e, "Catalog load failed");

                self.ctx.store.update_catalog(|catalog| CatalogState {
                    loading: false,
                    error: Some(CATALOG_ERROR_MESSAGE.to_string()),
                    ..catalog.clone()
                });
                self.executed = true;

                self.ctx
                    .emit(
                        Event::CatalogError {
                            error: e.to_string(),
                        },
                        Self::SOURCE,
                    )
                    .await?;
                self.ctx.notify_error(CATALOG_ERROR_MESSAGE.to_string());
                Ok(())
            }
        }
    }

    async fn undo(&mut self) -> CommandResult<()> {
        let Some(previous) = self.previous.take() else {
            return Ok(());
        };

        self.ctx.store.update_catalog(|_| previous);
        self.executed = false;

        self.ctx.emit(Event::CatalogCleared, Self::SOURCE).await
    }

    fn description(&self) -> String {
        if self.force_refresh {
            "Reload product catalog".to_string()
        } else {
            "Load product catalog".to_string()
        }
    }

    fn is_executed(&self) -> bool {
        self.executed
    }
}
