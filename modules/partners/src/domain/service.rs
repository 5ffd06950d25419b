use std::sync::Arc;

use page_core::PageRequest;
use query_cache::{Fetcher, QueryCache, QuerySubscription, Tag};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::error::PartnersError;
use crate::contract::model::{NewPartner, Partner, PartnersPage};
use crate::domain::ports::PartnersGateway;
use crate::domain::validation;

/// Cache tag carried by every partner list query.
pub const PARTNER_TAG: Tag = Tag::new("Partner");

pub type PartnersCache = QueryCache<PageRequest, PartnersPage, PartnersError>;
pub type PartnersSubscription = QuerySubscription<PartnersPage, PartnersError>;

/// Domain service: list queries go through the tag cache, mutations go to the
/// gateway and invalidate [`PARTNER_TAG`] once the server has accepted them.
#[derive(Clone)]
pub struct Service {
    gateway: Arc<dyn PartnersGateway>,
    cache: Arc<PartnersCache>,
    config: ServiceConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub default_page_size: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_page_size: page_core::DEFAULT_PAGE_SIZE,
        }
    }
}

impl Service {
    pub fn new(gateway: Arc<dyn PartnersGateway>, config: ServiceConfig) -> Self {
        Self {
            gateway,
            cache: Arc::new(PartnersCache::new()),
            config,
        }
    }

    pub fn cache(&self) -> &PartnersCache {
        &self.cache
    }

    pub fn default_page(&self) -> Result<PageRequest, PartnersError> {
        Ok(PageRequest::first(self.config.default_page_size)?)
    }

    fn fetcher(&self, page: PageRequest) -> Fetcher<PartnersPage, PartnersError> {
        let gateway = Arc::clone(&self.gateway);
        Arc::new(move || {
            let gateway = Arc::clone(&gateway);
            Box::pin(async move { gateway.fetch_page(page).await })
        })
    }

    #[instrument(
        name = "partners.service.list_partners",
        skip(self),
        fields(page_size = page.page_size, page_number = page.page_number)
    )]
    pub async fn list_partners(&self, page: PageRequest) -> Result<Arc<PartnersPage>, PartnersError> {
        debug!("Listing partners");
        let result = self
            .cache
            .query(page, &[PARTNER_TAG], self.fetcher(page))
            .await?;
        debug!("Listed {} partners", result.len());
        Ok(result)
    }

    /// Mount a list query; it is re-fetched after every accepted mutation
    /// for as long as the subscription is alive.
    pub fn watch_partners(&self, page: PageRequest) -> PartnersSubscription {
        self.cache
            .subscribe(page, &[PARTNER_TAG], self.fetcher(page))
    }

    #[instrument(
        name = "partners.service.create_partner",
        skip(self, new_partner),
        fields(inn = %new_partner.tax.inn())
    )]
    pub async fn create_partner(&self, new_partner: NewPartner) -> Result<Partner, PartnersError> {
        info!("Creating partner");
        validation::validate_new_partner(&new_partner).map_err(PartnersError::invalid)?;

        let created = self.settle(self.gateway.create(&new_partner).await)?;

        info!("Successfully created partner with id={}", created.id);
        Ok(created)
    }

    #[instrument(
        name = "partners.service.update_partner",
        skip(self, partner),
        fields(partner_id = %partner.id)
    )]
    pub async fn update_partner(&self, partner: Partner) -> Result<Partner, PartnersError> {
        info!("Updating partner");
        validation::validate_partner(&partner).map_err(PartnersError::invalid)?;

        let updated = self.settle(self.gateway.update(&partner).await)?;

        info!("Successfully updated partner");
        Ok(updated)
    }

    #[instrument(
        name = "partners.service.delete_partner",
        skip(self, partner),
        fields(partner_id = %partner.id)
    )]
    pub async fn delete_partner(&self, partner: Partner) -> Result<Partner, PartnersError> {
        info!("Deleting partner");

        let deleted = self.settle(self.gateway.delete(&partner).await)?;

        info!("Successfully deleted partner");
        Ok(deleted)
    }

    /// Walk list pages (through the cache) until `id` turns up.
    #[instrument(name = "partners.service.find_partner", skip(self), fields(partner_id = %id))]
    pub async fn find_partner(&self, id: Uuid) -> Result<Option<Partner>, PartnersError> {
        let mut page = self.default_page()?;
        loop {
            let result = self.list_partners(page).await?;
            if let Some(found) = result.data.iter().find(|p| p.id == id) {
                return Ok(Some(found.clone()));
            }
            // The server may answer with a page other than the one asked for.
            let off_page = result.meta_data.page_number != page.page_number;
            if off_page || !result.meta_data.has_next() || result.is_empty() {
                debug!(off_page, "Partner not found after {} page(s)", page.page_number);
                return Ok(None);
            }
            page = page.next();
        }
    }

    /// Invalidate the list after any mutation the server accepted. A `Decode`
    /// error means a 2xx whose body did not match the schema, so it counts.
    fn settle<T>(&self, result: Result<T, PartnersError>) -> Result<T, PartnersError> {
        if matches!(result, Ok(_) | Err(PartnersError::Decode { .. })) {
            self.invalidate();
        }
        result
    }

    fn invalidate(&self) {
        let refetches = self.cache.invalidate_tags(&[PARTNER_TAG]);
        debug!(refetches, "Invalidated partner list");
    }
}
