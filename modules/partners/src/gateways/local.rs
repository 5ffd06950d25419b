use async_trait::async_trait;
use page_core::PageRequest;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::PartnersApi,
    error::PartnersError,
    model::{NewPartner, Partner, PartnersPage},
};
use crate::domain::service::Service;

/// In-process implementation of [`PartnersApi`] that delegates to the domain service.
pub struct PartnersLocalClient {
    service: Arc<Service>,
}

impl PartnersLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl PartnersApi for PartnersLocalClient {
    async fn list_partners(
        &self,
        page_size: u32,
        page_number: u32,
    ) -> Result<Arc<PartnersPage>, PartnersError> {
        let page = PageRequest::new(page_size, page_number)?;
        self.service.list_partners(page).await
    }

    async fn create_partner(&self, new_partner: NewPartner) -> Result<Partner, PartnersError> {
        self.service.create_partner(new_partner).await
    }

    async fn update_partner(&self, partner: Partner) -> Result<Partner, PartnersError> {
        self.service.update_partner(partner).await
    }

    async fn delete_partner(&self, partner: Partner) -> Result<Partner, PartnersError> {
        self.service.delete_partner(partner).await
    }

    async fn find_partner(&self, id: Uuid) -> Result<Option<Partner>, PartnersError> {
        self.service.find_partner(id).await
    }
}
