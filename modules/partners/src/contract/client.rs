use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{
    error::PartnersError,
    model::{NewPartner, Partner, PartnersPage},
};

/// Public API of the partners module.
///
/// Mutations invalidate the cached partner list; the next `list_partners`
/// (and every mounted list query) re-fetches from the server.
#[async_trait]
pub trait PartnersApi: Send + Sync {
    /// One page of partners, validated against the schema.
    async fn list_partners(
        &self,
        page_size: u32,
        page_number: u32,
    ) -> Result<Arc<PartnersPage>, PartnersError>;

    /// Create a partner; the server assigns the id.
    async fn create_partner(&self, new_partner: NewPartner) -> Result<Partner, PartnersError>;

    /// Replace every field of an existing partner.
    async fn update_partner(&self, partner: Partner) -> Result<Partner, PartnersError>;

    /// Delete a partner; returns the server's echo of the deleted record.
    async fn delete_partner(&self, partner: Partner) -> Result<Partner, PartnersError>;

    /// Look a partner up by id by walking the list pages.
    async fn find_partner(&self, id: Uuid) -> Result<Option<Partner>, PartnersError>;
}
