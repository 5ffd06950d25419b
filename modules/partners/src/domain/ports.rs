use async_trait::async_trait;
use page_core::PageRequest;

use crate::contract::error::PartnersError;
use crate::contract::model::{NewPartner, Partner, PartnersPage};

/// Outbound port: the only way the domain reaches the partners server.
///
/// Implementations return decoded, schema-checked records; a payload that
/// does not match the schema is a `PartnersError::Decode`. Mutations only
/// decode after the server accepted the request, so a `Decode` error from
/// `create`, `update` or `delete` still means the change was applied.
#[async_trait]
pub trait PartnersGateway: Send + Sync {
    async fn fetch_page(&self, page: PageRequest) -> Result<PartnersPage, PartnersError>;

    async fn create(&self, new_partner: &NewPartner) -> Result<Partner, PartnersError>;

    async fn update(&self, partner: &Partner) -> Result<Partner, PartnersError>;

    async fn delete(&self, partner: &Partner) -> Result<Partner, PartnersError>;
}
