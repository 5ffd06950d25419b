use async_trait::async_trait;
use page_core::PageRequest;
use reqwest::{Method, Response};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use traced_http::TracedClient;
use url::Url;
use uuid::Uuid;

use crate::contract::error::{PartnersError, ValidationErrors};
use crate::contract::model::{NewPartner, Partner, PartnersPage};
use crate::domain::ports::PartnersGateway;
use crate::domain::schema;
use crate::infra::http::dto::{first_inn_error, PartnerBody};

/// `PartnersGateway` over the partners REST API rooted at `api_base`
/// (e.g. `http://localhost:5004/api/v1`).
pub struct RestPartnersGateway {
    client: TracedClient,
    api_base: Url,
}

impl RestPartnersGateway {
    pub fn new(client: TracedClient, api_base: Url) -> Self {
        Self { client, api_base }
    }

    fn partners_url(&self, id: Option<Uuid>) -> Result<Url, PartnersError> {
        let mut url = self.api_base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| PartnersError::invalid_request("invalid partners base URL"))?;
            segments.pop_if_empty().push("partners");
            if let Some(id) = id {
                segments.push(&id.to_string());
            }
        }
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&PartnerBody<'_>>,
    ) -> Result<Response, PartnersError> {
        let mut builder = self.client.request(method, url.as_str());
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let request = builder.build().map_err(transport_error)?;
        self.client.execute(request).await.map_err(transport_error)
    }

    /// Mutation round-trip: non-success answers carrying an INN message are
    /// rejections, everything else non-success is a transport failure.
    async fn mutate(
        &self,
        method: Method,
        url: Url,
        body: PartnerBody<'_>,
    ) -> Result<Partner, PartnersError> {
        let response = self.send(method, url, Some(&body)).await?;
        if !response.status().is_success() {
            return Err(rejection_or_failure(response).await);
        }
        let json = read_json(response).await?;
        schema::decode_partner(&json).map_err(|errors| {
            warn!(%errors, "Partner record rejected by schema");
            PartnersError::decode(errors)
        })
    }
}

#[async_trait]
impl PartnersGateway for RestPartnersGateway {
    #[instrument(
        name = "partners.http.fetch_page",
        skip_all,
        fields(api_base = %self.api_base, page_size = page.page_size, page_number = page.page_number)
    )]
    async fn fetch_page(&self, page: PageRequest) -> Result<PartnersPage, PartnersError> {
        let mut url = self.partners_url(None)?;
        url.query_pairs_mut().extend_pairs(page.query_pairs());

        let response = self.send(Method::GET, url, None).await?;
        if !response.status().is_success() {
            return Err(failure(response).await);
        }
        let json = read_json(response).await?;
        let decoded = schema::decode_page(&json).map_err(|errors| {
            warn!(%errors, "Partners page rejected by schema");
            PartnersError::decode(errors)
        })?;
        debug!(items = decoded.len(), "Fetched partners page");
        Ok(decoded)
    }

    #[instrument(name = "partners.http.create", skip_all, fields(api_base = %self.api_base))]
    async fn create(&self, new_partner: &NewPartner) -> Result<Partner, PartnersError> {
        let url = self.partners_url(None)?;
        self.mutate(Method::POST, url, PartnerBody::from(new_partner))
            .await
    }

    #[instrument(
        name = "partners.http.update",
        skip_all,
        fields(api_base = %self.api_base, partner_id = %partner.id)
    )]
    async fn update(&self, partner: &Partner) -> Result<Partner, PartnersError> {
        let url = self.partners_url(Some(partner.id))?;
        self.mutate(Method::PUT, url, PartnerBody::from(partner))
            .await
    }

    #[instrument(
        name = "partners.http.delete",
        skip_all,
        fields(api_base = %self.api_base, partner_id = %partner.id)
    )]
    async fn delete(&self, partner: &Partner) -> Result<Partner, PartnersError> {
        let url = self.partners_url(Some(partner.id))?;
        let response = self
            .send(Method::DELETE, url, Some(&PartnerBody::from(partner)))
            .await?;
        if !response.status().is_success() {
            return Err(failure(response).await);
        }
        let json = read_json(response).await?;
        schema::decode_partner(&json).map_err(|errors| {
            warn!(%errors, "Deleted partner echo rejected by schema");
            PartnersError::decode(errors)
        })
    }
}

fn transport_error(e: reqwest::Error) -> PartnersError {
    PartnersError::transport(e.status().map(|s| s.as_u16()), e.to_string())
}

async fn read_json(response: Response) -> Result<Value, PartnersError> {
    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        warn!(error = %e, "Response body is not JSON");
        PartnersError::decode(ValidationErrors::single("$", format!("invalid JSON: {e}")))
    })
}

/// Non-success answer as a transport error: status plus the body text, or the
/// canonical reason when the body is empty.
async fn failure(response: Response) -> PartnersError {
    let status = response.status();
    match error_body(response).await {
        Ok(body) => transport_failure(status, body),
        Err(e) => e,
    }
}

async fn rejection_or_failure(response: Response) -> PartnersError {
    let status = response.status();
    let body = match error_body(response).await {
        Ok(body) => body,
        Err(e) => return e,
    };
    let inn_message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| first_inn_error(&v));
    match inn_message {
        Some(message) => {
            debug!(status = status.as_u16(), "Server rejected INN");
            PartnersError::rejected(message)
        }
        None => transport_failure(status, body),
    }
}

/// Body of a non-success answer. A body that cannot be read is reported with
/// the status it came with.
async fn error_body(response: Response) -> Result<String, PartnersError> {
    let status = response.status();
    response.text().await.map_err(|e| {
        warn!(status = status.as_u16(), error = %e, "Failed to read error response body");
        PartnersError::transport(
            Some(status.as_u16()),
            format!("{status}: failed to read response body: {e}"),
        )
    })
}

fn transport_failure(status: reqwest::StatusCode, body: String) -> PartnersError {
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    } else {
        body
    };
    PartnersError::transport(Some(status.as_u16()), message)
}
