use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, info};
use traced_http::TracedClient;

use crate::config::PartnersConfig;
use crate::contract::client::PartnersApi;
use crate::domain::editor::PartnerEditor;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::PartnersLocalClient;
use crate::infra::http::RestPartnersGateway;

/// Wired partners module: REST gateway, cached service and the local client.
#[derive(Clone)]
pub struct PartnersModule {
    config: PartnersConfig,
    service: Arc<Service>,
    api: Arc<dyn PartnersApi>,
}

impl PartnersModule {
    pub fn from_config(config: PartnersConfig) -> anyhow::Result<Self> {
        info!("Initializing partners module");
        let api_base = config.api_base()?;
        debug!(
            "Loaded partners config: api_base={}, default_page_size={}",
            api_base, config.default_page_size
        );

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .context("failed to build HTTP client")?;
        let gateway = RestPartnersGateway::new(TracedClient::new(http), api_base);

        let service = Arc::new(Service::new(
            Arc::new(gateway),
            ServiceConfig {
                default_page_size: config.default_page_size,
            },
        ));
        let api: Arc<dyn PartnersApi> = Arc::new(PartnersLocalClient::new(service.clone()));

        info!("Partners module initialized");
        Ok(Self {
            config,
            service,
            api,
        })
    }

    pub fn api(&self) -> Arc<dyn PartnersApi> {
        self.api.clone()
    }

    pub fn service(&self) -> &Arc<Service> {
        &self.service
    }

    /// A fresh editor bound to this module's API and group labels.
    pub fn editor(&self) -> PartnerEditor {
        PartnerEditor::new(self.api.clone(), self.config.groups.clone())
    }

    pub fn config(&self) -> &PartnersConfig {
        &self.config
    }
}
