#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use page_core::{PageMeta, PageRequest};
use parking_lot::Mutex;
use partners::contract::error::{PartnersError, ValidationErrors};
use partners::contract::model::{NewPartner, Partner, PartnersPage, TaxIdentity};
use partners::domain::ports::PartnersGateway;
use uuid::Uuid;

/// In-memory partners server.
#[derive(Default)]
pub struct InMemoryGateway {
    pub records: Mutex<Vec<Partner>>,
    pub fetches: AtomicUsize,
    pub mutations: AtomicUsize,
    pub fail_next_mutation: AtomicBool,
    /// Apply the next mutation but answer with a body that fails the schema.
    pub garble_next_echo: AtomicBool,
    pub fetch_delay: Option<Duration>,
    /// Serve page 1 whatever page is asked for.
    pub ignore_page_number: bool,
}

impl InMemoryGateway {
    pub fn with_records(records: Vec<Partner>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn begin_mutation(&self) -> Result<(), PartnersError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_mutation.swap(false, Ordering::SeqCst) {
            return Err(PartnersError::transport(Some(500), "Internal Server Error"));
        }
        Ok(())
    }

    fn echo(&self, partner: Partner) -> Result<Partner, PartnersError> {
        if self.garble_next_echo.swap(false, Ordering::SeqCst) {
            return Err(PartnersError::decode(ValidationErrors::single(
                "$",
                "invalid JSON: EOF while parsing a value at line 1 column 0",
            )));
        }
        Ok(partner)
    }

    fn not_found() -> PartnersError {
        PartnersError::transport(Some(404), "Not Found")
    }
}

#[async_trait]
impl PartnersGateway for InMemoryGateway {
    async fn fetch_page(&self, page: PageRequest) -> Result<PartnersPage, PartnersError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        let records = self.records.lock().clone();
        let page_number = if self.ignore_page_number { 1 } else { page.page_number };
        let size = page.page_size as usize;
        let start = (page_number as usize - 1) * size;
        let data: Vec<Partner> = records.iter().skip(start).take(size).cloned().collect();
        let page_count = records.len().div_ceil(size) as u32;
        Ok(PartnersPage::new(
            data,
            PageMeta {
                items_count: records.len() as u64,
                page_count,
                page_number,
                page_size: page.page_size,
            },
        ))
    }

    async fn create(&self, new_partner: &NewPartner) -> Result<Partner, PartnersError> {
        self.begin_mutation()?;
        let created = Partner {
            id: Uuid::new_v4(),
            name: new_partner.name.clone(),
            group: new_partner.group.clone(),
            description: new_partner.description.clone(),
            tax: new_partner.tax.clone(),
        };
        self.records.lock().push(created.clone());
        self.echo(created)
    }

    async fn update(&self, partner: &Partner) -> Result<Partner, PartnersError> {
        self.begin_mutation()?;
        let mut records = self.records.lock();
        let slot = records
            .iter_mut()
            .find(|p| p.id == partner.id)
            .ok_or_else(Self::not_found)?;
        *slot = partner.clone();
        self.echo(partner.clone())
    }

    async fn delete(&self, partner: &Partner) -> Result<Partner, PartnersError> {
        self.begin_mutation()?;
        let mut records = self.records.lock();
        let idx = records
            .iter()
            .position(|p| p.id == partner.id)
            .ok_or_else(Self::not_found)?;
        let removed = records.remove(idx);
        self.echo(removed)
    }
}

pub fn organization(name: &str, inn: &str) -> NewPartner {
    NewPartner {
        name: name.to_string(),
        group: "Группа 1".to_string(),
        description: None,
        tax: TaxIdentity::Organization {
            inn: inn.to_string(),
            kpp: "770943002".to_string(),
        },
    }
}

pub fn stored(name: &str, inn: &str) -> Partner {
    let p = organization(name, inn);
    Partner {
        id: Uuid::new_v4(),
        name: p.name,
        group: p.group,
        description: p.description,
        tax: p.tax,
    }
}
