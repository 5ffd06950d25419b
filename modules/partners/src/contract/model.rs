use page_core::Page;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// INN length for organizations (legal entities).
pub const ORGANIZATION_INN_LEN: usize = 10;
/// INN length for individuals.
pub const INDIVIDUAL_INN_LEN: usize = 12;
pub const KPP_LEN: usize = 9;

/// Tax identifiers, discriminated by whether the partner is a legal entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaxIdentity {
    /// 10-digit INN, 9-digit KPP.
    Organization { inn: String, kpp: String },
    /// 12-digit INN; KPP is optional.
    Individual { inn: String, kpp: Option<String> },
}

impl TaxIdentity {
    pub fn inn(&self) -> &str {
        match self {
            Self::Organization { inn, .. } | Self::Individual { inn, .. } => inn,
        }
    }

    pub fn kpp(&self) -> Option<&str> {
        match self {
            Self::Organization { kpp, .. } => Some(kpp),
            Self::Individual { kpp, .. } => kpp.as_deref(),
        }
    }

    pub fn has_legal_entity(&self) -> bool {
        matches!(self, Self::Organization { .. })
    }
}

/// A partner as it exists on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partner {
    pub id: Uuid,
    pub name: String,
    pub group: String,
    pub description: Option<String>,
    pub tax: TaxIdentity,
}

/// Creation payload: everything but the server-assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPartner {
    pub name: String,
    pub group: String,
    pub description: Option<String>,
    pub tax: TaxIdentity,
}

impl Partner {
    pub fn inn(&self) -> &str {
        self.tax.inn()
    }

    pub fn kpp(&self) -> Option<&str> {
        self.tax.kpp()
    }

    /// Same identity, every other field replaced.
    pub fn with_values(&self, values: NewPartner) -> Partner {
        Partner {
            id: self.id,
            name: values.name,
            group: values.group,
            description: values.description,
            tax: values.tax,
        }
    }

    /// Pre-filled form for editing this partner.
    pub fn to_form(&self) -> PartnerForm {
        PartnerForm {
            name: self.name.clone(),
            group: self.group.clone(),
            inn: self.inn().to_string(),
            kpp: self.kpp().unwrap_or_default().to_string(),
            description: self.description.clone(),
            has_legal_entity: self.tax.has_legal_entity(),
        }
    }
}

/// Raw, unvalidated user input for creating or editing a partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerForm {
    pub name: String,
    pub group: String,
    pub inn: String,
    pub kpp: String,
    pub description: Option<String>,
    pub has_legal_entity: bool,
}

impl Default for PartnerForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            group: String::new(),
            inn: String::new(),
            kpp: String::new(),
            description: None,
            has_legal_entity: false,
        }
    }
}

/// One page of the partner list with pagination metadata.
pub type PartnersPage = Page<Partner>;
