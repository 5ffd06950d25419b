//! Column filters for the partners table.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::contract::model::Partner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PartnerColumn {
    Name,
    Group,
    Inn,
    Kpp,
    Description,
}

impl PartnerColumn {
    pub const ALL: [PartnerColumn; 5] = [
        Self::Name,
        Self::Group,
        Self::Inn,
        Self::Kpp,
        Self::Description,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Name => "Наименование",
            Self::Group => "Группа",
            Self::Inn => "ИНН",
            Self::Kpp => "КПП",
            Self::Description => "Комментарии",
        }
    }

    /// Cell text; missing KPP and description read as empty.
    pub fn value_of(self, partner: &Partner) -> &str {
        match self {
            Self::Name => &partner.name,
            Self::Group => &partner.group,
            Self::Inn => partner.inn(),
            Self::Kpp => partner.kpp().unwrap_or_default(),
            Self::Description => partner.description.as_deref().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    pub text: String,
    pub value: String,
}

/// Distinct values of `column`, in the order they first appear.
pub fn filter_options(partners: &[Partner], column: PartnerColumn) -> Vec<FilterOption> {
    let mut seen = HashSet::new();
    partners
        .iter()
        .map(|p| column.value_of(p))
        .filter(|v| seen.insert(*v))
        .map(|v| FilterOption {
            text: v.to_string(),
            value: v.to_string(),
        })
        .collect()
}

/// Selected values per column. A row passes a column when its value starts
/// with any selected value; columns are ANDed.
#[derive(Debug, Clone, Default)]
pub struct PartnerFilter {
    selections: BTreeMap<PartnerColumn, Vec<String>>,
}

impl PartnerFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: PartnerColumn, value: impl Into<String>) -> Self {
        self.select(column, value);
        self
    }

    pub fn select(&mut self, column: PartnerColumn, value: impl Into<String>) {
        self.selections.entry(column).or_default().push(value.into());
    }

    pub fn clear(&mut self, column: PartnerColumn) {
        self.selections.remove(&column);
    }

    pub fn is_empty(&self) -> bool {
        self.selections.values().all(Vec::is_empty)
    }

    pub fn matches(&self, partner: &Partner) -> bool {
        self.selections.iter().all(|(column, values)| {
            let cell = column.value_of(partner);
            values.is_empty() || values.iter().any(|v| cell.starts_with(v.as_str()))
        })
    }

    pub fn apply<'a>(&self, partners: &'a [Partner]) -> Vec<&'a Partner> {
        partners.iter().filter(|p| self.matches(p)).collect()
    }
}
