//! Wire shapes for requests sent to the partners server.
//!
//! Responses are decoded by `domain::schema`; only request bodies and the
//! error envelope live here.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::contract::model::{NewPartner, Partner, TaxIdentity};

/// Request body for POST/PUT/DELETE. `id` is omitted on creation; an absent
/// KPP is sent as `""`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PartnerBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: &'a str,
    pub inn: &'a str,
    pub kpp: &'a str,
    pub group: &'a str,
    pub description: Option<&'a str>,
    pub has_legal_entity: bool,
}

impl<'a> PartnerBody<'a> {
    fn build(
        id: Option<Uuid>,
        name: &'a str,
        group: &'a str,
        description: Option<&'a str>,
        tax: &'a TaxIdentity,
    ) -> Self {
        Self {
            id,
            name,
            inn: tax.inn(),
            kpp: tax.kpp().unwrap_or_default(),
            group,
            description,
            has_legal_entity: tax.has_legal_entity(),
        }
    }
}

impl<'a> From<&'a NewPartner> for PartnerBody<'a> {
    fn from(p: &'a NewPartner) -> Self {
        Self::build(None, &p.name, &p.group, p.description.as_deref(), &p.tax)
    }
}

impl<'a> From<&'a Partner> for PartnerBody<'a> {
    fn from(p: &'a Partner) -> Self {
        Self::build(Some(p.id), &p.name, &p.group, p.description.as_deref(), &p.tax)
    }
}

/// First INN message of a rejection envelope.
///
/// Accepts `{ data: { errors: { INN: [...] } } }` and the bare problem-details
/// form `{ errors: { INN: [...] } }`; the key is matched case-insensitively.
pub fn first_inn_error(body: &Value) -> Option<String> {
    let errors = body
        .get("data")
        .and_then(|d| d.get("errors"))
        .or_else(|| body.get("errors"))?
        .as_object()?;

    errors
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("inn"))
        .and_then(|(_, messages)| match messages {
            Value::Array(items) => items.first()?.as_str(),
            Value::String(s) => Some(s.as_str()),
            _ => None,
        })
        .map(str::to_string)
}
