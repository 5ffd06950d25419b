//! Decoding of server payloads into typed records.
//!
//! Payloads arrive as `serde_json::Value` and are checked field by field so a
//! mismatch is reported with its path instead of a single serde message.

use page_core::PageMeta;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::contract::error::ValidationErrors;
use crate::contract::model::{Partner, PartnersPage, INDIVIDUAL_INN_LEN, ORGANIZATION_INN_LEN};
use crate::domain::validation::tax_identity;

const MSG_OBJECT: &str = "expected an object";
const MSG_ARRAY: &str = "expected an array";
const MSG_STRING: &str = "expected a string";
const MSG_BOOL: &str = "expected a boolean";
const MSG_UUID: &str = "expected a UUID";
const MSG_UINT: &str = "expected a non-negative integer";
const MSG_REQUIRED: &str = "required";
const MSG_INN_KIND: &str = "ИНН должен содержать 10 или 12 цифр";

fn path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

fn req_str<'a>(
    obj: &'a Map<String, Value>,
    prefix: &str,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<&'a str> {
    match obj.get(field) {
        Some(Value::String(s)) => Some(s.as_str()),
        None | Some(Value::Null) => {
            errors.add(path(prefix, field), MSG_REQUIRED);
            None
        }
        Some(_) => {
            errors.add(path(prefix, field), MSG_STRING);
            None
        }
    }
}

fn opt_str(
    obj: &Map<String, Value>,
    prefix: &str,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.add(path(prefix, field), MSG_STRING);
            None
        }
    }
}

fn req_uint(
    obj: &Map<String, Value>,
    prefix: &str,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<u64> {
    match obj.get(field) {
        None | Some(Value::Null) => {
            errors.add(path(prefix, field), MSG_REQUIRED);
            None
        }
        Some(v) => v.as_u64().or_else(|| {
            errors.add(path(prefix, field), MSG_UINT);
            None
        }),
    }
}

fn req_u32(
    obj: &Map<String, Value>,
    prefix: &str,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<u32> {
    let n = req_uint(obj, prefix, field, errors)?;
    u32::try_from(n).ok().or_else(|| {
        errors.add(path(prefix, field), MSG_UINT);
        None
    })
}

/// Records from servers that predate the `hasLegalEntity` flag are classified
/// by INN length.
fn legal_entity_flag(
    obj: &Map<String, Value>,
    inn: &str,
    prefix: &str,
    errors: &mut ValidationErrors,
) -> Option<bool> {
    match obj.get("hasLegalEntity") {
        Some(Value::Bool(b)) => Some(*b),
        None | Some(Value::Null) => match inn.len() {
            ORGANIZATION_INN_LEN => Some(true),
            INDIVIDUAL_INN_LEN => Some(false),
            _ => {
                errors.add(path(prefix, "inn"), MSG_INN_KIND);
                None
            }
        },
        Some(_) => {
            errors.add(path(prefix, "hasLegalEntity"), MSG_BOOL);
            None
        }
    }
}

fn partner_at(value: &Value, prefix: &str, errors: &mut ValidationErrors) -> Option<Partner> {
    let Some(obj) = value.as_object() else {
        errors.add(if prefix.is_empty() { "$" } else { prefix }, MSG_OBJECT);
        return None;
    };

    let id = req_str(obj, prefix, "id", errors).and_then(|raw| {
        Uuid::parse_str(raw).ok().or_else(|| {
            errors.add(path(prefix, "id"), MSG_UUID);
            None
        })
    });
    let name = req_str(obj, prefix, "name", errors);
    let group = req_str(obj, prefix, "group", errors);
    let description = opt_str(obj, prefix, "description", errors);
    let inn = req_str(obj, prefix, "inn", errors);
    let kpp = req_str(obj, prefix, "kpp", errors);

    let tax = match (inn, kpp) {
        (Some(inn), Some(kpp)) => {
            let field_prefix = if prefix.is_empty() {
                String::new()
            } else {
                format!("{prefix}.")
            };
            legal_entity_flag(obj, inn, prefix, errors)
                .and_then(|flag| tax_identity(inn, kpp, flag, &field_prefix, errors))
        }
        _ => None,
    };

    Some(Partner {
        id: id?,
        name: name?.to_string(),
        group: group?.to_string(),
        description,
        tax: tax?,
    })
}

/// Decode a single partner record (create/update/delete responses).
pub fn decode_partner(value: &Value) -> Result<Partner, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let partner = partner_at(value, "", &mut errors);
    match partner {
        Some(p) if errors.is_empty() => Ok(p),
        _ => Err(errors),
    }
}

fn meta_at(value: Option<&Value>, errors: &mut ValidationErrors) -> Option<PageMeta> {
    const PREFIX: &str = "metaData";
    let obj = match value {
        Some(Value::Object(obj)) => obj,
        None | Some(Value::Null) => {
            errors.add(PREFIX, MSG_REQUIRED);
            return None;
        }
        Some(_) => {
            errors.add(PREFIX, MSG_OBJECT);
            return None;
        }
    };

    let items_count = req_uint(obj, PREFIX, "itemsCount", errors);
    let page_count = req_u32(obj, PREFIX, "pageCount", errors);
    let page_number = req_u32(obj, PREFIX, "pageNumber", errors);
    let page_size = req_u32(obj, PREFIX, "pageSize", errors);

    Some(PageMeta {
        items_count: items_count?,
        page_count: page_count?,
        page_number: page_number?,
        page_size: page_size?,
    })
}

/// Decode a list response: `{ data: Partner[], metaData: {...} }`.
///
/// Any invalid record or metadata field rejects the whole page.
pub fn decode_page(value: &Value) -> Result<PartnersPage, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let Some(obj) = value.as_object() else {
        return Err(ValidationErrors::single("$", MSG_OBJECT));
    };

    let data = match obj.get("data") {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| partner_at(item, &format!("data[{i}]"), &mut errors))
            .collect::<Vec<_>>(),
        None | Some(Value::Null) => {
            errors.add("data", MSG_REQUIRED);
            Vec::new()
        }
        Some(_) => {
            errors.add("data", MSG_ARRAY);
            Vec::new()
        }
    };
    let meta = meta_at(obj.get("metaData"), &mut errors);

    match meta {
        Some(meta) if errors.is_empty() => Ok(PartnersPage::new(data, meta)),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::TaxIdentity;
    use serde_json::json;

    fn record() -> Value {
        json!({
            "id": "5119b133-d375-4611-a2e9-535a8c826d50",
            "name": "ФИЛИАЛ \"ЦЕНТРАЛЬНЫЙ\" БАНКА ВТБ (ПАО)",
            "inn": "7702070139",
            "kpp": "770943002",
            "group": "Не распределен!",
            "description": null,
            "hasLegalEntity": true
        })
    }

    fn page(data: Value) -> Value {
        json!({
            "data": data,
            "metaData": { "itemsCount": 1, "pageCount": 1, "pageNumber": 1, "pageSize": 10 }
        })
    }

    #[test]
    fn decodes_a_valid_record() {
        let p = decode_partner(&record()).unwrap();
        assert_eq!(p.group, "Не распределен!");
        assert_eq!(p.description, None);
        assert_eq!(
            p.tax,
            TaxIdentity::Organization {
                inn: "7702070139".into(),
                kpp: "770943002".into()
            }
        );
    }

    #[test]
    fn missing_flag_is_inferred_from_inn_length() {
        let mut r = record();
        r.as_object_mut().unwrap().remove("hasLegalEntity");
        assert!(decode_partner(&r).unwrap().tax.has_legal_entity());

        r["inn"] = json!("500100732259");
        r["kpp"] = json!("");
        assert!(!decode_partner(&r).unwrap().tax.has_legal_entity());

        r["inn"] = json!("12345678901");
        let e = decode_partner(&r).unwrap_err();
        assert_eq!(e.first("inn"), Some(MSG_INN_KIND));
    }

    #[test]
    fn flag_contradicting_inn_is_rejected() {
        let mut r = record();
        r["hasLegalEntity"] = json!(false);
        let e = decode_partner(&r).unwrap_err();
        assert!(e.contains("inn"));
    }

    #[test]
    fn bad_id_and_types_are_reported_by_field() {
        let mut r = record();
        r["id"] = json!("not-a-uuid");
        r["name"] = json!(42);
        r["description"] = json!(["x"]);
        let e = decode_partner(&r).unwrap_err();
        assert_eq!(e.first("id"), Some(MSG_UUID));
        assert_eq!(e.first("name"), Some(MSG_STRING));
        assert_eq!(e.first("description"), Some(MSG_STRING));
    }

    #[test]
    fn page_decodes_with_metadata() {
        let p = decode_page(&page(json!([record()]))).unwrap();
        assert_eq!(p.len(), 1);
        assert_eq!(p.meta_data.items_count, 1);
        assert_eq!(p.meta_data.page_size, 10);
    }

    #[test]
    fn page_without_items_count_is_rejected() {
        let mut v = page(json!([record()]));
        v["metaData"].as_object_mut().unwrap().remove("itemsCount");
        let e = decode_page(&v).unwrap_err();
        assert_eq!(e.first("metaData.itemsCount"), Some(MSG_REQUIRED));
    }

    #[test]
    fn invalid_record_paths_are_indexed() {
        let mut bad = record();
        bad["kpp"] = json!("123");
        let e = decode_page(&page(json!([record(), bad]))).unwrap_err();
        assert_eq!(e.len(), 1);
        assert!(e.contains("data[1].kpp"));
    }

    #[test]
    fn non_object_payloads_are_rejected() {
        assert_eq!(decode_page(&json!([])).unwrap_err().first("$"), Some(MSG_OBJECT));
        let e = decode_page(&json!({ "data": {}, "metaData": 3 })).unwrap_err();
        assert_eq!(e.first("data"), Some(MSG_ARRAY));
        assert_eq!(e.first("metaData"), Some(MSG_OBJECT));
    }
}
