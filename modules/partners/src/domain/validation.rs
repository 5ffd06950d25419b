//! Client-side rules for partner records.
//!
//! The INN/KPP rules depend on the legal-entity flag:
//! organizations need a 10-digit INN and a 9-digit KPP, individuals a 12-digit
//! INN and either no KPP or a 9-digit one.

use crate::contract::error::ValidationErrors;
use crate::contract::model::{
    NewPartner, Partner, PartnerForm, TaxIdentity, INDIVIDUAL_INN_LEN, KPP_LEN,
    ORGANIZATION_INN_LEN,
};

pub const MSG_REQUIRED: &str = "Обязательное поле";
pub const MSG_GROUP_REQUIRED: &str = "Выберите группу";
pub const MSG_GROUP_UNKNOWN: &str = "Неизвестная группа";
pub const MSG_INN_ORGANIZATION_LEN: &str = "ИНН должен содержать 10 цифр";
pub const MSG_INN_INDIVIDUAL_LEN: &str = "ИНН должен содержать 12 цифр";
pub const MSG_INN_TOO_LONG: &str = "Слишком длинный ИНН";
pub const MSG_INN_DIGITS: &str = "ИНН должен содержать только цифры";
pub const MSG_KPP_LEN: &str = "КПП должен содержать 9 цифр";
pub const MSG_KPP_TOO_LONG: &str = "Слишком длинный КПП";
pub const MSG_KPP_DIGITS: &str = "КПП должен содержать только цифры";

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

fn check_digits(
    value: &str,
    expected: usize,
    not_digits: &'static str,
    too_short: &'static str,
    too_long: &'static str,
) -> Result<(), &'static str> {
    if !all_digits(value) {
        return Err(not_digits);
    }
    match value.len() {
        n if n < expected => Err(too_short),
        n if n > expected => Err(too_long),
        _ => Ok(()),
    }
}

/// INN rule for the given legal-entity flag.
pub fn check_inn(inn: &str, has_legal_entity: bool) -> Result<(), &'static str> {
    if has_legal_entity {
        check_digits(
            inn,
            ORGANIZATION_INN_LEN,
            MSG_INN_DIGITS,
            MSG_INN_ORGANIZATION_LEN,
            MSG_INN_TOO_LONG,
        )
    } else {
        check_digits(
            inn,
            INDIVIDUAL_INN_LEN,
            MSG_INN_DIGITS,
            MSG_INN_INDIVIDUAL_LEN,
            MSG_INN_TOO_LONG,
        )
    }
}

/// KPP rule: required for organizations, optional for individuals.
pub fn check_kpp(kpp: &str, has_legal_entity: bool) -> Result<(), &'static str> {
    if !has_legal_entity && kpp.is_empty() {
        return Ok(());
    }
    check_digits(kpp, KPP_LEN, MSG_KPP_DIGITS, MSG_KPP_LEN, MSG_KPP_TOO_LONG)
}

/// Check `inn`/`kpp` under the flag and build the tagged identity.
/// Messages go under `<prefix>inn` / `<prefix>kpp`.
pub(crate) fn tax_identity(
    inn: &str,
    kpp: &str,
    has_legal_entity: bool,
    prefix: &str,
    errors: &mut ValidationErrors,
) -> Option<TaxIdentity> {
    let inn_ok = check_inn(inn, has_legal_entity)
        .map_err(|m| errors.add(format!("{prefix}inn"), m))
        .is_ok();
    let kpp_ok = check_kpp(kpp, has_legal_entity)
        .map_err(|m| errors.add(format!("{prefix}kpp"), m))
        .is_ok();
    if !(inn_ok && kpp_ok) {
        return None;
    }

    Some(if has_legal_entity {
        TaxIdentity::Organization {
            inn: inn.to_string(),
            kpp: kpp.to_string(),
        }
    } else {
        TaxIdentity::Individual {
            inn: inn.to_string(),
            kpp: (!kpp.is_empty()).then(|| kpp.to_string()),
        }
    })
}

/// Validate form input. Every failing field is reported.
///
/// `groups` is the allowed label set; an empty slice accepts any non-empty group.
pub fn validate_form(form: &PartnerForm, groups: &[String]) -> Result<NewPartner, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = form.name.trim();
    if name.is_empty() {
        errors.add("name", MSG_REQUIRED);
    }

    let group = form.group.trim();
    if group.is_empty() {
        errors.add("group", MSG_GROUP_REQUIRED);
    } else if !groups.is_empty() && !groups.iter().any(|g| g == group) {
        errors.add("group", MSG_GROUP_UNKNOWN);
    }

    let tax = tax_identity(
        form.inn.trim(),
        form.kpp.trim(),
        form.has_legal_entity,
        "",
        &mut errors,
    );

    let description = form
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    match tax {
        Some(tax) if errors.is_empty() => Ok(NewPartner {
            name: name.to_string(),
            group: group.to_string(),
            description,
            tax,
        }),
        _ => Err(errors),
    }
}

fn check_record(name: &str, tax: &TaxIdentity) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if name.trim().is_empty() {
        errors.add("name", MSG_REQUIRED);
    }
    let (inn, kpp) = (tax.inn(), tax.kpp().unwrap_or_default());
    tax_identity(inn, kpp, tax.has_legal_entity(), "", &mut errors);
    errors.into_result(())
}

/// Schema check for a typed creation payload (group labels are not checked).
pub fn validate_new_partner(p: &NewPartner) -> Result<(), ValidationErrors> {
    check_record(&p.name, &p.tax)
}

/// Schema check for a typed full record (group labels are not checked).
pub fn validate_partner(p: &Partner) -> Result<(), ValidationErrors> {
    check_record(&p.name, &p.tax)
}
