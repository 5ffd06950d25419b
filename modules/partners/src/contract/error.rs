use std::collections::BTreeMap;
use std::fmt;

use page_core::PageError;
use thiserror::Error;

/// Field-keyed validation messages.
///
/// Keys are field names (`inn`) for forms and paths (`data[2].inn`,
/// `metaData.itemsCount`) for decoded server payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields with at least one message.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// First message for `field`, the one a form shows inline.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(|m| m.first()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Errors returned by the partners API.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PartnersError {
    /// The request did not produce a usable response. `status` is set when
    /// the server answered with a non-success code.
    #[error("request failed{}: {message}", status_suffix(.status))]
    Transport { status: Option<u16>, message: String },

    /// The server answered, but the payload does not match the schema.
    #[error("invalid server data: {errors}")]
    Decode { errors: ValidationErrors },

    /// The server refused the record; `message` is meant for the user as-is.
    #[error("{message}")]
    Rejected { message: String },

    /// The record failed client-side validation and was not sent.
    #[error("invalid partner: {errors}")]
    Invalid { errors: ValidationErrors },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|s| format!(" with HTTP {}", s))
        .unwrap_or_default()
}

impl PartnersError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    pub fn decode(errors: ValidationErrors) -> Self {
        Self::Decode { errors }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    pub fn invalid(errors: ValidationErrors) -> Self {
        Self::Invalid { errors }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// HTTP status of a transport failure, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<PageError> for PartnersError {
    fn from(e: PageError) -> Self {
        Self::invalid_request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_collect_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("inn", "ИНН должен содержать 10 цифр");
        errors.add("inn", "second");
        errors.add("name", "Обязательное поле");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.first("inn"), Some("ИНН должен содержать 10 цифр"));
        assert_eq!(errors.get("inn").map(<[String]>::len), Some(2));
        assert!(!errors.contains("kpp"));
        assert_eq!(
            errors.to_string(),
            "inn: ИНН должен содержать 10 цифр; inn: second; name: Обязательное поле"
        );
    }

    #[test]
    fn into_result_only_fails_when_non_empty() {
        assert_eq!(ValidationErrors::new().into_result(5), Ok(5));
        assert!(ValidationErrors::single("x", "bad").into_result(5).is_err());
    }

    #[test]
    fn rejected_displays_bare_message() {
        assert_eq!(PartnersError::rejected("ИНН занят").to_string(), "ИНН занят");
    }

    #[test]
    fn transport_display_includes_status_when_known() {
        assert_eq!(
            PartnersError::transport(Some(404), "Not Found").to_string(),
            "request failed with HTTP 404: Not Found"
        );
        assert_eq!(
            PartnersError::transport(None, "connection refused").to_string(),
            "request failed: connection refused"
        );
        assert_eq!(PartnersError::transport(Some(500), "x").status(), Some(500));
    }

    #[test]
    fn page_errors_become_invalid_request() {
        let e: PartnersError = PageError::InvalidPageSize.into();
        assert!(matches!(e, PartnersError::InvalidRequest { .. }));
    }
}
