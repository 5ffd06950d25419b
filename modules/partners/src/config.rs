use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for the partners module (`modules.partners` in the YAML).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PartnersConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Group labels offered by the editor.
    #[serde(default = "default_groups")]
    pub groups: Vec<String>,
}

impl Default for PartnersConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            default_page_size: default_page_size(),
            request_timeout_ms: default_request_timeout_ms(),
            groups: default_groups(),
        }
    }
}

impl PartnersConfig {
    /// `base_url` joined with `api_prefix`, e.g. `http://localhost:5004/api/v1`.
    pub fn api_base(&self) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| anyhow::anyhow!("invalid partners base_url '{}': {}", self.base_url, e))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("partners base_url cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(self.api_prefix.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }
}

fn default_base_url() -> String {
    "http://localhost:5004".to_string()
}

fn default_api_prefix() -> String {
    "api/v1".to_string()
}

fn default_page_size() -> u32 {
    page_core::DEFAULT_PAGE_SIZE
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_groups() -> Vec<String> {
    (1..=5).map(|i| format!("Группа {i}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_server() {
        let cfg = PartnersConfig::default();
        assert_eq!(cfg.api_base().unwrap().as_str(), "http://localhost:5004/api/v1");
        assert_eq!(cfg.groups.len(), 5);
        assert_eq!(cfg.groups[0], "Группа 1");
    }

    #[test]
    fn trailing_slashes_are_normalized() {
        let cfg = PartnersConfig {
            base_url: "http://example.test:8080/root/".into(),
            api_prefix: "/api/v2/".into(),
            ..Default::default()
        };
        assert_eq!(cfg.api_base().unwrap().as_str(), "http://example.test:8080/root/api/v2");
    }

    #[test]
    fn bad_base_url_is_an_error() {
        let cfg = PartnersConfig {
            base_url: "not a url".into(),
            ..Default::default()
        };
        assert!(cfg.api_base().is_err());

        let cfg = PartnersConfig {
            base_url: "mailto:ops@example.test".into(),
            ..Default::default()
        };
        assert!(cfg.api_base().is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let v = serde_json::json!({ "base_url": "http://x", "colour": "red" });
        assert!(serde_json::from_value::<PartnersConfig>(v).is_err());
    }
}
