use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com";
pub const DEFAULT_GRAPH_API_VERSION: &str = "v18.0";
pub const DEFAULT_MAX_PAGES: usize = 100;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Credentials and paths resolved from the environment.
///
/// The credential fields always fall back to placeholder values so the
/// server can start without a `.env`; upstream calls then fail with the
/// Graph API's own auth error.
#[derive(Debug, Clone)]
pub struct Config {
    pub page_access_token: String,
    pub page_id: String,
    /// Page whose linked Instagram business account is read. Falls back to `page_id`.
    pub instagram_page_id: Option<String>,
    pub ad_account_id: String,
    pub graph_api_base: String,
    pub graph_api_version: String,
    pub max_pages: usize,
    pub cache_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub refresh_cron: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let max_pages = match lookup("MAX_PAGES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|pages| *pages > 0)
                .ok_or(ConfigError::InvalidValue {
                    name: "MAX_PAGES",
                    value: raw,
                })?,
            None => DEFAULT_MAX_PAGES,
        };

        Ok(Self {
            page_access_token: or_default("PAGE_ACCESS_TOKEN", "your_default_token"),
            page_id: or_default("PAGE_ID", "your_default_page_id"),
            instagram_page_id: lookup("INSTAGRAM_PAGE_ID").filter(|id| !id.is_empty()),
            ad_account_id: or_default("AD_ACCOUNT_ID", "your_default_ad_account_id"),
            graph_api_base: or_default("GRAPH_API_BASE", DEFAULT_GRAPH_API_BASE),
            graph_api_version: or_default("GRAPH_API_VERSION", DEFAULT_GRAPH_API_VERSION),
            max_pages,
            cache_dir: PathBuf::from(or_default("CACHE_DIR", ".")),
            upload_dir: PathBuf::from(or_default("UPLOAD_DIR", "uploads")),
            refresh_cron: lookup("REFRESH_CRON").filter(|cron| !cron.trim().is_empty()),
        })
    }

    /// Graph API root including the version segment, without a trailing slash.
    pub fn graph_root(&self) -> String {
        format!(
            "{}/{}",
            self.graph_api_base.trim_end_matches('/'),
            self.graph_api_version.trim_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn falls_back_to_static_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.page_access_token, "your_default_token");
        assert_eq!(config.page_id, "your_default_page_id");
        assert_eq!(config.ad_account_id, "your_default_ad_account_id");
        assert_eq!(config.instagram_page_id, None);
        assert_eq!(config.max_pages, DEFAULT_MAX_PAGES);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.refresh_cron, None);
        assert_eq!(config.graph_root(), "https://graph.facebook.com/v18.0");
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PAGE_ACCESS_TOKEN", "tok"),
            ("AD_ACCOUNT_ID", "act_42"),
            ("GRAPH_API_BASE", "http://localhost:9000/"),
            ("GRAPH_API_VERSION", "v19.0"),
            ("MAX_PAGES", "7"),
            ("REFRESH_CRON", "0 0 * * * *"),
        ]))
        .unwrap();

        assert_eq!(config.page_access_token, "tok");
        assert_eq!(config.ad_account_id, "act_42");
        assert_eq!(config.max_pages, 7);
        assert_eq!(config.refresh_cron.as_deref(), Some("0 0 * * * *"));
        assert_eq!(config.graph_root(), "http://localhost:9000/v19.0");
    }

    #[test]
    fn rejects_zero_or_garbage_max_pages() {
        for raw in ["0", "many"] {
            let err = Config::from_lookup(lookup_from(&[("MAX_PAGES", raw)])).unwrap_err();
            assert_eq!(
                err,
                ConfigError::InvalidValue {
                    name: "MAX_PAGES",
                    value: raw.to_string()
                }
            );
        }
    }
}
