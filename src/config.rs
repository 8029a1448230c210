//! Configuration management for the planets CLI.
//!
//! All connection parameters come from environment variables, optionally
//! seeded from a `.env` file. Values are validated where they are used, not
//! at startup: `info` never needs the sample data file, so it never checks it.
//!
//! The `.env` lookup order is:
//! 1. `./.env` in the working directory
//! 2. `.env` in the local data directory (`~/.local/share/planets/.env` on Linux)
//!
//! Variables already present in the environment always win.

use std::{env, path::PathBuf, time::Duration};

use reqwest::Url;

use crate::{error::ConfigError, http::RetryPolicy};

pub const VAR_BASE_URL: &str = "CMS_DEMO_BASE_URL";
pub const VAR_TENANT_ID: &str = "CMS_DEMO_TENANT_ID";
pub const VAR_CONF_CLIENT_ID: &str = "CMS_DEMO_CONF_CLIENT_ID";
pub const VAR_CLIENT_SECRET: &str = "CMS_DEMO_CLIENT_SECRET";
pub const VAR_SAMPLE_DATA_PATH: &str = "CMS_DEMO_SAMPLE_DATA_PATH";
pub const VAR_HTTP_TIMEOUT_SECS: &str = "CMS_DEMO_HTTP_TIMEOUT_SECS";
pub const VAR_HTTP_MAX_RETRIES: &str = "CMS_DEMO_HTTP_MAX_RETRIES";
pub const VAR_DELETE_CONCURRENCY: &str = "CMS_DEMO_DELETE_CONCURRENCY";
pub const VAR_DELETE_TIMEOUT_SECS: &str = "CMS_DEMO_DELETE_TIMEOUT_SECS";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DELETE_CONCURRENCY: usize = 8;
const DEFAULT_DELETE_TIMEOUT_SECS: u64 = 300;

// The shipped .env.example uses values like "replace-with-tenant-id".
const PLACEHOLDER_MARKER: &str = "replace";

/// Loads variables from the first `.env` file found.
///
/// A missing file is not an error since everything may come from the real
/// environment. Returns the path that was loaded, if any.
pub fn load_env() -> Result<Option<PathBuf>, ConfigError> {
    for path in env_file_candidates() {
        if !path.is_file() {
            continue;
        }

        dotenv::from_path(&path).map_err(|e| ConfigError::EnvFile {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        return Ok(Some(path));
    }

    Ok(None)
}

fn env_file_candidates() -> Vec<PathBuf> {
    let mut data_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    data_dir.push("planets/.env");
    vec![PathBuf::from(".env"), data_dir]
}

/// Timeout and retry behaviour of the HTTP helper.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

/// Limits applied to bulk deletes.
#[derive(Debug, Clone)]
pub struct DeleteSettings {
    /// Maximum number of deletes in flight.
    pub concurrency: usize,
    /// Deadline for the whole batch, measured from dispatch.
    pub timeout: Duration,
}

impl Default for DeleteSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_DELETE_CONCURRENCY,
            timeout: Duration::from_secs(DEFAULT_DELETE_TIMEOUT_SECS),
        }
    }
}

/// Everything needed to talk to the CMS.
#[derive(Debug, Clone)]
pub struct CmsConfig {
    /// Base url without a trailing slash.
    pub base_url: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub http: HttpSettings,
    pub delete: DeleteSettings,
}

impl CmsConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = base_url(&lookup)?;
        let tenant_id = credential(&lookup, VAR_TENANT_ID)?;
        let client_id = credential(&lookup, VAR_CONF_CLIENT_ID)?;
        let client_secret = credential(&lookup, VAR_CLIENT_SECRET)?;

        let mut http = HttpSettings::default();
        if let Some(secs) = optional_number::<u64, _>(&lookup, VAR_HTTP_TIMEOUT_SECS)? {
            http.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = optional_number::<u32, _>(&lookup, VAR_HTTP_MAX_RETRIES)? {
            http.retry.max_retries = retries;
        }

        let mut delete = DeleteSettings::default();
        if let Some(n) = optional_number::<usize, _>(&lookup, VAR_DELETE_CONCURRENCY)? {
            if n == 0 {
                return Err(ConfigError::InvalidNumber {
                    var: VAR_DELETE_CONCURRENCY,
                    value: n.to_string(),
                });
            }
            delete.concurrency = n;
        }
        if let Some(secs) = optional_number::<u64, _>(&lookup, VAR_DELETE_TIMEOUT_SECS)? {
            delete.timeout = Duration::from_secs(secs);
        }

        Ok(Self {
            base_url,
            tenant_id,
            client_id,
            client_secret,
            http,
            delete,
        })
    }

    /// The CMS host, e.g. `https://example.com/cms`.
    pub fn cms_host(&self) -> String {
        format!("{}/cms", self.base_url)
    }

    /// The tenant scoped OAuth2 token endpoint.
    pub fn auth_url(&self) -> String {
        format!("{}/tenants/{}/oauth2/token", self.base_url, self.tenant_id)
    }
}

/// Returns the path of the sample planet data, which must exist.
pub fn sample_data_path() -> Result<PathBuf, ConfigError> {
    sample_data_path_from(|key| env::var(key).ok())
}

pub fn sample_data_path_from<F>(lookup: F) -> Result<PathBuf, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let path = PathBuf::from(required(&lookup, VAR_SAMPLE_DATA_PATH)?);
    if !path.exists() {
        return Err(ConfigError::MissingFile {
            var: VAR_SAMPLE_DATA_PATH,
            path,
        });
    }
    Ok(path)
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::Missing { var }),
    }
}

fn credential<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = required(lookup, var)?;
    if value.contains(PLACEHOLDER_MARKER) {
        return Err(ConfigError::Placeholder { var });
    }
    Ok(value)
}

fn base_url<F>(lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = required(lookup, VAR_BASE_URL)?;
    let url = Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl {
        var: VAR_BASE_URL,
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl {
            var: VAR_BASE_URL,
            reason: format!("expected an absolute http(s) url, got '{raw}'"),
        });
    }

    if raw.contains(PLACEHOLDER_MARKER) {
        return Err(ConfigError::Placeholder { var: VAR_BASE_URL });
    }

    Ok(raw.trim_end_matches('/').to_string())
}

fn optional_number<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn complete() -> HashMap<String, String> {
        vars(&[
            (VAR_BASE_URL, "https://cms.example.com/"),
            (VAR_TENANT_ID, "tenant-1"),
            (VAR_CONF_CLIENT_ID, "client-1"),
            (VAR_CLIENT_SECRET, "s3cret"),
        ])
    }

    #[test]
    fn test_from_lookup_builds_urls() {
        let env = complete();
        let config = CmsConfig::from_lookup(|k| env.get(k).cloned()).unwrap();

        assert_eq!(config.base_url, "https://cms.example.com");
        assert_eq!(config.cms_host(), "https://cms.example.com/cms");
        assert_eq!(
            config.auth_url(),
            "https://cms.example.com/tenants/tenant-1/oauth2/token"
        );
        assert_eq!(config.delete.concurrency, DEFAULT_DELETE_CONCURRENCY);
        assert_eq!(config.http.retry.max_retries, RetryPolicy::default().max_retries);
    }

    #[test]
    fn test_missing_variable() {
        let mut env = complete();
        env.remove(VAR_CLIENT_SECRET);
        let err = CmsConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { var } if var == VAR_CLIENT_SECRET));

        // blank counts as missing
        env.insert(VAR_CLIENT_SECRET.to_string(), "  ".to_string());
        let err = CmsConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { .. }));
    }

    #[test]
    fn test_invalid_base_url() {
        for bad in ["not a url", "cms.example.com", "ftp://cms.example.com"] {
            let mut env = complete();
            env.insert(VAR_BASE_URL.to_string(), bad.to_string());
            let err = CmsConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidUrl { .. }),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_placeholder_credentials_are_rejected() {
        let mut env = complete();
        env.insert(
            VAR_TENANT_ID.to_string(),
            "replace-with-tenant-id".to_string(),
        );
        let err = CmsConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Placeholder { var } if var == VAR_TENANT_ID));

        let mut env = complete();
        env.insert(
            VAR_BASE_URL.to_string(),
            "https://replace-with-your-environment.example.com".to_string(),
        );
        let err = CmsConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Placeholder { var } if var == VAR_BASE_URL));
    }

    #[test]
    fn test_optional_tuning_values() {
        let mut env = complete();
        env.insert(VAR_HTTP_TIMEOUT_SECS.to_string(), "5".to_string());
        env.insert(VAR_HTTP_MAX_RETRIES.to_string(), "0".to_string());
        env.insert(VAR_DELETE_CONCURRENCY.to_string(), "2".to_string());
        env.insert(VAR_DELETE_TIMEOUT_SECS.to_string(), "12".to_string());

        let config = CmsConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.http.timeout, Duration::from_secs(5));
        assert_eq!(config.http.retry.max_retries, 0);
        assert_eq!(config.delete.concurrency, 2);
        assert_eq!(config.delete.timeout, Duration::from_secs(12));

        env.insert(VAR_DELETE_CONCURRENCY.to_string(), "0".to_string());
        assert!(matches!(
            CmsConfig::from_lookup(|k| env.get(k).cloned()),
            Err(ConfigError::InvalidNumber { .. })
        ));

        env.insert(VAR_DELETE_CONCURRENCY.to_string(), "many".to_string());
        assert!(matches!(
            CmsConfig::from_lookup(|k| env.get(k).cloned()),
            Err(ConfigError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_sample_data_path_must_exist() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let present = file.path().to_string_lossy().to_string();
        let path = sample_data_path_from(|k| {
            (k == VAR_SAMPLE_DATA_PATH).then(|| present.clone())
        })
        .unwrap();
        assert_eq!(path, file.path());

        let err = sample_data_path_from(|k| {
            (k == VAR_SAMPLE_DATA_PATH).then(|| "/definitely/not/here.json".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));

        let err = sample_data_path_from(|_| None).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { .. }));
    }
}
