use thiserror::Error;
use url::Url;

/// Connection settings for the remote record store.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    base_url: Url,
    api_key: String,
}

#[derive(Clone, Debug, Default)]
pub struct RemoteSettingsDraft {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RemoteSettingsError {
    #[error("invalid remote base URL")]
    InvalidBaseUrl,
}

impl RemoteSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft.
    ///
    /// Returns `Ok(None)` unless both the base URL and the API key are present:
    /// that is local-only mode.
    ///
    /// # Errors
    ///
    /// Returns `RemoteSettingsError::InvalidBaseUrl` if the URL is present but invalid.
    pub fn validate(self) -> Result<Option<RemoteSettings>, RemoteSettingsError> {
        let base_url = normalize_optional(self.base_url);
        let api_key = normalize_optional(self.api_key);

        let base_url = base_url
            .map(|raw| Url::parse(&raw).map_err(|_| RemoteSettingsError::InvalidBaseUrl))
            .transpose()?;

        if let Some(url) = base_url.as_ref() {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(RemoteSettingsError::InvalidBaseUrl);
            }
        }

        Ok(match (base_url, api_key) {
            (Some(base_url), Some(api_key)) => Some(RemoteSettings { base_url, api_key }),
            _ => None,
        })
    }

    /// True when only one of the two settings was provided.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        let url = normalize_optional(self.base_url.clone()).is_some();
        let key = normalize_optional(self.api_key.clone()).is_some();
        url != key
    }
}

impl RemoteSettings {
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Absolute endpoint for `path` relative to the base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl std::fmt::Debug for RemoteSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSettings")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"***")
            .finish()
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_fields_enable_remote() {
        let settings = RemoteSettingsDraft {
            base_url: Some("https://project.example.co/".into()),
            api_key: Some(" anon-key ".into()),
        }
        .validate()
        .unwrap()
        .unwrap();
        assert_eq!(settings.api_key(), "anon-key");
        assert_eq!(
            settings.endpoint("/rest/v1/progress"),
            "https://project.example.co/rest/v1/progress"
        );
    }

    #[test]
    fn missing_fields_mean_local_only() {
        assert!(RemoteSettingsDraft::new().validate().unwrap().is_none());
        let partial = RemoteSettingsDraft {
            base_url: Some("https://project.example.co".into()),
            api_key: Some("   ".into()),
        };
        assert!(partial.is_partial());
        assert!(partial.validate().unwrap().is_none());
    }

    #[test]
    fn invalid_url_is_rejected() {
        let draft = RemoteSettingsDraft {
            base_url: Some("not a url".into()),
            api_key: Some("key".into()),
        };
        assert_eq!(draft.validate(), Err(RemoteSettingsError::InvalidBaseUrl));
        let draft = RemoteSettingsDraft {
            base_url: Some("ftp://example.com".into()),
            api_key: Some("key".into()),
        };
        assert_eq!(draft.validate(), Err(RemoteSettingsError::InvalidBaseUrl));
    }
}
