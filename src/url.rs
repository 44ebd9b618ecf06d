//! URL composition for API resources.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Default base path of the platform's REST APIs.
pub const DEFAULT_BASE_PATH: &str = "/api/now";

static PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/(?:[._a-zA-Z0-9-]/?)+[^/]$").expect("Invalid path regex pattern")
});

/// Checks that `path` looks like `/<component>[/<component>...]`.
pub fn validate_path(path: &str) -> Result<()> {
    if PATH_PATTERN.is_match(path) {
        Ok(())
    } else {
        Err(Error::InvalidUsage(format!(
            "path validation failed - expected: '/<component>[/component]', got: '{path}'"
        )))
    }
}

/// `https://<instance>.service-now.com`, or the given host.
pub fn get_base_url(use_ssl: bool, instance: Option<&str>, host: Option<&str>) -> Result<String> {
    let host = match (instance, host) {
        (Some(instance), _) => format!("{instance}.service-now.com")
            .trim_end_matches('/')
            .to_string(),
        (None, Some(host)) => host.to_string(),
        (None, None) => {
            return Err(Error::InvalidUsage(
                "you must supply either 'instance' or 'host'".to_string(),
            ));
        }
    };
    let scheme = if use_ssl { "https" } else { "http" };
    Ok(format!("{scheme}://{host}"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlBuilder {
    base_url: String,
    base_path: String,
    api_path: String,
}

impl UrlBuilder {
    pub fn new(
        base_url: impl Into<String>,
        base_path: impl Into<String>,
        api_path: impl Into<String>,
    ) -> Self {
        UrlBuilder {
            base_url: base_url.into(),
            base_path: base_path.into(),
            api_path: api_path.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_path(&self) -> &str {
        &self.api_path
    }

    /// Base path joined with the API path, e.g. `/api/now/table/incident`.
    pub fn full_path(&self) -> String {
        format!("{}{}", self.base_path, self.api_path)
    }

    /// The same base URL and base path with another API path.
    pub fn with_api_path(&self, api_path: impl Into<String>) -> Self {
        UrlBuilder {
            base_url: self.base_url.clone(),
            base_path: self.base_path.clone(),
            api_path: api_path.into(),
        }
    }

    pub fn get_url(&self) -> String {
        format!("{}{}", self.base_url, self.full_path())
    }

    /// The resource URL with a validated path component appended.
    pub fn get_appended_custom(&self, path_component: &str) -> Result<String> {
        validate_path(path_component)?;
        Ok(format!("{}{path_component}", self.get_url()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_validation() {
        assert!(validate_path("/table/incident").is_ok());
        assert!(validate_path("/api/now").is_ok());
        assert!(validate_path("table/incident").is_err());
        assert!(validate_path("/table/incident/").is_err());
        assert!(validate_path("/table//incident").is_err());
    }

    #[test]
    fn base_url_from_instance_or_host() {
        assert_eq!(
            get_base_url(true, Some("dev1"), None).unwrap(),
            "https://dev1.service-now.com"
        );
        assert_eq!(
            get_base_url(false, None, Some("snow.example.org")).unwrap(),
            "http://snow.example.org"
        );
        assert!(get_base_url(true, None, None).is_err());
    }

    #[test]
    fn appended_custom() {
        let url = UrlBuilder::new("https://dev1.service-now.com", "/api/now", "/attachment");
        assert_eq!(
            url.get_appended_custom("/file").unwrap(),
            "https://dev1.service-now.com/api/now/attachment/file"
        );
        assert!(url.get_appended_custom("file").is_err());
    }
}
