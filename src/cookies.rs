//! Cookie reuse for Google Scholar requests.
//!
//! Scholar is far less likely to answer with a CAPTCHA when requests carry
//! the cookies of a browser session that already passed one. Cookies are read
//! from a JSON file in Playwright's export format; nothing here writes cookies
//! back from responses.

use crate::error::{ScholarError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default cookie file path: `~/.gscholar_cookies.json`
fn default_cookie_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(".gscholar_cookies.json"))
        .ok_or_else(|| ScholarError::Config("Cannot determine home directory".to_string()))
}

/// Cookie entry matching Playwright's cookie format
#[derive(Debug, Clone, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub expires: Option<f64>,
}

/// Reads the cookie file
pub struct CookieManager {
    path: PathBuf,
}

impl CookieManager {
    /// Cookie manager for the default path in the home directory
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: default_cookie_path()?,
        })
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load cookies from file
    ///
    /// Returns empty vec if file doesn't exist or is invalid
    pub fn load(&self) -> Vec<Cookie> {
        if !self.path.exists() {
            debug!(path = ?self.path, "Cookie file not found");
            return Vec::new();
        }

        match std::fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str::<Vec<Cookie>>(&content) {
                Ok(cookies) => {
                    debug!(count = cookies.len(), path = ?self.path, "Loaded cookies");
                    cookies
                }
                Err(e) => {
                    warn!(error = %e, path = ?self.path, "Failed to parse cookies");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(error = %e, path = ?self.path, "Failed to read cookie file");
                Vec::new()
            }
        }
    }

    /// `Cookie` header value for Google domains, `None` when there is nothing to send
    pub fn google_header(&self) -> Option<String> {
        let header = self
            .load()
            .iter()
            .filter(|c| c.domain.contains("google"))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            None
        } else {
            Some(header)
        }
    }
}

impl Default for CookieManager {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            path: PathBuf::from(".gscholar_cookies.json"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    const COOKIES: &str = r#"[
        {"name": "NID", "value": "NID-value", "domain": ".google.com", "path": "/", "secure": true},
        {"name": "GSP", "value": "GSP-value", "domain": "scholar.google.com"},
        {"name": "other", "value": "other-value", "domain": ".example.com"}
    ]"#;

    #[test]
    fn test_load_missing_file() {
        let manager = CookieManager::with_path(PathBuf::from("/nonexistent/path"));
        assert!(manager.load().is_empty());
        assert!(manager.google_header().is_none());
    }

    #[test]
    fn test_load_invalid_json() -> Result<()> {
        let temp = NamedTempFile::new()?;
        std::fs::write(temp.path(), "not json")?;
        let manager = CookieManager::with_path(temp.path().to_path_buf());
        assert!(manager.load().is_empty());
        Ok(())
    }

    #[test]
    fn test_header_keeps_google_cookies_only() -> Result<()> {
        let temp = NamedTempFile::new()?;
        std::fs::write(temp.path(), COOKIES)?;
        let manager = CookieManager::with_path(temp.path().to_path_buf());

        let cookies = manager.load();
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies[0].path, "/");
        assert!(cookies[0].secure);
        assert_eq!(cookies[1].path, "");
        assert_eq!(
            manager.google_header().as_deref(),
            Some("NID=NID-value; GSP=GSP-value")
        );
        Ok(())
    }
}
