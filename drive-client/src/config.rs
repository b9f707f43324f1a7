//! Client configuration

/// Drive client configuration
///
/// | 环境变量 | 默认值 |
/// |----------|--------|
/// | DRIVE_API_URL | https://www.googleapis.com/drive/v3 |
/// | DRIVE_UPLOAD_URL | https://www.googleapis.com/upload/drive/v3 |
/// | DRIVE_USERINFO_URL | https://www.googleapis.com/oauth2/v3/userinfo |
/// | DRIVE_TIMEOUT_SECS | 30 |
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// Metadata API base URL
    pub api_url: String,
    /// Upload API base URL
    pub upload_url: String,
    /// OAuth user-info endpoint
    pub userinfo_url: String,
    /// Request timeout in seconds
    pub timeout: u64,
}

impl DriveConfig {
    pub const DEFAULT_API_URL: &'static str = "https://www.googleapis.com/drive/v3";
    pub const DEFAULT_UPLOAD_URL: &'static str = "https://www.googleapis.com/upload/drive/v3";
    pub const DEFAULT_USERINFO_URL: &'static str = "https://www.googleapis.com/oauth2/v3/userinfo";

    /// Load from environment variables, falling back to the public endpoints
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("DRIVE_API_URL").unwrap_or(defaults.api_url),
            upload_url: std::env::var("DRIVE_UPLOAD_URL").unwrap_or(defaults.upload_url),
            userinfo_url: std::env::var("DRIVE_USERINFO_URL").unwrap_or(defaults.userinfo_url),
            timeout: std::env::var("DRIVE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout),
        }
    }

    /// Point every endpoint at one base URL (local mock servers)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base = base_url.into();
        let base = base.trim_end_matches('/');
        Self {
            api_url: format!("{base}/drive/v3"),
            upload_url: format!("{base}/upload/drive/v3"),
            userinfo_url: format!("{base}/oauth2/v3/userinfo"),
            timeout: 30,
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_url: Self::DEFAULT_API_URL.to_string(),
            upload_url: Self::DEFAULT_UPLOAD_URL.to_string(),
            userinfo_url: Self::DEFAULT_USERINFO_URL.to_string(),
            timeout: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_base_url_trims_slash() {
        let config = DriveConfig::with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.api_url, "http://127.0.0.1:9000/drive/v3");
        assert_eq!(config.upload_url, "http://127.0.0.1:9000/upload/drive/v3");
        assert_eq!(config.userinfo_url, "http://127.0.0.1:9000/oauth2/v3/userinfo");
    }
}
