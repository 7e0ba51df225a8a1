/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// `top_k` used when the caller omits it and `/config` can't be fetched.
pub const DEFAULT_TOP_K: u32 = 10;

/// Builder for [`ApiConfig`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ApiConfigBuilder {
    base_url: Option<String>,
    fallback_top_k: Option<u32>,
}

impl ApiConfigBuilder {
    /// Creates a builder with all defaults.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend base URL, e.g. `http://localhost:8000`.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the `top_k` to fall back to when `/config` is unavailable.
    #[inline]
    pub fn with_fallback_top_k(mut self, top_k: u32) -> Self {
        self.fallback_top_k = Some(top_k);
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> ApiConfig {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        ApiConfig {
            base_url: base_url.trim_end_matches('/').to_owned(),
            fallback_top_k: self.fallback_top_k.unwrap_or(DEFAULT_TOP_K),
        }
    }
}

/// Configuration for [`crate::HttpBackend`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ApiConfig {
    pub(crate) base_url: String,
    pub(crate) fallback_top_k: u32,
}

impl ApiConfig {
    /// Returns the backend base URL, without a trailing slash.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the fallback `top_k`.
    #[inline]
    pub fn fallback_top_k(&self) -> u32 {
        self.fallback_top_k
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfigBuilder::new().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.base_url(), "http://localhost:8000");
        assert_eq!(config.fallback_top_k(), 10);
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = ApiConfigBuilder::new()
            .with_base_url("https://rag.example.com/api/")
            .with_fallback_top_k(3)
            .build();
        assert_eq!(config.base_url(), "https://rag.example.com/api");
        assert_eq!(config.fallback_top_k(), 3);
    }
}
