/// URL prefix selecting the game's API surface.
pub const DEFAULT_PATH_PREFIX: &str = "/kcsapi";

/// Prefix the game prepends to every JSON response body.
pub const DEFAULT_DATA_PREFIX: &str = "svdata=";

/// Predicate deciding whether a URL belongs to the domain of interest, and
/// producing the normalized path used for event lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathFilter {
    prefix: String,
}

impl PathFilter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn matches(&self, url: &str) -> bool {
        url.contains(&self.prefix)
    }

    /// Everything after the prefix, with any query string dropped.
    /// `None` when the URL does not match the filter.
    pub fn strip(&self, url: &str) -> Option<String> {
        let start = url.find(&self.prefix)? + self.prefix.len();
        let rest = &url[start..];
        let rest = rest.split('?').next().unwrap_or(rest);
        Some(rest.to_string())
    }
}

/// Configuration for one tap instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapConfig {
    pub path_prefix: String,
    pub data_prefix: String,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            data_prefix: DEFAULT_DATA_PREFIX.to_string(),
        }
    }
}

impl TapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = prefix.into();
        self
    }

    pub fn data_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.data_prefix = prefix.into();
        self
    }

    pub fn filter(&self) -> PathFilter {
        PathFilter::new(self.path_prefix.clone())
    }
}
