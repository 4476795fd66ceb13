//! Parsed web addresses and query strings.

use std::fmt;

use url::form_urlencoded;
use url::Url;

use crate::ShimError;

/// An absolute `http:` or `https:` address with the browser accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebUrl {
    inner: Url,
}

impl WebUrl {
    /// Parse `input`, resolving it against `base` when given.
    ///
    /// # Errors
    ///
    /// Fails with a validation error when the result does not parse or is
    /// not an `http:`/`https:` address.
    pub fn new(input: &str, base: Option<&str>) -> Result<Self, ShimError> {
        let invalid = |e: &dyn fmt::Display| {
            ShimError::validation(format!("Invalid URL: {}: {}", input, e))
        };
        let inner = match base {
            Some(base) => Url::parse(base)
                .and_then(|base| base.join(input))
                .map_err(|e| invalid(&e))?,
            None => Url::parse(input).map_err(|e| invalid(&e))?,
        };
        if !matches!(inner.scheme(), "http" | "https") {
            return Err(invalid(&"unsupported scheme"));
        }
        Ok(Self { inner })
    }

    pub fn href(&self) -> &str {
        self.inner.as_str()
    }

    /// Scheme with its trailing colon, e.g. `"https:"`.
    pub fn protocol(&self) -> String {
        format!("{}:", self.inner.scheme())
    }

    /// Hostname plus `:port` when the port is not the scheme default.
    pub fn host(&self) -> String {
        match self.inner.port() {
            Some(port) => format!("{}:{}", self.hostname(), port),
            None => self.hostname().to_string(),
        }
    }

    pub fn hostname(&self) -> &str {
        self.inner.host_str().unwrap_or_default()
    }

    /// Explicit non-default port, or empty.
    pub fn port(&self) -> String {
        self.inner.port().map(|p| p.to_string()).unwrap_or_default()
    }

    pub fn pathname(&self) -> &str {
        self.inner.path()
    }

    /// Query with a leading `?`, or empty.
    pub fn search(&self) -> String {
        match self.inner.query() {
            Some(query) if !query.is_empty() => format!("?{}", query),
            _ => String::new(),
        }
    }

    /// Fragment with a leading `#`, or empty.
    pub fn hash(&self) -> String {
        match self.inner.fragment() {
            Some(fragment) if !fragment.is_empty() => format!("#{}", fragment),
            _ => String::new(),
        }
    }

    pub fn origin(&self) -> String {
        format!("{}//{}", self.protocol(), self.host())
    }

    /// A copy of the decoded query.
    pub fn search_params(&self) -> SearchParams {
        SearchParams::parse(self.inner.query().unwrap_or_default())
    }

    pub fn as_url(&self) -> &Url {
        &self.inner
    }
}

impl fmt::Display for WebUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.href())
    }
}

/// Ordered, multi-valued query parameters.
///
/// Parsing percent-decodes and turns `+` into a space; `Display` encodes
/// the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pairs: Vec<(String, String)>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a query string; one leading `?` is ignored.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self {
            pairs: form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.pairs.iter().any(|(n, _)| n == name)
    }

    /// Remove every value for `name`.
    pub fn delete(&mut self, name: &str) {
        self.pairs.retain(|(n, _)| n != name);
    }
}

impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.pairs)
            .finish();
        f.write_str(&encoded)
    }
}
