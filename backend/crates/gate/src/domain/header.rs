//! Exempt request headers

use crate::error::{GateError, GateResult};
use axum::http::{HeaderMap, HeaderName};
use regex::{Regex, RegexBuilder};

/// Header name paired with a case-insensitive pattern
#[derive(Debug, Clone)]
pub struct HeaderRule {
    name: HeaderName,
    pattern: Regex,
}

impl HeaderRule {
    pub fn name(&self) -> &HeaderName {
        &self.name
    }

    /// Present, non-blank and matching anywhere in the value
    fn matches(&self, headers: &HeaderMap) -> bool {
        headers
            .get_all(&self.name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::trim)
            .any(|value| !value.is_empty() && self.pattern.is_match(value))
    }
}

/// Compiled header exemption rules
#[derive(Debug, Clone, Default)]
pub struct HeaderMatcher {
    rules: Vec<HeaderRule>,
}

impl HeaderMatcher {
    /// Compile `name -> pattern` rules
    ///
    /// An invalid header name or pattern is a configuration error.
    pub fn build<I, K, V>(raw_rules: I) -> GateResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let rules = raw_rules
            .into_iter()
            .map(|(name, pattern)| {
                let (name, pattern) = (name.as_ref().trim(), pattern.as_ref());
                let header = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                    GateError::Configuration(format!("invalid exempt header name {name:?}: {e}"))
                })?;
                let pattern = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        GateError::Configuration(format!(
                            "invalid pattern for exempt header {name:?}: {e}"
                        ))
                    })?;
                Ok(HeaderRule {
                    name: header,
                    pattern,
                })
            })
            .collect::<GateResult<Vec<_>>>()?;

        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[HeaderRule] {
        &self.rules
    }

    /// First matching rule wins
    pub fn matches(&self, headers: &HeaderMap) -> bool {
        self.rules.iter().any(|rule| rule.matches(headers))
    }
}
