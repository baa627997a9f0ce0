//! Token Resolver
//!
//! Substitutes `${token}` placeholders in a template using a lookup function.
//! Unlike shell-style expansion, a token the lookup does not know is never
//! replaced with an empty string: the scan continues and every unknown token
//! is reported together in a single [`Error::MissingTokens`].

use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};

const OPEN: &str = "${";
const CLOSE: char = '}';

// =============================================================================
// Parameter Set
// =============================================================================

/// Token values available to one resolution call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    values: BTreeMap<String, String>,
}

impl ParameterSet {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a token value
    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(token.into(), value.into());
        self
    }

    /// Look up a token
    pub fn get(&self, token: &str) -> Option<&str> {
        self.values.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Resolve `template` against this set
    pub fn resolve(&self, template: &str) -> Result<String> {
        resolve(template, |token| self.get(token))
    }
}

impl From<BTreeMap<String, String>> for ParameterSet {
    fn from(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Replace every `${token}` in `template` with `lookup(token)`.
///
/// Only well-formed placeholders with a non-empty name are substituted; a
/// lone `$`, an empty `${}` and an unterminated `${` are copied through
/// literally. Fails with every token for which `lookup` returned `None`.
pub fn resolve<'a, F>(template: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut resolved = String::with_capacity(template.len());
    let mut missing = BTreeSet::new();
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        resolved.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];

        match after_open.find(CLOSE) {
            Some(end) if end > 0 => {
                let token = &after_open[..end];
                match lookup(token) {
                    Some(value) => resolved.push_str(value),
                    None => {
                        missing.insert(token);
                    }
                }
                rest = &after_open[end + 1..];
            }
            Some(_) => {
                resolved.push_str(OPEN);
                rest = after_open;
            }
            None => {
                resolved.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    resolved.push_str(rest);

    if !missing.is_empty() {
        return Err(Error::missing_tokens(missing));
    }
    Ok(resolved)
}
