//! Kubernetes name validation
//!
//! Resolved secret namespaces and names must be DNS-1123 subdomains.

use regex::Regex;
use std::sync::OnceLock;

/// Maximum length of a DNS-1123 subdomain
pub const DNS1123_SUBDOMAIN_MAX_LENGTH: usize = 253;

fn subdomain_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Literal pattern, known to compile.
    RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
            .unwrap()
    })
}

/// Check that `value` is a DNS-1123 subdomain: lowercase alphanumerics,
/// `-` and `.`, starting and ending with an alphanumeric, at most 253
/// characters. No trimming is applied.
pub fn is_dns1123_subdomain(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= DNS1123_SUBDOMAIN_MAX_LENGTH
        && subdomain_regex().is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_subdomains() {
        let max = "a".repeat(253);
        for name in [
            "my-secret.01",
            "a",
            "0",
            "ns1",
            "pv-foo-stage",
            "kube-system",
            max.as_str(),
        ] {
            assert!(is_dns1123_subdomain(name), "{name:?} should be valid");
        }
    }

    #[test]
    fn test_invalid_subdomains() {
        let too_long = "a".repeat(254);
        for name in [
            "",
            "My_Secret",
            "UPPER",
            "under_score",
            "-leading",
            "trailing-",
            ".leading",
            "trailing.",
            "double..dot",
            "dot.-hyphen",
            " padded ",
            "a/b",
            too_long.as_str(),
        ] {
            assert!(!is_dns1123_subdomain(name), "{name:?} should be invalid");
        }
    }
}
