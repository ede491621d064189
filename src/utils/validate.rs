use crate::utils::errors::{CertshipError, Result};
use regex::Regex;
use std::sync::LazyLock;

// Conservative patterns: lowercase DNS labels (leading wildcard label allowed)
// and a simple mailbox shape. Anything fancier is rejected up front, before
// any cache or network access happens.
const DOMAIN_PATTERN: &str =
    r"^(?:[*a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z0-9][a-z0-9-]{0,61}[a-z0-9]$";
const EMAIL_PATTERN: &str = r"^([a-zA-Z0-9_\-\.]+)@([a-zA-Z0-9_\-\.]+)\.([a-zA-Z]{2,5})$";

static DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DOMAIN_PATTERN).expect("domain pattern must compile"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern must compile"));

/// Validate a certificate subject domain (a leading `*.` label is allowed)
pub fn validate_domain(domain: &str) -> Result<()> {
    if !DOMAIN_RE.is_match(domain) {
        return Err(CertshipError::InvalidInput(format!(
            "domain value='{domain}' is not valid"
        )));
    }
    Ok(())
}

/// Validate the ACME account contact email
pub fn validate_email(email: &str) -> Result<()> {
    if !EMAIL_RE.is_match(email) {
        return Err(CertshipError::InvalidInput(format!(
            "email value='{email}' is not valid"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_domains() {
        for domain in ["example.com", "a.b.example.com", "*.example.com", "ab.co"] {
            assert!(validate_domain(domain).is_ok(), "expected valid: {domain}");
        }
    }

    #[test]
    fn test_invalid_domains() {
        for domain in [
            "",
            "not a domain",
            "-bad.com",
            "bad-.com",
            "example",
            "EXAMPLE.COM",
            ".example.com",
        ] {
            assert!(validate_domain(domain).is_err(), "expected invalid: {domain}");
        }
    }

    #[test]
    fn test_valid_emails() {
        for email in ["a@b.co", "first.last@example.com", "a_b-c@sub.domain.org"] {
            assert!(validate_email(email).is_ok(), "expected valid: {email}");
        }
    }

    #[test]
    fn test_invalid_emails() {
        for email in ["", "no-at-sign", "a@b", "a@b.", "@example.com", "a b@c.co"] {
            assert!(validate_email(email).is_err(), "expected invalid: {email}");
        }
    }
}
