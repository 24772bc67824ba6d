//! Input shape checks.
//!
//! Deliberately simple: the rules are "looks like an address" and "looks
//! like a link", not RFC compliance.

/// `local@domain.tld`: exactly one `@`, no whitespace, domain has a dot
/// with text on both sides.
pub fn is_valid_email(s: &str) -> bool {
    let s = s.trim();
    if s.is_empty() || s.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = s.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// `http://…` or `https://…` with a non-empty remainder, scheme
/// case-insensitive.
pub fn is_valid_link(s: &str) -> bool {
    let s = s.trim();
    let lower = s.to_ascii_lowercase();
    for scheme in ["http://", "https://"] {
        if let Some(rest) = lower.strip_prefix(scheme) {
            return !rest.is_empty();
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("ads@brand.example"));
        assert!(is_valid_email("a.b@sub.domain.tld"));
        assert!(is_valid_email("  padded@brand.example  "));
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in [
            "",
            "no-at-sign",
            "two@@brand.example",
            "a@b@c.d",
            "@brand.example",
            "local@",
            "local@nodot",
            "local@.tld",
            "local@host.",
            "has space@brand.example",
        ] {
            assert!(!is_valid_email(bad), "accepted: {bad:?}");
        }
    }

    #[test]
    fn accepts_http_and_https_links() {
        assert!(is_valid_link("https://x.test/v"));
        assert!(is_valid_link("http://x.test"));
        assert!(is_valid_link("HTTPS://X.TEST/V"));
    }

    #[test]
    fn rejects_non_links() {
        for bad in ["", "x.test/v", "ftp://x.test", "https://", "http://"] {
            assert!(!is_valid_link(bad), "accepted: {bad:?}");
        }
    }
}
