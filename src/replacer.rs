//! Placeholder resolution for host patterns.
//!
//! Patterns may embed `{name}` placeholders that are resolved against
//! request-scoped variables right before comparison. Unknown placeholders
//! resolve to the empty string; `\{` and `\}` produce literal braces.
//! Header names in `{http.request.header.<name>}` are case-insensitive.

use std::borrow::Cow;
use std::collections::HashMap;

use axum::http::Request;

use crate::matcher::request::{request_host, MatchRequest};

const HEADER_PREFIX: &str = "http.request.header.";

/// Resolves placeholders in a pattern.
pub trait Replacer: Send + Sync {
    /// Replace every placeholder in `input`.
    fn replace_all<'a>(&self, input: &'a str) -> Cow<'a, str>;
}

/// A replacer backed by a flat variable map.
#[derive(Debug, Clone, Default)]
pub struct VarsReplacer {
    vars: HashMap<String, String>,
}

impl VarsReplacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the standard `http.request.*` variables from a request.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let mut repl = Self::new();
        let hostport = MatchRequest::host(req);
        repl.set("http.request.host", request_host(&hostport));
        repl.set("http.request.hostport", hostport);
        repl.set("http.request.method", req.method().as_str());
        repl.set("http.request.uri.path", req.uri().path());
        for (name, value) in req.headers() {
            let key = format!("{HEADER_PREFIX}{}", name.as_str());
            // First value wins for repeated headers.
            repl.vars
                .entry(key)
                .or_insert_with(|| String::from_utf8_lossy(value.as_bytes()).into_owned());
        }
        repl
    }

    /// Builder-style variant of [`VarsReplacer::set`].
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key: String = key.into();
        self.vars.insert(normalize_key(&key).into_owned(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(&*normalize_key(key)).map(String::as_str)
    }
}

/// Header names are stored lowercase, the way `http` spells them.
fn normalize_key(key: &str) -> Cow<'_, str> {
    match key.strip_prefix(HEADER_PREFIX) {
        Some(name) if name.bytes().any(|b| b.is_ascii_uppercase()) => {
            Cow::Owned(format!("{HEADER_PREFIX}{}", name.to_ascii_lowercase()))
        }
        _ => Cow::Borrowed(key),
    }
}

impl Replacer for VarsReplacer {
    fn replace_all<'a>(&self, input: &'a str) -> Cow<'a, str> {
        if !input.contains(['{', '\\']) {
            return Cow::Borrowed(input);
        }

        let bytes = input.as_bytes();
        let mut out = String::with_capacity(input.len());
        let mut last = 0;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'\\' if matches!(bytes.get(i + 1), Some(b'{') | Some(b'}')) => {
                    out.push_str(&input[last..i]);
                    out.push(bytes[i + 1] as char);
                    i += 2;
                    last = i;
                }
                b'{' => {
                    // Unclosed placeholder: the remainder is literal.
                    let Some(len) = input[i + 1..].find('}') else {
                        break;
                    };
                    out.push_str(&input[last..i]);
                    if let Some(value) = self.get(&input[i + 1..i + 1 + len]) {
                        out.push_str(value);
                    }
                    i += len + 2;
                    last = i;
                }
                _ => i += 1,
            }
        }

        out.push_str(&input[last..]);
        Cow::Owned(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_plain_input_is_borrowed() {
        let repl = VarsReplacer::new();
        assert!(matches!(repl.replace_all("example.com"), Cow::Borrowed("example.com")));
    }

    #[test]
    fn test_known_and_unknown_placeholders() {
        let repl = VarsReplacer::new().with_var("tenant", "acme");
        assert_eq!(repl.replace_all("{tenant}.example.com"), "acme.example.com");
        assert_eq!(repl.replace_all("{missing}.example.com"), ".example.com");
        assert_eq!(repl.replace_all("{tenant}-{tenant}"), "acme-acme");
    }

    #[test]
    fn test_escaped_and_unclosed_braces() {
        let repl = VarsReplacer::new().with_var("a", "x");
        assert_eq!(repl.replace_all(r"\{a\}"), "{a}");
        assert_eq!(repl.replace_all("{a}.{open"), "x.{open");
        assert_eq!(repl.replace_all(r"back\slash"), r"back\slash");
    }

    #[test]
    fn test_from_request() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1")
            .header("Host", "Tenant.Example.com:8443")
            .header("X-Tenant", "acme")
            .body(Body::empty())
            .unwrap();
        let repl = VarsReplacer::from_request(&req);
        assert_eq!(repl.get("http.request.host"), Some("Tenant.Example.com"));
        assert_eq!(repl.get("http.request.hostport"), Some("Tenant.Example.com:8443"));
        assert_eq!(repl.get("http.request.method"), Some("POST"));
        assert_eq!(repl.get("http.request.uri.path"), Some("/api/v1"));
        assert_eq!(repl.get("http.request.header.x-tenant"), Some("acme"));
        assert_eq!(
            repl.replace_all("{http.request.header.x-tenant}.example.com"),
            "acme.example.com"
        );
    }

    #[test]
    fn test_header_placeholders_ignore_case() {
        let req = Request::builder()
            .header("X-Tenant", "acme")
            .body(Body::empty())
            .unwrap();
        let repl = VarsReplacer::from_request(&req);
        assert_eq!(repl.get("http.request.header.X-Tenant"), Some("acme"));
        assert_eq!(
            repl.replace_all("{http.request.header.X-TENANT}.example.com"),
            "acme.example.com"
        );

        let repl = VarsReplacer::new().with_var("http.request.header.X-Region", "eu");
        assert_eq!(repl.replace_all("{http.request.header.x-region}"), "eu");
        // Other variables stay case-sensitive.
        let repl = VarsReplacer::new().with_var("tenant", "acme");
        assert_eq!(repl.replace_all("{Tenant}"), "");
    }
}
