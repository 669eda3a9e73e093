//! Request inputs consumed by matchers.
//!
//! # Responsibilities
//! - Abstract header, cookie and host lookup behind [`MatchRequest`]
//! - Split `host:port` values and strip IPv6 brackets
//!
//! # Design Decisions
//! - Header values are exposed as raw bytes; only a missing header is absent
//! - Hosts with bytes outside visible ASCII are decoded lossily, never dropped
//! - A host that fails to split is used as-is (treated as portless)

use std::borrow::Cow;

use axum::http::{header, Request};
use axum_extra::extract::cookie::Cookie;

/// The parts of a request a matcher may look at.
pub trait MatchRequest {
    /// Raw bytes of the first value of the named header.
    fn header(&self, name: &str) -> Option<&[u8]>;

    /// Value of the first cookie with the given name.
    fn cookie(&self, name: &str) -> Option<String>;

    /// Raw host value, possibly with a port or IPv6 brackets.
    fn host(&self) -> Cow<'_, str>;
}

impl<B> MatchRequest for Request<B> {
    fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers().get(name).map(|v| v.as_bytes())
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.headers()
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|c| c.name() == name)
            .map(|c| c.value_trimmed().to_string())
    }

    fn host(&self) -> Cow<'_, str> {
        match self.headers().get(header::HOST) {
            Some(value) => String::from_utf8_lossy(value.as_bytes()),
            None => Cow::Borrowed(self.uri().authority().map(|a| a.as_str()).unwrap_or("")),
        }
    }
}

/// Hostname portion of a `Host` value, without port or IPv6 brackets.
pub fn request_host(hostport: &str) -> &str {
    match split_host_port(hostport) {
        Some((host, _)) => host,
        None => {
            let host = hostport.strip_prefix('[').unwrap_or(hostport);
            host.strip_suffix(']').unwrap_or(host)
        }
    }
}

/// Split `host:port`, `[host]:port` into its parts.
///
/// Returns `None` when there is no port or the value is malformed.
pub fn split_host_port(hostport: &str) -> Option<(&str, &str)> {
    let colon = hostport.rfind(':')?;

    let (host, host_start, host_end) = if hostport.starts_with('[') {
        let close = hostport.find(']')?;
        // "]" must be immediately followed by the port separator.
        if close + 1 != colon {
            return None;
        }
        (&hostport[1..close], 1, close + 1)
    } else {
        let host = &hostport[..colon];
        if host.contains(':') {
            return None;
        }
        (host, 0, 0)
    };

    if hostport[host_start..].contains('[') || hostport[host_end..].contains(']') {
        return None;
    }

    Some((host, &hostport[colon + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::HeaderValue;

    #[test]
    fn test_split_host_port() {
        assert_eq!(split_host_port("example.com:443"), Some(("example.com", "443")));
        assert_eq!(split_host_port("[::1]:8080"), Some(("::1", "8080")));
        assert_eq!(split_host_port("example.com:"), Some(("example.com", "")));
        assert_eq!(split_host_port("example.com"), None);
        assert_eq!(split_host_port("::1"), None);
        assert_eq!(split_host_port("[::1]"), None);
        assert_eq!(split_host_port("[::1]x:80"), None);
        assert_eq!(split_host_port("a]b:80"), None);
    }

    #[test]
    fn test_request_host() {
        assert_eq!(request_host("example.com:443"), "example.com");
        assert_eq!(request_host("example.com"), "example.com");
        assert_eq!(request_host("[::1]:8080"), "::1");
        assert_eq!(request_host("[::1]"), "::1");
        assert_eq!(request_host("::1"), "::1");
        // Malformed values fall back to the raw string.
        assert_eq!(request_host("[a]b:80"), "a]b:80");
        assert_eq!(request_host(""), "");
    }

    #[test]
    fn test_header_and_cookie_lookup() {
        let req = Request::builder()
            .header("token", "abc123")
            .header("Cookie", "session=1; token=\"fromcookie\"")
            .header("Cookie", "token=second")
            .body(Body::empty())
            .unwrap();
        assert_eq!(req.header("token"), Some(&b"abc123"[..]));
        assert_eq!(req.header("missing"), None);
        assert_eq!(req.cookie("token"), Some("fromcookie".to_string()));
        assert_eq!(req.cookie("session"), Some("1".to_string()));
        assert_eq!(req.cookie("other"), None);
    }

    #[test]
    fn test_host_falls_back_to_authority() {
        let req = Request::builder()
            .uri("http://example.com:8080/path")
            .body(Body::empty())
            .unwrap();
        assert_eq!(MatchRequest::host(&req), "example.com:8080");

        let req = Request::builder()
            .uri("http://ignored.com/")
            .header("Host", "example.com")
            .body(Body::empty())
            .unwrap();
        assert_eq!(MatchRequest::host(&req), "example.com");

        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(MatchRequest::host(&req), "");
    }

    #[test]
    fn test_non_ascii_values_are_present() {
        let mut req = Request::builder().body(Body::empty()).unwrap();
        req.headers_mut()
            .insert("token", HeaderValue::from_bytes("abc✓".as_bytes()).unwrap());
        req.headers_mut()
            .insert(header::HOST, HeaderValue::from_bytes(b"caf\xe9.example:80").unwrap());
        assert_eq!(req.header("token"), Some("abc✓".as_bytes()));
        assert_eq!(MatchRequest::host(&req), "caf\u{fffd}.example:80");
    }
}
