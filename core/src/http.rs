//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. The request builder produces
//! `HttpRequest` values and the data-transfer service consumes `HttpResponse`
//! values; the bytes on the wire are moved by a `Transport` implementation
//! supplied by the host. Owned fields (`String`, `Vec`) keep the values free
//! of lifetimes so they can cross task and FFI boundaries.

use std::fmt;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered header list. Keys compare case-sensitively, as they are given.
pub type Headers = Vec<(String, String)>;

/// A fully composed wire request.
///
/// Produced by `builder::build_request` and never mutated afterwards. `url`
/// is absolute and already carries its query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// First value recorded for `name`, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// Constructed by the transport after executing an `HttpRequest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Overlay `overrides` onto `base`. Header names compare case-insensitively;
/// a matching entry keeps its original name and takes the new value, new
/// keys are appended in the order given.
pub(crate) fn merge_headers(base: &[(String, String)], overrides: &[(String, String)]) -> Headers {
    let mut merged: Headers = base.to_vec();
    for (key, value) in overrides {
        match merged.iter_mut().find(|(existing, _)| existing.eq_ignore_ascii_case(key)) {
            Some(slot) => slot.1 = value.clone(),
            None => merged.push((key.clone(), value.clone())),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn method_renders_uppercase_verb() {
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert_eq!(HttpMethod::Get.as_str(), "GET");
    }

    #[test]
    fn merge_overrides_keep_base_position() {
        let base = vec![pair("X-Key", "base"), pair("Accept", "application/json")];
        let overrides = vec![pair("X-Key", "override"), pair("X-Extra", "1")];
        let merged = merge_headers(&base, &overrides);
        assert_eq!(
            merged,
            vec![
                pair("X-Key", "override"),
                pair("Accept", "application/json"),
                pair("X-Extra", "1"),
            ]
        );
    }

    #[test]
    fn merge_matches_names_ignoring_case() {
        let base = vec![pair("Accept", "application/json")];
        let merged = merge_headers(&base, &[pair("accept", "text/csv")]);
        assert_eq!(merged, vec![pair("Accept", "text/csv")]);
    }

    #[test]
    fn success_range_is_2xx() {
        let mut response = HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: Vec::new(),
        };
        assert!(response.is_success());
        response.status = 304;
        assert!(!response.is_success());
    }
}
