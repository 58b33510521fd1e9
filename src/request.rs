use crate::security::Credential;
use http::Method;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::debug;

/// Maximum inline parameters before heap allocation
pub const MAX_INLINE_PARAMS: usize = 8;

/// Maximum inline headers/cookies before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated `(name, value)` pairs for path and query parameters.
///
/// Query pairs keep their request order and duplicates, so a repeated key
/// (`?tag=a&tag=b`) can bind to a sequence field.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Stack-allocated header/cookie storage (lowercase header names)
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// The live request a schema is parsed from.
///
/// Routing is not this crate's concern: the caller supplies path parameters
/// (or a gin-style route pattern via [`SchemaRequest::route`]) along with the
/// query string, headers and raw body bytes.
#[derive(Debug, Clone)]
pub struct SchemaRequest {
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    pub path_params: ParamVec,
    pub query_params: ParamVec,
    pub headers: HeaderVec,
    pub cookies: HeaderVec,
    /// Raw body bytes; `None` or empty means no content
    pub body: Option<Vec<u8>>,
    /// Credentials accepted by the operation's security schemes
    pub credentials: Vec<Credential>,
}

impl SchemaRequest {
    /// Build a request from a method and a URI such as `/items?limit=5`.
    pub fn new(method: Method, uri: &str) -> Self {
        let path = uri.split('?').next().unwrap_or("/").to_string();
        let query_params = parse_query_params(uri);
        debug!(
            method = %method,
            path = %path,
            param_count = query_params.len(),
            "Query params parsed"
        );
        Self {
            method,
            path,
            path_params: ParamVec::new(),
            query_params,
            headers: HeaderVec::new(),
            cookies: HeaderVec::new(),
            body: None,
            credentials: Vec::new(),
        }
    }

    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    /// Bind path parameters by matching the request path against a gin-style
    /// pattern (`/items/:id`). Parameters are left untouched on mismatch.
    pub fn route(mut self, pattern: &str) -> Self {
        if let Some(params) = crate::path::match_path(pattern, &self.path) {
            self.path_params = params;
        }
        self
    }

    pub fn path_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.path_params.push((Arc::from(name), value.into()));
        self
    }

    /// Add a header. A `Cookie` header also refreshes the parsed cookies.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        if name == "cookie" {
            self.cookies.extend(parse_cookies(&value));
        }
        self.headers.push((Arc::from(name.as_str()), value));
        self
    }

    pub fn cookie(mut self, name: &str, value: impl Into<String>) -> Self {
        self.cookies.push((Arc::from(name), value.into()));
        self
    }

    pub fn body(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.body = Some(bytes.into());
        self
    }

    /// Set a JSON body and the matching content type.
    pub fn json_body(self, value: &serde_json::Value) -> Self {
        self.header("content-type", "application/json")
            .body(value.to_string())
    }

    /// Get a path parameter by name.
    ///
    /// Uses "last write wins" semantics when a name repeats.
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// First value of a query parameter.
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a repeatable query parameter, in request order.
    #[must_use]
    pub fn get_query_values(&self, name: &str) -> Vec<&str> {
        self.query_params
            .iter()
            .filter(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rfind(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Body bytes if the request carries any content.
    #[must_use]
    pub fn content(&self) -> Option<&[u8]> {
        self.body.as_deref().filter(|b| !b.is_empty())
    }

    /// First credential accepted for this request, if any.
    #[must_use]
    pub fn credential(&self) -> Option<&Credential> {
        self.credentials.first()
    }
}

/// Parse a `Cookie` header value into name/value pairs.
pub fn parse_cookies(header: &str) -> HeaderVec {
    header
        .split(';')
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let value = parts.next().unwrap_or("").trim().to_string();
            Some((Arc::from(name), value))
        })
        .collect()
}

/// Parse query string parameters from a URL path
///
/// Extracts everything after the `?` character and URL-decodes parameter
/// names and values. Repeated keys are all kept.
pub fn parse_query_params(path: &str) -> ParamVec {
    match path.split_once('?') {
        Some((_, query_str)) => url::form_urlencoded::parse(query_str.as_bytes())
            .map(|(k, v)| (Arc::from(k.as_ref()), v.to_string()))
            .collect(),
        None => ParamVec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookies() {
        let cookies = parse_cookies("a=b; c=d; ;e");
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies[0].1, "b");
        assert_eq!(cookies[2].0.as_ref(), "e");
        assert_eq!(cookies[2].1, "");
    }

    #[test]
    fn test_parse_query_params_keeps_repeats() {
        let q = parse_query_params("/p?x=1&tag=a&tag=b%20c");
        assert_eq!(q.len(), 3);
        let req = SchemaRequest::get("/p?x=1&tag=a&tag=b%20c");
        assert_eq!(req.get_query_param("x"), Some("1"));
        assert_eq!(req.get_query_values("tag"), vec!["a", "b c"]);
        assert_eq!(req.path, "/p");
    }

    #[test]
    fn test_route_binds_path_params() {
        let req = SchemaRequest::get("/items/42?verbose=true").route("/items/:id");
        assert_eq!(req.get_path_param("id"), Some("42"));
        assert_eq!(req.get_query_param("verbose"), Some("true"));
    }

    #[test]
    fn test_headers_are_case_insensitive_and_feed_cookies() {
        let req = SchemaRequest::get("/")
            .header("X-Api-Key", "k1")
            .header("Cookie", "session=abc");
        assert_eq!(req.get_header("x-api-key"), Some("k1"));
        assert_eq!(req.get_cookie("session"), Some("abc"));
    }

    #[test]
    fn test_empty_body_is_no_content() {
        let req = SchemaRequest::post("/").body(Vec::new());
        assert!(req.content().is_none());
    }
}
