//! Per-request publish target

/// Carrier of the published header list and cookie for one in-flight request.
///
/// Each request owns one handle. The header list is a private copy because
/// the transport takes exclusive ownership of whatever list it is given, so
/// distinct handles must never share storage. The cookie is a plain value
/// the transport copies internally.
#[derive(Debug, Default)]
pub struct RequestHandle {
    headers: Vec<String>,
    cookie: Option<String>,
}

impl RequestHandle {
    /// Create an empty handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Published header lines, in script output order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Published cookie value, if any
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    /// Hand the header list over to the transport, leaving the handle empty
    pub fn take_headers(&mut self) -> Vec<String> {
        std::mem::take(&mut self.headers)
    }

    /// Replace the private header copy. The old copy is dropped.
    pub(crate) fn set_headers(&mut self, headers: Vec<String>) {
        self.headers = headers;
    }

    pub(crate) fn set_cookie(&mut self, cookie: Option<String>) {
        self.cookie = cookie;
    }
}
