use super::{Body, Cookies, HeaderSet};
use crate::base::Result;
use crate::rotation::Proxy;
use http::Method;
use std::time::Duration;
use url::Url;

/// Default per-request timeout forwarded to the engine.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// An outbound HTTP request.
///
/// Assembled by the client from its defaults plus per-call overrides; the
/// engine session id is stamped on at dispatch time.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderSet,
    cookies: Cookies,
    proxy: Option<Proxy>,
    timeout: Duration,
    body: Body,
    session_id: Option<String>,
}

impl Request {
    pub fn new(method: Method, url: &str) -> Result<Self> {
        Self::build(
            method,
            url,
            &[],
            HeaderSet::new(),
            Cookies::new(),
            None,
            DEFAULT_TIMEOUT,
            Body::default(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn build(
        method: Method,
        url: &str,
        params: &[(String, String)],
        headers: HeaderSet,
        cookies: Cookies,
        proxy: Option<Proxy>,
        timeout: Duration,
        body: Body,
    ) -> Result<Self> {
        let mut url = Url::parse(url.trim_start())?;
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Self::from_parts(method, url, headers, cookies, proxy, timeout, body)
    }

    /// Assemble from an already-parsed URL. Used directly by the redirect
    /// machine, which carries headers/cookies forward but drops proxy, body
    /// and per-call timeout, matching browser refetch behavior.
    pub(crate) fn from_parts(
        method: Method,
        url: Url,
        headers: HeaderSet,
        cookies: Cookies,
        proxy: Option<Proxy>,
        timeout: Duration,
        body: Body,
    ) -> Result<Self> {
        let mut headers = headers;
        if let Some(content_type) = body.content_type() {
            headers.set_default("content-type", &content_type)?;
        }
        if let Some(host) = url.host_str() {
            headers.set_default("host", host)?;
        }
        Ok(Self {
            method,
            url,
            headers,
            cookies,
            proxy,
            timeout,
            body,
            session_id: None,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderSet {
        &mut self.headers
    }

    pub fn cookies(&self) -> &Cookies {
        &self.cookies
    }

    pub fn cookies_mut(&mut self) -> &mut Cookies {
        &mut self.cookies
    }

    pub fn proxy(&self) -> Option<&Proxy> {
        self.proxy.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// The engine session this request was dispatched on, if any.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub(crate) fn set_session_id(&mut self, session_id: String) {
        self.session_id = Some(session_id);
    }
}
