//! HTTP client facade with builder pattern.
//!
//! [`Client`] (thread-shareable, blocking) and [`AsyncClient`] (task-
//! shareable) drive the same core: merge defaults into a request, apply auth
//! and hooks, dispatch through the native engine, follow redirects, then run
//! response hooks and proxy feedback.
//!
//! # Example
//!
//! ```rust,ignore
//! use mimicnet::{Client, Protocol};
//!
//! let client = Client::builder()
//!     .tls_identifier("chrome_133")
//!     .protocol(Protocol::Auto)
//!     .build()?;
//!
//! let resp = client.get("https://example.com").send()?;
//! println!("{}", resp.status_code());
//! ```

use crate::auth::Auth;
use crate::base::{Error, Result};
use crate::engine::{CookiePair, CustomTlsProfile, Engine, EngineReply, EngineRequest, NativeEngine};
use crate::http::{Body, Cookies, Form, HeaderSet, Request, Response, DEFAULT_TIMEOUT};
use crate::rotation::{HeaderRotator, Proxy, ProxyRotator, TlsIdentifierRotator};
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use http::Method;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use url::Url;
use uuid::Uuid;

/// Completed redirect hops allowed before a chain is aborted.
pub const DEFAULT_MAX_REDIRECTS: usize = 9;

/// TLS identity used when neither an identifier nor a custom profile is set.
pub const DEFAULT_TLS_IDENTIFIER: &str = "chrome_133";

/// HTTP protocol negotiation mode forwarded to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    /// Negotiate per connection; cross-scheme redirects renegotiate on a
    /// fresh engine session.
    #[default]
    Auto,
    Http1,
    Http2,
}

impl From<bool> for Protocol {
    /// `true` pins HTTP/2, `false` pins HTTP/1; only [`Protocol::Auto`] may
    /// renegotiate across a redirect scheme switch.
    fn from(http2: bool) -> Self {
        if http2 {
            Protocol::Http2
        } else {
            Protocol::Http1
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientState {
    Unopened,
    Opened,
    Closed,
}

/// Default header set: a fixed [`HeaderSet`] or a rotator drawing a template
/// per request.
pub enum HeaderSource {
    Set(HeaderSet),
    Rotator(Arc<HeaderRotator>),
}

/// Outbound proxy: a fixed endpoint or a rotator selecting one per request.
pub enum ProxySource {
    Single(Proxy),
    Rotator(Arc<ProxyRotator>),
}

/// TLS identity: a fixed identifier or a rotator cycling the pool.
pub enum IdentifierSource {
    Single(String),
    Rotator(Arc<TlsIdentifierRotator>),
}

/// A hook run over each outbound request, in registration order.
pub type RequestHook = Arc<dyn Fn(&mut Request) -> Result<()> + Send + Sync>;

/// A hook run over each terminal response, in registration order. When any
/// response hook is registered the eager body read is skipped.
pub type ResponseHook = Arc<dyn Fn(&mut Response) -> Result<()> + Send + Sync>;

fn default_headers() -> HeaderSet {
    let mut headers = HeaderSet::new();
    let _ = headers.insert("accept", "*/*");
    let _ = headers.insert("connection", "keep-alive");
    let _ = headers.insert(
        "user-agent",
        concat!("mimicnet/", env!("CARGO_PKG_VERSION")),
    );
    let _ = headers.insert("accept-encoding", "gzip, deflate, br, zstd");
    headers
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct ClientCore {
    engine: Arc<dyn Engine>,
    session_id: Mutex<String>,
    state: Mutex<ClientState>,
    auth: Option<Auth>,
    params: Vec<(String, String)>,
    headers: HeaderSource,
    cookies: Cookies,
    proxy: Option<ProxySource>,
    timeout: Duration,
    follow_redirects: bool,
    max_redirects: usize,
    protocol: Protocol,
    verify: bool,
    identifier: IdentifierSource,
    custom_tls: Option<CustomTlsProfile>,
    request_hooks: Vec<RequestHook>,
    response_hooks: Vec<ResponseHook>,
    default_encoding: String,
}

#[derive(Default)]
struct RequestOptions {
    params: Vec<(String, String)>,
    headers: Option<HeaderSet>,
    cookies: Option<Cookies>,
    form: Option<Vec<(String, String)>>,
    multipart: Option<Form>,
    json: Option<serde_json::Value>,
    raw: Option<Bytes>,
    timeout: Option<Duration>,
    auth: Option<Auth>,
    follow_redirects: Option<bool>,
}

impl ClientCore {
    fn ensure_open(&self) -> Result<()> {
        let mut state = lock(&self.state);
        if *state == ClientState::Closed {
            return Err(Error::ClientClosed);
        }
        *state = ClientState::Opened;
        Ok(())
    }

    fn open(&self) -> Result<()> {
        let mut state = lock(&self.state);
        match *state {
            ClientState::Opened => Err(Error::AlreadyOpened),
            ClientState::Closed => Err(Error::ClientClosed),
            ClientState::Unopened => {
                *state = ClientState::Opened;
                Ok(())
            }
        }
    }

    fn close(&self) -> Result<()> {
        let mut state = lock(&self.state);
        if *state == ClientState::Closed {
            return Ok(());
        }
        let session_id = lock(&self.session_id).clone();
        self.engine.destroy_session(&session_id)?;
        *state = ClientState::Closed;
        Ok(())
    }

    fn effective_headers(&self, overrides: Option<HeaderSet>) -> Result<HeaderSet> {
        match overrides {
            Some(headers) => Ok(headers),
            None => match &self.headers {
                HeaderSource::Set(set) => {
                    let mut headers = set.clone();
                    for (name, value) in default_headers().to_pairs() {
                        headers.set_default(&name, &value)?;
                    }
                    Ok(headers)
                }
                HeaderSource::Rotator(rotator) => rotator.next(None),
            },
        }
    }

    async fn effective_headers_async(&self, overrides: Option<HeaderSet>) -> Result<HeaderSet> {
        match overrides {
            Some(headers) => Ok(headers),
            None => match &self.headers {
                HeaderSource::Set(set) => {
                    let mut headers = set.clone();
                    for (name, value) in default_headers().to_pairs() {
                        headers.set_default(&name, &value)?;
                    }
                    Ok(headers)
                }
                HeaderSource::Rotator(rotator) => rotator.anext(None).await,
            },
        }
    }

    fn effective_proxy(&self) -> Result<Option<Proxy>> {
        match &self.proxy {
            None => Ok(None),
            Some(ProxySource::Single(proxy)) => Ok(Some(proxy.clone())),
            Some(ProxySource::Rotator(rotator)) => Ok(Some(rotator.next()?)),
        }
    }

    async fn effective_proxy_async(&self) -> Result<Option<Proxy>> {
        match &self.proxy {
            None => Ok(None),
            Some(ProxySource::Single(proxy)) => Ok(Some(proxy.clone())),
            Some(ProxySource::Rotator(rotator)) => Ok(Some(rotator.anext().await?)),
        }
    }

    fn effective_identifier(&self) -> Result<Option<String>> {
        if self.custom_tls.is_some() {
            return Ok(None);
        }
        match &self.identifier {
            IdentifierSource::Single(identifier) => Ok(Some(identifier.clone())),
            IdentifierSource::Rotator(rotator) => Ok(Some(rotator.next()?)),
        }
    }

    async fn effective_identifier_async(&self) -> Result<Option<String>> {
        if self.custom_tls.is_some() {
            return Ok(None);
        }
        match &self.identifier {
            IdentifierSource::Single(identifier) => Ok(Some(identifier.clone())),
            IdentifierSource::Rotator(rotator) => Ok(Some(rotator.anext().await?)),
        }
    }

    /// Merge client defaults with per-call overrides into a request. The
    /// stored defaults are copied, never mutated.
    fn assemble_request(
        &self,
        method: Method,
        url: &str,
        options: &mut RequestOptions,
        headers: HeaderSet,
        proxy: Option<Proxy>,
    ) -> Result<Request> {
        let mut params = self.params.clone();
        params.append(&mut options.params);

        let mut cookies = self.cookies.clone();
        if let Some(extra) = &options.cookies {
            cookies.update(extra);
        }

        let mut body = Body::resolve(
            options.form.take(),
            options.multipart.take(),
            options.json.take(),
        );
        if matches!(body, Body::Empty) {
            if let Some(raw) = options.raw.take() {
                body = Body::Raw(raw);
            }
        }

        Request::build(
            method,
            url,
            &params,
            headers,
            cookies,
            proxy,
            options.timeout.unwrap_or(self.timeout),
            body,
        )
    }

    /// Apply auth and request hooks, in that order. Hook errors abort the
    /// in-flight request.
    fn prepare_send(&self, request: &mut Request, auth: Option<&Auth>) -> Result<()> {
        self.ensure_open()?;
        if let Some(auth) = auth.or(self.auth.as_ref()) {
            auth.apply(request)?;
        }
        for hook in &self.request_hooks {
            hook(request)?;
        }
        Ok(())
    }

    fn build_payload(&self, request: &mut Request, identifier: Option<String>) -> EngineRequest {
        let body_bytes = request.body().to_bytes();
        let (request_body, is_byte_request) = if body_bytes.is_empty() {
            (None, false)
        } else {
            (
                Some(general_purpose::STANDARD.encode(&body_bytes)),
                true,
            )
        };

        let session_id = lock(&self.session_id).clone();
        request.set_session_id(session_id.clone());

        EngineRequest {
            session_id,
            request_method: request.method().to_string(),
            request_url: request.url().to_string(),
            request_body,
            is_byte_request,
            headers: request.headers().to_pairs().into_iter().collect::<BTreeMap<_, _>>(),
            header_order: request.headers().names(),
            request_cookies: request
                .cookies()
                .iter()
                .map(|(name, value)| CookiePair {
                    name: name.to_string(),
                    value: value.to_string(),
                })
                .collect(),
            proxy_url: request.proxy().map(|p| p.url()).unwrap_or_default(),
            timeout_seconds: request.timeout().as_secs(),
            force_http1: self.protocol == Protocol::Http1,
            insecure_skip_verify: !self.verify,
            tls_client_identifier: if self.custom_tls.is_some() {
                None
            } else {
                identifier.or_else(|| Some(DEFAULT_TLS_IDENTIFIER.to_string()))
            },
            custom_tls_client: self.custom_tls.clone(),
            ..Default::default()
        }
    }

    fn rebuild_redirect_method(request: &Request, response: &Response) -> Method {
        let mut method = request.method().clone();
        let status = response.status_code();
        // 303 and 302 rewrite any non-HEAD method to GET; 301 only rewrites
        // POST. Browser convention rather than RFC 9110; kept as-is.
        if (status == 303 || status == 302) && method != Method::HEAD {
            method = Method::GET;
        }
        if status == 301 && method == Method::POST {
            method = Method::GET;
        }
        method
    }

    fn rebuild_redirect_url(&self, request: &Request, response: &Response) -> Result<Url> {
        let location = response.headers().get("location").ok_or_else(|| {
            Error::RemoteProtocol("redirect response carries no Location header".to_string())
        })?;

        let mut url = match Url::parse(&location) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                request.url().join(&location).map_err(|e| {
                    Error::RemoteProtocol(format!("invalid Location header `{location}`: {e}"))
                })?
            }
            Err(e) => {
                return Err(Error::RemoteProtocol(format!(
                    "invalid Location header `{location}`: {e}"
                )))
            }
        };

        if url.scheme() != request.url().scheme() {
            if request.url().scheme() == "http" {
                // A plain-http session keeps the redirect target on plain http.
                url.set_scheme("http").map_err(|_| {
                    Error::RemoteProtocol(format!("cannot downgrade `{url}` to http"))
                })?;
            } else {
                match self.protocol {
                    Protocol::Auto => {
                        // The negotiated protocol is scheme-bound; start a
                        // fresh engine session so the next dispatch can
                        // renegotiate.
                        let mut session_id = lock(&self.session_id);
                        self.engine.destroy_session(&session_id)?;
                        *session_id = Uuid::new_v4().to_string();
                        tracing::debug!(target_scheme = url.scheme(), "reset engine session for scheme switch");
                    }
                    _ => {
                        return Err(Error::RemoteProtocol(
                            "switching schemes with a pinned HTTP protocol is not supported; \
                             initialize the client with `Protocol::Auto`"
                                .to_string(),
                        ))
                    }
                }
            }
        }

        Ok(url)
    }

    /// Rebuild the follow-up request for a redirect response: rewritten
    /// method and URL, the original headers, and the cookies extracted from
    /// the redirecting response (this is how an intermediate `Set-Cookie`
    /// propagates forward).
    fn rebuild_redirect_request(&self, request: &Request, response: &Response) -> Result<Request> {
        Request::from_parts(
            Self::rebuild_redirect_method(request, response),
            self.rebuild_redirect_url(request, response)?,
            request.headers().clone(),
            response.cookies().clone(),
            None,
            DEFAULT_TIMEOUT,
            Body::Empty,
        )
    }

    fn decode_reply(&self, reply: EngineReply, is_byte_response: bool) -> Result<Response> {
        if let Some(id) = reply.id.as_deref() {
            self.engine.free_memory(id)?;
        }
        Response::from_reply(&reply, is_byte_response)
    }

    fn finish_response(
        &self,
        mut response: Response,
        request: Request,
        start: Instant,
    ) -> Response {
        response.set_request(Arc::new(request));
        response.set_default_encoding(&self.default_encoding);
        response.set_elapsed(start.elapsed());
        response
    }

    fn send_with_redirects(&self, mut request: Request, follow_redirects: bool) -> Result<Response> {
        let start = Instant::now();
        let mut history: Vec<Response> = Vec::new();
        loop {
            let identifier = self.effective_identifier()?;
            let payload = self.build_payload(&mut request, identifier);
            let reply = self.engine.request(&payload)?;
            let response = self.decode_reply(reply, payload.is_byte_response)?;
            let mut response = self.finish_response(response, request, start);

            if response.is_redirect() {
                let next = self.rebuild_redirect_request(response.request(), &response)?;
                response.set_next(next.clone());
                if follow_redirects {
                    if history.len() >= self.max_redirects {
                        return Err(Error::TooManyRedirects(self.max_redirects));
                    }
                    tracing::debug!(
                        status = response.status_code(),
                        location = %next.url(),
                        hop = history.len() + 1,
                        "following redirect"
                    );
                    history.push(response);
                    request = next;
                    continue;
                }
            }

            response.set_history(history);
            return Ok(response);
        }
    }

    async fn send_with_redirects_async(
        &self,
        mut request: Request,
        follow_redirects: bool,
    ) -> Result<Response> {
        let start = Instant::now();
        let mut history: Vec<Response> = Vec::new();
        loop {
            let identifier = self.effective_identifier_async().await?;
            let payload = self.build_payload(&mut request, identifier);
            let reply = self.dispatch_blocking(payload.clone()).await?;
            let response = self.decode_reply(reply, payload.is_byte_response)?;
            let mut response = self.finish_response(response, request, start);

            if response.is_redirect() {
                let next = self.rebuild_redirect_request(response.request(), &response)?;
                response.set_next(next.clone());
                if follow_redirects {
                    if history.len() >= self.max_redirects {
                        return Err(Error::TooManyRedirects(self.max_redirects));
                    }
                    tracing::debug!(
                        status = response.status_code(),
                        location = %next.url(),
                        hop = history.len() + 1,
                        "following redirect"
                    );
                    history.push(response);
                    request = next;
                    continue;
                }
            }

            response.set_history(history);
            return Ok(response);
        }
    }

    /// Run the blocking engine call off the async executor.
    async fn dispatch_blocking(&self, payload: EngineRequest) -> Result<EngineReply> {
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || engine.request(&payload))
            .await
            .map_err(|e| Error::Engine(e.to_string()))?
    }

    fn proxy_feedback(&self, response: &Response) {
        if let Some(ProxySource::Rotator(rotator)) = &self.proxy {
            if let Some(proxy) = response.request().proxy() {
                let status = response.status_code();
                let success = (200..500).contains(&status) && status != 407;
                rotator.mark_result(proxy, success, Some(response.elapsed()));
            }
        }
    }

    async fn proxy_feedback_async(&self, response: &Response) {
        if let Some(ProxySource::Rotator(rotator)) = &self.proxy {
            if let Some(proxy) = response.request().proxy() {
                let status = response.status_code();
                let success = (200..500).contains(&status) && status != 407;
                rotator
                    .amark_result(proxy, success, Some(response.elapsed()))
                    .await;
            }
        }
    }

    /// Response hooks when registered, else an eager body read; then close.
    fn run_response_hooks(&self, response: &mut Response) -> Result<()> {
        if self.response_hooks.is_empty() {
            response.read();
        } else {
            for hook in &self.response_hooks {
                hook(response)?;
            }
        }
        response.close();
        Ok(())
    }
}

/// Shared configuration for [`Client`] and [`AsyncClient`].
pub struct ClientBuilder {
    engine: Option<Arc<dyn Engine>>,
    auth: Option<Auth>,
    params: Vec<(String, String)>,
    headers: Option<HeaderSource>,
    cookies: Cookies,
    proxy: Option<ProxySource>,
    timeout: Duration,
    follow_redirects: bool,
    max_redirects: usize,
    protocol: Protocol,
    verify: bool,
    identifier: Option<IdentifierSource>,
    custom_tls: Option<CustomTlsProfile>,
    request_hooks: Vec<RequestHook>,
    response_hooks: Vec<ResponseHook>,
    default_encoding: String,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            engine: None,
            auth: None,
            params: Vec::new(),
            headers: None,
            cookies: Cookies::new(),
            proxy: None,
            timeout: DEFAULT_TIMEOUT,
            follow_redirects: true,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            protocol: Protocol::Auto,
            verify: true,
            identifier: None,
            custom_tls: None,
            request_hooks: Vec::new(),
            response_hooks: Vec::new(),
            default_encoding: "utf-8".to_string(),
        }
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the engine implementation; defaults to the process-wide
    /// native engine.
    pub fn engine(mut self, engine: Arc<dyn Engine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Add a default query parameter appended to every request URL.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Set fixed default headers.
    pub fn headers(mut self, headers: HeaderSet) -> Self {
        self.headers = Some(HeaderSource::Set(headers));
        self
    }

    /// Draw default headers from a rotator, one template per request. Accepts
    /// an `Arc` when the rotator is shared with other owners.
    pub fn header_rotator(mut self, rotator: impl Into<Arc<HeaderRotator>>) -> Self {
        self.headers = Some(HeaderSource::Rotator(rotator.into()));
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.set(name, value);
        self
    }

    pub fn cookies(mut self, cookies: Cookies) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn proxy(mut self, proxy: Proxy) -> Self {
        self.proxy = Some(ProxySource::Single(proxy));
        self
    }

    /// Rotate outbound proxies, one per request, with success/failure
    /// feedback after each send. Accepts an `Arc` when the rotator is shared
    /// with other owners.
    pub fn proxy_rotator(mut self, rotator: impl Into<Arc<ProxyRotator>>) -> Self {
        self.proxy = Some(ProxySource::Rotator(rotator.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Verify TLS certificates (default true).
    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn tls_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(IdentifierSource::Single(identifier.into()));
        self
    }

    pub fn tls_identifier_rotator(mut self, rotator: impl Into<Arc<TlsIdentifierRotator>>) -> Self {
        self.identifier = Some(IdentifierSource::Rotator(rotator.into()));
        self
    }

    /// Use a hand-rolled TLS profile instead of a named identifier.
    pub fn custom_tls(mut self, profile: CustomTlsProfile) -> Self {
        self.custom_tls = Some(profile);
        self
    }

    /// Register a request hook; hooks run in registration order and may
    /// mutate the request. A hook error aborts the request.
    pub fn request_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Request) -> Result<()> + Send + Sync + 'static,
    {
        self.request_hooks.push(Arc::new(hook));
        self
    }

    /// Register a response hook; when any is present the eager body read is
    /// skipped and hooks own the response.
    pub fn response_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Response) -> Result<()> + Send + Sync + 'static,
    {
        self.response_hooks.push(Arc::new(hook));
        self
    }

    /// Fallback text encoding when the response declares no charset.
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.default_encoding = encoding.into();
        self
    }

    fn build_core(self) -> Result<Arc<ClientCore>> {
        let engine: Arc<dyn Engine> = match self.engine {
            Some(engine) => engine,
            None => NativeEngine::initialize()?,
        };
        Ok(Arc::new(ClientCore {
            engine,
            session_id: Mutex::new(Uuid::new_v4().to_string()),
            state: Mutex::new(ClientState::Unopened),
            auth: self.auth,
            params: self.params,
            headers: self
                .headers
                .unwrap_or_else(|| HeaderSource::Set(HeaderSet::new())),
            cookies: self.cookies,
            proxy: self.proxy,
            timeout: self.timeout,
            follow_redirects: self.follow_redirects,
            max_redirects: self.max_redirects,
            protocol: self.protocol,
            verify: self.verify,
            identifier: self
                .identifier
                .unwrap_or_else(|| IdentifierSource::Single(DEFAULT_TLS_IDENTIFIER.to_string())),
            custom_tls: self.custom_tls,
            request_hooks: self.request_hooks,
            response_hooks: self.response_hooks,
            default_encoding: self.default_encoding,
        }))
    }

    /// Build a blocking client. Fails when no engine can be loaded.
    pub fn build(self) -> Result<Client> {
        Ok(Client {
            core: self.build_core()?,
        })
    }

    /// Build an async client. Fails when no engine can be loaded.
    pub fn build_async(self) -> Result<AsyncClient> {
        Ok(AsyncClient {
            core: self.build_core()?,
        })
    }
}

/// A blocking HTTP client, shareable across threads.
#[derive(Clone)]
pub struct Client {
    core: Arc<ClientCore>,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Build with default settings and the process-wide native engine.
    pub fn new() -> Result<Self> {
        ClientBuilder::new().build()
    }

    pub fn get<U: AsRef<str>>(&self, url: U) -> RequestBuilder<'_> {
        self.request(Method::GET, url)
    }

    pub fn post<U: AsRef<str>>(&self, url: U) -> RequestBuilder<'_> {
        self.request(Method::POST, url)
    }

    pub fn put<U: AsRef<str>>(&self, url: U) -> RequestBuilder<'_> {
        self.request(Method::PUT, url)
    }

    pub fn patch<U: AsRef<str>>(&self, url: U) -> RequestBuilder<'_> {
        self.request(Method::PATCH, url)
    }

    pub fn delete<U: AsRef<str>>(&self, url: U) -> RequestBuilder<'_> {
        self.request(Method::DELETE, url)
    }

    pub fn head<U: AsRef<str>>(&self, url: U) -> RequestBuilder<'_> {
        self.request(Method::HEAD, url)
    }

    pub fn options<U: AsRef<str>>(&self, url: U) -> RequestBuilder<'_> {
        self.request(Method::OPTIONS, url)
    }

    /// Start building a request with a custom method.
    pub fn request<U: AsRef<str>>(&self, method: Method, url: U) -> RequestBuilder<'_> {
        RequestBuilder {
            client: self,
            method,
            url: url.as_ref().to_string(),
            options: RequestOptions::default(),
        }
    }

    /// Send an already-built request with the client's defaults.
    pub fn send(&self, mut request: Request) -> Result<Response> {
        self.core.prepare_send(&mut request, None)?;
        let mut response = self
            .core
            .send_with_redirects(request, self.core.follow_redirects)?;
        self.core.proxy_feedback(&response);
        self.core.run_response_hooks(&mut response)?;
        Ok(response)
    }

    /// Mark the client opened. Fails on double-open and after close.
    pub fn open(&self) -> Result<()> {
        self.core.open()
    }

    /// Destroy the engine session and close the client. Terminal; the client
    /// rejects further requests.
    pub fn close(&self) -> Result<()> {
        self.core.close()
    }

    pub fn is_closed(&self) -> bool {
        *lock(&self.core.state) == ClientState::Closed
    }

    /// The current engine session id.
    pub fn session_id(&self) -> String {
        lock(&self.core.session_id).clone()
    }
}

/// Builder for a single blocking request.
pub struct RequestBuilder<'a> {
    client: &'a Client,
    method: Method,
    url: String,
    options: RequestOptions,
}

impl<'a> RequestBuilder<'a> {
    /// Append a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.params.push((name.into(), value.into()));
        self
    }

    /// Add a header. Replaces the client's default header set for this call
    /// when it is the first per-call header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let headers = self.options.headers.get_or_insert_with(HeaderSet::new);
        let _ = headers.insert(name, value);
        self
    }

    /// Replace the headers for this call outright.
    pub fn headers(mut self, headers: HeaderSet) -> Self {
        self.options.headers = Some(headers);
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options
            .cookies
            .get_or_insert_with(Cookies::new)
            .set(name, value);
        self
    }

    /// Send an urlencoded form body.
    pub fn form<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.options.form = Some(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Send a multipart form body. Wins over `form` and `json`.
    pub fn multipart(mut self, form: Form) -> Self {
        self.options.multipart = Some(form);
        self
    }

    /// Send a JSON body.
    #[cfg(feature = "json")]
    pub fn json<T: serde::Serialize>(mut self, json: &T) -> Self {
        if let Ok(value) = serde_json::to_value(json) {
            self.options.json = Some(value);
        }
        self
    }

    /// Send a raw byte body.
    pub fn body<B: Into<Bytes>>(mut self, body: B) -> Self {
        self.options.raw = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.options.auth = Some(auth);
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.options.follow_redirects = Some(follow);
        self
    }

    /// Send the request.
    pub fn send(mut self) -> Result<Response> {
        let core = &self.client.core;
        let headers = core.effective_headers(self.options.headers.take())?;
        let proxy = core.effective_proxy()?;
        let mut request =
            core.assemble_request(self.method, &self.url, &mut self.options, headers, proxy)?;
        core.prepare_send(&mut request, self.options.auth.as_ref())?;
        let follow = self
            .options
            .follow_redirects
            .unwrap_or(core.follow_redirects);
        let mut response = core.send_with_redirects(request, follow)?;
        core.proxy_feedback(&response);
        core.run_response_hooks(&mut response)?;
        Ok(response)
    }
}

/// An asynchronous HTTP client, shareable across tasks.
#[derive(Clone)]
pub struct AsyncClient {
    core: Arc<ClientCore>,
}

impl AsyncClient {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Build with default settings and the process-wide native engine.
    pub fn new() -> Result<Self> {
        ClientBuilder::new().build_async()
    }

    pub fn get<U: AsRef<str>>(&self, url: U) -> AsyncRequestBuilder<'_> {
        self.request(Method::GET, url)
    }

    pub fn post<U: AsRef<str>>(&self, url: U) -> AsyncRequestBuilder<'_> {
        self.request(Method::POST, url)
    }

    pub fn put<U: AsRef<str>>(&self, url: U) -> AsyncRequestBuilder<'_> {
        self.request(Method::PUT, url)
    }

    pub fn patch<U: AsRef<str>>(&self, url: U) -> AsyncRequestBuilder<'_> {
        self.request(Method::PATCH, url)
    }

    pub fn delete<U: AsRef<str>>(&self, url: U) -> AsyncRequestBuilder<'_> {
        self.request(Method::DELETE, url)
    }

    pub fn head<U: AsRef<str>>(&self, url: U) -> AsyncRequestBuilder<'_> {
        self.request(Method::HEAD, url)
    }

    pub fn options<U: AsRef<str>>(&self, url: U) -> AsyncRequestBuilder<'_> {
        self.request(Method::OPTIONS, url)
    }

    pub fn request<U: AsRef<str>>(&self, method: Method, url: U) -> AsyncRequestBuilder<'_> {
        AsyncRequestBuilder {
            client: self,
            method,
            url: url.as_ref().to_string(),
            options: RequestOptions::default(),
        }
    }

    /// Send an already-built request with the client's defaults.
    pub async fn send(&self, mut request: Request) -> Result<Response> {
        self.core.prepare_send(&mut request, None)?;
        let mut response = self
            .core
            .send_with_redirects_async(request, self.core.follow_redirects)
            .await?;
        self.core.proxy_feedback_async(&response).await;
        self.core.run_response_hooks(&mut response)?;
        Ok(response)
    }

    pub fn open(&self) -> Result<()> {
        self.core.open()
    }

    /// Destroy the engine session and close the client, off the executor.
    pub async fn close(&self) -> Result<()> {
        let core = self.core.clone();
        tokio::task::spawn_blocking(move || core.close())
            .await
            .map_err(|e| Error::Engine(e.to_string()))?
    }

    pub fn is_closed(&self) -> bool {
        *lock(&self.core.state) == ClientState::Closed
    }

    pub fn session_id(&self) -> String {
        lock(&self.core.session_id).clone()
    }
}

/// Builder for a single asynchronous request.
pub struct AsyncRequestBuilder<'a> {
    client: &'a AsyncClient,
    method: Method,
    url: String,
    options: RequestOptions,
}

impl<'a> AsyncRequestBuilder<'a> {
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.params.push((name.into(), value.into()));
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        let headers = self.options.headers.get_or_insert_with(HeaderSet::new);
        let _ = headers.insert(name, value);
        self
    }

    pub fn headers(mut self, headers: HeaderSet) -> Self {
        self.options.headers = Some(headers);
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options
            .cookies
            .get_or_insert_with(Cookies::new)
            .set(name, value);
        self
    }

    pub fn form<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.options.form = Some(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn multipart(mut self, form: Form) -> Self {
        self.options.multipart = Some(form);
        self
    }

    #[cfg(feature = "json")]
    pub fn json<T: serde::Serialize>(mut self, json: &T) -> Self {
        if let Ok(value) = serde_json::to_value(json) {
            self.options.json = Some(value);
        }
        self
    }

    pub fn body<B: Into<Bytes>>(mut self, body: B) -> Self {
        self.options.raw = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.options.auth = Some(auth);
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.options.follow_redirects = Some(follow);
        self
    }

    /// Send the request, suspending at dispatch and rotator access.
    pub async fn send(mut self) -> Result<Response> {
        let core = &self.client.core;
        let headers = core
            .effective_headers_async(self.options.headers.take())
            .await?;
        let proxy = core.effective_proxy_async().await?;
        let mut request =
            core.assemble_request(self.method, &self.url, &mut self.options, headers, proxy)?;
        core.prepare_send(&mut request, self.options.auth.as_ref())?;
        let follow = self
            .options
            .follow_redirects
            .unwrap_or(core.follow_redirects);
        let mut response = core.send_with_redirects_async(request, follow).await?;
        core.proxy_feedback_async(&response).await;
        core.run_response_hooks(&mut response)?;
        Ok(response)
    }
}
