use super::{Cookies, HeaderSet, Request};
use crate::base::{Error, Result};
use crate::engine::EngineReply;
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use encoding_rs::Encoding;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Status codes a `Location` header turns into a redirect.
const REDIRECT_STATUS: [u16; 5] = [301, 302, 303, 307, 308];

/// A structured HTTP response decoded from a raw engine reply.
///
/// A status code of `0` is not an HTTP status: it signals a local engine-side
/// failure (timeout, connection failure) and carries the engine's diagnostic
/// text in [`reason`](Self::reason). Callers branch on it instead of
/// catching an error.
pub struct Response {
    status_code: u16,
    headers: HeaderSet,
    cookies: Cookies,
    body: Bytes,
    text: OnceLock<String>,
    default_encoding: String,
    http_version: String,
    response_id: Option<String>,
    elapsed: Duration,
    history: Vec<Response>,
    next: Option<Request>,
    request: Option<Arc<Request>>,
    closed: bool,
}

impl Response {
    /// Decode a raw engine reply.
    pub(crate) fn from_reply(reply: &EngineReply, is_byte_response: bool) -> Result<Self> {
        let body = decode_reply_body(reply, is_byte_response)?;

        let mut headers = HeaderSet::new();
        for (name, values) in &reply.headers {
            for value in values {
                let _ = headers.append(name, value);
            }
        }

        let mut cookies = Cookies::new();
        cookies.extend_from_reply(&reply.cookies);

        let http_version = if reply.used_protocol.is_empty() {
            "HTTP/1.1".to_string()
        } else {
            reply.used_protocol.clone()
        };

        Ok(Self {
            status_code: reply.status,
            headers,
            cookies,
            body,
            text: OnceLock::new(),
            default_encoding: "utf-8".to_string(),
            http_version,
            response_id: reply.id.clone(),
            elapsed: Duration::ZERO,
            history: Vec::new(),
            next: None,
            request: None,
            closed: false,
        })
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    pub fn cookies(&self) -> &Cookies {
        &self.cookies
    }

    /// The engine-side identifier of the raw reply this was decoded from.
    pub fn id(&self) -> Option<&str> {
        self.response_id.as_deref()
    }

    pub fn http_version(&self) -> &str {
        &self.http_version
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub(crate) fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    /// The request that produced this response.
    ///
    /// Panics if the response was constructed without one; that indicates a
    /// bug in the dispatch path, not a runtime condition.
    pub fn request(&self) -> &Request {
        match &self.request {
            Some(request) => request,
            None => panic!("the request instance has not been set on this response"),
        }
    }

    pub(crate) fn set_request(&mut self, request: Arc<Request>) {
        self.request = Some(request);
    }

    pub fn url(&self) -> &url::Url {
        self.request().url()
    }

    /// Prior responses in the redirect chain, oldest first.
    pub fn history(&self) -> &[Response] {
        &self.history
    }

    pub(crate) fn set_history(&mut self, history: Vec<Response>) {
        self.history = history;
    }

    /// The rebuilt request this redirect points at, when this response is one.
    pub fn next(&self) -> Option<&Request> {
        self.next.as_ref()
    }

    pub(crate) fn set_next(&mut self, next: Request) {
        self.next = Some(next);
    }

    pub fn is_redirect(&self) -> bool {
        self.headers.contains("location") && REDIRECT_STATUS.contains(&self.status_code)
    }

    pub fn is_permanent_redirect(&self) -> bool {
        self.headers.contains("location") && matches!(self.status_code, 301 | 308)
    }

    /// Reason phrase; for a status-0 soft failure this is the
    /// engine-supplied diagnostic text.
    pub fn reason(&self) -> String {
        if self.status_code == 0 {
            let text = self.text();
            if !text.is_empty() {
                return text.to_string();
            }
        }
        http::StatusCode::from_u16(self.status_code)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown")
            .to_string()
    }

    /// Raw body bytes.
    pub fn content(&self) -> &Bytes {
        &self.body
    }

    /// Consume the body eagerly, returning the raw bytes.
    pub fn read(&mut self) -> Bytes {
        self.body.clone()
    }

    /// Body decoded as text.
    ///
    /// Charset priority: `Content-Type` charset, then the configured default
    /// encoding, then BOM detection, then UTF-8. Decoded once and memoized.
    pub fn text(&self) -> &str {
        self.text.get_or_init(|| {
            let encoding = self.encoding();
            let (decoded, _, _) = encoding.decode(&self.body);
            decoded.into_owned()
        })
    }

    /// The encoding `text()` decodes with.
    pub fn encoding(&self) -> &'static Encoding {
        if let Some(charset) = self.charset() {
            if let Some(encoding) = Encoding::for_label(charset.as_bytes()) {
                return encoding;
            }
        }
        if let Some(encoding) = Encoding::for_label(self.default_encoding.as_bytes()) {
            return encoding;
        }
        if let Some((encoding, _)) = Encoding::for_bom(&self.body) {
            return encoding;
        }
        encoding_rs::UTF_8
    }

    /// Charset declared by the `Content-Type` header, if any.
    pub fn charset(&self) -> Option<String> {
        let content_type = self.headers.get("content-type")?;
        let mime: mime::Mime = content_type.parse().ok()?;
        mime.get_param("charset").map(|c| c.as_str().to_string())
    }

    pub(crate) fn set_default_encoding(&mut self, encoding: &str) {
        self.default_encoding = encoding.to_string();
    }

    /// Deserialize the body as JSON.
    #[cfg(feature = "json")]
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(self.text())?)
    }

    /// Whether `error_for_status()` would pass.
    pub fn ok(&self) -> bool {
        (100..400).contains(&self.status_code)
    }

    /// Error out on engine-local failures (status 0), 4xx and 5xx statuses.
    ///
    /// Never called implicitly by dispatch; status handling is the caller's
    /// decision.
    pub fn error_for_status(&self) -> Result<&Self> {
        let kind = match self.status_code {
            0..=99 => "Engine Error",
            400..=499 => "Client Error",
            500..=599 => "Server Error",
            _ => return Ok(self),
        };
        Err(Error::HttpStatus {
            status: self.status_code,
            message: format!(
                "{} {}: {} for url: {}",
                self.status_code,
                kind,
                self.reason(),
                self.request
                    .as_ref()
                    .map(|r| r.url().to_string())
                    .unwrap_or_default(),
            ),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Release the response stream. Idempotent.
    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status_code", &self.status_code)
            .field("http_version", &self.http_version)
            .field("headers", &self.headers)
            .field("history", &self.history.len())
            .finish()
    }
}

fn decode_reply_body(reply: &EngineReply, is_byte_response: bool) -> Result<Bytes> {
    match reply.body.as_deref() {
        None | Some("") => Ok(Bytes::new()),
        Some(value) => {
            if is_byte_response && reply.status > 0 {
                // Engine byte bodies arrive as a data-URI-style payload;
                // only the part after the last comma is base64.
                let encoded = value.rsplit(',').next().unwrap_or(value);
                let decoded = general_purpose::STANDARD
                    .decode(encoded)
                    .map_err(|_| Error::Base64Decode)?;
                Ok(Bytes::from(decoded))
            } else {
                Ok(Bytes::from(value.as_bytes().to_vec()))
            }
        }
    }
}
