use crate::base::Result;
use crate::http::Request;
use base64::{engine::general_purpose, Engine as _};
use std::sync::Arc;

/// A pluggable authentication scheme applied to outbound requests.
pub trait AuthScheme: Send + Sync {
    fn apply(&self, request: &mut Request) -> Result<()>;
}

/// Request authentication.
///
/// A closed set of variants dispatched by one `match`: static basic
/// credentials, an arbitrary mutation callback, or a full [`AuthScheme`]
/// implementation.
#[derive(Clone)]
pub enum Auth {
    Basic {
        username: String,
        password: String,
    },
    Callback(Arc<dyn Fn(&mut Request) -> Result<()> + Send + Sync>),
    Handler(Arc<dyn AuthScheme>),
}

impl Auth {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Auth::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&mut Request) -> Result<()> + Send + Sync + 'static,
    {
        Auth::Callback(Arc::new(f))
    }

    pub fn handler<H: AuthScheme + 'static>(handler: H) -> Self {
        Auth::Handler(Arc::new(handler))
    }

    pub(crate) fn apply(&self, request: &mut Request) -> Result<()> {
        match self {
            Auth::Basic { username, password } => {
                let credentials =
                    general_purpose::STANDARD.encode(format!("{username}:{password}"));
                request
                    .headers_mut()
                    .insert("authorization", &format!("Basic {credentials}"))
            }
            Auth::Callback(callback) => callback(request),
            Auth::Handler(handler) => handler.apply(request),
        }
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[secure]")
                .finish(),
            Auth::Callback(_) => f.write_str("Callback"),
            Auth::Handler(_) => f.write_str("Handler"),
        }
    }
}
