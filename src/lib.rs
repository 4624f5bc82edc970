//! # mimicnet
//!
//! An HTTP client library that emulates the TLS and HTTP/2 fingerprints of
//! real browsers. The actual socket and handshake work is delegated to a
//! native engine loaded as a shared library; request/response modeling,
//! redirect handling, cookie jars, multipart encoding and outbound traffic
//! rotation live here.
//!
//! ## Features
//!
//! - **Browser identities**: named TLS fingerprints (`chrome_133`, ...) or a
//!   hand-rolled JA3/H2 profile, optionally rotated per request
//! - **Traffic rotation**: thread- and task-safe rotators for proxies,
//!   TLS identities and header templates, with adaptive proxy weighting
//! - **Browser-faithful redirects**: method rewriting, relative-`Location`
//!   resolution and cross-scheme session renegotiation
//! - **Sync and async**: [`Client`] for threads, [`AsyncClient`] for tasks,
//!   one shared core
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mimicnet::{Client, rotation::ProxyRotator};
//!
//! let client = Client::builder()
//!     .tls_identifier("chrome_133")
//!     .proxy_rotator(ProxyRotator::from_file("proxies.txt")?)
//!     .build()?;
//!
//! let resp = client.get("https://example.com").send()?;
//! println!("{} via {}", resp.status_code(), resp.http_version());
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Core error definitions
//! - [`engine`] - The native engine contract and dynamic-library bridge
//! - [`http`] - Requests, responses, headers, cookies, bodies
//! - [`rotation`] - Proxy / TLS-identity / header rotators
//!
//! ## Soft failures
//!
//! A local engine-side failure (timeout, connection refused) is returned as a
//! response with status code `0` carrying the engine's diagnostic in
//! `reason()`; it is not an error. Protocol violations, redirect-limit
//! overruns and lifecycle misuse are errors.

pub mod auth;
pub mod base;
pub mod client;
pub mod engine;
pub mod http;
pub mod rotation;

pub use auth::{Auth, AuthScheme};
pub use base::{Error, Result};
pub use client::{
    AsyncClient, Client, ClientBuilder, Protocol, DEFAULT_MAX_REDIRECTS, DEFAULT_TLS_IDENTIFIER,
};
pub use engine::{CustomTlsProfile, Engine, EngineReply, EngineRequest, NativeEngine};
pub use crate::http::{Body, Cookies, Form, HeaderSet, Part, Request, Response};
pub use rotation::{
    HeaderRotator, Proxy, ProxyRotator, Rotator, Strategy, TlsIdentifierRotator,
};
