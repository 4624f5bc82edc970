//! The native TLS/HTTP engine boundary.
//!
//! The engine performs the actual socket, TLS-handshake and HTTP framing
//! work; this module only owns its request/reply contract ([`payload`]) and
//! the dynamic-library bridge ([`library`]). Everything engine-facing funnels
//! through the [`Engine`] trait so dispatch logic stays testable without a
//! native binary.

pub mod library;
pub mod payload;

pub use library::{NativeEngine, ENGINE_DIR_ENV, ENGINE_PATH_ENV};
pub use payload::{CookiePair, CustomTlsProfile, EngineReply, EngineRequest};

use crate::base::Result;

/// The call contract of the native engine.
///
/// All calls are blocking; async callers wrap them in `spawn_blocking`.
/// `free_memory` must be called exactly once per reply `id`; the dispatch
/// layer owns that responsibility.
pub trait Engine: Send + Sync {
    /// Perform one HTTP exchange.
    fn request(&self, payload: &EngineRequest) -> Result<EngineReply>;

    /// Read the cookies the engine session holds for a URL.
    fn get_cookies(&self, session_id: &str, url: &str) -> Result<EngineReply>;

    /// Seed cookies into an engine session.
    fn add_cookies(&self, session_id: &str, url: &str, cookies: &[CookiePair])
        -> Result<EngineReply>;

    /// Tear down one engine session; returns whether the engine confirmed it.
    fn destroy_session(&self, session_id: &str) -> Result<bool>;

    /// Tear down every session the engine holds.
    fn destroy_all(&self) -> Result<bool>;

    /// Release engine-held memory for a reply id.
    fn free_memory(&self, reply_id: &str) -> Result<()>;
}
