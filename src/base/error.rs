use thiserror::Error;

/// Unified error type for the mimicnet crate.
///
/// Local dispatch failures (engine timeout, connection failure) are *not*
/// errors: they surface as a [`Response`](crate::http::Response) with status
/// code `0`. Everything that aborts an operation outright lives here.
#[derive(Debug, Error)]
pub enum Error {
    // Rotation errors
    #[error("Rotator is empty")]
    EmptyRotator,
    #[error("Unusable rotator source: {0}")]
    RotatorSource(String),
    #[error("Invalid proxy: {0}")]
    InvalidProxy(String),

    // Request construction errors
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Invalid header name or value")]
    InvalidHeader,

    // Redirect / protocol errors
    #[error("Remote protocol error: {0}")]
    RemoteProtocol(String),
    #[error("Exceeded maximum of {0} redirects")]
    TooManyRedirects(usize),

    // Raised only by an explicit `error_for_status()` call
    #[error("{message}")]
    HttpStatus { status: u16, message: String },

    // Client lifecycle misuse
    #[error("Client has been closed and cannot be reused")]
    ClientClosed,
    #[error("Client instance cannot be opened more than once")]
    AlreadyOpened,

    // Native engine errors
    #[error("Engine library unavailable: {0}")]
    EngineLoad(String),
    #[error("Engine call failed: {0}")]
    Engine(String),

    #[error("Could not decode base64 body from the engine reply")]
    Base64Decode,

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for mimicnet operations.
pub type Result<T> = std::result::Result<T, Error>;
