//! HTTP request/response modeling: headers, cookies, bodies, multipart.

pub mod body;
pub mod cookies;
pub mod headers;
pub mod multipart;
pub mod request;
pub mod response;

pub use body::Body;
pub use cookies::Cookies;
pub use headers::HeaderSet;
pub use multipart::{Form, Part};
pub use request::{Request, DEFAULT_TIMEOUT};
pub use response::Response;
