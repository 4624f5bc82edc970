use super::{CookiePair, Engine, EngineReply, EngineRequest};
use crate::base::{Error, Result};
use libloading::Library;
use std::ffi::{c_char, CStr, CString};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Environment variable naming a pre-installed engine shared library,
/// bypassing directory discovery.
pub const ENGINE_PATH_ENV: &str = "MIMICNET_ENGINE_PATH";

/// Environment variable naming the directory searched for engine binaries.
/// Defaults to the current directory.
pub const ENGINE_DIR_ENV: &str = "MIMICNET_ENGINE_DIR";

type PayloadFn = unsafe extern "C" fn(*const c_char) -> *mut c_char;
type NullaryFn = unsafe extern "C" fn() -> *mut c_char;

static GLOBAL_ENGINE: OnceLock<Arc<NativeEngine>> = OnceLock::new();

/// The native engine loaded as a shared library.
///
/// The exported functions exchange JSON documents through C strings. Reply
/// memory stays owned by the engine until `free_memory` is called with the
/// reply's id; the C string pointers themselves are never freed on this side.
pub struct NativeEngine {
    request_fn: PayloadFn,
    get_cookies_fn: PayloadFn,
    add_cookies_fn: PayloadFn,
    destroy_session_fn: PayloadFn,
    free_memory_fn: PayloadFn,
    destroy_all_fn: NullaryFn,
    _library: Library,
}

impl NativeEngine {
    /// Load the process-wide engine, initializing it on first call.
    /// Subsequent calls return the already-loaded instance.
    pub fn initialize() -> Result<Arc<Self>> {
        if let Some(engine) = GLOBAL_ENGINE.get() {
            return Ok(engine.clone());
        }
        let engine = Arc::new(Self::load()?);
        Ok(GLOBAL_ENGINE.get_or_init(|| engine).clone())
    }

    /// Tear down every session held by the process-wide engine, if one was
    /// initialized. The library itself stays mapped for the process lifetime.
    pub fn shutdown() -> Result<bool> {
        match GLOBAL_ENGINE.get() {
            Some(engine) => engine.destroy_all(),
            None => Ok(false),
        }
    }

    /// Locate and load the engine library: the `MIMICNET_ENGINE_PATH` file if
    /// set, otherwise the newest platform-matching binary in the discovery
    /// directory.
    pub fn load() -> Result<Self> {
        let path = locate_library()?;
        Self::load_from(&path)
    }

    /// Load the engine from an explicit shared-library path.
    pub fn load_from(path: &Path) -> Result<Self> {
        // SAFETY: the engine library's exported functions match the
        // signatures below; loading arbitrary unrelated libraries is the
        // operator's responsibility when overriding the path.
        unsafe {
            let library = Library::new(path)
                .map_err(|e| Error::EngineLoad(format!("{}: {e}", path.display())))?;
            let request_fn = *library
                .get::<PayloadFn>(b"request\0")
                .map_err(|e| Error::EngineLoad(e.to_string()))?;
            let get_cookies_fn = *library
                .get::<PayloadFn>(b"getCookiesFromSession\0")
                .map_err(|e| Error::EngineLoad(e.to_string()))?;
            let add_cookies_fn = *library
                .get::<PayloadFn>(b"addCookiesToSession\0")
                .map_err(|e| Error::EngineLoad(e.to_string()))?;
            let destroy_session_fn = *library
                .get::<PayloadFn>(b"destroySession\0")
                .map_err(|e| Error::EngineLoad(e.to_string()))?;
            let free_memory_fn = *library
                .get::<PayloadFn>(b"freeMemory\0")
                .map_err(|e| Error::EngineLoad(e.to_string()))?;
            let destroy_all_fn = *library
                .get::<NullaryFn>(b"destroyAll\0")
                .map_err(|e| Error::EngineLoad(e.to_string()))?;

            tracing::debug!(path = %path.display(), "loaded native engine library");
            Ok(Self {
                request_fn,
                get_cookies_fn,
                add_cookies_fn,
                destroy_session_fn,
                free_memory_fn,
                destroy_all_fn,
                _library: library,
            })
        }
    }

    fn call(&self, f: PayloadFn, input: &str) -> Result<String> {
        let input = CString::new(input).map_err(|e| Error::Engine(e.to_string()))?;
        // SAFETY: the engine returns a NUL-terminated string it keeps alive
        // until the matching freeMemory call; we copy it out immediately.
        unsafe {
            let ptr = f(input.as_ptr());
            if ptr.is_null() {
                return Err(Error::Engine("engine returned a null reply".to_string()));
            }
            Ok(CStr::from_ptr(ptr).to_string_lossy().into_owned())
        }
    }

    fn call_reply(&self, f: PayloadFn, input: &str) -> Result<EngineReply> {
        let raw = self.call(f, input)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl Engine for NativeEngine {
    fn request(&self, payload: &EngineRequest) -> Result<EngineReply> {
        let input = serde_json::to_string(payload)?;
        self.call_reply(self.request_fn, &input)
    }

    fn get_cookies(&self, session_id: &str, url: &str) -> Result<EngineReply> {
        let input = serde_json::json!({ "sessionId": session_id, "url": url }).to_string();
        self.call_reply(self.get_cookies_fn, &input)
    }

    fn add_cookies(
        &self,
        session_id: &str,
        url: &str,
        cookies: &[CookiePair],
    ) -> Result<EngineReply> {
        let input =
            serde_json::json!({ "sessionId": session_id, "url": url, "cookies": cookies })
                .to_string();
        self.call_reply(self.add_cookies_fn, &input)
    }

    fn destroy_session(&self, session_id: &str) -> Result<bool> {
        let input = serde_json::json!({ "sessionId": session_id }).to_string();
        Ok(self.call_reply(self.destroy_session_fn, &input)?.success)
    }

    fn destroy_all(&self) -> Result<bool> {
        // SAFETY: destroyAll takes no payload and returns an engine-owned
        // NUL-terminated string.
        let raw = unsafe {
            let ptr = (self.destroy_all_fn)();
            if ptr.is_null() {
                return Err(Error::Engine("engine returned a null reply".to_string()));
            }
            CStr::from_ptr(ptr).to_string_lossy().into_owned()
        };
        let reply: EngineReply = serde_json::from_str(&raw)?;
        Ok(reply.success)
    }

    fn free_memory(&self, reply_id: &str) -> Result<()> {
        self.call(self.free_memory_fn, reply_id)?;
        Ok(())
    }
}

fn library_extension() -> &'static str {
    if cfg!(target_os = "windows") {
        "dll"
    } else if cfg!(target_os = "macos") {
        "dylib"
    } else {
        "so"
    }
}

fn locate_library() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(ENGINE_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Ok(path);
        }
        return Err(Error::EngineLoad(format!(
            "{ENGINE_PATH_ENV} points at {} which is not a file",
            path.display()
        )));
    }

    let dir = std::env::var(ENGINE_DIR_ENV).unwrap_or_else(|_| ".".to_string());
    let extension = library_extension();
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().map(|e| e == extension).unwrap_or(false)
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.contains("tls-client"))
                    .unwrap_or(false)
        })
        .collect();
    candidates.sort();

    candidates.pop().ok_or_else(|| {
        Error::EngineLoad(format!(
            "no engine library found in `{dir}`; set {ENGINE_PATH_ENV} to a prebuilt binary"
        ))
    })
}
