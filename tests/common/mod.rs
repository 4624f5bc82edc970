//! A scriptable in-process engine for driving the client without a native
//! binary. Routes map request URLs to canned replies; every payload, freed
//! reply id and destroyed session is recorded for assertions.

use base64::{engine::general_purpose, Engine as _};
use mimicnet::engine::{CookiePair, Engine, EngineReply, EngineRequest};
use mimicnet::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Default)]
pub struct ScriptedReply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ScriptedReply {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        Self {
            status,
            headers: vec![("Location".to_string(), location.to_string())],
            ..Default::default()
        }
    }

    pub fn ok_with_body(body: &str) -> Self {
        Self {
            status: 200,
            body: Some(body.to_string()),
            ..Default::default()
        }
    }

    /// A local engine-side failure: status 0 plus diagnostic text.
    pub fn soft_failure(diagnostic: &str) -> Self {
        Self {
            status: 0,
            body: Some(diagnostic.to_string()),
            ..Default::default()
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.push((name.to_string(), value.to_string()));
        self
    }
}

#[derive(Default)]
pub struct MockEngine {
    routes: Mutex<HashMap<String, ScriptedReply>>,
    pub requests: Mutex<Vec<EngineRequest>>,
    pub freed: Mutex<Vec<String>>,
    pub destroyed_sessions: Mutex<Vec<String>>,
    counter: AtomicUsize,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the reply for an exact request URL.
    pub fn route(&self, url: &str, reply: ScriptedReply) {
        self.routes.lock().unwrap().insert(url.to_string(), reply);
    }

    pub fn recorded_requests(&self) -> Vec<EngineRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn freed_ids(&self) -> Vec<String> {
        self.freed.lock().unwrap().clone()
    }

    pub fn destroyed(&self) -> Vec<String> {
        self.destroyed_sessions.lock().unwrap().clone()
    }
}

impl Engine for MockEngine {
    fn request(&self, payload: &EngineRequest) -> Result<EngineReply> {
        self.requests.lock().unwrap().push(payload.clone());
        let scripted = self
            .routes
            .lock()
            .unwrap()
            .get(&payload.request_url)
            .cloned()
            .unwrap_or_else(|| ScriptedReply::status(404));

        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        let body = scripted.body.as_ref().map(|body| {
            if payload.is_byte_response && scripted.status > 0 {
                general_purpose::STANDARD.encode(body.as_bytes())
            } else {
                body.clone()
            }
        });

        let mut headers: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in &scripted.headers {
            headers
                .entry(name.clone())
                .or_default()
                .push(value.clone());
        }

        Ok(EngineReply {
            id: Some(format!("reply-{id}")),
            session_id: Some(payload.session_id.clone()),
            status: scripted.status,
            target: Some(payload.request_url.clone()),
            body,
            headers,
            cookies: scripted.cookies.iter().cloned().collect(),
            success: scripted.status > 0,
            used_protocol: "HTTP/1.1".to_string(),
        })
    }

    fn get_cookies(&self, session_id: &str, _url: &str) -> Result<EngineReply> {
        Ok(EngineReply {
            session_id: Some(session_id.to_string()),
            success: true,
            ..Default::default()
        })
    }

    fn add_cookies(
        &self,
        session_id: &str,
        _url: &str,
        _cookies: &[CookiePair],
    ) -> Result<EngineReply> {
        Ok(EngineReply {
            session_id: Some(session_id.to_string()),
            success: true,
            ..Default::default()
        })
    }

    fn destroy_session(&self, session_id: &str) -> Result<bool> {
        self.destroyed_sessions
            .lock()
            .unwrap()
            .push(session_id.to_string());
        Ok(true)
    }

    fn destroy_all(&self) -> Result<bool> {
        Ok(true)
    }

    fn free_memory(&self, reply_id: &str) -> Result<()> {
        self.freed.lock().unwrap().push(reply_id.to_string());
        Ok(())
    }
}
