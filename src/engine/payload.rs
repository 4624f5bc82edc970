use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A `{name, value}` cookie pair as the engine expects it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CookiePair {
    pub name: String,
    pub value: String,
}

/// The dispatch payload sent to the native engine.
///
/// Serialized field names are the engine's wire contract and must not drift.
/// `followRedirects` is always `false`: redirect handling lives on this side
/// of the boundary, never in the engine.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineRequest {
    pub session_id: String,
    pub request_method: String,
    pub request_url: String,
    pub request_body: Option<String>,
    pub is_byte_request: bool,
    pub is_byte_response: bool,
    pub headers: BTreeMap<String, String>,
    pub header_order: Vec<String>,
    pub request_cookies: Vec<CookiePair>,
    pub proxy_url: String,
    pub is_rotating_proxy: bool,
    pub timeout_seconds: u64,
    pub force_http1: bool,
    pub insecure_skip_verify: bool,
    pub tls_client_identifier: Option<String>,
    pub custom_tls_client: Option<CustomTlsProfile>,
    pub follow_redirects: bool,
    #[serde(rename = "withRandomTLSExtensionOrder")]
    pub with_random_tls_extension_order: bool,
    pub catch_panics: bool,
    pub certificate_pinning_hosts: BTreeMap<String, Vec<String>>,
    pub with_debug: bool,
    pub with_default_cookie_jar: bool,
    pub without_cookie_jar: bool,
}

impl Default for EngineRequest {
    fn default() -> Self {
        Self {
            session_id: String::new(),
            request_method: String::new(),
            request_url: String::new(),
            request_body: None,
            is_byte_request: false,
            is_byte_response: true,
            headers: BTreeMap::new(),
            header_order: Vec::new(),
            request_cookies: Vec::new(),
            proxy_url: String::new(),
            is_rotating_proxy: false,
            timeout_seconds: 30,
            force_http1: false,
            insecure_skip_verify: false,
            tls_client_identifier: None,
            custom_tls_client: None,
            follow_redirects: false,
            with_random_tls_extension_order: true,
            catch_panics: false,
            certificate_pinning_hosts: BTreeMap::new(),
            with_debug: false,
            with_default_cookie_jar: false,
            without_cookie_jar: false,
        }
    }
}

/// A hand-rolled TLS fingerprint profile, used instead of a named
/// `tlsClientIdentifier` when set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTlsProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpn_protocols: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alps_protocols: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_compression_algo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_flow: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h2_settings: Option<BTreeMap<String, u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h2_settings_order: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_priority: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ja3_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_share_curves: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_frames: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pseudo_header_order: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_signature_algorithms: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_versions: Option<Vec<String>>,
}

/// The raw reply returned by the native engine.
///
/// `id` identifies engine-held memory for this reply and must be passed to
/// the engine's free-memory call exactly once after decoding.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineReply {
    pub id: Option<String>,
    pub session_id: Option<String>,
    pub status: u16,
    pub target: Option<String>,
    pub body: Option<String>,
    pub headers: HashMap<String, Vec<String>>,
    pub cookies: HashMap<String, String>,
    pub success: bool,
    pub used_protocol: String,
}
