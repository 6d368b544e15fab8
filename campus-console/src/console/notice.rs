//! Transient notifications shown after mutating operations.
//!
//! A notice rendered in the same response needs nothing special. A notice
//! that has to survive a redirect travels in the `notice` cookie and is
//! removed the first time a page renders it.

use crate::console::middleware::{CookieStorage, NOTICE_COOKIE};
use axum_extra::extract::cookie::CookieJar;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// Cookie-safe encoding: base64url of the JSON form.
    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(value: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(value).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

/// Queue `notice` for the next page the browser loads.
pub fn flash(storage: &CookieStorage, notice: &Notice) {
    let cookie = storage.build_cookie(NOTICE_COOKIE, &notice.encode());
    storage.update(|jar| jar.add(cookie));
}

/// Take the pending notice, if any, removing it from the jar.
pub fn take(storage: &CookieStorage) -> Option<Notice> {
    let jar: CookieJar = storage.jar();
    let raw = jar.get(NOTICE_COOKIE)?.value().to_string();
    storage.update(|jar| jar.remove(CookieStorage::removal_cookie(NOTICE_COOKIE)));
    let notice = Notice::decode(&raw);
    if notice.is_none() {
        debug!("Dropping undecodable notice cookie");
    }
    notice
}
