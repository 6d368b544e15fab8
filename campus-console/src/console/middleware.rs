//! Console state and cookie-backed session storage.

use crate::config::Config;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use campus_api::{ClientFactory, SessionContext, SessionStorage};
use parking_lot::Mutex;
use std::sync::Arc;

/// Cookie carrying the one-shot notification
pub const NOTICE_COOKIE: &str = "notice";

/// State shared by console routes
pub struct ConsoleState {
    /// Builds public and authenticated backend clients
    pub clients: ClientFactory,
    /// Mark cookies `Secure`
    pub secure_cookies: bool,
    /// Notification auto-dismiss delay
    pub notice_autohide_ms: u64,
    /// Currency label for prices
    pub currency: String,
    /// Landing page after signup
    pub signup_landing: String,
}

impl ConsoleState {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            clients: config.api.client_factory()?,
            secure_cookies: config.session.secure_cookies,
            notice_autohide_ms: config.ui.notice_autohide_ms,
            currency: config.ui.currency.clone(),
            signup_landing: config.ui.signup_landing.clone(),
        })
    }

    /// Session context for one browser request, initialized from its cookies.
    pub fn session(&self, jar: CookieJar) -> (SessionContext, CookieStorage) {
        let storage = CookieStorage::new(jar, self.secure_cookies);
        let session = SessionContext::load(storage.clone());
        (session, storage)
    }
}

/// The browser's cookie jar as durable session storage.
///
/// Writes accumulate in the jar; the handler returns [`CookieStorage::jar`]
/// with its response so the browser applies them.
#[derive(Clone)]
pub struct CookieStorage {
    jar: Arc<Mutex<CookieJar>>,
    secure: bool,
}

impl CookieStorage {
    pub fn new(jar: CookieJar, secure: bool) -> Self {
        Self {
            jar: Arc::new(Mutex::new(jar)),
            secure,
        }
    }

    /// Current jar, including every write made through the session.
    pub fn jar(&self) -> CookieJar {
        self.jar.lock().clone()
    }

    /// Replace the jar, e.g. after adding a notice cookie.
    pub fn update(&self, f: impl FnOnce(CookieJar) -> CookieJar) {
        let mut jar = self.jar.lock();
        *jar = f(jar.clone());
    }

    pub fn build_cookie(&self, name: &str, value: &str) -> Cookie<'static> {
        Cookie::build((name.to_string(), value.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.secure)
            .build()
    }

    pub fn removal_cookie(name: &str) -> Cookie<'static> {
        Cookie::build((name.to_string(), String::new()))
            .path("/")
            .build()
    }
}

impl SessionStorage for CookieStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.jar.lock().get(key).map(|c| c.value().to_string())
    }

    fn set(&mut self, key: &str, value: &str) {
        let cookie = self.build_cookie(key, value);
        self.update(|jar| jar.add(cookie));
    }

    fn remove(&mut self, key: &str) {
        let cookie = Self::removal_cookie(key);
        self.update(|jar| jar.remove(cookie));
    }
}
