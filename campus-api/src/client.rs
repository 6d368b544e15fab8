//! HTTP clients for the campus backend.
//!
//! [`ClientFactory`] owns the shared connection pool and base URL and hands
//! out two kinds of client:
//! - [`PublicClient`]: login and signup, no credentials attached
//! - [`AuthedClient`]: everything else, bearer token from the session
//!
//! An authenticated request that comes back 401 clears the session before
//! the error is returned to the caller.

use crate::models::{
    AuthResponse, Course, CourseInput, Credentials, Envelope, ErrorBody, SignupRequest, User,
    UserInput,
};
use crate::session::SessionContext;
use crate::{Error, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use reqwest::{Client, IntoUrl, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, warn};

/// API base of a backend running locally with its default port.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api/";

const SUCCESS: &str = "success";

/// Value of the `Authorization` header for an optional token.
///
/// With no token the header carries the literal `Bearer null` unless the
/// placeholder is disabled, in which case no header is sent.
pub fn bearer_value(token: Option<&str>, send_placeholder: bool) -> Option<String> {
    match token {
        Some(token) => Some(format!("Bearer {token}")),
        None if send_placeholder => Some("Bearer null".to_string()),
        None => None,
    }
}

/// Builds the public and authenticated clients against one API base.
#[derive(Clone, Debug)]
pub struct ClientFactory {
    http: Client,
    base_url: Url,
    send_placeholder_bearer: bool,
}

impl ClientFactory {
    pub fn new<T: IntoUrl>(base_url: T) -> Result<Self> {
        Self::builder(base_url).build()
    }

    pub fn builder<T: IntoUrl>(base_url: T) -> ClientFactoryBuilder {
        ClientFactoryBuilder {
            base_url: base_url.into_url().map_err(Error::from),
            send_placeholder_bearer: true,
            timeout: None,
            user_agent: concat!("campus-api/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Client for login and signup.
    pub fn public(&self) -> PublicClient {
        PublicClient {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
        }
    }

    /// Client that authenticates as whoever `session` currently holds.
    pub fn authed(&self, session: &SessionContext) -> AuthedClient {
        AuthedClient {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            session: session.clone(),
            send_placeholder_bearer: self.send_placeholder_bearer,
        }
    }
}

pub struct ClientFactoryBuilder {
    base_url: Result<Url>,
    send_placeholder_bearer: bool,
    timeout: Option<Duration>,
    user_agent: String,
}

impl ClientFactoryBuilder {
    /// Send `Bearer null` when there is no session (default), or omit the header.
    pub fn send_placeholder_bearer(mut self, enabled: bool) -> Self {
        self.send_placeholder_bearer = enabled;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent<S: ToString>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn build(self) -> Result<ClientFactory> {
        let mut base_url = self.base_url?;
        // Url::join drops the last segment unless the base ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = Client::builder().user_agent(self.user_agent);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(ClientFactory {
            http: builder.build()?,
            base_url,
            send_placeholder_bearer: self.send_placeholder_bearer,
        })
    }
}

fn endpoint(base_url: &Url, path: &str) -> Result<Url> {
    base_url
        .join(path)
        .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
}

fn json_request(http: &Client, method: Method, url: Url) -> RequestBuilder {
    http.request(method, url)
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .header(ACCEPT, HeaderValue::from_static("application/json"))
}

/// Pull the backend's `{message}` out of an error response.
async fn error_message(resp: Response) -> String {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        })
}

/// Decode `{status, data}` and insist on `status == "success"`.
async fn success_data<T: DeserializeOwned>(resp: Response) -> Result<Option<T>> {
    let envelope: Envelope<T> = resp.json().await?;
    if envelope.status == SUCCESS {
        Ok(envelope.data)
    } else {
        Err(Error::Rejected(envelope.status))
    }
}

/// Unauthenticated client: login and signup only.
#[derive(Clone, Debug)]
pub struct PublicClient {
    http: Client,
    base_url: Url,
}

impl PublicClient {
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        self.authenticate("users/login", credentials).await
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse> {
        self.authenticate("users/signup", request).await
    }

    async fn authenticate<B: Serialize>(&self, path: &str, body: &B) -> Result<AuthResponse> {
        let url = endpoint(&self.base_url, path)?;
        let resp = json_request(&self.http, Method::POST, url)
            .json(body)
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            let auth: AuthResponse = resp.json().await?;
            if auth.status == SUCCESS {
                debug!(role = %auth.role, "Authenticated via {path}");
                Ok(auth)
            } else {
                Err(Error::Rejected(auth.status))
            }
        } else {
            let message = error_message(resp).await;
            warn!("{path} failed: {status} - {message}");
            if status == StatusCode::UNAUTHORIZED {
                Err(Error::Unauthorized { message })
            } else {
                Err(Error::Api { status, message })
            }
        }
    }
}

/// Client that attaches the session's bearer token to every request.
#[derive(Clone, Debug)]
pub struct AuthedClient {
    http: Client,
    base_url: Url,
    session: SessionContext,
    send_placeholder_bearer: bool,
}

impl AuthedClient {
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request_builder = json_request(&self.http, method, url);
        let token = self.session.token();
        match bearer_value(token.as_deref(), self.send_placeholder_bearer) {
            Some(value) => request_builder.header(AUTHORIZATION, value),
            None => request_builder,
        }
    }

    /// Send a request and map non-2xx responses to errors.
    ///
    /// A 401 clears the session as a side effect.
    async fn send(&self, method: Method, path: &str, body: Option<&impl Serialize>) -> Result<Response> {
        let url = endpoint(&self.base_url, path)?;
        let mut req = self.request(method.clone(), url);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let message = error_message(resp).await;
        if status == StatusCode::UNAUTHORIZED {
            warn!("{method} {path} rejected credentials, clearing session");
            self.session.set_session(None);
            Err(Error::Unauthorized { message })
        } else {
            error!("{method} {path} failed: {status} - {message}");
            Err(Error::Api { status, message })
        }
    }

    async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.send(Method::GET, path, None::<&()>).await?;
        success_data::<T>(resp)
            .await?
            .ok_or_else(|| Error::Rejected("missing data".to_string()))
    }

    async fn mutate(&self, method: Method, path: &str, body: Option<&impl Serialize>) -> Result<()> {
        let resp = self.send(method, path, body).await?;
        success_data::<serde_json::Value>(resp).await?;
        Ok(())
    }

    /// The user the session belongs to.
    pub async fn get_me(&self) -> Result<User> {
        self.get_data("users/getMe").await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.get_data("users").await
    }

    pub async fn create_user(&self, user: &UserInput) -> Result<()> {
        self.mutate(Method::POST, "users", Some(user)).await
    }

    pub async fn update_user(&self, id: &str, user: &UserInput) -> Result<()> {
        let path = format!("users/{}", urlencoding::encode(id));
        self.mutate(Method::PUT, &path, Some(user)).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<()> {
        let path = format!("users/{}", urlencoding::encode(id));
        self.mutate(Method::DELETE, &path, None::<&()>).await
    }

    pub async fn list_courses(&self) -> Result<Vec<Course>> {
        self.get_data("courses").await
    }

    pub async fn create_course(&self, course: &CourseInput) -> Result<()> {
        self.mutate(Method::POST, "courses", Some(course)).await
    }

    pub async fn update_course(&self, id: &str, course: &CourseInput) -> Result<()> {
        let path = format!("courses/{}", urlencoding::encode(id));
        self.mutate(Method::PUT, &path, Some(course)).await
    }

    pub async fn delete_course(&self, id: &str) -> Result<()> {
        let path = format!("courses/{}", urlencoding::encode(id));
        self.mutate(Method::DELETE, &path, None::<&()>).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_value() {
        assert_eq!(bearer_value(Some("T1"), true).as_deref(), Some("Bearer T1"));
        assert_eq!(bearer_value(Some("T1"), false).as_deref(), Some("Bearer T1"));
        assert_eq!(bearer_value(None, true).as_deref(), Some("Bearer null"));
        assert_eq!(bearer_value(None, false), None);
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let factory = ClientFactory::new("http://localhost:5000/api").unwrap();
        assert_eq!(factory.base_url().as_str(), "http://localhost:5000/api/");
        let url = endpoint(factory.base_url(), "users/login").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/users/login");
    }

    #[test]
    fn test_endpoint_encodes_ids() {
        let factory = ClientFactory::new(DEFAULT_BASE_URL).unwrap();
        let path = format!("courses/{}", urlencoding::encode("a/b"));
        let url = endpoint(factory.base_url(), &path).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/courses/a%2Fb");
    }
}
