//! One simulated actor's HTTP session against the marketplace.
//!
//! Holds a cookie-backed `reqwest::Client`, the application URL and the
//! anti-forgery token issued after login. A session belongs to a single
//! actor's sequential case stream; only bootstrap calls take `&mut self`.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;
use zeroize::Zeroizing;

use crate::config::TargetConfig;
use crate::error::{body_excerpt, CaseError, SessionError};
use crate::request::{LoginRequest, Operation};

/// Account credentials. The password is wiped on drop.
#[derive(Clone)]
pub struct Credentials {
    pub account_name: String,
    pub password: Zeroizing<String>,
}

impl Credentials {
    pub fn new(account_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            account_name: account_name.into(),
            password: Zeroizing::new(password.into()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("account_name", &self.account_name)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// User returned by a successful `POST /login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginUser {
    pub id: i64,
    pub account_name: String,
}

/// Subset of `GET /settings` the session needs.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub csrf_token: String,
    #[serde(default)]
    pub user: Option<LoginUser>,
}

/// A fully read response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// HTTP session for one simulated actor.
///
/// Not `Clone`: the cookie jar lives inside the client, and a copy would
/// share it with the original.
#[derive(Debug)]
pub struct Session {
    http: reqwest::Client,
    app_url: Url,
    csrf_token: Option<String>,
    user: Option<LoginUser>,
}

impl Session {
    /// Create a fresh, logged-out session.
    pub fn new(config: &TargetConfig) -> Result<Self, SessionError> {
        let agent = HeaderValue::from_str(&config.user_agent).map_err(|e| {
            SessionError::InvalidHeader {
                header: "user-agent",
                value: config.user_agent.clone(),
                reason: e.to_string(),
            }
        })?;
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, agent);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(true)
            .default_headers(headers)
            .build()
            .map_err(|e| SessionError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            app_url: config.app_url.clone(),
            csrf_token: None,
            user: None,
        })
    }

    pub fn app_url(&self) -> &Url {
        &self.app_url
    }

    /// The anti-forgery token issued to this session, if logged in.
    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    pub fn set_csrf_token(&mut self, token: impl Into<String>) {
        self.csrf_token = Some(token.into());
    }

    pub fn clear_csrf_token(&mut self) {
        self.csrf_token = None;
    }

    /// The logged-in user, if any.
    pub fn user(&self) -> Option<&LoginUser> {
        self.user.as_ref()
    }

    /// The session's token, or the error for a case that needs one.
    pub fn require_csrf_token(&self, operation: Operation) -> Result<&str, CaseError> {
        self.csrf_token()
            .ok_or(CaseError::MissingCsrfToken { operation })
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.app_url.as_str().trim_end_matches('/'), path)
    }

    /// POST a JSON body and read the whole response.
    ///
    /// The response body is consumed here exactly once; callers only ever
    /// see the buffered bytes.
    pub async fn post_json(
        &self,
        path: &str,
        body: Vec<u8>,
    ) -> Result<RawResponse, reqwest::Error> {
        let resp = self
            .http
            .post(self.endpoint_url(path))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?.to_vec();
        Ok(RawResponse { status, body })
    }

    /// Log in and keep the session cookie. Clears any previous token.
    ///
    /// Calls `POST {app_url}/login`.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<LoginUser, SessionError> {
        let endpoint = Operation::Login.endpoint();
        self.csrf_token = None;
        self.user = None;

        let req = LoginRequest {
            account_name: credentials.account_name.clone(),
            password: credentials.password.as_str().to_owned(),
        };
        let resp = self
            .http
            .post(self.endpoint_url(Operation::Login.path()))
            .json(&req)
            .send()
            .await
            .map_err(|e| SessionError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.bytes().await.map(|b| body_excerpt(&b)).unwrap_or_default();
            return Err(SessionError::Api {
                endpoint: endpoint.into(),
                status,
                body,
            });
        }

        let user: LoginUser = resp
            .json()
            .await
            .map_err(|e| SessionError::Deserialization {
                endpoint: endpoint.into(),
                source: e,
            })?;
        tracing::debug!(user_id = user.id, account = %user.account_name, "logged in");
        self.user = Some(user.clone());
        Ok(user)
    }

    /// Fetch the current anti-forgery token and store it on the session.
    ///
    /// Calls `GET {app_url}/settings`.
    pub async fn refresh_csrf_token(&mut self) -> Result<&str, SessionError> {
        let endpoint = "GET /settings";
        let resp = self
            .http
            .get(self.endpoint_url("/settings"))
            .send()
            .await
            .map_err(|e| SessionError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.bytes().await.map(|b| body_excerpt(&b)).unwrap_or_default();
            return Err(SessionError::Api {
                endpoint: endpoint.into(),
                status,
                body,
            });
        }

        let settings: Settings = resp
            .json()
            .await
            .map_err(|e| SessionError::Deserialization {
                endpoint: endpoint.into(),
                source: e,
            })?;
        if settings.csrf_token.is_empty() {
            self.csrf_token = None;
            return Err(SessionError::NotLoggedIn {
                endpoint: endpoint.into(),
            });
        }
        if let Some(user) = settings.user {
            self.user = Some(user);
        }
        Ok(self.csrf_token.insert(settings.csrf_token).as_str())
    }

    /// Log in, then obtain the anti-forgery token.
    pub async fn bootstrap(
        &mut self,
        credentials: &Credentials,
    ) -> Result<LoginUser, SessionError> {
        let user = self.login(credentials).await?;
        self.refresh_csrf_token().await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(&TargetConfig::local(18080).unwrap()).unwrap()
    }

    #[test]
    fn new_session_is_logged_out() {
        let s = session();
        assert!(s.csrf_token().is_none());
        assert!(s.user().is_none());
        assert!(matches!(
            s.require_csrf_token(Operation::Sell),
            Err(CaseError::MissingCsrfToken {
                operation: Operation::Sell
            })
        ));
    }

    #[test]
    fn set_and_clear_token() {
        let mut s = session();
        s.set_csrf_token("abc");
        assert_eq!(s.require_csrf_token(Operation::Buy).unwrap(), "abc");
        s.clear_csrf_token();
        assert!(s.csrf_token().is_none());
    }

    #[test]
    fn endpoint_url_keeps_base_path_prefix() {
        let mut cfg = TargetConfig::local(18080).unwrap();
        cfg.app_url = "http://market.test/app/".parse().unwrap();
        let s = Session::new(&cfg).unwrap();
        assert_eq!(s.endpoint_url("/sell"), "http://market.test/app/sell");
    }

    #[test]
    fn control_characters_in_user_agent_are_rejected() {
        let mut cfg = TargetConfig::local(18080).unwrap();
        cfg.user_agent = "marketbench\nX-Injected: 1".into();
        let err = Session::new(&cfg).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidHeader {
                header: "user-agent",
                ..
            }
        ));
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = Credentials::new("alice", "correct-pw");
        let debug = format!("{creds:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("correct-pw"));
    }
}
