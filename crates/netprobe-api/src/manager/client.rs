// Manager HTTP client
//
// Wraps `reqwest::Client` with manager-specific URL construction and
// session cookie handling. Endpoint groups (auth, devices) are inherent
// methods in sibling files so this module stays about transport mechanics.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use reqwest::StatusCode;
use reqwest::cookie::{CookieStore, Jar};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Name of the cookie the manager issues on successful login.
pub const SESSION_COOKIE: &str = "JSESSIONID";

/// An HTTP client bound to its own cookie jar.
struct Session {
    http: reqwest::Client,
    jar: Arc<Jar>,
}

impl Session {
    fn open(transport: &TransportConfig) -> Result<Self, Error> {
        let transport = transport.clone().with_cookie_jar();
        let http = transport.build_client()?;
        let jar = transport.cookie_jar.unwrap_or_default();
        Ok(Self { http, jar })
    }
}

/// Raw HTTP client for the SD-WAN Manager REST API.
///
/// One instance is one session. Cookies set by the manager, including
/// those set on redirect hops during login, land in the session's jar and
/// ride along on every later request. `logout` swaps in an empty jar.
pub struct ManagerClient {
    transport: TransportConfig,
    base_url: Url,
    session: RwLock<Session>,
}

impl ManagerClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the manager root, e.g. `https://sandbox-sdwan-2.cisco.com`.
    /// A path prefix such as `https://gw.example.com/vmanage` is kept on
    /// every request.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let session = Session::open(transport)?;
        Ok(Self {
            transport: transport.clone(),
            base_url,
            session: RwLock::new(session),
        })
    }

    /// The HTTP client of the current session.
    pub fn http(&self) -> reqwest::Client {
        self.read_session().http.clone()
    }

    /// The manager base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether the jar holds a session cookie for the manager.
    pub fn is_authenticated(&self) -> bool {
        let jar = Arc::clone(&self.read_session().jar);
        jar.cookies(&self.base_url)
            .and_then(|header| {
                header.to_str().ok().map(|cookies| {
                    cookies
                        .split(';')
                        .filter_map(|pair| pair.trim().split_once('='))
                        .any(|(name, value)| name == SESSION_COOKIE && !value.is_empty())
                })
            })
            .unwrap_or(false)
    }

    // ── Session ──────────────────────────────────────────────────────

    fn read_session(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop every cookie by swapping in a fresh client and jar.
    pub(crate) fn reset_session(&self) -> Result<(), Error> {
        let fresh = Session::open(&self.transport)?;
        trace!("session reset");
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = fresh;
        Ok(())
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Append `path` to the base URL, keeping any base path prefix.
    pub(crate) fn endpoint_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Build a `/dataservice/{path}` URL.
    pub(crate) fn dataservice_url(&self, path: &str) -> Result<Url, Error> {
        self.endpoint_url(&format!("dataservice/{}", path.trim_start_matches('/')))
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// GET a `/dataservice` path, require 200, and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.dataservice_url(path)?;
        debug!("GET {}", url);

        let resp = self.http().get(url).send().await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Retrieval {
                status: status.as_u16(),
                message: preview(&body),
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}

/// First 200 bytes of a body, cut on a char boundary.
pub(crate) fn preview(body: &str) -> String {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_owned()
}
