// Manager session authentication
//
// Form login against the servlet security endpoint. The manager answers
// with a `JSESSIONID` cookie, possibly on a redirect hop before the final
// page; the session jar collects it and sends it on every later request.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::error::Error;
use crate::manager::client::{ManagerClient, SESSION_COOKIE, preview};

pub const LOGIN_PATH: &str = "/j_security_check";
pub const LOGOUT_PATH: &str = "/logout";

impl ManagerClient {
    /// Authenticate with username/password.
    ///
    /// `POST /j_security_check` with form fields `j_username` and
    /// `j_password`. Redirects are followed. Succeeds only when the final
    /// response is `200 OK` and the jar then holds a `JSESSIONID` cookie
    /// for the base URL. On failure the jar is emptied again.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.endpoint_url(LOGIN_PATH)?;
        debug!(username, "logging in at {}", url);

        let form = [
            ("j_username", username),
            ("j_password", password.expose_secret()),
        ];

        let resp = self.http().post(url).form(&form).send().await?;

        let status = resp.status();
        let failure = if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            Some(format!("login failed (HTTP {status}): {}", preview(&body)))
        } else if !self.is_authenticated() {
            Some(format!("login response did not set {SESSION_COOKIE}"))
        } else {
            None
        };

        if let Some(message) = failure {
            self.reset_session()?;
            return Err(Error::Authentication { message });
        }

        debug!("login successful");
        Ok(())
    }

    /// End the current session.
    ///
    /// `GET /logout`. The jar is replaced with an empty one whether or not
    /// the manager acknowledges.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.endpoint_url(LOGOUT_PATH)?;
        debug!("logging out at {}", url);

        let result = self.http().get(url).send().await;
        self.reset_session()?;

        let resp = result?;
        debug!(status = %resp.status(), "logout complete");
        Ok(())
    }
}
