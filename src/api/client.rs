//! Thin HTTP client over the partner REST API.
//!
//! Owns the status-code-to-error-code mapping and bearer-token injection;
//! performs no retries (adapters are single-shot by contract).

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::{ErrorCode, Failure};
use crate::store::AuthStore;

/// Error body shape the backend uses for 4xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth: Arc<AuthStore>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, auth: Arc<AuthStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            auth,
        }
    }

    /// POST a JSON body and decode a JSON response.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        require_auth: bool,
        context: &str,
    ) -> Result<T, Failure>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(path, body, require_auth, context).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| Failure::unknown(format!("{context}: malformed response ({err})")))
    }

    /// POST a JSON body, discarding any response body.
    pub async fn post_unit<B>(
        &self,
        path: &str,
        body: &B,
        require_auth: bool,
        context: &str,
    ) -> Result<(), Failure>
    where
        B: Serialize + ?Sized,
    {
        self.send(path, body, require_auth, context).await?;
        Ok(())
    }

    async fn send<B>(
        &self,
        path: &str,
        body: &B,
        require_auth: bool,
        context: &str,
    ) -> Result<reqwest::Response, Failure>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, require_auth, "api request");

        let mut request = self.http.post(&url).json(body);
        if require_auth {
            match self.auth.access_token() {
                Some(token) => request = request.bearer_auth(token),
                None => return Err(Failure::new(ErrorCode::Auth, "Sign-in required.")),
            }
        }

        let response = request
            .send()
            .await
            .map_err(|err| Failure::unknown(format!("{context}: request failed ({err})")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.json::<ApiErrorBody>().await.unwrap_or_default();
        Err(map_error(status, &body, context))
    }
}

/// Translate an HTTP error response into the taxonomy.
///
/// A recognized wire code in the body wins over the status line — the PIN
/// change endpoint reports a wrong current PIN as 401 with `ERR-IVD-VALUE`,
/// which must not be treated as an expired session.
fn map_error(status: StatusCode, body: &ApiErrorBody, context: &str) -> Failure {
    let code = body
        .code
        .as_deref()
        .map(ErrorCode::from_wire)
        .filter(|c| *c != ErrorCode::Unknown)
        .unwrap_or(match status.as_u16() {
            401 => ErrorCode::Auth,
            400 => ErrorCode::InvalidValue,
            406 => ErrorCode::AlreadyDecided,
            409 => ErrorCode::Duplicate,
            429 => ErrorCode::RateLimited,
            _ => ErrorCode::Unknown,
        });

    let message = body
        .message
        .clone()
        .unwrap_or_else(|| context.to_string());
    Failure::new(code, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(code: Option<&str>, message: Option<&str>) -> ApiErrorBody {
        ApiErrorBody {
            code: code.map(str::to_string),
            message: message.map(str::to_string),
        }
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (401, ErrorCode::Auth),
            (400, ErrorCode::InvalidValue),
            (406, ErrorCode::AlreadyDecided),
            (409, ErrorCode::Duplicate),
            (429, ErrorCode::RateLimited),
            (500, ErrorCode::Unknown),
        ];
        for (status, expected) in cases {
            let failure = map_error(
                StatusCode::from_u16(status).unwrap(),
                &body(None, None),
                "ctx",
            );
            assert_eq!(failure.code, expected, "status {status}");
        }
    }

    #[test]
    fn test_body_code_wins_over_status() {
        // 401 + ERR-IVD-VALUE is a wrong PIN, not an expired session.
        let failure = map_error(
            StatusCode::UNAUTHORIZED,
            &body(Some("ERR-IVD-VALUE"), Some("wrong pin")),
            "ctx",
        );
        assert_eq!(failure.code, ErrorCode::InvalidValue);
        assert_eq!(failure.message, "wrong pin");
    }

    #[test]
    fn test_unrecognized_body_code_falls_back_to_status() {
        let failure = map_error(
            StatusCode::NOT_ACCEPTABLE,
            &body(Some("ERR-SOMETHING-ELSE"), None),
            "decide issue",
        );
        assert_eq!(failure.code, ErrorCode::AlreadyDecided);
        assert_eq!(failure.message, "decide issue");
    }
}
