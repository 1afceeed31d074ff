//! Remote backend: the patient JSON API over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use super::{BackendError, PatientBackend};
use crate::add_patient::PatientForm;
use crate::api::types::USER_ID_HEADER;
use crate::models::{NewPatient, Patient};

/// Per-request timeout.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Client for a PatientDesk API server.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    user_id: Option<Uuid>,
}

impl HttpBackend {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:4780`.
    pub fn new(base_url: impl Into<String>, user_id: Option<Uuid>) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl PatientBackend for HttpBackend {
    async fn list_patients(&self) -> Result<Vec<Patient>, BackendError> {
        let response = self.client.get(self.url("/api/patients")).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn insert_patient(&self, patient: NewPatient) -> Result<Patient, BackendError> {
        let mut request = self
            .client
            .post(self.url("/api/patients"))
            .json(&PatientForm::from(&patient));
        if let Some(owner) = patient.uuid {
            request = request.header(USER_ID_HEADER, owner.to_string());
        }

        let response = check_status(request.send().await?).await?;
        Ok(response.json().await?)
    }

    fn current_user_id(&self) -> Option<Uuid> {
        self.user_id
    }
}

/// Turn non-2xx responses into `BackendError::Status`, keeping the server's
/// error message when the body carries one.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(body);

    Err(BackendError::Status {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let backend = HttpBackend::new("http://127.0.0.1:4780/", None).unwrap();
        assert_eq!(backend.url("/api/patients"), "http://127.0.0.1:4780/api/patients");
    }

    #[test]
    fn reports_configured_user() {
        let user = Uuid::new_v4();
        let backend = HttpBackend::new("http://localhost", Some(user)).unwrap();
        assert_eq!(backend.current_user_id(), Some(user));
    }

    #[tokio::test]
    async fn unreachable_server_is_http_error() {
        // Reserve a port, then release it so nothing is listening
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let backend = HttpBackend::new(format!("http://127.0.0.1:{port}"), None).unwrap();
        let err = backend.list_patients().await.unwrap_err();
        assert!(matches!(err, BackendError::Http(_)));
    }
}
