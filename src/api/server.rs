//! API server lifecycle: bind, spawn the axum server in a background
//! task, return a handle with a shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::api::router::patient_api_router;
use crate::core_state::CoreState;

/// Session metadata for a running API server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSession {
    pub session_id: String,
    pub server_addr: String,
    pub port: u16,
    pub started_at: String,
}

impl ApiSession {
    /// Base URL suitable for `HttpBackend::new`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.server_addr)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind API server on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to get server address: {0}")]
    LocalAddr(#[source] std::io::Error),
}

/// Handle to a running API server.
pub struct ApiServer {
    pub session: ApiSession,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ApiServer {
    /// Signal graceful shutdown. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Signal shutdown and wait for in-flight requests to drain.
    pub async fn stop(mut self) {
        self.shutdown();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("API server task failed: {e}");
            }
        }
    }
}

/// Start the API server on `addr`. Port 0 picks an ephemeral port; the
/// bound port is reported in `ApiServer::session`.
pub async fn start_api_server(
    core: Arc<CoreState>,
    addr: SocketAddr,
) -> Result<ApiServer, ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    let addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

    let app = patient_api_router(core);

    let session = ApiSession {
        session_id: Uuid::new_v4().to_string(),
        server_addr: addr.to_string(),
        port: addr.port(),
        started_at: chrono::Utc::now().to_rfc3339(),
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        session,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    use crate::add_patient::{AddPatientController, PatientForm, SubmitOutcome};
    use crate::backend::{HttpBackend, PatientBackend};
    use crate::store::PatientStore;

    fn localhost() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    async fn start_test_server() -> ApiServer {
        let core = Arc::new(CoreState::in_memory().unwrap());
        start_api_server(core, localhost())
            .await
            .expect("server should start")
    }

    fn intake(first: &str, last: &str, email: &str) -> PatientForm {
        PatientForm {
            first_name: first.into(),
            last_name: last.into(),
            birth_date: "1990-02-09".into(),
            email: email.into(),
            phone: "0771234567".into(),
            address_line_1: "12 Galle Road".into(),
            address_line_2: String::new(),
            address_city: "Colombo".into(),
            zipcode: "00300".into(),
            gender: "Female".into(),
        }
    }

    #[tokio::test]
    async fn start_and_stop_server() {
        let server = start_test_server().await;
        assert!(!server.session.session_id.is_empty());
        assert!(server.session.port > 0);

        let url = format!("{}/api/health", server.session.base_url());
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        drop(resp);

        server.stop().await;
        assert!(reqwest::get(&url).await.is_err());
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let mut server = start_test_server().await;
        server.shutdown();
        server.shutdown();
        server.stop().await;
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let server = start_test_server().await;
        let taken: SocketAddr = server.session.server_addr.parse().unwrap();

        let core = Arc::new(CoreState::in_memory().unwrap());
        let err = start_api_server(core, taken).await.err().unwrap();
        assert!(matches!(err, ServerError::Bind { .. }));

        server.stop().await;
    }

    #[tokio::test]
    async fn http_backend_surfaces_server_validation_message() {
        let server = start_test_server().await;
        let backend = HttpBackend::new(server.session.base_url(), None).unwrap();

        let bad = crate::models::NewPatient {
            uuid: None,
            first_name: "   ".into(),
            last_name: "Mendis".into(),
            email: "kusal@cricket.lk".into(),
            birth_date: chrono::NaiveDate::from_ymd_opt(1995, 2, 2).unwrap(),
            phone: "0771234567".into(),
            address_line_1: "1 Main St".into(),
            address_line_2: None,
            address_city: "Colombo".into(),
            zipcode: "00100".into(),
            gender: crate::models::Gender::Male,
            is_active: true,
        };
        let err = backend.insert_patient(bad).await.unwrap_err();
        assert!(matches!(
            err,
            crate::backend::BackendError::Status { status: 400, .. }
        ));

        server.stop().await;
    }

    #[tokio::test]
    async fn end_to_end_add_and_search() {
        let server = start_test_server().await;
        let owner = Uuid::new_v4();
        let backend: Arc<dyn PatientBackend> =
            Arc::new(HttpBackend::new(server.session.base_url(), Some(owner)).unwrap());
        let store = Arc::new(PatientStore::new(backend.clone()));
        let controller = AddPatientController::new(backend, store.clone());

        store.load().await;
        assert!(store.all_patients().is_empty());

        for (first, last, email) in [
            ("Chamari", "Athapaththu", "chamari@gmail.com"),
            ("Kusal", "Mendis", "kusal@cricket.lk"),
            ("Angelo", "Mathews", "angelo@gmail.com"),
        ] {
            controller.open();
            let outcome = controller.submit(intake(first, last, email)).await;
            let SubmitOutcome::Added(patient) = outcome else {
                panic!("expected {first} to be added");
            };
            assert_eq!(patient.uuid, Some(owner));
        }

        let names: Vec<String> = store.all_patients().iter().map(|p| p.full_name()).collect();
        assert_eq!(names, ["Angelo Mathews", "Kusal Mendis", "Chamari Athapaththu"]);

        store.set_query("gmail");
        let names: Vec<String> = store
            .visible_patients()
            .iter()
            .map(|p| p.full_name())
            .collect();
        assert_eq!(names, ["Angelo Mathews", "Chamari Athapaththu"]);

        store.set_query("kusal");
        assert_eq!(store.visible_patients().len(), 1);

        store.refresh().await;
        assert_eq!(store.query(), "kusal");
        assert_eq!(store.visible_patients()[0].full_name(), "Kusal Mendis");

        server.stop().await;
    }
}
