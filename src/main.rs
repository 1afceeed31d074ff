#[tokio::main]
async fn main() {
    patientdesk_lib::init_tracing();

    if let Err(e) = patientdesk_lib::run().await {
        tracing::error!("PatientDesk failed to start: {e}");
        std::process::exit(1);
    }
}
