pub mod api;

use crate::backend::ChatBackend;
use crate::cli::Args;
use crate::gate::RequestGate;
use log::{ error, info };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

/// The chat gateway: fronts the hosted LLM for widget clients, applying the
/// security gate to every request.
pub struct Server {
    addr: String,
    backend: Arc<dyn ChatBackend>,
    gate: Arc<dyn RequestGate>,
    args: Args,
}

impl Server {
    pub fn new(
        addr: String,
        backend: Arc<dyn ChatBackend>,
        gate: Arc<dyn RequestGate>,
        args: Args
    ) -> Self {
        Self {
            addr,
            backend,
            gate,
            args,
        }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr: SocketAddr = self.addr.parse()?;
        let app = api::router(api::AppState {
            backend: Arc::clone(&self.backend),
            gate: Arc::clone(&self.gate),
        });

        if self.args.enable_tls {
            let (cert_path, key_path) = match (&self.args.tls_cert_path, &self.args.tls_key_path) {
                (Some(cert), Some(key)) => (cert.clone(), key.clone()),
                _ => {
                    error!(
                        "Both --tls-cert-path and --tls-key-path must be provided to enable TLS."
                    );
                    return Err("TLS enabled without cert/key".into());
                }
            };

            info!("HTTPS gateway listening on: https://{}", addr);
            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                cert_path,
                key_path
            ).await?;
            axum_server
                ::bind_rustls(addr, tls_config)
                .serve(app.into_make_service_with_connect_info::<SocketAddr>()).await?;
        } else {
            info!("HTTP gateway listening on: http://{}", addr);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>()
            ).await?;
        }

        Ok(())
    }
}
