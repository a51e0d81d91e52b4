use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::server::Server;
use crate::server::transport::{TcpTransport, Transport};

/// Pause after a failed accept before the slot is handed back.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Binds the configured address and serves until the process stops.
pub async fn run_tcp(server: Arc<Server>) -> anyhow::Result<()> {
    let transport = TcpTransport::bind(&server.config().listen_addr).await?;
    info!("Listening on {}", transport.local_addr()?);

    run(server, Arc::new(transport)).await
}

/// Accept loop with admission control.
///
/// At most `max_connections` tasks wait on the transport at once. Each one
/// gives its slot back as soon as a request has been received, before the
/// request is processed, so response work itself is not bounded. Returns
/// once the transport reports that it is closed.
pub async fn run<T: Transport>(server: Arc<Server>, transport: Arc<T>) -> anyhow::Result<()> {
    let admission = Arc::new(Semaphore::new(server.config().max_connections));
    let _sweeper = server.config().session_sweep().map(|(interval, max_idle)| {
        AbortOnDrop(server.sessions().spawn_sweeper(interval, max_idle))
    });

    info!(
        max_connections = server.config().max_connections,
        "Accepting connections"
    );

    while let Ok(permit) = Arc::clone(&admission).acquire_owned().await {
        let server = Arc::clone(&server);
        let transport = Arc::clone(&transport);
        let admission = Arc::clone(&admission);

        tokio::spawn(async move {
            match transport.accept().await {
                Ok(Some(ctx)) => {
                    drop(permit);
                    server.serve(ctx).await;
                }
                Ok(None) => {
                    admission.close();
                    drop(permit);
                }
                Err(e) => {
                    error!(error = %e, "Accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    drop(permit);
                }
            }
        });
    }

    info!("Transport closed");
    Ok(())
}

/// Stops a background task when the accept loop ends or is dropped.
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}
