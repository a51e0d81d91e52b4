use waystone::config::Config;
use waystone::routing::{HandlerKind, ResponsePacket};
use waystone::server::{Server, listener};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = match std::env::args().nth(1) {
        Some(path) => Config::from_file(path)?,
        None => Config::load(),
    };

    let server = Server::builder(cfg)
        // demo host: every client is authorized and never expires
        .on_request(|session, _request| {
            session.authorized = true;
            session.touch();
        })
        .route("post", "/demo/redirect", HandlerKind::Authenticated, |_, _| {
            ResponsePacket::redirect("/demo/clicked")
        })?
        .build()?;

    tokio::select! {
        res = listener::run_tcp(server) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
