use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::gateway::Gateway;
use crate::http::connection::Connection;

/// Accept loop: one spawned task per client connection.
pub async fn run(listen_addr: &str, gateway: Arc<Gateway>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(listen_addr).await?;
    info!("listening on {}", listen_addr);

    loop {
        let (socket, peer) = listener.accept().await?;
        tracing::debug!("accepted connection from {}", peer);

        let gateway = gateway.clone();
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, gateway);
            if let Err(e) = conn.run().await {
                tracing::error!("connection error from {}: {:#}", peer, e);
            }
        });
    }
}
