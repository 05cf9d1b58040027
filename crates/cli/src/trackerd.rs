use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;

use swarmd_engine::tracker_server::TrackerServer;

pub struct TrackerdOpts {
    pub bind: SocketAddr,
    pub max_peer_age: Duration,
    pub read_timeout: Duration,
}

pub async fn run(opts: TrackerdOpts, cancel: CancellationToken) -> anyhow::Result<()> {
    let server = TrackerServer::bind_with_read_timeout(opts.bind, opts.max_peer_age, opts.read_timeout)
        .await
        .context("binding tracker server")?;
    info!(addr = %server.local_addr()?, "tracker server listening");
    server.run(cancel).await.context("tracker server exited")?;
    Ok(())
}
