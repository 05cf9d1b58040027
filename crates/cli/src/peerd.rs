use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span};

use swarmd_core::peer::{peer_id_from_str, PeerAddr};
use swarmd_core::spawn_utils::spawn_with_cancel;
use swarmd_engine::announce_client::AnnounceClient;
use swarmd_engine::announce_loop::AnnounceLoop;
use swarmd_engine::peer_server::PeerServer;
use swarmd_engine::state::{Driver, DriverConfig};
use swarmd_store::EntryStore;

use crate::config::Config;

/// Runs the peer daemon: the announce loop, the public chunk server, and
/// one state-machine driver per entry already admitted into the store
/// (spec.md §5's task set, minus the out-of-scope local management task).
pub async fn run(config: Config, cancel: CancellationToken) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.tmp_path)
        .with_context(|| format!("creating tmp path {}", config.tmp_path.display()))?;

    let store = Arc::new(EntryStore::open(&config.db_path).context("opening entry store")?);
    let peer_id = peer_id_from_str(&config.peer_id).context("invalid peer id")?;
    let public_addr = PeerAddr::new(*config.public_addr.ip(), config.public_addr.port());

    let peer_server = PeerServer::bind(SocketAddr::V4(config.public_addr), store.clone())
        .await
        .context("binding public chunk server")?;
    info!(addr = %peer_server.local_addr()?, "public chunk server listening");
    spawn_with_cancel(info_span!("peer_server"), cancel.clone(), {
        let cancel = cancel.clone();
        async move { Ok(peer_server.run(cancel).await?) }
    });

    let announce_client = Arc::new(AnnounceClient::new(peer_id, std::time::Duration::from_secs(1)));
    let announce_loop = AnnounceLoop::new(
        store.clone(),
        announce_client,
        public_addr,
        config.announce_delay,
    );
    spawn_with_cancel(info_span!("announce_loop"), cancel.clone(), {
        let cancel = cancel.clone();
        async move { Ok(announce_loop.run(cancel).await?) }
    });

    for entry in store.all().context("listing entries")? {
        let info_hash = entry.info_hash();
        let driver = Driver::new(
            store.clone(),
            info_hash,
            DriverConfig {
                tmp_path: config.tmp_path.clone(),
                ..Default::default()
            },
        );
        spawn_with_cancel(
            info_span!("driver", info_hash = %info_hash),
            cancel.clone(),
            {
                let cancel = cancel.clone();
                async move { Ok(driver.run(cancel).await?) }
            },
        );
    }

    cancel.cancelled().await;
    store.close().context("closing entry store")?;
    Ok(())
}
