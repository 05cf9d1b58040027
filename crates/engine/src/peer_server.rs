use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use swarmd_store::EntryStore;
use swarmd_wire::chunk::{self, ChunkRequest};

use crate::error::Result;
use crate::piece_reader::PieceReader;

/// Listens for chunk-request packets and serves them from the entry's
/// assembled output tree via the piece reader (spec.md §4.9).
pub struct PeerServer {
    socket: UdpSocket,
    store: Arc<EntryStore>,
}

impl PeerServer {
    pub async fn bind(addr: SocketAddr, store: Arc<EntryStore>) -> Result<Self> {
        Ok(Self {
            socket: UdpSocket::bind(addr).await?,
            store,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Single receive loop, dispatched per-request; requests are served
    /// serially (spec.md §4.9 — "serialization allowed; no cross-request
    /// state").
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        loop {
            let (request, from) = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                r = chunk::recv_request(&self.socket) => match r {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "dropping malformed chunk request");
                        continue;
                    }
                },
            };
            if let Err(e) = self.serve(request, from).await {
                warn!(%from, error = %e, "failed to serve chunk request");
            }
        }
    }

    async fn serve(&self, request: ChunkRequest, from: SocketAddr) -> Result<()> {
        let Some(entry) = self.store.get(&request.info_hash)? else {
            warn!(info_hash = %request.info_hash, "chunk request for unknown entry");
            return Ok(());
        };
        let reader = PieceReader::new(
            &entry.descriptor.files,
            entry.descriptor.piece_length,
            &entry.out_path,
        );
        let bytes = reader.read_piece(request.chunk_id as u32)?;
        chunk::send_reply(&self.socket, from, &bytes).await?;
        Ok(())
    }
}
