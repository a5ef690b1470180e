//! TCP click ingress.
//!
//! Line-framed: each line is one participant id, each response line is
//! `accepted` or `rejected <reason>`. Framing errors (overlong lines, bad
//! utf-8) and disconnects stay inside this adapter.

use clickrush::{ClickOutcome, CoordinatorHandle, ParticipantId};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Longest participant id line the codec will buffer.
const MAX_LINE_LENGTH: usize = 512;

/// Accept loop. Each connection gets its own task; none of them ever touch
/// engine state directly.
pub async fn serve(listener: TcpListener, coordinator: CoordinatorHandle, cancel: CancellationToken) {
    info!(addr = ?listener.local_addr().ok(), "tcp click ingress listening");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(%peer, "client connected");
                    let coordinator = coordinator.clone();
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, coordinator, cancel).await {
                            debug!(%peer, error = %e, "connection closed with error");
                        }
                        debug!(%peer, "client disconnected");
                    });
                }
                Err(e) => warn!(error = %e, "accept failed"),
            },
        }
    }
    info!("tcp click ingress stopped");
}

async fn handle_connection(
    stream: TcpStream,
    coordinator: CoordinatorHandle,
    cancel: CancellationToken,
) -> Result<(), LinesCodecError> {
    let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            line = framed.next() => match line {
                None => break,
                // Malformed framing never reaches validation; drop the peer
                Some(Err(e)) => return Err(e),
                Some(Ok(line)) => {
                    let reply = handle_line(line.trim(), &coordinator).await;
                    framed.send(reply).await?;
                }
            },
        }
    }
    Ok(())
}

/// The arrival stamp is taken here, when the line is read, not when the
/// coordinator gets around to the request.
async fn handle_line(line: &str, coordinator: &CoordinatorHandle) -> String {
    if line.is_empty() {
        return "rejected empty_participant_id".to_string();
    }
    let id = ParticipantId::new(line);
    match coordinator.submit_click(&id).await {
        Ok(ClickOutcome::Accepted) => "accepted".to_string(),
        Ok(ClickOutcome::Rejected(reason)) => format!("rejected {reason}"),
        Err(e) => {
            warn!(participant = %id, error = %e, "click submission failed");
            format!("error {e}")
        }
    }
}
