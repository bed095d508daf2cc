//! Per-connection I/O tasks
//!
//! Each accepted TCP stream is split into a framed reader and a framed
//! writer. The reader forwards newline-delimited lines to the hub; the
//! writer drains the slot's outbound channel. When either side finishes
//! the connection is reported as disconnected and both halves wind down:
//! the hub releasing the slot drops the outbound sender, which ends the
//! writer task and closes the transport.

use futures_util::SinkExt;
use log::{debug, error};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};

use crate::hub::HubCommand;
use crate::table::ConnId;
use shared::{ServerFrame, MAX_FRAME_LEN};

/// Bridges one TCP stream and the hub for the connection's lifetime.
pub async fn handle_connection(stream: TcpStream, conn: ConnId, hub_tx: mpsc::Sender<HubCommand>) {
    let peer = match stream.peer_addr() {
        Ok(addr) => addr,
        Err(e) => {
            debug!("Connection {} lost before accept completed: {}", conn, e);
            return;
        }
    };
    let (read_half, write_half) = stream.into_split();
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<ServerFrame>();

    if hub_tx
        .send(HubCommand::Connect {
            conn,
            ip: peer.ip(),
            port: peer.port(),
            sender: frame_tx,
        })
        .await
        .is_err()
    {
        error!("Hub is gone; dropping connection from {}", peer);
        return;
    }

    let write_task = tokio::spawn(async move {
        let mut sink = FramedWrite::new(write_half, LinesCodec::new_with_max_length(MAX_FRAME_LEN));
        while let Some(frame) = frame_rx.recv().await {
            if sink.send(frame.encode()).await.is_err() {
                break;
            }
        }
    });

    let hub_tx_read = hub_tx.clone();
    let read_task = tokio::spawn(async move {
        let mut lines = FramedRead::new(read_half, LinesCodec::new_with_max_length(MAX_FRAME_LEN));
        while let Some(result) = lines.next().await {
            match result {
                Ok(line) => {
                    if hub_tx_read
                        .send(HubCommand::Inbound { conn, line })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(e) => {
                    // Oversized line or transport error - either way the
                    // connection is done.
                    debug!("Read error on connection {}: {}", conn, e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = read_task => {
            debug!("Reader finished for connection {}", conn);
        }
        _ = write_task => {
            debug!("Writer finished for connection {}", conn);
        }
    }

    let _ = hub_tx.send(HubCommand::Disconnect { conn }).await;
}
