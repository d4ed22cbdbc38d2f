//! Per-subscriber stream task.
use std::io::{BufRead, BufReader};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Sender, select, unbounded};
use log::{debug, error, info};
use quote_common::QuoteError;
use quote_common::net::write_line;

use crate::broadcaster::Subscription;

/// Forwards broadcast messages from `subscription` to the subscriber's socket.
///
/// The task terminates when either:
/// - the subscriber closes its side of the connection (detected by a watcher
///   thread reading from a clone of the socket), or
/// - the broadcaster side of the subscription is gone, or
/// - a write to the socket fails, including a write that stays blocked for
///   longer than `write_timeout` because the subscriber stopped reading.
///
/// Returning drops `subscription`, which removes it from the broadcaster.
pub fn handle_client_stream(
    mut socket: TcpStream,
    subscription: Subscription,
    write_timeout: Duration,
) -> Result<(), QuoteError> {
    let peer = socket.peer_addr()?;
    socket.set_write_timeout(Some(write_timeout))?;
    let data_rx = subscription.receiver();
    let (stop_tx, stop_rx) = unbounded::<()>();
    let watcher_socket = socket.try_clone()?;
    thread::spawn(move || watch_disconnect(watcher_socket, peer, stop_tx));

    loop {
        select! {
            recv(stop_rx) -> _ => {
                info!("Subscriber {} disconnected", peer);
                break;
            },
            recv(data_rx) -> msg => match msg {
                Ok(message) => {
                    if let Err(e) = write_line(&mut socket, &message) {
                        error!(
                            "Failed to deliver {} {} to {}: {}",
                            message.kind, message.target_id, peer, e
                        );
                        break;
                    }
                    debug!("Delivered {} {} to {}", message.kind, message.target_id, peer);
                },
                Err(e) => {
                    debug!("Broadcast channel closed for {}: {}", peer, e);
                    break;
                },
            }
        }
    }
    let _ = socket.shutdown(Shutdown::Both);
    Ok(())
}

/// Blocks until the subscriber sends EOF or the socket errors, then signals `stop_tx`.
///
/// Subscribers are not expected to send anything after `SUBSCRIBE`; any extra
/// input is ignored.
fn watch_disconnect(socket: TcpStream, peer: SocketAddr, stop_tx: Sender<()>) {
    let mut reader = BufReader::new(socket);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => debug!("Ignoring input from subscriber {}", peer),
            Err(e) => {
                debug!("Subscriber {} read error: {}", peer, e);
                break;
            }
        }
    }
    let _ = stop_tx.send(());
}
