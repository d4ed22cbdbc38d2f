//! TCP command receiver.
//!
//! Accepts client connections and serves each on its own thread, so a client
//! that sends garbage or disconnects mid-request never stops the listener or
//! affects other clients. Each connection carries one `Request` line: store
//! requests get one `Response` line back, `SUBSCRIBE` turns the connection into
//! a broadcast stream handled by [`crate::stream::handle_client_stream`].
use std::io::BufReader;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error, info, warn};
use quote_common::net::{read_line, write_line};
use quote_common::{QuoteError, Request, Response, Result};

use crate::broadcaster::Broadcaster;
use crate::store::QuoteStore;
use crate::stream::handle_client_stream;

/// How long a write to a subscriber may block before it is cut off.
pub const SUBSCRIBER_WRITE_TIMEOUT_SECS: u64 = 10;

/// TCP listener for the command protocol.
pub struct CommandReceiver {
    /// The underlying TCP listening socket.
    pub(crate) socket: TcpListener,
    /// Write timeout applied to every subscriber stream.
    pub(crate) write_timeout: Duration,
}

impl CommandReceiver {
    /// Bind a new TCP receiver to the provided `bind_addr` (e.g., `0.0.0.0:8080`).
    pub fn new(bind_addr: &str) -> Result<Self> {
        let socket = TcpListener::bind(bind_addr)?;
        Ok(Self {
            socket,
            write_timeout: Duration::from_secs(SUBSCRIBER_WRITE_TIMEOUT_SECS),
        })
    }

    /// Overrides the subscriber write timeout.
    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    /// Address actually bound, useful when binding to port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Blocking accept loop. Only fails if the listener itself cannot report
    /// its address; per-connection errors are logged and skipped.
    pub fn run(self, store: Arc<QuoteStore>, broadcaster: Arc<Broadcaster>) -> Result<()> {
        info!("Command TCP server is started on {}", self.socket.local_addr()?);

        for stream in self.socket.incoming() {
            match stream {
                Ok(stream) => {
                    let store = Arc::clone(&store);
                    let broadcaster = Arc::clone(&broadcaster);
                    let write_timeout = self.write_timeout;
                    thread::spawn(move || {
                        let peer = stream
                            .peer_addr()
                            .map(|a| a.to_string())
                            .unwrap_or_else(|_| "unknown".to_string());
                        if let Err(e) =
                            handle_connection(stream, &store, &broadcaster, write_timeout)
                        {
                            error!("Connection {} failed: {}", peer, e);
                        }
                    });
                }
                Err(e) => error!("TCP connection error: {}", e),
            }
        }
        Ok(())
    }
}

/// Serves one connection: reads its request and answers or starts streaming.
pub fn handle_connection(
    stream: TcpStream,
    store: &QuoteStore,
    broadcaster: &Broadcaster,
    write_timeout: Duration,
) -> Result<()> {
    let peer = stream.peer_addr()?;
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;

    let request: Request = match read_line(&mut reader) {
        Ok(Some(request)) => request,
        Ok(None) => {
            debug!("{} closed before sending a command", peer);
            return Ok(());
        }
        Err(e) => {
            warn!("Bad request from {}: {}", peer, e);
            return write_line(&mut writer, &Response::from_error(&e));
        }
    };
    info!("Received command {:?} from {}", request, peer);

    if let Request::Subscribe { channel } = request {
        let subscription = broadcaster.subscribe(&channel)?;
        write_line(&mut writer, &Response::Subscribed { channel })?;
        return handle_client_stream(writer, subscription, write_timeout);
    }

    let response = match dispatch(request, store) {
        Ok(response) => response,
        Err(e) => {
            debug!("Command from {} rejected: {}", peer, e);
            Response::from_error(&e)
        }
    };
    write_line(&mut writer, &response)
}

/// Runs one store request.
pub fn dispatch(request: Request, store: &QuoteStore) -> Result<Response> {
    let response = match request {
        Request::Create { name, company_id } => Response::Quote {
            quote: store.create(&name, company_id)?,
        },
        Request::Update { id, changes } => Response::Quote {
            quote: store.update(id, &changes)?,
        },
        Request::Delete { id } => {
            store.delete(id)?;
            Response::Deleted { id }
        }
        Request::List => Response::Quotes {
            quotes: store.list_ordered()?,
        },
        Request::CreateCompany { name } => Response::Company {
            company: store.create_company(&name)?,
        },
        Request::Companies => Response::Companies {
            companies: store.companies()?,
        },
        Request::Subscribe { .. } => {
            return Err(QuoteError::Protocol(
                "SUBSCRIBE must be the first command of a dedicated connection".to_string(),
            ));
        }
    };
    Ok(response)
}
