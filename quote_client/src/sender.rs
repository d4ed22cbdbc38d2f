//! Talking to the quote server over TCP.
//!
//! `CommandSender` runs one request per connection. `MessageStream` wraps a
//! subscribed connection and yields broadcast messages as they arrive.
use std::io::{BufRead, BufReader, ErrorKind};
use std::net::TcpStream;
use std::time::Duration;

use log::{debug, info};
use quote_common::net::{read_line, write_line};
use quote_common::{BroadcastMessage, QuoteError, Request, Response};

/// Read timeout on subscribed connections, so the watch loop can notice Ctrl+C.
const POLL_INTERVAL_MS: u64 = 500;

/// Helper type for sending commands to the server.
pub struct CommandSender;

impl CommandSender {
    /// Sends `request` on a fresh connection and waits for the response.
    ///
    /// `ERROR` responses are returned as `QuoteError::Remote`.
    pub fn send_command(server: &str, request: &Request) -> Result<Response, QuoteError> {
        let mut stream = TcpStream::connect(server)?;
        debug!("Sending command: {:?}", request);
        write_line(&mut stream, request)?;
        let mut reader = BufReader::new(stream);
        let response: Response = read_line(&mut reader)?
            .ok_or_else(|| QuoteError::Protocol("server closed without responding".to_string()))?;
        response.into_result()
    }

    /// Opens a subscription on `channel` and waits for the acknowledgement.
    pub fn subscribe(
        server: &str,
        channel: &str,
    ) -> Result<MessageStream<BufReader<TcpStream>>, QuoteError> {
        let mut stream = TcpStream::connect(server)?;
        write_line(&mut stream, &Request::subscribe(channel))?;
        let mut reader = BufReader::new(stream);
        match read_line::<_, Response>(&mut reader)? {
            Some(Response::Subscribed { channel }) => {
                info!("Subscribed to '{}' on {}", channel, server);
            }
            Some(other) => {
                other.into_result()?;
                return Err(QuoteError::Protocol("subscription was not acknowledged".to_string()));
            }
            None => {
                return Err(QuoteError::Protocol("server closed the subscription".to_string()));
            }
        }
        reader
            .get_ref()
            .set_read_timeout(Some(Duration::from_millis(POLL_INTERVAL_MS)))?;
        Ok(MessageStream {
            reader,
            pending: Vec::new(),
        })
    }
}

/// Result of one poll of a subscription.
#[derive(Debug)]
pub enum Poll {
    /// A complete message arrived.
    Message(BroadcastMessage),
    /// Nothing arrived within the poll interval.
    Idle,
    /// The server closed the connection.
    Closed,
}

/// Broadcast messages arriving on a subscribed connection.
pub struct MessageStream<R> {
    reader: R,
    pending: Vec<u8>,
}

impl<R: BufRead> MessageStream<R> {
    /// Waits up to the poll interval for the next message.
    ///
    /// Bytes of a line cut by the read timeout, even mid-character, are kept
    /// and the line is decoded only once its newline has arrived.
    pub fn poll(&mut self) -> Result<Poll, QuoteError> {
        match self.reader.read_until(b'\n', &mut self.pending) {
            Ok(0) => Ok(Poll::Closed),
            Ok(_) if self.pending.last() != Some(&b'\n') => Ok(Poll::Idle),
            Ok(_) => {
                let message = serde_json::from_slice(self.pending.trim_ascii());
                self.pending.clear();
                Ok(Poll::Message(message?))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                Ok(Poll::Idle)
            }
            Err(e) => Err(e.into()),
        }
    }
}
