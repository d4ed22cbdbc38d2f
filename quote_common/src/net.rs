//! Shared networking constants and helpers used by client and server.
use std::io::{BufRead, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::QuoteError;

/// TCP port for the command channel (client -> server).
pub const COMMAND_PORT: u16 = 8080;

/// Channel every quote is broadcast on.
pub const QUOTES_CHANNEL: &str = "quotes";

/// Helper to format an IPv4 address with a port like "ip:port".
pub fn addr(ip: &str, port: u16) -> String {
    format!("{}:{}", ip, port)
}

/// Writes `value` as a single JSON line and flushes the writer.
pub fn write_line<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<(), QuoteError> {
    let mut bytes = serde_json::to_vec(value)?;
    bytes.push(b'\n');
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Reads one JSON line. Returns `Ok(None)` when the peer closed the stream.
pub fn read_line<R: BufRead, T: DeserializeOwned>(reader: &mut R) -> Result<Option<T>, QuoteError> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(QuoteError::Protocol("empty line".to_string()));
    }
    Ok(Some(serde_json::from_str(trimmed)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{BroadcastMessage, Insertion, MessageKind};
    use std::io::Cursor;

    #[test]
    fn lines_are_newline_delimited() {
        let mut buf = Vec::new();
        let msg = BroadcastMessage {
            kind: MessageKind::Deleted,
            target_id: "3".to_string(),
            html_fragment: None,
            insertion: Insertion::Remove,
        };
        write_line(&mut buf, &msg).unwrap();
        write_line(&mut buf, &msg).unwrap();
        assert_eq!(buf.iter().filter(|b| **b == b'\n').count(), 2);

        let mut reader = Cursor::new(buf);
        let first: Option<BroadcastMessage> = read_line(&mut reader).unwrap();
        let second: Option<BroadcastMessage> = read_line(&mut reader).unwrap();
        let end: Option<BroadcastMessage> = read_line(&mut reader).unwrap();
        assert_eq!(first, Some(msg.clone()));
        assert_eq!(second, Some(msg));
        assert!(end.is_none());
    }

    #[test]
    fn blank_line_is_a_protocol_error() {
        let mut reader = Cursor::new(b"\n".to_vec());
        let res: Result<Option<BroadcastMessage>, _> = read_line(&mut reader);
        assert!(matches!(res, Err(QuoteError::Protocol(_))));
    }
}
