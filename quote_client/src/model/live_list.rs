//! Live quote list as seen by a subscriber.
//!
//! The list starts from a full `LIST` snapshot and then applies broadcast
//! messages in arrival order. Items are kept newest first, matching the
//! server's listing order, so `prepend` keeps the list sorted.
//!
//! Because the subscription is opened before the snapshot is taken, a message
//! may describe a change the snapshot already contains. Applying is therefore
//! tolerant: a `prepend` for a known id replaces it in place and a `replace` or
//! `remove` for an unknown id is ignored.
use log::{debug, warn};
use quote_common::render::render_quote;
use quote_common::{BroadcastMessage, Insertion, Quote};

/// One rendered row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveItem {
    /// Quote id as a string, same as `BroadcastMessage::target_id`.
    pub id: String,
    /// Rendered fragment.
    pub html: String,
}

/// Ordered list of rendered quotes.
#[derive(Debug, Default)]
pub struct LiveList {
    items: Vec<LiveItem>,
}

impl LiveList {
    /// Builds the list from a newest-first snapshot.
    pub fn from_snapshot(quotes: &[Quote]) -> Self {
        let items = quotes
            .iter()
            .map(|q| LiveItem {
                id: q.id.to_string(),
                html: render_quote(q),
            })
            .collect();
        Self { items }
    }

    /// Rows, newest first.
    pub fn items(&self) -> &[LiveItem] {
        &self.items
    }

    /// Ids, newest first.
    #[cfg(test)]
    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.id.as_str()).collect()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.id == id)
    }

    /// Applies one message. Returns `true` if the list changed.
    pub fn apply(&mut self, message: &BroadcastMessage) -> bool {
        let id = message.target_id.as_str();
        match message.insertion {
            Insertion::Prepend | Insertion::Replace => {
                let Some(html) = message.html_fragment.clone() else {
                    warn!("{} for {} carries no fragment", message.insertion, id);
                    return false;
                };
                match (self.position(id), message.insertion) {
                    (Some(pos), _) => {
                        if self.items[pos].html == html {
                            return false;
                        }
                        self.items[pos].html = html;
                    }
                    (None, Insertion::Prepend) => self.items.insert(
                        0,
                        LiveItem {
                            id: id.to_string(),
                            html,
                        },
                    ),
                    (None, _) => {
                        debug!("Ignoring replace for unknown quote {}", id);
                        return false;
                    }
                }
                true
            }
            Insertion::Remove => match self.position(id) {
                Some(pos) => {
                    self.items.remove(pos);
                    true
                }
                None => {
                    debug!("Ignoring remove for unknown quote {}", id);
                    false
                }
            },
        }
    }
}
