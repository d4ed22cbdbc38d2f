//! Broadcast message published to channel subscribers.
//!
//! One message is produced per committed write. Subscribers apply it to their
//! list view according to `insertion`:
//! - `prepend` — insert `html_fragment` at the head of the list.
//! - `replace` — replace the node for `target_id` with `html_fragment`.
//! - `remove` — remove the node for `target_id`; `html_fragment` is `null`.
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Lifecycle transition that produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageKind {
    /// A quote was inserted.
    Created,
    /// A quote's fields were changed.
    Updated,
    /// A quote was removed.
    Deleted,
}

/// How a subscriber applies the message to its view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Insertion {
    /// New item goes to the head of the list.
    Prepend,
    /// Existing item is swapped for the new rendering.
    Replace,
    /// Existing item is dropped.
    Remove,
}

impl MessageKind {
    /// The insertion directive paired with each kind of commit.
    pub fn insertion(self) -> Insertion {
        match self {
            MessageKind::Created => Insertion::Prepend,
            MessageKind::Updated => Insertion::Replace,
            MessageKind::Deleted => Insertion::Remove,
        }
    }
}

/// Wire payload delivered to every subscriber of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastMessage {
    /// Commit kind.
    pub kind: MessageKind,
    /// Id of the affected quote, as a string.
    pub target_id: String,
    /// Rendered quote, `None` for deletes.
    pub html_fragment: Option<String>,
    /// How to apply the fragment.
    pub insertion: Insertion,
}
