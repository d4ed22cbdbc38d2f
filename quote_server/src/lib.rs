//! Quote store with live update broadcasting.
//!
//! Building blocks:
//!
//! - `store` — `QuoteStore`, the in-memory owner of quotes and companies. Every
//!   committed write is reported to a `CommitObserver` before the writer sees
//!   success.
//! - `broadcaster` — `Broadcaster`, the observer that renders each commit into a
//!   `BroadcastMessage` and fans it out to channel subscribers through
//!   `crossbeam_channel` senders, inline or on a deferred worker.
//! - `receiver` — TCP command listener; one thread per connection.
//! - `stream` — per-subscriber task writing broadcast messages to its socket.
#![warn(missing_docs)]
pub mod broadcaster;
pub mod receiver;
pub mod store;
pub mod stream;

pub use broadcaster::{
    Broadcaster, BroadcasterConfig, ChannelSelector, DeliveryMode, Subscription,
};
pub use receiver::CommandReceiver;
pub use store::{CommitObserver, QuoteStore};
