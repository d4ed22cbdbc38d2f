//! Live update broadcaster.
//!
//! The `Broadcaster` is the store's `CommitObserver`. For every committed
//! write it builds one `BroadcastMessage` and pushes it to every subscriber of
//! the quote's channel using `crossbeam_channel` senders:
//!
//! - `created` → rendered fragment, `prepend`;
//! - `updated` → rendered fragment, `replace` of `target_id`;
//! - `deleted` → no fragment, `remove` of `target_id`.
//!
//! Delivery is best-effort and only reaches subscribers connected at publish
//! time. A `Subscription` unregisters itself when dropped, and a channel with
//! no subscribers left has no registry entry; the writer never learns about
//! delivery failures.
//!
//! With `DeliveryMode::Deferred`, `on_commit` only enqueues the commit and a
//! single worker thread renders and publishes in FIFO order, so the commit
//! order seen by subscribers is the same as in inline mode.
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, info, warn};
use quote_common::net::QUOTES_CHANNEL;
use quote_common::render::render_quote;
use quote_common::{BroadcastMessage, MessageKind, Quote, Result};

use crate::store::CommitObserver;

/// Maps a quote to the channel its messages are published on.
pub type ChannelSelector = Arc<dyn Fn(&Quote) -> String + Send + Sync>;

/// When messages are rendered and published relative to the commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Inside the writer's call, before it returns.
    #[default]
    Inline,
    /// On a background worker, in commit order.
    Deferred,
}

/// Broadcaster options.
#[derive(Clone)]
pub struct BroadcasterConfig {
    /// Channel routing. Every quote goes to `quotes` by default.
    pub channel_selector: ChannelSelector,
    /// Inline or deferred publishing.
    pub delivery: DeliveryMode,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            channel_selector: Arc::new(|_: &Quote| QUOTES_CHANNEL.to_string()),
            delivery: DeliveryMode::Inline,
        }
    }
}

impl fmt::Debug for BroadcasterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BroadcasterConfig")
            .field("delivery", &self.delivery)
            .finish_non_exhaustive()
    }
}

/// Subscriber registry keyed by channel name.
///
/// A channel's entry exists only while it has at least one subscriber.
#[derive(Default)]
struct Hub {
    channels: Mutex<HashMap<String, Vec<(u64, Sender<BroadcastMessage>)>>>,
    last_id: AtomicU64,
}

impl Hub {
    fn subscribe(&self, channel: &str) -> Result<(u64, Receiver<BroadcastMessage>)> {
        let (tx, rx) = unbounded();
        let id = self.last_id.fetch_add(1, Ordering::Relaxed) + 1;
        let mut channels = self.channels.lock()?;
        let subscribers = channels.entry(channel.to_string()).or_default();
        subscribers.push((id, tx));
        info!(
            "New subscriber {} on '{}'. Total subscribers: {}",
            id,
            channel,
            subscribers.len()
        );
        Ok((id, rx))
    }

    fn unsubscribe(&self, channel: &str, id: u64) {
        let Ok(mut channels) = self.channels.lock() else {
            warn!("Subscriber registry poisoned; subscriber {} left in place", id);
            return;
        };
        let Some(subscribers) = channels.get_mut(channel) else {
            return;
        };
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        info!(
            "Subscriber {} left '{}'. Total subscribers: {}",
            id,
            channel,
            subscribers.len()
        );
        if subscribers.is_empty() {
            channels.remove(channel);
        }
    }

    /// Returns the number of subscribers the message reached.
    fn publish(&self, channel: &str, message: &BroadcastMessage) -> usize {
        let Ok(mut channels) = self.channels.lock() else {
            warn!("Subscriber registry poisoned; dropping {} message", message.kind);
            return 0;
        };
        let Some(subscribers) = channels.get_mut(channel) else {
            debug!(
                "No subscribers on '{}' for {} {}",
                channel, message.kind, message.target_id
            );
            return 0;
        };
        let before = subscribers.len();
        subscribers.retain(|(_, tx)| tx.send(message.clone()).is_ok());
        let reached = subscribers.len();
        if reached < before {
            debug!(
                "Dropped {} disconnected subscriber(s) from '{}'",
                before - reached,
                channel
            );
        }
        if reached == 0 {
            channels.remove(channel);
        }
        debug!(
            "Published {} {} to {} subscriber(s) on '{}'",
            message.kind, message.target_id, reached, channel
        );
        reached
    }

    fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .lock()
            .map(|channels| channels.get(channel).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

/// A live registration on one channel.
///
/// Derefs to the message `Receiver`. Dropping it removes the registration, so
/// a subscriber that goes away never lingers in the registry even if nothing
/// is ever published on its channel again.
pub struct Subscription {
    hub: Arc<Hub>,
    channel: String,
    id: u64,
    receiver: Receiver<BroadcastMessage>,
}

impl Subscription {
    /// Channel this subscription listens on.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Incoming messages, in publish order.
    pub fn receiver(&self) -> &Receiver<BroadcastMessage> {
        &self.receiver
    }
}

impl Deref for Subscription {
    type Target = Receiver<BroadcastMessage>;

    fn deref(&self) -> &Self::Target {
        &self.receiver
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(&self.channel, self.id);
    }
}

/// A commit waiting for the deferred worker.
struct PendingCommit {
    channel: String,
    kind: MessageKind,
    quote: Quote,
}

/// Renders committed writes and fans them out to channel subscribers.
pub struct Broadcaster {
    hub: Arc<Hub>,
    channel_selector: ChannelSelector,
    deferred_tx: Option<Sender<PendingCommit>>,
}

impl Broadcaster {
    /// Creates a broadcaster; `Deferred` delivery starts its worker thread.
    pub fn new(config: BroadcasterConfig) -> Self {
        let hub = Arc::new(Hub::default());
        let deferred_tx = match config.delivery {
            DeliveryMode::Inline => None,
            DeliveryMode::Deferred => Some(Self::start_worker(Arc::clone(&hub))),
        };
        Self {
            hub,
            channel_selector: config.channel_selector,
            deferred_tx,
        }
    }

    fn start_worker(hub: Arc<Hub>) -> Sender<PendingCommit> {
        let (tx, rx) = unbounded::<PendingCommit>();
        thread::spawn(move || {
            info!(
                "Deferred broadcast worker started (Thread ID: {:?})",
                thread::current().id()
            );
            for pending in rx.iter() {
                let message = build_message(pending.kind, &pending.quote);
                hub.publish(&pending.channel, &message);
            }
            info!("Deferred broadcast worker stopping...");
        });
        tx
    }

    /// Channel the messages for `quote` are published on.
    pub fn channel_for(&self, quote: &Quote) -> String {
        (self.channel_selector)(quote)
    }

    /// Joins `channel`; the subscription sees every message published from now on
    /// until it is dropped.
    pub fn subscribe(&self, channel: &str) -> Result<Subscription> {
        let (id, receiver) = self.hub.subscribe(channel)?;
        Ok(Subscription {
            hub: Arc::clone(&self.hub),
            channel: channel.to_string(),
            id,
            receiver,
        })
    }

    /// Number of live subscribers known on `channel`.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.hub.subscriber_count(channel)
    }
}

impl CommitObserver for Broadcaster {
    fn on_commit(&self, kind: MessageKind, quote: &Quote) {
        let channel = self.channel_for(quote);
        match &self.deferred_tx {
            None => {
                let message = build_message(kind, quote);
                self.hub.publish(&channel, &message);
            }
            Some(tx) => {
                let pending = PendingCommit {
                    channel,
                    kind,
                    quote: quote.clone(),
                };
                if let Err(e) = tx.send(pending) {
                    warn!(
                        "Deferred broadcast worker is gone, {} {} dropped: {}",
                        kind, quote.id, e
                    );
                }
            }
        }
    }
}

/// Builds the wire message for one commit.
pub fn build_message(kind: MessageKind, quote: &Quote) -> BroadcastMessage {
    let html_fragment = match kind {
        MessageKind::Created | MessageKind::Updated => Some(render_quote(quote)),
        MessageKind::Deleted => None,
    };
    BroadcastMessage {
        kind,
        target_id: quote.id.to_string(),
        html_fragment,
        insertion: kind.insertion(),
    }
}
