//! Quotes command server.
//!
//! Wires the pieces of the `quote_server` library together:
//!
//! - `Broadcaster` — created first, inline or deferred (`--deferred`), and
//!   registered as the store's commit observer.
//! - `QuoteStore` — seeded with the companies given by `--company`.
//! - `CommandReceiver` — accepts TCP connections on `--bind` and serves
//!   store commands and `SUBSCRIBE` streams, one thread per connection;
//!   subscribers that stop reading are cut off after `--write-timeout-secs`.
//!
//! Network protocol (high-level):
//! - Client sends one JSON request line (`CREATE`, `UPDATE`, `DELETE`, `LIST`,
//!   `CREATE_COMPANY`, `COMPANIES`, `SUBSCRIBE`).
//! - Store commands are answered with one JSON response line.
//! - `SUBSCRIBE` is acknowledged, then every committed change on the channel is
//!   pushed as a JSON broadcast message line.
#![warn(missing_docs)]
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::info;
use quote_common::Result;
use quote_server::{
    Broadcaster, BroadcasterConfig, CommandReceiver, CommitObserver, DeliveryMode, QuoteStore,
};

use crate::args::Args;

mod args;

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();

    let delivery = if args.deferred {
        DeliveryMode::Deferred
    } else {
        DeliveryMode::Inline
    };
    let broadcaster = Arc::new(Broadcaster::new(BroadcasterConfig {
        delivery,
        ..BroadcasterConfig::default()
    }));
    info!("Broadcaster started with {:?} delivery", delivery);

    let observer: Arc<dyn CommitObserver> = broadcaster.clone();
    let store = Arc::new(QuoteStore::new(observer));
    for name in &args.companies {
        store.create_company(name)?;
    }

    let receiver = CommandReceiver::new(&args.bind)?
        .with_write_timeout(Duration::from_secs(args.write_timeout_secs));
    receiver.run(store, broadcaster)
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
