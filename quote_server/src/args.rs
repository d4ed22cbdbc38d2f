use clap::Parser;
use quote_common::net::{COMMAND_PORT, addr};
use quote_server::receiver::SUBSCRIBER_WRITE_TIMEOUT_SECS;

/// Quote store server with live broadcast of every committed change.
#[derive(Parser, Debug)]
#[command(name = "quote_server", version, about)]
pub struct Args {
    /// Address the command listener binds to.
    #[arg(long, default_value_t = addr("0.0.0.0", COMMAND_PORT))]
    pub bind: String,

    /// Render and publish broadcasts on a background worker instead of inside each write.
    #[arg(long)]
    pub deferred: bool,

    /// Seconds a write to a subscriber may block before the subscriber is dropped.
    #[arg(long, default_value_t = SUBSCRIBER_WRITE_TIMEOUT_SECS)]
    pub write_timeout_secs: u64,

    /// Company to register at startup; repeat for several.
    #[arg(long = "company", value_name = "NAME")]
    pub companies: Vec<String>,
}
