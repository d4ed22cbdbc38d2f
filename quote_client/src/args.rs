use clap::{Parser, Subcommand};
use quote_common::net::{COMMAND_PORT, QUOTES_CHANNEL, addr};

/// Command-line client for the quote server.
#[derive(Parser, Debug)]
#[command(name = "quote_client", version, about)]
pub struct Args {
    /// Server command address.
    #[arg(long, default_value_t = addr("127.0.0.1", COMMAND_PORT))]
    pub server: String,

    #[command(subcommand)]
    pub command: ClientCommand,
}

/// One action per invocation.
#[derive(Subcommand, Debug)]
pub enum ClientCommand {
    /// Create a quote.
    Create {
        /// Quote name.
        #[arg(long)]
        name: String,
        /// Owning company id.
        #[arg(long)]
        company: u64,
    },
    /// Change a quote's name and/or company.
    Update {
        /// Quote id.
        #[arg(long)]
        id: u64,
        /// New name.
        #[arg(long)]
        name: Option<String>,
        /// New owning company id.
        #[arg(long)]
        company: Option<u64>,
    },
    /// Delete a quote.
    Delete {
        /// Quote id.
        #[arg(long)]
        id: u64,
    },
    /// List quotes, newest first.
    List,
    /// Register a company.
    Company {
        /// Company name.
        #[arg(long)]
        name: String,
    },
    /// List companies.
    Companies,
    /// Follow a channel and print the live list after every change.
    Watch {
        /// Channel to subscribe to.
        #[arg(long, default_value = QUOTES_CHANNEL)]
        channel: String,
    },
}
