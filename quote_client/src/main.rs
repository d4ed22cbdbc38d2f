//! Quote Client — a TCP client for the quote server.
//!
//! Store subcommands (`create`, `update`, `delete`, `list`, `company`,
//! `companies`) send one request and print the result. `watch` subscribes to
//! a broadcast channel, loads the full list, then prints the live list after
//! every change until Ctrl+C.
//!
//! `watch` never patches its view across a lost connection: after every
//! (re)connect it reloads the whole list with `LIST` before applying any
//! further messages.
//!
//! Usage example (CLI):
//! ```bash
//! quote_client --server 127.0.0.1:8080 company --name KPMG
//! quote_client create --name "Office move" --company 1
//! quote_client watch
//! ```
#![warn(missing_docs)]
mod args;
mod model;
mod sender;

use crate::args::{Args, ClientCommand};
use crate::model::live_list::LiveList;
use crate::sender::{CommandSender, Poll};
use clap::Parser;
use log::{error, info, warn};
use quote_common::{CompanyId, QuoteChanges, QuoteError, QuoteId, Request, Response, Result};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

/// Delay before `watch` reconnects after losing the server.
const RECONNECT_DELAY_MS: u64 = 2000;

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();

    let request = match args.command {
        ClientCommand::Watch { channel } => return watch(&args.server, &channel),
        ClientCommand::Create { name, company } => Request::Create {
            name,
            company_id: CompanyId(company),
        },
        ClientCommand::Update { id, name, company } => Request::Update {
            id: QuoteId(id),
            changes: QuoteChanges {
                name,
                company_id: company.map(CompanyId),
            },
        },
        ClientCommand::Delete { id } => Request::Delete { id: QuoteId(id) },
        ClientCommand::List => Request::List,
        ClientCommand::Company { name } => Request::CreateCompany { name },
        ClientCommand::Companies => Request::Companies,
    };

    match CommandSender::send_command(&args.server, &request) {
        Ok(response) => {
            print_response(&response);
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {}", e);
            Err(e)
        }
    }
}

fn print_response(response: &Response) {
    match response {
        Response::Quote { quote } => println!(
            "#{} {} (company {}, updated {})",
            quote.id, quote.name, quote.company_id, quote.updated_at
        ),
        Response::Quotes { quotes } => {
            for quote in quotes {
                println!("#{} {} (company {})", quote.id, quote.name, quote.company_id);
            }
        }
        Response::Deleted { id } => println!("Deleted #{}", id),
        Response::Company { company } => println!("Company #{} {}", company.id, company.name),
        Response::Companies { companies } => {
            for company in companies {
                println!("Company #{} {}", company.id, company.name);
            }
        }
        Response::Subscribed { channel } => println!("Subscribed to {}", channel),
        Response::Error { kind, message } => println!("Error ({}): {}", kind, message),
    }
}

/// Follows `channel` until Ctrl+C, reconnecting with a full reload when the
/// connection drops.
fn watch(server: &str, channel: &str) -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down client...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .map_err(|e| QuoteError::Protocol(format!("failed to set Ctrl+C handler: {}", e)))?;
    }

    while !shutdown.load(Ordering::Relaxed) {
        match watch_session(server, channel, &shutdown) {
            Ok(()) if shutdown.load(Ordering::Relaxed) => break,
            Ok(()) => warn!("Server closed the subscription; reconnecting"),
            Err(e) => warn!("Subscription lost: {}; reconnecting", e),
        }
        thread::sleep(Duration::from_millis(RECONNECT_DELAY_MS));
    }
    info!("Watch stopping...");
    Ok(())
}

/// One connection's worth of watching: subscribe, full reload, then live updates.
fn watch_session(server: &str, channel: &str, shutdown: &AtomicBool) -> Result<()> {
    // Subscribe before loading so no commit falls between the two.
    let mut stream = CommandSender::subscribe(server, channel)?;
    let quotes = match CommandSender::send_command(server, &Request::List)? {
        Response::Quotes { quotes } => quotes,
        other => {
            return Err(QuoteError::Protocol(format!(
                "unexpected response to LIST: {:?}",
                other
            )));
        }
    };
    let mut list = LiveList::from_snapshot(&quotes);
    print_list(&list);

    while !shutdown.load(Ordering::Relaxed) {
        match stream.poll()? {
            Poll::Message(message) => {
                info!("{} #{} ({})", message.kind, message.target_id, message.insertion);
                if list.apply(&message) {
                    print_list(&list);
                }
            }
            Poll::Idle => continue,
            Poll::Closed => return Ok(()),
        }
    }
    Ok(())
}

fn print_list(list: &LiveList) {
    println!("--- {} quote(s) ---", list.items().len());
    for item in list.items() {
        println!("{}", item.html);
    }
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
