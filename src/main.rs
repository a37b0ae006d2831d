// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Load a .env file (if any) and set up logging
// 2. Parse command-line arguments using clap
// 3. Dispatch to the subcommand: run the service, call it, or crawl locally
// 4. Exit with a code that tells scripts how the crawl went
//    (0 = success, 1 = failure, 2 = partial success, 3 = anything else)
//
// Logs go to stderr so the sitemap on stdout can be piped.
//
// Rust concepts used:
// - async/await: the crawl and the service are all network I/O
// - Result<T, E> + `?`: errors bubble up to main, which picks the exit code
// - match: Pattern matching to handle different subcommands
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cache;  // src/cache/ - link-list cache backends
mod cli;    // src/cli.rs - command-line parsing
mod client; // src/client.rs - service client and tree output
mod config; // src/config.rs - crawl settings
mod crawl;  // src/crawl/ - the crawler itself
mod server; // src/server/ - HTTP API

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use client::Outcome;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // A missing .env file is normal
    let _ = dotenvy::dotenv();
    init_logging();

    let exit_code = match run().await {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            Outcome::Other.exit_code()
        }
    };

    std::process::exit(exit_code);
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sitemap_crawler=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<Outcome> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind, settings } => {
            let crawler = settings.build_crawler().await?;
            server::serve(bind, crawler).await?;
            Ok(Outcome::Success)
        }
        Commands::Crawl { url, server, json } => client::crawl_remote(&server, &url, json).await,
        Commands::Local {
            url,
            json,
            settings,
        } => {
            let crawler = settings.build_crawler().await?;
            let outcome = crawler.crawl(&url).await;
            client::report_local(&url, &outcome, json)
        }
    }
}
