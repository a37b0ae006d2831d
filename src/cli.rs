// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Subcommands:
// - serve: run the crawl service (HTTP API)
// - crawl: ask a running service to crawl a site and print the sitemap
// - local: crawl a site in this process, no service needed
//
// The crawl settings (cache, timeouts, budgets, scope) live in
// config::CrawlSettings and are flattened into `serve` and `local`.
// =============================================================================

use clap::{Parser, Subcommand};
use std::net::SocketAddr;

use crate::config::CrawlSettings;

#[derive(Parser, Debug)]
#[command(
    name = "sitemap-crawler",
    version,
    about = "Crawl a website and build a sitemap of its same-domain links",
    long_about = "sitemap-crawler walks every page reachable from a seed URL on the same domain \
                  and reports, for each page, the links it contains. Broken pages are reported \
                  without stopping the crawl. Link lists are cached so repeated crawls are cheap."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the crawl service
    ///
    /// Example: sitemap-crawler serve --bind 0.0.0.0:8001 --redis-url redis://localhost:6379
    Serve {
        /// Address to listen on
        #[arg(long, env = "CRAWLER_BIND", default_value = "0.0.0.0:8001")]
        bind: SocketAddr,

        #[command(flatten)]
        settings: CrawlSettings,
    },

    /// Ask a running service to crawl a website
    ///
    /// Example: sitemap-crawler crawl https://example.com
    Crawl {
        /// Seed URL (must start with http:// or https://)
        url: String,

        /// Base URL of the crawl service
        #[arg(long, env = "CRAWLER_SERVER", default_value = "http://localhost:8001")]
        server: String,

        /// Print the raw JSON result instead of a tree
        #[arg(long)]
        json: bool,
    },

    /// Crawl a website directly, without the service
    ///
    /// Example: sitemap-crawler local https://example.com --max-pages 200
    Local {
        /// Seed URL
        url: String,

        /// Print the raw JSON result instead of a tree
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        settings: CrawlSettings,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crawl() {
        let cli = Cli::try_parse_from(["sitemap-crawler", "crawl", "https://foo.com", "--json"])
            .unwrap();
        match cli.command {
            Commands::Crawl { url, json, .. } => {
                assert_eq!(url, "https://foo.com");
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_bind() {
        let cli = Cli::try_parse_from(["sitemap-crawler", "serve", "--bind", "127.0.0.1:9000"])
            .unwrap();
        match cli.command {
            Commands::Serve { bind, .. } => assert_eq!(bind.port(), 9000),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_url_is_required() {
        assert!(Cli::try_parse_from(["sitemap-crawler", "local"]).is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
