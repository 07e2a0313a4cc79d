//! PageFetch CLI - fetch web content directly or serve it over MCP

mod mcp;

use clap::{Parser, Subcommand};
use pagefetch::{FetchIntent, FetchRequest, Tool};
use tracing_subscriber::EnvFilter;

/// PageFetch - web content fetching with robots.txt policy enforcement
#[derive(Parser, Debug)]
#[command(name = "pagefetch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the User-Agent for all fetches
    #[arg(long, global = true)]
    user_agent: Option<String>,

    /// Skip robots.txt checks for autonomous fetches
    #[arg(long, global = true)]
    ignore_robots_txt: bool,

    /// Route requests through this proxy
    #[arg(long, global = true)]
    proxy_url: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run as MCP (Model Context Protocol) server over stdio
    Mcp,
    /// Fetch one URL and print the payload
    Fetch {
        /// URL to fetch
        url: String,

        /// Maximum number of characters to print
        #[arg(long, default_value_t = 5000)]
        max_length: usize,

        /// Start the content at this character index
        #[arg(long, default_value_t = 0)]
        start_index: usize,

        /// Print the raw page body without HTML simplification
        #[arg(long)]
        raw: bool,

        /// Fetch as a human-directed request, bypassing robots.txt
        #[arg(long)]
        manual: bool,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so the MCP stdio channel stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut builder = Tool::builder().ignore_robots_txt(cli.ignore_robots_txt);
    if let Some(ua) = cli.user_agent {
        builder = builder.user_agent(ua);
    }
    if let Some(proxy) = cli.proxy_url {
        builder = builder.proxy_url(proxy);
    }
    let tool = builder.build();

    match cli.command {
        Commands::Mcp => mcp::run_server(tool).await,
        Commands::Fetch {
            url,
            max_length,
            start_index,
            raw,
            manual,
        } => {
            let mut req = FetchRequest::new(url)
                .max_length(max_length)
                .start_index(start_index);
            if raw {
                req = req.raw();
            }
            let intent = if manual {
                FetchIntent::Manual
            } else {
                FetchIntent::Autonomous
            };

            match tool.execute(&req, intent).await {
                Ok(payload) => println!("{}", payload),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
