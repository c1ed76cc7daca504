use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use microlight_site::config::SiteFileConfig;
use microlight_site::db::{Database, PostStatus};
use microlight_site::web::{self, AppState};
use microlight_site::webmention::{ReqwestFetcher, SendOutcome, Sender};

#[derive(Parser)]
#[command(name = "microlight")]
#[command(about = "Personal site engine with Webmention support")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the nearest .microlight.toml)
    #[arg(long, env = "MICROLIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Public base URL of the site, overriding [site].base_url
    #[arg(long, env = "MICROLIGHT_BASE_URL")]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (webmention receiver and API)
    Serve {
        /// Port to listen on, overriding [server].port
        #[arg(long, short, env = "MICROLIGHT_PORT")]
        port: Option<u16>,
    },
    /// Send the webmention for a stored post
    Send {
        /// Post slug
        slug: String,
    },
    /// Mark a post deleted and notify the page it referenced
    Delete {
        /// Post slug
        slug: String,
    },
    /// Print the webmention endpoint a URL advertises
    Discover {
        /// Page to inspect
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    site_common::init_tracing("microlight_site")?;

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SiteFileConfig::load_from_path(path)?,
        None => SiteFileConfig::load()?,
    };
    if let Some(base_url) = cli.base_url {
        config.site.base_url = base_url;
    }

    let db = Database::open_at(config.database.resolved_path()?)?;

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            let state = AppState::new(db, &config)?;
            web::serve(state, port).await?;
        }
        Commands::Send { slug } => {
            let sender = build_sender(&config, db)?;
            match sender.send_for_post(&slug).await? {
                SendOutcome::Sent { endpoint, status } => {
                    println!("Sent to {} ({})", endpoint, status);
                }
                SendOutcome::NoEndpoint => {
                    println!("Target does not advertise a webmention endpoint");
                }
            }
        }
        Commands::Delete { slug } => {
            let Some(post) = db.get_post_by_slug(&slug)? else {
                anyhow::bail!("Post not found: {}", slug);
            };
            db.set_post_status(&slug, PostStatus::Deleted)?;
            let interactions = db.count_interactions_for_post(post.id)?;
            println!("Deleted {} ({} interactions kept)", slug, interactions);

            build_sender(&config, db)?.notify_best_effort(&slug).await;
        }
        Commands::Discover { url } => {
            let sender = build_sender(&config, db)?;
            match sender.discover_endpoint(&url).await? {
                Some(endpoint) => println!("{}", endpoint),
                None => println!("No webmention endpoint found"),
            }
        }
    }

    Ok(())
}

fn build_sender(config: &SiteFileConfig, db: Database) -> Result<Sender> {
    let fetcher = Arc::new(ReqwestFetcher::new(&config.webmention)?);
    Ok(Sender::new(
        fetcher,
        db,
        config.site.clone(),
        config.webmention.user_agent.clone(),
    ))
}
