use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cli::render::{render_json, render_table};
use cli::session::{run_session, SessionPlan};
use lanshare_core::annotator::AnnotationClient;
use lanshare_core::config::{self, AppConfig};
use lanshare_core::format::size_label;
use lanshare_core::models::{FileId, DEFAULT_MIME};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;
    let credential = config::resolve_credential(&cfg.ai);
    let client = AnnotationClient::from_config(&cfg.ai, credential)
        .context("building annotation client")?;

    match cli.command {
        Commands::Analyze {
            name,
            mime,
            size,
            json,
        } => run_analyze(client, name, mime, size, json).await,
        Commands::Share {
            paths,
            no_demo,
            analyze,
            rename,
            delete,
            query,
            json,
        } => {
            let plan = SessionPlan {
                demo: cfg.share.demo_files && !no_demo,
                uploads: paths,
                renames: rename,
                deletes: delete.into_iter().map(FileId::new).collect(),
                analyze,
                query,
            };
            run_share(&cfg, client, plan, json).await
        }
    }
}

#[derive(Parser)]
#[command(name = "lanshare")]
#[command(about = "LAN file share with AI annotations", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate a single file description
    Analyze {
        /// File name, e.g. report_v2.pdf
        #[arg(long)]
        name: String,
        /// MIME type
        #[arg(long, default_value = DEFAULT_MIME)]
        mime: String,
        /// Size in bytes
        #[arg(long)]
        size: u64,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a share session and print the resulting file list
    Share {
        /// Local files to upload into the session
        paths: Vec<PathBuf>,
        /// Start from an empty share instead of the demo files
        #[arg(long, default_value_t = false)]
        no_demo: bool,
        /// Annotate every file after uploads, renames and deletes
        #[arg(long, default_value_t = false)]
        analyze: bool,
        /// Rename a file, as ID=NEW_NAME (repeatable)
        #[arg(long, value_parser = parse_rename)]
        rename: Vec<(FileId, String)>,
        /// Delete a file by ID (repeatable)
        #[arg(long)]
        delete: Vec<String>,
        /// Filter by name, description or tag
        #[arg(short, long)]
        query: Option<String>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_rename(s: &str) -> Result<(FileId, String), String> {
    let (id, name) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=NEW_NAME, got `{s}`"))?;
    if id.trim().is_empty() {
        return Err("rename id cannot be empty".to_string());
    }
    Ok((FileId::new(id.trim()), name.to_string()))
}

async fn run_analyze(
    client: AnnotationClient,
    name: String,
    mime: String,
    size: u64,
    json: bool,
) -> Result<()> {
    let result = client.analyze(&name, &mime, &size_label(size)).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.description);
        let tags: Vec<String> = result.tags.iter().map(|t| format!("#{t}")).collect();
        println!("{}", tags.join(" "));
    }
    Ok(())
}

async fn run_share(
    cfg: &AppConfig,
    client: AnnotationClient,
    plan: SessionPlan,
    json: bool,
) -> Result<()> {
    let report = run_session(plan, client).await?;
    let visible = report.visible();
    let rows: Vec<_> = visible.iter().collect();
    if json {
        println!("{}", render_json(&rows)?);
    } else {
        println!("{} - {} file(s)", cfg.share.name, rows.len());
        print!("{}", render_table(&rows));
        if !report.analyzed.is_empty() {
            println!("analyzed {} file(s)", report.analyzed.len());
        }
    }
    Ok(())
}
