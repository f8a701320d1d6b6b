use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use storykit_mention_index::{LocalMentionRepository, MentionRepository};
use storykit_project_store::LocalProjectStore;
use storykit_protocol::CodexSource;

mod report;
mod watch;

#[derive(Parser)]
#[command(name = "storykit")]
#[command(about = "Mention tracking for storykit writing projects", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory holding projects/ and index/
    #[arg(long, global = true, default_value = ".storykit")]
    data_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild a project's mention index from scratch
    Rebuild(ProjectArgs),

    /// Incrementally reconcile a project's mention index
    Sync(ProjectArgs),

    /// List mentions of one codex entry
    Mentions(MentionsArgs),

    /// Count mentions of one codex entry
    Count(EntryArgs),

    /// Whole-project mention report
    Report(ProjectArgs),

    /// Show index freshness for a project
    State(ProjectArgs),

    /// Mark a project's index stale after codex-wide changes
    #[command(name = "mark-stale")]
    MarkStale(ProjectArgs),

    /// Watch the project archive and sync the index on change
    Watch(WatchArgs),
}

#[derive(Copy, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Args)]
struct ProjectArgs {
    /// Project id
    #[arg(long)]
    project: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Args)]
struct EntryArgs {
    /// Project id
    #[arg(long)]
    project: String,

    /// Codex entry id
    #[arg(long)]
    entry: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Args)]
struct MentionsArgs {
    /// Project id
    #[arg(long)]
    project: String,

    /// Codex entry id
    #[arg(long)]
    entry: String,

    /// Drop mentions found in the entry's own codex document
    #[arg(long)]
    exclude_self: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Args)]
struct WatchArgs {
    /// Project id
    #[arg(long)]
    project: String,

    /// Quiet period before a change triggers a sync
    #[arg(long, default_value_t = 500)]
    debounce_ms: u64,
}

fn init_logging(verbose: bool, quiet: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    if quiet {
        builder.filter_level(log::LevelFilter::Warn);
    }
    builder.target(env_logger::Target::Stderr).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let store = Arc::new(LocalProjectStore::new(&cli.data_dir));
    let repo = LocalMentionRepository::new(&cli.data_dir, store.clone(), store.clone());

    match cli.command {
        Commands::Rebuild(args) => {
            let rebuilt = repo
                .rebuild_index(&args.project)
                .await
                .with_context(|| format!("rebuild index for project {}", args.project))?;
            match args.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rebuilt)?),
                OutputFormat::Text => print!("{}", report::render_rebuild(&rebuilt)),
            }
        }
        Commands::Sync(args) => {
            let synced = repo
                .sync(&args.project)
                .await
                .with_context(|| format!("sync index for project {}", args.project))?;
            match args.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&synced)?),
                OutputFormat::Text => print!("{}", report::render_rebuild(&synced)),
            }
        }
        Commands::Mentions(args) => {
            let mut mentions = repo.get_by_codex_entry(&args.project, &args.entry).await?;
            if args.exclude_self {
                mentions.retain(|m| !m.is_self_mention());
            }
            match args.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&mentions)?),
                OutputFormat::Text => print!("{}", report::render_mentions(&args.entry, &mentions)),
            }
        }
        Commands::Count(args) => {
            let count = repo.count_by_codex_entry(&args.project, &args.entry).await?;
            match args.format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({
                        "project_id": args.project,
                        "codex_entry_id": args.entry,
                        "count": count,
                    })
                ),
                OutputFormat::Text => println!("{count}"),
            }
        }
        Commands::Report(args) => {
            let all = repo.get_all_by_project(&args.project).await?;
            let entries = store
                .codex_entries(&args.project)
                .await
                .with_context(|| format!("load codex entries for project {}", args.project))?;
            match args.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&report::project_summary(&entries, &all))?);
                }
                OutputFormat::Text => {
                    print!("{}", report::render_project(&args.project, &entries, &all));
                }
            }
        }
        Commands::State(args) => {
            let state = repo.freshness(&args.project).await?;
            match args.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&state)?),
                OutputFormat::Text => print!("{}", report::render_state(&state)),
            }
        }
        Commands::MarkStale(args) => {
            repo.mark_stale(&args.project).await?;
            log::info!("Marked project {} stale", args.project);
        }
        Commands::Watch(args) => {
            watch::run(&repo, &store, &args.project, args.debounce_ms).await?;
        }
    }

    Ok(())
}
