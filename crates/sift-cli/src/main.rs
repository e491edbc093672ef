//! CLI entry point for the sift backend (for dev and testing).

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use sift_core::{
    app_data_dir, build_index, get_notes_root, load_config, scan_notes, search_notes, set_notes_root, status,
    tokenize_for_indexing, tokenize_for_search, watch_notes, IndexError, IndexingOptions, Notifier, SearchSettings,
    TokenStore, TokenizerRegistry,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "sift: full-text search for a notes folder")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show backend status (for dev).
    Status,
    /// Show where sift stores its config (app data directory).
    DataDir,
    /// Show the current config.
    Config,
    /// Remember a notes folder for the other commands.
    SetRoot {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Scan a directory for markdown notes and list them.
    Scan {
        /// Root directory to scan (your notes folder). Defaults to the configured root.
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
    /// Print the index tokens for some text.
    Tokenize {
        text: String,
        #[arg(long)]
        json: bool,
    },
    /// Print the query expression for some query text.
    Query { text: String },
    /// Search the notes folder and print matches with excerpts.
    Search {
        query: String,
        /// Notes folder. Defaults to the configured root.
        #[arg(long, value_name = "PATH")]
        path: Option<PathBuf>,
        /// Excerpts to show per note.
        #[arg(long, default_value_t = 3)]
        excerpts: usize,
        #[arg(long)]
        json: bool,
    },
    /// Rebuild the index whenever notes change.
    Watch {
        #[arg(long, value_name = "PATH")]
        path: Option<PathBuf>,
    },
}

/// Prints excerpt failures on stderr, next to the results.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        eprintln!("sift: {message}");
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sift_core=info,sift=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn notes_root(path: Option<PathBuf>) -> Result<PathBuf, String> {
    path.or_else(get_notes_root)
        .ok_or_else(|| "no notes folder given and none configured (see `sift set-root`)".to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let s = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{s}");
    Ok(())
}

async fn run(command: Commands) -> Result<(), String> {
    let settings: SearchSettings = load_config().search;

    match command {
        Commands::Status => {
            println!("sift backend");
            println!("  core: {}", status());
        }
        Commands::DataDir => match app_data_dir() {
            Some(p) => println!("{}", p.display()),
            None => return Err("could not determine app data directory".into()),
        },
        Commands::Config => {
            let config = load_config();
            match &config.notes_root {
                Some(root) => println!("notes root: {root}"),
                None => println!("notes root: (not set)"),
            }
            print_json(&config.search)?;
        }
        Commands::SetRoot { path } => {
            set_notes_root(&path).map_err(|e| e.to_string())?;
            println!("notes root set to {}", path.display());
        }
        Commands::Scan { path } => {
            let path = notes_root(path)?;
            let notes = scan_notes(&path).map_err(|e| e.to_string())?;
            println!("Scanned {} note(s) under {}", notes.len(), path.display());
            for n in notes {
                let p = n.body.lines().next().unwrap_or("").trim();
                let preview: String = p.chars().take(60).collect();
                let ellipsis = if p.chars().count() > 60 { "..." } else { "" };
                println!("  {}  {}{}", n.path.display(), preview, ellipsis);
            }
        }
        Commands::Tokenize { text, json } => {
            let registry = TokenizerRegistry::from_settings(&settings).await;
            let tokens = tokenize_for_indexing(&text, IndexingOptions::from(&settings), &registry);
            if json {
                print_json(&tokens)?;
            } else {
                println!("{}", tokens.join(" "));
            }
        }
        Commands::Query { text } => {
            let registry = TokenizerRegistry::from_settings(&settings).await;
            print_json(&tokenize_for_search(&text, &registry))?;
        }
        Commands::Search {
            query,
            path,
            excerpts,
            json,
        } => {
            let root = notes_root(path)?;
            let registry = TokenizerRegistry::from_settings(&settings).await;
            let store = build_index(&root, &registry, &settings).map_err(|e| e.to_string())?;
            let hits = search_notes(&store, &registry, &settings, &query, excerpts, &StderrNotifier);
            if json {
                print_json(&hits)?;
                return Ok(());
            }
            println!("{} note(s) match {:?}", hits.len(), query);
            for hit in hits {
                println!("{}  ({} match(es))", relative(&hit.path, &root).display(), hit.matches.len());
                for e in hit.excerpts {
                    println!("    @{}: {}", e.offset, e.excerpt);
                }
            }
        }
        Commands::Watch { path } => {
            let root = notes_root(path)?;
            let registry = Arc::new(TokenizerRegistry::from_settings(&settings).await);
            tokio::task::spawn_blocking(move || {
                watch_notes(&root, registry, settings, report_reindex)
            })
            .await
            .map_err(|e| e.to_string())?
            .map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

fn report_reindex(res: Result<TokenStore, IndexError>) {
    match res {
        Ok(store) => tracing::info!(notes = store.len(), "reindexed"),
        Err(e) => tracing::error!(error = %e, "reindex failed"),
    }
}

fn relative<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli.command.unwrap_or(Commands::Status)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
