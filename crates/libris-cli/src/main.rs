use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use libris_core::{
    open_backend, transfer, AppConfig, Backend, BookDraft, BookKey, BookStore, Covers, ExitCode,
    LibrisError, SearchField, StoredBook,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "libris",
    about = "Personal library catalogue with covers and reading stats",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format. Also enabled by setting LIBRIS_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Storage backend to use (json or sqlite), overriding the config file.
    #[arg(long, global = true)]
    backend: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a book to the library.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        /// Publication year (1000-9999).
        #[arg(long)]
        year: i64,
        #[arg(long)]
        genre: String,
        /// Mark the book as read.
        #[arg(long)]
        read: bool,
        /// Rating from 1 to 5 (defaults to 3).
        #[arg(long)]
        rating: Option<u8>,
        #[arg(long)]
        favorite: bool,
        /// Cover image (jpg, jpeg or png) to copy into the cover directory.
        #[arg(long)]
        cover: Option<PathBuf>,
    },

    /// Remove books by id or by exact title.
    Remove {
        #[arg(long, conflicts_with = "title", required_unless_present = "title")]
        id: Option<i64>,
        /// Removes every book with this exact title.
        #[arg(long)]
        title: Option<String>,
    },

    /// Search books by title, author or genre (case-insensitive substring).
    Search {
        /// One of: title, author, genre.
        field: String,
        term: String,
    },

    /// List all books in storage order.
    List,

    /// Show library statistics.
    Stats,

    /// Copy every book from the active backend into another one.
    Transfer {
        /// Target backend (json or sqlite).
        #[arg(long)]
        to: String,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run diagnostics.
    Doctor,

    /// Show version information.
    Version,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all config values.
    List,
    /// Get a specific config key.
    Get { key: String },
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() {
    init_tracing();

    let start = Instant::now();
    let cli = Cli::parse();
    let json_output = cli.json || std::env::var("LIBRIS_JSON").as_deref() == Ok("1");

    if let Err(err) = run(cli, json_output, start) {
        let code = report_error(&err, json_output, start);
        std::process::exit(code.into());
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LIBRIS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli, json_output: bool, start: Instant) -> Result<()> {
    let timing = std::env::var("LIBRIS_TIMING").as_deref() == Ok("1");

    let mut config = AppConfig::load()?;
    if let Ok(lib_path) = std::env::var("LIBRIS_LIBRARY_PATH") {
        config.set_library_path(lib_path.into());
    }
    if let Ok(backend) = std::env::var("LIBRIS_BACKEND") {
        config.core.backend = backend.parse()?;
    }
    if let Some(backend) = &cli.backend {
        config.core.backend = backend.parse()?;
    }

    tracing::debug!(backend = %config.core.backend, library = %config.core.library_path, "resolved configuration");

    if timing {
        eprintln!("[timing] config loaded in {:.1}ms", start.elapsed().as_secs_f64() * 1000.0);
    }

    match cli.command {
        Commands::Add { title, author, year, genre, read, rating, favorite, cover } => {
            let mut draft = BookDraft::new(title, author, year, genre)
                .read(read)
                .favorite(favorite);
            draft.rating = rating;
            draft.cover_upload = cover;

            let covers = Covers::from_config(&config);
            covers.ensure_dir()?;
            let book = draft.into_book(&covers)?;

            let mut store = open_store(&config)?;
            let added = store.add(book)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":added,"meta":{"duration_ms":dur}}))?;
            } else {
                println!("Book added successfully: {}", added);
            }
        }

        Commands::Remove { id, title } => {
            let key = match (id, title) {
                (Some(id), _) => BookKey::Id(id),
                (None, Some(title)) => BookKey::Title(title),
                (None, None) => {
                    return Err(LibrisError::Validation("either --id or --title is required".into()).into());
                }
            };

            let mut store = open_store(&config)?;
            let removed = store.remove(&key)?;
            let dur = start.elapsed().as_millis();

            if removed == 0 {
                if json_output {
                    print_json(&serde_json::json!({"status":"error","error":"not_found","message":format!("No book with {key}"),"meta":{"duration_ms":dur}}))?;
                } else {
                    eprintln!("No book with {key}.");
                }
                std::process::exit(ExitCode::NotFound.into());
            }

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"removed":removed,"key":key.to_string()},"meta":{"duration_ms":dur}}))?;
            } else {
                println!("Removed {removed} book(s) with {key}.");
            }
        }

        Commands::Search { field, term } => {
            let field: SearchField = field.parse()?;
            if term.trim().is_empty() {
                return Err(LibrisError::Validation("search term is required".into()).into());
            }

            let store = open_store(&config)?;
            let results = store.search(field, &term)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": results, "total": results.len(), "field": field, "term": term },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if results.is_empty() {
                println!("No matching books found.");
            } else {
                println!("Matching books:");
                for book in &results {
                    print_book(book);
                }
            }
        }

        Commands::List => {
            let store = open_store(&config)?;
            let books = store.list_all()?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": books, "total": books.len() },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if books.is_empty() {
                println!("Your library is empty. Use `libris add` to add books.");
            } else {
                for book in &books {
                    print_book(book);
                }
            }
        }

        Commands::Stats => {
            let store = open_store(&config)?;
            let stats = store.statistics()?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": {
                        "total_books": stats.total,
                        "read_books": stats.read,
                        "favorite_books": stats.favorites,
                        "read_percentage": stats.read_percentage,
                        "empty": stats.is_empty(),
                    },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if stats.is_empty() {
                println!("No books in the library.");
            } else {
                println!("Library statistics:");
                println!("  Total books:    {}", stats.total);
                println!("  Books read:     {} ({:.1}%)", stats.read, stats.read_percentage);
                println!("  Favorite books: {}", stats.favorites);
            }
        }

        Commands::Transfer { to } => {
            let target: Backend = to.parse()?;
            let source_backend = config.core.backend;
            if target == source_backend {
                return Err(LibrisError::Validation(format!(
                    "source and target backend are both {target}"
                ))
                .into());
            }

            let source = open_store(&config)?;
            let mut dest = open_backend(&config, target)?;
            let count = transfer(&*source, &mut *dest)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"from":source_backend,"to":target,"transferred":count},"meta":{"duration_ms":dur}}))?;
            } else {
                println!("Transferred {count} book(s) from {source_backend} to {target}.");
            }
        }

        // ── Config ─────────────────────────────────────────────────────────

        Commands::Config { action } => {
            let dur = start.elapsed().as_millis();
            let kv = config.key_values();
            match action {
                ConfigAction::List => {
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":kv,"meta":{"duration_ms":dur}}))?;
                    } else {
                        for (k, v) in &kv {
                            println!("{k} = {v}");
                        }
                    }
                }
                ConfigAction::Get { key } => match kv.get(key.as_str()) {
                    Some(val) => {
                        if json_output {
                            print_json(&serde_json::json!({"status":"ok","data":{"key":key,"value":val},"meta":{"duration_ms":dur}}))?;
                        } else {
                            println!("{val}");
                        }
                    }
                    None => {
                        eprintln!("Unknown config key: {key}");
                        std::process::exit(ExitCode::NotFound.into());
                    }
                },
            }
        }

        // ── Doctor ─────────────────────────────────────────────────────────

        Commands::Doctor => {
            let config_path = AppConfig::config_path();
            if config_path.exists() {
                println!("✓ Config: {}", config_path.display());
            } else {
                println!("○ Config: not found (using defaults)");
            }

            let mut issues = 0;
            match open_store(&config) {
                Ok(store) => {
                    let count = store.statistics().map(|s| s.total).unwrap_or(0);
                    println!("✓ Store: {} backend at {} ({count} books)", config.core.backend, store_path(&config).display());
                }
                Err(e) => {
                    issues += 1;
                    println!("✗ Store: {e}");
                }
            }

            let covers = Covers::from_config(&config);
            if covers.dir().is_dir() {
                let missing: Vec<&String> = config
                    .covers
                    .defaults
                    .values()
                    .filter(|file| !covers.dir().join(file.as_str()).is_file())
                    .collect();
                if missing.is_empty() {
                    println!("✓ Covers: {}", covers.dir().display());
                } else {
                    println!(
                        "○ Covers: {} ({} default image(s) missing, covers will be skipped)",
                        covers.dir().display(),
                        missing.len()
                    );
                }
            } else {
                println!("○ Covers: directory not created yet");
            }

            if issues == 0 {
                println!("\nAll checks passed ✓");
            } else {
                println!("\n{issues} issues found");
                std::process::exit(ExitCode::GeneralError.into());
            }
        }

        // ── Version ────────────────────────────────────────────────────────

        Commands::Version => {
            let version = env!("CARGO_PKG_VERSION");
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":{"version":version},"meta":{"duration_ms":dur}}))?;
            } else {
                println!("libris v{version}");
            }
        }
    }

    if timing {
        eprintln!("[timing] total {:.1}ms", start.elapsed().as_secs_f64() * 1000.0);
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn print_book(book: &StoredBook) {
    println!("{book}");
    if let Some(cover) = book.book.existing_cover() {
        println!("   cover: {}", cover.display());
    }
}

fn open_store(config: &AppConfig) -> Result<Box<dyn BookStore>> {
    Ok(libris_core::open_store(config)?)
}

fn store_path(config: &AppConfig) -> PathBuf {
    match config.core.backend {
        Backend::Json => config.library_file(),
        Backend::Sqlite => config.database_path(),
    }
}

/// Print `err` in the active output mode and pick the exit code.
fn report_error(err: &anyhow::Error, json_output: bool, start: Instant) -> ExitCode {
    let (kind, code) = match err.downcast_ref::<LibrisError>() {
        Some(e) => (e.kind(), e.exit_code()),
        None => ("general", ExitCode::GeneralError),
    };

    if json_output {
        let dur = start.elapsed().as_millis();
        let body = serde_json::json!({"status":"error","error":kind,"message":err.to_string(),"meta":{"duration_ms":dur}});
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string()));
    } else {
        eprintln!("Error: {err:#}");
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_with_defaults() {
        let cli = Cli::try_parse_from([
            "libris", "add", "--title", "Dune", "--author", "Frank Herbert", "--year", "1965",
            "--genre", "Science",
        ])
        .unwrap();

        match cli.command {
            Commands::Add { title, year, read, rating, favorite, cover, .. } => {
                assert_eq!(title, "Dune");
                assert_eq!(year, 1965);
                assert!(!read);
                assert!(!favorite);
                assert_eq!(rating, None);
                assert!(cover.is_none());
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_add_requires_title() {
        let res = Cli::try_parse_from([
            "libris", "add", "--author", "A", "--year", "2000", "--genre", "G",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn test_remove_needs_exactly_one_key() {
        assert!(Cli::try_parse_from(["libris", "remove"]).is_err());
        assert!(Cli::try_parse_from(["libris", "remove", "--id", "1", "--title", "X"]).is_err());
        assert!(Cli::try_parse_from(["libris", "remove", "--id", "1"]).is_ok());
        assert!(Cli::try_parse_from(["libris", "remove", "--title", "X"]).is_ok());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["libris", "list", "--json", "--backend", "sqlite"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.backend.as_deref(), Some("sqlite"));
    }

    #[test]
    fn test_report_error_maps_exit_codes() {
        let start = Instant::now();
        let err = anyhow::Error::from(LibrisError::InvalidSearchField("year".into()));
        assert_eq!(report_error(&err, false, start), ExitCode::InvalidArgs);

        let err = anyhow::anyhow!("something else");
        assert_eq!(report_error(&err, false, start), ExitCode::GeneralError);
    }
}
