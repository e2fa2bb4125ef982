//! Fateseal - Main Binary
//!
//! Converts decklist files into Tabletop Simulator saved objects

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use fateseal_rs::{
    export::export_file_name,
    loader::{
        raw_deck_to_deck_list_string, DatabaseCache, DeckListLoader, DiskStore, FileSource,
        LoadedDatabase,
    },
    logger::{Logger, VerbosityLevel},
    session::{
        export_deck, fix_all_errors, parse_deck, reduce, DeckAction, DeckState, ParseResult,
        MIN_PARSE_LENGTH,
    },
    FatesealError,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Verbosity level for log output (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

impl From<VerbosityArg> for VerbosityLevel {
    fn from(arg: VerbosityArg) -> Self {
        arg.0
    }
}

#[derive(Parser)]
#[command(name = "fateseal")]
#[command(about = "Fateseal - decklists to Tabletop Simulator saved objects", long_about = None)]
struct Cli {
    /// Verbosity level for log output (0=silent, 1=minimal, 2=normal, 3=verbose)
    #[arg(long, short = 'v', global = true, default_value = "normal")]
    verbosity: VerbosityArg,

    #[command(subcommand)]
    command: Commands,
}

/// Where card data comes from and where it is cached
#[derive(Args, Debug)]
struct DatabaseArgs {
    /// Directory holding cards.json and last-updated.json
    #[arg(long, value_name = "DIR")]
    data_dir: PathBuf,

    /// Local cache directory (default: <DATA_DIR>/.fateseal-cache)
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,
}

impl DatabaseArgs {
    fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join(".fateseal-cache"))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a decklist and print it in canonical form (no card database needed)
    Parse {
        /// Decklist file
        #[arg(value_name = "DECKLIST")]
        deck: PathBuf,
    },

    /// Resolve a decklist and print cards, extras and errors
    Resolve {
        /// Decklist file
        #[arg(value_name = "DECKLIST")]
        deck: PathBuf,

        #[command(flatten)]
        database: DatabaseArgs,
    },

    /// Write a Tabletop Simulator save file for a decklist
    Export {
        /// Decklist file
        #[arg(value_name = "DECKLIST")]
        deck: PathBuf,

        #[command(flatten)]
        database: DatabaseArgs,

        /// Output path (default: <NAME>.json)
        #[arg(long, short = 'o', value_name = "PATH")]
        out: Option<PathBuf>,

        /// Card back image URL
        #[arg(long, value_name = "URL")]
        custom_back: Option<String>,

        /// Image URL for a custom commander card placed on top of the deck
        #[arg(long, value_name = "URL")]
        custom_commander: Option<String>,

        /// Deck name (default: decklist file stem)
        #[arg(long)]
        name: Option<String>,

        /// Apply every suggested fix before exporting
        #[arg(long)]
        fix_all: bool,
    },

    /// Force a fresh download of the card database into the cache
    Refresh {
        #[command(flatten)]
        database: DatabaseArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logger = Arc::new(Logger::with_verbosity(cli.verbosity.into()));

    match cli.command {
        Commands::Parse { deck } => run_parse(&deck)?,
        Commands::Resolve { deck, database } => run_resolve(&deck, &database, logger).await?,
        Commands::Export {
            deck,
            database,
            out,
            custom_back,
            custom_commander,
            name,
            fix_all,
        } => {
            let options = ExportOptions {
                out,
                custom_back: custom_back.unwrap_or_default(),
                custom_commander: custom_commander.unwrap_or_default(),
                name,
                fix_all,
            };
            run_export(&deck, &database, &options, logger).await?
        }
        Commands::Refresh { database } => run_refresh(&database, logger).await?,
    }

    Ok(())
}

fn run_parse(deck: &Path) -> anyhow::Result<()> {
    let raw_deck = DeckListLoader::load_from_file(deck)
        .with_context(|| format!("failed to parse {}", deck.display()))?;
    println!("{}", raw_deck_to_deck_list_string(&raw_deck));
    Ok(())
}

type Cache = DatabaseCache<FileSource, DiskStore>;

/// Load the database, serving the cache when possible
async fn open_database(
    args: &DatabaseArgs,
    logger: Arc<Logger>,
) -> anyhow::Result<(Cache, Arc<LoadedDatabase>, Option<JoinHandle<bool>>)> {
    let cache = DatabaseCache::new(
        FileSource::new(&args.data_dir),
        DiskStore::new(args.cache_dir()),
        logger,
    );
    let update_check = cache
        .initialize()
        .await
        .context("failed to load card database")?;
    let loaded = cache.snapshot().ok_or_else(|| {
        FatesealError::DatabaseUnavailable("no card data was loaded".to_string())
    })?;
    Ok((cache, loaded, update_check))
}

/// Let a background update check finish so the next run starts fresh
async fn finish_update_check(update_check: Option<JoinHandle<bool>>) -> anyhow::Result<()> {
    if let Some(handle) = update_check {
        handle.await.map_err(FatesealError::from)?;
    }
    Ok(())
}

async fn run_resolve(deck: &Path, args: &DatabaseArgs, logger: Arc<Logger>) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(deck)
        .with_context(|| format!("failed to read {}", deck.display()))?;
    let (_cache, loaded, update_check) = open_database(args, logger).await?;

    let result = parse_deck(&text, "", &loaded, MIN_PARSE_LENGTH)
        .with_context(|| format!("failed to parse {}", deck.display()))?;
    print_resolution(&result);

    finish_update_check(update_check).await
}

fn print_resolution(result: &ParseResult) {
    println!("Cards ({}):", result.cards.len());
    for card in &result.cards {
        println!("  {} [{}]", card.name, card.id);
    }

    if !result.extras.is_empty() {
        println!("Extras ({}):", result.extras.len());
        for extra in &result.extras {
            println!("  {} [{}]", extra.name, extra.id);
        }
    }

    if !result.error_cards.is_empty() {
        println!("Errors ({}):", result.error_cards.len());
        for error in &result.error_cards {
            match &error.fix {
                Some(fix) => println!(
                    "  {}x {}: {} (did you mean {fix}?)",
                    error.card.quantity, error.card.name, error.error
                ),
                None => println!(
                    "  {}x {}: {}",
                    error.card.quantity, error.card.name, error.error
                ),
            }
        }
    }
}

struct ExportOptions {
    out: Option<PathBuf>,
    custom_back: String,
    custom_commander: String,
    name: Option<String>,
    fix_all: bool,
}

async fn run_export(
    deck: &Path,
    args: &DatabaseArgs,
    options: &ExportOptions,
    logger: Arc<Logger>,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(deck)
        .with_context(|| format!("failed to read {}", deck.display()))?;
    let (_cache, loaded, update_check) = open_database(args, Arc::clone(&logger)).await?;

    let deck_name = options.name.clone().unwrap_or_else(|| {
        deck.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    let state = DeckState {
        deck_name,
        deck_list: text,
        custom_back_url: options.custom_back.clone(),
        custom_commander_url: options.custom_commander.clone(),
        ..Default::default()
    };
    let result = parse_deck(
        &state.deck_list,
        &state.custom_commander_url,
        &loaded,
        MIN_PARSE_LENGTH,
    )
    .with_context(|| format!("failed to parse {}", deck.display()))?;
    let mut state = reduce(state, DeckAction::ParseComplete(result));

    if options.fix_all {
        if let Some(action) = fix_all_errors(&state, &loaded)? {
            state = reduce(state, action);
            logger.normal("fix", "Applied suggested fixes");
        }
    }

    for error in &state.error_cards {
        logger.minimal(
            "export",
            &format!("Skipping {}x {}: {}", error.card.quantity, error.card.name, error.error),
        );
    }

    let save_file = export_deck(&state)?;
    let out = options
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(export_file_name(&state.deck_name)));
    save_file
        .write_to_file(&out)
        .with_context(|| format!("failed to write {}", out.display()))?;

    logger.normal(
        "export",
        &format!(
            "Wrote {} cards and {} extras to {}",
            state.card_count(),
            state.token_count(),
            out.display()
        ),
    );
    println!("{}", out.display());

    finish_update_check(update_check).await
}

async fn run_refresh(args: &DatabaseArgs, logger: Arc<Logger>) -> anyhow::Result<()> {
    let cache = DatabaseCache::new(
        FileSource::new(&args.data_dir),
        DiskStore::new(args.cache_dir()),
        logger,
    );
    cache
        .refresh()
        .await
        .context("failed to refresh card database")?;

    let loaded = cache.snapshot().ok_or_else(|| {
        FatesealError::DatabaseUnavailable("refresh produced no card data".to_string())
    })?;
    println!(
        "{} cards (version {})",
        loaded.db.len(),
        loaded.version.as_deref().unwrap_or("unknown")
    );
    Ok(())
}
