use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use officescout::{
    ChannelReporter, ConfigOverrides, FileKind, Scout, ScoutConfig, SearchEvent, SearchOptions,
    SearchOutput,
};
use std::io::{self, BufRead};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::thread;
use tracing_subscriber::EnvFilter;

mod output;

use output::{print_cache_info, print_search_output, OutputMode};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (YAML), applied on top of the default locations
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EngineArgs {
    /// Number of worker threads
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Entries kept per content cache
    #[arg(long)]
    cache_capacity: Option<NonZeroUsize>,

    /// Keep legacy .doc matches that look like field codes or markup
    #[arg(long)]
    no_markup_filter: bool,
}

#[derive(Args)]
struct OutputArgs {
    /// Print match records as JSON
    #[arg(long)]
    json: bool,

    /// Show only statistics, not matches
    #[arg(short, long)]
    stats: bool,
}

#[derive(Args)]
struct SearchArgs {
    /// Comma-separated keywords
    #[arg(short = 'k', long)]
    keywords: String,

    /// Root directory to search in
    #[arg(short = 'd', long, default_value = ".")]
    root: PathBuf,

    /// Match keywords case-sensitively
    #[arg(long)]
    case_sensitive: bool,

    /// Document types to search (excel,word)
    #[arg(short = 't', long = "types", value_delimiter = ',')]
    file_types: Vec<FileKind>,

    /// Decode every file even if it is cached
    #[arg(long)]
    no_cache: bool,

    #[command(flatten)]
    engine: EngineArgs,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct SessionArgs {
    /// Initial root directory
    #[arg(short = 'd', long)]
    root: Option<PathBuf>,

    #[command(flatten)]
    engine: EngineArgs,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Search Word and Excel documents for keywords
    Search(Box<SearchArgs>),

    /// Read commands from stdin, keeping caches between searches
    ///
    /// Commands: `root [DIR]`, `search KEYWORDS`, `cache`, `clear`, `quit`.
    Session(Box<SessionArgs>),
}

impl EngineArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            concurrency: self.threads,
            cache_capacity: self.cache_capacity,
            markup_filter: self.no_markup_filter.then_some(false),
            ..ConfigOverrides::default()
        }
    }
}

impl OutputArgs {
    fn mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.stats {
            OutputMode::Stats
        } else {
            OutputMode::Matches
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let file_config = ScoutConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Search(args) => {
            let mut overrides = args.engine.overrides();
            if args.case_sensitive {
                overrides.case_sensitive = Some(true);
            }
            if args.no_cache {
                overrides.cache_enabled = Some(false);
            }
            if !args.file_types.is_empty() {
                overrides.file_types = Some(args.file_types.iter().copied().collect());
            }
            let config = file_config.merge_with_cli(overrides);
            init_tracing(&config.log_level);

            let scout = Scout::new(config);
            let options = SearchOptions::from_config(scout.config(), &args.root, &args.keywords);
            let output = search_with_progress(&scout, &options)?;
            print_search_output(&output, &scout, args.output.mode())
        }
        Commands::Session(args) => {
            let config = file_config.merge_with_cli(args.engine.overrides());
            init_tracing(&config.log_level);

            let mut scout = Scout::new(config);
            scout.select_root(args.root);
            run_session(&mut scout, args.output.mode(), io::stdin().lock())
        }
    }
}

/// Logs go to stderr; `RUST_LOG` wins over the configured level
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Runs one search while a second thread draws progress and prints errors
fn search_with_progress(scout: &Scout, options: &SearchOptions) -> Result<SearchOutput> {
    let (reporter, events) = ChannelReporter::unbounded();
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files ({percent}%)")?
            .progress_chars("=>-"),
    );

    let result = thread::scope(|scope| {
        let listener = {
            let bar = bar.clone();
            scope.spawn(move || {
                for event in events.iter() {
                    match event {
                        SearchEvent::Progress(progress) => {
                            bar.set_length(progress.total as u64);
                            bar.set_position(progress.current as u64);
                        }
                        SearchEvent::Error(error) => {
                            bar.println(format!("{} {}", "error:".red().bold(), error));
                        }
                    }
                }
            })
        };

        let result = scout.search(options, &reporter);
        drop(reporter);
        listener
            .join()
            .map_err(|_| anyhow!("progress thread panicked"))?;
        result.map_err(anyhow::Error::from)
    });

    bar.finish_and_clear();
    result
}

fn run_session(scout: &mut Scout, mode: OutputMode, input: impl BufRead) -> Result<()> {
    for line in input.lines() {
        let line = line?;
        let (command, rest) = match line.trim().split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line.trim(), ""),
        };

        match command {
            "" => continue,
            "quit" | "exit" => break,
            "root" => {
                let chosen = (!rest.is_empty()).then(|| PathBuf::from(rest));
                match scout.select_root(chosen) {
                    Some(root) => println!("Root set to {} (caches cleared)", root.display()),
                    None => println!("No root selected (caches cleared)"),
                }
            }
            "search" => {
                let Some(root) = scout.root().map(PathBuf::from) else {
                    eprintln!("{} no root selected, use `root DIR`", "error:".red().bold());
                    continue;
                };
                let options = SearchOptions::from_config(scout.config(), root, rest);
                match search_with_progress(scout, &options) {
                    Ok(output) => print_search_output(&output, scout, mode)?,
                    Err(e) => eprintln!("{} {:#}", "error:".red().bold(), e),
                }
            }
            "cache" => print_cache_info("Cache", scout.cache_info()),
            "clear" => print_cache_info("Cache cleared", scout.clear_cache()),
            other => eprintln!(
                "{} unknown command '{}' (root, search, cache, clear, quit)",
                "error:".red().bold(),
                other
            ),
        }
    }
    Ok(())
}
