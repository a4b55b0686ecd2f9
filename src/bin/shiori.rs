//! Shiori CLI - inspect layouts and read Komga books from a terminal.
//!
//! `shiori layout` prints the view items a page list expands to.
//! `shiori read` opens a book on a Komga server and drives a reading session
//! from stdin commands; the terminal plays the page-turn host and completes
//! every transition immediately.

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, WrapErr, eyre};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

use shiori::config::{LogLevel, ShioriConfig, default_config_path, load_config};
use shiori::prelude::*;

#[derive(Parser)]
#[command(name = "shiori")]
#[command(version, about = "Komga reader pagination engine", long_about = None)]
#[command(after_help = "EXAMPLES:
    shiori layout 800x1200 1600x1200 800x1200 --direction rtl --split auto
    shiori read 0A1B2C3D --url https://komga.example.com")]
struct Cli {
    /// Configuration file [default: <config dir>/shiori/config.toml]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true, value_enum)]
    log_level: Option<LevelArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the view items of a page list
    Layout {
        /// Page sizes as WIDTHxHEIGHT, in reading order
        #[arg(value_name = "SIZE", required = true)]
        pages: Vec<String>,

        #[command(flatten)]
        layout: LayoutArgs,
    },
    /// Read a book from the configured server
    Read {
        /// Komga book ID
        book_id: String,

        /// Server URL, overriding the config file
        #[arg(long)]
        url: Option<String>,

        /// API key, overriding the config file
        #[arg(long, env = "SHIORI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Read without saving progress
        #[arg(long)]
        incognito: bool,

        #[command(flatten)]
        layout: LayoutArgs,
    },
}

#[derive(clap::Args)]
struct LayoutArgs {
    #[arg(long, value_enum)]
    direction: Option<DirectionArg>,

    #[arg(long, value_enum)]
    split: Option<SplitArg>,

    /// Show two pages side by side
    #[arg(long)]
    dual: bool,

    /// Pair the cover with the next page in dual-page mode
    #[arg(long)]
    no_cover: bool,
}

impl LayoutArgs {
    fn apply(&self, settings: &mut ReaderSettings) {
        if let Some(direction) = self.direction {
            settings.reading_direction = direction.into();
        }
        if let Some(split) = self.split {
            settings.split_wide_page_mode = split.into();
        }
        settings.dual_page |= self.dual;
        settings.dual_page_no_cover |= self.no_cover;
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
    Ltr,
    Rtl,
    Vertical,
    Webtoon,
}

impl From<DirectionArg> for ReadingDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Ltr => ReadingDirection::Ltr,
            DirectionArg::Rtl => ReadingDirection::Rtl,
            DirectionArg::Vertical => ReadingDirection::Vertical,
            DirectionArg::Webtoon => ReadingDirection::Webtoon,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SplitArg {
    None,
    Auto,
    Ltr,
    Rtl,
}

impl From<SplitArg> for SplitWidePageMode {
    fn from(arg: SplitArg) -> Self {
        match arg {
            SplitArg::None => SplitWidePageMode::None,
            SplitArg::Auto => SplitWidePageMode::Auto,
            SplitArg::Ltr => SplitWidePageMode::Ltr,
            SplitArg::Rtl => SplitWidePageMode::Rtl,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LevelArg {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LevelArg> for LogLevel {
    fn from(arg: LevelArg) -> Self {
        match arg {
            LevelArg::Trace => LogLevel::Trace,
            LevelArg::Debug => LogLevel::Debug,
            LevelArg::Info => LogLevel::Info,
            LevelArg::Warn => LogLevel::Warn,
            LevelArg::Error => LogLevel::Error,
        }
    }
}

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

/// Installs the fmt subscriber on stderr, filtered by `RUST_LOG` if set.
fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(LogLevel::default().as_filter_str()));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

/// Applies the configured level unless `RUST_LOG` took precedence.
fn set_log_level(handle: &ReloadHandle, level: LogLevel) {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return;
    }
    if let Err(err) = handle.modify(|filter| *filter = EnvFilter::new(level.as_filter_str())) {
        warn!(%level, "Failed to update log level: {err}");
    } else {
        info!(%level, "Applied log level");
    }
}

fn parse_size(index: usize, arg: &str) -> Result<Page> {
    let (width, height) = arg
        .split_once(['x', 'X'])
        .ok_or_else(|| eyre!("page size '{arg}' is not WIDTHxHEIGHT"))?;
    let width = width.trim().parse().wrap_err_with(|| format!("bad width in '{arg}'"))?;
    let height = height.trim().parse().wrap_err_with(|| format!("bad height in '{arg}'"))?;
    Ok(Page::new(index + 1, width, height))
}

fn print_layout(layout: &Layout) {
    for (index, item) in layout.items().iter().enumerate() {
        let kind = match item {
            ViewItem::Page(_) => "page".to_string(),
            ViewItem::SplitHalf { half, .. } => format!("split {:?}", half).to_lowercase(),
            ViewItem::Dual { .. } => "dual".to_string(),
            ViewItem::End => "end".to_string(),
        };
        println!("{index:>4}  {:<8} {:<10}", layout.page_label(index), kind);
    }
}

/// Page-turn host for a terminal: shows the label and completes at once.
#[derive(Default)]
struct TerminalHost {
    pending: Option<TransitionRequest>,
}

impl PageHost for TerminalHost {
    fn present(&mut self, request: &TransitionRequest, _item: ViewItem) -> bool {
        self.pending = Some(*request);
        true
    }
}

const HELP: &str = "commands: n(ext) p(rev) l(eft) r(ight) j <page> g <item> s (show layout) q(uit)";

async fn read(
    config: ShioriConfig,
    book_id: &str,
    url: Option<String>,
    api_key: Option<String>,
) -> Result<()> {
    let mut server = config.server.clone();
    if let Some(url) = url {
        server.url = url;
    }
    if api_key.is_some() {
        server.api_key = api_key;
    }
    if server.url.is_empty() {
        return Err(eyre!("no server URL; pass --url or set [server] url in the config"));
    }

    let komga = Arc::new(KomgaSource::new(&server.url, server.auth())?);
    let cache = PageCache::new(config.cache.resolved_dir());
    let preloader = WindowPreloader::new(komga.clone(), cache.clone())
        .with_window(config.reader.preload_behind, config.reader.preload_ahead);
    let services = ReaderServices::new(komga.clone(), komga, Arc::new(preloader));

    let mut session = ReaderSession::open(
        book_id,
        services,
        config.reader.clone(),
        TerminalHost::default(),
    )
    .await?;
    println!(
        "{} ({} pages, {})",
        session.book().name,
        session.pages().len(),
        session.settings().reading_direction.display_name()
    );
    println!("{HELP}");
    println!("[{}]", session.page_label());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        let request = match (words.next(), words.next()) {
            (Some("n" | "next"), _) => session.advance(),
            (Some("p" | "prev"), _) => session.retreat(),
            (Some("l" | "left"), _) => session.step(SpatialStep::Before),
            (Some("r" | "right"), _) => session.step(SpatialStep::After),
            (Some("j" | "jump"), Some(page)) => match page.parse() {
                Ok(page) => session.jump_to_page_number(page),
                Err(_) => {
                    println!("not a page number: {page}");
                    continue;
                }
            },
            (Some("g" | "goto"), Some(item)) => match item.parse() {
                Ok(item) => session.jump_to_item(item),
                Err(_) => {
                    println!("not an item index: {item}");
                    continue;
                }
            },
            (Some("s" | "show"), _) => {
                print_layout(session.layout());
                continue;
            }
            (Some("q" | "quit"), _) => break,
            (None, _) => continue,
            _ => {
                println!("{HELP}");
                continue;
            }
        };

        match request.and(session.host_mut().pending.take()) {
            Some(request) => {
                session.transition_completed(request.item, true, Some(request.generation));
                println!("[{}] {:.0}%", session.page_label(), session.navigator().progress() * 100.0);
            }
            None => println!("[{}] (no move)", session.page_label()),
        }
    }

    session.close().await;
    if let Err(e) = cache.enforce_limit(config.cache.max_size_bytes()).await {
        warn!(error = %e, "Failed to trim page cache");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let reload_handle = init_tracing();

    let config = match cli.config.clone().or_else(default_config_path) {
        Some(path) => load_config(&path),
        None => ShioriConfig::default(),
    };
    set_log_level(
        &reload_handle,
        cli.log_level.map(Into::into).unwrap_or(config.log_level),
    );

    match cli.command {
        Command::Layout { pages, layout } => {
            let pages = pages
                .iter()
                .enumerate()
                .map(|(index, arg)| parse_size(index, arg))
                .collect::<Result<Vec<_>>>()?;
            let mut settings = config.reader;
            layout.apply(&mut settings);
            print_layout(&Layout::build(&pages, LayoutOptions::from(&settings)));
        }
        Command::Read {
            book_id,
            url,
            api_key,
            incognito,
            layout,
        } => {
            let mut config = config;
            layout.apply(&mut config.reader);
            config.reader.incognito |= incognito;
            read(config, &book_id, url, api_key).await?;
        }
    }
    Ok(())
}
