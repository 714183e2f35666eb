// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use toolbelt::{
    config::{Config, DesktopSettings, LoadshedSettings, MusicSettings, ReposSettings},
    desktop::{Desktop, Mode},
    ergo::{self, SummaryOptions},
    loadshed::Scheduler,
    music::{
        distribute::Distributor,
        download::{DownloadOptions, Downloader},
    },
    news::{self, NewsOptions},
    path::config_file,
    pdf::{Qpdf, ReplaceOptions},
    prompt::InquirePrompter,
    pwned::Checker,
    repos::{self, ReposOptions},
    shortcut::{
        convert::{convert, Direction},
        html::{make_shortcut, ShortcutOptions},
    },
    syscall::System,
    term::Style,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::{env::current_dir, path::PathBuf, process::exit};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "toolbelt [options] <command> [<args>]...",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Use configuration file at path instead of the default one.
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    async fn run(self) -> Result<()> {
        let path = match self.config {
            Some(path) => path,
            None => config_file()?,
        };
        let config = Config::load(path)?;

        match self.command {
            Command::Pdf(command) => run_pdf(command),
            Command::Music(command) => run_music(command, config.music),
            Command::Shortcut(command) => run_shortcut(command, &config.shortcut.icon).await,
            Command::Pwned(opts) => run_pwned(opts).await,
            Command::Ergo(opts) => run_ergo(opts),
            Command::News(opts) => run_news(opts).await,
            Command::Loadshed(opts) => run_loadshed(opts, config.loadshed).await,
            Command::Desktop(command) => run_desktop(command, config.desktop),
            Command::Repos(opts) => run_repos(opts, config.repos),
            Command::Config => run_config(&config),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Edit PDF documents through qpdf.
    #[command(subcommand)]
    Pdf(PdfCommand),

    /// Download songs, or distribute them over a USB stick.
    #[command(subcommand)]
    Music(MusicCommand),

    /// Create or convert web shortcuts.
    #[command(subcommand)]
    Shortcut(ShortcutCommand),

    /// Check whether passwords appear in known data breaches.
    #[command(override_usage = "toolbelt pwned [options]")]
    Pwned(PwnedOptions),

    /// Determine what premises of the game Ergo prove.
    #[command(override_usage = "toolbelt ergo [options] <premise>...")]
    Ergo(ErgoOptions),

    /// Show current events from Wikipedia.
    #[command(override_usage = "toolbelt news [options]")]
    News(NewsArgs),

    /// Schedule shutdowns ahead of load-shedding.
    #[command(override_usage = "toolbelt loadshed [options] [<stage>]")]
    Loadshed(LoadshedOptions),

    /// Toggle desktop environment settings.
    #[command(subcommand)]
    Desktop(DesktopCommand),

    /// Summarize state of git repositories below a directory.
    #[command(override_usage = "toolbelt repos [options] [<root>]")]
    Repos(ReposArgs),

    /// Print effective configuration.
    Config,
}

#[derive(Debug, Clone, Subcommand)]
enum PdfCommand {
    /// Collect pages from several documents into one.
    #[command(override_usage = "toolbelt pdf splice [options] -o <output> <input> [<pages>]...")]
    Splice(SpliceOptions),

    /// Find and replace text inside a document.
    #[command(override_usage = "toolbelt pdf replace [options] <find> <input> <output>")]
    Replace(ReplaceArgs),

    /// Rotate pages of a document.
    #[command(override_usage = "toolbelt pdf rotate [options] <input> <output>")]
    Rotate(RotateOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct SpliceOptions {
    /// Input documents, each optionally followed by a page range like 1-6,8.
    #[arg(required = true, value_name = "input")]
    pub inputs: Vec<String>,

    /// Path to write spliced document to.
    #[arg(short, long, value_name = "output")]
    pub output: PathBuf,

    /// Take bookmarks and other document data from this file.
    #[arg(short, long, value_name = "path")]
    pub metadata: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ReplaceArgs {
    /// Text to find.
    #[arg(value_name = "find")]
    pub find: String,

    #[arg(value_name = "input")]
    pub input: PathBuf,

    #[arg(value_name = "output")]
    pub output: PathBuf,

    /// Text to replace matches with.
    #[arg(short, long, default_value = "", value_name = "text")]
    pub replacement: String,

    /// Match text exactly, without tolerating kerning fragments.
    #[arg(short, long)]
    pub verbatim: bool,

    /// Match case-insensitively.
    #[arg(short, long)]
    pub ignore_case: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct RotateOptions {
    #[arg(value_name = "input")]
    pub input: PathBuf,

    #[arg(value_name = "output")]
    pub output: PathBuf,

    /// Angle to rotate by. A leading + or - makes it relative.
    #[arg(short, long, default_value = "+90", allow_hyphen_values = true, value_name = "angle")]
    pub angle: String,

    /// Pages to rotate, where 1-z means all of them.
    #[arg(short, long, default_value = "1-z", value_name = "range")]
    pub pages: String,
}

#[derive(Debug, Clone, Subcommand)]
enum MusicCommand {
    /// Download songs from a list of URLs, and trim silence off them.
    #[command(override_usage = "toolbelt music download [options]")]
    Download(DownloadArgs),

    /// Spread songs over numbered directories of fixed size.
    #[command(override_usage = "toolbelt music distribute [options]")]
    Distribute(DistributeOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct DownloadArgs {
    /// File of URLs or search terms, one per line.
    #[arg(short, long, default_value = "song-list.txt", value_name = "path")]
    pub song_list: PathBuf,

    /// Download whole playlists that URLs point into.
    #[arg(short, long)]
    pub playlist: bool,

    /// Keep going when a download fails.
    #[arg(short, long)]
    pub force: bool,

    /// Only report failures.
    #[arg(short, long)]
    pub quiet: bool,

    /// Work in the current directory instead of the downloads directory.
    #[arg(short, long)]
    pub wd: bool,

    /// Do not trim silence off songs.
    #[arg(long, group = "skip")]
    pub notrim: bool,

    /// Do not download, only trim songs already present.
    #[arg(long, group = "skip")]
    pub nodownload: bool,

    /// Keep song list after downloading.
    #[arg(long)]
    pub noclear: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct DistributeOptions {
    /// Directory holding the buckets. Defaults to the current directory.
    #[arg(short, long, value_name = "path")]
    pub root: Option<PathBuf>,

    /// Reference music library to check songs against.
    #[arg(short, long, value_name = "path")]
    pub library: Option<PathBuf>,

    /// Number of songs per bucket.
    #[arg(short, long, value_name = "count")]
    pub bucket_size: Option<usize>,

    /// Skip offering to update songs whose content differs from the library.
    #[arg(long)]
    pub nocompare: bool,
}

#[derive(Debug, Clone, Subcommand)]
enum ShortcutCommand {
    /// Create an HTML file that redirects to a URL.
    #[command(override_usage = "toolbelt shortcut html [options]")]
    Html(HtmlOptions),

    /// Convert between .url and .desktop shortcuts.
    #[command(override_usage = "toolbelt shortcut convert [options] [<file>]...")]
    Convert(ConvertOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct HtmlOptions {
    /// URL to link to. Read from the clipboard if absent.
    #[arg(short, long, value_name = "url")]
    pub url: Option<String>,

    /// Name of shortcut. Taken from the page title if absent.
    #[arg(short, long, value_name = "name")]
    pub name: Option<String>,

    /// Keep site names in page titles.
    #[arg(long)]
    pub notrim: bool,

    /// Only allow letters, digits, spaces, and -._() in the name.
    #[arg(short, long)]
    pub strict: bool,

    /// Directory to write shortcut into.
    #[arg(short, long, default_value = ".", value_name = "path")]
    pub dir: PathBuf,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ConvertOptions {
    /// Shortcuts to convert. Converts every one in the directory if absent.
    #[arg(value_name = "file")]
    pub files: Vec<PathBuf>,

    /// Convert .desktop files into .url files instead.
    #[arg(short, long)]
    pub reverse: bool,

    /// Directory to look for shortcuts in.
    #[arg(short, long, default_value = ".", value_name = "path")]
    pub dir: PathBuf,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct PwnedOptions {
    /// Echo passwords as they are typed, and print them in results.
    #[arg(short, long)]
    pub reveal: bool,

    /// Keep asking for passwords until an empty one is entered.
    #[arg(short, long = "loop")]
    pub repeat: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ErgoOptions {
    /// Premises using atomics a-d, and operators => v ^ ~.
    #[arg(required = true, allow_hyphen_values = true, value_name = "premise")]
    pub premises: Vec<String>,

    /// Print fully parenthesized premises first.
    #[arg(short = 'c', long)]
    pub print_compiled: bool,

    /// Spell results out in words.
    #[arg(short, long)]
    pub plain_text: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct NewsArgs {
    /// Number of days to show, including today.
    #[arg(short, long, value_name = "count")]
    pub days: Option<u64>,

    /// Maximum width of output.
    #[arg(short, long, value_name = "columns")]
    pub width: Option<usize>,

    /// Indent of nested bullets.
    #[arg(short, long, default_value_t = 3, value_name = "columns")]
    pub indent: usize,

    /// Leave out blank lines between bullets.
    #[arg(short, long)]
    pub compact: bool,

    /// Always style output.
    #[arg(long, group = "styling")]
    pub ansi: bool,

    /// Never style output.
    #[arg(long, group = "styling")]
    pub no_ansi: bool,

    /// Page output through less.
    #[arg(short, long)]
    pub less: bool,

    /// Leave out category icons.
    #[arg(long)]
    pub no_icons: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct LoadshedOptions {
    /// Stage to plan for instead of the current one.
    #[arg(value_name = "stage")]
    pub stage: Option<String>,
}

#[derive(Debug, Clone, Subcommand)]
enum DesktopCommand {
    /// Switch between dark and light appearance.
    #[command(override_usage = "toolbelt desktop dark-mode [<mode>]")]
    DarkMode(ToggleOptions),

    /// Route microphone input to the speakers.
    #[command(override_usage = "toolbelt desktop loopback [<mode>]")]
    Loopback(ToggleOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ToggleOptions {
    #[arg(value_enum, default_value_t = Mode::Toggle, value_name = "mode")]
    pub mode: Mode,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ReposArgs {
    /// Directory to scan for repositories.
    #[arg(value_name = "root")]
    pub root: Option<PathBuf>,

    /// Maximum directory depth to scan.
    #[arg(short, long, value_name = "depth")]
    pub depth: Option<usize>,

    /// Fetch upstream remotes first.
    #[arg(short, long)]
    pub fetch: bool,

    /// Only list repositories with changes, or out of sync with upstream.
    #[arg(long)]
    pub dirty: bool,
}

#[tokio::main]
async fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run().await {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

async fn run() -> Result<()> {
    Cli::parse().run().await
}

fn run_pdf(command: PdfCommand) -> Result<()> {
    let qpdf = Qpdf::new(System);
    match command {
        PdfCommand::Splice(opts) => {
            qpdf.splice(opts.inputs, &opts.output, opts.metadata.as_deref())?;
        }
        PdfCommand::Replace(opts) => {
            let replace = ReplaceOptions {
                replacement: opts.replacement,
                verbatim: opts.verbatim,
                ignore_case: opts.ignore_case,
            };
            qpdf.replace(&opts.find, &opts.input, &opts.output, &replace)?;
        }
        PdfCommand::Rotate(opts) => {
            qpdf.rotate(&opts.input, &opts.output, &opts.angle, &opts.pages)?;
        }
    }

    Ok(())
}

fn run_music(command: MusicCommand, settings: MusicSettings) -> Result<()> {
    match command {
        MusicCommand::Download(opts) => {
            let workdir = if opts.wd {
                current_dir()?
            } else {
                settings.downloads
            };
            let download = DownloadOptions {
                downloader: settings.downloader,
                song_list: opts.song_list,
                playlist: opts.playlist,
                force: opts.force,
                quiet: opts.quiet,
                download: !opts.nodownload,
                clear: !opts.noclear,
                trim: !opts.notrim,
            };
            Downloader::new(System, workdir, download).run()?;
        }
        MusicCommand::Distribute(opts) => {
            let root = match opts.root {
                Some(root) => root,
                None => current_dir()?,
            };
            let report = Distributor::new(
                InquirePrompter,
                root,
                opts.library.unwrap_or(settings.library),
                opts.bucket_size.unwrap_or(settings.bucket_size),
                !opts.nocompare,
            )
            .run()?;
            info!(
                "{} moved, {} removed, {} updated",
                report.moved.len(),
                report.removed.len(),
                report.updated.len()
            );
        }
    }

    Ok(())
}

async fn run_shortcut(command: ShortcutCommand, icon: &str) -> Result<()> {
    match command {
        ShortcutCommand::Html(opts) => {
            let shortcut_opts = ShortcutOptions {
                url: opts.url,
                name: opts.name,
                trim: !opts.notrim,
                strict: opts.strict,
            };
            let shortcut = make_shortcut(&shortcut_opts, &opts.dir).await?;
            println!("URL: {}", shortcut.url);
            println!("Site: {}", shortcut.site);
            println!("Name: {}", shortcut.name);
        }
        ShortcutCommand::Convert(opts) => {
            let direction = if opts.reverse {
                Direction::DesktopToUrl
            } else {
                Direction::UrlToDesktop
            };
            for path in convert(&opts.files, direction, &opts.dir, icon)? {
                info!("wrote {:?}", path.display());
            }
        }
    }

    Ok(())
}

async fn run_pwned(opts: PwnedOptions) -> Result<()> {
    Checker::new(InquirePrompter, opts.reveal, opts.repeat)
        .run()
        .await?;
    Ok(())
}

fn run_ergo(opts: ErgoOptions) -> Result<()> {
    let premises = ergo::compile(&opts.premises)?;
    let summary_opts = SummaryOptions {
        print_compiled: opts.print_compiled,
        plain_text: opts.plain_text,
    };
    println!("{}", ergo::summary(&premises, summary_opts, &Style::auto()));
    Ok(())
}

async fn run_news(opts: NewsArgs) -> Result<()> {
    let ansi = match (opts.ansi, opts.no_ansi) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    let news_opts = NewsOptions {
        days: opts.days,
        width: opts.width,
        indent: opts.indent,
        compact: opts.compact,
        ansi,
        less: opts.less,
        icons: !opts.no_icons,
    };
    news::run(&news_opts).await?;
    Ok(())
}

async fn run_loadshed(opts: LoadshedOptions, settings: LoadshedSettings) -> Result<()> {
    Scheduler::new(System, settings).run(opts.stage).await?;
    Ok(())
}

fn run_desktop(command: DesktopCommand, settings: DesktopSettings) -> Result<()> {
    let desktop = Desktop::new(System, settings);
    match command {
        DesktopCommand::DarkMode(opts) => desktop.dark_mode(opts.mode)?,
        DesktopCommand::Loopback(opts) => desktop.loopback(opts.mode)?,
    };

    Ok(())
}

fn run_repos(opts: ReposArgs, settings: ReposSettings) -> Result<()> {
    let repos_opts = ReposOptions {
        root: opts.root.unwrap_or(settings.root),
        depth: opts.depth.unwrap_or(settings.depth),
        fetch: opts.fetch,
        dirty: opts.dirty,
    };
    let statuses = repos::run(&repos_opts)?;
    if statuses.is_empty() {
        info!("no repositories to report in {:?}", repos_opts.root.display());
        return Ok(());
    }

    for line in repos::render(&statuses, &repos_opts.root, &Style::auto()) {
        println!("{line}");
    }

    Ok(())
}

fn run_config(config: &Config) -> Result<()> {
    print!("{config}");
    Ok(())
}
