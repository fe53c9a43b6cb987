use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use pubfolio_core::config_file;
use pubfolio_core::{
    Collection, Config, DblpClient, LocalDir, PersonSource, XmlConverter, collect_papers,
    render_page, sort_papers,
};

mod output;

use output::ColorMode;

/// Publication list renderer - Build HTML publication lists from DBLP person records
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file (default: platform config cascaded with ./.pubfolio.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Where person records come from.
#[derive(Args, Debug)]
struct SourceArgs {
    /// DBLP person identifiers (e.g. 84/5849)
    #[arg(required = true)]
    pids: Vec<String>,

    /// Read `<DIR>/<pid>.xml` instead of fetching from DBLP
    #[arg(long)]
    xml_dir: Option<PathBuf>,

    /// Person URL template; `{pid}` is replaced by the identifier
    #[arg(long)]
    url_template: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Highlight an author: PID=CLASS (repeatable)
    #[arg(long = "highlight", value_parser = parse_highlight)]
    highlight: Vec<(String, String)>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the publication list of one or more persons as an HTML page
    Render {
        #[command(flatten)]
        source: SourceArgs,

        /// Path to the output HTML file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Page title
        #[arg(long)]
        title: Option<String>,
    },

    /// Print the sorted publication list to the terminal
    List {
        #[command(flatten)]
        source: SourceArgs,

        /// Include entries that rendering would skip (e.g. informal preprints)
        #[arg(long)]
        all: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// POST the sorted publications as JSON and print the JSON reply
    Post {
        /// Endpoint receiving the JSON array
        url: String,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Convert a local XML file to JSON with the generic converter
    Convert {
        /// XML file to convert
        file: PathBuf,

        /// Tag that is always an array (repeatable)
        #[arg(long = "array-tag")]
        array_tags: Vec<String>,
    },
}

fn parse_highlight(s: &str) -> Result<(String, String), String> {
    match s.rsplit_once('=') {
        Some((pid, class)) if !pid.is_empty() && !class.is_empty() => {
            Ok((pid.to_string(), class.to_string()))
        }
        _ => Err(format!("expected PID=CLASS, got `{s}`")),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let file_config = match &cli.config {
        Some(path) => config_file::read_from_path(path)?,
        None => config_file::load_config(),
    };
    let base = Config::from_file(&file_config);

    match cli.command {
        Command::Render {
            source,
            output,
            title,
        } => render(base, source, output, title).await,
        Command::List {
            source,
            all,
            no_color,
        } => list(base, source, all, no_color).await,
        Command::Post { url, source } => post(base, source, &url).await,
        Command::Convert { file, array_tags } => convert(file, array_tags),
    }
}

/// Resolve configuration: CLI flags > env vars > config file > defaults
fn resolve_config(mut config: Config, args: &SourceArgs) -> Config {
    if let Ok(template) = std::env::var("PUBFOLIO_URL_TEMPLATE") {
        config.url_template = template;
    }
    if let Some(secs) = std::env::var("PUBFOLIO_TIMEOUT")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        config.timeout = Some(Duration::from_secs(secs));
    }

    if let Some(ref template) = args.url_template {
        config.url_template = template.clone();
    }
    if let Some(secs) = args.timeout {
        config.timeout = Some(Duration::from_secs(secs));
    }
    config.highlight.extend(args.highlight.iter().cloned());
    config
}

fn client_for(config: &Config) -> DblpClient {
    DblpClient::new(reqwest::Client::new(), config.url_template.clone()).with_timeout(config.timeout)
}

/// Fetch, convert and merge the papers of every requested person.
async fn gather(config: &Config, args: &SourceArgs) -> Collection {
    let converter = config.converter();
    let source: Box<dyn PersonSource> = match &args.xml_dir {
        Some(dir) => Box::new(LocalDir::new(dir)),
        None => Box::new(client_for(config)),
    };
    collect_papers(source.as_ref(), args.pids.as_slice(), &converter).await
}

async fn render(
    base: Config,
    args: SourceArgs,
    output: Option<PathBuf>,
    title: Option<String>,
) -> anyhow::Result<()> {
    let config = resolve_config(base, &args);
    let collection = gather(&config, &args).await;
    output::print_failures(&mut std::io::stderr(), &collection.failures, ColorMode(false))?;

    let papers = sort_papers(collection.papers);
    let title = title.or_else(|| config.page_title.clone());
    let (html, stats) = render_page(
        title.as_deref(),
        &papers,
        &collection.failures,
        &config.render_options(),
    );
    tracing::info!(
        rendered = stats.rendered,
        skipped = stats.skipped,
        failed = stats.failed,
        "rendered publication list"
    );

    match output {
        Some(path) => {
            std::fs::write(&path, html)?;
            eprintln!("Wrote {} papers to {}", stats.rendered, path.display());
        }
        None => {
            let mut stdout = std::io::stdout();
            stdout.write_all(html.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

async fn list(base: Config, args: SourceArgs, all: bool, no_color: bool) -> anyhow::Result<()> {
    let config = resolve_config(base, &args);
    let color = ColorMode(!no_color);
    let collection = gather(&config, &args).await;
    output::print_failures(&mut std::io::stderr(), &collection.failures, color)?;

    let papers = sort_papers(collection.papers);
    let mut stdout = std::io::stdout();
    let printed = output::print_listing(&mut stdout, &papers, &config.render_options(), all, color)?;
    tracing::debug!(printed, total = papers.len(), "listing done");
    Ok(())
}

async fn post(base: Config, args: SourceArgs, url: &str) -> anyhow::Result<()> {
    let config = resolve_config(base, &args);
    let collection = gather(&config, &args).await;
    output::print_failures(&mut std::io::stderr(), &collection.failures, ColorMode(false))?;

    if collection.papers.is_empty() {
        anyhow::bail!("No publications found for {}", args.pids.join(", "));
    }

    let papers = sort_papers(collection.papers);
    let reply = client_for(&config).post_json(url, &papers).await?;
    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

fn convert(file: PathBuf, array_tags: Vec<String>) -> anyhow::Result<()> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }
    let xml = std::fs::read_to_string(&file)?;
    let value = XmlConverter::with_array_tags(array_tags).convert(&xml)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
