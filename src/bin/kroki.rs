//! CLI binary for kroki-render.
//!
//! A thin shim over the library crate that maps CLI flags to item
//! parameters and `BatchConfig`, then writes the rendered files.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use kroki_render::{
    read_items, render_to_file, run_batch, write_outcome, BatchConfig, BatchOutcome,
    BatchProgressCallback, DiagramType, InputItem, OutputFormat, ProgressCallback, RawParameters,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per item. Items
/// may finish out of order when `--concurrency` is above 1.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-item wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} items  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Rendering");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .map(|mut m| m.remove(&index))
            .ok()
            .flatten()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_items: usize) {
        self.bar.set_length(total_items as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Rendering {total_items} diagrams…"))
        ));
    }

    fn on_item_start(&self, index: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(index, Instant::now());
        }
        self.bar.set_message(format!("item {index}"));
    }

    fn on_item_complete(&self, index: usize, total: usize, encoded_len: usize) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} Item {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            index,
            total,
            dim(&format!("{:>7} b64", encoded_len)),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_item_error(&self, index: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(index);
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Item {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_items: usize, success_count: usize) {
        let failed = total_items.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} diagrams rendered",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} diagrams rendered  ({} failed)",
                if failed == total_items {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_items,
                red(&failed.to_string()),
            );
        }
    }

    fn on_batch_aborted(&self, _total_items: usize, _error: &str) {
        // The error itself is reported by main via anyhow.
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render a Mermaid file to PNG (writes diagram.png)
  kroki flow.mmd

  # SVG from stdin, explicit output file
  echo 'graph TD; A-->B;' | kroki - --format svg -o flow.svg

  # PlantUML through a self-hosted server
  kroki seq.puml --type plantuml --server custom --server-url http://localhost:8000

  # Batch: render every item, keep going past failures, 4 requests at a time
  kroki --items items.json -o out/ --continue-on-fail --concurrency 4

  # Batch result records as JSON (base64 attachments included)
  kroki --items items.json --json > results.json

ITEM FILE FORMAT (one object or an array of them):
  [
    {
      "diagramType": "mermaid",
      "outputFormat": "svg",
      "diagramSource": "graph TD; A-->B;",
      "krokiServer": "public",
      "customServerUrl": "",
      "options": { "timeout": 30000, "binaryPropertyName": "data" }
    }
  ]

ENVIRONMENT VARIABLES:
  KROKI_DIAGRAM_TYPE      Default diagram type
  KROKI_FORMAT            Default output format
  KROKI_SERVER            public | custom
  KROKI_SERVER_URL        Custom Kroki server root
  KROKI_TIMEOUT           Request timeout in milliseconds
  RUST_LOG                Overrides the log filter (e.g. kroki_render=debug)
"#;

/// Render text diagrams to PNG/SVG/PDF through a Kroki server.
#[derive(Parser, Debug)]
#[command(
    name = "kroki",
    version,
    about = "Render text diagrams to PNG/SVG/PDF through a Kroki server",
    long_about = "Render Mermaid, PlantUML, GraphViz, D2 and other text diagrams to images \
using the public kroki.io service or a self-hosted Kroki server. Renders a single source file \
or a batch of items described in a JSON file.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Diagram source file, or `-` for stdin.
    #[arg(conflicts_with = "items", required_unless_present_any = ["items", "list_types"])]
    source: Option<String>,

    /// JSON file of item parameters to render as a batch.
    #[arg(long, env = "KROKI_ITEMS")]
    items: Option<PathBuf>,

    /// Output file (single mode) or directory (batch mode).
    #[arg(short, long, env = "KROKI_OUTPUT")]
    output: Option<PathBuf>,

    /// Diagram type (see --list-types).
    #[arg(short = 't', long = "type", env = "KROKI_DIAGRAM_TYPE", default_value = "mermaid")]
    diagram_type: String,

    /// Output format: png, svg, pdf.
    #[arg(short, long, env = "KROKI_FORMAT", default_value = "png")]
    format: String,

    /// Kroki server to use.
    #[arg(long, env = "KROKI_SERVER", value_enum, default_value = "public")]
    server: ServerArg,

    /// Custom Kroki server root (with --server custom).
    #[arg(long, env = "KROKI_SERVER_URL")]
    server_url: Option<String>,

    /// Request timeout in milliseconds (1000–300000).
    #[arg(long, env = "KROKI_TIMEOUT", default_value_t = 30_000,
          value_parser = clap::value_parser!(u64).range(1_000..=300_000))]
    timeout: u64,

    /// Record failing items and keep going instead of aborting.
    #[arg(long, env = "KROKI_CONTINUE_ON_FAIL")]
    continue_on_fail: bool,

    /// Maximum requests in flight during a batch.
    #[arg(short, long, env = "KROKI_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Print result records as JSON instead of writing files.
    #[arg(long, env = "KROKI_JSON")]
    json: bool,

    /// Attach response diagnostics to success records.
    #[arg(long, env = "KROKI_DEBUG_INFO")]
    debug_info: bool,

    /// List supported diagram types and exit.
    #[arg(long)]
    list_types: bool,

    /// Disable progress bar.
    #[arg(long, env = "KROKI_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "KROKI_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "KROKI_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ServerArg {
    Public,
    Custom,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list_types {
        print_types();
        return Ok(());
    }

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar carries the per-item feedback; keep INFO logs out of
    // its way unless the user asked for verbose output.
    let show_progress = cli.items.is_some() && !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    match cli.items {
        Some(ref path) => run_items(&cli, path, &config).await,
        None => run_single(&cli, &config).await,
    }
}

/// Batch mode: render an item file.
async fn run_items(cli: &Cli, path: &Path, config: &BatchConfig) -> Result<()> {
    let items = read_items(path)
        .await
        .with_context(|| format!("Failed to load items from {}", path.display()))?;

    let outcome = run_batch(&items, config).await.context("Batch failed")?;

    if cli.json {
        print_json(&outcome)?;
    } else {
        let dir = cli.output.clone().unwrap_or_else(|| PathBuf::from("."));
        let written = write_outcome(&outcome, &dir)
            .await
            .context("Failed to write rendered diagrams")?;
        if !cli.quiet {
            for failed in outcome.failures() {
                eprintln!(
                    "  {} item {}: {}",
                    red("✗"),
                    failed.index(),
                    failed.error().unwrap_or("unknown error")
                );
            }
            eprintln!(
                "{}  {}/{} items  {}ms  →  {}",
                if outcome.stats.failed == 0 {
                    green("✔")
                } else {
                    cyan("⚠")
                },
                written.len(),
                outcome.stats.total_items,
                outcome.stats.duration_ms,
                bold(&dir.display().to_string()),
            );
        }
    }

    if outcome.stats.failed > 0 {
        std::process::exit(2);
    }
    Ok(())
}

/// Single mode: render one source file or stdin.
async fn run_single(cli: &Cli, config: &BatchConfig) -> Result<()> {
    let source_arg = cli.source.as_deref().unwrap_or("-");
    let source = read_source(source_arg).await?;
    let params = build_params(cli, source);

    if cli.json {
        let outcome = run_batch(&[InputItem::new(0, params)], config)
            .await
            .context("Render failed")?;
        return print_json(&outcome);
    }

    let format: OutputFormat = cli
        .format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format.file_name()));

    let start = Instant::now();
    let written = render_to_file(params, &output, config)
        .await
        .context("Render failed")?;

    if !cli.quiet {
        eprintln!(
            "{}  {} bytes  {}ms  →  {}",
            green("✔"),
            written,
            start.elapsed().as_millis(),
            bold(&output.display().to_string()),
        );
    }
    Ok(())
}

async fn read_source(arg: &str) -> Result<String> {
    if arg == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Failed to read diagram source from stdin")?;
        Ok(buf)
    } else {
        tokio::fs::read_to_string(arg)
            .await
            .with_context(|| format!("Failed to read diagram source from {arg:?}"))
    }
}

/// Map CLI flags to one item's parameters.
fn build_params(cli: &Cli, source: String) -> RawParameters {
    let mut params =
        RawParameters::new(&cli.diagram_type, &cli.format, source).with_timeout(cli.timeout);
    if let ServerArg::Custom = cli.server {
        params = params.with_custom_server(cli.server_url.clone().unwrap_or_default());
    }
    params
}

/// Map CLI flags to `BatchConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<BatchConfig> {
    let mut builder = BatchConfig::builder()
        .continue_on_fail(cli.continue_on_fail)
        .concurrency(cli.concurrency)
        .include_debug(cli.debug_info);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_json(outcome: &BatchOutcome) -> Result<()> {
    let json = serde_json::to_string_pretty(outcome).context("Failed to serialise output")?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{json}").context("Failed to write to stdout")?;
    Ok(())
}

fn print_types() {
    println!("{:<14} {:<14} DESCRIPTION", "TYPE", "NAME");
    for t in DiagramType::ALL {
        println!("{:<14} {:<14} {}", t.as_str(), t.display_name(), t.description());
    }
}
