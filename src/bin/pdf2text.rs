//! CLI binary for pdf2text.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf2text::{
    convert, inspect, ConversionConfig, ConversionProgressCallback, ConversionReport,
    OcrLanguages, PageError, PageSelection, ProgressCallback, TesseractOcr, TextSource,
};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

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

/// Live progress bar with one log line per finished page.
/// Pages may finish out of order when `--concurrency` > 1.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    /// Spinner until `on_conversion_start` tells us the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Exporting");
        self.bar.reset_eta();
    }

    /// Remove the bar without a summary, for runs that end in a fatal error.
    fn abandon(&self) {
        self.bar.finish_and_clear();
    }

    fn elapsed_secs(&self, page_num: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&page_num))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Exporting {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, text_chars: usize, source: TextSource) {
        let secs = self.elapsed_secs(page_num);
        let origin = match source {
            TextSource::Native => "native",
            TextSource::Ocr => "ocr",
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {:<6}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{text_chars:>5} chars")),
            dim(origin),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(page_num);

        let msg: String = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        let failed = total_pages.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages exported successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages exported  ({} failed)",
                if failed == total_pages {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Export every page of report.pdf into ./report/
  pdf2text convert report.pdf

  # Sharper images, write under /tmp/out/report/
  pdf2text convert --zoom 3 --output-dir /tmp/out report.pdf

  # English-only OCR with a stricter threshold
  pdf2text convert --ocr-langs eng --threshold 50 scan.pdf

  # First five pages, four pages finished in parallel
  pdf2text convert --pages 1-5 --concurrency 4 book.pdf

  # Machine-readable report; exit 2 if any page failed
  pdf2text convert --json --strict report.pdf > report.json

  # Document metadata only
  pdf2text inspect report.pdf

OUTPUT:
  <output-dir>/<pdf-basename>/page_<n>.png   rendered page
  <output-dir>/<pdf-basename>/page_<n>.txt   native text, or OCR text when the
                                             native text has fewer than
                                             --threshold characters

EXIT CODES:
  0  every selected page was exported (or page failures without --strict)
  1  fatal error: missing input, unreadable PDF, output folder not creatable
  2  --strict and at least one page failed

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH     Path to libpdfium (file or directory)
  TESSERACT_CMD       Tesseract executable
  TESSDATA_PREFIX     Tesseract language data (read by tesseract itself)
  RUST_LOG            Log filter, overrides -v / -q
"#;

/// Export PDF pages as PNG images and UTF-8 text, with OCR fallback.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2text",
    version,
    about = "Export PDF pages as PNG images and text files, with OCR fallback",
    long_about = "Render every page of a PDF to page_<n>.png and save its text to \
page_<n>.txt. Pages with little or no embedded text are run through Tesseract \
(Persian, Arabic and English by default).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2TEXT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF2TEXT_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export pages as page_<n>.png and page_<n>.txt.
    Convert(ConvertArgs),

    /// Print document metadata without exporting anything.
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// PDF file to export.
    input: PathBuf,

    /// Render zoom factor applied to both axes.
    #[arg(long, env = "PDF2TEXT_ZOOM", default_value_t = 2.0)]
    zoom: f32,

    /// OCR languages combined in one pass, e.g. fas+ara+eng.
    #[arg(long, env = "PDF2TEXT_OCR_LANGS", default_value = "fas+ara+eng")]
    ocr_langs: OcrLanguages,

    /// Minimum trimmed native-text length before OCR is skipped.
    #[arg(long, env = "PDF2TEXT_THRESHOLD", default_value_t = 30)]
    threshold: usize,

    /// Directory that receives the <pdf-basename>/ folder.
    #[arg(short, long, env = "PDF2TEXT_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF2TEXT_PAGES", default_value = "all")]
    pages: PageSelection,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2TEXT_PASSWORD")]
    password: Option<String>,

    /// Pages finished (OCR + writes) in parallel.
    #[arg(short, long, env = "PDF2TEXT_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Never run OCR; short native text is written as-is.
    #[arg(long, env = "PDF2TEXT_NO_OCR")]
    no_ocr: bool,

    /// Tesseract executable.
    #[arg(long, env = "PDF2TEXT_TESSERACT_CMD")]
    tesseract_cmd: Option<PathBuf>,

    /// Directory with *.traineddata files (sets TESSDATA_PREFIX for tesseract).
    #[arg(long, env = "PDF2TEXT_TESSDATA_DIR")]
    tessdata_dir: Option<PathBuf>,

    /// pdfium shared library, or the directory holding it.
    #[arg(long, env = "PDF2TEXT_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Print the conversion report as JSON on stdout.
    #[arg(long, env = "PDF2TEXT_JSON")]
    json: bool,

    /// Exit with code 2 when any page failed.
    #[arg(long, env = "PDF2TEXT_STRICT")]
    strict: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2TEXT_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// PDF file to inspect.
    input: PathBuf,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2TEXT_PASSWORD")]
    password: Option<String>,

    /// pdfium shared library, or the directory holding it.
    #[arg(long, env = "PDF2TEXT_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Print metadata as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", red("error:"), e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let show_progress = match &cli.command {
        Command::Convert(args) => !cli.quiet && !args.no_progress && !args.json,
        Command::Inspect(_) => false,
    };
    init_logging(cli.verbose, cli.quiet, show_progress);

    match cli.command {
        Command::Inspect(args) => run_inspect(args).await,
        Command::Convert(args) => run_convert(args, cli.quiet, show_progress).await,
    }
}

/// Logs go to stderr; the progress bar replaces INFO lines when it is shown.
fn init_logging(verbose: bool, quiet: bool, show_progress: bool) {
    let filter = if verbose {
        "debug"
    } else if quiet || show_progress {
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
}

async fn run_inspect(args: InspectArgs) -> Result<ExitCode> {
    let mut builder = ConversionConfig::builder().disable_ocr(true);
    if let Some(ref pwd) = args.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref lib) = args.pdfium_lib {
        builder = builder.pdfium_library(lib.clone());
    }
    let config = builder.build().context("Invalid configuration")?;

    let meta = inspect(&args.input, &config)
        .await
        .context("Failed to inspect PDF")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
        );
        return Ok(ExitCode::SUCCESS);
    }

    println!("File:         {}", args.input.display());
    if let Some(ref t) = meta.title {
        println!("Title:        {}", t);
    }
    if let Some(ref a) = meta.author {
        println!("Author:       {}", a);
    }
    if let Some(ref s) = meta.subject {
        println!("Subject:      {}", s);
    }
    println!("Pages:        {}", meta.page_count);
    println!("PDF Version:  {}", meta.pdf_version);
    if let Some(ref p) = meta.producer {
        println!("Producer:     {}", p);
    }
    if let Some(ref c) = meta.creator {
        println!("Creator:      {}", c);
    }
    if let Some(ref d) = meta.creation_date {
        println!("Created:      {}", d);
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_convert(args: ConvertArgs, quiet: bool, show_progress: bool) -> Result<ExitCode> {
    // Probe before the spinner starts so the warning is not drawn under it.
    if !args.no_ocr {
        let probe = TesseractOcr::new(args.tesseract_cmd.clone(), args.tessdata_dir.clone());
        let binary = probe.binary().to_path_buf();
        let available = tokio::task::spawn_blocking(move || probe.is_available())
            .await
            .unwrap_or(false);
        if !available && !quiet {
            eprintln!("{} {}", cyan("⚠"), tesseract_missing_message(&binary));
        }
    }

    let cli_progress = show_progress.then(CliProgressCallback::new_dynamic);
    let progress_cb: Option<ProgressCallback> = cli_progress
        .clone()
        .map(|cb| cb as Arc<dyn ConversionProgressCallback>);

    let config = match build_config(&args, progress_cb) {
        Ok(config) => config,
        Err(e) => {
            if let Some(ref cb) = cli_progress {
                cb.abandon();
            }
            return Err(e);
        }
    };

    let report = match convert(&args.input, &config).await {
        Ok(report) => report,
        Err(e) => {
            // Fatal errors arrive before any page, while the spinner still ticks.
            if let Some(ref cb) = cli_progress {
                cb.abandon();
            }
            return Err(anyhow::Error::new(e).context("Conversion failed"));
        }
    };

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !quiet && !show_progress {
        eprintln!(
            "Exported {}/{} pages ({} via OCR) to {} in {}ms",
            report.stats.processed_pages,
            report.stats.selected_pages,
            report.stats.ocr_pages,
            report.output_dir.display(),
            report.stats.total_duration_ms
        );
    } else if !quiet {
        eprintln!(
            "   {} via OCR  —  {}  —  {}ms total",
            dim(&report.stats.ocr_pages.to_string()),
            bold(&report.output_dir.display().to_string()),
            report.stats.total_duration_ms,
        );
    }

    // Failures are always listed, even with --quiet.
    print_failure_summary(&report);

    if args.strict && !report.is_complete() {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

fn print_failure_summary(report: &ConversionReport) {
    if report.is_complete() {
        return;
    }
    eprintln!(
        "{} {} of {} pages failed:",
        red("✘"),
        report.stats.failed_pages,
        report.stats.selected_pages
    );
    for failure in report.failures() {
        eprintln!("{}", failure_line(failure));
    }
}

/// One summary line; skipped pages have no artifacts, the others are partial.
fn failure_line(failure: &PageError) -> String {
    let status = if failure.skips_page() {
        "skipped"
    } else {
        "partial"
    };
    format!("  page {:>3} ({status}): {failure}", failure.page())
}

fn tesseract_missing_message(binary: &Path) -> String {
    format!(
        "tesseract not found at '{}'; pages without enough embedded text will get empty text files",
        binary.display()
    )
}

/// Map CLI args to `ConversionConfig`.
fn build_config(args: &ConvertArgs, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .zoom(args.zoom)
        .ocr_languages(args.ocr_langs.clone())
        .sufficiency_threshold(args.threshold)
        .pages(args.pages.clone())
        .concurrency(args.concurrency)
        .disable_ocr(args.no_ocr);

    if let Some(ref dir) = args.output_dir {
        builder = builder.output_root(dir.clone());
    }
    if let Some(ref pwd) = args.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref cmd) = args.tesseract_cmd {
        builder = builder.tesseract_cmd(cmd.clone());
    }
    if let Some(ref dir) = args.tessdata_dir {
        builder = builder.tessdata_dir(dir.clone());
    }
    if let Some(ref lib) = args.pdfium_lib {
        builder = builder.pdfium_library(lib.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
