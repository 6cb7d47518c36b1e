use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use paperflow_core::{
    Config, DisabledThumbnails, DocumentSource, GeminiAnalyzer, Language, ThumbnailRenderer,
};
use paperflow_pdf_mupdf::MupdfThumbnailer;
use paperflow_reporting::{ExportFormat, export_filename, export_results, load_json};

mod output;

use output::ColorMode;

/// PaperFlow - Bilingual structured summaries of research papers
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze PDF papers and export a flip-card report
    Analyze {
        /// PDF files to analyze, processed in the order given
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Report language (en or zh)
        #[arg(long)]
        lang: Option<Language>,

        /// Path of the HTML report (default: generated name in the output directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the analyzed records as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Gemini API key (overrides API_KEY / GEMINI_API_KEY)
        #[arg(long)]
        api_key: Option<String>,

        /// Skip first-page previews
        #[arg(long)]
        no_preview: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Re-render a report from a JSON export without calling the backend
    Render {
        /// JSON file written by `analyze --json`
        results: PathBuf,

        /// Report language (en or zh)
        #[arg(long)]
        lang: Option<Language>,

        /// Path of the HTML report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file.as_deref())?;

    match cli.command {
        Command::Analyze {
            files,
            lang,
            output,
            json,
            api_key,
            no_preview,
            no_color,
        } => analyze(files, lang, output, json, api_key, no_preview, no_color).await,
        Command::Render {
            results,
            lang,
            output,
        } => render(&results, lang, output),
    }
}

/// Install the global subscriber. With `--log-file`, logs go through a
/// non-blocking file writer; the returned guard must live until exit.
fn init_tracing(
    log_file: Option<&Path>,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("paperflow=info"));

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid log file path: {}", path.display()))?;
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn analyze(
    files: Vec<PathBuf>,
    lang: Option<Language>,
    output: Option<PathBuf>,
    json: Option<PathBuf>,
    api_key: Option<String>,
    no_preview: bool,
    no_color: bool,
) -> anyhow::Result<()> {
    let config = Config::load(api_key);
    tracing::debug!(?config, "configuration resolved");

    // A missing credential stops the batch before any file is read
    let analyzer = GeminiAnalyzer::from_config(&config)?;
    let language = lang.unwrap_or(config.language);
    let preview = config.preview_enabled && !no_preview;

    let color = ColorMode(!no_color);
    let mut stdout = std::io::stdout();

    let thumbnailer: Arc<dyn ThumbnailRenderer> = if preview {
        Arc::new(
            MupdfThumbnailer::new()
                .with_scale(config.preview_scale)
                .with_quality(config.jpeg_quality),
        )
    } else {
        Arc::new(DisabledThumbnails)
    };

    output::print_batch_header(&mut stdout, files.len(), preview, color)?;

    let bar = indicatif::ProgressBar::new(files.len() as u64);
    bar.set_style(
        indicatif::ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {msg}")
            .unwrap()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "),
    );
    bar.enable_steady_tick(Duration::from_millis(120));

    // Event lines are printed above the spinner so they stay in the scrollback
    let event_lines = Arc::new(Mutex::new(Vec::<u8>::new()));
    let on_event = {
        let bar = bar.clone();
        let lines = Arc::clone(&event_lines);
        move |event: paperflow_core::BatchEvent| {
            if let Some(msg) = event.progress_message() {
                bar.set_message(msg);
            }
            if let Ok(mut buf) = lines.lock() {
                buf.clear();
                if output::print_event(&mut *buf, &event, color).is_ok() && !buf.is_empty() {
                    bar.println(String::from_utf8_lossy(&buf).trim_end());
                }
            }
            if matches!(
                event,
                paperflow_core::BatchEvent::PaperReady { .. }
                    | paperflow_core::BatchEvent::FileFailed { .. }
            ) {
                bar.inc(1);
            }
        }
    };

    let outcome = paperflow_core::run_batch(batch_inputs(files), &analyzer, thumbnailer, on_event).await;
    bar.finish_and_clear();

    for paper in &outcome.papers {
        output::print_paper(&mut stdout, paper, language, color)?;
    }
    output::print_summary(&mut stdout, &outcome, color)?;

    if outcome.papers.is_empty() {
        writeln!(stdout, "No papers were analyzed; nothing to export.")?;
        return Ok(());
    }

    let generated_at = chrono::Utc::now();
    let html_path = output.unwrap_or_else(|| {
        default_dir(&config).join(export_filename(language, ExportFormat::Html, generated_at))
    });
    export_results(
        &outcome.papers,
        language,
        ExportFormat::Html,
        &html_path,
        generated_at,
    )?;
    output::print_export(&mut stdout, ExportFormat::Html.label(), &html_path, color)?;

    if let Some(json_path) = json {
        export_results(
            &outcome.papers,
            language,
            ExportFormat::Json,
            &json_path,
            generated_at,
        )?;
        output::print_export(&mut stdout, ExportFormat::Json.label(), &json_path, color)?;
    }

    Ok(())
}

fn render(results: &Path, lang: Option<Language>, output: Option<PathBuf>) -> anyhow::Result<()> {
    if !results.exists() {
        anyhow::bail!("File not found: {}", results.display());
    }
    let config = Config::load(None);
    let language = lang.unwrap_or(config.language);

    let papers = load_json(results)
        .map_err(|e| anyhow::anyhow!("Could not read {}: {}", results.display(), e))?;
    tracing::info!(papers = papers.len(), %language, "re-rendering report");

    let generated_at = chrono::Utc::now();
    let html_path = output.unwrap_or_else(|| {
        default_dir(&config).join(export_filename(language, ExportFormat::Html, generated_at))
    });
    export_results(&papers, language, ExportFormat::Html, &html_path, generated_at)?;

    let mut stdout = std::io::stdout();
    output::print_export(&mut stdout, ExportFormat::Html.label(), &html_path, ColorMode(true))?;
    Ok(())
}

/// Paths are read when the batch reaches them; a missing or unreadable
/// file shows up as a failure in the summary and the rest still run.
fn batch_inputs(files: Vec<PathBuf>) -> Vec<DocumentSource> {
    files.into_iter().map(DocumentSource::from).collect()
}

fn default_dir(config: &Config) -> PathBuf {
    config.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
}
