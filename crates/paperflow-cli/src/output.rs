use std::io::Write;
use std::path::Path;

use owo_colors::OwoColorize;
use paperflow_core::{AnalyzedPaper, BatchEvent, BatchOutcome, Language};
use paperflow_reporting::{Labels, format_plain};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the batch header before any file is processed.
pub fn print_batch_header(
    w: &mut dyn Write,
    file_count: usize,
    preview: bool,
    color: ColorMode,
) -> std::io::Result<()> {
    let msg = format!(
        "Analyzing {} paper{}{}",
        file_count,
        if file_count == 1 { "" } else { "s" },
        if preview { "" } else { " (previews disabled)" }
    );
    if color.enabled() {
        writeln!(w, "{}", msg.bold())?;
    } else {
        writeln!(w, "{}", msg)?;
    }
    writeln!(w)?;
    Ok(())
}

/// Print one line for a per-file outcome. Returns without output for events
/// the spinner already covers.
pub fn print_event(w: &mut dyn Write, event: &BatchEvent, color: ColorMode) -> std::io::Result<()> {
    match event {
        BatchEvent::PaperReady { index, total, paper } => {
            let title = short_title(&paper.meta.paper_title, 60);
            if color.enabled() {
                writeln!(w, "[{}/{}] -> {} {}", index + 1, total, "DONE".green(), title)?;
            } else {
                writeln!(w, "[{}/{}] -> DONE {}", index + 1, total, title)?;
            }
        }
        BatchEvent::FileFailed {
            index,
            total,
            file_name,
            error,
        } => {
            if color.enabled() {
                writeln!(
                    w,
                    "[{}/{}] -> {} {}: {}",
                    index + 1,
                    total,
                    "FAILED".red(),
                    file_name,
                    error.dimmed()
                )?;
            } else {
                writeln!(w, "[{}/{}] -> FAILED {}: {}", index + 1, total, file_name, error)?;
            }
        }
        BatchEvent::Started { .. } | BatchEvent::Analyzing { .. } | BatchEvent::Complete { .. } => {}
    }
    Ok(())
}

/// Print the text of one analyzed paper in the chosen language.
pub fn print_paper(
    w: &mut dyn Write,
    paper: &AnalyzedPaper,
    language: Language,
    color: ColorMode,
) -> std::io::Result<()> {
    let labels = Labels::for_language(language);
    let content = paper.content(language);
    let meta = &paper.meta;

    writeln!(w)?;
    let sep = "=".repeat(60);
    if color.enabled() {
        writeln!(w, "{}", sep.bold().cyan())?;
        writeln!(w, "{}", meta.paper_title.bold())?;
        writeln!(w, "{}", sep.bold().cyan())?;
    } else {
        writeln!(w, "{}", sep)?;
        writeln!(w, "{}", meta.paper_title)?;
        writeln!(w, "{}", sep)?;
    }

    let facts: Vec<&str> = [
        &meta.model_name,
        &meta.publish_year,
        &meta.journal_venue,
        &meta.parameter_count,
    ]
    .into_iter()
    .map(|s| s.trim())
    .filter(|s| !s.is_empty())
    .collect();
    writeln!(w, "{}", facts.join(" | "))?;
    if !meta.authors_team.trim().is_empty() {
        writeln!(w, "{}", meta.authors_team.trim())?;
    }
    match paper.repo_url() {
        Some(url) if color.enabled() => writeln!(w, "{} {}", "Repo:".green(), url.underline())?,
        Some(url) => writeln!(w, "Repo: {}", url)?,
        None => {}
    }

    let sections = [
        (labels.architecture, &content.model_architecture_desc),
        (labels.key_results, &content.key_results),
        (labels.downstream_tasks, &content.downstream_tasks),
        ("Source", &content.pretrain_data_source),
        ("Tokenization", &content.tokenization_method),
        (labels.data_strategy, &content.pretrain_strategy),
        (labels.ablation_failure, &content.ablation_failure_analysis),
        (labels.benchmarks, &content.benchmarks_comparisons),
    ];
    for (label, text) in sections {
        if text.trim().is_empty() {
            continue;
        }
        writeln!(w)?;
        if color.enabled() {
            writeln!(w, "{}", label.bold().yellow())?;
        } else {
            writeln!(w, "{}", label)?;
        }
        for line in format_plain(text) {
            writeln!(w, "  {}", line)?;
        }
    }
    Ok(())
}

/// Print the batch summary, including every failed file.
pub fn print_summary(w: &mut dyn Write, outcome: &BatchOutcome, color: ColorMode) -> std::io::Result<()> {
    writeln!(w)?;
    let sep = "=".repeat(60);
    if color.enabled() {
        writeln!(w, "{}", sep.bold())?;
        writeln!(w, "{}", "SUMMARY".bold())?;
        writeln!(w, "{}", sep.bold())?;
    } else {
        writeln!(w, "{}", sep)?;
        writeln!(w, "SUMMARY")?;
        writeln!(w, "{}", sep)?;
    }

    writeln!(w, "  Files submitted: {}", outcome.total())?;
    if color.enabled() {
        writeln!(w, "  {} {}", "Analyzed:".green(), outcome.papers.len())?;
    } else {
        writeln!(w, "  Analyzed: {}", outcome.papers.len())?;
    }
    let with_repo = outcome.papers.iter().filter(|p| p.has_repo_link).count();
    writeln!(w, "  With code repository: {}", with_repo)?;

    if !outcome.failures.is_empty() {
        if color.enabled() {
            writeln!(w, "  {} {}", "Failed:".red(), outcome.failures.len())?;
        } else {
            writeln!(w, "  Failed: {}", outcome.failures.len())?;
        }
        for failure in &outcome.failures {
            let line = format!("- {}: {}", failure.file_name, failure.error);
            if color.enabled() {
                writeln!(w, "    {}", line.dimmed())?;
            } else {
                writeln!(w, "    {}", line)?;
            }
        }
    }
    writeln!(w)?;
    Ok(())
}

/// Print where an export was written.
pub fn print_export(w: &mut dyn Write, label: &str, path: &Path, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", format!("{} report:", label).bold(), path.display())?;
    } else {
        writeln!(w, "{} report: {}", label, path.display())?;
    }
    Ok(())
}

fn short_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() > max_chars {
        let cut: String = title.chars().take(max_chars).collect();
        format!("\"{}...\"", cut)
    } else {
        format!("\"{}\"", title)
    }
}
