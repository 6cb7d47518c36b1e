use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use thiserror::Error;

use paperflow_core::{AnalyzedPaper, Language};

use crate::card::{CardState, CardView, render_card};
use crate::format::html_escape;
use crate::types::ExportFormat;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize results: {0}")]
    Json(#[from] serde_json::Error),
}

/// Export `papers` to `path` in the given format.
pub fn export_results(
    papers: &[AnalyzedPaper],
    language: Language,
    format: ExportFormat,
    path: &Path,
    generated_at: DateTime<Utc>,
) -> Result<(), ExportError> {
    let content = match format {
        ExportFormat::Html => export_html(papers, language, generated_at),
        ExportFormat::Json => export_json(papers)?,
    };

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    tracing::info!(path = %path.display(), papers = papers.len(), format = format.label(), "report exported");
    Ok(())
}

/// Default download name for an export, unique per millisecond.
pub fn export_filename(
    language: Language,
    format: ExportFormat,
    generated_at: DateTime<Utc>,
) -> String {
    match format {
        ExportFormat::Html => format!(
            "PaperFlow_Report_{}_{}.html",
            language,
            generated_at.timestamp_millis()
        ),
        ExportFormat::Json => format!(
            "PaperFlow_Results_{}.json",
            generated_at.timestamp_millis()
        ),
    }
}

/// Pretty-printed JSON array of the records.
pub fn export_json(papers: &[AnalyzedPaper]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(papers)?)
}

/// Read records back from a JSON export.
pub fn load_json(path: &Path) -> Result<Vec<AnalyzedPaper>, ExportError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Flip-card stylesheet shared by the export and the web view.
pub const CARD_CSS: &str = r#"
* { box-sizing: border-box; }
body {
  font-family: 'Inter', -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
  background: radial-gradient(circle at 10% 20%, rgb(239, 246, 255) 0%, rgb(219, 228, 255) 90%);
  color: #334155;
  margin: 0;
  padding: 60px 20px;
  min-height: 100vh;
}
.report-header { text-align: center; margin-bottom: 60px; }
.report-header h1 {
  font-weight: 200;
  color: #475569;
  letter-spacing: 0.2em;
  text-transform: uppercase;
  font-size: 14px;
}

/* 3D flip */
.flip-container {
  perspective: 2000px;
  position: relative;
  max-width: 72rem;
  margin: 0 auto 3rem;
}
.flip-inner {
  position: relative;
  width: 100%;
  display: grid;
  grid-template-areas: "stack";
  transition: transform 0.8s cubic-bezier(0.175, 0.885, 0.32, 1.275);
  transform-style: preserve-3d;
}
.flip-container.flipped .flip-inner { transform: rotateY(180deg); }
.flip-face {
  grid-area: stack;
  backface-visibility: hidden;
  -webkit-backface-visibility: hidden;
  width: 100%;
  padding: 2.5rem;
}
.flip-front { z-index: 2; }
.flip-back { transform: rotateY(180deg); z-index: 1; }

/* Glass */
.glass-panel {
  position: relative;
  background: linear-gradient(135deg, rgba(255, 255, 255, 0.85) 0%, rgba(255, 255, 255, 0.45) 100%);
  backdrop-filter: blur(30px) saturate(140%);
  -webkit-backdrop-filter: blur(30px) saturate(140%);
  border-radius: 24px;
  box-shadow: 0 25px 40px -12px rgba(31, 38, 135, 0.15), 0 10px 15px -3px rgba(31, 38, 135, 0.05);
}
.etched-glass {
  background: rgba(255, 255, 255, 0.3);
  box-shadow: inset 0 2px 6px rgba(0, 0, 0, 0.03);
  border: 1px solid rgba(255, 255, 255, 0.4);
  padding: 20px;
  border-radius: 16px;
}
.chips { display: flex; flex-wrap: wrap; gap: 8px; margin-bottom: 1rem; }
.glass-chip {
  display: inline-block;
  padding: 4px 14px;
  font-size: 11px;
  font-weight: 700;
  text-transform: uppercase;
  letter-spacing: 0.05em;
  background: linear-gradient(135deg, rgba(255, 255, 255, 0.9), rgba(255, 255, 255, 0.5));
  border: 1px solid rgba(255, 255, 255, 0.6);
  border-radius: 999px;
  color: #475569;
  text-decoration: none;
  box-shadow: 0 2px 8px rgba(0, 0, 0, 0.03);
}
.glass-chip.repo-chip { color: #047857; border-color: #a7f3d0; background: rgba(236, 253, 245, 0.4); }
.flip-btn {
  background: rgba(255, 255, 255, 0.6);
  border: 1px solid rgba(255, 255, 255, 0.6);
  padding: 8px 20px;
  border-radius: 99px;
  font-size: 11px;
  font-weight: 700;
  text-transform: uppercase;
  letter-spacing: 0.1em;
  color: #475569;
  cursor: pointer;
  transition: all 0.2s;
}
.flip-btn:hover { background: #fff; transform: scale(1.05); }
.flip-row { display: flex; justify-content: flex-end; margin-top: 20px; }
.back-btn { position: absolute; bottom: 30px; right: 30px; }

/* Typography */
.card-title { font-size: 2.25rem; line-height: 2.5rem; margin: 0; letter-spacing: -0.02em; color: #1e293b; }
.back-header {
  display: flex;
  justify-content: space-between;
  align-items: center;
  gap: 16px;
  margin-bottom: 24px;
  padding-bottom: 16px;
  border-bottom: 1px solid rgba(226, 232, 240, 0.5);
}
.back-title { font-size: 1.25rem; color: #475569; font-weight: 700; margin: 0; }
.byline { display: flex; align-items: center; gap: 8px; margin: 12px 0 32px; }
.byline .rule { height: 1px; width: 30px; background: rgba(148, 163, 184, 0.5); }
.byline p { color: #64748b; font-weight: 500; }
.model-name { color: #2563eb; }
h3 {
  font-size: 0.75rem;
  font-weight: 800;
  text-transform: uppercase;
  letter-spacing: 0.2em;
  color: #94a3b8;
  margin: 0 0 0.75rem;
}
p { font-size: 0.875rem; margin: 0 0 0.75rem; line-height: 1.8; }
strong { color: #0f172a; font-weight: 700; }
ul.bullets { margin: 0 0 0.75rem; padding-left: 1.25rem; }
ul.bullets li { font-size: 0.875rem; line-height: 1.8; margin-bottom: 0.5rem; }

/* Layout */
.grid-layout { display: grid; grid-template-columns: 1fr; gap: 40px; }
@media (min-width: 1024px) { .grid-layout { grid-template-columns: 5fr 7fr; } }
.row-layout { display: grid; grid-template-columns: 1fr; gap: 24px; }
@media (min-width: 768px) { .row-layout { grid-template-columns: 1fr 1fr; } }
.section-box { margin-bottom: 24px; }
.highlight-box {
  background: linear-gradient(135deg, rgba(239, 246, 255, 0.4), rgba(238, 242, 255, 0.4));
  padding: 20px;
  border-radius: 16px;
  border: 1px solid rgba(255, 255, 255, 0.6);
}
.tasks-box {
  background: rgba(255, 255, 255, 0.25);
  padding: 20px;
  border-radius: 16px;
  border: 1px solid rgba(255, 255, 255, 0.4);
}
.strategy { margin-top: 8px; padding-top: 8px; border-top: 1px solid rgba(0, 0, 0, 0.05); }
.ablation-box {
  color: #881337;
  background: rgba(255, 241, 242, 0.3);
  padding: 16px;
  border-radius: 12px;
  border: 1px solid rgba(255, 228, 230, 0.4);
}
.benchmarks { margin: 24px 0 48px; padding-left: 12px; border-left: 2px solid rgba(226, 232, 240, 0.6); }
.benchmarks-body { font-style: italic; color: #64748b; }

/* Preview */
.image-placeholder {
  position: relative;
  aspect-ratio: 3 / 4;
  width: 100%;
  padding: 8px;
  overflow: hidden;
  cursor: pointer;
  border-radius: 16px;
  background-color: rgba(255, 255, 255, 0.3);
  border: 1px solid rgba(255, 255, 255, 0.6);
  box-shadow: 0 10px 30px -10px rgba(0, 0, 0, 0.1);
}
.image-placeholder img { width: 100%; height: 100%; object-fit: cover; border-radius: 10px; transition: transform 0.5s; }
.image-placeholder img:hover { transform: scale(1.05); }
.no-preview { display: flex; align-items: center; justify-content: center; height: 100%; color: #94a3b8; font-size: 12px; }
.expand-hint {
  position: absolute;
  bottom: 15px;
  left: 50%;
  transform: translateX(-50%);
  background: rgba(0, 0, 0, 0.3);
  color: #fff;
  padding: 4px 12px;
  border-radius: 20px;
  font-size: 10px;
  font-weight: bold;
  text-transform: uppercase;
  opacity: 0;
  transition: opacity 0.3s;
}
.image-placeholder:hover .expand-hint { opacity: 1; }
.hint { font-size: 10px; color: #94a3b8; text-align: center; letter-spacing: 0.1em; text-transform: uppercase; margin-top: 8px; }

/* Lightbox */
#lightbox, .card-lightbox {
  position: fixed;
  inset: 0;
  background: rgba(15, 23, 42, 0.7);
  z-index: 9999;
  align-items: center;
  justify-content: center;
  padding: 40px;
  backdrop-filter: blur(12px);
}
#lightbox { display: none; }
.card-lightbox { display: flex; }
#lightbox img, .card-lightbox img {
  max-width: 90%;
  max-height: 90%;
  border-radius: 12px;
  box-shadow: 0 25px 50px -12px rgba(0, 0, 0, 0.5);
}
.card-lightbox .close {
  position: absolute;
  top: 16px;
  right: 16px;
  color: rgba(255, 255, 255, 0.8);
  font-size: 0.875rem;
  padding: 4px 12px;
  border-radius: 999px;
  background: rgba(0, 0, 0, 0.2);
  cursor: pointer;
}
"#;

/// Client-side behavior of the static export.
const EXPORT_SCRIPT: &str = r#"
function toggleFlip(elementId) {
  var el = document.getElementById(elementId);
  if (el) el.classList.toggle('flipped');
}
function expandImage(event, imgId) {
  event.stopPropagation();
  var img = document.getElementById(imgId);
  if (!img) return;
  document.getElementById('lightbox-img').src = img.src;
  document.getElementById('lightbox').style.display = 'flex';
}
function closeLightbox(event, cardId) {
  event.stopPropagation();
  event.currentTarget.remove();
}
"#;

/// Render a complete, self-contained HTML report.
///
/// Cards are numbered `card-0`, `card-1`, ... in record order and start
/// front-side up with the lightbox closed. The output depends only on the
/// inputs, so two exports of the same records differ only where
/// `generated_at` is printed.
pub fn export_html(papers: &[AnalyzedPaper], language: Language, generated_at: DateTime<Utc>) -> String {
    let mut out = String::with_capacity(16384 + papers.len() * 8192);

    out.push_str(&format!(
        "<!DOCTYPE html>\n<html lang=\"{}\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <meta name=\"generated\" content=\"{}\">\n\
         <title>PaperFlow Report - {}</title>\n<style>",
        language.html_lang(),
        html_escape(&generated_at.to_rfc3339()),
        generated_at.format("%Y-%m-%d")
    ));
    out.push_str(CARD_CSS);
    out.push_str("</style>\n</head>\n<body>\n");
    out.push_str("<div class=\"report-header\"><h1>PaperFlow Bilingual Report</h1></div>\n");

    let state = CardState::default();
    for (index, paper) in papers.iter().enumerate() {
        let view = CardView::build(paper, language);
        out.push_str(&render_card(&view, &state, &format!("card-{}", index)));
    }

    out.push_str(
        "<div id=\"lightbox\" onclick=\"this.style.display='none'\"><img id=\"lightbox-img\" src=\"\" alt=\"\"></div>\n",
    );
    out.push_str("<script>");
    out.push_str(EXPORT_SCRIPT);
    out.push_str("</script>\n</body>\n</html>\n");
    out
}
