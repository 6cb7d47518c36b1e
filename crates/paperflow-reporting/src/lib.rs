pub mod card;
pub mod export;
pub mod format;
pub mod types;

pub use card::{CardFace, CardState, CardView, Chip, Labels, Lightbox, render_card, safe_href};
pub use export::{
    CARD_CSS, ExportError, export_filename, export_html, export_json, export_results, load_json,
};
pub use format::{format_plain, format_text, html_escape, render_inline, split_lines};
pub use types::ExportFormat;
