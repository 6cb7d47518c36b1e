//! Flip-card view model, per-card interaction state and card markup.
//!
//! The same markup backs the interactive web view and the static export.

use paperflow_core::{AnalyzedPaper, Language};

use crate::format::{format_text, html_escape, render_inline};

/// Characters of the title kept in the back-face header.
const BACK_TITLE_CHARS: usize = 40;

/// Localized section and control labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Labels {
    pub architecture: &'static str,
    pub key_results: &'static str,
    pub flip_for_details: &'static str,
    pub flip_back: &'static str,
    pub downstream_tasks: &'static str,
    pub data_strategy: &'static str,
    pub ablation_failure: &'static str,
    pub benchmarks: &'static str,
    pub click_to_expand: &'static str,
    pub no_preview: &'static str,
}

const EN_LABELS: Labels = Labels {
    architecture: "Architecture Spotlight",
    key_results: "Key Results & Takeaways",
    flip_for_details: "Flip for details",
    flip_back: "Flip back",
    downstream_tasks: "Downstream Tasks Map",
    data_strategy: "Data & Strategy",
    ablation_failure: "Ablation & Failure",
    benchmarks: "Benchmarks",
    click_to_expand: "Click image to expand",
    no_preview: "No Preview Available",
};

const ZH_LABELS: Labels = Labels {
    architecture: "架构亮点",
    key_results: "核心结论",
    flip_for_details: "点击翻转查看详情",
    flip_back: "返回正面",
    downstream_tasks: "下游任务梳理",
    data_strategy: "数据与策略",
    ablation_failure: "消融与缺陷分析",
    benchmarks: "基准测试",
    click_to_expand: "点击图片放大",
    no_preview: "No Preview Available",
};

impl Labels {
    pub fn for_language(language: Language) -> &'static Labels {
        match language {
            Language::En => &EN_LABELS,
            Language::Zh => &ZH_LABELS,
        }
    }
}

/// A metadata chip. Chips never change with the language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip {
    pub text: String,
    /// Set only for the repository chip, and only for http(s) links.
    pub href: Option<String>,
    pub is_repo: bool,
}

/// Everything needed to draw one card in one language. Text fields are
/// already rendered to escaped HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub language: Language,
    pub labels: &'static Labels,
    pub chips: Vec<Chip>,
    pub title: String,
    pub short_title: String,
    pub byline: String,
    pub thumbnail: Option<String>,
    pub architecture_html: String,
    pub key_results_html: String,
    pub downstream_html: String,
    pub data_source_html: String,
    pub tokenization_html: String,
    pub strategy_html: String,
    pub ablation_html: String,
    pub benchmarks_html: String,
}

impl CardView {
    pub fn build(paper: &AnalyzedPaper, language: Language) -> Self {
        let content = paper.content(language);
        let meta = &paper.meta;

        let mut chips: Vec<Chip> = [&meta.publish_year, &meta.journal_venue, &meta.parameter_count]
            .into_iter()
            .filter(|v| !v.trim().is_empty())
            .map(|v| Chip {
                text: html_escape(v.trim()),
                href: None,
                is_repo: false,
            })
            .collect();
        if let Some(url) = paper.repo_url() {
            chips.push(Chip {
                text: "GitHub Available".to_string(),
                href: safe_href(url),
                is_repo: true,
            });
        }

        let title = meta.paper_title.trim();
        let short_title = if title.chars().count() > BACK_TITLE_CHARS {
            let cut: String = title.chars().take(BACK_TITLE_CHARS).collect();
            format!("{}...", cut.trim_end())
        } else {
            title.to_string()
        };

        Self {
            language,
            labels: Labels::for_language(language),
            chips,
            title: html_escape(title),
            short_title: html_escape(&short_title),
            byline: byline(&meta.authors_team, &meta.model_name),
            thumbnail: paper
                .thumbnail
                .as_deref()
                .filter(|uri| uri.starts_with("data:image/"))
                .map(html_escape),
            architecture_html: format_text(&content.model_architecture_desc),
            key_results_html: format_text(&content.key_results),
            downstream_html: format_text(&content.downstream_tasks),
            data_source_html: render_inline(content.pretrain_data_source.trim()),
            tokenization_html: render_inline(content.tokenization_method.trim()),
            strategy_html: format_text(&content.pretrain_strategy),
            ablation_html: format_text(&content.ablation_failure_analysis),
            benchmarks_html: format_text(&content.benchmarks_comparisons),
        }
    }
}

fn byline(authors: &str, model: &str) -> String {
    let model = format!("<span class=\"model-name\">{}</span>", html_escape(model.trim()));
    if authors.trim().is_empty() {
        model
    } else {
        format!("{} • {}", html_escape(authors.trim()), model)
    }
}

/// Escaped `href` value for `url`, or `None` for anything but http(s).
pub fn safe_href(url: &str) -> Option<String> {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("https://") || lower.starts_with("http://") {
        Some(html_escape(url))
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardFace {
    #[default]
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lightbox {
    #[default]
    Closed,
    Open,
}

/// Interaction state of one card. Face and lightbox change independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CardState {
    pub face: CardFace,
    pub lightbox: Lightbox,
}

impl CardState {
    /// Turn the card over. Returns the new face.
    pub fn flip(&mut self) -> CardFace {
        self.face = match self.face {
            CardFace::Front => CardFace::Back,
            CardFace::Back => CardFace::Front,
        };
        self.face
    }

    /// Open the lightbox. Cards without an image stay closed; returns
    /// whether the lightbox is open afterwards.
    pub fn open_lightbox(&mut self, has_image: bool) -> bool {
        if has_image {
            self.lightbox = Lightbox::Open;
        }
        self.lightbox == Lightbox::Open
    }

    pub fn close_lightbox(&mut self) {
        self.lightbox = Lightbox::Closed;
    }

    pub fn is_flipped(&self) -> bool {
        self.face == CardFace::Back
    }
}

fn write_chips(out: &mut String, chips: &[Chip]) {
    out.push_str("<div class=\"chips\" onclick=\"event.stopPropagation()\">");
    for chip in chips {
        let class = if chip.is_repo { "glass-chip repo-chip" } else { "glass-chip" };
        match &chip.href {
            Some(href) => out.push_str(&format!(
                "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\" class=\"{}\">{}</a>",
                href, class, chip.text
            )),
            None => out.push_str(&format!("<span class=\"{}\">{}</span>", class, chip.text)),
        }
    }
    out.push_str("</div>");
}

/// Render one card. `dom_id` must be unique in the page; the image gets
/// `{dom_id}-img`. An open lightbox is emitted after the card as a sibling
/// overlay tagged with `data-card`.
pub fn render_card(view: &CardView, state: &CardState, dom_id: &str) -> String {
    let labels = view.labels;
    let esc = html_escape;
    let id = html_escape(dom_id);
    let mut out = String::with_capacity(4096);

    let flipped = if state.is_flipped() { " flipped" } else { "" };
    out.push_str(&format!(
        "<div id=\"{id}\" class=\"flip-container{flipped}\" data-lang=\"{}\">\n<div class=\"flip-inner\">\n",
        view.language
    ));

    // Front face
    out.push_str("<div class=\"flip-face flip-front glass-panel\">\n");
    write_chips(&mut out, &view.chips);
    out.push_str(&format!("<h2 class=\"card-title\">{}</h2>\n", view.title));
    out.push_str(&format!(
        "<div class=\"byline\"><span class=\"rule\"></span><p>{}</p></div>\n",
        view.byline
    ));
    out.push_str("<div class=\"grid-layout\">\n<div class=\"visual-content\">\n");
    out.push_str(&format!(
        "<div class=\"image-placeholder\" onclick=\"expandImage(event, '{id}-img')\">"
    ));
    match &view.thumbnail {
        Some(src) => out.push_str(&format!(
            "<img id=\"{id}-img\" src=\"{src}\" alt=\"First page preview\"><div class=\"expand-hint\">Expand</div>"
        )),
        None => out.push_str(&format!(
            "<div class=\"no-preview\">{}</div>",
            esc(labels.no_preview)
        )),
    }
    out.push_str("</div>\n");
    out.push_str(&format!(
        "<div class=\"hint\">{}</div>\n</div>\n",
        esc(labels.click_to_expand)
    ));
    out.push_str("<div class=\"main-content\">\n");
    out.push_str(&format!(
        "<div class=\"section-box etched-glass\"><h3>{}</h3><div class=\"section-body\">{}</div></div>\n",
        esc(labels.architecture), view.architecture_html
    ));
    out.push_str(&format!(
        "<div class=\"section-box highlight-box\"><h3>{}</h3><div class=\"section-body\">{}</div></div>\n",
        esc(labels.key_results), view.key_results_html
    ));
    out.push_str(&format!(
        "<div class=\"flip-row\"><button type=\"button\" class=\"flip-btn\" onclick=\"toggleFlip('{id}')\">{} &rarr;</button></div>\n",
        esc(labels.flip_for_details)
    ));
    out.push_str("</div>\n</div>\n</div>\n");

    // Back face
    out.push_str("<div class=\"flip-face flip-back glass-panel\">\n");
    out.push_str(&format!(
        "<div class=\"back-header\"><h2 class=\"back-title\">{}</h2>",
        view.short_title
    ));
    write_chips(&mut out, &view.chips);
    out.push_str("</div>\n");
    out.push_str(&format!(
        "<div class=\"section-box\"><h3>{}</h3><div class=\"tasks-box\">{}</div></div>\n",
        esc(labels.downstream_tasks), view.downstream_html
    ));
    out.push_str("<div class=\"row-layout\">\n");
    out.push_str(&format!(
        "<div class=\"half-width\"><h3>{}</h3><div class=\"etched-glass strategy-box\">\
         <p><strong>Source:</strong> {}</p>\
         <p><strong>Tokenization:</strong> {}</p>\
         <div class=\"strategy\"><strong>Strategy:</strong>{}</div></div></div>\n",
        esc(labels.data_strategy), view.data_source_html, view.tokenization_html, view.strategy_html
    ));
    out.push_str(&format!(
        "<div class=\"half-width\"><h3>{}</h3><div class=\"ablation-box\">{}</div></div>\n",
        esc(labels.ablation_failure), view.ablation_html
    ));
    out.push_str("</div>\n");
    out.push_str(&format!(
        "<div class=\"benchmarks\"><h3>{}</h3><div class=\"benchmarks-body\">{}</div></div>\n",
        esc(labels.benchmarks), view.benchmarks_html
    ));
    out.push_str(&format!(
        "<button type=\"button\" class=\"flip-btn back-btn\" onclick=\"toggleFlip('{id}')\">&larr; {}</button>\n",
        esc(labels.flip_back)
    ));
    out.push_str("</div>\n</div>\n</div>\n");

    // The open lightbox follows the card, outside its 3D context
    if let (Lightbox::Open, Some(src)) = (state.lightbox, &view.thumbnail) {
        out.push_str(&format!(
            "<div class=\"card-lightbox\" data-card=\"{id}\" onclick=\"closeLightbox(event, '{id}')\"><span class=\"close\">Close</span><img src=\"{src}\" alt=\"First page preview\"></div>\n"
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperflow_core::mock::sample_analysis;

    fn paper(url: Option<&str>, thumb: Option<&str>) -> AnalyzedPaper {
        let mut analysis = sample_analysis("Attention Is All You Need");
        analysis.meta.github_url = url.map(str::to_string);
        AnalyzedPaper::new("attn.pdf", analysis, thumb.map(str::to_string))
    }

    #[test]
    fn labels_follow_language() {
        let p = paper(None, None);
        let en = render_card(&CardView::build(&p, Language::En), &CardState::default(), "card-0");
        let zh = render_card(&CardView::build(&p, Language::Zh), &CardState::default(), "card-0");
        assert!(en.contains("Architecture Spotlight"));
        assert!(en.contains("Key Results &amp; Takeaways"));
        assert!(zh.contains("架构亮点"));
        assert!(zh.contains("下游任务梳理"));
        assert!(!zh.contains("Architecture Spotlight"));
    }

    #[test]
    fn chips_are_language_invariant() {
        let p = paper(Some("https://github.com/tensorflow/tensor2tensor"), None);
        let en = CardView::build(&p, Language::En);
        let zh = CardView::build(&p, Language::Zh);
        assert_eq!(en.chips, zh.chips);
        let texts: Vec<_> = en.chips.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["2017", "NeurIPS", "213M", "GitHub Available"]);
    }

    #[test]
    fn no_link_without_url() {
        let p = paper(None, None);
        let html = render_card(&CardView::build(&p, Language::En), &CardState::default(), "card-0");
        assert!(!html.contains("<a "));
        assert!(!html.contains("GitHub"));
    }

    #[test]
    fn non_http_url_is_not_linked() {
        let p = paper(Some("javascript:alert(1)"), None);
        let view = CardView::build(&p, Language::En);
        let repo = view.chips.iter().find(|c| c.is_repo).unwrap();
        assert!(repo.href.is_none());
        assert!(!render_card(&view, &CardState::default(), "c").contains("javascript:"));
    }

    #[test]
    fn missing_thumbnail_shows_placeholder() {
        let p = paper(None, None);
        let html = render_card(&CardView::build(&p, Language::En), &CardState::default(), "card-3");
        assert!(html.contains("No Preview Available"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn thumbnail_rendered_with_dom_ids() {
        let p = paper(None, Some("data:image/jpeg;base64,/9j/"));
        let html = render_card(&CardView::build(&p, Language::En), &CardState::default(), "card-3");
        assert!(html.contains("id=\"card-3-img\""));
        assert!(html.contains("expandImage(event, 'card-3-img')"));
        assert!(html.contains("toggleFlip('card-3')"));
    }

    #[test]
    fn long_title_truncated_on_back() {
        let mut analysis = sample_analysis(&"x".repeat(60));
        analysis.meta.github_url = None;
        let p = AnalyzedPaper::new("a.pdf", analysis, None);
        let view = CardView::build(&p, Language::En);
        assert_eq!(view.short_title, format!("{}...", "x".repeat(40)));
        assert_eq!(view.title, "x".repeat(60));
    }

    #[test]
    fn flip_and_lightbox_are_independent() {
        let mut state = CardState::default();
        assert_eq!(state.flip(), CardFace::Back);
        assert!(state.open_lightbox(true));
        assert_eq!(state.face, CardFace::Back);
        assert_eq!(state.flip(), CardFace::Front);
        assert_eq!(state.lightbox, Lightbox::Open);
        state.close_lightbox();
        assert_eq!(state.face, CardFace::Front);
        assert_eq!(state.lightbox, Lightbox::Closed);
    }

    #[test]
    fn lightbox_needs_an_image() {
        let mut state = CardState::default();
        assert!(!state.open_lightbox(false));
        assert_eq!(state.lightbox, Lightbox::Closed);
    }

    #[test]
    fn state_is_reflected_in_markup() {
        let p = paper(None, Some("data:image/jpeg;base64,/9j/"));
        let view = CardView::build(&p, Language::En);
        let mut state = CardState::default();
        assert!(!render_card(&view, &state, "c").contains("flip-container flipped"));
        state.flip();
        state.open_lightbox(true);
        let html = render_card(&view, &state, "c");
        assert!(html.contains("flip-container flipped"));
        assert!(html.contains("card-lightbox"));
    }

    #[test]
    fn open_lightbox_is_not_nested_in_the_card() {
        let p = paper(None, Some("data:image/jpeg;base64,/9j/"));
        let view = CardView::build(&p, Language::En);
        let mut state = CardState::default();
        state.open_lightbox(true);
        let html = render_card(&view, &state, "card-3");

        let (card, overlay) = html
            .split_once("<div class=\"card-lightbox\"")
            .expect("lightbox rendered");
        assert_eq!(card.matches("<div").count(), card.matches("</div>").count());
        assert!(card.trim_end().ends_with("</div>"));
        assert!(overlay.starts_with(" data-card=\"card-3\""));
        assert!(overlay.contains("data:image/jpeg;base64,/9j/"));
    }

    #[test]
    fn emphasis_and_bullets_in_sections() {
        let p = paper(None, None);
        let view = CardView::build(&p, Language::En);
        assert!(view.architecture_html.contains("<strong>self-attention</strong>"));
        assert!(view.downstream_html.contains("<li>WMT14 En-De</li>"));
        assert!(!view.key_results_html.contains("**"));
    }
}
