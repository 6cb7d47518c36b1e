use axum::response::Html;
use paperflow_core::Language;
use paperflow_reporting::CARD_CSS;

const INDEX_HTML: &str = include_str!("../templates/index.html");

/// Render the index page with the card stylesheet, the current language and
/// any cards already in the session.
pub fn render_index(language: Language, cards_html: &str) -> Html<String> {
    let html = INDEX_HTML
        .replace("{{ card_css }}", CARD_CSS)
        .replace("{{ html_lang }}", language.html_lang())
        .replace("{{ lang }}", language.as_str())
        .replace("{{ cards }}", cards_html);
    Html(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_filled() {
        let Html(page) = render_index(Language::Zh, "<div id=\"card-x\"></div>");
        assert!(page.contains("<html lang=\"zh-CN\""));
        assert!(page.contains("data-lang=\"zh\""));
        assert!(page.contains("<div id=\"card-x\"></div>"));
        assert!(!page.contains("{{"));
    }
}
