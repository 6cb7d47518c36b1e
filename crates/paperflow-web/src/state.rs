use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use paperflow_core::{AnalyzedPaper, BatchEvent, Language, Session, ThumbnailRenderer};
use paperflow_reporting::{CardState, CardView, render_card};
use uuid::Uuid;

/// Session store plus the per-card interaction state, guarded together so
/// cards and results never disagree.
#[derive(Default)]
pub struct WebSession {
    pub session: Session,
    pub cards: HashMap<Uuid, CardState>,
}

/// Shared application state accessible from all handlers.
pub struct AppState {
    inner: Mutex<WebSession>,
    pub thumbnailer: Arc<dyn ThumbnailRenderer>,
}

/// Which way a lightbox request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightboxAction {
    Open,
    Close,
}

impl std::str::FromStr for LightboxAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "close" => Ok(Self::Close),
            other => Err(format!("unknown lightbox action '{}'", other)),
        }
    }
}

/// DOM id of a card in the interactive view.
pub fn card_dom_id(id: Uuid) -> String {
    format!("card-{}", id)
}

impl AppState {
    pub fn new(language: Language, thumbnailer: Arc<dyn ThumbnailRenderer>) -> Self {
        Self {
            inner: Mutex::new(WebSession {
                session: Session::new(language),
                cards: HashMap::new(),
            }),
            thumbnailer,
        }
    }

    /// Lock the session. A handler that panicked mid-update leaves plain
    /// data behind, so a poisoned lock is recovered.
    pub fn lock(&self) -> MutexGuard<'_, WebSession> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fold an orchestrator event into the session. For a new paper, returns
    /// its card markup in the current language.
    pub fn apply(&self, event: &BatchEvent) -> Option<String> {
        let mut guard = self.lock();
        let web = &mut *guard;
        web.session.apply(event);

        if let BatchEvent::PaperReady { paper, .. } = event {
            let state = *web.cards.entry(paper.id).or_default();
            Some(render(paper, web.session.language(), &state))
        } else {
            None
        }
    }

    /// All cards, in result order. A `language` switches the session first.
    pub fn render_cards(&self, language: Option<Language>) -> String {
        let mut guard = self.lock();
        let web = &mut *guard;
        if let Some(language) = language {
            web.session.set_language(language);
        }
        let language = web.session.language();

        let mut out = String::new();
        for paper in web.session.results() {
            let state = web.cards.get(&paper.id).copied().unwrap_or_default();
            out.push_str(&render(paper, language, &state));
        }
        out
    }

    /// Turn a card over. `None` if the card does not exist.
    pub fn flip(&self, id: Uuid) -> Option<String> {
        self.update_card(id, |state, _| {
            state.flip();
        })
    }

    /// Open or close a card's lightbox. Opening a card without a preview
    /// leaves it closed.
    pub fn lightbox(&self, id: Uuid, action: LightboxAction) -> Option<String> {
        self.update_card(id, |state, paper| match action {
            LightboxAction::Open => {
                state.open_lightbox(paper.thumbnail.is_some());
            }
            LightboxAction::Close => state.close_lightbox(),
        })
    }

    fn update_card(
        &self,
        id: Uuid,
        change: impl FnOnce(&mut CardState, &AnalyzedPaper),
    ) -> Option<String> {
        let mut guard = self.lock();
        let web = &mut *guard;
        let paper = web.session.find(id)?;
        let state = web.cards.entry(id).or_default();
        change(state, paper);
        Some(render(paper, web.session.language(), state))
    }
}

fn render(paper: &AnalyzedPaper, language: Language, state: &CardState) -> String {
    render_card(&CardView::build(paper, language), state, &card_dom_id(paper.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperflow_core::DisabledThumbnails;
    use paperflow_core::mock::sample_analysis;

    fn state_with(papers: Vec<AnalyzedPaper>) -> AppState {
        let state = AppState::new(Language::En, Arc::new(DisabledThumbnails));
        let total = papers.len();
        for (index, paper) in papers.into_iter().enumerate() {
            state.apply(&BatchEvent::PaperReady {
                index,
                total,
                paper: Box::new(paper),
            });
        }
        state
    }

    #[test]
    fn new_paper_renders_front_side_up() {
        let state = AppState::new(Language::En, Arc::new(DisabledThumbnails));
        let paper = AnalyzedPaper::new("a.pdf", sample_analysis("A"), None);
        let id = paper.id;
        let html = state
            .apply(&BatchEvent::PaperReady {
                index: 0,
                total: 1,
                paper: Box::new(paper),
            })
            .unwrap();
        assert!(html.contains(&format!("id=\"card-{}\"", id)));
        assert!(!html.contains("flipped"));
        assert_eq!(state.lock().session.results().len(), 1);
    }

    #[test]
    fn flip_toggles_only_the_target_card() {
        let a = AnalyzedPaper::new("a.pdf", sample_analysis("A"), None);
        let b = AnalyzedPaper::new("b.pdf", sample_analysis("B"), None);
        let (id_a, id_b) = (a.id, b.id);
        let state = state_with(vec![a, b]);

        assert!(state.flip(id_a).unwrap().contains("flip-container flipped"));
        assert!(state.lock().cards[&id_a].is_flipped());
        assert!(!state.lock().cards[&id_b].is_flipped());

        assert!(!state.flip(id_a).unwrap().contains("flip-container flipped"));
        assert!(state.flip(Uuid::new_v4()).is_none());
    }

    #[test]
    fn lightbox_needs_a_preview() {
        let with = AnalyzedPaper::new("a.pdf", sample_analysis("A"), Some("data:image/jpeg;base64,/9j/".into()));
        let without = AnalyzedPaper::new("b.pdf", sample_analysis("B"), None);
        let (id_with, id_without) = (with.id, without.id);
        let state = state_with(vec![with, without]);

        let html = state.lightbox(id_with, LightboxAction::Open).unwrap();
        assert!(html.contains("card-lightbox"));
        let html = state.lightbox(id_without, LightboxAction::Open).unwrap();
        assert!(!html.contains("card-lightbox"));

        let html = state.lightbox(id_with, LightboxAction::Close).unwrap();
        assert!(!html.contains("card-lightbox"));
    }

    #[test]
    fn flip_and_lightbox_are_independent() {
        let paper = AnalyzedPaper::new("a.pdf", sample_analysis("A"), Some("data:image/jpeg;base64,/9j/".into()));
        let id = paper.id;
        let state = state_with(vec![paper]);

        state.lightbox(id, LightboxAction::Open);
        let html = state.flip(id).unwrap();
        assert!(html.contains("flip-container flipped"));
        assert!(html.contains("card-lightbox"));
    }

    #[test]
    fn language_switch_keeps_card_state() {
        let paper = AnalyzedPaper::new("a.pdf", sample_analysis("A"), None);
        let id = paper.id;
        let state = state_with(vec![paper]);
        state.flip(id);

        let zh = state.render_cards(Some(Language::Zh));
        assert!(zh.contains("data-lang=\"zh\""));
        assert!(zh.contains("flip-container flipped"));
        assert_eq!(state.lock().session.language(), Language::Zh);

        let again = state.render_cards(None);
        assert!(again.contains("data-lang=\"zh\""));
    }

    #[test]
    fn lightbox_action_parses() {
        assert_eq!("open".parse::<LightboxAction>(), Ok(LightboxAction::Open));
        assert_eq!("close".parse::<LightboxAction>(), Ok(LightboxAction::Close));
        assert!("toggle".parse::<LightboxAction>().is_err());
    }
}
