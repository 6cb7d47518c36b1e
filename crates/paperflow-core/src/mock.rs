//! Mock analysis and preview backends for testing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::analyzer::{AnalysisError, DocumentInput, PaperAnalysis, PaperAnalyzer};
use crate::backend::{Thumbnail, ThumbnailError, ThumbnailRenderer};
use crate::{PaperContent, PaperMetadata};

/// A configurable mock response for [`MockAnalyzer`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Succeed with a sample analysis titled after the document's file name.
    Sample,
    /// Succeed with this exact analysis.
    Analysis(Box<PaperAnalysis>),
    /// Simulate a 429 response.
    RateLimited,
    /// Simulate an answer with no text.
    Empty,
    /// Simulate a transport or HTTP failure.
    Error(String),
}

/// A hand-rolled mock implementing [`PaperAnalyzer`] for tests.
///
/// Supports:
/// - A fixed response (used for every call), **or**
/// - A sequence of responses (one per call, repeating the fallback if exhausted).
/// - Optional per-call latency.
/// - Call counting via [`call_count()`](MockAnalyzer::call_count).
pub struct MockAnalyzer {
    responses: Mutex<Vec<MockResponse>>,
    fallback: MockResponse,
    delay: Option<Duration>,
    call_count: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl MockAnalyzer {
    /// Create a mock that always returns `response`.
    pub fn new(response: MockResponse) -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            fallback: response,
            delay: None,
            call_count: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that returns responses in order, then keeps returning
    /// [`MockResponse::Sample`].
    pub fn with_sequence(mut responses: Vec<MockResponse>) -> Self {
        // Reverse so we can pop() from the front cheaply.
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            ..Self::new(MockResponse::Sample)
        }
    }

    /// Set simulated backend latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `analyze()` has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// File names passed to `analyze()`, in call order.
    pub fn seen_files(&self) -> Vec<String> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn next_response(&self) -> MockResponse {
        match self.responses.lock() {
            Ok(mut seq) => seq.pop().unwrap_or_else(|| self.fallback.clone()),
            Err(_) => self.fallback.clone(),
        }
    }
}

impl PaperAnalyzer for MockAnalyzer {
    fn name(&self) -> &str {
        "Mock"
    }

    fn analyze<'a>(
        &'a self,
        document: &'a DocumentInput,
    ) -> Pin<Box<dyn Future<Output = Result<PaperAnalysis, AnalysisError>> + Send + 'a>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(document.file_name.clone());
        }
        let response = self.next_response();
        let delay = self.delay;

        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }

            match response {
                MockResponse::Sample => {
                    let title = document
                        .file_name
                        .trim_end_matches(".pdf")
                        .replace(['_', '-'], " ");
                    Ok(sample_analysis(&title))
                }
                MockResponse::Analysis(analysis) => Ok(*analysis),
                MockResponse::RateLimited => Err(AnalysisError::RateLimited { retry_after: None }),
                MockResponse::Empty => Err(AnalysisError::EmptyResponse),
                MockResponse::Error(msg) => Err(AnalysisError::Status {
                    status: 500,
                    message: msg,
                }),
            }
        })
    }
}

/// Preview renderer that returns a fixed result without touching the bytes.
pub struct MockThumbnailer {
    succeed: bool,
    delay: Option<Duration>,
    call_count: AtomicUsize,
}

impl MockThumbnailer {
    /// Always renders a tiny placeholder JPEG.
    pub fn working() -> Self {
        Self {
            succeed: true,
            delay: None,
            call_count: AtomicUsize::new(0),
        }
    }

    /// Always fails to render.
    pub fn failing() -> Self {
        Self {
            succeed: false,
            delay: None,
            call_count: AtomicUsize::new(0),
        }
    }

    /// Block the rendering thread for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl ThumbnailRenderer for MockThumbnailer {
    fn render_first_page(&self, _data: &[u8]) -> Result<Thumbnail, ThumbnailError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(d) = self.delay {
            std::thread::sleep(d);
        }
        if self.succeed {
            Ok(Thumbnail::from_jpeg(&[0xFF, 0xD8, 0xFF, 0xD9], 1, 1))
        } else {
            Err(ThumbnailError::RenderError("mock render failure".to_string()))
        }
    }
}

/// A complete, valid analysis for `title`.
pub fn sample_analysis(title: &str) -> PaperAnalysis {
    PaperAnalysis {
        meta: PaperMetadata {
            model_name: "Transformer".to_string(),
            publish_year: "2017".to_string(),
            journal_venue: "NeurIPS".to_string(),
            authors_team: "Google Brain".to_string(),
            parameter_count: "213M".to_string(),
            paper_title: title.to_string(),
            github_url: None,
        },
        content_en: PaperContent {
            downstream_tasks: "Translation:\n• WMT14 En-De\n• WMT14 En-Fr".to_string(),
            pretrain_data_source: "WMT 2014".to_string(),
            tokenization_method: "Byte-pair encoding".to_string(),
            pretrain_strategy: "• Adam with warmup\n• Label smoothing".to_string(),
            finetuning_eval_protocol: "Beam search, checkpoint averaging".to_string(),
            model_architecture_desc: "Encoder-decoder built on **self-attention**".to_string(),
            benchmarks_comparisons: "Beats ConvS2S and GNMT".to_string(),
            ablation_failure_analysis: "• Single-head attention loses 0.9 BLEU".to_string(),
            key_results: "**28.4 BLEU** on En-De".to_string(),
        },
        content_zh: PaperContent {
            downstream_tasks: "翻译：\n• WMT14 英德\n• WMT14 英法".to_string(),
            pretrain_data_source: "WMT 2014".to_string(),
            tokenization_method: "字节对编码".to_string(),
            pretrain_strategy: "• 带预热的 Adam\n• 标签平滑".to_string(),
            finetuning_eval_protocol: "束搜索，检查点平均".to_string(),
            model_architecture_desc: "基于**自注意力**的编码器-解码器".to_string(),
            benchmarks_comparisons: "优于 ConvS2S 与 GNMT".to_string(),
            ablation_failure_analysis: "• 单头注意力下降 0.9 BLEU".to_string(),
            key_results: "英德翻译 **28.4 BLEU**".to_string(),
        },
    }
}
