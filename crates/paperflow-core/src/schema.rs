//! Request and response shapes for the structured bilingual analysis.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};

use crate::analyzer::{AnalysisError, DocumentInput, PaperAnalysis};
use crate::{PaperContent, PaperMetadata};

pub const SYSTEM_INSTRUCTION: &str = "\
You are an expert AI researcher and technical analyst.
Analyze the attached academic paper (PDF) and produce a structured knowledge report.

Formatting rules:
1. Downstream tasks: group tasks by category (for example Classification, Generation, Reasoning). Use bullet points (•). **Every bullet point starts on a new line.**
2. Ablation & failure analysis: no walls of text. Use bullet points (•) for concrete failures, instability issues and negative results. **Every bullet point starts on a new line.**
3. Bilingual output: fill EVERY content field in English (content_en) and in professional Chinese (content_zh).
4. GitHub: if the paper mentions a GitHub URL, copy it exactly as written.
5. Emphasis: mark key terms and metrics with Markdown bold (**text**).

Constraint: downstream_tasks and ablation_failure_analysis must use the bullet format strictly, one bullet per line.
";

pub const USER_PROMPT: &str = "Analyze this paper and generate the bilingual report.";

const REQUIRED_META: [&str; 3] = ["model_name", "publish_year", "paper_title"];
const REQUIRED_CONTENT: [&str; 4] = [
    "downstream_tasks",
    "pretrain_strategy",
    "ablation_failure_analysis",
    "key_results",
];

const EN_REQUIRED: [&str; 4] = [
    "content_en.downstream_tasks",
    "content_en.pretrain_strategy",
    "content_en.ablation_failure_analysis",
    "content_en.key_results",
];
const ZH_REQUIRED: [&str; 4] = [
    "content_zh.downstream_tasks",
    "content_zh.pretrain_strategy",
    "content_zh.ablation_failure_analysis",
    "content_zh.key_results",
];

fn content_schema(chinese: bool) -> Value {
    let note = |hint: &str| {
        if chinese {
            json!({ "type": "STRING", "description": format!("Translated to Chinese. {}", hint) })
        } else {
            json!({ "type": "STRING", "description": hint })
        }
    };
    json!({
        "type": "OBJECT",
        "properties": {
            "downstream_tasks": note("Use bullet points •, grouped by task categories"),
            "pretrain_data_source": { "type": "STRING" },
            "tokenization_method": { "type": "STRING" },
            "pretrain_strategy": note("Use bullet points •"),
            "finetuning_eval_protocol": { "type": "STRING" },
            "model_architecture_desc": { "type": "STRING" },
            "benchmarks_comparisons": { "type": "STRING" },
            "ablation_failure_analysis": note("Use bullet points •"),
            "key_results": { "type": "STRING" },
        },
        "required": REQUIRED_CONTENT,
    })
}

/// The `responseSchema` sent with every request.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "meta": {
                "type": "OBJECT",
                "properties": {
                    "model_name": { "type": "STRING" },
                    "publish_year": { "type": "STRING" },
                    "journal_venue": { "type": "STRING" },
                    "authors_team": { "type": "STRING" },
                    "parameter_count": { "type": "STRING" },
                    "paper_title": { "type": "STRING" },
                    "github_url": { "type": "STRING", "nullable": true },
                },
                "required": REQUIRED_META,
            },
            "content_en": content_schema(false),
            "content_zh": content_schema(true),
        },
        "required": ["meta", "content_en", "content_zh"],
    })
}

/// Body of a `generateContent` call: the document inline as base64, then the
/// instruction text.
pub fn build_request(document: &DocumentInput) -> Value {
    json!({
        "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
        "contents": [{
            "role": "user",
            "parts": [
                {
                    "inlineData": {
                        "mimeType": document.mime_type,
                        "data": STANDARD.encode(&document.data),
                    }
                },
                { "text": USER_PROMPT },
            ]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema(),
        }
    })
}

/// Concatenated answer text of the first candidate, skipping thought parts.
/// `None` when the candidate carries no text.
pub fn response_text(body: &Value) -> Option<String> {
    let parts = body["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts
        .iter()
        .filter(|p| !p["thought"].as_bool().unwrap_or(false))
        .filter_map(|p| p["text"].as_str())
        .collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Parse and validate the model's JSON answer.
pub fn parse_analysis(text: &str) -> Result<PaperAnalysis, AnalysisError> {
    let json = strip_code_fence(text.trim());
    if json.is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }
    let mut analysis: PaperAnalysis =
        serde_json::from_str(json).map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;
    validate_meta(&analysis.meta)?;
    validate_content(&analysis.content_en, &EN_REQUIRED)?;
    validate_content(&analysis.content_zh, &ZH_REQUIRED)?;
    analysis.meta.github_url = normalize_url(analysis.meta.github_url.take());
    Ok(analysis)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn require(value: &str, field: &'static str) -> Result<(), AnalysisError> {
    if value.trim().is_empty() {
        Err(AnalysisError::MissingField(field))
    } else {
        Ok(())
    }
}

fn validate_meta(meta: &PaperMetadata) -> Result<(), AnalysisError> {
    require(&meta.model_name, "meta.model_name")?;
    require(&meta.publish_year, "meta.publish_year")?;
    require(&meta.paper_title, "meta.paper_title")
}

fn validate_content(
    content: &PaperContent,
    names: &[&'static str; 4],
) -> Result<(), AnalysisError> {
    let values = [
        &content.downstream_tasks,
        &content.pretrain_strategy,
        &content.ablation_failure_analysis,
        &content.key_results,
    ];
    for (value, name) in values.into_iter().zip(names.iter().copied()) {
        require(value, name)?;
    }
    Ok(())
}

/// Blank or placeholder URLs count as absent.
fn normalize_url(url: Option<String>) -> Option<String> {
    let url = url?.trim().to_string();
    match url.to_ascii_lowercase().as_str() {
        "" | "null" | "none" | "n/a" => None,
        _ => Some(url),
    }
}
