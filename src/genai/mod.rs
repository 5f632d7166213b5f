//! Caption/description generation.
//!
//! A fixed-order fallback chain over heterogeneous generators: the Gemini
//! API, the Hugging Face inference API, and a local heuristic generator.
//! Each stage is tried at most once per request, with no retries and no
//! backoff; the heuristic stage cannot fail, so the chain as a whole never
//! surfaces an error to the caller.

pub mod gemini;
pub mod heuristic;
pub mod huggingface;

use serde::{Deserialize, Serialize};

pub type ProviderError = Box<dyn std::error::Error + Send + Sync>;

/// Caption length bounds and description minimum, enforced on every
/// candidate regardless of which stage produced it.
pub const CAPTION_MIN_CHARS: usize = 5;
pub const CAPTION_MAX_CHARS: usize = 50;
pub const DESCRIPTION_MIN_CHARS: usize = 20;

/// Stock phrases the remote providers are told to avoid.
const CLICHE_PHRASES: &[&str] = &[
    "a picture is worth a thousand words",
    "memories that last a lifetime",
    "living my best life",
    "making memories",
    "picture perfect",
    "good vibes only",
];

#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub prompt: String,
    /// Prior caption the new content should not repeat.
    pub avoid_caption: String,
    /// Prior description the new content should not repeat.
    pub avoid_description: String,
}

/// One generated caption/description pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub caption: String,
    pub description: String,
}

/// A single stage of the fallback chain.
#[derive(Clone)]
pub enum Generator {
    Gemini(gemini::GeminiClient),
    HuggingFace(huggingface::HuggingFaceClient),
    Heuristic,
}

impl Generator {
    pub fn name(&self) -> &'static str {
        match self {
            Generator::Gemini(_) => "gemini",
            Generator::HuggingFace(_) => "huggingface",
            Generator::Heuristic => "heuristic",
        }
    }

    async fn generate(&self, req: &GenerateRequest) -> Result<Vec<Candidate>, ProviderError> {
        match self {
            Generator::Gemini(client) => client.generate(req).await,
            Generator::HuggingFace(client) => client.generate(req).await,
            Generator::Heuristic => Ok(vec![heuristic::generate(&req.prompt)]),
        }
    }
}

/// Ordered waterfall of generators. Remote stages are only present when
/// their API keys are configured; the heuristic stage is always last.
#[derive(Clone)]
pub struct FallbackChain {
    stages: Vec<Generator>,
}

impl FallbackChain {
    pub fn new(stages: Vec<Generator>) -> Self {
        Self { stages }
    }

    /// Build from environment: GEMINI_API_KEY enables the primary provider,
    /// HF_API_KEY the secondary. With neither set, all generation is local.
    pub fn from_env() -> Self {
        let mut stages = Vec::new();

        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.is_empty() {
                let model = std::env::var("GEMINI_MODEL")
                    .unwrap_or_else(|_| "gemini-2.0-flash".to_string());
                stages.push(Generator::Gemini(gemini::GeminiClient::new(&key, &model)));
            }
        }
        if let Ok(key) = std::env::var("HF_API_KEY") {
            if !key.is_empty() {
                stages.push(Generator::HuggingFace(huggingface::HuggingFaceClient::new(
                    &key,
                )));
            }
        }
        stages.push(Generator::Heuristic);

        Self { stages }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Produce 1-3 validated candidates. Provider failures degrade to the
    /// next stage; this function cannot fail.
    pub async fn generate(&self, req: &GenerateRequest) -> Vec<Candidate> {
        for stage in &self.stages {
            match stage.generate(req).await {
                Ok(candidates) if !candidates.is_empty() => {
                    return candidates
                        .into_iter()
                        .take(3)
                        .map(|c| sanitize(c, &req.prompt))
                        .collect();
                }
                Ok(_) => {
                    eprintln!("[genai] Stage {} returned no candidates", stage.name());
                }
                Err(e) => {
                    eprintln!("[genai] Stage {} failed: {}", stage.name(), e);
                }
            }
        }

        // The heuristic stage is infallible, so this is unreachable unless
        // the chain was constructed empty.
        vec![sanitize(heuristic::generate(&req.prompt), &req.prompt)]
    }
}

pub fn is_valid_caption(caption: &str) -> bool {
    let len = caption.trim().chars().count();
    (CAPTION_MIN_CHARS..=CAPTION_MAX_CHARS).contains(&len)
}

pub fn is_valid_description(description: &str) -> bool {
    description.trim().chars().count() >= DESCRIPTION_MIN_CHARS
}

/// Enforce output bounds on a candidate, replacing out-of-bounds fields with
/// heuristic substitutes. Raw provider output never reaches the caller
/// unvalidated.
fn sanitize(candidate: Candidate, prompt: &str) -> Candidate {
    let caption = if is_valid_caption(&candidate.caption) {
        capitalize_first(candidate.caption.trim())
    } else {
        heuristic::generate_caption(prompt)
    };
    let description = if is_valid_description(&candidate.description) {
        candidate.description.trim().to_string()
    } else {
        heuristic::generate_description(prompt)
    };
    Candidate {
        caption,
        description,
    }
}

pub(crate) fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Instruction prompt shared by the remote providers. Asks for structured
/// output so the response can be parsed rather than scraped.
pub(crate) fn instruction_prompt(req: &GenerateRequest) -> String {
    let mut prompt = format!(
        "You write captions and descriptions for entries in a personal photo journal.\n\
         Write in the first person, with an emotionally resonant tone.\n\
         The caption must start with a capital letter and be between {} and {} characters.\n\
         The description must be at least 4 sentences.\n\
         Avoid these phrases: {}.\n",
        CAPTION_MIN_CHARS,
        CAPTION_MAX_CHARS,
        CLICHE_PHRASES.join(", "),
    );
    if !req.avoid_caption.is_empty() {
        prompt.push_str(&format!(
            "Do not reuse this previous caption: \"{}\".\n",
            req.avoid_caption
        ));
    }
    if !req.avoid_description.is_empty() {
        prompt.push_str(&format!(
            "Do not reuse this previous description: \"{}\".\n",
            req.avoid_description
        ));
    }
    prompt.push_str(&format!(
        "Respond with ONLY a JSON array of 1 to 3 objects, each with \"caption\" and \
         \"description\" string fields. No other text.\n\nThe memory: {}",
        req.prompt
    ));
    prompt
}

/// Defensively parse a provider's raw text into candidates: strip markdown
/// code fences, take the first-`[`..last-`]` span, parse as a JSON array.
/// Anything else counts as a provider failure.
pub(crate) fn extract_candidates(raw: &str) -> Result<Vec<Candidate>, ProviderError> {
    let mut text = raw.trim();

    // Models often wrap output in ```json ... ``` despite instructions.
    if let Some(stripped) = text.strip_prefix("```") {
        let stripped = stripped.strip_prefix("json").unwrap_or(stripped);
        text = stripped.strip_suffix("```").unwrap_or(stripped).trim();
    }

    let start = text.find('[').ok_or("no JSON array in provider output")?;
    let end = text.rfind(']').ok_or("no JSON array in provider output")?;
    if end <= start {
        return Err("malformed JSON array span in provider output".into());
    }

    let candidates: Vec<Candidate> = serde_json::from_str(&text[start..=end])?;

    let candidates: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| !c.caption.trim().is_empty() && !c.description.trim().is_empty())
        .collect();

    if candidates.is_empty() {
        return Err("provider output contained no usable candidates".into());
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_json_array() {
        let raw = r#"[{"caption": "A quiet morning", "description": "The light came in softly and everything felt still for once."}]"#;
        let candidates = extract_candidates(raw).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].caption, "A quiet morning");
    }

    #[test]
    fn strips_code_fences() {
        let raw = "```json\n[{\"caption\": \"Sunlit paths\", \"description\": \"We walked for hours and the afternoon never seemed to end.\"}]\n```";
        let candidates = extract_candidates(raw).unwrap();
        assert_eq!(candidates[0].caption, "Sunlit paths");
    }

    #[test]
    fn extracts_array_embedded_in_prose() {
        let raw = "Here are your candidates: [{\"caption\": \"Small joys\", \"description\": \"It was nothing special and that is exactly why I remember it.\"}] Hope that helps!";
        assert_eq!(extract_candidates(raw).unwrap().len(), 1);
    }

    #[test]
    fn rejects_non_array_output() {
        assert!(extract_candidates("I could not generate anything.").is_err());
        assert!(extract_candidates("{\"caption\": \"x\"}").is_err());
        assert!(extract_candidates("] oops [").is_err());
    }

    #[test]
    fn rejects_candidates_with_empty_fields() {
        let raw = r#"[{"caption": "", "description": ""}]"#;
        assert!(extract_candidates(raw).is_err());
    }

    #[test]
    fn caption_bounds() {
        assert!(is_valid_caption("A quiet morning"));
        assert!(!is_valid_caption("Hi"));
        assert!(!is_valid_caption(&"x".repeat(51)));
        assert!(!is_valid_caption("    "));
    }

    #[test]
    fn capitalization() {
        assert_eq!(capitalize_first("a quiet morning"), "A quiet morning");
        assert_eq!(capitalize_first("Already fine"), "Already fine");
        assert_eq!(capitalize_first(""), "");
    }

    #[tokio::test]
    async fn chain_never_fails() {
        let chain = FallbackChain::new(vec![Generator::Heuristic]);
        let req = GenerateRequest {
            prompt: "our wedding day in the mountains".to_string(),
            ..Default::default()
        };
        let candidates = chain.generate(&req).await;
        assert!(!candidates.is_empty());
        for c in &candidates {
            assert!(is_valid_caption(&c.caption), "caption: {:?}", c.caption);
            assert!(is_valid_description(&c.description));
            assert!(c.caption.chars().next().unwrap().is_uppercase());
        }
    }

    #[tokio::test]
    async fn even_an_empty_chain_produces_output() {
        let chain = FallbackChain::new(vec![]);
        let req = GenerateRequest {
            prompt: "flowers from my partner".to_string(),
            ..Default::default()
        };
        assert!(!chain.generate(&req).await.is_empty());
    }
}
