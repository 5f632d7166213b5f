//! Gemini REST client, the primary generation provider.

use serde::Deserialize;

use super::{Candidate, GenerateRequest, ProviderError, extract_candidates, instruction_prompt};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<ResponseCandidate>>,
}

#[derive(Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    /// One generateContent call, no retries. Any transport, HTTP, or parse
    /// failure is returned to the chain, which moves on to the next stage.
    pub async fn generate(&self, req: &GenerateRequest) -> Result<Vec<Candidate>, ProviderError> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_API_BASE, self.model, self.api_key
        );
        let body = serde_json::json!({
            "contents": [{
                "parts": [{ "text": instruction_prompt(req) }]
            }],
            "generationConfig": {
                "temperature": 0.9,
                "maxOutputTokens": 1024,
            }
        });

        let response = self.http.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(format!("gemini returned status {}", response.status()).into());
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed
            .candidates
            .and_then(|mut c| if c.is_empty() { None } else { Some(c.remove(0)) })
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .and_then(|mut p| if p.is_empty() { None } else { Some(p.remove(0)) })
            .and_then(|p| p.text)
            .ok_or("gemini response contained no text part")?;

        extract_candidates(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_shape_parses() {
        let raw = r#"{
            "candidates": [{
                "content": {
                    "parts": [{ "text": "[{\"caption\": \"By the water\", \"description\": \"The afternoon stretched out and we stayed until the light was gone.\"}]" }]
                }
            }]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let text = parsed.candidates.unwrap()[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .as_ref()
            .unwrap()[0]
            .text
            .clone()
            .unwrap();
        let candidates = extract_candidates(&text).unwrap();
        assert_eq!(candidates[0].caption, "By the water");
    }

    #[test]
    fn empty_response_is_handled() {
        let parsed: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_none());
    }
}
