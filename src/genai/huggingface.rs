//! Hugging Face inference API client, the secondary generation provider.

use serde::Deserialize;

use super::{Candidate, GenerateRequest, ProviderError, extract_candidates, instruction_prompt};

const HF_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/mistralai/Mixtral-8x7B-Instruct-v0.1";

#[derive(Clone)]
pub struct HuggingFaceClient {
    http: reqwest::Client,
    api_key: String,
}

/// The inference API returns either `[{"generated_text": ...}]` or a bare
/// `{"generated_text": ...}` depending on the model wrapper.
#[derive(Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Many(Vec<GeneratedText>),
    One(GeneratedText),
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: String,
}

impl InferenceResponse {
    fn into_text(self) -> Option<String> {
        match self {
            InferenceResponse::Many(mut v) => {
                if v.is_empty() {
                    None
                } else {
                    Some(v.remove(0).generated_text)
                }
            }
            InferenceResponse::One(g) => Some(g.generated_text),
        }
    }
}

impl HuggingFaceClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
        }
    }

    pub async fn generate(&self, req: &GenerateRequest) -> Result<Vec<Candidate>, ProviderError> {
        let body = serde_json::json!({
            "inputs": instruction_prompt(req),
            "parameters": {
                "max_new_tokens": 512,
                "temperature": 0.7,
                "return_full_text": false,
            }
        });

        let response = self
            .http
            .post(HF_MODEL_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(format!("hugging face returned status {}", response.status()).into());
        }

        let parsed: InferenceResponse = response.json().await?;
        let text = parsed
            .into_text()
            .ok_or("hugging face response contained no generated text")?;

        extract_candidates(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_response_shape_parses() {
        let raw = r#"[{"generated_text": "[{\"caption\": \"First snow\", \"description\": \"Everything went quiet under the snow and we stayed out far too long.\"}]"}]"#;
        let parsed: InferenceResponse = serde_json::from_str(raw).unwrap();
        let text = parsed.into_text().unwrap();
        assert_eq!(extract_candidates(&text).unwrap()[0].caption, "First snow");
    }

    #[test]
    fn object_response_shape_parses() {
        let raw = r#"{"generated_text": "no json here"}"#;
        let parsed: InferenceResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.into_text().unwrap(), "no json here");
    }
}
