use eyre::{Result, bail};
use log::debug;

use crate::config::Provider;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

const DELIVERABLES: &str =
    "Provide: a brief summary, quick lessons, dos and don'ts, key pointers and takeaways, any special mentions or quotes.";

/// Who the summary is written for. Empty fields are left out of the prompt.
#[derive(Debug, Clone, Default)]
pub struct ReaderProfile {
    pub field: String,
    pub background: String,
    pub plans: String,
}

impl ReaderProfile {
    pub fn is_empty(&self) -> bool {
        [&self.field, &self.background, &self.plans]
            .iter()
            .all(|s| s.trim().is_empty())
    }
}

/// Build the summarization prompt for `transcript`
pub fn build_prompt(transcript: &str, profile: &ReaderProfile) -> String {
    if profile.is_empty() {
        format!("Summarize the following podcast transcript.\n\nTranscript:\n\n{transcript}\n\n{DELIVERABLES}")
    } else {
        format!(
            "Summarize the following podcast transcript from the perspective of someone with the following background and goals:\n\
             Field: {}\nBackground: {}\nFuture Plans: {}\n\n\
             Transcript:\n\n{transcript}\n\n{DELIVERABLES}",
            profile.field.trim(),
            profile.background.trim(),
            profile.plans.trim(),
        )
    }
}

/// Send `prompt` to the provider that serves `model` and return the generated text
pub async fn summarize(client: &reqwest::Client, prompt: &str, model: &str, api_key: &str) -> Result<String> {
    let provider = Provider::for_model(model);
    debug!("Summarizing via {provider} with model {model}");

    match provider {
        Provider::Gemini => summarize_gemini(client, prompt, model, api_key).await,
        Provider::Anthropic => summarize_anthropic(client, prompt, model, api_key).await,
        Provider::OpenAi => summarize_openai(client, prompt, model, api_key).await,
    }
}

async fn post_json(
    request: reqwest::RequestBuilder,
    body: &serde_json::Value,
    provider: Provider,
) -> Result<serde_json::Value> {
    let resp = request
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("{provider} API returned {status}: {body}");
    }

    Ok(resp.json().await?)
}

async fn summarize_gemini(client: &reqwest::Client, prompt: &str, model: &str, api_key: &str) -> Result<String> {
    let url = format!("https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent");

    let body = serde_json::json!({
        "contents": [
            {
                "role": "user",
                "parts": [{ "text": prompt }]
            }
        ]
    });

    let request = client.post(&url).header("x-goog-api-key", api_key);
    let json = post_json(request, &body, Provider::Gemini).await?;
    extract_gemini_text(&json)
}

fn extract_gemini_text(json: &serde_json::Value) -> Result<String> {
    if let Some(parts) = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
    {
        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text")?.as_str())
            .collect();
        if !text.is_empty() {
            return Ok(text);
        }
    }

    if let Some(reason) = json
        .get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(|r| r.as_str())
    {
        bail!("Gemini blocked the prompt: {reason}");
    }
    bail!("unexpected Gemini API response format");
}

async fn summarize_anthropic(client: &reqwest::Client, prompt: &str, model: &str, api_key: &str) -> Result<String> {
    let body = serde_json::json!({
        "model": model,
        "max_tokens": 4096,
        "messages": [
            {
                "role": "user",
                "content": prompt
            }
        ]
    });

    let request = client
        .post("https://api.anthropic.com/v1/messages")
        .header("x-api-key", api_key)
        .header("anthropic-version", "2023-06-01");
    let json = post_json(request, &body, Provider::Anthropic).await?;
    extract_anthropic_text(&json)
}

fn extract_anthropic_text(json: &serde_json::Value) -> Result<String> {
    if let Some(content) = json.get("content").and_then(|c| c.as_array()) {
        let text: String = content
            .iter()
            .filter_map(|block| {
                if block.get("type")?.as_str()? == "text" {
                    block.get("text")?.as_str()
                } else {
                    None
                }
            })
            .collect();
        if !text.is_empty() {
            return Ok(text);
        }
    }
    bail!("unexpected Anthropic API response format");
}

async fn summarize_openai(client: &reqwest::Client, prompt: &str, model: &str, api_key: &str) -> Result<String> {
    let body = serde_json::json!({
        "model": model,
        "messages": [
            {
                "role": "user",
                "content": prompt
            }
        ]
    });

    let request = client
        .post("https://api.openai.com/v1/chat/completions")
        .bearer_auth(api_key);
    let json = post_json(request, &body, Provider::OpenAi).await?;
    extract_openai_text(&json)
}

fn extract_openai_text(json: &serde_json::Value) -> Result<String> {
    if let Some(text) = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
    {
        return Ok(text.to_string());
    }
    bail!("unexpected OpenAI API response format");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_profile() {
        let prompt = build_prompt("hello there", &ReaderProfile::default());
        assert!(prompt.starts_with("Summarize the following podcast transcript.\n\n"));
        assert!(prompt.contains("Transcript:\n\nhello there\n\n"));
        assert!(prompt.ends_with(DELIVERABLES));
        assert!(!prompt.contains("Field:"));
    }

    #[test]
    fn test_prompt_with_profile() {
        let profile = ReaderProfile {
            field: " Biology ".to_string(),
            background: "PhD student".to_string(),
            plans: String::new(),
        };
        let prompt = build_prompt("transcript text", &profile);
        assert!(prompt.contains("from the perspective of someone"));
        assert!(prompt.contains("Field: Biology\nBackground: PhD student\nFuture Plans: \n\n"));
        assert!(prompt.contains("transcript text"));
        assert!(prompt.ends_with(DELIVERABLES));
    }

    #[test]
    fn test_whitespace_profile_is_empty() {
        let profile = ReaderProfile {
            field: "  ".to_string(),
            ..Default::default()
        };
        assert!(profile.is_empty());
    }

    #[test]
    fn test_extract_gemini_text() {
        let json = serde_json::json!({
            "candidates": [
                {
                    "content": {
                        "role": "model",
                        "parts": [{"text": "## Summary\n"}, {"text": "Short."}]
                    }
                }
            ]
        });
        assert_eq!(extract_gemini_text(&json).unwrap(), "## Summary\nShort.");
    }

    #[test]
    fn test_extract_gemini_blocked() {
        let json = serde_json::json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let err = extract_gemini_text(&json).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_extract_anthropic_text() {
        let json = serde_json::json!({
            "content": [
                {"type": "text", "text": "Here is the summary."}
            ]
        });
        assert_eq!(extract_anthropic_text(&json).unwrap(), "Here is the summary.");
    }

    #[test]
    fn test_extract_anthropic_text_empty() {
        assert!(extract_anthropic_text(&serde_json::json!({"content": []})).is_err());
    }

    #[test]
    fn test_extract_openai_text() {
        let json = serde_json::json!({
            "choices": [
                {"message": {"role": "assistant", "content": "Summary of the video."}}
            ]
        });
        assert_eq!(extract_openai_text(&json).unwrap(), "Summary of the video.");
    }

    #[test]
    fn test_extract_openai_text_empty() {
        assert!(extract_openai_text(&serde_json::json!({"choices": []})).is_err());
    }
}
