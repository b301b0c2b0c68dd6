use eyre::{Result, bail};
use log::debug;

use crate::youtube::USER_AGENT;

const TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Longest request the public endpoint accepts, in characters
pub const MAX_CHUNK_CHARS: usize = 5000;

/// Translate `text` into `target_lang`, letting the service detect the source language.
pub async fn translate(client: &reqwest::Client, text: &str, target_lang: &str) -> Result<String> {
    let chunks = chunk_text(text, MAX_CHUNK_CHARS);
    debug!("Translating {} chars to {target_lang} in {} chunk(s)", text.len(), chunks.len());

    let mut translated = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        translated.push(translate_chunk(client, chunk, target_lang).await?);
    }
    Ok(translated.join(" "))
}

/// Language to translate a transcript in `source_lang` into, if it needs translating at all.
pub fn translation_target<'a>(target: Option<&'a str>, source_lang: &str) -> Option<&'a str> {
    target.filter(|t| !t.eq_ignore_ascii_case(source_lang))
}

/// Pick the text to summarize: the translation, or `original` plus the error when it failed.
pub fn or_original(original: String, translated: Result<String>) -> (String, Option<eyre::Report>) {
    match translated {
        Ok(text) => (text, None),
        Err(e) => (original, Some(e)),
    }
}

async fn translate_chunk(client: &reqwest::Client, chunk: &str, target_lang: &str) -> Result<String> {
    let resp = client
        .get(TRANSLATE_URL)
        .header("User-Agent", USER_AGENT)
        .query(&[
            ("client", "gtx"),
            ("sl", "auto"),
            ("tl", target_lang),
            ("dt", "t"),
            ("q", chunk),
        ])
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("translation service returned {status}: {body}");
    }

    let json: serde_json::Value = resp.json().await?;
    extract_translation(&json)
}

/// The endpoint answers `[[["translated", "source", ...], ...], null, "detected-lang", ...]`
fn extract_translation(json: &serde_json::Value) -> Result<String> {
    let Some(sentences) = json.get(0).and_then(|s| s.as_array()) else {
        bail!("unexpected translation response format");
    };
    let text: String = sentences
        .iter()
        .filter_map(|s| s.get(0)?.as_str())
        .collect();
    if text.is_empty() {
        bail!("translation response contained no text");
    }
    Ok(text)
}

/// Split on whitespace into chunks of at most `max_chars` characters.
/// Single words longer than that are cut by character.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            chunks.extend(chars.chunks(max_chars).map(|c| c.iter().collect::<String>()));
            continue;
        }

        let needed = if current.is_empty() { word_len } else { word_len + 1 };
        if current_len + needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
