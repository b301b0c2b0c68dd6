use std::path::{Path, PathBuf};

use eyre::Result;
use log::debug;

use crate::{Transcript, TranscriptSource};

pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("ytdigest")
        .join("transcripts")
}

fn cache_path(dir: &Path, video_id: &str, lang: &str, source: TranscriptSource) -> PathBuf {
    dir.join(format!("{video_id}-{lang}-{source}.json"))
}

/// Load a cached transcript, if available.
pub fn load(dir: &Path, video_id: &str, lang: &str, source: TranscriptSource) -> Option<Transcript> {
    let path = cache_path(dir, video_id, lang, source);
    let data = std::fs::read_to_string(&path).ok()?;
    let transcript: Transcript = serde_json::from_str(&data).ok()?;
    debug!("Cache hit: {}", path.display());
    Some(transcript)
}

/// Save a transcript under the language it was requested in.
pub fn save(dir: &Path, requested_lang: &str, transcript: &Transcript) -> Result<()> {
    let path = cache_path(dir, &transcript.video_id, requested_lang, transcript.source);
    std::fs::create_dir_all(dir)?;
    let data = serde_json::to_string_pretty(transcript)?;
    std::fs::write(&path, data)?;
    debug!("Cached transcript: {}", path.display());
    Ok(())
}
