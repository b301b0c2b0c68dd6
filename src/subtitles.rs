//! Transcript retrieval through `yt-dlp` subtitle downloads.
//!
//! yt-dlp writes WebVTT; the timing lines, cue settings and inline karaoke
//! tags are stripped here and rolling auto-caption repeats collapsed.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use eyre::{Result, bail};
use log::debug;
use regex::Regex;
use tokio::process::Command;

use crate::{Segment, Transcript, TranscriptSource};

static INLINE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Download subtitles with yt-dlp and convert them to a transcript
pub async fn fetch_subtitles(video_id: &str, lang: &str) -> Result<Transcript> {
    // Fresh per call, removed on drop
    let work_dir = tempfile::Builder::new()
        .prefix(&format!("ytdigest-{video_id}-"))
        .tempdir()?;

    download_vtt(work_dir.path(), video_id, lang).await?;
    let vtt_path = find_vtt(work_dir.path(), video_id, lang)?
        .ok_or_else(|| eyre::eyre!("yt-dlp found no '{lang}' subtitles for video {video_id}"))?;
    debug!("Using subtitle file {}", vtt_path.display());

    let language = vtt_language(&vtt_path).unwrap_or(lang).to_string();
    let vtt = tokio::fs::read_to_string(&vtt_path).await?;
    let segments = parse_vtt(&vtt);
    if segments.is_empty() {
        bail!("subtitle file {} contained no text", vtt_path.display());
    }

    let title = video_title(video_id).await.unwrap_or_default();

    Ok(Transcript {
        video_id: video_id.to_string(),
        title,
        language,
        source: TranscriptSource::Subtitles,
        segments,
    })
}

async fn download_vtt(work_dir: &Path, video_id: &str, lang: &str) -> Result<()> {
    let url = format!("https://www.youtube.com/watch?v={video_id}");
    let output_template = work_dir.join("%(id)s.%(ext)s");
    debug!("Downloading subtitles via yt-dlp: {url}");

    let output = Command::new("yt-dlp")
        .args(["--skip-download", "--write-subs", "--write-auto-subs", "--no-playlist"])
        .args(["--sub-langs", lang, "--sub-format", "vtt", "-o"])
        .arg(&output_template)
        .arg(&url)
        .output()
        .await;

    match output {
        Ok(o) if o.status.success() => Ok(()),
        Ok(o) => bail!(
            "yt-dlp exited with status {}: {}",
            o.status,
            String::from_utf8_lossy(&o.stderr).trim()
        ),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            bail!(
                "yt-dlp not found. Install it to use the yt-dlp transcript source:\n  \
                 pip install yt-dlp\n  \
                 or: brew install yt-dlp"
            );
        }
        Err(e) => bail!("failed to run yt-dlp: {e}"),
    }
}

/// Subtitle file for `lang` (or a regional variant like `en-US`)
fn find_vtt(dir: &Path, video_id: &str, lang: &str) -> Result<Option<PathBuf>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_match = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(video_id)?.strip_prefix('.')?.strip_suffix(".vtt"))
            .is_some_and(|file_lang| {
                file_lang == lang || file_lang.strip_prefix(lang).is_some_and(|rest| rest.starts_with('-'))
            });
        if is_match {
            found.push(path);
        }
    }
    // Exact language beats a regional variant; read_dir order is unspecified
    found.sort_by_key(|p| (vtt_language(p) != Some(lang), p.clone()));
    Ok(found.into_iter().next())
}

/// Language code from a yt-dlp subtitle name like `ID.en.vtt`
fn vtt_language(path: &Path) -> Option<&str> {
    let stem = path.file_stem()?.to_str()?;
    let (_, lang) = stem.rsplit_once('.')?;
    Some(lang)
}

async fn video_title(video_id: &str) -> Option<String> {
    let url = format!("https://www.youtube.com/watch?v={video_id}");
    Command::new("yt-dlp")
        .args(["--get-title", "--no-playlist", &url])
        .output()
        .await
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
}

/// Parse `HH:MM:SS.mmm` or `MM:SS.mmm` into seconds
fn parse_timestamp(ts: &str) -> Option<f64> {
    let parts: Vec<&str> = ts.trim().split(':').collect();
    let (h, m, s) = match parts.as_slice() {
        [h, m, s] => (h.parse::<f64>().ok()?, m.parse::<f64>().ok()?, *s),
        [m, s] => (0.0, m.parse::<f64>().ok()?, *s),
        _ => return None,
    };
    let s = s.replace(',', ".").parse::<f64>().ok()?;
    Some(h * 3600.0 + m * 60.0 + s)
}

fn parse_timing(line: &str) -> Option<(f64, f64)> {
    let (start, rest) = line.split_once("-->")?;
    // Cue settings like "align:start position:0%" follow the end time
    let end = rest.split_whitespace().next()?;
    Some((parse_timestamp(start)?, parse_timestamp(end)?))
}

fn clean_cue_line(line: &str) -> String {
    let stripped = INLINE_TAG.replace_all(line, "");
    html_escape::decode_html_entities(&stripped).trim().to_string()
}

/// Convert WebVTT into segments, dropping lines repeated by rolling captions.
pub fn parse_vtt(vtt: &str) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut cue: Option<(f64, f64)> = None;
    let mut last_line = String::new();

    for line in vtt.lines() {
        let line = line.trim_end_matches('\r');

        if line.contains("-->") {
            cue = parse_timing(line);
            continue;
        }
        if line.trim().is_empty() {
            cue = None;
            continue;
        }
        let Some((start, end)) = cue else {
            // Header, NOTE/STYLE blocks, cue identifiers
            continue;
        };

        let text = clean_cue_line(line);
        if text.is_empty() || text == last_line {
            continue;
        }
        last_line = text.clone();
        segments.push(Segment {
            text,
            start,
            duration: (end - start).max(0.0),
        });
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("00:01:02.500"), Some(62.5));
        assert_eq!(parse_timestamp("01:00:00.000"), Some(3600.0));
        assert_eq!(parse_timestamp("02:03.250"), Some(123.25));
        assert_eq!(parse_timestamp("garbage"), None);
    }

    #[test]
    fn test_parse_timing_with_settings() {
        assert_eq!(
            parse_timing("00:00:01.000 --> 00:00:03.500 align:start position:0%"),
            Some((1.0, 3.5))
        );
    }

    #[test]
    fn test_parse_vtt_manual() {
        let vtt = "WEBVTT\nKind: captions\nLanguage: en\n\n\
                   1\n00:00:00.000 --> 00:00:02.000\nWelcome to the show.\n\n\
                   2\n00:00:02.000 --> 00:00:04.000\nToday we talk &amp; listen.\n";
        let segments = parse_vtt(vtt);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Welcome to the show.");
        assert_eq!(segments[1].text, "Today we talk & listen.");
        assert_eq!(segments[1].start, 2.0);
        assert_eq!(segments[1].duration, 2.0);
    }

    #[test]
    fn test_parse_vtt_strips_inline_tags_and_rolling_repeats() {
        let vtt = "WEBVTT\n\n\
                   00:00:00.000 --> 00:00:02.350 align:start position:0%\n\
                   hello<00:00:00.400><c> everyone</c>\n\n\
                   00:00:02.350 --> 00:00:02.360 align:start position:0%\n\
                   hello everyone\n \n\n\
                   00:00:02.360 --> 00:00:05.000 align:start position:0%\n\
                   hello everyone\n\
                   and<00:00:02.800><c> welcome</c>\n";
        let texts: Vec<String> = parse_vtt(vtt).into_iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["hello everyone", "and welcome"]);
    }

    #[test]
    fn test_parse_vtt_skips_note_blocks() {
        let vtt = "WEBVTT\n\nNOTE generated by a tool\nignore me\n\n\
                   00:00:01.000 --> 00:00:02.000\nkept\n";
        let texts: Vec<String> = parse_vtt(vtt).into_iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["kept"]);
    }

    #[test]
    fn test_parse_vtt_crlf() {
        let vtt = "WEBVTT\r\n\r\n00:00:01.000 --> 00:00:02.000\r\nline\r\n";
        assert_eq!(parse_vtt(vtt)[0].text, "line");
    }

    #[test]
    fn test_vtt_language() {
        assert_eq!(vtt_language(Path::new("/tmp/x/dQw4w9WgXcQ.en.vtt")), Some("en"));
        assert_eq!(vtt_language(Path::new("/tmp/x/dQw4w9WgXcQ.vtt")), None);
    }

    #[test]
    fn test_find_vtt() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_vtt(dir.path(), "dQw4w9WgXcQ", "de").unwrap().is_none());
        std::fs::write(dir.path().join("dQw4w9WgXcQ.de.vtt"), "WEBVTT\n").unwrap();
        let found = find_vtt(dir.path(), "dQw4w9WgXcQ", "de").unwrap().unwrap();
        assert_eq!(vtt_language(&found), Some("de"));
    }

    #[test]
    fn test_find_vtt_ignores_other_language() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dQw4w9WgXcQ.de.vtt"), "WEBVTT\n").unwrap();
        assert!(find_vtt(dir.path(), "dQw4w9WgXcQ", "en").unwrap().is_none());
        // "en" must not match a language that merely starts with the same letters
        std::fs::write(dir.path().join("dQw4w9WgXcQ.enm.vtt"), "WEBVTT\n").unwrap();
        assert!(find_vtt(dir.path(), "dQw4w9WgXcQ", "en").unwrap().is_none());
    }

    #[test]
    fn test_find_vtt_prefers_exact_over_regional() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dQw4w9WgXcQ.en-US.vtt"), "WEBVTT\n").unwrap();
        let found = find_vtt(dir.path(), "dQw4w9WgXcQ", "en").unwrap().unwrap();
        assert_eq!(vtt_language(&found), Some("en-US"));

        std::fs::write(dir.path().join("dQw4w9WgXcQ.en.vtt"), "WEBVTT\n").unwrap();
        let found = find_vtt(dir.path(), "dQw4w9WgXcQ", "en").unwrap().unwrap();
        assert_eq!(vtt_language(&found), Some("en"));
    }

    #[test]
    fn test_find_vtt_ignores_other_video() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("aaaaaaaaaaa.en.vtt"), "WEBVTT\n").unwrap();
        assert!(find_vtt(dir.path(), "dQw4w9WgXcQ", "en").unwrap().is_none());
    }
}
