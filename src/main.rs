use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use eyre::{Result, WrapErr, bail, eyre};
use log::{debug, info, warn};

use ytdigest::config::{Config, Provider};
use ytdigest::document::SummaryDocument;
use ytdigest::mailer::Mailer;
use ytdigest::summarize::{self, ReaderProfile};
use ytdigest::{Transcript, TranscriptSource, cache, output, pdf, subtitles, translate, youtube};

mod cli;

use cli::{Cli, Source, TranscriptFormat};

const FETCH_ATTEMPTS: u32 = 3;

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytdigest.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytdigest")
        .join("logs")
}

fn tool_version(name: &str) -> Option<String> {
    Command::new(name)
        .arg("--version")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| {
            String::from_utf8_lossy(&o.stdout)
                .trim()
                .lines()
                .next()
                .unwrap_or("")
                .to_string()
        })
}

fn build_after_help() -> String {
    let yt_dlp_line = match tool_version("yt-dlp") {
        Some(v) => format!("  \x1b[32m✅\x1b[0m yt-dlp     {v}"),
        None => "  \x1b[31m❌\x1b[0m yt-dlp     (not found, needed for --source yt-dlp)".to_string(),
    };

    format!(
        "\nOPTIONAL TOOLS:\n{yt_dlp_line}\n\nConfig is read from: {}\nLogs are written to: {}",
        ytdigest::config::config_path().display(),
        log_dir().join("ytdigest.log").display()
    )
}

/// Retry an async operation with exponential backoff
async fn retry<F, Fut, T>(max_attempts: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut last_err = None;
    for attempt in 0..max_attempts {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(e) => {
                if attempt + 1 < max_attempts {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    debug!("Attempt {} failed: {e}, retrying in {delay:?}", attempt + 1);
                    tokio::time::sleep(delay).await;
                }
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| eyre!("operation was not attempted")))
}

/// First non-empty line of stdin
fn read_url_from_stdin() -> Result<Option<String>> {
    for line in io::stdin().lock().lines() {
        let line = line?;
        if !line.trim().is_empty() {
            return Ok(Some(line.trim().to_string()));
        }
    }
    Ok(None)
}

async fn fetch_transcript(
    client: &reqwest::Client,
    source: Source,
    video_id: &str,
    lang: &str,
    use_cache: bool,
) -> Result<Transcript> {
    let transcript_source = match source {
        Source::Captions => TranscriptSource::Caption,
        Source::YtDlp => TranscriptSource::Subtitles,
    };
    let cache_dir = cache::cache_dir();

    if use_cache {
        if let Some(t) = cache::load(&cache_dir, video_id, lang, transcript_source) {
            return Ok(t);
        }
    }

    let transcript = match source {
        Source::Captions => retry(FETCH_ATTEMPTS, || youtube::fetch_captions(client, video_id, lang)).await?,
        Source::YtDlp => retry(FETCH_ATTEMPTS, || subtitles::fetch_subtitles(video_id, lang)).await?,
    };

    if use_cache {
        if let Err(e) = cache::save(&cache_dir, lang, &transcript) {
            warn!("Failed to cache transcript: {e}");
        }
    }
    Ok(transcript)
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring config file: {e}");
        Config::default()
    });

    // CLI flags take priority over config
    let lang = cli
        .lang
        .clone()
        .or_else(|| config.default_lang.clone())
        .unwrap_or_else(|| "en".to_string());
    let model = cli
        .model
        .clone()
        .or_else(|| config.default_model.clone())
        .unwrap_or_else(|| summarize::DEFAULT_MODEL.to_string());
    let translate_to = cli.translate.clone().or_else(|| config.translate_to.clone());
    let output_path = cli
        .output
        .clone()
        .or_else(|| config.output_path.clone())
        .unwrap_or_else(|| PathBuf::from(pdf::DEFAULT_OUTPUT));

    if cli.verbose {
        let config_path = ytdigest::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
    }

    let url_input = match cli.url.clone() {
        Some(url) => url,
        None => read_url_from_stdin()?.ok_or_else(|| {
            eyre!("no URL or video ID provided\n\nUsage: ytdigest <URL>\n       echo <URL> | ytdigest")
        })?,
    };

    let video_id = ytdigest::extract_video_id(&url_input)
        .ok_or_else(|| eyre!("could not extract video ID from: {url_input}\n\nSupported formats:\n  https://www.youtube.com/watch?v=ID\n  https://youtu.be/ID\n  https://www.youtube.com/embed/ID\n  https://www.youtube.com/shorts/ID\n  <11-character video ID>"))?;

    // Fail on missing credentials before doing any slow work
    let provider = Provider::for_model(&model);
    let api_key = config.api_key(provider).ok_or_else(|| {
        eyre!(
            "no {provider} API key: set {} or add it to {}",
            provider.env_var(),
            ytdigest::config::config_path().display()
        )
    })?;
    let mailer = match cli.email {
        Some(_) => Some(Mailer::from_config(config.smtp.as_ref())?),
        None => None,
    };

    let client = reqwest::Client::new();

    let transcript = fetch_transcript(&client, cli.source, &video_id, &lang, !cli.no_cache)
        .await
        .wrap_err("An error occurred while fetching transcript")?;

    if cli.verbose {
        eprintln!(
            "Video: {} ({})\nSource: {}\nLanguage: {}\nSegments: {}",
            transcript.title,
            transcript.video_id,
            transcript.source,
            transcript.language,
            transcript.segments.len(),
        );
    }

    match cli.show_transcript {
        Some(TranscriptFormat::Text) => println!("{}\n", output::render_text(&transcript)),
        Some(TranscriptFormat::Srt) => println!("{}", output::render_srt(&transcript)),
        None => {}
    }

    let mut text = transcript.plain_text();
    match translate::translation_target(translate_to.as_deref(), &transcript.language) {
        Some(target) => {
            let result = translate::translate(&client, &text, target).await;
            let (chosen, err) = translate::or_original(text, result);
            text = chosen;
            match err {
                Some(e) => {
                    warn!("Translation to {target} failed: {e:#}");
                    eprintln!("Translation error: {e:#}\nContinuing with the untranslated transcript.");
                }
                None if cli.verbose => eprintln!("Translated transcript to {target}"),
                None => {}
            }
        }
        None if translate_to.is_some() => {
            debug!("Transcript already in {}, skipping translation", transcript.language);
        }
        None => {}
    }

    let profile = ReaderProfile {
        field: cli.field.clone().unwrap_or_default(),
        background: cli.background.clone().unwrap_or_default(),
        plans: cli.plans.clone().unwrap_or_default(),
    };
    let prompt = summarize::build_prompt(&text, &profile);

    if cli.verbose {
        eprintln!("Summarizing with {model}...");
    }
    let summary = summarize::summarize(&client, &prompt, &model, &api_key)
        .await
        .wrap_err("Error generating summary")?;
    if summary.trim().is_empty() {
        bail!("Error generating summary: model returned no text");
    }

    let document = SummaryDocument::parse(&summary);
    pdf::write_pdf(&document, &config.page_style(), &output_path)?;
    println!("PDF created: {}", output_path.display());

    if let (Some(mailer), Some(to)) = (mailer, cli.email.as_deref()) {
        mailer
            .send_pdf(to, &output_path)
            .await
            .wrap_err("Error sending email")?;
        println!("Email sent to {to}");
    }

    Ok(())
}
