use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TranscriptFormat {
    Text,
    Srt,
}

/// Where the transcript is fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Source {
    /// YouTube caption tracks via the InnerTube API
    Captions,
    /// Subtitles downloaded by yt-dlp
    YtDlp,
}

#[derive(Parser)]
#[command(
    name = "ytdigest",
    about = "Summarize a YouTube podcast into a PDF and mail it",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// YouTube video URL or video ID (reads from stdin if omitted)
    pub url: Option<String>,

    /// Transcript source
    #[arg(long, value_enum, default_value_t = Source::Captions)]
    pub source: Source,

    /// Preferred caption language
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Translate the transcript to this language before summarizing (e.g. en, es, fr, de)
    #[arg(short, long)]
    pub translate: Option<String>,

    /// Print the transcript before summarizing
    #[arg(long, value_enum)]
    pub show_transcript: Option<TranscriptFormat>,

    /// Reader's field, used to tailor the summary
    #[arg(long)]
    pub field: Option<String>,

    /// Reader's background
    #[arg(long)]
    pub background: Option<String>,

    /// Reader's future plans
    #[arg(long)]
    pub plans: Option<String>,

    /// LLM model for summarization (gemini-*, claude-*, or an OpenAI model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Where to write the PDF
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Email the PDF to this address
    #[arg(short, long)]
    pub email: Option<String>,

    /// Ignore and don't write the transcript cache
    #[arg(long)]
    pub no_cache: bool,

    /// Show progress and metadata
    #[arg(short, long)]
    pub verbose: bool,
}
