use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;
use subfetch::config::{Config, OutputFormat};
use subfetch::subtitle::create_formatter;
use subfetch::{SubtitleAcquirer, VideoRef};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "subfetch")]
#[command(version, about = "Fetch or generate subtitles for platform-hosted videos")]
#[command(
    long_about = "Acquire subtitles for a video: platform-native tracks when available, otherwise generated by downloading the stream, extracting audio and running a remote transcription job. Artifacts are cached per video id."
)]
struct Cli {
    /// Video id or video page URL
    video: String,

    /// Write the formatted subtitles to this file as well
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: flat, srt, json
    #[arg(short, long, default_value = "flat")]
    format: String,

    /// Ignore a cached subtitle file and re-run the pipeline
    #[arg(long)]
    revalidate: bool,

    /// Print video metadata and exit
    #[arg(long)]
    info: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let format: OutputFormat = cli.format.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    let video = VideoRef::parse(&cli.video, config.credential.clone())
        .with_context(|| format!("Not a video id or video URL: {}", cli.video))?;

    let acquirer = SubtitleAcquirer::new(config).context("Failed to initialize pipeline")?;

    if cli.info {
        let info = acquirer.video_info(&video).await?;
        println!("{}  {}", style("Title:").bold(), info.title);
        println!("{}  {}", style("Owner:").bold(), info.owner);
        println!("{}  {}s", style("Length:").bold(), info.duration);
        println!(
            "{}  {} views, {} likes",
            style("Stats:").bold(),
            info.stat.views,
            info.stat.likes
        );
        println!(
            "{}  {} native track(s)",
            style("Subs:").bold(),
            info.subtitles.len()
        );
        return Ok(());
    }

    info!("Video:  {}", video.id());
    info!("Format: {}", format);

    let acquisition = acquirer.acquire(&video, cli.revalidate).await?;

    if let Some(output) = &cli.output {
        let formatter = create_formatter(format);
        std::fs::write(output, formatter.format(&acquisition.track.cues))
            .with_context(|| format!("Failed to write {}", output.display()))?;
    }

    println!();
    println!(
        "{} {} cues ({})",
        style("✓").green().bold(),
        acquisition.track.cues.len(),
        acquisition.source
    );
    if let Some(locale) = &acquisition.track.locale {
        println!("  Locale:   {locale}");
    }
    println!("  Subtitle: {}", acquisition.subtitle_path.display());
    if let Some(video_path) = &acquisition.video_path {
        println!("  Video:    {}", video_path.display());
    }
    if let Some(output) = &cli.output {
        println!("  Output:   {}", output.display());
    }

    Ok(())
}
