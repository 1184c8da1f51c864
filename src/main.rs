use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use tubelist::config::API_KEY_VAR;
use tubelist::youtube::YouTube;
use tubelist::{logging, Config, Presenter, TerminalView};

/// Lists the videos of a YouTube playlist.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Playlist to show instead of the configured one.
    #[arg(short, long)]
    playlist: Option<String>,

    /// Page cursor printed by a previous run.
    #[arg(long)]
    page_token: Option<String>,

    /// Print the watch link of the video at this row.
    #[arg(short, long, value_name = "ROW")]
    open: Option<usize>,

    /// Config file, `tubelist.toml` by default.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    let args = Args::parse();
    let config =
        Config::load(args.config.as_deref())?.with_api_key_override(env::var(API_KEY_VAR).ok());

    let youtube = YouTube::new(&config.client()).context("could not build the YouTube client")?;
    let mut presenter = Presenter::new(youtube, TerminalView, config.api_key.clone())
        .with_policy(config.reload_policy);
    presenter.set_playlist_id(args.playlist.unwrap_or(config.playlist_id));
    if let Some(page_token) = args.page_token {
        presenter.set_page_token(page_token);
    }

    presenter.load_playlist_items();
    let interrupted = tokio::select! {
        _ = presenter.run_until_idle() => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        presenter.unsubscribe();
        return Ok(());
    }

    if let Some(row) = args.open {
        presenter.start_video_intent(row)?;
    }

    if let Some(page_token) = presenter.next_page_token() {
        tracing::info!("more videos available with --page-token {}", page_token);
    }

    Ok(())
}
