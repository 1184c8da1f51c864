use crate::adapter::PlaylistAdapter;
use crate::youtube::FetchError;
use chrono::{DateTime, Utc};
use colored::Colorize;

/// Callbacks the presenter drives. Every call arrives on the presenter's own task.
pub trait PlaylistView {
    fn set_loading(&mut self, loading: bool);

    fn show_dataset(&mut self, adapter: &PlaylistAdapter<'_>);

    fn launch_external_video(&mut self, video_id: &str, url: &str);

    fn show_error(&mut self, _error: &FetchError) {}
}

/// Prints rows to stdout. Opening a video prints its watch link.
#[derive(Default)]
pub struct TerminalView;

impl PlaylistView for TerminalView {
    fn set_loading(&mut self, loading: bool) {
        if loading {
            eprintln!("{}", "loading playlist...".dimmed());
        }
    }

    fn show_dataset(&mut self, adapter: &PlaylistAdapter<'_>) {
        if adapter.is_empty() {
            println!("{}", "playlist is empty".yellow());
            return;
        }

        for (position, row) in adapter.rows().enumerate() {
            match published_date(row.published_at) {
                Some(date) => println!(
                    "{} {} {}",
                    format!("{:>3}.", position).cyan(),
                    row.title.bold(),
                    format!("({})", date).dimmed()
                ),
                None => println!("{} {}", format!("{:>3}.", position).cyan(), row.title.bold()),
            }

            if let Some(line) = row.description.lines().find(|line| !line.trim().is_empty()) {
                println!("     {}", line);
            }

            if let Some(url) = row.image_url {
                println!("     {}", url.dimmed());
            }
        }
    }

    fn launch_external_video(&mut self, video_id: &str, url: &str) {
        println!("{} {}", video_id.green(), url.underline());
    }

    fn show_error(&mut self, error: &FetchError) {
        eprintln!("{} {}", "could not load playlist:".red(), error);
    }
}

/// Formats a snippet's `publishedAt` as a calendar date, if it parses.
fn published_date(published_at: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(published_at)
        .ok()
        .map(|published| published.with_timezone(&Utc).format("%Y-%m-%d").to_string())
}
