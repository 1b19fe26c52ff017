//! Display logic for the url-fetch CLI.
//!
//! Content goes to stdout; spinner, headers and timing summaries go to
//! stderr so piped output stays clean.

use console::{style, Term};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url_fetch_lib::FetchStrategy;

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Progress line shown on stderr while a batch is in flight.
///
/// Names the batch size and strategy and ticks the elapsed time, so a slow
/// host is visible before the batch finishes.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start the progress line for a batch, or `None` if stderr isn't a TTY.
    pub fn start(url_count: usize, strategy: FetchStrategy) -> Option<Self> {
        if !Term::stderr().is_term() {
            return None;
        }

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();
        let label = progress_label(url_count, strategy);

        let handle = tokio::spawn(async move {
            let term = Term::stderr();
            let started = Instant::now();
            for frame in SPINNER_FRAMES.iter().cycle() {
                if !running_clone.load(Ordering::Relaxed) {
                    break;
                }
                let _ = term.clear_line();
                let _ = term.write_str(&format!(
                    "{} {} {}",
                    style(frame).cyan(),
                    label,
                    style(format!("{:.1}s", started.elapsed().as_secs_f64())).dim()
                ));
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Some(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop ticking and clear the progress line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

fn progress_label(url_count: usize, strategy: FetchStrategy) -> String {
    format!(
        "Fetching {} URL{} ({})",
        url_count,
        if url_count == 1 { "" } else { "s" },
        strategy
    )
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a verbose run.
pub fn print_header(url_count: usize, strategy: FetchStrategy) {
    eprintln!(
        "{} {} {}",
        style("url-fetch").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "— {} URL{} ({})",
            url_count,
            if url_count == 1 { "" } else { "s" },
            strategy
        ))
        .dim(),
    );
}

// ── Results ──────────────────────────────────────────────────────────────────

/// Print one fetched body under a `==> url <==` banner.
pub fn print_content(url: &str, content: &str, show_banner: bool) {
    if show_banner {
        println!("{}", style(format!("==> {} <==", url)).yellow().bold());
    }
    print!("{}", content);
    if !content.ends_with('\n') {
        println!();
    }
}

/// Print a digest line in `md5sum` layout.
pub fn print_digest(url: &str, digest: &str) {
    println!("{}  {}", digest, url);
}

/// Print elapsed time for each strategy and the speedup of the throttled run.
pub fn print_comparison(url_count: usize, timings: &[(FetchStrategy, Duration)]) {
    eprintln!();
    eprintln!(
        "{}",
        style(format!("Fetched {} URLs:", url_count)).bold()
    );
    for (strategy, elapsed) in timings {
        eprintln!(
            "  {:<24} {}",
            strategy.to_string(),
            style(format!("{:.2?}", elapsed)).cyan()
        );
    }

    if let [(_, sequential), (_, throttled)] = timings {
        if !throttled.is_zero() {
            let speedup = sequential.as_secs_f64() / throttled.as_secs_f64();
            eprintln!(
                "  {:<24} {}",
                "speedup",
                style(format!("{:.1}x", speedup)).green().bold()
            );
        }
    }
}

/// Print a short summary after a run.
pub fn print_summary(url_count: usize, total_bytes: usize, elapsed: Duration) {
    eprintln!(
        "{}",
        style(format!(
            "{} URL{} · {} bytes · {:.2?}",
            url_count,
            if url_count == 1 { "" } else { "s" },
            total_bytes,
            elapsed
        ))
        .dim()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_label_names_batch_and_strategy() {
        assert_eq!(
            progress_label(12, FetchStrategy::Throttled(4)),
            "Fetching 12 URLs (throttled (max 4))"
        );
        assert_eq!(
            progress_label(1, FetchStrategy::Sequential),
            "Fetching 1 URL (sequential)"
        );
    }
}
