//! Terminal rendering of release events.
//!
//! The core emits plain [`ReleaseEvent`] values; this module turns them
//! into the colored checkpoint lines users see. `--silent` swallows
//! everything, including errors.

use owo_colors::OwoColorize;
use tagver_core::{Figure, ReleaseEvent};

/// Renders release events to stdout.
pub struct Renderer {
    silent: bool,
    dry_run: bool,
}

impl Renderer {
    /// Create a renderer honoring the silent and dry-run modes.
    pub const fn new(silent: bool, dry_run: bool) -> Self {
        Self { silent, dry_run }
    }

    /// Print one release event.
    pub fn render(&self, event: &ReleaseEvent) {
        if self.silent {
            return;
        }
        match event {
            ReleaseEvent::Checkpoint { figure, message } => {
                println!("{} {message}", self.figure(*figure));
            }
            ReleaseEvent::Warning(message) => {
                println!("{} {message}", "⚠".yellow());
            }
            ReleaseEvent::ChangelogPreview(content) => {
                println!("\n---\n{content}\n---");
            }
        }
    }

    /// Print a fatal error.
    pub fn render_error(&self, error: &anyhow::Error) {
        if self.silent {
            return;
        }
        eprintln!("{} {error:#}", "✗".red());
    }

    fn figure(&self, figure: Figure) -> String {
        match figure {
            // Dry runs report work they did not do.
            Figure::Tick if self.dry_run => "✓".yellow().to_string(),
            Figure::Tick => "✓".green().to_string(),
            Figure::Cross => "✗".red().to_string(),
            Figure::Info => "ℹ".blue().to_string(),
        }
    }
}
