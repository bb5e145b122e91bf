//! Library interface for the `tagver` CLI.
//!
//! This crate exposes the CLI's argument parser as a library, primarily for
//! testing. The actual entry point is in `main.rs`.
//!
//! # Structure
//!
//! - [`Cli`] - The root argument parser (clap derive)
//!
//! Every release-affecting flag maps onto a [`Config`] field; flags the user
//! passed win over any configuration file.

use camino::Utf8PathBuf;
use clap::Parser;
use std::path::PathBuf;
use tagver_core::Config;
use tagver_core::version::Prerelease;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Configure global color output based on this choice.
    ///
    /// Call this once at startup to set the color mode.
    pub fn apply(self) {
        match self {
            Self::Auto => {} // owo-colors auto-detects by default
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }
}

/// A release step that can be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SkipStep {
    /// Do not bump versions in tracked files.
    Bump,
    /// Do not regenerate the changelog.
    Changelog,
    /// Do not create the release commit.
    Commit,
    /// Do not create the release tag.
    Tag,
}

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    RUST_LOG                Log filter (e.g., debug, tagver=trace)
    TAGVER_LOG_PATH         Explicit log file path
    TAGVER_LOG_DIR          Log directory
";
/// Command-line interface definition for tagver.
#[derive(Parser)]
#[command(name = "tagver")]
#[command(
    about = "Versioning and changelog automation powered by conventional commits",
    long_about = None
)]
#[command(version)]
#[command(after_long_help = ENV_HELP)]
pub struct Cli {
    /// Release exactly this version, or force a bump level (major|minor|patch)
    #[arg(long, value_name = "VERSION|LEVEL")]
    pub release_as: Option<String>,

    /// Make a prerelease, optionally tagged with an identifier (e.g. alpha)
    #[arg(
        short = 'p',
        long,
        value_name = "ID",
        num_args = 0..=1,
        default_missing_value = ""
    )]
    pub prerelease: Option<String>,

    /// Tag an existing version instead of bumping it
    #[arg(short, long)]
    pub first_release: bool,

    /// GPG-sign the release commit and tag
    #[arg(short, long)]
    pub sign: bool,

    /// Add a Signed-off-by trailer to the release commit
    #[arg(long)]
    pub signoff: bool,

    /// Bypass git hooks when committing
    #[arg(short, long)]
    pub no_verify: bool,

    /// Commit all staged changes, not just the files tagver touched
    #[arg(short = 'a', long)]
    pub commit_all: bool,

    /// Changelog file to read from and write to
    #[arg(short, long, value_name = "FILE")]
    pub infile: Option<Utf8PathBuf>,

    /// Prefix for release tags
    #[arg(short, long, value_name = "PREFIX")]
    pub tag_prefix: Option<String>,

    /// Replace an existing tag with the same name
    #[arg(long)]
    pub tag_force: bool,

    /// Skip a release step (repeatable)
    #[arg(long, value_enum, value_name = "STEP")]
    pub skip: Vec<SkipStep>,

    /// Report what would happen without touching the repository
    #[arg(long)]
    pub dry_run: bool,

    /// Print nothing to stdout
    #[arg(long)]
    pub silent: bool,

    /// Release commit message ({{currentTag}} expands to the tag)
    #[arg(long, value_name = "FORMAT")]
    pub release_commit_message_format: Option<String>,

    /// Path to configuration file (overrides discovery)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long, value_name = "DIR")]
    pub chdir: Option<PathBuf>,

    /// Only print errors (suppresses warnings/info)
    #[arg(short, long)]
    pub quiet: bool,

    /// More detail (repeatable; e.g. -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize output
    #[arg(long, value_enum, default_value_t)]
    pub color: ColorChoice,
}

impl Cli {
    /// Fold the flags the user passed into a loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref release_as) = self.release_as {
            config.release_as = Some(release_as.clone());
        }
        if let Some(ref identifier) = self.prerelease {
            config.prerelease = if identifier.is_empty() {
                Prerelease::Unnamed
            } else {
                Prerelease::Named(identifier.clone())
            };
        }
        if self.first_release {
            config.first_release = true;
        }
        if self.sign {
            config.sign = true;
        }
        if self.signoff {
            config.signoff = true;
        }
        if self.no_verify {
            config.no_verify = true;
        }
        if self.commit_all {
            config.commit_all = true;
        }
        if let Some(ref infile) = self.infile {
            config.infile = infile.clone();
        }
        if let Some(ref prefix) = self.tag_prefix {
            config.tag_prefix = prefix.clone();
        }
        if self.tag_force {
            config.tag_force = true;
        }
        for step in &self.skip {
            match step {
                SkipStep::Bump => config.skip.bump = true,
                SkipStep::Changelog => config.skip.changelog = true,
                SkipStep::Commit => config.skip.commit = true,
                SkipStep::Tag => config.skip.tag = true,
            }
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if self.silent {
            config.silent = true;
        }
        if let Some(ref format) = self.release_commit_message_format {
            config.release_commit_message_format = format.clone();
        }
    }
}
