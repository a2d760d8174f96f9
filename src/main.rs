use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use std::fs;
use std::path::PathBuf;

use git_release::changelog::ChangelogGenerator;
use git_release::config::{self, Config};
use git_release::git::{Git2Store, RevisionStore};
use git_release::manifest::ManifestUpdater;
use git_release::rewrite::{normalize_message, HistoryRewriter};
use git_release::tags::{TagManager, TagPattern};
use git_release::ui;
use git_release::version::{resolve, Bump};

#[derive(clap::Parser)]
#[command(
    name = "git-release",
    about = "Bump the manifest version, create release tags, and generate changelogs"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(
        short,
        long,
        default_value = "info",
        help = "Sets the verbosity level (trace, debug, info, warn, error)"
    )]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Bump the manifest version, commit it, and create the release tag
    Bump {
        /// One of major, minor, patch, or an explicit X.Y.Z version
        bump: String,

        #[arg(short, long, help = "Skip confirmation prompts")]
        force: bool,

        #[arg(long, help = "Preview what would happen without making changes")]
        dry_run: bool,
    },

    /// Generate the changelog document for a release range
    Changelog {
        #[arg(short, long, help = "Generate for a specific release tag instead of the latest")]
        tag: Option<String>,

        #[arg(short, long, help = "Output path (defaults to <tag>-changelog.md)")]
        output: Option<String>,
    },

    /// Rewrite every commit message in history to the normalized format
    RewriteHistory {
        #[arg(short, long, help = "Skip confirmation prompts")]
        force: bool,
    },
}

fn main() {
    let args = Args::parse();
    setup_logging(&args.log_level);

    // Load configuration
    let config = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Commands::Bump {
            bump,
            force,
            dry_run,
        } => run_bump(&config, &bump, force, dry_run),
        Commands::Changelog { tag, output } => {
            run_changelog(&config, tag.as_deref(), output.as_deref())
        }
        Commands::RewriteHistory { force } => run_rewrite(&config, force),
    };

    if let Err(e) = result {
        ui::display_error(&e.to_string());
        std::process::exit(1);
    }
}

fn setup_logging(level: &str) {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
}

fn open_store(config: &Config) -> Result<Git2Store> {
    let identity = match (&config.identity.name, &config.identity.email) {
        (Some(name), Some(email)) => Some((name.clone(), email.clone())),
        _ => None,
    };
    Ok(Git2Store::discover(".", identity)?)
}

fn manifest_updater(config: &Config) -> ManifestUpdater {
    ManifestUpdater::new(
        PathBuf::from(&config.release.manifest),
        config.release.lock.as_ref().map(PathBuf::from),
        config.release.lock_command.clone(),
    )
}

/// The release flow: resolve the next version, rewrite the manifest, commit,
/// and tag. Each step either succeeds or aborts the whole invocation; a
/// failure after the manifest write leaves the working tree for inspection
/// instead of rolling back.
fn run_bump(config: &Config, bump_arg: &str, force: bool, dry_run: bool) -> Result<()> {
    let bump = Bump::from_arg(bump_arg)?;
    let store = open_store(config)?;
    let updater = manifest_updater(config);

    let current = updater.current_version()?;
    let next = resolve(&current.to_string(), &bump)?;
    let pattern = TagPattern::new(&config.release.tag_pattern);
    let tag_name = pattern.format(&next);

    ui::display_proposed_bump(&current.to_string(), &next.to_string(), &tag_name);

    if dry_run {
        ui::display_status("Dry run:");
        ui::display_success(&format!(
            "  Step 1: would set {} to version {}",
            config.release.manifest, next
        ));
        if let Some(lock) = &config.release.lock {
            ui::display_success(&format!("  Step 2: would refresh {}", lock));
        }
        ui::display_success(&format!(
            "  Step 3: would commit \"chore: bump version to {}\"",
            next
        ));
        ui::display_success(&format!("  Step 4: would create tag {}", tag_name));
        return Ok(());
    }

    if !force && !ui::confirm_action(&format!("Bump version {} to {}?", current, next))? {
        println!("Operation cancelled by user.");
        std::process::exit(1);
    }

    updater.apply(&next)?;
    ui::display_success(&format!("Updated {} to {}", config.release.manifest, next));

    if config.release.lock.is_some() {
        ui::display_status("Refreshing lock artifact...");
        updater.refresh_lock()?;
        ui::display_success("Lock artifact is up to date");
    }

    let commit_message = format!("chore: bump version to {}", next);
    let paths = updater.staged_paths();
    let commit_id = store.commit_files(&paths, &commit_message)?;
    ui::display_success(&format!(
        "Created commit {}",
        commit_id.chars().take(7).collect::<String>()
    ));

    let manager = TagManager::new(&store, pattern);
    let head = store.head()?;
    let tag = manager.create_tag(&next, &head)?;
    ui::display_success(&format!("Created tag {}", tag.name));
    ui::display_status(&format!(
        "Push the tag when ready, then run 'git-release changelog' to publish the notes for {}.",
        tag.name
    ));

    Ok(())
}

/// Resolves the release boundaries and writes the changelog document named
/// after the release tag into the working directory.
fn run_changelog(config: &Config, tag_name: Option<&str>, output: Option<&str>) -> Result<()> {
    let store = open_store(config)?;
    let manager = TagManager::new(&store, TagPattern::new(&config.release.tag_pattern));

    let (lower, upper, title) = match tag_name {
        Some(name) => {
            let tag = manager.resolve(name)?;
            let lower = manager.previous_tag(&tag)?;
            (lower, tag.target.clone(), tag.name)
        }
        None => match manager.latest_tag()? {
            Some(tag) => {
                let lower = manager.previous_tag(&tag)?;
                (lower, tag.target.clone(), tag.name)
            }
            None => (None, store.head()?, "unreleased".to_string()),
        },
    };

    let generator = ChangelogGenerator::new(&store, &config.changelog);
    let document = generator.generate(lower.as_ref(), &upper, &title)?;

    let path = match output {
        Some(output) => PathBuf::from(output),
        None => PathBuf::from(format!("{}-changelog.md", title)),
    };
    fs::write(&path, document)?;
    ui::display_success(&format!("Wrote {}", path.display()));

    Ok(())
}

/// The out-of-band maintenance flow: normalize every commit message in the
/// repository's history. Never part of the release path.
fn run_rewrite(config: &Config, force: bool) -> Result<()> {
    let store = open_store(config)?;

    ui::display_status("This rewrites every commit reachable from every reference.");
    ui::display_status(
        "Commit hashes will change; tags and remote branches pointing into the \
         rewritten range go stale and are not repaired.",
    );

    if !force && !ui::confirm_action("Rewrite the entire history?")? {
        println!("Operation cancelled by user.");
        std::process::exit(1);
    }

    let rewriter = HistoryRewriter::new(&store);
    let rewritten = rewriter.rewrite_all(normalize_message)?;
    ui::display_success(&format!("Rewrote {} commit messages", rewritten));

    Ok(())
}
