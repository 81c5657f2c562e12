use anyhow::{bail, Context, Result};
use clap::Parser;
use diff_review::attachment::ViewMode;
use diff_review::{parse_unified_diff, DiffReviewableState, DiffTable};
use diff_review_config::AppConfig;
use std::io::{self, Write};
use std::path::PathBuf;

mod attachment;
mod logger;
mod replay;
mod script;

use attachment::{preview_attachment, AttachmentDefaults};
use script::{ReplayScript, ScriptedFetcher};

#[derive(Parser, Debug)]
#[command(name = "diff-review-replay")]
#[command(about = "Replay a recorded review session and print the emitted events as JSON lines")]
#[command(version)]
struct Args {
    /// Session script (JSON)
    #[arg(required_unless_present = "attachment")]
    script: Option<PathBuf>,

    /// Build the table from a unified diff instead of the script's groups
    #[arg(short, long)]
    diff: Option<PathBuf>,

    /// File of the diff to review (0-based)
    #[arg(long, default_value = "0")]
    file: usize,

    /// Lines revealed per expand control (defaults to the config value)
    #[arg(long)]
    context_lines: Option<u32>,

    /// Print the final table as JSON after the events
    #[arg(long, default_value = "false")]
    print_table: bool,

    /// Preview an attachment file (XML, notebook or text) instead of replaying
    #[arg(long, conflicts_with = "script")]
    attachment: Option<PathBuf>,

    /// Preview in this view mode instead of the configured default
    #[arg(long)]
    view_mode: Option<ViewMode>,

    /// Keep XML text content on the same line as its tags
    #[arg(long, default_value = "false")]
    same_line: bool,

    /// Print the attachment defaults from the config as a JSON line
    #[arg(long, default_value = "false")]
    print_settings: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_file = logger::init()?;
    log::info!("Starting diff-review-replay, logging to {}", log_file.display());

    let config = AppConfig::load();
    let defaults = AttachmentDefaults::from_config(&config)?;
    log::debug!("Attachment defaults: {:?}", defaults);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.print_settings {
        writeln!(out, "{}", defaults.to_json())?;
    }

    if let Some(path) = &args.attachment {
        let view_mode = args.view_mode.unwrap_or(defaults.view_mode);
        for line in preview_attachment(path, view_mode, args.same_line)? {
            writeln!(out, "{}", line)?;
        }
        return Ok(());
    }

    let Some(script_path) = &args.script else {
        bail!("Pass a session script or --attachment");
    };
    let script = ReplayScript::load(script_path)?;
    let table = initial_table(&args, &config, &script)?;

    let mut state = DiffReviewableState::new(script.context.clone(), table);
    let fetcher = ScriptedFetcher::new(script.fragments);

    let summary = replay::replay(&mut state, &fetcher, script.actions, &mut out).await?;

    if args.print_table {
        writeln!(out, "{}", serde_json::to_string(state.table.groups())?)?;
    }

    log::info!(
        "Replayed {} action(s): {} event(s), {} failed fetch(es)",
        summary.actions,
        summary.events,
        summary.failed_fetches
    );
    Ok(())
}

fn initial_table(args: &Args, config: &AppConfig, script: &ReplayScript) -> Result<DiffTable> {
    let Some(diff_path) = &args.diff else {
        if script.groups.is_empty() {
            bail!("The script has no table; pass --diff to build one from a diff");
        }
        return Ok(DiffTable::new(script.groups.clone()));
    };

    let text = std::fs::read_to_string(diff_path)
        .with_context(|| format!("Failed to read diff {}", diff_path.display()))?;
    let context_lines = args.context_lines.unwrap_or(config.expand_context_lines);
    let mut files = parse_unified_diff(&text, context_lines)?;
    let file_count = files.len();
    if args.file >= file_count {
        bail!("The diff has {} file(s), cannot review file {}", file_count, args.file);
    }

    let file = files.swap_remove(args.file);
    log::info!("Reviewing {} ({} rows)", file.path, file.table.row_count());
    Ok(file.table)
}
