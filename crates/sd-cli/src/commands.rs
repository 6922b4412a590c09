use anyhow::Context;
use colored::Colorize;
use sd_codec::{
    read_envelope, read_tree_json, write_envelope, write_tree_json, CodecError, DeltaEnvelope,
    DeltaPayload, PayloadFormat,
};
use sd_diff::compute_diff_with;
use sd_tree::TreeDigest;
use serde::Serialize;
use tracing::info;

use crate::cli::*;
use crate::config::CliConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    match cli.command {
        Command::Diff(args) => cmd_diff(args, &config, &cli.format),
        Command::Apply(args) => cmd_apply(args, &config),
        Command::Show(args) => cmd_show(args, &cli.format),
        Command::Inspect(args) => cmd_inspect(args, &cli.format),
        Command::Verify(args) => cmd_verify(args, &config),
    }
}

/// Machine-readable result of `sdelta diff`.
#[derive(Debug, Serialize)]
pub struct DiffSummary {
    pub root: String,
    pub replacement: bool,
    pub changes: usize,
    pub base: String,
    pub target: String,
    pub bytes: Option<usize>,
}

impl DiffSummary {
    fn new(envelope: &DeltaEnvelope, bytes: Option<usize>) -> Self {
        Self {
            root: envelope.root.clone(),
            replacement: envelope.is_replacement(),
            changes: envelope.delta().map_or(0, |d| d.change_count()),
            base: envelope.base_digest.to_hex(),
            target: envelope.target_digest.to_hex(),
            bytes,
        }
    }
}

fn cmd_diff(args: DiffArgs, config: &CliConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let before = read_tree_json(&args.before)
        .with_context(|| format!("loading {}", args.before.display()))?;
    let after = read_tree_json(&args.after)
        .with_context(|| format!("loading {}", args.after.display()))?;

    let envelope = DeltaEnvelope::seal(&before, &after, &config.engine)?;
    let payload_format = if args.json { PayloadFormat::Json } else { config.codec.format };
    let bytes = match &args.output {
        Some(path) => Some(
            write_envelope(path, &envelope, payload_format)
                .with_context(|| format!("writing {}", path.display()))?,
        ),
        None => None,
    };
    info!(root = %envelope.root, replacement = envelope.is_replacement(), "diff complete");

    let summary = DiffSummary::new(&envelope, bytes);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => {
            if envelope.is_noop() {
                println!("{} {} unchanged.", "✓".green().bold(), summary.root.bold());
            } else if summary.replacement {
                println!("{} Roots differ: full replacement of {}", "!".yellow().bold(), summary.root.bold());
            } else {
                println!("{} {} change(s) to {}", "✓".green().bold(), summary.changes, summary.root.bold());
            }
            println!("  Base:   {}", envelope.base_digest.short_hex().dimmed());
            println!("  Target: {}", envelope.target_digest.short_hex().dimmed());
            if let (Some(path), Some(bytes)) = (&args.output, bytes) {
                println!("  Wrote {} bytes to {}", bytes, path.display().to_string().cyan());
            }
        }
    }
    Ok(())
}

fn cmd_apply(args: ApplyArgs, config: &CliConfig) -> anyhow::Result<()> {
    let mut tree = read_tree_json(&args.tree)
        .with_context(|| format!("loading {}", args.tree.display()))?;
    let envelope = read_envelope(&args.delta)
        .with_context(|| format!("loading {}", args.delta.display()))?;

    if let Err(e) = envelope.apply_to(&mut tree, &config.engine, &config.codec) {
        report_fault(&e);
        return Err(e).context("applying delta");
    }

    let output = args.output.as_ref().unwrap_or(&args.tree);
    write_tree_json(output, &tree).with_context(|| format!("writing {}", output.display()))?;
    info!(root = %envelope.root, output = %output.display(), "delta applied");
    println!(
        "{} Applied delta to {} ({})",
        "✓".green().bold(),
        envelope.root.bold(),
        envelope.target_digest.short_hex().dimmed()
    );
    Ok(())
}

fn report_fault(error: &CodecError) {
    if error.requires_resync() {
        eprintln!("{} {}", "✗ Patch fault:".red().bold(), error);
        eprintln!("  {}", "Tree is not the delta's pre-image; full schema resync required.".red());
    } else {
        eprintln!("{} {}", "✗".red().bold(), error);
    }
}

#[derive(Serialize)]
struct TreeInfo {
    tag: String,
    unique_name: String,
    digest: String,
    nodes: usize,
}

fn cmd_show(args: ShowArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let tree = read_tree_json(&args.tree)
        .with_context(|| format!("loading {}", args.tree.display()))?;
    let info = TreeInfo {
        tag: tree.tag.clone(),
        unique_name: tree.unique_name(),
        digest: TreeDigest::of(&tree).to_hex(),
        nodes: tree.node_count(),
    };
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
        OutputFormat::Text => {
            println!("Identity: {}", info.unique_name.escape_debug().to_string().yellow());
            println!("Digest:   {}", info.digest.cyan());
            println!("Nodes:    {}", info.nodes);
            println!("{tree}");
        }
    }
    Ok(())
}

fn cmd_inspect(args: InspectArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let envelope = read_envelope(&args.delta)
        .with_context(|| format!("loading {}", args.delta.display()))?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&envelope)?),
        OutputFormat::Text => {
            let kind = match &envelope.payload {
                DeltaPayload::Patch(_) => "patch".green(),
                DeltaPayload::Replace(_) => "replace".yellow(),
            };
            println!("Kind: {kind}");
            print!("{envelope}");
        }
    }
    Ok(())
}

fn cmd_verify(args: VerifyArgs, config: &CliConfig) -> anyhow::Result<()> {
    let before = read_tree_json(&args.before)
        .with_context(|| format!("loading {}", args.before.display()))?;
    let after = read_tree_json(&args.after)
        .with_context(|| format!("loading {}", args.after.display()))?;

    let envelope = DeltaEnvelope::seal(&before, &after, &config.engine)?;
    let mut replica = before.clone();
    envelope
        .apply_to(&mut replica, &config.engine, &config.codec)
        .context("applying delta to a copy of the before-tree")?;

    if replica.min_string() != after.min_string() {
        anyhow::bail!("patched tree does not match {}", args.after.display());
    }
    let rediff = compute_diff_with(&replica, &after, &config.engine)?;
    if !rediff.is_some_and(|d| d.is_unchanged()) {
        anyhow::bail!("re-diffing the patched tree is not empty");
    }

    println!("{} Delta round-trips", "✓".green().bold());
    println!("  Patch result: {}", "matches after-tree".green());
    println!("  Re-diff: {}", "empty".green());
    if envelope.is_replacement() {
        println!("  Mode: {}", "full replacement".yellow());
    }
    Ok(())
}
