//! Schema-driven card pipeline editor.
//!
//! Manages a pipeline (`.cardflow/pipeline.json`) of configurable cards
//! against a card type catalog, and writes evaluation requests once every
//! required field is filled in.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use cardflow::core::types::CardId;
use cardflow::edit::{CardTypeRef, EditCommand, edit_workspace, parse_raw_value};
use cardflow::exit_codes;
use cardflow::io::atomic::write_atomic;
use cardflow::io::init::{InitOptions, init_workspace};
use cardflow::io::pipeline_store::parse_document;
use cardflow::session::Session;
use cardflow::submit::{SubmitOutcome, submit_from_root};
use cardflow::validate::validate_workspace;
use cardflow::view::{CardView, pipeline_view};

#[derive(Parser)]
#[command(
    name = "cardflow",
    version,
    about = "Schema-driven card pipeline editor"
)]
struct Cli {
    /// Project root containing `.cardflow/`.
    #[arg(short = 'C', long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.cardflow/` with the built-in catalog and an empty pipeline.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// List the card types in the catalog.
    Catalog {
        /// Print the full catalog as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show cards, their fields and outputs.
    Show {
        /// Print the derived views as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Insert a card after `--after`, or at the head.
    Add {
        /// Card type id (or label with `--label`).
        card_type: String,
        #[arg(long)]
        after: Option<u64>,
        /// Interpret CARD_TYPE as a catalog label.
        #[arg(long)]
        label: bool,
    },
    /// Remove a card.
    Remove { id: u64 },
    /// Set a field. VALUE is parsed as JSON when possible, else taken as text.
    Set {
        id: u64,
        key: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// List the columns available to a card.
    Columns { id: u64 },
    /// Check the workspace and report incomplete cards.
    Validate,
    /// Write the evaluation request if every card is complete.
    Submit {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export the pipeline document.
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replace the pipeline with an exported document.
    Import { path: PathBuf },
}

fn main() {
    cardflow::logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let root = cli.root.as_path();
    match cli.command {
        Command::Init { force } => cmd_init(root, force),
        Command::Catalog { json } => cmd_catalog(root, json),
        Command::Show { json } => cmd_show(root, json),
        Command::Add {
            card_type,
            after,
            label,
        } => {
            let card_type = if label {
                CardTypeRef::Label(card_type)
            } else {
                CardTypeRef::TypeId(card_type)
            };
            let command = EditCommand::Add {
                card_type,
                after: after.map(CardId),
            };
            let id = edit_workspace(root, &command)?;
            println!("{}", id);
            Ok(exit_codes::OK)
        }
        Command::Remove { id } => {
            edit_workspace(root, &EditCommand::Remove { id: CardId(id) })?;
            Ok(exit_codes::OK)
        }
        Command::Set { id, key, value } => {
            let command = EditCommand::Set {
                id: CardId(id),
                key,
                raw: parse_raw_value(&value),
            };
            edit_workspace(root, &command)?;
            Ok(exit_codes::OK)
        }
        Command::Columns { id } => cmd_columns(root, CardId(id)),
        Command::Validate => cmd_validate(root),
        Command::Submit { out } => cmd_submit(root, out.as_deref()),
        Command::Export { out } => cmd_export(root, out.as_deref()),
        Command::Import { path } => cmd_import(root, &path),
    }
}

fn cmd_init(root: &Path, force: bool) -> Result<i32> {
    let paths = init_workspace(root, &InitOptions { force })?;
    println!("initialized {}", paths.cardflow_dir.display());
    Ok(exit_codes::OK)
}

fn cmd_catalog(root: &Path, json: bool) -> Result<i32> {
    let session = Session::open(root)?;
    if json {
        print_json(session.catalog())?;
        return Ok(exit_codes::OK);
    }
    for config in session.catalog().iter() {
        println!("{}\t{}", config.type_id, config.label);
    }
    Ok(exit_codes::OK)
}

fn cmd_show(root: &Path, json: bool) -> Result<i32> {
    let session = Session::open(root)?;
    let view = pipeline_view(session.pipeline());
    if json {
        print_json(&view)?;
        return Ok(exit_codes::OK);
    }
    for card in &view.cards {
        print_card(card);
    }
    for dangling in &view.dangling {
        println!(
            "warning: card {} field '{}' references missing column '{}'",
            dangling.card, dangling.field, dangling.column
        );
    }
    Ok(exit_codes::OK)
}

fn print_card(card: &CardView) {
    let status = if card.valid { "ready" } else { "incomplete" };
    println!("#{} {} ({}) {}", card.id, card.type_id, card.label, status);
    for field in card.fields.iter().filter(|field| field.visible) {
        let marker = if field.required && !field.valid { "!" } else { " " };
        println!("  {} {} = {}", marker, field.key, field.value);
    }
    let outputs: Vec<&str> = card.outputs.iter().map(|c| c.name.as_str()).collect();
    println!("  -> [{}]", outputs.join(", "));
}

fn cmd_columns(root: &Path, id: CardId) -> Result<i32> {
    let session = Session::open(root)?;
    let pipeline = session.pipeline();
    pipeline
        .card(id)
        .with_context(|| format!("card {} not found in pipeline", id))?;
    for column in pipeline.available_columns(id) {
        println!("{}", column.name);
    }
    Ok(exit_codes::OK)
}

fn cmd_validate(root: &Path) -> Result<i32> {
    let report = validate_workspace(root)?;
    for dangling in &report.dangling {
        println!(
            "warning: card {} field '{}' references missing column '{}'",
            dangling.card, dangling.field, dangling.column
        );
    }
    if !report.is_ready() {
        for card in &report.incomplete {
            println!(
                "card {} ({}) incomplete: {}",
                card.id,
                card.type_id,
                card.fields.join(", ")
            );
        }
        return Ok(exit_codes::NOT_READY);
    }
    println!("ok: {} cards ready", report.cards);
    Ok(exit_codes::OK)
}

fn cmd_submit(root: &Path, out: Option<&Path>) -> Result<i32> {
    match submit_from_root(root, out)? {
        SubmitOutcome::Written { path, .. } => {
            println!("{}", path.display());
            Ok(exit_codes::OK)
        }
        SubmitOutcome::NotReady(not_ready) => {
            eprintln!("{}", not_ready);
            for card in &not_ready.incomplete {
                eprintln!(
                    "  card {} ({}): {}",
                    card.id,
                    card.type_id,
                    card.fields.join(", ")
                );
            }
            Ok(exit_codes::NOT_READY)
        }
    }
}

fn cmd_export(root: &Path, out: Option<&Path>) -> Result<i32> {
    let session = Session::open(root)?;
    let document = session.export();
    match out {
        Some(path) => {
            let mut buf = serde_json::to_string_pretty(&document).context("serialize export")?;
            buf.push('\n');
            write_atomic(path, &buf)?;
        }
        None => print_json(&document)?,
    }
    Ok(exit_codes::OK)
}

fn cmd_import(root: &Path, path: &Path) -> Result<i32> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let document =
        parse_document(&contents).with_context(|| format!("import {}", path.display()))?;
    let mut session = Session::open(root)?;
    session.import(document)?;
    session.save()?;
    println!("imported {} cards", session.pipeline().len());
    Ok(exit_codes::OK)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{}", payload);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::parse_from(["cardflow", "init"]);
        assert!(matches!(cli.command, Command::Init { force: false }));
    }

    #[test]
    fn parse_init_force() {
        let cli = Cli::parse_from(["cardflow", "init", "--force"]);
        assert!(matches!(cli.command, Command::Init { force: true }));
    }

    #[test]
    fn parse_add_after_with_root() {
        let cli = Cli::parse_from(["cardflow", "add", "split", "--after", "2", "-C", "/tmp/x"]);
        assert_eq!(cli.root, PathBuf::from("/tmp/x"));
        assert!(matches!(
            cli.command,
            Command::Add { ref card_type, after: Some(2), label: false } if card_type == "split"
        ));
    }

    #[test]
    fn parse_set_keeps_raw_text() {
        let cli = Cli::parse_from(["cardflow", "set", "1", "columns", "[\"age\"]"]);
        let Command::Set { id, key, value } = cli.command else {
            panic!("expected set");
        };
        assert_eq!((id, key.as_str(), value.as_str()), (1, "columns", "[\"age\"]"));
    }
}
