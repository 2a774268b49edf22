//! Headless entry point: load a board, replay an input script, write the result.

mod replay;

use anyhow::{Context, Result};
use clap::Parser;
use inkboard_core::{BoardConfig, Editor};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "inkboard", version, about = "Replay whiteboard input against a board file")]
struct Cli {
    /// Element array JSON. Created empty when missing.
    board: PathBuf,

    /// JSON array of input events to replay.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Engine configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the rendered board as SVG.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Where to write the resulting element array. Defaults to the board file.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Open the board read-only.
    #[arg(long)]
    readonly: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::info!("Starting inkboard");

    let config = match &cli.config {
        Some(path) => BoardConfig::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => BoardConfig::default(),
    };
    let mut board = replay::load_board(&cli.board, replay::replay_config(config))?;
    board.set_readonly(cli.readonly);
    let mut editor = Editor::new(board);

    if let Some(script) = &cli.replay {
        let events = replay::load_script(script)?;
        let stats = replay::replay(&mut editor, &events);
        log::info!(
            "replayed {} events: {} tree changes, {} undo steps",
            stats.events,
            stats.value_changes,
            stats.undo_steps
        );
    }

    let board = editor.into_board();
    let out = cli.out.as_ref().unwrap_or(&cli.board);
    let json = board.to_json()?;
    std::fs::write(out, json).with_context(|| format!("writing {}", out.display()))?;
    log::info!("wrote {} elements to {}", board.children().len(), out.display());

    if let Some(path) = &cli.svg {
        std::fs::write(path, replay::render_svg(&board)).with_context(|| format!("writing {}", path.display()))?;
        log::info!("rendered {}", path.display());
    }
    Ok(())
}
