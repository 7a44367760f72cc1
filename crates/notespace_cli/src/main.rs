//! Command-line driver for a Notespace workspace stored in SQLite.
//!
//! # Responsibility
//! - Replay one user gesture per invocation through the interaction state
//!   machine, exactly as a UI host would.
//! - Flush the debounced save before exiting.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use notespace_core::db::open_db;
use notespace_core::{
    default_log_level, init_logging, placements, to_screen, CanvasPoint, EventOutcome, InputEvent,
    InteractionStateMachine, Note, NoteId, NotePlacement, PointerTarget, RenderAdapter,
    ScreenPoint, SqliteBlobRepository, Viewport, ViewportSize, WorkspaceConfig, WorkspaceState,
};
use std::path::{Path, PathBuf};

/// Notespace - infinite-canvas sticky notes
#[derive(Parser)]
#[command(name = "notespace", version)]
#[command(about = "Inspect and edit a Notespace workspace")]
struct Cli {
    /// SQLite workspace file (default: ./notespace.sqlite3)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Directory for rotated log files; logging is off when omitted
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check core linkage
    Ping,

    /// Print the viewport and every note, bottom-most first
    Show,

    /// Create an empty note somewhere inside the visible area
    Add {
        #[arg(long, default_value_t = 1280.0)]
        width: f64,
        #[arg(long, default_value_t = 800.0)]
        height: f64,
    },

    /// Replace a note's text
    Edit { id: NoteId, text: String },

    /// Drag a note by a screen-space delta
    Drag {
        id: NoteId,
        #[arg(allow_negative_numbers = true)]
        dx: f64,
        #[arg(allow_negative_numbers = true)]
        dy: f64,
    },

    /// Pan the canvas by a screen-space delta
    Pan {
        #[arg(allow_negative_numbers = true)]
        dx: f64,
        #[arg(allow_negative_numbers = true)]
        dy: f64,
    },

    /// Apply one wheel step; positive zooms in
    Zoom {
        #[arg(allow_negative_numbers = true)]
        delta: f64,
    },
}

/// Renderer that reports each render call on stdout.
struct TextRenderer;

impl RenderAdapter for TextRenderer {
    fn render_note(&mut self, note: &Note, placement: NotePlacement) {
        println!(
            "render note={} at=({}, {}) size={}",
            note.id, placement.position.x, placement.position.y, placement.display_size
        );
    }

    fn raise_note(&mut self, id: NoteId) {
        println!("raise note={id}");
    }

    fn move_note(&mut self, id: NoteId, position: ScreenPoint) {
        println!("move note={id} to=({}, {})", position.x, position.y);
    }

    fn reposition(&mut self, viewport: &Viewport, placements: &[NotePlacement]) {
        println!(
            "reposition offset=({}, {}) notes={}",
            viewport.offset_x,
            viewport.offset_y,
            placements.len()
        );
    }

    fn redraw(&mut self, viewport: &Viewport, placements: &[NotePlacement]) {
        println!(
            "redraw zoom={} notes={}",
            viewport.zoom(),
            placements.len()
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = WorkspaceConfig::default();

    if let Some(dir) = &cli.log_dir {
        start_logging(dir, cli.log_level.as_deref())?;
    }

    if let Commands::Ping = cli.command {
        println!("notespace_core ping={}", notespace_core::ping());
        println!("notespace_core version={}", notespace_core::core_version());
        return Ok(());
    }

    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.database_file));
    let mut conn = open_db(&db_path)
        .with_context(|| format!("failed to open workspace `{}`", db_path.display()))?;
    let repo = SqliteBlobRepository::try_new(&mut conn)?;
    let mut workspace = WorkspaceState::load(repo, &config);
    let mut machine = InteractionStateMachine::from_config(&config);
    let mut renderer = TextRenderer;

    let result = run(
        cli.command,
        &config,
        &mut workspace,
        &mut machine,
        &mut renderer,
    );
    workspace.close();
    result
}

fn run(
    command: Commands,
    config: &WorkspaceConfig,
    workspace: &mut WorkspaceState<SqliteBlobRepository<'_>>,
    machine: &mut InteractionStateMachine,
    renderer: &mut TextRenderer,
) -> Result<()> {
    match command {
        Commands::Ping => {}
        Commands::Show => show(workspace, config),
        Commands::Add { width, height } => {
            let outcome = machine.handle(
                InputEvent::CreateRequested {
                    viewport_size: ViewportSize::new(width, height),
                },
                workspace,
                renderer,
            );
            let EventOutcome::NoteCreated(id) = outcome else {
                bail!("no note ids left in this workspace");
            };
            println!("created note={id}");
        }
        Commands::Edit { id, text } => {
            let outcome = machine.handle(
                InputEvent::ContentEdited { id, content: text },
                workspace,
                renderer,
            );
            if outcome == EventOutcome::Ignored {
                bail!("no note with id {id}");
            }
        }
        Commands::Drag { id, dx, dy } => {
            let Some(note) = workspace.note(id) else {
                bail!("no note with id {id}");
            };
            let origin = to_screen(CanvasPoint::new(note.x, note.y), workspace.viewport());
            let target = ScreenPoint::new(origin.x + dx, origin.y + dy);
            machine.handle(
                InputEvent::PointerDown {
                    position: origin,
                    target: PointerTarget::Note { id, origin },
                },
                workspace,
                renderer,
            );
            machine.handle(InputEvent::PointerMove { position: target }, workspace, renderer);
            machine.handle(InputEvent::PointerUp { position: target }, workspace, renderer);
        }
        Commands::Pan { dx, dy } => {
            let start = ScreenPoint::new(0.0, 0.0);
            let end = ScreenPoint::new(dx, dy);
            machine.handle(
                InputEvent::PointerDown {
                    position: start,
                    target: PointerTarget::Canvas,
                },
                workspace,
                renderer,
            );
            machine.handle(InputEvent::PointerMove { position: end }, workspace, renderer);
            machine.handle(InputEvent::PointerUp { position: end }, workspace, renderer);
        }
        Commands::Zoom { delta } => {
            machine.handle(InputEvent::Wheel { delta_y: delta }, workspace, renderer);
        }
    }
    Ok(())
}

fn show(workspace: &WorkspaceState<SqliteBlobRepository<'_>>, config: &WorkspaceConfig) {
    let viewport = workspace.viewport();
    println!(
        "viewport offset=({}, {}) zoom={}",
        viewport.offset_x,
        viewport.offset_y,
        viewport.zoom()
    );
    for placement in placements(workspace.snapshot(), config.base_note_size) {
        let Some(note) = workspace.note(placement.id) else {
            continue;
        };
        println!(
            "note={} canvas=({}, {}) screen=({}, {}) size={} content={:?}",
            note.id,
            note.x,
            note.y,
            placement.position.x,
            placement.position.y,
            placement.display_size,
            note.content
        );
    }
}

fn start_logging(dir: &Path, level: Option<&str>) -> Result<()> {
    let dir = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()
            .context("failed to resolve current directory")?
            .join(dir)
    };
    let Some(dir_str) = dir.to_str() else {
        bail!("log directory `{}` is not valid UTF-8", dir.display());
    };
    init_logging(level.unwrap_or(default_log_level()), dir_str)?;
    Ok(())
}
