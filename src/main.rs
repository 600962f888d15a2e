//! modelbench-mcp: MCP protocol bridge for the Modelbench editor.
//!
//! Standalone entry point: runs the bridge over an in-memory scene seeded
//! the way a fresh editor session looks (default texture, one starter
//! project, stock toolbar). A host embedding swaps the in-memory adapters
//! for its real scene engine and undo system.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use modelbench_mcp::config;
use modelbench_mcp::mcp::http::{run_server, BridgeState};
use modelbench_mcp::scene::model::{BarItem, Project};
use modelbench_mcp::scene::{EditJournal, InMemoryScene};

/// MCP protocol bridge for the Modelbench editor.
///
/// Exposes the editor's scene model as JSON-RPC tools and resources over
/// HTTP, for remote agents.
#[derive(Parser, Debug)]
#[command(name = "modelbench-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN, // Default to warn for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Seeds the scene the way a fresh editor session looks.
fn seed_scene(scene: &InMemoryScene) {
    scene.add_project(Project {
        uuid: uuid::Uuid::new_v4(),
        name: "New Project".to_string(),
        thumbnail: InMemoryScene::placeholder_thumbnail(),
        nodes_3d: indexmap::IndexMap::new(),
        active: true,
    });

    for (name, icon, tooltip) in [
        ("undo", "undo", "Undo the last edit"),
        ("redo", "redo", "Redo the last undone edit"),
        ("toggle_grid", "grid_on", "Toggle the grid overlay"),
        ("screenshot", "photo_camera", "Capture the viewport"),
    ] {
        scene.add_bar_item(BarItem {
            name: name.to_string(),
            icon: icon.to_string(),
            tooltip: tooltip.to_string(),
            enabled: true,
        });
    }
}

/// Entry point for the modelbench-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let config_path = args.config.as_deref();
    let cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            if config_path.is_none() {
                if let Some(default_path) = config::default_config_path() {
                    eprintln!("\nExpected config at: {}", default_path.display());
                }
            }
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting modelbench-mcp server"
    );

    let scene = Arc::new(InMemoryScene::new());
    seed_scene(&scene);
    let state = BridgeState::new(scene, Arc::new(EditJournal::new()));

    // The host editor runs one cooperative event loop; mirror it with a
    // current-thread runtime so handler interleaving matches.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run_server(state, &cfg.server)) {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn log_level_ladder() {
        assert_eq!(get_log_level(0, false, "warn"), Level::WARN);
        assert_eq!(get_log_level(0, false, "debug"), Level::DEBUG);
        assert_eq!(get_log_level(1, false, "warn"), Level::INFO);
        assert_eq!(get_log_level(2, false, "warn"), Level::DEBUG);
        assert_eq!(get_log_level(3, false, "warn"), Level::TRACE);
        assert_eq!(get_log_level(2, true, "warn"), Level::ERROR);
    }

    #[test]
    fn seeded_scene_has_starter_project_and_toolbar() {
        use modelbench_mcp::scene::SceneAdapter as _;

        let scene = InMemoryScene::new();
        seed_scene(&scene);

        let projects = scene.projects();
        assert_eq!(projects.len(), 1);
        assert!(projects[0].active);
        assert_eq!(scene.bar_items().len(), 4);
    }
}
