use actorloop_assets::AssetStore;
use actorloop_kernel::{SceneConfig, Simulation};
use actorloop_render::{FrameDriver, FrameRecorder, TextRenderer};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "actorloop-cli", about = "Headless actorloop runner")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Run the simulation for a fixed number of frames, printing text frames
    Run {
        /// Number of frames to run
        #[arg(short, long, default_value = "3")]
        frames: u64,
        /// Scene file (.yaml, .yml or .json)
        #[arg(short, long)]
        scene: Option<PathBuf>,
        /// Model for every entity (`builtin:cube` or an OBJ path)
        #[arg(short, long)]
        model: Option<String>,
        /// Print every Nth frame; 0 prints none
        #[arg(long, default_value = "1")]
        every: u64,
        /// Dump the event log as JSON lines after the run
        #[arg(long)]
        events: bool,
    },
    /// Load a scene and its models without running it
    Validate {
        /// Scene file (.yaml, .yml or .json)
        scene: PathBuf,
    },
}

fn load_scene(path: Option<&Path>, model: Option<String>) -> anyhow::Result<SceneConfig> {
    let scene = match path {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("failed to load scene {}", path.display()))?,
        None => SceneConfig::default(),
    };
    Ok(match model {
        Some(model) => scene.with_model(model),
        None => scene,
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("actorloop-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("assets: {}", actorloop_assets::crate_info());
            println!("kernel: {}", actorloop_kernel::crate_info());
            println!("render: {}", actorloop_render::crate_info());
        }
        Commands::Run {
            frames,
            scene,
            model,
            every,
            events,
        } => {
            let scene = load_scene(scene.as_deref(), model)?;
            let mut assets = AssetStore::new();
            let mut sim = Simulation::new();
            scene
                .populate(&mut sim, &mut assets)
                .context("failed to populate scene")?;

            println!("{}: {} entities, {frames} frames", scene.title, sim.entity_count());

            let driver = FrameDriver::from_scene(&scene);
            let text = TextRenderer::new();
            let mut recorder = FrameRecorder::with_frame_limit(frames);
            let summary = driver.run(&mut sim, &assets, &mut recorder, |_, rec| {
                if let Some(frame) = rec.take_frame() {
                    if every > 0 && frame.frame() % every == 0 {
                        print!("{}", text.render(&frame));
                    }
                }
            })?;

            println!(
                "\nAfter {} frames: {} contacts, {} tag flips, state hash {:#018x}",
                summary.frames,
                summary.contacts,
                summary.flips,
                sim.state_hash()
            );
            for entity in sim.registry().iter() {
                let p = entity.position();
                println!(
                    "  {}  pos=({:.3}, {:.3}, {:.3})  tag={}",
                    entity.id(),
                    p.x,
                    p.y,
                    p.z,
                    entity.tag()
                );
            }

            let released = sim
                .teardown(&mut assets)
                .context("failed to release assets")?;
            println!("Released {released} asset handles; {} still loaded", assets.len());

            if events {
                for event in sim.drain_events() {
                    println!("{}", serde_json::to_string(&event)?);
                }
            }
        }
        Commands::Validate { scene: path } => {
            let scene = load_scene(Some(&path), None)?;
            let mut assets = AssetStore::new();
            let mut sim = Simulation::new();
            scene
                .populate(&mut sim, &mut assets)
                .context("failed to populate scene")?;
            println!(
                "{}: OK ({} entities, {} distinct meshes)",
                path.display(),
                sim.entity_count(),
                assets.mesh_count()
            );
            for entity in sim.registry().iter() {
                let b = entity.bounds();
                println!(
                    "  {}  tag={}  bounds=({:.3}, {:.3}, {:.3})..({:.3}, {:.3}, {:.3})",
                    entity.id(),
                    entity.tag(),
                    b.min.x,
                    b.min.y,
                    b.min.z,
                    b.max.x,
                    b.max.y,
                    b.max.z
                );
            }
            sim.teardown(&mut assets)
                .context("failed to release assets")?;
        }
    }

    Ok(())
}
