use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use orbitview_assets::import_gltf;
use orbitview_engine::{FrameTimer, ModelStatus, SceneVariant, Viewer, ViewerConfig, Viewport};
use orbitview_input::ControlAction;
use orbitview_render::{DebugTextRenderer, Renderer};
use orbitview_scene::ModelPart;
use orbitview_tools::{SceneInspector, model_summary};
use tracing_subscriber::EnvFilter;

const SIMULATED_FRAME_SECONDS: f64 = 1.0 / 60.0;
const MODEL_WAIT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "orbitview-cli", about = "CLI tool for orbitview operations")]
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
    /// Decode a glTF model and print its structure
    Inspect {
        /// Path to a .gltf or .glb file
        model: PathBuf,
    },
    /// Run the viewer headless with a text renderer
    Simulate {
        /// Number of frames to tick
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Initial viewport width
        #[arg(long, default_value = "1920")]
        width: u32,
        /// Initial viewport height
        #[arg(long, default_value = "1080")]
        height: u32,
        /// Device pixel ratio reported by the simulated host
        #[arg(long, default_value = "1.0")]
        dpr: f64,
        /// Resize to WxH halfway through the run
        #[arg(long, value_parser = parse_size)]
        resize: Option<(u32, u32)>,
        /// Model to load (overrides the config)
        #[arg(long)]
        model: Option<PathBuf>,
        /// Lighting variant (overrides the config)
        #[arg(long)]
        variant: Option<SceneVariant>,
        /// JSON viewer config
        #[arg(long)]
        config: Option<PathBuf>,
        /// Horizontal drag, in pixels, applied before the first frame
        #[arg(long, default_value = "0")]
        orbit: f32,
    },
}

/// Parse `WxH` into a size with both dimensions positive.
fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("invalid dimension {v:?} in {s:?}"))
    };
    Ok((parse(w)?, parse(h)?))
}

fn print_parts(part: &ModelPart, depth: usize) {
    let t = &part.transform;
    let tris: usize = part.meshes.iter().map(|m| m.geometry.triangle_count()).sum();
    println!(
        "{:indent$}- {} meshes={} tris={} pos=({:.2}, {:.2}, {:.2}) scale=({:.2}, {:.2}, {:.2})",
        "",
        part.name.as_deref().unwrap_or("<unnamed>"),
        part.meshes.len(),
        tris,
        t.position.x,
        t.position.y,
        t.position.z,
        t.scale.x,
        t.scale.y,
        t.scale.z,
        indent = depth * 2
    );
    for child in &part.children {
        print_parts(child, depth + 1);
    }
}

struct SimulateArgs {
    frames: u64,
    width: u32,
    height: u32,
    dpr: f64,
    resize: Option<(u32, u32)>,
    model: Option<PathBuf>,
    variant: Option<SceneVariant>,
    config: Option<PathBuf>,
    orbit: f32,
}

fn simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if let Some(variant) = args.variant {
        config.variant = variant;
    }
    let load_model = args.model.is_some();
    if let Some(model) = args.model {
        config.model_path = model;
    }

    println!(
        "Simulate: frames={} viewport={}x{} dpr={} variant={}",
        args.frames, args.width, args.height, args.dpr, config.variant
    );

    let viewport = Viewport::new(args.width, args.height, args.dpr);
    let mut viewer = Viewer::new(config, DebugTextRenderer::new(), viewport);

    if load_model {
        viewer.request_model();
        match viewer.await_model(MODEL_WAIT) {
            ModelStatus::Loaded { node } => println!("Model attached as node {}", node.0),
            ModelStatus::Failed(reason) => println!("Model failed: {reason}"),
            other => println!("Model still pending: {}", other.label()),
        }
    }

    if args.orbit != 0.0 {
        viewer.handle_action(ControlAction::Rotate {
            dx: args.orbit,
            dy: 0.0,
        });
    }

    let mut timer = FrameTimer::new(120);
    let halfway = args.frames / 2;
    let mut moving_frames = 0;
    for frame in 0..args.frames {
        if frame == halfway {
            if let Some((w, h)) = args.resize {
                viewer.on_resize(w, h, args.dpr);
                println!("Resized to {w}x{h} at frame {frame}");
            }
        }
        let started = Instant::now();
        let stats = viewer.tick(frame as f64 * SIMULATED_FRAME_SECONDS)?;
        timer.record(started.elapsed());
        if stats.camera_moved {
            moving_frames += 1;
        }
    }

    tracing::debug!(frames = args.frames, moving_frames, "simulation finished");

    let renderer = viewer.renderer();
    let (bw, bh) = renderer.drawing_buffer_size();
    let (w, h) = renderer.size();
    println!(
        "Rendered {} frames; renderer {}x{} @{:.2}x (buffer {}x{}); camera aspect {:.4}",
        renderer.frames(),
        w,
        h,
        renderer.pixel_ratio(),
        bw,
        bh,
        viewer.camera().aspect()
    );
    println!(
        "Camera moved on {moving_frames} frames; settled={}",
        viewer.controls().is_settled()
    );
    println!(
        "Tick time: avg={:?} max={:?}",
        timer.average(),
        timer.max()
    );
    println!("{}", SceneInspector::summary(viewer.scene()));
    for id in SceneInspector::list_nodes(viewer.scene()) {
        if let Some(info) = SceneInspector::inspect_node(viewer.scene(), id) {
            println!("  {info}");
        }
    }
    print!("{}", renderer.last_frame());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("orbitview-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("scene: {}", orbitview_scene::crate_info());
            println!("assets: {}", orbitview_assets::crate_info());
            println!("input: {}", orbitview_input::crate_info());
            println!("render: {}", orbitview_render::crate_info());
            println!("engine: {}", orbitview_engine::crate_info());
            println!("tools: {}", orbitview_tools::crate_info());
            let defaults = ViewerConfig::default();
            println!(
                "defaults: model={} variant={} fov={} near={} far={}",
                defaults.model_path.display(),
                defaults.variant,
                defaults.camera.fov_degrees,
                defaults.camera.near,
                defaults.camera.far
            );
        }
        Commands::Inspect { model } => {
            let part = import_gltf(&model)
                .with_context(|| format!("importing {}", model.display()))?;
            println!("{}", model_summary(&part));
            print_parts(&part, 0);
        }
        Commands::Simulate {
            frames,
            width,
            height,
            dpr,
            resize,
            model,
            variant,
            config,
            orbit,
        } => simulate(SimulateArgs {
            frames,
            width,
            height,
            dpr,
            resize,
            model,
            variant,
            config,
            orbit,
        })?,
    }

    Ok(())
}
