//! starforge CLI
//!
//! Command-line interface for exporting authored scenes to the client's
//! interchange formats: MGN (skinned mesh) and POB (interior building).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use starforge_export::{export_mgn, export_pob, MgnOptions, PobOptions};
use starforge_scene::Scene;

/// starforge - scene-to-client asset conversion tool
#[derive(Parser)]
#[command(name = "starforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the scene's selected mesh as a skinned mesh (MGN)
    Mgn(MgnArgs),

    /// Export the scene's active collection as a building (POB)
    Pob(PobArgs),

    /// Show information about a scene file
    Info(InfoArgs),
}

#[derive(Args)]
struct MgnArgs {
    /// Path to the scene JSON file
    #[arg(short, long)]
    scene: PathBuf,

    /// Output MGN file path
    #[arg(short, long)]
    output: PathBuf,

    /// Skip tangent generation
    #[arg(long)]
    no_tangents: bool,
}

#[derive(Args)]
struct PobArgs {
    /// Path to the scene JSON file
    #[arg(short, long)]
    scene: PathBuf,

    /// Output directory; the building and its child files are rooted here
    #[arg(short, long)]
    output: PathBuf,

    /// Mirror V on child geometry UVs
    #[arg(long)]
    flip_uv: bool,

    /// Do not write per-cell appearance geometry files
    #[arg(long)]
    skip_children: bool,

    /// Reuse the identifier stored by a prior import instead of deriving one
    #[arg(long)]
    use_imported_crc: bool,
}

#[derive(Args)]
struct InfoArgs {
    /// Path to the scene JSON file
    #[arg(short, long)]
    scene: PathBuf,

    /// Output as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Mgn(args) => cmd_mgn(args),
        Commands::Pob(args) => cmd_pob(args),
        Commands::Info(args) => cmd_info(args),
    }
}

fn load_scene(path: &PathBuf) -> Result<Scene> {
    info!("Loading scene: {:?}", path);
    Scene::from_json_file(path).with_context(|| format!("Failed to load scene {}", path.display()))
}

fn cmd_mgn(args: MgnArgs) -> Result<()> {
    let scene = load_scene(&args.scene)?;
    let options = MgnOptions {
        tangents: !args.no_tangents,
    };

    export_mgn(&scene, &args.output, &options).context("MGN export failed")?;
    println!("Wrote {}", args.output.display());
    Ok(())
}

fn cmd_pob(args: PobArgs) -> Result<()> {
    let scene = load_scene(&args.scene)?;
    let options = PobOptions {
        flip_uv: args.flip_uv,
        export_children: !args.skip_children,
        use_imported_crc: args.use_imported_crc,
    };

    let written = export_pob(&scene, &args.output, &options).context("POB export failed")?;
    println!("Wrote {}", written.display());
    Ok(())
}

fn cmd_info(args: InfoArgs) -> Result<()> {
    let scene = load_scene(&args.scene)?;

    let mesh_count = scene.objects.iter().filter(|o| o.is_mesh()).count();
    let light_count = scene
        .objects
        .iter()
        .filter(|o| o.as_light().is_some())
        .count();
    let total_vertices: usize = scene
        .objects
        .iter()
        .filter_map(|o| o.as_mesh())
        .map(|m| m.vertex_count())
        .sum();

    if args.json {
        let json = serde_json::json!({
            "path": args.scene,
            "objects": scene.objects.len(),
            "meshes": mesh_count,
            "lights": light_count,
            "vertices": total_vertices,
            "collections": scene.collections.len(),
            "selected": scene.selected.len(),
            "active_collection": scene.active_collection,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("Scene: {:?}", args.scene);
        println!("  Objects:           {}", scene.objects.len());
        println!("  Meshes:            {}", mesh_count);
        println!("  Lights:            {}", light_count);
        println!("  Vertices:          {}", total_vertices);
        println!("  Root collections:  {}", scene.collections.len());
        println!("  Selected:          {}", scene.selected.len());
        println!(
            "  Active collection: {}",
            scene.active_collection.as_deref().unwrap_or("(none)")
        );
    }

    Ok(())
}
