use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use anyhow::Context;
use burn::prelude::Config;
use clap::{Parser, Subcommand};
use scene::{LoadConfig, Scene};
use splats::{
    AttributeFile, EncodeConfig, InitConfig, decode, encode_attribute_file, splats_from_points,
    sh, write_atomic, write_compact, write_splats,
};
use tracing::info;

/// Turns a COLMAP reconstruction into Gaussian splats and packs splat files for the web viewer.
#[derive(Parser)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Seed an attribute file with one splat per sparse point
    Init {
        /// Directory containing the COLMAP binary tables
        #[arg(short, long)]
        input: PathBuf,

        /// Attribute file to write
        #[arg(short, long)]
        output: PathBuf,

        /// JSON file with `load` and `init` sections
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Encode an attribute file into a compact `.splat` stream
    Convert {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// JSON encode config
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print a summary of a compact `.splat` stream
    Inspect {
        #[arg(short, long)]
        input: PathBuf,

        /// Number of leading records to print
        #[arg(short = 'n', long, default_value_t = 5)]
        head: usize,
    },
}

#[derive(Config, Debug)]
struct InitJob {
    #[config(default = "LoadConfig::new()")]
    load: LoadConfig,
    #[config(default = "InitConfig::new()")]
    init: InitConfig,
}

fn load_config<C: Config>(path: Option<&Path>, default: impl FnOnce() -> C) -> anyhow::Result<C> {
    match path {
        Some(path) => C::load(path)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(default()),
    }
}

async fn init(input: &Path, output: &Path, config: &InitJob) -> anyhow::Result<()> {
    let scene = Scene::load(input, &config.load).await?;
    scene.require_views(config.load.min_views)?;

    let points: Vec<_> = scene
        .points
        .iter()
        .map(|p| (p.xyz.as_vec3(), p.rgb))
        .collect();
    let records = splats_from_points(&points, &config.init);
    let rest = sh::sh_rest_for_degree(config.init.sh_degree) as usize;
    write_atomic(output, |w| write_splats(&records, rest, w))?;
    Ok(())
}

fn read_attribute_file(path: &Path) -> anyhow::Result<AttributeFile> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(AttributeFile::read(&mut BufReader::new(file))?)
}

fn convert(input: &Path, output: &Path, config: &EncodeConfig) -> anyhow::Result<()> {
    let file = read_attribute_file(input)?;
    info!("Read {} rows with {} fields", file.row_count(), file.fields().len());
    let packed = encode_attribute_file(&file, config)?;
    write_atomic(output, |w| write_compact(&packed, w))?;
    Ok(())
}

fn inspect(input: &Path, head: usize) -> anyhow::Result<()> {
    let bytes = std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let packed = decode(&bytes)?;
    println!("{}: {} splats", input.display(), packed.len());
    for (i, splat) in packed.iter().take(head).enumerate() {
        println!(
            "{i:>4} pos {:?} scale {:?} rgba {:?} rot {:?}",
            splat.position,
            splat.scale,
            splat.rgba().to_array(),
            splat.rotation()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    match args.command {
        Command::Init { input, output, config } => {
            let config = load_config(config.as_deref(), InitJob::new)?;
            init(&input, &output, &config).await
        }
        Command::Convert { input, output, config } => {
            let config = load_config(config.as_deref(), EncodeConfig::new)?;
            convert(&input, &output, &config)
        }
        Command::Inspect { input, head } => inspect(&input, head),
    }
}
