//! speckle CLI - detect and annotate dark particles in images.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use speckle::{BatchRunner, ColorMode, Config, Connectivity, ParticleDetector, Region};

#[derive(Debug, Parser)]
#[command(name = "speckle")]
#[command(about = "Detect, measure and mark dark particles against their local background")]
#[command(version)]
struct Cli {
    /// Log level used when RUST_LOG is not set.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Directory for the rolling log file.
    #[arg(long, default_value = "logs", global = true)]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Process a single image.
    Detect(DetectArgs),

    /// Process a list or a directory of images with shared parameters.
    Batch(BatchArgs),
}

#[derive(Debug, Clone, Args)]
struct DetectArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Path of the annotated output image; the format follows the extension.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Debug, Clone, Args)]
struct BatchArgs {
    /// Input images, processed in the given order.
    #[arg(required_unless_present = "input_dir", conflicts_with = "input_dir")]
    images: Vec<PathBuf>,

    /// Process every PNG, JPEG and BMP file in this directory.
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Directory receiving `{stem}_marked.{ext}` files. Created if missing.
    #[arg(long)]
    output_dir: PathBuf,

    /// Process images in parallel.
    #[arg(long)]
    parallel: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

/// Options shared by both subcommands.
#[derive(Debug, Clone, Args)]
struct PipelineArgs {
    /// YAML or JSON parameter file. Command-line overrides win.
    #[arg(long)]
    config: Option<PathBuf>,

    /// How particles are painted.
    #[arg(long, value_enum, default_value_t = ModeArg::Flat)]
    mode: ModeArg,

    /// Region of interest as `left,top,right,bottom` in pixels.
    #[arg(long)]
    region: Option<String>,

    #[command(flatten)]
    overrides: ParameterOverrides,
}

#[derive(Debug, Clone, Default, Args)]
struct ParameterOverrides {
    /// Sensitivity of the lower band edge, in [0, 1].
    #[arg(long)]
    sensitivity_min: Option<f32>,

    /// Sensitivity of the upper band edge, in [0, 1].
    #[arg(long)]
    sensitivity_max: Option<f32>,

    /// Gaussian sigma of the background estimate, in pixels.
    #[arg(long)]
    blur_radius: Option<f32>,

    /// Frame width excluded from detection, in pixels.
    #[arg(long)]
    border_width: Option<usize>,

    /// Smallest accepted particle, in pixels (0 = no lower bound).
    #[arg(long)]
    min_size: Option<usize>,

    /// Largest accepted particle, in pixels (0 = no upper bound).
    #[arg(long)]
    max_size: Option<usize>,

    /// Cluster neighborhood radius between particle centroids, in pixels.
    #[arg(long)]
    cluster_eps: Option<f64>,

    /// Particles (including itself) needed around a cluster core.
    #[arg(long)]
    cluster_min_samples: Option<usize>,

    /// Pixel connectivity of particles.
    #[arg(long, value_enum)]
    connectivity: Option<ConnectivityArg>,

    /// Also reject pixels darker than the lower band edge.
    #[arg(long)]
    reject_below_band: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Flat,
    Gradient,
    Clustered,
}

impl From<ModeArg> for ColorMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Flat => ColorMode::Flat,
            ModeArg::Gradient => ColorMode::Gradient,
            ModeArg::Clustered => ColorMode::Clustered,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ConnectivityArg {
    Four,
    Eight,
}

impl From<ConnectivityArg> for Connectivity {
    fn from(c: ConnectivityArg) -> Self {
        match c {
            ConnectivityArg::Four => Connectivity::Four,
            ConnectivityArg::Eight => Connectivity::Eight,
        }
    }
}

impl ParameterOverrides {
    fn apply(&self, config: &mut Config) {
        if let Some(v) = self.sensitivity_min {
            config.sensitivity_min = v;
        }
        if let Some(v) = self.sensitivity_max {
            config.sensitivity_max = v;
        }
        if let Some(v) = self.blur_radius {
            config.blur_radius = v;
        }
        if let Some(v) = self.border_width {
            config.border_width = v;
        }
        if let Some(v) = self.min_size {
            config.min_particle_size = v;
        }
        if let Some(v) = self.max_size {
            config.max_particle_size = (v > 0).then_some(v);
        }
        if let Some(v) = self.cluster_eps {
            config.cluster_eps = v;
        }
        if let Some(v) = self.cluster_min_samples {
            config.cluster_min_samples = v;
        }
        if let Some(v) = self.connectivity {
            config.connectivity = v.into();
        }
        if self.reject_below_band {
            config.reject_below_band = true;
        }
    }
}

impl PipelineArgs {
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => Config::default(),
        };
        self.overrides.apply(&mut config);
        Ok(config)
    }

    fn region(&self) -> anyhow::Result<Option<Region>> {
        self.region
            .as_deref()
            .map(Region::parse)
            .transpose()
            .context("Invalid --region")
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    common::log_setup::setup_logging(&cli.log_level, &cli.log_dir)
        .context("Failed to set up logging")?;

    match cli.command {
        Commands::Detect(args) => run_detect(&args),
        Commands::Batch(args) => run_batch(&args),
    }
}

fn run_detect(args: &DetectArgs) -> anyhow::Result<()> {
    let config = args.pipeline.config()?;
    tracing::debug!("Parameters: {:?}", config);

    let mut detector = ParticleDetector::from_config(config).with_mode(args.pipeline.mode.into());
    if let Some(region) = args.pipeline.region()? {
        detector = detector.with_region(region);
    }

    let result = detector
        .detect(args.image.as_path())
        .with_context(|| format!("Failed to process {}", args.image.display()))?;
    result.save(&args.out)?;

    println!("Output:         {}", args.out.display());
    println!("Particle area:  {:.2}%", result.area_percentage);
    println!("Particle count: {}", result.particle_count);
    if let Some(clusters) = result.cluster_count {
        println!("Cluster count:  {}", clusters);
    }
    Ok(())
}

fn collect_inputs(args: &BatchArgs) -> anyhow::Result<Vec<PathBuf>> {
    match &args.input_dir {
        Some(dir) => common::file_utils::image_files(dir)
            .with_context(|| format!("Failed to list images in {}", dir.display())),
        None => Ok(args.images.clone()),
    }
}

fn run_batch(args: &BatchArgs) -> anyhow::Result<()> {
    let config = args.pipeline.config()?;
    let paths = collect_inputs(args)?;
    if paths.is_empty() {
        bail!("No input images");
    }

    let outcomes = BatchRunner::new(config, &args.output_dir)
        .with_region(args.pipeline.region()?)
        .with_mode(args.pipeline.mode.into())
        .parallel(args.parallel)
        .run(&paths)?;

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(item) => println!(
                "{} -> {}: {:.2}%, {} particles",
                display_name(&outcome.source),
                item.output_path.display(),
                item.area_percentage,
                item.particle_count
            ),
            Err(e) => {
                failed += 1;
                println!("{}: FAILED ({})", display_name(&outcome.source), e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} images failed", failed, paths.len());
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
