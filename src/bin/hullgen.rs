use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use h3_hullgen::{
    HullConfig, HullGenerator, HullGeometry, InputFileProcessor, OutputFormat, Result,
    SimplifyConfig,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliFormat {
    #[value(name = "geojson")]
    GeoJson,
    Wkt,
}

impl From<CliFormat> for OutputFormat {
    fn from(value: CliFormat) -> Self {
        match value {
            CliFormat::GeoJson => OutputFormat::GeoJson,
            CliFormat::Wkt => OutputFormat::Wkt,
        }
    }
}

/// Build H3 coverage hulls from point files and GeoTIFF masks
#[derive(Parser, Debug)]
#[command(name = "hullgen", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    settings: Settings,

    /// Log progress at info level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Silence all logging
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

/// Overrides applied on top of the config file
#[derive(Args, Debug)]
struct Settings {
    /// JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// H3 resolution (0-15)
    #[arg(long, global = true)]
    resolution: Option<u8>,

    /// Keep interior rings instead of filling them
    #[arg(long, global = true)]
    keep_holes: bool,

    /// Generate incrementally every N distinct cells
    #[arg(long, global = true, value_name = "N")]
    buffer_size: Option<usize>,

    /// Simplify the hull to at most this many vertices
    #[arg(long, global = true, value_name = "N")]
    max_vertices: Option<usize>,

    /// Output format (also the format read by `merge`)
    #[arg(long, global = true, value_enum)]
    format: Option<CliFormat>,

    /// Write latitude before longitude
    #[arg(long, global = true)]
    swap_axes: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hull of a delimited longitude,latitude file
    Csv {
        input: PathBuf,
        output: PathBuf,
        /// Regex separating the two columns
        #[arg(long)]
        delimiters: Option<String>,
    },
    /// Hull of the data pixels of a single-band GeoTIFF
    Geotiff {
        input: PathBuf,
        output: PathBuf,
        /// Side of the square read window, in pixels
        #[arg(long)]
        pixel_area: Option<u32>,
    },
    /// Merge every hull file under a directory
    Merge { dir: PathBuf, output: PathBuf },
}

fn init_tracing(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("off")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(settings: &Settings) -> Result<HullConfig> {
    let mut config = match &settings.config {
        Some(path) => HullConfig::load(path)?,
        None => HullConfig::default(),
    };

    if let Some(resolution) = settings.resolution {
        config.resolution = resolution;
    }
    if settings.keep_holes {
        config.keep_holes = true;
    }
    if settings.buffer_size.is_some() {
        config.buffer_size = settings.buffer_size;
    }
    if let Some(max_vertices) = settings.max_vertices {
        let simplify = config.simplify.get_or_insert_with(SimplifyConfig::default);
        simplify.max_vertices = max_vertices;
    }
    if let Some(format) = settings.format {
        config.output = format.into();
    }
    if settings.swap_axes {
        config.swap_axes = true;
    }
    Ok(config)
}

fn generate<P: InputFileProcessor>(
    input: P,
    config: &HullConfig,
    input_path: &Path,
    output_path: &Path,
) -> Result<()> {
    let mut generator = HullGenerator::new(input, config.writer());
    let hull = generator.generate(input_path, output_path)?;
    report(hull, output_path);
    Ok(())
}

fn report(hull: &HullGeometry, output: &Path) {
    info!(
        output = %output.display(),
        geometry = hull.geometry_type(),
        polygons = hull.polygons().len(),
        vertices = hull.vertex_count(),
        "hull written"
    );
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(&cli.settings)?;

    match cli.command {
        Command::Csv {
            input,
            output,
            delimiters,
        } => {
            if let Some(delimiters) = delimiters {
                config.delimiters = delimiters;
            }
            config.validate()?;
            generate(config.csv_processor()?, &config, &input, &output)
        }
        Command::Geotiff {
            input,
            output,
            pixel_area,
        } => {
            if let Some(pixel_area) = pixel_area {
                config.pixel_area = pixel_area;
            }
            config.validate()?;
            generate(config.geotiff_processor()?, &config, &input, &output)
        }
        Command::Merge { dir, output } => {
            config.validate()?;
            generate(config.merger()?, &config, &dir, &output)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
