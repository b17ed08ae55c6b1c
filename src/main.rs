use clap::{Parser, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;

use rve_pbc::{error::PbcError, generator, input, mesher, post_processor};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Inp,
    Json,
}

/// Generates periodic boundary constraints for a 2D RVE mesh
#[derive(Parser, Debug)]
#[command(name = "rve-pbc", version)]
struct Cli {
    /// Input json with the metadata section and, optionally, the edge nodes
    input_json: String,

    /// Gmsh .msh file (ASCII v4) to select boundary nodes from
    mesh: Option<String>,

    /// Output file
    #[arg(short, long, default_value = "pbc.inp")]
    output: String,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Inp)]
    format: OutputFormat,
}

fn run(cli: &Cli) -> Result<(), PbcError> {
    let input_json = input::load_input_file(&cli.input_json)?;
    let metadata = input::parse_input_metadata(&input_json)?;

    let model = match &cli.mesh {
        Some(mesh_file) => {
            let mesh = mesher::load_mesh(
                mesh_file,
                metadata.rve_length,
                metadata.rve_breadth,
                metadata.edge_tolerance,
            )?;
            generator::run(&mesh, &metadata)?
        }
        None => match input::parse_input_edges(&input_json)? {
            Some(edges) => generator::run(&edges, &metadata)?,
            None => {
                return Err(PbcError::Input(
                    "No mesh file given and input json has no edges section".to_owned(),
                ))
            }
        },
    };

    match cli.format {
        OutputFormat::Inp => post_processor::inp_output(&model, &metadata, &cli.output),
        OutputFormat::Json => post_processor::json_output(&model, &cli.output),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        error!("{err}");
        std::process::exit(1)
    }
}
