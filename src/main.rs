use anyhow::Context;
use clap::{Parser, Subcommand};

mod measure;
mod model;
mod profile;
mod render;
mod table;
mod transcript;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "benchlog-tables")]
#[command(about = "Go benchmark transcripts to tables and charts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a `go test -json` benchmark transcript into a header-less CSV.
    Parse {
        input: String,

        output: String,

        #[arg(long, value_enum, default_value = "aggregation")]
        profile: profile::Profile,

        /// Comma-separated output columns, replacing the profile's own.
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },

    /// Render the aggregation comparison charts as SVG.
    Plot {
        /// Directory holding the input files.
        #[arg(long, default_value = ".")]
        dir: String,

        /// Directory the charts are written to.
        #[arg(long, default_value = ".")]
        out_dir: String,

        /// JSON file overriding the default plot style.
        #[arg(long)]
        style: Option<String>,

        #[arg(long, default_value = "poseidon-30-single.csv")]
        poseidon: String,

        #[arg(long, default_value = "pedersen-30-single.csv")]
        pedersen: String,

        /// Output of `parse --profile aggregation`.
        #[arg(long, default_value = "hyperproofs-agg.csv")]
        hyperproofs: String,

        #[arg(long, default_value = "benchmarking-snarks-verifier.json")]
        verifier: String,
    },
}

fn in_dir(dir: &str, file: &str) -> String {
    std::path::Path::new(dir)
        .join(file)
        .to_string_lossy()
        .into_owned()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Parse {
            input,
            output,
            profile,
            columns,
        } => {
            let columns = if columns.is_empty() {
                profile.columns().to_vec()
            } else {
                columns
                    .iter()
                    .map(|c| measure::Column::from_name(c))
                    .collect::<Result<Vec<_>>>()?
            };
            println!("Reading {}", input);
            let table = profile.parse_log_file(&input, &columns)?;
            if table.is_empty() {
                log::warn!("no benchmark measurements found in {}", input);
            } else {
                log::info!("{} measurement rows", table.len());
            }
            table.write_csv_file(&output)?;
            println!("Writing to {}", output);
        }
        Commands::Plot {
            dir,
            out_dir,
            style,
            poseidon,
            pedersen,
            hyperproofs,
            verifier,
        } => {
            let style = render::PlotStyle::load(style.as_deref())?;

            let prover = |file: &str, tag: &str| model::aggregation::ProverSource {
                path: in_dir(&dir, file),
                column: "prover".to_string(),
                tag: tag.to_string(),
            };
            let inputs = model::AggregationInputs {
                provers: vec![
                    prover(&poseidon, "Merkle (Poseidon)"),
                    prover(&pedersen, "Merkle (Pedersen)"),
                ],
                hyperproofs: in_dir(&dir, &hyperproofs),
                verifier: in_dir(&dir, &verifier),
            };

            for chart in model::build_charts(&inputs)? {
                let svg = render::render_svg_chart(&chart, &style)?;
                let out = in_dir(&out_dir, chart.file_name);
                std::fs::write(&out, svg).with_context(|| format!("write chart {}", out))?;
                println!("Wrote {}", out);
            }
        }
    }

    Ok(())
}
