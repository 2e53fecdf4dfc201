use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;

use simtoc::config::Config;
use simtoc::convert::convert_path;
use simtoc::logging;

#[derive(Parser, Debug)]
#[command(author, version, about = "Convert Simulink .slx or .mdl models to C simulation code", long_about = None)]
struct Cli {
    /// Simulink .slx archive or .mdl text model
    #[arg(value_name = "MODEL_FILE")]
    model_file: Utf8PathBuf,

    /// Write the program here instead of stdout
    #[arg(short, long, value_name = "OUT")]
    output: Option<Utf8PathBuf>,

    /// Print the full conversion result (code, diagram, counts) as JSON
    #[arg(long)]
    json: bool,

    /// JSON config file
    #[arg(long, value_name = "FILE")]
    config: Option<Utf8PathBuf>,

    /// Step size of the generated model, in seconds
    #[arg(long, value_name = "S")]
    sample_time: Option<f64>,

    /// Duration simulated by the generated main(), in seconds
    #[arg(long, value_name = "S")]
    stop_time: Option<f64>,

    /// Log filter when RUST_LOG is unset (e.g. "debug")
    #[arg(long, value_name = "L")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(dt) = cli.sample_time {
        config.generator.sample_time = dt;
    }
    if let Some(t) = cli.stop_time {
        config.generator.stop_time = t;
    }
    config.validate()?;
    logging::init(&config.log_level)?;

    let conversion = convert_path(&cli.model_file, &config.generator)
        .with_context(|| format!("Failed to convert {}", cli.model_file))?;

    let text = if cli.json {
        serde_json::to_string_pretty(&conversion)?
    } else {
        conversion.c_code
    };

    match &cli.output {
        Some(out) => {
            std::fs::write(out, text).with_context(|| format!("Write {}", out))?;
            tracing::info!(path = %out, "wrote program");
        }
        None => println!("{}", text),
    }
    Ok(())
}
