use clap::Parser;
use tracing::error;

use state_fiscal_pipeline::config::PipelineConfig;
use state_fiscal_pipeline::observability::logging;
use state_fiscal_pipeline::pipeline;

#[derive(Parser)]
#[command(name = "state_fiscal_pipeline")]
#[command(about = "Aggregates state fiscal, ranking, tax burden, and population data into one CSV")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the pipeline configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// Override the configured output CSV path
    #[arg(long)]
    output: Option<String>,
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let mut config = PipelineConfig::load_or_default(&cli.config)?;
    if let Some(output) = cli.output {
        config.output.path = output;
    }

    println!("🔄 Running state data pipeline...");
    match pipeline::run(&config) {
        Ok(summary) => {
            println!("\n📊 Pipeline Results:");
            println!("   States: {}", summary.rows);
            println!("   Columns: {}", summary.columns);
            println!("   Output file: {}", summary.output_path);
            println!("✅ Pipeline completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            println!("❌ Pipeline failed: {}", e);
            std::process::exit(1);
        }
    }
}
