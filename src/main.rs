use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use survey_etl::config::RegionFilter;
use survey_etl::schema::HarmonizeMode;
use survey_etl::{PipelineConfig, pipeline};

/// Command-line arguments for survey-etl
#[derive(Parser, Debug)]
#[command(name = "survey-etl")]
#[command(about = "Unify, clean and summarize quarterly labor-force survey extracts")]
#[command(version)]
struct Args {
    /// Directory containing the quarterly CSV extracts
    #[arg(short, long)]
    input: PathBuf,

    /// Directory to write the processed outputs to
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// JSON configuration file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reject extracts whose columns differ from the first one
    #[arg(long)]
    strict: bool,

    /// Keep only these region codes (repeatable or comma separated)
    #[arg(long, value_delimiter = ',')]
    region: Vec<i64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let start = Instant::now();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if args.strict {
        config.harmonization.mode = HarmonizeMode::Strict;
    }
    if !args.region.is_empty() {
        config.region = Some(RegionFilter {
            codes: args.region.clone(),
        });
    }

    info!("Processing extracts in {}", args.input.display());
    let output = pipeline::run(&args.input, &config)
        .with_context(|| format!("Pipeline failed for {}", args.input.display()))?;

    for (extract, rows) in output.extracts.iter().zip(&output.rows_per_extract) {
        info!("{} ({}): {rows} rows", extract.file_name, extract.period);
    }
    if output.weight_report.multiple_nonzero_rows > 0 {
        warn!(
            "{} rows carried more than one non-zero expansion weight",
            output.weight_report.multiple_nonzero_rows
        );
    }

    let summary = &output.summary;
    info!(
        "Workforce: {} respondents representing {:.0} people",
        summary.respondents, summary.represented_population
    );
    match summary.mean_income {
        Some(income) => info!("Weighted mean income: {income:.2}"),
        None => info!("Weighted mean income: insufficient data"),
    }
    match summary.informality_rate {
        Some(rate) => info!("Weighted informality rate: {:.1}%", rate * 100.0),
        None => info!("Weighted informality rate: insufficient data"),
    }

    for test in &output.hypothesis_tests {
        match (&test.result, &test.not_computable) {
            (Some(result), _) => info!(
                "{} {} by {}: statistic {:.3}, p = {:.4}{}",
                test.kind.label(),
                test.variable,
                test.grouping,
                result.statistic,
                result.p_value,
                if result.significant { " (significant)" } else { "" }
            ),
            (None, reason) => info!(
                "{} {} by {}: not computable ({})",
                test.kind.label(),
                test.variable,
                test.grouping,
                reason.as_deref().unwrap_or("insufficient data")
            ),
        }
    }

    let written = output
        .write_outputs(&args.output, &config)
        .with_context(|| format!("Failed to write outputs to {}", args.output.display()))?;
    for path in &written {
        info!("Wrote {}", path.display());
    }

    info!("Done in {:?}", start.elapsed());
    Ok(())
}
