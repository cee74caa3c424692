#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line driver for the AccessMap analysis pipeline.
//!
//! ```text
//! accessmap analyze [--region CA]
//! accessmap scan | prioritize | plan [--region CA]
//! accessmap survey <submission.json> [--region CA]
//! accessmap merge [--region CA]
//! accessmap summary [--region CA]
//! accessmap regions
//! ```
//!
//! Running `accessmap` with no subcommand enters interactive mode.
//!
//! Provider selection and data locations come from the environment
//! (`AI_PROVIDER`, `ACCESSMAP_DATA_DIR`, `ACCESSMAP_COORDINATE_MODE`).

mod interactive;
mod progress;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use accessmap_agents::{PipelineOrchestrator, Services, SurveyRecommendationService};
use accessmap_analysis_models::result::executive_summary;
use accessmap_analysis_models::survey::SurveySubmission;
use accessmap_cli_utils::{MultiProgress, StageProgress};
use accessmap_geocoder::region_registry;
use clap::{Parser, Subcommand};

use crate::progress::BarTracker;

#[derive(Parser)]
#[command(
    name = "accessmap",
    about = "Accessibility equity analysis for census regions"
)]
struct Cli {
    /// Region code
    #[arg(long, global = true, default_value = "CA")]
    region: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scan, prioritization and planning and store the result
    Analyze,
    /// Run the scan stage alone
    Scan,
    /// Rank priority areas from stored scan results
    Prioritize,
    /// Generate recommendations from stored scan and priority results
    Plan,
    /// Enrich a survey submission read from a JSON file and merge it
    Survey {
        /// Path to the submission JSON
        file: PathBuf,
    },
    /// Re-merge stored survey recommendations into the analysis result
    Merge,
    /// Print the executive summary of the stored analysis result
    Summary,
    /// List known regions
    Regions,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = accessmap_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run(&multi).await;
    };

    execute(command, &cli.region, &multi).await
}

async fn execute(
    command: Commands,
    region: &str,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    if matches!(command, Commands::Regions) {
        for region in region_registry::all_regions() {
            println!("{:<6} {}", region.code, region.name);
        }
        return Ok(());
    }

    let services = Arc::new(Services::from_env()?);

    match command {
        Commands::Analyze => analyze(&services, region, multi).await?,
        Commands::Scan => {
            let spinner = StageProgress::spinner(multi, "AccessScanner: scanning");
            let gaps = PipelineOrchestrator::new(services).run_scan(region).await;
            let gaps = finish(&spinner, gaps)?;
            println!("{} accessibility gaps stored", gaps.len());
        }
        Commands::Prioritize => {
            let spinner = StageProgress::spinner(multi, "EquityAdvisor: prioritizing");
            let areas = PipelineOrchestrator::new(services)
                .run_prioritize(region)
                .await;
            let areas = finish(&spinner, areas)?;
            for area in &areas {
                println!(
                    "{:<12} {:<32} {:>5.1} {}",
                    area.id, area.location, area.priority_score, area.priority_level
                );
            }
        }
        Commands::Plan => {
            let spinner = StageProgress::spinner(multi, "PlannerBot: planning");
            let recommendations = PipelineOrchestrator::new(services).run_plan(region).await;
            let recommendations = finish(&spinner, recommendations)?;
            for rec in &recommendations {
                println!("{:<8} [{}] {}", rec.id, rec.kind, rec.title);
            }
        }
        Commands::Survey { file } => submit_survey(&services, region, &file, multi).await?,
        Commands::Merge => {
            let written = SurveyRecommendationService::new(services)
                .merge(region)
                .await?;
            if written {
                println!("Survey recommendations merged");
            } else {
                println!("Survey recommendations already up to date");
            }
        }
        Commands::Summary => {
            let state = region_registry::region(region)?.code;
            match services.results.load(&state)? {
                Some(result) => print!("{}", executive_summary(&result)),
                None => {
                    eprintln!("No analysis result for {state}. Run `accessmap analyze` first.");
                    std::process::exit(1);
                }
            }
        }
        Commands::Regions => {}
    }

    Ok(())
}

fn finish<T, E>(progress: &StageProgress, outcome: Result<T, E>) -> Result<T, E> {
    match &outcome {
        Ok(_) => progress.finish("done"),
        Err(_) => progress.fail("failed"),
    }
    outcome
}

async fn analyze(
    services: &Arc<Services>,
    region: &str,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = BarTracker::new(multi, region);
    let result = PipelineOrchestrator::new(Arc::clone(services))
        .run(region, &tracker)
        .await?;

    let summary = &result.summary;
    println!();
    println!("Analysis for {} complete", result.metadata.state);
    println!(
        "  {} gaps ({} critical), {} priority areas, {} recommendations ({} from surveys)",
        summary.total_issues_identified,
        summary.critical_issues,
        result.priority_areas.len(),
        result.recommendations.len(),
        result.metadata.total_survey_recommendations
    );
    println!(
        "  Result: {}",
        services
            .data_dir
            .analysis_result(&result.metadata.state)
            .display()
    );
    Ok(())
}

async fn submit_survey(
    services: &Arc<Services>,
    region: &str,
    file: &Path,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let submission: SurveySubmission = serde_json::from_str(&std::fs::read_to_string(file)?)?;

    let spinner = StageProgress::spinner(multi, "SurveyBot: enriching submission");
    let stored = SurveyRecommendationService::new(Arc::clone(services))
        .submit(region, submission)
        .await;
    let stored = finish(&spinner, stored)?;

    println!("Stored {}", stored.id);
    if let Some(rec) = &stored.ai_recommendation {
        println!("  {} [{}]", rec.title, rec.kind);
        println!("  {} | {} | {}", rec.priority_level, rec.cost_estimate, rec.timeline);
    }
    Ok(())
}
