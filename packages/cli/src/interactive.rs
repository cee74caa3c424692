//! Interactive mode: pick an action and a region from menus.

use std::path::PathBuf;

use accessmap_cli_utils::MultiProgress;
use accessmap_geocoder::region_registry;
use dialoguer::{Input, Select};

use crate::Commands;

/// Actions offered in the menu, in display order.
enum Action {
    Analyze,
    Scan,
    Prioritize,
    Plan,
    Survey,
    Merge,
    Summary,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Analyze,
        Self::Scan,
        Self::Prioritize,
        Self::Plan,
        Self::Survey,
        Self::Merge,
        Self::Summary,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Analyze => "Run full analysis",
            Self::Scan => "Scan for accessibility gaps",
            Self::Prioritize => "Prioritize areas from stored scan",
            Self::Plan => "Plan recommendations from stored results",
            Self::Survey => "Submit a survey from a JSON file",
            Self::Merge => "Merge survey recommendations",
            Self::Summary => "Show executive summary",
        }
    }
}

/// Prompts for an action and region, then runs it.
///
/// # Errors
///
/// Returns an error if a prompt fails or the chosen action fails.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("AccessMap");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    let regions = region_registry::all_regions();
    let region_labels: Vec<String> = regions
        .iter()
        .map(|r| format!("{} ({})", r.name, r.code))
        .collect();
    let region_idx = Select::new()
        .with_prompt("Region")
        .items(&region_labels)
        .default(0)
        .interact()?;
    let region = regions[region_idx].code.clone();

    let command = match Action::ALL[idx] {
        Action::Analyze => Commands::Analyze,
        Action::Scan => Commands::Scan,
        Action::Prioritize => Commands::Prioritize,
        Action::Plan => Commands::Plan,
        Action::Survey => {
            let path: String = Input::new()
                .with_prompt("Submission JSON path")
                .interact_text()?;
            Commands::Survey {
                file: PathBuf::from(path),
            }
        }
        Action::Merge => Commands::Merge,
        Action::Summary => Commands::Summary,
    };

    crate::execute(command, &region, multi).await
}
