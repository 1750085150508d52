//! Interactive prompts using dialoguer

use console::style;
use dialoguer::Confirm;

use crate::error::{PipelineError, Result};
use crate::pipeline::{Candidate, Refit};

/// Prompt user to confirm proceeding with an action
pub fn confirm_step(message: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(message)
        .default(default)
        .interact()
        .map_err(|e| PipelineError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))
}

/// Show the effect of dropping `candidate` and ask whether to drop it.
///
/// The prompt defaults to the policy's recommendation.
pub fn confirm_drop_predictor(candidate: &Candidate, refit: &Refit, policy_retain: bool) -> Result<bool> {
    println!();
    println!(
        "      Candidate {} (p = {:.4})",
        style(&candidate.predictor).yellow().bold(),
        candidate.p_value
    );
    for (name, shift) in &refit.shifts {
        println!(
            "        {} {:<28} {:>8.1}%",
            style("•").dim(),
            name,
            shift * 100.0
        );
    }
    println!(
        "      CV accuracy without it: {:.2}%",
        refit.validation.mean_accuracy * 100.0
    );
    let recommendation = if policy_retain {
        style("retain (coefficients shifted too much)").yellow()
    } else {
        style("drop").green()
    };
    println!("      Recommendation: {}", recommendation);

    confirm_step(
        &format!("Drop '{}' from the model?", candidate.predictor),
        !policy_retain,
    )
}
