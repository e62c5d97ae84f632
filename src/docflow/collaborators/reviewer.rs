//! Interactive reviewer on the terminal

use super::{ReviewDecision, Reviewer};
use crate::adk::error::BoxError;
use dialoguer::Input;

/// Asks the operator on stdin/stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReviewer;

/// Approval is any answer starting with `y`
pub fn is_approval(answer: &str) -> bool {
    answer.trim().to_lowercase().starts_with('y')
}

impl Reviewer for ConsoleReviewer {
    fn review(&self, preview: &str) -> Result<ReviewDecision, BoxError> {
        println!("\nProcessed Content Preview:");
        println!("{}...", preview);

        let answer: String = Input::new()
            .with_prompt("\nAre you satisfied with this result? (yes/no)")
            .interact_text()?;

        if is_approval(&answer) {
            return Ok(ReviewDecision::Approved);
        }

        let feedback: String = Input::new()
            .with_prompt("What should be improved?")
            .allow_empty(true)
            .interact_text()?;

        Ok(ReviewDecision::Rejected { feedback })
    }
}
