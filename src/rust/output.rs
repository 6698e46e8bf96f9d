// SPDX-FileCopyrightText: 2025 ECHIDNA Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Output formatting module for CLI
//!
//! Provides JSON and pretty-printed text output with colors

use anyhow::Result;
use colored::Colorize;
use hybrid_prover::integration::VerificationStatus;
use hybrid_prover::router::AttemptResult;
use hybrid_prover::{
    AggregatedProverResult, FormulaAnalysis, HybridProverResult, LogicCritic, RouterProofResult,
};
use serde::Serialize;
use std::fmt::Display;
use std::str::FromStr;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid output format: {}. Must be 'text' or 'json'", s)),
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

fn verdict(valid: bool) -> colored::ColoredString {
    if valid {
        "✓ Valid".green().bold()
    } else {
        "✗ Not valid".red().bold()
    }
}

/// Output formatter for different output formats
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Output an error message
    pub fn error(&self, message: &str) -> Result<()> {
        match self.format {
            OutputFormat::Text => eprintln!("{}", message.red().bold()),
            OutputFormat::Json => self.output_json(&JsonMessage {
                level: "error",
                message,
            })?,
        }
        Ok(())
    }

    /// Output a section header
    fn header(&self, title: &str) {
        println!("\n{}", title.bold().underline());
        println!("{}", "=".repeat(title.chars().count()));
    }

    pub fn output_analysis(&self, formula: &str, analysis: &FormulaAnalysis) -> Result<()> {
        if self.format == OutputFormat::Json {
            return self.output_json(analysis);
        }

        self.header(&format!("Analysis of {}", formula));
        println!("  Type:             {:?}", analysis.formula_type);
        println!(
            "  Complexity:       {:?} ({:.1})",
            analysis.complexity_level, analysis.complexity_score
        );
        println!("  Nesting level:    {}", analysis.nesting_level);
        println!("  Quantifier depth: {}", analysis.quantifier_depth);
        println!("  Operators:        {}", analysis.operator_count);
        let recommended: Vec<String> = analysis
            .recommended_provers
            .iter()
            .map(|p| p.to_string())
            .collect();
        println!("  {} {}", "Recommended:".cyan(), recommended.join(", "));
        Ok(())
    }

    pub fn output_router_result(&self, result: &RouterProofResult) -> Result<()> {
        if self.format == OutputFormat::Json {
            return self.output_json(result);
        }

        self.header(&format!("Routing ({})", result.strategy_used));
        println!("  {}", verdict(result.is_proved));
        if let Some(prover) = &result.prover_used {
            println!("  Prover: {}", prover.bright_blue());
        }
        println!("  Reason: {}", result.reason);
        println!("  Time:   {:?}", result.proof_time);
        if !result.all_results.is_empty() {
            println!("\n{}", "Attempts".cyan().bold());
            for (name, attempt) in &result.all_results {
                match attempt {
                    AttemptResult::Completed(r) => println!(
                        "  {:<12} {} (confidence {:.2}, {:?})",
                        name,
                        if r.is_proved() { "proved".green() } else { "not proved".yellow() },
                        r.confidence(),
                        r.proof_time
                    ),
                    AttemptResult::Failed(message) => {
                        println!("  {:<12} {} {}", name, "failed".red(), message.dimmed())
                    }
                }
            }
        }
        Ok(())
    }

    pub fn output_hybrid_result(&self, result: &HybridProverResult) -> Result<()> {
        if self.format == OutputFormat::Json {
            return self.output_json(result);
        }

        self.header(&format!("Hybrid proof ({})", result.strategy_used));
        println!("  {} (confidence {:.2})", verdict(result.is_valid), result.confidence);
        if result.resolved_strategy != result.strategy_used {
            println!("  Resolved strategy: {}", result.resolved_strategy);
        }
        println!(
            "  Agreement: {}",
            if result.agreement { "yes".green() } else { "no".yellow() }
        );
        println!("  Time: {:?}", result.execution_time);
        println!("\n  {}", result.explanation);
        Ok(())
    }

    pub fn output_aggregate(&self, result: &AggregatedProverResult) -> Result<()> {
        if self.format == OutputFormat::Json {
            return self.output_json(result);
        }

        self.header(&format!("Verification of {}", result.statement));
        println!("  {} (confidence {:.2})", verdict(result.overall_valid), result.confidence);
        println!("  Agreement rate: {:.2}", result.agreement_rate);
        println!("  Critic score:   {:.2}", LogicCritic::score(result));
        println!("\n{}", "Provers".cyan().bold());
        for r in &result.results {
            let status = match r.status {
                VerificationStatus::Valid => "valid".green(),
                VerificationStatus::Invalid => "invalid".yellow(),
                VerificationStatus::Timeout => "timeout".red(),
                VerificationStatus::Error => "error".red(),
                VerificationStatus::Unavailable => "unavailable".dimmed(),
            };
            match &r.message {
                Some(message) => println!("  {:<12} {} {}", r.prover, status, message.dimmed()),
                None => println!("  {:<12} {} ({:.2})", r.prover, status, r.confidence),
            }
        }
        Ok(())
    }

    pub fn output_provers(&self, provers: &[ProverListing]) -> Result<()> {
        if self.format == OutputFormat::Json {
            return self.output_json(&provers);
        }

        self.header("Provers");
        for p in provers {
            let state = if p.available {
                "available".green()
            } else {
                "not found".dimmed()
            };
            println!("  {:<12} {}", p.name.bright_blue(), state);
        }
        Ok(())
    }

    /// Output JSON
    fn output_json<T: Serialize + ?Sized>(&self, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        println!("{}", json);
        Ok(())
    }
}

/// One row of the `provers` listing
#[derive(Debug, Serialize)]
pub struct ProverListing {
    pub name: String,
    pub available: bool,
}

#[derive(Serialize)]
struct JsonMessage<'a> {
    level: &'a str,
    message: &'a str,
}
