// SPDX-FileCopyrightText: 2025 ECHIDNA Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Neural (LLM-guided) prover
//!
//! Talks JSON over HTTP to an inference service that judges validity:
//!
//! ```text
//! POST {api_url}/prove  {"formula": ..., "axioms": [...], "timeout_ms": ...}
//! 200                   {"is_valid": bool, "confidence": f64, "reasoning": "..."}
//! ```
//!
//! The verdict is statistical, so its confidence is the service's calibrated
//! probability rather than a fixed solver constant.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{ProofResult, ProverAdapter, ProverKind};
use crate::core::Formula;

/// Configuration for the inference service connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuralConfig {
    /// Service base URL
    pub api_url: String,
    /// Model identifier, reported as the LLM used
    pub model: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for NeuralConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8081".to_string(),
            model: "symbolicai".to_string(),
            timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Serialize)]
struct ProveRequest {
    formula: String,
    axioms: Vec<String>,
    model: String,
    timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
struct ProveResponse {
    is_valid: bool,
    confidence: f64,
    #[serde(default)]
    reasoning: String,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    #[serde(default)]
    model_loaded: bool,
}

/// HTTP client for the neural prover service
pub struct NeuralProver {
    config: NeuralConfig,
    client: Client,
}

impl NeuralProver {
    /// Create a prover with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(NeuralConfig::default())
    }

    /// Create a prover with custom configuration
    pub fn with_config(config: NeuralConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &NeuralConfig {
        &self.config
    }

    /// Model name reported as the LLM used
    pub fn llm_used(&self) -> &str {
        &self.config.model
    }

    /// Check whether the service answers its health endpoint
    pub async fn check_health(&self) -> bool {
        let url = format!("{}/health", self.config.api_url.trim_end_matches('/'));

        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<HealthResponse>().await {
                    Ok(health) => {
                        info!(
                            "Neural prover service: status={}, model_loaded={}",
                            health.status, health.model_loaded
                        );
                        health.model_loaded
                    }
                    Err(e) => {
                        warn!("Neural prover health response malformed: {}", e);
                        false
                    }
                }
            }
            Ok(response) => {
                warn!("Neural prover service returned error: {}", response.status());
                false
            }
            Err(e) => {
                debug!("Neural prover service not available: {}", e);
                false
            }
        }
    }
}

/// Turn a service response into a result. A "valid" answer with no
/// confidence comes back as `Errored("inconsistent response")`.
fn interpret(response: ProveResponse, model: &str, elapsed: Duration) -> ProofResult {
    let result = if response.is_valid {
        ProofResult::proved(ProverKind::SymbolicAi, response.confidence, elapsed)
    } else {
        ProofResult::disproved(ProverKind::SymbolicAi, response.confidence, elapsed)
    };
    let result = if response.reasoning.is_empty() || !result.is_conclusive() {
        result
    } else {
        result.with_reason(response.reasoning)
    };
    result.with_backend(model)
}

#[async_trait]
impl ProverAdapter for NeuralProver {
    fn kind(&self) -> ProverKind {
        ProverKind::SymbolicAi
    }

    fn config_items(&self) -> BTreeMap<String, String> {
        let mut items = BTreeMap::new();
        items.insert("api_url".to_string(), self.config.api_url.clone());
        items.insert("model".to_string(), self.config.model.clone());
        items
    }

    async fn prove(
        &self,
        formula: &Formula,
        axioms: &[Formula],
        timeout: Option<Duration>,
    ) -> Result<ProofResult> {
        let start = Instant::now();
        let limit = timeout
            .unwrap_or(Duration::from_millis(self.config.timeout_ms))
            .min(Duration::from_millis(self.config.timeout_ms));

        let request = ProveRequest {
            formula: formula.canonical(),
            axioms: axioms.iter().map(Formula::canonical).collect(),
            model: self.config.model.clone(),
            timeout_ms: limit.as_millis() as u64,
        };

        let url = format!("{}/prove", self.config.api_url.trim_end_matches('/'));
        debug!("Neural prover request to {} for {}", url, request.formula);

        let response = match self
            .client
            .post(&url)
            .timeout(limit)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Ok(ProofResult::timed_out(ProverKind::SymbolicAi, start.elapsed())
                    .with_backend(&self.config.model));
            }
            Err(e) => return Err(e).context("Failed to send prove request"),
        };

        if !response.status().is_success() {
            bail!("Prove request failed: {}", response.status());
        }

        let body: ProveResponse = match response.json().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => {
                return Ok(ProofResult::timed_out(ProverKind::SymbolicAi, start.elapsed())
                    .with_backend(&self.config.model));
            }
            Err(e) => return Err(e).context("Malformed prove response"),
        };

        Ok(interpret(body, &self.config.model, start.elapsed()))
    }
}
