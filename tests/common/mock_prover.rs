// SPDX-FileCopyrightText: 2025 ECHIDNA Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Scripted prover adapter for testing

use async_trait::async_trait;
use hybrid_prover::{Formula, ProofResult, ProverAdapter, ProverKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// What a [`MockProver`] does when asked to prove
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Return this result (its `prover` field is overwritten with the mock's kind)
    Result(ProofResult),
    /// Return `Err` with this message
    Fail(String),
    /// Panic inside `prove`
    Panic,
}

/// A prover adapter that answers from a script and counts its calls
pub struct MockProver {
    name: String,
    kind: ProverKind,
    behavior: Behavior,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockProver {
    /// A mock of `kind` that proves everything with confidence 0.95
    pub fn new(kind: ProverKind) -> Self {
        MockProver {
            name: kind.to_string(),
            kind,
            behavior: Behavior::Result(ProofResult::proved(kind, 0.95, Duration::ZERO)),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn proving(self, confidence: f64) -> Self {
        let result = ProofResult::proved(self.kind, confidence, Duration::ZERO);
        self.with_behavior(Behavior::Result(result))
    }

    pub fn disproving(self, confidence: f64) -> Self {
        let result = ProofResult::disproved(self.kind, confidence, Duration::ZERO);
        self.with_behavior(Behavior::Result(result))
    }

    pub fn timing_out(self) -> Self {
        let result = ProofResult::timed_out(self.kind, Duration::ZERO);
        self.with_behavior(Behavior::Result(result))
    }

    /// Return an `Errored` result (a recorded, non-exceptional failure)
    pub fn erroring(self, message: &str) -> Self {
        let result = ProofResult::errored(self.kind, message, Duration::ZERO);
        self.with_behavior(Behavior::Result(result))
    }

    /// Return `Err` from `prove`
    pub fn failing(self, message: &str) -> Self {
        self.with_behavior(Behavior::Fail(message.to_string()))
    }

    pub fn panicking(self) -> Self {
        self.with_behavior(Behavior::Panic)
    }

    pub fn with_backend(self, backend: &str) -> Self {
        match self.behavior.clone() {
            Behavior::Result(result) => {
                self.with_behavior(Behavior::Result(result.with_backend(backend)))
            }
            _ => self,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Number of `prove` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProverAdapter for MockProver {
    fn kind(&self) -> ProverKind {
        self.kind
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    async fn prove(
        &self,
        _formula: &Formula,
        _axioms: &[Formula],
        _timeout: Option<Duration>,
    ) -> anyhow::Result<ProofResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.behavior {
            Behavior::Result(result) => {
                let mut result = result.clone();
                result.prover = self.kind;
                result.proof_time = self.delay;
                Ok(result)
            }
            Behavior::Fail(message) => Err(anyhow::anyhow!("{}", message)),
            Behavior::Panic => panic!("mock prover {} panicked", self.name),
        }
    }
}
