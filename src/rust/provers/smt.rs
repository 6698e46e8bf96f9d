// SPDX-FileCopyrightText: 2025 ECHIDNA Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! SMT solver adapters (Z3, CVC5)
//!
//! Validity is checked by refutation: every axiom is asserted together with
//! the negated goal, so `unsat` means the goal follows and `sat` yields a
//! countermodel. Predicates are uninterpreted Bool functions over a single
//! sort `U`; individuals and function symbols live in `U`.

use anyhow::{anyhow, bail, Context as AnyhowContext, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tracing::debug;

use super::{ProofResult, ProverAdapter, ProverConfig, ProverKind};
use crate::core::{Connective, Formula, Quantifier, Term};

/// Confidence reported for a solver verdict
const SOLVER_CONFIDENCE: f64 = 0.95;

/// Which SMT-LIB 2 solver binary to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtDialect {
    Z3,
    Cvc5,
}

impl SmtDialect {
    pub fn kind(&self) -> ProverKind {
        match self {
            SmtDialect::Z3 => ProverKind::Z3,
            SmtDialect::Cvc5 => ProverKind::Cvc5,
        }
    }

    /// Executable name looked up on `PATH`
    pub fn binary(&self) -> &'static str {
        match self {
            SmtDialect::Z3 => "z3",
            SmtDialect::Cvc5 => "cvc5",
        }
    }

    /// Arguments that make the solver read SMT-LIB 2 from stdin
    fn stdin_args(&self) -> &'static [&'static str] {
        match self {
            SmtDialect::Z3 => &["-in", "-smt2"],
            SmtDialect::Cvc5 => &["--lang", "smt2", "--incremental"],
        }
    }
}

/// Solver answer to `(check-sat)`
#[derive(Debug, Clone, PartialEq)]
enum SmtResponse {
    Sat { model: Option<String> },
    Unsat,
    Unknown,
    Error(String),
}

/// SMT solver adapter
pub struct SmtProver {
    dialect: SmtDialect,
    config: ProverConfig,
}

impl SmtProver {
    pub fn new(dialect: SmtDialect, config: ProverConfig) -> Self {
        SmtProver { dialect, config }
    }

    /// Locate the solver on `PATH`; `None` if it is not installed
    pub fn detect(dialect: SmtDialect) -> Option<Self> {
        let executable = which::which(dialect.binary()).ok()?;
        debug!("Found {} at {}", dialect.binary(), executable.display());
        Some(SmtProver::new(
            dialect,
            ProverConfig {
                executable,
                ..ProverConfig::default()
            },
        ))
    }

    pub fn dialect(&self) -> SmtDialect {
        self.dialect
    }

    /// Build the refutation script for `formula` under `axioms`
    pub fn script(formula: &Formula, axioms: &[Formula]) -> std::result::Result<String, String> {
        let mut translator = SmtTranslator::default();
        let axioms = axioms
            .iter()
            .map(|a| translator.formula(a))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let goal = translator.formula(formula)?;

        let mut script = String::new();
        script.push_str("(set-option :produce-models true)\n");
        script.push_str("(declare-sort U 0)\n");
        for (name, signature) in &translator.symbols {
            match signature {
                Signature::Constant => {
                    script.push_str(&format!("(declare-const {} U)\n", quote(name)));
                }
                Signature::Function(arity) => {
                    script.push_str(&format!(
                        "(declare-fun {} ({}) U)\n",
                        quote(name),
                        vec!["U"; *arity].join(" ")
                    ));
                }
                Signature::Predicate(arity) => {
                    script.push_str(&format!(
                        "(declare-fun {} ({}) Bool)\n",
                        quote(name),
                        vec!["U"; *arity].join(" ")
                    ));
                }
            }
        }
        for axiom in axioms {
            script.push_str(&format!("(assert {})\n", axiom));
        }
        script.push_str(&format!("(assert (not {}))\n", goal));
        script.push_str("(check-sat)\n");
        Ok(script)
    }

    async fn spawn(&self) -> Result<Child> {
        let mut cmd = Command::new(&self.config.executable);
        cmd.args(self.dialect.stdin_args())
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        cmd.spawn().with_context(|| {
            format!(
                "Failed to spawn {} process: {:?}",
                self.dialect.binary(),
                self.config.executable
            )
        })
    }

    /// Run `script`; `Ok(None)` when the limit expires first
    async fn run(&self, script: &str, limit: Duration) -> Result<Option<SmtResponse>> {
        let mut child = self.spawn().await?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("Failed to open {} stdin", self.dialect.binary()))?;
        stdin.write_all(script.as_bytes()).await?;
        stdin.write_all(b"(get-model)\n(exit)\n").await?;
        stdin.flush().await?;
        drop(stdin);

        let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => return Ok(None),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let response = parse_response(&stdout);
        if let SmtResponse::Error(_) = response {
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                bail!(
                    "{} failed: {}",
                    self.dialect.binary(),
                    format!("{}\n{}", stderr.trim(), stdout.trim()).trim()
                );
            }
        }
        Ok(Some(response))
    }
}

#[async_trait]
impl ProverAdapter for SmtProver {
    fn kind(&self) -> ProverKind {
        self.dialect.kind()
    }

    fn config_items(&self) -> BTreeMap<String, String> {
        let mut items = BTreeMap::new();
        items.insert(
            "executable".to_string(),
            self.config.executable.display().to_string(),
        );
        items.insert("args".to_string(), self.config.args.join(" "));
        items
    }

    async fn prove(
        &self,
        formula: &Formula,
        axioms: &[Formula],
        timeout: Option<Duration>,
    ) -> Result<ProofResult> {
        let start = Instant::now();
        let kind = self.kind();

        let script = match Self::script(formula, axioms) {
            Ok(script) => script,
            Err(message) => return Ok(ProofResult::errored(kind, message, start.elapsed())),
        };

        let limit = timeout.unwrap_or(Duration::from_secs(self.config.timeout));
        debug!("{} checking {} ({} axioms)", kind, formula, axioms.len());

        let result = match self.run(&script, limit).await? {
            None => ProofResult::timed_out(kind, start.elapsed()),
            Some(SmtResponse::Unsat) => {
                ProofResult::proved(kind, SOLVER_CONFIDENCE, start.elapsed())
                    .with_reason("negated goal is unsatisfiable")
            }
            Some(SmtResponse::Sat { model }) => {
                let result = ProofResult::disproved(kind, SOLVER_CONFIDENCE, start.elapsed())
                    .with_reason("countermodel found");
                match model {
                    Some(model) => result.with_artifact(model),
                    None => result,
                }
            }
            Some(SmtResponse::Unknown) => {
                ProofResult::errored(kind, "solver returned unknown", start.elapsed())
            }
            Some(SmtResponse::Error(message)) => ProofResult::errored(
                kind,
                format!("solver error: {}", message),
                start.elapsed(),
            ),
        };
        Ok(result.with_backend(self.dialect.binary()))
    }
}

/// Read the verdict from the first non-empty line; anything after `sat`
/// is the model printed by `(get-model)`.
fn parse_response(output: &str) -> SmtResponse {
    let mut lines = output.lines().map(str::trim).filter(|l| !l.is_empty());
    match lines.next() {
        Some("unsat") => SmtResponse::Unsat,
        Some("sat") => {
            let model: Vec<&str> = lines.collect();
            let model = model.join("\n");
            SmtResponse::Sat {
                model: if model.is_empty() || model.starts_with("(error") {
                    None
                } else {
                    Some(model)
                },
            }
        }
        Some("unknown") => SmtResponse::Unknown,
        Some(line) if line.starts_with("(error") => {
            let message = line
                .trim_start_matches("(error")
                .trim_end_matches(')')
                .trim()
                .trim_matches('"');
            SmtResponse::Error(message.to_string())
        }
        Some(other) => SmtResponse::Error(format!("unexpected solver output: {}", other)),
        None => SmtResponse::Error("no solver output".to_string()),
    }
}

/// Quoted SMT-LIB symbol, so user names never clash with reserved words
fn quote(name: &str) -> String {
    format!("|{}|", name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signature {
    Constant,
    Function(usize),
    Predicate(usize),
}

#[derive(Default)]
struct SmtTranslator {
    symbols: BTreeMap<String, Signature>,
    bound: Vec<String>,
}

type Translated = std::result::Result<String, String>;

impl SmtTranslator {
    fn declare(&mut self, name: &str, signature: Signature) -> std::result::Result<(), String> {
        match self.symbols.get(name) {
            Some(existing) if *existing != signature => Err(format!(
                "symbol {} used inconsistently ({:?} and {:?})",
                name, existing, signature
            )),
            Some(_) => Ok(()),
            None => {
                self.symbols.insert(name.to_string(), signature);
                Ok(())
            }
        }
    }

    fn formula(&mut self, formula: &Formula) -> Translated {
        match formula {
            Formula::True => Ok("true".to_string()),
            Formula::False => Ok("false".to_string()),
            Formula::Predicate { name, args } => {
                self.declare(name, Signature::Predicate(args.len()))?;
                self.application(name, args)
            }
            Formula::Not(inner) => Ok(format!("(not {})", self.formula(inner)?)),
            Formula::Binary { op, left, right } => {
                let keyword = match op {
                    Connective::And => "and",
                    Connective::Or => "or",
                    Connective::Implies => "=>",
                    Connective::Iff => "=",
                };
                let left = self.formula(left)?;
                let right = self.formula(right)?;
                Ok(format!("({} {} {})", keyword, left, right))
            }
            Formula::Quantified {
                quantifier,
                variable,
                body,
            } => {
                let keyword = match quantifier {
                    Quantifier::Forall => "forall",
                    Quantifier::Exists => "exists",
                };
                self.bound.push(variable.clone());
                let body = self.formula(body);
                self.bound.pop();
                Ok(format!("({} (({} U)) {})", keyword, quote(variable), body?))
            }
            Formula::Operator { name, .. } => Err(format!("unsupported construct {}(...)", name)),
        }
    }

    fn term(&mut self, term: &Term) -> Translated {
        match term {
            Term::Var(name) => Ok(quote(name)),
            Term::Const(name) => {
                if !self.bound.contains(name) {
                    self.declare(name, Signature::Constant)?;
                }
                Ok(quote(name))
            }
            Term::App { func, args } => {
                self.declare(func, Signature::Function(args.len()))?;
                self.application(func, args)
            }
        }
    }

    fn application(&mut self, head: &str, args: &[Term]) -> Translated {
        if args.is_empty() {
            return Ok(quote(head));
        }
        let args = args
            .iter()
            .map(|a| self.term(a))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(format!("({} {})", quote(head), args.join(" ")))
    }
}
