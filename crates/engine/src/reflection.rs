// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The QA gate: a critic judgement over a stage's output.
//!
//! The critic is just another dispatch: same port as the worker agents,
//! different prompt. Its reply is parsed into a [`QaCritique`]; replies
//! that cannot be parsed become a synthetic REWORK so the worker gets a
//! chance to restate its output instead of the stage hard-failing.
//!
//! Dispatch walks a two-rung ladder: the preferred critic model first,
//! the fallback on a transport error or an unparseable reply. Only when
//! both rungs fail at the transport level does the gate raise.

use reel_adapters::{AgentDispatch, DispatchError, DispatchRequest};
use reel_core::stage::PipelineStage;
use reel_core::QaCritique;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// QA gate tuning.
#[derive(Debug, Clone)]
pub struct QaConfig {
    /// Artifacts at or under this many bytes are inlined into the
    /// critique prompt; larger ones are summarised.
    pub inline_threshold_bytes: u64,
    /// Agent attempts per stage invocation (initial attempt + reworks).
    pub max_attempts: u32,
    pub preferred_model: Option<String>,
    pub fallback_model: Option<String>,
    /// The worker agent timeout the QA timeout is derived from.
    pub agent_timeout: Duration,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            inline_threshold_bytes: 15_000,
            max_attempts: 3,
            preferred_model: None,
            fallback_model: None,
            agent_timeout: Duration::from_secs(600),
        }
    }
}

impl QaConfig {
    /// Critic dispatch timeout: half the agent timeout, floored at 300 s.
    pub fn qa_timeout(&self) -> Duration {
        self.agent_timeout.div_f64(2.0).max(Duration::from_secs(300))
    }
}

/// Result of one QA review.
#[derive(Debug, Clone, PartialEq)]
pub enum QaOutcome {
    Pass(QaCritique),
    Rework(QaCritique),
    Fail(QaCritique),
}

/// Invokes the critic and classifies its judgement.
#[derive(Clone)]
pub struct ReflectionLoop<D: AgentDispatch> {
    dispatch: D,
    config: QaConfig,
}

impl<D: AgentDispatch> ReflectionLoop<D> {
    pub fn new(dispatch: D, config: QaConfig) -> Self {
        Self { dispatch, config }
    }

    pub fn config(&self) -> &QaConfig {
        &self.config
    }

    /// Review a stage's output against its gate criteria.
    pub async fn review(
        &self,
        stage: PipelineStage,
        gate_name: &str,
        criteria: &str,
        artifacts: &[PathBuf],
    ) -> Result<QaOutcome, DispatchError> {
        let prompt = self.build_prompt(stage, gate_name, criteria, artifacts);

        let mut first_transport_error = None;
        match self.ask(&prompt, self.config.preferred_model.clone()).await {
            Ok(Some(critique)) => return Ok(classify(critique)),
            Ok(None) => {
                debug!(%stage, "preferred critic reply was not valid JSON, trying fallback");
            }
            Err(err) => {
                warn!(%stage, error = %err, "preferred critic dispatch failed, trying fallback");
                first_transport_error = Some(err);
            }
        }

        match self.ask(&prompt, self.config.fallback_model.clone()).await {
            Ok(Some(critique)) => Ok(classify(critique)),
            Ok(None) => Ok(classify(QaCritique::malformed_reply())),
            Err(err) => {
                if first_transport_error.is_some() {
                    // Both rungs failed to even answer.
                    Err(err)
                } else {
                    // The preferred rung answered (malformed); treat the
                    // judgement as a rework rather than killing the stage.
                    warn!(%stage, error = %err, "fallback critic dispatch failed after malformed reply");
                    Ok(classify(QaCritique::malformed_reply()))
                }
            }
        }
    }

    async fn ask(
        &self,
        prompt: &str,
        model: Option<String>,
    ) -> Result<Option<QaCritique>, DispatchError> {
        let mut request = DispatchRequest::new(prompt, self.config.qa_timeout());
        if let Some(model) = model {
            request = request.with_model(model);
        }
        let reply = self.dispatch.dispatch(request).await?;
        Ok(QaCritique::parse(&reply))
    }

    /// Assemble the critique prompt: gate criteria, then one section per
    /// artifact, then the reply schema.
    pub fn build_prompt(
        &self,
        stage: PipelineStage,
        gate_name: &str,
        criteria: &str,
        artifacts: &[PathBuf],
    ) -> String {
        let mut prompt = format!(
            "You are the {gate_name} QA gate for the {stage} stage.\n\n## Criteria\n{criteria}\n",
        );
        for path in artifacts {
            prompt.push('\n');
            prompt.push_str(&self.artifact_section(path));
        }
        prompt.push_str(
            "\nAnswer with a single JSON object: {\"decision\": \"PASS\"|\"REWORK\"|\"FAIL\", \
             \"score\": 0-100, \"blockers\": [...], \"prescriptive_fixes\": [...]}\n",
        );
        prompt
    }

    fn artifact_section(&self, path: &Path) -> String {
        let name = path.display();
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => return format!("## Artifact {name}\n(unreadable: {err})\n"),
        };
        if bytes.len() as u64 <= self.inline_threshold() {
            let text = String::from_utf8_lossy(&bytes);
            return format!("## Artifact {name}\n{text}\n");
        }
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hasher.finalize();
        let lines = bytes.iter().filter(|b| **b == b'\n').count();
        format!(
            "## Artifact {name} (summarised)\npath: {name}\nsha256: {digest:x}\nbytes: {}\nlines: {lines}\n",
            bytes.len(),
        )
    }

    fn inline_threshold(&self) -> u64 {
        self.config.inline_threshold_bytes
    }
}

fn classify(critique: QaCritique) -> QaOutcome {
    match critique.decision {
        reel_core::QaDecision::Pass => QaOutcome::Pass(critique),
        reel_core::QaDecision::Rework => QaOutcome::Rework(critique),
        reel_core::QaDecision::Fail => QaOutcome::Fail(critique),
    }
}

#[cfg(test)]
#[path = "reflection_tests.rs"]
mod tests;
