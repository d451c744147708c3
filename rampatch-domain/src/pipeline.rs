//! Ordered composition of patch steps over one archive.

use crate::steps::PatchStep;
use rampatch_archive::Archive;
use rampatch_edit::PatchError;
use thiserror::Error;
use tracing::{debug, info, warn};

/// First step failure of a pipeline run. The step's error is carried unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pipeline {pipeline} failed at step {step}: {error}")]
pub struct PipelineFailure {
    pub pipeline: String,
    pub step: String,
    #[source]
    pub error: PatchError,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    NotRun,
    Running,
    Succeeded,
    Failed(PipelineFailure),
}

/// A fixed, ordered list of steps bound to one archive for one run.
///
/// Steps run in declaration order against the same archive. The first error stops the run;
/// entries rewritten by earlier steps keep their changes. A pipeline runs once: calling
/// [`Pipeline::patch`] again returns the recorded outcome without touching the archive.
pub struct Pipeline<'a> {
    id: String,
    archive: &'a mut dyn Archive,
    steps: Vec<Box<dyn PatchStep>>,
    state: PipelineState,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        id: impl Into<String>,
        archive: &'a mut dyn Archive,
        steps: Vec<Box<dyn PatchStep>>,
    ) -> Self {
        Self {
            id: id.into(),
            archive,
            steps,
            state: PipelineState::NotRun,
        }
    }

    /// Identifier of the form `<device>/<category>/<variant>`, exposed verbatim.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id()).collect()
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// The recorded failure, if the run failed.
    pub fn error(&self) -> Option<&PipelineFailure> {
        match &self.state {
            PipelineState::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn patch(&mut self) -> Result<(), PipelineFailure> {
        match &self.state {
            PipelineState::NotRun => {}
            PipelineState::Failed(failure) => return Err(failure.clone()),
            PipelineState::Running | PipelineState::Succeeded => {
                debug!(pipeline = self.id.as_str(), "pipeline already ran");
                return Ok(());
            }
        }

        self.state = PipelineState::Running;

        for step in &self.steps {
            debug!(pipeline = self.id.as_str(), step = step.id(), "running step");
            if let Err(error) = step.apply(&mut *self.archive) {
                warn!(
                    pipeline = self.id.as_str(),
                    step = step.id(),
                    kind = error.kind().as_str(),
                    path = error.path(),
                    "step failed"
                );
                let failure = PipelineFailure {
                    pipeline: self.id.clone(),
                    step: step.id().to_string(),
                    error,
                };
                self.state = PipelineState::Failed(failure.clone());
                return Err(failure);
            }
        }

        info!(pipeline = self.id.as_str(), steps = self.steps.len(), "pipeline succeeded");
        self.state = PipelineState::Succeeded;
        Ok(())
    }
}

impl std::fmt::Debug for Pipeline<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("id", &self.id)
            .field("steps", &self.step_ids())
            .field("state", &self.state)
            .finish()
    }
}
