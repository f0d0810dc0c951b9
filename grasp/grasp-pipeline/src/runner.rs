//! Drives every candidate of a batch through sampling, refinement,
//! validation and persistence.

use std::path::Path;

use grasp_refine::{ContactPredictor, HandModel, PoseOptimizer};
use grasp_sample::{sample_object, ObjectAsset};
use grasp_types::{BatchReport, PersistedGrasp, ValidityRecord};
use grasp_validate::{GraspValidator, Simulator};
use mesh_types::Point3;
use tracing::{info, warn};

use crate::batch::{load_source_vertices, GenerationBatch};
use crate::config::{OrderParams, RunConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::output::OutputWriter;

/// Result of one candidate that ran to a decision.
#[derive(Debug, Clone)]
pub struct CandidateOutcome {
    /// Validation record.
    pub record: ValidityRecord,
    /// Joints at the refined pose.
    pub final_joints: Vec<Point3<f64>>,
    /// Refined pose and meshes, written only when accepted.
    pub grasp: PersistedGrasp,
}

/// Order candidates ascending by one coordinate of one final joint.
///
/// Ties keep their input order.
///
/// # Errors
///
/// Returns [`PipelineError::Config`] if a candidate lacks the joint or the
/// axis is not 0, 1 or 2.
pub fn order_by_joint(finals: &[(usize, Vec<Point3<f64>>)], order: OrderParams) -> PipelineResult<Vec<usize>> {
    if order.axis > 2 {
        return Err(PipelineError::Config(format!("order axis {} is not 0, 1 or 2", order.axis)));
    }
    let mut keyed = finals
        .iter()
        .map(|(index, joints)| {
            joints
                .get(order.joint)
                .map(|j| (*index, j[order.axis]))
                .ok_or_else(|| {
                    PipelineError::Config(format!(
                        "order joint {} missing from candidate {index} ({} joints)",
                        order.joint,
                        joints.len()
                    ))
                })
        })
        .collect::<PipelineResult<Vec<_>>>()?;
    keyed.sort_by(|a, b| a.1.total_cmp(&b.1));
    Ok(keyed.into_iter().map(|(index, _)| index).collect())
}

/// Runs batches for one object with one hand model.
///
/// The object asset is prepared once and shared read-only by every
/// candidate; candidates are processed one after another.
pub struct BatchRunner<'a> {
    config: &'a RunConfig,
    model: &'a dyn HandModel,
    simulator: &'a dyn Simulator,
    predictor: Option<&'a dyn ContactPredictor>,
    asset: ObjectAsset,
}

impl<'a> BatchRunner<'a> {
    /// Validate the configuration and load the object asset it names.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid configuration or an unreadable or
    /// unusable object asset.
    pub fn new(config: &'a RunConfig, model: &'a dyn HandModel, simulator: &'a dyn Simulator) -> PipelineResult<Self> {
        config.validate()?;
        let asset = ObjectAsset::load(&config.object_path, config.handle_path.as_deref(), &config.sampler)?;
        Self::with_asset(config, model, simulator, asset)
    }

    /// Use an already prepared asset instead of loading `object_path`.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid configuration or an ordering joint
    /// the model does not have.
    pub fn with_asset(
        config: &'a RunConfig,
        model: &'a dyn HandModel,
        simulator: &'a dyn Simulator,
        asset: ObjectAsset,
    ) -> PipelineResult<Self> {
        config.validate()?;
        if config.order.joint >= model.joint_count() {
            return Err(PipelineError::Config(format!(
                "order joint {} but the hand model has {} joints",
                config.order.joint,
                model.joint_count()
            )));
        }
        Ok(Self {
            config,
            model,
            simulator,
            predictor: None,
            asset,
        })
    }

    /// Attach a contact predictor.
    #[must_use]
    pub fn with_predictor(mut self, predictor: &'a dyn ContactPredictor) -> Self {
        self.predictor = Some(predictor);
        self
    }

    /// Process every candidate, write accepted grasps and the batch summary.
    ///
    /// Candidate-level failures are logged and counted; they do not stop the
    /// run.
    ///
    /// # Errors
    ///
    /// Returns an error for an inconsistent batch or when an output file
    /// cannot be written.
    pub fn run(&self, batch: &GenerationBatch, batch_dir: &Path, output: &OutputWriter) -> PipelineResult<BatchReport> {
        batch.validate(self.model.pose_dim(), self.model.joint_count())?;

        let mut optimizer = PoseOptimizer::new(self.model, self.config.optimizer.clone())?;
        if let Some(predictor) = self.predictor {
            optimizer = optimizer.with_predictor(predictor);
        }
        let validator = GraspValidator::new(self.config.validator, self.simulator)?;

        info!(
            candidates = batch.len(),
            category = %self.config.category,
            output = %output.dir().display(),
            "starting batch"
        );

        let mut report = BatchReport {
            processed: batch.len(),
            ..BatchReport::default()
        };
        let mut finals = Vec::with_capacity(batch.len());

        for index in 0..batch.len() {
            info!(index, of = batch.len(), "processing candidate");
            match self.process(batch, batch_dir, index, &optimizer, &validator) {
                Ok(outcome) => {
                    let record = outcome.record;
                    info!(
                        index,
                        penetration_volume = record.penetration_volume,
                        contact = record.contact,
                        displacement = record.displacement,
                        fallback = record.displacement_fallback,
                        accept = record.accept,
                        "candidate validated"
                    );
                    if record.accept {
                        output.write_grasp(&outcome.grasp)?;
                        report.accepted += 1;
                        report.accepted_indices.push(index);
                    } else {
                        report.rejected += 1;
                    }
                    finals.push((index, outcome.final_joints));
                }
                Err(error) => {
                    warn!(index, %error, "candidate failed");
                    report.failed += 1;
                }
            }
        }

        report.order = order_by_joint(&finals, self.config.order)?;
        output.write_summary(&report.accepted_indices, &report.order)?;
        info!(%report, "batch finished");
        Ok(report)
    }

    fn process(
        &self,
        batch: &GenerationBatch,
        batch_dir: &Path,
        index: usize,
        optimizer: &PoseOptimizer<'_>,
        validator: &GraspValidator<'_>,
    ) -> PipelineResult<CandidateOutcome> {
        let tolerance = self.config.sampler.rotation_tolerance;
        let source = load_source_vertices(batch_dir, index)?;
        let candidate = batch.candidate(index, &source, tolerance)?;
        let sample = sample_object(&self.asset, &candidate.rotation, &self.config.sampler)?;

        let refined = optimizer.refine(&candidate, &sample, &self.config.weights())?;
        let hand_mesh = self.model.mesh(&refined.output);
        let record = validator.validate(&hand_mesh, &sample.mesh, self.config.penetration_threshold())?;

        Ok(CandidateOutcome {
            record,
            final_joints: refined.output.joints,
            grasp: PersistedGrasp {
                index,
                pose: refined.pose,
                hand_mesh,
                object_mesh: sample.mesh,
            },
        })
    }
}
