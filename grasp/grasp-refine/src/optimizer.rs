//! Heavy-ball SGD over the hand articulation.

use grasp_types::{GraspCandidate, HandPose, LossTerms, LossWeights, ObjectSample};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::contact::{reference_contact_map, ContactPredictor};
use crate::error::{RefineError, RefineResult};
use crate::hand::{HandModel, HandOutput};
use crate::loss::{LossEvaluator, DEFAULT_FINGERTIP_IDS};

/// Optimizer configuration.
///
/// # Example
///
/// ```
/// use grasp_refine::OptimizerParams;
///
/// let params = OptimizerParams::default().with_iterations(200).with_learning_rate(1e-4);
/// assert!(params.validate().is_ok());
/// assert_eq!(params.momentum, 0.8);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerParams {
    /// Step size.
    pub learning_rate: f64,
    /// Momentum coefficient `μ`.
    pub momentum: f64,
    /// Fixed number of iterations. There is no early stop.
    pub iterations: usize,
    /// Progress log period in iterations; 0 disables progress logs.
    pub log_every: usize,
    /// Fingertip vertex ids used by the keypoint and finger-contact terms.
    pub fingertip_ids: Vec<usize>,
}

impl Default for OptimizerParams {
    fn default() -> Self {
        Self {
            learning_rate: 1e-6,
            momentum: 0.8,
            iterations: 1501,
            log_every: 300,
            fingertip_ids: DEFAULT_FINGERTIP_IDS.to_vec(),
        }
    }
}

impl OptimizerParams {
    /// Set the learning rate.
    #[must_use]
    pub const fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the momentum coefficient.
    #[must_use]
    pub const fn with_momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }

    /// Set the iteration budget.
    #[must_use]
    pub const fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the progress log period.
    #[must_use]
    pub const fn with_log_every(mut self, log_every: usize) -> Self {
        self.log_every = log_every;
        self
    }

    /// Set the fingertip vertex ids.
    #[must_use]
    pub fn with_fingertip_ids(mut self, ids: Vec<usize>) -> Self {
        self.fingertip_ids = ids;
        self
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RefineError::InvalidParams`] for a non-positive learning
    /// rate or a momentum outside `[0, 1)`.
    pub fn validate(&self) -> RefineResult<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(RefineError::InvalidParams(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(RefineError::InvalidParams(format!(
                "momentum must be in [0, 1), got {}",
                self.momentum
            )));
        }
        Ok(())
    }
}

/// SGD with a heavy-ball momentum buffer.
///
/// `buf ← g` on the first step and `buf ← μ·buf + g` afterwards, then
/// `θ ← θ − lr·buf`.
#[derive(Debug, Clone)]
pub struct SgdMomentum {
    learning_rate: f64,
    momentum: f64,
    buffer: Option<Vec<f64>>,
}

impl SgdMomentum {
    /// Create an optimizer with an empty momentum buffer.
    #[must_use]
    pub const fn new(learning_rate: f64, momentum: f64) -> Self {
        Self {
            learning_rate,
            momentum,
            buffer: None,
        }
    }

    /// Apply one update to `params` in place.
    pub fn step(&mut self, params: &mut [f64], grad: &[f64]) {
        let buffer = match self.buffer.take() {
            Some(mut buf) => {
                for (b, g) in buf.iter_mut().zip(grad) {
                    *b = self.momentum * *b + g;
                }
                buf
            }
            None => grad.to_vec(),
        };
        for (p, b) in params.iter_mut().zip(&buffer) {
            *p -= self.learning_rate * b;
        }
        self.buffer = Some(buffer);
    }
}

/// Mutable state of one refinement: the pose being optimized, the momentum
/// buffer and the iteration counter.
///
/// Only `hand_pose` is ever updated; orientation, translation and shape stay
/// as the candidate supplied them.
#[derive(Debug, Clone)]
pub struct OptimizationState {
    pose: HandPose,
    sgd: SgdMomentum,
    iteration: usize,
}

impl OptimizationState {
    /// Start from `pose` with an empty momentum buffer.
    #[must_use]
    pub fn new(pose: HandPose, params: &OptimizerParams) -> Self {
        Self {
            pose,
            sgd: SgdMomentum::new(params.learning_rate, params.momentum),
            iteration: 0,
        }
    }

    /// Current pose.
    #[must_use]
    pub const fn pose(&self) -> &HandPose {
        &self.pose
    }

    /// Steps taken so far.
    #[must_use]
    pub const fn iteration(&self) -> usize {
        self.iteration
    }

    /// Apply one gradient step to the articulation.
    pub fn step(&mut self, grad: &[f64]) {
        self.sgd.step(&mut self.pose.hand_pose, grad);
        self.iteration += 1;
    }

    /// Final pose.
    #[must_use]
    pub fn into_pose(self) -> HandPose {
        self.pose
    }
}

/// Outcome of refining one candidate.
#[derive(Debug, Clone)]
pub struct RefinedGrasp {
    /// Refined pose. Only `hand_pose` differs from the candidate.
    pub pose: HandPose,
    /// Hand geometry at the refined pose.
    pub output: HandOutput,
    /// Loss terms at the refined pose.
    pub final_terms: LossTerms,
    /// Iterations performed.
    pub iterations: usize,
}

/// Refines candidate poses against object samples.
///
/// The reference contact map from the predictor is treated as a constant
/// target; no gradient flows through the predictor. A failing predictor is
/// logged once per candidate and replaced by a zero map.
pub struct PoseOptimizer<'m> {
    model: &'m dyn HandModel,
    params: OptimizerParams,
    predictor: Option<&'m dyn ContactPredictor>,
}

impl<'m> PoseOptimizer<'m> {
    /// Create an optimizer without a contact predictor.
    ///
    /// # Errors
    ///
    /// Returns an error if `params` fail validation.
    pub fn new(model: &'m dyn HandModel, params: OptimizerParams) -> RefineResult<Self> {
        params.validate()?;
        Ok(Self {
            model,
            params,
            predictor: None,
        })
    }

    /// Attach a contact predictor.
    #[must_use]
    pub fn with_predictor(mut self, predictor: &'m dyn ContactPredictor) -> Self {
        self.predictor = Some(predictor);
        self
    }

    /// Optimizer configuration.
    #[must_use]
    pub fn params(&self) -> &OptimizerParams {
        &self.params
    }

    /// Refine one candidate against its object sample.
    ///
    /// # Errors
    ///
    /// Returns an error on dimension mismatches between the candidate and
    /// the model, an empty sample, or a non-finite loss or gradient.
    pub fn refine(
        &self,
        candidate: &GraspCandidate,
        sample: &ObjectSample,
        weights: &LossWeights,
    ) -> RefineResult<RefinedGrasp> {
        self.check_candidate(candidate)?;
        let evaluator = LossEvaluator::new(
            sample,
            &candidate.joints,
            &candidate.hand_vertices,
            &self.params.fingertip_ids,
            *weights,
        )?;
        let mut predictor = self.predictor;
        let features = predictor.map(|_| sample.features());

        debug!(
            candidate = candidate.index,
            points = evaluator.point_count(),
            iterations = self.params.iterations,
            "refining grasp"
        );

        let mut state = OptimizationState::new(candidate.pose.clone(), &self.params);

        while state.iteration() < self.params.iterations {
            let iteration = state.iteration();
            let output = self.model.forward(state.pose())?;
            let reference = Self::reference(&mut predictor, features.as_deref(), &output, candidate.index);
            let eval = evaluator.evaluate(&output, reference.as_deref())?;
            if !(eval.total.is_finite() && eval.terms.is_finite()) {
                return Err(RefineError::NonFinite { what: "loss", iteration });
            }

            if self.params.log_every > 0 && iteration % self.params.log_every == 0 {
                info!(
                    candidate = candidate.index,
                    iteration,
                    penetration = eval.terms.penetration,
                    keypoint = eval.terms.keypoint,
                    contact = eval.terms.contact,
                    "refinement progress"
                );
            }

            let grad = self
                .model
                .pose_gradient(state.pose(), &eval.vertex_gradient, &eval.joint_gradient)?;
            if grad.iter().any(|g| !g.is_finite()) {
                return Err(RefineError::NonFinite { what: "gradient", iteration });
            }
            state.step(&grad);
        }

        let pose = state.into_pose();
        let output = self.model.forward(&pose)?;
        let reference = Self::reference(&mut predictor, features.as_deref(), &output, candidate.index);
        let final_terms = evaluator.evaluate(&output, reference.as_deref())?.terms;
        if !final_terms.is_finite() {
            return Err(RefineError::NonFinite {
                what: "loss",
                iteration: self.params.iterations,
            });
        }

        debug!(candidate = candidate.index, %final_terms, "refinement finished");

        Ok(RefinedGrasp {
            pose,
            output,
            final_terms,
            iterations: self.params.iterations,
        })
    }

    fn reference(
        predictor: &mut Option<&'m dyn ContactPredictor>,
        features: Option<&[[f64; 4]]>,
        output: &HandOutput,
        candidate: usize,
    ) -> Option<Vec<f64>> {
        let model = (*predictor)?;
        match reference_contact_map(model, features?, &output.vertices) {
            Ok(map) => Some(map),
            Err(err) => {
                warn!(candidate, error = %err, "contact predictor failed; using a zero contact map");
                *predictor = None;
                None
            }
        }
    }

    fn check_candidate(&self, candidate: &GraspCandidate) -> RefineResult<()> {
        let checks = [
            ("hand_pose", self.model.pose_dim(), candidate.pose.hand_pose.len()),
            ("joints", self.model.joint_count(), candidate.joints.len()),
            ("hand vertices", self.model.vertex_count(), candidate.hand_vertices.len()),
        ];
        for (what, expected, got) in checks {
            if expected != got {
                return Err(RefineError::DimensionMismatch { what, expected, got });
            }
        }
        Ok(())
    }
}
