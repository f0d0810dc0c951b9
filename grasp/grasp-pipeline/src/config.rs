//! Run configuration.

use std::path::{Path, PathBuf};

use grasp_refine::OptimizerParams;
use grasp_sample::SampleParams;
use grasp_types::{LossWeights, ToolCategory};
use grasp_validate::ValidateParams;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Which final joint coordinate orders the processed candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderParams {
    /// Joint index.
    pub joint: usize,
    /// Axis, 0 = x, 1 = y, 2 = z.
    pub axis: usize,
}

impl Default for OrderParams {
    fn default() -> Self {
        Self { joint: 3, axis: 2 }
    }
}

/// External simulator program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Program to run; `None` disables simulation.
    pub program: Option<PathBuf>,
    /// Arguments placed before the two mesh paths.
    pub args: Vec<String>,
}

/// Everything a batch run needs, loaded once and never mutated afterwards.
///
/// Relative paths in a config file are resolved against the file's
/// directory.
///
/// # Example
///
/// ```
/// use grasp_pipeline::RunConfig;
/// use grasp_types::ToolCategory;
///
/// let config = RunConfig::from_json_str(
///     r#"{"object_path": "tool.stl", "hand_model_path": "hand.json", "category": "friem"}"#,
/// )
/// .unwrap();
/// assert_eq!(config.category, ToolCategory::Friem);
/// assert_eq!(config.penetration_threshold(), 0.01);
/// assert_eq!(config.weights().penetration, 300.0);
/// assert_eq!(config.optimizer.iterations, 1501);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Object mesh (PLY or STL).
    pub object_path: PathBuf,
    /// Optional handle sub-mesh used for centering.
    pub handle_path: Option<PathBuf>,
    /// Hand model file.
    pub hand_model_path: PathBuf,
    /// Tool category selecting loss weights and penetration threshold.
    pub category: ToolCategory,
    /// Overrides the category's loss weights.
    pub weights: Option<LossWeights>,
    /// Overrides the category's penetration threshold.
    pub penetration_threshold: Option<f64>,
    /// Object preparation and sampling.
    pub sampler: SampleParams,
    /// Pose refinement.
    pub optimizer: OptimizerParams,
    /// Validation chain.
    pub validator: ValidateParams,
    /// Output ordering.
    pub order: OrderParams,
    /// Rigid-body simulator.
    pub simulator: SimulatorConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            object_path: PathBuf::new(),
            handle_path: None,
            hand_model_path: PathBuf::new(),
            category: ToolCategory::default(),
            weights: None,
            penetration_threshold: None,
            sampler: SampleParams::default(),
            optimizer: OptimizerParams::default(),
            validator: ValidateParams::default(),
            order: OrderParams::default(),
            simulator: SimulatorConfig::default(),
        }
    }
}

impl RunConfig {
    /// Parse a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON.
    pub fn from_json_str(json: &str) -> PipelineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file and resolve its relative paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let mut config = Self::from_json_str(&json)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Make every relative path absolute against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() && !p.as_os_str().is_empty() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.object_path);
        resolve(&mut self.hand_model_path);
        if let Some(handle) = self.handle_path.as_mut() {
            resolve(handle);
        }
        if let Some(program) = self.simulator.program.as_mut() {
            // Bare program names are looked up on PATH.
            if program.components().count() > 1 {
                resolve(program);
            }
        }
    }

    /// Effective loss weights.
    #[must_use]
    pub fn weights(&self) -> LossWeights {
        self.weights.unwrap_or(self.category.profile().weights)
    }

    /// Effective penetration-volume threshold.
    #[must_use]
    pub fn penetration_threshold(&self) -> f64 {
        self.penetration_threshold
            .unwrap_or(self.category.profile().penetration_threshold)
    }

    /// Set the category.
    #[must_use]
    pub const fn with_category(mut self, category: ToolCategory) -> Self {
        self.category = category;
        self
    }

    /// Set the optimizer iteration budget.
    #[must_use]
    pub const fn with_iterations(mut self, iterations: usize) -> Self {
        self.optimizer.iterations = iterations;
        self
    }

    /// Set the simulator program.
    #[must_use]
    pub fn with_simulator(mut self, program: PathBuf) -> Self {
        self.simulator.program = Some(program);
        self
    }

    /// Check the configuration and every component's parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] for missing paths, invalid weights,
    /// thresholds or ordering axis, and the component errors of each
    /// parameter block.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.object_path.as_os_str().is_empty() {
            return Err(PipelineError::Config("object_path is required".into()));
        }
        if self.hand_model_path.as_os_str().is_empty() {
            return Err(PipelineError::Config("hand_model_path is required".into()));
        }
        if !self.weights().is_valid() {
            return Err(PipelineError::Config(format!(
                "loss weights must be finite and non-negative: {:?}",
                self.weights()
            )));
        }
        let threshold = self.penetration_threshold();
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(PipelineError::Config(format!(
                "penetration_threshold must be in (0, 1], got {threshold}"
            )));
        }
        if self.order.axis > 2 {
            return Err(PipelineError::Config(format!(
                "order.axis must be 0, 1 or 2, got {}",
                self.order.axis
            )));
        }
        self.sampler.validate()?;
        self.optimizer.validate()?;
        self.validator.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> RunConfig {
        RunConfig {
            object_path: "tool.ply".into(),
            hand_model_path: "hand.json".into(),
            ..RunConfig::default()
        }
    }

    #[test]
    fn category_supplies_defaults() {
        let config = minimal().with_category(ToolCategory::DiskPlacer);
        assert_eq!(config.weights().contact, 60.0);
        assert_eq!(config.penetration_threshold(), 0.03);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn overrides_win() {
        let mut config = minimal();
        config.weights = Some(LossWeights::keypoint_only(1.0));
        config.penetration_threshold = Some(0.2);
        assert_eq!(config.weights().contact, 0.0);
        assert_eq!(config.penetration_threshold(), 0.2);
    }

    #[test]
    fn validation_catches_bad_values() {
        assert!(RunConfig::default().validate().is_err());

        let mut config = minimal();
        config.order.axis = 3;
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));

        let mut config = minimal();
        config.penetration_threshold = Some(0.0);
        assert!(config.validate().is_err());

        let mut config = minimal();
        config.validator.voxel_batch = 0;
        assert!(matches!(config.validate(), Err(PipelineError::Validate(_))));

        let config = minimal().with_iterations(10);
        let mut bad = config.clone();
        bad.optimizer.learning_rate = -1.0;
        assert!(matches!(bad.validate(), Err(PipelineError::Refine(_))));
    }

    #[test]
    fn load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(
            &path,
            r#"{
                "object_path": "assets/tool.stl",
                "hand_model_path": "/models/hand.json",
                "simulator": {"program": "./bin/drop-test", "args": ["--steps", "200"]}
            }"#,
        )
        .unwrap();

        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.object_path, dir.path().join("assets/tool.stl"));
        assert_eq!(config.hand_model_path, PathBuf::from("/models/hand.json"));
        assert_eq!(config.simulator.program, Some(dir.path().join("./bin/drop-test")));
        assert_eq!(config.simulator.args, vec!["--steps", "200"]);
    }

    #[test]
    fn bare_program_is_left_for_path_lookup() {
        let mut config = minimal().with_simulator("pybullet-drop".into());
        config.resolve_paths(Path::new("/etc/grasp"));
        assert_eq!(config.simulator.program, Some(PathBuf::from("pybullet-drop")));
        assert_eq!(config.object_path, PathBuf::from("/etc/grasp/tool.ply"));
    }
}
