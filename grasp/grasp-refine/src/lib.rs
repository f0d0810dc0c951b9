//! Test-time refinement of hand poses against an object surface.
//!
//! The pieces:
//!
//! - [`HandModel`] - differentiable articulation `pose → (vertices, joints)`
//!   with a vector-Jacobian product; [`LinearHandModel`] is the bundled
//!   implementation
//! - [`ContactPredictor`] - optional learned contact map
//! - [`LossEvaluator`] - penetration, contact, consistency, finger-contact
//!   and keypoint terms with analytic gradients
//! - [`PoseOptimizer`] - fixed-budget heavy-ball SGD over the articulation
//!   vector; orientation, translation and shape stay fixed
//!
//! # Example
//!
//! ```
//! use grasp_refine::{LinearHandModel, OptimizerParams, PoseOptimizer};
//! use grasp_types::{GraspCandidate, HandPose, LossWeights, ObjectSample};
//! use mesh_types::{IndexedMesh, Matrix3, Point3, Vector3};
//!
//! let model = LinearHandModel::new(
//!     vec![Point3::new(0.0, 0.0, 0.1), Point3::new(0.0, 0.02, 0.1)],
//!     vec![Point3::new(0.0, 0.0, 0.12)],
//!     vec![vec![Vector3::new(0.0, 0.0, -0.01); 2]],
//!     vec![vec![Vector3::new(0.0, 0.0, -0.01)]],
//!     Vec::new(),
//! )
//! .unwrap();
//!
//! let pose = HandPose::new([0.0; 3], vec![0.0], [0.0; 3]);
//! let start = vec![Point3::new(0.0, 0.0, 0.1), Point3::new(0.0, 0.02, 0.1)];
//! let candidate = GraspCandidate::new(0, Matrix3::identity(), pose, vec![Point3::new(0.0, 0.0, 0.12)], &start);
//! let sample = ObjectSample {
//!     mesh: IndexedMesh::new(),
//!     rotation: Matrix3::identity(),
//!     points: vec![Point3::origin(), Point3::new(0.01, 0.0, 0.0)],
//!     normals: vec![Vector3::z(), Vector3::z()],
//!     scale: 1.0,
//! };
//!
//! let params = OptimizerParams::default().with_iterations(5).with_fingertip_ids(vec![0]);
//! let optimizer = PoseOptimizer::new(&model, params).unwrap();
//! let refined = optimizer.refine(&candidate, &sample, &LossWeights::default()).unwrap();
//! assert_eq!(refined.iterations, 5);
//! assert_eq!(refined.pose.transl, [0.0; 3]);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod contact;
mod error;
mod hand;
mod linear;
mod loss;
mod optimizer;

pub use contact::{
    pseudo_contact, pseudo_contact_derivative, reference_contact_map, sigmoid, ContactPredictor,
    CONTACT_SHARPNESS,
};
pub use error::{RefineError, RefineResult};
pub use hand::{HandModel, HandOutput};
pub use linear::LinearHandModel;
pub use loss::{
    LossEvaluation, LossEvaluator, DEFAULT_FINGERTIP_IDS, KEYPOINT_SCALE, PENETRATION_SCALE,
};
pub use optimizer::{OptimizationState, OptimizerParams, PoseOptimizer, RefinedGrasp, SgdMomentum};
