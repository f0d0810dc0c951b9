//! Batch driver for grasp refinement and validation.
//!
//! A run takes a [`RunConfig`], one [`GenerationBatch`] of candidate poses
//! with their source hand meshes, and an output directory. For every
//! candidate the [`BatchRunner`] samples the rotated object, refines the
//! hand articulation, validates the result and writes accepted grasps. The
//! batch ends with `valid.json` and `order.txt`.
//!
//! Run-level problems (configuration, asset, batch file, output directory)
//! are errors; candidate-level problems are logged and counted as failed.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod batch;
mod config;
mod error;
mod output;
mod runner;
mod simulator;

pub use batch::{hand_mesh_path, load_source_vertices, GenerationBatch, HAND_MESH_DIR};
pub use config::{OrderParams, RunConfig, SimulatorConfig};
pub use error::{PipelineError, PipelineResult};
pub use output::{format_order, OutputWriter, ORDER_FILE, VALID_FILE};
pub use runner::{order_by_joint, BatchRunner, CandidateOutcome};
pub use simulator::CommandSimulator;
