//! End-to-end behaviour of the pose optimizer on small synthetic hands.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use grasp_refine::{
    ContactPredictor, HandModel, HandOutput, LinearHandModel, LossEvaluator, OptimizerParams,
    PoseOptimizer, RefineError, RefineResult,
};
use grasp_sample::{sample_object, ObjectAsset, SampleParams};
use grasp_types::{GraspCandidate, HandPose, LossWeights, ObjectSample};
use mesh_types::{axis_aligned_box, IndexedMesh, Matrix3, Point3, Vector3};

fn sphere_sample(radius: f64, count: u32) -> ObjectSample {
    let golden = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
    let (points, normals) = (0..count)
        .map(|i| {
            let y = 1.0 - 2.0 * (f64::from(i) + 0.5) / f64::from(count);
            let r = (1.0 - y * y).sqrt();
            let theta = golden * f64::from(i);
            let n = Vector3::new(r * theta.cos(), y, r * theta.sin());
            (Point3::from(n * radius), n)
        })
        .unzip();
    ObjectSample {
        mesh: IndexedMesh::new(),
        rotation: Matrix3::identity(),
        points,
        normals,
        scale: 1.0,
    }
}

/// Fixed vertices; joint `k` slides along axis `k` by 1 cm per unit pose.
fn sliding_joints_model() -> LinearHandModel {
    let vertices = vec![
        Point3::new(0.2, 0.0, 0.0),
        Point3::new(0.21, 0.01, 0.0),
        Point3::new(0.2, 0.02, 0.01),
        Point3::new(0.22, 0.0, 0.02),
    ];
    let joints = vec![
        Point3::new(0.25, 0.0, 0.0),
        Point3::new(0.26, 0.01, 0.0),
        Point3::new(0.27, 0.0, 0.01),
    ];
    let vertex_basis = vec![vec![Vector3::zeros(); 4]; 3];
    let joint_basis = (0..3)
        .map(|k| {
            (0..3)
                .map(|j| if j == k { Vector3::ith(k, 0.01) } else { Vector3::zeros() })
                .collect()
        })
        .collect();
    LinearHandModel::new(vertices, joints, vertex_basis, joint_basis, vec![[0, 1, 2], [0, 2, 3]]).unwrap()
}

/// Four vertices just under the top of a 5 cm sphere, lifted along +z.
fn lifting_patch_model() -> LinearHandModel {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.045),
        Point3::new(0.004, 0.0, 0.044),
        Point3::new(0.0, 0.004, 0.044),
        Point3::new(-0.003, -0.003, 0.045),
    ];
    LinearHandModel::new(
        vertices,
        Vec::new(),
        vec![vec![Vector3::new(0.0, 0.0, 0.01); 4]],
        vec![Vec::new()],
        vec![[0, 1, 2], [0, 2, 3]],
    )
    .unwrap()
}

/// Candidate whose keypoint targets come from the model at `target_pose`,
/// starting the optimization from `start_pose`.
fn candidate(model: &dyn HandModel, target_pose: &[f64], start_pose: &[f64]) -> GraspCandidate {
    let target = HandPose::new([0.0; 3], target_pose.to_vec(), [0.0; 3]);
    let out = model.forward(&target).unwrap();
    GraspCandidate::new(
        7,
        Matrix3::identity(),
        target.with_hand_pose(start_pose.to_vec()),
        out.joints,
        &out.vertices,
    )
}

#[test]
fn keypoint_loss_pulls_back_to_initial_keypoints() {
    let model = sliding_joints_model();
    let sample = sphere_sample(0.05, 500);
    let cand = candidate(&model, &[0.0; 3], &[1.0, -2.0, 0.5]);

    let params = OptimizerParams::default()
        .with_learning_rate(0.2)
        .with_fingertip_ids(vec![0]);
    let optimizer = PoseOptimizer::new(&model, params).unwrap();
    let refined = optimizer
        .refine(&cand, &sample, &LossWeights::keypoint_only(10.0))
        .unwrap();

    assert_eq!(refined.iterations, 1501);
    for theta in &refined.pose.hand_pose {
        assert!(theta.abs() < 1e-6, "pose did not converge: {:?}", refined.pose.hand_pose);
    }
    assert!(refined.final_terms.keypoint < 1e-10);
}

#[test]
fn starting_at_the_target_stays_there() {
    let model = sliding_joints_model();
    let sample = sphere_sample(0.05, 500);
    let cand = candidate(&model, &[0.3, 0.1, -0.2], &[0.3, 0.1, -0.2]);

    let params = OptimizerParams::default().with_learning_rate(0.2).with_fingertip_ids(vec![1, 3]);
    let optimizer = PoseOptimizer::new(&model, params).unwrap();
    let refined = optimizer
        .refine(&cand, &sample, &LossWeights::keypoint_only(10.0))
        .unwrap();

    assert_eq!(refined.pose, cand.pose);
    assert_eq!(refined.final_terms.keypoint, 0.0);
}

#[test]
fn only_articulation_changes() {
    let model = sliding_joints_model();
    let sample = sphere_sample(0.05, 500);
    let mut cand = candidate(&model, &[0.0; 3], &[1.0, 1.0, 1.0]);
    cand.pose.global_orient = [0.0, 0.0, 0.0];
    cand.pose.transl = [0.0, 0.0, 0.0];
    cand.pose.betas = vec![0.5; 10];

    let params = OptimizerParams::default()
        .with_learning_rate(0.2)
        .with_iterations(20)
        .with_fingertip_ids(vec![0]);
    let refined = PoseOptimizer::new(&model, params)
        .unwrap()
        .refine(&cand, &sample, &LossWeights::keypoint_only(10.0))
        .unwrap();

    assert_eq!(refined.pose.betas, cand.pose.betas);
    assert_eq!(refined.pose.global_orient, cand.pose.global_orient);
    assert_eq!(refined.pose.transl, cand.pose.transl);
    assert_ne!(refined.pose.hand_pose, cand.pose.hand_pose);
}

#[test]
fn penetration_weight_lifts_hand_out_of_object() {
    let model = lifting_patch_model();
    let sample = sphere_sample(0.05, 2000);
    let cand = candidate(&model, &[0.0], &[0.0]);
    let params = OptimizerParams::default()
        .with_learning_rate(0.01)
        .with_iterations(300)
        .with_fingertip_ids(Vec::new());
    let optimizer = PoseOptimizer::new(&model, params).unwrap();

    let passive = optimizer
        .refine(&cand, &sample, &LossWeights::keypoint_only(0.0))
        .unwrap();
    let active = optimizer
        .refine(&cand, &sample, &LossWeights::keypoint_only(0.0).with_penetration(300.0))
        .unwrap();

    assert!(passive.final_terms.penetration > 0.0);
    assert!(
        active.final_terms.penetration < 0.5 * passive.final_terms.penetration,
        "penetration {} vs {}",
        active.final_terms.penetration,
        passive.final_terms.penetration
    );
    assert!(active.pose.hand_pose[0] > 0.0);
}

struct BrokenPredictor;

impl ContactPredictor for BrokenPredictor {
    fn predict(&self, _: &[[f64; 4]], _: &[Point3<f64>]) -> RefineResult<Vec<f64>> {
        Err(RefineError::Predictor("model not loaded".into()))
    }
}

#[test]
fn failing_predictor_degrades_to_zero_map() {
    let model = lifting_patch_model();
    let sample = sphere_sample(0.05, 500);
    let cand = candidate(&model, &[0.0], &[0.0]);
    let params = OptimizerParams::default()
        .with_learning_rate(0.01)
        .with_iterations(10)
        .with_fingertip_ids(Vec::new());
    let weights = LossWeights::default();

    let plain = PoseOptimizer::new(&model, params.clone())
        .unwrap()
        .refine(&cand, &sample, &weights)
        .unwrap();
    let degraded = PoseOptimizer::new(&model, params)
        .unwrap()
        .with_predictor(&BrokenPredictor)
        .refine(&cand, &sample, &weights)
        .unwrap();

    assert_eq!(plain.pose, degraded.pose);
    assert_eq!(plain.final_terms, degraded.final_terms);
}

/// Wraps a model and poisons its gradient.
struct NanGradient(LinearHandModel);

impl HandModel for NanGradient {
    fn vertex_count(&self) -> usize {
        self.0.vertex_count()
    }
    fn joint_count(&self) -> usize {
        self.0.joint_count()
    }
    fn pose_dim(&self) -> usize {
        self.0.pose_dim()
    }
    fn faces(&self) -> &[[u32; 3]] {
        self.0.faces()
    }
    fn forward(&self, pose: &HandPose) -> RefineResult<HandOutput> {
        self.0.forward(pose)
    }
    fn pose_gradient(&self, _: &HandPose, _: &[Vector3<f64>], _: &[Vector3<f64>]) -> RefineResult<Vec<f64>> {
        Ok(vec![f64::NAN; self.pose_dim()])
    }
}

#[test]
fn non_finite_gradient_is_an_error() {
    let model = NanGradient(lifting_patch_model());
    let sample = sphere_sample(0.05, 200);
    let cand = candidate(&model, &[0.0], &[0.0]);
    let optimizer = PoseOptimizer::new(&model, OptimizerParams::default().with_fingertip_ids(Vec::new())).unwrap();

    let err = optimizer.refine(&cand, &sample, &LossWeights::default()).unwrap_err();
    assert!(matches!(err, RefineError::NonFinite { what: "gradient", iteration: 0 }));
}

#[test]
fn mismatched_candidate_is_rejected() {
    let model = lifting_patch_model();
    let sample = sphere_sample(0.05, 200);
    let mut cand = candidate(&model, &[0.0], &[0.0]);
    cand.pose.hand_pose = vec![0.0; 45];

    let optimizer = PoseOptimizer::new(&model, OptimizerParams::default().with_fingertip_ids(Vec::new())).unwrap();
    let err = optimizer.refine(&cand, &sample, &LossWeights::default()).unwrap_err();
    assert!(matches!(
        err,
        RefineError::DimensionMismatch { what: "hand_pose", expected: 1, got: 45 }
    ));
}

/// A flat 10 x 10 grid of vertices 2 mm above the top face of a bar, lifted along +z.
fn flat_patch_model() -> LinearHandModel {
    let vertices: Vec<_> = (0..100)
        .map(|k| Point3::new(f64::from(k % 10) * 0.004 - 0.02, f64::from(k / 10) * 0.001 - 0.005, 0.012))
        .collect();
    let faces = (0..9u32)
        .flat_map(|r| (0..9u32).flat_map(move |c| {
            let a = r * 10 + c;
            [[a, a + 1, a + 11], [a, a + 11, a + 10]]
        }))
        .collect();
    LinearHandModel::new(
        vertices,
        vec![Point3::new(0.0, 0.0, 0.05)],
        vec![vec![Vector3::new(0.0, 0.0, 0.01); 100]],
        vec![vec![Vector3::new(0.0, 0.0, 0.01)]],
        faces,
    )
    .unwrap()
}

#[test]
fn axis_aligned_faces_share_coordinates_without_trouble() {
    let params = SampleParams::default().with_asset_scale(1.0);
    let bar = axis_aligned_box(Point3::new(-0.06, -0.01, -0.01), Point3::new(0.06, 0.01, 0.01));
    let asset = ObjectAsset::prepare(bar, None, &params).unwrap();
    let sample = sample_object(&asset, &Matrix3::identity(), &params).unwrap();
    assert_eq!(sample.len(), 3000);

    // Samples on a face keep its exact coordinate, far more than one tree bucket.
    let on_top = sample.points.iter().filter(|p| p.z == 0.01).count();
    assert!(on_top > 100, "only {on_top} samples on the top face");

    let model = flat_patch_model();
    let cand = candidate(&model, &[0.0], &[0.0]);
    let evaluator = LossEvaluator::new(
        &sample,
        &cand.joints,
        &cand.hand_vertices,
        &[0, 55],
        LossWeights::default(),
    )
    .unwrap();
    let posed = model.forward(&cand.pose).unwrap();
    let eval = evaluator.evaluate(&posed, None).unwrap();
    assert!(eval.total.is_finite());
    assert_eq!(eval.terms.penetration, 0.0);

    let optimizer = PoseOptimizer::new(
        &model,
        OptimizerParams::default().with_iterations(20).with_fingertip_ids(vec![0, 55]),
    )
    .unwrap();
    let refined = optimizer.refine(&cand, &sample, &LossWeights::default()).unwrap();
    assert_eq!(refined.iterations, 20);
    assert!(refined.final_terms.is_finite());
}
