//! Composite refinement loss with analytic gradients.
//!
//! All distances go through KD-trees: the object tree is built once per
//! evaluator, the hand tree once per evaluation. Both are bulk-built
//! `ImmutableKdTree`s, which accept any number of points sharing a
//! coordinate (samples on an axis-aligned face, a flat hand patch).

use grasp_types::{LossTerms, LossWeights, ObjectSample};
use kiddo::{ImmutableKdTree, SquaredEuclidean};
use mesh_types::{Point3, Vector3};

use crate::contact::{pseudo_contact, pseudo_contact_derivative};
use crate::error::{RefineError, RefineResult};
use crate::hand::HandOutput;

/// Scale on the summed squared penetration depth.
pub const PENETRATION_SCALE: f64 = 120.0;

/// Coordinate scale of the keypoint term (metres to centimetres).
pub const KEYPOINT_SCALE: f64 = 100.0;

/// Fingertip vertex ids of the reference 778-vertex hand.
pub const DEFAULT_FINGERTIP_IDS: [usize; 5] = [744, 320, 443, 554, 671];

/// Loss terms together with gradients on the posed geometry.
#[derive(Debug, Clone)]
pub struct LossEvaluation {
    /// Unweighted terms.
    pub terms: LossTerms,
    /// Weighted total.
    pub total: f64,
    /// `∂total/∂vertices`.
    pub vertex_gradient: Vec<Vector3<f64>>,
    /// `∂total/∂joints`.
    pub joint_gradient: Vec<Vector3<f64>>,
}

/// Evaluates the composite loss of a posed hand against one object sample.
pub struct LossEvaluator<'a> {
    points: &'a [Point3<f64>],
    normals: &'a [Vector3<f64>],
    object_tree: ImmutableKdTree<f64, 3>,
    fingertips: Vec<usize>,
    joint_count: usize,
    vertex_count: usize,
    /// Initial joints followed by initial fingertip vertices.
    keypoint_targets: Vec<Point3<f64>>,
    weights: LossWeights,
}

impl<'a> LossEvaluator<'a> {
    /// Set up an evaluator for one candidate.
    ///
    /// `initial_joints` and `initial_vertices` fix the keypoint targets.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample is empty, points and normals disagree
    /// in length, the hand has no vertices, or a fingertip id is out of
    /// range.
    pub fn new(
        sample: &'a ObjectSample,
        initial_joints: &[Point3<f64>],
        initial_vertices: &[Point3<f64>],
        fingertips: &[usize],
        weights: LossWeights,
    ) -> RefineResult<Self> {
        if sample.is_empty() {
            return Err(RefineError::EmptySample);
        }
        if sample.normals.len() != sample.points.len() {
            return Err(RefineError::DimensionMismatch {
                what: "object normals",
                expected: sample.points.len(),
                got: sample.normals.len(),
            });
        }
        if initial_vertices.is_empty() {
            return Err(RefineError::InvalidParams("hand has no vertices".into()));
        }
        if let Some(&bad) = fingertips.iter().find(|&&f| f >= initial_vertices.len()) {
            return Err(RefineError::InvalidParams(format!(
                "fingertip id {bad} outside 0..{}",
                initial_vertices.len()
            )));
        }

        let object_tree = build_tree(&sample.points);

        let keypoint_targets = initial_joints
            .iter()
            .copied()
            .chain(fingertips.iter().map(|&f| initial_vertices[f]))
            .collect();

        Ok(Self {
            points: &sample.points,
            normals: &sample.normals,
            object_tree,
            fingertips: fingertips.to_vec(),
            joint_count: initial_joints.len(),
            vertex_count: initial_vertices.len(),
            keypoint_targets,
            weights,
        })
    }

    /// Number of object sample points.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Loss weights in use.
    #[must_use]
    pub fn weights(&self) -> &LossWeights {
        &self.weights
    }

    /// Evaluate every term and its gradient.
    ///
    /// `reference` is the normalized reference contact map; `None` stands for
    /// a zero map.
    ///
    /// # Errors
    ///
    /// Returns [`RefineError::DimensionMismatch`] if the posed hand or the
    /// reference map has the wrong size.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn evaluate(&self, hand: &HandOutput, reference: Option<&[f64]>) -> RefineResult<LossEvaluation> {
        self.check_sizes(hand, reference)?;
        let w = &self.weights;
        let n = self.points.len() as f64;
        let vertices = &hand.vertices;

        let hand_tree = build_tree(vertices);

        // Object to hand: nearest hand vertex and pseudo contact per point.
        let object_side: Vec<(usize, f64)> = self
            .points
            .iter()
            .map(|p| {
                let nearest = hand_tree.nearest_one::<SquaredEuclidean>(&[p.x, p.y, p.z]);
                (nearest.item as usize, nearest.distance.sqrt())
            })
            .collect();

        // Hand to object: nearest sample point per vertex.
        let hand_side: Vec<(usize, f64)> = vertices
            .iter()
            .map(|v| {
                let nearest = self.object_tree.nearest_one::<SquaredEuclidean>(&[v.x, v.y, v.z]);
                (nearest.item as usize, nearest.distance.sqrt())
            })
            .collect();
        let hand_contact: Vec<f64> = hand_side.iter().map(|&(_, e)| pseudo_contact(e)).collect();

        let mut terms = LossTerms::default();
        let mut d_object = vec![0.0; self.points.len()];
        let mut d_hand = vec![0.0; vertices.len()];

        for (i, &(j, d)) in object_side.iter().enumerate() {
            let c = pseudo_contact(d);
            let r = reference.map_or(0.0, |r| r[i]);
            terms.contact += (c - r).powi(2) / n;
            d_object[i] += w.contact * 2.0 * (c - r) / n;

            let delta = c - hand_contact[j];
            terms.consistency += delta.powi(2) / n;
            d_object[i] += w.consistency * 2.0 * delta / n;
            d_hand[j] -= w.consistency * 2.0 * delta / n;
        }

        if !self.fingertips.is_empty() {
            let f = self.fingertips.len() as f64;
            for &tip in &self.fingertips {
                let miss = 1.0 - hand_contact[tip];
                terms.finger_contact += miss.powi(2) / f;
                d_hand[tip] -= w.finger_contact * 2.0 * miss / f;
            }
        }

        let mut vertex_gradient = vec![Vector3::zeros(); vertices.len()];

        for (i, &(j, d)) in object_side.iter().enumerate() {
            if d_object[i] != 0.0 && d > 0.0 {
                let dir = (vertices[j] - self.points[i]) / d;
                vertex_gradient[j] += dir * (d_object[i] * pseudo_contact_derivative(d));
            }
        }

        for (j, &(k, e)) in hand_side.iter().enumerate() {
            let offset = vertices[j] - self.points[k];
            if d_hand[j] != 0.0 && e > 0.0 {
                vertex_gradient[j] += offset / e * (d_hand[j] * pseudo_contact_derivative(e));
            }
            if offset.dot(&self.normals[k]) < 0.0 {
                terms.penetration += PENETRATION_SCALE * offset.norm_squared();
                vertex_gradient[j] += offset * (w.penetration * 2.0 * PENETRATION_SCALE);
            }
        }

        let mut joint_gradient = vec![Vector3::zeros(); hand.joints.len()];
        let keypoints = hand
            .joints
            .iter()
            .chain(self.fingertips.iter().map(|&f| &vertices[f]));
        let coordinate_count = 3 * self.keypoint_targets.len();
        if coordinate_count > 0 {
            let coef = KEYPOINT_SCALE * KEYPOINT_SCALE / coordinate_count as f64;
            for (m, (x, t)) in keypoints.zip(&self.keypoint_targets).enumerate() {
                let drift = x - t;
                terms.keypoint += coef * drift.norm_squared();
                let grad = drift * (w.keypoint * 2.0 * coef);
                if m < self.joint_count {
                    joint_gradient[m] += grad;
                } else {
                    vertex_gradient[self.fingertips[m - self.joint_count]] += grad;
                }
            }
        }

        Ok(LossEvaluation {
            total: terms.weighted_total(w),
            terms,
            vertex_gradient,
            joint_gradient,
        })
    }

    fn check_sizes(&self, hand: &HandOutput, reference: Option<&[f64]>) -> RefineResult<()> {
        let checks = [
            ("hand vertices", self.vertex_count, hand.vertices.len()),
            ("hand joints", self.joint_count, hand.joints.len()),
            ("reference contact map", self.points.len(), reference.map_or(self.points.len(), <[f64]>::len)),
        ];
        for (what, expected, got) in checks {
            if expected != got {
                return Err(RefineError::DimensionMismatch { what, expected, got });
            }
        }
        Ok(())
    }
}

/// Bulk-build a tree whose items are indices into `points`.
fn build_tree(points: &[Point3<f64>]) -> ImmutableKdTree<f64, 3> {
    let coords: Vec<[f64; 3]> = points.iter().map(|p| [p.x, p.y, p.z]).collect();
    ImmutableKdTree::new_from_slice(&coords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::{IndexedMesh, Matrix3};

    /// Points on a sphere of radius 0.05 with outward normals.
    fn sphere_sample() -> ObjectSample {
        let mut points = Vec::new();
        let mut normals = Vec::new();
        let golden = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
        let count = 400;
        for i in 0..count {
            let y = 1.0 - 2.0 * (f64::from(i) + 0.5) / f64::from(count);
            let r = (1.0 - y * y).sqrt();
            let theta = golden * f64::from(i);
            let n = Vector3::new(r * theta.cos(), y, r * theta.sin());
            points.push(Point3::from(n * 0.05));
            normals.push(n);
        }
        ObjectSample {
            mesh: IndexedMesh::new(),
            rotation: Matrix3::identity(),
            points,
            normals,
            scale: 1.0,
        }
    }

    fn hand(vertices: &[[f64; 3]], joints: &[[f64; 3]]) -> HandOutput {
        HandOutput {
            vertices: vertices.iter().copied().map(Point3::from).collect(),
            joints: joints.iter().copied().map(Point3::from).collect(),
        }
    }

    fn all_weights() -> LossWeights {
        LossWeights {
            contact: 20.0,
            consistency: 5.0,
            penetration: 300.0,
            keypoint: 10.0,
            finger_contact: 3.0,
        }
    }

    #[test]
    fn vertex_gradient_matches_finite_differences() {
        let sample = sphere_sample();
        let initial = hand(
            &[[0.0, 0.0, 0.048], [0.01, 0.052, 0.0], [0.058, 0.003, 0.001], [-0.03, -0.03, -0.02]],
            &[[0.0, 0.0, 0.09]],
        );
        let evaluator =
            LossEvaluator::new(&sample, &initial.joints, &initial.vertices, &[0, 2], all_weights()).unwrap();

        let mut posed = initial.clone();
        posed.vertices[0].z -= 0.004;
        posed.vertices[2].x += 0.003;
        posed.joints[0].y += 0.01;
        let reference: Vec<f64> = (0..sample.len()).map(|i| f64::from(i % 3 == 0)).collect();

        let eval = evaluator.evaluate(&posed, Some(&reference)).unwrap();
        let h = 1e-8;
        for j in 0..posed.vertices.len() {
            for axis in 0..3 {
                let mut plus = posed.clone();
                plus.vertices[j][axis] += h;
                let mut minus = posed.clone();
                minus.vertices[j][axis] -= h;
                let numeric = (evaluator.evaluate(&plus, Some(&reference)).unwrap().total
                    - evaluator.evaluate(&minus, Some(&reference)).unwrap().total)
                    / (2.0 * h);
                assert_relative_eq!(eval.vertex_gradient[j][axis], numeric, max_relative = 1e-3, epsilon = 1e-3);
            }
        }
        for axis in 0..3 {
            let mut plus = posed.clone();
            plus.joints[0][axis] += h;
            let mut minus = posed.clone();
            minus.joints[0][axis] -= h;
            let numeric = (evaluator.evaluate(&plus, Some(&reference)).unwrap().total
                - evaluator.evaluate(&minus, Some(&reference)).unwrap().total)
                / (2.0 * h);
            assert_relative_eq!(eval.joint_gradient[0][axis], numeric, max_relative = 1e-3, epsilon = 1e-3);
        }
    }

    #[test]
    fn penetration_counts_only_interior_vertices() {
        let sample = sphere_sample();
        let outside = hand(&[[0.0, 0.0, 0.07], [0.0, 0.08, 0.0]], &[]);
        let evaluator =
            LossEvaluator::new(&sample, &outside.joints, &outside.vertices, &[], all_weights()).unwrap();
        let eval = evaluator.evaluate(&outside, None).unwrap();
        assert_eq!(eval.terms.penetration, 0.0);

        let inside = hand(&[[0.0, 0.0, 0.04], [0.0, 0.08, 0.0]], &[]);
        let eval = evaluator.evaluate(&inside, None).unwrap();
        assert!(eval.terms.penetration > 0.0);
        // Pushes the interior vertex back out along +z.
        assert!(eval.vertex_gradient[0].z < 0.0);
        assert_eq!(eval.vertex_gradient[1], Vector3::zeros());
    }

    #[test]
    fn keypoint_term_is_zero_at_start() {
        let sample = sphere_sample();
        let start = hand(&[[0.0, 0.0, 0.07], [0.0, 0.08, 0.0]], &[[0.1, 0.0, 0.0], [0.0, 0.1, 0.1]]);
        let evaluator = LossEvaluator::new(
            &sample,
            &start.joints,
            &start.vertices,
            &[1],
            LossWeights::keypoint_only(10.0),
        )
        .unwrap();
        let eval = evaluator.evaluate(&start, None).unwrap();
        assert_eq!(eval.terms.keypoint, 0.0);
        assert!(eval.joint_gradient.iter().all(|g| *g == Vector3::zeros()));

        let mut moved = start.clone();
        moved.joints[0].x += 0.01;
        let eval = evaluator.evaluate(&moved, None).unwrap();
        // 1e4 / (3 * 3 keypoints) * 0.01^2
        assert_relative_eq!(eval.terms.keypoint, 1e4 / 9.0 * 1e-4, epsilon = 1e-12);
    }

    #[test]
    fn zero_reference_equals_none() {
        let sample = sphere_sample();
        let posed = hand(&[[0.0, 0.0, 0.051], [0.0, 0.06, 0.0]], &[]);
        let evaluator = LossEvaluator::new(&sample, &[], &posed.vertices, &[0], all_weights()).unwrap();
        let zeros = vec![0.0; sample.len()];
        let a = evaluator.evaluate(&posed, None).unwrap();
        let b = evaluator.evaluate(&posed, Some(&zeros)).unwrap();
        assert_eq!(a.terms, b.terms);
        assert!(a.terms.contact > 0.0);
        assert!(a.terms.finger_contact < 1.0);
    }

    #[test]
    fn rejects_bad_inputs() {
        let sample = sphere_sample();
        let verts = [Point3::origin()];
        assert!(matches!(
            LossEvaluator::new(&sample, &[], &verts, &[744], all_weights()),
            Err(RefineError::InvalidParams(_))
        ));

        let mut empty = sample.clone();
        empty.points.clear();
        empty.normals.clear();
        assert!(matches!(
            LossEvaluator::new(&empty, &[], &verts, &[], all_weights()),
            Err(RefineError::EmptySample)
        ));

        let evaluator = LossEvaluator::new(&sample, &[], &verts, &[], all_weights()).unwrap();
        let wrong = hand(&[[0.0; 3], [1.0, 0.0, 0.0]], &[]);
        assert!(matches!(
            evaluator.evaluate(&wrong, None),
            Err(RefineError::DimensionMismatch { what: "hand vertices", .. })
        ));
        let ok = hand(&[[0.0; 3]], &[]);
        assert!(evaluator.evaluate(&ok, Some(&[1.0])).is_err());
    }
}
