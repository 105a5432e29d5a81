//! Cost-matrix association: gated rectangular assignment between live tracks
//! and a frame's detections.

use ndarray::Array2;

use crate::geometry::Point3;

/// Outcome of one frame's association pass.
#[derive(Debug, Clone, Default)]
pub struct AssignmentResult {
    /// (track_index, detection_index) pairs accepted by the gate.
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Build the cost matrix C[i, j] = euclidean distance between track i's
/// predicted position and detection j.
pub fn cost_matrix(track_positions: &[Point3], detections: &[Point3]) -> Array2<f64> {
    let mut costs = Array2::zeros((track_positions.len(), detections.len()));
    for (i, t) in track_positions.iter().enumerate() {
        for (j, d) in detections.iter().enumerate() {
            costs[[i, j]] = t.distance(d);
        }
    }
    costs
}

/// Solve the rectangular assignment minimizing total cost, then gate each
/// accepted pair against `distance_threshold`. Empty tracks or empty
/// detections are a no-op: everything on the non-empty side is unassigned.
pub fn associate(cost: &Array2<f64>, distance_threshold: f64) -> AssignmentResult {
    let (num_tracks, num_dets) = cost.dim();

    if num_tracks == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: vec![],
            unmatched_detections: (0..num_dets).collect(),
        };
    }
    if num_dets == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_tracks).collect(),
            unmatched_detections: vec![],
        };
    }

    let size = num_tracks.max(num_dets);
    let max_cost = cost.iter().cloned().fold(0.0_f64, f64::max);
    let sentinel = (max_cost + 1.0) * 1e6;
    let mut padded = Array2::<f64>::from_elem((size, size), sentinel);
    for i in 0..num_tracks {
        for j in 0..num_dets {
            padded[[i, j]] = cost[[i, j]];
        }
    }

    let mut matches = Vec::new();
    let mut unmatched_tracks = Vec::new();
    let mut unmatched_detections_mask = vec![true; num_dets];

    match lapjv::lapjv(&padded) {
        Ok((row_to_col, _)) => {
            for (track_idx, &det_idx) in row_to_col.iter().enumerate() {
                if track_idx >= num_tracks {
                    continue;
                }
                if det_idx >= num_dets {
                    unmatched_tracks.push(track_idx);
                } else if cost[[track_idx, det_idx]] < distance_threshold {
                    matches.push((track_idx, det_idx));
                    unmatched_detections_mask[det_idx] = false;
                } else {
                    unmatched_tracks.push(track_idx);
                }
            }
        }
        Err(_) => {
            unmatched_tracks = (0..num_tracks).collect();
        }
    }

    let unmatched_detections = unmatched_detections_mask
        .iter()
        .enumerate()
        .filter_map(|(i, &unmatched)| unmatched.then_some(i))
        .collect();

    AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections,
    }
}
