//! Gated many-to-many matching between tracks and ground-truth references,
//! and the scalar loss the optimizer minimizes.

mod statistics;

use std::collections::BTreeMap;

pub use statistics::{ReferenceStats, Statistics, TrackStats, ALPHA, BETA, GAMMA};

use crate::error::{Error, Result};
use crate::geometry::Point3;

/// Hard-coded match radius: a track and a reference are considered the same
/// object in a frame when within this distance of each other.
pub const MATCH_RADIUS: f64 = 4.0;

/// One reference (ground-truth) position observed in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceObservation {
    pub id: i64,
    pub position: Point3,
}

/// One emitted-track position observed in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackObservation {
    pub id: u64,
    pub position: Point3,
}

/// Observations keyed by frame index, sorted ascending.
pub type FrameMap<T> = BTreeMap<u32, Vec<T>>;

/// Evaluate one clip's tracked output against its references, producing the
/// full per-reference / per-track breakdown.
///
/// For each frame, every (reference, track) pair within [`MATCH_RADIUS`] is
/// recorded as a match — many-to-many, with no mutual-exclusivity
/// enforcement: a track can match several references in the same frame, and
/// a reference can match several tracks. A track present in a frame but
/// matched to no reference counts as one false positive for that frame;
/// this per-frame accounting, not a whole-clip count, is the pinned
/// false-positive definition.
pub fn evaluate(
    references: &FrameMap<ReferenceObservation>,
    tracked: &FrameMap<TrackObservation>,
) -> Result<(Statistics, f64)> {
    if references.values().all(|frame| frame.is_empty()) {
        return Err(Error::EmptyReferences);
    }

    let mut stats = Statistics::default();
    let empty: Vec<TrackObservation> = Vec::new();

    for (frame_idx, refs) in references {
        let frame_tracks = tracked.get(frame_idx).unwrap_or(&empty);
        let mut matched_this_frame = std::collections::HashSet::new();

        for reference in refs {
            let ref_stats = stats.annotation_stats.entry(reference.id).or_default();
            ref_stats.lifespan += 1;

            for track in frame_tracks {
                if reference.position.distance(&track.position) > MATCH_RADIUS {
                    continue;
                }

                ref_stats.tracked += 1;
                ref_stats.associated_track_ids.insert(track.id);
                *ref_stats.track_id_count.entry(track.id).or_insert(0) += 1;
                if ref_stats.last_track_id != Some(track.id) {
                    ref_stats.id_switches += 1;
                }
                ref_stats.last_track_id = Some(track.id);

                let track_stats = stats.track_stats.entry(track.id).or_default();
                track_stats.lifespan += 1;
                track_stats.tracked += 1;
                track_stats.associated_obj_ids.insert(reference.id);

                matched_this_frame.insert(track.id);
            }
        }

        let unmatched_in_frame = frame_tracks
            .iter()
            .filter(|t| !matched_this_frame.contains(&t.id))
            .count();
        stats.false_positives += unmatched_in_frame as u64;
    }

    stats.finalize();
    let loss = stats.loss().expect("non-empty references guarantee a defined loss");
    Ok((stats, loss))
}
