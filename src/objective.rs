//! The objective function the optimizer drives: load a batch of clips once,
//! then score any `TrackerSettings` against all of them.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::evaluation::{evaluate, FrameMap as EvalFrameMap, ReferenceObservation, TrackObservation};
use crate::geometry::Point3;
use crate::io::{DetectionRecord, FrameMap as WireFrameMap, ReferenceRecord};
use crate::tracker::{Tracker, TrackerSettings};

/// One clip's eagerly-loaded detections and references, ready to be fed
/// through a fresh `Tracker` for any candidate `TrackerSettings`.
struct Clip {
    id: String,
    detections: WireFrameMap<DetectionRecord>,
    references: WireFrameMap<ReferenceRecord>,
}

/// A batch of clips an optimizer scores `TrackerSettings` against.
pub struct Objective {
    clips: Vec<Clip>,
}

impl Objective {
    /// Eager-load every `(references_dir/id.json, detections_dir/id.json)`
    /// pair named in `clip_ids`. A clip missing either file is skipped with
    /// a warning, not an error — mirrors the original loader's silent skip
    /// of nonexistent files so a partially-prepared data directory doesn't
    /// abort the whole run.
    pub fn from_paths(
        references_dir: &Path,
        detections_dir: &Path,
        clip_ids: &[String],
    ) -> Result<Self> {
        let mut clips = Vec::with_capacity(clip_ids.len());

        for id in clip_ids {
            let ref_path = references_dir.join(format!("{id}.json"));
            let det_path = detections_dir.join(format!("{id}.json"));

            if !ref_path.exists() || !det_path.exists() {
                log::warn!("skipping clip {id}: missing references or detections file");
                continue;
            }

            let references = load_frame_map(&ref_path)?;
            let detections = load_frame_map(&det_path)?;
            clips.push(Clip { id: id.clone(), detections, references });
        }

        if clips.is_empty() {
            return Err(Error::malformed("no clips loaded: every clip id was missing its references or detections file"));
        }

        Ok(Self { clips })
    }

    /// Build an objective directly from already-loaded clips, bypassing the
    /// filesystem entirely — the path any in-process caller (tests, or an
    /// embedding application with its own data layout) should use.
    pub fn from_clips(clips: Vec<(String, WireFrameMap<DetectionRecord>, WireFrameMap<ReferenceRecord>)>) -> Self {
        Self {
            clips: clips
                .into_iter()
                .map(|(id, detections, references)| Clip { id, detections, references })
                .collect(),
        }
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// Run every clip through a fresh `Tracker` built from `settings`,
    /// evaluate against that clip's references, and return the mean loss.
    /// A clip that raises `NumericInstability` or `EmptyReferences`
    /// contributes `f64::INFINITY` rather than aborting the trial.
    pub fn objective(&self, settings: &TrackerSettings) -> f64 {
        if self.clips.is_empty() {
            return f64::INFINITY;
        }

        let mut total = 0.0;
        for clip in &self.clips {
            total += self.score_clip(clip, settings);
        }
        total / self.clips.len() as f64
    }

    fn score_clip(&self, clip: &Clip, settings: &TrackerSettings) -> f64 {
        match run_clip(clip, settings) {
            Ok(loss) => loss,
            Err(err @ (Error::NumericInstability { .. } | Error::EmptyReferences)) => {
                log::warn!("clip {} contributed +inf to the trial: {err}", clip.id);
                f64::INFINITY
            }
            Err(err) => {
                log::warn!("clip {} failed to score: {err}", clip.id);
                f64::INFINITY
            }
        }
    }
}

fn run_clip(clip: &Clip, settings: &TrackerSettings) -> Result<f64> {
    let mut tracker = Tracker::new(*settings);
    let mut tracked: EvalFrameMap<TrackObservation> = EvalFrameMap::new();

    let last_frame = clip.detections.keys().chain(clip.references.keys()).max().copied().unwrap_or(0);
    let empty_payload = crate::io::FramePayload::default();

    for frame in 0..=last_frame {
        let payload = clip.detections.get(&frame).unwrap_or(&empty_payload);
        let detections: Vec<Point3> = payload
            .tracks
            .iter()
            .map(|d| Point3::new(d.x, d.y, d.z))
            .collect();
        for p in &detections {
            if !p.is_finite() {
                return Err(Error::malformed(format!("non-finite detection in clip {}", clip.id)));
            }
        }

        let confirmed = tracker.update_tracks(&detections)?;
        let observations: Vec<TrackObservation> = confirmed
            .iter()
            .map(|t| TrackObservation { id: t.id, position: t.position })
            .collect();
        tracked.insert(frame, observations);
    }

    let references: EvalFrameMap<ReferenceObservation> = clip
        .references
        .iter()
        .map(|(&frame, payload)| {
            let obs: Vec<ReferenceObservation> = payload
                .tracks
                .iter()
                .map(|r| ReferenceObservation { id: r.id, position: Point3::new(r.x, r.y, r.z) })
                .collect();
            (frame, obs)
        })
        .collect();

    let (_stats, loss) = evaluate(&references, &tracked)?;
    Ok(loss)
}

fn load_frame_map<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<WireFrameMap<T>> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::FramePayload;

    fn settings() -> TrackerSettings {
        TrackerSettings::new(0.1, 0.01, 1.0, 2.0, 3, 1, 5).unwrap()
    }

    #[test]
    fn test_objective_scores_a_single_in_memory_clip() {
        let mut detections = WireFrameMap::new();
        let mut references = WireFrameMap::new();
        for f in 0..5u32 {
            detections.insert(
                f,
                FramePayload { tracks: vec![DetectionRecord { id: None, x: 0.0, y: 0.0, z: 0.0 }] },
            );
            references.insert(
                f,
                FramePayload { tracks: vec![ReferenceRecord { id: 1, x: 0.0, y: 0.0, z: 0.0 }] },
            );
        }

        let objective = Objective::from_clips(vec![("clip-0".to_string(), detections, references)]);
        let loss = objective.objective(&settings());
        assert!(loss.is_finite());
    }

    #[test]
    fn test_empty_batch_is_infinite_loss() {
        let objective = Objective::from_clips(vec![]);
        assert_eq!(objective.objective(&settings()), f64::INFINITY);
    }

    #[test]
    fn test_clip_with_no_references_contributes_infinity() {
        let mut detections = WireFrameMap::new();
        detections.insert(0, FramePayload { tracks: vec![DetectionRecord { id: None, x: 0.0, y: 0.0, z: 0.0 }] });
        let references = WireFrameMap::new();

        let objective = Objective::from_clips(vec![("clip-0".to_string(), detections, references)]);
        assert_eq!(objective.objective(&settings()), f64::INFINITY);
    }
}
