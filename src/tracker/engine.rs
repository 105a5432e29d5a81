//! Per-frame tracker: predict → associate → update → birth/death/promote.

use crate::error::Result;
use crate::geometry::Point3;

use super::kalman::{KalmanTrack, TrackStage, TrackerSettings};
use super::matching::{associate, cost_matrix};

/// A confirmed track's published state for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfirmedTrack {
    pub id: u64,
    pub position: Point3,
    pub velocity: Point3,
    pub acceleration: Point3,
}

/// Holds the live tracks for one clip and runs the per-frame state machine.
pub struct Tracker {
    tracks: Vec<KalmanTrack>,
    next_id: u64,
    settings: TrackerSettings,
}

impl Tracker {
    pub fn new(settings: TrackerSettings) -> Self {
        Self {
            tracks: Vec::new(),
            next_id: 0,
            settings,
        }
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub fn live_tracks(&self) -> &[KalmanTrack] {
        &self.tracks
    }

    /// Run one frame of detections through the full lifecycle and return the
    /// tracks that are `Confirmed` after this frame.
    pub fn update_tracks(&mut self, detections: &[Point3]) -> Result<Vec<ConfirmedTrack>> {
        // 1. Predict.
        for track in &mut self.tracks {
            track.predict()?;
        }

        // 2. Associate.
        let predicted_positions: Vec<Point3> = self.tracks.iter().map(|t| t.position()).collect();
        let cost = cost_matrix(&predicted_positions, detections);
        let result = associate(&cost, self.settings.distance_threshold);

        // 3. Update.
        for &(track_idx, det_idx) in &result.matches {
            self.tracks[track_idx].update(detections[det_idx])?;
        }

        // 4. Birth.
        for &det_idx in &result.unmatched_detections {
            let track = KalmanTrack::new(self.next_id, detections[det_idx], &self.settings);
            log::debug!("new track {}", self.next_id);
            self.tracks.push(track);
            self.next_id += 1;
        }

        // 5. Miss bookkeeping.
        for &track_idx in &result.unmatched_tracks {
            self.tracks[track_idx].time_since_update += 1;
        }

        // 6. Death — iterate by descending index to keep indices stable.
        for i in (0..self.tracks.len()).rev() {
            let track = &self.tracks[i];
            if track.time_since_update > self.settings.max_age
                || track.consecutive_misses > self.settings.max_consecutive_misses
            {
                log::debug!(
                    "track {} removed after time_since_update={} consecutive_misses={}",
                    track.id,
                    track.time_since_update,
                    track.consecutive_misses
                );
                self.tracks.remove(i);
            }
        }

        // 7. Promote.
        for track in &mut self.tracks {
            track.promote_if_eligible(self.settings.min_hits);
        }

        // 8. Streak reset.
        for track in &mut self.tracks {
            if track.time_since_update > 1 {
                track.hit_streak = 0;
            }
        }

        Ok(self
            .tracks
            .iter()
            .filter(|t| t.stage == TrackStage::Confirmed)
            .map(|t| ConfirmedTrack {
                id: t.id,
                position: t.smoothed_position(),
                velocity: t.velocity(),
                acceleration: t.acceleration(),
            })
            .collect())
    }
}
