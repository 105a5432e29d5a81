//! Per-reference and per-track statistics accumulated by the evaluator.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Statistics for one ground-truth reference trajectory.
#[derive(Debug, Clone, Default)]
pub struct ReferenceStats {
    pub lifespan: u32,
    pub tracked: u32,
    pub id_switches: u32,
    pub last_track_id: Option<u64>,
    pub associated_track_ids: BTreeSet<u64>,
    pub track_id_count: HashMap<u64, u32>,
    pub tracked_percentage: f64,
    pub successfully_tracked: bool,
}

impl ReferenceStats {
    /// Dominant-track finalization: the track that explains the longest run
    /// of this reference's lifespan decides `tracked_percentage`.
    fn finalize(&mut self) {
        let longest = self.track_id_count.values().copied().max().unwrap_or(0);
        self.tracked_percentage = if self.lifespan > 0 {
            100.0 * longest as f64 / self.lifespan as f64
        } else {
            0.0
        };
        self.successfully_tracked = self.tracked_percentage >= 75.0;
    }
}

/// Statistics for one emitted track.
#[derive(Debug, Clone, Default)]
pub struct TrackStats {
    pub lifespan: u32,
    pub tracked: u32,
    pub associated_obj_ids: BTreeSet<i64>,
}

/// Per-loss-function constants from the scalar-loss formula (spec §4.C).
pub const ALPHA: f64 = -5.0;
pub const BETA: f64 = 10.0;
pub const GAMMA: f64 = 3.5;

/// Accumulated evaluation results for one clip.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub annotation_stats: HashMap<i64, ReferenceStats>,
    pub track_stats: HashMap<u64, TrackStats>,
    pub false_positives: u64,
}

impl Statistics {
    pub(crate) fn finalize(&mut self) {
        for stats in self.annotation_stats.values_mut() {
            stats.finalize();
        }
    }

    /// Mean tracked percentage, mean id switches, and false positives —
    /// the breakdown behind the single scalar loss.
    pub fn performance_multi_metric(&self) -> Option<(f64, f64, u64)> {
        if self.annotation_stats.is_empty() {
            return None;
        }
        let n = self.annotation_stats.len() as f64;
        let mean_tracked_percentage =
            self.annotation_stats.values().map(|s| s.tracked_percentage).sum::<f64>() / n;
        let mean_id_switches =
            self.annotation_stats.values().map(|s| s.id_switches as f64).sum::<f64>() / n;
        Some((mean_tracked_percentage, mean_id_switches, self.false_positives))
    }

    /// The scalar loss the optimizer minimizes: `None` iff no reference ever
    /// appeared (loss is undefined — caller raises `EmptyReferences`).
    pub fn loss(&self) -> Option<f64> {
        self.performance_multi_metric()
            .map(|(tracked_pct, id_switches, fp)| ALPHA * tracked_pct + BETA * id_switches + GAMMA * fp as f64)
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reference based statistics")?;
        let mut ref_ids: Vec<&i64> = self.annotation_stats.keys().collect();
        ref_ids.sort();
        for obj_id in ref_ids {
            let stats = &self.annotation_stats[obj_id];
            writeln!(
                f,
                "  ref {obj_id:>4}  lifespan={:<5} tracked={:<5} tracked%={:<7.2} id_switches={:<4} ok={:<5} tracks=[{}]",
                stats.lifespan,
                stats.tracked,
                stats.tracked_percentage,
                stats.id_switches,
                stats.successfully_tracked,
                stats
                    .associated_track_ids
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            )?;
        }

        writeln!(f, "Track based statistics")?;
        let mut track_ids: Vec<&u64> = self.track_stats.keys().collect();
        track_ids.sort();
        for track_id in track_ids {
            let stats = &self.track_stats[track_id];
            writeln!(
                f,
                "  track {track_id:>4}  lifespan={:<5} tracked={:<5} refs=[{}]",
                stats.lifespan,
                stats.tracked,
                stats
                    .associated_obj_ids
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            )?;
        }

        writeln!(f, "false_positives={}", self.false_positives)
    }
}
