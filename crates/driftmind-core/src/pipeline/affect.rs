//! Affect subsystem (C8): two-dimensional mood, updated by exponential
//! smoothing from session events.

use crate::config::AffectConfig;
use crate::error::Result;
use crate::model::{AffectEventKind, Mood};
use crate::storage::Storage;

/// `(valence_target, arousal_target)` nudge for each event kind, scaled by
/// `config.small_delta`.
fn targets(kind: AffectEventKind, config: &AffectConfig) -> (f64, f64) {
    match kind {
        AffectEventKind::GoalProgress => (config.small_delta, config.small_delta),
        AffectEventKind::SearchFailure => (-config.small_delta, config.small_delta),
        AffectEventKind::MemoryStored => (config.small_delta, 0.0),
    }
}

/// `v' = clamp(v + beta * (target - v), bounds)`, applied per event.
pub fn apply_event(mood: Mood, kind: AffectEventKind, config: &AffectConfig) -> Mood {
    let (valence_delta, arousal_delta) = targets(kind, config);
    let valence_target = (mood.valence + valence_delta).clamp(-1.0, 1.0);
    let arousal_target = (mood.arousal + arousal_delta).clamp(0.0, 1.0);

    let new_valence = (mood.valence + config.smoothing_beta * (valence_target - mood.valence)).clamp(-1.0, 1.0);
    let new_arousal = (mood.arousal + config.smoothing_beta * (arousal_target - mood.arousal)).clamp(0.0, 1.0);

    Mood {
        valence: new_valence,
        arousal: new_arousal,
    }
}

/// Processes `events` against the persisted mood and saves the result.
pub fn process_events(storage: &Storage, events: &[AffectEventKind], config: &AffectConfig) -> Result<Mood> {
    let mut mood = storage.get_mood()?;
    for kind in events {
        mood = apply_event(mood, *kind, config);
    }
    storage.set_mood(mood)?;
    Ok(mood)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_dimensions_stay_within_bounds_after_many_events() {
        let config = AffectConfig::default();
        let mut mood = Mood::default();
        for _ in 0..1000 {
            mood = apply_event(mood, AffectEventKind::GoalProgress, &config);
        }
        assert!(mood.valence <= 1.0 && mood.valence >= -1.0);
        assert!(mood.arousal <= 1.0 && mood.arousal >= 0.0);
    }

    #[test]
    fn search_failure_lowers_valence_raises_arousal() {
        let config = AffectConfig::default();
        let mood = Mood { valence: 0.0, arousal: 0.2 };
        let next = apply_event(mood, AffectEventKind::SearchFailure, &config);
        assert!(next.valence < mood.valence);
        assert!(next.arousal > mood.arousal);
    }
}
