//! Pure competence-update rules. No I/O; the engine owns all persistence.

use super::types::{CompetenceMap, Tier};

/// Competence assumed for a skill that has never been probed.
pub const UNSEEN_COMPETENCE: f64 = 0.5;

const CORRECT_ADJUSTMENT: [f64; 3] = [0.10, 0.15, 0.20];
const INCORRECT_ADJUSTMENT: f64 = -0.20;

/// Applies one answer outcome to the competence map and derives the next
/// difficulty tier.
///
/// The adjustment for a correct answer grows with the difficulty of the
/// question that was answered; a miss costs a flat 0.20 regardless of tier.
/// The resulting value is clamped to [0, 1] before being written back.
///
/// The next tier is governed by the minimum competence across every tracked
/// skill, not the skill that was just updated: a learner cannot mask a weak
/// area by performing well elsewhere.
pub fn update(
    map: &CompetenceMap,
    skill: &str,
    difficulty: Tier,
    is_correct: bool,
) -> (CompetenceMap, Tier) {
    let current = map.get(skill).copied().unwrap_or(UNSEEN_COMPETENCE);
    let adjustment = if is_correct {
        CORRECT_ADJUSTMENT[difficulty.index()]
    } else {
        INCORRECT_ADJUSTMENT
    };

    let mut updated = map.clone();
    updated.insert(skill.to_string(), (current + adjustment).clamp(0.0, 1.0));

    let next = next_tier(&updated);
    (updated, next)
}

/// Worst-skill-governs difficulty policy. An empty map defaults to easy.
pub fn next_tier(map: &CompetenceMap) -> Tier {
    let Some(min) = map.values().copied().fold(None, |acc: Option<f64>, v| {
        Some(acc.map_or(v, |m| m.min(v)))
    }) else {
        return Tier::Easy;
    };

    if min < 0.4 {
        Tier::Easy
    } else if min < 0.75 {
        Tier::Medium
    } else {
        Tier::Hard
    }
}

/// Points awarded for a correct answer at the tier the question was asked at.
pub fn score_increment(difficulty: Tier) -> i64 {
    10 * (1 + difficulty.index() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, f64)]) -> CompetenceMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn unseen_skill_reads_as_half() {
        let (updated, _) = update(&CompetenceMap::new(), "algebra", Tier::Easy, true);
        assert_eq!(updated["algebra"], 0.6);
    }

    #[test]
    fn correct_adjustment_scales_with_tier() {
        let start = map(&[("s", 0.5)]);
        let (easy, _) = update(&start, "s", Tier::Easy, true);
        let (medium, _) = update(&start, "s", Tier::Medium, true);
        let (hard, _) = update(&start, "s", Tier::Hard, true);
        assert_eq!(easy["s"], 0.6);
        assert_eq!(medium["s"], 0.65);
        assert_eq!(hard["s"], 0.7);
    }

    #[test]
    fn incorrect_adjustment_is_flat() {
        let start = map(&[("s", 0.5)]);
        for tier in [Tier::Easy, Tier::Medium, Tier::Hard] {
            let (updated, _) = update(&start, "s", tier, false);
            assert!((updated["s"] - 0.3).abs() < 1e-9);
        }
    }

    #[test]
    fn clamps_at_both_ends() {
        let (high, _) = update(&map(&[("s", 0.95)]), "s", Tier::Hard, true);
        assert_eq!(high["s"], 1.0);

        let (low, _) = update(&map(&[("s", 0.1)]), "s", Tier::Easy, false);
        assert_eq!(low["s"], 0.0);
    }

    #[test]
    fn minimum_competence_governs_tier() {
        // Skill A is strong, but weak skill B keeps the session at easy even
        // after another correct answer on A.
        let start = map(&[("A", 0.9), ("B", 0.3)]);
        let (_, next) = update(&start, "A", Tier::Hard, true);
        assert_eq!(next, Tier::Easy);
    }

    #[test]
    fn tier_thresholds() {
        assert_eq!(next_tier(&map(&[("s", 0.39)])), Tier::Easy);
        assert_eq!(next_tier(&map(&[("s", 0.4)])), Tier::Medium);
        assert_eq!(next_tier(&map(&[("s", 0.74)])), Tier::Medium);
        assert_eq!(next_tier(&map(&[("s", 0.75)])), Tier::Hard);
    }

    #[test]
    fn empty_map_defaults_to_easy() {
        assert_eq!(next_tier(&CompetenceMap::new()), Tier::Easy);
    }

    #[test]
    fn score_increments_by_tier() {
        assert_eq!(score_increment(Tier::Easy), 10);
        assert_eq!(score_increment(Tier::Medium), 20);
        assert_eq!(score_increment(Tier::Hard), 30);
    }
}
