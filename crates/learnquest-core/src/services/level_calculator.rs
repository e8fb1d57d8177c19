use serde::Serialize;

const BASE_REQUIREMENT: f64 = 100.0;
const GROWTH_FACTOR: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelProgress {
    pub level: u32,
    pub xp_into_level: u64,
    pub xp_required_for_level: u64,
}

impl LevelProgress {
    /// Progress through the current level as 0.0..1.0, for progress bars.
    pub fn fraction(&self) -> f64 {
        (self.xp_into_level as f64 / self.xp_required_for_level as f64).clamp(0.0, 1.0)
    }
}

/// Maps cumulative XP to a level. Level 1 needs 100 XP and every next level
/// needs 10% more than the previous one; requirements compound unrounded.
pub fn level_and_progress(xp: u64) -> LevelProgress {
    let xp_f = xp as f64;
    let mut level: u32 = 1;
    let mut running_total = 0.0_f64;
    let mut requirement = BASE_REQUIREMENT;

    while xp_f >= running_total + requirement {
        running_total += requirement;
        requirement *= GROWTH_FACTOR;
        level += 1;
    }

    LevelProgress {
        level,
        xp_into_level: (xp_f - running_total).max(0.0) as u64,
        xp_required_for_level: requirement.floor() as u64,
    }
}

/// Entry point for values read straight from the remote store.
pub fn level_and_progress_signed(xp: i64) -> LevelProgress {
    level_and_progress(xp.max(0) as u64)
}
