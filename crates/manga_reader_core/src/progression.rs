//! crates/manga_reader_core/src/progression.rs
//!
//! Experience, level and score progression awarded for publishing content.

/// Experience a brand new account needs to reach level 2.
pub const STARTING_THRESHOLD: u64 = 100;

/// A user's gamification record.
///
/// Invariant: `experience < experience_to_next_level` after every award.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserProgression {
    pub experience: u64,
    pub level: u64,
    pub experience_to_next_level: u64,
    pub score: u64,
}

impl Default for UserProgression {
    fn default() -> Self {
        Self {
            experience: 0,
            level: 1,
            experience_to_next_level: STARTING_THRESHOLD,
            score: 0,
        }
    }
}

/// Content-creation events that earn experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwardKind {
    ChapterPublished,
    WorkPublished,
}

impl AwardKind {
    pub fn award(&self) -> Award {
        match self {
            AwardKind::ChapterPublished => Award {
                experience: 50,
                level_up_bonus: 25,
            },
            AwardKind::WorkPublished => Award {
                experience: 100,
                level_up_bonus: 50,
            },
        }
    }
}

/// Experience granted by one event, and the score granted per level it unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Award {
    pub experience: u64,
    pub level_up_bonus: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AwardOutcome {
    pub progression: UserProgression,
    pub levels_gained: u64,
}

impl UserProgression {
    /// Applies `award` and returns the new record.
    ///
    /// Crossing the threshold levels up, carries the remainder over, raises the threshold
    /// by half and adds the bonus to the score. This repeats until the remainder fits
    /// under the threshold, so a large award can grant several levels at once.
    pub fn award(&self, award: Award) -> AwardOutcome {
        let mut next = UserProgression {
            experience_to_next_level: self.experience_to_next_level.max(1),
            ..*self
        };
        next.experience = next.experience.saturating_add(award.experience);

        let mut levels_gained = 0;
        while next.experience >= next.experience_to_next_level {
            next.experience -= next.experience_to_next_level;
            next.level = next.level.saturating_add(1);
            next.score = next.score.saturating_add(award.level_up_bonus);
            next.experience_to_next_level = raised_threshold(next.experience_to_next_level);
            levels_gained += 1;
        }

        AwardOutcome {
            progression: next,
            levels_gained,
        }
    }

    /// Share of the way to the next level, from 0 to 100.
    pub fn percent_to_next_level(&self) -> f64 {
        if self.experience_to_next_level == 0 {
            return 0.0;
        }
        (self.experience as f64 / self.experience_to_next_level as f64 * 100.0).min(100.0)
    }
}

// floor(threshold * 1.5), strictly growing so the level-up loop terminates.
fn raised_threshold(threshold: u64) -> u64 {
    let raised = threshold.saturating_add(threshold / 2);
    raised.max(threshold.saturating_add(1))
}
