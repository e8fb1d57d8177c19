use chrono::NaiveDate;
use serde::Serialize;

use crate::metrics::STREAK_UPDATES_TOTAL;
use crate::utils::time::{days_between, today_utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakOutcome {
    /// No prior date and no persisted streak; counting begins at 1.
    Started,
    Extended,
    Unchanged,
    Reset,
    /// Completion dated after today; nothing changed.
    Rejected,
}

impl StreakOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreakOutcome::Started => "started",
            StreakOutcome::Extended => "extended",
            StreakOutcome::Unchanged => "unchanged",
            StreakOutcome::Reset => "reset",
            StreakOutcome::Rejected => "rejected",
        }
    }
}

/// Consecutive-day counter. Does not persist anything; the caller reads and
/// writes `streak` and `last_task_date` together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreakCalculator {
    last_completed_date: Option<NaiveDate>,
    current_streak: u32,
}

impl StreakCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize_from_database(last_completed_date: Option<NaiveDate>, streak: u32) -> Self {
        Self {
            last_completed_date,
            current_streak: streak,
        }
    }

    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    pub fn last_completed_date(&self) -> Option<NaiveDate> {
        self.last_completed_date
    }

    pub fn reset(&mut self) {
        self.last_completed_date = None;
        self.current_streak = 0;
    }

    pub fn update_streak(&mut self, completion: NaiveDate, persisted_streak: u32) -> StreakOutcome {
        self.update_streak_on(completion, persisted_streak, today_utc())
    }

    pub fn update_streak_on(
        &mut self,
        completion: NaiveDate,
        persisted_streak: u32,
        today: NaiveDate,
    ) -> StreakOutcome {
        if completion > today {
            tracing::warn!(
                "Ignoring future-dated completion {} (today is {})",
                completion,
                today
            );
            return self.record(StreakOutcome::Rejected);
        }

        let mut streak = persisted_streak;
        let outcome = match self.last_completed_date {
            // A persisted streak without a date counts this completion as the next day.
            None if streak > 0 => {
                streak += 1;
                StreakOutcome::Extended
            }
            None => {
                streak = 1;
                StreakOutcome::Started
            }
            Some(last) => match days_between(last, completion) {
                0 => StreakOutcome::Unchanged,
                1 => {
                    streak += 1;
                    StreakOutcome::Extended
                }
                _ => {
                    streak = 1;
                    StreakOutcome::Reset
                }
            },
        };

        self.current_streak = streak;
        self.last_completed_date = Some(completion);

        tracing::debug!(
            "Streak {} to {} on {}",
            outcome.as_str(),
            streak,
            completion
        );
        self.record(outcome)
    }

    fn record(&self, outcome: StreakOutcome) -> StreakOutcome {
        STREAK_UPDATES_TOTAL
            .with_label_values(&[outcome.as_str()])
            .inc();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn first_completion_starts_at_one() {
        let mut calc = StreakCalculator::initialize_from_database(None, 0);
        let outcome = calc.update_streak_on(day(10), 0, day(10));
        assert_eq!(outcome, StreakOutcome::Started);
        assert_eq!(calc.current_streak(), 1);
        assert_eq!(calc.last_completed_date(), Some(day(10)));
    }

    #[test]
    fn consecutive_day_extends() {
        let mut calc = StreakCalculator::initialize_from_database(Some(day(10)), 5);
        calc.update_streak_on(day(11), 5, day(11));
        assert_eq!(calc.current_streak(), 6);
        assert_eq!(calc.last_completed_date(), Some(day(11)));
    }

    #[test]
    fn gap_resets_to_one() {
        let mut calc = StreakCalculator::initialize_from_database(Some(day(10)), 5);
        assert_eq!(calc.update_streak_on(day(13), 5, day(13)), StreakOutcome::Reset);
        assert_eq!(calc.current_streak(), 1);
    }

    #[test]
    fn same_day_twice_does_not_double_count() {
        let mut calc = StreakCalculator::new();
        calc.update_streak_on(day(10), 0, day(10));
        let after_first = calc.current_streak();
        assert_eq!(
            calc.update_streak_on(day(10), after_first, day(10)),
            StreakOutcome::Unchanged
        );
        assert_eq!(calc.current_streak(), after_first);
    }

    #[test]
    fn out_of_order_date_resets_and_moves_date_back() {
        let mut calc = StreakCalculator::initialize_from_database(Some(day(10)), 4);
        assert_eq!(calc.update_streak_on(day(8), 4, day(10)), StreakOutcome::Reset);
        assert_eq!(calc.current_streak(), 1);
        assert_eq!(calc.last_completed_date(), Some(day(8)));
    }

    #[test]
    fn future_completion_is_ignored() {
        let mut calc = StreakCalculator::initialize_from_database(Some(day(10)), 2);
        assert_eq!(
            calc.update_streak_on(day(12), 2, day(11)),
            StreakOutcome::Rejected
        );
        assert_eq!(calc.current_streak(), 2);
        assert_eq!(calc.last_completed_date(), Some(day(10)));
    }

    #[test]
    fn persisted_streak_without_date_is_incremented() {
        let mut calc = StreakCalculator::new();
        calc.update_streak_on(day(10), 3, day(10));
        assert_eq!(calc.current_streak(), 4);
    }

    #[test]
    fn reset_clears_both_fields() {
        let mut calc = StreakCalculator::initialize_from_database(Some(day(1)), 9);
        calc.reset();
        assert_eq!(calc, StreakCalculator::new());
    }
}
