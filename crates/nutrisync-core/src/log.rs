//! Daily log operations.
//!
//! These never mutate their inputs; each returns a new value that the
//! state store swaps in whole.

use chrono::NaiveDate;

use crate::model::{AppState, DailyLog, ExerciseEntry, FoodEntry, LogBook};

/// Look up the log for an exact date.
pub fn find_log_for_date(state: &AppState, date: NaiveDate) -> Option<&DailyLog> {
    state.logs.get(date)
}

/// Append a food entry, creating an empty log for `date` if there is none.
///
/// Existing entries keep their order; the new one goes last.
pub fn append_food(log: Option<&DailyLog>, date: NaiveDate, food: FoodEntry) -> DailyLog {
    let mut updated = log.cloned().unwrap_or_else(|| DailyLog::empty(date));
    updated.food.push(food);
    updated
}

/// Append an exercise session, creating an empty log for `date` if needed.
pub fn append_exercise(
    log: Option<&DailyLog>,
    date: NaiveDate,
    exercise: ExerciseEntry,
) -> DailyLog {
    let mut updated = log.cloned().unwrap_or_else(|| DailyLog::empty(date));
    updated.exercise.push(exercise);
    updated
}

/// Replace the whole log set.
pub fn replace_logs(state: &AppState, new_logs: Vec<DailyLog>) -> AppState {
    AppState {
        profile: state.profile.clone(),
        logs: LogBook::from(new_logs),
    }
}

/// Upsert the given logs by date, leaving other dates untouched.
pub fn merge_logs(state: &AppState, logs: &[DailyLog]) -> AppState {
    let mut merged = state.clone();
    for log in logs {
        merged.logs.upsert(log.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Profile;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, day).unwrap()
    }

    fn entry(id: &str) -> FoodEntry {
        FoodEntry {
            id: id.to_string(),
            name: id.to_uppercase(),
            calories: 10.0,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
            fiber: 0.0,
            calcium: 0.0,
            iron: 0.0,
            timestamp: 0,
        }
    }

    fn ids(log: &DailyLog) -> Vec<&str> {
        log.food.iter().map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn test_append_food_creates_missing_log() {
        let log = append_food(None, date(1), entry("a"));
        assert_eq!(log.date, date(1));
        assert_eq!(ids(&log), vec!["a"]);
        assert!(log.exercise.is_empty());
        assert_eq!(log.hydration, 0.0);
    }

    #[test]
    fn test_append_food_preserves_order_and_input() {
        let base = append_food(None, date(1), entry("x"));
        let with_a = append_food(Some(&base), date(1), entry("a"));
        let with_b = append_food(Some(&with_a), date(1), entry("b"));

        assert_eq!(ids(&with_b), vec!["x", "a", "b"]);
        assert_eq!(ids(&base), vec!["x"]);
        assert_eq!(ids(&with_a), vec!["x", "a"]);
    }

    #[test]
    fn test_append_food_keeps_day_scalars() {
        let base = DailyLog::empty(date(2)).with_hydration(750.0).with_sleep_hours(7.5);
        let updated = append_food(Some(&base), date(2), entry("a"));
        assert_eq!(updated.hydration, 750.0);
        assert_eq!(updated.sleep_hours, 7.5);
    }

    #[test]
    fn test_find_log_for_date() {
        let state = replace_logs(
            &AppState::default(),
            vec![DailyLog::empty(date(1)), DailyLog::empty(date(3))],
        );
        assert!(find_log_for_date(&state, date(1)).is_some());
        assert!(find_log_for_date(&state, date(2)).is_none());
    }

    #[test]
    fn test_merge_logs_leaves_other_dates() {
        let state = AppState::new(
            Profile::default(),
            vec![
                DailyLog::empty(date(1)).with_hydration(100.0),
                DailyLog::empty(date(2)).with_hydration(200.0),
            ]
            .into(),
        );
        let merged = merge_logs(&state, &[DailyLog::empty(date(2)).with_hydration(999.0)]);

        assert_eq!(merged.logs.len(), 2);
        assert_eq!(merged.logs.get(date(1)).unwrap().hydration, 100.0);
        assert_eq!(merged.logs.get(date(2)).unwrap().hydration, 999.0);
        // input untouched
        assert_eq!(state.logs.get(date(2)).unwrap().hydration, 200.0);
    }

    #[test]
    fn test_replace_logs_drops_unlisted_dates() {
        let state = AppState::new(Profile::default(), vec![DailyLog::empty(date(1))].into());
        let replaced = replace_logs(&state, vec![DailyLog::empty(date(5))]);
        assert_eq!(replaced.logs.dates().collect::<Vec<_>>(), vec![date(5)]);
        assert_eq!(replaced.profile, state.profile);
    }
}
