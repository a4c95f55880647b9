use crate::models::{DayType, DisplayState, ResolvedSchedule, ResolvedTask, Routine, RoutineTask, TaskLog};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use std::collections::HashSet;

pub fn day_type_for(date: NaiveDate) -> DayType {
    match date.weekday() {
        Weekday::Sat | Weekday::Sun => DayType::Weekend,
        _ => DayType::Weekday,
    }
}

/// Ids of tasks with any log on `date`. Skipped counts as done.
pub fn completed_ids(logs: &[TaskLog], date: NaiveDate) -> HashSet<u64> {
    logs.iter()
        .filter(|log| log.date == date)
        .map(|log| log.task_id)
        .collect()
}

pub fn resolve(routines: &[Routine], logs: &[TaskLog], now: NaiveDateTime) -> ResolvedSchedule {
    let done = completed_ids(logs, now.date());
    resolve_with(routines, &done, now)
}

/// Picks the two earliest incomplete tasks among the routines that run today.
///
/// Ties on time-of-day keep routine order, then task order, because the sort
/// is stable over the flattened list.
pub fn resolve_with(routines: &[Routine], done: &HashSet<u64>, now: NaiveDateTime) -> ResolvedSchedule {
    let day_type = day_type_for(now.date());

    let mut entries: Vec<(&RoutineTask, &Routine)> = routines
        .iter()
        .filter(|routine| routine.routine_type.applies_to(day_type))
        .flat_map(|routine| routine.tasks.iter().map(move |task| (task, routine)))
        .collect();
    entries.sort_by(|a, b| a.0.time.cmp(&b.0.time));

    let mut incomplete = entries.into_iter().filter(|(task, _)| !done.contains(&task.id));
    let current = incomplete.next();
    let next = incomplete.next();

    ResolvedSchedule {
        resolved_at: now,
        day_type,
        current: current.map(|(task, routine)| to_resolved(task, routine, false, now)),
        next: next.map(|(task, routine)| to_resolved(task, routine, true, now)),
    }
}

pub fn display_state(task_time: &str, is_next: bool, now: NaiveDateTime) -> DisplayState {
    if is_next {
        return DisplayState::Upcoming;
    }
    let now_hm = now.format("%H:%M").to_string();
    if task_time < now_hm.as_str() {
        DisplayState::Overdue
    } else {
        DisplayState::Normal
    }
}

fn to_resolved(task: &RoutineTask, routine: &Routine, is_next: bool, now: NaiveDateTime) -> ResolvedTask {
    ResolvedTask {
        task: task.clone(),
        routine_name: routine.name.clone(),
        routine_type: routine.routine_type,
        state: display_state(&task.time, is_next, now),
    }
}
