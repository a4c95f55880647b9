use crate::errors::AppError;
use crate::models::{
    AppData, Badge, CompletionStatus, NewRoutine, NewTask, Routine, RoutineTask, TaskLog, UserContext,
    is_valid_time,
};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use tracing::info;

pub fn list_routines(data: &AppData, ctx: UserContext) -> Vec<Routine> {
    let mut routines: Vec<Routine> = data
        .routines
        .iter()
        .filter(|routine| routine.user_id == ctx.user_id)
        .cloned()
        .collect();
    routines.sort_by_key(|routine| (routine.order_index, routine.id));
    routines
}

pub fn create_routine(
    data: &mut AppData,
    ctx: UserContext,
    payload: NewRoutine,
    now: NaiveDateTime,
) -> Result<Routine, AppError> {
    validate(&payload)?;

    let routine_id = next_routine_id(data);
    let mut task_id = next_task_id(data);
    let tasks = payload
        .tasks
        .into_iter()
        .map(|task| {
            let created = build_task(task_id, routine_id, task);
            task_id += 1;
            created
        })
        .collect();

    let routine = Routine {
        id: routine_id,
        user_id: ctx.user_id,
        name: payload.name.trim().to_string(),
        routine_type: payload.routine_type,
        order_index: payload.order_index,
        description: payload.description,
        tasks,
        current_streak: 0,
        longest_streak: 0,
        last_streak: 0,
        last_completed_date: None,
        created_at: now,
    };
    data.routines.push(routine.clone());

    info!(routine_id, user_id = ctx.user_id, "created routine");
    Ok(routine)
}

/// Replaces name, type and description. Tasks are matched by id: known ids are
/// edited in place, unknown or missing ids become new tasks, and tasks absent
/// from the payload are dropped together with their logs.
pub fn update_routine(
    data: &mut AppData,
    routine_id: u64,
    payload: NewRoutine,
) -> Result<Routine, AppError> {
    validate(&payload)?;

    let mut task_id = next_task_id(data);
    let routine = find_routine_mut(data, routine_id)?;

    routine.name = payload.name.trim().to_string();
    routine.routine_type = payload.routine_type;
    routine.description = payload.description;

    let existing: HashSet<u64> = routine.tasks.iter().map(|task| task.id).collect();
    let mut old_tasks = std::mem::take(&mut routine.tasks);
    let mut kept = HashSet::new();
    let mut tasks = Vec::with_capacity(payload.tasks.len());

    for task in payload.tasks {
        match task.id.filter(|id| existing.contains(id) && !kept.contains(id)) {
            Some(id) => {
                kept.insert(id);
                tasks.push(build_task(id, routine_id, task));
            }
            None => {
                tasks.push(build_task(task_id, routine_id, task));
                task_id += 1;
            }
        }
    }
    routine.tasks = tasks;
    old_tasks.retain(|task| !kept.contains(&task.id));
    let updated = routine.clone();

    let removed: HashSet<u64> = old_tasks.iter().map(|task| task.id).collect();
    data.logs.retain(|log| !removed.contains(&log.task_id));

    info!(routine_id, removed_tasks = removed.len(), "updated routine");
    Ok(updated)
}

pub fn delete_routine(data: &mut AppData, routine_id: u64) -> Result<Routine, AppError> {
    let index = data
        .routines
        .iter()
        .position(|routine| routine.id == routine_id)
        .ok_or_else(|| AppError::not_found("Routine not found"))?;
    let routine = data.routines.remove(index);

    let task_ids: HashSet<u64> = routine.tasks.iter().map(|task| task.id).collect();
    data.logs.retain(|log| !task_ids.contains(&log.task_id));

    info!(routine_id, "deleted routine");
    Ok(routine)
}

pub fn list_completions_for_date(data: &AppData, ctx: UserContext, date: NaiveDate) -> Vec<TaskLog> {
    let task_ids: HashSet<u64> = data
        .routines
        .iter()
        .filter(|routine| routine.user_id == ctx.user_id)
        .flat_map(|routine| routine.tasks.iter().map(|task| task.id))
        .collect();

    data.logs
        .iter()
        .filter(|log| log.date == date && task_ids.contains(&log.task_id))
        .cloned()
        .collect()
}

/// Upserts the log for `(task_id, date)` and then refreshes the owning
/// routine's streak.
pub fn record_completion(
    data: &mut AppData,
    task_id: u64,
    status: CompletionStatus,
    date: NaiveDate,
    now: NaiveDateTime,
) -> Result<TaskLog, AppError> {
    let routine_index = routine_index_for_task(data, task_id)?;

    let next_id = next_log_id(data);
    let previous = data
        .logs
        .iter()
        .position(|log| log.task_id == task_id && log.date == date);
    let log = match previous {
        Some(index) => {
            let existing = &mut data.logs[index];
            existing.status = status;
            existing.clone()
        }
        None => {
            let created = TaskLog {
                id: next_id,
                task_id,
                date,
                status,
                completed_at: now,
            };
            data.logs.push(created.clone());
            created
        }
    };

    let fully_completed = routine_completed_on(data, routine_index, date);
    let routine = &mut data.routines[routine_index];
    if fully_completed {
        advance_streak(routine, date);
    } else if routine.last_completed_date == Some(date) {
        // A completed log was flipped to skipped.
        revert_streak(routine, date);
    }

    info!(task_id, %date, ?status, streak = routine.current_streak, "recorded completion");
    Ok(log)
}

/// Returns false when there was no log for `(task_id, date)`.
pub fn remove_completion(data: &mut AppData, task_id: u64, date: NaiveDate) -> bool {
    let Some(index) = data
        .logs
        .iter()
        .position(|log| log.task_id == task_id && log.date == date)
    else {
        return false;
    };
    data.logs.remove(index);

    if let Ok(routine_index) = routine_index_for_task(data, task_id) {
        let routine = &mut data.routines[routine_index];
        if routine.last_completed_date == Some(date) {
            revert_streak(routine, date);
        }
    }

    info!(task_id, %date, "removed completion");
    true
}

/// Dates on which every task of the routine has a `completed` log.
pub fn routine_history(data: &AppData, routine_id: u64) -> Result<Vec<NaiveDate>, AppError> {
    let routine = find_routine(data, routine_id)?;
    if routine.tasks.is_empty() {
        return Ok(Vec::new());
    }

    let task_ids: HashSet<u64> = routine.tasks.iter().map(|task| task.id).collect();
    let mut dates: Vec<NaiveDate> = data
        .logs
        .iter()
        .filter(|log| task_ids.contains(&log.task_id))
        .map(|log| log.date)
        .collect::<HashSet<_>>()
        .into_iter()
        .filter(|date| completed_count(data, &task_ids, *date) >= task_ids.len())
        .collect();
    dates.sort();
    Ok(dates)
}

pub fn routine_logs(data: &AppData, routine_id: u64) -> Result<Vec<TaskLog>, AppError> {
    let routine = find_routine(data, routine_id)?;
    let task_ids: HashSet<u64> = routine.tasks.iter().map(|task| task.id).collect();
    Ok(data
        .logs
        .iter()
        .filter(|log| task_ids.contains(&log.task_id))
        .cloned()
        .collect())
}

const MILESTONES: [(u32, &str, &str); 10] = [
    (3, "3 Days", "\u{1F949}"),
    (7, "1 Week", "\u{1F948}"),
    (10, "10 Days", "\u{1F947}"),
    (14, "2 Weeks", "\u{1F397}\u{FE0F}"),
    (25, "25 Days", "\u{1F396}\u{FE0F}"),
    (50, "50 Days", "\u{1F31F}"),
    (100, "100 Days", "\u{1F4AF}"),
    (150, "150 Days", "\u{1F451}"),
    (200, "200 Days", "\u{1F48E}"),
    (365, "1 Year", "\u{1F3C6}"),
];

/// One badge per streak milestone, counting the user's routines that reached it.
pub fn badges(data: &AppData, ctx: UserContext) -> Vec<Badge> {
    let longest: Vec<u32> = data
        .routines
        .iter()
        .filter(|routine| routine.user_id == ctx.user_id)
        .map(|routine| routine.longest_streak)
        .collect();

    MILESTONES
        .iter()
        .map(|&(days, label, icon)| Badge {
            days,
            label: label.to_string(),
            icon: icon.to_string(),
            count: longest.iter().filter(|streak| **streak >= days).count(),
        })
        .collect()
}

fn advance_streak(routine: &mut Routine, date: NaiveDate) {
    match routine.last_completed_date {
        Some(last) if last == date => {}
        Some(last) if date.pred_opt() == Some(last) => {
            routine.current_streak += 1;
            routine.last_completed_date = Some(date);
        }
        _ => {
            if routine.current_streak > 0 {
                routine.last_streak = routine.current_streak;
            }
            routine.current_streak = 1;
            routine.last_completed_date = Some(date);
        }
    }
    routine.longest_streak = routine.longest_streak.max(routine.current_streak);
}

fn revert_streak(routine: &mut Routine, date: NaiveDate) {
    if routine.current_streak > 0 {
        if routine.current_streak == routine.longest_streak {
            routine.longest_streak -= 1;
        }
        routine.current_streak -= 1;
    }
    routine.last_completed_date = date.pred_opt();
}

fn routine_completed_on(data: &AppData, routine_index: usize, date: NaiveDate) -> bool {
    let task_ids: HashSet<u64> = data.routines[routine_index]
        .tasks
        .iter()
        .map(|task| task.id)
        .collect();
    !task_ids.is_empty() && completed_count(data, &task_ids, date) >= task_ids.len()
}

fn completed_count(data: &AppData, task_ids: &HashSet<u64>, date: NaiveDate) -> usize {
    data.logs
        .iter()
        .filter(|log| {
            log.date == date
                && log.status == CompletionStatus::Completed
                && task_ids.contains(&log.task_id)
        })
        .count()
}

fn validate(payload: &NewRoutine) -> Result<(), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("routine name must not be empty"));
    }
    for task in &payload.tasks {
        if task.name.trim().is_empty() {
            return Err(AppError::bad_request("task name must not be empty"));
        }
        if !is_valid_time(&task.time) {
            return Err(AppError::bad_request(format!(
                "task time '{}' must be HH:MM",
                task.time
            )));
        }
    }
    Ok(())
}

fn build_task(id: u64, routine_id: u64, task: NewTask) -> RoutineTask {
    RoutineTask {
        id,
        routine_id,
        name: task.name.trim().to_string(),
        time: task.time,
        description: task.description,
    }
}

fn find_routine(data: &AppData, routine_id: u64) -> Result<&Routine, AppError> {
    data.routines
        .iter()
        .find(|routine| routine.id == routine_id)
        .ok_or_else(|| AppError::not_found("Routine not found"))
}

fn find_routine_mut(data: &mut AppData, routine_id: u64) -> Result<&mut Routine, AppError> {
    data.routines
        .iter_mut()
        .find(|routine| routine.id == routine_id)
        .ok_or_else(|| AppError::not_found("Routine not found"))
}

fn routine_index_for_task(data: &AppData, task_id: u64) -> Result<usize, AppError> {
    data.routines
        .iter()
        .position(|routine| routine.tasks.iter().any(|task| task.id == task_id))
        .ok_or_else(|| AppError::not_found("Task not found"))
}

fn next_routine_id(data: &AppData) -> u64 {
    data.routines.iter().map(|routine| routine.id).max().unwrap_or(0) + 1
}

fn next_task_id(data: &AppData) -> u64 {
    data.routines
        .iter()
        .flat_map(|routine| routine.tasks.iter().map(|task| task.id))
        .max()
        .unwrap_or(0)
        + 1
}

fn next_log_id(data: &AppData) -> u64 {
    data.logs.iter().map(|log| log.id).max().unwrap_or(0) + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DayType;
    use axum::http::StatusCode;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn now() -> NaiveDateTime {
        day(5).and_hms_opt(6, 0, 0).unwrap()
    }

    fn new_task(id: Option<u64>, name: &str, time: &str) -> NewTask {
        NewTask {
            id,
            name: name.to_string(),
            time: time.to_string(),
            description: None,
        }
    }

    fn new_routine(name: &str, tasks: Vec<NewTask>) -> NewRoutine {
        NewRoutine {
            name: name.to_string(),
            routine_type: DayType::AllDays,
            order_index: 1,
            description: None,
            tasks,
        }
    }

    fn seeded() -> (AppData, Routine) {
        let mut data = AppData::default();
        let routine = create_routine(
            &mut data,
            UserContext::new(1),
            new_routine(
                "Morning",
                vec![new_task(None, "Wake", "06:00"), new_task(None, "Brush", "06:10")],
            ),
            now(),
        )
        .unwrap();
        (data, routine)
    }

    fn complete_all(data: &mut AppData, routine: &Routine, date: NaiveDate) {
        for task in &routine.tasks {
            record_completion(data, task.id, CompletionStatus::Completed, date, now()).unwrap();
        }
    }

    fn streak(data: &AppData) -> (u32, u32, u32) {
        let routine = &data.routines[0];
        (routine.current_streak, routine.longest_streak, routine.last_streak)
    }

    #[test]
    fn create_assigns_ids_and_filters_by_user() {
        let (mut data, routine) = seeded();
        assert_eq!(routine.id, 1);
        assert_eq!(routine.tasks.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2]);

        let other = create_routine(
            &mut data,
            UserContext::new(2),
            new_routine("Other", vec![new_task(None, "Read", "21:00")]),
            now(),
        )
        .unwrap();
        assert_eq!(other.tasks[0].id, 3);
        assert_eq!(list_routines(&data, UserContext::new(1)).len(), 1);
        assert_eq!(list_routines(&data, UserContext::new(2))[0].name, "Other");
    }

    #[test]
    fn create_rejects_bad_time() {
        let mut data = AppData::default();
        let err = create_routine(
            &mut data,
            UserContext::new(1),
            new_routine("Bad", vec![new_task(None, "Wake", "6:00")]),
            now(),
        )
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(data.routines.is_empty());
    }

    #[test]
    fn update_keeps_creates_and_drops_tasks() {
        let (mut data, routine) = seeded();
        record_completion(&mut data, 2, CompletionStatus::Completed, day(5), now()).unwrap();

        let updated = update_routine(
            &mut data,
            routine.id,
            new_routine(
                "Morning v2",
                vec![new_task(Some(1), "Wake up", "05:30"), new_task(None, "Stretch", "05:45")],
            ),
        )
        .unwrap();

        assert_eq!(updated.name, "Morning v2");
        assert_eq!(updated.tasks.len(), 2);
        assert_eq!(updated.tasks[0].id, 1);
        assert_eq!(updated.tasks[0].time, "05:30");
        assert_eq!(updated.tasks[1].id, 3);
        assert!(data.logs.iter().all(|log| log.task_id != 2));
    }

    #[test]
    fn update_and_delete_unknown_routine_is_not_found() {
        let (mut data, _) = seeded();
        let err = update_routine(&mut data, 99, new_routine("X", vec![])).unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        let err = delete_routine(&mut data, 99).unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn delete_removes_logs() {
        let (mut data, routine) = seeded();
        complete_all(&mut data, &routine, day(5));
        delete_routine(&mut data, routine.id).unwrap();
        assert!(data.routines.is_empty());
        assert!(data.logs.is_empty());
    }

    #[test]
    fn recording_twice_overwrites_status() {
        let (mut data, _) = seeded();
        let first = record_completion(&mut data, 1, CompletionStatus::Completed, day(5), now()).unwrap();
        let second = record_completion(&mut data, 1, CompletionStatus::Skipped, day(5), now()).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(data.logs.len(), 1);
        assert_eq!(data.logs[0].status, CompletionStatus::Skipped);
    }

    #[test]
    fn unknown_task_is_not_found() {
        let (mut data, _) = seeded();
        let err = record_completion(&mut data, 42, CompletionStatus::Completed, day(5), now()).unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert!(!remove_completion(&mut data, 42, day(5)));
    }

    #[test]
    fn completions_for_date_are_scoped_to_user_and_day() {
        let (mut data, routine) = seeded();
        complete_all(&mut data, &routine, day(4));
        record_completion(&mut data, 1, CompletionStatus::Skipped, day(5), now()).unwrap();

        let today = list_completions_for_date(&data, UserContext::new(1), day(5));
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].task_id, 1);
        assert!(list_completions_for_date(&data, UserContext::new(2), day(5)).is_empty());
    }

    #[test]
    fn streak_grows_on_consecutive_days_and_restarts_after_gap() {
        let (mut data, routine) = seeded();
        record_completion(&mut data, 1, CompletionStatus::Completed, day(1), now()).unwrap();
        assert_eq!(streak(&data), (0, 0, 0));

        record_completion(&mut data, 2, CompletionStatus::Completed, day(1), now()).unwrap();
        assert_eq!(streak(&data), (1, 1, 0));

        complete_all(&mut data, &routine, day(2));
        assert_eq!(streak(&data), (2, 2, 0));

        // Re-recording the same day does not double count.
        complete_all(&mut data, &routine, day(2));
        assert_eq!(streak(&data), (2, 2, 0));

        complete_all(&mut data, &routine, day(4));
        assert_eq!(streak(&data), (1, 2, 2));
        assert_eq!(data.routines[0].last_completed_date, Some(day(4)));
    }

    #[test]
    fn skipped_task_does_not_complete_routine() {
        let (mut data, _) = seeded();
        record_completion(&mut data, 1, CompletionStatus::Completed, day(1), now()).unwrap();
        record_completion(&mut data, 2, CompletionStatus::Skipped, day(1), now()).unwrap();
        assert_eq!(streak(&data), (0, 0, 0));
    }

    #[test]
    fn removing_a_completion_reverts_streak() {
        let (mut data, routine) = seeded();
        complete_all(&mut data, &routine, day(1));
        complete_all(&mut data, &routine, day(2));
        assert_eq!(streak(&data), (2, 2, 0));

        assert!(remove_completion(&mut data, 2, day(2)));
        assert_eq!(streak(&data), (1, 1, 0));
        assert_eq!(data.routines[0].last_completed_date, Some(day(1)));

        assert!(!remove_completion(&mut data, 2, day(2)));
    }

    #[test]
    fn flipping_to_skipped_reverts_streak() {
        let (mut data, routine) = seeded();
        complete_all(&mut data, &routine, day(1));
        assert_eq!(streak(&data), (1, 1, 0));

        record_completion(&mut data, 1, CompletionStatus::Skipped, day(1), now()).unwrap();
        assert_eq!(streak(&data), (0, 0, 0));
    }

    #[test]
    fn streak_change_on_earliest_date_does_not_overflow() {
        let (mut data, routine) = seeded();
        complete_all(&mut data, &routine, NaiveDate::MIN);
        assert_eq!(streak(&data), (1, 1, 0));

        // A later completion on the same floor date hits the "already counted" arm.
        complete_all(&mut data, &routine, NaiveDate::MIN);
        assert_eq!(streak(&data), (1, 1, 0));

        assert!(remove_completion(&mut data, routine.tasks[0].id, NaiveDate::MIN));
        assert_eq!(streak(&data), (0, 0, 0));
        assert_eq!(data.routines[0].last_completed_date, None);

        complete_all(&mut data, &routine, NaiveDate::MIN);
        assert_eq!(streak(&data), (1, 1, 0));
    }

    #[test]
    fn badges_count_routines_at_each_threshold() {
        let mut data = AppData::default();
        for (longest, user_id) in [(2, 1), (3, 1), (7, 1), (365, 1), (400, 2)] {
            let mut routine =
                create_routine(&mut data, UserContext::new(user_id), new_routine("R", vec![]), now())
                    .unwrap();
            routine.longest_streak = longest;
            let stored = data.routines.iter_mut().find(|r| r.id == routine.id).unwrap();
            *stored = routine;
        }

        let collected = badges(&data, UserContext::new(1));
        let count = |days: u32| collected.iter().find(|b| b.days == days).unwrap().count;
        assert_eq!(collected.len(), 10);
        assert_eq!(count(3), 3);
        assert_eq!(count(7), 2);
        assert_eq!(count(10), 1);
        assert_eq!(count(200), 1);
        assert_eq!(count(365), 1);
        assert_eq!(collected[9].label, "1 Year");

        let empty = badges(&data, UserContext::new(3));
        assert!(empty.iter().all(|badge| badge.count == 0));
    }

    #[test]
    fn history_lists_fully_completed_days() {
        let (mut data, routine) = seeded();
        complete_all(&mut data, &routine, day(3));
        complete_all(&mut data, &routine, day(1));
        record_completion(&mut data, 1, CompletionStatus::Completed, day(2), now()).unwrap();

        assert_eq!(routine_history(&data, routine.id).unwrap(), vec![day(1), day(3)]);
        assert_eq!(routine_logs(&data, routine.id).unwrap().len(), 5);
        assert!(routine_history(&data, 99).is_err());
    }
}
