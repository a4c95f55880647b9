use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Identity of the user a request acts for, passed explicitly into store calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: u64,
}

impl UserContext {
    pub fn new(user_id: u64) -> Self {
        Self { user_id }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DayType {
    #[default]
    #[serde(rename = "All Days")]
    AllDays,
    Weekday,
    Weekend,
}

impl DayType {
    /// Whether a routine with this filter runs on a day of type `today`.
    pub fn applies_to(self, today: DayType) -> bool {
        self == DayType::AllDays || self == today
    }

    pub fn label(self) -> &'static str {
        match self {
            DayType::AllDays => "All Days",
            DayType::Weekday => "Weekday",
            DayType::Weekend => "Weekend",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompletionStatus {
    #[default]
    Completed,
    Skipped,
}

impl CompletionStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "completed" => Some(Self::Completed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineTask {
    pub id: u64,
    pub routine_id: u64,
    pub name: String,
    pub time: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    pub id: u64,
    pub user_id: u64,
    pub name: String,
    pub routine_type: DayType,
    pub order_index: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tasks: Vec<RoutineTask>,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default)]
    pub last_streak: u32,
    #[serde(default)]
    pub last_completed_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskLog {
    pub id: u64,
    pub task_id: u64,
    pub date: NaiveDate,
    pub status: CompletionStatus,
    pub completed_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub routines: Vec<Routine>,
    #[serde(default)]
    pub logs: Vec<TaskLog>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    pub time: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRoutine {
    pub name: String,
    #[serde(default)]
    pub routine_type: DayType,
    #[serde(default)]
    pub order_index: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tasks: Vec<NewTask>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteQuery {
    pub status: Option<String>,
    pub date_str: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date_str: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayState {
    Normal,
    Upcoming,
    Overdue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTask {
    #[serde(flatten)]
    pub task: RoutineTask,
    pub routine_name: String,
    pub routine_type: DayType,
    pub state: DisplayState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSchedule {
    pub resolved_at: NaiveDateTime,
    pub day_type: DayType,
    pub current: Option<ResolvedTask>,
    pub next: Option<ResolvedTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub days: u32,
    pub label: String,
    pub icon: String,
    /// Routines whose longest streak reached `days`.
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Checks the fixed-width 24h `HH:MM` shape the schedule ordering relies on.
pub fn is_valid_time(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return false;
    }
    let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
    if !digits.iter().all(u8::is_ascii_digit) {
        return false;
    }
    let hour = (digits[0] - b'0') * 10 + (digits[1] - b'0');
    let minute = (digits[2] - b'0') * 10 + (digits[3] - b'0');
    hour < 24 && minute < 60
}
