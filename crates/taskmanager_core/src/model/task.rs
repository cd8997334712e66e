//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical `Task` record and its closed enumerations.
//! - Provide the display comparator used by every task listing.
//! - Derive the next occurrence of a repetitive task.
//!
//! # Invariants
//! - Enumerations persist as their upper-case string names.
//! - `warning_unit` and `created_at` are always present.
//! - Interval and unit fields are independent; an occurrence is derived only
//!   when both repeat fields are set.

use crate::model::folder::FolderId;
use chrono::{Duration, Months, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned task identifier. `0` means "not persisted yet".
pub type TaskId = i64;

/// Default reminder offset applied to new tasks.
pub const DEFAULT_WARNING_INTERVAL: i32 = 15;

/// How a task recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    #[default]
    Once,
    /// Spawns a follow-up occurrence when marked done.
    Repetitive,
}

/// Loudness of the due-date alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmLevel {
    #[default]
    Medium,
    High,
    VeryHigh,
}

/// Task priority. Ordered by `rank`, never by persisted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// Calendar unit shared by repeat and warning intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RepeatUnit {
    #[default]
    #[serde(rename = "MINUTES")]
    Minutes,
    #[serde(rename = "HOURS")]
    Hours,
    #[serde(rename = "D")]
    Days,
    #[serde(rename = "W")]
    Weeks,
    #[serde(rename = "M")]
    Months,
    #[serde(rename = "Y")]
    Years,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Once => "ONCE",
            Self::Repetitive => "REPETITIVE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ONCE" => Some(Self::Once),
            "REPETITIVE" => Some(Self::Repetitive),
            _ => None,
        }
    }
}

impl AlarmLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::VeryHigh => "VERY_HIGH",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            "VERY_HIGH" => Some(Self::VeryHigh),
            _ => None,
        }
    }
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            _ => None,
        }
    }

    /// Numeric weight; higher sorts first in task listings.
    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }
}

impl RepeatUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minutes => "MINUTES",
            Self::Hours => "HOURS",
            Self::Days => "D",
            Self::Weeks => "W",
            Self::Months => "M",
            Self::Years => "Y",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "MINUTES" => Some(Self::Minutes),
            "HOURS" => Some(Self::Hours),
            "D" => Some(Self::Days),
            "W" => Some(Self::Weeks),
            "M" => Some(Self::Months),
            "Y" => Some(Self::Years),
            _ => None,
        }
    }

    /// Moves `from` forward by `amount` units.
    ///
    /// Month and year steps clamp to the last valid day (Jan 31 + 1M lands
    /// on Feb 28/29). Returns `None` on overflow or a negative amount.
    pub fn advance(self, from: NaiveDateTime, amount: i32) -> Option<NaiveDateTime> {
        let amount = u32::try_from(amount).ok()?;
        let amount_i64 = i64::from(amount);
        match self {
            Self::Minutes => from.checked_add_signed(Duration::try_minutes(amount_i64)?),
            Self::Hours => from.checked_add_signed(Duration::try_hours(amount_i64)?),
            Self::Days => from.checked_add_signed(Duration::try_days(amount_i64)?),
            Self::Weeks => from.checked_add_signed(Duration::try_weeks(amount_i64)?),
            Self::Months => from.checked_add_months(Months::new(amount)),
            Self::Years => from.checked_add_months(Months::new(amount.checked_mul(12)?)),
        }
    }
}

/// Field-level rule violations detected before a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Task label or folder name is empty after trimming.
    BlankText(&'static str),
    /// An interval column holds a negative number.
    NegativeInterval(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankText(field) => write!(f, "{field} must not be blank"),
            Self::NegativeInterval(field) => write!(f, "{field} must not be negative"),
        }
    }
}

impl Error for ValidationError {}

/// One row of the `tasks` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub folder_id: FolderId,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: TaskType,
    pub due_date: Option<NaiveDateTime>,
    pub alarm_level: AlarmLevel,
    pub priority: Priority,
    pub is_done: bool,
    pub repeat_interval: Option<i32>,
    pub repeat_unit: Option<RepeatUnit>,
    /// How long before `due_date` the reminder fires.
    pub warning_interval: i32,
    pub warning_unit: RepeatUnit,
    pub warning_repeat_interval: Option<i32>,
    pub warning_repeat_unit: Option<RepeatUnit>,
    pub created_at: NaiveDateTime,
}

impl Task {
    /// Creates an unsaved one-off task with application defaults.
    pub fn new(folder_id: FolderId, label: impl Into<String>, created_at: NaiveDateTime) -> Self {
        Self {
            id: 0,
            folder_id,
            label: label.into(),
            kind: TaskType::default(),
            due_date: None,
            alarm_level: AlarmLevel::default(),
            priority: Priority::default(),
            is_done: false,
            repeat_interval: None,
            repeat_unit: None,
            warning_interval: DEFAULT_WARNING_INTERVAL,
            warning_unit: RepeatUnit::default(),
            warning_repeat_interval: None,
            warning_repeat_unit: None,
            created_at,
        }
    }

    /// Checks the rules enforced before every write.
    ///
    /// Interval and unit columns are independent: a unit without an
    /// interval (or the reverse) is stored as-is.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.label.trim().is_empty() {
            return Err(ValidationError::BlankText("label"));
        }
        if self.warning_interval < 0 {
            return Err(ValidationError::NegativeInterval("warningInterval"));
        }
        if self.repeat_interval.is_some_and(|v| v < 0) {
            return Err(ValidationError::NegativeInterval("repeatInterval"));
        }
        if self.warning_repeat_interval.is_some_and(|v| v < 0) {
            return Err(ValidationError::NegativeInterval("warningRepeatInterval"));
        }
        Ok(())
    }

    /// Listing order: open before done, higher priority first, earlier due
    /// date first (undated before dated), then id.
    ///
    /// Mirrors the `ORDER BY` used by the SQLite repository.
    pub fn display_order(&self, other: &Self) -> Ordering {
        self.is_done
            .cmp(&other.is_done)
            .then_with(|| other.priority.rank().cmp(&self.priority.rank()))
            .then_with(|| self.due_date.cmp(&other.due_date))
            .then_with(|| self.id.cmp(&other.id))
    }

    /// Builds the follow-up occurrence of a repetitive task.
    ///
    /// Returns `None` unless the task is `Repetitive` and carries a due
    /// date, a repeat interval and a repeat unit.
    pub fn next_occurrence(&self, created_at: NaiveDateTime) -> Option<Task> {
        if self.kind != TaskType::Repetitive {
            return None;
        }
        let due = self.due_date?;
        let interval = self.repeat_interval?;
        let unit = self.repeat_unit?;
        let next_due = unit.advance(due, interval)?;

        Some(Task {
            id: 0,
            is_done: false,
            due_date: Some(next_due),
            created_at,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn enum_codecs_roundtrip_every_member() {
        for unit in [
            RepeatUnit::Minutes,
            RepeatUnit::Hours,
            RepeatUnit::Days,
            RepeatUnit::Weeks,
            RepeatUnit::Months,
            RepeatUnit::Years,
        ] {
            assert_eq!(RepeatUnit::parse(unit.as_str()), Some(unit));
        }
        assert_eq!(AlarmLevel::parse("VERY_HIGH"), Some(AlarmLevel::VeryHigh));
        assert_eq!(TaskType::parse("REPETITIVE"), Some(TaskType::Repetitive));
        assert_eq!(Priority::parse("high"), None);
    }

    #[test]
    fn serde_names_match_persisted_names() {
        let json = serde_json::to_string(&RepeatUnit::Weeks).unwrap();
        assert_eq!(json, "\"W\"");
        let json = serde_json::to_string(&AlarmLevel::VeryHigh).unwrap();
        assert_eq!(json, "\"VERY_HIGH\"");
    }

    #[test]
    fn new_task_uses_application_defaults() {
        let task = Task::new(3, "buy milk", at(2024, 1, 1, 8, 0));
        assert_eq!(task.id, 0);
        assert_eq!(task.kind, TaskType::Once);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.alarm_level, AlarmLevel::Medium);
        assert_eq!(task.warning_interval, 15);
        assert_eq!(task.warning_unit, RepeatUnit::Minutes);
        assert!(task.validate().is_ok());
    }

    #[test]
    fn validate_accepts_unit_without_interval() {
        let mut task = Task::new(1, "water plants", at(2024, 1, 1, 8, 0));
        task.warning_repeat_unit = Some(RepeatUnit::Minutes);
        task.repeat_interval = Some(2);
        assert!(task.validate().is_ok());

        task.warning_repeat_interval = Some(-5);
        assert_eq!(
            task.validate(),
            Err(ValidationError::NegativeInterval("warningRepeatInterval"))
        );

        task.warning_repeat_interval = None;
        task.label = "   ".to_string();
        assert_eq!(task.validate(), Err(ValidationError::BlankText("label")));
    }

    #[test]
    fn display_order_puts_open_high_priority_early_dates_first() {
        let created = at(2024, 1, 1, 0, 0);
        let mut done = Task::new(1, "done", created);
        done.is_done = true;
        done.priority = Priority::High;

        let mut low = Task::new(1, "low", created);
        low.priority = Priority::Low;

        let mut high_late = Task::new(1, "high late", created);
        high_late.priority = Priority::High;
        high_late.due_date = Some(at(2024, 6, 1, 9, 0));

        let mut high_early = Task::new(1, "high early", created);
        high_early.priority = Priority::High;
        high_early.due_date = Some(at(2024, 5, 1, 9, 0));

        let mut tasks = vec![done.clone(), low.clone(), high_late.clone(), high_early.clone()];
        tasks.sort_by(Task::display_order);
        let labels: Vec<_> = tasks.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, ["high early", "high late", "low", "done"]);
    }

    #[test]
    fn advance_clamps_month_end() {
        let jan_31 = at(2024, 1, 31, 10, 0);
        assert_eq!(
            RepeatUnit::Months.advance(jan_31, 1),
            Some(at(2024, 2, 29, 10, 0))
        );
        assert_eq!(
            RepeatUnit::Years.advance(at(2024, 2, 29, 10, 0), 1),
            Some(at(2025, 2, 28, 10, 0))
        );
        assert_eq!(RepeatUnit::Weeks.advance(jan_31, 2), Some(at(2024, 2, 14, 10, 0)));
        assert_eq!(RepeatUnit::Hours.advance(jan_31, -1), None);
    }

    #[test]
    fn next_occurrence_requires_full_repeat_configuration() {
        let created = at(2024, 1, 1, 0, 0);
        let mut task = Task::new(2, "standup", created);
        task.id = 42;
        task.kind = TaskType::Repetitive;
        task.due_date = Some(at(2024, 1, 8, 9, 30));
        task.is_done = true;
        assert!(task.next_occurrence(created).is_none());

        task.repeat_interval = Some(1);
        task.repeat_unit = Some(RepeatUnit::Days);
        let later = at(2024, 1, 8, 10, 0);
        let next = task.next_occurrence(later).unwrap();
        assert_eq!(next.id, 0);
        assert!(!next.is_done);
        assert_eq!(next.due_date, Some(at(2024, 1, 9, 9, 30)));
        assert_eq!(next.created_at, later);
        assert_eq!(next.label, "standup");
        assert_eq!(next.folder_id, 2);
    }
}
