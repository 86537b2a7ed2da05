// File: ./src/model/event.rs
use crate::model::item::{EventCategory, EventType, TagOption};
use crate::model::parser::day_code_of;
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subject teacher (`GVBM`) or homeroom teacher (`GVCN`).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    #[serde(rename = "GVBM")]
    SubjectTeacher,
    #[serde(rename = "GVCN")]
    HomeroomTeacher,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Scope {
    #[default]
    Student,
    Class,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    #[default]
    Tap,
    Text,
    Voice,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherProfile {
    pub teacher_name: String,
    pub teacher_email: String,
}

/// What a caller knows when it decides to save: everything but the derived keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub class_code: String,
    pub subject: String,
    pub room: String,
    pub period: u8,
    pub role: Role,
    pub scope: Scope,
    pub student_id: Option<String>,
    pub student_name_snapshot: Option<String>,
    pub tag: TagOption,
    pub source: EventSource,
    pub raw_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppEvent {
    pub event_id: String,
    pub timestamp: String,
    pub date: NaiveDate,
    pub time: String,
    pub month_key: String,
    pub week_key: String,
    pub semester_key: String,
    pub school_year: String,
    pub teacher_id: String,
    pub teacher_name: String,
    pub role: Role,
    pub class_code: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub period: u8,
    pub day_of_week: u8,
    pub scope: Scope,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub student_name_snapshot: Option<String>,
    #[serde(rename = "type")]
    pub kind: EventType,
    pub category: EventCategory,
    /// Tag label.
    pub tags: String,
    pub points: i32,
    pub severity: u8,
    pub raw_text: String,
    pub source: EventSource,
    pub confidence: f32,
    #[serde(default)]
    pub is_tentative: bool,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub synced: bool,
}

/// `2025-2026` for anything from August 2025 to July 2026.
pub fn school_year_of(date: NaiveDate) -> String {
    let y = date.year();
    if date.month() >= 8 {
        format!("{}-{}", y, y + 1)
    } else {
        format!("{}-{}", y - 1, y)
    }
}

/// `2025-2026_HK1` (Aug..Dec) or `2025-2026_HK2` (Jan..Jul).
pub fn semester_key_of(date: NaiveDate) -> String {
    let semester = if date.month() >= 8 { "HK1" } else { "HK2" };
    format!("{}_{}", school_year_of(date), semester)
}

pub fn month_key_of(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// ISO week number labelled with the calendar year of the date.
pub fn week_key_of(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

impl AppEvent {
    /// Builds a stored event, deriving the calendar keys from the draft date
    /// rather than from `now`. `now` only stamps creation.
    pub fn from_draft(draft: EventDraft, profile: &TeacherProfile, now: DateTime<Local>) -> Self {
        let time = draft.time.format("%H:%M:%S").to_string();
        let stamp = now.to_rfc3339();
        Self {
            event_id: format!("e-{}", Uuid::new_v4()),
            timestamp: format!("{}T{}", draft.date.format("%Y-%m-%d"), time),
            date: draft.date,
            time,
            month_key: month_key_of(draft.date),
            week_key: week_key_of(draft.date),
            semester_key: semester_key_of(draft.date),
            school_year: school_year_of(draft.date),
            teacher_id: profile.teacher_email.clone(),
            teacher_name: profile.teacher_name.clone(),
            role: draft.role,
            class_code: draft.class_code,
            subject: draft.subject,
            room: draft.room,
            period: draft.period,
            day_of_week: day_code_of(draft.date),
            scope: draft.scope,
            student_id: draft.student_id,
            student_name_snapshot: draft.student_name_snapshot,
            kind: draft.tag.kind,
            category: draft.tag.category,
            tags: draft.tag.label,
            points: draft.tag.points,
            severity: 1,
            raw_text: draft.raw_text,
            source: draft.source,
            confidence: 1.0,
            is_tentative: false,
            created_at: stamp.clone(),
            updated_at: stamp,
            synced: false,
        }
    }
}
