// File: ./src/timetable.rs
//! Weekly timetable lookups.
//!
//! A timetable row says "on day D, period P runs from start to end for class C".
//! Rows carry an optional validity window; a blank bound is open.
use crate::model::parser::day_code_of;
use chrono::{NaiveDate, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static ROOM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(.*?)\]").expect("room pattern"));
static ROOM_FALLBACK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(N\d+)").expect("room fallback pattern"));
static CELL_CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,2}[A-Z]\d{1,3}\b").expect("cell class pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableRow {
    #[serde(default)]
    pub timetable_id: String,
    #[serde(default)]
    pub effective_from: String,
    #[serde(default)]
    pub effective_to: String,
    /// 2 (Monday) .. 8 (Sunday).
    pub day_of_week: u8,
    pub period: u8,
    /// `HH:MM`
    pub start_time: String,
    /// `HH:MM`
    pub end_time: String,
    #[serde(default)]
    pub subject: String,
    pub class_code: String,
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub teacher_id: Option<String>,
    #[serde(default)]
    pub teacher_name: Option<String>,
    #[serde(default)]
    pub raw_cell_text: String,
}

impl TimetableRow {
    /// ISO date strings compare lexically, so no parsing is needed.
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        let key = date.format("%Y-%m-%d").to_string();
        let from = self.effective_from.trim();
        let to = self.effective_to.trim();
        (from.is_empty() || from <= key.as_str()) && (to.is_empty() || to >= key.as_str())
    }

    fn minutes(s: &str) -> Option<u32> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .ok()
            .map(|t| t.hour() * 60 + t.minute())
    }

    /// Inclusive on both ends, like the bell schedule.
    pub fn covers_minute(&self, minute_of_day: u32) -> bool {
        match (Self::minutes(&self.start_time), Self::minutes(&self.end_time)) {
            (Some(start), Some(end)) => minute_of_day >= start && minute_of_day <= end,
            _ => false,
        }
    }
}

fn rows_for_day(rows: &[TimetableRow], date: NaiveDate) -> impl Iterator<Item = &TimetableRow> {
    let day = day_code_of(date);
    rows.iter()
        .filter(move |r| r.is_effective_on(date) && r.day_of_week == day)
}

/// The slot running at `minute_of_day` on `date`, if any.
pub fn slot_for_date_time(
    rows: &[TimetableRow],
    date: NaiveDate,
    minute_of_day: u32,
) -> Option<&TimetableRow> {
    rows_for_day(rows, date).find(|r| r.covers_minute(minute_of_day))
}

pub fn slot_for_date_period(
    rows: &[TimetableRow],
    date: NaiveDate,
    period: u8,
) -> Option<&TimetableRow> {
    rows_for_day(rows, date).find(|r| r.period == period)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimetableCell {
    pub subject: String,
    pub class_code: String,
    pub room: String,
}

/// Splits a raw spreadsheet cell like `KHTN-Lí - 8B03 [N405]`.
///
/// A cell without a class code is not a teaching slot and yields `None`.
pub fn parse_timetable_cell(cell_text: &str) -> Option<TimetableCell> {
    if cell_text.trim().is_empty() {
        return None;
    }

    let bracketed = ROOM_RE.captures(cell_text);
    let room = match &bracketed {
        Some(caps) => caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
        None => ROOM_FALLBACK_RE
            .find(cell_text)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
    };

    let class_code = CELL_CLASS_RE.find(cell_text)?.as_str().to_string();

    let mut remaining = cell_text.to_string();
    if let Some(whole) = bracketed.as_ref().and_then(|c| c.get(0)) {
        remaining = remaining.replacen(whole.as_str(), "", 1);
    }
    remaining = remaining.replacen(&class_code, "", 1);

    let subject = remaining
        .trim_matches(|c: char| c == '-' || c.is_whitespace())
        .to_string();

    Some(TimetableCell {
        subject,
        class_code,
        room,
    })
}
