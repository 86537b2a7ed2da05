// File: src/model/parser.rs
//! Turns a typed or spoken quick-log utterance into a structured candidate.
//!
//! The input runs through a fixed pipeline. Every stage takes the residual text
//! and hands back what it extracted plus the text that remains:
//!
//! 1. class code (`8B03`)            -> removed
//! 2. weekday phrase (`thứ 2`)       -> removed, resolved to the next such day
//! 3. full date (`DD/MM/YYYY`)       -> removed, replaces the weekday date
//! 4. birthday hint (`DD/MM`)        -> kept in the text unless strict
//! 5. tag label / synonym            -> removed
//! 6. student names and aliases      -> candidates
//!
//! Nothing here fails. A stage that finds nothing simply passes the text on.
use crate::model::item::{Student, TagOption};
use crate::model::matcher::{DobHint, SynonymTable, apply_dob_hint, match_students, match_tag};
use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static CLASS_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2}[A-Z]\d{1,3})\b").expect("class code pattern"));

static WEEKDAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:thứ\s*(2|3|4|5|6|7|8|hai|ba|tư|năm|sáu|bảy)|(?:thứ\s*)?(chủ\s*nhật))\b",
    )
    .expect("weekday pattern")
});

static FULL_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})[-/](\d{1,2})[-/](\d{4})\b").expect("full date pattern")
});

static DOB_HINT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})[./-](\d{1,2})\b").expect("dob hint pattern"));

/// How the parser classifies the student side of the result.
///
/// `Multi` together with an identified tag is what callers treat as
/// "ambiguous, confirm before saving" (see [`ParseResult::is_ambiguous`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchType {
    Exact,
    Multi,
    None,
}

/// Context pulled out of the utterance that replaces the caller's active one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_code: Option<String>,
    /// 2 = Monday ... 7 = Saturday, 8 = Sunday.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl ContextOverride {
    pub fn is_empty(&self) -> bool {
        self.class_code.is_none() && self.day_of_week.is_none() && self.date.is_none()
    }

    /// A class or a date the caller can act on.
    pub fn has_context(&self) -> bool {
        self.class_code.is_some() || self.date.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    pub match_type: MatchType,
    pub candidates: Vec<Student>,
    pub identified_tag: Option<TagOption>,
    pub context_override: ContextOverride,
    pub raw_text: String,
}

impl ParseResult {
    /// Several candidates and a tag: the caller must confirm who gets the tag.
    pub fn is_ambiguous(&self) -> bool {
        self.match_type == MatchType::Multi && self.identified_tag.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Reference day for weekday phrases.
    pub today: NaiveDate,
    /// Also strip the `DD/MM` birthday hint before name matching.
    pub strict_dob_hint: bool,
    /// Match names in the caller's class even when the text names another one.
    /// The extracted class is still reported in the context override.
    pub pin_class: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            today: Local::now().date_naive(),
            strict_dob_hint: false,
            pin_class: false,
        }
    }
}

// --- CONTEXT STAGES ---

fn remove_range(text: &str, start: usize, end: usize) -> String {
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..start]);
    out.push_str(&text[end..]);
    out
}

/// First class code in the text, uppercased.
pub fn extract_class_code(text: &str) -> (Option<String>, String) {
    match CLASS_CODE_RE.find(text) {
        Some(m) => (
            Some(m.as_str().to_uppercase()),
            remove_range(text, m.start(), m.end()),
        ),
        None => (None, text.to_string()),
    }
}

fn weekday_code(word: &str) -> Option<u8> {
    let compact: String = word.to_lowercase().split_whitespace().collect();
    match compact.as_str() {
        "2" | "hai" => Some(2),
        "3" | "ba" => Some(3),
        "4" | "tư" => Some(4),
        "5" | "năm" => Some(5),
        "6" | "sáu" => Some(6),
        "7" | "bảy" => Some(7),
        "8" | "chủnhật" => Some(8),
        _ => None,
    }
}

fn weekday_from_code(code: u8) -> Option<Weekday> {
    match code {
        2 => Some(Weekday::Mon),
        3 => Some(Weekday::Tue),
        4 => Some(Weekday::Wed),
        5 => Some(Weekday::Thu),
        6 => Some(Weekday::Fri),
        7 => Some(Weekday::Sat),
        8 => Some(Weekday::Sun),
        _ => None,
    }
}

/// Day number in the 2..8 scheme (Monday = 2, Sunday = 8).
pub fn day_code_of(date: NaiveDate) -> u8 {
    date.weekday().number_from_monday() as u8 + 1
}

/// The next date falling on `code`, today included.
pub fn next_occurrence(today: NaiveDate, code: u8) -> Option<NaiveDate> {
    let target = weekday_from_code(code)?;
    let ahead = (target.num_days_from_monday() as i64
        - today.weekday().num_days_from_monday() as i64)
        .rem_euclid(7);
    Some(today + Duration::days(ahead))
}

/// Weekday phrase such as "thứ 2", "thứ sáu" or "chủ nhật".
pub fn extract_weekday(text: &str, today: NaiveDate) -> (Option<(u8, NaiveDate)>, String) {
    let Some(caps) = WEEKDAY_RE.captures(text) else {
        return (None, text.to_string());
    };
    let Some(whole) = caps.get(0) else {
        return (None, text.to_string());
    };
    let word = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
    let resolved = word
        .and_then(weekday_code)
        .and_then(|code| next_occurrence(today, code).map(|d| (code, d)));

    match resolved {
        Some(found) => (Some(found), remove_range(text, whole.start(), whole.end())),
        None => (None, text.to_string()),
    }
}

/// `DD-MM-YYYY` or `DD/MM/YYYY`. Impossible calendar dates are left alone.
pub fn extract_full_date(text: &str) -> (Option<NaiveDate>, String) {
    for caps in FULL_DATE_RE.captures_iter(text) {
        let (Some(whole), Some(d), Some(m), Some(y)) =
            (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
        else {
            continue;
        };
        let parsed = match (
            y.as_str().parse::<i32>(),
            m.as_str().parse::<u32>(),
            d.as_str().parse::<u32>(),
        ) {
            (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d),
            _ => None,
        };
        if let Some(date) = parsed {
            return (Some(date), remove_range(text, whole.start(), whole.end()));
        }
    }
    (None, text.to_string())
}

fn is_date_separator(c: char) -> bool {
    matches!(c, '.' | '-' | '/')
}

/// A two-part `DD/MM` that is really part of a longer date (`14/05/2012`,
/// `2012-05-14`) is not a birthday hint.
fn is_part_of_longer_date(text: &str, start: usize, end: usize) -> bool {
    let mut after = text[end..].chars();
    if let (Some(sep), Some(next)) = (after.next(), after.next())
        && is_date_separator(sep)
        && next.is_ascii_digit()
    {
        return true;
    }
    let mut before = text[..start].chars().rev();
    if let (Some(sep), Some(prev)) = (before.next(), before.next())
        && is_date_separator(sep)
        && prev.is_ascii_digit()
    {
        return true;
    }
    false
}

/// Birthday fragment used to tell same-named students apart.
///
/// The token stays in the returned text unless `strip` is set.
pub fn extract_dob_hint(text: &str, strip: bool) -> (Option<DobHint>, String) {
    for caps in DOB_HINT_RE.captures_iter(text) {
        let (Some(whole), Some(d), Some(m)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        if is_part_of_longer_date(text, whole.start(), whole.end()) {
            continue;
        }
        let (Ok(day), Ok(month)) = (d.as_str().parse::<u32>(), m.as_str().parse::<u32>()) else {
            continue;
        };
        if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
            continue;
        }
        let rest = if strip {
            remove_range(text, whole.start(), whole.end())
        } else {
            text.to_string()
        };
        return (Some(DobHint { day, month }), rest);
    }
    (None, text.to_string())
}

// --- ENTRY POINTS ---

/// Parses `text` against the roster and catalog, taking "now" from the local clock.
pub fn parse_natural_language_input(
    text: &str,
    students: &[Student],
    tags: &[TagOption],
    current_class: &str,
    synonyms: &SynonymTable,
) -> ParseResult {
    parse_with_options(
        text,
        students,
        tags,
        current_class,
        synonyms,
        &ParseOptions::default(),
    )
}

pub fn parse_with_options(
    text: &str,
    students: &[Student],
    tags: &[TagOption],
    current_class: &str,
    synonyms: &SynonymTable,
    options: &ParseOptions,
) -> ParseResult {
    let mut context = ContextOverride::default();

    let (class_code, rest) = extract_class_code(text.trim());
    context.class_code = class_code;

    let (weekday, rest) = extract_weekday(&rest, options.today);
    if let Some((code, date)) = weekday {
        context.day_of_week = Some(code);
        context.date = Some(date);
    }

    let (full_date, rest) = extract_full_date(&rest);
    if full_date.is_some() {
        context.date = full_date;
    }

    let (dob_hint, rest) = extract_dob_hint(&rest, options.strict_dob_hint);

    let (identified_tag, rest) = match_tag(&rest, tags, synonyms);

    let target_class = match &context.class_code {
        Some(code) if !options.pin_class => code.clone(),
        _ => current_class.to_string(),
    };
    let candidates = apply_dob_hint(match_students(&rest, students, &target_class), dob_hint);

    let result = compose(text, candidates, identified_tag, context);
    log::debug!(
        "Parsed '{}' in {}: {:?}, {} candidate(s), tag {:?}",
        text,
        target_class,
        result.match_type,
        result.candidates.len(),
        result.identified_tag.as_ref().map(|t| t.label.as_str())
    );
    result
}

/// Assembles the final result from the partial outcomes.
fn compose(
    raw_text: &str,
    candidates: Vec<Student>,
    identified_tag: Option<TagOption>,
    context_override: ContextOverride,
) -> ParseResult {
    let match_type = match candidates.len() {
        0 => MatchType::None,
        1 => MatchType::Exact,
        _ => MatchType::Multi,
    };

    // Without a student or a usable context there is nothing to attach a tag to.
    let identified_tag = if match_type == MatchType::None && !context_override.has_context() {
        None
    } else {
        identified_tag
    };

    ParseResult {
        match_type,
        candidates,
        identified_tag,
        context_override,
        raw_text: raw_text.to_string(),
    }
}
