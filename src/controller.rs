// File: src/controller.rs
//! Quick-log session logic.
//! Every front end (CLI today, anything else later) hands raw input to a
//! `QuickLogSession`, which parses it, applies context changes and tells the
//! caller what to do next: save, select, ask for confirmation, or report that
//! the input was not understood. The session itself never writes to disk.
use crate::model::parser::{
    MatchType, ParseOptions, ParseResult, day_code_of, parse_with_options,
};
use crate::model::{
    ContextOverride, EventDraft, EventSource, Role, Scope, Student, StudentDisplay, SynonymTable,
    TagOption,
};
use crate::storage::Snapshot;
use crate::timetable::{TimetableRow, slot_for_date_period, slot_for_date_time};
use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Subject recorded for a homeroom teacher outside their own class' lessons.
pub const HOMEROOM_SUBJECT: &str = "Sinh hoạt CN";

/// Candidates waiting for the teacher to tick who is meant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    pub candidates: Vec<Student>,
    pub tag: Option<TagOption>,
    pub raw_text: String,
    pub source: EventSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// One draft per student, ready to be stored.
    Saved(Vec<EventDraft>),
    /// Students pre-selected for a following tag tap.
    Selected(Vec<String>),
    /// Several students matched; the caller confirms a subset via [`QuickLogSession::confirm`].
    NeedsConfirmation {
        candidates: Vec<Student>,
        tag: Option<TagOption>,
    },
    /// Only the class or date changed.
    ContextChanged(ContextOverride),
    NotUnderstood,
}

#[derive(Debug, Clone)]
pub struct QuickLogSession {
    pub role: Role,
    pub active_class: String,
    pub active_subject: String,
    pub active_date: NaiveDate,
    /// Homeroom view: the class never changes.
    pub fixed_class: Option<String>,
    /// Set once the teacher (or an utterance) picked the class by hand.
    pub class_locked: bool,
    pub override_period: Option<u8>,
    pub current_slot: Option<TimetableRow>,
    pub selected_students: Vec<String>,
    pub pending: Option<PendingConfirmation>,
    pub strict_dob_hint: bool,
}

impl QuickLogSession {
    pub fn new(role: Role, active_class: &str, today: NaiveDate) -> Self {
        Self {
            role,
            active_class: active_class.to_string(),
            active_subject: String::new(),
            active_date: today,
            fixed_class: None,
            class_locked: false,
            override_period: None,
            current_slot: None,
            selected_students: Vec::new(),
            pending: None,
            strict_dob_hint: false,
        }
    }

    /// Homeroom session pinned to one class.
    pub fn homeroom(class_code: &str, today: NaiveDate) -> Self {
        Self {
            fixed_class: Some(class_code.to_string()),
            class_locked: true,
            ..Self::new(Role::HomeroomTeacher, class_code, today)
        }
    }

    // --- TIMETABLE CONTEXT ---

    fn adopt_slot(&mut self, slot: Option<&TimetableRow>) {
        match (&self.fixed_class, slot) {
            (Some(fixed), Some(slot)) => {
                self.active_class = fixed.clone();
                self.active_subject = if &slot.class_code == fixed {
                    slot.subject.clone()
                } else {
                    HOMEROOM_SUBJECT.to_string()
                };
                self.current_slot = Some(slot.clone());
            }
            (Some(fixed), None) => {
                self.active_class = fixed.clone();
                self.active_subject = HOMEROOM_SUBJECT.to_string();
                self.current_slot = None;
            }
            (None, Some(slot)) => {
                self.active_class = slot.class_code.clone();
                self.active_subject = slot.subject.clone();
                self.current_slot = Some(slot.clone());
            }
            (None, None) => {}
        }
    }

    /// Follows the timetable for the active date at the given clock time,
    /// unless a period was chosen by hand or the class is locked.
    pub fn refresh_slot(&mut self, timetable: &[TimetableRow], clock: NaiveTime) {
        if self.override_period.is_some() {
            return;
        }
        let minute = clock.hour() * 60 + clock.minute();
        let slot = slot_for_date_time(timetable, self.active_date, minute);
        if self.fixed_class.is_none() && self.class_locked {
            return;
        }
        if self.fixed_class.is_none() && slot.is_none() {
            return;
        }
        self.adopt_slot(slot);
    }

    /// Pins a period; class, subject and room follow that period's slot.
    pub fn select_period(&mut self, timetable: &[TimetableRow], period: u8) {
        self.override_period = Some(period);
        self.class_locked = true;
        self.apply_period_slot(timetable, period);
    }

    fn apply_period_slot(&mut self, timetable: &[TimetableRow], period: u8) {
        match slot_for_date_period(timetable, self.active_date, period) {
            Some(slot) => self.adopt_slot(Some(slot)),
            None => {
                self.current_slot = None;
                if self.fixed_class.is_some() {
                    self.active_subject = HOMEROOM_SUBJECT.to_string();
                } else {
                    self.active_class.clear();
                    self.active_subject.clear();
                }
            }
        }
    }

    pub fn set_date(&mut self, timetable: &[TimetableRow], date: NaiveDate) {
        self.active_date = date;
        self.resync_slot(timetable);
        log::info!("Active date is now {}", date);
    }

    /// Re-checks the current slot after the class or date moved under it.
    ///
    /// A pinned period is looked up again for the new date. Otherwise the slot
    /// survives only if it still runs on the active date for the active class.
    fn resync_slot(&mut self, timetable: &[TimetableRow]) {
        let date = self.active_date;
        let slot = match self.override_period {
            Some(period) => slot_for_date_period(timetable, date, period).cloned(),
            None => self
                .current_slot
                .take()
                .filter(|s| s.is_effective_on(date) && s.day_of_week == day_code_of(date)),
        };
        match (self.fixed_class.is_some(), slot) {
            (true, slot) => self.adopt_slot(slot.as_ref()),
            (false, Some(slot)) if slot.class_code == self.active_class => {
                self.active_subject = slot.subject.clone();
                self.current_slot = Some(slot);
            }
            (false, _) => {
                self.current_slot = None;
                self.active_subject.clear();
            }
        }
    }

    fn apply_context(&mut self, context: &ContextOverride, timetable: &[TimetableRow]) {
        // Naming a class, even the current one, pins it against the timetable.
        if let Some(code) = &context.class_code {
            if self.fixed_class.is_some() {
                log::debug!("Ignoring class {} in a homeroom session", code);
            } else {
                if code != &self.active_class {
                    log::info!("Switched to class {}", code);
                }
                self.active_class = code.clone();
                self.class_locked = true;
            }
        }
        if let Some(date) = context.date {
            self.active_date = date;
            log::info!("Active date is now {}", date);
        }
        if context.has_context() {
            self.resync_slot(timetable);
        }
    }

    // --- INPUT ---

    pub fn parse(
        &self,
        text: &str,
        snapshot: &Snapshot,
        synonyms: &SynonymTable,
        today: NaiveDate,
    ) -> ParseResult {
        let tags = snapshot.catalog_for(self.role);
        let options = ParseOptions {
            today,
            strict_dob_hint: self.strict_dob_hint,
            pin_class: self.fixed_class.is_some(),
        };
        parse_with_options(
            text,
            &snapshot.roster,
            &tags,
            &self.active_class,
            synonyms,
            &options,
        )
    }

    /// Parses one utterance and acts on it.
    pub fn submit(
        &mut self,
        text: &str,
        source: EventSource,
        snapshot: &Snapshot,
        synonyms: &SynonymTable,
        now: NaiveDateTime,
    ) -> Outcome {
        let result = self.parse(text, snapshot, synonyms, now.date());
        self.apply_result(result, source, snapshot, now)
    }

    /// The caller side of a parse: what a result means for the session.
    pub fn apply_result(
        &mut self,
        result: ParseResult,
        source: EventSource,
        snapshot: &Snapshot,
        now: NaiveDateTime,
    ) -> Outcome {
        self.apply_context(&result.context_override, &snapshot.timetable);

        match (result.match_type, result.identified_tag) {
            (MatchType::None, _) => {
                if result.context_override.has_context() {
                    Outcome::ContextChanged(result.context_override)
                } else {
                    Outcome::NotUnderstood
                }
            }
            (MatchType::Exact, Some(tag)) => {
                let drafts: Vec<EventDraft> = result
                    .candidates
                    .iter()
                    .map(|s| self.draft_for(Some(s), &tag, source, &result.raw_text, snapshot, now))
                    .collect();
                log::info!(
                    "Logged '{}' for {}",
                    tag.label,
                    result
                        .candidates
                        .first()
                        .map(|s| s.full_name.as_str())
                        .unwrap_or_default()
                );
                Outcome::Saved(drafts)
            }
            (MatchType::Exact, None) => {
                let ids: Vec<String> = result
                    .candidates
                    .iter()
                    .map(|s| s.student_id.clone())
                    .collect();
                self.selected_students = ids.clone();
                Outcome::Selected(ids)
            }
            (MatchType::Multi, tag) => {
                self.pending = Some(PendingConfirmation {
                    candidates: result.candidates.clone(),
                    tag: tag.clone(),
                    raw_text: result.raw_text,
                    source,
                });
                Outcome::NeedsConfirmation {
                    candidates: result.candidates,
                    tag,
                }
            }
        }
    }

    /// Resolves a pending confirmation with the ticked student ids.
    ///
    /// An empty selection is refused and the confirmation stays pending.
    pub fn confirm(
        &mut self,
        selected_ids: &[String],
        snapshot: &Snapshot,
        now: NaiveDateTime,
    ) -> Result<Outcome> {
        let pending = self
            .pending
            .as_ref()
            .ok_or_else(|| anyhow!("Nothing is waiting for confirmation"))?;

        let targets: Vec<Student> = pending
            .candidates
            .iter()
            .filter(|s| selected_ids.contains(&s.student_id))
            .cloned()
            .collect();
        if targets.is_empty() {
            return Err(anyhow!("Select at least one student"));
        }

        let Some(pending) = self.pending.take() else {
            return Err(anyhow!("Nothing is waiting for confirmation"));
        };
        match pending.tag {
            Some(tag) => {
                let drafts = targets
                    .iter()
                    .map(|s| {
                        self.draft_for(Some(s), &tag, pending.source, &pending.raw_text, snapshot, now)
                    })
                    .collect::<Vec<_>>();
                log::info!("Logged '{}' for {} student(s)", tag.label, drafts.len());
                Ok(Outcome::Saved(drafts))
            }
            None => {
                let ids: Vec<String> = targets.iter().map(|s| s.student_id.clone()).collect();
                self.selected_students = ids.clone();
                Ok(Outcome::Selected(ids))
            }
        }
    }

    pub fn cancel_confirmation(&mut self) {
        self.pending = None;
    }

    /// Tag tap: one draft per selected student, then the selection is cleared.
    pub fn tap_tag(
        &mut self,
        tag: &TagOption,
        snapshot: &Snapshot,
        now: NaiveDateTime,
    ) -> Result<Outcome> {
        if self.selected_students.is_empty() {
            return Err(anyhow!("No student selected"));
        }
        let drafts: Vec<EventDraft> = self
            .selected_students
            .iter()
            .filter_map(|id| snapshot.roster.iter().find(|s| &s.student_id == id))
            .map(|s| {
                let raw = format!("{} {}", s.full_name, tag.label);
                self.draft_for(Some(s), tag, EventSource::Tap, &raw, snapshot, now)
            })
            .collect();
        self.selected_students.clear();
        Ok(Outcome::Saved(drafts))
    }

    /// A tag for the whole active class rather than one student.
    pub fn tap_class_tag(
        &self,
        tag: &TagOption,
        snapshot: &Snapshot,
        now: NaiveDateTime,
    ) -> Result<Outcome> {
        if self.active_class.is_empty() {
            return Err(anyhow!("No class selected"));
        }
        let raw = format!("Lớp {}: {}", self.active_class, tag.label);
        let draft = self.draft_for(None, tag, EventSource::Tap, &raw, snapshot, now);
        log::info!("Logged '{}' for class {}", tag.label, self.active_class);
        Ok(Outcome::Saved(vec![draft]))
    }

    // --- DRAFTS ---

    fn draft_for(
        &self,
        student: Option<&Student>,
        tag: &TagOption,
        source: EventSource,
        raw_text: &str,
        snapshot: &Snapshot,
        now: NaiveDateTime,
    ) -> EventDraft {
        let time = if self.active_date == now.date() {
            now.time().with_nanosecond(0).unwrap_or(now.time())
        } else {
            NaiveTime::MIN
        };
        let period = self
            .override_period
            .or_else(|| self.current_slot.as_ref().map(|s| s.period))
            .unwrap_or(0);

        EventDraft {
            date: self.active_date,
            time,
            class_code: self.active_class.clone(),
            subject: self.active_subject.clone(),
            room: self
                .current_slot
                .as_ref()
                .map(|s| s.room.clone())
                .unwrap_or_default(),
            period,
            role: self.role,
            scope: if student.is_some() {
                Scope::Student
            } else {
                Scope::Class
            },
            student_id: student.map(|s| s.student_id.clone()),
            student_name_snapshot: student.map(|s| s.unique_name(&snapshot.roster)),
            tag: tag.clone(),
            source,
            raw_text: raw_text.to_string(),
        }
    }
}
