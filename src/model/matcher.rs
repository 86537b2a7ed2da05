// Tag and student matching over the residual text of a quick-log input.
//
// Both matchers are plain functions over read-only snapshots: the tag matcher
// returns the tag it found together with the text that is left once the
// matched wording is removed, the student matcher returns every roster entry
// of the target class whose name or alias occurs in the text.
//
// Matching rules:
//   tags      -> longest label first, label before synonyms, first hit wins
//   full name -> case-insensitive substring
//   alias     -> case-insensitive whole word

use crate::model::item::{Student, TagOption};
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;

/// Alternate phrasings for catalog labels, keyed by the canonical label.
///
/// Keys and phrases are stored lowercased so lookups and containment checks
/// do not depend on how the catalog or configuration capitalizes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymTable {
    entries: HashMap<String, Vec<String>>,
}

impl SynonymTable {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn from_map(map: &HashMap<String, Vec<String>>) -> Self {
        let mut table = Self::empty();
        for (label, phrases) in map {
            table.insert(label, phrases.iter().map(String::as_str));
        }
        table
    }

    /// Replaces the phrase list for `label`. Order is kept: the first phrase
    /// present in the text is the one that gets removed.
    pub fn insert<'a>(&mut self, label: &str, phrases: impl IntoIterator<Item = &'a str>) {
        let phrases: Vec<String> = phrases
            .into_iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        self.entries.insert(Self::key(label), phrases);
    }

    /// Entries of `other` override entries with the same label.
    pub fn merge(&mut self, other: &SynonymTable) {
        for (k, v) in &other.entries {
            self.entries.insert(k.clone(), v.clone());
        }
    }

    pub fn phrases_for(&self, label: &str) -> &[String] {
        self.entries
            .get(&Self::key(label))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn key(label: &str) -> String {
        label.trim().to_lowercase()
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        let mut t = Self::empty();
        t.insert(
            "Nói chuyện riêng",
            ["nói chuyện", "nói nhiều", "buôn chuyện", "bàn tán"],
        );
        t.insert("Nói leo", ["leo", "nói tự do", "thưa leo"]);
        t.insert("Quên vở", ["vở", "không vở", "thiếu vở", "quên sách"]);
        t.insert(
            "Không làm bài",
            [
                "không bài",
                "chưa bài",
                "thiếu bài",
                "không làm",
                "không làm bài tập",
            ],
        );
        t.insert("Không đồng phục", ["đồng phục", "áo sai", "sai phục"]);
        t.insert("Đi muộn", ["muộn", "trễ", "tới muộn"]);
        t.insert("Tích cực", ["xung phong", "giơ tay", "phát biểu"]);
        t.insert("Làm việc riêng", ["việc riêng", "nghịch"]);
        t.insert("Ngủ gật", ["ngủ", "gục"]);
        t
    }
}

/// Removes every case-insensitive occurrence of `phrase` from `text`.
pub(crate) fn remove_phrase(text: &str, phrase: &str) -> String {
    if phrase.is_empty() {
        return text.to_string();
    }
    match RegexBuilder::new(&regex::escape(phrase))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re.replace_all(text, "").into_owned(),
        Err(e) => {
            log::warn!("Could not build removal pattern for '{}': {}", phrase, e);
            text.to_string()
        }
    }
}

/// Finds at most one tag in `text` and strips its wording.
///
/// Labels are tried longest first so "Nói leo" wins over "Nói" when the text
/// says "nói leo". For each tag the label is tested before its synonyms.
pub fn match_tag(
    text: &str,
    tags: &[TagOption],
    synonyms: &SynonymTable,
) -> (Option<TagOption>, String) {
    let lower = text.to_lowercase();

    let mut sorted: Vec<&TagOption> = tags.iter().collect();
    // Stable: equal lengths keep catalog order.
    sorted.sort_by(|a, b| b.label.chars().count().cmp(&a.label.chars().count()));

    for tag in sorted {
        let label = tag.label.trim();
        if label.is_empty() {
            continue;
        }
        let matched_text = if lower.contains(&label.to_lowercase()) {
            Some(label)
        } else {
            synonyms
                .phrases_for(label)
                .iter()
                .find(|syn| lower.contains(syn.as_str()))
                .map(String::as_str)
        };

        if let Some(found) = matched_text {
            return (Some(tag.clone()), remove_phrase(text, found));
        }
    }
    (None, text.to_string())
}

/// Lowercases and turns `.`, `,` and `;` into spaces.
pub fn normalize_for_names(text: &str) -> String {
    text.replace(['.', ',', ';'], " ").to_lowercase()
}

fn alias_pattern(alias: &str) -> Option<Regex> {
    Regex::new(&format!(r"\b{}\b", regex::escape(alias))).ok()
}

/// Does `student` occur in the already normalized `text`?
pub fn student_matches(student: &Student, text: &str) -> bool {
    let full_name = student.full_name.trim().to_lowercase();
    let by_name = !full_name.is_empty() && text.contains(&full_name);

    let by_alias = student.alias_list().iter().any(|alias| {
        alias_pattern(&alias.to_lowercase()).is_some_and(|re| re.is_match(text))
    });

    by_name || by_alias
}

/// All students of `class_code` mentioned in `text`, in roster order.
pub fn match_students(text: &str, roster: &[Student], class_code: &str) -> Vec<Student> {
    let normalized = normalize_for_names(text);
    roster
        .iter()
        .filter(|s| s.class_code == class_code)
        .filter(|s| student_matches(s, &normalized))
        .cloned()
        .collect()
}

/// A `DD/MM` birthday fragment spoken next to a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DobHint {
    pub day: u32,
    pub month: u32,
}

impl DobHint {
    /// The tail of an ISO date this hint stands for, e.g. `-05-14`.
    pub fn suffix(&self) -> String {
        format!("-{:02}-{:02}", self.month, self.day)
    }

    pub fn matches(&self, student: &Student) -> bool {
        student
            .dob
            .as_deref()
            .is_some_and(|dob| dob.trim().ends_with(&self.suffix()))
    }
}

/// Narrows a multi-candidate set to the students born on the hinted day.
///
/// Never narrows to nothing: when no candidate matches, the input set is
/// returned unchanged. Sets of zero or one candidate are left alone.
pub fn apply_dob_hint(candidates: Vec<Student>, hint: Option<DobHint>) -> Vec<Student> {
    let Some(hint) = hint else {
        return candidates;
    };
    if candidates.len() <= 1 {
        return candidates;
    }
    let filtered: Vec<Student> = candidates
        .iter()
        .filter(|s| hint.matches(s))
        .cloned()
        .collect();
    if filtered.is_empty() {
        log::debug!(
            "DOB hint {} matched none of {} candidates, keeping all",
            hint.suffix(),
            candidates.len()
        );
        candidates
    } else {
        filtered
    }
}
