// File: ./src/model/item.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{EnumIter, IntoEnumIterator};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StudentStatus {
    #[default]
    Active,
    Inactive,
}

/// A roster entry. Read-only reference data as far as parsing is concerned.
///
/// Two students may share `full_name` within the same class; the DOB is what
/// tells them apart.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: String,
    pub full_name: String,
    pub class_code: String,
    /// Pipe-delimited nicknames, e.g. `"Tuấn|Tuan"`.
    #[serde(default)]
    pub aliases: String,
    /// `M` / `F` in roster exports; kept verbatim.
    #[serde(default)]
    pub gender: String,
    /// ISO `YYYY-MM-DD`.
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub status: StudentStatus,
    #[serde(default)]
    pub profile_note: Option<String>,
    #[serde(default)]
    pub updated_at: String,
}

impl Student {
    pub fn new(student_id: &str, full_name: &str, class_code: &str) -> Self {
        Self {
            student_id: student_id.to_string(),
            full_name: full_name.to_string(),
            class_code: class_code.to_string(),
            aliases: String::new(),
            gender: String::new(),
            dob: None,
            photo_url: None,
            status: StudentStatus::Active,
            profile_note: None,
            updated_at: String::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: &str) -> Self {
        self.aliases = aliases.to_string();
        self
    }

    pub fn with_dob(mut self, dob: &str) -> Self {
        self.dob = Some(dob.to_string());
        self
    }

    pub fn alias_list(&self) -> Vec<&str> {
        self.aliases
            .split('|')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect()
    }

    pub fn is_active(&self) -> bool {
        self.status == StudentStatus::Active
    }
}

// --- TAG CATALOG ---

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Praise,
    Violation,
    Note,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Praise => write!(f, "PRAISE"),
            EventType::Violation => write!(f, "VIOLATION"),
            EventType::Note => write!(f, "NOTE"),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventCategory {
    Discipline,
    Appearance,
    Homework,
    Duty,
    Other,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventCategory::Discipline => write!(f, "DISCIPLINE"),
            EventCategory::Appearance => write!(f, "APPEARANCE"),
            EventCategory::Homework => write!(f, "HOMEWORK"),
            EventCategory::Duty => write!(f, "DUTY"),
            EventCategory::Other => write!(f, "OTHER"),
        }
    }
}

impl EventCategory {
    /// Accepts the stored uppercase form; anything unknown lands in `Other`.
    pub fn from_label(s: &str) -> Self {
        Self::iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(s.trim()))
            .unwrap_or(EventCategory::Other)
    }
}

/// One chip of the behavior catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagOption {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: EventType,
    pub category: EventCategory,
    pub points: i32,
    #[serde(default)]
    pub color: String,
}

impl TagOption {
    pub fn new(id: &str, label: &str, kind: EventType, category: EventCategory, points: i32) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind,
            category,
            points,
            color: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipGroup {
    pub id: String,
    pub name: String,
    pub chips: Vec<TagOption>,
}

impl ChipGroup {
    /// Catalog order is group order, then chip order.
    pub fn flatten(groups: &[ChipGroup]) -> Vec<TagOption> {
        groups.iter().flat_map(|g| g.chips.iter().cloned()).collect()
    }
}

fn chip(id: &str, label: &str, kind: EventType, category: EventCategory, color: &str) -> TagOption {
    let points = match kind {
        EventType::Praise => 1,
        EventType::Violation => -1,
        EventType::Note => 0,
    };
    TagOption {
        color: color.to_string(),
        ..TagOption::new(id, label, kind, category, points)
    }
}

fn group(id: &str, name: &str, chips: Vec<TagOption>) -> ChipGroup {
    ChipGroup {
        id: id.to_string(),
        name: name.to_string(),
        chips,
    }
}

/// Built-in catalog used when no `chip_groups.json` exists.
pub fn default_chip_groups() -> Vec<ChipGroup> {
    use EventCategory::*;
    use EventType::*;

    let red = "bg-red-100 text-red-800";
    let orange = "bg-orange-100 text-orange-800";
    let green = "bg-green-100 text-green-800";
    let yellow = "bg-yellow-100 text-yellow-800";
    let gray = "bg-gray-100 text-gray-800";

    vec![
        group(
            "g-gvbm-discipline",
            "Ý thức (GVBM)",
            vec![
                chip("t-d1", "Nói chuyện riêng", Violation, Discipline, red),
                chip("t-d2", "Nói leo", Violation, Discipline, red),
                chip("t-d3", "Làm việc riêng", Violation, Discipline, red),
                chip("t-d4", "Mất trật tự", Violation, Discipline, red),
                chip("t-d5", "Không tập trung", Violation, Discipline, red),
                chip("t-d6", "Hay cãi / bướng", Violation, Discipline, red),
                chip("t-d7", "Ngủ gật", Violation, Discipline, red),
                chip("t-d8", "Dùng điện thoại", Violation, Discipline, red),
                chip("t-d9", "Ra khỏi chỗ", Violation, Discipline, red),
            ],
        ),
        group(
            "g-gvbm-homework",
            "Vở & Bài (GVBM)",
            vec![
                chip("t-hw1", "Quên vở", Violation, Homework, orange),
                chip("t-hw2", "Chưa ghi bài", Violation, Homework, orange),
                chip("t-hw3", "Ghi bài thiếu", Violation, Homework, orange),
                chip("t-hw4", "Không làm bài", Violation, Homework, orange),
                chip("t-hw5", "Làm bài thiếu", Violation, Homework, orange),
                chip("t-hw6", "Nộp muộn", Violation, Homework, orange),
                chip("t-hw7", "Thiếu dụng cụ", Violation, Homework, orange),
                chip("t-hw8", "Đủ vở & bài", Praise, Homework, "bg-blue-100 text-blue-800"),
            ],
        ),
        group(
            "g-gvbm-praise",
            "Khen thưởng (GVBM)",
            vec![
                chip("t-p1", "Tích cực", Praise, Other, green),
                chip("t-p2", "Phát biểu tốt", Praise, Other, green),
                chip("t-p3", "Làm bài tốt", Praise, Other, green),
                chip("t-p4", "Hoàn thành nhanh", Praise, Other, green),
                chip("t-p5", "Gương mẫu", Praise, Other, green),
                chip("t-p6", "Hỗ trợ bạn", Praise, Other, green),
                chip("t-p7", "Sáng tạo", Praise, Other, green),
            ],
        ),
        group(
            "g-gvcn-appearance",
            "Nề nếp (GVCN)",
            vec![
                chip("t-ap1", "Đi muộn", Violation, Appearance, yellow),
                chip("t-ap2", "Không đồng phục", Violation, Appearance, yellow),
                chip("t-ap3", "Không khăn đỏ", Violation, Appearance, yellow),
                chip("t-ap4", "Không cà vạt", Violation, Appearance, yellow),
                chip("t-ap5", "Không bảng tên", Violation, Appearance, yellow),
                chip("t-ap6", "Tóc sai quy định", Violation, Appearance, yellow),
                chip("t-ap7", "Giày dép sai", Violation, Appearance, yellow),
            ],
        ),
        group(
            "g-gvcn-duty",
            "Trực nhật (GVCN)",
            vec![
                chip("t-du1", "Quên trực nhật", Violation, Duty, "bg-purple-100 text-purple-800"),
                chip("t-du2", "Lau bảng", Note, Duty, gray),
                chip("t-du3", "Quét sàn", Note, Duty, gray),
                chip("t-du4", "Đổ rác", Note, Duty, gray),
                chip("t-du5", "Tắt điện", Note, Duty, gray),
            ],
        ),
        group(
            "g-note",
            "Nhắc nhở",
            vec![
                chip("t-n1", "Nhắc nhở nhẹ", Note, Other, gray),
                chip("t-n2", "Nhắc lần 2", Note, Other, gray),
                chip("t-n3", "Gặp riêng", Note, Other, gray),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_list_skips_blanks() {
        let s = Student::new("1", "Nguyễn Văn Kiên", "8B03").with_aliases("Kiên| |Kien|");
        assert_eq!(s.alias_list(), vec!["Kiên", "Kien"]);
    }

    #[test]
    fn student_deserializes_roster_row() {
        let json = r#"{
            "student_id": "8B03_015",
            "full_name": "Nguyễn Văn Kiên",
            "class_code": "8B03",
            "aliases": "Kiên|Kien",
            "gender": "M",
            "dob": "2012-03-18",
            "status": "ACTIVE",
            "updated_at": "2026-01-22T09:00:00+07:00"
        }"#;
        let s: Student = serde_json::from_str(json).unwrap();
        assert_eq!(s.dob.as_deref(), Some("2012-03-18"));
        assert_eq!(s.gender, "M");
        assert!(s.is_active());
    }

    #[test]
    fn tag_type_field_is_renamed() {
        let json = r#"{"id":"t","label":"Nói leo","type":"VIOLATION","category":"DISCIPLINE","points":-1}"#;
        let t: TagOption = serde_json::from_str(json).unwrap();
        assert_eq!(t.kind, EventType::Violation);
        assert_eq!(t.points, -1);
    }

    #[test]
    fn category_from_label_falls_back() {
        assert_eq!(EventCategory::from_label("duty"), EventCategory::Duty);
        assert_eq!(EventCategory::from_label("???"), EventCategory::Other);
    }

    #[test]
    fn default_catalog_labels_are_unique() {
        let all = ChipGroup::flatten(&default_chip_groups());
        let mut labels: Vec<_> = all.iter().map(|t| t.label.clone()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), all.len());
    }
}
