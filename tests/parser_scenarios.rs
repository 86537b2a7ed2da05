use chrono::NaiveDate;
use classlog::model::item::default_chip_groups;
use classlog::model::{
    ChipGroup, EventCategory, EventType, MatchType, ParseOptions, ParseResult, Student,
    StudentDisplay, SynonymTable, TagOption, parse_with_options,
};

fn monday() -> NaiveDate {
    // 2026-10-19 is a Monday.
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn roster() -> Vec<Student> {
    vec![
        Student::new("8B03_001", "Nguyễn Văn Tuấn", "8B03")
            .with_aliases("Tuấn|Tuan")
            .with_dob("2012-05-14"),
        Student::new("8B03_002", "Nguyễn Văn Tuấn", "8B03")
            .with_aliases("Tuấn|Tuan")
            .with_dob("2012-10-27"),
        Student::new("8B03_003", "Trần Trung Kiên", "8B03")
            .with_aliases("Kiên|Kien")
            .with_dob("2012-03-18"),
        Student::new("8B03_004", "Lê Thu Hà", "8B03")
            .with_aliases("Hà")
            .with_dob("2012-01-26"),
        Student::new("6A03_001", "Phạm Gia Huy", "6A03")
            .with_aliases("Huy")
            .with_dob("2014-07-02"),
        Student::new("6A03_002", "Đỗ Minh Kiên", "6A03").with_aliases("Kiên"),
    ]
}

fn catalog() -> Vec<TagOption> {
    vec![
        TagOption::new(
            "t-d1",
            "Nói chuyện riêng",
            EventType::Violation,
            EventCategory::Discipline,
            -1,
        ),
        TagOption::new("t-d2", "Nói leo", EventType::Violation, EventCategory::Discipline, -1),
        TagOption::new("t-p1", "Tích cực", EventType::Praise, EventCategory::Other, 1),
    ]
}

fn parse(text: &str, class: &str) -> ParseResult {
    parse_in(text, class, false)
}

fn parse_in(text: &str, class: &str, strict: bool) -> ParseResult {
    let options = ParseOptions {
        today: monday(),
        strict_dob_hint: strict,
        pin_class: false,
    };
    parse_with_options(
        text,
        &roster(),
        &catalog(),
        class,
        &SynonymTable::default(),
        &options,
    )
}

fn ids(result: &ParseResult) -> Vec<&str> {
    result
        .candidates
        .iter()
        .map(|s| s.student_id.as_str())
        .collect()
}

// --- WORKED SCENARIOS ---

#[test]
fn test_dob_hint_picks_one_of_two_namesakes() {
    let r = parse("Tuấn 14/5 nói chuyện", "8B03");
    assert_eq!(r.match_type, MatchType::Exact);
    assert_eq!(ids(&r), vec!["8B03_001"]);
    assert_eq!(r.candidates[0].dob.as_deref(), Some("2012-05-14"));
    assert_eq!(
        r.identified_tag.as_ref().map(|t| t.label.as_str()),
        Some("Nói chuyện riêng")
    );
    assert!(!r.is_ambiguous());
}

#[test]
fn test_namesakes_without_hint_need_confirmation() {
    let r = parse("Tuấn nói chuyện", "8B03");
    assert_eq!(r.match_type, MatchType::Multi);
    assert_eq!(ids(&r), vec!["8B03_001", "8B03_002"]);
    assert!(r.identified_tag.is_some());
    assert!(r.is_ambiguous());
}

#[test]
fn test_class_switch_only() {
    let r = parse("chuyển 6A03", "8B03");
    assert_eq!(r.match_type, MatchType::None);
    assert!(r.candidates.is_empty());
    assert_eq!(r.context_override.class_code.as_deref(), Some("6A03"));
    assert!(r.identified_tag.is_none());
}

#[test]
fn test_single_name_preselects() {
    let r = parse("Kiên", "8B03");
    assert_eq!(r.match_type, MatchType::Exact);
    assert_eq!(ids(&r), vec!["8B03_003"]);
    assert!(r.identified_tag.is_none());
}

#[test]
fn test_unrecognized_input() {
    let r = parse("xin chào", "8B03");
    assert_eq!(r.match_type, MatchType::None);
    assert!(r.candidates.is_empty());
    assert!(r.identified_tag.is_none());
    assert!(r.context_override.is_empty());
    assert_eq!(r.raw_text, "xin chào");
}

// --- CLASS CONTEXT ---

#[test]
fn test_class_code_redirects_name_matching() {
    // "Kiên" exists in both classes; the code in the text decides which one.
    let r = parse("6a03 Kiên nói leo", "8B03");
    assert_eq!(r.context_override.class_code.as_deref(), Some("6A03"));
    assert_eq!(ids(&r), vec!["6A03_002"]);
    assert_eq!(r.identified_tag.unwrap().label, "Nói leo");
}

#[test]
fn test_students_of_other_classes_are_ignored() {
    let r = parse("Huy tích cực", "8B03");
    assert_eq!(r.match_type, MatchType::None);
    // Nobody to tag and no context: the tag is dropped.
    assert!(r.identified_tag.is_none());
}

#[test]
fn test_tag_survives_when_context_is_present() {
    let r = parse("8B03 nói leo", "6A03");
    assert_eq!(r.match_type, MatchType::None);
    assert_eq!(r.identified_tag.unwrap().label, "Nói leo");
}

// --- DATES ---

#[test]
fn test_weekday_resolves_to_next_occurrence() {
    let r = parse("thứ 4 Kiên nói leo", "8B03");
    assert_eq!(r.context_override.day_of_week, Some(4));
    assert_eq!(
        r.context_override.date,
        NaiveDate::from_ymd_opt(2026, 10, 21)
    );
    assert_eq!(ids(&r), vec!["8B03_003"]);
}

#[test]
fn test_weekday_naming_today_is_today() {
    let r = parse("thứ hai Kiên", "8B03");
    assert_eq!(r.context_override.day_of_week, Some(2));
    assert_eq!(r.context_override.date, Some(monday()));
}

#[test]
fn test_sunday_is_day_eight() {
    let r = parse("Chủ nhật Kiên", "8B03");
    assert_eq!(r.context_override.day_of_week, Some(8));
    assert_eq!(
        r.context_override.date,
        NaiveDate::from_ymd_opt(2026, 10, 25)
    );
}

#[test]
fn test_full_date_accepts_both_separators() {
    for text in ["Kiên nói leo 20/10/2026", "Kiên nói leo 20-10-2026"] {
        let r = parse(text, "8B03");
        assert_eq!(
            r.context_override.date,
            NaiveDate::from_ymd_opt(2026, 10, 20),
            "input: {}",
            text
        );
        assert_eq!(r.context_override.day_of_week, None);
        assert_eq!(r.match_type, MatchType::Exact);
    }
}

#[test]
fn test_full_date_overrides_weekday_date() {
    let r = parse("thứ 3 05/01/2026 Kiên", "8B03");
    assert_eq!(r.context_override.day_of_week, Some(3));
    assert_eq!(r.context_override.date, NaiveDate::from_ymd_opt(2026, 1, 5));
}

#[test]
fn test_full_date_is_not_a_dob_hint() {
    // 14/05/2026 is a logging date, not a birthday: both Tuấn stay candidates.
    let r = parse("Tuấn nói chuyện 14/05/2026", "8B03");
    assert_eq!(r.match_type, MatchType::Multi);
    assert_eq!(r.context_override.date, NaiveDate::from_ymd_opt(2026, 5, 14));
}

// --- BIRTHDAY HINT ---

#[test]
fn test_dob_hint_accepts_dot_and_dash() {
    for text in ["Tuấn 27.10 nói chuyện", "Tuấn 27-10 nói chuyện"] {
        let r = parse(text, "8B03");
        assert_eq!(ids(&r), vec!["8B03_002"], "input: {}", text);
    }
}

#[test]
fn test_dob_hint_never_filters_to_nothing() {
    let r = parse("Tuấn 01/01 nói chuyện", "8B03");
    assert_eq!(r.match_type, MatchType::Multi);
    assert_eq!(r.candidates.len(), 2);
}

#[test]
fn test_dob_hint_is_ignored_for_single_candidate() {
    let r = parse("Kiên 01/01", "8B03");
    assert_eq!(r.match_type, MatchType::Exact);
    assert_eq!(ids(&r), vec!["8B03_003"]);
}

#[test]
fn test_strict_mode_gives_same_candidates() {
    let loose = parse_in("Tuấn 14/5 nói chuyện", "8B03", false);
    let strict = parse_in("Tuấn 14/5 nói chuyện", "8B03", true);
    assert_eq!(ids(&loose), ids(&strict));
    assert_eq!(loose.identified_tag, strict.identified_tag);
}

#[test]
fn test_unique_name_parses_back_to_its_student() {
    let roster = roster();
    for student in roster.iter().filter(|s| s.class_code == "8B03") {
        let shown = student.unique_name(&roster);
        let r = parse(&shown, "8B03");
        assert_eq!(r.match_type, MatchType::Exact, "input: {}", shown);
        assert_eq!(r.candidates[0].student_id, student.student_id);
    }
}

// --- TAGS ---

#[test]
fn test_longest_label_wins() {
    let tags = vec![
        TagOption::new("short", "Nói", EventType::Note, EventCategory::Other, 0),
        TagOption::new("long", "Nói leo", EventType::Violation, EventCategory::Discipline, -1),
    ];
    let options = ParseOptions {
        today: monday(),
        strict_dob_hint: false,
        pin_class: false,
    };
    let r = parse_with_options(
        "Kiên nói leo",
        &roster(),
        &tags,
        "8B03",
        &SynonymTable::empty(),
        &options,
    );
    assert_eq!(r.identified_tag.unwrap().id, "long");
}

#[test]
fn test_synonym_matches_tag() {
    let r = parse("Hà giơ tay", "8B03");
    assert_eq!(r.match_type, MatchType::Exact);
    assert_eq!(r.identified_tag.unwrap().label, "Tích cực");
}

#[test]
fn test_injected_synonyms_replace_builtin() {
    let mut synonyms = SynonymTable::empty();
    synonyms.insert("Tích cực", ["hăng hái"]);
    let options = ParseOptions {
        today: monday(),
        strict_dob_hint: false,
        pin_class: false,
    };
    let found = parse_with_options(
        "Hà hăng hái",
        &roster(),
        &catalog(),
        "8B03",
        &synonyms,
        &options,
    );
    assert_eq!(found.identified_tag.unwrap().label, "Tích cực");

    let missed = parse_with_options(
        "Hà giơ tay",
        &roster(),
        &catalog(),
        "8B03",
        &synonyms,
        &options,
    );
    assert!(missed.identified_tag.is_none());
}

#[test]
fn test_default_catalog_end_to_end() {
    let tags = ChipGroup::flatten(&default_chip_groups());
    let options = ParseOptions {
        today: monday(),
        strict_dob_hint: false,
        pin_class: false,
    };
    let r = parse_with_options(
        "Kiên quên vở",
        &roster(),
        &tags,
        "8B03",
        &SynonymTable::default(),
        &options,
    );
    assert_eq!(r.match_type, MatchType::Exact);
    assert_eq!(r.identified_tag.unwrap().label, "Quên vở");
}

#[test]
fn test_result_serializes_with_uppercase_match_type() {
    let r = parse("chuyển 6A03", "8B03");
    let json = serde_json::to_value(&r).unwrap();
    assert_eq!(json["match_type"], "NONE");
    assert_eq!(json["context_override"]["class_code"], "6A03");
    assert!(json["context_override"].get("date").is_none());
}

#[test]
fn test_pinned_class_reports_but_does_not_redirect() {
    let options = ParseOptions {
        today: monday(),
        strict_dob_hint: false,
        pin_class: true,
    };
    let r = parse_with_options(
        "6A03 Huy nói leo",
        &roster(),
        &catalog(),
        "8B03",
        &SynonymTable::default(),
        &options,
    );
    assert_eq!(r.context_override.class_code.as_deref(), Some("6A03"));
    assert_eq!(r.match_type, MatchType::None);
    assert!(r.candidates.is_empty());
}
