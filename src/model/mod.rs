// File: ./src/model/mod.rs
pub mod display;
pub mod event;
pub mod item;
pub mod matcher;
pub mod parser;

pub use display::StudentDisplay;
pub use event::{AppEvent, EventDraft, EventSource, Role, Scope, TeacherProfile};
pub use item::{ChipGroup, EventCategory, EventType, Student, StudentStatus, TagOption};
pub use matcher::{DobHint, SynonymTable};
pub use parser::{
    ContextOverride, MatchType, ParseOptions, ParseResult, parse_natural_language_input,
    parse_with_options,
};
