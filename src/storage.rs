// Local JSON snapshots (roster, catalog, timetable) and the event log.
//
// Snapshots are read-only inputs exported from the school spreadsheet. The
// event log (plus the id list of its last batch, for undo) is the only data
// this crate writes besides the config; writes are serialized through an
// exclusive lock file and land atomically.
use crate::context::AppContext;
use crate::model::item::default_chip_groups;
use crate::model::{AppEvent, ChipGroup, Role, Student, TagOption};
use crate::timetable::TimetableRow;
use anyhow::{Context, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read-only reference data handed to the parser and the session.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub roster: Vec<Student>,
    pub chip_groups: Vec<ChipGroup>,
    pub timetable: Vec<TimetableRow>,
}

impl Snapshot {
    /// Tags visible to `role`: its own groups plus the shared reminder group.
    /// Catalogs with custom group ids fall back to every tag.
    pub fn catalog_for(&self, role: Role) -> Vec<TagOption> {
        let prefix = match role {
            Role::SubjectTeacher => "g-gvbm",
            Role::HomeroomTeacher => "g-gvcn",
        };
        let scoped: Vec<ChipGroup> = self
            .chip_groups
            .iter()
            .filter(|g| g.id.starts_with(prefix) || g.id == "g-note")
            .cloned()
            .collect();
        if scoped.is_empty() {
            ChipGroup::flatten(&self.chip_groups)
        } else {
            ChipGroup::flatten(&scoped)
        }
    }

    pub fn classes(&self) -> Vec<String> {
        let mut classes: Vec<String> = self
            .roster
            .iter()
            .filter(|s| s.is_active())
            .map(|s| s.class_code.clone())
            .collect();
        classes.sort();
        classes.dedup();
        classes
    }
}

pub struct LocalStorage;

impl LocalStorage {
    fn get_lock_path(file_path: &Path) -> PathBuf {
        let mut p = file_path.to_path_buf();
        if let Some(ext) = p.extension() {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".lock");
            p.set_extension(new_ext);
        } else {
            p.set_extension("lock");
        }
        p
    }

    /// Runs `f` while holding an exclusive lock on `file_path`'s lock file.
    pub fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let lock_path = Self::get_lock_path(file_path);
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        file.lock_exclusive()?;
        let result = f();
        file.unlock()?;
        result
    }

    /// Atomic write: Write to .tmp file then rename
    pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(tmp_path, path)?;
        Ok(())
    }

    fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        let value = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse '{}'", path.display()))?;
        Ok(Some(value))
    }

    pub fn load_roster(ctx: &dyn AppContext) -> Result<Vec<Student>> {
        let path = ctx.get_roster_path()?;
        let roster = Self::load_json(&path)?.unwrap_or_else(|| {
            log::warn!("No roster at {}, starting empty", path.display());
            Vec::new()
        });
        Ok(roster)
    }

    pub fn load_chip_groups(ctx: &dyn AppContext) -> Result<Vec<ChipGroup>> {
        let path = ctx.get_chip_groups_path()?;
        Ok(Self::load_json(&path)?.unwrap_or_else(default_chip_groups))
    }

    pub fn load_timetable(ctx: &dyn AppContext) -> Result<Vec<TimetableRow>> {
        let path = ctx.get_timetable_path()?;
        Ok(Self::load_json(&path)?.unwrap_or_default())
    }

    pub fn load_snapshot(ctx: &dyn AppContext) -> Result<Snapshot> {
        Ok(Snapshot {
            roster: Self::load_roster(ctx)?,
            chip_groups: Self::load_chip_groups(ctx)?,
            timetable: Self::load_timetable(ctx)?,
        })
    }

    pub fn save_snapshot(ctx: &dyn AppContext, snapshot: &Snapshot) -> Result<()> {
        let targets = [
            (ctx.get_roster_path()?, serde_json::to_string_pretty(&snapshot.roster)?),
            (
                ctx.get_chip_groups_path()?,
                serde_json::to_string_pretty(&snapshot.chip_groups)?,
            ),
            (
                ctx.get_timetable_path()?,
                serde_json::to_string_pretty(&snapshot.timetable)?,
            ),
        ];
        for (path, json) in targets {
            Self::with_lock(&path, || Self::atomic_write(&path, &json))?;
        }
        Ok(())
    }

    // --- EVENT LOG ---

    pub fn load_events(ctx: &dyn AppContext) -> Result<Vec<AppEvent>> {
        let path = ctx.get_events_path()?;
        Self::with_lock(&path, || Ok(Self::load_json(&path)?.unwrap_or_default()))
    }

    /// Appends `events` to the log, marking them as not yet synced.
    pub fn append_events(ctx: &dyn AppContext, events: &[AppEvent]) -> Result<usize> {
        if events.is_empty() {
            return Ok(0);
        }
        let path = ctx.get_events_path()?;
        Self::with_lock(&path, || {
            let mut all: Vec<AppEvent> = Self::load_json(&path)?.unwrap_or_default();
            all.extend(events.iter().cloned().map(|mut e| {
                e.synced = false;
                e
            }));
            let json = serde_json::to_string_pretty(&all)?;
            Self::atomic_write(&path, json)?;
            log::info!("Stored {} event(s), log now holds {}", events.len(), all.len());
            Ok(all.len())
        })
    }

    /// Appends one logged batch and remembers its ids so it can be undone.
    /// Returns the stored event ids.
    pub fn record_batch(ctx: &dyn AppContext, events: &[AppEvent]) -> Result<Vec<String>> {
        let ids: Vec<String> = events.iter().map(|e| e.event_id.clone()).collect();
        if ids.is_empty() {
            return Ok(ids);
        }
        Self::append_events(ctx, events)?;
        let batch_path = ctx.get_last_batch_path()?;
        Self::with_lock(&batch_path, || {
            Self::atomic_write(&batch_path, serde_json::to_string_pretty(&ids)?)
        })?;
        Ok(ids)
    }

    /// Deletes the events of the last recorded batch. Returns the ids that
    /// were actually removed; empty when there is nothing to undo.
    pub fn undo_last_batch(ctx: &dyn AppContext) -> Result<Vec<String>> {
        let batch_path = ctx.get_last_batch_path()?;
        let ids: Vec<String> = Self::with_lock(&batch_path, || {
            let ids: Vec<String> = Self::load_json(&batch_path)?.unwrap_or_default();
            if batch_path.exists() {
                fs::remove_file(&batch_path)
                    .with_context(|| format!("Failed to remove {:?}", batch_path))?;
            }
            Ok(ids)
        })?;
        if ids.is_empty() {
            return Ok(ids);
        }

        let path = ctx.get_events_path()?;
        Self::with_lock(&path, || {
            let mut all: Vec<AppEvent> = Self::load_json(&path)?.unwrap_or_default();
            let removed: Vec<String> = all
                .iter()
                .filter(|e| ids.contains(&e.event_id))
                .map(|e| e.event_id.clone())
                .collect();
            if !removed.is_empty() {
                all.retain(|e| !ids.contains(&e.event_id));
                Self::atomic_write(&path, serde_json::to_string_pretty(&all)?)?;
            }
            log::info!("Undid {} event(s)", removed.len());
            Ok(removed)
        })
    }

    /// Removes one event by id. Returns whether anything was removed.
    pub fn delete_event(ctx: &dyn AppContext, event_id: &str) -> Result<bool> {
        let path = ctx.get_events_path()?;
        Self::with_lock(&path, || {
            let mut all: Vec<AppEvent> = Self::load_json(&path)?.unwrap_or_default();
            let before = all.len();
            all.retain(|e| e.event_id != event_id);
            if all.len() == before {
                return Ok(false);
            }
            Self::atomic_write(&path, serde_json::to_string_pretty(&all)?)?;
            Ok(true)
        })
    }
}
