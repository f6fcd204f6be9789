use std::collections::BTreeMap;

use log::{info, warn};

use stagequest_core::clock::unix_millis_now;
use stagequest_core::records::StageControlEntry;
use stagequest_core::{Environment, Stage};

use crate::backend::StageControlRegistry;
use crate::config::EngineConfig;
use crate::error::EngineError;

/// Admin-panel client for the stage registry.
///
/// Environment scoping is first-class: every read and write carries the
/// configured environment, and the write lock is evaluated once from
/// configuration — when it holds, writes are refused locally before any
/// network call is made.
pub struct StageAdminClient<R: StageControlRegistry> {
    registry: R,
    environment: Environment,
    write_locked: bool,
    admin_user: String,
    cache: BTreeMap<Stage, StageControlEntry>,
}

impl<R: StageControlRegistry> StageAdminClient<R> {
    pub fn new(registry: R, config: &EngineConfig, admin_user: &str) -> Self {
        let write_locked = config.write_lock_active();
        if write_locked {
            warn!(
                "admin write lock active: environment '{}' on host '{}'",
                config.environment(),
                config.host()
            );
        }
        Self {
            registry,
            environment: config.environment(),
            write_locked,
            admin_user: admin_user.to_string(),
            cache: BTreeMap::new(),
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn write_locked(&self) -> bool {
        self.write_locked
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    /// Fetches the registry listing for this environment. Stages with no
    /// row get an implied disabled entry so the panel always shows all 16.
    pub fn refresh(&mut self) -> Result<Vec<StageControlEntry>, EngineError> {
        let listed = self.registry.list_stages(self.environment)?;
        self.cache = listed
            .into_iter()
            .filter(|e| e.environment == self.environment)
            .map(|e| (e.stage, e))
            .collect();
        Ok(Stage::all()
            .map(|stage| {
                self.cache
                    .get(&stage)
                    .cloned()
                    .unwrap_or_else(|| StageControlEntry::disabled(self.environment, stage))
            })
            .collect())
    }

    /// Enabled state from the last refresh. Unknown stages are disabled.
    pub fn is_stage_enabled(&self, stage: Stage) -> bool {
        self.cache.get(&stage).map(|e| e.is_enabled).unwrap_or(false)
    }

    pub fn set_enabled(&mut self, stage: Stage, enabled: bool) -> Result<(), EngineError> {
        self.guard_writes()?;
        let mut entry = self.entry_for(stage)?;
        entry.is_enabled = enabled;
        self.push(entry)?;
        info!(
            "stage {stage} {} in '{}' by {}",
            if enabled { "enabled" } else { "disabled" },
            self.environment,
            self.admin_user
        );
        Ok(())
    }

    pub fn set_notes(&mut self, stage: Stage, notes: &str) -> Result<(), EngineError> {
        self.guard_writes()?;
        let mut entry = self.entry_for(stage)?;
        entry.notes = if notes.is_empty() {
            None
        } else {
            Some(notes.to_string())
        };
        self.push(entry)?;
        Ok(())
    }

    /// Applies one enabled flag to several stages. Stops at the first
    /// failed write so the panel can re-refresh and show actual state.
    pub fn bulk_set_enabled(&mut self, stages: &[Stage], enabled: bool) -> Result<(), EngineError> {
        self.guard_writes()?;
        for stage in stages {
            self.set_enabled(*stage, enabled)?;
        }
        Ok(())
    }

    fn guard_writes(&self) -> Result<(), EngineError> {
        if self.write_locked {
            return Err(EngineError::WriteLocked);
        }
        Ok(())
    }

    fn entry_for(&mut self, stage: Stage) -> Result<StageControlEntry, EngineError> {
        let mut entry = self
            .cache
            .get(&stage)
            .cloned()
            .unwrap_or_else(|| StageControlEntry::disabled(self.environment, stage));
        entry.updated_at = unix_millis_now()?;
        entry.updated_by = Some(self.admin_user.clone());
        Ok(entry)
    }

    fn push(&mut self, entry: StageControlEntry) -> Result<(), EngineError> {
        self.registry.upsert_control(&entry)?;
        self.cache.insert(entry.stage, entry);
        Ok(())
    }
}
