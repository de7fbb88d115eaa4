//! Two-phase local cache of one owner's readings.
//!
//! Mutations are applied tentatively before the remote write is attempted:
//! `stage_*` saves the prior list and applies the change locally, then the
//! caller either `commit`s (the write succeeded) or `rollback`s with the
//! store's authoritative rows (any failure path). At most one tentative
//! mutation is outstanding at a time.

use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Reading, ReadingPatch};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("a tentative mutation is already in flight")]
    MutationInFlight,
    #[error("no tentative mutation to resolve")]
    NothingStaged,
    #[error("reading {0} is not present in the cache")]
    NotFound(Uuid),
}

#[derive(Debug)]
enum CacheState {
    Clean,
    /// The list as it was before the tentative mutation.
    Tentative { snapshot: Vec<Reading> },
}

#[derive(Debug)]
pub struct ReadingCache {
    readings: Vec<Reading>,
    state: CacheState,
}

impl ReadingCache {
    pub fn new(mut readings: Vec<Reading>) -> Self {
        sort_newest_first(&mut readings);
        Self {
            readings,
            state: CacheState::Clean,
        }
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn is_tentative(&self) -> bool {
        matches!(self.state, CacheState::Tentative { .. })
    }

    fn begin(&mut self) -> Result<(), CacheError> {
        if self.is_tentative() {
            return Err(CacheError::MutationInFlight);
        }
        self.state = CacheState::Tentative {
            snapshot: self.readings.clone(),
        };
        Ok(())
    }

    /// Tentatively add a reading the store has not confirmed yet.
    pub fn stage_insert(&mut self, reading: Reading) -> Result<(), CacheError> {
        self.begin()?;
        self.readings.push(reading);
        sort_newest_first(&mut self.readings);
        Ok(())
    }

    /// Tentatively apply a partial update to a cached reading.
    pub fn stage_update(&mut self, id: Uuid, patch: &ReadingPatch) -> Result<(), CacheError> {
        if !self.readings.iter().any(|r| r.id == id) {
            return Err(CacheError::NotFound(id));
        }
        self.begin()?;

        let reading = self
            .readings
            .iter_mut()
            .find(|r| r.id == id)
            .expect("presence checked above");
        if let Some(date) = patch.date {
            reading.date = date;
        }
        if let Some(utility_type) = patch.utility_type {
            reading.utility_type = utility_type;
        }
        if let Some(usage) = patch.usage {
            reading.usage = usage;
        }
        if let Some(notes) = &patch.notes {
            reading.notes = Some(notes.clone());
        }

        sort_newest_first(&mut self.readings);
        Ok(())
    }

    /// Tentatively remove a cached reading.
    pub fn stage_delete(&mut self, id: Uuid) -> Result<(), CacheError> {
        if !self.readings.iter().any(|r| r.id == id) {
            return Err(CacheError::NotFound(id));
        }
        self.begin()?;
        self.readings.retain(|r| r.id != id);
        Ok(())
    }

    /// Tentative -> Committed: the remote write succeeded, keep the new list.
    pub fn commit(&mut self) -> Result<(), CacheError> {
        match self.state {
            CacheState::Tentative { .. } => {
                self.state = CacheState::Clean;
                Ok(())
            }
            CacheState::Clean => Err(CacheError::NothingStaged),
        }
    }

    /// Tentative -> RolledBack: discard the tentative list and resynchronize
    /// from the store's authoritative rows.
    pub fn rollback(&mut self, authoritative: Vec<Reading>) -> Result<(), CacheError> {
        match self.state {
            CacheState::Tentative { .. } => {
                self.resync(authoritative);
                Ok(())
            }
            CacheState::Clean => Err(CacheError::NothingStaged),
        }
    }

    /// Replace the cached list with the store's rows, clearing any state.
    pub fn resync(&mut self, mut authoritative: Vec<Reading>) {
        sort_newest_first(&mut authoritative);
        self.readings = authoritative;
        self.state = CacheState::Clean;
    }
}

/// The list view shows most recent readings first.
fn sort_newest_first(readings: &mut [Reading]) {
    readings.sort_by(|a, b| b.date.cmp(&a.date));
}
