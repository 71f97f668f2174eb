//! Per-identity run guard.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::models::Identity;

/// Identities with a run in progress
#[derive(Debug, Default)]
pub(crate) struct RunRegistry {
    active: Mutex<HashSet<Identity>>,
}

impl RunRegistry {
    fn active(&self) -> MutexGuard<'_, HashSet<Identity>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim `identity` for the lifetime of the returned guard.
    pub(crate) fn acquire(&self, identity: &Identity) -> Result<RunGuard<'_>> {
        if !self.active().insert(identity.clone()) {
            return Err(Error::AlreadyRunning(identity.to_string()));
        }
        Ok(RunGuard {
            registry: self,
            identity: identity.clone(),
        })
    }

    pub(crate) fn is_running(&self, identity: &Identity) -> bool {
        self.active().contains(identity)
    }
}

/// Releases the identity on drop
pub(crate) struct RunGuard<'a> {
    registry: &'a RunRegistry,
    identity: Identity,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.registry.active().remove(&self.identity);
    }
}
