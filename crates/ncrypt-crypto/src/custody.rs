// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session-scoped custody of the master key bundle.
//!
//! [`SessionKeyCustody`] holds zero or one [`MasterKeyBundle`] and is the single
//! source of truth for "is a key available". The bundle is swapped atomically
//! and never mutated in place, so readers see either the old bundle, the new
//! one, or nothing.
//!
//! Authentication flows install a bundle through [`SessionKeyCustody::acquire`],
//! which returns a [`CustodyGuard`]. Unless the guard is committed, dropping it
//! clears custody. That covers error returns, panics, and futures that are
//! dropped before completing. A guard only ever clears the bundle it
//! installed itself; if another flow has installed a newer bundle since, that
//! one stays.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use ncrypt_core::NcryptError;
use tracing::{debug, warn};

use crate::kdf::MasterKeyBundle;

/// Holder for the session's master key bundle.
#[derive(Default)]
pub struct SessionKeyCustody {
    slot: ArcSwapOption<MasterKeyBundle>,
}

impl SessionKeyCustody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the resident bundle.
    pub fn set(&self, bundle: MasterKeyBundle) {
        self.slot.store(Some(Arc::new(bundle)));
        debug!("master key installed in session custody");
    }

    /// The resident bundle, or [`NcryptError::MissingMasterKey`].
    pub fn get(&self) -> Result<Arc<MasterKeyBundle>, NcryptError> {
        self.slot.load_full().ok_or(NcryptError::MissingMasterKey)
    }

    pub fn is_present(&self) -> bool {
        self.slot.load().is_some()
    }

    /// Drop the resident bundle, if any.
    pub fn clear(&self) {
        if self.slot.swap(None).is_some() {
            debug!("master key cleared from session custody");
        }
    }

    /// Install `bundle` for the duration of an authentication flow.
    ///
    /// The bundle stays resident only if [`CustodyGuard::commit`] is called.
    pub fn acquire(&self, bundle: MasterKeyBundle) -> CustodyGuard<'_> {
        let installed = Arc::new(bundle);
        self.slot.store(Some(Arc::clone(&installed)));
        debug!("master key installed in session custody");
        CustodyGuard {
            custody: self,
            installed: Some(installed),
            committed: false,
        }
    }
}

impl std::fmt::Debug for SessionKeyCustody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeyCustody")
            .field("present", &self.is_present())
            .finish()
    }
}

/// Scope guard returned by [`SessionKeyCustody::acquire`].
#[must_use = "dropping the guard without commit() clears the session key"]
pub struct CustodyGuard<'a> {
    custody: &'a SessionKeyCustody,
    // `Option` so it can be compared against the slot as-is.
    installed: Option<Arc<MasterKeyBundle>>,
    committed: bool,
}

impl CustodyGuard<'_> {
    /// Keep the bundle resident after the guard goes out of scope.
    pub fn commit(mut self) {
        self.committed = true;
    }

    /// The bundle installed by this guard, whether or not it is still resident.
    pub fn bundle(&self) -> Result<Arc<MasterKeyBundle>, NcryptError> {
        self.installed.clone().ok_or(NcryptError::MissingMasterKey)
    }
}

impl Drop for CustodyGuard<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let previous = self.custody.slot.compare_and_swap(&self.installed, None);
        let cleared = match (&*previous, &self.installed) {
            (Some(resident), Some(installed)) => Arc::ptr_eq(resident, installed),
            _ => false,
        };
        if cleared {
            warn!("authentication did not complete; clearing session key");
        } else {
            debug!("abandoned authentication's key was already replaced; leaving custody as is");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::{KdfParams, derive_master_key_with};
    use secrecy::SecretString;
    use tracing_test::traced_test;

    fn bundle(password: &str) -> MasterKeyBundle {
        derive_master_key_with(
            &SecretString::from(password.to_string()),
            &KdfParams::with_iterations(1_000).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn empty_custody_reports_missing_key() {
        let custody = SessionKeyCustody::new();
        assert!(!custody.is_present());
        assert!(matches!(custody.get(), Err(NcryptError::MissingMasterKey)));
    }

    #[test]
    fn set_get_clear_lifecycle() {
        let custody = SessionKeyCustody::new();
        custody.set(bundle("alpha"));
        assert!(custody.is_present());
        custody.get().unwrap().verify().unwrap();

        custody.clear();
        assert!(!custody.is_present());
        // Clearing twice is harmless.
        custody.clear();
    }

    #[test]
    fn set_replaces_previous_bundle() {
        let custody = SessionKeyCustody::new();
        custody.set(bundle("first"));
        let first = custody.get().unwrap();
        custody.set(bundle("second"));
        let second = custody.get().unwrap();

        assert!(!first.same_key_as(&second));
        // Readers holding the old Arc keep a consistent view.
        first.verify().unwrap();
    }

    #[test]
    fn committed_guard_keeps_key() {
        let custody = SessionKeyCustody::new();
        let guard = custody.acquire(bundle("keep"));
        guard.bundle().unwrap().verify().unwrap();
        guard.commit();
        assert!(custody.is_present());
    }

    #[test]
    fn abandoned_guard_leaves_newer_committed_key() {
        let custody = SessionKeyCustody::new();
        let stale = custody.acquire(bundle("stale"));
        let fresh = custody.acquire(bundle("fresh"));
        let fresh_bundle = fresh.bundle().unwrap();
        fresh.commit();

        drop(stale);
        let resident = custody.get().unwrap();
        assert!(Arc::ptr_eq(&resident, &fresh_bundle));
    }

    #[test]
    fn abandoned_guard_leaves_key_set_directly() {
        let custody = SessionKeyCustody::new();
        let guard = custody.acquire(bundle("flow"));
        custody.set(bundle("direct"));
        drop(guard);
        assert!(custody.is_present());
        assert!(custody.get().unwrap().same_key_as(&bundle("direct")));
    }

    #[test]
    fn overlapping_guards_both_abandoned_leave_nothing() {
        let custody = SessionKeyCustody::new();
        let first = custody.acquire(bundle("one"));
        let second = custody.acquire(bundle("two"));
        drop(second);
        assert!(!custody.is_present());
        drop(first);
        assert!(!custody.is_present());
    }

    #[traced_test]
    #[test]
    fn dropped_guard_clears_key() {
        let custody = SessionKeyCustody::new();
        {
            let _guard = custody.acquire(bundle("discard"));
            assert!(custody.is_present());
        }
        assert!(!custody.is_present());
        assert!(logs_contain("clearing session key"));
    }

    #[test]
    fn guard_clears_on_early_error_return() {
        fn flow(custody: &SessionKeyCustody) -> Result<(), NcryptError> {
            let guard = custody.acquire(bundle("early"));
            Err::<(), _>(NcryptError::Api {
                status: 401,
                detail: "Incorrect email or password".into(),
            })?;
            guard.commit();
            Ok(())
        }

        let custody = SessionKeyCustody::new();
        assert!(flow(&custody).is_err());
        assert!(!custody.is_present());
    }

    #[tokio::test]
    async fn guard_clears_when_future_is_dropped() {
        let custody = SessionKeyCustody::new();
        let pending = async {
            let guard = custody.acquire(bundle("cancelled"));
            std::future::pending::<()>().await;
            guard.commit();
        };
        // Time out the flow: the future is dropped mid-flight.
        let res = tokio::time::timeout(std::time::Duration::from_millis(10), pending).await;
        assert!(res.is_err());
        assert!(!custody.is_present());
    }
}
