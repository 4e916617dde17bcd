//! Per-projection visibility cache.
//!
//! Each projection owns one cache, so shown/hidden state is never shared
//! between projections and several may be alive at once.

use crate::filter::oracle::VisibilityOracle;
use crate::model::dive::DiveId;
use crate::repo::dive_repo::DiveRepository;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct VisibilityCache {
    shown: HashMap<DiveId, bool>,
}

impl VisibilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached state; dives never evaluated count as hidden.
    pub fn is_shown(&self, id: DiveId) -> bool {
        self.shown.get(&id).copied().unwrap_or(false)
    }

    /// Stores a new state and reports whether it differs from the old one.
    pub fn set(&mut self, id: DiveId, shown: bool) -> bool {
        self.shown.insert(id, shown) != Some(shown)
    }

    /// Asks the oracle about one dive and stores the answer.
    ///
    /// Returns `(shown, changed)`. Dives unknown to the store are hidden.
    pub fn evaluate(
        &mut self,
        id: DiveId,
        store: &dyn DiveRepository,
        oracle: &dyn VisibilityOracle,
    ) -> (bool, bool) {
        let shown = store
            .dive(id)
            .map(|dive| oracle.show_dive(dive, store))
            .unwrap_or(false);
        (shown, self.set(id, shown))
    }

    pub fn forget(&mut self, id: DiveId) {
        self.shown.remove(&id);
    }

    pub fn clear(&mut self) {
        self.shown.clear();
    }

    /// Number of shown dives among `ids`.
    pub fn count_shown<I>(&self, ids: I) -> usize
    where
        I: IntoIterator<Item = DiveId>,
    {
        ids.into_iter().filter(|id| self.is_shown(*id)).count()
    }
}
