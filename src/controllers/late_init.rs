//! Backfill of unset desired fields from observed values.

/// Tracks whether any late-initialization changed the desired parameters.
///
/// A field is only filled while it is unset, so running the same backfill
/// twice reports no change the second time.
#[derive(Debug, Default)]
pub struct LateInitializer {
    changed: bool,
}

impl LateInitializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill `current` from `observed` when `current` is unset and the
    /// server reported a value.
    pub fn option<T: Clone>(&mut self, current: &mut Option<T>, observed: Option<&T>) {
        if current.is_some() {
            return;
        }
        if let Some(value) = observed {
            *current = Some(value.clone());
            self.changed = true;
        }
    }

    /// Record a backfill performed outside [`LateInitializer::option`].
    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }
}
