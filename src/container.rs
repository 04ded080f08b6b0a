use std::sync::Mutex;

/// Classes of a mod that look like configuration screens
///
/// Owned by whatever represents the mod (and outlives any single provider): the provider only
/// ever appends to it.
#[derive(Debug, Default)]
pub struct ConfigGuiCandidates {
    names: Mutex<Vec<String>>,
}

impl ConfigGuiCandidates {
    pub fn new() -> ConfigGuiCandidates {
        ConfigGuiCandidates::default()
    }

    /// Record a candidate (internal name)
    pub fn add(&self, name: impl Into<String>) {
        self.lock().push(name.into());
    }

    /// Snapshot of the candidates, in the order they were found
    pub fn names(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().iter().any(|candidate| candidate == name)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.names
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
