//! Random identifiers for tracked files and change records.

use compact_str::CompactString;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::RepoConfig;
use crate::record::{ChangeId, Prefix};

/// Generates file prefixes and change ids.
///
/// Every id is checked against the caller's set of taken ids and regenerated
/// on collision, so returned ids are unique within the repository.
pub struct IdGenerator {
    rng: StdRng,
    prefix_length: usize,
    change_id_length: usize,
}

impl IdGenerator {
    /// Create a generator seeded from OS entropy.
    pub fn new(config: &RepoConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a deterministic generator.
    pub fn seeded(config: &RepoConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &RepoConfig, rng: StdRng) -> Self {
        Self {
            rng,
            prefix_length: config.prefix_length,
            change_id_length: config.change_id_length,
        }
    }

    /// Generate a prefix for which `taken` returns false.
    pub fn new_file_prefix(&mut self, taken: impl Fn(&Prefix) -> bool) -> Prefix {
        loop {
            let prefix = Prefix::new(self.token(self.prefix_length));
            if !taken(&prefix) {
                return prefix;
            }
        }
    }

    /// Generate a change id for which `taken` returns false.
    pub fn new_change_id(&mut self, taken: impl Fn(&ChangeId) -> bool) -> ChangeId {
        loop {
            let id = ChangeId::new(self.token(self.change_id_length));
            if !taken(&id) {
                return id;
            }
        }
    }

    fn token(&mut self, len: usize) -> CompactString {
        (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_lengths_follow_config() {
        let config = RepoConfig::builder()
            .prefix_length(5usize)
            .change_id_length(12usize)
            .build()
            .unwrap();
        let mut ids = IdGenerator::seeded(&config, 7);

        let prefix = ids.new_file_prefix(|_| false);
        let change = ids.new_change_id(|_| false);

        assert_eq!(prefix.as_str().len(), 5);
        assert_eq!(change.as_str().len(), 12);
        assert!(change.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_seeded_is_deterministic() {
        let config = RepoConfig::default();
        let a = IdGenerator::seeded(&config, 42).new_file_prefix(|_| false);
        let b = IdGenerator::seeded(&config, 42).new_file_prefix(|_| false);
        assert_eq!(a, b);
    }

    #[test]
    fn test_collision_regenerates() {
        let config = RepoConfig::default();
        let first = IdGenerator::seeded(&config, 3).new_file_prefix(|_| false);

        let attempts = Cell::new(0);
        let mut ids = IdGenerator::seeded(&config, 3);
        let second = ids.new_file_prefix(|p| {
            attempts.set(attempts.get() + 1);
            p == &first
        });

        assert_ne!(first, second);
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_change_ids_are_unique() {
        let mut ids = IdGenerator::new(&RepoConfig::default());
        let seen: HashSet<ChangeId> = (0..500).map(|_| ids.new_change_id(|_| false)).collect();
        assert_eq!(seen.len(), 500);
    }
}
