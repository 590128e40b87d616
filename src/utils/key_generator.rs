//! Short key generation.
//!
//! Two strategies are supported, selected once per deployment:
//!
//! - [`KeyStrategy::Random`] - 10 characters from an alphabet without the
//!   look-alikes `0`, `O`, `1` and `I`; every candidate is checked against
//!   storage and redrawn on collision
//! - [`KeyStrategy::Uuid`] - a random UUID v4, never checked against storage

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::domain::repositories::{StorageError, UrlRepository};

/// Length of a random key.
pub const KEY_LENGTH: usize = 10;

/// Digits and uppercase letters without visually ambiguous characters.
pub const KEY_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Maximum draws per key before giving up.
const MAX_ATTEMPTS: usize = 10;

/// How short keys are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyStrategy {
    #[default]
    Random,
    Uuid,
}

impl FromStr for KeyStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "uuid" => Ok(Self::Uuid),
            other => Err(format!(
                "unknown key strategy '{other}', expected 'random' or 'uuid'"
            )),
        }
    }
}

impl fmt::Display for KeyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => write!(f, "random"),
            Self::Uuid => write!(f, "uuid"),
        }
    }
}

/// Errors that can occur while generating keys.
#[derive(Debug, thiserror::Error)]
pub enum KeyGenerationError {
    #[error("failed to find a free key after {0} attempts")]
    Exhausted(usize),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Draws a random key of [`KEY_LENGTH`] characters from [`KEY_ALPHABET`].
pub fn random_key() -> String {
    let mut rng = rand::rng();
    (0..KEY_LENGTH)
        .map(|_| KEY_ALPHABET[rng.random_range(0..KEY_ALPHABET.len())] as char)
        .collect()
}

/// Produces a hyphenated UUID v4 key.
pub fn uuid_key() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Generates short keys according to the deployment's [`KeyStrategy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyGenerator {
    strategy: KeyStrategy,
}

impl KeyGenerator {
    pub fn new(strategy: KeyStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> KeyStrategy {
        self.strategy
    }

    /// Generates one key that is not taken in `repository`.
    ///
    /// The random strategy performs one storage lookup per attempt.
    ///
    /// # Errors
    ///
    /// Returns [`KeyGenerationError::Exhausted`] after too many collisions and
    /// [`KeyGenerationError::Storage`] if a lookup fails.
    pub async fn generate<R>(&self, repository: &R) -> Result<String, KeyGenerationError>
    where
        R: UrlRepository + ?Sized,
    {
        self.generate_excluding(repository, &HashSet::new()).await
    }

    /// Generates `count` distinct keys, none of them taken in `repository`.
    pub async fn generate_many<R>(
        &self,
        repository: &R,
        count: usize,
    ) -> Result<Vec<String>, KeyGenerationError>
    where
        R: UrlRepository + ?Sized,
    {
        let mut issued = HashSet::with_capacity(count);
        let mut keys = Vec::with_capacity(count);

        for _ in 0..count {
            let key = self.generate_excluding(repository, &issued).await?;
            issued.insert(key.clone());
            keys.push(key);
        }

        Ok(keys)
    }

    async fn generate_excluding<R>(
        &self,
        repository: &R,
        issued: &HashSet<String>,
    ) -> Result<String, KeyGenerationError>
    where
        R: UrlRepository + ?Sized,
    {
        if self.strategy == KeyStrategy::Uuid {
            return Ok(uuid_key());
        }

        for _ in 0..MAX_ATTEMPTS {
            let key = random_key();

            if issued.contains(&key) {
                continue;
            }

            if !repository.exists(&key).await? {
                return Ok(key);
            }

            tracing::debug!("Key collision on {}, retrying", key);
        }

        Err(KeyGenerationError::Exhausted(MAX_ATTEMPTS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockUrlRepository;

    #[test]
    fn test_random_key_has_correct_length() {
        assert_eq!(random_key().len(), KEY_LENGTH);
    }

    #[test]
    fn test_random_key_uses_alphabet_only() {
        for _ in 0..100 {
            let key = random_key();
            assert!(key.bytes().all(|b| KEY_ALPHABET.contains(&b)), "{key}");
        }
    }

    #[test]
    fn test_alphabet_excludes_ambiguous_characters() {
        for ambiguous in [b'0', b'O', b'1', b'I'] {
            assert!(!KEY_ALPHABET.contains(&ambiguous));
        }
    }

    #[test]
    fn test_random_keys_are_unique() {
        let keys: HashSet<_> = (0..1000).map(|_| random_key()).collect();
        assert_eq!(keys.len(), 1000);
    }

    #[test]
    fn test_uuid_key_parses() {
        let key = uuid_key();
        assert!(uuid::Uuid::parse_str(&key).is_ok());
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("random".parse::<KeyStrategy>(), Ok(KeyStrategy::Random));
        assert_eq!("UUID".parse::<KeyStrategy>(), Ok(KeyStrategy::Uuid));
        assert!("sequential".parse::<KeyStrategy>().is_err());
    }

    #[tokio::test]
    async fn test_random_strategy_retries_on_collision() {
        let mut repo = MockUrlRepository::new();
        let mut calls = 0;
        repo.expect_exists().times(3).returning(move |_| {
            calls += 1;
            Ok(calls < 3)
        });

        let key = KeyGenerator::new(KeyStrategy::Random)
            .generate(&repo)
            .await
            .unwrap();

        assert_eq!(key.len(), KEY_LENGTH);
    }

    #[tokio::test]
    async fn test_random_strategy_gives_up() {
        let mut repo = MockUrlRepository::new();
        repo.expect_exists()
            .times(MAX_ATTEMPTS)
            .returning(|_| Ok(true));

        let result = KeyGenerator::new(KeyStrategy::Random).generate(&repo).await;

        assert!(matches!(result, Err(KeyGenerationError::Exhausted(_))));
    }

    #[tokio::test]
    async fn test_uuid_strategy_skips_storage() {
        let mut repo = MockUrlRepository::new();
        repo.expect_exists().times(0);

        let keys = KeyGenerator::new(KeyStrategy::Uuid)
            .generate_many(&repo, 3)
            .await
            .unwrap();

        assert_eq!(keys.len(), 3);
        assert!(keys.iter().all(|k| uuid::Uuid::parse_str(k).is_ok()));
    }

    #[tokio::test]
    async fn test_storage_error_propagates() {
        let mut repo = MockUrlRepository::new();
        repo.expect_exists()
            .times(1)
            .returning(|_| Err(StorageError::Canceled));

        let result = KeyGenerator::default().generate(&repo).await;

        assert!(matches!(
            result,
            Err(KeyGenerationError::Storage(StorageError::Canceled))
        ));
    }
}
