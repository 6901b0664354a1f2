use crate::input::TestCase;
use rand::Rng;
use rand::distr::Alphanumeric;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while constructing a policy or generating a test case.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The configured length range is not a valid closed range of positive lengths.
    #[error("invalid length range: expected 1 <= min <= max, got [{min}, {max}]")]
    InvalidLengthRange { min: usize, max: usize },
    /// The mutation base string has no characters to mutate.
    #[error("mutation base string must not be empty")]
    EmptyBase,
    /// The sample file could not be read.
    #[error("failed to read sample file {path:?}: {source}")]
    SampleFileUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The sample file was readable but held no non-empty lines.
    #[error("sample file {path:?} contains no usable lines")]
    SampleFileEmpty { path: PathBuf },
}

/// A `GenerationPolicy` produces one [`TestCase`] per `generate` call.
///
/// The three strategies are variants of a single tagged union; dispatch
/// happens by match.
/// Randomness is never drawn from process-global state: every call receives
/// an explicit RNG, so a seeded `ChaCha8Rng` yields reproducible runs.
///
/// Generation has no side effects beyond RNG consumption. In particular the
/// mutation variant never compounds: each call perturbs the same immutable
/// base string, not the previous output.
#[derive(Debug, Clone)]
pub enum GenerationPolicy {
    /// Purely random alphanumeric text with a length drawn uniformly from
    /// the closed range `[min_len, max_len]`.
    UniformRandom { min_len: usize, max_len: usize },
    /// One line, chosen uniformly at random, from a text file of candidates.
    /// The file is re-read on every call.
    FileSample { path: PathBuf },
    /// The base string with exactly one character position replaced by a
    /// random alphanumeric character.
    MutateBase { base: String },
}

impl GenerationPolicy {
    /// Builds a uniform-random policy, validating `1 <= min_len <= max_len`.
    pub fn uniform_random(min_len: usize, max_len: usize) -> Result<Self, GenerationError> {
        if min_len == 0 || min_len > max_len {
            return Err(GenerationError::InvalidLengthRange {
                min: min_len,
                max: max_len,
            });
        }
        Ok(Self::UniformRandom { min_len, max_len })
    }

    /// Builds a file-sample policy. Readability and non-emptiness of the file
    /// are call-time properties and are checked by `generate`, not here.
    pub fn file_sample(path: impl Into<PathBuf>) -> Self {
        Self::FileSample { path: path.into() }
    }

    /// Builds a mutation policy over a non-empty base string.
    pub fn mutate_base(base: impl Into<String>) -> Result<Self, GenerationError> {
        let base = base.into();
        if base.is_empty() {
            return Err(GenerationError::EmptyBase);
        }
        Ok(Self::MutateBase { base })
    }

    /// Produces the next test case according to this policy.
    ///
    /// # Arguments
    /// * `rng`: The random source for all sampling decisions. Callers that
    ///   need reproducible runs pass a seeded generator.
    ///
    /// # Returns
    /// `Ok(TestCase)` with the generated payload, or a `GenerationError` if
    /// the policy's inputs are unusable (unreadable or empty sample file).
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<TestCase, GenerationError> {
        match self {
            Self::UniformRandom { min_len, max_len } => {
                // Variants are freely constructible, so the range invariant
                // is re-checked here as well as in the constructor.
                if *min_len == 0 || min_len > max_len {
                    return Err(GenerationError::InvalidLengthRange {
                        min: *min_len,
                        max: *max_len,
                    });
                }
                let length = rng.random_range(*min_len..=*max_len);
                let payload: String = (0..length)
                    .map(|_| char::from(rng.sample(Alphanumeric)))
                    .collect();
                Ok(TestCase::new(payload))
            }
            Self::FileSample { path } => {
                let content = std::fs::read_to_string(path).map_err(|source| {
                    GenerationError::SampleFileUnreadable {
                        path: path.clone(),
                        source,
                    }
                })?;
                let candidates: Vec<&str> = content
                    .lines()
                    .map(str::trim_end)
                    .filter(|line| !line.is_empty())
                    .collect();
                if candidates.is_empty() {
                    return Err(GenerationError::SampleFileEmpty { path: path.clone() });
                }
                let chosen = candidates[rng.random_range(0..candidates.len())];
                Ok(TestCase::new(chosen))
            }
            Self::MutateBase { base } => {
                let length = base.chars().count();
                if length == 0 {
                    return Err(GenerationError::EmptyBase);
                }
                let position = rng.random_range(0..length);
                let replacement = char::from(rng.sample(Alphanumeric));
                Ok(TestCase::new(substitute_char(base, position, replacement)))
            }
        }
    }
}

/// Replaces the character at `position` with `replacement`, leaving every
/// other position untouched. Positions are character indices, not byte offsets.
fn substitute_char(base: &str, position: usize, replacement: char) -> String {
    base.chars()
        .enumerate()
        .map(|(i, c)| if i == position { replacement } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;
    use rand_core::SeedableRng;
    use std::io::Write;

    #[test]
    fn uniform_random_respects_length_range_and_alphabet() {
        let policy = GenerationPolicy::uniform_random(3, 9).unwrap();
        let mut rng = ChaCha8Rng::from_seed([7u8; 32]);

        for _ in 0..200 {
            let case = policy.generate(&mut rng).unwrap();
            assert!(
                (3..=9).contains(&case.len()),
                "length {} outside [3, 9]",
                case.len()
            );
            assert!(
                case.as_str().chars().all(|c| c.is_ascii_alphanumeric()),
                "non-alphanumeric output: {:?}",
                case.as_str()
            );
        }
    }

    #[test]
    fn uniform_random_with_degenerate_range_is_exact() {
        let policy = GenerationPolicy::uniform_random(5, 5).unwrap();
        let mut rng = ChaCha8Rng::from_seed([8u8; 32]);
        for _ in 0..20 {
            assert_eq!(policy.generate(&mut rng).unwrap().len(), 5);
        }
    }

    #[test]
    fn uniform_random_rejects_bad_ranges() {
        assert!(matches!(
            GenerationPolicy::uniform_random(0, 4),
            Err(GenerationError::InvalidLengthRange { min: 0, max: 4 })
        ));
        assert!(matches!(
            GenerationPolicy::uniform_random(6, 2),
            Err(GenerationError::InvalidLengthRange { min: 6, max: 2 })
        ));
    }

    #[test]
    fn mutation_changes_at_most_one_position() {
        let base = "fuzzing-seed-42";
        let policy = GenerationPolicy::mutate_base(base).unwrap();
        let mut rng = ChaCha8Rng::from_seed([9u8; 32]);

        for _ in 0..200 {
            let case = policy.generate(&mut rng).unwrap();
            assert_eq!(case.len(), base.chars().count());
            let differing = case
                .as_str()
                .chars()
                .zip(base.chars())
                .filter(|(a, b)| a != b)
                .count();
            assert!(differing <= 1, "mutated more than one position: {case}");
        }
    }

    #[test]
    fn mutation_does_not_compound_across_calls() {
        let policy = GenerationPolicy::mutate_base("aaaaaaaa").unwrap();
        let mut rng = ChaCha8Rng::from_seed([10u8; 32]);

        // Every output differs from the fixed base in <= 1 position, so any
        // two outputs can differ from each other in at most 2.
        let first = policy.generate(&mut rng).unwrap();
        let second = policy.generate(&mut rng).unwrap();
        let differing = first
            .as_str()
            .chars()
            .zip(second.as_str().chars())
            .filter(|(a, b)| a != b)
            .count();
        assert!(differing <= 2);
    }

    #[test]
    fn substitute_char_replaces_exactly_the_requested_position() {
        assert_eq!(substitute_char("abc", 1, 'X'), "aXc");
        assert_eq!(substitute_char("abc", 0, 'X'), "Xbc");
        assert_eq!(substitute_char("abc", 2, 'X'), "abX");
    }

    #[test]
    fn mutate_base_rejects_empty_base() {
        assert!(matches!(
            GenerationPolicy::mutate_base(""),
            Err(GenerationError::EmptyBase)
        ));
    }

    #[test]
    fn file_sample_returns_a_stripped_line_from_the_file() {
        let mut sample_file = tempfile::NamedTempFile::new().unwrap();
        write!(sample_file, "alpha\n\nbeta  \ngamma\n").unwrap();

        let policy = GenerationPolicy::file_sample(sample_file.path());
        let mut rng = ChaCha8Rng::from_seed([11u8; 32]);
        let mut seen = std::collections::HashSet::new();

        for _ in 0..100 {
            let case = policy.generate(&mut rng).unwrap();
            assert!(
                ["alpha", "beta", "gamma"].contains(&case.as_str()),
                "unexpected sample: {:?}",
                case.as_str()
            );
            seen.insert(case.into_string());
        }
        assert_eq!(seen.len(), 3, "all candidates should be reachable");
    }

    #[test]
    fn file_sample_fails_on_file_without_usable_lines() {
        let mut sample_file = tempfile::NamedTempFile::new().unwrap();
        write!(sample_file, "\n   \n\n").unwrap();

        let policy = GenerationPolicy::file_sample(sample_file.path());
        let mut rng = ChaCha8Rng::from_seed([12u8; 32]);
        assert!(matches!(
            policy.generate(&mut rng),
            Err(GenerationError::SampleFileEmpty { .. })
        ));
    }

    #[test]
    fn file_sample_fails_on_unreadable_path() {
        let policy = GenerationPolicy::file_sample("/nonexistent/rattle-sample-file.txt");
        let mut rng = ChaCha8Rng::from_seed([13u8; 32]);
        assert!(matches!(
            policy.generate(&mut rng),
            Err(GenerationError::SampleFileUnreadable { .. })
        ));
    }
}
