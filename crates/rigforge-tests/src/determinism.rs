//! Determinism verification over serialized rig documents.
//!
//! Synthesis must be a pure function of its inputs. These helpers run a
//! generation closure several times and compare the outputs byte for
//! byte, reporting where the first divergence sits when they differ.

/// Result of a determinism verification.
#[derive(Debug, Clone)]
pub struct DeterminismResult {
    /// Whether all runs produced identical output.
    pub is_deterministic: bool,
    /// Number of runs performed.
    pub runs: usize,
    /// Size of the reference output in bytes.
    pub output_size: usize,
    /// BLAKE3 hash of the reference output.
    pub hash: String,
    /// First divergence found, if any.
    pub divergence: Option<Divergence>,
}

/// Where two runs first disagreed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Divergence {
    /// Offset of the first differing byte, or the shorter length when the
    /// outputs differ in length.
    pub offset: usize,
    /// Which run (0-indexed) produced the differing output.
    pub run_index: usize,
}

impl DeterminismResult {
    /// Panic with a detailed message if not deterministic.
    pub fn assert_deterministic(&self) {
        if let Some(d) = &self.divergence {
            panic!(
                "non-deterministic output: run {} differs at byte {} ({} bytes, reference hash {})",
                d.run_index, d.offset, self.output_size, self.hash
            );
        }
    }
}

/// Runs `generate_fn` `runs` times and compares every output against the
/// first.
pub fn verify_determinism<F, O>(generate_fn: F, runs: usize) -> DeterminismResult
where
    F: Fn() -> O,
    O: AsRef<[u8]>,
{
    assert!(runs >= 2, "need at least 2 runs to compare");

    let reference = generate_fn();
    let reference = reference.as_ref();
    let hash = compute_hash(reference);

    for run_index in 1..runs {
        let output = generate_fn();
        if let Some(divergence) = first_divergence(reference, output.as_ref(), run_index) {
            return DeterminismResult {
                is_deterministic: false,
                runs,
                output_size: reference.len(),
                hash,
                divergence: Some(divergence),
            };
        }
    }

    DeterminismResult {
        is_deterministic: true,
        runs,
        output_size: reference.len(),
        hash,
        divergence: None,
    }
}

fn first_divergence(reference: &[u8], output: &[u8], run_index: usize) -> Option<Divergence> {
    if let Some(offset) = reference.iter().zip(output).position(|(a, b)| a != b) {
        return Some(Divergence { offset, run_index });
    }
    if reference.len() != output.len() {
        return Some(Divergence {
            offset: reference.len().min(output.len()),
            run_index,
        });
    }
    None
}

/// True when every hash in the slice matches the first.
pub fn verify_hash_determinism(hashes: &[String]) -> bool {
    match hashes.first() {
        Some(reference) => hashes.iter().all(|h| h == reference),
        None => true,
    }
}

/// BLAKE3 hash of a byte slice, hex.
pub fn compute_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Verifies a `Vec<u8>`-producing closure over `runs` runs, panicking on
/// the first divergence.
pub fn assert_deterministic<F>(runs: usize, generate_fn: F)
where
    F: Fn() -> Vec<u8>,
{
    verify_determinism(&generate_fn, runs).assert_deterministic();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_identical_outputs_pass() {
        let result = verify_determinism(|| b"stable".to_vec(), 4);
        assert!(result.is_deterministic);
        assert_eq!(result.runs, 4);
        assert_eq!(result.output_size, 6);
        assert_eq!(result.hash, compute_hash(b"stable"));
        assert!(result.divergence.is_none());
    }

    #[test]
    fn test_divergence_reports_offset_and_run() {
        let calls = AtomicUsize::new(0);
        let result = verify_determinism(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    b"aaaa".to_vec()
                } else {
                    b"aaba".to_vec()
                }
            },
            3,
        );
        assert!(!result.is_deterministic);
        let divergence = result.divergence.unwrap();
        assert_eq!(divergence.offset, 2);
        assert_eq!(divergence.run_index, 2);
    }

    #[test]
    fn test_length_mismatch_is_a_divergence() {
        let calls = AtomicUsize::new(0);
        let result = verify_determinism(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    b"abc".to_vec()
                } else {
                    b"abcd".to_vec()
                }
            },
            2,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.divergence.unwrap().offset, 3);
    }

    #[test]
    fn test_hash_determinism_over_collected_hashes() {
        let same = vec![compute_hash(b"x"), compute_hash(b"x")];
        assert!(verify_hash_determinism(&same));
        let different = vec![compute_hash(b"x"), compute_hash(b"y")];
        assert!(!verify_hash_determinism(&different));
        assert!(verify_hash_determinism(&[]));
    }
}
