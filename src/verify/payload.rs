use rand::distributions::Alphanumeric;
use rand::Rng;

use super::PayloadReport;

/// Random alphanumeric payload of exactly `size` bytes.
pub fn generate_payload(size: usize) -> Vec<u8> {
    rand::thread_rng().sample_iter(&Alphanumeric).take(size).collect()
}

/// Byte comparison of a replicated payload against what was written.
pub fn compare_payload(
    expected: &[u8],
    observed: &[u8],
) -> PayloadReport {
    if expected == observed {
        return PayloadReport::Match;
    }
    let first_difference = expected
        .iter()
        .zip(observed)
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| expected.len().min(observed.len()));
    PayloadReport::Mismatch {
        first_difference,
        observed_len: observed.len(),
    }
}
