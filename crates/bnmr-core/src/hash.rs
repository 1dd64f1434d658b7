//! Stable digests used to check that repeated calculations agree.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::errors::{BnmrError, ErrorInfo};

/// Computes a stable hexadecimal hash for the provided serializable payload.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, BnmrError> {
    let json = serde_json::to_vec(value)
        .map_err(|err| BnmrError::Config(ErrorInfo::new("serialize", err.to_string())))?;
    let mut hasher = Sha256::new();
    hasher.update(json);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Hashes the exact bit patterns of a sequence of float series.
///
/// Unlike [`stable_hash_string`] this distinguishes `0.0` from `-0.0` and
/// every NaN payload.
pub fn float_digest<'a>(series: impl IntoIterator<Item = &'a [f64]>) -> String {
    let mut hasher = Sha256::new();
    for values in series {
        hasher.update((values.len() as u64).to_le_bytes());
        for value in values {
            hasher.update(value.to_bits().to_le_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}
