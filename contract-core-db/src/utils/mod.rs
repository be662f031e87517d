use serde::Serialize;
use std::hash::Hasher;
use twox_hash::XxHash64;

/// Hashes serializable data into an i64 that is stable across runs and hosts.
///
/// The value is CBOR-encoded first so field order and types are part of the
/// input, then fed to XxHash64 with a fixed seed.
pub fn hash_as_i64<T: Serialize>(data: &T) -> Result<i64, String> {
    let mut cbor = Vec::new();
    ciborium::ser::into_writer(data, &mut cbor)
        .map_err(|e| format!("Failed to serialize data for hashing: {e}"))?;
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(&cbor);
    Ok(hasher.finish() as i64)
}
