use anyhow::Result;

/// Get the bincode configuration used for all persisted records.
fn get_config() -> impl bincode::config::Config {
    // Legacy configuration for serde compatibility; allocation limit guards
    // against corrupt or truncated state files.
    bincode::config::legacy().with_limit::<{ 64 * 1024 * 1024 }>() // 64MB limit
}

/// Serialize a record using bincode v2.0 with serde.
///
/// # Errors
///
/// Returns an error if:
/// - Serialization fails
pub fn serialize<T: serde::Serialize>(data: &T) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(data, get_config()).map_err(Into::into)
}

/// Deserialize a record using bincode v2.0 with serde.
///
/// # Errors
///
/// Returns an error if:
/// - Deserialization fails
/// - Data is malformed, truncated, or incompatible
pub fn deserialize<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (result, _bytes_read) = bincode::serde::decode_from_slice(bytes, get_config())?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestRecord {
        path: String,
        size: u64,
        modified: i64,
    }

    #[test]
    fn test_serialize_deserialize() -> Result<()> {
        let original = TestRecord {
            path: "docs/report.txt".to_string(),
            size: 4096,
            modified: 1_700_000_000,
        };

        let serialized = serialize(&original)?;
        let deserialized: TestRecord = deserialize(&serialized)?;

        assert_eq!(original, deserialized);
        Ok(())
    }

    #[test]
    fn test_deserialize_truncated() -> Result<()> {
        let original = TestRecord {
            path: "a".to_string(),
            size: 1,
            modified: 1,
        };
        let serialized = serialize(&original)?;

        let result: Result<TestRecord> = deserialize(&serialized[..serialized.len() / 2]);
        assert!(result.is_err());
        Ok(())
    }
}
