//! Lenient field decoders shared by the status model.
//!
//! Different `smbstatus` releases disagree on whether identifiers are JSON
//! strings or numbers (`"pid": "355"` vs `"pid": 355`). These helpers accept
//! either form, and map `null` to the type's zero value.

use serde::de::Error;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decodes a string field that may also be emitted as a number or bool.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// Decodes a signed integer that may also be emitted as a numeric string.
pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|v| v as i64))
            .ok_or_else(|| D::Error::custom(format!("integer out of range: {}", n))),
        Value::String(s) if s.trim().is_empty() => Ok(0),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid integer: {:?}", s))),
        other => Err(D::Error::custom(format!("expected integer, got {}", other))),
    }
}

/// Decodes an unsigned integer that may also be emitted as a numeric string.
pub(crate) fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| D::Error::custom(format!("expected unsigned integer: {}", n))),
        Value::String(s) if s.trim().is_empty() => Ok(0),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid unsigned integer: {:?}", s))),
        other => Err(D::Error::custom(format!(
            "expected unsigned integer, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct Probe {
        #[serde(deserialize_with = "lenient_string")]
        id: String,
        #[serde(deserialize_with = "lenient_i64")]
        uid: i64,
        #[serde(deserialize_with = "lenient_u64")]
        inode: u64,
    }

    #[test]
    fn test_accepts_strings_and_numbers() {
        let a: Probe = serde_json::from_str(r#"{"id": 355, "uid": "1000", "inode": "61"}"#).unwrap();
        assert_eq!(a.id, "355");
        assert_eq!(a.uid, 1000);
        assert_eq!(a.inode, 61);

        let b: Probe = serde_json::from_str(r#"{"id": "355", "uid": -1, "inode": 52}"#).unwrap();
        assert_eq!(b.id, "355");
        assert_eq!(b.uid, -1);
        assert_eq!(b.inode, 52);
    }

    #[test]
    fn test_null_and_absent_are_zero() {
        let p: Probe = serde_json::from_str(r#"{"id": null, "uid": null}"#).unwrap();
        assert_eq!(p.id, "");
        assert_eq!(p.uid, 0);
        assert_eq!(p.inode, 0);
    }

    #[test]
    fn test_rejects_garbage_numbers() {
        assert!(serde_json::from_str::<Probe>(r#"{"uid": "abc"}"#).is_err());
        assert!(serde_json::from_str::<Probe>(r#"{"inode": -5}"#).is_err());
        assert!(serde_json::from_str::<Probe>(r#"{"id": [1]}"#).is_err());
    }
}
