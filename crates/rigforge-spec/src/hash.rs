//! Canonical hashing.
//!
//! This module implements the determinism policy for rigforge:
//! - JSON canonicalization using RFC 8785 (JCS)
//! - BLAKE3 hashing over the canonical form
//!
//! The input fingerprint covers skeleton, meshes, and options together, so
//! any input change changes the fingerprint and identical inputs always map
//! to the same fingerprint. Backends hash their output documents with the
//! same canonicalizer, which is what makes regeneration checks cheap.

use crate::error::SpecError;
use crate::mesh::MeshData;
use crate::options::RigOptions;
use crate::skeleton::SourceSkeleton;

/// Computes the canonical BLAKE3 fingerprint of a synthesis input set.
///
/// ```text
/// input_hash = hex(BLAKE3(JCS({skeleton, meshes, options})))
/// ```
///
/// Returns a 64-character lowercase hexadecimal string.
pub fn canonical_input_hash(
    skeleton: &SourceSkeleton,
    meshes: &[MeshData],
    options: &RigOptions,
) -> Result<String, SpecError> {
    let value = serde_json::json!({
        "skeleton": skeleton,
        "meshes": meshes,
        "options": options,
    });
    canonical_value_hash(&value)
}

/// Computes the canonical BLAKE3 hash of a JSON value.
pub fn canonical_value_hash(value: &serde_json::Value) -> Result<String, SpecError> {
    let canonical = canonicalize_json(value)?;
    let hash = blake3::hash(canonical.as_bytes());
    Ok(hash.to_hex().to_string())
}

/// Canonicalizes a JSON value according to RFC 8785 (JCS).
///
/// This produces a deterministic JSON string where:
/// - Object keys are sorted lexicographically
/// - No whitespace between tokens
/// - Numbers are formatted per IEEE 754
/// - Strings use minimal escaping
pub fn canonicalize_json(value: &serde_json::Value) -> Result<String, SpecError> {
    Ok(canonicalize_value(value))
}

fn canonicalize_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => format_jcs_number(n),
        serde_json::Value::String(s) => format_jcs_string(s),
        serde_json::Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(canonicalize_value).collect();
            format!("[{}]", items.join(","))
        }
        serde_json::Value::Object(obj) => {
            // Sort keys lexicographically
            let mut sorted_keys: Vec<&String> = obj.keys().collect();
            sorted_keys.sort();

            let pairs: Vec<String> = sorted_keys
                .iter()
                .filter_map(|k| {
                    obj.get(*k)
                        .map(|v| format!("{}:{}", format_jcs_string(k), canonicalize_value(v)))
                })
                .collect();
            format!("{{{}}}", pairs.join(","))
        }
    }
}

/// Formats a number according to JCS rules.
fn format_jcs_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    if let Some(f) = n.as_f64() {
        if f.is_nan() || f.is_infinite() {
            return "null".to_string(); // JCS treats these as null
        }
        if f == 0.0 {
            return "0".to_string();
        }
        if f.fract() == 0.0 && f.abs() < 1e15 {
            // Integer-like float
            return format!("{}", f as i64);
        }
        let s = format!("{}", f);
        // Remove unnecessary trailing zeros and decimal points
        if s.contains('.') && !s.contains('e') && !s.contains('E') {
            let trimmed = s.trim_end_matches('0').trim_end_matches('.');
            return trimmed.to_string();
        }
        s
    } else {
        "null".to_string()
    }
}

/// Formats a string according to JCS rules.
fn format_jcs_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    result.push('"');
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c < '\x20' => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result.push('"');
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::SkeletonPreset;

    #[test]
    fn test_canonicalization_sorts_keys() {
        let value = serde_json::json!({"b": 1, "a": 2});
        assert_eq!(canonicalize_json(&value).unwrap(), r#"{"a":2,"b":1}"#);
    }

    #[test]
    fn test_canonicalization_number_formats() {
        let value = serde_json::json!([1.0, 0.5, -0.25, 0.0, 3]);
        assert_eq!(canonicalize_json(&value).unwrap(), "[1,0.5,-0.25,0,3]");
    }

    #[test]
    fn test_input_hash_is_stable() {
        let skeleton = SkeletonPreset::BipedV1.source_skeleton();
        let meshes = vec![MeshData::box_shell("body", [0.0, 0.0, 0.9], [0.4, 0.25, 0.9])];
        let options = RigOptions::default();

        let a = canonical_input_hash(&skeleton, &meshes, &options).unwrap();
        let b = canonical_input_hash(&skeleton, &meshes, &options).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_input_hash_changes_with_options() {
        let skeleton = SkeletonPreset::BipedV1.source_skeleton();
        let meshes = vec![MeshData::box_shell("body", [0.0, 0.0, 0.9], [0.4, 0.25, 0.9])];

        let a = canonical_input_hash(&skeleton, &meshes, &RigOptions::default()).unwrap();
        let b = canonical_input_hash(&skeleton, &meshes, &RigOptions::minimal()).unwrap();
        assert_ne!(a, b);
    }
}
