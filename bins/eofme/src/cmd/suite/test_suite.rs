use primitives::Bytes;
use serde::Deserialize;
use std::collections::BTreeMap;

/// File of validation vectors, keyed by test name.
#[derive(Debug, PartialEq, Eq, Deserialize)]
pub struct TestSuite(pub BTreeMap<String, TestUnit>);

/// Named group of vectors.
#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestUnit {
    /// Free-form metadata, ignored.
    #[serde(default, rename = "_info")]
    pub info: Option<serde_json::Value>,
    /// Vectors keyed by name.
    #[serde(default)]
    pub vectors: BTreeMap<String, TestVector>,
}

/// One container and its expected validation result.
#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestVector {
    /// Container bytes.
    pub code: Bytes,
    /// Expected validity.
    pub result: bool,
    /// Name of the expected error variant, checked only when present.
    #[serde(default)]
    pub exception: Option<String>,
}
