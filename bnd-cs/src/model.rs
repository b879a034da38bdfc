//! C type model — the declarations a header front end extracted, with the
//! sizes, alignments and offsets it resolved.
//!
//! These types are front-end independent and target independent. They are
//! loaded from a TOML document so the mapper and emitter can be driven (and
//! tested) without libclang.

use std::fmt;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// Where a declaration came from. Provenance only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CodeLocation {
    /// Declaration kind as reported by the front end (e.g. `FunctionExtern`).
    pub kind: String,
    pub file_name: String,
    pub line: u32,
    /// Capture timestamp, kept as the front end wrote it.
    #[serde(default)]
    pub timestamp: String,
}

impl fmt::Display for CodeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}:{}", self.kind, self.file_name, self.line)?;
        if !self.timestamp.is_empty() {
            write!(f, " {}", self.timestamp)?;
        }
        Ok(())
    }
}

/// A C type descriptor.
///
/// For fixed-size arrays `name` is the element type name and `array_size`
/// holds the element count; `size` is the size of the whole array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CType {
    pub name: String,
    /// Spelling before any front-end substitution (e.g. `uint32_t`).
    #[serde(default)]
    pub original_name: String,
    pub size: usize,
    pub align: usize,
    #[serde(default)]
    pub array_size: Option<usize>,
    /// True for built-in/primitive types.
    #[serde(default)]
    pub is_system: bool,
}

/// Calling convention as reported by the front end.
///
/// Spellings other than `C` and `Unknown` are kept verbatim so the mapper can
/// report them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum CallingConvention {
    C,
    Unknown,
    Unrecognized(String),
}

impl From<String> for CallingConvention {
    fn from(s: String) -> Self {
        match s.as_str() {
            "C" => CallingConvention::C,
            "Unknown" => CallingConvention::Unknown,
            _ => CallingConvention::Unrecognized(s),
        }
    }
}

impl fmt::Display for CallingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallingConvention::C => f.write_str("C"),
            CallingConvention::Unknown => f.write_str("Unknown"),
            CallingConvention::Unrecognized(s) => f.write_str(s),
        }
    }
}

/// An exported C function.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FunctionExtern {
    pub name: String,
    pub location: CodeLocation,
    pub return_type: CType,
    pub calling_convention: CallingConvention,
    #[serde(default)]
    pub params: Vec<FunctionExternParam>,
}

/// A function parameter. `name` is empty for unnamed parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FunctionExternParam {
    #[serde(default)]
    pub name: String,
    pub location: CodeLocation,
    #[serde(rename = "type")]
    pub ty: CType,
    #[serde(default)]
    pub is_read_only: bool,
}

/// A function pointer typedef; `ty` describes the whole pointer type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FunctionPointer {
    pub name: String,
    pub location: CodeLocation,
    #[serde(rename = "type")]
    pub ty: CType,
}

/// A struct or union definition.
///
/// Anonymous inline records are owned by their parent in `nested_records`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Record {
    pub name: String,
    pub location: CodeLocation,
    #[serde(rename = "type")]
    pub ty: CType,
    #[serde(default)]
    pub fields: Vec<RecordField>,
    #[serde(default)]
    pub nested_records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecordField {
    pub name: String,
    pub location: CodeLocation,
    #[serde(rename = "type")]
    pub ty: CType,
    /// Byte offset within the record.
    pub offset: usize,
    /// Bytes of padding after this field.
    #[serde(default)]
    pub padding: usize,
}

/// A pointer-sized handle whose pointee layout is hidden.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpaquePointer {
    pub name: String,
    pub location: CodeLocation,
    pub pointer_type: CType,
}

/// A forward-declared type that is never defined.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpaqueDataType {
    pub name: String,
    pub location: CodeLocation,
}

/// A typedef to a non-record type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AliasType {
    pub name: String,
    pub location: CodeLocation,
    pub underlying_type: CType,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Enum {
    pub name: String,
    pub location: CodeLocation,
    pub integer_type: CType,
    #[serde(default)]
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnumValue {
    pub name: String,
    pub location: CodeLocation,
    pub value: i64,
}

/// Every declaration extracted from one translation unit, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CModel {
    #[serde(default)]
    pub function_externs: Vec<FunctionExtern>,
    #[serde(default)]
    pub function_pointers: Vec<FunctionPointer>,
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default)]
    pub alias_types: Vec<AliasType>,
    #[serde(default)]
    pub opaque_pointers: Vec<OpaquePointer>,
    #[serde(default)]
    pub opaque_data_types: Vec<OpaqueDataType>,
    #[serde(default)]
    pub enums: Vec<Enum>,
}

impl CModel {
    /// Total number of top-level declarations.
    pub fn len(&self) -> usize {
        self.function_externs.len()
            + self.function_pointers.len()
            + self.records.len()
            + self.alias_types.len()
            + self.opaque_pointers.len()
            + self.opaque_data_types.len()
            + self.enums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse a C type model from TOML text.
pub fn parse_model(content: &str) -> anyhow::Result<CModel> {
    toml::from_str(content).context("failed to parse C type model")
}

/// Load a C type model file written by the header front end.
pub fn load_model(path: &Path) -> anyhow::Result<CModel> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read model file {}: {}", path.display(), e))?;
    parse_model(&content).with_context(|| format!("in model file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_model() {
        let model = parse_model(
            r#"
[[function_externs]]
name = "add"
calling_convention = "C"
location = { kind = "FunctionExtern", file_name = "math.h", line = 3 }
return_type = { name = "int", size = 4, align = 4, is_system = true }

[[function_externs.params]]
name = "a"
location = { kind = "FunctionExternParameter", file_name = "math.h", line = 3 }
type = { name = "int", size = 4, align = 4, is_system = true }
"#,
        )
        .unwrap();

        assert_eq!(model.len(), 1);
        let f = &model.function_externs[0];
        assert_eq!(f.calling_convention, CallingConvention::C);
        assert_eq!(f.params[0].ty.array_size, None);
        assert!(!f.params[0].is_read_only);
    }

    #[test]
    fn keeps_unrecognized_calling_convention_spelling() {
        let cc: CallingConvention = String::from("X86StdCall").into();
        assert_eq!(cc, CallingConvention::Unrecognized("X86StdCall".into()));
        assert_eq!(cc.to_string(), "X86StdCall");
    }

    #[test]
    fn location_renders_kind_file_line_and_timestamp() {
        let loc = CodeLocation {
            kind: "Record".into(),
            file_name: "a.h".into(),
            line: 12,
            timestamp: "2021-01-01T00:00:00Z".into(),
        };
        assert_eq!(loc.to_string(), "Record @ a.h:12 2021-01-01T00:00:00Z");
    }
}
