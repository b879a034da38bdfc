//! C# declarations produced by the mapper and consumed by
//! the emitter. One value per emittable declaration.

use crate::model::CodeLocation;

/// A target type with the layout facts copied from the C type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsType {
    pub name: String,
    pub original_name: String,
    pub size: usize,
    pub align: usize,
    /// Element count for inline arrays.
    pub fixed_buffer_size: Option<usize>,
}

impl CsType {
    pub fn is_array(&self) -> bool {
        self.fixed_buffer_size.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsCallingConvention {
    C,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsFunctionExtern {
    /// C entry-point name, unsanitized.
    pub name: String,
    pub location: CodeLocation,
    pub calling_convention: CsCallingConvention,
    pub return_type: CsType,
    pub params: Vec<CsParam>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsParam {
    /// Unique within its function and already sanitized.
    pub name: String,
    pub location: CodeLocation,
    pub ty: CsType,
    pub is_read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsFunctionPointer {
    pub name: String,
    pub location: CodeLocation,
    pub ty: CsType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsStruct {
    pub name: String,
    pub location: CodeLocation,
    pub ty: CsType,
    pub fields: Vec<CsStructField>,
    pub nested_structs: Vec<CsStruct>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsStructField {
    /// Sanitized identifier.
    pub name: String,
    /// C spelling; empty for synthesized fields.
    pub original_name: String,
    pub location: CodeLocation,
    pub ty: CsType,
    pub offset: usize,
    pub padding: usize,
    /// Array field that needs a synthesized wrapper struct instead of a
    /// native fixed buffer.
    pub is_wrapped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsOpaqueDataType {
    pub name: String,
    pub location: CodeLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsEnum {
    pub name: String,
    pub location: CodeLocation,
    pub integer_type: CsType,
    pub values: Vec<CsEnumValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsEnumValue {
    pub name: String,
    pub location: CodeLocation,
    pub value: i64,
}

/// All bindings for one compilation unit, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsBindings {
    pub function_externs: Vec<CsFunctionExtern>,
    pub function_pointers: Vec<CsFunctionPointer>,
    pub structs: Vec<CsStruct>,
    pub opaque_data_types: Vec<CsOpaqueDataType>,
    pub enums: Vec<CsEnum>,
}

impl CsBindings {
    /// Top-level function and type names in emission order.
    pub fn declared_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        names.extend(self.function_externs.iter().map(|f| f.name.clone()));
        names.extend(self.function_pointers.iter().map(|f| f.name.clone()));
        names.extend(self.structs.iter().map(|s| s.name.clone()));
        names.extend(self.opaque_data_types.iter().map(|o| o.name.clone()));
        names.extend(self.enums.iter().map(|e| e.name.clone()));
        names
    }
}
