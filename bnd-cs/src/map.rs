//! Mapper — C type model → C# binding model.
//!
//! Every declaration maps independently of the others, so each group is
//! mapped with a parallel iterator. `collect` keeps input order, which keeps
//! the emitted text reproducible.

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::binding::*;
use crate::error::MapError;
use crate::model::*;
use crate::profile::TargetProfile;
use crate::sanitize::{sanitize, unique_parameter_name};

/// Field name of the struct synthesized for an opaque pointer.
pub const OPAQUE_POINTER_FIELD: &str = "Pointer";
/// Field name of the struct synthesized for an alias type.
pub const ALIAS_FIELD: &str = "Data";

/// Result of mapping one unit: the bindings that mapped, plus one error per
/// declaration that did not.
#[derive(Debug, Default)]
pub struct Mapping {
    pub bindings: CsBindings,
    pub errors: Vec<MapError>,
}

/// Lowers C declarations into bindings for one target profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mapper {
    profile: TargetProfile,
}

impl Mapper {
    pub fn new(profile: TargetProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &TargetProfile {
        &self.profile
    }

    /// Map a whole unit.
    ///
    /// Output order: functions, function pointers, structs (records, then
    /// aliases, then opaque pointers), opaque data types, enums.
    pub fn map_model(&self, model: &CModel) -> Mapping {
        let mut errors = Vec::new();

        let function_externs: Vec<CsFunctionExtern> = model
            .function_externs
            .par_iter()
            .map(|f| self.map_function_extern(f))
            .collect::<Vec<_>>()
            .into_iter()
            .filter_map(|r| r.map_err(|e| errors.push(e)).ok())
            .collect();

        let function_pointers = model
            .function_pointers
            .par_iter()
            .map(|fp| self.map_function_pointer(fp))
            .collect();

        let structs = model
            .records
            .par_iter()
            .map(|r| self.map_struct(r))
            .chain(model.alias_types.par_iter().map(|a| self.map_alias_type(a)))
            .chain(
                model
                    .opaque_pointers
                    .par_iter()
                    .map(|p| self.map_opaque_pointer(p)),
            )
            .collect();

        let opaque_data_types = model
            .opaque_data_types
            .par_iter()
            .map(|o| self.map_opaque_data_type(o))
            .collect();

        let enums = model.enums.par_iter().map(|e| self.map_enum(e)).collect();

        Mapping {
            bindings: CsBindings {
                function_externs,
                function_pointers,
                structs,
                opaque_data_types,
                enums,
            },
            errors,
        }
    }

    // -----------------------------------------------------------------------
    // Functions
    // -----------------------------------------------------------------------

    pub fn map_function_extern(&self, f: &FunctionExtern) -> Result<CsFunctionExtern, MapError> {
        let calling_convention = map_calling_convention(f)?;
        let return_type = self.map_type(&f.return_type);

        let mut used = Vec::with_capacity(f.params.len());
        let params = f
            .params
            .iter()
            .map(|p| {
                let unique = unique_parameter_name(&p.name, &mut used);
                let param = CsParam {
                    name: sanitize(&self.profile, &unique),
                    location: p.location.clone(),
                    ty: self.map_type(&p.ty),
                    is_read_only: p.is_read_only,
                };
                trace!(function = %f.name, param = %param.name, ty = %param.ty.name, "  param");
                param
            })
            .collect::<Vec<_>>();

        debug!(name = %f.name, params = params.len(), "mapped function");
        Ok(CsFunctionExtern {
            name: f.name.clone(),
            location: f.location.clone(),
            calling_convention,
            return_type,
            params,
        })
    }

    pub fn map_function_pointer(&self, fp: &FunctionPointer) -> CsFunctionPointer {
        debug!(name = %fp.name, "mapped function pointer");
        CsFunctionPointer {
            name: fp.name.clone(),
            location: fp.location.clone(),
            ty: self.map_type(&fp.ty),
        }
    }

    // -----------------------------------------------------------------------
    // Structs and the declarations lowered to structs
    // -----------------------------------------------------------------------

    pub fn map_struct(&self, record: &Record) -> CsStruct {
        let fields: Vec<CsStructField> = record
            .fields
            .iter()
            .map(|f| self.map_struct_field(f))
            .collect();
        let nested_structs = record
            .nested_records
            .iter()
            .map(|r| self.map_struct(r))
            .collect();

        debug!(name = %record.name, fields = fields.len(), size = record.ty.size, "mapped struct");
        CsStruct {
            name: record.name.clone(),
            location: record.location.clone(),
            ty: self.map_type(&record.ty),
            fields,
            nested_structs,
        }
    }

    fn map_struct_field(&self, field: &RecordField) -> CsStructField {
        let ty = self.map_type(&field.ty);
        let is_wrapped = ty.is_array() && !self.profile.is_fixed_buffer_type(&ty.name);
        trace!(
            field = %field.name,
            ty = %ty.name,
            offset = field.offset,
            padding = field.padding,
            is_wrapped,
            "  field"
        );
        CsStructField {
            name: sanitize(&self.profile, &field.name),
            original_name: field.name.clone(),
            location: field.location.clone(),
            ty,
            offset: field.offset,
            padding: field.padding,
            is_wrapped,
        }
    }

    /// An opaque pointer becomes a one-field struct holding the pointer, so
    /// the handle is sized and blittable but its pointee stays hidden.
    pub fn map_opaque_pointer(&self, p: &OpaquePointer) -> CsStruct {
        debug!(name = %p.name, "mapped opaque pointer");
        self.single_field_struct(&p.name, &p.location, &p.pointer_type, OPAQUE_POINTER_FIELD)
    }

    /// An alias becomes a one-field struct so two typedefs over the same type
    /// stay distinct types.
    pub fn map_alias_type(&self, a: &AliasType) -> CsStruct {
        debug!(name = %a.name, underlying = %a.underlying_type.name, "mapped alias type");
        self.single_field_struct(&a.name, &a.location, &a.underlying_type, ALIAS_FIELD)
    }

    fn single_field_struct(
        &self,
        name: &str,
        location: &CodeLocation,
        inner: &CType,
        field_name: &str,
    ) -> CsStruct {
        let ty = self.map_type(inner);
        CsStruct {
            name: name.to_string(),
            location: location.clone(),
            ty: ty.clone(),
            fields: vec![CsStructField {
                name: field_name.to_string(),
                original_name: String::new(),
                location: location.clone(),
                ty,
                offset: 0,
                padding: 0,
                is_wrapped: false,
            }],
            nested_structs: Vec::new(),
        }
    }

    pub fn map_opaque_data_type(&self, o: &OpaqueDataType) -> CsOpaqueDataType {
        debug!(name = %o.name, "mapped opaque data type");
        CsOpaqueDataType {
            name: o.name.clone(),
            location: o.location.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Enums
    // -----------------------------------------------------------------------

    pub fn map_enum(&self, e: &Enum) -> CsEnum {
        let values = e
            .values
            .iter()
            .map(|v| CsEnumValue {
                name: v.name.clone(),
                location: v.location.clone(),
                value: v.value,
            })
            .collect::<Vec<_>>();

        debug!(name = %e.name, values = values.len(), "mapped enum");
        CsEnum {
            name: e.name.clone(),
            location: e.location.clone(),
            integer_type: self.map_type(&e.integer_type),
            values,
        }
    }

    // -----------------------------------------------------------------------
    // Types
    // -----------------------------------------------------------------------

    /// Copy layout facts verbatim; swap the system boolean for the one-byte
    /// marshaling boolean.
    pub fn map_type(&self, ty: &CType) -> CsType {
        let name = if ty.is_system && ty.name == self.profile.system_bool {
            self.profile.marshal_bool.to_string()
        } else {
            ty.name.clone()
        };

        CsType {
            name,
            original_name: ty.original_name.clone(),
            size: ty.size,
            align: ty.align,
            fixed_buffer_size: ty.array_size,
        }
    }
}

fn map_calling_convention(f: &FunctionExtern) -> Result<CsCallingConvention, MapError> {
    match &f.calling_convention {
        CallingConvention::C => Ok(CsCallingConvention::C),
        CallingConvention::Unknown => Ok(CsCallingConvention::Unknown),
        CallingConvention::Unrecognized(other) => Err(MapError::UnmappedCallingConvention {
            function: f.name.clone(),
            convention: other.clone(),
            location: f.location.clone(),
        }),
    }
}

/// A record whose field sizes and paddings do not add up to its size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutMismatch {
    pub record: String,
    pub expected: usize,
    pub actual: usize,
}

/// Compare `sum(field size + padding)` against each record's declared size,
/// nested records included. The mapper never relies on this; it only
/// reports.
pub fn check_record_layout(record: &Record) -> Vec<LayoutMismatch> {
    let mut out = Vec::new();
    collect_layout_mismatches(record, &mut out);
    out
}

fn collect_layout_mismatches(record: &Record, out: &mut Vec<LayoutMismatch>) {
    if !record.fields.is_empty() {
        let actual: usize = record.fields.iter().map(|f| f.ty.size + f.padding).sum();
        if actual != record.ty.size {
            out.push(LayoutMismatch {
                record: record.name.clone(),
                expected: record.ty.size,
                actual,
            });
        }
    }
    for nested in &record.nested_records {
        collect_layout_mismatches(nested, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(kind: &str, line: u32) -> CodeLocation {
        CodeLocation {
            kind: kind.into(),
            file_name: "test.h".into(),
            line,
            timestamp: String::new(),
        }
    }

    fn prim(name: &str, size: usize) -> CType {
        CType {
            name: name.into(),
            original_name: name.into(),
            size,
            align: size,
            array_size: None,
            is_system: true,
        }
    }

    fn array(element: &str, element_size: usize, count: usize, is_system: bool) -> CType {
        CType {
            name: element.into(),
            original_name: format!("{element}[{count}]"),
            size: element_size * count,
            align: element_size,
            array_size: Some(count),
            is_system,
        }
    }

    fn named(name: &str, size: usize, align: usize) -> CType {
        CType {
            name: name.into(),
            original_name: name.into(),
            size,
            align,
            array_size: None,
            is_system: false,
        }
    }

    fn field(name: &str, ty: CType, offset: usize, padding: usize) -> RecordField {
        RecordField {
            name: name.into(),
            location: loc("RecordField", 1),
            ty,
            offset,
            padding,
        }
    }

    fn param(name: &str, ty: CType) -> FunctionExternParam {
        FunctionExternParam {
            name: name.into(),
            location: loc("FunctionExternParameter", 1),
            ty,
            is_read_only: false,
        }
    }

    fn function(name: &str, cc: CallingConvention, params: Vec<FunctionExternParam>) -> FunctionExtern {
        FunctionExtern {
            name: name.into(),
            location: loc("FunctionExtern", 7),
            return_type: prim("void", 0),
            calling_convention: cc,
            params,
        }
    }

    fn mapper() -> Mapper {
        Mapper::new(TargetProfile::CSHARP)
    }

    #[test]
    fn parameters_are_uniqued_then_sanitized() {
        let f = function(
            "f",
            CallingConvention::C,
            vec![
                param("x", prim("int", 4)),
                param("x", prim("int", 4)),
                param("", prim("int", 4)),
                param("int", prim("int", 4)),
                param("int", prim("int", 4)),
            ],
        );
        let mapped = mapper().map_function_extern(&f).unwrap();
        let names: Vec<&str> = mapped.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["x", "x2", "param", "@int", "int2"]);
    }

    #[test]
    fn read_only_flag_is_carried() {
        let mut p = param("buf", prim("void*", 8));
        p.is_read_only = true;
        let f = function("write", CallingConvention::C, vec![p]);
        let mapped = mapper().map_function_extern(&f).unwrap();
        assert!(mapped.params[0].is_read_only);
    }

    #[test]
    fn calling_conventions_map_exhaustively() {
        let m = mapper();
        let c = m
            .map_function_extern(&function("a", CallingConvention::C, vec![]))
            .unwrap();
        assert_eq!(c.calling_convention, CsCallingConvention::C);
        let u = m
            .map_function_extern(&function("b", CallingConvention::Unknown, vec![]))
            .unwrap();
        assert_eq!(u.calling_convention, CsCallingConvention::Unknown);
    }

    #[test]
    fn unrecognized_calling_convention_reports_location() {
        let f = function(
            "bad",
            CallingConvention::Unrecognized("X86FastCall".into()),
            vec![],
        );
        let err = mapper().map_function_extern(&f).unwrap_err();
        assert_eq!(err.declaration(), "bad");
        assert_eq!(err.location().line, 7);
        let msg = err.to_string();
        assert!(msg.contains("X86FastCall"), "{msg}");
        assert!(msg.contains("test.h:7"), "{msg}");
    }

    #[test]
    fn failing_function_does_not_affect_others() {
        let model = CModel {
            function_externs: vec![
                function("ok1", CallingConvention::C, vec![]),
                function("bad", CallingConvention::Unrecognized("?".into()), vec![]),
                function("ok2", CallingConvention::C, vec![]),
            ],
            ..Default::default()
        };
        let mapping = mapper().map_model(&model);
        let names: Vec<&str> = mapping
            .bindings
            .function_externs
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, ["ok1", "ok2"]);
        assert_eq!(mapping.errors.len(), 1);
        assert_eq!(mapping.errors[0].declaration(), "bad");
    }

    #[test]
    fn system_bool_becomes_marshal_bool_everywhere() {
        let m = mapper();
        let mut f = function("set", CallingConvention::C, vec![param("on", prim("bool", 1))]);
        f.return_type = prim("bool", 1);
        let mapped = m.map_function_extern(&f).unwrap();
        assert_eq!(mapped.return_type.name, "CBool");
        assert_eq!(mapped.params[0].ty.name, "CBool");
        assert_eq!(mapped.params[0].ty.original_name, "bool");

        let record = Record {
            name: "Flags".into(),
            location: loc("Record", 1),
            ty: named("Flags", 1, 1),
            fields: vec![field("enabled", prim("bool", 1), 0, 0)],
            nested_records: vec![],
        };
        assert_eq!(m.map_struct(&record).fields[0].ty.name, "CBool");
    }

    #[test]
    fn non_system_bool_is_untouched() {
        let ty = named("bool", 1, 1);
        assert_eq!(mapper().map_type(&ty).name, "bool");
    }

    #[test]
    fn map_type_copies_layout_verbatim() {
        let ty = array("int", 4, 8, true);
        let mapped = mapper().map_type(&ty);
        assert_eq!(mapped.size, 32);
        assert_eq!(mapped.align, 4);
        assert_eq!(mapped.fixed_buffer_size, Some(8));
        assert_eq!(mapped.original_name, "int[8]");
    }

    #[test]
    fn array_wrapping_depends_on_element_type_only() {
        let m = mapper();
        for count in [1, 4, 64] {
            let record = Record {
                name: "S".into(),
                location: loc("Record", 1),
                ty: named("S", 4 * count + 8 * count, 8),
                fields: vec![
                    field("ints", array("int", 4, count, true), 0, 0),
                    field("points", array("Point", 8, count, false), 4 * count, 0),
                    field("ptrs", array("void*", 8, count, true), 0, 0),
                    field("flags", array("bool", 1, count, true), 0, 0),
                ],
                nested_records: vec![],
            };
            let s = m.map_struct(&record);
            assert!(!s.fields[0].is_wrapped, "int[{count}] must not be wrapped");
            assert!(s.fields[1].is_wrapped, "Point[{count}] must be wrapped");
            assert!(s.fields[2].is_wrapped, "void*[{count}] must be wrapped");
            // bool is substituted before the check, and CBool has no fixed buffer form
            assert!(s.fields[3].is_wrapped);
        }
    }

    #[test]
    fn non_array_fields_are_never_wrapped() {
        let record = Record {
            name: "S".into(),
            location: loc("Record", 1),
            ty: named("S", 8, 8),
            fields: vec![field("p", named("Point", 8, 4), 0, 0)],
            nested_records: vec![],
        };
        assert!(!mapper().map_struct(&record).fields[0].is_wrapped);
    }

    #[test]
    fn fields_keep_offsets_padding_and_original_names() {
        let record = Record {
            name: "Outer".into(),
            location: loc("Record", 1),
            ty: named("Outer", 24, 8),
            fields: vec![
                field("base", prim("byte", 1), 0, 7),
                field("object", prim("long", 8), 8, 0),
                field("u", named("Outer_u", 8, 8), 16, 0),
            ],
            nested_records: vec![Record {
                name: "Outer_u".into(),
                location: loc("Record", 3),
                ty: named("Outer_u", 8, 8),
                fields: vec![
                    field("i", prim("int", 4), 0, 4),
                    field("d", prim("double", 8), 0, 0),
                ],
                nested_records: vec![],
            }],
        };
        let s = mapper().map_struct(&record);
        assert_eq!(s.fields[0].name, "@base");
        assert_eq!(s.fields[0].original_name, "base");
        assert_eq!((s.fields[0].offset, s.fields[0].padding), (0, 7));
        assert_eq!(s.fields[1].name, "@object");
        assert_eq!((s.fields[1].offset, s.fields[1].padding), (8, 0));
        assert_eq!(s.nested_structs.len(), 1);
        let nested = &s.nested_structs[0];
        assert_eq!(nested.name, "Outer_u");
        assert_eq!((nested.fields[0].offset, nested.fields[0].padding), (0, 4));
        assert_eq!((nested.fields[1].offset, nested.fields[1].padding), (0, 0));
    }

    #[test]
    fn opaque_pointer_becomes_pointer_struct() {
        let p = OpaquePointer {
            name: "FooHandle".into(),
            location: loc("OpaquePointer", 4),
            pointer_type: named("Foo*", 8, 8),
        };
        let s = mapper().map_opaque_pointer(&p);
        assert_eq!(s.name, "FooHandle");
        assert_eq!(s.fields.len(), 1);
        let f = &s.fields[0];
        assert_eq!(f.name, "Pointer");
        assert_eq!((f.offset, f.padding, f.is_wrapped), (0, 0, false));
        assert_eq!(f.ty.name, "Foo*");
        assert_eq!(s.ty.size, 8);
    }

    #[test]
    fn aliases_over_same_type_stay_distinct() {
        let m = mapper();
        let my_int = m.map_alias_type(&AliasType {
            name: "MyInt".into(),
            location: loc("AliasType", 1),
            underlying_type: prim("int", 4),
        });
        let other_int = m.map_alias_type(&AliasType {
            name: "OtherInt".into(),
            location: loc("AliasType", 2),
            underlying_type: prim("int", 4),
        });
        assert_eq!(my_int.fields.len(), 1);
        assert_eq!(my_int.fields[0].name, "Data");
        assert_eq!(my_int.fields[0].offset, 0);
        assert_eq!(my_int.fields[0].ty, other_int.fields[0].ty);
        assert_ne!(my_int.name, other_int.name);
    }

    #[test]
    fn enum_values_round_trip_exactly() {
        let e = Enum {
            name: "Status".into(),
            location: loc("Enum", 1),
            integer_type: prim("long", 8),
            values: [("MIN", i64::MIN), ("NEG", -1), ("BIG", 1 << 40), ("MAX", i64::MAX)]
                .into_iter()
                .map(|(n, v)| EnumValue {
                    name: n.into(),
                    location: loc("EnumValue", 2),
                    value: v,
                })
                .collect(),
        };
        let mapped = mapper().map_enum(&e);
        let values: Vec<i64> = mapped.values.iter().map(|v| v.value).collect();
        assert_eq!(values, [i64::MIN, -1, 1 << 40, i64::MAX]);
        assert_eq!(mapped.integer_type.name, "long");
    }

    #[test]
    fn struct_order_is_records_then_aliases_then_opaque_pointers() {
        let model = CModel {
            records: vec![Record {
                name: "R".into(),
                location: loc("Record", 1),
                ty: named("R", 4, 4),
                fields: vec![field("a", prim("int", 4), 0, 0)],
                nested_records: vec![],
            }],
            alias_types: vec![AliasType {
                name: "A".into(),
                location: loc("AliasType", 2),
                underlying_type: prim("int", 4),
            }],
            opaque_pointers: vec![OpaquePointer {
                name: "P".into(),
                location: loc("OpaquePointer", 3),
                pointer_type: named("void*", 8, 8),
            }],
            ..Default::default()
        };
        let mapping = mapper().map_model(&model);
        let names: Vec<&str> = mapping.bindings.structs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["R", "A", "P"]);
    }

    #[test]
    fn mapping_is_deterministic() {
        let model = CModel {
            function_externs: (0..64)
                .map(|i| function(&format!("f{i}"), CallingConvention::C, vec![]))
                .collect(),
            ..Default::default()
        };
        let a = mapper().map_model(&model).bindings;
        let b = mapper().map_model(&model).bindings;
        assert_eq!(a, b);
        assert_eq!(a.function_externs[63].name, "f63");
    }

    #[test]
    fn layout_check_flags_only_inconsistent_records() {
        let good = Record {
            name: "Good".into(),
            location: loc("Record", 1),
            ty: named("Good", 8, 4),
            fields: vec![field("a", prim("byte", 1), 0, 3), field("b", prim("int", 4), 4, 0)],
            nested_records: vec![Record {
                name: "Good_inner".into(),
                location: loc("Record", 2),
                ty: named("Good_inner", 8, 4),
                fields: vec![field("x", prim("int", 4), 0, 0)],
                nested_records: vec![],
            }],
        };
        let mismatches = check_record_layout(&good);
        assert_eq!(
            mismatches,
            [LayoutMismatch {
                record: "Good_inner".into(),
                expected: 8,
                actual: 4,
            }]
        );
    }
}
