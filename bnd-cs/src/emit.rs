//! Emitter — binding model → one C# compilation unit.
//!
//! The writer enforces the layout and whitespace rules of the generated code:
//! - every struct field carries `[FieldOffset(n)]` with the recorded offset and
//!   a `// size = .., padding = ..` comment;
//! - members of one block are separated by exactly one blank line, with none
//!   after the last;
//! - pointer types are written without inner whitespace and followed by a
//!   single space;
//! - extern functions name their C entry point and calling convention.

use tracing::debug;

use crate::binding::*;
use crate::profile::TargetProfile;
use crate::sanitize::sanitize;

/// Settings for one emitted file.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Enclosing namespace; empty for none.
    pub namespace: String,
    /// Static class holding every declaration.
    pub class_name: String,
    /// Native library passed to `DllImport`.
    pub library: String,
    /// Append `// Kind @ file:line` comments to declarations.
    pub location_comments: bool,
}

/// Emitted source text plus the top-level names it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub source: String,
    pub names: Vec<String>,
}

/// Render all bindings into a single C# source file.
pub fn emit_bindings(
    bindings: &CsBindings,
    profile: &TargetProfile,
    options: &EmitOptions,
) -> Emitted {
    let mut names = bindings.declared_names();
    let needs_bool_helper =
        uses_type(bindings, profile.marshal_bool) && !names.iter().any(|n| n == profile.marshal_bool);

    let mut w = CodeWriter::default();
    w.line("// <auto-generated>");
    w.line("//     This code was generated by bnd-cs. Do not edit.");
    w.line("// </auto-generated>");
    w.blank();
    w.line("using System;");
    w.line("using System.Runtime.InteropServices;");
    w.blank();

    let has_namespace = !options.namespace.is_empty();
    if has_namespace {
        w.line(&format!("namespace {}", options.namespace));
        w.open();
    }

    w.line(&format!(
        "public static unsafe partial class {}",
        options.class_name
    ));
    w.open();

    let e = Emitter {
        profile,
        options,
    };

    w.member();
    w.line(&format!(
        "private const string LibraryName = \"{}\";",
        options.library
    ));

    for f in &bindings.function_externs {
        e.function_extern(&mut w, f);
    }
    for fp in &bindings.function_pointers {
        e.function_pointer(&mut w, fp);
    }
    for s in &bindings.structs {
        e.struct_decl(&mut w, s);
    }
    for o in &bindings.opaque_data_types {
        e.opaque_data_type(&mut w, o);
    }
    for en in &bindings.enums {
        e.enum_decl(&mut w, en);
    }
    if needs_bool_helper {
        e.bool_helper(&mut w);
        names.push(profile.marshal_bool.to_string());
    }

    w.close();
    if has_namespace {
        w.close();
    }

    debug!(
        class = %options.class_name,
        declarations = names.len(),
        bytes = w.buf.len(),
        "emitted bindings"
    );

    Emitted {
        source: w.buf,
        names,
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Indenting line writer that tracks member separation per block.
#[derive(Default)]
struct CodeWriter {
    buf: String,
    indent: usize,
    /// One entry per open block: whether a member was already written in it.
    blocks: Vec<bool>,
}

impl CodeWriter {
    const INDENT: &'static str = "    ";

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.buf.push_str(Self::INDENT);
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    fn blank(&mut self) {
        self.buf.push('\n');
    }

    fn open(&mut self) {
        self.line("{");
        self.indent += 1;
        self.blocks.push(false);
    }

    fn close(&mut self) {
        self.blocks.pop();
        self.indent -= 1;
        self.line("}");
    }

    /// Start a new member of the current block, separating it from the
    /// previous one by a single blank line.
    fn member(&mut self) {
        if let Some(seen) = self.blocks.last_mut() {
            if *seen {
                self.buf.push('\n');
            }
            *seen = true;
        }
    }
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

struct Emitter<'a> {
    profile: &'a TargetProfile,
    options: &'a EmitOptions,
}

impl Emitter<'_> {
    fn trailing(&self, location: &crate::model::CodeLocation) -> String {
        if self.options.location_comments {
            format!(" // {location}")
        } else {
            String::new()
        }
    }

    fn function_extern(&self, w: &mut CodeWriter, f: &CsFunctionExtern) {
        let calling_convention = match f.calling_convention {
            CsCallingConvention::C => "Cdecl",
            CsCallingConvention::Unknown => "Winapi",
        };
        let params = f
            .params
            .iter()
            .map(|p| {
                let attr = if p.is_read_only { "[In] " } else { "" };
                format!("{attr}{} {}", type_name(&p.ty), p.name)
            })
            .collect::<Vec<_>>()
            .join(", ");

        w.member();
        w.line(&format!(
            "[DllImport(LibraryName, EntryPoint = \"{}\", CallingConvention = CallingConvention.{calling_convention})]",
            f.name
        ));
        w.line(&format!(
            "public static extern {} {}({params});{}",
            type_name(&f.return_type),
            sanitize(self.profile, &f.name),
            self.trailing(&f.location)
        ));
    }

    fn function_pointer(&self, w: &mut CodeWriter, fp: &CsFunctionPointer) {
        w.member();
        w.line(&struct_layout(fp.ty.size, fp.ty.align));
        w.line(&format!("public struct {}{}", fp.name, self.trailing(&fp.location)));
        w.open();
        w.member();
        w.line(&field_offset(0, fp.ty.size, 0));
        w.line("public void* Pointer;");
        w.close();
    }

    fn struct_decl(&self, w: &mut CodeWriter, s: &CsStruct) {
        w.member();
        w.line(&struct_layout(s.ty.size, s.ty.align));
        w.line(&format!("public struct {}{}", s.name, self.trailing(&s.location)));
        w.open();

        for field in &s.fields {
            self.field(w, field);
        }
        for field in s.fields.iter().filter(|f| f.is_wrapped) {
            self.fixed_buffer_wrapper(w, field);
        }
        for nested in &s.nested_structs {
            self.struct_decl(w, nested);
        }

        w.close();
    }

    fn field(&self, w: &mut CodeWriter, field: &CsStructField) {
        w.member();
        if !field.original_name.is_empty() && field.original_name != field.name {
            w.line(&format!("/// <c>{}</c>", field.original_name));
        }

        let count = field.ty.fixed_buffer_size;
        if count == Some(0) {
            w.line(&format!(
                "// {} {}[0] occupies no storage (offset = {})",
                type_name(&field.ty),
                field.name,
                field.offset
            ));
            return;
        }

        w.line(&field_offset(field.offset, field.ty.size, field.padding));
        let trailing = self.trailing(&field.location);
        match count {
            Some(_) if field.is_wrapped => w.line(&format!(
                "public {} {};{trailing}",
                wrapper_name(field),
                field.name
            )),
            Some(n) => w.line(&format!(
                "public fixed {} {}[{n}];{trailing}",
                type_name(&field.ty),
                field.name
            )),
            None => w.line(&format!(
                "public {} {};{trailing}",
                type_name(&field.ty),
                field.name
            )),
        }
    }

    /// Explicit-layout struct standing in for an array whose element type
    /// cannot live in a `fixed` buffer.
    fn fixed_buffer_wrapper(&self, w: &mut CodeWriter, field: &CsStructField) {
        let count = field.ty.fixed_buffer_size.unwrap_or(0);
        if count == 0 {
            return;
        }
        let stride = field.ty.size / count;
        let element = type_name(&field.ty);

        w.member();
        w.line(&struct_layout(field.ty.size, field.ty.align));
        w.line(&format!("public struct {}", wrapper_name(field)));
        w.open();
        for i in 0..count {
            w.member();
            w.line(&field_offset(i * stride, stride, 0));
            w.line(&format!("public {element} _{i};"));
        }
        w.close();
    }

    fn opaque_data_type(&self, w: &mut CodeWriter, o: &CsOpaqueDataType) {
        w.member();
        w.line("[StructLayout(LayoutKind.Sequential)]");
        w.line(&format!("public struct {}{}", o.name, self.trailing(&o.location)));
        w.open();
        w.close();
    }

    fn enum_decl(&self, w: &mut CodeWriter, en: &CsEnum) {
        w.member();
        w.line(&format!(
            "public enum {} : {}{}",
            en.name,
            type_name(&en.integer_type),
            self.trailing(&en.location)
        ));
        w.open();
        for v in &en.values {
            w.line(&format!(
                "{} = {},{}",
                v.name,
                v.value,
                self.trailing(&v.location)
            ));
        }
        w.close();
    }

    /// One-byte boolean with implicit conversions to and from `bool`.
    fn bool_helper(&self, w: &mut CodeWriter) {
        let name = self.profile.marshal_bool;
        w.member();
        w.line("[StructLayout(LayoutKind.Sequential)]");
        w.line(&format!("public readonly struct {name}"));
        w.open();
        w.member();
        w.line("private readonly byte _value;");
        w.member();
        w.line(&format!("private {name}(bool value)"));
        w.open();
        w.line("_value = value ? (byte)1 : (byte)0;");
        w.close();
        w.member();
        w.line(&format!(
            "public static implicit operator {name}(bool value) => new {name}(value);"
        ));
        w.member();
        w.line(&format!(
            "public static implicit operator bool({name} value) => value._value != 0;"
        ));
        w.close();
    }
}

fn struct_layout(size: usize, align: usize) -> String {
    let mut args = String::from("LayoutKind.Explicit");
    if size > 0 {
        args.push_str(&format!(", Size = {size}"));
    }
    if align > 0 {
        args.push_str(&format!(", Pack = {align}"));
    }
    format!("[StructLayout({args})]")
}

fn field_offset(offset: usize, size: usize, padding: usize) -> String {
    format!("[FieldOffset({offset})] // size = {size}, padding = {padding}")
}

fn wrapper_name(field: &CsStructField) -> String {
    let base = if field.original_name.is_empty() {
        field.name.trim_start_matches('@')
    } else {
        field.original_name.as_str()
    };
    format!("FixedBuffer_{base}")
}

fn type_name(ty: &CsType) -> String {
    normalize_pointer_syntax(&ty.name)
}

/// Drop whitespace around `*` and collapse any other whitespace run to one
/// space, so `char * *` and ` char**` both become `char**`.
pub fn normalize_pointer_syntax(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;
    for c in name.trim().chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && c != '*' && !out.ends_with('*') {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }
    out
}

fn uses_type(bindings: &CsBindings, name: &str) -> bool {
    fn in_struct(s: &CsStruct, name: &str) -> bool {
        s.ty.name == name
            || s.fields.iter().any(|f| f.ty.name == name)
            || s.nested_structs.iter().any(|n| in_struct(n, name))
    }

    bindings.function_externs.iter().any(|f| {
        f.return_type.name == name || f.params.iter().any(|p| p.ty.name == name)
    }) || bindings.function_pointers.iter().any(|fp| fp.ty.name == name)
        || bindings.structs.iter().any(|s| in_struct(s, name))
        || bindings.enums.iter().any(|e| e.integer_type.name == name)
}
