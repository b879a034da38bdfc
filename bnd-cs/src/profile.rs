//! Target-language tables used by the mapper and emitter.

/// Read-only description of the binding language.
///
/// Retargeting to another managed language means supplying another profile;
/// nothing in the mapper hard-codes C# spellings.
#[derive(Debug, Clone, Copy)]
pub struct TargetProfile {
    /// Reserved words that cannot be used as identifiers.
    pub keywords: &'static [&'static str],
    /// Prefix that turns a reserved word into a legal identifier.
    pub escape_prefix: &'static str,
    /// Element type names allowed in a native inline fixed buffer.
    pub fixed_buffer_types: &'static [&'static str],
    /// Display name the front end uses for the one-byte C boolean.
    pub system_bool: &'static str,
    /// One-byte boolean type that marshals like C `_Bool`.
    pub marshal_bool: &'static str,
}

impl TargetProfile {
    pub const CSHARP: TargetProfile = TargetProfile {
        keywords: CSHARP_KEYWORDS,
        escape_prefix: "@",
        fixed_buffer_types: CSHARP_FIXED_BUFFER_TYPES,
        system_bool: "bool",
        marshal_bool: "CBool",
    };

    pub fn is_keyword(&self, name: &str) -> bool {
        self.keywords.contains(&name)
    }

    pub fn is_fixed_buffer_type(&self, name: &str) -> bool {
        self.fixed_buffer_types.contains(&name)
    }
}

impl Default for TargetProfile {
    fn default() -> Self {
        TargetProfile::CSHARP
    }
}

const CSHARP_KEYWORDS: &[&str] = &[
    "abstract",
    "as",
    "base",
    "bool",
    "break",
    "byte",
    "case",
    "catch",
    "char",
    "checked",
    "class",
    "const",
    "continue",
    "decimal",
    "default",
    "delegate",
    "do",
    "double",
    "else",
    "enum",
    "event",
    "explicit",
    "extern",
    "false",
    "finally",
    "fixed",
    "float",
    "for",
    "foreach",
    "goto",
    "if",
    "implicit",
    "in",
    "int",
    "interface",
    "internal",
    "is",
    "lock",
    "long",
    "namespace",
    "new",
    "null",
    "object",
    "operator",
    "out",
    "override",
    "params",
    "private",
    "protected",
    "public",
    "readonly",
    "record",
    "ref",
    "return",
    "sbyte",
    "sealed",
    "short",
    "sizeof",
    "stackalloc",
    "static",
    "string",
    "struct",
    "switch",
    "this",
    "throw",
    "true",
    "try",
    "typeof",
    "uint",
    "ulong",
    "unchecked",
    "unsafe",
    "ushort",
    "using",
    "virtual",
    "void",
    "volatile",
    "while",
];

const CSHARP_FIXED_BUFFER_TYPES: &[&str] = &[
    "bool", "byte", "char", "short", "int", "long", "sbyte", "ushort", "uint", "ulong", "float",
    "double",
];
