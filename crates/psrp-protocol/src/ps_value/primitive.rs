use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A CLIXML primitive value — one of the leaf element types listed in
/// https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-psrp/c8c85974-ffd7-4455-84a8-e49016c20683
///
/// Several variants (`Single`, `Double`, `Decimal`, `Duration`, `DateTime`)
/// keep the wire-format string rather than a parsed numeric/chrono type:
/// `f32`/`f64` don't implement `Eq`/`Hash`/`Ord`, which every container in
/// this module derives, and round-tripping the exact wire text avoids lossy
/// reformatting on serialize. Parsing into a richer type is left to callers
/// that need it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PsPrimitiveValue {
    Str(String),
    Char(char),
    Bool(bool),
    /// `<SB>`, a signed 8-bit integer.
    SByte(i8),
    /// `<By>`, an unsigned 8-bit integer.
    Byte(u8),
    /// `<I16>`.
    Int16(i16),
    /// `<U16>`.
    UInt16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    /// `<Sg>`, stored as the CLIXML-formatted text.
    Single(String),
    /// `<Db>`, stored as the CLIXML-formatted text.
    Double(String),
    /// `<D>`, stored as the CLIXML-formatted text.
    Decimal(String),
    Guid(String),
    Nil,
    Bytes(Vec<u8>),
    Version(String),
    /// `<DT>`, stored as the ISO-8601 wire text (including the trailing
    /// `[UTC]` adjustment marker when present).
    DateTime(String),
    /// `<TS>`, stored as the `xs:duration`-style wire text.
    Duration(String),
    Uri(String),
    /// `<XD>`, an inline XML document fragment.
    Xml(String),
    /// `<SBK>`, a script block's source text.
    ScriptBlock(String),
    /// `<SS>`, the encrypted bytes of a secure string (base64-decoded). Held
    /// as raw bytes rather than plaintext since they stay AES-encrypted
    /// until the session key is available and the caller chooses to decrypt.
    SecureString(Vec<u8>),
}

impl Display for PsPrimitiveValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PsPrimitiveValue::Str(s) => write!(f, "{s}"),
            PsPrimitiveValue::Char(c) => write!(f, "{c}"),
            PsPrimitiveValue::Bool(b) => write!(f, "{b}"),
            PsPrimitiveValue::SByte(i) => write!(f, "{i}"),
            PsPrimitiveValue::Byte(u) => write!(f, "{u}"),
            PsPrimitiveValue::Int16(i) => write!(f, "{i}"),
            PsPrimitiveValue::UInt16(u) => write!(f, "{u}"),
            PsPrimitiveValue::I32(i) => write!(f, "{i}"),
            PsPrimitiveValue::U32(u) => write!(f, "{u}"),
            PsPrimitiveValue::I64(i) => write!(f, "{i}"),
            PsPrimitiveValue::U64(u) => write!(f, "{u}"),
            PsPrimitiveValue::Single(s) => write!(f, "{s}"),
            PsPrimitiveValue::Double(s) => write!(f, "{s}"),
            PsPrimitiveValue::Decimal(s) => write!(f, "{s}"),
            PsPrimitiveValue::Guid(g) => write!(f, "{g}"),
            PsPrimitiveValue::Nil => write!(f, ""), // PowerShell $null stringifies to empty string
            PsPrimitiveValue::Bytes(_bytes) => write!(f, "System.Byte[]"),
            PsPrimitiveValue::Version(v) => write!(f, "{v}"),
            PsPrimitiveValue::DateTime(d) => write!(f, "{d}"),
            PsPrimitiveValue::Duration(d) => write!(f, "{d}"),
            PsPrimitiveValue::Uri(u) => write!(f, "{u}"),
            PsPrimitiveValue::Xml(x) => write!(f, "{x}"),
            PsPrimitiveValue::ScriptBlock(s) => write!(f, "{s}"),
            PsPrimitiveValue::SecureString(_) => write!(f, "System.Security.SecureString"),
        }
    }
}
