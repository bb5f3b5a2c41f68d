//! A small builder for producing namespace-qualified XML documents, used to
//! assemble WSMan SOAP envelopes and CLIXML payloads without pulling in a
//! full DOM library.

mod attribute;
mod declaration;
mod element;
mod namespace;

pub use attribute::Attribute;
pub use declaration::Declaration;
pub use element::{AliasMap, Content, Element, NamespaceWrite};
pub use namespace::Namespace;

#[derive(Debug, Clone, thiserror::Error)]
pub enum XmlBuilderError {
    #[error("namespace {ns} on attribute/element {attr} has no alias in the document's map")]
    MissingAliasMapForAttribute { attr: String, ns: String },

    #[error("I/O error while writing XML: {0}")]
    Io(String),

    #[error("invalid UTF-8 produced while writing XML: {0}")]
    Utf8(String),
}

impl From<std::io::Error> for XmlBuilderError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Threads a per-document namespace→alias map through a `Display`-style
/// formatter. Kept alongside [`element::NamespaceWrite`] (its `io::Write`
/// counterpart) because [`Attribute`] implements both: some call sites render
/// directly into a `String` via `Display`, others stream into a buffer.
pub trait NamespaceFmt {
    fn ns_fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        alias_map: Option<&std::collections::HashMap<Namespace<'_>, Option<&str>>>,
    ) -> std::fmt::Result;
}
