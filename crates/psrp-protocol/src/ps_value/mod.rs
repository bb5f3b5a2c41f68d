mod container;
pub(crate) mod deserialize;
mod primitive;
mod property;
mod serialize;
mod types;
mod value;

pub use container::{Container, PsEnums};
pub use deserialize::{
    ComplexObjectContextVisitor, ContainerContextVisitor, DeserializationContext,
    PsPrimitiveValueVisitor, PsPropertyContextVisitor, PsTypeContextVisitor, PsValueContextVisitor,
    PsXmlDeserialize, PsXmlVisitor,
};
pub use primitive::PsPrimitiveValue;
pub use property::PsProperty;
pub use types::PsType;
pub use value::PsValue;

use std::collections::BTreeMap;

use crate::MessageType;

/// A `System.Object`-rooted value: a type-name chain, an optional `ToString`
/// rendering, an optional base value (when the object wraps a primitive or a
/// collection), and the two property buckets PSRP distinguishes — see
/// [MS-PSRP §2.2.5.3.4.1].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ComplexObject {
    pub type_def: Option<PsType>,
    pub to_string: Option<String>,
    pub content: ComplexObjectContent,
    pub adapted_properties: BTreeMap<String, PsProperty>,
    pub extended_properties: BTreeMap<String, PsProperty>,
}

impl ComplexObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_adapted(&self, name: &str) -> Option<&PsValue> {
        self.adapted_properties.get(name).map(|p| &p.value)
    }

    pub fn get_extended(&self, name: &str) -> Option<&PsValue> {
        self.extended_properties.get(name).map(|p| &p.value)
    }

    /// Looks in extended properties first (PSRP message fields live there),
    /// falling back to adapted properties (surfaced `Get-Member` fields on
    /// arbitrary .NET objects).
    pub fn get_property(&self, name: &str) -> Option<&PsValue> {
        self.get_extended(name).or_else(|| self.get_adapted(name))
    }

    pub fn set_extended(&mut self, name: impl Into<String>, value: PsValue) {
        let name = name.into();
        self.extended_properties
            .insert(name.clone(), PsProperty { name, value });
    }

    pub fn set_adapted(&mut self, name: impl Into<String>, value: PsValue) {
        let name = name.into();
        self.adapted_properties
            .insert(name.clone(), PsProperty { name, value });
    }
}

impl Default for ComplexObject {
    fn default() -> Self {
        Self {
            type_def: None,
            to_string: None,
            content: ComplexObjectContent::Standard,
            adapted_properties: BTreeMap::new(),
            extended_properties: BTreeMap::new(),
        }
    }
}

impl std::fmt::Display for ComplexObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(s) = &self.to_string {
            return write!(f, "{s}");
        }
        match &self.content {
            ComplexObjectContent::Standard => write!(f, "{}", self.type_name_or("System.Object")),
            ComplexObjectContent::ExtendedPrimitive(p) => write!(f, "{p}"),
            ComplexObjectContent::Container(c) => write!(f, "{c}"),
            ComplexObjectContent::PsEnums(e) => write!(f, "{e}"),
        }
    }
}

impl ComplexObject {
    fn type_name_or<'s>(&'s self, default: &'s str) -> &'s str {
        self.type_def
            .as_ref()
            .and_then(|t| t.type_names.first())
            .map(std::convert::AsRef::as_ref)
            .unwrap_or(default)
    }
}

/// The "base value" a complex object may carry alongside its properties: a
/// bare primitive (an object whose .NET type is itself a primitive but which
/// was promoted to `Obj` form because it carries a RefId or extra
/// properties), a collection, an enum, or nothing (a plain custom object).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, serde::Serialize, serde::Deserialize,
)]
pub enum ComplexObjectContent {
    #[default]
    Standard,
    ExtendedPrimitive(PsPrimitiveValue),
    Container(Container),
    PsEnums(PsEnums),
}

/// Implemented by every PSRP message payload type so the fragmenter and
/// message layer can serialize it without knowing its concrete type.
pub trait PsObjectWithType: std::fmt::Debug {
    fn message_type(&self) -> MessageType;
    fn to_ps_object(&self) -> PsValue;
}
