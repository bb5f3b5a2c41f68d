//! CLIXML serialization: the write-side counterpart to [`super::deserialize`].
//!
//! Mirrors the `<TN>`/`<TNRef>` and `<Obj RefId>`/`<Ref RefId>` de-duplication
//! the deserializer has to undo on read: the first time a given [`PsType`] or
//! [`ComplexObject`] is written it gets a fresh RefId, every subsequent
//! occurrence becomes a back-reference.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use psrp_xml::builder::{Attribute, Element};
use tracing::{debug, trace};

use super::{ComplexObject, ComplexObjectContent, Container, PsPrimitiveValue, PsProperty, PsType, PsValue};

type Result<T> = std::result::Result<T, crate::PowerShellRemotingError>;

/// Tracks which objects/types have already been written in this document so
/// repeat occurrences become `<Ref>`/`<TNRef>` instead of being re-emitted.
#[derive(Debug, Default)]
pub struct RefIdMap<'a, T> {
    map: HashMap<&'a T, u32>,
    next_id: u32,
}

impl<'a, T> RefIdMap<'a, T> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<'a, T> RefIdMap<'a, T>
where
    T: std::hash::Hash + Eq,
{
    fn contains(&self, item: &T) -> bool {
        self.map.contains_key(item)
    }

    fn insert_new(&mut self, item: &'a T) -> Result<u32> {
        if let Some(existing) = self.map.get(item) {
            trace!("item already has RefId={existing}, not re-inserting");
            Err(crate::PowerShellRemotingError::SerializationError(
                "attempted to insert duplicate item into RefIdMap",
            ))
        } else {
            let id = self.next_id;
            self.map.insert(item, id);
            self.next_id += 1;
            Ok(id)
        }
    }
}

impl PsPrimitiveValue {
    pub fn to_element(&self) -> Element<'_> {
        match self {
            PsPrimitiveValue::Str(s) => Element::new("S").set_text(s.as_str()),
            PsPrimitiveValue::Char(c) => Element::new("C").set_text(c.to_string()),
            PsPrimitiveValue::Bool(b) => Element::new("B").set_text(b.to_string()),
            PsPrimitiveValue::SByte(i) => Element::new("SB").set_text(i.to_string()),
            PsPrimitiveValue::Byte(u) => Element::new("By").set_text(u.to_string()),
            PsPrimitiveValue::Int16(i) => Element::new("I16").set_text(i.to_string()),
            PsPrimitiveValue::UInt16(u) => Element::new("U16").set_text(u.to_string()),
            PsPrimitiveValue::I32(i) => Element::new("I32").set_text(i.to_string()),
            PsPrimitiveValue::U32(u) => Element::new("U32").set_text(u.to_string()),
            PsPrimitiveValue::I64(i) => Element::new("I64").set_text(i.to_string()),
            PsPrimitiveValue::U64(u) => Element::new("U64").set_text(u.to_string()),
            PsPrimitiveValue::Single(s) => Element::new("Sg").set_text(s.as_str()),
            PsPrimitiveValue::Double(s) => Element::new("Db").set_text(s.as_str()),
            PsPrimitiveValue::Decimal(s) => Element::new("D").set_text(s.as_str()),
            PsPrimitiveValue::Guid(g) => Element::new("G").set_text(g.as_str()),
            PsPrimitiveValue::Nil => Element::new("Nil"),
            PsPrimitiveValue::Bytes(b) => Element::new("BA").set_text_owned(B64.encode(b)),
            PsPrimitiveValue::Version(v) => Element::new("Version").set_text(v.as_str()),
            PsPrimitiveValue::DateTime(dt) => Element::new("DT").set_text(dt.as_str()),
            PsPrimitiveValue::Duration(d) => Element::new("TS").set_text(d.as_str()),
            PsPrimitiveValue::Uri(u) => Element::new("URI").set_text(u.as_str()),
            PsPrimitiveValue::Xml(x) => Element::new("XD").set_text(x.as_str()),
            PsPrimitiveValue::ScriptBlock(s) => Element::new("SBK").set_text(s.as_str()),
            PsPrimitiveValue::SecureString(bytes) => {
                Element::new("SS").set_text_owned(B64.encode(bytes))
            }
        }
    }
}

impl PsValue {
    pub fn to_element_as_root(&self) -> Result<Element<'_>> {
        let mut objects_map = RefIdMap::new();
        let mut types_map = RefIdMap::new();
        self.to_element(&mut objects_map, &mut types_map)
    }

    pub fn to_element<'a>(
        &'a self,
        objects_map: &mut RefIdMap<'a, ComplexObject>,
        types_map: &mut RefIdMap<'a, PsType>,
    ) -> Result<Element<'a>> {
        match self {
            PsValue::Primitive(p) => Ok(p.to_element()),
            PsValue::Object(obj) => obj.to_element(objects_map, types_map),
        }
    }
}

impl PsProperty {
    pub fn to_element<'a>(
        &'a self,
        objects_map: &mut RefIdMap<'a, ComplexObject>,
        types_map: &mut RefIdMap<'a, PsType>,
    ) -> Result<Element<'a>> {
        Ok(self
            .value
            .to_element(objects_map, types_map)?
            .add_attribute(Attribute::new("N", self.name.as_str())))
    }
}

impl PsType {
    pub fn to_element<'a>(&'a self, types_map: &mut RefIdMap<'a, PsType>) -> Result<Element<'a>> {
        if types_map.contains(self) {
            let ref_id = *types_map.map.get(self).expect("just checked contains");
            debug!(ref_id, "emitting TNRef for already-written type");
            return Ok(Element::new("TNRef").add_attribute(Attribute::new("RefId", ref_id.to_string())));
        }

        let ref_id = types_map.insert_new(self)?;
        let mut element = Element::new("TN").add_attribute(Attribute::new("RefId", ref_id.to_string()));
        for type_name in &self.type_names {
            element = element.add_child(Element::new("T").set_text(type_name.as_ref()));
        }
        Ok(element)
    }
}

impl Container {
    pub fn to_element<'a>(
        &'a self,
        objects_map: &mut RefIdMap<'a, ComplexObject>,
        types_map: &mut RefIdMap<'a, PsType>,
    ) -> Result<Element<'a>> {
        Ok(match self {
            Container::Stack(values) => {
                let mut el = Element::new("STK");
                for v in values {
                    el = el.add_child(v.to_element(objects_map, types_map)?);
                }
                el
            }
            Container::Queue(values) => {
                let mut el = Element::new("QUE");
                for v in values {
                    el = el.add_child(v.to_element(objects_map, types_map)?);
                }
                el
            }
            Container::List(values) => {
                let mut el = Element::new("LST");
                for v in values {
                    el = el.add_child(v.to_element(objects_map, types_map)?);
                }
                el
            }
            Container::Dictionary(map) => {
                let mut el = Element::new("DCT");
                for (key, value) in map {
                    let key_el = key
                        .to_element(objects_map, types_map)?
                        .add_attribute(Attribute::new("N", "Key"));
                    let value_el = value
                        .to_element(objects_map, types_map)?
                        .add_attribute(Attribute::new("N", "Value"));
                    el = el.add_child(Element::new("En").add_child(key_el).add_child(value_el));
                }
                el
            }
        })
    }
}

impl ComplexObject {
    pub fn to_element_as_root(&self) -> Result<Element<'_>> {
        let mut objects_map = RefIdMap::new();
        let mut types_map = RefIdMap::new();
        self.to_element(&mut objects_map, &mut types_map)
    }

    pub fn to_element<'a>(
        &'a self,
        objects_map: &mut RefIdMap<'a, ComplexObject>,
        types_map: &mut RefIdMap<'a, PsType>,
    ) -> Result<Element<'a>> {
        if let Some(ref_id) = objects_map.map.get(self) {
            debug!(ref_id, "emitting Ref for already-written object");
            return Ok(Element::new("Ref").add_attribute(Attribute::new("RefId", ref_id.to_string())));
        }
        let ref_id = objects_map.insert_new(self)?;

        let mut element = Element::new("Obj").add_attribute(Attribute::new("RefId", ref_id.to_string()));

        if let Some(type_def) = &self.type_def {
            element = element.add_child(type_def.to_element(types_map)?);
        }
        if let Some(to_string) = &self.to_string {
            element = element.add_child(Element::new("ToString").set_text(to_string.as_str()));
        }

        match &self.content {
            ComplexObjectContent::ExtendedPrimitive(value) => {
                element = element.add_child(value.to_element());
            }
            ComplexObjectContent::Container(container) => {
                element = element.add_child(container.to_element(objects_map, types_map)?);
            }
            ComplexObjectContent::PsEnums(e) => {
                element = element.add_child(Element::new("I32").set_text_owned(e.value.to_string()));
            }
            ComplexObjectContent::Standard => {}
        }

        if !self.adapted_properties.is_empty() {
            let mut props = Element::new("Props");
            for prop in self.adapted_properties.values() {
                props = props.add_child(prop.to_element(objects_map, types_map)?);
            }
            element = element.add_child(props);
        }

        if !self.extended_properties.is_empty() {
            let mut ms = Element::new("MS");
            for prop in self.extended_properties.values() {
                ms = ms.add_child(prop.to_element(objects_map, types_map)?);
            }
            element = element.add_child(ms);
        }

        Ok(element)
    }
}
