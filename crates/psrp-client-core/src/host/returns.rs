use std::collections::HashMap;

use super::{methods, traits::ToPs};
use psrp_protocol::{ComplexObject, PsPrimitiveValue, PsValue};

impl<S: ::std::hash::BuildHasher> ToPs for HashMap<String, PsValue, S> {
    fn to_ps(v: Self) -> Option<PsValue> {
        let mut obj = ComplexObject::new();
        for (key, value) in v {
            obj.set_extended(key, value);
        }
        Some(PsValue::Object(obj))
    }
}

impl ToPs for methods::PSCredential {
    fn to_ps(v: Self) -> Option<PsValue> {
        let mut obj = ComplexObject::new();
        obj.set_adapted(
            "UserName",
            PsValue::Primitive(PsPrimitiveValue::Str(v.user_name)),
        );
        obj.set_adapted(
            "Password",
            PsValue::Primitive(PsPrimitiveValue::SecureString(v.password)),
        );
        Some(PsValue::Object(obj))
    }
}

impl ToPs for Vec<i32> {
    fn to_ps(v: Self) -> Option<PsValue> {
        Some(PsValue::from_array(
            v.into_iter().map(PsValue::from).collect(),
        ))
    }
}

impl ToPs for methods::KeyInfo {
    fn to_ps(v: Self) -> Option<PsValue> {
        let mut obj = ComplexObject::new();
        obj.set_adapted(
            "virtualKeyCode",
            PsValue::Primitive(PsPrimitiveValue::I32(v.virtual_key_code)),
        );
        obj.set_adapted(
            "character",
            PsValue::Primitive(PsPrimitiveValue::Char(v.character)),
        );
        obj.set_adapted(
            "controlKeyState",
            PsValue::Primitive(PsPrimitiveValue::I32(v.control_key_state)),
        );
        obj.set_adapted(
            "keyDown",
            PsValue::Primitive(PsPrimitiveValue::Bool(v.key_down)),
        );
        Some(PsValue::Object(obj))
    }
}

impl ToPs for methods::BufferCell {
    fn to_ps(v: Self) -> Option<PsValue> {
        let mut obj = ComplexObject::new();
        obj.set_extended(
            "character",
            PsValue::Primitive(PsPrimitiveValue::Char(v.character)),
        );
        obj.set_extended(
            "foregroundColor",
            PsValue::Primitive(PsPrimitiveValue::I32(v.foreground)),
        );
        obj.set_extended(
            "backgroundColor",
            PsValue::Primitive(PsPrimitiveValue::I32(v.background)),
        );
        obj.set_extended(
            "bufferCellType",
            PsValue::Primitive(PsPrimitiveValue::I32(v.flags)),
        );
        Some(PsValue::Object(obj))
    }
}

impl ToPs for Vec<Vec<methods::BufferCell>> {
    fn to_ps(v: Self) -> Option<PsValue> {
        let rows = v
            .into_iter()
            .map(|row| {
                PsValue::from_array(
                    row.into_iter()
                        .filter_map(methods::BufferCell::to_ps)
                        .collect(),
                )
            })
            .collect();
        Some(PsValue::from_array(rows))
    }
}

impl ToPs for methods::Coordinates {
    fn to_ps(v: Self) -> Option<PsValue> {
        let mut obj = ComplexObject::new();
        obj.set_extended("x", PsValue::Primitive(PsPrimitiveValue::I32(v.x)));
        obj.set_extended("y", PsValue::Primitive(PsPrimitiveValue::I32(v.y)));
        Some(PsValue::Object(obj))
    }
}

impl ToPs for methods::Size {
    fn to_ps(v: Self) -> Option<PsValue> {
        let mut obj = ComplexObject::new();
        obj.set_extended(
            "width",
            PsValue::Primitive(PsPrimitiveValue::I32(v.width)),
        );
        obj.set_extended(
            "height",
            PsValue::Primitive(PsPrimitiveValue::I32(v.height)),
        );
        Some(PsValue::Object(obj))
    }
}
