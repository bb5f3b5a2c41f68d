pub mod attribute;
pub mod namespace;
pub mod tag;
pub mod tag_name;
pub mod tag_value;

pub use attribute::Attribute;
pub use namespace::{Namespace, NamespaceDeclaration};
pub use tag::Tag;
pub use tag_name::*;
pub use tag_value::{Empty, ReadOnlyUnParsed, Text, TagValue, Time, WsUuid, I32, U32, U64, U8};
