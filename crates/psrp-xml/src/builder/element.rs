use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use super::{Attribute, Namespace, XmlBuilderError};

#[derive(Debug, Clone)]
pub enum Content<'a> {
    Text(Cow<'a, str>),
    Elements(Vec<Element<'a>>),
    None,
}

/// A builder node: one XML element with attributes, an optional namespace and
/// either text content or child elements. Namespace prefixes are not decided
/// per-node — they are resolved once, for the whole document, in
/// [`Element::to_xml_string`].
#[derive(Debug, Clone)]
pub struct Element<'a> {
    name: Cow<'a, str>,
    namespace: Option<Namespace<'a>>,
    attributes: Vec<Attribute<'a>>,
    content: Content<'a>,
}

impl<'a> Element<'a> {
    pub fn new(name: impl Into<Cow<'a, str>>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            attributes: Vec::new(),
            content: Content::None,
        }
    }

    #[must_use]
    pub fn set_namespace(mut self, namespace: impl Into<Namespace<'a>>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    #[must_use]
    pub fn set_namespace_optional(mut self, namespace: Option<impl Into<Namespace<'a>>>) -> Self {
        self.namespace = namespace.map(Into::into);
        self
    }

    #[must_use]
    pub fn add_attribute(mut self, attribute: Attribute<'a>) -> Self {
        self.attributes.push(attribute);
        self
    }

    #[must_use]
    pub fn add_attributes(mut self, attributes: impl IntoIterator<Item = Attribute<'a>>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    #[must_use]
    pub fn add_child(mut self, child: Element<'a>) -> Self {
        match &mut self.content {
            Content::Elements(children) => children.push(child),
            _ => self.content = Content::Elements(vec![child]),
        }
        self
    }

    #[must_use]
    pub fn add_children(mut self, children: impl IntoIterator<Item = Element<'a>>) -> Self {
        for child in children {
            self = self.add_child(child);
        }
        self
    }

    #[must_use]
    pub fn set_text(mut self, text: impl Into<Cow<'a, str>>) -> Self {
        self.content = Content::Text(text.into());
        self
    }

    /// Alias for [`Element::set_text`] kept for call sites that read better
    /// as "with" rather than "set" when used inline in a builder chain.
    #[must_use]
    pub fn with_text(self, text: impl Into<Cow<'a, str>>) -> Self {
        self.set_text(text)
    }

    #[must_use]
    pub fn set_text_owned(self, text: impl Into<String>) -> Self {
        self.set_text(text.into())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn collect_namespaces(&self, out: &mut HashSet<Namespace<'a>>) {
        if let Some(ns) = &self.namespace {
            out.insert(ns.clone());
        }
        for attr in &self.attributes {
            attr.get_namespaces(out);
        }
        if let Content::Elements(children) = &self.content {
            for child in children {
                child.collect_namespaces(out);
            }
        }
    }

    /// Render this element (and its subtree) to a standalone XML string,
    /// declaring `xmlns:nsN` bindings for every namespace used anywhere in
    /// the tree on the root element.
    pub fn to_xml_string(&self) -> Result<String, XmlBuilderError> {
        let mut namespaces = HashSet::new();
        self.collect_namespaces(&mut namespaces);

        let alias_map = build_alias_map(namespaces);

        let mut buf: Vec<u8> = Vec::new();
        self.ns_write(&mut buf, Some(&alias_map))?;

        // Declare the namespaces we actually used, on the root element, by
        // re-serializing with the declarations spliced in after the tag name.
        let body = String::from_utf8(buf).map_err(|e| XmlBuilderError::Utf8(e.to_string()))?;
        let mut decls = String::new();
        let mut declared: Vec<_> = alias_map.iter().collect();
        declared.sort_by_key(|(_, alias)| alias.map(str::to_string).unwrap_or_default());
        for (ns, alias) in declared {
            match alias {
                Some(alias) => decls.push_str(&format!(" xmlns:{alias}=\"{}\"", ns.url)),
                None => decls.push_str(&format!(" xmlns=\"{}\"", ns.url)),
            }
        }

        if decls.is_empty() {
            return Ok(body);
        }

        // Splice the namespace declarations right after the opening tag name.
        let insert_at = body
            .find(|c: char| c == ' ' || c == '>' || c == '/')
            .unwrap_or(body.len());
        let mut out = String::with_capacity(body.len() + decls.len());
        out.push_str(&body[..insert_at]);
        out.push_str(&decls);
        out.push_str(&body[insert_at..]);
        Ok(out)
    }
}

pub type AliasMap<'a> = HashMap<Namespace<'a>, Option<&'a str>>;

/// Well-known short prefixes for the namespaces this protocol actually uses,
/// so the wire output reads like hand-written WSMan/PSRP XML rather than
/// auto-numbered `ns0`, `ns1`, ... for everything.
fn well_known_prefix(url: &str) -> Option<&'static str> {
    match url {
        "http://www.w3.org/2003/05/soap-envelope" => Some("s"),
        "http://schemas.xmlsoap.org/ws/2004/08/addressing" => Some("a"),
        "http://schemas.dmtf.org/wbem/wsman/1/wsman.xsd" => Some("w"),
        "http://schemas.microsoft.com/wbem/wsman/1/wsman.xsd" => Some("w"),
        "http://schemas.dmtf.org/wbem/wsman/1/wsman" => Some("w"),
        "http://schemas.microsoft.com/wbem/wsman/1/windows/shell" => Some("rsp"),
        "http://schemas.xmlsoap.org/ws/2004/09/transfer" => Some("x"),
        "http://schemas.xmlsoap.org/ws/2004/09/enumeration" => Some("n"),
        "http://schemas.dmtf.org/wbem/wsman/1/wsman/fault" => Some("f"),
        "http://schemas.microsoft.com/powershell" => Some("rsp"),
        "http://www.w3.org/2001/XMLSchema-instance" => Some("xsi"),
        "http://www.w3.org/2001/XMLSchema" => Some("xsd"),
        _ => None,
    }
}

fn build_alias_map(namespaces: HashSet<Namespace<'_>>) -> AliasMap<'_> {
    let mut map = AliasMap::new();
    let mut next_generated = 0usize;
    // deterministic iteration order keeps generated aliases stable across runs
    let mut sorted: Vec<_> = namespaces.into_iter().collect();
    sorted.sort_by(|a, b| a.url.cmp(&b.url));
    for ns in sorted {
        let alias = match well_known_prefix(&ns.url) {
            Some(p) => Some(p),
            None => {
                let generated = Box::leak(format!("ns{next_generated}").into_boxed_str());
                next_generated += 1;
                Some(&*generated)
            }
        };
        map.insert(ns, alias);
    }
    map
}

pub trait NamespaceWrite<'a> {
    fn ns_write<W: std::io::Write>(
        &self,
        w: &mut W,
        alias_map: Option<&AliasMap<'a>>,
    ) -> Result<(), XmlBuilderError>;
}

impl<'a> NamespaceWrite<'a> for Element<'a> {
    fn ns_write<W: std::io::Write>(
        &self,
        w: &mut W,
        alias_map: Option<&AliasMap<'a>>,
    ) -> Result<(), XmlBuilderError> {
        let tag = qualified_name(&self.name, self.namespace.as_ref(), alias_map)?;

        write!(w, "<{tag}")?;
        for attr in &self.attributes {
            attr.ns_write(w, alias_map)?;
        }

        match &self.content {
            Content::None => {
                write!(w, "/>")?;
            }
            Content::Text(text) => {
                write!(w, ">{}</{tag}>", escape_text(text))?;
            }
            Content::Elements(children) => {
                write!(w, ">")?;
                for child in children {
                    child.ns_write(w, alias_map)?;
                }
                write!(w, "</{tag}>")?;
            }
        }

        Ok(())
    }
}

fn qualified_name<'a>(
    name: &str,
    namespace: Option<&Namespace<'a>>,
    alias_map: Option<&AliasMap<'a>>,
) -> Result<String, XmlBuilderError> {
    let Some(ns) = namespace else {
        return Ok(name.to_string());
    };

    let Some(map) = alias_map else {
        return Err(XmlBuilderError::MissingAliasMapForAttribute {
            attr: name.to_string(),
            ns: ns.url.to_string(),
        });
    };

    match map.get(ns) {
        Some(Some(alias)) => Ok(format!("{alias}:{name}")),
        Some(None) | None => Ok(name.to_string()),
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
