//! Element tree read from a BPMN document.
//!
//! The compiler works on a fully materialized, namespace-resolved tree of
//! [`Element`]s. Reading happens once, up front ([`parse_document`]); after that
//! no I/O takes place and every lookup is a plain walk over owned data.
//!
//! ## Lookup rules
//!
//! ```text
//! attribute("id")              unqualified attribute by local name
//! attribute_ns(&VENDOR, "x")   namespaced attribute, primary URI first, then alternatives
//! element("timeDate")          first child with that local name, any namespace
//! element_ns(&VENDOR, "in")    first child with that local name in the namespace
//! ```

mod error;
mod reader;

pub use error::XmlError;
pub use reader::parse_document;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::base::constants::{
    BPMN_DI_NS, BPMN20_NS, CAMUNDA_BPMN_EXTENSIONS_NS, OMG_DC_NS, OMG_DI_NS,
    OPERATON_BPMN_EXTENSIONS_NS, XSI_NS,
};

// ============================================================================
// NAMESPACES
// ============================================================================

/// A namespace with optional alternative URIs that are treated as equivalent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Namespace {
    pub uri: &'static str,
    pub alternative: Option<&'static str>,
}

impl Namespace {
    pub const fn new(uri: &'static str) -> Self {
        Self {
            uri,
            alternative: None,
        }
    }

    pub const fn with_alternative(uri: &'static str, alternative: &'static str) -> Self {
        Self {
            uri,
            alternative: Some(alternative),
        }
    }

    /// Whether `uri` is this namespace's primary or alternative URI.
    pub fn matches(&self, uri: &str) -> bool {
        self.uri == uri || self.alternative == Some(uri)
    }
}

/// Vendor extension attributes and elements.
pub const VENDOR_NS: Namespace =
    Namespace::with_alternative(OPERATON_BPMN_EXTENSIONS_NS, CAMUNDA_BPMN_EXTENSIONS_NS);
pub const BPMN_NS: Namespace = Namespace::new(BPMN20_NS);
pub const XSI: Namespace = Namespace::new(XSI_NS);
/// Diagram interchange.
pub const BPMN_DI: Namespace = Namespace::new(BPMN_DI_NS);
pub const OMG_DC: Namespace = Namespace::new(OMG_DC_NS);
pub const OMG_DI: Namespace = Namespace::new(OMG_DI_NS);

// ============================================================================
// ELEMENT TREE
// ============================================================================

/// A single attribute after namespace resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    /// Local name (`type` for `xsi:type`).
    pub name: SmolStr,
    /// Qualified name as written (`xsi:type`).
    pub qualified_name: SmolStr,
    /// Resolved namespace URI; unprefixed attributes have none.
    pub namespace: Option<SmolStr>,
    pub value: String,
}

/// An element of the document tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    pub(crate) tag: SmolStr,
    pub(crate) namespace: Option<SmolStr>,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) children: Vec<Element>,
    pub(crate) text: String,
    pub(crate) line: u32,
}

impl Element {
    /// Create a detached element, mostly useful for building trees by hand.
    pub fn new(tag: impl Into<SmolStr>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, uri: impl Into<SmolStr>) -> Self {
        self.namespace = Some(uri.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.attributes.push(Attribute {
            qualified_name: name.clone(),
            name,
            namespace: None,
            value: value.into(),
        });
        self
    }

    pub fn with_attribute_ns(
        mut self,
        namespace: &str,
        name: impl Into<SmolStr>,
        value: impl Into<String>,
    ) -> Self {
        let name = name.into();
        self.attributes.push(Attribute {
            qualified_name: name.clone(),
            name,
            namespace: Some(namespace.into()),
            value: value.into(),
        });
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    /// Local tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// 1-based line of the start tag, 0 for hand-built elements.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Trimmed character content.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Value of an unqualified attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn attribute_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.attribute(name).unwrap_or(default)
    }

    /// Value of a namespaced attribute. The primary URI wins over alternatives.
    pub fn attribute_ns(&self, namespace: &Namespace, name: &str) -> Option<&str> {
        let lookup = |uri: &str| {
            self.attributes
                .iter()
                .find(|a| a.name == name && a.namespace.as_deref() == Some(uri))
                .map(|a| a.value.as_str())
        };
        lookup(namespace.uri).or_else(|| namespace.alternative.and_then(lookup))
    }

    pub fn attribute_ns_or<'a>(
        &'a self,
        namespace: &Namespace,
        name: &str,
        default: &'a str,
    ) -> &'a str {
        self.attribute_ns(namespace, name).unwrap_or(default)
    }

    /// `xmlns:prefix` declarations made on this element, as `(prefix, uri)`.
    pub fn namespace_declarations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().filter_map(|a| {
            a.qualified_name
                .strip_prefix("xmlns:")
                .map(|prefix| (prefix, a.value.as_str()))
        })
    }

    /// First child with the given local name.
    pub fn element(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// All children with the given local name, in document order.
    pub fn elements<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    pub fn element_ns(&self, namespace: &Namespace, tag: &str) -> Option<&Element> {
        self.children
            .iter()
            .find(|c| c.tag == tag && c.namespace.as_deref().is_some_and(|uri| namespace.matches(uri)))
    }

    pub fn elements_ns<'a>(
        &'a self,
        namespace: &'a Namespace,
        tag: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| {
            c.tag == tag && c.namespace.as_deref().is_some_and(|uri| namespace.matches(uri))
        })
    }

    /// The `extensionElements` child, if any.
    pub fn extension_elements(&self) -> Option<&Element> {
        self.element("extensionElements")
    }

    /// Add the `id` of this element and of every descendant to `ids`.
    pub fn collect_ids(&self, ids: &mut FxHashSet<SmolStr>) {
        if let Some(id) = self.attribute("id") {
            ids.insert(SmolStr::new(id));
        }
        for child in &self.children {
            child.collect_ids(ids);
        }
    }
}
