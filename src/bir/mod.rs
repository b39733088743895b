//! Binding Intermediate Representation.
//!
//! The BIR is a tree of namespaces whose children form a small closed
//! family of node kinds. Nodes reference types by their canonical
//! spelling only; consumers resolve names lazily.

pub mod document;
pub mod visit;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{Location, QualifiedName};

pub use document::BirDocument;
pub use visit::{walk, Emitter};

fn is_false(value: &bool) -> bool {
    !*value
}

/// The assembled tree. Read-only once returned by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bir {
    pub root: Namespace,
}

impl Bir {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a node by qualified name.
    pub fn find(&self, name: &QualifiedName) -> Option<&Node> {
        let (first, rest) = name.segments().split_first()?;
        let mut node = self.root.child(first)?;
        for segment in rest {
            match node {
                Node::Namespace(ns) => node = ns.child(segment)?,
                _ => return None,
            }
        }
        Some(node)
    }

    /// Look up a node by its `::`-separated name.
    pub fn find_str(&self, name: &str) -> Option<&Node> {
        self.find(&QualifiedName::parse(name))
    }

    /// Total number of nodes below the root.
    pub fn node_count(&self) -> usize {
        fn count(ns: &Namespace) -> usize {
            ns.children
                .iter()
                .map(|child| match child {
                    Node::Namespace(inner) => 1 + count(inner),
                    _ => 1,
                })
                .sum()
        }
        count(&self.root)
    }
}

/// A node in the BIR tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Namespace(Namespace),
    Aggregate(Aggregate),
    Class(Class),
    OverloadSet(OverloadSet),
    Constant(Constant),
}

impl Node {
    pub fn qualified_name(&self) -> &QualifiedName {
        match self {
            Node::Namespace(n) => &n.qualified_name,
            Node::Aggregate(a) => &a.qualified_name,
            Node::Class(c) => &c.qualified_name,
            Node::OverloadSet(s) => &s.qualified_name,
            Node::Constant(k) => &k.qualified_name,
        }
    }

    pub fn simple_name(&self) -> &str {
        self.qualified_name().simple_name()
    }

    /// The `kind` tag used in the on-disk form.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Namespace(_) => NodeKind::Namespace,
            Node::Aggregate(_) => NodeKind::Aggregate,
            Node::Class(_) => NodeKind::Class,
            Node::OverloadSet(_) => NodeKind::OverloadSet,
            Node::Constant(_) => NodeKind::Constant,
        }
    }

    /// Location of the first declaration of the entity.
    pub fn location(&self) -> Option<&Location> {
        match self {
            Node::Namespace(n) => n.location.as_ref(),
            Node::Aggregate(a) => Some(&a.location),
            Node::Class(c) => Some(&c.location),
            Node::OverloadSet(s) => s.overloads.first().map(|o| &o.location),
            Node::Constant(k) => Some(&k.location),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Namespace,
    Aggregate,
    Class,
    OverloadSet,
    Constant,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Namespace => "namespace",
            NodeKind::Aggregate => "aggregate",
            NodeKind::Class => "class",
            NodeKind::OverloadSet => "overload set",
            NodeKind::Constant => "constant",
        };
        f.write_str(s)
    }
}

/// A namespace and its children in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Namespace {
    pub qualified_name: QualifiedName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub children: Vec<Node>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub banners: Vec<SectionBanner>,
}

impl Namespace {
    pub fn new(qualified_name: QualifiedName) -> Self {
        Namespace {
            qualified_name,
            ..Namespace::default()
        }
    }

    /// Direct child with the given simple name.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.simple_name() == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.iter_mut().find(|c| c.simple_name() == name)
    }
}

/// Grouping hint taken from a floating comment banner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionBanner {
    /// Text of the non-banner lines of the comment run; may be empty
    pub title: String,
    pub location: Location,
    /// Index of the first namespace child that follows the banner
    pub position: usize,
}

/// Normalized comment text bound to one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Docstring {
    pub text: String,
    pub location: Location,
}

impl Docstring {
    pub fn new(text: impl Into<String>, location: Location) -> Self {
        Docstring {
            text: text.into(),
            location,
        }
    }
}

/// All functions sharing one qualified name within a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverloadSet {
    pub name: String,
    pub qualified_name: QualifiedName,
    pub overloads: Vec<Overload>,
}

impl OverloadSet {
    pub fn new(qualified_name: QualifiedName) -> Self {
        OverloadSet {
            name: qualified_name.simple_name().to_string(),
            qualified_name,
            overloads: Vec::new(),
        }
    }
}

/// One signature of an overload set. Methods also carry `is_const`/`is_static`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overload {
    pub params: Vec<Parameter>,
    pub return_type: TypeDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<Docstring>,
    pub location: Location,
    #[serde(skip_serializing_if = "is_false")]
    pub variadic: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_const: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_static: bool,
}

impl Overload {
    /// The overload's identity: canonical parameter types plus the method's
    /// `const` qualifier.
    pub fn signature(&self) -> Signature<'_> {
        Signature {
            params: self.params.iter().map(|p| p.ty.spelling.as_str()).collect(),
            is_const: self.is_const,
        }
    }

    pub fn docstring_text(&self) -> &str {
        self.docstring.as_ref().map_or("", |d| d.text.as_str())
    }
}

/// Borrowed overload identity, rendered as `(int, int) const`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature<'a> {
    pub params: Vec<&'a str>,
    pub is_const: bool,
}

impl fmt::Display for Signature<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.params.join(", "))?;
        if self.is_const {
            f.write_str(" const")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameter {
    /// Source name, or `argN` when the declaration left it unnamed
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// The source declared no name
    #[serde(skip_serializing_if = "is_false")]
    pub unnamed: bool,
}

/// A record whose fields are all directly initializable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Aggregate {
    pub qualified_name: QualifiedName,
    pub fields: Vec<Field>,
    pub constructor: Constructor,
    /// Non-virtual member functions; aggregates may still declare them
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<OverloadSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<Docstring>,
    pub location: Location,
}

/// Named-parameter constructor synthesized for an aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constructor {
    pub params: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<Docstring>,
}

/// A record exposed through its public interface only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Class {
    pub qualified_name: QualifiedName,
    pub methods: Vec<OverloadSet>,
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<Docstring>,
    pub location: Location,
}

impl Class {
    pub fn method(&self, name: &str) -> Option<&OverloadSet> {
        self.methods.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<Docstring>,
    pub location: Location,
}

/// A namespace-scope `const`/`constexpr` variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constant {
    pub qualified_name: QualifiedName,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<Docstring>,
    pub location: Location,
}

/// A type in canonical spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeDescriptor {
    pub spelling: String,
    pub category: TypeCategory,
}

impl TypeDescriptor {
    pub fn new(spelling: impl Into<String>, category: TypeCategory) -> Self {
        TypeDescriptor {
            spelling: spelling.into(),
            category,
        }
    }

    pub fn is_void(&self) -> bool {
        self.spelling == "void"
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spelling)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeCategory {
    Primitive,
    Record,
    Pointer,
    Reference,
    SizedArray,
    TemplateInstance,
    #[default]
    Opaque,
}
