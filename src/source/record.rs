//! Records yielded by a declaration source.
//!
//! A translation unit is a flat, ordered stream of [`SourceRecord`]s.
//! Declarations are bracketed by `DeclarationBegin`/`DeclarationEnd`;
//! namespaces and record bodies by `ScopePush`/`ScopePop`. Comments are
//! interleaved exactly where they appear in the input.

use serde::{Deserialize, Serialize};

use crate::core::Span;

/// One element of a translation unit's token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub kind: RecordKind,
    /// Verbatim source text (the error message for `Error` records)
    pub text: String,
    pub span: Span,
}

impl SourceRecord {
    pub fn new(kind: RecordKind, text: impl Into<String>, span: Span) -> Self {
        SourceRecord {
            kind,
            text: text.into(),
            span,
        }
    }

    pub fn comment(text: impl Into<String>, span: Span) -> Self {
        SourceRecord::new(RecordKind::Comment, text, span)
    }

    pub fn begin(decl: RawDecl, text: impl Into<String>, span: Span) -> Self {
        SourceRecord::new(RecordKind::DeclarationBegin(decl), text, span)
    }

    pub fn end(span: Span) -> Self {
        SourceRecord::new(RecordKind::DeclarationEnd, "", span)
    }

    pub fn push(scope: ScopeKind, text: impl Into<String>, span: Span) -> Self {
        SourceRecord::new(RecordKind::ScopePush(scope), text, span)
    }

    pub fn pop(span: Span) -> Self {
        SourceRecord::new(RecordKind::ScopePop, "}", span)
    }

    pub fn error(message: impl Into<String>, span: Span) -> Self {
        SourceRecord::new(RecordKind::Error, message, span)
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, RecordKind::Comment)
    }
}

/// The kind of a [`SourceRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    Comment,
    DeclarationBegin(RawDecl),
    DeclarationEnd,
    ScopePush(ScopeKind),
    ScopePop,
    /// A parser error; `text` carries the message.
    Error,
}

/// What a `ScopePush` opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeKind {
    /// `namespace name {`; `None` for an anonymous namespace.
    Namespace(Option<String>),
    /// The body of the record declared by the preceding `DeclarationBegin`.
    Record(String),
    /// `extern "C" {`, transparent for naming.
    Linkage,
}

/// Member access level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
}

/// `struct`, `class` or `union`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordTag {
    Struct,
    Class,
    Union,
}

impl RecordTag {
    /// Access of members declared before any access specifier.
    pub fn default_access(&self) -> Access {
        match self {
            RecordTag::Struct | RecordTag::Union => Access::Public,
            RecordTag::Class => Access::Private,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            RecordTag::Struct => "struct",
            RecordTag::Class => "class",
            RecordTag::Union => "union",
        }
    }
}

/// A declaration as the front-end saw it. Type and value texts are raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawDecl {
    Function(RawFunction),
    Variable(RawVariable),
    Record(RawRecord),
    Enum(RawNamed),
    /// `typedef` or `using` alias
    Alias(RawNamed),
    /// Recognized but outside the supported subset (`static_assert`, ...).
    Other(RawNamed),
}

impl RawDecl {
    /// The declarator name, possibly qualified or empty.
    pub fn name(&self) -> &str {
        match self {
            RawDecl::Function(f) => &f.name,
            RawDecl::Variable(v) => v.declarators.first().map_or("", |d| d.name.as_str()),
            RawDecl::Record(r) => &r.name,
            RawDecl::Enum(n) | RawDecl::Alias(n) | RawDecl::Other(n) => &n.name,
        }
    }

    pub fn access(&self) -> Access {
        self.common().access
    }

    pub fn common(&self) -> &DeclFlags {
        match self {
            RawDecl::Function(f) => &f.flags,
            RawDecl::Variable(v) => &v.flags,
            RawDecl::Record(r) => &r.flags,
            RawDecl::Enum(n) | RawDecl::Alias(n) | RawDecl::Other(n) => &n.flags,
        }
    }

    pub fn common_mut(&mut self) -> &mut DeclFlags {
        match self {
            RawDecl::Function(f) => &mut f.flags,
            RawDecl::Variable(v) => &mut v.flags,
            RawDecl::Record(r) => &mut r.flags,
            RawDecl::Enum(n) | RawDecl::Alias(n) | RawDecl::Other(n) => &mut n.flags,
        }
    }
}

/// Flags every declaration carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclFlags {
    /// Access inside a record; `Public` at namespace scope
    pub access: Access,
    pub is_friend: bool,
    pub is_template: bool,
}

/// A function, method, constructor, destructor or operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFunction {
    /// Declarator name: `add`, `Widget::get`, `~Widget`, `operator==`
    pub name: String,
    /// Raw return type text; empty for constructors and destructors
    pub return_type: String,
    pub params: Vec<RawParam>,
    pub variadic: bool,
    pub is_inline: bool,
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_explicit: bool,
    pub is_constexpr: bool,
    /// `const` after the parameter list
    pub is_const: bool,
    pub is_noexcept: bool,
    pub is_override: bool,
    pub body: FunctionBody,
    pub flags: DeclFlags,
}

/// How a function declaration ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FunctionBody {
    /// `;`
    #[default]
    None,
    /// `{ ... }`
    Inline,
    /// `= default;`
    Defaulted,
    /// `= delete;`
    Deleted,
    /// `= 0;`
    PureVirtual,
}

impl FunctionBody {
    pub fn is_definition(&self) -> bool {
        matches!(self, FunctionBody::Inline | FunctionBody::Defaulted)
    }
}

/// A parameter with raw type and default-value texts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParam {
    pub name: Option<String>,
    pub type_text: String,
    pub default: Option<String>,
}

/// A variable or data member statement; may declare several names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawVariable {
    pub declarators: Vec<RawDeclarator>,
    pub is_static: bool,
    pub is_constexpr: bool,
    pub is_extern: bool,
    pub is_mutable: bool,
    pub flags: DeclFlags,
}

/// One declarator of a [`RawVariable`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDeclarator {
    pub name: String,
    /// Complete raw type including this declarator's `*`, `&` and `[N]`
    pub type_text: String,
    pub initializer: Option<String>,
    pub bit_width: Option<u32>,
    /// Declarator shape the front-end cannot express (function pointers)
    pub unsupported: bool,
}

/// A record head (`struct Name : Base`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub tag: RecordTag,
    /// Empty for anonymous records
    pub name: String,
    pub bases: Vec<RawBase>,
    /// `false` for forward declarations
    pub is_definition: bool,
    pub is_final: bool,
    /// Names declared after the closing brace (`} a, b;`)
    pub trailing_declarators: Vec<String>,
    pub flags: DeclFlags,
}

impl RawRecord {
    pub fn new(tag: RecordTag, name: impl Into<String>) -> Self {
        RawRecord {
            tag,
            name: name.into(),
            bases: Vec::new(),
            is_definition: false,
            is_final: false,
            trailing_declarators: Vec::new(),
            flags: DeclFlags::default(),
        }
    }
}

/// A base-class specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBase {
    pub name: String,
    pub access: Access,
    pub is_virtual: bool,
}

/// Declarations reported by name only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawNamed {
    pub name: String,
    /// Short description of the construct, e.g. `enum`, `typedef`
    pub construct: String,
    pub flags: DeclFlags,
}

impl RawNamed {
    pub fn new(construct: impl Into<String>, name: impl Into<String>) -> Self {
        RawNamed {
            name: name.into(),
            construct: construct.into(),
            flags: DeclFlags::default(),
        }
    }
}
