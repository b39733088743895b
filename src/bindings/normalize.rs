//! Normalization.
//!
//! Flattens an attributed unit into [`Item`]s carrying fully qualified
//! names, canonical type descriptors, positional names for unnamed
//! parameters and opaque default texts. Declarations outside the
//! supported subset are dropped with an `UnsupportedConstruct` warning.

use std::fmt;

use crate::bir::{
    Constant, Docstring, Field, Overload, Parameter, SectionBanner, TypeCategory, TypeDescriptor,
};
use crate::core::{Location, QualifiedName, Span};
use crate::source::record::{
    RawDecl, RawFunction, RawParam, RawRecord, RawVariable, RecordTag, ScopeKind,
};
use crate::util::diagnostic::{suggestions, Diagnostic, DiagnosticCode, Diagnostics};

use super::attribute::{AttributedUnit, DocumentedDecl, Entry};
use super::types::{canonicalize, is_top_level_const};

/// A normalized declaration in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// A namespace was opened; carries the location of the opening.
    Namespace(NamespaceDecl),
    Banner(ScopedBanner),
    Function(FunctionDecl),
    Record(RecordDecl),
    Constant(Constant),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
    pub qualified_name: QualifiedName,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScopedBanner {
    pub scope: QualifiedName,
    pub banner: SectionBanner,
}

/// One function declaration, free or member.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub qualified_name: QualifiedName,
    pub overload: Overload,
    /// Has a body (`{ ... }` or `= default`)
    pub is_definition: bool,
}

/// A record with its public fields and member functions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDecl {
    pub qualified_name: QualifiedName,
    pub is_aggregate: bool,
    /// `false` for a record only ever forward-declared
    pub is_definition: bool,
    pub fields: Vec<Field>,
    pub methods: Vec<FunctionDecl>,
    pub docstring: Option<Docstring>,
    pub location: Location,
}

/// Normalize one unit.
pub fn normalize(unit: AttributedUnit, diagnostics: &mut Diagnostics) -> Vec<Item> {
    let mut normalizer = Normalizer {
        diagnostics,
        items: Vec::new(),
    };
    normalizer.entries(unit.entries, &QualifiedName::root());
    tracing::debug!("{}: {} normalized items", unit.id, normalizer.items.len());
    normalizer.items
}

/// Parameters with canonical types; unnamed ones become `arg1`, `arg2`, ...
pub fn normalize_params(params: &[RawParam]) -> Vec<Parameter> {
    params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let (name, unnamed) = match &p.name {
                Some(name) => (name.clone(), false),
                None => (format!("arg{}", i + 1), true),
            };
            Parameter {
                name,
                ty: canonicalize(&p.type_text),
                default: p.default.as_deref().map(str::trim).map(str::to_string),
                unnamed,
            }
        })
        .collect()
}

fn return_type(text: &str) -> TypeDescriptor {
    if text.trim().is_empty() {
        // Constructors and destructors
        TypeDescriptor::new("void", TypeCategory::Primitive)
    } else {
        canonicalize(text)
    }
}

struct Normalizer<'d> {
    diagnostics: &'d mut Diagnostics,
    items: Vec<Item>,
}

impl Normalizer<'_> {
    fn unsupported(&mut self, what: impl fmt::Display, span: &Span) {
        self.diagnostics.push(
            Diagnostic::warning(
                DiagnosticCode::UnsupportedConstruct,
                format!("{} is not supported", what),
            )
            .with_location(span.location())
            .with_suggestion(suggestions::UNSUPPORTED),
        );
    }

    fn entries(&mut self, entries: Vec<Entry>, scope: &QualifiedName) {
        for entry in entries {
            match entry {
                Entry::Banner(banner) => self.items.push(Item::Banner(ScopedBanner {
                    scope: scope.clone(),
                    banner,
                })),
                Entry::Scope(s) => match s.kind {
                    ScopeKind::Namespace(Some(name)) => {
                        let inner = scope.join(&QualifiedName::parse(&name));
                        self.items.push(Item::Namespace(NamespaceDecl {
                            qualified_name: inner.clone(),
                            location: s.span.location(),
                        }));
                        self.entries(s.entries, &inner);
                    }
                    ScopeKind::Namespace(None) => {
                        tracing::trace!("skipping anonymous namespace at {}", s.span);
                    }
                    ScopeKind::Linkage | ScopeKind::Record(_) => self.entries(s.entries, scope),
                },
                Entry::Decl(decl) => self.decl(decl, scope),
            }
        }
    }

    fn decl(&mut self, decl: DocumentedDecl, scope: &QualifiedName) {
        match &decl.decl {
            RawDecl::Function(f) => {
                if let Some(function) = self.function(f, &decl, scope) {
                    self.items.push(Item::Function(function));
                }
            }
            RawDecl::Variable(v) => self.variable(v, &decl, scope),
            RawDecl::Record(r) => {
                let record = r.clone();
                if let Some(record) = self.record(&record, decl, scope) {
                    self.items.push(Item::Record(record));
                }
            }
            RawDecl::Enum(n) | RawDecl::Alias(n) | RawDecl::Other(n) => {
                let what = named_construct(&n.construct, scope, &n.name);
                self.unsupported(what, &decl.span);
            }
        }
    }

    fn function(
        &mut self,
        f: &RawFunction,
        decl: &DocumentedDecl,
        scope: &QualifiedName,
    ) -> Option<FunctionDecl> {
        let qualified_name = scope.join(&QualifiedName::parse(&f.name));
        if f.flags.is_template {
            self.unsupported(format!("function template `{}`", qualified_name), &decl.span);
            return None;
        }

        Some(FunctionDecl {
            qualified_name,
            overload: Overload {
                params: normalize_params(&f.params),
                return_type: return_type(&f.return_type),
                docstring: decl.docstring.clone(),
                location: decl.span.location(),
                variadic: f.variadic,
                is_const: f.is_const,
                is_static: f.is_static,
            },
            is_definition: f.body.is_definition(),
        })
    }

    fn variable(&mut self, v: &RawVariable, decl: &DocumentedDecl, scope: &QualifiedName) {
        if v.flags.is_template {
            let name = scope.join(&QualifiedName::parse(decl.decl.name()));
            self.unsupported(format!("variable template `{}`", name), &decl.span);
            return;
        }

        let mut docstring = decl.docstring.clone();
        for declarator in &v.declarators {
            let qualified_name = scope.join(&QualifiedName::parse(&declarator.name));
            if declarator.unsupported {
                self.unsupported(format!("declarator of `{}`", qualified_name), &decl.span);
                continue;
            }

            let ty = canonicalize(&declarator.type_text);
            if !v.is_constexpr && !is_top_level_const(&ty) {
                self.unsupported(format!("non-const variable `{}`", qualified_name), &decl.span);
                continue;
            }

            self.items.push(Item::Constant(Constant {
                qualified_name,
                ty,
                value: declarator.initializer.clone(),
                docstring: docstring.take(),
                location: decl.span.location(),
            }));
        }
    }

    fn record(
        &mut self,
        record: &RawRecord,
        decl: DocumentedDecl,
        scope: &QualifiedName,
    ) -> Option<RecordDecl> {
        let qualified_name = scope.join(&QualifiedName::parse(&record.name));
        if record.flags.is_template {
            self.unsupported(format!("class template `{}`", qualified_name), &decl.span);
            return None;
        }
        if record.tag == RecordTag::Union {
            self.unsupported(format!("union `{}`", qualified_name), &decl.span);
            return None;
        }
        if !record.trailing_declarators.is_empty() {
            self.unsupported(
                format!(
                    "declaring variables after the body of `{}` ({})",
                    qualified_name,
                    record.trailing_declarators.join(", ")
                ),
                &decl.span,
            );
        }

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        let mut dropped_data = false;

        for entry in decl.members {
            let member = match entry {
                Entry::Decl(member) => member,
                Entry::Banner(banner) => {
                    tracing::trace!(
                        "dropping banner inside `{}` at {}",
                        qualified_name,
                        banner.location
                    );
                    continue;
                }
                Entry::Scope(_) => continue,
            };

            match &member.decl {
                RawDecl::Function(f) => {
                    if let Some(method) = self.function(f, &member, &qualified_name) {
                        methods.push(method);
                    }
                }
                RawDecl::Variable(v) if v.is_static => {
                    let name = qualified_name.join(&QualifiedName::parse(member.decl.name()));
                    self.unsupported(format!("static data member `{}`", name), &member.span);
                }
                RawDecl::Variable(v) => {
                    let mut docstring = member.docstring.clone();
                    for declarator in &v.declarators {
                        if declarator.unsupported {
                            dropped_data = true;
                            self.unsupported(
                                format!("declarator of `{}::{}`", qualified_name, declarator.name),
                                &member.span,
                            );
                            continue;
                        }
                        fields.push(Field {
                            name: declarator.name.clone(),
                            ty: canonicalize(&declarator.type_text),
                            default: declarator.initializer.clone(),
                            docstring: docstring.take(),
                            location: member.span.location(),
                        });
                    }
                }
                RawDecl::Record(nested) => {
                    let name = qualified_name.join(&QualifiedName::parse(&nested.name));
                    self.unsupported(format!("nested record `{}`", name), &member.span);
                }
                RawDecl::Enum(n) | RawDecl::Alias(n) | RawDecl::Other(n) => {
                    if n.construct == "function pointer" {
                        dropped_data = true;
                    }
                    let what = named_construct(&n.construct, &qualified_name, &n.name);
                    self.unsupported(what, &member.span);
                }
            }
        }

        let is_aggregate = decl.traits.is_some_and(|t| t.is_aggregate()) && !dropped_data;
        if dropped_data {
            tracing::debug!(
                "`{}` exposed as a class: some data members are unsupported",
                qualified_name
            );
        }

        Some(RecordDecl {
            qualified_name,
            is_aggregate,
            is_definition: record.is_definition,
            fields,
            methods,
            docstring: decl.docstring,
            location: decl.span.location(),
        })
    }
}

/// `enum `ns::Color``, or just the construct when it has no name.
fn named_construct(construct: &str, scope: &QualifiedName, name: &str) -> String {
    if name.is_empty() {
        construct.to_string()
    } else {
        format!("{} `{}`", construct, scope.join(&QualifiedName::parse(name)))
    }
}
