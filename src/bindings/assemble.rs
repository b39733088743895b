//! BIR assembly.
//!
//! Inserts placed nodes into their namespaces in one forward pass,
//! creating namespaces on demand. A name used for entities of different
//! kinds is fatal. Identical re-encounters are coalesced; a different
//! entity under an existing name keeps the first and warns. After the pass,
//! opaque types naming a record are re-tagged and the tree is validated.

use std::collections::HashSet;

use crate::bir::{
    Bir, Namespace, Node, NodeKind, Overload, OverloadSet, TypeCategory, TypeDescriptor,
};
use crate::core::{Location, QualifiedName};
use crate::util::diagnostic::{suggestions, Diagnostic, DiagnosticCode, Diagnostics};

use super::errors::PipelineError;
use super::normalize::{NamespaceDecl, ScopedBanner};
use super::types::base_name;

/// Assembler input, in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum Placed {
    Namespace(NamespaceDecl),
    Banner(ScopedBanner),
    Node(Node),
}

/// Build the BIR. Fatal errors are pushed to `diagnostics` before returning.
pub fn assemble(items: Vec<Placed>, diagnostics: &mut Diagnostics) -> Result<Bir, PipelineError> {
    let mut bir = Bir::new();

    let result = place_all(&mut bir, items, diagnostics).and_then(|()| {
        resolve_record_types(&mut bir);
        validate(&bir)
    });

    match result {
        Ok(()) => {
            tracing::debug!("assembled BIR with {} nodes", bir.node_count());
            Ok(bir)
        }
        Err(err) => {
            diagnostics.push(err.to_diagnostic());
            Err(err)
        }
    }
}

fn place_all(
    bir: &mut Bir,
    items: Vec<Placed>,
    diagnostics: &mut Diagnostics,
) -> Result<(), PipelineError> {
    for item in items {
        match item {
            Placed::Namespace(decl) => {
                let ns = namespace_mut(&mut bir.root, &decl.qualified_name, Some(&decl.location))?;
                if ns.location.is_none() {
                    ns.location = Some(decl.location);
                }
            }
            Placed::Banner(ScopedBanner { scope, mut banner }) => {
                let ns = namespace_mut(&mut bir.root, &scope, Some(&banner.location))?;
                let seen = ns
                    .banners
                    .iter()
                    .any(|b| b.location == banner.location && b.title == banner.title);
                if !seen {
                    banner.position = ns.children.len();
                    ns.banners.push(banner);
                }
            }
            Placed::Node(node) => insert(&mut bir.root, node, diagnostics)?,
        }
    }
    Ok(())
}

/// The namespace named `name`, created along with its parents when missing.
fn namespace_mut<'a>(
    root: &'a mut Namespace,
    name: &QualifiedName,
    location: Option<&Location>,
) -> Result<&'a mut Namespace, PipelineError> {
    let mut ns = root;
    let mut path = QualifiedName::root();

    for segment in name.segments() {
        path = path.child(segment.as_str());
        let index = match ns.children.iter().position(|c| c.simple_name() == segment) {
            Some(index) => index,
            None => {
                ns.children.push(Node::Namespace(Namespace::new(path.clone())));
                ns.children.len() - 1
            }
        };
        ns = match &mut ns.children[index] {
            Node::Namespace(inner) => inner,
            other => {
                return Err(PipelineError::NameConflict {
                    name: path.to_string(),
                    existing: other.kind(),
                    found: NodeKind::Namespace,
                    first: other.location().cloned(),
                    location: location.cloned(),
                })
            }
        };
    }

    Ok(ns)
}

fn insert(
    root: &mut Namespace,
    node: Node,
    diagnostics: &mut Diagnostics,
) -> Result<(), PipelineError> {
    let parent = node.qualified_name().parent().unwrap_or_default();
    let ns = namespace_mut(root, &parent, node.location())?;

    let Some(existing) = ns.children.iter().find(|c| c.simple_name() == node.simple_name()) else {
        ns.children.push(node);
        return Ok(());
    };

    if existing.kind() != node.kind() {
        return Err(PipelineError::NameConflict {
            name: node.qualified_name().to_string(),
            existing: existing.kind(),
            found: node.kind(),
            first: existing.location().cloned(),
            location: node.location().cloned(),
        });
    }

    if *existing == node || existing.location() == node.location() {
        tracing::trace!("coalescing repeated `{}`", node.qualified_name());
        return Ok(());
    }

    let mut diag = Diagnostic::warning(
        DiagnosticCode::DuplicateDefinition,
        format!("`{}` is defined more than once", node.qualified_name()),
    )
    .with_context("the first definition is kept")
    .with_suggestion(suggestions::DUPLICATE_DEFINITION);
    if let Some(location) = node.location() {
        diag = diag.with_location(location.clone());
    }
    if let Some(first) = existing.location() {
        diag = diag.with_context(format!("first definition at {}", first));
    }
    diagnostics.push(diag);
    Ok(())
}

/// Re-tag opaque descriptors whose base name resolves to a record, looking
/// from the innermost scope outwards.
fn resolve_record_types(bir: &mut Bir) {
    let mut records = HashSet::new();
    collect_records(&bir.root, &mut records);
    if records.is_empty() {
        return;
    }
    resolve_in_namespace(&mut bir.root, &records);
}

fn collect_records(ns: &Namespace, out: &mut HashSet<QualifiedName>) {
    for child in &ns.children {
        match child {
            Node::Namespace(inner) => collect_records(inner, out),
            Node::Aggregate(a) => {
                out.insert(a.qualified_name.clone());
            }
            Node::Class(c) => {
                out.insert(c.qualified_name.clone());
            }
            Node::OverloadSet(_) | Node::Constant(_) => {}
        }
    }
}

fn resolve_in_namespace(ns: &mut Namespace, records: &HashSet<QualifiedName>) {
    let scope = ns.qualified_name.clone();
    for child in &mut ns.children {
        match child {
            Node::Namespace(inner) => resolve_in_namespace(inner, records),
            Node::OverloadSet(set) => resolve_in_set(set, &scope, records),
            Node::Constant(k) => resolve_type(&mut k.ty, &scope, records),
            Node::Aggregate(a) => {
                let inner = a.qualified_name.clone();
                for field in &mut a.fields {
                    resolve_type(&mut field.ty, &inner, records);
                }
                for param in &mut a.constructor.params {
                    resolve_type(&mut param.ty, &inner, records);
                }
                for set in &mut a.methods {
                    resolve_in_set(set, &inner, records);
                }
            }
            Node::Class(c) => {
                let inner = c.qualified_name.clone();
                for field in &mut c.fields {
                    resolve_type(&mut field.ty, &inner, records);
                }
                for set in &mut c.methods {
                    resolve_in_set(set, &inner, records);
                }
            }
        }
    }
}

fn resolve_in_set(set: &mut OverloadSet, scope: &QualifiedName, records: &HashSet<QualifiedName>) {
    for overload in &mut set.overloads {
        resolve_type(&mut overload.return_type, scope, records);
        for param in &mut overload.params {
            resolve_type(&mut param.ty, scope, records);
        }
    }
}

fn resolve_type(ty: &mut TypeDescriptor, scope: &QualifiedName, records: &HashSet<QualifiedName>) {
    if ty.category != TypeCategory::Opaque {
        return;
    }
    let Some(name) = base_name(ty).map(QualifiedName::parse) else {
        return;
    };

    let mut scope = Some(scope.clone());
    while let Some(current) = scope {
        if records.contains(&current.join(&name)) {
            ty.category = TypeCategory::Record;
            return;
        }
        scope = current.parent();
    }
}

/// Check the structural invariants of an assembled tree.
pub fn validate(bir: &Bir) -> Result<(), PipelineError> {
    let mut docstrings = HashSet::new();
    validate_namespace(&bir.root, &mut docstrings)
}

fn validate_namespace<'a>(
    ns: &'a Namespace,
    docstrings: &mut HashSet<&'a Location>,
) -> Result<(), PipelineError> {
    let mut names = HashSet::new();

    for child in &ns.children {
        let name = child.qualified_name();
        if name.parent().as_ref() != Some(&ns.qualified_name) {
            return Err(PipelineError::invariant(
                format!("`{}` is placed inside `{}`", name, ns.qualified_name),
                child.location(),
            ));
        }
        if !names.insert(child.simple_name()) {
            return Err(PipelineError::invariant(
                format!("`{}` appears more than once", name),
                child.location(),
            ));
        }

        match child {
            Node::Namespace(inner) => validate_namespace(inner, docstrings)?,
            Node::OverloadSet(set) => validate_set(set, docstrings)?,
            Node::Constant(k) => claim(docstrings, k.docstring.as_ref().map(|d| &d.location))?,
            Node::Aggregate(a) => {
                let params = &a.constructor.params;
                let matches = params.len() == a.fields.len()
                    && params
                        .iter()
                        .zip(&a.fields)
                        .all(|(p, f)| p.name == f.name && p.ty == f.ty);
                if !matches {
                    return Err(PipelineError::invariant(
                        format!("constructor of `{}` does not mirror its fields", a.qualified_name),
                        Some(&a.location),
                    ));
                }
                claim(docstrings, a.docstring.as_ref().map(|d| &d.location))?;
                for field in &a.fields {
                    claim(docstrings, field.docstring.as_ref().map(|d| &d.location))?;
                }
                for set in &a.methods {
                    validate_set(set, docstrings)?;
                }
            }
            Node::Class(c) => {
                claim(docstrings, c.docstring.as_ref().map(|d| &d.location))?;
                for field in &c.fields {
                    claim(docstrings, field.docstring.as_ref().map(|d| &d.location))?;
                }
                for set in &c.methods {
                    validate_set(set, docstrings)?;
                }
            }
        }
    }

    if let Some(banner) = ns.banners.iter().find(|b| b.position > ns.children.len()) {
        return Err(PipelineError::invariant(
            format!("banner `{}` points past the end of `{}`", banner.title, ns.qualified_name),
            Some(&banner.location),
        ));
    }

    Ok(())
}

fn validate_set<'a>(
    set: &'a OverloadSet,
    docstrings: &mut HashSet<&'a Location>,
) -> Result<(), PipelineError> {
    let Some(first) = set.overloads.first() else {
        return Err(PipelineError::invariant(
            format!("overload set `{}` is empty", set.qualified_name),
            None,
        ));
    };

    let mut signatures = HashSet::new();
    for overload in &set.overloads {
        if !signatures.insert(overload.signature()) {
            return Err(PipelineError::invariant(
                format!("`{}` has two overloads with the same signature", set.qualified_name),
                Some(&first.location),
            ));
        }
        claim(docstrings, overload_doc(overload))?;
    }
    Ok(())
}

fn overload_doc(overload: &Overload) -> Option<&Location> {
    overload.docstring.as_ref().map(|d| &d.location)
}

/// Record that the docstring starting at `location` is attached to one more entity.
fn claim<'a>(
    seen: &mut HashSet<&'a Location>,
    location: Option<&'a Location>,
) -> Result<(), PipelineError> {
    match location {
        Some(location) if !seen.insert(location) => Err(PipelineError::invariant(
            "one docstring is attached to two entities",
            Some(location),
        )),
        _ => Ok(()),
    }
}
