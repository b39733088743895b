//! Comment attribution.
//!
//! Turns a unit's flat record stream into a tree of declarations and
//! scopes, binding each comment to at most one declaration:
//!
//! 1. A comment starting on the end line of the declaration right before
//!    it trails that declaration.
//! 2. A run of comments with no blank line between them, directly above a
//!    declaration, leads that declaration.
//! 3. Anything else floats. Floating runs that contain a banner line
//!    become section banners; the rest is discarded.
//!
//! A comment that trails one declaration while the next declaration starts
//! on the line the comment ends is ambiguous and attaches to neither.

use std::collections::HashMap;

use crate::bir::{Docstring, SectionBanner};
use crate::core::Span;
use crate::source::record::{RawDecl, RecordKind, ScopeKind, SourceRecord};
use crate::source::TranslationUnit;
use crate::util::diagnostic::{suggestions, Diagnostic, DiagnosticCode, Diagnostics};

use super::docstring::{banner_title, docstring_from_comments, normalize_docstring};
use super::visibility::RecordTraits;

/// A unit after comment attribution.
#[derive(Debug, Clone)]
pub struct AttributedUnit {
    pub id: String,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone)]
pub enum Entry {
    Decl(DocumentedDecl),
    Scope(ScopeEntry),
    Banner(SectionBanner),
}

/// A declaration with its docstring and, for record definitions, its members.
#[derive(Debug, Clone)]
pub struct DocumentedDecl {
    pub decl: RawDecl,
    pub span: Span,
    pub docstring: Option<Docstring>,
    pub members: Vec<Entry>,
    /// Set by the visibility filter for record definitions
    pub traits: Option<RecordTraits>,
}

/// A namespace or linkage block.
#[derive(Debug, Clone)]
pub struct ScopeEntry {
    pub kind: ScopeKind,
    pub span: Span,
    pub entries: Vec<Entry>,
}

#[derive(Debug)]
struct StructureError {
    message: String,
    span: Option<Span>,
}

impl StructureError {
    fn new(message: impl Into<String>, span: &Span) -> Self {
        StructureError {
            message: message.into(),
            span: Some(span.clone()),
        }
    }
}

/// Intermediate tree with comments still in place.
enum Raw {
    Comment(SourceRecord),
    Decl {
        decl: RawDecl,
        span: Span,
        members: Vec<Raw>,
    },
    Scope {
        kind: ScopeKind,
        span: Span,
        items: Vec<Raw>,
    },
}

impl Raw {
    fn span(&self) -> &Span {
        match self {
            Raw::Comment(r) => &r.span,
            Raw::Decl { span, .. } | Raw::Scope { span, .. } => span,
        }
    }
}

/// Attribute comments in `unit`.
///
/// Returns `None` after pushing `ParseError` diagnostics when the unit
/// carries error records or its stream is not well nested.
pub fn attribute(unit: TranslationUnit, diagnostics: &mut Diagnostics) -> Option<AttributedUnit> {
    let errors: Vec<&SourceRecord> = unit
        .records
        .iter()
        .filter(|r| matches!(r.kind, RecordKind::Error))
        .collect();
    if !errors.is_empty() {
        for record in errors {
            diagnostics.push(
                Diagnostic::error(DiagnosticCode::ParseError, record.text.clone())
                    .with_location(record.span.location())
                    .with_context(format!("translation unit `{}` is skipped", unit.id)),
            );
        }
        return None;
    }

    let id = unit.id;
    let mut records = unit.records.into_iter();
    let items = match build(&mut records, None) {
        Ok(items) => items,
        Err(err) => {
            let mut diag = Diagnostic::error(DiagnosticCode::ParseError, err.message)
                .with_context(format!("translation unit `{}` is skipped", id));
            if let Some(span) = err.span {
                diag = diag.with_location(span.location());
            }
            diagnostics.push(diag);
            return None;
        }
    };

    let entries = attribute_items(items, diagnostics);
    tracing::debug!("{}: {} top-level entries after attribution", id, entries.len());
    Some(AttributedUnit { id, entries })
}

fn build(
    records: &mut impl Iterator<Item = SourceRecord>,
    open: Option<&Span>,
) -> Result<Vec<Raw>, StructureError> {
    let mut items = Vec::new();

    while let Some(record) = records.next() {
        match record.kind {
            RecordKind::Comment => items.push(Raw::Comment(record)),
            RecordKind::DeclarationBegin(decl) => {
                let (members, end) = decl_body(records, &record.span)?;
                items.push(Raw::Decl {
                    decl,
                    span: record.span.to(&end),
                    members,
                });
            }
            RecordKind::ScopePush(ScopeKind::Record(_)) => {
                return Err(StructureError::new(
                    "record body outside a record declaration",
                    &record.span,
                ));
            }
            RecordKind::ScopePush(kind) => {
                let inner = build(records, Some(&record.span))?;
                items.push(Raw::Scope {
                    kind,
                    span: record.span,
                    items: inner,
                });
            }
            RecordKind::ScopePop => {
                if open.is_some() {
                    return Ok(items);
                }
                return Err(StructureError::new("unmatched scope close", &record.span));
            }
            RecordKind::DeclarationEnd => {
                return Err(StructureError::new(
                    "declaration end without a matching begin",
                    &record.span,
                ));
            }
            RecordKind::Error => {
                return Err(StructureError::new(record.text, &record.span));
            }
        }
    }

    match open {
        Some(span) => Err(StructureError::new("scope is never closed", span)),
        None => Ok(items),
    }
}

/// Consume a declaration up to its end record. Returns the record members
/// (empty for non-records) and the end record's span.
fn decl_body(
    records: &mut impl Iterator<Item = SourceRecord>,
    begin: &Span,
) -> Result<(Vec<Raw>, Span), StructureError> {
    let mut members = Vec::new();
    while let Some(record) = records.next() {
        match record.kind {
            // Comments inside a declaration document nothing
            RecordKind::Comment => {}
            RecordKind::ScopePush(ScopeKind::Record(_)) => {
                members = build(records, Some(&record.span))?;
            }
            RecordKind::DeclarationEnd => return Ok((members, record.span)),
            RecordKind::Error => return Err(StructureError::new(record.text, &record.span)),
            _ => {
                return Err(StructureError::new(
                    "unexpected record inside a declaration",
                    &record.span,
                ));
            }
        }
    }
    Err(StructureError::new("declaration is never closed", begin))
}

/// Which comments bind where, by item index.
#[derive(Default)]
struct Binding {
    leading: HashMap<usize, (usize, usize)>,
    trailing: HashMap<usize, usize>,
    floating: HashMap<usize, usize>,
}

fn bind(items: &[Raw], diagnostics: &mut Diagnostics) -> Binding {
    let mut binding = Binding::default();
    let mut i = 0;

    while i < items.len() {
        let Raw::Comment(comment) = &items[i] else {
            i += 1;
            continue;
        };

        // Rule 1: trailing
        if let Some(Raw::Decl { span, decl, .. }) = i.checked_sub(1).map(|p| &items[p]) {
            if comment.span.start_line() == span.end_line() {
                if let Some(Raw::Decl {
                    span: next,
                    decl: next_decl,
                    ..
                }) = items.get(i + 1)
                {
                    if next.start_line() == comment.span.end_line() {
                        diagnostics.push(
                            Diagnostic::warning(
                                DiagnosticCode::AttributionAmbiguity,
                                format!(
                                    "comment could document `{}` or `{}`; attached to neither",
                                    decl.name(),
                                    next_decl.name()
                                ),
                            )
                            .with_location(comment.span.location())
                            .with_suggestion(suggestions::AMBIGUOUS_COMMENT),
                        );
                        i += 1;
                        continue;
                    }
                }
                binding.trailing.insert(i - 1, i);
                i += 1;
                continue;
            }
        }

        // Rule 2: maximal run without blank lines, directly above a declaration
        let mut last = i;
        while let Some(Raw::Comment(next)) = items.get(last + 1) {
            if next.span.start_line() > items[last].span().end_line() + 1 {
                break;
            }
            last += 1;
        }
        let run_end_line = items[last].span().end_line();
        match items.get(last + 1) {
            Some(Raw::Decl { span, .. }) if span.start_line() <= run_end_line + 1 => {
                binding.leading.insert(last + 1, (i, last));
            }
            _ => {
                binding.floating.insert(i, last);
            }
        }
        i = last + 1;
    }

    binding
}

fn comment_text(item: &Raw) -> &str {
    match item {
        Raw::Comment(r) => r.text.as_str(),
        _ => "",
    }
}

fn attribute_items(items: Vec<Raw>, diagnostics: &mut Diagnostics) -> Vec<Entry> {
    let binding = bind(&items, diagnostics);

    // Resolve docstrings and banners while the comments are still borrowable
    let mut docs: HashMap<usize, Docstring> = HashMap::new();
    let mut banners: HashMap<usize, SectionBanner> = HashMap::new();

    for (index, item) in items.iter().enumerate() {
        if !matches!(item, Raw::Decl { .. }) {
            continue;
        }
        let leading = binding.leading.get(&index).map(|&(first, last)| {
            let text = docstring_from_comments(items[first..=last].iter().map(comment_text));
            (text, items[first].span().location())
        });
        let trailing = binding.trailing.get(&index).map(|&c| {
            let text = docstring_from_comments([comment_text(&items[c])]);
            (text, items[c].span().location())
        });

        let doc = match (leading, trailing) {
            (Some((lead, loc)), Some((trail, _))) if !lead.is_empty() && !trail.is_empty() => {
                Some(Docstring::new(normalize_docstring(&format!("{}\n{}", lead, trail)), loc))
            }
            (Some((lead, loc)), _) if !lead.is_empty() => Some(Docstring::new(lead, loc)),
            (_, Some((trail, loc))) if !trail.is_empty() => Some(Docstring::new(trail, loc)),
            _ => None,
        };
        if let Some(doc) = doc {
            docs.insert(index, doc);
        }
    }

    for (&first, &last) in &binding.floating {
        if let Some(title) = banner_title(items[first..=last].iter().map(comment_text)) {
            banners.insert(
                first,
                SectionBanner {
                    title,
                    location: items[first].span().location(),
                    position: 0,
                },
            );
        }
    }

    let mut entries = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Raw::Comment(_) => {
                if let Some(banner) = banners.remove(&index) {
                    entries.push(Entry::Banner(banner));
                }
            }
            Raw::Decl {
                decl,
                span,
                members,
            } => entries.push(Entry::Decl(DocumentedDecl {
                decl,
                span,
                docstring: docs.remove(&index),
                members: attribute_items(members, diagnostics),
                traits: None,
            })),
            Raw::Scope { kind, span, items } => entries.push(Entry::Scope(ScopeEntry {
                kind,
                span,
                entries: attribute_items(items, diagnostics),
            })),
        }
    }

    entries
}
