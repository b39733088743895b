//! Overload grouping.
//!
//! Functions sharing a fully qualified name become one [`OverloadSet`] in
//! source order, placed where the first of them appeared. Overloads are
//! identified by their canonical parameter type sequence:
//!
//! - the same declaration seen again (same location) is coalesced silently
//! - a redeclaration coalesces into the first overload, which keeps its
//!   location and picks up the first non-empty docstring
//! - a second definition is a `DuplicateDefinition`; the first one wins
//!
//! Out-of-line member definitions (`int Widget::get() const { ... }`) merge
//! into the matching method of their record.

use std::collections::{HashMap, HashSet};

use crate::bir::{Constant, Docstring, Field, Overload, OverloadSet};
use crate::core::{Location, QualifiedName};
use crate::util::diagnostic::{suggestions, Diagnostic, DiagnosticCode, Diagnostics};

use super::normalize::{FunctionDecl, Item, NamespaceDecl, RecordDecl, ScopedBanner};

/// A normalized item after grouping.
#[derive(Debug, Clone, PartialEq)]
pub enum Grouped {
    Namespace(NamespaceDecl),
    Banner(ScopedBanner),
    Functions(OverloadSet),
    Record(GroupedRecord),
    Constant(Constant),
}

/// A record whose methods are grouped per name.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRecord {
    pub qualified_name: QualifiedName,
    pub is_aggregate: bool,
    pub is_definition: bool,
    pub fields: Vec<Field>,
    pub methods: Vec<OverloadSet>,
    pub docstring: Option<Docstring>,
    pub location: Location,
}

/// An overload set under construction, remembering which overloads have bodies.
#[derive(Debug)]
struct SetBuilder {
    set: OverloadSet,
    defined: Vec<bool>,
}

impl SetBuilder {
    fn new(name: QualifiedName) -> Self {
        SetBuilder {
            set: OverloadSet::new(name),
            defined: Vec::new(),
        }
    }

    fn position(&self, overload: &Overload) -> Option<usize> {
        let signature = overload.signature();
        self.set
            .overloads
            .iter()
            .position(|o| o.signature() == signature)
    }

    fn push(&mut self, decl: FunctionDecl) {
        self.set.overloads.push(decl.overload);
        self.defined.push(decl.is_definition);
    }

    /// Add `decl`, coalescing it into an existing overload with the same signature.
    fn add(&mut self, decl: FunctionDecl, diagnostics: &mut Diagnostics) {
        match self.position(&decl.overload) {
            Some(index) => self.merge(index, decl, diagnostics),
            None => self.push(decl),
        }
    }

    fn merge(&mut self, index: usize, decl: FunctionDecl, diagnostics: &mut Diagnostics) {
        let existing = &mut self.set.overloads[index];

        if existing.location == decl.overload.location {
            tracing::trace!("`{}` at {} seen again", decl.qualified_name, existing.location);
            self.defined[index] |= decl.is_definition;
            return;
        }

        if self.defined[index] && decl.is_definition {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::DuplicateDefinition,
                    format!(
                        "`{}` is defined more than once",
                        display_signature(&decl.qualified_name, &decl.overload)
                    ),
                )
                .with_location(decl.overload.location.clone())
                .with_context(format!("first definition at {}", existing.location))
                .with_context("the first definition is kept")
                .with_suggestion(suggestions::DUPLICATE_DEFINITION),
            );
            return;
        }

        tracing::trace!(
            "redeclaration of `{}` at {} coalesced",
            decl.qualified_name,
            decl.overload.location
        );
        self.defined[index] |= decl.is_definition;
        if existing.docstring.is_none() {
            existing.docstring = decl.overload.docstring;
        }
    }
}

/// `ns::add(int, int)`
fn display_signature(name: &QualifiedName, overload: &Overload) -> String {
    format!("{}{}", name, overload.signature())
}

#[derive(Debug)]
struct RecordBuilder {
    decl: RecordDecl,
    methods: Vec<SetBuilder>,
    by_name: HashMap<String, usize>,
}

impl RecordBuilder {
    fn new(mut decl: RecordDecl, diagnostics: &mut Diagnostics) -> Self {
        let declared = std::mem::take(&mut decl.methods);
        let mut builder = RecordBuilder {
            decl,
            methods: Vec::new(),
            by_name: HashMap::new(),
        };
        for method in declared {
            builder.add(method, diagnostics);
        }
        builder
    }

    fn add(&mut self, method: FunctionDecl, diagnostics: &mut Diagnostics) {
        let name = method.qualified_name.simple_name().to_string();
        let index = match self.by_name.get(&name) {
            Some(&index) => index,
            None => {
                self.methods.push(SetBuilder::new(method.qualified_name.clone()));
                self.by_name.insert(name, self.methods.len() - 1);
                self.methods.len() - 1
            }
        };
        self.methods[index].add(method, diagnostics);
    }

    /// Attach an out-of-line definition to its declaration. Returns the
    /// definition back when no declaration matches.
    fn define(
        &mut self,
        definition: FunctionDecl,
        diagnostics: &mut Diagnostics,
    ) -> Option<FunctionDecl> {
        let Some(&index) = self.by_name.get(definition.qualified_name.simple_name()) else {
            return Some(definition);
        };
        let set = &mut self.methods[index];
        match set.position(&definition.overload) {
            Some(overload) => {
                set.merge(overload, definition, diagnostics);
                None
            }
            None => Some(definition),
        }
    }

    fn finish(self) -> GroupedRecord {
        GroupedRecord {
            qualified_name: self.decl.qualified_name,
            is_aggregate: self.decl.is_aggregate,
            is_definition: self.decl.is_definition,
            fields: self.decl.fields,
            methods: self.methods.into_iter().map(|m| m.set).collect(),
            docstring: self.decl.docstring,
            location: self.decl.location,
        }
    }
}

enum Slot {
    Ready(Grouped),
    Functions(SetBuilder),
    Record(RecordBuilder),
}

/// Group the normalized items of every unit, in unit order.
pub fn group_overloads(items: Vec<Item>, diagnostics: &mut Diagnostics) -> Vec<Grouped> {
    let record_names: HashSet<QualifiedName> = items
        .iter()
        .filter_map(|item| match item {
            Item::Record(r) => Some(r.qualified_name.clone()),
            _ => None,
        })
        .collect();

    let mut slots: Vec<Slot> = Vec::with_capacity(items.len());
    let mut functions: HashMap<QualifiedName, usize> = HashMap::new();
    let mut records: HashMap<QualifiedName, usize> = HashMap::new();
    let mut out_of_line = Vec::new();

    for item in items {
        match item {
            Item::Function(f) => {
                let is_member = f
                    .qualified_name
                    .parent()
                    .is_some_and(|parent| record_names.contains(&parent));
                if is_member {
                    out_of_line.push(f);
                    continue;
                }
                match functions.get(&f.qualified_name) {
                    Some(&index) => {
                        if let Slot::Functions(builder) = &mut slots[index] {
                            builder.add(f, diagnostics);
                        }
                    }
                    None => {
                        functions.insert(f.qualified_name.clone(), slots.len());
                        let mut builder = SetBuilder::new(f.qualified_name.clone());
                        builder.push(f);
                        slots.push(Slot::Functions(builder));
                    }
                }
            }
            Item::Record(r) => {
                records.entry(r.qualified_name.clone()).or_insert(slots.len());
                slots.push(Slot::Record(RecordBuilder::new(r, diagnostics)));
            }
            Item::Constant(k) => {
                let is_member = k
                    .qualified_name
                    .parent()
                    .is_some_and(|parent| record_names.contains(&parent));
                if is_member {
                    diagnostics.push(
                        Diagnostic::warning(
                            DiagnosticCode::UnsupportedConstruct,
                            format!("static data member `{}` is not supported", k.qualified_name),
                        )
                        .with_location(k.location.clone())
                        .with_suggestion(suggestions::UNSUPPORTED),
                    );
                    continue;
                }
                slots.push(Slot::Ready(Grouped::Constant(k)));
            }
            Item::Namespace(n) => slots.push(Slot::Ready(Grouped::Namespace(n))),
            Item::Banner(b) => slots.push(Slot::Ready(Grouped::Banner(b))),
        }
    }

    for definition in out_of_line {
        let unmatched = match definition
            .qualified_name
            .parent()
            .and_then(|parent| records.get(&parent).copied())
        {
            Some(index) => match &mut slots[index] {
                Slot::Record(builder) => builder.define(definition, diagnostics),
                _ => Some(definition),
            },
            None => Some(definition),
        };

        if let Some(definition) = unmatched {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::UnsupportedConstruct,
                    format!(
                        "out-of-line definition `{}` without a matching declaration is not supported",
                        display_signature(&definition.qualified_name, &definition.overload)
                    ),
                )
                .with_location(definition.overload.location.clone())
                .with_suggestion(suggestions::UNSUPPORTED),
            );
        }
    }

    let grouped: Vec<Grouped> = slots
        .into_iter()
        .map(|slot| match slot {
            Slot::Ready(g) => g,
            Slot::Functions(builder) => Grouped::Functions(builder.set),
            Slot::Record(builder) => Grouped::Record(builder.finish()),
        })
        .collect();
    tracing::debug!("{} items after overload grouping", grouped.len());
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::attribute::attribute;
    use crate::bindings::normalize::normalize;
    use crate::bindings::visibility::VisibilityFilter;
    use crate::source::{HeaderScanner, TranslationUnit};
    use crate::test_support::fixtures;

    fn group(headers: &[(&str, &str)]) -> (Vec<Grouped>, Diagnostics) {
        let mut diags = Diagnostics::new();
        let mut items = Vec::new();
        for (id, text) in headers {
            let records = HeaderScanner::new().scan(id, text);
            let unit = attribute(TranslationUnit::new(*id, records), &mut diags).unwrap();
            items.extend(normalize(VisibilityFilter::new().filter(unit), &mut diags));
        }
        (group_overloads(items, &mut diags), diags)
    }

    fn sets(grouped: &[Grouped]) -> Vec<&OverloadSet> {
        grouped
            .iter()
            .filter_map(|g| match g {
                Grouped::Functions(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    fn record<'a>(grouped: &'a [Grouped], name: &str) -> &'a GroupedRecord {
        grouped
            .iter()
            .find_map(|g| match g {
                Grouped::Record(r) if r.qualified_name.to_string() == name => Some(r),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_overloads_keep_source_order_and_own_docstrings() {
        let (grouped, diags) = group(&[(
            "a.h",
            "int add(int a, int b);\nint add(int a, int b, int c); // overload three-arg\n",
        )]);
        let sets = sets(&grouped);

        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].name, "add");
        assert_eq!(sets[0].overloads.len(), 2);
        assert_eq!(sets[0].overloads[0].docstring_text(), "");
        assert_eq!(sets[0].overloads[1].docstring_text(), "overload three-arg");
        assert!(diags.is_empty());
    }

    #[test]
    fn test_duplicate_definition_keeps_first() {
        let src = "int add(int a, int b) { return a + b; }\nint add(int x, int y) { return x + y; }\n";
        let (grouped, diags) = group(&[("d.h", src)]);
        let set = sets(&grouped)[0];

        assert_eq!(set.overloads.len(), 1);
        assert_eq!(set.overloads[0].params[0].name, "a");
        assert_eq!(set.overloads[0].location.line, 1);

        let warnings = diags.with_code(DiagnosticCode::DuplicateDefinition);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].message, "`add(int, int)` is defined more than once");
        assert_eq!(warnings[0].location.as_ref().unwrap().line, 2);
    }

    #[test]
    fn test_redeclaration_coalesces_and_picks_up_docstring() {
        let src = "int f(int a);\n\n// Doc from the definition\nint f(int b) { return b; }\n";
        let (grouped, diags) = group(&[("r.h", src)]);
        let set = sets(&grouped)[0];

        assert_eq!(set.overloads.len(), 1);
        assert_eq!(set.overloads[0].location.line, 1);
        assert_eq!(set.overloads[0].docstring_text(), "Doc from the definition");
        assert!(diags.is_empty());
    }

    #[test]
    fn test_qualifier_order_variants_collide() {
        let src = "void g(const int* p);\nvoid g(int const *q) {}\nvoid h(const int *p) {}\nvoid h(int const* q) {}\n";
        let (grouped, diags) = group(&[("q.h", src)]);
        let sets = sets(&grouped);

        assert_eq!(sets[0].overloads.len(), 1);
        assert_eq!(sets[1].overloads.len(), 1);
        assert_eq!(diags.with_code(DiagnosticCode::DuplicateDefinition).len(), 1);
    }

    #[test]
    fn test_const_and_non_const_methods_are_distinct() {
        let src = "class V {\npublic:\n    int& at(int i) { return d; }\n    const int& at(int i) const { return d; }\nprivate:\n    int d;\n};\n";
        let (grouped, diags) = group(&[("v.h", src)]);
        let at = &record(&grouped, "V").methods[0];

        assert_eq!(at.overloads.len(), 2);
        assert!(!at.overloads[0].is_const);
        assert!(at.overloads[1].is_const);
        assert_eq!(at.overloads[1].signature().to_string(), "(int) const");
        assert!(diags.with_code(DiagnosticCode::DuplicateDefinition).is_empty());
    }

    #[test]
    fn test_same_header_in_two_units_is_coalesced() {
        let (grouped, diags) = group(&[("Example01.h", fixtures::EXAMPLE01), ("Example01.h", fixtures::EXAMPLE01)]);
        let sets = sets(&grouped);

        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].overloads.len(), 2);
        assert_eq!(sets[1].overloads.len(), 1);
        assert!(diags.with_code(DiagnosticCode::DuplicateDefinition).is_empty());
    }

    #[test]
    fn test_methods_grouped_per_class() {
        let src = "class Canvas {\npublic:\n    void draw(int x);\n    void draw(int x, int y);\n    int size() const;\n};\n";
        let (grouped, _) = group(&[("c.h", src)]);
        let canvas = record(&grouped, "Canvas");

        assert_eq!(canvas.methods.len(), 2);
        assert_eq!(canvas.methods[0].qualified_name.to_string(), "Canvas::draw");
        assert_eq!(canvas.methods[0].overloads.len(), 2);
        assert_eq!(canvas.methods[1].name, "size");
    }

    #[test]
    fn test_out_of_line_definitions_merge_into_records() {
        let (grouped, diags) = group(&[("g.h", fixtures::GEOMETRY)]);
        let segment = record(&grouped, "geo::Segment");

        let length = segment.methods.iter().find(|m| m.name == "length").unwrap();
        assert_eq!(length.overloads.len(), 1);
        assert!(length.overloads[0].is_const);
        assert!(sets(&grouped).iter().all(|s| s.name != "length"));
        assert!(diags.with_code(DiagnosticCode::UnsupportedConstruct).len() == 1);
    }

    #[test]
    fn test_unmatched_out_of_line_definition_is_dropped() {
        let src = "struct A { void f(); };\nvoid A::g() {}\nconst int A::limit = 3;\n";
        let (grouped, diags) = group(&[("u.h", src)]);

        assert_eq!(record(&grouped, "A").methods.len(), 1);
        assert!(sets(&grouped).is_empty());
        assert!(!grouped.iter().any(|g| matches!(g, Grouped::Constant(_))));
        let warnings = diags.with_code(DiagnosticCode::UnsupportedConstruct);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].message.contains("A::limit"));
        assert!(warnings[1].message.contains("A::g()"));
    }
}
