//! Visibility filter.
//!
//! Drops declarations that never reach the BIR: non-public members,
//! compiler-generated special members, anonymous records, reserved
//! `__` names, anything inside an unnamed scope, friends, and forward
//! declarations whose definition appears elsewhere. Record traits used by
//! the aggregate criteria are computed before members are pruned.

use std::collections::HashSet;

use regex::Regex;

use crate::core::QualifiedName;
use crate::source::record::{Access, FunctionBody, RawDecl, RawRecord, ScopeKind};

use super::attribute::{AttributedUnit, DocumentedDecl, Entry};

/// Facts about a record gathered from all of its members, public or not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordTraits {
    /// Any constructor declared, including `= default` and `= delete`
    pub has_user_constructor: bool,
    pub all_data_public: bool,
    pub has_bases: bool,
    pub has_virtual: bool,
}

impl RecordTraits {
    pub fn of(record: &RawRecord, members: &[Entry]) -> Self {
        let simple = QualifiedName::parse(&record.name);
        let simple = simple.simple_name();

        let mut traits = RecordTraits {
            has_user_constructor: false,
            all_data_public: true,
            has_bases: !record.bases.is_empty(),
            has_virtual: false,
        };

        for entry in members {
            let Entry::Decl(member) = entry else {
                continue;
            };
            match &member.decl {
                RawDecl::Function(f) => {
                    if f.name == simple {
                        traits.has_user_constructor = true;
                    }
                    if f.is_virtual || f.is_override || f.body == FunctionBody::PureVirtual {
                        traits.has_virtual = true;
                    }
                }
                RawDecl::Variable(v) if !v.is_static => {
                    if v.flags.access != Access::Public {
                        traits.all_data_public = false;
                    }
                }
                _ => {}
            }
        }

        traits
    }

    /// Whether the record satisfies the aggregate criteria.
    pub fn is_aggregate(&self) -> bool {
        !self.has_user_constructor && self.all_data_public && !self.has_bases && !self.has_virtual
    }
}

/// Drops declarations by the fixed visibility rules plus configured patterns.
#[derive(Debug, Clone, Default)]
pub struct VisibilityFilter {
    exclude: Vec<Regex>,
}

impl VisibilityFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also drop declarations whose qualified name matches any of `patterns`.
    pub fn with_excludes(patterns: &[String]) -> Result<Self, regex::Error> {
        let exclude = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(VisibilityFilter { exclude })
    }

    pub fn filter(&self, unit: AttributedUnit) -> AttributedUnit {
        let entries = self.filter_entries(unit.entries, &QualifiedName::root(), false);
        AttributedUnit {
            id: unit.id,
            entries,
        }
    }

    fn filter_entries(
        &self,
        entries: Vec<Entry>,
        scope: &QualifiedName,
        in_record: bool,
    ) -> Vec<Entry> {
        let mut kept = Vec::with_capacity(entries.len());

        for entry in entries {
            match entry {
                Entry::Banner(banner) => kept.push(Entry::Banner(banner)),
                Entry::Scope(mut s) => {
                    let inner = match &s.kind {
                        ScopeKind::Namespace(None) => {
                            tracing::debug!("dropping anonymous namespace at {}", s.span);
                            continue;
                        }
                        ScopeKind::Namespace(Some(name)) => scope.join(&QualifiedName::parse(name)),
                        ScopeKind::Linkage | ScopeKind::Record(_) => scope.clone(),
                    };
                    if inner.has_reserved_segment() {
                        tracing::debug!("dropping reserved namespace `{}` at {}", inner, s.span);
                        continue;
                    }
                    s.entries = self.filter_entries(s.entries, &inner, false);
                    kept.push(Entry::Scope(s));
                }
                Entry::Decl(decl) => {
                    if let Some(decl) = self.filter_decl(decl, scope, in_record) {
                        kept.push(Entry::Decl(decl));
                    }
                }
            }
        }

        kept
    }

    fn filter_decl(
        &self,
        mut decl: DocumentedDecl,
        scope: &QualifiedName,
        in_record: bool,
    ) -> Option<DocumentedDecl> {
        let name = decl.decl.name().to_string();
        let flags = decl.decl.common();

        let reason = if flags.is_friend {
            Some("friend declaration")
        } else if in_record && flags.access != Access::Public {
            Some("non-public member")
        } else if matches!(
            &decl.decl,
            RawDecl::Function(f)
                if matches!(f.body, FunctionBody::Defaulted | FunctionBody::Deleted)
        ) {
            Some("compiler-generated special member")
        } else if name.is_empty() && !matches!(decl.decl, RawDecl::Other(_)) {
            Some("anonymous entity")
        } else if QualifiedName::parse(&name).has_reserved_segment() {
            Some("reserved name")
        } else {
            None
        };

        if let Some(reason) = reason {
            tracing::trace!("dropping `{}` at {}: {}", name, decl.span, reason);
            return None;
        }

        let qualified = scope.join(&QualifiedName::parse(&name));
        if qualified.has_unnamed_scope() || qualified.has_reserved_segment() {
            tracing::trace!("dropping `{}`: unnamed or reserved scope", qualified);
            return None;
        }
        let qualified_str = qualified.to_string();
        if self.exclude.iter().any(|re| re.is_match(&qualified_str)) {
            tracing::debug!("excluded by config: {}", qualified_str);
            return None;
        }

        if let RawDecl::Record(record) = &decl.decl {
            if record.is_definition {
                decl.traits = Some(RecordTraits::of(record, &decl.members));
                let members = std::mem::take(&mut decl.members);
                decl.members = self.filter_entries(members, &qualified, true);
            }
        }

        Some(decl)
    }
}

/// Drop forward declarations of records defined anywhere in `units`, and
/// repeated forward declarations of records never defined.
pub fn drop_superseded_forward_declarations(units: &mut [AttributedUnit]) {
    let mut defined = HashSet::new();
    for unit in units.iter() {
        collect_definitions(&unit.entries, &QualifiedName::root(), &mut defined);
    }

    let mut declared = HashSet::new();
    for unit in units.iter_mut() {
        retain_forward(&mut unit.entries, &QualifiedName::root(), &defined, &mut declared);
    }
}

fn record_name(scope: &QualifiedName, record: &RawRecord) -> QualifiedName {
    scope.join(&QualifiedName::parse(&record.name))
}

fn collect_definitions(entries: &[Entry], scope: &QualifiedName, out: &mut HashSet<QualifiedName>) {
    for entry in entries {
        match entry {
            Entry::Scope(s) => {
                let inner = match &s.kind {
                    ScopeKind::Namespace(Some(name)) => scope.child(name.as_str()),
                    _ => scope.clone(),
                };
                collect_definitions(&s.entries, &inner, out);
            }
            Entry::Decl(DocumentedDecl {
                decl: RawDecl::Record(record),
                ..
            }) if record.is_definition => {
                out.insert(record_name(scope, record));
            }
            _ => {}
        }
    }
}

fn retain_forward(
    entries: &mut Vec<Entry>,
    scope: &QualifiedName,
    defined: &HashSet<QualifiedName>,
    declared: &mut HashSet<QualifiedName>,
) {
    entries.retain(|entry| match entry {
        Entry::Decl(DocumentedDecl {
            decl: RawDecl::Record(record),
            span,
            ..
        }) if !record.is_definition => {
            let name = record_name(scope, record);
            if defined.contains(&name) {
                tracing::trace!("forward declaration of `{}` at {} superseded", name, span);
                false
            } else {
                declared.insert(name)
            }
        }
        _ => true,
    });

    for entry in entries.iter_mut() {
        if let Entry::Scope(s) = entry {
            let inner = match &s.kind {
                ScopeKind::Namespace(Some(name)) => scope.child(name.as_str()),
                _ => scope.clone(),
            };
            retain_forward(&mut s.entries, &inner, defined, declared);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::attribute::attribute;
    use crate::source::{HeaderScanner, TranslationUnit};
    use crate::test_support::fixtures;
    use crate::util::diagnostic::Diagnostics;

    fn unit(id: &str, text: &str) -> AttributedUnit {
        let records = HeaderScanner::new().scan(id, text);
        attribute(TranslationUnit::new(id, records), &mut Diagnostics::new()).unwrap()
    }

    fn names(entries: &[Entry]) -> Vec<String> {
        entries
            .iter()
            .filter_map(|e| match e {
                Entry::Decl(d) => Some(d.decl.name().to_string()),
                _ => None,
            })
            .collect()
    }

    fn first_record(entries: &[Entry]) -> &DocumentedDecl {
        entries
            .iter()
            .find_map(|e| match e {
                Entry::Decl(d) if matches!(d.decl, RawDecl::Record(_)) => Some(d),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_class_keeps_public_members_only() {
        let filtered = VisibilityFilter::new().filter(unit("w.h", fixtures::WIDGET));
        let widget = first_record(&filtered.entries);

        assert_eq!(names(&widget.members), ["get_value", "set_value"]);
        let traits = widget.traits.unwrap();
        assert!(traits.has_user_constructor);
        assert!(!traits.all_data_public);
        assert!(!traits.is_aggregate());
    }

    #[test]
    fn test_point_is_aggregate() {
        let filtered = VisibilityFilter::new().filter(unit("p.h", "struct Point { int x = 0; int y = 0; };"));
        let point = first_record(&filtered.entries);
        assert!(point.traits.unwrap().is_aggregate());
        assert_eq!(names(&point.members), ["x", "y"]);
    }

    #[test]
    fn test_bases_and_virtuals_disqualify_aggregates() {
        let filtered = VisibilityFilter::new().filter(unit(
            "v.h",
            "struct D : Base { int x; };\nstruct V { virtual void f(); int y; };",
        ));
        let records: Vec<&DocumentedDecl> = filtered
            .entries
            .iter()
            .filter_map(|e| match e {
                Entry::Decl(d) => Some(d),
                _ => None,
            })
            .collect();
        assert!(records[0].traits.unwrap().has_bases);
        assert!(records[1].traits.unwrap().has_virtual);
        assert!(!records[1].traits.unwrap().is_aggregate());
    }

    #[test]
    fn test_drops_friends_reserved_and_anonymous() {
        let src = r#"
int __internal();
namespace { int hidden(); }
struct { int a; } instance;
class C { public: friend void peek(C&); void ok(); };
int visible();
"#;
        let filtered = VisibilityFilter::new().filter(unit("d.h", src));
        assert_eq!(names(&filtered.entries), ["C", "visible"]);
        assert!(!filtered.entries.iter().any(|e| matches!(e, Entry::Scope(_))));
        assert_eq!(names(&first_record(&filtered.entries).members), ["ok"]);
    }

    #[test]
    fn test_drops_reserved_namespaces() {
        let src = "namespace __detail { int f(); }\nnamespace outer::__impl { int h(); }\nnamespace outer { int __hook(); int k(); }\nint g();\n";
        let filtered = VisibilityFilter::new().filter(unit("r.h", src));

        let scopes: Vec<&[Entry]> = filtered
            .entries
            .iter()
            .filter_map(|e| match e {
                Entry::Scope(s) => Some(s.entries.as_slice()),
                _ => None,
            })
            .collect();
        // `outer::__impl` leaves an empty `outer` behind
        assert_eq!(scopes.len(), 2);
        assert!(scopes[0].is_empty());
        assert_eq!(names(scopes[1]), ["k"]);
        assert_eq!(names(&filtered.entries), ["g"]);
    }

    #[test]
    fn test_exclude_patterns_match_qualified_names() {
        let filter = VisibilityFilter::with_excludes(&["^detail::".to_string()]).unwrap();
        let filtered = filter.filter(unit("e.h", "namespace detail { int f(); }\nint g();"));
        let Entry::Scope(detail) = &filtered.entries[0] else {
            panic!("expected scope");
        };
        assert!(detail.entries.is_empty());
        assert_eq!(names(&filtered.entries), ["g"]);

        assert!(VisibilityFilter::with_excludes(&["(".to_string()]).is_err());
    }

    #[test]
    fn test_forward_declaration_superseded_across_units() {
        let mut units = vec![
            unit("a.h", "namespace n { struct Node; struct Opaque; struct Opaque; }"),
            unit("b.h", "namespace n { struct Node { Node* next; }; }"),
        ];
        drop_superseded_forward_declarations(&mut units);

        let Entry::Scope(a) = &units[0].entries[0] else {
            panic!("expected scope");
        };
        assert_eq!(names(&a.entries), ["Opaque"]);
        let Entry::Scope(b) = &units[1].entries[0] else {
            panic!("expected scope");
        };
        assert_eq!(names(&b.entries), ["Node"]);
    }
}
