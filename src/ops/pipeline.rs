//! The binding pipeline.
//!
//! Runs every stage over the units of a [`DeclarationSource`] and returns
//! the assembled [`Bir`]. Per-unit stages run as each unit arrives; the
//! cancel flag is checked between units and before the whole-input stages.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::bindings::{
    assemble, attribute, drop_superseded_forward_declarations, group_overloads, normalize,
    synthesize_aggregates, AttributedUnit, VisibilityFilter,
};
use crate::bir::Bir;
use crate::source::DeclarationSource;
use crate::util::diagnostic::Diagnostics;

pub use crate::bindings::PipelineError;

/// Cooperative cancellation flag, cheap to clone and share across threads.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Configured pipeline.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    filter: VisibilityFilter,
    cancel: CancelToken,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: VisibilityFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this pipeline.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run all stages. Diagnostics are appended to `diagnostics` in the
    /// order they arise; fatal ones are pushed before the error is returned.
    pub fn run<S>(
        &self,
        source: &mut S,
        diagnostics: &mut Diagnostics,
    ) -> Result<Bir, PipelineError>
    where
        S: DeclarationSource + ?Sized,
    {
        let mut units: Vec<AttributedUnit> = Vec::new();
        let mut completed = 0usize;

        loop {
            self.check_cancelled(completed, diagnostics)?;
            let Some(unit) = source.next_unit() else {
                break;
            };
            tracing::info!("Processing {}", unit.id);

            if let Some(attributed) = attribute(unit, diagnostics) {
                units.push(self.filter.filter(attributed));
            }
            completed += 1;
        }

        drop_superseded_forward_declarations(&mut units);

        let mut items = Vec::new();
        for unit in units {
            items.extend(normalize(unit, diagnostics));
        }
        tracing::debug!("{} items from {} units", items.len(), completed);

        self.check_cancelled(completed, diagnostics)?;
        let grouped = group_overloads(items, diagnostics);
        let placed = synthesize_aggregates(grouped);

        self.check_cancelled(completed, diagnostics)?;
        assemble(placed, diagnostics)
    }

    fn check_cancelled(
        &self,
        completed: usize,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), PipelineError> {
        if !self.cancel.is_cancelled() {
            return Ok(());
        }
        tracing::debug!("cancelled after {} units", completed);
        let err = PipelineError::Cancelled { completed };
        diagnostics.push(err.to_diagnostic());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bir::{BirDocument, Node, TypeCategory};
    use crate::source::{MemorySource, TranslationUnit};
    use crate::test_support::{fixtures, StreamBuilder};
    use crate::util::diagnostic::{DiagnosticCode, Severity};

    fn run(headers: &[(&str, &str)]) -> (Result<Bir, PipelineError>, Diagnostics) {
        let mut source = headers
            .iter()
            .fold(MemorySource::new(), |s, (id, text)| s.with_header(*id, text));
        let mut diags = Diagnostics::new();
        let result = Pipeline::new().run(&mut source, &mut diags);
        (result, diags)
    }

    fn set<'a>(bir: &'a Bir, name: &str) -> &'a crate::bir::OverloadSet {
        match bir.find_str(name) {
            Some(Node::OverloadSet(s)) => s,
            other => panic!("expected overload set `{}`, got {:?}", name, other),
        }
    }

    #[test]
    fn test_free_function_with_leading_comment() {
        let (bir, diags) = run(&[("a.h", "// Simple add function\nint add(int a, int b);\n")]);
        let bir = bir.unwrap();
        let add = set(&bir, "add");

        assert_eq!(add.overloads.len(), 1);
        let overload = &add.overloads[0];
        let names: Vec<&str> = overload.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert!(overload.params.iter().all(|p| p.ty.spelling == "int"));
        assert_eq!(overload.docstring_text(), "Simple add function");
        assert!(diags.is_empty());
    }

    #[test]
    fn test_trailing_comment_documents_second_overload() {
        let src = "int add(int a, int b);\nint add(int a, int b, int c); // overload three-arg\n";
        let (bir, _) = run(&[("a.h", src)]);
        let bir = bir.unwrap();
        let add = set(&bir, "add");

        assert_eq!(add.overloads.len(), 2);
        assert_eq!(add.overloads[0].docstring_text(), "");
        assert_eq!(add.overloads[1].docstring_text(), "overload three-arg");
    }

    #[test]
    fn test_aggregate_with_field_comments() {
        let src = "struct Point {\n    int x = 0; // The x value\n    int y = 0; // the y value\n};\n";
        let (bir, _) = run(&[("p.h", src)]);
        let bir = bir.unwrap();

        let Some(Node::Aggregate(point)) = bir.find_str("Point") else {
            panic!("expected aggregate");
        };
        assert_eq!(point.fields.len(), 2);
        assert_eq!(point.fields[0].docstring.as_ref().unwrap().text, "The x value");
        assert_eq!(point.fields[1].docstring.as_ref().unwrap().text, "the y value");
        for (param, field) in point.constructor.params.iter().zip(&point.fields) {
            assert_eq!(param.name, field.name);
            assert_eq!(param.ty.spelling, "int");
            assert_eq!(param.default.as_deref(), Some("0"));
        }
    }

    #[test]
    fn test_class_hides_private_state() {
        let (bir, _) = run(&[("Example01.h", fixtures::EXAMPLE01)]);
        let bir = bir.unwrap();

        let Some(Node::Class(widget)) = bir.find_str("Example01::Widget") else {
            panic!("expected class");
        };
        let methods: Vec<&str> = widget.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, ["get_value", "set_value"]);
        assert!(widget.fields.iter().all(|f| f.name != "m_value"));
    }

    #[test]
    fn test_overload_collision_is_deterministic() {
        let src = "namespace m {\nint add(int a, int b) { return a + b; }\nint add(int x, int y) { return y + x; }\n}\n";
        let (first, diags) = run(&[("c.h", src)]);
        let (second, _) = run(&[("c.h", src)]);

        assert_eq!(diags.with_code(DiagnosticCode::DuplicateDefinition).len(), 1);
        let first = first.unwrap();
        assert_eq!(set(&first, "m::add").overloads.len(), 1);
        assert_eq!(first, second.unwrap());
    }

    #[test]
    fn test_const_overload_of_method_is_kept() {
        let src = "class V {\npublic:\n    int& at(int i) { return d; }\n    const int& at(int i) const { return d; }\nprivate:\n    int d;\n};\n";
        let (bir, diags) = run(&[("v.h", src)]);
        let bir = bir.unwrap();

        let Some(Node::Class(v)) = bir.find_str("V") else {
            panic!("expected class");
        };
        let at = v.method("at").unwrap();
        assert_eq!(at.overloads.len(), 2);
        assert_eq!(at.overloads[0].return_type.spelling, "int&");
        assert_eq!(at.overloads[1].return_type.spelling, "const int&");
        assert!(diags.with_code(DiagnosticCode::DuplicateDefinition).is_empty());
    }

    #[test]
    fn test_multi_line_leading_comment() {
        let src = "// first line\n// second line  \n// third line\nint sub(int a, int b);\n";
        let (bir, _) = run(&[("s.h", src)]);
        let bir = bir.unwrap();

        assert_eq!(
            set(&bir, "sub").overloads[0].docstring_text(),
            "first line\nsecond line\nthird line"
        );
    }

    #[test]
    fn test_reserved_namespace_is_dropped() {
        let (bir, _) = run(&[("r.h", "namespace __detail { int f(); }\nint g();\n")]);
        let bir = bir.unwrap();

        assert!(bir.find_str("__detail::f").is_none());
        assert!(bir.find_str("__detail").is_none());
        assert!(bir.find_str("g").is_some());
    }

    #[test]
    fn test_parse_error_skips_unit() {
        let broken = StreamBuilder::new("broken.h")
            .function(1, "lost")
            .error(2, "unbalanced braces")
            .unit();
        let mut source = MemorySource::new()
            .with_unit(broken)
            .with_header("ok.h", "int kept();");
        let mut diags = Diagnostics::new();
        let bir = Pipeline::new().run(&mut source, &mut diags).unwrap();

        assert!(bir.find_str("lost").is_none());
        assert!(bir.find_str("kept").is_some());
        assert_eq!(diags.with_code(DiagnosticCode::ParseError).len(), 1);
    }

    #[test]
    fn test_name_conflict_produces_no_bir() {
        let (result, diags) = run(&[("a.h", "struct Thing { int a; };"), ("b.h", "void Thing();")]);
        assert!(matches!(result, Err(PipelineError::NameConflict { .. })));
        assert!(diags.has_at_least(Severity::Fatal));
    }

    #[test]
    fn test_record_types_resolved_across_units() {
        let (bir, _) = run(&[
            ("shape.h", "namespace geo { struct Shape { double area = 0; }; }"),
            ("use.h", "namespace geo { Shape scaled(Shape s, double k); }"),
        ]);
        let bir = bir.unwrap();
        let overload = &set(&bir, "geo::scaled").overloads[0];

        assert_eq!(overload.return_type.category, TypeCategory::Record);
        assert_eq!(overload.params[0].ty.category, TypeCategory::Record);
    }

    #[test]
    fn test_bir_document_round_trip() {
        let (bir, _) = run(&[("Example02.h", fixtures::EXAMPLE02), ("g.h", fixtures::GEOMETRY)]);
        let bir = bir.unwrap();

        let json = BirDocument::to_json(&bir).unwrap();
        assert_eq!(BirDocument::from_json(&json).unwrap(), bir);
    }

    /// Cancels the pipeline once `after` units have been handed out.
    struct CancelAfter {
        inner: MemorySource,
        token: CancelToken,
        after: usize,
        yielded: usize,
    }

    impl DeclarationSource for CancelAfter {
        fn next_unit(&mut self) -> Option<TranslationUnit> {
            let unit = self.inner.next_unit()?;
            self.yielded += 1;
            if self.yielded == self.after {
                self.token.cancel();
            }
            Some(unit)
        }
    }

    #[test]
    fn test_cancellation_between_units() {
        let pipeline = Pipeline::new();
        let mut source = CancelAfter {
            inner: MemorySource::new()
                .with_header("a.h", "int a();")
                .with_header("b.h", "int b();")
                .with_header("c.h", "int c();"),
            token: pipeline.cancel_token(),
            after: 2,
            yielded: 0,
        };
        let mut diags = Diagnostics::new();

        let result = pipeline.run(&mut source, &mut diags);
        assert!(matches!(result, Err(PipelineError::Cancelled { completed: 2 })));
        let cancelled = diags.with_code(DiagnosticCode::Cancelled);
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].severity, Severity::Fatal);
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let mut source = MemorySource::new().with_header("a.h", "int a();");
        let mut diags = Diagnostics::new();

        let result = Pipeline::new().with_cancel(token).run(&mut source, &mut diags);
        assert!(matches!(result, Err(PipelineError::Cancelled { completed: 0 })));
    }

    #[test]
    fn test_exclude_patterns_from_filter() {
        let filter = VisibilityFilter::with_excludes(&["^detail::".to_string()]).unwrap();
        let mut source = MemorySource::new().with_header("d.h", "namespace detail { int hidden(); }\nint shown();");
        let mut diags = Diagnostics::new();
        let bir = Pipeline::new().with_filter(filter).run(&mut source, &mut diags).unwrap();

        assert!(bir.find_str("detail::hidden").is_none());
        assert!(bir.find_str("shown").is_some());
    }
}
