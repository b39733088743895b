//! Python type stub (`.pyi`) rendering.
//!
//! Namespaces become classes named after the namespace, overload sets
//! become `def`s (decorated with `@overload` when there is more than one),
//! aggregates get an `__init__` built from their synthesized constructor.

use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};

use crate::bir::{
    walk, Aggregate, Bir, Class, Constant, Docstring, Emitter, Field, Namespace, Overload,
    OverloadSet, Parameter, SectionBanner, TypeDescriptor,
};

const HEADER: &str = "# Generated by stubforge. Do not edit.\n\
from typing import Dict, List, Optional, overload\n";

const PY_KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

/// Stub layout options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StubOptions {
    /// Spaces per indentation level
    pub indent: usize,
    /// Emit docstrings and field comments
    pub docstrings: bool,
}

impl Default for StubOptions {
    fn default() -> Self {
        StubOptions {
            indent: 4,
            docstrings: true,
        }
    }
}

/// Render `bir` as a Python stub.
pub fn render_stub(bir: &Bir, options: &StubOptions) -> Result<String, fmt::Error> {
    let mut emitter = StubEmitter::new(options.clone());
    walk(bir, &mut emitter)?;
    Ok(emitter.finish())
}

/// Emitter producing `.pyi` text.
#[derive(Debug)]
pub struct StubEmitter {
    options: StubOptions,
    out: String,
    depth: usize,
}

impl StubEmitter {
    pub fn new(options: StubOptions) -> Self {
        StubEmitter {
            options,
            out: String::new(),
            depth: 0,
        }
    }

    /// The rendered text.
    pub fn finish(self) -> String {
        let mut out = self.out;
        while out.ends_with("\n\n") {
            out.pop();
        }
        out
    }

    fn line(&mut self, depth: usize, text: &str) -> fmt::Result {
        if text.is_empty() {
            return self.out.write_char('\n');
        }
        let pad = depth * self.options.indent;
        writeln!(self.out, "{:pad$}{}", "", text, pad = pad)
    }

    fn blank(&mut self) -> fmt::Result {
        if !self.out.ends_with("\n\n") {
            self.out.write_char('\n')?;
        }
        Ok(())
    }

    fn docstring(
        &mut self,
        depth: usize,
        docstring: Option<&Docstring>,
    ) -> Result<bool, fmt::Error> {
        let Some(doc) = docstring.filter(|d| self.options.docstrings && !d.text.is_empty()) else {
            return Ok(false);
        };
        let text = escape_docstring(&doc.text);
        let mut lines = text.lines();
        let first = lines.next().unwrap_or_default();
        let rest: Vec<&str> = lines.collect();

        if rest.is_empty() {
            self.line(depth, &format!("\"\"\"{}\"\"\"", first))?;
        } else {
            self.line(depth, &format!("\"\"\"{}", first))?;
            for line in rest {
                self.line(depth, line)?;
            }
            self.line(depth, "\"\"\"")?;
        }
        Ok(true)
    }

    fn comment(&mut self, depth: usize, docstring: Option<&Docstring>) -> fmt::Result {
        if let Some(doc) = docstring.filter(|d| self.options.docstrings && !d.text.is_empty()) {
            for line in doc.text.lines() {
                self.line(depth, format!("# {}", line).trim_end())?;
            }
        }
        Ok(())
    }

    /// `def` lines for one overload set. `owner` is the enclosing class, if any.
    fn functions(&mut self, set: &OverloadSet, owner: Option<&str>) -> fmt::Result {
        let depth = self.depth + usize::from(owner.is_some());
        let Some(name) = python_name(&set.name, owner) else {
            tracing::debug!("skipping `{}`: no Python counterpart", set.qualified_name);
            return Ok(());
        };
        let is_init = name == "__init__";

        for overload in &set.overloads {
            if set.overloads.len() > 1 {
                self.line(depth, "@overload")?;
            }
            if owner.is_some() && overload.is_static && !is_init {
                self.line(depth, "@staticmethod")?;
            }
            let has_self = owner.is_some() && (is_init || !overload.is_static);
            let returns = if is_init {
                "None".to_string()
            } else {
                python_type(&overload.return_type)
            };
            let head = format!(
                "def {}({}) -> {}:",
                name,
                parameter_list(overload, has_self),
                returns
            );
            self.body(depth, &head, overload)?;
        }
        Ok(())
    }

    fn body(&mut self, depth: usize, head: &str, overload: &Overload) -> fmt::Result {
        if self.options.docstrings && !overload.docstring_text().is_empty() {
            self.line(depth, head)?;
            self.docstring(depth + 1, overload.docstring.as_ref())?;
        } else {
            self.line(depth, &format!("{} ...", head))?;
        }
        Ok(())
    }

    fn fields(&mut self, depth: usize, fields: &[Field], with_defaults: bool) -> fmt::Result {
        for field in fields {
            self.comment(depth, field.docstring.as_ref())?;
            let mut text = format!("{}: {}", python_ident(&field.name), python_type(&field.ty));
            if with_defaults {
                if let Some(default) = &field.default {
                    write!(text, " = {}", python_value(default))?;
                }
            }
            self.line(depth, &text)?;
        }
        Ok(())
    }

    fn class_body(
        &mut self,
        name: &str,
        docstring: Option<&Docstring>,
        fields: &[Field],
        methods: &[OverloadSet],
        init: Option<&Aggregate>,
    ) -> fmt::Result {
        let depth = self.depth;
        self.line(depth, &format!("class {}:", name))?;
        let mut empty = !self.docstring(depth + 1, docstring)?;

        self.fields(depth + 1, fields, init.is_some())?;
        empty &= fields.is_empty();

        if let Some(aggregate) = init {
            let params = keyword_parameters(&aggregate.constructor.params);
            self.line(depth + 1, &format!("def __init__({}) -> None: ...", params))?;
            empty = false;
        }

        let before = self.out.len();
        for set in methods {
            self.functions(set, Some(name))?;
        }
        empty &= self.out.len() == before;

        if empty {
            self.line(depth + 1, "pass")?;
        }
        self.blank()
    }
}

impl Emitter for StubEmitter {
    type Error = fmt::Error;

    fn visit_namespace(&mut self, namespace: &Namespace) -> fmt::Result {
        if namespace.qualified_name.is_root() {
            self.out.push_str(HEADER);
            return self.blank();
        }
        self.line(
            self.depth,
            &format!("class {}:  # namespace", namespace.qualified_name.simple_name()),
        )?;
        self.depth += 1;
        if namespace.children.is_empty() {
            self.line(self.depth, "pass")?;
        }
        Ok(())
    }

    fn leave_namespace(&mut self, namespace: &Namespace) -> fmt::Result {
        if !namespace.qualified_name.is_root() {
            self.depth = self.depth.saturating_sub(1);
            self.blank()?;
        }
        Ok(())
    }

    fn visit_aggregate(&mut self, aggregate: &Aggregate) -> fmt::Result {
        self.class_body(
            aggregate.qualified_name.simple_name(),
            aggregate.docstring.as_ref(),
            &aggregate.fields,
            &aggregate.methods,
            Some(aggregate),
        )
    }

    fn visit_class(&mut self, class: &Class) -> fmt::Result {
        self.class_body(
            class.qualified_name.simple_name(),
            class.docstring.as_ref(),
            &class.fields,
            &class.methods,
            None,
        )
    }

    fn visit_overload_set(&mut self, set: &OverloadSet) -> fmt::Result {
        self.functions(set, None)?;
        self.blank()
    }

    fn visit_constant(&mut self, constant: &Constant) -> fmt::Result {
        self.comment(self.depth, constant.docstring.as_ref())?;
        let mut text = format!(
            "{}: {}",
            python_ident(constant.qualified_name.simple_name()),
            python_type(&constant.ty)
        );
        if let Some(value) = &constant.value {
            write!(text, " = {}", python_value(value))?;
        }
        self.line(self.depth, &text)?;
        self.blank()
    }

    fn visit_banner(&mut self, banner: &SectionBanner) -> fmt::Result {
        self.line(self.depth, "# ----")?;
        for line in banner.title.lines() {
            self.line(self.depth, format!("# {}", line).trim_end())?;
        }
        self.line(self.depth, "# ----")
    }
}

/// Python name for a C++ function; `None` when it has no counterpart.
fn python_name(name: &str, owner: Option<&str>) -> Option<String> {
    if owner == Some(name) {
        return Some("__init__".to_string());
    }
    if name.starts_with('~') {
        return None;
    }
    if let Some(op) = name.strip_prefix("operator") {
        let dunder = match op.trim() {
            "==" => "__eq__",
            "!=" => "__ne__",
            "<" => "__lt__",
            "<=" => "__le__",
            ">" => "__gt__",
            ">=" => "__ge__",
            "+" => "__add__",
            "-" => "__sub__",
            "*" => "__mul__",
            "/" => "__truediv__",
            "[]" => "__getitem__",
            "()" => "__call__",
            _ => return None,
        };
        return Some(dunder.to_string());
    }
    Some(python_ident(name))
}

fn python_ident(name: &str) -> String {
    if PY_KEYWORDS.contains(&name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

fn parameter(param: &Parameter) -> String {
    let mut text = format!("{}: {}", python_ident(&param.name), python_type(&param.ty));
    if let Some(default) = &param.default {
        text.push_str(" = ");
        text.push_str(&python_value(default));
    }
    text
}

fn parameter_list(overload: &Overload, has_self: bool) -> String {
    let mut parts: Vec<String> = Vec::new();
    if has_self {
        parts.push("self".to_string());
    }
    parts.extend(overload.params.iter().map(parameter));
    if overload.variadic {
        parts.push("*args".to_string());
    }
    parts.join(", ")
}

/// `__init__` parameters. Switches to keyword-only when a required field
/// follows a defaulted one, which positional parameters cannot express.
fn keyword_parameters(params: &[Parameter]) -> String {
    let mut parts = vec!["self".to_string()];
    let needs_star = params
        .iter()
        .skip_while(|p| p.default.is_none())
        .any(|p| p.default.is_none());
    if needs_star {
        parts.push("*".to_string());
    }
    parts.extend(params.iter().map(parameter));
    parts.join(", ")
}

/// Python annotation for a canonical C++ type.
pub fn python_type(ty: &TypeDescriptor) -> String {
    map_spelling(&ty.spelling)
}

fn map_spelling(spelling: &str) -> String {
    let mut s = spelling.trim();
    while let Some(rest) = s.strip_prefix("const ").or_else(|| s.strip_prefix("volatile ")) {
        s = rest.trim_start();
    }
    let s = s.strip_suffix("&&").or_else(|| s.strip_suffix('&')).unwrap_or(s).trim_end();
    let s = s.strip_suffix(" const").unwrap_or(s);

    if let Some(open) = s.rfind('[').filter(|_| s.ends_with(']')) {
        return format!("List[{}]", map_spelling(&s[..open]));
    }

    if let Some(pointee) = s.strip_suffix('*') {
        let pointee = pointee.trim_end();
        let base = pointee.strip_prefix("const ").unwrap_or(pointee);
        return match base {
            "char" | "wchar_t" => "str".to_string(),
            "void" => "object".to_string(),
            _ => map_spelling(pointee),
        };
    }

    if let (Some(open), true) = (s.find('<'), s.ends_with('>')) {
        let template = &s[..open];
        let args: Vec<String> = split_arguments(&s[open + 1..s.len() - 1])
            .into_iter()
            .map(map_spelling)
            .collect();
        let first = args.first().cloned().unwrap_or_else(|| "object".to_string());
        return match template {
            "std::vector" | "std::array" | "std::list" | "std::deque" | "std::span" => {
                format!("List[{}]", first)
            }
            "std::map" | "std::unordered_map" if args.len() >= 2 => {
                format!("Dict[{}, {}]", args[0], args[1])
            }
            "std::optional" => format!("Optional[{}]", first),
            "std::shared_ptr" | "std::unique_ptr" => first,
            _ => format!("{}[{}]", dotted(template), args.join(", ")),
        };
    }

    match s {
        "void" => "None".to_string(),
        "bool" | "_Bool" => "bool".to_string(),
        "float" | "double" | "long double" => "float".to_string(),
        "std::string" | "std::string_view" | "std::wstring" => "str".to_string(),
        _ if is_integer(s) => "int".to_string(),
        _ => dotted(s),
    }
}

fn is_integer(s: &str) -> bool {
    const WORDS: &[&str] = &["char", "short", "int", "long", "signed", "unsigned", "wchar_t"];
    let fixed = s.trim_start_matches("std::");
    if fixed.ends_with("_t")
        && (fixed.starts_with("int")
            || fixed.starts_with("uint")
            || fixed.contains("size")
            || fixed.contains("ptr"))
    {
        return true;
    }
    !s.is_empty() && s.split_whitespace().all(|w| WORDS.contains(&w))
}

fn dotted(name: &str) -> String {
    name.replace("::", ".")
}

/// Split template arguments on top-level commas.
fn split_arguments(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in args.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(args[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = args[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

/// Python spelling of a C++ default or value text; `...` when it has none.
fn python_value(text: &str) -> String {
    let text = text.trim();
    match text {
        "true" => return "True".to_string(),
        "false" => return "False".to_string(),
        "nullptr" | "NULL" => return "None".to_string(),
        _ => {}
    }
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        return text.to_string();
    }

    if is_hex(text.strip_prefix('-').unwrap_or(text)) {
        return text.to_string();
    }

    let number = text.trim_end_matches(['f', 'F', 'u', 'U', 'l', 'L']);
    let unsigned = number.strip_prefix('-').unwrap_or(number);
    if unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && unsigned.parse::<f64>().is_ok()
    {
        number.to_string()
    } else {
        "...".to_string()
    }
}

fn is_hex(s: &str) -> bool {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()))
}

fn escape_docstring(text: &str) -> String {
    text.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bir::TypeCategory;
    use crate::ops::pipeline::Pipeline;
    use crate::source::MemorySource;
    use crate::test_support::fixtures;
    use crate::util::diagnostic::Diagnostics;

    fn stub_for(id: &str, text: &str) -> String {
        let mut diags = Diagnostics::new();
        let mut source = MemorySource::new().with_header(id, text);
        let bir = Pipeline::new().run(&mut source, &mut diags).unwrap();
        render_stub(&bir, &StubOptions::default()).unwrap()
    }

    fn ty(spelling: &str) -> TypeDescriptor {
        TypeDescriptor::new(spelling, TypeCategory::Opaque)
    }

    #[test]
    fn test_example01_stub() {
        let stub = stub_for("Example01.h", fixtures::EXAMPLE01);
        let expected = r#"# Generated by stubforge. Do not edit.
from typing import Dict, List, Optional, overload

class Example01:  # namespace
    # ----
    # Basic functions bindings
    # (Note: this comment will also be published in the python stubs,
    # as a documentation for the users)
    # ----
    @overload
    def add(a: int, b: int) -> int:
        """Simple add function (this will be the docstring)"""
    @overload
    def add(a: int, b: int, c: int) -> int:
        """And this is a separate docstring, for this overload"""

    def sub(a: int, b: int) -> int:
        """This is also a docstring,
         on multiple lines
        """

    # ----
    # Classes and structs bindings
    # ----
    class Point:
        """A default constructor with named parameters will
        be automatically generated in python for structs
        """
        x: int = 0
        y: int = 0
        def __init__(self, x: int = 0, y: int = 0) -> None: ...

    class Widget:
        """A class will publish only its public methods and members"""
        def get_value(self) -> int: ...
        def set_value(self, v: int) -> None: ...
"#;
        assert_eq!(stub, expected);
    }

    #[test]
    fn test_field_docstrings_become_comments() {
        let stub = stub_for("Example02.h", fixtures::EXAMPLE02);
        assert!(stub.contains("        # The x value\n        x: int = 0\n"));
        assert!(stub.contains("        # the y value\n        y: int = 0\n"));
    }

    #[test]
    fn test_static_methods_and_constructors() {
        let stub = stub_for("g.h", fixtures::GEOMETRY);
        assert!(stub.contains(
            "        def __init__(self, length: float) -> None:\n            \"\"\"Builds a segment of the given length\"\"\"\n"
        ));
        assert!(stub.contains("@staticmethod\n        def unit() -> Segment: ..."));
        assert!(stub.contains("# Tolerance used by comparisons\n    epsilon: float = 1e-9\n"));
        assert!(stub.contains("    max_points: int = 64\n"));
        assert!(stub.contains("class detail:  # namespace\n"));
    }

    #[test]
    fn test_keyword_only_init_when_required_follows_default() {
        let stub = stub_for("k.h", "struct K { int a = 1; int b; };");
        assert!(stub.contains("def __init__(self, *, a: int = 1, b: int) -> None: ..."));
    }

    #[test]
    fn test_docstrings_can_be_disabled() {
        let mut diags = Diagnostics::new();
        let mut source = MemorySource::new().with_header("Example01.h", fixtures::EXAMPLE01);
        let bir = Pipeline::new().run(&mut source, &mut diags).unwrap();
        let options = StubOptions {
            indent: 2,
            docstrings: false,
        };
        let stub = render_stub(&bir, &options).unwrap();

        assert!(!stub.contains("\"\"\""));
        assert!(stub.contains("\n  def sub(a: int, b: int) -> int: ...\n"));
    }

    #[test]
    fn test_python_types() {
        assert_eq!(python_type(&ty("void")), "None");
        assert_eq!(python_type(&ty("unsigned long")), "int");
        assert_eq!(python_type(&ty("uint8_t")), "int");
        assert_eq!(python_type(&ty("std::size_t")), "int");
        assert_eq!(python_type(&ty("ptrdiff_t")), "int");
        assert_eq!(python_type(&ty("std::int64_t")), "int");
        assert_eq!(python_type(&ty("const char*")), "str");
        assert_eq!(python_type(&ty("const std::string&")), "str");
        assert_eq!(python_type(&ty("double[3]")), "List[float]");
        assert_eq!(python_type(&ty("std::vector<int>")), "List[int]");
        assert_eq!(python_type(&ty("std::map<std::string, geo::Point>")), "Dict[str, geo.Point]");
        assert_eq!(python_type(&ty("void*")), "object");
        assert_eq!(python_type(&ty("Widget*")), "Widget");
    }

    #[test]
    fn test_python_values() {
        assert_eq!(python_value("true"), "True");
        assert_eq!(python_value("nullptr"), "None");
        assert_eq!(python_value("1.5f"), "1.5");
        assert_eq!(python_value("-3"), "-3");
        assert_eq!(python_value("0xFF"), "0xFF");
        assert_eq!(python_value("\"name\""), "\"name\"");
        assert_eq!(python_value("Color::Red"), "...");
    }

    #[test]
    fn test_operator_names() {
        assert_eq!(python_name("operator==", Some("P")).as_deref(), Some("__eq__"));
        assert_eq!(python_name("operator<<", Some("P")), None);
        assert_eq!(python_name("~P", Some("P")), None);
        assert_eq!(python_name("P", Some("P")).as_deref(), Some("__init__"));
        assert_eq!(python_name("lambda", None).as_deref(), Some("lambda_"));
    }
}
