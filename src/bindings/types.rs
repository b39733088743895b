//! Type descriptor canonicalization.
//!
//! Every type spelling that reaches the BIR goes through [`canonicalize`],
//! so two spellings of the same type compare equal as strings:
//!
//! - whitespace is collapsed and elaborated keywords (`struct`, `enum`) dropped
//! - cv-qualifiers of the base type move to the front as `const volatile`
//! - `*`/`&` attach to the type with no space before them
//! - integer spellings are canonical (`unsigned` → `unsigned int`,
//!   `long int` → `long`, `long unsigned int` → `unsigned long`)
//! - template arguments are canonicalized recursively, joined by `, `

use crate::bir::{TypeCategory, TypeDescriptor};

const BUILTIN_WORDS: &[&str] = &[
    "void", "bool", "_Bool", "char", "wchar_t", "char8_t", "char16_t", "char32_t", "short", "int",
    "long", "signed", "unsigned", "float", "double",
];

/// Typedef names treated as primitive.
const FIXED_WIDTH: &[&str] = &[
    "int8_t", "int16_t", "int32_t", "int64_t", "uint8_t", "uint16_t", "uint32_t", "uint64_t",
    "size_t", "ssize_t", "ptrdiff_t", "intptr_t", "uintptr_t",
];

const ELABORATED: &[&str] = &["struct", "class", "union", "enum", "typename"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
    Word(String),
    Punct(String),
}

fn tokenize(text: &str) -> Vec<Tok> {
    let mut out = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_alphanumeric() || c == '_' {
            let mut end = start;
            while let Some(&(i, ch)) = chars.peek() {
                if !(ch.is_alphanumeric() || ch == '_') {
                    break;
                }
                end = i + ch.len_utf8();
                chars.next();
            }
            out.push(Tok::Word(text[start..end].to_string()));
        } else if text[start..].starts_with("::") {
            chars.next();
            chars.next();
            out.push(Tok::Punct("::".into()));
        } else if text[start..].starts_with("&&") {
            chars.next();
            chars.next();
            out.push(Tok::Punct("&&".into()));
        } else {
            chars.next();
            out.push(Tok::Punct(c.to_string()));
        }
    }
    out
}

fn is_punct(tok: &Tok, p: &str) -> bool {
    matches!(tok, Tok::Punct(s) if s == p)
}

/// Canonicalize a raw type spelling.
pub fn canonicalize(text: &str) -> TypeDescriptor {
    let tokens = tokenize(text);

    // Function types and anything else with parentheses stay opaque
    if tokens.iter().any(|t| is_punct(t, "(")) {
        return TypeDescriptor::new(collapse(text), TypeCategory::Opaque);
    }

    match parse(&tokens) {
        Some(parsed) => parsed.into_descriptor(),
        None => TypeDescriptor::new(collapse(text), TypeCategory::Opaque),
    }
}

/// Collapse runs of whitespace to one space.
fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Default)]
struct Parsed {
    is_const: bool,
    is_volatile: bool,
    base: String,
    primitive: bool,
    template: bool,
    /// Declarator operators in order, e.g. `*`, `* const`, `&`
    ops: Vec<String>,
    array: Option<String>,
}

impl Parsed {
    fn into_descriptor(self) -> TypeDescriptor {
        let mut spelling = String::new();
        if self.is_const {
            spelling.push_str("const ");
        }
        if self.is_volatile {
            spelling.push_str("volatile ");
        }
        spelling.push_str(&self.base);
        for op in &self.ops {
            spelling.push_str(op);
        }
        if let Some(array) = &self.array {
            spelling.push_str(array);
        }

        let category = if self.array.is_some() {
            TypeCategory::SizedArray
        } else if let Some(last) = self.ops.last() {
            if last.starts_with('&') {
                TypeCategory::Reference
            } else {
                TypeCategory::Pointer
            }
        } else if self.template {
            TypeCategory::TemplateInstance
        } else if self.primitive {
            TypeCategory::Primitive
        } else {
            TypeCategory::Opaque
        };

        TypeDescriptor::new(spelling, category)
    }
}

fn parse(tokens: &[Tok]) -> Option<Parsed> {
    let mut parsed = Parsed::default();
    let mut builtin: Vec<&str> = Vec::new();
    let mut name = String::new();
    let mut i = 0;

    // Base specifier: everything up to the first declarator operator
    while i < tokens.len() {
        let tok = &tokens[i];
        match tok {
            Tok::Word(w) if w == "const" => parsed.is_const = true,
            Tok::Word(w) if w == "volatile" => parsed.is_volatile = true,
            Tok::Word(w) if ELABORATED.contains(&w.as_str()) => {}
            Tok::Word(w) if BUILTIN_WORDS.contains(&w.as_str()) && name.is_empty() => {
                builtin.push(w)
            }
            Tok::Word(w) => {
                if !builtin.is_empty() || (!name.is_empty() && !name.ends_with("::")) {
                    return None;
                }
                name.push_str(w);
            }
            Tok::Punct(p) if p == "::" => {
                if !builtin.is_empty() {
                    return None;
                }
                name.push_str("::");
            }
            Tok::Punct(p) if p == "<" => {
                let close = matching_angle(tokens, i)?;
                let args = split_args(&tokens[i + 1..close]);
                let args: Vec<String> = args.into_iter().map(render_arg).collect();
                name.push('<');
                name.push_str(&args.join(", "));
                name.push('>');
                parsed.template = true;
                i = close + 1;
                continue;
            }
            Tok::Punct(_) => break,
        }
        i += 1;
    }

    if !builtin.is_empty() {
        parsed.base = canonical_builtin(&builtin)?;
        parsed.primitive = true;
    } else {
        let name = name.strip_prefix("::").unwrap_or(&name).to_string();
        if name.is_empty() || name.ends_with("::") {
            return None;
        }
        parsed.primitive = FIXED_WIDTH.contains(&name.trim_start_matches("std::"));
        parsed.base = name;
    }

    // Declarator operators, each optionally followed by cv-qualifiers
    while i < tokens.len() {
        let tok = &tokens[i];
        match tok {
            Tok::Punct(p) if p == "*" || p == "&" || p == "&&" => parsed.ops.push(p.clone()),
            Tok::Word(w) if w == "const" || w == "volatile" => {
                let last = parsed.ops.last_mut()?;
                let mut parts: Vec<String> = last.split(' ').map(str::to_string).collect();
                parts.push(w.clone());
                let op = parts.remove(0);
                parts.sort_by_key(|q| if q == "const" { 0 } else { 1 });
                parts.dedup();
                parts.insert(0, op);
                *last = parts.join(" ");
            }
            Tok::Punct(p) if p == "[" => {
                let mut array = String::new();
                while i < tokens.len() {
                    match &tokens[i] {
                        Tok::Punct(p) => array.push_str(p),
                        Tok::Word(w) => array.push_str(w),
                    }
                    i += 1;
                }
                parsed.array = Some(array);
                break;
            }
            _ => return None,
        }
        i += 1;
    }

    Some(parsed)
}

/// Canonical spelling of a builtin type made of several keywords.
fn canonical_builtin(words: &[&str]) -> Option<String> {
    let count = |w: &str| words.iter().filter(|x| **x == w).count();
    let unsigned = count("unsigned") > 0;
    let signed = count("signed") > 0;
    let longs = count("long");
    let short = count("short") > 0;

    let core: Vec<&str> = words
        .iter()
        .copied()
        .filter(|w| !matches!(*w, "unsigned" | "signed" | "long" | "short" | "int"))
        .collect();

    let base = match (core.as_slice(), short, longs) {
        ([], true, 0) => "short".to_string(),
        ([], false, 0) => "int".to_string(),
        ([], false, 1) => "long".to_string(),
        ([], false, 2) => "long long".to_string(),
        (["double"], false, 1) => return Some("long double".to_string()),
        (["char"], false, 0) => {
            return Some(match (signed, unsigned) {
                (true, _) => "signed char".to_string(),
                (_, true) => "unsigned char".to_string(),
                _ => "char".to_string(),
            })
        }
        ([single], false, 0) if !signed && !unsigned => return Some(single.to_string()),
        _ => return None,
    };

    if unsigned {
        Some(format!("unsigned {}", base))
    } else {
        Some(base)
    }
}

fn matching_angle(tokens: &[Tok], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(open) {
        if is_punct(tok, "<") {
            depth += 1;
        } else if is_punct(tok, ">") {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

fn split_args(tokens: &[Tok]) -> Vec<&[Tok]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, tok) in tokens.iter().enumerate() {
        if is_punct(tok, "<") || is_punct(tok, "(") {
            depth += 1;
        } else if is_punct(tok, ">") || is_punct(tok, ")") {
            depth = depth.saturating_sub(1);
        } else if is_punct(tok, ",") && depth == 0 {
            parts.push(&tokens[start..i]);
            start = i + 1;
        }
    }
    if start < tokens.len() || !parts.is_empty() {
        parts.push(&tokens[start..]);
    }
    parts
}

/// A template argument: a type when it parses as one, else its tokens.
fn render_arg(tokens: &[Tok]) -> String {
    if tokens.iter().all(|t| !is_punct(t, "(")) {
        if let Some(parsed) = parse(tokens) {
            return parsed.into_descriptor().spelling;
        }
    }
    let mut out = String::new();
    for tok in tokens {
        match tok {
            Tok::Word(w) => {
                if out.ends_with(|c: char| c.is_alphanumeric() || c == '_') {
                    out.push(' ');
                }
                out.push_str(w);
            }
            Tok::Punct(p) => out.push_str(p),
        }
    }
    out
}

/// The record-like name inside a descriptor, without cv, operators or array suffix.
///
/// Returns `None` for primitives and template instances.
pub fn base_name(ty: &TypeDescriptor) -> Option<&str> {
    let spelling = ty.spelling.as_str();
    let spelling = spelling.strip_prefix("const ").unwrap_or(spelling);
    let spelling = spelling.strip_prefix("volatile ").unwrap_or(spelling);
    let end = spelling
        .find(|c: char| c == '*' || c == '&' || c == '[' || c == '<' || c == ' ')
        .unwrap_or(spelling.len());
    let name = &spelling[..end];
    if name.is_empty()
        || spelling[end..].starts_with('<')
        || BUILTIN_WORDS.contains(&name)
        || FIXED_WIDTH.contains(&name.trim_start_matches("std::"))
    {
        return None;
    }
    Some(name)
}

/// Whether a descriptor is `const`-qualified at the top level (not through a pointer).
pub fn is_top_level_const(ty: &TypeDescriptor) -> bool {
    match ty.category {
        TypeCategory::Pointer => ty.spelling.ends_with("const"),
        TypeCategory::Reference => false,
        _ => ty.spelling.starts_with("const "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn spell(text: &str) -> String {
        canonicalize(text).spelling
    }

    #[test]
    fn test_const_position_collides() {
        assert_eq!(spell("const int*"), "const int*");
        assert_eq!(spell("int const *"), "const int*");
        assert_eq!(spell("int  const*"), "const int*");
        assert_eq!(canonicalize("int const *").category, TypeCategory::Pointer);
    }

    #[test]
    fn test_cv_order() {
        assert_eq!(spell("volatile const int"), "const volatile int");
        assert_eq!(spell("int volatile const"), "const volatile int");
        assert_eq!(spell("int* const"), "int* const");
        assert_eq!(spell("char * volatile const"), "char* const volatile");
    }

    #[test]
    fn test_integer_spellings() {
        assert_eq!(spell("unsigned"), "unsigned int");
        assert_eq!(spell("long int"), "long");
        assert_eq!(spell("long unsigned int"), "unsigned long");
        assert_eq!(spell("signed int"), "int");
        assert_eq!(spell("short int"), "short");
        assert_eq!(spell("unsigned long long"), "unsigned long long");
        assert_eq!(spell("signed char"), "signed char");
        assert_eq!(spell("long double"), "long double");
        assert_eq!(canonicalize("int").category, TypeCategory::Primitive);
    }

    #[test]
    fn test_references_and_records() {
        let ty = canonicalize("const std::string &");
        assert_eq!(ty.spelling, "const std::string&");
        assert_eq!(ty.category, TypeCategory::Reference);

        let ty = canonicalize("struct Point");
        assert_eq!(ty.spelling, "Point");
        assert_eq!(ty.category, TypeCategory::Opaque);

        assert_eq!(canonicalize("Point&&").category, TypeCategory::Reference);
    }

    #[test]
    fn test_templates_and_arrays() {
        let ty = canonicalize("std::vector< std::pair<int,unsigned> >");
        assert_eq!(ty.spelling, "std::vector<std::pair<int, unsigned int>>");
        assert_eq!(ty.category, TypeCategory::TemplateInstance);

        let ty = canonicalize("float [3]");
        assert_eq!(ty.spelling, "float[3]");
        assert_eq!(ty.category, TypeCategory::SizedArray);

        assert_eq!(spell("std::array<int, 4>"), "std::array<int, 4>");
    }

    #[test]
    fn test_fixed_width_and_function_types() {
        assert_eq!(canonicalize("uint32_t").category, TypeCategory::Primitive);
        assert_eq!(canonicalize("std::size_t").category, TypeCategory::Primitive);

        let ty = canonicalize("void (*)(int,  int)");
        assert_eq!(ty.category, TypeCategory::Opaque);
        assert_eq!(ty.spelling, "void (*)(int, int)");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name(&canonicalize("const Point&")), Some("Point"));
        assert_eq!(base_name(&canonicalize("geo::Point*")), Some("geo::Point"));
        assert_eq!(base_name(&canonicalize("int")), None);
        assert_eq!(base_name(&canonicalize("std::vector<int>")), None);
    }

    #[test]
    fn test_top_level_const() {
        assert!(is_top_level_const(&canonicalize("const int")));
        assert!(is_top_level_const(&canonicalize("const char* const")));
        assert!(!is_top_level_const(&canonicalize("const char*")));
    }

    proptest! {
        #[test]
        fn canonicalize_is_idempotent(
            cv in prop::sample::select(vec!["", "const ", "volatile ", "const volatile "]),
            base in prop::sample::select(vec!["int", "unsigned", "long int", "Point", "std::string", "char"]),
            ops in prop::sample::select(vec!["", "*", " *", "&", "* const", " const*"]),
        ) {
            let text = format!("{}{}{}", cv, base, ops);
            let once = canonicalize(&text);
            let twice = canonicalize(&once.spelling);
            prop_assert_eq!(once, twice);
        }
    }
}
