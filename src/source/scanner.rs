//! Header scanner for binding generation.
//!
//! Splits C/C++ header text into the record stream consumed by the
//! pipeline: comments where they appear, declarations bracketed by
//! begin/end records, and namespace and record bodies bracketed by scope
//! records. The scanner understands the declaration subset bindings care
//! about; everything else is reported as a named construct so later
//! stages can decide what to do with it.

use super::lexer::{self, Token, TokenKind};
use super::record::{
    Access, DeclFlags, FunctionBody, RawBase, RawDecl, RawDeclarator, RawFunction, RawNamed,
    RawParam, RawRecord, RawVariable, RecordKind, RecordTag, ScopeKind, SourceRecord,
};
use crate::core::{Position, Span};

/// Words that can only be part of a type, never a declarator name.
const TYPE_WORDS: &[&str] = &[
    "void", "bool", "char", "wchar_t", "char8_t", "char16_t", "char32_t", "short", "int", "long",
    "signed", "unsigned", "float", "double", "auto", "const", "volatile", "struct", "class",
    "enum", "union", "typename",
];

/// Calling-convention keywords dropped from type texts.
const CALLING_CONVENTIONS: &[&str] = &[
    "__cdecl",
    "__stdcall",
    "__fastcall",
    "__vectorcall",
    "WINAPI",
    "CALLBACK",
    "APIENTRY",
];

/// Identifiers that take a parenthesized argument and are never declarators.
const PAREN_ATTRIBUTES: &[&str] = &["__attribute__", "__declspec", "alignas", "decltype"];

/// Scanner for C/C++ headers.
#[derive(Debug, Clone, Default)]
pub struct HeaderScanner {}

impl HeaderScanner {
    /// Create a new header scanner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `source`, attributing spans to `file`.
    ///
    /// Lexical and structural problems end the stream with an `Error`
    /// record; everything scanned before the problem is kept.
    pub fn scan(&self, file: &str, source: &str) -> Vec<SourceRecord> {
        let tokens = match lexer::tokenize(source) {
            Ok(tokens) => tokens,
            Err(err) => {
                let span = Span::new(file, err.position, err.position);
                return vec![SourceRecord::error(err.message, span)];
            }
        };

        let mut state = ScanState {
            file,
            src: source,
            tokens,
            pos: 0,
            records: Vec::new(),
            frames: Vec::new(),
            pending_template: None,
        };

        if let Err(err) = state.run() {
            let span = Span::new(file, err.position, err.position);
            state.records.push(SourceRecord::error(err.message, span));
        }

        state.records
    }
}

/// Returns true for export macros such as `MYLIB_API`.
pub fn is_export_macro(word: &str) -> bool {
    let shaped = word.len() > 2
        && word.starts_with(|c: char| c.is_ascii_uppercase())
        && word
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    if !shaped {
        return false;
    }
    matches!(word, "API" | "EXPORT" | "DLLEXPORT")
        || ["_API", "_EXPORT", "_EXPORTS", "_EXTERN", "_DLL", "_PUBLIC"]
            .iter()
            .any(|suffix| word.ends_with(suffix))
}

#[derive(Debug)]
struct ScanError {
    message: String,
    position: Position,
}

impl ScanError {
    fn at(token: &Token, message: impl Into<String>) -> Self {
        ScanError {
            message: message.into(),
            position: token.start_pos,
        }
    }
}

enum Frame {
    /// Number of scope records the namespace head pushed (`a::b` pushes two)
    Namespace { pushes: usize },
    Linkage,
    Record(RecordFrame),
}

struct RecordFrame {
    access: Access,
    begin_index: usize,
    push_index: usize,
    is_typedef: bool,
}

enum Terminator {
    Semi(Token),
    Body(Token),
    RecordOpen(Token),
}

struct Statement {
    tokens: Vec<Token>,
    comments: Vec<Token>,
    terminator: Terminator,
}

#[derive(Default)]
struct Specifiers {
    is_inline: bool,
    is_static: bool,
    is_virtual: bool,
    is_explicit: bool,
    is_constexpr: bool,
    is_extern: bool,
    is_friend: bool,
    is_typedef: bool,
    is_mutable: bool,
}

struct ScanState<'a> {
    file: &'a str,
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    records: Vec<SourceRecord>,
    frames: Vec<Frame>,
    pending_template: Option<Token>,
}

impl<'a> ScanState<'a> {
    fn text(&self, token: &Token) -> &'a str {
        token.text(self.src)
    }

    fn is_punct(&self, token: &Token, punct: &str) -> bool {
        token.kind == TokenKind::Punct && self.text(token) == punct
    }

    fn is_word(&self, token: &Token, word: &str) -> bool {
        token.kind == TokenKind::Ident && self.text(token) == word
    }

    fn span(&self, first: &Token, last: &Token) -> Span {
        Span::new(self.file, first.start_pos, last.end_pos)
    }

    /// Verbatim source text covering `tokens`.
    fn slice(&self, tokens: &[Token]) -> String {
        match (tokens.first(), tokens.last()) {
            (Some(first), Some(last)) => self.src[first.start..last.end].trim().to_string(),
            _ => String::new(),
        }
    }

    /// Source text of a type, without export macros or calling conventions.
    fn type_text(&self, tokens: &[Token]) -> String {
        let mut out = String::new();
        let mut prev_end: Option<usize> = None;
        for token in tokens {
            let text = self.text(token);
            if token.kind == TokenKind::Ident
                && (is_export_macro(text) || CALLING_CONVENTIONS.contains(&text))
            {
                continue;
            }
            if let Some(end) = prev_end {
                if end < token.start && !out.is_empty() {
                    out.push(' ');
                }
            }
            out.push_str(text);
            prev_end = Some(token.end);
        }
        out
    }

    fn next_significant(&self, from: usize) -> Option<usize> {
        (from..self.tokens.len()).find(|&i| {
            let t = &self.tokens[i];
            !t.is_comment() && t.kind != TokenKind::Preprocessor
        })
    }

    fn current_access(&self) -> Access {
        match self.frames.last() {
            Some(Frame::Record(frame)) => frame.access,
            _ => Access::Public,
        }
    }

    fn run(&mut self) -> Result<(), ScanError> {
        while self.pos < self.tokens.len() {
            let tok = self.tokens[self.pos];
            match tok.kind {
                TokenKind::Preprocessor => {
                    self.pos += 1;
                    continue;
                }
                TokenKind::LineComment | TokenKind::BlockComment => {
                    let record = SourceRecord::comment(self.text(&tok), self.span(&tok, &tok));
                    self.records.push(record);
                    self.pos += 1;
                    continue;
                }
                _ => {}
            }

            if self.is_punct(&tok, "}") {
                self.pending_template = None;
                self.close_scope()?;
                continue;
            }
            if self.is_punct(&tok, ";") {
                self.pos += 1;
                continue;
            }
            if self.access_specifier() {
                continue;
            }
            if self.is_word(&tok, "template") {
                self.template_prefix()?;
                continue;
            }
            if self.is_word(&tok, "inline") {
                if let Some(next) = self.next_significant(self.pos + 1) {
                    if self.is_word(&self.tokens[next], "namespace") {
                        self.pos = next;
                        continue;
                    }
                }
            }
            if self.is_word(&tok, "namespace") && self.pending_template.is_none() {
                self.open_namespace()?;
                continue;
            }
            if self.is_word(&tok, "extern") && self.linkage_block() {
                continue;
            }

            self.statement()?;
        }

        if !self.frames.is_empty() {
            let position = self
                .tokens
                .last()
                .map_or(Position::new(1, 1), |t| t.end_pos);
            return Err(ScanError {
                message: "unexpected end of input; missing `}`".to_string(),
                position,
            });
        }

        Ok(())
    }

    fn access_specifier(&mut self) -> bool {
        let tok = self.tokens[self.pos];
        let access = match self.text(&tok) {
            "public" => Access::Public,
            "protected" => Access::Protected,
            "private" => Access::Private,
            _ => return false,
        };
        let Some(colon) = self.next_significant(self.pos + 1) else {
            return false;
        };
        if !self.is_punct(&self.tokens[colon], ":") {
            return false;
        }
        match self.frames.last_mut() {
            Some(Frame::Record(frame)) => {
                frame.access = access;
                self.pos = colon + 1;
                true
            }
            _ => false,
        }
    }

    fn template_prefix(&mut self) -> Result<(), ScanError> {
        let tok = self.tokens[self.pos];
        if self.pending_template.is_none() {
            self.pending_template = Some(tok);
        }
        self.pos += 1;

        let Some(open) = self.next_significant(self.pos) else {
            return Ok(());
        };
        if !self.is_punct(&self.tokens[open], "<") {
            return Ok(());
        }

        let mut depth = 0usize;
        for i in open..self.tokens.len() {
            let t = self.tokens[i];
            if t.kind != TokenKind::Punct {
                continue;
            }
            match self.text(&t) {
                "<" => depth += 1,
                ">" => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos = i + 1;
                        return Ok(());
                    }
                }
                _ => {}
            }
        }

        Err(ScanError::at(&tok, "unterminated template parameter list"))
    }

    fn open_namespace(&mut self) -> Result<(), ScanError> {
        let start = self.tokens[self.pos];
        self.pos += 1;

        let mut segments: Vec<String> = Vec::new();
        let mut bracket_depth = 0usize;
        loop {
            let i = self
                .next_significant(self.pos)
                .ok_or_else(|| ScanError::at(&start, "unterminated namespace declaration"))?;
            let t = self.tokens[i];
            self.pos = i + 1;
            let text = self.text(&t);

            match t.kind {
                TokenKind::Punct if text == "[" => bracket_depth += 1,
                TokenKind::Punct if text == "]" => bracket_depth = bracket_depth.saturating_sub(1),
                TokenKind::Punct if text == "{" => {
                    let header = &self.src[start.start..t.end];
                    let span = self.span(&start, &t);
                    if segments.is_empty() {
                        let record =
                            SourceRecord::push(ScopeKind::Namespace(None), header, span.clone());
                        self.records.push(record);
                    }
                    for segment in &segments {
                        let record = SourceRecord::push(
                            ScopeKind::Namespace(Some(segment.clone())),
                            header,
                            span.clone(),
                        );
                        self.records.push(record);
                    }
                    self.frames.push(Frame::Namespace {
                        pushes: segments.len().max(1),
                    });
                    return Ok(());
                }
                TokenKind::Punct if text == "=" => {
                    let end = self.skip_to_semicolon(&start)?;
                    let decl =
                        RawDecl::Alias(RawNamed::new("namespace alias", segments.join("::")));
                    self.emit_decl(decl, start, end, &[]);
                    return Ok(());
                }
                TokenKind::Ident if bracket_depth == 0 && text != "inline" => {
                    segments.push(text.to_string());
                }
                _ => {}
            }
        }
    }

    fn linkage_block(&mut self) -> bool {
        let start = self.tokens[self.pos];
        let Some(lang) = self.next_significant(self.pos + 1) else {
            return false;
        };
        if self.tokens[lang].kind != TokenKind::Str {
            return false;
        }
        let Some(open) = self.next_significant(lang + 1) else {
            return false;
        };
        let brace = self.tokens[open];
        if !self.is_punct(&brace, "{") {
            return false;
        }

        let record = SourceRecord::push(
            ScopeKind::Linkage,
            &self.src[start.start..brace.end],
            self.span(&start, &brace),
        );
        self.records.push(record);
        self.frames.push(Frame::Linkage);
        self.pos = open + 1;
        true
    }

    fn close_scope(&mut self) -> Result<(), ScanError> {
        let close = self.tokens[self.pos];
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| ScanError::at(&close, "unmatched `}`"))?;
        self.pos += 1;

        match frame {
            Frame::Namespace { pushes } => {
                for _ in 0..pushes {
                    self.records.push(SourceRecord::pop(self.span(&close, &close)));
                }
            }
            Frame::Linkage => {
                self.records.push(SourceRecord::pop(self.span(&close, &close)));
            }
            Frame::Record(frame) => {
                self.records.push(SourceRecord::pop(self.span(&close, &close)));

                // Declarators between `}` and `;`
                let mut names = Vec::new();
                let mut paren_depth = 0usize;
                let end = loop {
                    let i = self.next_significant(self.pos).ok_or_else(|| {
                        ScanError::at(&close, "expected `;` after record definition")
                    })?;
                    let t = self.tokens[i];
                    self.pos = i + 1;
                    let text = self.text(&t);
                    match t.kind {
                        TokenKind::Punct if text == "(" => paren_depth += 1,
                        TokenKind::Punct if text == ")" => {
                            paren_depth = paren_depth.saturating_sub(1)
                        }
                        TokenKind::Punct if text == ";" && paren_depth == 0 => break t,
                        TokenKind::Punct if text == "}" || text == "{" => {
                            return Err(ScanError::at(&t, "expected `;` after record definition"));
                        }
                        TokenKind::Ident
                            if paren_depth == 0
                                && !PAREN_ATTRIBUTES.contains(&text)
                                && !is_export_macro(text) =>
                        {
                            names.push(text.to_string());
                        }
                        _ => {}
                    }
                };

                self.finish_record(&frame, names, &end);
                self.records.push(SourceRecord::end(self.span(&end, &end)));
            }
        }

        Ok(())
    }

    /// Patch the record's begin and scope records once its closing `;` is known.
    fn finish_record(&mut self, frame: &RecordFrame, names: Vec<String>, end: &Token) {
        let mut renamed = None;
        if let Some(begin) = self.records.get_mut(frame.begin_index) {
            begin.span.end = end.end_pos;
            if let RecordKind::DeclarationBegin(RawDecl::Record(record)) =
                &mut begin.kind
            {
                if frame.is_typedef {
                    // Prefer typedef name over struct name
                    if let Some(first) = names.first() {
                        record.name = first.clone();
                        renamed = Some(first.clone());
                    }
                } else {
                    record.trailing_declarators = names;
                }
            }
        }
        if let Some(name) = renamed {
            if let Some(push) = self.records.get_mut(frame.push_index) {
                push.kind = RecordKind::ScopePush(ScopeKind::Record(name));
            }
        }
    }

    fn skip_to_semicolon(&mut self, from: &Token) -> Result<Token, ScanError> {
        let mut depth = 0usize;
        while self.pos < self.tokens.len() {
            let t = self.tokens[self.pos];
            self.pos += 1;
            if t.kind != TokenKind::Punct {
                continue;
            }
            match self.text(&t) {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => depth = depth.saturating_sub(1),
                ";" if depth == 0 => return Ok(t),
                _ => {}
            }
        }
        Err(ScanError::at(from, "expected `;`"))
    }

    /// Skip to the brace matching the `{` just consumed; returns the `}`.
    fn skip_braces(&mut self, open: &Token) -> Result<Token, ScanError> {
        let mut depth = 1usize;
        while self.pos < self.tokens.len() {
            let t = self.tokens[self.pos];
            self.pos += 1;
            if t.kind != TokenKind::Punct {
                continue;
            }
            match self.text(&t) {
                "{" => depth += 1,
                "}" => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(t);
                    }
                }
                _ => {}
            }
        }
        Err(ScanError::at(open, "unbalanced `{`"))
    }

    fn collect_statement(&mut self) -> Result<Statement, ScanError> {
        let mut tokens: Vec<Token> = Vec::new();
        let mut comments = Vec::new();
        let mut depth = 0usize;

        loop {
            let Some(tok) = self.tokens.get(self.pos).copied() else {
                let at = tokens.first().copied().unwrap_or(self.tokens[self.tokens.len() - 1]);
                return Err(ScanError::at(&at, "unexpected end of input in declaration"));
            };
            self.pos += 1;

            match tok.kind {
                TokenKind::Preprocessor => continue,
                TokenKind::LineComment | TokenKind::BlockComment => {
                    comments.push(tok);
                    continue;
                }
                TokenKind::Punct => {}
                _ => {
                    tokens.push(tok);
                    continue;
                }
            }

            match self.text(&tok) {
                "(" | "[" => depth += 1,
                ")" | "]" => depth = depth.saturating_sub(1),
                ";" if depth == 0 => {
                    return Ok(Statement {
                        tokens,
                        comments,
                        terminator: Terminator::Semi(tok),
                    });
                }
                "}" if depth == 0 => {
                    return Err(ScanError::at(&tok, "expected `;` before `}`"));
                }
                "{" if depth == 0 => {
                    if tokens.is_empty() {
                        let close = self.skip_braces(&tok)?;
                        return Ok(Statement {
                            tokens,
                            comments,
                            terminator: Terminator::Body(close),
                        });
                    }

                    let head = self.head_keyword(&tokens);
                    let call = self.call_paren(&tokens);
                    match (head, call) {
                        (Some("enum"), None) => {
                            self.skip_braces(&tok)?;
                            continue;
                        }
                        (Some("struct" | "class" | "union"), None) => {
                            return Ok(Statement {
                                tokens,
                                comments,
                                terminator: Terminator::RecordOpen(tok),
                            });
                        }
                        (_, Some(_)) => {
                            let prev_is_name = tokens.last().is_some_and(|t| {
                                t.kind == TokenKind::Ident || self.is_punct(t, ">")
                            });
                            if prev_is_name && self.in_initializer_list(&tokens) {
                                // Brace member initializer: `: m{v}`
                                let close = self.skip_braces(&tok)?;
                                tokens.push(tok);
                                tokens.push(close);
                                continue;
                            }
                            let close = self.skip_braces(&tok)?;
                            return Ok(Statement {
                                tokens,
                                comments,
                                terminator: Terminator::Body(close),
                            });
                        }
                        _ => {
                            // Brace initializer: `int x{0};`
                            let close = self.skip_braces(&tok)?;
                            tokens.push(tok);
                            tokens.push(close);
                            continue;
                        }
                    }
                }
                _ => {}
            }

            tokens.push(tok);
        }
    }

    fn statement(&mut self) -> Result<(), ScanError> {
        let template = self.pending_template.take();
        let access = self.current_access();
        let stmt = self.collect_statement()?;
        let Some(first) = stmt.tokens.first().copied() else {
            return Ok(());
        };
        let start = template.unwrap_or(first);

        let mut flags = DeclFlags {
            access,
            is_friend: false,
            is_template: template.is_some(),
        };

        match stmt.terminator {
            Terminator::RecordOpen(brace) => self.open_record(&stmt, start, brace, flags),
            Terminator::Body(close) => {
                let decl = self.classify(&stmt.tokens, true, &mut flags);
                self.emit_decl(decl, start, close, &stmt.comments);
                Ok(())
            }
            Terminator::Semi(semi) => {
                let decl = self.classify(&stmt.tokens, false, &mut flags);
                self.emit_decl(decl, start, semi, &stmt.comments);
                Ok(())
            }
        }
    }

    fn emit_decl(&mut self, decl: RawDecl, start: Token, end: Token, comments: &[Token]) {
        let text = &self.src[start.start..end.end];
        let begin = SourceRecord::begin(decl, text, self.span(&start, &end));
        self.records.push(begin);
        for comment in comments {
            let record = SourceRecord::comment(self.text(comment), self.span(comment, comment));
            self.records.push(record);
        }
        self.records.push(SourceRecord::end(self.span(&end, &end)));
    }

    fn open_record(
        &mut self,
        stmt: &Statement,
        start: Token,
        brace: Token,
        flags: DeclFlags,
    ) -> Result<(), ScanError> {
        let (mut record, is_typedef) = self.parse_record_head(&stmt.tokens);
        record.is_definition = true;
        record.flags = flags;

        if record.flags.is_template {
            let close = self.skip_braces(&brace)?;
            let end = self.skip_to_semicolon(&close)?;
            self.emit_decl(RawDecl::Record(record), start, end, &stmt.comments);
            return Ok(());
        }

        let name = record.name.clone();
        let tag = record.tag;
        let head = &self.src[start.start..brace.end];
        let begin = SourceRecord::begin(RawDecl::Record(record), head, self.span(&start, &brace));
        self.records.push(begin);
        let begin_index = self.records.len() - 1;

        for comment in &stmt.comments {
            let record = SourceRecord::comment(self.text(comment), self.span(comment, comment));
            self.records.push(record);
        }

        let push = SourceRecord::push(ScopeKind::Record(name), "{", self.span(&brace, &brace));
        self.records.push(push);
        let push_index = self.records.len() - 1;

        self.frames.push(Frame::Record(RecordFrame {
            access: tag.default_access(),
            begin_index,
            push_index,
            is_typedef,
        }));
        Ok(())
    }

    /// Index just past leading specifiers and attributes.
    fn specifiers(&self, tokens: &[Token]) -> (Specifiers, usize) {
        let mut spec = Specifiers::default();
        let mut i = 0;
        while i < tokens.len() {
            let t = &tokens[i];
            let text = self.text(t);
            if self.is_punct(t, "[") && tokens.get(i + 1).is_some_and(|n| self.is_punct(n, "[")) {
                i = self.skip_group(tokens, i, "[", "]");
                continue;
            }
            if t.kind != TokenKind::Ident {
                break;
            }
            match text {
                "__attribute__" | "__declspec" | "alignas" => {
                    i = self.skip_group(tokens, i + 1, "(", ")");
                    continue;
                }
                "inline" | "__inline" | "__forceinline" => spec.is_inline = true,
                "static" => spec.is_static = true,
                "virtual" => spec.is_virtual = true,
                "explicit" => {
                    spec.is_explicit = true;
                    if tokens.get(i + 1).is_some_and(|n| self.is_punct(n, "(")) {
                        i = self.skip_group(tokens, i + 1, "(", ")");
                        continue;
                    }
                }
                "constexpr" | "consteval" | "constinit" => spec.is_constexpr = true,
                "extern" => {
                    spec.is_extern = true;
                    if tokens.get(i + 1).is_some_and(|n| n.kind == TokenKind::Str) {
                        i += 1;
                    }
                }
                "friend" => spec.is_friend = true,
                "typedef" => spec.is_typedef = true,
                "mutable" => spec.is_mutable = true,
                "thread_local" | "register" => {}
                word if is_export_macro(word) => {}
                _ => break,
            }
            i += 1;
        }
        (spec, i)
    }

    /// Index just past the group opened at `open` (or `open` if it is not `open_text`).
    fn skip_group(
        &self,
        tokens: &[Token],
        open: usize,
        open_text: &str,
        close_text: &str,
    ) -> usize {
        if !tokens.get(open).is_some_and(|t| self.is_punct(t, open_text)) {
            return open;
        }
        let mut depth = 0usize;
        for (i, t) in tokens.iter().enumerate().skip(open) {
            if self.is_punct(t, open_text) {
                depth += 1;
            } else if self.is_punct(t, close_text) {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
        }
        tokens.len()
    }

    /// Index of the matching close for the group opened at `open`.
    fn matching(
        &self,
        tokens: &[Token],
        open: usize,
        open_text: &str,
        close_text: &str,
    ) -> Option<usize> {
        let end = self.skip_group(tokens, open, open_text, close_text);
        if end > open && end <= tokens.len() && self.is_punct(&tokens[end - 1], close_text) {
            Some(end - 1)
        } else {
            None
        }
    }

    /// `struct`, `class`, `union` or `enum` when it heads the declaration.
    fn head_keyword(&self, tokens: &[Token]) -> Option<&'static str> {
        let (_, mut i) = self.specifiers(tokens);
        while let Some(t) = tokens.get(i) {
            match self.text(t) {
                "const" | "volatile" => i += 1,
                "enum" => return Some("enum"),
                "struct" => return Some("struct"),
                "class" => return Some("class"),
                "union" => return Some("union"),
                _ => return None,
            }
        }
        None
    }

    /// Index of the parenthesis opening a function's parameter list, if any.
    fn call_paren(&self, tokens: &[Token]) -> Option<usize> {
        let mut angle = 0usize;
        let mut i = 0;
        while i < tokens.len() {
            let t = &tokens[i];
            let prev = if i > 0 { Some(&tokens[i - 1]) } else { None };
            let after_operator = prev.is_some_and(|p| self.is_word(p, "operator"));

            if t.kind == TokenKind::Punct && !after_operator {
                match self.text(t) {
                    "[" => {
                        i = self.skip_group(tokens, i, "[", "]");
                        continue;
                    }
                    "<" if prev.is_some_and(|p| p.kind == TokenKind::Ident) => angle += 1,
                    ">" if angle > 0 => angle -= 1,
                    "=" if angle == 0 => return None,
                    "(" if angle == 0 => {
                        let attribute = prev.is_some_and(|p| {
                            PAREN_ATTRIBUTES.contains(&self.text(p))
                                || matches!(self.text(p), "noexcept" | "throw" | "sizeof")
                        });
                        if !attribute {
                            return Some(i);
                        }
                        i = self.skip_group(tokens, i, "(", ")");
                        continue;
                    }
                    _ => {}
                }
            } else if t.kind == TokenKind::Punct && after_operator && self.text(t) == "(" {
                // `operator()`: the call list is the group after `()`
                return Some(i);
            }
            i += 1;
        }
        None
    }

    /// Whether the tokens are past a constructor's `:` initializer colon.
    fn in_initializer_list(&self, tokens: &[Token]) -> bool {
        let Some(open) = self.call_paren(tokens) else {
            return false;
        };
        let Some(close) = self.matching(tokens, open, "(", ")") else {
            return false;
        };
        tokens[close + 1..].iter().any(|t| self.is_punct(t, ":"))
    }

    /// Split at top-level `sep`, ignoring separators nested in brackets or template arguments.
    fn split_top_level<'t>(&self, tokens: &'t [Token], sep: &str) -> Vec<&'t [Token]> {
        if tokens.is_empty() {
            return Vec::new();
        }
        let mut parts = Vec::new();
        let mut depth = 0usize;
        let mut angle = 0usize;
        let mut start = 0;
        for (i, t) in tokens.iter().enumerate() {
            if t.kind != TokenKind::Punct {
                continue;
            }
            match self.text(t) {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => depth = depth.saturating_sub(1),
                "<" if i > 0 && tokens[i - 1].kind == TokenKind::Ident => angle += 1,
                ">" if angle > 0 => angle -= 1,
                text if text == sep && depth == 0 && angle == 0 => {
                    parts.push(&tokens[start..i]);
                    start = i + 1;
                }
                _ => {}
            }
        }
        parts.push(&tokens[start..]);
        parts
    }

    /// Index of the first top-level `punct` in `tokens`.
    fn find_top_level(&self, tokens: &[Token], punct: &str) -> Option<usize> {
        let mut depth = 0usize;
        let mut angle = 0usize;
        for (i, t) in tokens.iter().enumerate() {
            if t.kind != TokenKind::Punct {
                continue;
            }
            let after_operator = i > 0 && self.is_word(&tokens[i - 1], "operator");
            match self.text(t) {
                "(" | "[" | "{" if depth == 0 && self.text(t) == punct => return Some(i),
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => depth = depth.saturating_sub(1),
                "<" if i > 0 && tokens[i - 1].kind == TokenKind::Ident && !after_operator => {
                    angle += 1
                }
                ">" if angle > 0 => angle -= 1,
                text if text == punct && depth == 0 && angle == 0 && !after_operator => {
                    return Some(i)
                }
                _ => {}
            }
        }
        None
    }

    fn classify(&self, tokens: &[Token], has_body: bool, flags: &mut DeclFlags) -> RawDecl {
        let (spec, start) = self.specifiers(tokens);
        flags.is_friend = spec.is_friend;
        let rest = &tokens[start..];

        let Some(first) = rest.first() else {
            return RawDecl::Other(self.named("declaration", String::new(), flags));
        };

        match self.text(first) {
            "using" => {
                let name = rest[1..]
                    .iter()
                    .filter(|t| t.kind == TokenKind::Ident && self.text(t) != "namespace")
                    .map(|t| self.text(t).to_string())
                    .next()
                    .unwrap_or_default();
                return RawDecl::Alias(self.named("using", name, flags));
            }
            "static_assert" => {
                return RawDecl::Other(self.named("static_assert", String::new(), flags));
            }
            _ => {}
        }

        let head = self.head_keyword(rest);
        if head == Some("enum") {
            let name = rest
                .iter()
                .skip_while(|t| self.text(t) != "enum")
                .skip(1)
                .find(|t| {
                    t.kind == TokenKind::Ident && !matches!(self.text(t), "class" | "struct")
                })
                .map(|t| self.text(t).to_string())
                .unwrap_or_default();
            return RawDecl::Enum(self.named("enum", name, flags));
        }

        if spec.is_typedef {
            let name = self.alias_name(rest);
            return RawDecl::Alias(self.named("typedef", name, flags));
        }

        if let Some(tag) = head {
            if self.call_paren(rest).is_none() {
                if let Some(record) = self.forward_declaration(rest, tag, flags) {
                    return RawDecl::Record(record);
                }
            }
        }

        match self.call_paren(rest) {
            Some(open) => self.parse_function(rest, open, &spec, has_body, flags),
            None => self.parse_variable(rest, &spec, flags),
        }
    }

    fn named(&self, construct: &str, name: String, flags: &DeclFlags) -> RawNamed {
        RawNamed {
            name,
            construct: construct.to_string(),
            flags: flags.clone(),
        }
    }

    /// Name introduced by a typedef, including function-pointer typedefs.
    fn alias_name(&self, tokens: &[Token]) -> String {
        for (i, t) in tokens.iter().enumerate() {
            if self.is_punct(t, "(")
                && tokens.get(i + 1).is_some_and(|n| self.is_punct(n, "*"))
            {
                if let Some(name) = tokens.get(i + 2).filter(|n| n.kind == TokenKind::Ident) {
                    return self.text(name).to_string();
                }
            }
        }
        tokens
            .iter()
            .rev()
            .find(|t| t.kind == TokenKind::Ident)
            .map(|t| self.text(t).to_string())
            .unwrap_or_default()
    }

    /// `struct Name;` or `friend class Name;`.
    fn forward_declaration(
        &self,
        tokens: &[Token],
        tag: &str,
        flags: &DeclFlags,
    ) -> Option<RawRecord> {
        let k = tokens.iter().position(|t| self.text(t) == tag)?;
        let after: Vec<&Token> = tokens[k + 1..]
            .iter()
            .filter(|t| !(t.kind == TokenKind::Ident && is_export_macro(self.text(t))))
            .collect();
        if after.is_empty() {
            return None;
        }
        let simple_path = after.iter().enumerate().all(|(i, t)| {
            if i % 2 == 0 {
                t.kind == TokenKind::Ident
            } else {
                self.is_punct(t, "::")
            }
        });
        if !simple_path || after.len() % 2 == 0 {
            return None;
        }

        let name: String = after.iter().map(|t| self.text(t)).collect();
        let mut record = RawRecord::new(record_tag(tag), name);
        record.flags = flags.clone();
        Some(record)
    }

    fn parse_record_head(&self, tokens: &[Token]) -> (RawRecord, bool) {
        let (spec, start) = self.specifiers(tokens);
        let rest = &tokens[start..];

        let k = rest
            .iter()
            .position(|t| matches!(self.text(t), "struct" | "class" | "union"))
            .unwrap_or(0);
        let tag = rest.get(k).map_or(RecordTag::Struct, |t| record_tag(self.text(t)));

        let mut record = RawRecord::new(tag, "");
        let mut i = k + 1;
        let mut name = String::new();
        let mut qualified = false;
        while i < rest.len() {
            let t = &rest[i];
            let text = self.text(t);
            if self.is_punct(t, ":") {
                break;
            }
            if self.is_punct(t, "[") {
                i = self.skip_group(rest, i, "[", "]");
                continue;
            }
            if t.kind == TokenKind::Ident && PAREN_ATTRIBUTES.contains(&text) {
                i = self.skip_group(rest, i + 1, "(", ")");
                continue;
            }
            match t.kind {
                TokenKind::Ident if text == "final" => record.is_final = true,
                TokenKind::Ident if is_export_macro(text) => {}
                TokenKind::Ident => {
                    if !qualified {
                        name.clear();
                    }
                    name.push_str(text);
                    qualified = false;
                }
                TokenKind::Punct if text == "::" => {
                    name.push_str("::");
                    qualified = true;
                }
                _ => {}
            }
            i += 1;
        }
        record.name = name;

        if i < rest.len() {
            let default_access = tag.default_access();
            for part in self.split_top_level(&rest[i + 1..], ",") {
                let mut access = default_access;
                let mut is_virtual = false;
                let mut name_tokens = Vec::new();
                for t in part {
                    match self.text(t) {
                        "public" => access = Access::Public,
                        "protected" => access = Access::Protected,
                        "private" => access = Access::Private,
                        "virtual" => is_virtual = true,
                        _ => name_tokens.push(*t),
                    }
                }
                if name_tokens.is_empty() {
                    continue;
                }
                record.bases.push(RawBase {
                    name: self.type_text(&name_tokens),
                    access,
                    is_virtual,
                });
            }
        }

        (record, spec.is_typedef)
    }

    fn parse_function(
        &self,
        tokens: &[Token],
        open: usize,
        spec: &Specifiers,
        has_body: bool,
        flags: &DeclFlags,
    ) -> RawDecl {
        let operator = tokens[..open]
            .iter()
            .rposition(|t| self.is_word(t, "operator"));

        let (name_start, open) = match operator {
            Some(o) => {
                let mut open = open;
                // `operator()(...)`: skip the `()` that is part of the name
                if o + 1 == open
                    && tokens.get(open + 1).is_some_and(|t| self.is_punct(t, ")"))
                    && tokens.get(open + 2).is_some_and(|t| self.is_punct(t, "("))
                {
                    open += 2;
                }
                (self.qualifier_start(tokens, o), open)
            }
            None => {
                let Some(prev) = open.checked_sub(1).map(|p| &tokens[p]) else {
                    return RawDecl::Other(self.named("declaration", String::new(), flags));
                };
                if prev.kind != TokenKind::Ident {
                    return RawDecl::Other(self.named("function pointer", String::new(), flags));
                }
                if tokens
                    .get(open + 1)
                    .is_some_and(|t| matches!(self.text(t), "*" | "&" | "^"))
                {
                    let name = self.alias_name(tokens);
                    return RawDecl::Other(self.named("function pointer", name, flags));
                }
                let mut start = open - 1;
                if start > 0 && self.is_punct(&tokens[start - 1], "~") {
                    start -= 1;
                }
                (self.qualifier_start(tokens, start), open)
            }
        };

        let Some(close) = self.matching(tokens, open, "(", ")") else {
            return RawDecl::Other(self.named("declaration", String::new(), flags));
        };

        let name = self.join_name(&tokens[name_start..open]);
        let mut return_type = self.type_text(&tokens[..name_start]);
        let (params, variadic) = self.split_params(&tokens[open + 1..close]);

        let mut func = RawFunction {
            name,
            params,
            variadic,
            is_inline: spec.is_inline,
            is_static: spec.is_static,
            is_virtual: spec.is_virtual,
            is_explicit: spec.is_explicit,
            is_constexpr: spec.is_constexpr,
            flags: flags.clone(),
            ..RawFunction::default()
        };

        let trailing = &tokens[close + 1..];
        let mut explicit_body = None;
        let mut i = 0;
        while i < trailing.len() {
            let t = &trailing[i];
            match self.text(t) {
                "const" => func.is_const = true,
                "override" => func.is_override = true,
                "noexcept" => {
                    func.is_noexcept = true;
                    i = self.skip_group(trailing, i + 1, "(", ")");
                    continue;
                }
                "throw" => {
                    i = self.skip_group(trailing, i + 1, "(", ")");
                    continue;
                }
                "[" => {
                    i = self.skip_group(trailing, i, "[", "]");
                    continue;
                }
                "->" => {
                    let end = trailing[i + 1..]
                        .iter()
                        .position(|t| matches!(self.text(t), "=" | ":" | "override" | "final"))
                        .map_or(trailing.len(), |p| i + 1 + p);
                    let trailing_return = self.type_text(&trailing[i + 1..end]);
                    if return_type.is_empty() || return_type == "auto" {
                        return_type = trailing_return;
                    }
                    i = end;
                    continue;
                }
                "=" => {
                    explicit_body = match trailing.get(i + 1).map(|n| self.text(n)) {
                        Some("0") => Some(FunctionBody::PureVirtual),
                        Some("default") => Some(FunctionBody::Defaulted),
                        Some("delete") => Some(FunctionBody::Deleted),
                        _ => None,
                    };
                    break;
                }
                ":" => break,
                _ => {}
            }
            i += 1;
        }

        func.return_type = return_type;
        func.body = match explicit_body {
            Some(body) => body,
            None if has_body => FunctionBody::Inline,
            None => FunctionBody::None,
        };

        RawDecl::Function(func)
    }

    /// Walk back over `Scope::` qualifiers preceding the name at `index`.
    fn qualifier_start(&self, tokens: &[Token], index: usize) -> usize {
        let mut start = index;
        while start >= 2
            && self.is_punct(&tokens[start - 1], "::")
            && tokens[start - 2].kind == TokenKind::Ident
        {
            start -= 2;
        }
        start
    }

    fn join_name(&self, tokens: &[Token]) -> String {
        let mut name = String::new();
        let mut prev_ident = false;
        for t in tokens {
            let is_ident = t.kind == TokenKind::Ident;
            if is_ident && prev_ident {
                name.push(' ');
            }
            name.push_str(self.text(t));
            prev_ident = is_ident;
        }
        name
    }

    fn split_params(&self, tokens: &[Token]) -> (Vec<RawParam>, bool) {
        let parts = self.split_top_level(tokens, ",");
        if parts.len() == 1 && parts[0].len() == 1 && self.text(&parts[0][0]) == "void" {
            return (Vec::new(), false);
        }

        let mut params = Vec::new();
        let mut variadic = false;
        for part in parts {
            if part.is_empty() {
                continue;
            }
            if part.len() == 1 && self.text(&part[0]) == "..." {
                variadic = true;
                continue;
            }

            let (decl, default) = match self.find_top_level(part, "=") {
                Some(eq) => (&part[..eq], Some(self.slice(&part[eq + 1..]))),
                None => (part, None),
            };
            let (name, type_text) = self.split_declarator(decl);
            params.push(RawParam {
                name,
                type_text,
                default,
            });
        }
        (params, variadic)
    }

    /// Separate a declarator name from its type: `const int* p` → (`p`, `const int*`).
    fn split_declarator(&self, decl: &[Token]) -> (Option<String>, String) {
        // Function pointer: `ret (*name)(args)`
        for (k, t) in decl.iter().enumerate() {
            if self.is_punct(t, "(")
                && decl.get(k + 1).is_some_and(|n| matches!(self.text(n), "*" | "&"))
                && decl.get(k + 3).is_some_and(|n| self.is_punct(n, ")"))
            {
                if let Some(name_tok) = decl.get(k + 2).filter(|n| n.kind == TokenKind::Ident) {
                    let (first, last) = (&decl[0], &decl[decl.len() - 1]);
                    let text = format!(
                        "{}{}",
                        &self.src[first.start..name_tok.start],
                        &self.src[name_tok.end..last.end]
                    );
                    return (Some(self.text(name_tok).to_string()), text.trim().to_string());
                }
            }
        }

        let mut core_end = decl.len();
        while core_end > 0 && self.is_punct(&decl[core_end - 1], "]") {
            match decl[..core_end].iter().rposition(|t| self.is_punct(t, "[")) {
                Some(open) => core_end = open,
                None => break,
            }
        }
        let suffix = self.slice(&decl[core_end..]);
        let core = &decl[..core_end];

        if core.len() >= 2 {
            let last = &core[core.len() - 1];
            let before = &core[core.len() - 2];
            let type_part = &core[..core.len() - 1];
            let has_real_type = type_part.iter().any(|t| {
                !matches!(
                    self.text(t),
                    "const" | "volatile" | "struct" | "class" | "enum" | "typename"
                )
            });
            if last.kind == TokenKind::Ident
                && !TYPE_WORDS.contains(&self.text(last))
                && !self.is_punct(before, "::")
                && has_real_type
            {
                let type_text = format!("{}{}", self.type_text(type_part), suffix);
                return (Some(self.text(last).to_string()), type_text);
            }
        }

        (None, format!("{}{}", self.type_text(core), suffix))
    }

    fn parse_variable(&self, tokens: &[Token], spec: &Specifiers, flags: &DeclFlags) -> RawDecl {
        let mut var = RawVariable {
            is_static: spec.is_static,
            is_constexpr: spec.is_constexpr,
            is_extern: spec.is_extern,
            is_mutable: spec.is_mutable,
            flags: flags.clone(),
            ..RawVariable::default()
        };

        let mut base = String::new();
        for (index, part) in self.split_top_level(tokens, ",").into_iter().enumerate() {
            let boundary = ["=", "{", ":"]
                .iter()
                .filter_map(|p| self.find_top_level(part, p))
                .min()
                .unwrap_or(part.len());
            let decl = &part[..boundary];

            let mut declarator = RawDeclarator::default();
            match part.get(boundary).map(|t| self.text(t)) {
                Some("=") => declarator.initializer = Some(self.slice(&part[boundary + 1..])),
                Some("{") => declarator.initializer = Some(self.slice(&part[boundary..])),
                Some(":") => {
                    declarator.bit_width = part
                        .get(boundary + 1)
                        .and_then(|t| self.text(t).parse().ok());
                }
                _ => {}
            }

            if decl.iter().any(|t| self.is_punct(t, "(")) {
                declarator.name = self.alias_name(decl);
                declarator.type_text = self.slice(decl);
                declarator.unsupported = true;
                var.declarators.push(declarator);
                continue;
            }

            let mut core_end = decl.len();
            while core_end > 0 && self.is_punct(&decl[core_end - 1], "]") {
                match decl[..core_end].iter().rposition(|t| self.is_punct(t, "[")) {
                    Some(open) => core_end = open,
                    None => break,
                }
            }
            let suffix = self.slice(&decl[core_end..]);
            let core = &decl[..core_end];

            let Some(name_tok) = core.last().filter(|t| {
                t.kind == TokenKind::Ident && !TYPE_WORDS.contains(&self.text(t))
            }) else {
                declarator.type_text = self.slice(decl);
                declarator.unsupported = true;
                var.declarators.push(declarator);
                continue;
            };
            // `int Widget::count = 0;` keeps its qualifier in the name
            let name_start = self.qualifier_start(core, core.len() - 1);
            let type_tokens = &core[..name_start];

            let ops_text = if index == 0 {
                let split = type_tokens
                    .iter()
                    .position(|t| matches!(self.text(t), "*" | "&" | "&&"))
                    .unwrap_or(type_tokens.len());
                base = self.type_text(&type_tokens[..split]);
                self.type_text(&type_tokens[split..])
            } else {
                self.type_text(type_tokens)
            };

            declarator.name = if name_start + 1 == core.len() {
                self.text(name_tok).to_string()
            } else {
                self.join_name(&core[name_start..])
            };
            declarator.type_text = format!("{} {}{}", base, ops_text, suffix).trim().to_string();
            var.declarators.push(declarator);
        }

        RawDecl::Variable(var)
    }
}

fn record_tag(keyword: &str) -> RecordTag {
    match keyword {
        "class" => RecordTag::Class,
        "union" => RecordTag::Union,
        _ => RecordTag::Struct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(src: &str) -> Vec<SourceRecord> {
        HeaderScanner::new().scan("test.h", src)
    }

    fn decls(records: &[SourceRecord]) -> Vec<RawDecl> {
        records
            .iter()
            .filter_map(|r| match &r.kind {
                RecordKind::DeclarationBegin(d) => Some(d.clone()),
                _ => None,
            })
            .collect()
    }

    fn function(decl: &RawDecl) -> &RawFunction {
        match decl {
            RawDecl::Function(f) => f,
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_scan_simple_function() {
        let records = scan("int add(int a, int b);");
        let decls = decls(&records);

        assert_eq!(decls.len(), 1);
        let func = function(&decls[0]);
        assert_eq!(func.name, "add");
        assert_eq!(func.return_type, "int");
        assert_eq!(func.params.len(), 2);
        assert_eq!(func.params[0].name.as_deref(), Some("a"));
        assert_eq!(func.params[1].type_text, "int");
        assert_eq!(func.body, FunctionBody::None);
        assert!(matches!(records.last().unwrap().kind, RecordKind::DeclarationEnd));
    }

    #[test]
    fn test_scan_pointer_function() {
        let decls = decls(&scan("char* get_string(void);"));
        let func = function(&decls[0]);
        assert_eq!(func.name, "get_string");
        assert_eq!(func.return_type, "char*");
        assert!(func.params.is_empty());
    }

    #[test]
    fn test_trailing_comment_follows_end() {
        let records = scan("int add(int a, int b, int c); // separate docstring");
        let kinds: Vec<_> = records
            .iter()
            .map(|r| match r.kind {
                RecordKind::DeclarationBegin(_) => "begin",
                RecordKind::DeclarationEnd => "end",
                RecordKind::Comment => "comment",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, ["begin", "end", "comment"]);
    }

    #[test]
    fn test_scan_namespace_and_struct() {
        let src = "namespace Example01 {\nstruct Point {\n    int x = 0;\n    int y = 0;\n};\n}";
        let records = scan(src);

        assert!(matches!(
            &records[0].kind,
            RecordKind::ScopePush(ScopeKind::Namespace(Some(n))) if n == "Example01"
        ));
        let decls = decls(&records);
        match &decls[0] {
            RawDecl::Record(r) => {
                assert_eq!(r.name, "Point");
                assert_eq!(r.tag, RecordTag::Struct);
                assert!(r.is_definition);
            }
            other => panic!("expected record, got {:?}", other),
        }
        match &decls[1] {
            RawDecl::Variable(v) => {
                assert_eq!(v.declarators[0].name, "x");
                assert_eq!(v.declarators[0].initializer.as_deref(), Some("0"));
                assert_eq!(v.flags.access, Access::Public);
            }
            other => panic!("expected variable, got {:?}", other),
        }
        // Record begin spans through the closing `};`
        let begin = records
            .iter()
            .find(|r| matches!(r.kind, RecordKind::DeclarationBegin(RawDecl::Record(_))))
            .unwrap();
        assert_eq!(begin.span.start_line(), 2);
        assert_eq!(begin.span.end_line(), 5);
    }

    #[test]
    fn test_class_access_and_special_members() {
        let src = r#"
class Widget
{
public:
    Widget() = default;
    int get_value() const { return m_value; }
    void set_value(int v) { m_value = v; }
private:
    int m_value = 0;
};"#;
        let decls = decls(&scan(src));
        assert_eq!(decls.len(), 5);

        let ctor = function(&decls[1]);
        assert_eq!(ctor.name, "Widget");
        assert_eq!(ctor.return_type, "");
        assert_eq!(ctor.body, FunctionBody::Defaulted);

        let getter = function(&decls[2]);
        assert!(getter.is_const);
        assert_eq!(getter.body, FunctionBody::Inline);
        assert_eq!(getter.flags.access, Access::Public);

        match &decls[4] {
            RawDecl::Variable(v) => assert_eq!(v.flags.access, Access::Private),
            other => panic!("expected variable, got {:?}", other),
        }
    }

    #[test]
    fn test_default_access_for_class_is_private() {
        let decls = decls(&scan("class C { int hidden; };"));
        assert_eq!(decls[1].access(), Access::Private);
    }

    #[test]
    fn test_constructor_initializer_list_with_braces() {
        let src = "struct S { S(int v) : a{v}, b(v) {} int a; int b; };";
        let decls = decls(&scan(src));
        let ctor = function(&decls[1]);
        assert_eq!(ctor.name, "S");
        assert_eq!(ctor.body, FunctionBody::Inline);
        assert!(matches!(&decls[2], RawDecl::Variable(v) if v.declarators[0].name == "a"));
    }

    #[test]
    fn test_default_arguments_and_unnamed_params() {
        let decls = decls(&scan("void f(int, const std::string& s = \"x\", double d = 1.5);"));
        let func = function(&decls[0]);
        assert_eq!(func.params[0].name, None);
        assert_eq!(func.params[0].type_text, "int");
        assert_eq!(func.params[1].name.as_deref(), Some("s"));
        assert_eq!(func.params[1].type_text, "const std::string&");
        assert_eq!(func.params[1].default.as_deref(), Some("\"x\""));
        assert_eq!(func.params[2].default.as_deref(), Some("1.5"));
    }

    #[test]
    fn test_operators_and_destructor() {
        let src = "class A { public: ~A(); A& operator=(const A& other); bool operator()(int x) const; };";
        let decls = decls(&scan(src));
        assert_eq!(function(&decls[1]).name, "~A");
        assert_eq!(function(&decls[2]).name, "operator=");
        let call = function(&decls[3]);
        assert_eq!(call.name, "operator()");
        assert_eq!(call.params.len(), 1);
        assert!(call.is_const);
    }

    #[test]
    fn test_forward_declaration_and_bases() {
        let decls = decls(&scan("struct Fwd;\nclass D : public Base, private Other { };"));
        match &decls[0] {
            RawDecl::Record(r) => {
                assert_eq!(r.name, "Fwd");
                assert!(!r.is_definition);
            }
            other => panic!("expected record, got {:?}", other),
        }
        match &decls[1] {
            RawDecl::Record(r) => {
                assert_eq!(r.bases.len(), 2);
                assert_eq!(r.bases[0].name, "Base");
                assert_eq!(r.bases[1].access, Access::Private);
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_typedef_struct_takes_typedef_name() {
        let records = scan("typedef struct { int x; int y; } Point;");
        let decls = decls(&records);
        assert!(matches!(&decls[0], RawDecl::Record(r) if r.name == "Point"));
        assert!(records.iter().any(|r| matches!(
            &r.kind,
            RecordKind::ScopePush(ScopeKind::Record(n)) if n == "Point"
        )));
    }

    #[test]
    fn test_unsupported_constructs_are_named() {
        let src = "enum Color { RED, GREEN };\ntypedef int myint;\ntemplate <typename T> T id(T v);\nusing Alias = int;";
        let decls = decls(&scan(src));
        assert!(matches!(&decls[0], RawDecl::Enum(n) if n.name == "Color"));
        assert!(matches!(&decls[1], RawDecl::Alias(n) if n.name == "myint"));
        assert!(decls[2].common().is_template);
        assert!(matches!(&decls[3], RawDecl::Alias(n) if n.name == "Alias"));
    }

    #[test]
    fn test_multiple_declarators_and_arrays() {
        let decls = decls(&scan("struct S { int a, *b; float m[3]; unsigned f : 4; };"));
        match &decls[1] {
            RawDecl::Variable(v) => {
                assert_eq!(v.declarators.len(), 2);
                assert_eq!(v.declarators[1].name, "b");
                assert_eq!(v.declarators[1].type_text, "int *");
            }
            other => panic!("expected variable, got {:?}", other),
        }
        match &decls[2] {
            RawDecl::Variable(v) => assert_eq!(v.declarators[0].type_text, "float [3]"),
            other => panic!("expected variable, got {:?}", other),
        }
        match &decls[3] {
            RawDecl::Variable(v) => assert_eq!(v.declarators[0].bit_width, Some(4)),
            other => panic!("expected variable, got {:?}", other),
        }
    }

    #[test]
    fn test_export_macros_are_ignored() {
        let decls = decls(&scan("MYLIB_API int __stdcall mylib_init(void);"));
        let func = function(&decls[0]);
        assert_eq!(func.name, "mylib_init");
        assert_eq!(func.return_type, "int");
    }

    #[test]
    fn test_unbalanced_braces_produce_error() {
        let records = scan("namespace a { int f();");
        assert!(matches!(records.last().unwrap().kind, RecordKind::Error));
    }

    #[test]
    fn test_out_of_line_member_definition() {
        let decls = decls(&scan("int Widget::get() const { return 1; }"));
        let func = function(&decls[0]);
        assert_eq!(func.name, "Widget::get");
        assert!(func.is_const);
    }
}
