//! Lexical Dart front end
//!
//! Recognizes the declaration structure of a Dart library (types, members,
//! top-level functions and variables, parameters, directives) and records every
//! identifier and operator use outside declaration-name positions. Bodies are not
//! parsed into expressions; they are scanned token by token.

use super::common::{
    DeclarationSource, Directive, DirectiveKind, Invocation, ParseContext, ParsedUnit,
    ProviderError, Usage,
};
use super::lexer::{tokenize, Token, TokenKind};
use crate::graph::{ByteSpan, Declaration, DeclarationKind, Location, ReferenceKind};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

const NO_MATCH: usize = usize::MAX;

/// Words that may precede a declaration and are not part of its type
const MODIFIERS: &[&str] = &[
    "abstract", "base", "interface", "sealed", "final", "macro", "augment", "external",
    "static", "late", "const", "var", "covariant",
];

/// Words never recorded as usages
const SKIP_WORDS: &[&str] = &[
    "assert", "break", "case", "catch", "class", "const", "continue", "default", "do", "else",
    "enum", "extends", "false", "final", "finally", "for", "if", "in", "is", "new", "null",
    "rethrow", "return", "super", "switch", "this", "throw", "true", "try", "var", "void",
    "while", "with", "async", "await", "yield", "sync", "late", "required", "covariant",
    "dynamic", "Function", "implements", "static", "abstract", "external", "factory",
    "typedef", "operator", "when",
];

const ASSIGNMENT_OPS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "~/=", "&=", "|=", "^=", "<<=", "??=",
];

const PARAM_MODIFIERS: &[&str] = &["required", "covariant", "final", "var", "const", "late"];

/// Dart source parser
pub struct DartParser;

impl DartParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DartParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclarationSource for DartParser {
    fn parse(
        &self,
        path: &Path,
        contents: &str,
        context: &ParseContext,
    ) -> Result<ParsedUnit, ProviderError> {
        let tokens = tokenize(contents)?;
        let matching = match_brackets(&tokens)?;

        let mut walker = Walker {
            path,
            src: contents,
            toks: &tokens,
            matching,
            pos: 0,
            unit: ParsedUnit::new(path, context),
            prefixes: HashSet::new(),
        };
        walker.compilation_unit();

        debug!(
            "Parsed {}: {} declarations, {} usages, {} directives",
            path.display(),
            walker.unit.declarations.len(),
            walker.unit.usages.len(),
            walker.unit.directives.len()
        );
        Ok(walker.unit)
    }
}

fn syntax_error(tok: &Token, message: &str) -> ProviderError {
    ProviderError::Syntax {
        message: message.to_string(),
        line: tok.line,
        column: tok.column,
    }
}

/// Pair up `()`, `[]` and `{}`; unbalanced input is a syntax error
fn match_brackets(tokens: &[Token]) -> Result<Vec<usize>, ProviderError> {
    let mut matching = vec![NO_MATCH; tokens.len()];
    let mut stack: Vec<usize> = Vec::new();
    for (i, tok) in tokens.iter().enumerate() {
        if tok.kind != TokenKind::Punct {
            continue;
        }
        match tok.text.as_str() {
            "(" | "[" | "{" => stack.push(i),
            ")" | "]" | "}" => {
                let open = stack
                    .pop()
                    .ok_or_else(|| syntax_error(tok, "unexpected closing bracket"))?;
                let expected = match tokens[open].text.as_str() {
                    "(" => ")",
                    "[" => "]",
                    _ => "}",
                };
                if tok.text != expected {
                    return Err(syntax_error(tok, "mismatched bracket"));
                }
                matching[open] = i;
                matching[i] = open;
            }
            _ => {}
        }
    }
    if let Some(open) = stack.pop() {
        return Err(syntax_error(&tokens[open], "unclosed bracket"));
    }
    Ok(matching)
}

/// Type or extension whose body is being walked
struct Owner {
    name: String,
}

/// Supertype clauses of a type declaration
#[derive(Default)]
struct Supertypes {
    superclass: Option<String>,
    interfaces: Vec<String>,
    mixins: Vec<String>,
    on_types: Vec<String>,
}

impl Supertypes {
    fn apply(self, decl: &mut Declaration) {
        decl.superclass = self.superclass;
        decl.interfaces = self.interfaces;
        decl.mixins = self.mixins;
        decl.on_types = self.on_types;
    }
}

/// What the parameters of a callable inherit from it
struct ParamOwner {
    qualified_name: String,
    is_override: bool,
    is_abstract: bool,
    body: Option<ByteSpan>,
    emit: bool,
}

struct Walker<'a> {
    path: &'a Path,
    src: &'a str,
    toks: &'a [Token],
    matching: Vec<usize>,
    pos: usize,
    unit: ParsedUnit,
    prefixes: HashSet<String>,
}

impl<'a> Walker<'a> {
    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn tok(&self, i: usize) -> Option<&'a Token> {
        self.toks.get(i)
    }

    fn is(&self, i: usize, text: &str) -> bool {
        self.toks.get(i).map(|t| t.is(text)).unwrap_or(false)
    }

    fn ident_at(&self, i: usize) -> Option<&'a Token> {
        self.toks.get(i).filter(|t| t.is_ident())
    }

    fn close_of(&self, i: usize) -> usize {
        let m = self.matching.get(i).copied().unwrap_or(NO_MATCH);
        if m == NO_MATCH {
            i
        } else {
            m
        }
    }

    fn is_opener(&self, i: usize) -> bool {
        self.is(i, "(") || self.is(i, "[") || self.is(i, "{")
    }

    /// Index of the `>` closing the `<` at `lt`, for type argument lists
    fn angle_close(&self, lt: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = lt;
        while let Some(tok) = self.tok(i) {
            if tok.kind == TokenKind::Punct {
                match tok.text.as_str() {
                    "<" => depth += 1,
                    ">" => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(i);
                        }
                    }
                    "(" | "[" => {
                        i = self.close_of(i);
                    }
                    "{" | ";" | "=" | "=>" | "}" => return None,
                    _ => {}
                }
            }
            i += 1;
        }
        None
    }

    /// First `;` at bracket depth zero from `from`
    fn find_semicolon(&self, from: usize) -> usize {
        let mut i = from;
        while i < self.toks.len() {
            if self.is(i, ";") {
                return i;
            }
            if self.is_opener(i) {
                i = self.close_of(i);
            }
            i += 1;
        }
        self.toks.len().saturating_sub(1)
    }

    fn location(&self, name_tok: &Token, start_idx: usize, end_idx: usize) -> Location {
        let start = self.toks[start_idx].start;
        let end = self.toks[end_idx.max(start_idx)].end;
        Location::new(
            self.path.to_path_buf(),
            name_tok.line,
            name_tok.column,
            start,
            end - start,
        )
    }

    fn token_location(&self, tok: &Token) -> Location {
        Location::new(
            self.path.to_path_buf(),
            tok.line,
            tok.column,
            tok.start,
            tok.end - tok.start,
        )
    }

    /// Source line holding the declaration's name
    fn signature(&self, name_tok: &Token) -> String {
        let line_start = self.src[..name_tok.start]
            .rfind('\n')
            .map(|p| p + 1)
            .unwrap_or(0);
        let line_end = self.src[name_tok.start..]
            .find('\n')
            .map(|p| name_tok.start + p)
            .unwrap_or(self.src.len());
        self.src[line_start..line_end].trim().to_string()
    }

    fn new_decl(
        &self,
        name: &str,
        kind: DeclarationKind,
        name_tok: &Token,
        start_idx: usize,
        end_idx: usize,
    ) -> Declaration {
        let mut decl = Declaration::new(
            name.to_string(),
            kind,
            self.location(name_tok, start_idx, end_idx),
            self.unit.package.clone(),
        );
        decl.library = self.unit.library_uri.clone();
        decl.signature = Some(self.signature(name_tok));
        decl
    }

    fn push_usage(
        &mut self,
        tok: &Token,
        kind: ReferenceKind,
        qualifier: Option<String>,
        enclosing: Option<&str>,
    ) {
        self.push_named_usage(tok.text.clone(), tok, kind, qualifier, enclosing);
    }

    fn push_named_usage(
        &mut self,
        name: String,
        tok: &Token,
        kind: ReferenceKind,
        qualifier: Option<String>,
        enclosing: Option<&str>,
    ) {
        self.unit.usages.push(Usage {
            name,
            qualifier,
            kind,
            location: self.token_location(tok),
            enclosing: enclosing.map(str::to_string),
            is_member: false,
        });
    }

    // ------------------------------------------------------------------
    // Compilation unit
    // ------------------------------------------------------------------

    fn compilation_unit(&mut self) {
        while self.pos < self.toks.len() {
            let before = self.pos;
            self.top_level_item();
            if self.pos <= before {
                self.pos = before + 1;
            }
        }
    }

    fn top_level_item(&mut self) {
        if self.is(self.pos, ";") {
            self.pos += 1;
            return;
        }
        let start_idx = self.pos;
        let annotations = self.metadata(None);
        let p = self.pos;
        let directive_follows = self
            .tok(p + 1)
            .map(|t| t.kind == TokenKind::Str || t.is_ident() || t.is(";"))
            .unwrap_or(false);
        if directive_follows
            && (self.is(p, "import")
                || self.is(p, "export")
                || self.is(p, "part")
                || self.is(p, "library"))
        {
            self.directive(start_idx);
            return;
        }
        let modifiers = self.modifiers();
        if self.pos >= self.toks.len() {
            return;
        }
        let p = self.pos;
        if self.is(p, "class") {
            self.class_decl(start_idx, annotations, &modifiers);
        } else if self.is(p, "mixin") && self.is(p + 1, "class") {
            self.pos += 1;
            self.class_decl(start_idx, annotations, &modifiers);
        } else if self.is(p, "mixin") {
            self.mixin_decl(start_idx, annotations);
        } else if self.is(p, "enum") {
            self.enum_decl(start_idx, annotations);
        } else if self.is(p, "extension") && self.is(p + 1, "type") {
            self.extension_type_decl(start_idx, annotations);
        } else if self.is(p, "extension") {
            self.extension_decl(start_idx, annotations);
        } else if self.is(p, "typedef") {
            self.typedef_decl(start_idx, annotations);
        } else {
            let limit = self.toks.len();
            self.member(start_idx, annotations, &modifiers, None, limit);
        }
    }

    fn modifiers(&mut self) -> Vec<&'a str> {
        let mut mods = Vec::new();
        while let Some(tok) = self.ident_at(self.pos) {
            if !MODIFIERS.contains(&tok.text.as_str()) {
                break;
            }
            // A modifier word used as a declaration name
            let next = self.tok(self.pos + 1);
            if next
                .map(|n| n.is("=") || n.is(";") || n.is(",") || n.is("("))
                .unwrap_or(true)
            {
                break;
            }
            mods.push(tok.text.as_str());
            self.pos += 1;
        }
        mods
    }

    /// `@Name`, `@prefix.Name`, `@Name.ctor(args)`; returns annotation names
    fn metadata(&mut self, enclosing: Option<&str>) -> Vec<String> {
        let mut names = Vec::new();
        while self.is(self.pos, "@") {
            self.pos += 1;
            let Some(first) = self.ident_at(self.pos) else {
                break;
            };
            self.pos += 1;
            let mut chain = vec![first];
            while self.is(self.pos, ".") {
                match self.ident_at(self.pos + 1) {
                    Some(next) => {
                        chain.push(next);
                        self.pos += 2;
                    }
                    None => break,
                }
            }

            let (qualifier, name_tok) =
                if chain.len() > 1 && self.prefixes.contains(chain[0].text.as_str()) {
                    (Some(chain[0]), chain[1])
                } else {
                    (None, chain[0])
                };
            if let Some(prefix) = qualifier {
                self.push_usage(prefix, ReferenceKind::Read, None, enclosing);
            }
            self.push_usage(
                name_tok,
                ReferenceKind::Annotation,
                qualifier.map(|q| q.text.clone()),
                enclosing,
            );

            if self.is(self.pos, "<") {
                if let Some(close) = self.angle_close(self.pos) {
                    self.scan_types(self.pos + 1, close, enclosing);
                    self.pos = close + 1;
                }
            }
            if self.is(self.pos, "(") {
                let close = self.close_of(self.pos);
                self.scan_range(self.pos + 1, close, enclosing);
                self.pos = close + 1;
            }
            names.push(name_tok.text.clone());
        }
        names
    }

    fn directive(&mut self, start_idx: usize) {
        let kw_idx = self.pos;
        let kw = self.toks[kw_idx].text.as_str();
        let end = self.find_semicolon(kw_idx);
        let kind = match kw {
            "import" => DirectiveKind::Import,
            "export" => DirectiveKind::Export,
            "library" => DirectiveKind::Library,
            _ if self.is(kw_idx + 1, "of") => DirectiveKind::PartOf,
            _ => DirectiveKind::Part,
        };

        let uri = self.toks[kw_idx + 1..=end]
            .iter()
            .find(|t| t.kind == TokenKind::Str)
            .and_then(Token::string_value)
            .unwrap_or_default();

        let mut directive = Directive {
            kind,
            uri,
            prefix: None,
            shown: Vec::new(),
            hidden: Vec::new(),
            deferred: false,
            location: self.location(&self.toks[kw_idx], start_idx, end),
        };

        if matches!(kind, DirectiveKind::Import | DirectiveKind::Export) {
            let mut i = kw_idx + 1;
            let mut exported_names: Vec<&'a Token> = Vec::new();
            while i < end {
                if self.is(i, "if") && self.is(i + 1, "(") {
                    i = self.close_of(i + 1) + 1;
                    if self.tok(i).map(|t| t.kind == TokenKind::Str).unwrap_or(false) {
                        i += 1;
                    }
                } else if self.is(i, "deferred") {
                    directive.deferred = true;
                    i += 1;
                } else if self.is(i, "as") {
                    directive.prefix = self.ident_at(i + 1).map(|t| t.text.clone());
                    i += 2;
                } else if self.is(i, "show") || self.is(i, "hide") {
                    let show = self.is(i, "show");
                    i += 1;
                    while let Some(name) = self.ident_at(i) {
                        if show {
                            directive.shown.push(name.text.clone());
                            exported_names.push(name);
                        } else {
                            directive.hidden.push(name.text.clone());
                        }
                        i += 1;
                        if self.is(i, ",") {
                            i += 1;
                        } else {
                            break;
                        }
                    }
                } else {
                    i += 1;
                }
            }
            if kind == DirectiveKind::Export {
                // Re-exporting a name keeps it alive
                for name in exported_names {
                    self.push_usage(name, ReferenceKind::Read, None, None);
                }
            }
        }

        if let Some(prefix) = &directive.prefix {
            self.prefixes.insert(prefix.clone());
        }
        self.unit.directives.push(directive);
        self.pos = end + 1;
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    /// `prefix.Name<Args>?` or `Function(...)`; records usages, returns the simple name
    fn type_ref(&mut self, kind: ReferenceKind, enclosing: Option<&str>) -> Option<String> {
        let first = self.ident_at(self.pos)?;
        self.pos += 1;
        let mut name_tok = first;
        let mut qualifier = None;
        if self.is(self.pos, ".") {
            if let Some(second) = self.ident_at(self.pos + 1) {
                qualifier = Some(first.text.clone());
                name_tok = second;
                self.pos += 2;
                self.push_usage(first, ReferenceKind::Read, None, enclosing);
            }
        }
        self.push_usage(name_tok, kind, qualifier, enclosing);

        if self.is(self.pos, "<") {
            if let Some(close) = self.angle_close(self.pos) {
                self.scan_types(self.pos + 1, close, enclosing);
                self.pos = close + 1;
            }
        }
        if name_tok.text == "Function" && self.is(self.pos, "(") {
            let close = self.close_of(self.pos);
            self.scan_types(self.pos + 1, close, enclosing);
            self.pos = close + 1;
        }
        if self.is(self.pos, "?") {
            self.pos += 1;
        }
        Some(name_tok.text.clone())
    }

    fn type_list(&mut self, kind: ReferenceKind, enclosing: Option<&str>) -> Vec<String> {
        let mut names = Vec::new();
        while let Some(name) = self.type_ref(kind, enclosing) {
            names.push(name);
            if self.is(self.pos, ",") {
                self.pos += 1;
            } else {
                break;
            }
        }
        names
    }

    fn skip_type_params(&mut self, enclosing: Option<&str>) {
        if self.is(self.pos, "<") {
            if let Some(close) = self.angle_close(self.pos) {
                self.scan_types(self.pos + 1, close, enclosing);
                self.pos = close + 1;
            }
        }
    }

    fn supertype_clauses(&mut self, parts: &mut Supertypes, enclosing: Option<&str>) {
        loop {
            if self.is(self.pos, "extends") {
                self.pos += 1;
                parts.superclass = self.type_ref(ReferenceKind::Inheritance, enclosing);
            } else if self.is(self.pos, "with") {
                self.pos += 1;
                parts.mixins = self.type_list(ReferenceKind::Inheritance, enclosing);
            } else if self.is(self.pos, "implements") {
                self.pos += 1;
                parts.interfaces = self.type_list(ReferenceKind::Inheritance, enclosing);
            } else if self.is(self.pos, "on") {
                self.pos += 1;
                parts.on_types = self.type_list(ReferenceKind::Inheritance, enclosing);
            } else {
                break;
            }
        }
    }

    fn skip_statement(&mut self) {
        let end = self.find_semicolon(self.pos);
        self.pos = end + 1;
    }

    fn class_decl(&mut self, start_idx: usize, annotations: Vec<String>, modifiers: &[&str]) {
        self.pos += 1;
        let Some(name_tok) = self.ident_at(self.pos) else {
            self.skip_statement();
            return;
        };
        self.pos += 1;
        self.skip_type_params(None);

        let mut parts = Supertypes::default();
        if self.is(self.pos, "=") {
            // class A = B with C;
            self.pos += 1;
            parts.superclass = self.type_ref(ReferenceKind::Inheritance, None);
            self.supertype_clauses(&mut parts, None);
            let end = self.find_semicolon(self.pos);
            let mut decl = self.new_decl(
                &name_tok.text,
                DeclarationKind::Class,
                name_tok,
                start_idx,
                end,
            );
            decl.annotations = annotations;
            decl.is_abstract = modifiers.contains(&"abstract");
            parts.apply(&mut decl);
            self.unit.declarations.push(decl);
            self.pos = end + 1;
            return;
        }

        self.supertype_clauses(&mut parts, None);
        if !self.is(self.pos, "{") {
            self.skip_statement();
            return;
        }
        let open = self.pos;
        let close = self.close_of(open);
        let mut decl = self.new_decl(
            &name_tok.text,
            DeclarationKind::Class,
            name_tok,
            start_idx,
            close,
        );
        decl.annotations = annotations;
        decl.is_abstract = modifiers.contains(&"abstract") || modifiers.contains(&"sealed");
        parts.apply(&mut decl);
        self.unit.declarations.push(decl);

        let owner = Owner {
            name: name_tok.text.clone(),
        };
        self.type_body(&owner, open + 1, close);
        self.pos = close + 1;
    }

    fn mixin_decl(&mut self, start_idx: usize, annotations: Vec<String>) {
        self.pos += 1;
        let Some(name_tok) = self.ident_at(self.pos) else {
            self.skip_statement();
            return;
        };
        self.pos += 1;
        self.skip_type_params(None);
        let mut parts = Supertypes::default();
        self.supertype_clauses(&mut parts, None);
        if !self.is(self.pos, "{") {
            self.skip_statement();
            return;
        }
        let open = self.pos;
        let close = self.close_of(open);
        let mut decl = self.new_decl(
            &name_tok.text,
            DeclarationKind::Mixin,
            name_tok,
            start_idx,
            close,
        );
        decl.annotations = annotations;
        parts.apply(&mut decl);
        self.unit.declarations.push(decl);

        let owner = Owner {
            name: name_tok.text.clone(),
        };
        self.type_body(&owner, open + 1, close);
        self.pos = close + 1;
    }

    fn extension_decl(&mut self, start_idx: usize, annotations: Vec<String>) {
        let kw_tok = &self.toks[self.pos];
        self.pos += 1;
        let name_tok = self
            .ident_at(self.pos)
            .filter(|t| t.text != "on");
        if name_tok.is_some() {
            self.pos += 1;
        }
        self.skip_type_params(None);

        let mut target = None;
        if self.is(self.pos, "on") {
            self.pos += 1;
            target = self.type_ref(ReferenceKind::TypeUsage, None);
        }
        if !self.is(self.pos, "{") {
            self.skip_statement();
            return;
        }
        let open = self.pos;
        let close = self.close_of(open);

        let name = match name_tok {
            Some(tok) => tok.text.clone(),
            None => format!("<on {}>", target.as_deref().unwrap_or("?")),
        };
        let mut decl = self.new_decl(
            &name,
            DeclarationKind::Extension,
            name_tok.unwrap_or(kw_tok),
            start_idx,
            close,
        );
        decl.annotations = annotations;
        decl.on_types = target.into_iter().collect();
        self.unit.declarations.push(decl);

        let owner = Owner {
            name,
        };
        self.type_body(&owner, open + 1, close);
        self.pos = close + 1;
    }

    fn extension_type_decl(&mut self, start_idx: usize, annotations: Vec<String>) {
        self.pos += 2;
        if self.is(self.pos, "const") {
            self.pos += 1;
        }
        let Some(name_tok) = self.ident_at(self.pos) else {
            self.skip_statement();
            return;
        };
        self.pos += 1;
        let enclosing = Some(name_tok.text.as_str());
        self.skip_type_params(enclosing);
        if self.is(self.pos, ".") && self.ident_at(self.pos + 1).is_some() {
            self.pos += 2;
        }
        if self.is(self.pos, "(") {
            // Representation declaration: only its type is a usage
            let close = self.close_of(self.pos);
            if close > self.pos + 1 {
                self.scan_types(self.pos + 1, close - 1, enclosing);
            }
            self.pos = close + 1;
        }
        let mut parts = Supertypes::default();
        self.supertype_clauses(&mut parts, enclosing);
        if !self.is(self.pos, "{") {
            self.skip_statement();
            return;
        }
        let open = self.pos;
        let close = self.close_of(open);
        let mut decl = self.new_decl(
            &name_tok.text,
            DeclarationKind::ExtensionType,
            name_tok,
            start_idx,
            close,
        );
        decl.annotations = annotations;
        parts.apply(&mut decl);
        self.unit.declarations.push(decl);

        let owner = Owner {
            name: name_tok.text.clone(),
        };
        self.type_body(&owner, open + 1, close);
        self.pos = close + 1;
    }

    fn enum_decl(&mut self, start_idx: usize, annotations: Vec<String>) {
        self.pos += 1;
        let Some(name_tok) = self.ident_at(self.pos) else {
            self.skip_statement();
            return;
        };
        self.pos += 1;
        self.skip_type_params(None);
        let mut parts = Supertypes::default();
        self.supertype_clauses(&mut parts, None);
        if !self.is(self.pos, "{") {
            self.skip_statement();
            return;
        }
        let open = self.pos;
        let close = self.close_of(open);
        let mut decl = self.new_decl(
            &name_tok.text,
            DeclarationKind::Enum,
            name_tok,
            start_idx,
            close,
        );
        decl.annotations = annotations;
        parts.apply(&mut decl);
        self.unit.declarations.push(decl);

        let owner = Owner {
            name: name_tok.text.clone(),
        };
        let enclosing = Some(owner.name.as_str());

        // Enum values up to `;` or `}`
        self.pos = open + 1;
        while self.pos < close {
            let value_start = self.pos;
            let value_annotations = self.metadata(enclosing);
            if self.is(self.pos, ";") {
                self.pos += 1;
                break;
            }
            let Some(value_tok) = self.ident_at(self.pos) else {
                self.pos += 1;
                continue;
            };
            self.pos += 1;
            if self.is(self.pos, "<") {
                if let Some(angle) = self.angle_close(self.pos) {
                    self.scan_types(self.pos + 1, angle, enclosing);
                    self.pos = angle + 1;
                }
            }
            if self.is(self.pos, ".") && self.ident_at(self.pos + 1).is_some() {
                self.pos += 2;
            }
            if self.is(self.pos, "(") {
                let args_close = self.close_of(self.pos);
                self.scan_range(self.pos + 1, args_close, enclosing);
                self.pos = args_close + 1;
            }
            let mut value = self.new_decl(
                &value_tok.text,
                DeclarationKind::EnumValue,
                value_tok,
                value_start,
                self.pos - 1,
            );
            value.parent = Some(owner.name.clone());
            value.is_static = true;
            value.annotations = value_annotations;
            self.unit.declarations.push(value);

            if self.is(self.pos, ",") {
                self.pos += 1;
            } else if self.is(self.pos, ";") {
                self.pos += 1;
                break;
            }
        }

        if self.pos < close {
            let from = self.pos;
            self.type_body(&owner, from, close);
        }
        self.pos = close + 1;
    }

    fn typedef_decl(&mut self, start_idx: usize, annotations: Vec<String>) {
        let kw = self.pos;
        let end = self.find_semicolon(kw);
        let eq = (kw + 1..end).find(|&i| self.is(i, "="));

        let name_idx = match eq {
            Some(_) => Some(kw + 1),
            None => {
                // typedef Ret Name<T>(params);
                (kw + 1..end).find(|&i| self.is(i, "(")).and_then(|paren| {
                    let mut j = paren.checked_sub(1)?;
                    if self.is(j, ">") {
                        let mut depth = 0usize;
                        loop {
                            if self.is(j, ">") {
                                depth += 1;
                            } else if self.is(j, "<") {
                                depth -= 1;
                                if depth == 0 {
                                    break;
                                }
                            }
                            j = j.checked_sub(1)?;
                        }
                        j = j.checked_sub(1)?;
                    }
                    Some(j)
                })
            }
        };

        let Some(name_tok) = name_idx.and_then(|i| self.ident_at(i)) else {
            self.pos = end + 1;
            return;
        };
        let name_idx = name_idx.unwrap_or(kw + 1);

        let mut decl = self.new_decl(
            &name_tok.text,
            DeclarationKind::Typedef,
            name_tok,
            start_idx,
            end,
        );
        decl.annotations = annotations;
        self.unit.declarations.push(decl);

        self.scan_types(kw + 1, name_idx, None);
        self.scan_types(name_idx + 1, end, None);
        self.pos = end + 1;
    }

    // ------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------

    fn type_body(&mut self, owner: &Owner, from: usize, close: usize) {
        self.pos = from;
        while self.pos < close {
            let before = self.pos;
            if self.is(self.pos, ";") {
                self.pos += 1;
                continue;
            }
            let start_idx = self.pos;
            let annotations = self.metadata(Some(owner.name.as_str()));
            let modifiers = self.modifiers();
            if self.pos >= close {
                break;
            }
            self.member(start_idx, annotations, &modifiers, Some(owner), close);
            if self.pos <= before {
                self.pos = before + 1;
            }
        }
    }

    /// Whether the `(` at `paren` opens a parameter list of the declaration
    fn is_param_list(&self, header_start: usize, paren: usize) -> bool {
        if (header_start..paren).any(|i| self.is(i, "operator")) {
            return true;
        }
        let Some(mut j) = paren.checked_sub(1) else {
            return false;
        };
        if self.is(j, ">") {
            let mut depth = 0usize;
            loop {
                if self.is(j, ">") {
                    depth += 1;
                } else if self.is(j, "<") {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                if j <= header_start {
                    return false;
                }
                j -= 1;
            }
            let Some(before) = j.checked_sub(1) else {
                return false;
            };
            j = before;
        }
        j >= header_start
            && self
                .ident_at(j)
                .map(|t| t.text != "Function")
                .unwrap_or(false)
    }

    fn member(
        &mut self,
        start_idx: usize,
        annotations: Vec<String>,
        modifiers: &[&str],
        owner: Option<&Owner>,
        limit: usize,
    ) {
        let header_start = self.pos;
        let enclosing = owner.map(|o| o.name.as_str());

        // Locate the end of the declaration and its structural landmarks
        let mut first_paren = None;
        let mut initializer_eq = None;
        let mut arrow = None;
        let mut body_open = None;
        let mut i = header_start;
        let end = loop {
            if i >= limit {
                break limit.saturating_sub(1).max(header_start);
            }
            let tok = &self.toks[i];
            if tok.kind == TokenKind::Punct {
                match tok.text.as_str() {
                    ";" => break i,
                    "{" => {
                        if initializer_eq.is_none() && arrow.is_none() {
                            body_open = Some(i);
                            break self.close_of(i);
                        }
                        i = self.close_of(i) + 1;
                        continue;
                    }
                    "(" | "[" => {
                        if tok.text == "("
                            && first_paren.is_none()
                            && initializer_eq.is_none()
                            && arrow.is_none()
                            && self.is_param_list(header_start, i)
                        {
                            first_paren = Some(i);
                        }
                        i = self.close_of(i) + 1;
                        continue;
                    }
                    "=>" => {
                        if arrow.is_none() && initializer_eq.is_none() {
                            arrow = Some(i);
                        }
                    }
                    "=" => {
                        if first_paren.is_none() && initializer_eq.is_none() && arrow.is_none() {
                            initializer_eq = Some(i);
                        }
                    }
                    "}" => break i.saturating_sub(1).max(header_start),
                    _ => {}
                }
            }
            i += 1;
        };
        self.pos = end + 1;

        let is_static = modifiers.contains(&"static");
        let is_external = modifiers.contains(&"external");
        let is_override = annotations.iter().any(|a| a == "override");
        let has_body = body_open.is_some() || arrow.is_some();

        if let Some(paren) = first_paren {
            self.callable(
                start_idx,
                header_start,
                paren,
                end,
                annotations,
                owner,
                CallableFlags {
                    is_static,
                    is_external,
                    is_override,
                    has_body,
                },
            );
            return;
        }

        // Getter: `Type get name => ...;` / `{ ... }` / `;`
        let getter_kw = (header_start..end).find(|&k| {
            self.is(k, "get")
                && self.ident_at(k + 1).is_some()
                && (Some(k + 2) == arrow || Some(k + 2) == body_open || k + 2 == end)
        });
        if let Some(k) = getter_kw {
            let name_tok = &self.toks[k + 1];
            self.scan_types(header_start, k, enclosing);
            self.scan_range(k + 2, end + 1, enclosing);
            let mut decl =
                self.new_decl(&name_tok.text, DeclarationKind::Getter, name_tok, start_idx, end);
            decl.parent = owner.map(|o| o.name.clone());
            decl.annotations = annotations;
            decl.is_static = is_static;
            decl.is_override = is_override;
            decl.is_abstract = owner.is_some() && !has_body && !is_external;
            if let Some(body_start) = arrow.or(body_open) {
                decl.body = Some(ByteSpan::new(
                    self.toks[body_start].start,
                    self.toks[end].end,
                ));
            }
            self.unit.declarations.push(decl);
            return;
        }

        self.declarators(start_idx, header_start, end, annotations, owner, is_static);
    }

    #[allow(clippy::too_many_arguments)]
    fn callable(
        &mut self,
        start_idx: usize,
        header_start: usize,
        paren: usize,
        end: usize,
        annotations: Vec<String>,
        owner: Option<&Owner>,
        flags: CallableFlags,
    ) {
        let enclosing = owner.map(|o| o.name.as_str());
        let params_close = self.close_of(paren);

        let operator_kw = (header_start..paren).find(|&k| self.is(k, "operator"));
        let setter_kw = (header_start..paren)
            .find(|&k| self.is(k, "set") && self.ident_at(k + 1).is_some() && k + 2 == paren);
        let is_factory = self.is(header_start, "factory");
        // `Owner(` or `Owner.named(`
        let is_constructor_name = owner
            .map(|o| {
                self.is(header_start, &o.name)
                    && (paren == header_start + 1
                        || (paren == header_start + 3 && self.is(header_start + 1, ".")))
            })
            .unwrap_or(false);

        let (kind, name, name_tok, type_range) = if let Some(k) = operator_kw {
            let op: String = self.toks[k + 1..paren]
                .iter()
                .map(|t| t.text.as_str())
                .collect();
            (
                DeclarationKind::Method,
                format!("operator{}", op),
                &self.toks[k],
                (header_start, k),
            )
        } else if let Some(k) = setter_kw {
            let tok = &self.toks[k + 1];
            (DeclarationKind::Setter, tok.text.clone(), tok, (header_start, k))
        } else if is_factory || is_constructor_name {
            let name_start = if is_factory { header_start + 1 } else { header_start };
            let name: String = self.toks[name_start..paren]
                .iter()
                .filter(|t| t.is_ident() || t.is("."))
                .map(|t| t.text.as_str())
                .collect();
            let tok = self.toks.get(name_start).unwrap_or(&self.toks[header_start]);
            (DeclarationKind::Constructor, name, tok, (paren, paren))
        } else {
            // Name is the identifier before `(`, skipping type parameters
            let mut j = paren - 1;
            if self.is(j, ">") {
                let mut depth = 0usize;
                while j > header_start {
                    if self.is(j, ">") {
                        depth += 1;
                    } else if self.is(j, "<") {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    j -= 1;
                }
                self.scan_types(j + 1, paren - 1, enclosing);
                j = j.saturating_sub(1);
            }
            let tok = &self.toks[j];
            let kind = if owner.is_some() {
                DeclarationKind::Method
            } else {
                DeclarationKind::Function
            };
            (kind, tok.text.clone(), tok, (header_start, j))
        };

        self.scan_types(type_range.0, type_range.1, enclosing);
        // Initializer list, redirect, and body
        self.scan_range(params_close + 1, end + 1, enclosing);

        let body = if params_close < end {
            Some(ByteSpan::new(
                self.toks[params_close].end,
                self.toks[end].end,
            ))
        } else {
            None
        };
        let is_abstract = owner.is_some()
            && !flags.has_body
            && !flags.is_external
            && kind != DeclarationKind::Constructor;

        let mut decl = self.new_decl(&name, kind, name_tok, start_idx, end);
        decl.parent = owner.map(|o| o.name.clone());
        decl.annotations = annotations;
        decl.is_static = flags.is_static;
        decl.is_override = flags.is_override;
        decl.is_abstract = is_abstract;
        decl.body = body.filter(|_| flags.has_body);

        let qualified_name = decl.qualified_name();
        let is_operator = decl.is_operator();
        self.unit.declarations.push(decl);

        let param_owner = ParamOwner {
            qualified_name,
            is_override: flags.is_override,
            is_abstract: is_abstract || flags.is_external,
            body,
            emit: !is_operator,
        };
        self.parameters(paren, params_close, &param_owner, enclosing);
    }

    fn declarators(
        &mut self,
        start_idx: usize,
        header_start: usize,
        end: usize,
        annotations: Vec<String>,
        owner: Option<&Owner>,
        is_static: bool,
    ) {
        let enclosing = owner.map(|o| o.name.as_str());
        let mut names: Vec<usize> = Vec::new();
        let mut initializers: Vec<(usize, usize)> = Vec::new();
        let mut angle = 0usize;
        let mut init_start: Option<usize> = None;
        let mut i = header_start;
        while i < end {
            if let Some(from) = init_start {
                if self.is_opener(i) {
                    i = self.close_of(i) + 1;
                    continue;
                }
                // Type arguments: `Map<String, int>()`
                if self.is(i, "<") {
                    if let Some(close) = self.angle_close(i) {
                        i = close + 1;
                        continue;
                    }
                }
                if self.is(i, ",") {
                    initializers.push((from, i));
                    init_start = None;
                }
                i += 1;
                continue;
            }
            if self.is(i, "<") {
                angle += 1;
            } else if self.is(i, ">") {
                angle = angle.saturating_sub(1);
            } else if self.is_opener(i) {
                i = self.close_of(i) + 1;
                continue;
            } else if angle == 0 && self.ident_at(i).is_some() {
                let terminates = i + 1 == end
                    || self.is(i + 1, "=")
                    || self.is(i + 1, ",")
                    || self.is(i + 1, ";");
                if terminates {
                    names.push(i);
                    if self.is(i + 1, "=") {
                        init_start = Some(i + 2);
                        i += 2;
                        continue;
                    }
                }
            }
            i += 1;
        }
        if let Some(from) = init_start {
            initializers.push((from, end));
        }

        let Some(&first_name) = names.first() else {
            self.scan_range(header_start, end, enclosing);
            return;
        };
        self.scan_types(header_start, first_name, enclosing);
        for (from, to) in initializers {
            self.scan_range(from, to, enclosing);
        }

        let kind = if owner.is_some() {
            DeclarationKind::Field
        } else {
            DeclarationKind::Variable
        };
        let single = names.len() == 1;
        for idx in names {
            let name_tok = &self.toks[idx];
            let mut decl = self.new_decl(&name_tok.text, kind, name_tok, start_idx, end);
            decl.parent = owner.map(|o| o.name.clone());
            decl.annotations = annotations.clone();
            decl.is_static = is_static;
            decl.single_declarator = single;
            self.unit.declarations.push(decl);
        }
    }

    /// Split a parameter list into one token range per parameter
    fn parameter_segments(&self, open: usize, close: usize) -> Vec<(usize, usize)> {
        let mut segments = Vec::new();
        let mut group_closes: Vec<usize> = Vec::new();
        let mut seg_start = open + 1;
        let mut i = open + 1;
        while i < close {
            if group_closes.last() == Some(&i) {
                if seg_start < i {
                    segments.push((seg_start, i));
                }
                group_closes.pop();
                seg_start = i + 1;
                i += 1;
                continue;
            }
            let opens_group = (self.is(i, "[") || self.is(i, "{"))
                && (i == open + 1 || self.is(i - 1, ","));
            if opens_group {
                group_closes.push(self.close_of(i));
                seg_start = i + 1;
                i += 1;
                continue;
            }
            if self.is_opener(i) {
                i = self.close_of(i) + 1;
                continue;
            }
            if self.is(i, ",") {
                if seg_start < i {
                    segments.push((seg_start, i));
                }
                seg_start = i + 1;
            }
            i += 1;
        }
        if seg_start < close {
            segments.push((seg_start, close));
        }
        segments
    }

    fn parameters(
        &mut self,
        open: usize,
        close: usize,
        param_owner: &ParamOwner,
        enclosing: Option<&str>,
    ) {
        for (from, to) in self.parameter_segments(open, close) {
            let saved = self.pos;
            self.pos = from;
            let annotations = self.metadata(enclosing);
            let mut j = self.pos;
            self.pos = saved;
            while j < to
                && self
                    .ident_at(j)
                    .map(|t| PARAM_MODIFIERS.contains(&t.text.as_str()))
                    .unwrap_or(false)
            {
                j += 1;
            }

            // this.x / super.x initialize a field or super parameter
            let formal = (j..to).find(|&k| {
                (self.is(k, "this") || self.is(k, "super"))
                    && self.is(k + 1, ".")
                    && self.ident_at(k + 2).is_some()
            });
            if let Some(k) = formal {
                let name_tok = &self.toks[k + 2];
                let qualifier = Some(self.toks[k].text.clone());
                self.scan_types(j, k, enclosing);
                self.push_usage(name_tok, ReferenceKind::Assignment, qualifier, enclosing);
                if k + 3 < to {
                    self.scan_range(k + 3, to, enclosing);
                }
                continue;
            }

            let mut default_at = None;
            let mut k = j;
            while k < to {
                if self.is_opener(k) {
                    k = self.close_of(k) + 1;
                    continue;
                }
                if self.is(k, "=") || self.is(k, ":") {
                    default_at = Some(k);
                    break;
                }
                k += 1;
            }
            let name_end = default_at.unwrap_or(to);

            let mut name_idx = None;
            let mut k = j;
            while k < name_end {
                if self.is_opener(k) {
                    k = self.close_of(k) + 1;
                    continue;
                }
                if self.ident_at(k).is_some() {
                    name_idx = Some(k);
                }
                k += 1;
            }
            let Some(name_idx) = name_idx else {
                self.scan_types(j, to, enclosing);
                continue;
            };

            self.scan_types(j, name_idx, enclosing);
            if name_idx + 1 < name_end {
                // Function-typed parameter: `int compare(a, b)`
                self.scan_types(name_idx + 1, name_end, enclosing);
            }
            if let Some(d) = default_at {
                self.scan_range(d + 1, to, enclosing);
            }

            if !param_owner.emit {
                continue;
            }
            let name_tok = &self.toks[name_idx];
            let mut decl = self.new_decl(
                &name_tok.text,
                DeclarationKind::Parameter,
                name_tok,
                from,
                to - 1,
            );
            decl.parent = Some(param_owner.qualified_name.clone());
            decl.annotations = annotations;
            decl.is_override = param_owner.is_override;
            decl.is_abstract = param_owner.is_abstract;
            decl.body = param_owner.body;
            self.unit.declarations.push(decl);
        }
    }

    // ------------------------------------------------------------------
    // Usage scanning
    // ------------------------------------------------------------------

    /// Record every identifier in `[from, to)` as a type usage
    fn scan_types(&mut self, from: usize, to: usize, enclosing: Option<&str>) {
        let toks = self.toks;
        let to = to.min(toks.len());
        for i in from..to {
            let tok = &toks[i];
            if !tok.is_ident() || SKIP_WORDS.contains(&tok.text.as_str()) {
                continue;
            }
            let qualifier = i
                .checked_sub(2)
                .filter(|_| toks[i - 1].is("."))
                .and_then(|q| toks.get(q))
                .filter(|q| q.is_ident())
                .map(|q| q.text.clone());
            let kind = if qualifier.is_some() || tok.text.starts_with(char::is_uppercase) {
                ReferenceKind::TypeUsage
            } else {
                ReferenceKind::Read
            };
            self.push_usage(tok, kind, qualifier, enclosing);
        }
    }

    fn scan_range(&mut self, from: usize, to: usize, enclosing: Option<&str>) {
        let toks = self.toks;
        self.scan_slice(toks, from, to, enclosing);
    }

    fn scan_slice(&mut self, toks: &'a [Token], from: usize, to: usize, enclosing: Option<&str>) {
        let to = to.min(toks.len());
        for i in from..to {
            let tok = &toks[i];
            match tok.kind {
                TokenKind::Str => {
                    if !tok.interpolation.is_empty() {
                        self.scan_slice(&tok.interpolation, 0, tok.interpolation.len(), enclosing);
                    }
                }
                TokenKind::Number => {}
                TokenKind::Ident => self.scan_ident(toks, i, enclosing),
                TokenKind::Punct => self.scan_operator(toks, i, enclosing),
            }
        }
    }

    fn scan_ident(&mut self, toks: &'a [Token], i: usize, enclosing: Option<&str>) {
        let tok = &toks[i];
        let prev = i.checked_sub(1).map(|p| &toks[p]);
        let next = toks.get(i + 1);

        let generic = if next.map(|n| n.is("<")).unwrap_or(false) {
            generic_call(toks, i + 1)
        } else {
            None
        };
        if let Some((_, type_args)) = &generic {
            self.unit.invocations.push(Invocation {
                target: target_chain(toks, i),
                name: tok.text.clone(),
                type_args: type_args.clone(),
                location: self.token_location(tok),
            });
        }

        if SKIP_WORDS.contains(&tok.text.as_str()) {
            return;
        }

        // Named argument and record field labels
        let is_label = next.map(|n| n.is(":")).unwrap_or(false)
            && prev.map(|p| p.is("(") || p.is(",")).unwrap_or(false);
        if is_label {
            return;
        }

        let after_dot = prev
            .map(|p| p.is(".") || p.is("?."))
            .unwrap_or(false);
        let after_cascade = prev
            .map(|p| p.is("..") || p.is("?.."))
            .unwrap_or(false);
        let qualifier = if after_dot {
            i.checked_sub(2)
                .map(|q| &toks[q])
                .filter(|q| q.is_ident())
                .map(|q| q.text.clone())
        } else {
            None
        };

        let next_is_call = next.map(|n| n.is("(")).unwrap_or(false) || generic.is_some();
        let next_is_assignment = next
            .map(|n| n.kind == TokenKind::Punct && ASSIGNMENT_OPS.contains(&n.text.as_str()))
            .unwrap_or(false);

        let kind = if prev.map(|p| p.is("@")).unwrap_or(false) {
            ReferenceKind::Annotation
        } else if next_is_assignment {
            ReferenceKind::Assignment
        } else if next_is_call {
            ReferenceKind::Invocation
        } else if after_dot || after_cascade {
            ReferenceKind::PropertyAccess
        } else if tok.text.starts_with(char::is_uppercase)
            && next
                .map(|n| n.is_ident() || n.is("<") || n.is("?"))
                .unwrap_or(false)
        {
            ReferenceKind::TypeUsage
        } else {
            ReferenceKind::Read
        };
        self.push_usage(tok, kind, qualifier, enclosing);
        if after_dot || after_cascade {
            if let Some(last) = self.unit.usages.last_mut() {
                last.is_member = true;
            }
        }
    }

    fn scan_operator(&mut self, toks: &'a [Token], i: usize, enclosing: Option<&str>) {
        let tok = &toks[i];
        let prev = i.checked_sub(1).map(|p| &toks[p]);
        let prev_is_operand = prev
            .map(|p| match p.kind {
                TokenKind::Ident => !SKIP_WORDS.contains(&p.text.as_str()) || p.is("this"),
                TokenKind::Str | TokenKind::Number => true,
                TokenKind::Punct => p.is(")") || p.is("]"),
            })
            .unwrap_or(false);

        let op: &str = match tok.text.as_str() {
            "+" | "*" | "/" | "%" | "~/" | "<<" | "^" | "|" | "&" | "==" | "<" | ">" | "<="
            | ">=" | "~" => tok.text.as_str(),
            "!=" => "==",
            "++" | "+=" => "+",
            "--" | "-=" => "-",
            "*=" => "*",
            "/=" => "/",
            "%=" => "%",
            "~/=" => "~/",
            "&=" => "&",
            "|=" => "|",
            "^=" => "^",
            "<<=" => "<<",
            "-" => {
                if prev_is_operand {
                    "-"
                } else {
                    "unary-"
                }
            }
            "[" => {
                if prev_is_operand || prev.map(|p| p.is("?")).unwrap_or(false) {
                    self.push_named_usage(
                        "operator[]".to_string(),
                        tok,
                        ReferenceKind::Invocation,
                        None,
                        enclosing,
                    );
                    self.push_named_usage(
                        "operator[]=".to_string(),
                        tok,
                        ReferenceKind::Invocation,
                        None,
                        enclosing,
                    );
                }
                return;
            }
            _ => return,
        };
        self.push_named_usage(
            format!("operator{}", op),
            tok,
            ReferenceKind::Invocation,
            None,
            enclosing,
        );
    }
}

#[derive(Clone, Copy)]
struct CallableFlags {
    is_static: bool,
    is_external: bool,
    is_override: bool,
    has_body: bool,
}

/// `<A, p.B<C>>(` or `<A>.named(` starting at `lt`; returns the `>` index and argument names
fn generic_call(toks: &[Token], lt: usize) -> Option<(usize, Vec<String>)> {
    let mut depth = 0usize;
    let mut args = Vec::new();
    let mut expect_arg = true;
    let mut close = None;
    let mut j = lt;
    while j < toks.len() {
        let tok = &toks[j];
        match tok.kind {
            TokenKind::Punct => match tok.text.as_str() {
                "<" => {
                    depth += 1;
                    if depth == 1 {
                        expect_arg = true;
                    }
                }
                ">" => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(j);
                        break;
                    }
                }
                "," => {
                    if depth == 1 {
                        expect_arg = true;
                    }
                }
                "." | "?" | "(" | ")" => {}
                _ => return None,
            },
            TokenKind::Ident => {
                if depth == 1 && expect_arg {
                    let prefixed = toks.get(j + 1).map(|n| n.is(".")).unwrap_or(false);
                    if !prefixed {
                        args.push(tok.text.clone());
                        expect_arg = false;
                    }
                }
            }
            _ => return None,
        }
        j += 1;
    }
    let close = close?;
    let after = toks.get(close + 1)?;
    let is_call = after.is("(")
        || (after.is(".")
            && toks.get(close + 2).map(|t| t.is_ident()).unwrap_or(false)
            && toks.get(close + 3).map(|t| t.is("(")).unwrap_or(false));
    if is_call && !args.is_empty() {
        Some((close, args))
    } else {
        None
    }
}

/// Dotted receiver chain before the identifier at `name_idx`
fn target_chain(toks: &[Token], name_idx: usize) -> Option<String> {
    let mut parts = Vec::new();
    let mut k = name_idx;
    while k >= 2 && (toks[k - 1].is(".") || toks[k - 1].is("?.")) && toks[k - 2].is_ident() {
        parts.push(toks[k - 2].text.as_str());
        k -= 2;
    }
    if parts.is_empty() {
        None
    } else {
        parts.reverse();
        Some(parts.join("."))
    }
}
