//! Recursive descent parser producing green trees.
//!
//! Unsupported statements and members are kept as opaque nodes spanning a
//! balanced run of tokens, so that every input that is lexically valid and
//! bracket balanced round-trips through the tree unchanged.

use super::lexer::tokenize;
use super::{
    GreenElement, GreenNode, GreenToken, SyntaxError, SyntaxKind, is_predefined_type,
    is_reserved_keyword,
};

type PResult<T> = Result<T, SyntaxError>;

/// Parses a whole source file.
pub(crate) fn parse_compilation_unit(source: &str) -> PResult<GreenNode> {
    Ok(parse_unit(source)?.green)
}

/// A compilation unit together with the members that failed to parse and
/// were kept as opaque `UnknownMember` text.
#[derive(Debug)]
pub(crate) struct ParsedUnit {
    pub(crate) green: GreenNode,
    pub(crate) skipped_members: Vec<SyntaxError>,
}

pub(crate) fn parse_unit(source: &str) -> PResult<ParsedUnit> {
    let mut parser = Parser::new(source)?;
    let green = parser.compilation_unit()?;
    Ok(ParsedUnit {
        green,
        skipped_members: parser.skipped_members,
    })
}

/// Parses exactly one statement.
pub(crate) fn parse_statement(source: &str) -> PResult<GreenNode> {
    let mut parser = Parser::new(source)?;
    let statement = parser.statement()?;
    if !parser.at_eof() {
        return Err(parser.error("unexpected input after statement"));
    }
    Ok(statement)
}

const MEMBER_MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "abstract", "virtual", "override",
    "sealed", "readonly", "extern", "unsafe", "new", "const", "volatile", "fixed",
];

const CONTEXTUAL_MODIFIERS: &[&str] = &["async", "partial", "required", "file"];

const PARAMETER_MODIFIERS: &[&str] = &["this", "ref", "out", "in", "params", "scoped", "readonly"];

const ACCESSOR_KEYWORDS: &[&str] = &["get", "set", "init", "add", "remove"];

const ASSIGNMENT_OPERATORS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<=", "??=",
];

const PREFIX_OPERATORS: &[&str] = &["!", "-", "+", "~", "++", "--", "&", "*", "^"];

/// Tokens that may follow a type argument list in an expression.
const GENERIC_FOLLOW: &[&str] = &[
    "(", ")", "]", "}", ":", ";", ",", ".", "?", "==", "!=", "|", "^", "&&", "||", "&", "[", "?.",
];

const BINARY_LEVELS: &[&[&str]] = &[
    &["||"],
    &["&&"],
    &["|"],
    &["^"],
    &["&"],
    &["==", "!="],
    &[],
    &[],
    &["+", "-"],
    &["*", "/", "%"],
];
const RELATIONAL_LEVEL: usize = 6;
const SHIFT_LEVEL: usize = 7;

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<GreenToken>,
    offsets: Vec<usize>,
    pos: usize,
    skipped_members: Vec<SyntaxError>,
}

fn node(kind: SyntaxKind, children: Vec<GreenElement>) -> GreenNode {
    GreenNode::new(kind, children)
}

impl<'s> Parser<'s> {
    fn new(source: &'s str) -> PResult<Self> {
        let tokens = tokenize(source)?;
        let mut offsets = Vec::with_capacity(tokens.len());
        let mut offset = 0;
        for token in &tokens {
            offsets.push(offset + token.leading().len());
            offset += token.full_len();
        }
        Ok(Self {
            source,
            tokens,
            offsets,
            pos: 0,
            skipped_members: Vec::new(),
        })
    }

    // ---- token helpers ----

    fn nth(&self, n: usize) -> &GreenToken {
        let index = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn current(&self) -> &GreenToken {
        self.nth(0)
    }

    fn at_eof(&self) -> bool {
        self.current().kind() == SyntaxKind::Eof
    }

    fn at(&self, punct: &str) -> bool {
        self.current().is_punct(punct)
    }

    fn nth_at(&self, n: usize, punct: &str) -> bool {
        self.nth(n).is_punct(punct)
    }

    fn at_kw(&self, keyword: &str) -> bool {
        self.current().is_keyword(keyword)
    }

    fn nth_is_identifier(&self, n: usize) -> bool {
        let token = self.nth(n);
        token.kind() == SyntaxKind::Ident && !is_reserved_keyword(token.text())
    }

    fn at_identifier(&self) -> bool {
        self.nth_is_identifier(0)
    }

    /// True when token `n` and token `n + 1` touch without trivia between.
    fn adjacent(&self, n: usize) -> bool {
        self.nth(n).trailing().is_empty() && self.nth(n + 1).leading().is_empty()
    }

    fn bump(&mut self) -> GreenElement {
        let token = self.current().clone();
        if token.kind() != SyntaxKind::Eof {
            self.pos += 1;
        }
        token.into()
    }

    fn eat(&mut self, children: &mut Vec<GreenElement>, punct: &str) -> bool {
        if self.at(punct) {
            children.push(self.bump());
            true
        } else {
            false
        }
    }

    fn expect(&mut self, children: &mut Vec<GreenElement>, punct: &str) -> PResult<()> {
        if self.eat(children, punct) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{punct}'")))
        }
    }

    fn expect_keyword(&mut self, children: &mut Vec<GreenElement>, keyword: &str) -> PResult<()> {
        if self.at_kw(keyword) {
            children.push(self.bump());
            Ok(())
        } else {
            Err(self.error(&format!("expected '{keyword}'")))
        }
    }

    fn identifier(&mut self, children: &mut Vec<GreenElement>) -> PResult<()> {
        if self.at_identifier() {
            children.push(self.bump());
            Ok(())
        } else {
            Err(self.error("expected identifier"))
        }
    }

    fn error(&self, message: &str) -> SyntaxError {
        let found = if self.at_eof() {
            "end of file".to_string()
        } else {
            format!("'{}'", self.current().text())
        };
        let offset = self.offsets[self.pos.min(self.offsets.len() - 1)];
        SyntaxError::at(self.source, offset, format!("{message}, found {found}"))
    }

    /// Runs `parse` and rewinds when it fails.
    fn speculate<T>(&mut self, parse: impl FnOnce(&mut Self) -> PResult<T>) -> Option<T> {
        let start = self.pos;
        match parse(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.pos = start;
                None
            }
        }
    }

    /// Consumes a bracketed run starting at the current opening token.
    fn balanced(&mut self, children: &mut Vec<GreenElement>) -> PResult<()> {
        let mut depth = 0usize;
        loop {
            if self.at_eof() {
                return Err(self.error("unbalanced brackets"));
            }
            let token = self.current().clone();
            children.push(self.bump());
            if is_open(&token) {
                depth += 1;
            } else if is_close(&token) {
                if depth == 0 {
                    return Err(self.error("unbalanced brackets"));
                }
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
        }
    }

    /// Keeps the tokens of a construct the parser does not model. Stops at
    /// a `;` or after a brace block at nesting depth zero.
    fn opaque(
        &mut self,
        mut children: Vec<GreenElement>,
        kind: SyntaxKind,
        cause: SyntaxError,
    ) -> PResult<GreenNode> {
        if children.is_empty() && (self.at_eof() || self.at("}")) {
            return Err(cause);
        }
        let starts_with_do = self.at_kw("do");
        let mut depth = 0usize;
        loop {
            if self.at_eof() {
                if depth > 0 {
                    return Err(self.error("unexpected end of file"));
                }
                break;
            }
            if depth == 0 && self.at("}") {
                break;
            }
            if depth == 0 && self.at(";") {
                children.push(self.bump());
                break;
            }
            let token = self.current().clone();
            children.push(self.bump());
            if is_open(&token) {
                depth += 1;
            } else if is_close(&token) {
                if depth == 0 {
                    return Err(self.error("unbalanced brackets"));
                }
                depth -= 1;
                if depth == 0 && token.is_punct("}") && self.block_ends_construct(starts_with_do) {
                    self.eat(&mut children, ";");
                    break;
                }
            }
        }
        Ok(node(kind, children))
    }

    fn block_ends_construct(&self, starts_with_do: bool) -> bool {
        let next = self.current();
        if next.kind() == SyntaxKind::Eof || next.is_punct(";") {
            return true;
        }
        if next.kind() == SyntaxKind::Ident {
            let continues = matches!(next.text(), "else" | "catch" | "finally")
                || (starts_with_do && next.text() == "while");
            return !continues;
        }
        ["{", "}", "[", "~"].iter().any(|p| next.is_punct(p))
    }

    // ---- declarations ----

    fn compilation_unit(&mut self) -> PResult<GreenNode> {
        let mut children = Vec::new();
        self.namespace_body(&mut children, false)?;
        children.push(self.bump());
        Ok(node(SyntaxKind::CompilationUnit, children))
    }

    fn namespace_body(&mut self, children: &mut Vec<GreenElement>, braced: bool) -> PResult<()> {
        while self.at_kw("extern") && self.nth(1).is_keyword("alias") {
            let mut alias = Vec::new();
            alias.push(self.bump());
            alias.push(self.bump());
            self.identifier(&mut alias)?;
            self.expect(&mut alias, ";")?;
            children.push(node(SyntaxKind::ExternAlias, alias).into());
        }
        while self.at_using_directive() {
            children.push(self.using_directive()?.into());
        }
        loop {
            if self.at_eof() {
                if braced {
                    return Err(self.error("expected '}'"));
                }
                return Ok(());
            }
            if self.at("}") {
                if braced {
                    return Ok(());
                }
                return Err(self.error("unexpected '}'"));
            }
            children.push(self.member()?.into());
        }
    }

    fn at_using_directive(&self) -> bool {
        (self.at_kw("using") && !self.nth_at(1, "(") && !self.nth(1).is_keyword("var"))
            || (self.at_kw("global") && self.nth(1).is_keyword("using"))
    }

    fn using_directive(&mut self) -> PResult<GreenNode> {
        let mut children = Vec::new();
        if self.at_kw("global") {
            children.push(self.bump());
        }
        self.expect_keyword(&mut children, "using")?;
        if self.at_kw("static") {
            children.push(self.bump());
        }
        if self.at_identifier() && self.nth_at(1, "=") {
            children.push(self.bump());
            children.push(self.bump());
        }
        children.push(self.parse_type()?.into());
        self.expect(&mut children, ";")?;
        Ok(node(SyntaxKind::UsingDirective, children))
    }

    fn member(&mut self) -> PResult<GreenNode> {
        let start = self.pos;
        let skipped = self.skipped_members.len();
        match self.member_declaration() {
            Ok(member) => Ok(member),
            Err(error) => {
                self.pos = start;
                self.skipped_members.truncate(skipped);
                let member = self.opaque(Vec::new(), SyntaxKind::UnknownMember, error.clone())?;
                self.skipped_members.push(error);
                Ok(member)
            }
        }
    }

    fn member_declaration(&mut self) -> PResult<GreenNode> {
        let mut children = Vec::new();
        self.attribute_lists(&mut children)?;
        self.modifiers(&mut children, MEMBER_MODIFIERS);
        if (self.at_eof() || self.at("}")) && !children.is_empty() {
            return Ok(node(SyntaxKind::UnknownMember, children));
        }
        let token = self.current().clone();
        if token.kind() == SyntaxKind::Ident {
            match token.text() {
                "namespace" => return self.namespace(children),
                "class" | "struct" | "interface" => return self.type_declaration(children),
                "record" if self.nth_is_identifier(1) || self.nth(1).is_keyword("class") || self.nth(1).is_keyword("struct") => {
                    return self.type_declaration(children);
                }
                "enum" => return self.enum_declaration(children),
                "delegate" => return self.delegate_declaration(children),
                "event" => {
                    let cause = self.error("event declaration");
                    return self.opaque(children, SyntaxKind::EventDecl, cause);
                }
                "implicit" | "explicit" => {
                    children.push(self.bump());
                    return self.operator_rest(children);
                }
                _ => {}
            }
        }
        if self.at("~") {
            children.push(self.bump());
            self.identifier(&mut children)?;
            children.push(self.parameter_list()?.into());
            self.body(&mut children)?;
            return Ok(node(SyntaxKind::DestructorDecl, children));
        }
        if self.at_identifier() && self.nth_at(1, "(") {
            return self.constructor_rest(children);
        }

        children.push(self.parse_type()?.into());
        if self.at_kw("operator") {
            return self.operator_rest(children);
        }
        if self.at_kw("this") {
            return self.indexer_rest(children);
        }
        let mut name = Vec::new();
        self.identifier(&mut name)?;
        while self.at(".") {
            name.push(self.bump());
            if self.at_kw("this") {
                children.extend(name);
                return self.indexer_rest(children);
            }
            self.identifier(&mut name)?;
        }
        if self.at("<") || self.at("(") {
            children.extend(name);
            if self.at("<") {
                children.push(self.type_parameter_list()?.into());
            }
            children.push(self.parameter_list()?.into());
            self.constraint_clauses(&mut children)?;
            self.body(&mut children)?;
            return Ok(node(SyntaxKind::MethodDecl, children));
        }
        if self.at("{") {
            children.extend(name);
            children.push(self.accessor_list()?.into());
            if self.at("=") {
                children.push(self.equals_value()?.into());
                self.expect(&mut children, ";")?;
            }
            return Ok(node(SyntaxKind::PropertyDecl, children));
        }
        if self.at("=>") {
            children.extend(name);
            children.push(self.arrow_expression()?.into());
            self.expect(&mut children, ";")?;
            return Ok(node(SyntaxKind::PropertyDecl, children));
        }
        let mut declarator = name;
        if self.at("=") {
            declarator.push(self.equals_value()?.into());
        }
        children.push(node(SyntaxKind::VariableDeclarator, declarator).into());
        while self.eat(&mut children, ",") {
            children.push(self.variable_declarator()?.into());
        }
        self.expect(&mut children, ";")?;
        Ok(node(SyntaxKind::FieldDecl, children))
    }

    fn attribute_lists(&mut self, children: &mut Vec<GreenElement>) -> PResult<()> {
        while self.at("[") {
            let mut attribute = Vec::new();
            self.balanced(&mut attribute)?;
            children.push(node(SyntaxKind::AttributeList, attribute).into());
        }
        Ok(())
    }

    fn modifiers(&mut self, children: &mut Vec<GreenElement>, allowed: &[&str]) {
        loop {
            let token = self.current();
            if token.kind() != SyntaxKind::Ident {
                return;
            }
            let text = token.text();
            let contextual =
                CONTEXTUAL_MODIFIERS.contains(&text) && self.nth(1).kind() == SyntaxKind::Ident;
            if allowed.contains(&text) || (allowed == MEMBER_MODIFIERS && contextual) {
                children.push(self.bump());
            } else {
                return;
            }
        }
    }

    fn namespace(&mut self, mut children: Vec<GreenElement>) -> PResult<GreenNode> {
        self.expect_keyword(&mut children, "namespace")?;
        children.push(self.name()?.into());
        if self.eat(&mut children, ";") {
            self.namespace_body(&mut children, false)?;
            return Ok(node(SyntaxKind::FileScopedNamespaceDecl, children));
        }
        self.expect(&mut children, "{")?;
        self.namespace_body(&mut children, true)?;
        self.expect(&mut children, "}")?;
        self.eat(&mut children, ";");
        Ok(node(SyntaxKind::NamespaceDecl, children))
    }

    fn type_declaration(&mut self, mut children: Vec<GreenElement>) -> PResult<GreenNode> {
        let is_record = self.at_kw("record");
        children.push(self.bump());
        if is_record && (self.at_kw("class") || self.at_kw("struct")) {
            children.push(self.bump());
        }
        self.identifier(&mut children)?;
        if self.at("<") {
            children.push(self.type_parameter_list()?.into());
        }
        if self.at("(") {
            children.push(self.parameter_list()?.into());
        }
        if self.at(":") {
            children.push(self.base_list()?.into());
        }
        self.constraint_clauses(&mut children)?;
        if self.eat(&mut children, ";") {
            return Ok(node(SyntaxKind::TypeDecl, children));
        }
        self.expect(&mut children, "{")?;
        while !self.at("}") {
            if self.at_eof() {
                return Err(self.error("expected '}'"));
            }
            children.push(self.member()?.into());
        }
        children.push(self.bump());
        self.eat(&mut children, ";");
        Ok(node(SyntaxKind::TypeDecl, children))
    }

    fn base_list(&mut self) -> PResult<GreenNode> {
        let mut children = Vec::new();
        self.expect(&mut children, ":")?;
        loop {
            children.push(self.parse_type()?.into());
            if self.at("(") {
                children.push(self.argument_list()?.into());
            }
            if !self.eat(&mut children, ",") {
                break;
            }
        }
        Ok(node(SyntaxKind::BaseList, children))
    }

    fn enum_declaration(&mut self, mut children: Vec<GreenElement>) -> PResult<GreenNode> {
        children.push(self.bump());
        self.identifier(&mut children)?;
        if self.at(":") {
            children.push(self.base_list()?.into());
        }
        if !self.at("{") {
            return Err(self.error("expected '{'"));
        }
        self.balanced(&mut children)?;
        self.eat(&mut children, ";");
        Ok(node(SyntaxKind::EnumDecl, children))
    }

    fn delegate_declaration(&mut self, mut children: Vec<GreenElement>) -> PResult<GreenNode> {
        children.push(self.bump());
        children.push(self.parse_type()?.into());
        self.identifier(&mut children)?;
        if self.at("<") {
            children.push(self.type_parameter_list()?.into());
        }
        children.push(self.parameter_list()?.into());
        self.constraint_clauses(&mut children)?;
        self.expect(&mut children, ";")?;
        Ok(node(SyntaxKind::DelegateDecl, children))
    }

    fn constructor_rest(&mut self, mut children: Vec<GreenElement>) -> PResult<GreenNode> {
        self.identifier(&mut children)?;
        children.push(self.parameter_list()?.into());
        if self.at(":") {
            let mut initializer = vec![self.bump()];
            if self.at_kw("base") || self.at_kw("this") {
                initializer.push(self.bump());
            } else {
                return Err(self.error("expected 'base' or 'this'"));
            }
            initializer.push(self.argument_list()?.into());
            children.push(node(SyntaxKind::ConstructorInitializer, initializer).into());
        }
        self.body(&mut children)?;
        Ok(node(SyntaxKind::ConstructorDecl, children))
    }

    fn operator_rest(&mut self, mut children: Vec<GreenElement>) -> PResult<GreenNode> {
        self.expect_keyword(&mut children, "operator")?;
        if matches!(children.iter().rev().nth(1), Some(GreenElement::Token(t)) if t.is_keyword("implicit") || t.is_keyword("explicit"))
        {
            children.push(self.parse_type()?.into());
        } else {
            if self.at("(") {
                return Err(self.error("expected operator"));
            }
            while !self.at("(") {
                if self.at_eof() {
                    return Err(self.error("expected '('"));
                }
                children.push(self.bump());
            }
        }
        children.push(self.parameter_list()?.into());
        self.body(&mut children)?;
        Ok(node(SyntaxKind::OperatorDecl, children))
    }

    fn indexer_rest(&mut self, mut children: Vec<GreenElement>) -> PResult<GreenNode> {
        self.expect_keyword(&mut children, "this")?;
        children.push(self.parameter_list_delimited("[", "]", SyntaxKind::BracketedParameterList)?.into());
        if self.at("=>") {
            children.push(self.arrow_expression()?.into());
            self.expect(&mut children, ";")?;
        } else {
            children.push(self.accessor_list()?.into());
        }
        Ok(node(SyntaxKind::IndexerDecl, children))
    }

    fn accessor_list(&mut self) -> PResult<GreenNode> {
        let mut children = Vec::new();
        self.expect(&mut children, "{")?;
        while !self.at("}") {
            let mut accessor = Vec::new();
            self.attribute_lists(&mut accessor)?;
            self.modifiers(&mut accessor, &["private", "protected", "internal", "readonly"]);
            let keyword = self.current();
            if !(keyword.kind() == SyntaxKind::Ident && ACCESSOR_KEYWORDS.contains(&keyword.text())) {
                return Err(self.error("expected accessor"));
            }
            accessor.push(self.bump());
            self.body(&mut accessor)?;
            children.push(node(SyntaxKind::Accessor, accessor).into());
        }
        children.push(self.bump());
        Ok(node(SyntaxKind::AccessorList, children))
    }

    /// Block body, expression body followed by `;`, or a bare `;`.
    fn body(&mut self, children: &mut Vec<GreenElement>) -> PResult<()> {
        if self.at("{") {
            children.push(self.block()?.into());
            Ok(())
        } else if self.at("=>") {
            children.push(self.arrow_expression()?.into());
            self.expect(children, ";")
        } else {
            self.expect(children, ";")
        }
    }

    fn arrow_expression(&mut self) -> PResult<GreenNode> {
        let mut children = Vec::new();
        self.expect(&mut children, "=>")?;
        children.push(self.expression()?.into());
        Ok(node(SyntaxKind::ArrowExpression, children))
    }

    fn equals_value(&mut self) -> PResult<GreenNode> {
        let mut children = Vec::new();
        self.expect(&mut children, "=")?;
        if self.at("{") {
            children.push(self.initializer()?.into());
        } else {
            children.push(self.expression()?.into());
        }
        Ok(node(SyntaxKind::EqualsValue, children))
    }

    fn variable_declarator(&mut self) -> PResult<GreenNode> {
        let mut children = Vec::new();
        self.identifier(&mut children)?;
        if self.at("=") {
            children.push(self.equals_value()?.into());
        }
        Ok(node(SyntaxKind::VariableDeclarator, children))
    }

    fn type_parameter_list(&mut self) -> PResult<GreenNode> {
        let mut children = Vec::new();
        self.expect(&mut children, "<")?;
        loop {
            let mut parameter = Vec::new();
            self.attribute_lists(&mut parameter)?;
            if self.at_kw("in") || self.at_kw("out") {
                parameter.push(self.bump());
            }
            self.identifier(&mut parameter)?;
            children.push(node(SyntaxKind::TypeParameter, parameter).into());
            if !self.eat(&mut children, ",") {
                break;
            }
        }
        self.expect(&mut children, ">")?;
        Ok(node(SyntaxKind::TypeParameterList, children))
    }

    fn constraint_clauses(&mut self, children: &mut Vec<GreenElement>) -> PResult<()> {
        while self.at_kw("where") {
            let mut clause = vec![self.bump()];
            self.identifier(&mut clause)?;
            self.expect(&mut clause, ":")?;
            loop {
                if self.at_kw("class") {
                    clause.push(self.bump());
                    self.eat(&mut clause, "?");
                } else if self.at_kw("struct") || self.at_kw("default") {
                    clause.push(self.bump());
                } else if self.at_kw("new") {
                    clause.push(self.bump());
                    self.expect(&mut clause, "(")?;
                    self.expect(&mut clause, ")")?;
                } else {
                    clause.push(self.parse_type()?.into());
                }
                if !self.eat(&mut clause, ",") {
                    break;
                }
            }
            children.push(node(SyntaxKind::ConstraintClause, clause).into());
        }
        Ok(())
    }

    fn parameter_list(&mut self) -> PResult<GreenNode> {
        self.parameter_list_delimited("(", ")", SyntaxKind::ParameterList)
    }

    fn parameter_list_delimited(&mut self, open: &str, close: &str, kind: SyntaxKind) -> PResult<GreenNode> {
        let mut children = Vec::new();
        self.expect(&mut children, open)?;
        if !self.at(close) {
            loop {
                children.push(self.parameter()?.into());
                if !self.eat(&mut children, ",") {
                    break;
                }
            }
        }
        self.expect(&mut children, close)?;
        Ok(node(kind, children))
    }

    fn parameter(&mut self) -> PResult<GreenNode> {
        let mut children = Vec::new();
        self.attribute_lists(&mut children)?;
        self.modifiers(&mut children, PARAMETER_MODIFIERS);
        children.push(self.parse_type()?.into());
        self.identifier(&mut children)?;
        if self.at("=") {
            children.push(self.equals_value()?.into());
        }
        Ok(node(SyntaxKind::Parameter, children))
    }

    // ---- types ----

    fn parse_type(&mut self) -> PResult<GreenNode> {
        let mut ty = if self.at("(") {
            self.tuple_type()?
        } else if self.current().kind() == SyntaxKind::Ident && is_predefined_type(self.current().text()) {
            node(SyntaxKind::PredefinedType, vec![self.bump()])
        } else {
            self.name()?
        };
        loop {
            if self.at("?") {
                ty = node(SyntaxKind::NullableType, vec![ty.into(), self.bump()]);
            } else if self.at("*") {
                ty = node(SyntaxKind::PointerType, vec![ty.into(), self.bump()]);
            } else if self.at("[") && (self.nth_at(1, "]") || self.nth_at(1, ",")) {
                let mut children = vec![ty.into()];
                while self.at("[") && (self.nth_at(1, "]") || self.nth_at(1, ",")) {
                    let mut rank = vec![self.bump()];
                    while self.eat(&mut rank, ",") {}
                    self.expect(&mut rank, "]")?;
                    children.push(node(SyntaxKind::ArrayRankSpecifier, rank).into());
                }
                ty = node(SyntaxKind::ArrayType, children);
            } else {
                return Ok(ty);
            }
        }
    }

    fn tuple_type(&mut self) -> PResult<GreenNode> {
        let mut children = Vec::new();
        self.expect(&mut children, "(")?;
        loop {
            let mut element = vec![self.parse_type()?.into()];
            if self.at_identifier() {
                element.push(self.bump());
            }
            children.push(node(SyntaxKind::TupleElement, element).into());
            if !self.eat(&mut children, ",") {
                break;
            }
        }
        self.expect(&mut children, ")")?;
        Ok(node(SyntaxKind::TupleType, children))
    }

    /// Possibly qualified, possibly generic name in a type context.
    fn name(&mut self) -> PResult<GreenNode> {
        let mut name = self.simple_type_name()?;
        while (self.at(".") || self.at("::")) && self.nth_is_identifier(1) {
            let separator = self.bump();
            let right = self.simple_type_name()?;
            name = node(SyntaxKind::QualifiedName, vec![name.into(), separator, right.into()]);
        }
        Ok(name)
    }

    fn simple_type_name(&mut self) -> PResult<GreenNode> {
        let mut children = Vec::new();
        self.identifier(&mut children)?;
        if self.at("<") {
            children.push(self.type_argument_list()?.into());
            return Ok(node(SyntaxKind::GenericName, children));
        }
        Ok(node(SyntaxKind::IdentifierName, children))
    }

    fn type_argument_list(&mut self) -> PResult<GreenNode> {
        let mut children = Vec::new();
        self.expect(&mut children, "<")?;
        loop {
            children.push(self.parse_type()?.into());
            if !self.eat(&mut children, ",") {
                break;
            }
        }
        self.expect(&mut children, ">")?;
        Ok(node(SyntaxKind::TypeArgumentList, children))
    }

    // ---- statements ----

    fn statement(&mut self) -> PResult<GreenNode> {
        let start = self.pos;
        match self.statement_inner() {
            Ok(statement) => Ok(statement),
            Err(error) => {
                self.pos = start;
                self.opaque(Vec::new(), SyntaxKind::UnknownStatement, error)
            }
        }
    }

    fn statement_inner(&mut self) -> PResult<GreenNode> {
        if self.at("{") {
            return self.block();
        }
        if self.at(";") {
            return Ok(node(SyntaxKind::EmptyStatement, vec![self.bump()]));
        }
        let keyword = self.current().clone();
        if keyword.kind() == SyntaxKind::Ident {
            match keyword.text() {
                "return" => return self.jump(SyntaxKind::ReturnStatement),
                "throw" => return self.jump(SyntaxKind::ThrowStatement),
                "break" => return self.keyword_statement(SyntaxKind::BreakStatement),
                "continue" => return self.keyword_statement(SyntaxKind::ContinueStatement),
                "if" => return self.if_statement(),
                "while" => return self.while_statement(),
                "do" => return self.do_statement(),
                "for" => return self.for_statement(),
                "foreach" => return self.foreach_statement(),
                "try" => return self.try_statement(),
                "lock" => return self.parenthesized_statement(SyntaxKind::LockStatement),
                "switch" => return self.switch_statement(),
                "using" => return self.using_statement(),
                "yield" if self.nth(1).is_keyword("return") || self.nth(1).is_keyword("break") => {
                    let mut children = vec![self.bump()];
                    if self.at_kw("return") {
                        children.push(self.bump());
                        children.push(self.expression()?.into());
                    } else {
                        children.push(self.bump());
                    }
                    self.expect(&mut children, ";")?;
                    return Ok(node(SyntaxKind::YieldStatement, children));
                }
                _ => {}
            }
        }
        if let Some(mut declaration) = self.speculate(|p| p.local_declaration(Vec::new())) {
            self.expect(&mut declaration, ";")?;
            return Ok(node(SyntaxKind::LocalDeclaration, declaration));
        }
        let mut children = vec![self.expression()?.into()];
        self.expect(&mut children, ";")?;
        Ok(node(SyntaxKind::ExpressionStatement, children))
    }

    fn block(&mut self) -> PResult<GreenNode> {
        let mut children = Vec::new();
        self.expect(&mut children, "{")?;
        while !self.at("}") {
            if self.at_eof() {
                return Err(self.error("expected '}'"));
            }
            children.push(self.statement()?.into());
        }
        children.push(self.bump());
        Ok(node(SyntaxKind::Block, children))
    }

    fn jump(&mut self, kind: SyntaxKind) -> PResult<GreenNode> {
        let mut children = vec![self.bump()];
        if !self.at(";") {
            children.push(self.expression()?.into());
        }
        self.expect(&mut children, ";")?;
        Ok(node(kind, children))
    }

    fn keyword_statement(&mut self, kind: SyntaxKind) -> PResult<GreenNode> {
        let mut children = vec![self.bump()];
        self.expect(&mut children, ";")?;
        Ok(node(kind, children))
    }

    fn condition(&mut self, children: &mut Vec<GreenElement>) -> PResult<()> {
        self.expect(children, "(")?;
        children.push(self.expression()?.into());
        self.expect(children, ")")
    }

    fn if_statement(&mut self) -> PResult<GreenNode> {
        let mut children = vec![self.bump()];
        self.condition(&mut children)?;
        children.push(self.statement()?.into());
        if self.at_kw("else") {
            let else_clause = vec![self.bump(), self.statement()?.into()];
            children.push(node(SyntaxKind::ElseClause, else_clause).into());
        }
        Ok(node(SyntaxKind::IfStatement, children))
    }

    fn while_statement(&mut self) -> PResult<GreenNode> {
        self.parenthesized_statement(SyntaxKind::WhileStatement)
    }

    fn parenthesized_statement(&mut self, kind: SyntaxKind) -> PResult<GreenNode> {
        let mut children = vec![self.bump()];
        self.condition(&mut children)?;
        children.push(self.statement()?.into());
        Ok(node(kind, children))
    }

    fn do_statement(&mut self) -> PResult<GreenNode> {
        let mut children = vec![self.bump()];
        children.push(self.statement()?.into());
        self.expect_keyword(&mut children, "while")?;
        self.condition(&mut children)?;
        self.expect(&mut children, ";")?;
        Ok(node(SyntaxKind::DoStatement, children))
    }

    fn for_statement(&mut self) -> PResult<GreenNode> {
        let mut children = vec![self.bump()];
        self.expect(&mut children, "(")?;
        if !self.at(";") {
            if let Some(declaration) = self.speculate(|p| p.local_declaration(Vec::new())) {
                children.push(node(SyntaxKind::LocalDeclaration, declaration).into());
            } else {
                self.expression_list(&mut children)?;
            }
        }
        self.expect(&mut children, ";")?;
        if !self.at(";") {
            children.push(self.expression()?.into());
        }
        self.expect(&mut children, ";")?;
        if !self.at(")") {
            self.expression_list(&mut children)?;
        }
        self.expect(&mut children, ")")?;
        children.push(self.statement()?.into());
        Ok(node(SyntaxKind::ForStatement, children))
    }

    fn expression_list(&mut self, children: &mut Vec<GreenElement>) -> PResult<()> {
        loop {
            children.push(self.expression()?.into());
            if !self.eat(children, ",") {
                return Ok(());
            }
        }
    }

    fn foreach_statement(&mut self) -> PResult<GreenNode> {
        let mut children = vec![self.bump()];
        self.expect(&mut children, "(")?;
        children.push(self.parse_type()?.into());
        self.identifier(&mut children)?;
        self.expect_keyword(&mut children, "in")?;
        children.push(self.expression()?.into());
        self.expect(&mut children, ")")?;
        children.push(self.statement()?.into());
        Ok(node(SyntaxKind::ForEachStatement, children))
    }

    fn try_statement(&mut self) -> PResult<GreenNode> {
        let mut children = vec![self.bump()];
        children.push(self.block()?.into());
        while self.at_kw("catch") {
            let mut clause = vec![self.bump()];
            if self.eat(&mut clause, "(") {
                clause.push(self.parse_type()?.into());
                if self.at_identifier() {
                    clause.push(self.bump());
                }
                self.expect(&mut clause, ")")?;
            }
            if self.at_kw("when") {
                clause.push(self.bump());
                self.condition(&mut clause)?;
            }
            clause.push(self.block()?.into());
            children.push(node(SyntaxKind::CatchClause, clause).into());
        }
        if self.at_kw("finally") {
            let clause = vec![self.bump(), self.block()?.into()];
            children.push(node(SyntaxKind::FinallyClause, clause).into());
        }
        Ok(node(SyntaxKind::TryStatement, children))
    }

    fn switch_statement(&mut self) -> PResult<GreenNode> {
        let mut children = vec![self.bump()];
        self.condition(&mut children)?;
        if !self.at("{") {
            return Err(self.error("expected '{'"));
        }
        self.balanced(&mut children)?;
        Ok(node(SyntaxKind::SwitchStatement, children))
    }

    fn using_statement(&mut self) -> PResult<GreenNode> {
        if !self.nth_at(1, "(") {
            let using = vec![self.bump()];
            let mut declaration = self.local_declaration(using)?;
            self.expect(&mut declaration, ";")?;
            return Ok(node(SyntaxKind::LocalDeclaration, declaration));
        }
        let mut children = vec![self.bump(), self.bump()];
        if let Some(declaration) = self.speculate(|p| p.local_declaration(Vec::new())) {
            children.push(node(SyntaxKind::LocalDeclaration, declaration).into());
        } else {
            children.push(self.expression()?.into());
        }
        self.expect(&mut children, ")")?;
        children.push(self.statement()?.into());
        Ok(node(SyntaxKind::UsingStatement, children))
    }

    /// Declaration children without the terminating `;`.
    fn local_declaration(&mut self, mut children: Vec<GreenElement>) -> PResult<Vec<GreenElement>> {
        self.modifiers(&mut children, &["const", "ref", "readonly", "scoped"]);
        let ty = self.parse_type()?;
        let awaited = ty.first_token().is_some_and(|t| t.is_keyword("await"));
        let declares = !awaited
            && self.at_identifier()
            && (self.nth_at(1, "=") || self.nth_at(1, ";") || self.nth_at(1, ","));
        if !declares {
            return Err(self.error("expected local declaration"));
        }
        children.push(ty.into());
        loop {
            children.push(self.variable_declarator()?.into());
            if !self.eat(&mut children, ",") {
                return Ok(children);
            }
        }
    }

    // ---- expressions ----

    fn expression(&mut self) -> PResult<GreenNode> {
        if let Some(lambda) = self.lambda()? {
            return Ok(lambda);
        }
        let left = self.conditional()?;
        let operator_len = if ASSIGNMENT_OPERATORS.iter().any(|op| self.at(op)) {
            1
        } else if self.at(">") && self.nth_at(1, ">") && self.nth_at(2, "=") && self.adjacent(0) && self.adjacent(1) {
            3
        } else {
            0
        };
        if operator_len == 0 {
            return Ok(left);
        }
        let mut children = vec![left.into()];
        for _ in 0..operator_len {
            children.push(self.bump());
        }
        if self.at("{") {
            children.push(self.initializer()?.into());
        } else {
            children.push(self.expression()?.into());
        }
        Ok(node(SyntaxKind::Assignment, children))
    }

    fn lambda(&mut self) -> PResult<Option<GreenNode>> {
        let mut lookahead = 0;
        if self.at_kw("async") || self.at_kw("static") {
            lookahead = 1;
        }
        let is_lambda = if self.nth_is_identifier(lookahead) && self.nth_at(lookahead + 1, "=>") {
            true
        } else if self.nth_at(lookahead, "(") {
            matches!(self.matching_paren(lookahead), Some(close) if self.nth_at(close + 1, "=>"))
        } else {
            false
        };
        if !is_lambda {
            return Ok(None);
        }
        let mut children = Vec::new();
        for _ in 0..lookahead {
            children.push(self.bump());
        }
        if self.at("(") {
            let mut list = vec![self.bump()];
            if !self.at(")") {
                loop {
                    let mut parameter = Vec::new();
                    self.modifiers(&mut parameter, &["ref", "out", "in", "scoped"]);
                    if self.at_identifier() && (self.nth_at(1, ",") || self.nth_at(1, ")")) {
                        parameter.push(self.bump());
                    } else {
                        parameter.push(self.parse_type()?.into());
                        self.identifier(&mut parameter)?;
                    }
                    list.push(node(SyntaxKind::Parameter, parameter).into());
                    if !self.eat(&mut list, ",") {
                        break;
                    }
                }
            }
            self.expect(&mut list, ")")?;
            children.push(node(SyntaxKind::ParameterList, list).into());
        } else {
            children.push(node(SyntaxKind::Parameter, vec![self.bump()]).into());
        }
        self.expect(&mut children, "=>")?;
        if self.at("{") {
            children.push(self.block()?.into());
        } else {
            children.push(self.expression()?.into());
        }
        Ok(Some(node(SyntaxKind::Lambda, children)))
    }

    /// Lookahead index of the `)` matching the `(` at lookahead `open`.
    fn matching_paren(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut index = open;
        loop {
            let token = self.nth(index);
            if token.kind() == SyntaxKind::Eof {
                return None;
            }
            if is_open(token) {
                depth += 1;
            } else if is_close(token) {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return token.is_punct(")").then_some(index);
                }
            }
            index += 1;
        }
    }

    fn conditional(&mut self) -> PResult<GreenNode> {
        let condition = self.null_coalescing()?;
        if !self.at("?") {
            return Ok(condition);
        }
        let mut children = vec![condition.into(), self.bump()];
        children.push(self.expression()?.into());
        self.expect(&mut children, ":")?;
        children.push(self.expression()?.into());
        Ok(node(SyntaxKind::Conditional, children))
    }

    fn null_coalescing(&mut self) -> PResult<GreenNode> {
        let left = self.binary(0)?;
        if !self.at("??") {
            return Ok(left);
        }
        let children = vec![left.into(), self.bump(), self.null_coalescing()?.into()];
        Ok(node(SyntaxKind::Binary, children))
    }

    fn binary(&mut self, level: usize) -> PResult<GreenNode> {
        if level == BINARY_LEVELS.len() {
            return self.unary();
        }
        let mut left = self.binary(level + 1)?;
        loop {
            if level == RELATIONAL_LEVEL {
                if self.at_kw("is") {
                    let mut children = vec![left.into(), self.bump()];
                    self.pattern(&mut children)?;
                    left = node(SyntaxKind::IsPattern, children);
                    continue;
                }
                if self.at_kw("as") {
                    let children = vec![left.into(), self.bump(), self.parse_type()?.into()];
                    left = node(SyntaxKind::AsExpression, children);
                    continue;
                }
            }
            let operator_len = self.binary_operator(level);
            if operator_len == 0 {
                return Ok(left);
            }
            let mut children = vec![left.into()];
            for _ in 0..operator_len {
                children.push(self.bump());
            }
            children.push(self.binary(level + 1)?.into());
            left = node(SyntaxKind::Binary, children);
        }
    }

    fn binary_operator(&self, level: usize) -> usize {
        match level {
            RELATIONAL_LEVEL => {
                if self.at("<") || self.at("<=") {
                    1
                } else if self.at(">") && self.nth_at(1, "=") && self.adjacent(0) {
                    2
                } else if self.at(">") && !(self.nth_at(1, ">") && self.adjacent(0)) {
                    1
                } else {
                    0
                }
            }
            SHIFT_LEVEL => {
                if self.at("<<") {
                    1
                } else if self.at(">")
                    && self.nth_at(1, ">")
                    && self.adjacent(0)
                    && !(self.nth_at(2, "=") && self.adjacent(1))
                {
                    2
                } else {
                    0
                }
            }
            _ => usize::from(BINARY_LEVELS[level].iter().any(|op| self.at(op))),
        }
    }

    fn pattern(&mut self, children: &mut Vec<GreenElement>) -> PResult<()> {
        self.primary_pattern(children)?;
        while self.at_kw("and") || self.at_kw("or") {
            children.push(self.bump());
            self.primary_pattern(children)?;
        }
        Ok(())
    }

    fn primary_pattern(&mut self, children: &mut Vec<GreenElement>) -> PResult<()> {
        if self.at_kw("not") {
            children.push(self.bump());
            return self.primary_pattern(children);
        }
        if self.at("(") || self.at("{") || self.at("[") {
            return self.balanced(children);
        }
        let token = self.current().clone();
        let literal = matches!(
            token.kind(),
            SyntaxKind::NumericLiteral | SyntaxKind::StringLiteral | SyntaxKind::CharLiteral
        ) || token.is_keyword("null")
            || token.is_keyword("true")
            || token.is_keyword("false");
        if literal {
            children.push(node(SyntaxKind::Literal, vec![self.bump()]).into());
            return Ok(());
        }
        if ["<", "<=", ">", "-"].iter().any(|op| self.at(op)) {
            children.push(self.bump());
            if self.at("=") {
                children.push(self.bump());
            }
            children.push(self.unary()?.into());
            return Ok(());
        }
        if self.at_kw("var") {
            children.push(self.bump());
            return self.identifier(children);
        }
        children.push(self.parse_type()?.into());
        if self.at("{") {
            self.balanced(children)?;
        }
        let designation = self.at_identifier()
            && !["and", "or", "when"].iter().any(|k| self.at_kw(k));
        if designation {
            children.push(self.bump());
        }
        Ok(())
    }

    fn unary(&mut self) -> PResult<GreenNode> {
        let prefix = PREFIX_OPERATORS.iter().any(|op| self.at(op))
            || ((self.at_kw("await") || self.at_kw("ref")) && !self.nth(1).is_punct(";"));
        if prefix {
            let children = vec![self.bump(), self.unary()?.into()];
            return Ok(node(SyntaxKind::Unary, children));
        }
        if self.at("(") {
            let start = self.pos;
            if let Some(cast) = self.cast()? {
                return Ok(cast);
            }
            self.pos = start;
        }
        self.primary()
    }

    fn cast(&mut self) -> PResult<Option<GreenNode>> {
        let open = self.bump();
        let Some(ty) = self.speculate(Self::parse_type) else {
            return Ok(None);
        };
        if !self.at(")") {
            return Ok(None);
        }
        let close = self.bump();
        if !self.cast_follows(&ty) {
            return Ok(None);
        }
        let operand = self.unary()?;
        Ok(Some(node(SyntaxKind::Cast, vec![open, ty.into(), close, operand.into()])))
    }

    fn cast_follows(&self, ty: &GreenNode) -> bool {
        let next = self.current();
        let predefined = ty
            .first_token()
            .is_some_and(|token| is_predefined_type(token.text()));
        match next.kind() {
            SyntaxKind::NumericLiteral | SyntaxKind::StringLiteral | SyntaxKind::CharLiteral => true,
            SyntaxKind::Ident => {
                !matches!(next.text(), "is" | "as" | "switch" | "with" | "and" | "or")
            }
            SyntaxKind::Punct => {
                ["(", "!", "~"].iter().any(|p| next.is_punct(p))
                    || (predefined && ["-", "+", "++", "--"].iter().any(|p| next.is_punct(p)))
            }
            _ => false,
        }
    }

    fn primary(&mut self) -> PResult<GreenNode> {
        let token = self.current().clone();
        let mut expression = match token.kind() {
            SyntaxKind::NumericLiteral | SyntaxKind::StringLiteral | SyntaxKind::CharLiteral => {
                node(SyntaxKind::Literal, vec![self.bump()])
            }
            SyntaxKind::Ident => match token.text() {
                "true" | "false" | "null" => node(SyntaxKind::Literal, vec![self.bump()]),
                "this" => node(SyntaxKind::ThisExpression, vec![self.bump()]),
                "base" => node(SyntaxKind::BaseExpression, vec![self.bump()]),
                "new" => self.creation()?,
                "typeof" | "sizeof" | "checked" | "unchecked" if self.nth_at(1, "(") => {
                    let mut children = vec![self.bump()];
                    self.balanced(&mut children)?;
                    node(SyntaxKind::TypeOf, children)
                }
                "default" => {
                    let mut children = vec![self.bump()];
                    if self.at("(") {
                        self.balanced(&mut children)?;
                    }
                    node(SyntaxKind::DefaultExpression, children)
                }
                "throw" => {
                    let children = vec![self.bump(), self.expression()?.into()];
                    node(SyntaxKind::ThrowExpression, children)
                }
                text if is_predefined_type(text) => node(SyntaxKind::PredefinedType, vec![self.bump()]),
                text if !is_reserved_keyword(text) => self.simple_name_expression()?,
                _ => return Err(self.error("expected expression")),
            },
            SyntaxKind::Punct if token.is_punct("(") => self.parenthesized()?,
            _ => return Err(self.error("expected expression")),
        };
        loop {
            if self.at(".") || self.at("?.") || self.at("->") {
                let operator = self.bump();
                let name = self.simple_name_expression()?;
                expression = node(SyntaxKind::MemberAccess, vec![expression.into(), operator, name.into()]);
            } else if self.at("(") {
                let arguments = self.argument_list()?;
                expression = node(SyntaxKind::Invocation, vec![expression.into(), arguments.into()]);
            } else if self.at("[") {
                let arguments = self.bracketed_argument_list()?;
                expression = node(SyntaxKind::ElementAccess, vec![expression.into(), arguments.into()]);
            } else if self.at("++") || self.at("--") || self.at("!") {
                expression = node(SyntaxKind::Postfix, vec![expression.into(), self.bump()]);
            } else if self.at_kw("switch") && self.nth_at(1, "{") {
                let mut children = vec![expression.into(), self.bump()];
                self.balanced(&mut children)?;
                expression = node(SyntaxKind::SwitchExpression, children);
            } else {
                return Ok(expression);
            }
        }
    }

    fn simple_name_expression(&mut self) -> PResult<GreenNode> {
        let mut children = Vec::new();
        self.identifier(&mut children)?;
        if self.at("<") {
            let arguments = self.speculate(|p| {
                let list = p.type_argument_list()?;
                if p.at_eof() || GENERIC_FOLLOW.iter().any(|follow| p.at(follow)) {
                    Ok(list)
                } else {
                    Err(p.error("not a type argument list"))
                }
            });
            if let Some(list) = arguments {
                children.push(list.into());
                return Ok(node(SyntaxKind::GenericName, children));
            }
        }
        Ok(node(SyntaxKind::IdentifierName, children))
    }

    fn parenthesized(&mut self) -> PResult<GreenNode> {
        let mut children = vec![self.bump()];
        children.push(self.expression()?.into());
        if self.at(",") {
            while self.eat(&mut children, ",") {
                children.push(self.expression()?.into());
            }
            self.expect(&mut children, ")")?;
            return Ok(node(SyntaxKind::TupleExpression, children));
        }
        self.expect(&mut children, ")")?;
        Ok(node(SyntaxKind::Parenthesized, children))
    }

    fn creation(&mut self) -> PResult<GreenNode> {
        let mut children = vec![self.bump()];
        if self.at("[") {
            self.balanced(&mut children)?;
            children.push(self.initializer()?.into());
            return Ok(node(SyntaxKind::ArrayCreation, children));
        }
        if self.at("{") {
            children.push(self.initializer()?.into());
            return Ok(node(SyntaxKind::ObjectCreation, children));
        }
        if self.at("(") {
            children.push(self.argument_list()?.into());
            if self.at("{") {
                children.push(self.initializer()?.into());
            }
            return Ok(node(SyntaxKind::ObjectCreation, children));
        }
        let ty = self.parse_type()?;
        let is_array = ty.kind() == SyntaxKind::ArrayType;
        children.push(ty.into());
        if self.at("[") {
            children.push(self.bracketed_argument_list()?.into());
            while self.at("[") {
                let mut rank = Vec::new();
                self.balanced(&mut rank)?;
                children.push(node(SyntaxKind::ArrayRankSpecifier, rank).into());
            }
            if self.at("{") {
                children.push(self.initializer()?.into());
            }
            return Ok(node(SyntaxKind::ArrayCreation, children));
        }
        if is_array {
            children.push(self.initializer()?.into());
            return Ok(node(SyntaxKind::ArrayCreation, children));
        }
        if self.at("(") {
            children.push(self.argument_list()?.into());
        }
        if self.at("{") {
            children.push(self.initializer()?.into());
        }
        Ok(node(SyntaxKind::ObjectCreation, children))
    }

    fn initializer(&mut self) -> PResult<GreenNode> {
        let mut children = Vec::new();
        self.expect(&mut children, "{")?;
        while !self.at("}") {
            if self.at("{") {
                children.push(self.initializer()?.into());
            } else {
                children.push(self.expression()?.into());
            }
            if !self.eat(&mut children, ",") {
                break;
            }
        }
        self.expect(&mut children, "}")?;
        Ok(node(SyntaxKind::Initializer, children))
    }

    fn argument_list(&mut self) -> PResult<GreenNode> {
        self.arguments("(", ")", SyntaxKind::ArgumentList)
    }

    fn bracketed_argument_list(&mut self) -> PResult<GreenNode> {
        self.arguments("[", "]", SyntaxKind::BracketedArgumentList)
    }

    fn arguments(&mut self, open: &str, close: &str, kind: SyntaxKind) -> PResult<GreenNode> {
        let mut children = Vec::new();
        self.expect(&mut children, open)?;
        if !self.at(close) {
            loop {
                children.push(self.argument()?.into());
                if !self.eat(&mut children, ",") {
                    break;
                }
            }
        }
        self.expect(&mut children, close)?;
        Ok(node(kind, children))
    }

    fn argument(&mut self) -> PResult<GreenNode> {
        let mut children = Vec::new();
        if self.at_identifier() && self.nth_at(1, ":") {
            children.push(self.bump());
            children.push(self.bump());
        }
        let out = self.at_kw("out");
        if out || self.at_kw("ref") || self.at_kw("in") {
            children.push(self.bump());
        }
        if out {
            let declaration = self.speculate(|p| {
                let ty = p.parse_type()?;
                if p.at_identifier() && (p.nth_at(1, ",") || p.nth_at(1, ")")) {
                    Ok(node(SyntaxKind::DeclarationExpression, vec![ty.into(), p.bump()]))
                } else {
                    Err(p.error("not a declaration"))
                }
            });
            if let Some(declaration) = declaration {
                children.push(declaration.into());
                return Ok(node(SyntaxKind::Argument, children));
            }
        }
        children.push(self.expression()?.into());
        Ok(node(SyntaxKind::Argument, children))
    }
}

fn is_open(token: &GreenToken) -> bool {
    ["(", "[", "{"].iter().any(|p| token.is_punct(p))
}

fn is_close(token: &GreenToken) -> bool {
    [")", "]", "}"].iter().any(|p| token.is_punct(p))
}
