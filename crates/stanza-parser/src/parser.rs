//! Recursive-descent parser over the scanner's token stream.

use crate::ast::*;
use crate::docblock::Docblock;
use crate::scanner::{Token, TokenKind};
use crate::type_string::parse_type_string;
use crate::ParseError;
use stanza_common::Span;
use stanza_types::Union;

pub struct Parser {
    path: String,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(path: &str, tokens: Vec<Token>) -> Self {
        Self {
            path: path.to_string(),
            tokens,
            pos: 0,
        }
    }

    pub fn parse(mut self) -> Result<FileAst, ParseError> {
        let mut declarations = Vec::new();

        loop {
            let docblock = self.take_docblock();
            if self.at_eof() {
                break;
            }

            if self.at_keyword("function") {
                declarations.push(Declaration::Function(self.parse_function(
                    docblock,
                    Visibility::Public,
                    false,
                    false,
                    false,
                )?));
                continue;
            }

            let mut is_final = false;
            let mut is_abstract = false;
            while self.at_keyword("final") || self.at_keyword("abstract") {
                if self.at_keyword("final") {
                    is_final = true;
                } else {
                    is_abstract = true;
                }
                self.bump();
            }

            if self.at_keyword("class") || self.at_keyword("interface") || self.at_keyword("trait")
            {
                declarations.push(Declaration::ClassLike(self.parse_class_like(
                    docblock,
                    is_final,
                    is_abstract,
                )?));
                continue;
            }

            return Err(self.unexpected("declaration"));
        }

        Ok(FileAst {
            path: self.path,
            declarations,
        })
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn parse_class_like(
        &mut self,
        docblock: Option<Docblock>,
        is_final: bool,
        is_abstract: bool,
    ) -> Result<ClassDecl, ParseError> {
        let start = self.current_span();
        let kind = if self.at_keyword("interface") {
            ClassLikeKind::Interface
        } else if self.at_keyword("trait") {
            ClassLikeKind::Trait
        } else {
            ClassLikeKind::Class
        };
        self.bump();

        let name = self.expect_ident()?;
        let parent = if self.at_keyword("extends") {
            self.bump();
            Some(self.expect_ident()?)
        } else {
            None
        };

        self.expect(TokenKind::OpenBrace)?;

        let mut uses = Vec::new();
        let mut properties = Vec::new();
        let mut methods = Vec::new();

        while !self.at(TokenKind::CloseBrace) && !self.at_eof() {
            let member_doc = self.take_docblock();

            if self.at_keyword("use") {
                self.bump();
                uses.push(self.expect_ident()?);
                while self.at(TokenKind::Comma) {
                    self.bump();
                    uses.push(self.expect_ident()?);
                }
                self.expect(TokenKind::Semicolon)?;
                continue;
            }

            let mut visibility = Visibility::Public;
            let mut member_static = false;
            let mut member_final = false;
            let mut member_abstract = false;
            loop {
                if self.at_keyword("public") {
                    visibility = Visibility::Public;
                } else if self.at_keyword("protected") {
                    visibility = Visibility::Protected;
                } else if self.at_keyword("private") {
                    visibility = Visibility::Private;
                } else if self.at_keyword("static") {
                    member_static = true;
                } else if self.at_keyword("final") {
                    member_final = true;
                } else if self.at_keyword("abstract") {
                    member_abstract = true;
                } else {
                    break;
                }
                self.bump();
            }

            if self.at_keyword("function") {
                methods.push(self.parse_function(
                    member_doc,
                    visibility,
                    member_static,
                    member_final,
                    member_abstract || kind == ClassLikeKind::Interface,
                )?);
                continue;
            }

            if let TokenKind::Variable(prop_name) = self.current_kind().clone() {
                let span = self.current_span();
                self.bump();
                self.expect(TokenKind::Semicolon)?;
                properties.push(PropertyDecl {
                    name: prop_name,
                    visibility,
                    is_static: member_static,
                    ty: member_doc.as_ref().and_then(|d| d.var_type.clone()),
                    span,
                });
                continue;
            }

            return Err(self.unexpected("class member"));
        }

        let end = self.current_span();
        self.expect(TokenKind::CloseBrace)?;

        Ok(ClassDecl {
            name,
            kind,
            parent,
            is_final,
            is_abstract,
            uses,
            properties,
            methods,
            docblock,
            span: start.to(end),
        })
    }

    fn parse_function(
        &mut self,
        docblock: Option<Docblock>,
        visibility: Visibility,
        is_static: bool,
        is_final: bool,
        is_abstract: bool,
    ) -> Result<FunctionDecl, ParseError> {
        let start = self.current_span();
        self.bump(); // `function`

        let name_span = self.current_span();
        let name = self.expect_ident()?;

        let (params, variadic) = self.parse_params()?;

        let (return_type, return_type_span) = if self.at(TokenKind::Colon) {
            self.bump();
            let (ty, span) = self.parse_type_annotation()?;
            (Some(ty), Some(span))
        } else {
            (None, None)
        };

        let body = if self.at(TokenKind::Semicolon) {
            self.bump();
            None
        } else {
            Some(self.parse_block()?)
        };

        let end_span = self.previous_span();

        Ok(FunctionDecl {
            name,
            params,
            return_type,
            return_type_span,
            body,
            docblock,
            visibility,
            is_abstract,
            is_final,
            is_static,
            variadic,
            span: start.to(end_span),
            name_span,
        })
    }

    fn parse_params(&mut self) -> Result<(Vec<Param>, bool), ParseError> {
        self.expect(TokenKind::OpenParen)?;
        let mut params = Vec::new();
        let mut variadic = false;

        while !self.at(TokenKind::CloseParen) && !self.at_eof() {
            let start = self.current_span();
            let ty = if matches!(self.current_kind(), TokenKind::Ident(_))
                || self.at(TokenKind::Question)
            {
                Some(self.parse_type_annotation()?.0)
            } else {
                None
            };

            let param_variadic = if self.at(TokenKind::Ellipsis) {
                self.bump();
                variadic = true;
                true
            } else {
                false
            };

            let name = match self.current_kind().clone() {
                TokenKind::Variable(name) => {
                    self.bump();
                    name
                }
                _ => return Err(self.unexpected("parameter variable")),
            };

            // Default values are accepted and discarded.
            if self.at(TokenKind::Assign) {
                self.bump();
                self.parse_expression()?;
            }

            params.push(Param {
                name,
                ty,
                variadic: param_variadic,
                span: start.to(self.previous_span()),
            });

            if self.at(TokenKind::Comma) {
                self.bump();
            }
        }

        self.expect(TokenKind::CloseParen)?;
        Ok((params, variadic))
    }

    fn parse_type_annotation(&mut self) -> Result<(Union, Span), ParseError> {
        let start = self.current_span();
        let mut text = String::new();

        if self.at(TokenKind::Question) {
            self.bump();
            text.push('?');
        }

        text.push_str(&self.expect_ident()?);

        while self.at(TokenKind::Pipe) {
            if let TokenKind::Ident(_) = self.peek_kind(1) {
                self.bump();
                text.push('|');
                text.push_str(&self.expect_ident()?);
            } else {
                break;
            }
        }

        let span = start.to(self.previous_span());
        parse_type_string(&text, false)
            .ok_or_else(|| ParseError::new("empty type annotation", span))
            .map(|ty| (ty, span))
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(TokenKind::OpenBrace)?;
        let mut statements = Vec::new();
        while !self.at(TokenKind::CloseBrace) && !self.at_eof() {
            statements.push(self.parse_statement()?);
        }
        self.expect(TokenKind::CloseBrace)?;
        Ok(statements)
    }

    fn parse_stmt_or_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        if self.at(TokenKind::OpenBrace) {
            self.parse_block()
        } else {
            Ok(vec![self.parse_statement()?])
        }
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        self.take_docblock();
        let start = self.current_span();

        if self.at_keyword("return") {
            self.bump();
            let expr = if self.at(TokenKind::Semicolon) {
                None
            } else {
                Some(self.parse_expression()?)
            };
            let end = self.current_span();
            self.expect(TokenKind::Semicolon)?;
            return Ok(Stmt::Return {
                expr,
                span: start.to(end),
            });
        }

        if self.at_keyword("throw") {
            self.bump();
            let expr = self.parse_expression()?;
            let end = self.current_span();
            self.expect(TokenKind::Semicolon)?;
            return Ok(Stmt::Throw {
                expr,
                span: start.to(end),
            });
        }

        if self.at_keyword("if") {
            return self.parse_if(start);
        }

        if self.at_keyword("while") {
            self.bump();
            self.expect(TokenKind::OpenParen)?;
            let cond = self.parse_expression()?;
            self.expect(TokenKind::CloseParen)?;
            let body = self.parse_stmt_or_block()?;
            return Ok(Stmt::While {
                cond,
                body,
                span: start.to(self.previous_span()),
            });
        }

        if self.at_keyword("do") {
            self.bump();
            let body = self.parse_stmt_or_block()?;
            if !self.at_keyword("while") {
                return Err(self.unexpected("'while' after do body"));
            }
            self.bump();
            self.expect(TokenKind::OpenParen)?;
            let cond = self.parse_expression()?;
            self.expect(TokenKind::CloseParen)?;
            self.expect(TokenKind::Semicolon)?;
            return Ok(Stmt::DoWhile {
                body,
                cond,
                span: start.to(self.previous_span()),
            });
        }

        if self.at_keyword("switch") {
            return self.parse_switch(start);
        }

        if self.at_keyword("try") {
            return self.parse_try(start);
        }

        if self.at_keyword("break") {
            self.bump();
            self.expect(TokenKind::Semicolon)?;
            return Ok(Stmt::Break { span: start });
        }

        if self.at_keyword("continue") {
            self.bump();
            self.expect(TokenKind::Semicolon)?;
            return Ok(Stmt::Continue { span: start });
        }

        let expr = self.parse_expression()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Expression(expr))
    }

    fn parse_if(&mut self, start: Span) -> Result<Stmt, ParseError> {
        self.bump(); // `if`
        self.expect(TokenKind::OpenParen)?;
        let cond = self.parse_expression()?;
        self.expect(TokenKind::CloseParen)?;
        let then = self.parse_stmt_or_block()?;

        let mut elseifs = Vec::new();
        let mut r#else = None;

        loop {
            if self.at_keyword("elseif") {
                self.bump();
                self.expect(TokenKind::OpenParen)?;
                let elseif_cond = self.parse_expression()?;
                self.expect(TokenKind::CloseParen)?;
                elseifs.push((elseif_cond, self.parse_stmt_or_block()?));
            } else if self.at_keyword("else") {
                self.bump();
                if self.at_keyword("if") {
                    self.bump();
                    self.expect(TokenKind::OpenParen)?;
                    let elseif_cond = self.parse_expression()?;
                    self.expect(TokenKind::CloseParen)?;
                    elseifs.push((elseif_cond, self.parse_stmt_or_block()?));
                } else {
                    r#else = Some(self.parse_stmt_or_block()?);
                    break;
                }
            } else {
                break;
            }
        }

        Ok(Stmt::If {
            cond,
            then,
            elseifs,
            r#else,
            span: start.to(self.previous_span()),
        })
    }

    fn parse_switch(&mut self, start: Span) -> Result<Stmt, ParseError> {
        self.bump(); // `switch`
        self.expect(TokenKind::OpenParen)?;
        let subject = self.parse_expression()?;
        self.expect(TokenKind::CloseParen)?;
        self.expect(TokenKind::OpenBrace)?;

        let mut cases = Vec::new();
        while !self.at(TokenKind::CloseBrace) && !self.at_eof() {
            let case_start = self.current_span();
            let test = if self.at_keyword("case") {
                self.bump();
                Some(self.parse_expression()?)
            } else if self.at_keyword("default") {
                self.bump();
                None
            } else {
                return Err(self.unexpected("'case' or 'default'"));
            };
            self.expect(TokenKind::Colon)?;

            let mut body = Vec::new();
            while !self.at_keyword("case")
                && !self.at_keyword("default")
                && !self.at(TokenKind::CloseBrace)
                && !self.at_eof()
            {
                body.push(self.parse_statement()?);
            }

            cases.push(SwitchCase {
                test,
                body,
                span: case_start.to(self.previous_span()),
            });
        }

        self.expect(TokenKind::CloseBrace)?;
        Ok(Stmt::Switch {
            subject,
            cases,
            span: start.to(self.previous_span()),
        })
    }

    fn parse_try(&mut self, start: Span) -> Result<Stmt, ParseError> {
        self.bump(); // `try`
        let body = self.parse_block()?;

        let mut catches = Vec::new();
        while self.at_keyword("catch") {
            let catch_start = self.current_span();
            self.bump();
            self.expect(TokenKind::OpenParen)?;
            let class = self.expect_ident()?;
            let var = match self.current_kind().clone() {
                TokenKind::Variable(name) => {
                    self.bump();
                    Some(name)
                }
                _ => None,
            };
            self.expect(TokenKind::CloseParen)?;
            let catch_body = self.parse_block()?;
            catches.push(CatchClause {
                class,
                var,
                body: catch_body,
                span: catch_start.to(self.previous_span()),
            });
        }

        let finally = if self.at_keyword("finally") {
            self.bump();
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Stmt::Try {
            body,
            catches,
            finally,
            span: start.to(self.previous_span()),
        })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        if self.at_keyword("yield") {
            let start = self.current_span();
            self.bump();
            let value = if self.at(TokenKind::Semicolon)
                || self.at(TokenKind::CloseParen)
                || self.at_eof()
            {
                None
            } else {
                Some(Box::new(self.parse_expression()?))
            };
            let end = value.as_ref().map(|v| v.span()).unwrap_or(start);
            return Ok(Expr::Yield {
                value,
                span: start.to(end),
            });
        }

        // Assignment: lowest precedence, right-associative. The target is
        // a variable or a property fetch.
        let expr = self.parse_ternary()?;
        if self.at(TokenKind::Assign)
            && matches!(expr, Expr::Variable(..) | Expr::PropertyFetch { .. })
        {
            self.bump();
            let value = self.parse_expression()?;
            let span = expr.span().to(value.span());
            return Ok(Expr::Assign {
                target: Box::new(expr),
                value: Box::new(value),
                span,
            });
        }

        Ok(expr)
    }

    fn parse_ternary(&mut self) -> Result<Expr, ParseError> {
        let cond = self.parse_binary(0)?;
        if !self.at(TokenKind::Question) {
            return Ok(cond);
        }
        self.bump();

        let then = if self.at(TokenKind::Colon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect(TokenKind::Colon)?;
        let r#else = self.parse_ternary()?;
        let span = cond.span().to(r#else.span());

        Ok(Expr::Ternary {
            cond: Box::new(cond),
            then,
            r#else: Box::new(r#else),
            span,
        })
    }

    fn binary_op_at(&self, level: usize) -> Option<BinaryOp> {
        let op = match (level, self.current_kind()) {
            (0, TokenKind::PipePipe) => BinaryOp::Or,
            (1, TokenKind::AmpAmp) => BinaryOp::And,
            (2, TokenKind::EqEq) => BinaryOp::Eq,
            (2, TokenKind::EqEqEq) => BinaryOp::Identical,
            (2, TokenKind::BangEq) => BinaryOp::NotEq,
            (2, TokenKind::BangEqEq) => BinaryOp::NotIdentical,
            (3, TokenKind::Lt) => BinaryOp::Lt,
            (3, TokenKind::Gt) => BinaryOp::Gt,
            (3, TokenKind::LtEq) => BinaryOp::LtEq,
            (3, TokenKind::GtEq) => BinaryOp::GtEq,
            (4, TokenKind::Plus) => BinaryOp::Add,
            (4, TokenKind::Minus) => BinaryOp::Sub,
            (4, TokenKind::Dot) => BinaryOp::Concat,
            (5, TokenKind::Star) => BinaryOp::Mul,
            (5, TokenKind::Slash) => BinaryOp::Div,
            _ => return None,
        };
        Some(op)
    }

    fn parse_binary(&mut self, level: usize) -> Result<Expr, ParseError> {
        if level > 5 {
            return self.parse_unary();
        }

        let mut lhs = self.parse_binary(level + 1)?;
        while let Some(op) = self.binary_op_at(level) {
            self.bump();
            let rhs = self.parse_binary(level + 1)?;
            let span = lhs.span().to(rhs.span());
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_span();
        if self.at(TokenKind::Bang) {
            self.bump();
            let expr = self.parse_unary()?;
            let span = start.to(expr.span());
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                expr: Box::new(expr),
                span,
            });
        }
        if self.at(TokenKind::Minus) {
            self.bump();
            let expr = self.parse_unary()?;
            let span = start.to(expr.span());
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                expr: Box::new(expr),
                span,
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        while self.at(TokenKind::Arrow) {
            self.bump();
            let name = self.expect_ident()?;
            if self.at(TokenKind::OpenParen) {
                let args = self.parse_args()?;
                let span = expr.span().to(self.previous_span());
                expr = Expr::MethodCall {
                    target: Box::new(expr),
                    name,
                    args,
                    span,
                };
            } else {
                let span = expr.span().to(self.previous_span());
                expr = Expr::PropertyFetch {
                    target: Box::new(expr),
                    name,
                    span,
                };
            }
        }

        Ok(expr)
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(TokenKind::OpenParen)?;
        let mut args = Vec::new();
        while !self.at(TokenKind::CloseParen) && !self.at_eof() {
            args.push(self.parse_expression()?);
            if self.at(TokenKind::Comma) {
                self.bump();
            }
        }
        self.expect(TokenKind::CloseParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let span = self.current_span();

        match self.current_kind().clone() {
            TokenKind::IntLit(value) => {
                self.bump();
                Ok(Expr::IntLit(value, span))
            }
            TokenKind::FloatLit(value) => {
                self.bump();
                Ok(Expr::FloatLit(value, span))
            }
            TokenKind::StringLit(value) => {
                self.bump();
                Ok(Expr::StringLit(value, span))
            }
            TokenKind::Variable(name) => {
                self.bump();
                Ok(Expr::Variable(name, span))
            }
            TokenKind::OpenParen => {
                self.bump();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::CloseParen)?;
                Ok(expr)
            }
            TokenKind::Ident(name) => {
                let lower = name.to_lowercase();
                match lower.as_str() {
                    "true" => {
                        self.bump();
                        Ok(Expr::BoolLit(true, span))
                    }
                    "false" => {
                        self.bump();
                        Ok(Expr::BoolLit(false, span))
                    }
                    "null" => {
                        self.bump();
                        Ok(Expr::NullLit(span))
                    }
                    "new" => {
                        self.bump();
                        let class = self.expect_ident()?;
                        let args = if self.at(TokenKind::OpenParen) {
                            self.parse_args()?
                        } else {
                            Vec::new()
                        };
                        Ok(Expr::New {
                            class,
                            args,
                            span: span.to(self.previous_span()),
                        })
                    }
                    "function" => self.parse_closure(span),
                    _ => {
                        self.bump();
                        if self.at(TokenKind::OpenParen) {
                            let args = self.parse_args()?;
                            Ok(Expr::FunctionCall {
                                name,
                                args,
                                span: span.to(self.previous_span()),
                            })
                        } else {
                            Err(ParseError::new(
                                format!("unexpected bare identifier '{name}'"),
                                span,
                            ))
                        }
                    }
                }
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_closure(&mut self, start: Span) -> Result<Expr, ParseError> {
        self.bump(); // `function`
        let (params, _) = self.parse_params()?;

        let mut uses = Vec::new();
        if self.at_keyword("use") {
            self.bump();
            self.expect(TokenKind::OpenParen)?;
            while !self.at(TokenKind::CloseParen) && !self.at_eof() {
                match self.current_kind().clone() {
                    TokenKind::Variable(name) => {
                        self.bump();
                        uses.push(name);
                    }
                    _ => return Err(self.unexpected("captured variable")),
                }
                if self.at(TokenKind::Comma) {
                    self.bump();
                }
            }
            self.expect(TokenKind::CloseParen)?;
        }

        let (return_type, return_type_span) = if self.at(TokenKind::Colon) {
            self.bump();
            let (ty, ty_span) = self.parse_type_annotation()?;
            (Some(ty), Some(ty_span))
        } else {
            (None, None)
        };

        let body = self.parse_block()?;

        Ok(Expr::Closure(Box::new(ClosureExpr {
            params,
            uses,
            return_type,
            return_type_span,
            body,
            span: start.to(self.previous_span()),
        })))
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn previous_span(&self) -> Span {
        if self.pos == 0 {
            return self.current_span();
        }
        self.tokens[(self.pos - 1).min(self.tokens.len() - 1)].span
    }

    fn peek_kind(&self, offset: usize) -> &TokenKind {
        let index = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    fn bump(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current_kind() == &kind
    }

    fn at_eof(&self) -> bool {
        self.at(TokenKind::Eof)
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        match self.current_kind() {
            TokenKind::Ident(name) => name.eq_ignore_ascii_case(keyword),
            _ => false,
        }
    }

    fn take_docblock(&mut self) -> Option<Docblock> {
        let mut last = None;
        while let TokenKind::DocComment(text) = self.current_kind() {
            last = Some(Docblock::parse(text));
            self.bump();
        }
        last
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if self.at(kind.clone()) {
            self.bump();
            Ok(())
        } else {
            Err(ParseError::new(
                format!("expected {kind:?}, found {:?}", self.current_kind()),
                self.current_span(),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.current_kind().clone() {
            TokenKind::Ident(name) => {
                self.bump();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn unexpected(&self, wanted: &str) -> ParseError {
        ParseError::new(
            format!("expected {wanted}, found {:?}", self.current_kind()),
            self.current_span(),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::parse_file;

    #[test]
    fn parses_function_with_return_type() {
        let ast = parse_file("a.php", "function foo(int $x): ?string { return 'a'; }").unwrap();
        let Declaration::Function(func) = &ast.declarations[0] else {
            panic!("expected function");
        };
        assert_eq!(func.name, "foo");
        assert_eq!(func.return_type.as_ref().unwrap().to_string(), "?string");
        assert_eq!(func.body.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn parses_class_with_trait_use_and_property() {
        let source = r#"
            final class Foo extends Bar {
                use Countable;
                /** @var int */
                private $count;
                public function total(): int { return $this->count; }
            }
        "#;
        let ast = parse_file("a.php", source).unwrap();
        let Declaration::ClassLike(class) = &ast.declarations[0] else {
            panic!("expected class");
        };
        assert!(class.is_final);
        assert_eq!(class.parent.as_deref(), Some("Bar"));
        assert_eq!(class.uses, vec!["Countable"]);
        assert_eq!(class.properties[0].name, "count");
        assert_eq!(class.properties[0].ty.as_ref().unwrap().to_string(), "int");
        assert_eq!(class.methods[0].name, "total");
    }

    #[test]
    fn parses_docblock_return_on_function() {
        let source = "/** @return int|false */\nfunction pos() { return false; }";
        let ast = parse_file("a.php", source).unwrap();
        let Declaration::Function(func) = &ast.declarations[0] else {
            panic!("expected function");
        };
        let docblock = func.docblock.as_ref().unwrap();
        assert_eq!(docblock.return_type.as_ref().unwrap().to_string(), "int|false");
    }

    #[test]
    fn parses_closure_with_use_clause() {
        let source = "function outer() { $f = function ($x) use ($y): int { return $x; }; }";
        let ast = parse_file("a.php", source).unwrap();
        let Declaration::Function(func) = &ast.declarations[0] else {
            panic!("expected function");
        };
        let Stmt::Expression(Expr::Assign { value, .. }) = &func.body.as_ref().unwrap()[0] else {
            panic!("expected assignment");
        };
        let Expr::Closure(closure) = value.as_ref() else {
            panic!("expected closure");
        };
        assert_eq!(closure.uses, vec!["y"]);
        assert_eq!(closure.return_type.as_ref().unwrap().to_string(), "int");
    }

    #[test]
    fn parses_control_flow_statements() {
        let source = r#"
            function f($x) {
                if ($x > 1) { return 1; } elseif ($x) { return 2; } else { return 3; }
                while (true) { break; }
                do { continue; } while ($x);
                switch ($x) {
                    case 1: return 4;
                    default: throw new RuntimeException('nope');
                }
                try { return 5; } catch (Throwable $e) { return 6; } finally { $x = 1; }
            }
        "#;
        let ast = parse_file("a.php", source).unwrap();
        let Declaration::Function(func) = &ast.declarations[0] else {
            panic!("expected function");
        };
        assert_eq!(func.body.as_ref().unwrap().len(), 5);
    }

    #[test]
    fn parses_abstract_method_without_body() {
        let source = "abstract class A { abstract function f(): int; }";
        let ast = parse_file("a.php", source).unwrap();
        let Declaration::ClassLike(class) = &ast.declarations[0] else {
            panic!("expected class");
        };
        assert!(class.methods[0].body.is_none());
        assert!(class.methods[0].is_abstract);
    }

    #[test]
    fn yield_parses_in_statement_position() {
        let source = "function gen() { yield 1; yield; }";
        let ast = parse_file("a.php", source).unwrap();
        let Declaration::Function(func) = &ast.declarations[0] else {
            panic!("expected function");
        };
        let body = func.body.as_ref().unwrap();
        assert!(matches!(
            &body[0],
            Stmt::Expression(Expr::Yield { value: Some(_), .. })
        ));
        assert!(matches!(
            &body[1],
            Stmt::Expression(Expr::Yield { value: None, .. })
        ));
    }
}
