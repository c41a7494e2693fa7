//! Recursive-descent parser turning a token stream into an AST.
//!
//! The precedence ladder (loosest to tightest) is `||`, `&&`, `|>`,
//! equality, comparison, additive, multiplicative, exponent, unary,
//! call/get, fundamental. Every binary level is left-associative except
//! unary `-`, which is right-associative by virtue of recursing on itself.

use crate::ast::{Arg, Binding, BinaryOp, ClosureDepth, Expr, KeyValue, Node, UnaryOp};
use crate::error::ParseError;
use crate::token::{CodeLoc, Token, TokenKind};

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

type PResult<T> = Result<T, ParseError>;

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn loc(&self) -> CodeLoc {
        self.peek().loc
    }

    fn is(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn at_eof(&self) -> bool {
        self.is(TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kind: TokenKind, expected: &'static str) -> PResult<Token> {
        if self.is(kind) {
            Ok(self.advance())
        } else if self.at_eof() {
            Err(ParseError::UnexpectedEof { expected })
        } else {
            Err(ParseError::UnexpectedToken {
                expected,
                found: format!("{:?}", self.peek().kind),
                loc: self.loc(),
            })
        }
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.is(kind) {
            self.advance();
            true
        } else {
            false
        }
    }
}

/// Parses a complete token stream (including its trailing `EOF`) into a
/// sequence of top-level program nodes.
pub fn parse(tokens: Vec<Token>) -> PResult<Vec<Node>> {
    let mut p = Parser { tokens, pos: 0 };
    let mut nodes = Vec::new();
    while !p.at_eof() {
        nodes.push(parse_stmt(&mut p)?);
    }
    Ok(nodes)
}

// A bare `{` here is a record or proto literal, never a block: `block` only
// occurs inside `ifs`/`whl`/fn bodies, so a leading `{` falls through to
// `parse_expr_or_assign` like any other expression-starting token.
fn parse_stmt(p: &mut Parser) -> PResult<Node> {
    match p.peek().kind {
        TokenKind::Let => {
            let loc = p.advance().loc;
            let (names, values) = parse_decl(p)?;
            p.eat(TokenKind::Semicolon, "';'")?;
            Ok(Node::VarDecl {
                names,
                values,
                loc,
            })
        }
        TokenKind::If => {
            p.advance();
            parse_if(p)
        }
        TokenKind::While => {
            p.advance();
            parse_while(p)
        }
        TokenKind::Return => {
            let loc = p.advance().loc;
            let value = if p.is(TokenKind::Semicolon) {
                None
            } else {
                Some(parse_expr(p)?)
            };
            p.eat(TokenKind::Semicolon, "';'")?;
            Ok(Node::Return { value, loc })
        }
        TokenKind::Continue => {
            let loc = p.advance().loc;
            p.eat(TokenKind::Semicolon, "';'")?;
            Ok(Node::Continue { loc })
        }
        TokenKind::Break => {
            let loc = p.advance().loc;
            p.eat(TokenKind::Semicolon, "';'")?;
            Ok(Node::Break { loc })
        }
        _ => parse_expr_or_assign(p),
    }
}

/// Shared by `let` declarations and the optional `let ...;` heads of `if`
/// and `while`: a comma-separated name list, optionally followed by `=`
/// and an equal-length comma-separated initializer list.
fn parse_decl(p: &mut Parser) -> PResult<(Vec<Binding>, Vec<Expr>)> {
    let mut names = vec![parse_binding(p)?];
    while p.matches(TokenKind::Comma) {
        names.push(parse_binding(p)?);
    }

    let mut values = Vec::new();
    if p.matches(TokenKind::Equal) {
        values.push(parse_expr(p)?);
        while p.matches(TokenKind::Comma) {
            values.push(parse_expr(p)?);
        }
    }

    Ok((names, values))
}

fn parse_binding(p: &mut Parser) -> PResult<Binding> {
    let mutable = p.matches(TokenKind::Mut);
    let loc = p.loc();
    let name = p.eat(TokenKind::Identifier, "identifier")?.lexeme;
    Ok(Binding {
        name,
        mutable,
        rest: false,
        loc,
    })
}

fn parse_if(p: &mut Parser) -> PResult<Node> {
    let loc = p.tokens[p.pos - 1].loc;
    let decl = parse_optional_let_head(p)?;
    let cond = parse_expr(p)?;
    let then_block = Box::new(parse_block(p)?);
    let else_branch = if p.matches(TokenKind::Else) {
        if p.matches(TokenKind::If) {
            Some(Box::new(parse_if(p)?))
        } else {
            Some(Box::new(parse_block(p)?))
        }
    } else {
        None
    };
    Ok(Node::If {
        decl,
        cond,
        then_block,
        else_branch,
        loc,
    })
}

fn parse_while(p: &mut Parser) -> PResult<Node> {
    let loc = p.tokens[p.pos - 1].loc;
    let decl = parse_optional_let_head(p)?;
    let cond = parse_expr(p)?;
    let body = Box::new(parse_block(p)?);
    Ok(Node::While {
        decl,
        cond,
        body,
        loc,
    })
}

fn parse_optional_let_head(p: &mut Parser) -> PResult<Option<Box<Node>>> {
    if p.matches(TokenKind::Let) {
        let loc = p.tokens[p.pos - 1].loc;
        let (names, values) = parse_decl(p)?;
        p.eat(TokenKind::Semicolon, "';'")?;
        Ok(Some(Box::new(Node::VarDecl {
            names,
            values,
            loc,
        })))
    } else {
        Ok(None)
    }
}

fn parse_block(p: &mut Parser) -> PResult<Node> {
    let loc = p.eat(TokenKind::LeftBrace, "'{'")?.loc;
    let mut statements = Vec::new();
    while !p.is(TokenKind::RightBrace) {
        if p.at_eof() {
            return Err(ParseError::UnexpectedEof { expected: "'}'" });
        }
        statements.push(parse_stmt(p)?);
    }
    p.eat(TokenKind::RightBrace, "'}'")?;
    Ok(Node::Block { statements, loc })
}

fn parse_expr_or_assign(p: &mut Parser) -> PResult<Node> {
    let loc = p.loc();
    let first = parse_expr(p)?;

    if p.is(TokenKind::Comma) || p.is(TokenKind::Equal) {
        let Expr::Identifier { name, loc: first_loc } = first else {
            return Err(ParseError::InvalidAssignmentTarget { loc });
        };
        let mut names = vec![(name, first_loc)];
        while p.matches(TokenKind::Comma) {
            let tok = p.eat(TokenKind::Identifier, "identifier")?;
            names.push((tok.lexeme, tok.loc));
        }
        p.eat(TokenKind::Equal, "'='")?;
        let mut values = vec![parse_expr(p)?];
        while p.matches(TokenKind::Comma) {
            values.push(parse_expr(p)?);
        }
        p.matches(TokenKind::Semicolon);
        return Ok(Node::Assign {
            names,
            values,
            loc,
        });
    }

    p.matches(TokenKind::Semicolon);
    Ok(Node::Expr(first))
}

fn parse_expr(p: &mut Parser) -> PResult<Expr> {
    parse_or(p)
}

fn parse_or(p: &mut Parser) -> PResult<Expr> {
    let mut left = parse_and(p)?;
    while p.is(TokenKind::StrokeStroke) {
        let loc = p.advance().loc;
        let right = parse_and(p)?;
        left = Expr::Binary {
            left: Box::new(left),
            op: BinaryOp::Or,
            right: Box::new(right),
            loc,
        };
    }
    Ok(left)
}

fn parse_and(p: &mut Parser) -> PResult<Expr> {
    let mut left = parse_pipe(p)?;
    while p.is(TokenKind::AmpersandAmpersand) {
        let loc = p.advance().loc;
        let right = parse_pipe(p)?;
        left = Expr::Binary {
            left: Box::new(left),
            op: BinaryOp::And,
            right: Box::new(right),
            loc,
        };
    }
    Ok(left)
}

fn parse_pipe(p: &mut Parser) -> PResult<Expr> {
    let mut left = parse_eq(p)?;
    while p.is(TokenKind::StrokeGreat) {
        let loc = p.advance().loc;
        let right = parse_eq(p)?;
        left = Expr::Binary {
            left: Box::new(left),
            op: BinaryOp::Pipe,
            right: Box::new(right),
            loc,
        };
    }
    Ok(left)
}

fn parse_eq(p: &mut Parser) -> PResult<Expr> {
    let mut left = parse_cmp(p)?;
    loop {
        let op = match p.peek().kind {
            TokenKind::EqualEqual => BinaryOp::Eq,
            TokenKind::BangEqual => BinaryOp::NotEq,
            _ => break,
        };
        let loc = p.advance().loc;
        let right = parse_cmp(p)?;
        left = Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
            loc,
        };
    }
    Ok(left)
}

fn parse_cmp(p: &mut Parser) -> PResult<Expr> {
    let mut left = parse_add(p)?;
    loop {
        let op = match p.peek().kind {
            TokenKind::Less => BinaryOp::Lt,
            TokenKind::LessEqual => BinaryOp::LtEq,
            TokenKind::Great => BinaryOp::Gt,
            TokenKind::GreatEqual => BinaryOp::GtEq,
            _ => break,
        };
        let loc = p.advance().loc;
        let right = parse_add(p)?;
        left = Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
            loc,
        };
    }
    Ok(left)
}

fn parse_add(p: &mut Parser) -> PResult<Expr> {
    let mut left = parse_mul(p)?;
    loop {
        let op = match p.peek().kind {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            _ => break,
        };
        let loc = p.advance().loc;
        let right = parse_mul(p)?;
        left = Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
            loc,
        };
    }
    Ok(left)
}

fn parse_mul(p: &mut Parser) -> PResult<Expr> {
    let mut left = parse_pow(p)?;
    loop {
        let op = match p.peek().kind {
            TokenKind::Asterisk => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            _ => break,
        };
        let loc = p.advance().loc;
        let right = parse_pow(p)?;
        left = Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
            loc,
        };
    }
    Ok(left)
}

fn parse_pow(p: &mut Parser) -> PResult<Expr> {
    let mut left = parse_unary(p)?;
    while p.is(TokenKind::AsteriskAsterisk) {
        let loc = p.advance().loc;
        let right = parse_unary(p)?;
        left = Expr::Binary {
            left: Box::new(left),
            op: BinaryOp::Pow,
            right: Box::new(right),
            loc,
        };
    }
    Ok(left)
}

fn parse_unary(p: &mut Parser) -> PResult<Expr> {
    if p.is(TokenKind::Minus) {
        let loc = p.advance().loc;
        let operand = parse_unary(p)?;
        return Ok(Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(operand),
            loc,
        });
    }
    parse_callget(p)
}

fn parse_callget(p: &mut Parser) -> PResult<Expr> {
    let mut expr = parse_fundamental(p)?;
    loop {
        if p.is(TokenKind::LeftParen) {
            let loc = p.advance().loc;
            let args = parse_args(p, TokenKind::RightParen)?;
            p.eat(TokenKind::RightParen, "')'")?;
            expr = Expr::Call {
                callee: Box::new(expr),
                args,
                loc,
            };
        } else if p.is(TokenKind::MinusGreat) {
            let loc = p.advance().loc;
            let field = parse_fundamental(p)?;
            expr = Expr::Get {
                target: Box::new(expr),
                field: Box::new(field),
                loc,
            };
        } else {
            break;
        }
    }
    Ok(expr)
}

fn parse_args(p: &mut Parser, terminator: TokenKind) -> PResult<Vec<Arg>> {
    let mut args = Vec::new();
    if p.is(terminator) {
        return Ok(args);
    }
    loop {
        if p.matches(TokenKind::DotDotDot) {
            args.push(Arg::Spread(parse_expr(p)?));
        } else {
            args.push(Arg::Value(parse_expr(p)?));
        }
        if !p.matches(TokenKind::Comma) {
            break;
        }
        if p.is(terminator) {
            break;
        }
    }
    Ok(args)
}

fn parse_fundamental(p: &mut Parser) -> PResult<Expr> {
    let tok = p.peek().clone();
    match tok.kind {
        TokenKind::Number => {
            p.advance();
            let value: f64 = tok.lexeme.parse().map_err(|_| ParseError::UnexpectedToken {
                expected: "number literal",
                found: tok.lexeme.clone(),
                loc: tok.loc,
            })?;
            Ok(Expr::NumLit {
                value,
                loc: tok.loc,
            })
        }
        TokenKind::String => {
            p.advance();
            let inner = tok.lexeme[1..tok.lexeme.len() - 1].to_string();
            Ok(Expr::StrLit {
                value: inner,
                loc: tok.loc,
            })
        }
        TokenKind::True => {
            p.advance();
            Ok(Expr::BoolLit {
                value: true,
                loc: tok.loc,
            })
        }
        TokenKind::False => {
            p.advance();
            Ok(Expr::BoolLit {
                value: false,
                loc: tok.loc,
            })
        }
        TokenKind::Bottom => {
            p.advance();
            Ok(Expr::BottomLit { loc: tok.loc })
        }
        TokenKind::Me => {
            p.advance();
            Ok(Expr::Me { loc: tok.loc })
        }
        TokenKind::Question => {
            p.advance();
            Ok(Expr::Question { loc: tok.loc })
        }
        TokenKind::Identifier => {
            p.advance();
            Ok(Expr::Identifier {
                name: tok.lexeme,
                loc: tok.loc,
            })
        }
        TokenKind::LeftParen => {
            p.advance();
            let inner = parse_expr(p)?;
            p.eat(TokenKind::RightParen, "')'")?;
            Ok(Expr::Grouping {
                inner: Box::new(inner),
            })
        }
        TokenKind::LeftBracket => {
            p.advance();
            let items = parse_args(p, TokenKind::RightBracket)?;
            p.eat(TokenKind::RightBracket, "']'")?;
            Ok(Expr::Tuple {
                items,
                loc: tok.loc,
            })
        }
        TokenKind::LeftBrace => {
            p.advance();
            let entries = parse_kv_list(p)?;
            p.eat(TokenKind::RightBrace, "'}'")?;
            Ok(Expr::Record {
                entries,
                loc: tok.loc,
            })
        }
        TokenKind::Proto => {
            p.advance();
            p.eat(TokenKind::LeftBrace, "'{'")?;
            let methods = parse_kv_list(p)?;
            p.eat(TokenKind::RightBrace, "'}'")?;
            Ok(Expr::Proto {
                methods,
                loc: tok.loc,
            })
        }
        TokenKind::Fn => parse_func(p),
        _ => Err(ParseError::UnexpectedToken {
            expected: "an expression",
            found: format!("{:?}", tok.kind),
            loc: tok.loc,
        }),
    }
}

fn parse_kv_list(p: &mut Parser) -> PResult<Vec<KeyValue>> {
    let mut entries = Vec::new();
    if p.is(TokenKind::RightBrace) {
        return Ok(entries);
    }
    loop {
        let key = parse_expr(p)?;
        p.eat(TokenKind::MinusGreat, "'->'")?;
        let value = parse_expr(p)?;
        entries.push(KeyValue { key, value });
        if !p.matches(TokenKind::Comma) {
            break;
        }
        if p.is(TokenKind::RightBrace) {
            break;
        }
    }
    Ok(entries)
}

fn parse_func(p: &mut Parser) -> PResult<Expr> {
    let loc = p.eat(TokenKind::Fn, "'fn'")?.loc;

    let depth = if p.matches(TokenKind::Less) {
        if p.matches(TokenKind::Great) {
            ClosureDepth::Full
        } else {
            let tok = p.eat(TokenKind::Number, "a frame count")?;
            let n: u32 = tok.lexeme.parse().map_err(|_| ParseError::UnexpectedToken {
                expected: "an integer frame count",
                found: tok.lexeme.clone(),
                loc: tok.loc,
            })?;
            p.eat(TokenKind::Great, "'>'")?;
            ClosureDepth::Frames(n)
        }
    } else {
        ClosureDepth::None
    };

    p.eat(TokenKind::LeftParen, "'('")?;
    let params = parse_params(p)?;
    p.eat(TokenKind::RightParen, "')'")?;

    let body = if p.matches(TokenKind::MinusGreat) {
        let expr = parse_expr(p)?;
        Box::new(Node::Expr(expr))
    } else {
        Box::new(parse_block(p)?)
    };

    Ok(Expr::Func {
        params,
        depth,
        body,
        loc,
    })
}

fn parse_params(p: &mut Parser) -> PResult<Vec<Binding>> {
    let mut params = Vec::new();
    if p.is(TokenKind::RightParen) {
        return Ok(params);
    }
    loop {
        if p.matches(TokenKind::DotDotDot) {
            let loc = p.loc();
            let name = p.eat(TokenKind::Identifier, "identifier")?.lexeme;
            params.push(Binding {
                name,
                mutable: false,
                rest: true,
                loc,
            });
            if p.is(TokenKind::Comma) {
                return Err(ParseError::RestParameterNotLast { loc });
            }
            break;
        }
        params.push(parse_binding(p)?);
        if !p.matches(TokenKind::Comma) {
            break;
        }
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;

    fn parse_src(src: &str) -> Vec<Node> {
        parse(scan(src).unwrap()).unwrap()
    }

    #[test]
    fn parses_left_associative_addition() {
        let nodes = parse_src("a + b + c;");
        let Node::Expr(Expr::Binary { op: BinaryOp::Add, left, .. }) = &nodes[0] else {
            panic!("expected top-level Add")
        };
        assert!(matches!(**left, Expr::Binary { op: BinaryOp::Add, .. }));
    }

    #[test]
    fn unary_minus_is_right_associative_via_recursion() {
        let nodes = parse_src("--1;");
        let Node::Expr(Expr::Unary { operand, .. }) = &nodes[0] else {
            panic!("expected unary")
        };
        assert!(matches!(**operand, Expr::Unary { .. }));
    }

    #[test]
    fn precedence_matches_scenario_four() {
        // true || false && a == -1 + 2 * 3 ** 4 < 1 + 5
        let nodes = parse_src("true || false && a == -1 + 2 * 3 ** 4 < 1 + 5;");
        let Node::Expr(Expr::Binary { op: BinaryOp::Or, right, .. }) = &nodes[0] else {
            panic!("expected top-level Or")
        };
        assert!(matches!(**right, Expr::Binary { op: BinaryOp::And, .. }));
    }

    #[test]
    fn call_and_get_chain() {
        let nodes = parse_src("a(1)(2)->'x';");
        assert!(matches!(nodes[0], Node::Expr(Expr::Get { .. })));
    }

    #[test]
    fn rest_parameter_must_be_last() {
        let tokens = scan("fn(...a, b) -> a;").unwrap();
        assert!(matches!(
            parse(tokens),
            Err(ParseError::RestParameterNotLast { .. })
        ));
    }

    #[test]
    fn assignment_requires_identifier_targets() {
        let tokens = scan("1 = 2;").unwrap();
        assert!(matches!(
            parse(tokens),
            Err(ParseError::InvalidAssignmentTarget { .. })
        ));
    }

    #[test]
    fn if_with_let_head_and_else() {
        let nodes = parse_src("if let a = 1; a == 1 { a } else { 0 }");
        assert!(matches!(nodes[0], Node::If { .. }));
    }

    #[test]
    fn multi_assign() {
        let nodes = parse_src("let mut a, mut b = 1, 2; a, b = 3, 4;");
        assert!(matches!(nodes[1], Node::Assign { .. }));
    }

    #[test]
    fn closure_depth_markers() {
        let Node::Expr(Expr::Func { depth, .. }) = &parse_src("fn<>() -> 1;")[0] else {
            panic!()
        };
        assert_eq!(*depth, ClosureDepth::Full);
        let Node::Expr(Expr::Func { depth, .. }) = &parse_src("fn<2>() -> 1;")[0] else {
            panic!()
        };
        assert_eq!(*depth, ClosureDepth::Frames(2));
    }
}
