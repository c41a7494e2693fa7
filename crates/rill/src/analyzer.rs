//! Static analyzer: validates scoping and contextual-keyword rules before
//! evaluation ever runs.
//!
//! Maintains a name table shaped like the evaluator's own lexical scoping
//! (so what resolves here is guaranteed to resolve at runtime) plus a stack
//! of contextual locations (`Function`/`ProtoMethod`, `Pipe`, `While`) and,
//! for every `|>` currently open, whether its right-hand side has observed
//! a `?` yet.

use crate::ast::{Arg, Binding, ClosureDepth, Expr, KeyValue, Node};
use crate::environment::Environment;
use crate::error::StaticError;
use crate::token::CodeLoc;

#[derive(Clone, Copy)]
struct DeclInfo {
    mutable: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Context {
    /// A plain `fn` body: `return` is valid, `me` is not.
    Function,
    /// A `proto { ... }` method body: both `return` and `me` are valid.
    ProtoMethod,
    Pipe,
    While,
}

struct Analyzer {
    env: Environment<DeclInfo>,
    contexts: Vec<Context>,
    pipe_satisfied: Vec<bool>,
}

type AResult<T = ()> = Result<T, StaticError>;

/// Validates an entire program. Returns the first static error found, if
/// any; an `Ok(())` program is safe to pass to [`crate::evaluator`].
pub fn analyze(nodes: &[Node]) -> AResult {
    let mut a = Analyzer {
        env: Environment::new(),
        contexts: Vec::new(),
        pipe_satisfied: Vec::new(),
    };
    for node in nodes {
        a.analyze_node(node)?;
    }
    Ok(())
}

impl Analyzer {
    fn declare(&mut self, name: &str, mutable: bool, loc: CodeLoc) -> AResult {
        if self.env.has_directly(name) {
            return Err(StaticError::Redeclaration {
                name: name.to_string(),
                loc,
            });
        }
        self.env.add(name.to_string(), DeclInfo { mutable });
        Ok(())
    }

    fn push_scope(&mut self) {
        self.env = Environment::child_of(Some(self.env.clone()));
    }

    fn pop_scope(&mut self, parent: Environment<DeclInfo>) {
        self.env = parent;
    }

    fn in_context(&self, ctx: Context) -> bool {
        self.contexts.contains(&ctx)
    }

    fn analyze_node(&mut self, node: &Node) -> AResult {
        match node {
            Node::Expr(e) => self.analyze_expr(e),
            Node::VarDecl {
                names,
                values,
                loc,
            } => {
                if !values.is_empty() && values.len() != names.len() {
                    return Err(StaticError::DeclarationArityMismatch { loc: *loc });
                }
                // Names go into the frame before any initializer is analyzed,
                // so a later initializer can see earlier bindings in the same
                // declaration (and a self-referential `fn<>` can see itself).
                for name in names {
                    self.declare(&name.name, name.mutable, name.loc)?;
                }
                for v in values {
                    self.analyze_expr(v)?;
                }
                Ok(())
            }
            Node::Assign {
                names,
                values,
                loc,
            } => {
                if names.len() != values.len() {
                    return Err(StaticError::AssignmentArityMismatch { loc: *loc });
                }
                for (name, name_loc) in names {
                    if !self.env.has(name) {
                        return Err(StaticError::UnresolvedIdentifier {
                            name: name.clone(),
                            loc: *name_loc,
                        });
                    }
                    let mutable = self.env.get(name).map(|d| d.mutable).unwrap_or(false);
                    if !mutable {
                        return Err(StaticError::NotMutable {
                            name: name.clone(),
                            loc: *name_loc,
                        });
                    }
                }
                for v in values {
                    self.analyze_expr(v)?;
                }
                Ok(())
            }
            Node::If {
                decl,
                cond,
                then_block,
                else_branch,
                ..
            } => {
                let parent = self.env.clone();
                self.push_scope();
                if let Some(decl) = decl {
                    self.analyze_node(decl)?;
                }
                self.analyze_expr(cond)?;
                self.analyze_node(then_block)?;
                if let Some(else_branch) = else_branch {
                    self.analyze_node(else_branch)?;
                }
                self.pop_scope(parent);
                Ok(())
            }
            Node::While {
                decl, cond, body, ..
            } => {
                let parent = self.env.clone();
                self.push_scope();
                if let Some(decl) = decl {
                    self.analyze_node(decl)?;
                }
                self.analyze_expr(cond)?;
                self.contexts.push(Context::While);
                self.analyze_node(body)?;
                self.contexts.pop();
                self.pop_scope(parent);
                Ok(())
            }
            Node::Block { statements, .. } => {
                let parent = self.env.clone();
                self.push_scope();
                for stmt in statements {
                    self.analyze_node(stmt)?;
                }
                self.pop_scope(parent);
                Ok(())
            }
            Node::Return { value, loc } => {
                if !self.in_context(Context::Function) && !self.in_context(Context::ProtoMethod) {
                    return Err(StaticError::ReturnOutsideCallable { loc: *loc });
                }
                if let Some(v) = value {
                    self.analyze_expr(v)?;
                }
                Ok(())
            }
            Node::Continue { loc } | Node::Break { loc } => {
                if !self.in_context(Context::While) {
                    return Err(StaticError::LoopControlOutsideWhile { loc: *loc });
                }
                Ok(())
            }
        }
    }

    fn analyze_expr(&mut self, expr: &Expr) -> AResult {
        match expr {
            Expr::NumLit { .. }
            | Expr::StrLit { .. }
            | Expr::BoolLit { .. }
            | Expr::BottomLit { .. } => Ok(()),
            Expr::Identifier { name, loc } => {
                if self.env.has(name) {
                    Ok(())
                } else {
                    Err(StaticError::UnresolvedIdentifier {
                        name: name.clone(),
                        loc: *loc,
                    })
                }
            }
            Expr::Grouping { inner } => self.analyze_expr(inner),
            Expr::Unary { operand, .. } => self.analyze_expr(operand),
            Expr::Binary {
                left, op, right, ..
            } => {
                self.analyze_expr(left)?;
                if matches!(op, crate::ast::BinaryOp::Pipe) {
                    self.contexts.push(Context::Pipe);
                    self.pipe_satisfied.push(false);
                    self.analyze_expr(right)?;
                    let satisfied = self.pipe_satisfied.pop().unwrap();
                    self.contexts.pop();
                    if !satisfied {
                        return Err(StaticError::PipeMissingQuestion {
                            loc: right.loc(),
                        });
                    }
                    Ok(())
                } else {
                    self.analyze_expr(right)
                }
            }
            Expr::Tuple { items, .. } => self.analyze_args(items),
            Expr::Record { entries, .. } => self.analyze_kv(entries),
            Expr::Func {
                params,
                depth,
                body,
                loc,
            } => self.analyze_func(params, *depth, body, *loc, Context::Function),
            Expr::Call { callee, args, .. } => {
                self.analyze_expr(callee)?;
                self.analyze_args(args)
            }
            Expr::Get { target, field, .. } => {
                self.analyze_expr(target)?;
                self.analyze_expr(field)
            }
            Expr::Me { loc } => {
                if self.in_context(Context::ProtoMethod) {
                    Ok(())
                } else {
                    Err(StaticError::MeOutsideMethod { loc: *loc })
                }
            }
            Expr::Proto { methods, .. } => self.analyze_proto_methods(methods),
            Expr::Question { loc } => {
                if let Some(last) = self.pipe_satisfied.last_mut() {
                    *last = true;
                }
                if self.in_context(Context::Pipe) {
                    Ok(())
                } else {
                    Err(StaticError::QuestionOutsidePipe { loc: *loc })
                }
            }
        }
    }

    fn analyze_args(&mut self, args: &[Arg]) -> AResult {
        for a in args {
            match a {
                Arg::Value(e) | Arg::Spread(e) => self.analyze_expr(e)?,
            }
        }
        Ok(())
    }

    fn analyze_kv(&mut self, entries: &[KeyValue]) -> AResult {
        for kv in entries {
            self.analyze_expr(&kv.key)?;
            self.analyze_expr(&kv.value)?;
        }
        Ok(())
    }

    /// Analyzes a `proto { ... }` literal: each entry's value is a method
    /// body, analyzed under [`Context::ProtoMethod`] rather than the plain
    /// [`Context::Function`] a bare `fn` literal gets elsewhere.
    fn analyze_proto_methods(&mut self, entries: &[KeyValue]) -> AResult {
        for kv in entries {
            self.analyze_expr(&kv.key)?;
            match &kv.value {
                Expr::Func {
                    params,
                    depth,
                    body,
                    loc,
                } => self.analyze_func(params, *depth, body, *loc, Context::ProtoMethod)?,
                other => self.analyze_expr(other)?,
            }
        }
        Ok(())
    }

    fn analyze_func(
        &mut self,
        params: &[Binding],
        depth: ClosureDepth,
        body: &Node,
        loc: CodeLoc,
        ctx: Context,
    ) -> AResult {
        let parent = self.env.clone();
        let captured = match depth {
            ClosureDepth::None => None,
            ClosureDepth::Full => Some(parent.clone()),
            ClosureDepth::Frames(n) => parent.slice(n),
        };
        self.env = Environment::child_of(captured);
        for p in params {
            self.declare(&p.name, p.mutable, p.loc)?;
        }
        if params
            .iter()
            .enumerate()
            .any(|(i, p)| p.rest && i + 1 != params.len())
        {
            self.env = parent;
            return Err(StaticError::RestParameterNotLast { loc });
        }
        self.contexts.push(ctx);
        let result = self.analyze_node(body);
        self.contexts.pop();
        self.env = parent;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::scanner::scan;

    fn analyze_src(src: &str) -> AResult {
        analyze(&parse(scan(src).unwrap()).unwrap())
    }

    #[test]
    fn resolves_declared_identifiers() {
        assert!(analyze_src("let a = 1; a;").is_ok());
    }

    #[test]
    fn rejects_unresolved_identifier() {
        assert!(matches!(
            analyze_src("a;"),
            Err(StaticError::UnresolvedIdentifier { .. })
        ));
    }

    #[test]
    fn rejects_redeclaration_in_same_frame() {
        assert!(matches!(
            analyze_src("let a; let a;"),
            Err(StaticError::Redeclaration { .. })
        ));
    }

    #[test]
    fn allows_shadowing_in_nested_scope() {
        assert!(analyze_src("let a = 1; if true { let a = 2; a; } a;").is_ok());
    }

    #[test]
    fn rejects_assignment_without_mut() {
        assert!(matches!(
            analyze_src("let a = 1; a = 2;"),
            Err(StaticError::NotMutable { .. })
        ));
    }

    #[test]
    fn allows_assignment_with_mut() {
        assert!(analyze_src("let mut a = 1; a = 2;").is_ok());
    }

    #[test]
    fn rejects_me_outside_method() {
        assert!(matches!(
            analyze_src("me;"),
            Err(StaticError::MeOutsideMethod { .. })
        ));
    }

    #[test]
    fn rejects_me_inside_plain_function() {
        assert!(matches!(
            analyze_src("let f = fn() -> me;"),
            Err(StaticError::MeOutsideMethod { .. })
        ));
    }

    #[test]
    fn allows_me_inside_proto_method() {
        assert!(analyze_src("let p = proto { 'x' -> fn() -> me };").is_ok());
    }

    #[test]
    fn allows_return_inside_plain_function() {
        assert!(analyze_src("let f = fn() { return 1; };").is_ok());
    }

    #[test]
    fn allows_return_inside_proto_method() {
        assert!(analyze_src("let p = proto { 'x' -> fn() { return 1; } };").is_ok());
    }

    #[test]
    fn rejects_return_outside_callable() {
        assert!(matches!(
            analyze_src("return;"),
            Err(StaticError::ReturnOutsideCallable { .. })
        ));
    }

    #[test]
    fn rejects_break_outside_while() {
        assert!(matches!(
            analyze_src("break;"),
            Err(StaticError::LoopControlOutsideWhile { .. })
        ));
    }

    #[test]
    fn allows_break_inside_while() {
        assert!(analyze_src("while true { break; }").is_ok());
    }

    #[test]
    fn rejects_question_outside_pipe() {
        assert!(matches!(
            analyze_src("?;"),
            Err(StaticError::QuestionOutsidePipe { .. })
        ));
    }

    #[test]
    fn rejects_pipe_missing_question() {
        assert!(matches!(
            analyze_src("1 |> 2;"),
            Err(StaticError::PipeMissingQuestion { .. })
        ));
    }

    #[test]
    fn allows_pipe_with_question() {
        assert!(analyze_src("1 |> ? + 1;").is_ok());
    }

    #[test]
    fn function_body_does_not_see_enclosing_names_without_capture() {
        assert!(matches!(
            analyze_src("let x = 1; let f = fn() -> x;"),
            Err(StaticError::UnresolvedIdentifier { .. })
        ));
    }

    #[test]
    fn full_capture_marker_sees_enclosing_names() {
        assert!(analyze_src("let x = 1; let f = fn<>() -> x;").is_ok());
    }

    #[test]
    fn later_initializer_sees_earlier_binding_in_same_declaration() {
        assert!(analyze_src("let a = 1, b = a;").is_ok());
    }

    #[test]
    fn self_referential_declaration_is_accepted() {
        assert!(analyze_src("let f = fn<>() -> f();").is_ok());
    }

    #[test]
    fn declaration_arity_mismatch_is_rejected() {
        assert!(matches!(
            analyze_src("let a, b = 1;"),
            Err(StaticError::DeclarationArityMismatch { .. })
        ));
    }
}
