//! Tree-walking evaluator.
//!
//! Grounded on `interpreter/interpreter.go`'s operator type-checking (`+`
//! overloaded for number/string, the rest number-only, `**` via `powf`),
//! with one deliberate correction: the original's unary minus mutates its
//! operand in place (`val.value *= -1; return val`); every arithmetic
//! operation here always constructs a fresh [`Value`].
//!
//! Control flow uses a single [`Flow`] type threaded through `Result` so
//! `?` does the unwinding: a plain [`RuntimeError`] propagates to the
//! caller, `Flow::Return` unwinds to the nearest function/method call,
//! and `Flow::Break`/`Flow::Continue` unwind to the nearest `while`.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::{Arg, Binding, BinaryOp, ClosureDepth, Expr, KeyValue, Node, UnaryOp};
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::function::{Function, Proto, ProtoMethod};
use crate::token::CodeLoc;
use crate::value::{RecordEntry, Value, ValueKind};

/// Evaluator-internal control signal. Never exposed at the `evaluate()`
/// boundary — only [`Flow::Error`] survives to the public API.
#[derive(Debug)]
pub enum Flow {
    Error(RuntimeError),
    Return(Value),
    Break,
    Continue,
}

impl From<RuntimeError> for Flow {
    fn from(e: RuntimeError) -> Self {
        Flow::Error(e)
    }
}

pub type EResult<T = Value> = Result<T, Flow>;

/// Holds the evaluator's single mutable cursor into the lexical
/// environment chain. Scopes are pushed and popped around blocks, pipe
/// bodies, and calls; [`Evaluator::with_scope`] guarantees the pop happens
/// even when the scoped work fails or unwinds via [`Flow`].
pub struct Evaluator {
    env: Environment<Value>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    #[must_use]
    pub fn new() -> Self {
        Evaluator {
            env: Environment::new(),
        }
    }

    /// The top-level environment, exposed for test harnesses that want to
    /// inspect bindings after a run.
    #[must_use]
    pub fn global_environment(&self) -> &Environment<Value> {
        &self.env
    }

    /// Runs a whole program, returning the value of its last
    /// expression-statement (`Bottom` if the program is empty or ends on a
    /// non-expression statement).
    pub fn run(&mut self, nodes: &[Node]) -> EResult {
        let mut last = Value::bottom();
        for node in nodes {
            last = self.exec_node(node)?;
        }
        Ok(last)
    }

    fn with_scope<T>(
        &mut self,
        parent: Option<Environment<Value>>,
        f: impl FnOnce(&mut Self) -> EResult<T>,
    ) -> EResult<T> {
        let saved = self.env.clone();
        self.env = Environment::child_of(parent);
        let result = f(self);
        self.env = saved;
        result
    }

    fn child_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> EResult<T>) -> EResult<T> {
        let parent = self.env.clone();
        self.with_scope(Some(parent), f)
    }

    fn exec_node(&mut self, node: &Node) -> EResult {
        match node {
            Node::Expr(e) => self.eval_expr(e),
            Node::VarDecl { names, values, .. } => {
                self.exec_var_decl(names, values)?;
                Ok(Value::bottom())
            }
            Node::Assign { names, values, .. } => {
                for ((name, _loc), value_expr) in names.iter().zip(values.iter()) {
                    let v = self.eval_expr(value_expr)?;
                    self.env.set(name, v);
                }
                Ok(Value::bottom())
            }
            Node::If {
                decl,
                cond,
                then_block,
                else_branch,
                loc,
            } => self.child_scope(|ev| {
                if let Some(decl) = decl {
                    ev.exec_node(decl)?;
                }
                let cond_val = ev.eval_expr(cond)?;
                let cond_bool = cond_val
                    .as_boolean()
                    .ok_or(RuntimeError::NonBooleanCondition { loc: *loc })?;
                if cond_bool {
                    ev.exec_node(then_block)
                } else if let Some(else_branch) = else_branch {
                    ev.exec_node(else_branch)
                } else {
                    Ok(Value::bottom())
                }
            }),
            Node::While {
                decl, cond, body, loc,
            } => self.child_scope(|ev| {
                if let Some(decl) = decl {
                    ev.exec_node(decl)?;
                }
                loop {
                    let cond_val = ev.eval_expr(cond)?;
                    let cond_bool = cond_val
                        .as_boolean()
                        .ok_or(RuntimeError::NonBooleanCondition { loc: *loc })?;
                    if !cond_bool {
                        break;
                    }
                    match ev.exec_node(body) {
                        Ok(_) => {}
                        Err(Flow::Break) => break,
                        Err(Flow::Continue) => {}
                        Err(other) => return Err(other),
                    }
                }
                Ok(Value::bottom())
            }),
            Node::Block { statements, .. } => self.child_scope(|ev| {
                let mut last = Value::bottom();
                for stmt in statements {
                    last = ev.exec_node(stmt)?;
                }
                Ok(last)
            }),
            Node::Return { value, .. } => {
                let v = match value {
                    Some(e) => self.eval_expr(e)?,
                    None => Value::bottom(),
                };
                Err(Flow::Return(v))
            }
            Node::Continue { .. } => Err(Flow::Continue),
            Node::Break { .. } => Err(Flow::Break),
        }
    }

    fn exec_var_decl(&mut self, names: &[Binding], values: &[Expr]) -> EResult<()> {
        if values.is_empty() {
            for name in names {
                self.env.add(name.name.clone(), Value::bottom());
            }
            return Ok(());
        }
        for (name, value_expr) in names.iter().zip(values.iter()) {
            let v = self.eval_expr(value_expr)?;
            self.env.add(name.name.clone(), v);
        }
        Ok(())
    }

    fn eval_expr(&mut self, expr: &Expr) -> EResult {
        match expr {
            Expr::NumLit { value, .. } => Ok(Value::number(*value)),
            Expr::StrLit { value, .. } => Ok(Value::string(value.clone())),
            Expr::BoolLit { value, .. } => Ok(Value::boolean(*value)),
            Expr::BottomLit { .. } => Ok(Value::bottom()),
            Expr::Identifier { name, loc } => self
                .env
                .get(name)
                .ok_or_else(|| RuntimeError::UnresolvedIdentifier {
                    name: name.clone(),
                    loc: *loc,
                }.into()),
            Expr::Grouping { inner } => self.eval_expr(inner),
            Expr::Unary { op, operand, loc } => self.eval_unary(*op, operand, *loc),
            Expr::Binary {
                left,
                op,
                right,
                loc,
            } => self.eval_binary(*op, left, right, *loc),
            Expr::Tuple { items, .. } => {
                let values = self.eval_args(items)?;
                Ok(Value::tuple(values))
            }
            Expr::Record { entries, .. } => {
                let mut map: IndexMap<String, RecordEntry> =
                    IndexMap::with_capacity(entries.len());
                for kv in entries {
                    let k = self.eval_expr(&kv.key)?;
                    let v = self.eval_expr(&kv.value)?;
                    map.insert(k.hash().to_string(), (k, v));
                }
                Ok(Value::record(map))
            }
            Expr::Func {
                params,
                depth,
                body,
                ..
            } => {
                let closure_env = self.closure_env_for(*depth);
                let function = Function::new(params.clone(), Rc::new((**body).clone()), closure_env);
                Ok(Value::function(function))
            }
            Expr::Call { callee, args, loc } => {
                let callee_val = self.eval_expr(callee)?;
                let arg_values = self.eval_args(args)?;
                self.call_value(&callee_val, arg_values, *loc)
            }
            Expr::Get { target, field, loc } => self.eval_get(target, field, *loc),
            Expr::Me { loc } => self
                .env
                .get("me")
                .ok_or(RuntimeError::MeNotBound { loc: *loc }.into()),
            Expr::Proto { methods, .. } => self.eval_proto(methods),
            Expr::Question { loc } => self
                .env
                .get("?")
                .ok_or(RuntimeError::QuestionNotBound { loc: *loc }.into()),
        }
    }

    fn closure_env_for(&self, depth: ClosureDepth) -> Option<Environment<Value>> {
        match depth {
            ClosureDepth::None => None,
            ClosureDepth::Full => Some(self.env.clone()),
            ClosureDepth::Frames(n) => self.env.slice(n),
        }
    }

    fn eval_args(&mut self, args: &[Arg]) -> EResult<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Arg::Value(e) => values.push(self.eval_expr(e)?),
                Arg::Spread(e) => {
                    let loc = e.loc();
                    let spread_val = self.eval_expr(e)?;
                    let items = spread_val
                        .as_tuple_items()
                        .ok_or(RuntimeError::SpreadNonTuple { loc })?;
                    values.extend(items.iter().cloned());
                }
            }
        }
        Ok(values)
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr, loc: CodeLoc) -> EResult {
        let v = self.eval_expr(operand)?;
        match op {
            UnaryOp::Neg => {
                let n = v.as_number().ok_or_else(|| RuntimeError::TypeMismatch {
                    message: format!("unary `-` expects a number, found {}", v.type_name()),
                    loc,
                })?;
                Ok(Value::number(-n))
            }
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr, loc: CodeLoc) -> EResult {
        match op {
            BinaryOp::Or => {
                let l = self.eval_expr(left)?;
                let lb = l
                    .as_boolean()
                    .ok_or(RuntimeError::NonBooleanOperand { loc })?;
                if lb {
                    return Ok(Value::boolean(true));
                }
                let r = self.eval_expr(right)?;
                let rb = r
                    .as_boolean()
                    .ok_or(RuntimeError::NonBooleanOperand { loc })?;
                Ok(Value::boolean(rb))
            }
            BinaryOp::And => {
                let l = self.eval_expr(left)?;
                let lb = l
                    .as_boolean()
                    .ok_or(RuntimeError::NonBooleanOperand { loc })?;
                if !lb {
                    return Ok(Value::boolean(false));
                }
                let r = self.eval_expr(right)?;
                let rb = r
                    .as_boolean()
                    .ok_or(RuntimeError::NonBooleanOperand { loc })?;
                Ok(Value::boolean(rb))
            }
            BinaryOp::Pipe => {
                let l = self.eval_expr(left)?;
                let parent = self.env.clone();
                self.with_scope(Some(parent), |ev| {
                    ev.env.add("?", l);
                    ev.eval_expr(right)
                })
            }
            BinaryOp::Eq => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                Ok(Value::boolean(l.value_eq(&r)))
            }
            BinaryOp::NotEq => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                Ok(Value::boolean(!l.value_eq(&r)))
            }
            BinaryOp::Lt => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                if matches!(r.kind(), ValueKind::Proto(_)) {
                    return Ok(l.inherit(r));
                }
                self.numeric_cmp(&l, &r, loc, |a, b| a < b)
            }
            BinaryOp::LtEq => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                self.numeric_cmp(&l, &r, loc, |a, b| a <= b)
            }
            BinaryOp::Gt => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                self.numeric_cmp(&l, &r, loc, |a, b| a > b)
            }
            BinaryOp::GtEq => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                self.numeric_cmp(&l, &r, loc, |a, b| a >= b)
            }
            BinaryOp::Add => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                match (l.kind(), r.kind()) {
                    (ValueKind::Number(a), ValueKind::Number(b)) => Ok(Value::number(a + b)),
                    (ValueKind::Str(a), ValueKind::Str(b)) => {
                        Ok(Value::string(format!("{a}{b}")))
                    }
                    _ => Err(RuntimeError::TypeMismatch {
                        message: format!(
                            "`+` is not defined for {} and {}",
                            l.type_name(),
                            r.type_name()
                        ),
                        loc,
                    }
                    .into()),
                }
            }
            BinaryOp::Sub => self.numeric_op(left, right, loc, |a, b| a - b),
            BinaryOp::Mul => self.numeric_op(left, right, loc, |a, b| a * b),
            BinaryOp::Div => self.numeric_op(left, right, loc, |a, b| a / b),
            BinaryOp::Pow => self.numeric_op(left, right, loc, f64::powf),
        }
    }

    fn numeric_op(
        &mut self,
        left: &Expr,
        right: &Expr,
        loc: CodeLoc,
        f: impl FnOnce(f64, f64) -> f64,
    ) -> EResult {
        let l = self.eval_expr(left)?;
        let r = self.eval_expr(right)?;
        let (a, b) = self.require_numbers(&l, &r, loc)?;
        Ok(Value::number(f(a, b)))
    }

    fn numeric_cmp(
        &mut self,
        l: &Value,
        r: &Value,
        loc: CodeLoc,
        f: impl FnOnce(f64, f64) -> bool,
    ) -> EResult {
        let (a, b) = self.require_numbers(l, r, loc)?;
        Ok(Value::boolean(f(a, b)))
    }

    fn require_numbers(&self, l: &Value, r: &Value, loc: CodeLoc) -> EResult<(f64, f64)> {
        let a = l.as_number().ok_or_else(|| RuntimeError::TypeMismatch {
            message: format!("expected a number, found {}", l.type_name()),
            loc,
        })?;
        let b = r.as_number().ok_or_else(|| RuntimeError::TypeMismatch {
            message: format!("expected a number, found {}", r.type_name()),
            loc,
        })?;
        Ok((a, b))
    }

    fn eval_get(&mut self, target: &Expr, field: &Expr, loc: CodeLoc) -> EResult {
        let target_val = self.eval_expr(target)?;
        let proto_val = target_val
            .proto_value()
            .ok_or_else(|| RuntimeError::TypeMismatch {
                message: format!("{} has no prototype", target_val.type_name()),
                loc,
            })?
            .clone();
        let field_val = self.eval_expr(field)?;
        let ValueKind::Proto(proto) = proto_val.kind() else {
            return Err(RuntimeError::TypeMismatch {
                message: "prototype slot does not hold a proto".to_string(),
                loc,
            }
            .into());
        };
        let method = proto.get(field_val.hash()).ok_or_else(|| RuntimeError::MissingKey {
            message: format!("no method {field_val} on {}", target_val.type_name()),
            loc,
        })?;
        let bound = method.bind(target_val);
        Ok(Value::proto_method(bound))
    }

    fn eval_proto(&mut self, methods: &[KeyValue]) -> EResult {
        let mut entries = Vec::with_capacity(methods.len());
        for kv in methods {
            let key = self.eval_expr(&kv.key)?;
            let value = self.eval_expr(&kv.value)?;
            let loc = kv.value.loc();
            let ValueKind::Function(f) = value.kind() else {
                return Err(RuntimeError::TypeMismatch {
                    message: format!(
                        "proto method values must be functions, found {}",
                        value.type_name()
                    ),
                    loc,
                }
                .into());
            };
            let method = ProtoMethod::interpreted(
                f.params().to_vec(),
                f.body_rc(),
                f.closure_env().cloned(),
            );
            entries.push((key, method));
        }
        Ok(Value::proto(Proto::from_entries(entries)))
    }

    fn call_value(&mut self, callee: &Value, new_args: Vec<Value>, loc: CodeLoc) -> EResult {
        match callee.kind() {
            ValueKind::Function(f) => self.call_function(f, new_args, loc),
            ValueKind::ProtoMethod(pm) => self.call_proto_method(pm, new_args, loc),
            _ => Err(RuntimeError::NotCallable { loc }.into()),
        }
    }

    fn call_function(&mut self, f: &Function, new_args: Vec<Value>, _loc: CodeLoc) -> EResult {
        let remaining = f.arity();
        if new_args.len() < remaining {
            return Ok(Value::function(f.apply(new_args)));
        }
        let all_args: Vec<Value> = f.apps().iter().cloned().chain(new_args).collect();
        let params = f.params().to_vec();
        let body = f.body_rc();
        let parent = f.closure_env().cloned();
        let result = self.with_scope(parent, |ev| {
            ev.bind_params(&params, &all_args);
            ev.exec_node(&body)
        });
        match result {
            Err(Flow::Return(v)) => Ok(v),
            other => other,
        }
    }

    fn call_proto_method(&mut self, pm: &ProtoMethod, new_args: Vec<Value>, loc: CodeLoc) -> EResult {
        let remaining = pm.arity();
        if new_args.len() < remaining {
            return Ok(Value::proto_method(pm.apply(new_args)));
        }
        let all_args: Vec<Value> = pm.apps().iter().cloned().chain(new_args).collect();

        if let Some(handler) = pm.native_handler() {
            return handler(pm.me(), &all_args, loc).map_err(Flow::Error);
        }

        let (params, body, closure_env) = pm
            .interpreted_body()
            .expect("non-native proto method must have an interpreted body");
        let params = params.to_vec();
        let body = Rc::new(body.clone());
        let parent = closure_env.cloned();
        let me = pm.me().cloned();
        let result = self.with_scope(parent, |ev| {
            ev.bind_params(&params, &all_args);
            if let Some(me_val) = me {
                ev.env.add("me", me_val);
            }
            ev.exec_node(&body)
        });
        match result {
            Err(Flow::Return(v)) => Ok(v),
            other => other,
        }
    }

    fn bind_params(&mut self, params: &[Binding], all_args: &[Value]) {
        let has_rest = params.last().is_some_and(|p| p.rest);
        let fixed_count = params.len() - usize::from(has_rest);
        for (i, p) in params.iter().take(fixed_count).enumerate() {
            let v = all_args.get(i).cloned().unwrap_or_else(Value::bottom);
            self.env.add(p.name.clone(), v);
        }
        if has_rest {
            let rest_name = params[params.len() - 1].name.clone();
            let rest_items: Vec<Value> = all_args.iter().skip(fixed_count).cloned().collect();
            self.env.add(rest_name, Value::tuple(rest_items));
        }
    }
}

/// Evaluates an already-analyzed program, returning the value of its last
/// expression-statement. `Flow::Break`/`Flow::Continue` escaping to the top
/// level (which a well-formed, analyzed program never produces) fall back
/// to `Bottom` rather than panicking.
pub fn evaluate(nodes: &[Node]) -> Result<Value, RuntimeError> {
    let mut evaluator = Evaluator::new();
    match evaluator.run(nodes) {
        Ok(v) => Ok(v),
        Err(Flow::Error(e)) => Err(e),
        Err(Flow::Return(v)) => Ok(v),
        Err(Flow::Break | Flow::Continue) => Ok(Value::bottom()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze;
    use crate::parser::parse;
    use crate::scanner::scan;

    fn run(src: &str) -> Value {
        let nodes = parse(scan(src).unwrap()).unwrap();
        analyze(&nodes).unwrap();
        evaluate(&nodes).unwrap()
    }

    fn run_err(src: &str) -> RuntimeError {
        let nodes = parse(scan(src).unwrap()).unwrap();
        evaluate(&nodes).unwrap_err()
    }

    #[test]
    fn scenario_s1_curried_add() {
        assert_eq!(run("let a = fn(a,b) -> a + b; a(1)(2)").as_number(), Some(3.0));
    }

    #[test]
    fn scenario_s2_while_loop() {
        assert_eq!(
            run("let mut a = 1; while a < 4 { a = a + 1; } a").as_number(),
            Some(4.0)
        );
    }

    #[test]
    fn scenario_s3_nested_tuple_equality() {
        assert_eq!(
            run("[1,\"a\",[true,bottom]] == [1,\"a\",[true,bottom]]").as_boolean(),
            Some(true)
        );
    }

    #[test]
    fn scenario_s4_record_get() {
        assert_eq!(run("{ 'a' -> 1 } -> 'get'('a')").as_number(), Some(1.0));
    }

    #[test]
    fn scenario_s5_pipe_chain() {
        assert_eq!(run("1 |> ? + 1 |> 3 ** ?").as_number(), Some(9.0));
    }

    #[test]
    fn scenario_s6_tuple_push_chain() {
        let v = run("[]->'push'(1)->'push'(2)");
        let items = v.as_tuple_items().unwrap();
        assert_eq!(items[0].as_number(), Some(1.0));
        assert_eq!(items[1].as_number(), Some(2.0));
    }

    #[test]
    fn unary_minus_never_mutates_operand() {
        let nodes = parse(scan("let a = 1; let b = -a; a").unwrap()).unwrap();
        analyze(&nodes).unwrap();
        assert_eq!(evaluate(&nodes).unwrap().as_number(), Some(1.0));
    }

    #[test]
    fn short_circuit_or_never_evaluates_right_operand() {
        assert_eq!(run("true || 1").as_boolean(), Some(true));
    }

    #[test]
    fn short_circuit_and_never_evaluates_right_operand() {
        assert_eq!(run("false && 1").as_boolean(), Some(false));
    }

    #[test]
    fn string_plus_number_is_a_runtime_error() {
        assert!(matches!(
            run_err("'a' + 1"),
            RuntimeError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn calling_a_non_callable_is_a_runtime_error() {
        assert!(matches!(run_err("1()"), RuntimeError::NotCallable { .. }));
    }

    #[test]
    fn partial_application_produces_new_callable_each_time() {
        let nodes = parse(scan("let f = fn(a,b) -> a + b; let g = f(1); g(2)").unwrap()).unwrap();
        analyze(&nodes).unwrap();
        assert_eq!(evaluate(&nodes).unwrap().as_number(), Some(3.0));
    }

    #[test]
    fn rest_parameter_collects_trailing_args_into_tuple() {
        let v = run("let f = fn(a, ...rest) -> rest; f(1,2,3)");
        let items = v.as_tuple_items().unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn lt_with_proto_rhs_is_inherit() {
        let v = run("let p = proto { 'x' -> fn() -> 1 }; let n = 5 < p; n -> 'x'()");
        assert_eq!(v.as_number(), Some(1.0));
    }

    #[test]
    fn closure_full_capture_sees_enclosing_binding() {
        let v = run("let x = 10; let f = fn<>() -> x; f()");
        assert_eq!(v.as_number(), Some(10.0));
    }

    #[test]
    fn return_terminates_only_its_own_call() {
        let v = run("let f = fn(a) { if a == 1 { return 9; } return 0; }; f(1)");
        assert_eq!(v.as_number(), Some(9.0));
    }
}
