use crate::interpreter::environment::Environment;
use crate::interpreter::error::{RuntimeError, RuntimeErrorKind};
use crate::interpreter::exec::{Clock, ExecState, OpStatus, PendingOp};
use crate::interpreter::value::{BuiltinFlow, Value};
use crate::parser::ast::{BinaryOp, Expr, ExprKind, LogicalOp, Program, Stmt, StmtKind};
use crate::span::Span;
use smallvec::SmallVec;
use std::rc::Rc;

// Most calls have ≤4 arguments, so inline storage avoids a heap alloc
type Args = SmallVec<[Value; 4]>;

/// Tree-walking evaluator.
///
/// Statements run strictly in order; the interrupt flag is checked between
/// statements and before every loop pass. A builtin that suspends is driven
/// to completion (or abandonment) right at its call site, one clock tick per
/// resumption, so no already-finished AST node is ever re-entered.
pub struct Interpreter {
    state: Rc<ExecState>,
    clock: Rc<dyn Clock>,
    /// The run's top-level scope. For-loop variables land here, and every
    /// function call frame chains to it (functions are global; there are no
    /// closures to capture anything narrower).
    globals: Rc<Environment>,
}

impl Interpreter {
    pub fn new(state: Rc<ExecState>, clock: Rc<dyn Clock>, globals: Rc<Environment>) -> Self {
        Interpreter {
            state,
            clock,
            globals,
        }
    }

    pub fn interpret(&self, program: &Program) -> Result<Value, RuntimeError> {
        let globals = Rc::clone(&self.globals);
        self.execute_body(&program.body, &globals)
    }

    fn should_stop(&self) -> bool {
        self.state.is_interrupted()
    }

    fn execute_body(&self, body: &[Stmt], env: &Rc<Environment>) -> Result<Value, RuntimeError> {
        let mut last = Value::Null;
        for stmt in body {
            if self.should_stop() {
                break;
            }
            last = self.execute(stmt, env)?;
        }
        Ok(last)
    }

    fn execute(&self, stmt: &Stmt, env: &Rc<Environment>) -> Result<Value, RuntimeError> {
        match &stmt.kind {
            StmtKind::Expr(expr) => self.evaluate(expr, env),

            StmtKind::Var { name, value } => {
                let value = self.evaluate(value, env)?;
                env.declare_or_assign(name, value.clone());
                Ok(value)
            }

            StmtKind::If {
                condition,
                body,
                alternate,
            } => {
                if self.eval_condition(condition, env)? {
                    self.execute_body(body, env)
                } else if let Some(alternate) = alternate {
                    self.execute_body(alternate, env)
                } else {
                    Ok(Value::Null)
                }
            }

            StmtKind::Loop { condition, body } => {
                let mut result = Value::Null;
                while !self.should_stop() && self.eval_condition(condition, env)? {
                    result = self.execute_body(body, env)?;
                }
                Ok(result)
            }

            StmtKind::For {
                varname,
                amount,
                body,
            } => self.execute_for(varname, amount, body, env, stmt.span),

            StmtKind::Func { name, params, body } => {
                env.set_function(
                    name,
                    Value::Fn(Rc::new(crate::interpreter::value::Function {
                        name: Rc::from(name.as_str()),
                        params: params.clone(),
                        body: Rc::clone(body),
                    })),
                );
                Ok(Value::Null)
            }
        }
    }

    fn execute_for(
        &self,
        varname: &str,
        amount: &Expr,
        body: &[Stmt],
        env: &Rc<Environment>,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        let amount = match self.evaluate(amount, env)? {
            Value::Num(n) => n,
            other => {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::TypeMismatch {
                        expected: "number",
                        found: other.type_name(),
                        context: "for-loop count",
                    },
                    span,
                ))
            }
        };

        // The loop variable lives in the run's global scope and holds 1..=n
        // while the body runs; it keeps its final value after the loop.
        self.globals.declare_or_assign(varname, Value::Num(0.0));

        let mut result = Value::Null;
        let mut counter = 0.0;
        while counter < amount && !self.should_stop() {
            counter += 1.0;
            self.globals.declare_or_assign(varname, Value::Num(counter));
            result = self.execute_body(body, env)?;
        }
        Ok(result)
    }

    fn eval_condition(&self, condition: &Expr, env: &Rc<Environment>) -> Result<bool, RuntimeError> {
        match self.evaluate(condition, env)? {
            Value::Bool(b) => Ok(b),
            other => Err(RuntimeError::new(
                RuntimeErrorKind::TypeMismatch {
                    expected: "boolean",
                    found: other.type_name(),
                    context: "condition",
                },
                condition.span,
            )),
        }
    }

    fn evaluate(&self, expr: &Expr, env: &Rc<Environment>) -> Result<Value, RuntimeError> {
        match &expr.kind {
            ExprKind::Num(n) => Ok(Value::Num(*n)),
            ExprKind::Str(s) => Ok(Value::Str(Rc::clone(s))),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),

            ExprKind::Identifier(name) => env
                .lookup(name)
                .map_err(|kind| RuntimeError::new(kind, expr.span)),

            ExprKind::Binary { left, op, right } => {
                let lhs = self.evaluate(left, env)?;
                let rhs = self.evaluate(right, env)?;
                self.eval_binary(lhs, *op, rhs, expr.span)
            }

            ExprKind::Logical { left, op, right } => {
                // both sides always evaluate; no short-circuiting
                let lhs = self.evaluate(left, env)?;
                let rhs = self.evaluate(right, env)?;
                self.eval_logical(lhs, *op, rhs, expr.span)
            }

            ExprKind::Call { name, args } => self.eval_call(name, args, env, expr.span),
        }
    }

    fn eval_binary(
        &self,
        lhs: Value,
        op: BinaryOp,
        rhs: Value,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        match (&lhs, &rhs) {
            (Value::Num(a), Value::Num(b)) => {
                // IEEE semantics throughout: division by zero yields ±inf/NaN
                let result = match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Rem => a % b,
                };
                Ok(Value::Num(result))
            }
            (Value::Str(_), _) | (_, Value::Str(_)) if op == BinaryOp::Add => {
                Ok(Value::Str(Rc::from(format!("{}{}", lhs, rhs).as_str())))
            }
            _ => Err(RuntimeError::new(
                RuntimeErrorKind::UnsupportedOperator {
                    op: op.to_string(),
                    lhs: lhs.type_name(),
                    rhs: rhs.type_name(),
                },
                span,
            )),
        }
    }

    fn eval_logical(
        &self,
        lhs: Value,
        op: LogicalOp,
        rhs: Value,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        let unsupported = || {
            RuntimeError::new(
                RuntimeErrorKind::UnsupportedOperator {
                    op: op.to_string(),
                    lhs: lhs.type_name(),
                    rhs: rhs.type_name(),
                },
                span,
            )
        };

        match op {
            LogicalOp::Equal => Ok(Value::Bool(lhs == rhs)),
            LogicalOp::NotEqual => Ok(Value::Bool(lhs != rhs)),

            LogicalOp::Less | LogicalOp::LessEqual | LogicalOp::Greater
            | LogicalOp::GreaterEqual => match (&lhs, &rhs) {
                (Value::Num(a), Value::Num(b)) => Ok(Value::Bool(compare(*a, *b, op))),
                (Value::Str(a), Value::Str(b)) => Ok(Value::Bool(match op {
                    LogicalOp::Less => a < b,
                    LogicalOp::LessEqual => a <= b,
                    LogicalOp::Greater => a > b,
                    _ => a >= b,
                })),
                _ => Err(unsupported()),
            },

            LogicalOp::And | LogicalOp::Or => match (&lhs, &rhs) {
                (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(if op == LogicalOp::And {
                    *a && *b
                } else {
                    *a || *b
                })),
                _ => Err(unsupported()),
            },
        }
    }

    fn eval_call(
        &self,
        name: &str,
        args: &[Expr],
        env: &Rc<Environment>,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        let func = env
            .get_function(name)
            .map_err(|kind| RuntimeError::new(kind, span))?;

        match func {
            Value::NativeFn(native) => {
                if let Some(arity) = native.arity {
                    if arity != args.len() {
                        return Err(RuntimeError::new(
                            RuntimeErrorKind::ArityMismatch {
                                name: name.to_string(),
                                expected: arity,
                                actual: args.len(),
                            },
                            span,
                        ));
                    }
                }
                let values = self.eval_args(args, env)?;
                match (native.func)(&values) {
                    Ok(BuiltinFlow::Done(value)) => Ok(value),
                    Ok(BuiltinFlow::Suspend(op)) => Ok(self.drive(op)),
                    Err(message) => {
                        Err(RuntimeError::new(RuntimeErrorKind::Builtin(message), span))
                    }
                }
            }

            Value::Fn(function) => {
                if function.params.len() != args.len() {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::ArityMismatch {
                            name: name.to_string(),
                            expected: function.params.len(),
                            actual: args.len(),
                        },
                        span,
                    ));
                }

                // Arguments evaluate in the caller's scope; parameters bind
                // into a fresh frame over the run's global scope, so
                // recursive and sibling calls stay isolated.
                let values = self.eval_args(args, env)?;
                let frame = Environment::with_parent(Rc::clone(&self.globals));
                for (param, value) in function.params.iter().zip(values) {
                    frame
                        .declare(param, value)
                        .map_err(|kind| RuntimeError::new(kind, span))?;
                }
                self.execute_body(&function.body, &frame)
            }

            // the function table only ever holds callables
            other => Err(RuntimeError::new(
                RuntimeErrorKind::TypeMismatch {
                    expected: "function",
                    found: other.type_name(),
                    context: "call target",
                },
                span,
            )),
        }
    }

    fn eval_args(&self, args: &[Expr], env: &Rc<Environment>) -> Result<Args, RuntimeError> {
        let mut values = Args::new();
        for arg in args {
            values.push(self.evaluate(arg, env)?);
        }
        Ok(values)
    }

    /// Advances a suspended builtin one tick at a time until it finishes or
    /// notices it belongs to a superseded run. The suspension never escapes
    /// the call site.
    fn drive(&self, mut op: Box<dyn PendingOp>) -> Value {
        loop {
            match op.resume() {
                OpStatus::Done(value) => return value,
                OpStatus::Abandoned => return Value::Null,
                OpStatus::Yield => self.clock.tick(),
            }
        }
    }
}

fn compare(a: f64, b: f64, op: LogicalOp) -> bool {
    match op {
        LogicalOp::Less => a < b,
        LogicalOp::LessEqual => a <= b,
        LogicalOp::Greater => a > b,
        LogicalOp::GreaterEqual => a >= b,
        _ => unreachable!("compare is only called for ordering operators"),
    }
}
