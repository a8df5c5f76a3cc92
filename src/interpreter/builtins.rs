//! The registry boundary between the language core and its host
//! collaborators. Everything here goes through
//! `Environment::register_builtin`; the interpreter itself knows nothing
//! about turtles, consoles, or timers.

use crate::console::PrintSink;
use crate::interpreter::environment::Environment;
use crate::interpreter::exec::{ExecState, OpStatus, PendingOp};
use crate::interpreter::value::{BuiltinFlow, Value};
use crate::turtle::{CircleOp, MoveOp, RotateOp, Turtle};
use std::cell::RefCell;
use std::rc::Rc;

pub fn install(
    env: &Environment,
    turtle: &Rc<RefCell<Turtle>>,
    state: &Rc<ExecState>,
    sink: &Rc<dyn PrintSink>,
) {
    movement(env, turtle, state);
    pen(env, turtle);
    queries(env, turtle);
    console(env, sink);
    math(env);
    timers(env, state);
}

// ── argument helpers ─────────────────────────────────────────────────────────

fn num(args: &[Value], index: usize, name: &str) -> Result<f64, String> {
    match &args[index] {
        Value::Num(n) => Ok(*n),
        other => Err(format!(
            "{} expects a number, got {}",
            name,
            other.type_name()
        )),
    }
}

fn text(args: &[Value], index: usize, name: &str) -> Result<String, String> {
    match &args[index] {
        Value::Str(s) => Ok(s.to_string()),
        other => Err(format!(
            "{} expects a string, got {}",
            name,
            other.type_name()
        )),
    }
}

fn done() -> Result<BuiltinFlow, String> {
    Ok(BuiltinFlow::Done(Value::Null))
}

// ── movement (animated: these suspend unless speed is negative) ──────────────

fn movement(env: &Environment, turtle: &Rc<RefCell<Turtle>>, state: &Rc<ExecState>) {
    let (t, s) = (Rc::clone(turtle), Rc::clone(state));
    env.register_builtin("forward", Some(1), move |args| {
        let dist = num(args, 0, "forward")?;
        Ok(BuiltinFlow::Suspend(Box::new(MoveOp::new(
            Rc::clone(&t),
            Rc::clone(&s),
            dist,
        ))))
    });

    let (t, s) = (Rc::clone(turtle), Rc::clone(state));
    env.register_builtin("backward", Some(1), move |args| {
        let dist = num(args, 0, "backward")?;
        Ok(BuiltinFlow::Suspend(Box::new(MoveOp::new(
            Rc::clone(&t),
            Rc::clone(&s),
            -dist,
        ))))
    });

    let (t, s) = (Rc::clone(turtle), Rc::clone(state));
    env.register_builtin("right", Some(1), move |args| {
        let deg = num(args, 0, "right")?;
        Ok(BuiltinFlow::Suspend(Box::new(RotateOp::new(
            Rc::clone(&t),
            Rc::clone(&s),
            deg,
        ))))
    });

    let (t, s) = (Rc::clone(turtle), Rc::clone(state));
    env.register_builtin("left", Some(1), move |args| {
        let deg = num(args, 0, "left")?;
        Ok(BuiltinFlow::Suspend(Box::new(RotateOp::new(
            Rc::clone(&t),
            Rc::clone(&s),
            -deg,
        ))))
    });

    let (t, s) = (Rc::clone(turtle), Rc::clone(state));
    env.register_builtin("setheading", Some(1), move |args| {
        let target = num(args, 0, "setheading")?;
        let diff = t.borrow().heading_diff(target);
        Ok(BuiltinFlow::Suspend(Box::new(RotateOp::new(
            Rc::clone(&t),
            Rc::clone(&s),
            diff,
        ))))
    });

    let (t, s) = (Rc::clone(turtle), Rc::clone(state));
    env.register_builtin("circle", Some(1), move |args| {
        let radius = num(args, 0, "circle")?;
        Ok(BuiltinFlow::Suspend(Box::new(CircleOp::new(
            Rc::clone(&t),
            Rc::clone(&s),
            radius,
            360.0,
        ))))
    });

    let (t, s) = (Rc::clone(turtle), Rc::clone(state));
    env.register_builtin("semicircle", Some(1), move |args| {
        let radius = num(args, 0, "semicircle")?;
        Ok(BuiltinFlow::Suspend(Box::new(CircleOp::new(
            Rc::clone(&t),
            Rc::clone(&s),
            radius,
            180.0,
        ))))
    });

    let (t, s) = (Rc::clone(turtle), Rc::clone(state));
    env.register_builtin("arc", Some(2), move |args| {
        let radius = num(args, 0, "arc")?;
        let extent = num(args, 1, "arc")?;
        Ok(BuiltinFlow::Suspend(Box::new(CircleOp::new(
            Rc::clone(&t),
            Rc::clone(&s),
            radius,
            extent,
        ))))
    });

    // position control is instant
    let t = Rc::clone(turtle);
    env.register_builtin("goto", Some(2), move |args| {
        let x = num(args, 0, "goto")?;
        let y = num(args, 1, "goto")?;
        t.borrow_mut().goto(x, y);
        done()
    });

    let t = Rc::clone(turtle);
    env.register_builtin("setx", Some(1), move |args| {
        let x = num(args, 0, "setx")?;
        let (_, y) = t.borrow().logical_position();
        t.borrow_mut().goto(x, y);
        done()
    });

    let t = Rc::clone(turtle);
    env.register_builtin("sety", Some(1), move |args| {
        let y = num(args, 0, "sety")?;
        let (x, _) = t.borrow().logical_position();
        t.borrow_mut().goto(x, y);
        done()
    });

    let t = Rc::clone(turtle);
    env.register_builtin("home", Some(0), move |_| {
        t.borrow_mut().home();
        done()
    });
}

// ── pen, appearance, canvas control ──────────────────────────────────────────

fn pen(env: &Environment, turtle: &Rc<RefCell<Turtle>>) {
    let t = Rc::clone(turtle);
    env.register_builtin("penup", Some(0), move |_| {
        t.borrow_mut().state.pen_down = false;
        done()
    });

    let t = Rc::clone(turtle);
    env.register_builtin("pendown", Some(0), move |_| {
        t.borrow_mut().state.pen_down = true;
        done()
    });

    let t = Rc::clone(turtle);
    env.register_builtin("pensize", Some(1), move |args| {
        t.borrow_mut().state.size = num(args, 0, "pensize")?;
        done()
    });

    let t = Rc::clone(turtle);
    env.register_builtin("pencolor", Some(1), move |args| {
        t.borrow_mut().state.color = text(args, 0, "pencolor")?;
        done()
    });

    let t = Rc::clone(turtle);
    env.register_builtin("fillcolor", Some(1), move |args| {
        t.borrow_mut().state.fill_color = text(args, 0, "fillcolor")?;
        done()
    });

    let t = Rc::clone(turtle);
    env.register_builtin("color", Some(1), move |args| {
        let color = text(args, 0, "color")?;
        let mut t = t.borrow_mut();
        t.state.color = color.clone();
        t.state.fill_color = color;
        done()
    });

    let t = Rc::clone(turtle);
    env.register_builtin("begin_fill", Some(0), move |_| {
        t.borrow_mut().begin_fill();
        done()
    });

    let t = Rc::clone(turtle);
    env.register_builtin("end_fill", Some(0), move |_| {
        t.borrow_mut().end_fill();
        done()
    });

    let t = Rc::clone(turtle);
    env.register_builtin("dot", Some(0), move |_| {
        t.borrow_mut().dot(None);
        done()
    });

    let t = Rc::clone(turtle);
    env.register_builtin("stamp", Some(0), move |_| {
        t.borrow_mut().stamp();
        done()
    });

    let t = Rc::clone(turtle);
    env.register_builtin("write", Some(1), move |args| {
        t.borrow_mut().write(&args[0].to_string());
        done()
    });

    let t = Rc::clone(turtle);
    env.register_builtin("clear", Some(0), move |_| {
        t.borrow_mut().clear();
        done()
    });

    let t = Rc::clone(turtle);
    env.register_builtin("reset", Some(0), move |_| {
        t.borrow_mut().reset();
        done()
    });

    let t = Rc::clone(turtle);
    env.register_builtin("setspeed", Some(1), move |args| {
        t.borrow_mut().state.speed = num(args, 0, "setspeed")?;
        done()
    });

    let t = Rc::clone(turtle);
    env.register_builtin("hideturtle", Some(0), move |_| {
        t.borrow_mut().state.visible = false;
        done()
    });

    let t = Rc::clone(turtle);
    env.register_builtin("showturtle", Some(0), move |_| {
        t.borrow_mut().state.visible = true;
        done()
    });
}

// ── state queries ────────────────────────────────────────────────────────────

fn queries(env: &Environment, turtle: &Rc<RefCell<Turtle>>) {
    let t = Rc::clone(turtle);
    env.register_builtin("xcor", Some(0), move |_| {
        let x = t.borrow().position().0;
        Ok(BuiltinFlow::Done(Value::Num(x)))
    });

    let t = Rc::clone(turtle);
    env.register_builtin("ycor", Some(0), move |_| {
        let y = t.borrow().position().1;
        Ok(BuiltinFlow::Done(Value::Num(y)))
    });

    let t = Rc::clone(turtle);
    env.register_builtin("heading", Some(0), move |_| {
        let deg = t.borrow().heading();
        Ok(BuiltinFlow::Done(Value::Num(deg)))
    });

    let t = Rc::clone(turtle);
    env.register_builtin("isdown", Some(0), move |_| {
        let down = t.borrow().state.pen_down;
        Ok(BuiltinFlow::Done(Value::Bool(down)))
    });
}

// ── console ──────────────────────────────────────────────────────────────────

fn console(env: &Environment, sink: &Rc<dyn PrintSink>) {
    let out = Rc::clone(sink);
    env.register_builtin("print", Some(1), move |args| {
        out.print(&format!("{} ({})", args[0], args[0].type_name()));
        done()
    });

    env.register_builtin("join", Some(2), move |args| {
        let joined = format!("{}{}", args[0], args[1]);
        Ok(BuiltinFlow::Done(Value::Str(Rc::from(joined.as_str()))))
    });
}

// ── math ─────────────────────────────────────────────────────────────────────

fn math(env: &Environment) {
    fn unary(env: &Environment, name: &'static str, f: fn(f64) -> f64) {
        env.register_builtin(name, Some(1), move |args| {
            Ok(BuiltinFlow::Done(Value::Num(f(num(args, 0, name)?))))
        });
    }

    fn binary(env: &Environment, name: &'static str, f: fn(f64, f64) -> f64) {
        env.register_builtin(name, Some(2), move |args| {
            Ok(BuiltinFlow::Done(Value::Num(f(
                num(args, 0, name)?,
                num(args, 1, name)?,
            ))))
        });
    }

    unary(env, "sin", f64::sin);
    unary(env, "cos", f64::cos);
    unary(env, "tan", f64::tan);
    unary(env, "sqrt", f64::sqrt);
    unary(env, "abs", f64::abs);
    unary(env, "floor", f64::floor);
    unary(env, "ceil", f64::ceil);
    unary(env, "round", f64::round);
    binary(env, "min", f64::min);
    binary(env, "max", f64::max);
    binary(env, "pow", f64::powf);

    env.register_builtin("pi", Some(0), |_| {
        Ok(BuiltinFlow::Done(Value::Num(std::f64::consts::PI)))
    });
}

// ── timers ───────────────────────────────────────────────────────────────────

struct WaitOp {
    state: Rc<ExecState>,
    generation: u64,
    remaining: u64,
}

impl PendingOp for WaitOp {
    fn resume(&mut self) -> OpStatus {
        if self.state.is_stale(self.generation) {
            return OpStatus::Abandoned;
        }
        if self.remaining == 0 {
            return OpStatus::Done(Value::Null);
        }
        self.remaining -= 1;
        OpStatus::Yield
    }
}

fn timers(env: &Environment, state: &Rc<ExecState>) {
    let s = Rc::clone(state);
    env.register_builtin("wait", Some(1), move |args| {
        let ticks = num(args, 0, "wait")?.max(0.0) as u64;
        Ok(BuiltinFlow::Suspend(Box::new(WaitOp {
            state: Rc::clone(&s),
            generation: s.generation(),
            remaining: ticks,
        })))
    });
}
