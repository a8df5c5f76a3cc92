use crate::config::RuntimeConfig;
use crate::console::PrintSink;
use crate::interpreter::builtins;
use crate::interpreter::environment::Environment;
use crate::interpreter::exec::{Clock, ExecState, InterruptHandle};
use crate::interpreter::value::Value;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::scanner::token::TokenKind;
use crate::scanner::Scanner;
use crate::span::Span;
use crate::turtle::Turtle;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lexer,
    Parser,
    Runtime,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Lexer => "lex",
            Stage::Parser => "parse",
            Stage::Runtime => "runtime",
        }
    }
}

/// The uniform failure record handed to the host: which stage failed, where,
/// and why. A failed stage never hands anything to the next one.
#[derive(Debug, Clone)]
pub struct RunError {
    pub stage: Stage,
    pub span: Span,
    pub message: String,
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.stage.as_str(), self.message)
    }
}

/// The front door: owns the builtin environment, the shared execution state,
/// and the headless turtle, and runs source through lex → parse → evaluate.
pub struct Runtime {
    base_env: Rc<Environment>,
    state: Rc<ExecState>,
    keywords: HashMap<String, TokenKind>,
    clock: Rc<dyn Clock>,
    turtle: Rc<RefCell<Turtle>>,
}

impl Runtime {
    pub fn new(
        config: RuntimeConfig,
        keywords: HashMap<String, TokenKind>,
        sink: Rc<dyn PrintSink>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let state = ExecState::new();
        let turtle = Rc::new(RefCell::new(Turtle::new(
            config.canvas_width,
            config.canvas_height,
            config.speed,
        )));

        let base_env = Environment::new();
        builtins::install(&base_env, &turtle, &state, &sink);

        Runtime {
            base_env,
            state,
            keywords,
            clock,
            turtle,
        }
    }

    /// Handle for hosts that want to cancel from outside the evaluation
    /// stack (a Stop button, a signal handler shim, a test clock).
    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle::new(Rc::clone(&self.state))
    }

    pub fn interrupt(&self) {
        self.state.interrupt();
    }

    pub fn turtle(&self) -> Rc<RefCell<Turtle>> {
        Rc::clone(&self.turtle)
    }

    /// Lex → parse → evaluate. Each run gets a fresh variable scope over the
    /// shared root (builtins plus previously declared functions persist).
    /// Starting a run while another is flagged live interrupts the old one
    /// first; bumping the generation strands any of its suspended operations.
    pub fn run(&mut self, source: &str) -> Result<Value, RunError> {
        let tokens = Scanner::new(source, &self.keywords)
            .scan_tokens()
            .map_err(|e| RunError {
                stage: Stage::Lexer,
                span: e.span,
                message: e.message,
            })?;

        let program = Parser::new(tokens).parse().map_err(|e| RunError {
            stage: Stage::Parser,
            span: e.span,
            message: e.message,
        })?;

        if self.state.is_running() {
            self.state.interrupt();
        }
        self.state.begin_run();

        let run_env = Environment::with_parent(Rc::clone(&self.base_env));
        let interpreter =
            Interpreter::new(Rc::clone(&self.state), Rc::clone(&self.clock), run_env);
        let result = interpreter.interpret(&program);
        self.state.finish_run();

        result.map_err(|e| RunError {
            stage: Stage::Runtime,
            span: e.span,
            message: e.to_string(),
        })
    }
}
