use crate::interpreter::value::Value;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Per-run execution flags shared between the runtime, the interpreter's
/// statement loop, and suspended builtin operations. Only one run is live at
/// a time; the generation counter tells a resumed operation whether it still
/// belongs to that run.
#[derive(Debug, Default)]
pub struct ExecState {
    interrupted: Cell<bool>,
    running: Cell<bool>,
    generation: Cell<u64>,
}

impl ExecState {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Starts a new run: bumps the generation (invalidating any operation
    /// still suspended from a superseded run) and clears the interrupt flag.
    /// Returns the new run's generation.
    pub fn begin_run(&self) -> u64 {
        self.generation.set(self.generation.get() + 1);
        self.interrupted.set(false);
        self.running.set(true);
        self.generation.get()
    }

    pub fn finish_run(&self) {
        self.running.set(false);
    }

    /// Cooperative cancellation: observed between statements and on every
    /// resumption of a suspended operation, never preempted.
    pub fn interrupt(&self) {
        self.interrupted.set(true);
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.get()
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// True when the given operation no longer belongs to the live run and
    /// must abandon its remaining side effects.
    pub fn is_stale(&self, generation: u64) -> bool {
        self.interrupted.get() || self.generation.get() != generation
    }
}

/// Handle a host can keep to cancel an in-flight run (e.g. when the user
/// re-runs the program while the previous one is still animating).
#[derive(Clone)]
pub struct InterruptHandle(Rc<ExecState>);

impl InterruptHandle {
    pub fn new(state: Rc<ExecState>) -> Self {
        InterruptHandle(state)
    }

    pub fn interrupt(&self) {
        self.0.interrupt();
    }
}

/// A timed builtin operation, advanced once per driver tick.
pub trait PendingOp {
    fn resume(&mut self) -> OpStatus;
}

pub enum OpStatus {
    /// Did one step of work; resume again next tick.
    Yield,
    /// Finished; this is the builtin call's value.
    Done(Value),
    /// The run was superseded or interrupted; no value, no more side effects.
    Abandoned,
}

/// Host scheduling for suspended operations. The interpreter's driver calls
/// `tick` between resumptions; the host decides what a tick means.
pub trait Clock {
    fn tick(&self);
}

/// Real-time clock for the CLI: one tick per animation frame.
pub struct FrameClock {
    frame: Duration,
}

impl FrameClock {
    pub fn new(fps: u32) -> Self {
        FrameClock {
            frame: Duration::from_secs(1) / fps.max(1),
        }
    }
}

impl Clock for FrameClock {
    fn tick(&self) {
        std::thread::sleep(self.frame);
    }
}
