use crate::interpreter::exec::{ExecState, OpStatus, PendingOp};
use crate::interpreter::value::Value;
use std::cell::RefCell;
use std::f64::consts::PI;
use std::rc::Rc;

/// A drawn line piece. Hosts replay these to render; the core never touches
/// a real canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub color: String,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mark {
    Dot {
        x: f64,
        y: f64,
        radius: f64,
        color: String,
    },
    Stamp {
        x: f64,
        y: f64,
        angle: f64,
        color: String,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        color: String,
    },
    Fill {
        points: Vec<(f64, f64)>,
        color: String,
    },
}

#[derive(Debug, Clone)]
pub struct TurtleState {
    pub x: f64,
    pub y: f64,
    pub angle: f64, // radians; -PI/2 points up
    pub pen_down: bool,
    pub color: String,
    pub fill_color: String,
    pub size: f64,
    pub speed: f64, // units per tick; negative means instant
    pub visible: bool,
}

/// Headless turtle canvas: position, heading, pen state, and the geometry
/// drawn so far. Animated movement is sliced into per-tick steps by the
/// pending operations below.
pub struct Turtle {
    pub state: TurtleState,
    width: f64,
    height: f64,
    segments: Vec<Segment>,
    marks: Vec<Mark>,
    fill_path: Vec<(f64, f64)>,
    is_filling: bool,
}

impl Turtle {
    pub fn new(width: f64, height: f64, speed: f64) -> Self {
        let mut turtle = Turtle {
            state: default_state(width, height, speed),
            width,
            height,
            segments: Vec::new(),
            marks: Vec::new(),
            fill_path: Vec::new(),
            is_filling: false,
        };
        turtle.reset();
        turtle
    }

    pub fn reset(&mut self) {
        let speed = self.state.speed;
        self.state = default_state(self.width, self.height, speed);
        self.segments.clear();
        self.marks.clear();
        self.fill_path.clear();
        self.is_filling = false;
    }

    pub fn clear(&mut self) {
        self.segments.clear();
        self.marks.clear();
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn position(&self) -> (f64, f64) {
        (self.state.x, self.state.y)
    }

    pub fn heading(&self) -> f64 {
        (self.state.angle * 180.0 / PI) % 360.0
    }

    /// Moves the pen to an absolute point, drawing if the pen is down.
    pub fn line_to(&mut self, x: f64, y: f64) {
        if self.state.pen_down {
            self.segments.push(Segment {
                x1: self.state.x,
                y1: self.state.y,
                x2: x,
                y2: y,
                color: self.state.color.clone(),
                width: self.state.size,
            });
        }
        self.state.x = x;
        self.state.y = y;
        if self.is_filling {
            self.fill_path.push((x, y));
        }
    }

    /// Full move along the current heading, in one step.
    pub fn move_by(&mut self, distance: f64) {
        let (x, y) = self.destination(distance);
        self.line_to(x, y);
    }

    pub fn destination(&self, distance: f64) -> (f64, f64) {
        (
            self.state.x + self.state.angle.cos() * distance,
            self.state.y + self.state.angle.sin() * distance,
        )
    }

    pub fn rotate_by(&mut self, degrees: f64) {
        self.state.angle += degrees * PI / 180.0;
    }

    /// Degrees needed to face `target` (shortest way around).
    pub fn heading_diff(&self, target: f64) -> f64 {
        let current = self.state.angle * 180.0 / PI;
        (target - current + 180.0).rem_euclid(360.0) - 180.0
    }

    /// Cartesian move: (0, 0) is the canvas center, y grows upward.
    pub fn goto(&mut self, x: f64, y: f64) {
        let px = self.width / 2.0 + x;
        let py = self.height / 2.0 - y;
        self.line_to(px, py);
    }

    pub fn logical_position(&self) -> (f64, f64) {
        (
            self.state.x - self.width / 2.0,
            self.height / 2.0 - self.state.y,
        )
    }

    pub fn home(&mut self) {
        self.goto(0.0, 0.0);
        self.state.angle = -PI / 2.0;
    }

    pub fn dot(&mut self, radius: Option<f64>) {
        self.marks.push(Mark::Dot {
            x: self.state.x,
            y: self.state.y,
            radius: radius.unwrap_or(self.state.size * 2.0),
            color: self.state.color.clone(),
        });
    }

    pub fn stamp(&mut self) {
        self.marks.push(Mark::Stamp {
            x: self.state.x,
            y: self.state.y,
            angle: self.state.angle,
            color: self.state.color.clone(),
        });
    }

    pub fn write(&mut self, text: &str) {
        self.marks.push(Mark::Text {
            x: self.state.x,
            y: self.state.y,
            text: text.to_string(),
            color: self.state.color.clone(),
        });
    }

    pub fn begin_fill(&mut self) {
        self.is_filling = true;
        self.fill_path = vec![(self.state.x, self.state.y)];
    }

    pub fn end_fill(&mut self) {
        if self.is_filling && self.fill_path.len() >= 3 {
            self.marks.push(Mark::Fill {
                points: std::mem::take(&mut self.fill_path),
                color: self.state.fill_color.clone(),
            });
        }
        self.is_filling = false;
        self.fill_path.clear();
    }
}

fn default_state(width: f64, height: f64, speed: f64) -> TurtleState {
    TurtleState {
        x: width / 2.0,
        y: height / 2.0,
        angle: -PI / 2.0,
        pen_down: true,
        color: "white".to_string(),
        fill_color: "white".to_string(),
        size: 2.0,
        speed,
        visible: true,
    }
}

// ── suspended operations ─────────────────────────────────────────────────────

/// Straight move sliced into per-tick steps of `speed` units.
pub struct MoveOp {
    turtle: Rc<RefCell<Turtle>>,
    state: Rc<ExecState>,
    generation: u64,
    start: (f64, f64),
    end: (f64, f64),
    step: usize,
    total: usize,
}

impl MoveOp {
    pub fn new(turtle: Rc<RefCell<Turtle>>, state: Rc<ExecState>, distance: f64) -> Self {
        let (start, end, speed) = {
            let t = turtle.borrow();
            (t.position(), t.destination(distance), t.state.speed)
        };
        // speed < 0 means instant: the whole move happens on the first resume
        let total = if speed < 0.0 {
            1
        } else {
            ((distance / speed).abs().ceil() as usize).max(2)
        };
        MoveOp {
            turtle,
            state: Rc::clone(&state),
            generation: state.generation(),
            start,
            end,
            step: 0,
            total,
        }
    }
}

impl PendingOp for MoveOp {
    fn resume(&mut self) -> OpStatus {
        if self.state.is_stale(self.generation) {
            return OpStatus::Abandoned;
        }

        self.step += 1;
        let progress = self.step as f64 / self.total as f64;
        let x = self.start.0 + (self.end.0 - self.start.0) * progress;
        let y = self.start.1 + (self.end.1 - self.start.1) * progress;
        self.turtle.borrow_mut().line_to(x, y);

        if self.step >= self.total {
            OpStatus::Done(Value::Null)
        } else {
            OpStatus::Yield
        }
    }
}

/// Turn sliced into per-tick steps of `speed` degrees.
pub struct RotateOp {
    turtle: Rc<RefCell<Turtle>>,
    state: Rc<ExecState>,
    generation: u64,
    start_angle: f64,
    target_angle: f64,
    step: usize,
    total: usize,
}

impl RotateOp {
    pub fn new(turtle: Rc<RefCell<Turtle>>, state: Rc<ExecState>, degrees: f64) -> Self {
        let (start_angle, speed) = {
            let t = turtle.borrow();
            (t.state.angle, t.state.speed)
        };
        let target_angle = start_angle + degrees * PI / 180.0;
        let total = if speed < 0.0 {
            1
        } else {
            ((degrees / speed).abs().ceil() as usize).max(1)
        };
        RotateOp {
            turtle,
            state: Rc::clone(&state),
            generation: state.generation(),
            start_angle,
            target_angle,
            step: 0,
            total,
        }
    }
}

impl PendingOp for RotateOp {
    fn resume(&mut self) -> OpStatus {
        if self.state.is_stale(self.generation) {
            return OpStatus::Abandoned;
        }

        self.step += 1;
        let progress = self.step as f64 / self.total as f64;
        self.turtle.borrow_mut().state.angle =
            self.start_angle + (self.target_angle - self.start_angle) * progress;

        if self.step >= self.total {
            self.turtle.borrow_mut().state.angle = self.target_angle;
            OpStatus::Done(Value::Null)
        } else {
            OpStatus::Yield
        }
    }
}

/// Arc drawn as chord steps, one chord per tick: half-turn, chord move,
/// half-turn, like the original plotter.
pub struct CircleOp {
    turtle: Rc<RefCell<Turtle>>,
    state: Rc<ExecState>,
    generation: u64,
    chord: f64,
    half_turn: f64,
    step: usize,
    total: usize,
    instant: bool,
}

impl CircleOp {
    pub fn new(turtle: Rc<RefCell<Turtle>>, state: Rc<ExecState>, radius: f64, extent: f64) -> Self {
        let steps = (4.0 * (extent.abs() / 180.0))
            .max((extent.abs() / 16.0).floor())
            .max(1.0);
        let step_angle = extent / steps;
        let step_angle_rad = step_angle.abs() * PI / 180.0;
        let chord = 2.0 * radius.abs() * (step_angle_rad / 2.0).sin();
        let direction = if radius < 0.0 { -1.0 } else { 1.0 };
        let instant = turtle.borrow().state.speed < 0.0;
        CircleOp {
            turtle,
            state: Rc::clone(&state),
            generation: state.generation(),
            chord,
            half_turn: -(step_angle / 2.0) * direction,
            step: 0,
            total: steps as usize,
            instant,
        }
    }

    fn one_chord(&mut self) {
        let mut t = self.turtle.borrow_mut();
        t.rotate_by(self.half_turn);
        t.move_by(self.chord);
        t.rotate_by(self.half_turn);
    }
}

impl PendingOp for CircleOp {
    fn resume(&mut self) -> OpStatus {
        if self.state.is_stale(self.generation) {
            return OpStatus::Abandoned;
        }

        if self.instant {
            while self.step < self.total {
                self.one_chord();
                self.step += 1;
            }
            return OpStatus::Done(Value::Null);
        }

        self.one_chord();
        self.step += 1;
        if self.step >= self.total {
            OpStatus::Done(Value::Null)
        } else {
            OpStatus::Yield
        }
    }
}
