// Units (pixels for moves, degrees for turns) an animated turtle operation
// advances per clock tick. Negative means instant: no suspension at all.
pub const DEFAULT_SPEED: f64 = 5.0;

// Logical drawing surface; the turtle starts at its center, pointing up.
pub const DEFAULT_CANVAS_WIDTH: f64 = 800.0;
pub const DEFAULT_CANVAS_HEIGHT: f64 = 600.0;

// Frames per second the CLI clock runs suspended operations at.
pub const DEFAULT_FPS: u32 = 60;

pub struct RuntimeConfig {
    pub speed: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            // set default values here, unless overridden via command-line
            speed: DEFAULT_SPEED,
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
        }
    }
}
