use std::time::{Duration, Instant};

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const FRAME_DURATION: Duration = Duration::from_millis(80);

/// Loading indicator shown while a question is in flight
#[derive(Debug, Clone)]
pub struct Spinner {
    frame: usize,
    last_advance: Instant,
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

impl Spinner {
    pub fn new() -> Self {
        Self {
            frame: 0,
            last_advance: Instant::now(),
        }
    }

    /// Advance if enough time passed. Returns true when the frame changed.
    pub fn tick(&mut self) -> bool {
        if self.last_advance.elapsed() >= FRAME_DURATION {
            self.step();
            true
        } else {
            false
        }
    }

    pub fn step(&mut self) {
        self.frame = (self.frame + 1) % FRAMES.len();
        self.last_advance = Instant::now();
    }

    pub fn symbol(&self) -> &'static str {
        FRAMES[self.frame]
    }
}
