use crate::models::SwipePoint;

/// Horizontal travel, in pixels, a swipe needs before it navigates.
pub const SWIPE_THRESHOLD: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    /// Finger moved right: go back one day.
    Previous,
    /// Finger moved left: go forward one day.
    Next,
}

impl SwipeDirection {
    pub fn delta(self) -> i64 {
        match self {
            SwipeDirection::Previous => -1,
            SwipeDirection::Next => 1,
        }
    }
}

/// Follows one touch from start to end.
///
/// Once the vertical displacement exceeds the horizontal one the gesture is a
/// scroll and stays that way until the next `begin`.
#[derive(Debug, Clone, Default)]
pub struct SwipeTracker {
    origin: Option<(f64, f64)>,
    last: (f64, f64),
    aborted: bool,
}

impl SwipeTracker {
    pub fn begin(&mut self, x: f64, y: f64) {
        self.origin = Some((x, y));
        self.last = (0.0, 0.0);
        self.aborted = false;
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        let Some((ox, oy)) = self.origin else {
            return;
        };
        self.observe(x - ox, y - oy);
    }

    pub fn end(&mut self, x: f64, y: f64) -> Option<SwipeDirection> {
        self.move_to(x, y);
        self.origin.take()?;
        self.finish()
    }

    fn observe(&mut self, dx: f64, dy: f64) {
        if dy.abs() > dx.abs() {
            self.aborted = true;
        }
        self.last = (dx, dy);
    }

    fn finish(&self) -> Option<SwipeDirection> {
        if self.aborted {
            return None;
        }
        let (dx, _) = self.last;
        if dx > SWIPE_THRESHOLD {
            Some(SwipeDirection::Previous)
        } else if dx < -SWIPE_THRESHOLD {
            Some(SwipeDirection::Next)
        } else {
            None
        }
    }
}

/// Classifies a gesture given as displacements from the touch origin, in
/// order; the last point is where the finger lifted.
pub fn classify(points: &[SwipePoint]) -> Option<SwipeDirection> {
    let mut tracker = SwipeTracker::default();
    tracker.begin(0.0, 0.0);
    let (last, path) = points.split_last()?;
    for point in path {
        tracker.move_to(point.dx, point.dy);
    }
    tracker.end(last.dx, last.dy)
}
