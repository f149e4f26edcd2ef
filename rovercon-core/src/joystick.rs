use crate::config::JoystickConfig;
use crate::geometry::{Point, WidgetRect};

/// Identity of the pointer currently captured by a tracker. Touch ids come
/// from the windowing layer; the mouse is a single implicit pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerId {
    Mouse,
    Touch(u64),
}

/// Receiver for tracker output. Implemented by the session-side input
/// adapters, and by plain recorders in tests.
pub trait JoystickListener {
    fn on_move(&mut self, vector: Point);
    fn on_end(&mut self, vector: Point);
}

/// Bounded 2D pointer tracker behind a virtual joystick widget.
///
/// Tracks one pointer at a time. The offset stays within `max_distance` of
/// the widget center; the normalized vector is the offset divided by
/// `max_distance` with the dead zone applied to each axis independently.
#[derive(Debug)]
pub struct JoystickTracker {
    config: JoystickConfig,
    bounds: WidgetRect,
    origin: Point,
    pointer: Option<PointerId>,
    offset: Point,
    normalized: Point,
}

impl JoystickTracker {
    pub fn new(config: JoystickConfig, bounds: WidgetRect) -> Self {
        Self {
            config,
            bounds,
            origin: bounds.center(),
            pointer: None,
            offset: Point::ZERO,
            normalized: Point::ZERO,
        }
    }

    /// Record the widget's current bounds. The tracking origin is taken from
    /// these bounds at `start`, so calling this every frame keeps the tracker
    /// correct across window resizes and layout changes.
    pub fn update_bounds(&mut self, bounds: WidgetRect) {
        self.bounds = bounds;
    }

    pub fn is_active(&self) -> bool {
        self.pointer.is_some()
    }

    /// Offset of the knob from the widget center, in device pixels.
    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn normalized(&self) -> Point {
        self.normalized
    }

    /// Capture a pointer and begin tracking. Ignored while another pointer
    /// holds the capture: only the first touch on the widget is tracked.
    pub fn start(&mut self, pointer: PointerId, position: Point, listener: &mut dyn JoystickListener) {
        if self.pointer.is_some() {
            return;
        }

        self.pointer = Some(pointer);
        // Recomputed from the current bounds, not cached at construction.
        self.origin = self.bounds.center();
        self.track(position, listener);
    }

    /// Follow a captured pointer. No-op when inactive or when `pointer` is
    /// not the captured one. Fires the move callback on every call while
    /// active.
    pub fn pointer_move(
        &mut self,
        pointer: PointerId,
        position: Point,
        listener: &mut dyn JoystickListener,
    ) {
        if self.pointer != Some(pointer) {
            return;
        }
        self.track(position, listener);
    }

    /// Release the capture. With auto-return the knob snaps back to center
    /// before the end callback; otherwise the last vector is reported.
    pub fn end(&mut self, pointer: PointerId, listener: &mut dyn JoystickListener) {
        if self.pointer != Some(pointer) {
            return;
        }

        self.pointer = None;
        if self.config.auto_return {
            self.offset = Point::ZERO;
            self.normalized = Point::ZERO;
        }
        listener.on_end(self.normalized);
    }

    fn track(&mut self, position: Point, listener: &mut dyn JoystickListener) {
        let dx = position.x - self.origin.x;
        let dy = position.y - self.origin.y;

        let distance = (dx * dx + dy * dy).sqrt().min(self.config.max_distance);
        let angle = dy.atan2(dx);

        self.offset = Point::new(angle.cos() * distance, angle.sin() * distance);

        let mut normalized = Point::new(
            self.offset.x / self.config.max_distance,
            self.offset.y / self.config.max_distance,
        );
        if normalized.x.abs() < self.config.dead_zone {
            normalized.x = 0.0;
        }
        if normalized.y.abs() < self.config.dead_zone {
            normalized.y = 0.0;
        }
        self.normalized = normalized;

        listener.on_move(self.normalized);
    }
}
