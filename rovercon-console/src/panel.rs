use macroquad::prelude::*;
use rovercon_core::{
    JoystickConfig, JoystickListener, JoystickTracker, Point, PointerId, WidgetRect,
};

const KNOB_RADIUS: f32 = 22.0;

/// One on-screen joystick: a tracker plus its drawing. Bounds are supplied
/// every frame, so the widgets follow window resizes for free.
pub struct JoystickPanel {
    tracker: JoystickTracker,
    label: &'static str,
}

impl JoystickPanel {
    pub fn new(config: JoystickConfig, label: &'static str) -> Self {
        Self {
            tracker: JoystickTracker::new(config, WidgetRect::default()),
            label,
        }
    }

    /// Translate this frame's pointer events into tracker calls. Touch moves
    /// and releases are observed globally (a drag may leave the widget); the
    /// tracker's capture filter sorts out which pointer it follows.
    pub fn process_input(&mut self, bounds: WidgetRect, listener: &mut dyn JoystickListener) {
        self.tracker.update_bounds(bounds);

        for touch in touches() {
            let pointer = PointerId::Touch(touch.id);
            let position = Point::new(touch.position.x, touch.position.y);
            match touch.phase {
                TouchPhase::Started => {
                    if bounds.contains(position) {
                        self.tracker.start(pointer, position, listener);
                    }
                }
                TouchPhase::Moved | TouchPhase::Stationary => {
                    self.tracker.pointer_move(pointer, position, listener);
                }
                TouchPhase::Ended | TouchPhase::Cancelled => {
                    self.tracker.end(pointer, listener);
                }
            }
        }

        let (mouse_x, mouse_y) = mouse_position();
        let position = Point::new(mouse_x, mouse_y);
        if is_mouse_button_pressed(MouseButton::Left) && bounds.contains(position) {
            self.tracker.start(PointerId::Mouse, position, listener);
        } else if is_mouse_button_down(MouseButton::Left) {
            self.tracker.pointer_move(PointerId::Mouse, position, listener);
        }
        if is_mouse_button_released(MouseButton::Left) {
            self.tracker.end(PointerId::Mouse, listener);
        }
    }

    pub fn draw(&self, bounds: WidgetRect) {
        let center = bounds.center();
        let radius = bounds.w.min(bounds.h) / 2.0;

        let base = if self.tracker.is_active() {
            Color::from_rgba(40, 48, 56, 255)
        } else {
            Color::from_rgba(30, 36, 42, 255)
        };
        draw_circle(center.x, center.y, radius, base);
        draw_circle_lines(center.x, center.y, radius, 2.0, Color::from_rgba(90, 100, 110, 255));

        let offset = self.tracker.offset();
        draw_circle(
            center.x + offset.x,
            center.y + offset.y,
            KNOB_RADIUS,
            Color::from_rgba(120, 144, 156, 255),
        );

        let label_width = measure_text(self.label, None, 18, 1.0).width;
        draw_text(
            self.label,
            center.x - label_width / 2.0,
            bounds.y + bounds.h + 22.0,
            18.0,
            GRAY,
        );
    }
}

/// Immediate-mode push button: draws and reports a click in one call.
pub fn button(bounds: WidgetRect, label: &str) -> bool {
    let (mouse_x, mouse_y) = mouse_position();
    let hovered = bounds.contains(Point::new(mouse_x, mouse_y));

    let fill = if hovered {
        Color::from_rgba(55, 65, 75, 255)
    } else {
        Color::from_rgba(40, 48, 56, 255)
    };
    draw_rectangle(bounds.x, bounds.y, bounds.w, bounds.h, fill);
    draw_rectangle_lines(bounds.x, bounds.y, bounds.w, bounds.h, 2.0, GRAY);

    let text = measure_text(label, None, 18, 1.0);
    draw_text(
        label,
        bounds.x + (bounds.w - text.width) / 2.0,
        bounds.y + bounds.h / 2.0 + text.height / 2.0,
        18.0,
        WHITE,
    );

    let clicked = hovered && is_mouse_button_pressed(MouseButton::Left);
    let tapped = touches().iter().any(|touch| {
        matches!(touch.phase, TouchPhase::Started)
            && bounds.contains(Point::new(touch.position.x, touch.position.y))
    });
    clicked || tapped
}
