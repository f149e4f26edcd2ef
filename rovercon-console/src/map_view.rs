use macroquad::prelude::*;
use rovercon_core::protocol::GeoPoint;
use rovercon_core::{MapSurface, Point, WidgetRect};
use std::collections::VecDeque;

const METERS_PER_DEGREE_LAT: f64 = 110_574.0;
const METERS_PER_DEGREE_LNG: f64 = 111_320.0;
const PIXELS_PER_METER: f32 = 12.0;
const MAX_PATH_POINTS: usize = 2048;
const ROBOT_RADIUS_PX: f32 = 7.0;

/// 2D map panel: robot marker with heading wedge, traveled path, sensed
/// obstacles. Positions are kept in local meters around the first fix
/// (equirectangular projection; rover excursions are far too small for the
/// curvature to matter). The view pans so the robot stays centered.
pub struct MapPanel {
    origin: Option<GeoPoint>,
    position: Point,
    heading: f32,
    has_fix: bool,
    path: VecDeque<Point>,
    obstacles: Vec<(Point, f32)>,
}

impl MapPanel {
    pub fn new() -> Self {
        Self {
            origin: None,
            position: Point::ZERO,
            heading: 0.0,
            has_fix: false,
            path: VecDeque::new(),
            obstacles: Vec::new(),
        }
    }

    /// Meters east/north of the first fix.
    fn project(&mut self, geo: GeoPoint) -> Point {
        let origin = *self.origin.get_or_insert(geo);
        let east =
            (geo.lng - origin.lng) * METERS_PER_DEGREE_LNG * origin.lat.to_radians().cos();
        let north = (geo.lat - origin.lat) * METERS_PER_DEGREE_LAT;
        Point::new(east as f32, north as f32)
    }

    pub fn draw(&self, bounds: WidgetRect) {
        draw_rectangle(
            bounds.x,
            bounds.y,
            bounds.w,
            bounds.h,
            Color::from_rgba(18, 22, 26, 255),
        );
        draw_rectangle_lines(
            bounds.x,
            bounds.y,
            bounds.w,
            bounds.h,
            2.0,
            Color::from_rgba(70, 80, 90, 255),
        );

        if !self.has_fix {
            draw_text(
                "waiting for position fix",
                bounds.x + 16.0,
                bounds.y + bounds.h / 2.0,
                20.0,
                GRAY,
            );
            return;
        }

        let center = bounds.center();
        let to_screen = |point: Point| {
            vec2(
                center.x + (point.x - self.position.x) * PIXELS_PER_METER,
                // north is up
                center.y - (point.y - self.position.y) * PIXELS_PER_METER,
            )
        };
        let visible = |screen: Vec2| {
            bounds.contains(Point::new(screen.x, screen.y))
        };

        let path_color = Color::from_rgba(76, 175, 80, 180);
        let mut previous: Option<Vec2> = None;
        for &point in &self.path {
            let screen = to_screen(point);
            if let Some(last) = previous {
                if visible(last) && visible(screen) {
                    draw_line(last.x, last.y, screen.x, screen.y, 3.0, path_color);
                }
            }
            previous = Some(screen);
        }

        let obstacle_color = Color::from_rgba(244, 67, 54, 128);
        for &(point, radius) in &self.obstacles {
            let screen = to_screen(point);
            if visible(screen) {
                draw_circle(screen.x, screen.y, radius * PIXELS_PER_METER, obstacle_color);
            }
        }

        // Robot marker sits at the panel center by construction.
        let robot = vec2(center.x, center.y);
        draw_circle(robot.x, robot.y, ROBOT_RADIUS_PX, Color::from_rgba(33, 150, 243, 255));
        draw_circle_lines(robot.x, robot.y, ROBOT_RADIUS_PX, 2.0, WHITE);

        // Heading wedge: 0 degrees is north (up), positive turns clockwise.
        let heading = self.heading.to_radians();
        let tip_direction = vec2(heading.sin(), -heading.cos());
        let wedge = |angle_offset: f32, length: f32| {
            let angle = heading + angle_offset;
            robot + vec2(angle.sin(), -angle.cos()) * length
        };
        draw_triangle(
            robot + tip_direction * (ROBOT_RADIUS_PX + 8.0),
            wedge(2.5, ROBOT_RADIUS_PX),
            wedge(-2.5, ROBOT_RADIUS_PX),
            Color::from_rgba(33, 150, 243, 255),
        );
    }
}

impl MapSurface for MapPanel {
    fn update_position(&mut self, position: GeoPoint, heading: f32) {
        self.position = self.project(position);
        self.heading = heading;
        self.has_fix = true;

        self.path.push_back(self.position);
        while self.path.len() > MAX_PATH_POINTS {
            self.path.pop_front();
        }
    }

    fn add_obstacle(&mut self, position: GeoPoint, radius: f32) {
        let local = self.project(position);
        self.obstacles.push((local, radius));
    }

    fn clear_obstacles(&mut self) {
        self.obstacles.clear();
    }

    fn clear_path(&mut self) {
        self.path.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_fix_becomes_the_origin() {
        let mut map = MapPanel::new();
        map.update_position(GeoPoint::new(48.85, 2.35), 0.0);
        assert_eq!(map.position, Point::ZERO);
        assert!(map.has_fix);
    }

    #[test]
    fn later_fixes_project_to_local_meters() {
        let mut map = MapPanel::new();
        map.update_position(GeoPoint::new(48.85, 2.35), 0.0);
        // One ten-thousandth of a degree north: roughly eleven meters.
        map.update_position(GeoPoint::new(48.8501, 2.35), 90.0);

        assert_eq!(map.position.x, 0.0);
        assert!((map.position.y - 11.06).abs() < 0.1);
        assert_eq!(map.heading, 90.0);
    }

    #[test]
    fn path_history_is_bounded() {
        let mut map = MapPanel::new();
        for step in 0..(MAX_PATH_POINTS + 100) {
            let lat = 48.85 + step as f64 * 1e-7;
            map.update_position(GeoPoint::new(lat, 2.35), 0.0);
        }
        assert_eq!(map.path.len(), MAX_PATH_POINTS);
    }

    #[test]
    fn clear_path_keeps_position_and_obstacles() {
        let mut map = MapPanel::new();
        map.update_position(GeoPoint::new(48.85, 2.35), 0.0);
        map.add_obstacle(GeoPoint::new(48.8501, 2.35), 0.5);

        map.clear_path();

        assert!(map.path.is_empty());
        assert!(map.has_fix);
        assert_eq!(map.obstacles.len(), 1);
    }

    #[test]
    fn obstacles_share_the_path_origin() {
        let mut map = MapPanel::new();
        map.update_position(GeoPoint::new(48.85, 2.35), 0.0);
        map.add_obstacle(GeoPoint::new(48.85, 2.35), 0.5);

        let (local, radius) = map.obstacles[0];
        assert_eq!(local, Point::ZERO);
        assert_eq!(radius, 0.5);
    }
}
