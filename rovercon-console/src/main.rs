use macroquad::prelude::*;
use rovercon_core::{ControlConfig, DriveInput, GimbalInput, SessionCoordinator, WidgetRect};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::link::{DEFAULT_SERVER_URL, ServerLink};
use crate::map_view::MapPanel;
use crate::panel::JoystickPanel;

mod link;
mod map_view;
mod panel;

const MARGIN: f32 = 24.0;
const JOYSTICK_SIZE: f32 = 180.0;
const MAP_WIDTH: f32 = 380.0;
const MAP_HEIGHT: f32 = 300.0;
const BUTTON_WIDTH: f32 = 140.0;
const BUTTON_HEIGHT: f32 = 34.0;

struct Console {
    config: ControlConfig,
    session: SessionCoordinator,
    link: ServerLink,
    drive_stick: JoystickPanel,
    gimbal_stick: JoystickPanel,
    map: MapPanel,
    fullscreen: bool,
    fps: f32,
    fps_frame_count: u32,
    fps_last_update_time: f64,
}

impl Console {
    fn new(server_url: String, config: ControlConfig) -> Self {
        let link = ServerLink::connect(server_url);
        Self {
            drive_stick: JoystickPanel::new(config.joystick, "drive"),
            gimbal_stick: JoystickPanel::new(config.joystick, "camera"),
            config,
            session: SessionCoordinator::new(),
            link,
            map: MapPanel::new(),
            fullscreen: false,
            fps: 0.0,
            fps_frame_count: 0,
            fps_last_update_time: get_time(),
        }
    }

    fn drive_bounds() -> WidgetRect {
        WidgetRect::new(
            MARGIN,
            screen_height() - JOYSTICK_SIZE - MARGIN - 28.0,
            JOYSTICK_SIZE,
            JOYSTICK_SIZE,
        )
    }

    fn gimbal_bounds() -> WidgetRect {
        WidgetRect::new(
            screen_width() - JOYSTICK_SIZE - MARGIN,
            screen_height() - JOYSTICK_SIZE - MARGIN - 28.0,
            JOYSTICK_SIZE,
            JOYSTICK_SIZE,
        )
    }

    fn map_bounds() -> WidgetRect {
        WidgetRect::new(
            screen_width() - MAP_WIDTH - MARGIN,
            MARGIN,
            MAP_WIDTH,
            MAP_HEIGHT,
        )
    }

    fn reset_button_bounds() -> WidgetRect {
        let gimbal = Self::gimbal_bounds();
        WidgetRect::new(
            gimbal.x + (gimbal.w - BUTTON_WIDTH) / 2.0,
            gimbal.y - BUTTON_HEIGHT - 16.0,
            BUTTON_WIDTH,
            BUTTON_HEIGHT,
        )
    }

    fn update(&mut self) {
        for event in self.link.drain() {
            self.session.handle_event(event, &mut self.map);
        }

        {
            let mut listener = DriveInput {
                session: &mut self.session,
                sink: &mut self.link,
                config: &self.config,
            };
            self.drive_stick
                .process_input(Self::drive_bounds(), &mut listener);
        }

        {
            let mut listener = GimbalInput {
                session: &mut self.session,
                sink: &mut self.link,
                config: &self.config,
            };
            self.gimbal_stick
                .process_input(Self::gimbal_bounds(), &mut listener);
        }

        if is_key_pressed(KeyCode::F) {
            self.fullscreen = !self.fullscreen;
            set_fullscreen(self.fullscreen);
        }

        self.update_fps_if_due();
    }

    fn update_fps_if_due(&mut self) {
        let now = get_time();
        self.fps_frame_count += 1;
        let elapsed = now - self.fps_last_update_time;
        if elapsed >= 1.0 {
            self.fps = self.fps_frame_count as f32 / elapsed as f32;
            self.fps_frame_count = 0;
            self.fps_last_update_time = now;
        }
    }

    fn render(&mut self) {
        clear_background(Color::from_rgba(12, 14, 16, 255));

        self.map.draw(Self::map_bounds());
        self.drive_stick.draw(Self::drive_bounds());
        self.gimbal_stick.draw(Self::gimbal_bounds());

        if panel::button(Self::reset_button_bounds(), "reset camera") {
            self.session.reset_gimbal(&mut self.link);
        }

        let state = *self.session.state();
        let status_text = |connected: bool| if connected { "connected" } else { "disconnected" };
        let status_color = |connected: bool| if connected { GREEN } else { RED };

        draw_text("robot:", 20.0, 40.0, 24.0, WHITE);
        draw_text(
            status_text(state.robot_connected),
            110.0,
            40.0,
            24.0,
            status_color(state.robot_connected),
        );
        draw_text("camera:", 20.0, 64.0, 24.0, WHITE);
        draw_text(
            status_text(state.camera_connected),
            110.0,
            64.0,
            24.0,
            status_color(state.camera_connected),
        );

        draw_text(
            &format!("direction: {}", state.direction),
            20.0,
            88.0,
            24.0,
            WHITE,
        );
        draw_text(&format!("speed: {}", state.speed), 20.0, 112.0, 24.0, WHITE);
        draw_text(
            &format!(
                "camera angle: H:{}\u{b0} V:{}\u{b0}",
                state.horizontal_angle, state.vertical_angle
            ),
            20.0,
            136.0,
            24.0,
            WHITE,
        );
        draw_text(&format!("fps: {:.1}", self.fps), 20.0, 160.0, 24.0, WHITE);
        draw_text("F: fullscreen", 20.0, 184.0, 18.0, GRAY);
    }
}

fn load_config(path: Option<String>) -> ControlConfig {
    let Some(path) = path else {
        return ControlConfig::default();
    };

    let loaded = std::fs::read_to_string(&path)
        .map_err(anyhow::Error::from)
        .and_then(|text| ControlConfig::from_json(&text).map_err(anyhow::Error::from));

    match loaded {
        Ok(config) => config,
        Err(err) => {
            warn!(%err, %path, "failed to load config, using defaults");
            ControlConfig::default()
        }
    }
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Rover Console".to_string(),
        window_width: 1280,
        window_height: 720,
        high_dpi: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let server_url = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("ROVERCON_SERVER").ok())
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
    let config = load_config(std::env::args().nth(2));

    // Touches feed the trackers directly; a synthesized mouse would double
    // every joystick sample.
    simulate_mouse_with_touch(false);

    let mut console = Console::new(server_url, config);

    loop {
        console.update();
        console.render();

        next_frame().await;
    }
}
