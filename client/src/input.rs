//! Pointer reprojection and player commands

use shared::{to_game, Point, CANVAS_HEIGHT, CANVAS_WIDTH};

/// Pointer position in device coordinates, as the windowing layer reports it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub client_x: f32,
    pub client_y: f32,
}

impl PointerEvent {
    pub fn new(client_x: f32, client_y: f32) -> Self {
        Self { client_x, client_y }
    }
}

/// Where the drawing surface sits on the device, in device coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl SurfaceRect {
    /// A surface shown at exactly its canvas resolution at the device origin.
    pub fn canvas() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            right: CANVAS_WIDTH as f32,
            bottom: CANVAS_HEIGHT as f32,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Pointer(PointerEvent),
    ToggleDebug,
    /// Enter the matchmaking queue, or leave it if already queued.
    FindGame,
    LeaveGame,
    Quit,
}

/// Maps raw device input onto game-space and player commands.
pub struct InputManager;

impl InputManager {
    /// Reprojects a pointer position into game-space. `None` when the surface
    /// has no area or any coordinate is not finite.
    pub fn pointer_to_game(surface: &SurfaceRect, event: PointerEvent) -> Option<Point> {
        let (width, height) = (surface.width(), surface.height());
        if !(width > 0.0 && height > 0.0) {
            return None;
        }
        if !(event.client_x.is_finite() && event.client_y.is_finite()) {
            return None;
        }

        let canvas = Point::new(
            (event.client_x - surface.left) / width * CANVAS_WIDTH as f32,
            (event.client_y - surface.top) / height * CANVAS_HEIGHT as f32,
        );
        Some(to_game(canvas))
    }

    /// Parses one line of the text command interface.
    ///
    /// `move <x> <y>` takes device coordinates.
    pub fn parse_command(line: &str) -> Option<InputEvent> {
        let mut words = line.split_whitespace();
        let event = match words.next()? {
            "find" | "queue" => InputEvent::FindGame,
            "leave" => InputEvent::LeaveGame,
            "debug" => InputEvent::ToggleDebug,
            "quit" | "exit" => InputEvent::Quit,
            "move" => {
                let x: f32 = words.next()?.parse().ok()?;
                let y: f32 = words.next()?.parse().ok()?;
                if !(x.is_finite() && y.is_finite()) {
                    return None;
                }
                InputEvent::Pointer(PointerEvent::new(x, y))
            }
            _ => return None,
        };
        Some(event)
    }
}
