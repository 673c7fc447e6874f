use crate::error::ClientError;
use crate::input::SurfaceRect;
use log::trace;
use shared::{
    to_canvas, Point, Position, Score, CANVAS_HEIGHT, CANVAS_WIDTH, ENTITY_RADIUS, FONT_SIZE,
    GAME_HEIGHT, GAME_WIDTH, GATES_WIDTH, SECONDARY_FONT_SIZE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Start,
    Center,
}

/// Drawing primitives provided by the host. Coordinates are canvas-space.
pub trait Surface {
    /// False when the host has no usable 2-D drawing context.
    fn context_available(&self) -> bool {
        true
    }

    fn bounds(&self) -> SurfaceRect;
    fn clear(&mut self);
    fn line(&mut self, from: Point, to: Point);
    fn circle(&mut self, center: Point, radius: f32, filled: bool);
    fn text(&mut self, text: &str, at: Point, size: i32, align: TextAlign);
}

/// What one frame shows, in game-space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scene {
    pub player: Point,
    pub opponent: Point,
    pub puck: Point,
    pub score: Score,
    pub debug: bool,
}

pub struct Renderer<S> {
    surface: S,
    frames: u64,
}

impl<S: Surface> Renderer<S> {
    pub fn new(surface: S) -> Result<Self, ClientError> {
        if !surface.context_available() {
            return Err(ClientError::UnsupportedEnvironment {
                detail: "no 2-D drawing context available".to_string(),
            });
        }

        Ok(Renderer { surface, frames: 0 })
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The idle field shown behind the menu: both players at their start spots.
    pub fn draw_menu(&mut self) {
        self.surface.clear();
        self.draw_field();
        self.draw_player(Position::player_start().into());
        self.draw_player(Position::opponent_start().into());
    }

    pub fn render(&mut self, scene: &Scene) {
        self.frames += 1;
        trace!("Frame {}: {:?}", self.frames, scene);

        self.surface.clear();
        self.draw_field();
        self.draw_player(scene.player);
        self.draw_player(scene.opponent);
        self.draw_puck(scene.puck);
        self.draw_goals(scene.score);

        if scene.debug {
            self.draw_debug(scene);
        }
    }

    /// Outline of the rink with a gate gap centred in the top and bottom lines.
    fn draw_field(&mut self) {
        let (w, h) = (GAME_WIDTH as f32, GAME_HEIGHT as f32);
        let gate_left = (GAME_WIDTH - GATES_WIDTH) as f32 / 2.0;
        let gate_right = (GAME_WIDTH + GATES_WIDTH) as f32 / 2.0;

        let segments = [
            ((0.0, 0.0), (gate_left, 0.0)),
            ((gate_right, 0.0), (w, 0.0)),
            ((w, 0.0), (w, h)),
            ((w, h), (gate_right, h)),
            ((gate_left, h), (0.0, h)),
            ((0.0, h), (0.0, 0.0)),
        ];

        for ((x0, y0), (x1, y1)) in segments {
            self.surface
                .line(to_canvas(Point::new(x0, y0)), to_canvas(Point::new(x1, y1)));
        }
    }

    fn draw_player(&mut self, at: Point) {
        self.surface
            .circle(to_canvas(at), ENTITY_RADIUS as f32, false);
    }

    fn draw_puck(&mut self, at: Point) {
        self.surface.circle(to_canvas(at), ENTITY_RADIUS as f32, true);
    }

    fn draw_goals(&mut self, score: Score) {
        let center = CANVAS_WIDTH as f32 / 2.0;
        self.surface.text(
            &score.a.to_string(),
            Point::new(center, CANVAS_HEIGHT as f32),
            FONT_SIZE,
            TextAlign::Center,
        );
        self.surface.text(
            &score.b.to_string(),
            Point::new(center, FONT_SIZE as f32),
            FONT_SIZE,
            TextAlign::Center,
        );
    }

    fn draw_debug(&mut self, scene: &Scene) {
        let rows = [
            (
                format!("A:{}:{}", scene.player.x, scene.player.y),
                (GAME_HEIGHT - FONT_SIZE) as f32,
            ),
            (
                format!("B:{}:{}", scene.opponent.x, scene.opponent.y),
                FONT_SIZE as f32,
            ),
            (
                format!("Puck:{}:{}", scene.puck.x, scene.puck.y),
                (GAME_HEIGHT / 2 + FONT_SIZE / 2) as f32,
            ),
        ];

        for (text, y) in rows {
            self.surface.text(
                &text,
                to_canvas(Point::new(20.0, y)),
                SECONDARY_FONT_SIZE,
                TextAlign::Start,
            );
        }
    }
}

/// Headless surface that only logs what would be drawn.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSurface;

impl Surface for LogSurface {
    fn bounds(&self) -> SurfaceRect {
        SurfaceRect::canvas()
    }

    fn clear(&mut self) {
        trace!("clear");
    }

    fn line(&mut self, from: Point, to: Point) {
        trace!("line ({}, {}) -> ({}, {})", from.x, from.y, to.x, to.y);
    }

    fn circle(&mut self, center: Point, radius: f32, filled: bool) {
        trace!(
            "circle ({}, {}) r={} filled={}",
            center.x,
            center.y,
            radius,
            filled
        );
    }

    fn text(&mut self, text: &str, at: Point, size: i32, _align: TextAlign) {
        trace!("text {:?} at ({}, {}) size={}", text, at.x, at.y, size);
    }
}
