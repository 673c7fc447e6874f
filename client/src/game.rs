use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::interpolation::{Interpolator, RemoteView, SnapshotPair};
use crate::network::Connection;
use crate::rendering::{Renderer, Scene, Surface};
use crate::timer::Ticker;
use log::{debug, info};
use shared::protocol::{Message, WorldSnapshot};
use shared::{Bounds, Point, Position};
use std::time::Duration;

/// Local and remote entity state for one match.
///
/// The local player is never interpolated: pointer input lands here directly
/// and the next capture tick sends it as is.
#[derive(Debug, Clone)]
pub struct GameState {
    player: Position,
    remote: Interpolator,
    debug: bool,
}

impl GameState {
    pub fn new(lerp_steps: u32) -> Self {
        Self {
            player: Position::player_start(),
            remote: Interpolator::new(
                lerp_steps,
                SnapshotPair::settled(Position::opponent_start(), Position::puck_start()),
            ),
            debug: false,
        }
    }

    pub fn player(&self) -> Position {
        self.player
    }

    /// Moves the local player towards a game-space point, clamped to the
    /// defending half and rounded to protocol precision. Non-finite targets
    /// leave the player where it is.
    pub fn move_player(&mut self, target: Point) {
        if !(target.x.is_finite() && target.y.is_finite()) {
            debug!("Ignoring non-finite move target {:?}", target);
            return;
        }
        self.player = Bounds::local_half().clamp_round(target);
    }

    /// Installs an authoritative snapshot. Our own reported position is
    /// ignored; local input is the source of truth for it.
    pub fn receive_world(&mut self, snapshot: &WorldSnapshot) {
        self.remote.install(snapshot);
    }

    pub fn step_interpolation(&mut self) -> RemoteView {
        self.remote.advance();
        self.remote.view()
    }

    pub fn remote(&self) -> &Interpolator {
        &self.remote
    }

    pub fn toggle_debug(&mut self) {
        self.debug = !self.debug;
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn scene(&self) -> Scene {
        let remote = self.remote.view();
        Scene {
            player: self.player.into(),
            opponent: remote.opponent,
            puck: remote.puck,
            score: remote.score,
            debug: self.debug,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTick {
    Capture,
    Render,
}

/// A running match: the game state plus its two fixed-rate loops.
///
/// The capture loop sends the local position every `capture_period`; the
/// render loop advances interpolation and redraws `lerp_steps` times as often.
#[derive(Debug)]
pub struct Match {
    room_id: String,
    state: GameState,
    capture: Ticker,
    render: Ticker,
}

impl Match {
    pub fn start(room_id: impl Into<String>, config: &ClientConfig) -> Self {
        let room_id = room_id.into();
        info!("Match {} started", room_id);

        let mut state = GameState::new(config.lerp_steps);
        state.set_debug(config.debug_overlay);

        let mut capture = Ticker::stopped();
        capture.start(config.capture_period);
        let mut render = Ticker::stopped();
        render.start(config.render_period());

        Self {
            room_id,
            state,
            capture,
            render,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn is_running(&self) -> bool {
        self.capture.is_running() || self.render.is_running()
    }

    pub fn capture_period(&self) -> Option<Duration> {
        self.capture.period()
    }

    /// Waits for whichever loop is due next. Pending forever once stopped.
    pub async fn next_tick(&mut self) -> MatchTick {
        let capture = &mut self.capture;
        let render = &mut self.render;

        tokio::select! {
            _ = capture.tick() => MatchTick::Capture,
            _ = render.tick() => MatchTick::Render,
        }
    }

    /// Sends the current local position. Failure leaves the loop running;
    /// the caller decides whether the error ends the match.
    pub fn capture(&mut self, connection: &mut Connection) -> Result<(), ClientError> {
        connection.send(&Message::PlayerAction {
            position: self.state.player(),
        })
    }

    pub fn render<S: Surface>(&mut self, renderer: &mut Renderer<S>) {
        self.state.step_interpolation();
        renderer.render(&self.state.scene());
    }

    /// Stops both loops. No tick fires after this returns.
    pub fn stop(&mut self) {
        if self.is_running() {
            debug!("Match {} loops stopped", self.room_id);
        }
        self.capture.stop();
        self.render.stop();
    }

    /// Leaves the match from our side: stops both loops, then tells the
    /// server why, once. Later calls do nothing.
    pub fn exit(&mut self, reason: &str, connection: &mut Connection) -> Result<(), ClientError> {
        if !self.is_running() {
            return Ok(());
        }

        self.stop();
        info!("Leaving match {}: {}", self.room_id, reason);
        connection.send(&Message::exit_game(reason))
    }
}
