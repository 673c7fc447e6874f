//! Smooths discrete world snapshots into continuous remote motion.
//!
//! Only the two remote entities (opponent and puck) are interpolated. Each
//! keeps the previous and the current authoritative position; a cursor walks
//! from one to the other in `steps` render ticks and then holds at the current
//! position until the next snapshot arrives. There is no extrapolation.

use shared::protocol::WorldSnapshot;
use shared::{lerp_point, Point, Position, Score};

/// Previous and current authoritative position of one remote entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Track {
    pub previous: Position,
    pub current: Position,
}

impl Track {
    pub fn settled(at: Position) -> Self {
        Self {
            previous: at,
            current: at,
        }
    }

    fn shifted(self, next: Position) -> Self {
        Self {
            previous: self.current,
            current: next,
        }
    }

    pub fn at(&self, amount: f32) -> Point {
        lerp_point(self.previous.into(), self.current.into(), amount)
    }
}

/// Everything the render loop reads from remote state, replaced as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotPair {
    pub opponent: Track,
    pub puck: Track,
    pub score: Score,
}

impl SnapshotPair {
    pub fn settled(opponent: Position, puck: Position) -> Self {
        Self {
            opponent: Track::settled(opponent),
            puck: Track::settled(puck),
            score: Score::default(),
        }
    }

    /// The pair after `snapshot`: every current position becomes previous.
    pub fn followed_by(&self, snapshot: &WorldSnapshot) -> Self {
        Self {
            opponent: self.opponent.shifted(snapshot.opponent),
            puck: self.puck.shifted(snapshot.puck),
            score: snapshot.score,
        }
    }
}

/// Interpolated display state of the remote entities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemoteView {
    pub opponent: Point,
    pub puck: Point,
    pub score: Score,
}

#[derive(Debug, Clone)]
pub struct Interpolator {
    pair: SnapshotPair,
    cursor: u32,
    steps: u32,
}

impl Interpolator {
    pub fn new(steps: u32, pair: SnapshotPair) -> Self {
        let steps = steps.max(1);
        Self {
            pair,
            // A settled pair has nothing to walk through.
            cursor: steps,
            steps,
        }
    }

    /// Installs a new snapshot and rewinds the cursor. Pair and cursor change
    /// together, so no reader can see one without the other.
    pub fn install(&mut self, snapshot: &WorldSnapshot) {
        let next = self.pair.followed_by(snapshot);
        self.pair = next;
        self.cursor = 0;
    }

    /// Moves the cursor one step towards the current snapshot, stopping there.
    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1).min(self.steps);
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn pair(&self) -> &SnapshotPair {
        &self.pair
    }

    pub fn progress(&self) -> f32 {
        self.cursor as f32 / self.steps as f32
    }

    pub fn view(&self) -> RemoteView {
        let amount = self.progress();
        RemoteView {
            opponent: self.pair.opponent.at(amount),
            puck: self.pair.puck.at(amount),
            score: self.pair.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn snapshot(opponent: Position, puck: Position, score: Score) -> WorldSnapshot {
        WorldSnapshot {
            own: Position::player_start(),
            opponent,
            puck,
            score,
        }
    }

    fn origin_engine() -> Interpolator {
        Interpolator::new(
            5,
            SnapshotPair::settled(Position::new(0, 0), Position::new(0, 0)),
        )
    }

    #[test]
    fn test_settled_engine_shows_current() {
        let engine = Interpolator::new(
            5,
            SnapshotPair::settled(Position::opponent_start(), Position::puck_start()),
        );
        let view = engine.view();
        assert_eq!(view.opponent, Point::new(400.0, 80.0));
        assert_eq!(view.puck, Point::new(400.0, 600.0));
    }

    #[test]
    fn test_install_shifts_and_rewinds() {
        let mut engine = origin_engine();
        engine.install(&snapshot(Position::new(10, 0), Position::new(0, 20), Score::new(1, 2)));

        assert_eq!(engine.cursor(), 0);
        assert_eq!(engine.pair().opponent.previous, Position::new(0, 0));
        assert_eq!(engine.pair().opponent.current, Position::new(10, 0));
        assert_eq!(engine.pair().score, Score::new(1, 2));

        engine.install(&snapshot(Position::new(30, 0), Position::new(0, 40), Score::new(1, 3)));
        assert_eq!(engine.pair().opponent.previous, Position::new(10, 0));
        assert_eq!(engine.pair().puck.previous, Position::new(0, 20));
        assert_eq!(engine.pair().puck.current, Position::new(0, 40));
    }

    #[test]
    fn test_steps_walk_linearly_then_hold() {
        let mut engine = origin_engine();
        engine.install(&snapshot(Position::new(10, 0), Position::new(10, 0), Score::default()));

        let expected = [2.0, 4.0, 6.0, 8.0, 10.0, 10.0, 10.0];
        for x in expected {
            engine.advance();
            assert_approx_eq!(engine.view().opponent.x, x);
            assert_approx_eq!(engine.view().puck.x, x);
        }
        assert_eq!(engine.cursor(), 5);
    }

    #[test]
    fn test_zero_steps_behaves_as_one() {
        let mut engine = Interpolator::new(
            0,
            SnapshotPair::settled(Position::new(0, 0), Position::new(0, 0)),
        );
        engine.install(&snapshot(Position::new(8, 8), Position::new(8, 8), Score::default()));
        engine.advance();
        assert_approx_eq!(engine.view().opponent.x, 8.0);
    }

    /// Replays random interleavings of snapshot arrivals and render reads and
    /// checks that every read is consistent with exactly one installed pair.
    #[test]
    fn test_interleaved_reads_never_mix_pairs() {
        let mut rng = StdRng::seed_from_u64(0x5eed_cafe);

        for _ in 0..200 {
            let mut engine = origin_engine();
            let mut installed = vec![*engine.pair()];
            let mut counter = 0;

            for _ in 0..60 {
                if rng.gen_bool(0.3) {
                    // Opponent and puck values encode the snapshot number,
                    // so a mixed observation cannot line up with any pair.
                    counter += 1;
                    let n = counter * 10;
                    engine.install(&snapshot(
                        Position::new(n, -n),
                        Position::new(n * 3, n * 7),
                        Score::new(counter as u32, 0),
                    ));
                    installed.push(*engine.pair());
                } else {
                    engine.advance();
                    let view = engine.view();

                    let consistent = installed.iter().any(|pair| {
                        (0..=engine.steps()).any(|k| {
                            let amount = k as f32 / engine.steps() as f32;
                            pair.opponent.at(amount) == view.opponent
                                && pair.puck.at(amount) == view.puck
                                && pair.score == view.score
                        })
                    });
                    assert!(consistent, "torn observation {:?}", view);

                    let latest = installed.last().unwrap();
                    assert_eq!(view.score, latest.score);
                    assert_eq!(view.opponent, latest.opponent.at(engine.progress()));
                }
            }
        }
    }
}
