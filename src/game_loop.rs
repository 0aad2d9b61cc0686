//! Frame-driven loop: gravity timing, input entry points, render each frame.

use crate::arena::Arena;
use crate::game::{DropOutcome, GameState, Player};
use anyhow::Result;
use std::time::{Duration, Instant};

/// Read-only view handed to the renderer once per frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub arena: &'a Arena,
    pub player: &'a Player,
    pub score: u64,
    pub lines_cleared: u32,
    pub game_over: bool,
}

impl<'a> FrameView<'a> {
    pub fn of(state: &'a GameState) -> Self {
        Self {
            arena: &state.arena,
            player: &state.player,
            score: state.score,
            lines_cleared: state.lines_cleared,
            game_over: state.game_over,
        }
    }
}

pub trait Renderer {
    fn draw_frame(&mut self, view: FrameView<'_>) -> Result<()>;
}

/// Source of frame timestamps, measured from an arbitrary fixed epoch.
pub trait Clock {
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Whether the caller should schedule another tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

/// Owns the session and its gravity timer.
#[derive(Debug)]
pub struct GameLoop {
    state: GameState,
    drop_interval: Duration,
    drop_counter: Duration,
    last_time: Duration,
}

impl GameLoop {
    pub fn new(state: GameState, drop_interval: Duration) -> Self {
        Self {
            state,
            drop_interval,
            drop_counter: Duration::ZERO,
            last_time: Duration::ZERO,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Fresh arena, zero score, new piece; gravity timer restarts at `now`.
    pub fn start_game(&mut self, now: Duration) {
        self.state.start();
        self.drop_counter = Duration::ZERO;
        self.last_time = now;
    }

    /// Advances gravity by the time since the previous tick and draws one frame.
    /// Returns [`LoopControl::Stop`] without drawing once the session is over.
    pub fn tick(&mut self, now: Duration, renderer: &mut dyn Renderer) -> Result<LoopControl> {
        if self.state.game_over {
            return Ok(LoopControl::Stop);
        }
        let delta = now.saturating_sub(self.last_time);
        self.last_time = now;
        self.drop_counter += delta;
        if self.drop_counter > self.drop_interval {
            self.drop();
        }
        renderer.draw_frame(FrameView::of(&self.state))?;
        Ok(LoopControl::Continue)
    }

    pub fn on_move_left(&mut self) -> bool {
        self.state.move_left()
    }

    pub fn on_move_right(&mut self) -> bool {
        self.state.move_right()
    }

    pub fn on_soft_drop(&mut self) -> DropOutcome {
        self.drop()
    }

    /// Every drop, timed or manual, restarts the gravity interval.
    fn drop(&mut self) -> DropOutcome {
        let outcome = self.state.drop_piece();
        match outcome {
            DropOutcome::Ignored => {}
            DropOutcome::Fell => self.drop_counter = Duration::ZERO,
            DropOutcome::Locked {
                rows_cleared,
                score_delta,
            } => {
                self.drop_counter = Duration::ZERO;
                if rows_cleared > 0 {
                    tracing::info!(rows_cleared, score_delta, "rows cleared");
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Position;
    use crate::piece::{PieceKind, SequenceSource};

    #[derive(Default)]
    struct CountingRenderer {
        frames: usize,
        last: Option<(Position, u64, bool)>,
    }

    impl Renderer for CountingRenderer {
        fn draw_frame(&mut self, view: FrameView<'_>) -> Result<()> {
            self.frames += 1;
            self.last = Some((view.player.pos, view.score, view.game_over));
            Ok(())
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn started(width: usize, height: usize) -> GameLoop {
        let state = GameState::new(
            width,
            height,
            Box::new(SequenceSource::new(&[PieceKind::O])),
        );
        let mut game = GameLoop::new(state, ms(1000));
        game.start_game(ms(0));
        game
    }

    #[test]
    fn draws_every_frame_without_dropping_early() {
        let mut game = started(12, 20);
        let mut renderer = CountingRenderer::default();
        for t in (16..=992).step_by(16) {
            assert_eq!(game.tick(ms(t), &mut renderer).unwrap(), LoopControl::Continue);
        }
        assert_eq!(renderer.frames, 62);
        assert_eq!(game.state().player.pos, Position::new(5, 0));
    }

    #[test]
    fn drops_once_interval_is_exceeded() {
        let mut game = started(12, 20);
        let mut renderer = CountingRenderer::default();
        game.tick(ms(1000), &mut renderer).unwrap();
        assert_eq!(game.state().player.pos.y, 0, "equal to the interval is not enough");
        game.tick(ms(1001), &mut renderer).unwrap();
        assert_eq!(game.state().player.pos.y, 1);
        game.tick(ms(2001), &mut renderer).unwrap();
        assert_eq!(game.state().player.pos.y, 1);
        game.tick(ms(2002), &mut renderer).unwrap();
        assert_eq!(game.state().player.pos.y, 2);
        assert_eq!(renderer.last.map(|(pos, _, _)| pos.y), Some(2));
    }

    #[test]
    fn a_long_frame_drops_only_one_row() {
        let mut game = started(12, 20);
        let mut renderer = CountingRenderer::default();
        game.tick(ms(5000), &mut renderer).unwrap();
        assert_eq!(game.state().player.pos.y, 1);
    }

    #[test]
    fn soft_drop_restarts_gravity_interval() {
        let mut game = started(12, 20);
        let mut renderer = CountingRenderer::default();
        game.tick(ms(900), &mut renderer).unwrap();
        assert_eq!(game.on_soft_drop(), DropOutcome::Fell);
        game.tick(ms(1500), &mut renderer).unwrap();
        assert_eq!(game.state().player.pos.y, 1);
        game.tick(ms(1901), &mut renderer).unwrap();
        assert_eq!(game.state().player.pos.y, 2);
    }

    #[test]
    fn clock_going_backwards_does_not_underflow() {
        let mut game = started(12, 20);
        let mut renderer = CountingRenderer::default();
        game.tick(ms(500), &mut renderer).unwrap();
        game.tick(ms(100), &mut renderer).unwrap();
        assert_eq!(game.state().player.pos.y, 0);
    }

    #[test]
    fn stops_after_game_over() {
        let mut game = started(4, 4);
        let mut renderer = CountingRenderer::default();
        let mut t = 0;
        let mut control = LoopControl::Continue;
        while control == LoopControl::Continue {
            t += 1001;
            control = game.tick(ms(t), &mut renderer).unwrap();
            assert!(t < 100_000, "loop never stopped");
        }
        assert!(game.state().game_over);
        // The frame on which the game ended was still drawn.
        assert_eq!(renderer.last.map(|(_, _, over)| over), Some(true));
        let frames = renderer.frames;
        assert_eq!(game.tick(ms(t + 5000), &mut renderer).unwrap(), LoopControl::Stop);
        assert_eq!(renderer.frames, frames);
    }

    #[test]
    fn input_is_ignored_after_game_over() {
        let mut game = started(4, 4);
        let mut renderer = CountingRenderer::default();
        let mut t = 0;
        while !game.state().game_over {
            t += 1001;
            game.tick(ms(t), &mut renderer).unwrap();
        }
        let player = game.state().player;
        assert!(!game.on_move_left());
        assert!(!game.on_move_right());
        assert_eq!(game.on_soft_drop(), DropOutcome::Ignored);
        assert_eq!(game.state().player, player);
    }

    #[test]
    fn restart_after_game_over() {
        let mut game = started(4, 4);
        let mut renderer = CountingRenderer::default();
        let mut t = 0;
        while game.tick(ms(t), &mut renderer).unwrap() == LoopControl::Continue {
            t += 1001;
        }
        game.start_game(ms(t));
        assert!(!game.state().game_over);
        assert_eq!(game.state().score, 0);
        assert_eq!(game.tick(ms(t + 16), &mut renderer).unwrap(), LoopControl::Continue);
        assert_eq!(game.state().player.pos, Position::new(1, 0));
    }

    #[test]
    fn move_entry_points_reach_the_session() {
        let mut game = started(12, 20);
        assert!(game.on_move_left());
        assert_eq!(game.state().player.pos.x, 4);
        assert!(game.on_move_right());
        assert!(game.on_move_right());
        assert_eq!(game.state().player.pos.x, 6);
    }

    #[test]
    fn monotonic_clock_advances() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
