//! Game state: arena, falling piece, score, game over.

use crate::arena::{Arena, Position};
use crate::piece::{Shape, ShapeSource};

/// The falling piece: its shape and top-left grid position. Replaced wholesale on respawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Player {
    pub shape: Shape,
    pub pos: Position,
}

impl Player {
    /// Horizontally centred on row 0.
    pub fn spawn(shape: Shape, arena_width: usize) -> Self {
        let x = (arena_width / 2) as i32 - (shape.width() / 2) as i32;
        Self {
            shape,
            pos: Position::new(x, 0),
        }
    }
}

/// Notifications for whatever displays the session.
pub trait GameObserver {
    fn on_score_changed(&mut self, _score: u64) {}

    fn on_game_over(&mut self, _score: u64) {}
}

/// What a single drop step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Moved down one row.
    Fell,
    /// Could not move; merged, respawned and swept.
    Locked { rows_cleared: u32, score_delta: u64 },
    /// Session already over; nothing changed.
    Ignored,
}

/// One game session. Owns every piece of mutable game state.
pub struct GameState {
    pub arena: Arena,
    pub player: Player,
    pub score: u64,
    pub lines_cleared: u32,
    pub game_over: bool,
    source: Box<dyn ShapeSource>,
    observers: Vec<Box<dyn GameObserver>>,
}

impl std::fmt::Debug for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameState")
            .field("arena", &self.arena)
            .field("player", &self.player)
            .field("score", &self.score)
            .field("lines_cleared", &self.lines_cleared)
            .field("game_over", &self.game_over)
            .finish_non_exhaustive()
    }
}

impl GameState {
    /// Empty arena with a first piece already drawn. Call [`GameState::start`] to begin play.
    pub fn new(width: usize, height: usize, mut source: Box<dyn ShapeSource>) -> Self {
        let player = Player::spawn(source.next_shape(), width);
        Self {
            arena: Arena::new(width, height),
            player,
            score: 0,
            lines_cleared: 0,
            game_over: false,
            source,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn GameObserver>) {
        self.observers.push(observer);
    }

    /// Clears the arena, zeroes score, lifts game over and spawns a fresh piece.
    pub fn start(&mut self) {
        self.arena.clear();
        self.score = 0;
        self.lines_cleared = 0;
        self.game_over = false;
        tracing::info!(
            width = self.arena.width(),
            height = self.arena.height(),
            "session started"
        );
        self.reset_player();
        self.notify_score();
    }

    /// Draws the next piece at the spawn point. Returns true if it collides there (game over).
    pub fn reset_player(&mut self) -> bool {
        self.player = Player::spawn(self.source.next_shape(), self.arena.width());
        tracing::debug!(
            kind = self.player.shape.kind().name(),
            x = self.player.pos.x,
            "spawned piece"
        );
        if self.arena.collides(&self.player.shape, self.player.pos) {
            self.end_game();
            return true;
        }
        false
    }

    /// Shifts the piece by `dir` columns unless that collides. Returns true if it moved.
    pub fn move_piece(&mut self, dir: i32) -> bool {
        if self.game_over {
            return false;
        }
        let next = self.player.pos.offset(dir, 0);
        if self.arena.collides(&self.player.shape, next) {
            return false;
        }
        self.player.pos = next;
        true
    }

    pub fn move_left(&mut self) -> bool {
        self.move_piece(-1)
    }

    pub fn move_right(&mut self) -> bool {
        self.move_piece(1)
    }

    /// One row of descent. On collision the piece locks at its last valid position,
    /// the next piece spawns, full rows are swept and the score is updated.
    pub fn drop_piece(&mut self) -> DropOutcome {
        if self.game_over {
            return DropOutcome::Ignored;
        }
        let next = self.player.pos.offset(0, 1);
        if !self.arena.collides(&self.player.shape, next) {
            self.player.pos = next;
            return DropOutcome::Fell;
        }

        let landed = self.player;
        self.arena.merge(&landed.shape, landed.pos);
        self.reset_player();
        let sweep = self.arena.sweep();
        self.score = self.score.saturating_add(sweep.score_delta);
        self.lines_cleared = self.lines_cleared.saturating_add(sweep.rows_cleared);
        tracing::debug!(
            kind = landed.shape.kind().name(),
            x = landed.pos.x,
            y = landed.pos.y,
            rows = sweep.rows_cleared,
            points = sweep.score_delta,
            "piece locked"
        );
        self.notify_score();
        DropOutcome::Locked {
            rows_cleared: sweep.rows_cleared,
            score_delta: sweep.score_delta,
        }
    }

    fn end_game(&mut self) {
        if self.game_over {
            return;
        }
        self.game_over = true;
        let score = self.score;
        for observer in &mut self.observers {
            observer.on_game_over(score);
        }
    }

    fn notify_score(&mut self) {
        let score = self.score;
        for observer in &mut self.observers {
            observer.on_score_changed(score);
        }
    }
}
