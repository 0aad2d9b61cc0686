//! App: terminal init, frame loop, key handling, restart.

use crate::GameConfig;
use crate::game::{GameObserver, GameState};
use crate::game_loop::{Clock, FrameView, GameLoop, LoopControl, MonotonicClock};
use crate::input::{Action, key_to_action};
use crate::piece::RandomSource;
use crate::theme::Theme;
use crate::ui::{self, TerminalRenderer};
use anyhow::Result;
use crossterm::event::{self, Event};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
}

/// Forwards session notifications to the log.
struct SessionLog;

impl GameObserver for SessionLog {
    fn on_score_changed(&mut self, score: u64) {
        tracing::info!(score, "score changed");
    }

    fn on_game_over(&mut self, score: u64) {
        tracing::info!(score, "game over");
    }
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    game: GameLoop,
    clock: MonotonicClock,
    screen: Screen,
    /// Best score since launch; kept in memory only.
    best_score: u64,
    game_over_fade: Option<Effect>,
    game_over_fade_time: Option<Instant>,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let source = match config.seed {
            Some(seed) => RandomSource::seeded(seed),
            None => RandomSource::from_entropy(),
        };
        let mut state = GameState::new(config.width, config.height, Box::new(source));
        state.add_observer(Box::new(SessionLog));
        let game = GameLoop::new(state, config.drop_interval);
        Self {
            config,
            theme,
            game,
            clock: MonotonicClock::new(),
            screen: Screen::Playing,
            best_score: 0,
            game_over_fade: None,
            game_over_fade_time: None,
        }
    }

    fn start_game(&mut self) {
        self.game.start_game(self.clock.now());
        self.screen = Screen::Playing;
        self.game_over_fade = None;
        self.game_over_fade_time = None;
    }

    /// Returns false once the player asks to quit.
    fn apply_action(&mut self, action: Action) -> bool {
        match (self.screen, action) {
            (_, Action::Quit) => return false,
            (Screen::Playing, Action::MoveLeft) => {
                self.game.on_move_left();
            }
            (Screen::Playing, Action::MoveRight) => {
                self.game.on_move_right();
            }
            (Screen::Playing, Action::SoftDrop) => {
                self.game.on_soft_drop();
            }
            (Screen::GameOver, Action::Restart) => {
                tracing::info!(previous_score = self.game.state().score, "restart");
                self.start_game();
            }
            _ => {}
        }
        true
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = terminal.show_cursor();
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        self.start_game();
        loop {
            let frame_start = Instant::now();
            match self.screen {
                Screen::Playing => {
                    let mut renderer = TerminalRenderer::new(terminal, &self.theme, self.best_score);
                    let control = self.game.tick(self.clock.now(), &mut renderer)?;
                    if control == LoopControl::Stop {
                        self.best_score = self.best_score.max(self.game.state().score);
                        self.screen = Screen::GameOver;
                    }
                }
                Screen::GameOver => {
                    let view = FrameView::of(self.game.state());
                    let (theme, best) = (&self.theme, self.best_score);
                    let fade = &mut self.game_over_fade;
                    let fade_time = &mut self.game_over_fade_time;
                    terminal.draw(|f| {
                        ui::draw_game_over(f, &view, best, theme, fade, fade_time, frame_start);
                    })?;
                }
            }

            let timeout = self
                .config
                .frame_duration
                .saturating_sub(frame_start.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if !self.apply_action(key_to_action(key)) {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
