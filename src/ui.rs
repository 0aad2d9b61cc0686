//! Layout and drawing: playfield, falling piece, sidebar, game over.

use crate::arena::EMPTY;
use crate::game_loop::{FrameView, Renderer};
use crate::theme::Theme;
use anyhow::Result;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use ratatui::{DefaultTerminal, Frame, buffer::Buffer};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Each arena cell is two terminal columns wide so blocks look square.
const CELL_WIDTH: u16 = 2;
const BLOCK_SYMBOL: &str = "██";
const SIDEBAR_WIDTH: u16 = 22;
/// Board dims to the border colour over this long once the game ends.
const GAME_OVER_FADE_MS: u32 = 600;

/// Board size in terminal cells, border included.
fn board_size(arena_width: usize, arena_height: usize) -> (u16, u16) {
    (
        arena_width as u16 * CELL_WIDTH + 2,
        arena_height as u16 + 2,
    )
}

/// Board and sidebar rects, centred in `area`.
fn game_layout(area: Rect, view: &FrameView<'_>) -> (Rect, Rect) {
    let (bw, bh) = board_size(view.arena.width(), view.arena.height());
    let total_w = bw + SIDEBAR_WIDTH;

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(bh),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(bw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    (inner[0], inner[1])
}

fn paint_cell(buf: &mut Buffer, inner: Rect, x: i32, y: i32, color: Color, theme: &Theme) {
    let (Ok(x), Ok(y)) = (u16::try_from(x), u16::try_from(y)) else {
        return;
    };
    let rx = inner.x + x * CELL_WIDTH;
    let ry = inner.y + y;
    if rx + CELL_WIDTH <= inner.x + inner.width && ry < inner.y + inner.height {
        buf.set_string(rx, ry, BLOCK_SYMBOL, Style::default().fg(color).bg(theme.bg));
    }
}

/// Bordered playfield with settled cells and the falling piece.
fn render_board(buf: &mut Buffer, area: Rect, view: &FrameView<'_>, theme: &Theme) {
    let border = if view.game_over { theme.alert } else { theme.div_line };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border).bg(theme.bg))
        .title(Span::styled(" Blocktris ", Style::default().fg(theme.title)));
    let inner = block.inner(area);
    block.render(area, buf);
    buf.set_style(inner, Style::default().bg(theme.bg));

    for (y, row) in view.arena.rows().enumerate() {
        for (x, &cell) in row.iter().enumerate() {
            if cell != EMPTY {
                paint_cell(buf, inner, x as i32, y as i32, theme.block, theme);
            }
        }
    }
    let pos = view.player.pos;
    for (c, r, _) in view.player.shape.cells() {
        paint_cell(buf, inner, pos.x + c as i32, pos.y + r as i32, theme.block, theme);
    }
}

fn render_sidebar(buf: &mut Buffer, area: Rect, view: &FrameView<'_>, best: u64, theme: &Theme) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let stat = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value, fg_style),
        ])
    };
    let lines = vec![
        stat("Score: ", view.score.to_string()),
        stat("Best:  ", best.max(view.score).to_string()),
        stat("Lines: ", view.lines_cleared.to_string()),
        Line::from(""),
        Line::from(Span::styled("←/h   Left", fg_style)),
        Line::from(Span::styled("→/l   Right", fg_style)),
        Line::from(Span::styled("↓/j   Drop", fg_style)),
        Line::from(Span::styled("q     Quit", fg_style)),
    ];
    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(area, buf);
}

fn render_game_over_popup(buf: &mut Buffer, board: Rect, score: u64, theme: &Theme) {
    let popup_w = 26u16.min(board.width);
    let popup_h = 7u16.min(board.height);
    let popup = Rect {
        x: board.x + board.width.saturating_sub(popup_w) / 2,
        y: board.y + board.height.saturating_sub(popup_h) / 2,
        width: popup_w,
        height: popup_h,
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default()
                .fg(Color::White)
                .bg(theme.alert)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(" Score: {score} "),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " R — Restart   Q — Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .style(Style::default().bg(theme.bg)),
        )
        .render(popup, buf);
}

/// Playing screen: board + sidebar.
pub fn draw_playing(buf: &mut Buffer, area: Rect, view: &FrameView<'_>, best: u64, theme: &Theme) {
    let (board, sidebar) = game_layout(area, view);
    render_board(buf, board, view, theme);
    render_sidebar(buf, sidebar, view, best, theme);
}

/// Game-over screen: the final board fades out under a centred message.
/// `fade` is created on first call and advanced by the time since `fade_time`.
pub fn draw_game_over(
    frame: &mut Frame,
    view: &FrameView<'_>,
    best: u64,
    theme: &Theme,
    fade: &mut Option<Effect>,
    fade_time: &mut Option<Instant>,
    now: Instant,
) {
    let area = frame.area();
    let (board, sidebar) = game_layout(area, view);
    render_board(frame.buffer_mut(), board, view, theme);
    render_sidebar(frame.buffer_mut(), sidebar, view, best, theme);

    let delta = fade_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *fade_time = Some(now);
    let effect = fade.get_or_insert_with(|| {
        fx::fade_to(
            theme.div_line,
            theme.bg,
            (GAME_OVER_FADE_MS, Interpolation::Linear),
        )
        .with_area(board)
    });
    frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));

    render_game_over_popup(frame.buffer_mut(), board, view.score, theme);
}

/// Draws live frames to the terminal on behalf of the game loop.
pub struct TerminalRenderer<'t> {
    terminal: &'t mut DefaultTerminal,
    theme: &'t Theme,
    best: u64,
}

impl<'t> TerminalRenderer<'t> {
    pub fn new(terminal: &'t mut DefaultTerminal, theme: &'t Theme, best: u64) -> Self {
        Self {
            terminal,
            theme,
            best,
        }
    }
}

impl Renderer for TerminalRenderer<'_> {
    fn draw_frame(&mut self, view: FrameView<'_>) -> Result<()> {
        let (theme, best) = (self.theme, self.best);
        self.terminal.draw(|f| {
            let area = f.area();
            draw_playing(f.buffer_mut(), area, &view, best, theme);
        })?;
        Ok(())
    }
}
