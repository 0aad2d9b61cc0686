//! Arena: grid of settled cells, collision test, merge and row sweep.

use crate::piece::Shape;
use std::collections::VecDeque;

/// Value of an empty cell. Anything else is occupied.
pub const EMPTY: u8 = 0;

/// Points for the first row cleared in one sweep; each further row doubles.
pub const ROW_CLEAR_BASE: u64 = 10;

/// Grid coordinates of a shape's top-left cell. May be negative while testing moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Rows removed and points earned by one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepOutcome {
    pub rows_cleared: u32,
    pub score_delta: u64,
}

/// Playfield: rows[0] is the top. Dimensions never change after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arena {
    width: usize,
    height: usize,
    rows: VecDeque<Vec<u8>>,
}

impl Arena {
    pub fn new(width: usize, height: usize) -> Self {
        let rows = (0..height).map(|_| vec![EMPTY; width]).collect();
        Self {
            width,
            height,
            rows,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell value, or None outside the grid.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<u8> {
        let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Writes a cell; out-of-range coordinates are ignored.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if let Some(cell) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *cell = value;
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.fill(EMPTY);
        }
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        self.rows
            .get(y)
            .is_some_and(|row| row.iter().all(|&cell| cell != EMPTY))
    }

    /// True if any occupied cell of `shape` at `pos` lands outside the grid or on a settled cell.
    pub fn collides(&self, shape: &Shape, pos: Position) -> bool {
        shape.cells().any(|(c, r, _)| {
            let (x, y) = (pos.x + c as i32, pos.y + r as i32);
            self.get(x, y).is_none_or(|cell| cell != EMPTY)
        })
    }

    /// Copies the shape's occupied cells into the grid.
    /// Callers establish with [`Arena::collides`] that the placement is legal.
    pub fn merge(&mut self, shape: &Shape, pos: Position) {
        debug_assert!(!self.collides(shape, pos), "merge at colliding position {pos:?}");
        for (c, r, value) in shape.cells() {
            let (x, y) = (pos.x + c as i32, pos.y + r as i32);
            if let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) {
                self.set(x, y, value);
            }
        }
    }

    /// Removes full rows bottom-up, inserting an empty row at the top for each.
    ///
    /// After a removal the same index is examined again, so a full row that shifts down
    /// into it is cleared in the same pass. Points double per row: 10, 20, 40, 80, ...
    pub fn sweep(&mut self) -> SweepOutcome {
        let mut outcome = SweepOutcome::default();
        let mut award = ROW_CLEAR_BASE;
        let mut y = self.height;
        while y > 0 {
            if self.is_row_full(y - 1) {
                self.rows.remove(y - 1);
                self.rows.push_front(vec![EMPTY; self.width]);
                outcome.rows_cleared += 1;
                outcome.score_delta = outcome.score_delta.saturating_add(award);
                award = award.saturating_mul(2);
            } else {
                y -= 1;
            }
        }
        outcome
    }
}
