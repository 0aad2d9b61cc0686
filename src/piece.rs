//! Piece catalog: the seven fixed shape templates and the source that picks them.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Tetromino kinds (T, I, O, S, Z, L, J), in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    T,
    I,
    O,
    S,
    Z,
    L,
    J,
}

impl PieceKind {
    pub const ALL: [Self; 7] = [Self::T, Self::I, Self::O, Self::S, Self::Z, Self::L, Self::J];

    /// Template rows for this kind; 0 = empty, nonzero = filled.
    pub fn template(self) -> &'static [&'static [u8]] {
        match self {
            Self::T => &[&[1, 1, 1], &[0, 1, 0]],
            Self::I => &[&[1, 1, 1, 1]],
            Self::O => &[&[1, 1], &[1, 1]],
            Self::S => &[&[0, 1, 1], &[1, 1, 0]],
            Self::Z => &[&[1, 1, 0], &[0, 1, 1]],
            Self::L => &[&[1, 1, 1], &[1, 0, 0]],
            Self::J => &[&[1, 1, 1], &[0, 0, 1]],
        }
    }

    pub fn shape(self) -> Shape {
        Shape {
            kind: self,
            rows: self.template(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::T => "T",
            Self::I => "I",
            Self::O => "O",
            Self::S => "S",
            Self::Z => "Z",
            Self::L => "L",
            Self::J => "J",
        }
    }
}

/// Immutable view of a catalog template. Copying a shape never copies cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    kind: PieceKind,
    rows: &'static [&'static [u8]],
}

impl Shape {
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    pub fn rows(&self) -> &'static [&'static [u8]] {
        self.rows
    }

    /// Width of the first row; used for spawn centring.
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, |row| row.len())
    }

    /// Occupied cells as (column, row, value) relative to the top-left corner.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, u8)> + '_ {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|&(_, &v)| v != 0)
                .map(move |(c, &v)| (c, r, v))
        })
    }
}

/// Where new pieces come from. Injected into the session so games can be replayed.
pub trait ShapeSource {
    fn next_kind(&mut self) -> PieceKind;

    fn next_shape(&mut self) -> Shape {
        self.next_kind().shape()
    }
}

/// Uniform pick over the catalog.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: StdRng,
}

impl RandomSource {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl ShapeSource for RandomSource {
    fn next_kind(&mut self) -> PieceKind {
        PieceKind::ALL[self.rng.gen_range(0..PieceKind::ALL.len())]
    }
}

/// Replays a fixed list of kinds, cycling when exhausted.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct SequenceSource {
    kinds: Vec<PieceKind>,
    next: usize,
}

#[cfg(test)]
impl SequenceSource {
    pub fn new(kinds: &[PieceKind]) -> Self {
        assert!(!kinds.is_empty(), "sequence must not be empty");
        Self {
            kinds: kinds.to_vec(),
            next: 0,
        }
    }
}

#[cfg(test)]
impl ShapeSource for SequenceSource {
    fn next_kind(&mut self) -> PieceKind {
        let kind = self.kinds[self.next % self.kinds.len()];
        self.next += 1;
        kind
    }
}
