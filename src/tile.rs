//! Tile solidity queries consumed by the collision world.
//!
//! Tiles are unit squares: tile `(col, row)` covers `[col, col + 1) x
//! [row, row + 1)` in world units, with rows growing downward.

use crate::error::PhysicsError;
use alloc::vec::Vec;

/// Collision-relevant state of one tile.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tile {
    pub solid: bool,
}

impl Tile {
    pub const SOLID: Tile = Tile { solid: true };
    pub const EMPTY: Tile = Tile { solid: false };
}

/// Read-only tile lookup. `None` means "no tile here" and is treated as
/// open space.
pub trait TileAccessor {
    fn tile(&self, col: i32, row: i32) -> Option<Tile>;

    fn is_solid(&self, col: i32, row: i32) -> bool {
        self.tile(col, row).is_some_and(|t| t.solid)
    }
}

impl<T> TileAccessor for T
where
    T: Fn(i32, i32) -> Option<Tile>,
{
    fn tile(&self, col: i32, row: i32) -> Option<Tile> {
        self(col, row)
    }
}

/// Dense, bounded tile map. Queries outside the grid return `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    cols: usize,
    rows: usize,
    solid: Vec<bool>,
}

impl TileGrid {
    /// All-open grid of `cols x rows` tiles with its origin at (0, 0).
    ///
    /// # Panics
    ///
    /// Panics if `cols * rows` overflows `usize`. Use
    /// [`try_new`](Self::try_new) for host-supplied dimensions.
    pub fn new(cols: usize, rows: usize) -> Self {
        match Self::try_new(cols, rows) {
            Ok(grid) => grid,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_new(cols: usize, rows: usize) -> Result<Self, PhysicsError> {
        let len = cols
            .checked_mul(rows)
            .ok_or(PhysicsError::GridTooLarge { cols, rows })?;
        Ok(TileGrid { cols, rows, solid: alloc::vec![false; len] })
    }

    /// Build from text rows, `'#'` marking a solid tile. Short rows are
    /// padded with open tiles.
    ///
    /// ```
    /// use frond::tile::{TileAccessor, TileGrid};
    ///
    /// let grid = TileGrid::from_rows(&["....", ".##.", "####"]);
    /// assert!(grid.is_solid(1, 1));
    /// assert!(!grid.is_solid(0, 1));
    /// assert!(!grid.is_solid(9, 9));
    /// ```
    pub fn from_rows(rows: &[&str]) -> Self {
        let cols = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut grid = TileGrid::new(cols, rows.len());
        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                grid.solid[row * cols + col] = ch == '#';
            }
        }
        grid
    }

    pub fn cols(&self) -> usize { self.cols }
    pub fn rows(&self) -> usize { self.rows }

    /// Mark a tile solid or open. Out-of-range writes are ignored.
    pub fn set_solid(&mut self, col: usize, row: usize, solid: bool) {
        if let Some(idx) = self.index(col, row) {
            self.solid[idx] = solid;
        }
    }

    fn index(&self, col: usize, row: usize) -> Option<usize> {
        (col < self.cols && row < self.rows).then(|| row * self.cols + col)
    }
}

impl TileAccessor for TileGrid {
    fn tile(&self, col: i32, row: i32) -> Option<Tile> {
        let col = usize::try_from(col).ok()?;
        let row = usize::try_from(row).ok()?;
        self.index(col, row).map(|idx| Tile { solid: self.solid[idx] })
    }
}
