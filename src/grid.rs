//! Tile grid: kinds, population from cumulative probability tables, forced
//! White/Black seeding, in-place mutation access.

use rand::Rng;
use thiserror::Error;

/// The four tile kinds. Clicking each has a different effect: White counts
/// toward round completion, Black fails the round, Green adds clock time,
/// Red removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    White,
    Black,
    Green,
    Red,
}

impl TileKind {
    pub const ALL: [Self; 4] = [Self::White, Self::Black, Self::Green, Self::Red];

    /// Colour index 0..4 into the theme's tile palette.
    pub fn color_index(self) -> usize {
        match self {
            Self::White => 0,
            Self::Black => 1,
            Self::Green => 2,
            Self::Red => 3,
        }
    }
}

/// One grid cell. `enabled == false` means the tile has been resolved and is
/// inert: further clicks on it are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub kind: TileKind,
    pub enabled: bool,
}

/// Cumulative upper bounds for drawing a fresh tile kind from a uniform
/// [0, 1) variable, in the order White, Black, Green; Red takes the rest.
#[derive(Debug, Clone, Copy)]
pub struct SpawnTable {
    pub white: f64,
    pub black: f64,
    pub green: f64,
}

/// Easy-mode 5x5 table: ~44% white, 36% black, 12% green, 8% red.
pub const EASY_SPAWN: SpawnTable = SpawnTable {
    white: 0.44,
    black: 0.80,
    green: 0.92,
};

/// Hard-mode initial 6x6 table: ~41.7% white, 27.8% black, 16.7% green.
pub const HARD_SPAWN: SpawnTable = SpawnTable {
    white: 0.417,
    black: 0.695,
    green: 0.862,
};

impl SpawnTable {
    pub fn pick(&self, r: f64) -> TileKind {
        if r <= self.white {
            TileKind::White
        } else if r <= self.black {
            TileKind::Black
        } else if r <= self.green {
            TileKind::Green
        } else {
            TileKind::Red
        }
    }
}

#[derive(Debug, Error)]
pub enum GridError {
    /// Grid allocation failed under memory pressure; no partial grid is kept.
    #[error("grid allocation failed: out of memory")]
    ResourceExhausted,
    /// Coordinate outside grid bounds; a programming defect, never expected.
    #[error("grid coordinate ({x}, {y}) out of bounds for size {size}")]
    OutOfBounds { x: usize, y: usize, size: usize },
}

/// Square matrix of tiles, row-major. Every cell holds exactly one tile from
/// population onward.
#[derive(Debug, Clone)]
pub struct Grid {
    size: usize,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Populate a fresh `size` x `size` grid, drawing each cell independently
    /// from `table`. Afterward the grid is guaranteed completable and risky:
    /// if no White tile was drawn the centre cell is forced White, and if no
    /// Black tile was drawn cell (0, 0) is forced Black.
    pub fn populate<R: Rng>(size: usize, table: &SpawnTable, rng: &mut R) -> Result<Self, GridError> {
        let cells = size * size;
        let mut tiles = Vec::new();
        tiles
            .try_reserve_exact(cells)
            .map_err(|_| GridError::ResourceExhausted)?;
        for _ in 0..cells {
            tiles.push(Tile {
                kind: table.pick(rng.random::<f64>()),
                enabled: true,
            });
        }
        let mut grid = Self { size, tiles };

        if grid.count(TileKind::White) == 0 {
            let c = size / 2;
            grid.force_kind(c, c, TileKind::White);
        }
        if grid.count(TileKind::Black) == 0 {
            grid.force_kind(0, 0, TileKind::Black);
        }
        Ok(grid)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&Tile> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.tiles.get(y * self.size + x)
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut Tile> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.tiles.get_mut(y * self.size + x)
    }

    /// Number of tiles of `kind`, enabled or not.
    pub fn count(&self, kind: TileKind) -> u32 {
        self.tiles.iter().filter(|t| t.kind == kind).count() as u32
    }

    /// All cells as (x, y, tile).
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &Tile)> {
        self.tiles
            .iter()
            .enumerate()
            .map(|(i, t)| (i % self.size, i / self.size, t))
    }

    fn force_kind(&mut self, x: usize, y: usize, kind: TileKind) {
        if let Some(tile) = self.get_mut(x, y) {
            tile.kind = kind;
            tile.enabled = true;
        }
    }
}
