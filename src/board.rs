use crate::chain::Chain;
use crate::error::InvalidTileId;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

// Grid cells named from 1A to 9L.
pub const GRID_WIDTH: usize = 12;
pub const GRID_HEIGHT: usize = 9;
pub const NUM_TILES: usize = GRID_WIDTH * GRID_HEIGHT;

/// A board position: row 1-9, column A-L. Ordering is row-major.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tile {
    row: u8,
    col: u8,
}
impl Tile {
    /// Zero-based row and column. Panics on out-of-grid coordinates, which
    /// only internal callers can produce.
    pub fn new(row: usize, col: usize) -> Self {
        assert!(row < GRID_HEIGHT && col < GRID_WIDTH, "Invalid tile coordinates");
        Self {
            row: row as u8,
            col: col as u8,
        }
    }
    pub fn row(self) -> usize {
        self.row as usize
    }
    pub fn col(self) -> usize {
        self.col as usize
    }
    pub fn adjacent(self) -> Vec<Tile> {
        let (r, c) = (self.row(), self.col());
        let mut neighbors = Vec::with_capacity(4);
        if r > 0 {
            neighbors.push(Tile::new(r - 1, c));
        }
        if r < GRID_HEIGHT - 1 {
            neighbors.push(Tile::new(r + 1, c));
        }
        if c > 0 {
            neighbors.push(Tile::new(r, c - 1));
        }
        if c < GRID_WIDTH - 1 {
            neighbors.push(Tile::new(r, c + 1));
        }
        neighbors
    }
}
impl std::fmt::Display for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.row + 1, (b'A' + self.col) as char)
    }
}
impl std::fmt::Debug for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}
impl std::str::FromStr for Tile {
    type Err = InvalidTileId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [r @ b'1'..=b'9', c @ b'A'..=b'L'] => Ok(Tile::new(
                (r - b'1') as usize,
                (c - b'A') as usize,
            )),
            _ => Err(InvalidTileId(s.to_owned())),
        }
    }
}
impl TryFrom<String> for Tile {
    type Error = InvalidTileId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
impl From<Tile> for String {
    fn from(tile: Tile) -> Self {
        tile.to_string()
    }
}

/// All 108 tiles in row-major order.
pub fn generate_all_tiles() -> Vec<Tile> {
    (0..GRID_HEIGHT)
        .flat_map(|row| (0..GRID_WIDTH).map(move |col| Tile::new(row, col)))
        .collect()
}

/// Fisher-Yates shuffle into a new vector, leaving `items` untouched.
pub fn shuffle<T: Clone>(items: &[T], rng: &mut impl rand::Rng) -> Vec<T> {
    let mut shuffled = items.to_vec();
    shuffled.shuffle(rng);
    shuffled
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    // Placed, but not part of any chain.
    Hotel,
    Chain(Chain),
}
impl Cell {
    pub fn is_placed(self) -> bool {
        self != Cell::Empty
    }
    pub fn chain(self) -> Option<Chain> {
        match self {
            Cell::Chain(chain) => Some(chain),
            _ => None,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Board {
    grid: [[Cell; GRID_WIDTH]; GRID_HEIGHT],
}
impl Board {
    pub fn cell(&self, tile: Tile) -> Cell {
        self.grid[tile.row()][tile.col()]
    }
    pub fn is_placed(&self, tile: Tile) -> bool {
        self.cell(tile).is_placed()
    }
    pub(crate) fn set(&mut self, tile: Tile, cell: Cell) {
        self.grid[tile.row()][tile.col()] = cell;
    }
    pub fn placed_tiles(&self) -> impl Iterator<Item = (Tile, Cell)> + '_ {
        generate_all_tiles()
            .into_iter()
            .map(|t| (t, self.cell(t)))
            .filter(|(_, cell)| cell.is_placed())
    }
    pub fn neighbors(&self, tile: Tile) -> Vec<(Tile, Cell)> {
        tile.adjacent()
            .into_iter()
            .map(|t| (t, self.cell(t)))
            .filter(|(_, cell)| cell.is_placed())
            .collect()
    }
}
impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, " ")?;
        for col in 0..GRID_WIDTH {
            write!(f, "{}", (b'A' + col as u8) as char)?;
        }
        writeln!(f)?;
        for (i, row) in self.grid.iter().enumerate() {
            write!(f, "{}", i + 1)?;
            for cell in row.iter() {
                match cell {
                    Cell::Empty => write!(f, "_")?,
                    Cell::Hotel => write!(f, "*")?,
                    Cell::Chain(chain) => write!(f, "{}", chain.initial())?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    #[test]
    fn tile_display() {
        assert_eq!(Tile::new(0, 0).to_string(), "1A");
        assert_eq!(Tile::new(0, 9).to_string(), "1J");
        assert_eq!(Tile::new(1, 0).to_string(), "2A");
        assert_eq!(Tile::new(8, 11).to_string(), "9L");
    }

    #[test]
    fn parses_tile_ids() {
        assert_eq!("1A".parse::<Tile>(), Ok(Tile::new(0, 0)));
        assert_eq!("9L".parse::<Tile>(), Ok(Tile::new(8, 11)));
        for bad in ["", "0A", "1M", "10A", "A1", "1a", "1AA"] {
            assert_eq!(bad.parse::<Tile>(), Err(InvalidTileId(bad.to_owned())));
        }
    }

    #[test]
    fn tiles_deserialize_from_ids() {
        let tile: Tile = serde_json::from_str("\"5F\"").unwrap();
        assert_eq!(tile, Tile::new(4, 5));
        assert_eq!(serde_json::to_string(&tile).unwrap(), "\"5F\"");
        assert!(serde_json::from_str::<Tile>("\"5Z\"").is_err());
    }

    #[test]
    fn generates_all_tiles() {
        let tiles = generate_all_tiles();
        assert_eq!(tiles.len(), NUM_TILES);
        let ids: HashSet<String> = tiles.iter().map(|t| t.to_string()).collect();
        assert_eq!(ids.len(), NUM_TILES);
        for id in &ids {
            assert_eq!(id.parse::<Tile>().map(|t| t.to_string()).as_ref(), Ok(id));
        }
        for corner in ["1A", "1L", "9A", "9L"] {
            assert!(ids.contains(corner));
        }
        // Row-major.
        assert!(tiles.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(tiles[12].to_string(), "2A");
    }

    #[test]
    fn adjacency_counts() {
        for tile in generate_all_tiles() {
            let on_row_edge = tile.row() == 0 || tile.row() == GRID_HEIGHT - 1;
            let on_col_edge = tile.col() == 0 || tile.col() == GRID_WIDTH - 1;
            let expected = match (on_row_edge, on_col_edge) {
                (true, true) => 2,
                (true, false) | (false, true) => 3,
                (false, false) => 4,
            };
            assert_eq!(tile.adjacent().len(), expected, "tile {}", tile);
        }
    }

    #[test]
    fn shuffle_leaves_input_alone() {
        let tiles = generate_all_tiles();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let shuffled = shuffle(&tiles, &mut rng);
        assert_eq!(tiles, generate_all_tiles());
        assert_ne!(shuffled, tiles);
        let mut sorted = shuffled.clone();
        sorted.sort();
        assert_eq!(sorted, tiles);
        // Same seed, same order.
        let again = shuffle(&tiles, &mut ChaCha8Rng::seed_from_u64(7));
        assert_eq!(again, shuffled);
    }

    #[test]
    fn finds_board_neighbors() {
        let mut board = Board::default();
        assert!(board.neighbors(Tile::new(0, 0)).is_empty());
        board.set(Tile::new(1, 1), Cell::Hotel);
        assert_eq!(
            board.neighbors(Tile::new(2, 1)),
            vec![(Tile::new(1, 1), Cell::Hotel)]
        );
        board.set(Tile::new(3, 1), Cell::Chain(Chain::Luxor));
        assert_eq!(
            board.neighbors(Tile::new(2, 1)),
            vec![
                (Tile::new(1, 1), Cell::Hotel),
                (Tile::new(3, 1), Cell::Chain(Chain::Luxor)),
            ]
        );
        assert_eq!(board.placed_tiles().count(), 2);
    }

    proptest! {
        #[test]
        fn neighbors_are_symmetric(row in 0..GRID_HEIGHT, col in 0..GRID_WIDTH) {
            let tile = Tile::new(row, col);
            for n in tile.adjacent() {
                prop_assert!(n.adjacent().contains(&tile));
                let dist = n.row().abs_diff(row) + n.col().abs_diff(col);
                prop_assert_eq!(dist, 1);
            }
        }
    }
}
