use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::WINNER_MARKER;

/// Supported board configurations, one room each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BoardSize {
    Side4,
    Side16,
    Side256,
    Side1024,
}

impl BoardSize {
    pub const ALL: [BoardSize; 4] = [
        BoardSize::Side4,
        BoardSize::Side16,
        BoardSize::Side256,
        BoardSize::Side1024,
    ];

    /// Number of cells along one edge
    pub fn side(self) -> usize {
        match self {
            BoardSize::Side4 => 4,
            BoardSize::Side16 => 16,
            BoardSize::Side256 => 256,
            BoardSize::Side1024 => 1024,
        }
    }

    /// Total number of cells (side²)
    pub fn cells(self) -> usize {
        self.side() * self.side()
    }

    /// Path segment naming this size, e.g. `16x16`
    pub fn label(self) -> String {
        format!("{0}x{0}", self.side())
    }

    /// Whether every successful claim is published immediately
    ///
    /// The 1024x1024 board publishes claims on the periodic tick instead;
    /// a full snapshot per move at that size would swamp the outbound queues.
    pub fn broadcasts_every_claim(self) -> bool {
        self.cells() <= BoardSize::Side256.cells()
    }
}

impl fmt::Display for BoardSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{0}x{0}", self.side())
    }
}

impl FromStr for BoardSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s
            .split_once('x')
            .ok_or_else(|| format!("unknown board size `{}`", s))?;
        if width != height {
            return Err(format!("board must be square, got `{}`", s));
        }
        BoardSize::ALL
            .into_iter()
            .find(|size| size.side().to_string() == width)
            .ok_or_else(|| format!("unknown board size `{}`", s))
    }
}

/// Ownership state of one board position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Owned(String),
    Winner,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn owner(&self) -> Option<&str> {
        match self {
            Cell::Owned(player_id) => Some(player_id.as_str()),
            _ => None,
        }
    }
}

// Wire form: null, the owner's id, or the winner marker
impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Empty => serializer.serialize_none(),
            Cell::Owned(player_id) => serializer.serialize_str(player_id),
            Cell::Winner => serializer.serialize_str(WINNER_MARKER),
        }
    }
}

/// Index of filled cells kept alongside the cell vector
#[derive(Debug, Clone)]
enum Occupancy {
    /// One bit per cell, for boards that fit in a machine word
    Mask { bits: u64, full: u64 },
    /// Filled-cell counter for everything larger
    Count { filled: usize, total: usize },
}

impl Occupancy {
    fn for_cells(cells: usize) -> Self {
        if cells <= u64::BITS as usize {
            let full = if cells == u64::BITS as usize {
                u64::MAX
            } else {
                (1u64 << cells) - 1
            };
            Occupancy::Mask { bits: 0, full }
        } else {
            Occupancy::Count {
                filled: 0,
                total: cells,
            }
        }
    }

    fn mark(&mut self, index: usize) {
        match self {
            Occupancy::Mask { bits, .. } => *bits |= 1u64 << index,
            Occupancy::Count { filled, .. } => *filled += 1,
        }
    }

    fn is_full(&self) -> bool {
        match self {
            Occupancy::Mask { bits, full } => bits == full,
            Occupancy::Count { filled, total } => filled == total,
        }
    }

    fn clear(&mut self) {
        match self {
            Occupancy::Mask { bits, .. } => *bits = 0,
            Occupancy::Count { filled, .. } => *filled = 0,
        }
    }
}

/// Fixed-size grid of cell ownership
///
/// The board has no interior locking: the owning room serializes every
/// mutation, which is what makes `claim` atomic per cell.
#[derive(Debug, Clone)]
pub struct Board {
    size: BoardSize,
    cells: Vec<Cell>,
    occupancy: Occupancy,
}

impl Board {
    pub fn new(size: BoardSize) -> Self {
        Self {
            size,
            cells: vec![Cell::Empty; size.cells()],
            occupancy: Occupancy::for_cells(size.cells()),
        }
    }

    pub fn size(&self) -> BoardSize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Take an empty cell for `player_id`
    ///
    /// # Returns
    ///
    /// True if the cell was empty and is now owned by the player; false for
    /// an out-of-range index or a cell that is already taken
    pub fn claim(&mut self, index: usize, player_id: &str) -> bool {
        match self.cells.get_mut(index) {
            Some(cell) if cell.is_empty() => {
                *cell = Cell::Owned(player_id.to_string());
                self.occupancy.mark(index);
                true
            }
            _ => false,
        }
    }

    /// True iff no cell is empty
    pub fn is_full(&self) -> bool {
        self.occupancy.is_full()
    }

    /// Clear every cell and the occupancy index
    pub(crate) fn reset(&mut self) {
        self.cells.fill(Cell::Empty);
        self.occupancy.clear();
    }

    /// Mark the elected cell, returning what it held before
    pub(crate) fn mark_winner(&mut self, index: usize) -> Option<Cell> {
        self.cells
            .get_mut(index)
            .map(|cell| std::mem::replace(cell, Cell::Winner))
    }

    /// Borrowed read-only view of every cell
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Owned copy of every cell
    pub fn snapshot(&self) -> Vec<Cell> {
        self.cells.clone()
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Indices of cells currently owned by a player
    pub fn owned_indices(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.owner().is_some())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_empty()).count()
    }
}
