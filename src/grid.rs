// HyperGrid: 5-dimensional tile placement for Hyper2048

use rand::Rng;

use crate::tile::Tile;
use crate::types::Position;

/// 5-dimensional grid of optional tiles
///
/// Slots are stored in one flat vector of `size^5` entries, indexed with x
/// as the outermost axis and v as the innermost. Ascending flat order is
/// therefore exactly the fixed enumeration order the visitors promise,
/// which keeps `available_cells` deterministic for tests.
///
/// Invariants:
/// - a stored tile's `position` equals the coordinate of its slot
/// - no two tiles occupy the same coordinate
#[derive(Debug, Clone)]
pub struct HyperGrid {
    size: usize,
    cells: Vec<Option<Tile>>,
}

impl HyperGrid {
    /// Allocate an empty grid of edge length `size`
    pub fn new(size: usize) -> HyperGrid {
        HyperGrid {
            size,
            cells: vec![None; size.pow(5)],
        }
    }

    /// Edge length of the grid
    pub fn size(&self) -> usize {
        self.size
    }

    /// True iff every axis value is in [0, size)
    pub fn within_bounds(&self, position: &Position) -> bool {
        let size = self.size as i32;
        position.x >= 0
            && position.x < size
            && position.y >= 0
            && position.y < size
            && position.z >= 0
            && position.z < size
            && position.w >= 0
            && position.w < size
            && position.v >= 0
            && position.v < size
    }

    // Callers must bounds-check first.
    fn index(&self, position: &Position) -> usize {
        let size = self.size;
        ((((position.x as usize * size + position.y as usize) * size + position.z as usize)
            * size
            + position.w as usize)
            * size)
            + position.v as usize
    }

    /// Tile at `position`, or None when empty or out of bounds
    pub fn cell_content(&self, position: &Position) -> Option<&Tile> {
        if self.within_bounds(position) {
            self.cells[self.index(position)].as_ref()
        } else {
            None
        }
    }

    /// True when the cell holds a tile
    pub fn cell_occupied(&self, position: &Position) -> bool {
        self.cell_content(position).is_some()
    }

    /// True when the cell holds no tile
    pub fn cell_available(&self, position: &Position) -> bool {
        !self.cell_occupied(position)
    }

    /// Place a tile at its own position, replacing any occupant
    ///
    /// Callers guarantee the slot is empty except when converging a merge.
    pub fn insert_tile(&mut self, tile: Tile) {
        let index = self.index(&tile.position);
        self.cells[index] = Some(tile);
    }

    /// Clear the slot at the tile's position
    pub fn remove_tile(&mut self, tile: &Tile) {
        let index = self.index(&tile.position);
        self.cells[index] = None;
    }

    /// All empty coordinates, in fixed x-outer to v-inner order
    pub fn available_cells(&self) -> Vec<Position> {
        let mut cells = Vec::new();
        self.for_each_cell(|position, tile| {
            if tile.is_none() {
                cells.push(position);
            }
        });
        cells
    }

    /// True when at least one cell is empty
    pub fn cells_available(&self) -> bool {
        self.cells.iter().any(|cell| cell.is_none())
    }

    /// Uniformly pick one empty coordinate, or None when the grid is full
    pub fn random_available_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        let cells = self.available_cells();
        if cells.is_empty() {
            None
        } else {
            Some(cells[rng.gen_range(0..cells.len())])
        }
    }

    /// Visit every cell in fixed order, read-only
    pub fn for_each_cell<F>(&self, mut visitor: F)
    where
        F: FnMut(Position, Option<&Tile>),
    {
        let size = self.size as i32;
        let mut index = 0;
        for x in 0..size {
            for y in 0..size {
                for z in 0..size {
                    for w in 0..size {
                        for v in 0..size {
                            visitor(Position::new(x, y, z, w, v), self.cells[index].as_ref());
                            index += 1;
                        }
                    }
                }
            }
        }
    }

    /// Replace every cell with the producer's output, in fixed order
    ///
    /// Used during deserialization to rebuild live tiles from a plain
    /// snapshot. The producer is a pure function of the coordinate and the
    /// current content.
    pub fn transform_each_cell<F>(&mut self, mut producer: F)
    where
        F: FnMut(Position, Option<&Tile>) -> Option<Tile>,
    {
        let size = self.size as i32;
        let mut index = 0;
        for x in 0..size {
            for y in 0..size {
                for z in 0..size {
                    for w in 0..size {
                        for v in 0..size {
                            let position = Position::new(x, y, z, w, v);
                            self.cells[index] = producer(position, self.cells[index].as_ref());
                            index += 1;
                        }
                    }
                }
            }
        }
    }

    /// Mutable access to every stored tile (slot order)
    pub(crate) fn tiles_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.cells.iter_mut().flatten()
    }
}
