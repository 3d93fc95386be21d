//! Cell matrix owned by one generation run

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use super::{Cell, CellKind};
use crate::consts::S_ENTRANCE;

/// A grid coordinate `(x, y)`
pub type Pos = (usize, usize);

/// One of the four orthogonal directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum Side {
    North,
    East,
    South,
    West,
}

impl Side {
    /// Fixed neighbour visiting order; every scan in the crate relies on it
    pub const ALL: [Side; 4] = [Side::North, Side::East, Side::South, Side::West];

    /// Unit step for this direction
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Side::North => (0, -1),
            Side::East => (1, 0),
            Side::South => (0, 1),
            Side::West => (-1, 0),
        }
    }

    pub const fn opposite(self) -> Side {
        match self {
            Side::North => Side::South,
            Side::East => Side::West,
            Side::South => Side::North,
            Side::West => Side::East,
        }
    }

    /// East/West sides are crossed by horizontal runs
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Side::East | Side::West)
    }
}

const DIAGONALS: [(i32, i32); 4] = [(-1, -1), (1, -1), (1, 1), (-1, 1)];

/// Iterate all coordinates of a `width` x `height` area in row-major order
pub fn row_major(width: usize, height: usize) -> impl Iterator<Item = Pos> {
    (0..height).flat_map(move |y| (0..width).map(move |x| (x, y)))
}

/// Width x height matrix of cells, indexed `cells[x][y]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Vec<Cell>>,
}

impl Grid {
    /// Create an all-wall grid
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![vec![Cell::wall(); height]; width],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// Dense index for per-cell side tables
    pub fn index(&self, (x, y): Pos) -> usize {
        y * self.width + x
    }

    /// Check signed coordinates against the grid bounds
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Cell at a position (panics when out of bounds)
    pub fn cell(&self, x: usize, y: usize) -> &Cell {
        &self.cells[x][y]
    }

    pub fn cell_mut(&mut self, x: usize, y: usize) -> &mut Cell {
        &mut self.cells[x][y]
    }

    /// Bounds-checked lookup
    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        if self.in_bounds(x, y) {
            Some(&self.cells[x as usize][y as usize])
        } else {
            None
        }
    }

    pub fn kind(&self, x: usize, y: usize) -> CellKind {
        self.cells[x][y].kind
    }

    /// Change a cell's kind; leaving the room kinds also drops the owner
    pub fn set_kind(&mut self, x: usize, y: usize, kind: CellKind) {
        let cell = &mut self.cells[x][y];
        cell.kind = kind;
        if !matches!(kind, CellKind::Room | CellKind::TeleportPad) {
            cell.room = None;
        }
    }

    /// Check if a move target is walkable (out of bounds is not)
    pub fn is_walkable(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cells[x][y].is_walkable()
    }

    /// Step one cell from `pos` towards `side`
    pub fn step(&self, (x, y): Pos, side: Side) -> Option<Pos> {
        let (dx, dy) = side.delta();
        let (nx, ny) = (x as i32 + dx, y as i32 + dy);
        self.in_bounds(nx, ny).then_some((nx as usize, ny as usize))
    }

    /// Orthogonal neighbours in N, E, S, W order
    pub fn neighbors4(&self, pos: Pos) -> [Option<Pos>; 4] {
        Side::ALL.map(|side| self.step(pos, side))
    }

    /// Diagonal neighbours
    pub fn diagonals(&self, (x, y): Pos) -> [Option<Pos>; 4] {
        DIAGONALS.map(|(dx, dy)| {
            let (nx, ny) = (x as i32 + dx, y as i32 + dy);
            self.in_bounds(nx, ny).then_some((nx as usize, ny as usize))
        })
    }

    /// Count orthogonal neighbours matching a predicate
    pub fn count_neighbors4(&self, pos: Pos, pred: impl Fn(&Cell) -> bool) -> usize {
        self.neighbors4(pos)
            .into_iter()
            .flatten()
            .filter(|&(nx, ny)| pred(self.cell(nx, ny)))
            .count()
    }

    /// Check whether any orthogonal neighbour matches a predicate
    pub fn any_neighbor4(&self, pos: Pos, pred: impl Fn(&Cell) -> bool) -> bool {
        self.count_neighbors4(pos, pred) > 0
    }

    /// Number of cells of a kind
    pub fn count_kind(&self, kind: CellKind) -> usize {
        self.cells
            .iter()
            .flat_map(|col| col.iter())
            .filter(|cell| cell.kind == kind)
            .count()
    }

    /// Cell kinds in row-major order (the export layout)
    pub fn rows(&self) -> Vec<Vec<CellKind>> {
        (0..self.height)
            .map(|y| (0..self.width).map(|x| self.cells[x][y].kind).collect())
            .collect()
    }

    /// Positions whose cells differ between two grids of the same size
    ///
    /// Grids of different sizes differ everywhere in the larger footprint.
    pub fn diff(&self, other: &Grid) -> Vec<Pos> {
        let width = self.width.max(other.width);
        let height = self.height.max(other.height);
        row_major(width, height)
            .filter(|&(x, y)| {
                let a = self.get(x as i32, y as i32);
                let b = other.get(x as i32, y as i32);
                a != b
            })
            .collect()
    }

    /// Render as text, one line per row
    pub fn render_ascii(&self, entrance: Option<Pos>) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                if entrance == Some((x, y)) {
                    out.push(S_ENTRANCE);
                } else {
                    out.push(self.cells[x][y].kind.symbol());
                }
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_wall() {
        let grid = Grid::new(10, 6);
        assert_eq!(grid.count_kind(CellKind::Wall), 60);
        assert_eq!(grid.rows().len(), 6);
        assert_eq!(grid.rows()[0].len(), 10);
    }

    #[test]
    fn test_neighbors_order_and_bounds() {
        let grid = Grid::new(5, 5);
        assert_eq!(
            grid.neighbors4((2, 2)),
            [Some((2, 1)), Some((3, 2)), Some((2, 3)), Some((1, 2))]
        );
        assert_eq!(grid.neighbors4((0, 0)), [None, Some((1, 0)), Some((0, 1)), None]);
        assert_eq!(grid.diagonals((0, 0)).iter().flatten().count(), 1);
    }

    #[test]
    fn test_row_major_order() {
        let order: Vec<_> = row_major(2, 2).collect();
        assert_eq!(order, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn test_set_kind_drops_owner() {
        let mut grid = Grid::new(4, 4);
        *grid.cell_mut(1, 1) = Cell::floor(crate::dungeon::RoomId(0));
        grid.set_kind(1, 1, CellKind::TeleportPad);
        assert!(grid.cell(1, 1).room.is_some());
        grid.set_kind(1, 1, CellKind::Tunnel);
        assert!(grid.cell(1, 1).room.is_none());
    }

    #[test]
    fn test_diff_and_render() {
        let a = Grid::new(3, 2);
        let mut b = a.clone();
        assert!(a.diff(&b).is_empty());
        b.set_kind(2, 1, CellKind::Tunnel);
        assert_eq!(a.diff(&b), vec![(2, 1)]);
        assert_eq!(b.render_ascii(Some((0, 0))), "@##\n##,\n");
    }

    #[test]
    fn test_is_walkable_out_of_bounds() {
        let mut grid = Grid::new(3, 3);
        grid.set_kind(1, 1, CellKind::Tunnel);
        assert!(grid.is_walkable(1, 1));
        assert!(!grid.is_walkable(0, 0));
        assert!(!grid.is_walkable(3, 1));
    }
}
