//! # Cost map interface and grid implementation

// ------------------------------------------------------------------------------------------------
// INCLUDES
// ------------------------------------------------------------------------------------------------

use std::sync::Arc;

use nalgebra::{Point2, Vector2};
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Cost of a cell with nothing in it.
pub const FREE_SPACE: u8 = 0;

/// Cost of a cell which is within the inscribed radius of an obstacle, i.e. the robot's centre
/// can't be here without the footprint touching the obstacle.
pub const INSCRIBED_INFLATED_OBSTACLE: u8 = 253;

/// Cost of a cell containing an obstacle.
pub const LETHAL_OBSTACLE: u8 = 254;

/// Cost of a cell which has never been observed.
pub const NO_INFORMATION: u8 = 255;

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Index of a cell in a cost map, `x` along the first axis and `y` along the second.
///
/// Signed so that lines may be rasterized towards cells outside the map, which then read as
/// [`NO_INFORMATION`].
pub type Cell = Point2<i32>;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A grid of traversal costs.
pub trait CostMap {
    /// Get the cell containing the given world position, or `None` if the position is outside
    /// the known map.
    fn world_to_map(&self, position_m: &Vector2<f64>) -> Option<Cell>;

    /// Get the cost of the given cell. Cells outside the map must return [`NO_INFORMATION`].
    fn cell_cost(&self, cell: Cell) -> u8;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An in-memory cost map.
///
/// Cell `(0, 0)` spans from `origin_m` to `origin_m + resolution_m` in both axes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CostGrid {
    /// The size of each (square) cell in meters
    resolution_m: f64,

    /// Position of the lower corner of cell (0, 0)
    origin_m: Vector2<f64>,

    /// Raw cost data, indexed by `[[x, y]]`
    data: Array2<u8>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CostGridError {
    #[error("Requested position or cell outside map bounds")]
    OutsideMap,

    #[error("Cell resolution must be finite and greater than zero, found {0}")]
    InvalidResolution(f64),

    #[error("Cost grid must contain at least one cell in each axis, found {0:?}")]
    Empty(Vector2<usize>),

    #[error("Rectangle minimum corner {0:?} is not below its maximum corner {1:?}")]
    InvalidRect(Vector2<f64>, Vector2<f64>),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T: CostMap + ?Sized> CostMap for &T {
    fn world_to_map(&self, position_m: &Vector2<f64>) -> Option<Cell> {
        (**self).world_to_map(position_m)
    }

    fn cell_cost(&self, cell: Cell) -> u8 {
        (**self).cell_cost(cell)
    }
}

impl<T: CostMap + ?Sized> CostMap for Arc<T> {
    fn world_to_map(&self, position_m: &Vector2<f64>) -> Option<Cell> {
        (**self).world_to_map(position_m)
    }

    fn cell_cost(&self, cell: Cell) -> u8 {
        (**self).cell_cost(cell)
    }
}

impl CostGrid {
    /// Create a new grid of `num_cells` cells, each `resolution_m` wide, with every cell set to
    /// `default_cost`.
    pub fn new(
        num_cells: Vector2<usize>,
        resolution_m: f64,
        origin_m: Vector2<f64>,
        default_cost: u8,
    ) -> Result<Self, CostGridError> {
        if !resolution_m.is_finite() || resolution_m <= 0.0 {
            return Err(CostGridError::InvalidResolution(resolution_m));
        }

        if num_cells.x == 0 || num_cells.y == 0 {
            return Err(CostGridError::Empty(num_cells));
        }

        Ok(Self {
            resolution_m,
            origin_m,
            data: Array2::from_elem((num_cells.x, num_cells.y), default_cost),
        })
    }

    pub fn num_cells(&self) -> Vector2<usize> {
        let shape = self.data.shape();
        Vector2::new(shape[0], shape[1])
    }

    pub fn resolution_m(&self) -> f64 {
        self.resolution_m
    }

    pub fn origin_m(&self) -> Vector2<f64> {
        self.origin_m
    }

    /// Extent of the map in meters.
    pub fn size_m(&self) -> Vector2<f64> {
        self.num_cells().map(|n| n as f64 * self.resolution_m)
    }

    /// Position of the centre of the given cell, or `None` if the cell is not in the map.
    pub fn map_to_world(&self, cell: Cell) -> Option<Vector2<f64>> {
        self.index(cell)?;

        Some(Vector2::new(
            self.origin_m.x + (cell.x as f64 + 0.5) * self.resolution_m,
            self.origin_m.y + (cell.y as f64 + 0.5) * self.resolution_m,
        ))
    }

    pub fn set_cell_cost(&mut self, cell: Cell, cost: u8) -> Result<(), CostGridError> {
        let index = self.index(cell).ok_or(CostGridError::OutsideMap)?;

        self.data[index] = cost;

        Ok(())
    }

    /// Set every cell overlapping the axis aligned rectangle between `min_m` and `max_m` to
    /// `cost`.
    ///
    /// The rectangle is clipped to the map, it is only an error for it to lie entirely outside.
    pub fn set_rect_cost(
        &mut self,
        min_m: Vector2<f64>,
        max_m: Vector2<f64>,
        cost: u8,
    ) -> Result<(), CostGridError> {
        if !(min_m.x <= max_m.x && min_m.y <= max_m.y) {
            return Err(CostGridError::InvalidRect(min_m, max_m));
        }

        let num_cells = self.num_cells();
        let lower = ((min_m - self.origin_m) / self.resolution_m).map(f64::floor);
        let upper = ((max_m - self.origin_m) / self.resolution_m).map(f64::floor);

        for i in 0..2 {
            if upper[i] < 0.0 || lower[i] >= num_cells[i] as f64 {
                return Err(CostGridError::OutsideMap);
            }
        }

        let clip = |v: f64, n: usize| v.max(0.0).min((n - 1) as f64) as usize;
        let (x0, x1) = (clip(lower.x, num_cells.x), clip(upper.x, num_cells.x));
        let (y0, y1) = (clip(lower.y, num_cells.y), clip(upper.y, num_cells.y));

        self.data.slice_mut(s![x0..=x1, y0..=y1]).fill(cost);

        Ok(())
    }

    /// Fill the entire map with the given cost.
    pub fn fill(&mut self, cost: u8) {
        self.data.fill(cost);
    }

    /// Number of cells in the map with the given cost.
    pub fn count_cost(&self, cost: u8) -> usize {
        self.data.iter().filter(|&&c| c == cost).count()
    }

    fn index(&self, cell: Cell) -> Option<[usize; 2]> {
        let num_cells = self.num_cells();

        if cell.x < 0 || cell.y < 0 {
            return None;
        }

        let (x, y) = (cell.x as usize, cell.y as usize);

        if x >= num_cells.x || y >= num_cells.y {
            None
        } else {
            Some([x, y])
        }
    }
}

impl CostMap for CostGrid {
    fn world_to_map(&self, position_m: &Vector2<f64>) -> Option<Cell> {
        let rel = (position_m - self.origin_m) / self.resolution_m;

        // Negated comparison so that NaNs are rejected too
        if !(rel.x >= 0.0 && rel.y >= 0.0) {
            return None;
        }

        let num_cells = self.num_cells();
        if rel.x >= num_cells.x as f64 || rel.y >= num_cells.y as f64 {
            return None;
        }

        Some(Cell::new(rel.x.floor() as i32, rel.y.floor() as i32))
    }

    fn cell_cost(&self, cell: Cell) -> u8 {
        match self.index(cell) {
            Some(i) => self.data[i],
            None => NO_INFORMATION,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn grid() -> CostGrid {
        CostGrid::new(Vector2::new(10, 20), 0.5, Vector2::new(-1.0, -2.0), FREE_SPACE).unwrap()
    }

    #[test]
    fn test_new_errors() {
        assert!(matches!(
            CostGrid::new(Vector2::new(10, 10), 0.0, Vector2::zeros(), FREE_SPACE),
            Err(CostGridError::InvalidResolution(_))
        ));
        assert!(matches!(
            CostGrid::new(Vector2::new(10, 10), std::f64::NAN, Vector2::zeros(), FREE_SPACE),
            Err(CostGridError::InvalidResolution(_))
        ));
        assert!(matches!(
            CostGrid::new(Vector2::new(0, 10), 0.1, Vector2::zeros(), FREE_SPACE),
            Err(CostGridError::Empty(_))
        ));
    }

    #[test]
    fn test_world_to_map() {
        let map = grid();

        assert_eq!(map.size_m(), Vector2::new(5.0, 10.0));

        assert_eq!(map.world_to_map(&Vector2::new(-1.0, -2.0)), Some(Cell::new(0, 0)));
        assert_eq!(map.world_to_map(&Vector2::new(0.0, 0.0)), Some(Cell::new(2, 4)));
        assert_eq!(map.world_to_map(&Vector2::new(3.99, 7.99)), Some(Cell::new(9, 19)));

        // Upper edges are exclusive
        assert_eq!(map.world_to_map(&Vector2::new(4.0, 0.0)), None);
        assert_eq!(map.world_to_map(&Vector2::new(0.0, 8.0)), None);

        assert_eq!(map.world_to_map(&Vector2::new(-1.01, 0.0)), None);
        assert_eq!(map.world_to_map(&Vector2::new(std::f64::NAN, 0.0)), None);
        assert_eq!(map.world_to_map(&Vector2::new(0.0, std::f64::INFINITY)), None);
    }

    #[test]
    fn test_map_to_world() {
        let map = grid();

        assert_eq!(map.map_to_world(Cell::new(0, 0)), Some(Vector2::new(-0.75, -1.75)));
        assert_eq!(map.map_to_world(Cell::new(2, 4)), Some(Vector2::new(0.25, 0.25)));
        assert_eq!(map.map_to_world(Cell::new(10, 0)), None);
        assert_eq!(map.map_to_world(Cell::new(0, -1)), None);

        let centre = map.map_to_world(Cell::new(7, 13)).unwrap();
        assert_eq!(map.world_to_map(&centre), Some(Cell::new(7, 13)));
    }

    #[test]
    fn test_cell_cost() {
        let mut map = grid();

        map.set_cell_cost(Cell::new(3, 3), LETHAL_OBSTACLE).unwrap();
        assert_eq!(map.cell_cost(Cell::new(3, 3)), LETHAL_OBSTACLE);
        assert_eq!(map.cell_cost(Cell::new(3, 4)), FREE_SPACE);

        assert_eq!(map.cell_cost(Cell::new(-1, 3)), NO_INFORMATION);
        assert_eq!(map.cell_cost(Cell::new(3, 20)), NO_INFORMATION);

        assert!(matches!(
            map.set_cell_cost(Cell::new(10, 0), LETHAL_OBSTACLE),
            Err(CostGridError::OutsideMap)
        ));
    }

    #[test]
    fn test_set_rect_cost() {
        let mut map = grid();

        // Covers cells x in 2..=3 and y in 4..=4
        map.set_rect_cost(Vector2::new(0.0, 0.0), Vector2::new(0.6, 0.2), 100)
            .unwrap();
        assert_eq!(map.count_cost(100), 2);
        assert_eq!(map.cell_cost(Cell::new(2, 4)), 100);
        assert_eq!(map.cell_cost(Cell::new(3, 4)), 100);

        // Clipped to the map
        map.set_rect_cost(Vector2::new(3.6, -10.0), Vector2::new(10.0, 10.0), LETHAL_OBSTACLE)
            .unwrap();
        assert_eq!(map.count_cost(LETHAL_OBSTACLE), 20);

        assert!(matches!(
            map.set_rect_cost(Vector2::new(5.0, 0.0), Vector2::new(6.0, 1.0), 1),
            Err(CostGridError::OutsideMap)
        ));
        assert!(matches!(
            map.set_rect_cost(Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0), 1),
            Err(CostGridError::InvalidRect(_, _))
        ));

        map.fill(NO_INFORMATION);
        assert_eq!(map.count_cost(NO_INFORMATION), 200);
    }

    #[test]
    fn test_shared_maps() {
        let map = Arc::new(grid());
        let by_ref = &map;

        assert_eq!(
            by_ref.world_to_map(&Vector2::new(0.0, 0.0)),
            map.world_to_map(&Vector2::new(0.0, 0.0))
        );
        assert_eq!(by_ref.cell_cost(Cell::new(50, 50)), NO_INFORMATION);
    }
}
