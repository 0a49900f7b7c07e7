//! # Collision rasterizer
//!
//! Scores single cells and straight lines of cells against a [`CostMap`]. A cell is invalid if it
//! is a lethal obstacle, lies inside the inscribed inflation of an obstacle, or has no
//! information. A line is walked with integer Bresenham rasterization and is as costly as its
//! worst cell, or invalid if any cell on it is.
//!
//! The exact cells visited by a line are produced by [`LineCells`]. The major axis is the one
//! with the larger delta (X wins ties) and the minor axis is stepped by an accumulated error that
//! starts at half the major delta, so `A -> B` and `B -> A` can visit different intermediate
//! cells. [`line_cost`] always rasterizes from the lesser endpoint (ordered by X then Y), which
//! makes its result independent of the argument order.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::map::{
    Cell, CostMap, INSCRIBED_INFLATED_OBSTACLE, LETHAL_OBSTACLE, NO_INFORMATION,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Iterator over the cells of a Bresenham line, both end cells included.
#[derive(Debug, Clone)]
pub struct LineCells {
    x: i32,
    y: i32,

    /// Steps applied when the error overflows the denominator
    x_inc_overflow: i32,
    y_inc_overflow: i32,

    /// Steps applied on every iteration
    x_inc_always: i32,
    y_inc_always: i32,

    den: i32,
    num: i32,
    num_add: i32,

    /// Number of cells still to be produced
    remaining: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LineCells {
    /// Create the rasterization of the line from `start` to `end`.
    pub fn new(start: Cell, end: Cell) -> Self {
        let delta_x = (end.x - start.x).abs();
        let delta_y = (end.y - start.y).abs();

        let x_sign = if end.x >= start.x { 1 } else { -1 };
        let y_sign = if end.y >= start.y { 1 } else { -1 };

        // X is the major axis when there is at least one x-value for every y-value
        if delta_x >= delta_y {
            Self {
                x: start.x,
                y: start.y,
                x_inc_overflow: 0,
                y_inc_overflow: y_sign,
                x_inc_always: x_sign,
                y_inc_always: 0,
                den: delta_x,
                num: delta_x / 2,
                num_add: delta_y,
                remaining: delta_x as u32 + 1,
            }
        } else {
            Self {
                x: start.x,
                y: start.y,
                x_inc_overflow: x_sign,
                y_inc_overflow: 0,
                x_inc_always: 0,
                y_inc_always: y_sign,
                den: delta_y,
                num: delta_y / 2,
                num_add: delta_x,
                remaining: delta_y as u32 + 1,
            }
        }
    }
}

impl Iterator for LineCells {
    type Item = Cell;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let cell = Cell::new(self.x, self.y);

        self.num += self.num_add;
        if self.num >= self.den {
            self.num -= self.den;
            self.x += self.x_inc_overflow;
            self.y += self.y_inc_overflow;
        }
        self.x += self.x_inc_always;
        self.y += self.y_inc_always;

        Some(cell)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining as usize, Some(self.remaining as usize))
    }
}

impl ExactSizeIterator for LineCells {}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Returns `true` if the cost is one of the sentinel classes that can never be traversed.
pub fn is_untraversable(cost: u8) -> bool {
    cost == LETHAL_OBSTACLE || cost == INSCRIBED_INFLATED_OBSTACLE || cost == NO_INFORMATION
}

/// Cost of a single cell, or `None` if the cell can't be traversed.
pub fn point_cost<M: CostMap + ?Sized>(cost_map: &M, cell: Cell) -> Option<f64> {
    let cost = cost_map.cell_cost(cell);

    if is_untraversable(cost) {
        None
    } else {
        Some(cost as f64)
    }
}

/// Cost of the ray-traced line between two cells.
///
/// Returns `None` as soon as an untraversable cell is found, otherwise the maximum point cost
/// along the line.
pub fn line_cost<M: CostMap + ?Sized>(cost_map: &M, start: Cell, end: Cell) -> Option<f64> {
    let (from, to) = if (start.x, start.y) <= (end.x, end.y) {
        (start, end)
    } else {
        (end, start)
    };

    let mut line_cost = 0f64;

    for cell in LineCells::new(from, to) {
        let cost = point_cost(cost_map, cell)?;

        if line_cost < cost {
            line_cost = cost;
        }
    }

    Some(line_cost)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::map::{CostGrid, FREE_SPACE};
    use nalgebra::Vector2;

    fn cells(start: (i32, i32), end: (i32, i32)) -> Vec<(i32, i32)> {
        LineCells::new(Cell::new(start.0, start.1), Cell::new(end.0, end.1))
            .map(|c| (c.x, c.y))
            .collect()
    }

    fn grid() -> CostGrid {
        CostGrid::new(Vector2::new(20, 20), 0.1, Vector2::new(0.0, 0.0), FREE_SPACE).unwrap()
    }

    #[test]
    fn test_line_cells_x_major() {
        assert_eq!(
            cells((0, 0), (4, 2)),
            vec![(0, 0), (1, 1), (2, 1), (3, 2), (4, 2)]
        );

        // The reverse direction rasterizes differently
        assert_eq!(
            cells((4, 2), (0, 0)),
            vec![(4, 2), (3, 1), (2, 1), (1, 0), (0, 0)]
        );
    }

    #[test]
    fn test_line_cells_y_major() {
        assert_eq!(
            cells((0, 0), (1, 3)),
            vec![(0, 0), (0, 1), (1, 2), (1, 3)]
        );
        assert_eq!(
            cells((2, 5), (2, 1)),
            vec![(2, 5), (2, 4), (2, 3), (2, 2), (2, 1)]
        );
    }

    #[test]
    fn test_line_cells_diagonal_and_degenerate() {
        // Equal deltas pick X as the major axis, the minor axis steps every cell
        assert_eq!(cells((0, 0), (3, -3)), vec![(0, 0), (1, -1), (2, -2), (3, -3)]);

        // A single cell line visits exactly that cell
        assert_eq!(cells((7, 7), (7, 7)), vec![(7, 7)]);

        assert_eq!(LineCells::new(Cell::new(0, 0), Cell::new(-6, 2)).len(), 7);
    }

    #[test]
    fn test_point_cost() {
        let mut map = grid();
        map.set_cell_cost(Cell::new(1, 1), LETHAL_OBSTACLE).unwrap();
        map.set_cell_cost(Cell::new(2, 1), INSCRIBED_INFLATED_OBSTACLE).unwrap();
        map.set_cell_cost(Cell::new(3, 1), NO_INFORMATION).unwrap();
        map.set_cell_cost(Cell::new(4, 1), 120).unwrap();

        assert_eq!(point_cost(&map, Cell::new(0, 0)), Some(0.0));
        assert_eq!(point_cost(&map, Cell::new(1, 1)), None);
        assert_eq!(point_cost(&map, Cell::new(2, 1)), None);
        assert_eq!(point_cost(&map, Cell::new(3, 1)), None);
        assert_eq!(point_cost(&map, Cell::new(4, 1)), Some(120.0));

        // Cells off the grid have no information
        assert_eq!(point_cost(&map, Cell::new(-1, 0)), None);
        assert_eq!(point_cost(&map, Cell::new(20, 0)), None);
    }

    #[test]
    fn test_line_cost_max() {
        let mut map = grid();
        map.set_cell_cost(Cell::new(2, 1), 50).unwrap();
        map.set_cell_cost(Cell::new(3, 2), 90).unwrap();

        assert_eq!(line_cost(&map, Cell::new(0, 0), Cell::new(4, 2)), Some(90.0));
        assert_eq!(line_cost(&map, Cell::new(0, 5), Cell::new(10, 5)), Some(0.0));
    }

    #[test]
    fn test_line_cost_invalid_cells() {
        for sentinel in [LETHAL_OBSTACLE, INSCRIBED_INFLATED_OBSTACLE, NO_INFORMATION].iter() {
            let mut map = grid();
            map.set_cell_cost(Cell::new(5, 5), *sentinel).unwrap();

            // Costly cells elsewhere don't rescue the line
            map.set_cell_cost(Cell::new(2, 5), 10).unwrap();

            assert_eq!(line_cost(&map, Cell::new(0, 5), Cell::new(10, 5)), None);
            assert_eq!(line_cost(&map, Cell::new(5, 0), Cell::new(5, 10)), None);
            assert_eq!(line_cost(&map, Cell::new(0, 0), Cell::new(10, 10)), None);
        }
    }

    #[test]
    fn test_line_cost_direction_validity() {
        // (1, 1) is only on the forward rasterization of (0, 0) -> (4, 2)
        let mut map = grid();
        map.set_cell_cost(Cell::new(1, 1), LETHAL_OBSTACLE).unwrap();
        assert!(!cells((4, 2), (0, 0)).contains(&(1, 1)));
        assert_eq!(line_cost(&map, Cell::new(0, 0), Cell::new(4, 2)), None);
        assert_eq!(line_cost(&map, Cell::new(4, 2), Cell::new(0, 0)), None);

        let mut map = grid();
        map.set_cell_cost(Cell::new(2, 1), LETHAL_OBSTACLE).unwrap();
        map.set_cell_cost(Cell::new(9, 13), LETHAL_OBSTACLE).unwrap();

        let ends = [
            (Cell::new(0, 0), Cell::new(4, 2)),
            (Cell::new(0, 0), Cell::new(19, 19)),
            (Cell::new(3, 17), Cell::new(15, 9)),
            (Cell::new(0, 19), Cell::new(19, 0)),
            (Cell::new(8, 0), Cell::new(10, 19)),
        ];

        for (a, b) in ends.iter() {
            assert_eq!(
                line_cost(&map, *a, *b).is_some(),
                line_cost(&map, *b, *a).is_some(),
                "validity differs between {:?} and {:?}",
                a,
                b
            );
        }
    }
}
