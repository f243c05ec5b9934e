//! Гексагональная сетка со смещёнными столбцами
//!
//! Нечётные столбцы сдвинуты на полгекса вниз, поэтому смещения соседей
//! зависят от чётности `x`. Координаты знаковые: соседи клетки на краю
//! лежат за пределами карты, и это нужно рекам и дорогам.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HexCoord {
    pub x: i32,
    pub y: i32,
}

/// Направления в порядке обхода соседей: N, NE, SE, S, SW, NW
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    NorthEast,
    SouthEast,
    South,
    SouthWest,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::NorthWest,
    ];
}

/// Ось прямого участка пути через гекс (используется для мостов)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    NorthSouth,
    SouthWestNorthEast,
    SouthEastNorthWest,
}

impl Axis {
    /// Индекс в списке `convert_to_bridge`
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Axis::NorthSouth => 0,
            Axis::SouthWestNorthEast => 1,
            Axis::SouthEastNorthWest => 2,
        }
    }
}

fn is_odd(v: i32) -> bool {
    v.rem_euclid(2) == 1
}

impl HexCoord {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn neighbor(self, dir: Direction) -> HexCoord {
        let odd = is_odd(self.x);
        let (x, y) = (self.x, self.y);
        match dir {
            Direction::North => HexCoord::new(x, y - 1),
            Direction::NorthEast => HexCoord::new(x + 1, if odd { y } else { y - 1 }),
            Direction::SouthEast => HexCoord::new(x + 1, if odd { y + 1 } else { y }),
            Direction::South => HexCoord::new(x, y + 1),
            Direction::SouthWest => HexCoord::new(x - 1, if odd { y + 1 } else { y }),
            Direction::NorthWest => HexCoord::new(x - 1, if odd { y } else { y - 1 }),
        }
    }

    /// Шесть соседей в порядке [`Direction::ALL`]
    #[must_use]
    pub fn neighbors(self) -> [HexCoord; 6] {
        Direction::ALL.map(|dir| self.neighbor(dir))
    }

    #[must_use]
    pub fn is_adjacent(self, other: HexCoord) -> bool {
        self.neighbors().contains(&other)
    }

    /// Расстояние в гексах
    #[must_use]
    pub fn distance(self, other: HexCoord) -> u32 {
        let hdistance = self.x.abs_diff(other.x);
        let vpenalty = u32::from(
            (!is_odd(self.x) && is_odd(other.x) && self.y < other.y)
                || (!is_odd(other.x) && is_odd(self.x) && other.y < self.y),
        );
        hdistance.max(self.y.abs_diff(other.y) + vpenalty + hdistance / 2)
    }

    /// Ось, на которой `prev` и `next` — противоположные соседи этой клетки.
    ///
    /// `None`, если путь через клетку поворачивает.
    #[must_use]
    pub fn axis_between(self, prev: HexCoord, next: HexCoord) -> Option<Axis> {
        let adj = self.neighbors();
        let opposite = |a: usize, b: usize| {
            (prev == adj[a] && next == adj[b]) || (prev == adj[b] && next == adj[a])
        };
        if opposite(0, 3) {
            Some(Axis::NorthSouth)
        } else if opposite(1, 4) {
            Some(Axis::SouthWestNorthEast)
        } else if opposite(2, 5) {
            Some(Axis::SouthEastNorthWest)
        } else {
            None
        }
    }

    /// Квадратная окрестность 3×3 без центра (строки/столбцы ±1)
    #[must_use]
    pub fn square_ring(self) -> [HexCoord; 8] {
        let (x, y) = (self.x, self.y);
        [
            HexCoord::new(x - 1, y - 1),
            HexCoord::new(x, y - 1),
            HexCoord::new(x + 1, y - 1),
            HexCoord::new(x - 1, y),
            HexCoord::new(x + 1, y),
            HexCoord::new(x - 1, y + 1),
            HexCoord::new(x, y + 1),
            HexCoord::new(x + 1, y + 1),
        ]
    }
}
