//! Озёра и реки
//!
//! Озеро — случайный разлив по четырём осевым направлениям с угасающей
//! вероятностью. Река — поиск в глубину по гексагональным соседям от истока
//! до воды или края карты с ограничением на подъём. Оба алгоритма работают
//! на явном стеке, порядок обращений к генератору случайных чисел совпадает
//! с рекурсивной формулировкой.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::heightmap::Heightmap;
use crate::hex::HexCoord;
use crate::terrain::TerrainGrid;

/// Число попыток найти исток для одного озера
const LAKE_SOURCE_TRIES: usize = 100;

/// Порядок разлива озера: восток, запад, юг, север
const LAKE_DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterSymbols {
    /// Этим символом заливаются реки и озёра
    pub shallow: char,
    pub deep: char,
}

impl WaterSymbols {
    pub fn is_water(&self, terrain: char) -> bool {
        terrain == self.shallow || terrain == self.deep
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HydrologyParams {
    pub max_lakes: usize,
    pub min_lake_height: i32,
    /// Допустимый подъём русла между соседними клетками
    pub river_uphill: i32,
    /// Начальная вероятность разлива озера, в процентах
    pub lake_fall_off: i32,
    pub water: WaterSymbols,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiverOutcome {
    /// Русло дошло до воды или края карты и залито
    Committed(Vec<HexCoord>),
    /// Поиск вернулся к истоку, карта не изменена
    Abandoned,
}

#[derive(Debug, Clone, Default)]
pub struct HydrologyStats {
    pub lakes: usize,
    pub lake_cells: usize,
    pub rivers: Vec<Vec<HexCoord>>,
    pub abandoned_sources: Vec<HexCoord>,
}

enum Step {
    Reached,
    Rejected,
    Entered,
}

struct RiverFrame {
    neighbors: [HexCoord; 6],
    next: usize,
}

/// Прокладывает реку от `source` и заливает её русло.
///
/// Посещённые клетки не забываются при откате, поэтому каждая клетка
/// рассматривается не более одного раза.
pub fn carve_river<R: Rng + ?Sized>(
    rng: &mut R,
    heightmap: &Heightmap,
    terrain: &mut TerrainGrid,
    source: HexCoord,
    uphill: i32,
    water: WaterSymbols,
) -> RiverOutcome {
    let mut visited = HashSet::new();
    let mut path: Vec<HexCoord> = Vec::new();
    let mut stack: Vec<RiverFrame> = Vec::new();

    let step = |loc: HexCoord, path: &[HexCoord], terrain: &TerrainGrid| -> Step {
        match heightmap.try_get(loc.x, loc.y) {
            None => Step::Reached,
            Some(h) => {
                if let Some(tail) = path.last() {
                    let tail_height = heightmap.try_get(tail.x, tail.y).unwrap_or(h);
                    if h > tail_height + uphill {
                        return Step::Rejected;
                    }
                }
                match terrain.get(loc) {
                    Some(symbol) if water.is_water(symbol) => Step::Reached,
                    _ => Step::Entered,
                }
            }
        }
    };

    let mut candidate = source;
    loop {
        match step(candidate, &path, terrain) {
            Step::Reached => {
                for &loc in &path {
                    terrain.set(loc, water.shallow);
                }
                return RiverOutcome::Committed(path);
            }
            Step::Rejected => {}
            Step::Entered => {
                let mut neighbors = candidate.neighbors();
                // перемешиваются только первые четыре направления
                neighbors[..4].shuffle(rng);
                visited.insert(candidate);
                path.push(candidate);
                stack.push(RiverFrame { neighbors, next: 0 });
            }
        }

        let next = loop {
            let Some(frame) = stack.last_mut() else {
                return RiverOutcome::Abandoned;
            };
            if frame.next == frame.neighbors.len() {
                stack.pop();
                path.pop();
                continue;
            }
            let loc = frame.neighbors[frame.next];
            frame.next += 1;
            if !visited.contains(&loc) {
                break loc;
            }
        };
        candidate = next;
    }
}

struct LakeFrame {
    loc: HexCoord,
    fall_off: i32,
    next: usize,
}

/// Разливает озеро из `start`. Возвращает множество затронутых клеток.
pub fn flood_lake<R: Rng + ?Sized>(
    rng: &mut R,
    terrain: &mut TerrainGrid,
    start: HexCoord,
    fall_off: i32,
    water: char,
) -> HashSet<HexCoord> {
    let mut touched = HashSet::new();
    if fall_off < 0 || !terrain.on_board(start) {
        return touched;
    }
    terrain.set(start, water);
    touched.insert(start);

    let mut stack = vec![LakeFrame {
        loc: start,
        fall_off,
        next: 0,
    }];
    while let Some(frame) = stack.last_mut() {
        if frame.next == LAKE_DIRECTIONS.len() {
            stack.pop();
            continue;
        }
        let (dx, dy) = LAKE_DIRECTIONS[frame.next];
        frame.next += 1;
        let (loc, fall_off) = (frame.loc, frame.fall_off);

        if rng.gen_range(0..100) < fall_off {
            let child = HexCoord::new(loc.x + dx, loc.y + dy);
            if terrain.on_board(child) {
                terrain.set(child, water);
                touched.insert(child);
                stack.push(LakeFrame {
                    loc: child,
                    fall_off: fall_off / 2,
                    next: 0,
                });
            }
        }
    }
    touched
}

/// Засевает до `max_lakes - 1` озёр; из каждого истока сначала прокладывается река
pub fn generate_lakes_and_rivers<R: Rng + ?Sized>(
    rng: &mut R,
    heightmap: &Heightmap,
    terrain: &mut TerrainGrid,
    params: &HydrologyParams,
) -> HydrologyStats {
    let mut stats = HydrologyStats::default();
    let nlakes = if params.max_lakes > 0 {
        rng.gen_range(0..params.max_lakes)
    } else {
        0
    };

    for _ in 0..nlakes {
        for _ in 0..LAKE_SOURCE_TRIES {
            let x = rng.gen_range(0..heightmap.width);
            let y = rng.gen_range(0..heightmap.height);
            if heightmap.get(x, y) <= params.min_lake_height {
                continue;
            }
            let source = HexCoord::new(x as i32, y as i32);

            match carve_river(
                rng,
                heightmap,
                terrain,
                source,
                params.river_uphill,
                params.water,
            ) {
                RiverOutcome::Committed(river) => {
                    tracing::trace!(
                        target: "hexgen::hydrology",
                        x, y, length = river.len(),
                        "river committed"
                    );
                    stats.rivers.push(river);
                }
                RiverOutcome::Abandoned => {
                    tracing::debug!(target: "hexgen::hydrology", x, y, "river abandoned");
                    stats.abandoned_sources.push(source);
                }
            }

            let lake = flood_lake(
                rng,
                terrain,
                source,
                params.lake_fall_off,
                params.water.shallow,
            );
            stats.lakes += 1;
            stats.lake_cells += lake.len();
            break;
        }
    }

    tracing::debug!(
        target: "hexgen::hydrology",
        lakes = stats.lakes,
        rivers = stats.rivers.len(),
        abandoned = stats.abandoned_sources.len(),
        "hydrology done"
    );
    stats
}
