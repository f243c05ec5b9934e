//! Расстановка стартовых замков игроков
//!
//! Выборка с отклонением: предлагаем центры для всех игроков сразу, проверяем
//! местность под замками и попарные расстояния, при нарушении начинаем заново.
//! Если попытки кончились, фиксируется последнее предложение и результат
//! помечается как приближённый.

use std::ops::Range;

use rand::Rng;

use crate::config::{CastleFootprint, CastleRule};
use crate::error::GenerationError;
use crate::hex::HexCoord;
use crate::report::Outcome;
use crate::terrain::TerrainGrid;

pub const MAX_CASTLE_ATTEMPTS: usize = 50_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastlePlacement {
    pub centers: Vec<HexCoord>,
    pub outcome: Outcome,
    pub attempts: usize,
}

/// Клетки замка вокруг центра (без самого центра)
pub fn footprint(center: HexCoord, kind: CastleFootprint) -> Vec<HexCoord> {
    match kind {
        CastleFootprint::Square => center.square_ring().to_vec(),
        CastleFootprint::Hex => center.neighbors().to_vec(),
    }
}

/// Допустимые центры замков на холсте: видимая часть карты с отступом в одну
/// клетку, чтобы стены замка целиком оставались на итоговой карте.
pub fn castle_range(width: u32, height: u32) -> Option<(Range<i32>, Range<i32>)> {
    let (w, h) = ((width / 3) as i32, (height / 3) as i32);
    let xs = w + 1..w * 2 - 1;
    let ys = h + 1..h * 2 - 1;
    (!xs.is_empty() && !ys.is_empty()).then_some((xs, ys))
}

/// Символ «кипа» игрока: `'1'` для первого и т.д.
pub fn player_marker(player: usize) -> char {
    char::from_digit((player + 1) as u32, 10).unwrap_or('9')
}

enum Rejection {
    Terrain(HexCoord),
    Distance(HexCoord, HexCoord),
}

fn check(terrain: &TerrainGrid, centers: &[HexCoord], rule: &CastleRule) -> Result<(), Rejection> {
    for &center in centers {
        let cells = std::iter::once(center).chain(footprint(center, rule.footprint));
        for cell in cells {
            let valid = terrain
                .get(cell)
                .is_some_and(|t| rule.valid_terrain.contains(&t));
            if !valid {
                return Err(Rejection::Terrain(cell));
            }
        }
    }
    for (i, &a) in centers.iter().enumerate() {
        for &b in &centers[i + 1..] {
            if (a.distance(b) as usize) < rule.min_distance {
                return Err(Rejection::Distance(a, b));
            }
        }
    }
    Ok(())
}

/// Ставит замки на карту: сначала стены всех замков, затем центры с номерами игроков
pub fn stamp_castles(terrain: &mut TerrainGrid, centers: &[HexCoord], rule: &CastleRule) {
    for &center in centers {
        for cell in footprint(center, rule.footprint) {
            terrain.set(cell, rule.terrain);
        }
    }
    for (player, &center) in centers.iter().enumerate() {
        terrain.set(center, player_marker(player));
    }
}

pub fn place_castles<R: Rng + ?Sized>(
    rng: &mut R,
    terrain: &mut TerrainGrid,
    rule: &CastleRule,
    players: usize,
) -> Result<CastlePlacement, GenerationError> {
    if players == 0 {
        return Ok(CastlePlacement {
            centers: Vec::new(),
            outcome: Outcome::Exact,
            attempts: 0,
        });
    }
    let (xs, ys) = castle_range(terrain.width, terrain.height).ok_or(GenerationError::MapTooSmall {
        width: terrain.width / 3,
        height: terrain.height / 3,
    })?;

    let mut centers = Vec::with_capacity(players);
    let mut last_rejection = None;
    for attempt in 1..=MAX_CASTLE_ATTEMPTS {
        centers.clear();
        for _ in 0..players {
            centers.push(HexCoord::new(
                rng.gen_range(xs.clone()),
                rng.gen_range(ys.clone()),
            ));
        }

        match check(terrain, &centers, rule) {
            Ok(()) => {
                stamp_castles(terrain, &centers, rule);
                tracing::debug!(target: "hexgen::castles", attempt, players, "castles placed");
                return Ok(CastlePlacement {
                    centers,
                    outcome: Outcome::Exact,
                    attempts: attempt,
                });
            }
            Err(rejection) => last_rejection = Some(rejection),
        }
    }

    let reason = match last_rejection {
        Some(Rejection::Terrain(cell)) => format!(
            "no valid placement in {MAX_CASTLE_ATTEMPTS} attempts; last proposal had invalid terrain at ({}, {})",
            cell.x, cell.y
        ),
        Some(Rejection::Distance(a, b)) => format!(
            "no valid placement in {MAX_CASTLE_ATTEMPTS} attempts; last proposal had castles ({}, {}) and ({}, {}) closer than {}",
            a.x, a.y, b.x, b.y, rule.min_distance
        ),
        None => format!("no valid placement in {MAX_CASTLE_ATTEMPTS} attempts"),
    };
    stamp_castles(terrain, &centers, rule);
    Ok(CastlePlacement {
        centers,
        outcome: Outcome::Degraded { reason },
        attempts: MAX_CASTLE_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rule(min_distance: usize, footprint: CastleFootprint) -> CastleRule {
        CastleRule {
            valid_terrain: vec!['g', 'f'],
            min_distance,
            terrain: 'C',
            footprint,
        }
    }

    #[test]
    fn range_keeps_castles_inside_visible_area() {
        let (xs, ys) = castle_range(60, 45).unwrap();
        assert_eq!(xs, 21..39);
        assert_eq!(ys, 16..29);
        assert_eq!(castle_range(9, 9), Some((4..5, 4..5)));
        assert!(castle_range(6, 6).is_none());
    }

    #[test]
    fn successful_placement_honors_constraints() {
        let mut grid = TerrainGrid::new(60, 60, 'g');
        let before = grid.clone();
        let rule = rule(5, CastleFootprint::Square);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let placement = place_castles(&mut rng, &mut grid, &rule, 3).unwrap();

        assert_eq!(placement.outcome, Outcome::Exact);
        assert_eq!(placement.centers.len(), 3);
        for (i, a) in placement.centers.iter().enumerate() {
            for b in &placement.centers[i + 1..] {
                assert!(a.distance(*b) >= 5);
            }
            for cell in footprint(*a, rule.footprint) {
                assert!(rule.valid_terrain.contains(&before.get(cell).unwrap()));
                assert_eq!(grid.get(cell), Some('C'));
            }
            assert_eq!(grid.get(*a), Some(player_marker(i)));
        }
        assert_eq!(grid.count('C'), 24);
    }

    #[test]
    fn invalid_terrain_degrades_but_still_commits() {
        let mut grid = TerrainGrid::new(30, 30, 'M');
        let rule = rule(1, CastleFootprint::Square);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let placement = place_castles(&mut rng, &mut grid, &rule, 2).unwrap();

        assert!(matches!(placement.outcome, Outcome::Degraded { .. }));
        assert_eq!(placement.attempts, MAX_CASTLE_ATTEMPTS);
        assert_eq!(placement.centers.len(), 2);
        // центры могли совпасть, тогда второй номер перекрывает первый
        assert_eq!(grid.count('2'), 1);
        assert!(grid.count('1') <= 1);
    }

    #[test]
    fn markers_survive_overlapping_castles() {
        let mut grid = TerrainGrid::new(30, 30, 'g');
        let rule = rule(0, CastleFootprint::Square);
        let centers = [HexCoord::new(14, 14), HexCoord::new(15, 14)];
        stamp_castles(&mut grid, &centers, &rule);
        assert_eq!(grid.get(centers[0]), Some('1'));
        assert_eq!(grid.get(centers[1]), Some('2'));
    }

    #[test]
    fn hex_footprint_stamps_six_walls() {
        let mut grid = TerrainGrid::new(30, 30, 'g');
        let rule = rule(0, CastleFootprint::Hex);
        stamp_castles(&mut grid, &[HexCoord::new(14, 14)], &rule);
        assert_eq!(grid.count('C'), 6);
    }

    #[test]
    fn small_map_still_gets_castles() {
        let mut grid = TerrainGrid::new(18, 18, 'g');
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let placement =
            place_castles(&mut rng, &mut grid, &rule(2, CastleFootprint::Square), 2).unwrap();
        assert_eq!(placement.outcome, Outcome::Exact);
        for center in &placement.centers {
            assert!((7..11).contains(&center.x) && (7..11).contains(&center.y));
        }
        assert_eq!(grid.count('1'), 1);
        assert_eq!(grid.count('2'), 1);
    }

    #[test]
    fn wide_apart_castles_fit_on_small_flat_map() {
        let mut grid = TerrainGrid::new(30, 30, 'g');
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let placement =
            place_castles(&mut rng, &mut grid, &rule(6, CastleFootprint::Square), 2).unwrap();
        assert_eq!(placement.outcome, Outcome::Exact);
        assert!(placement.centers[0].distance(placement.centers[1]) >= 6);
    }

    #[test]
    fn tiny_map_is_rejected() {
        let mut grid = TerrainGrid::new(6, 6, 'g');
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = place_castles(&mut rng, &mut grid, &rule(1, CastleFootprint::Square), 2)
            .unwrap_err();
        assert!(matches!(err, GenerationError::MapTooSmall { width: 2, height: 2 }));
    }
}
