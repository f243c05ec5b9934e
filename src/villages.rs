use std::collections::HashMap;

use rand::Rng;

use crate::config::VillageRule;
use crate::hex::HexCoord;
use crate::terrain::TerrainGrid;

/// Превращает случайные клетки в деревни по правилам `village`.
///
/// Уникальность и расстояние между деревнями не гарантируются: клетка может
/// быть выбрана повторно. Возвращает число срабатываний правил.
pub fn place_villages<R: Rng + ?Sized>(
    rng: &mut R,
    terrain: &mut TerrainGrid,
    rules: &[VillageRule],
    count: usize,
) -> usize {
    let conversions: HashMap<char, char> = rules.iter().map(|r| (r.terrain, r.convert_to)).collect();
    let mut converted = 0;

    for _ in 0..count {
        let x = rng.gen_range(0..terrain.width) as i32;
        let y = rng.gen_range(0..terrain.height) as i32;
        let loc = HexCoord::new(x, y);
        let Some(current) = terrain.get(loc) else {
            continue;
        };
        if let Some(&village) = conversions.get(&current) {
            terrain.set(loc, village);
            converted += 1;
        }
    }

    tracing::debug!(target: "hexgen::villages", attempts = count, converted, "villages placed");
    converted
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn converts_only_configured_terrain() {
        let mut grid = TerrainGrid::new(8, 8, 'g');
        for x in 0..8 {
            grid.set(HexCoord::new(x, 0), 'M');
        }
        let rules = [VillageRule {
            terrain: 'g',
            convert_to: 'v',
        }];
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let converted = place_villages(&mut rng, &mut grid, &rules, 40);
        assert!(converted > 0);
        assert_eq!(grid.count('M'), 8);
        assert!(grid.count('v') <= converted);
    }

    #[test]
    fn no_rules_no_villages() {
        let mut grid = TerrainGrid::new(5, 5, 'g');
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(place_villages(&mut rng, &mut grid, &[], 30), 0);
        assert_eq!(grid.count('g'), 25);
    }

    #[test]
    fn samples_cover_non_square_maps() {
        // узкая высокая карта: y должен доходить до нижних строк
        let mut grid = TerrainGrid::new(3, 30, 'g');
        let rules = [VillageRule {
            terrain: 'g',
            convert_to: 'v',
        }];
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        place_villages(&mut rng, &mut grid, &rules, 200);
        let low_rows = (20..30).any(|y| (0..3).any(|x| grid.get(HexCoord::new(x, y)) == Some('v')));
        assert!(low_rows);
    }
}
