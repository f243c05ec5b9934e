//! Дорожная сеть
//!
//! Дороги соединяют случайные точки на границе видимой части карты.
//! Маршрут ищется A* по графу гексагональной смежности, стоимость шага
//! зависит от местности и умножается на случайную «извилистость», поэтому
//! дороги петляют, а не идут по кратчайшей линии.

use std::collections::HashMap;

use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rand::Rng;

use crate::config::RoadCostRule;
use crate::hex::HexCoord;
use crate::terrain::TerrainGrid;

/// Стоимость местности без правила `road_cost` (фактически непроходима)
pub const IMPASSABLE_COST: f64 = 100_000.0;
/// Концы дороги с такой или большей стоимостью отбрасываются
pub const PROHIBITIVE_COST: f64 = 1000.0;

#[derive(Debug, Clone, Copy)]
pub struct RoadParams {
    pub roads: usize,
    pub windiness: u32,
    pub max_cost: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoadStats {
    pub built: usize,
    pub rejected: usize,
    pub converted_cells: usize,
}

/// Стоимость входа в клетку для поиска дорог.
///
/// Базовая стоимость кэшируется по символу местности после первого запроса,
/// множитель извилистости бросается заново при каждом вызове.
pub struct RoadCostCalculator<'a> {
    rules: HashMap<char, &'a RoadCostRule>,
    windiness: u32,
    cache: HashMap<char, f64>,
}

impl<'a> RoadCostCalculator<'a> {
    pub fn new(rules: &'a [RoadCostRule], windiness: u32) -> Self {
        Self {
            rules: rules.iter().map(|r| (r.terrain, r)).collect(),
            windiness,
            cache: HashMap::new(),
        }
    }

    /// Переопределяет базовую стоимость символа (например, чтобы пройти через замок)
    pub fn treat_as(&mut self, terrain: char, cost: f64) {
        self.cache.insert(terrain, cost);
    }

    pub fn rule(&self, terrain: char) -> Option<&'a RoadCostRule> {
        self.rules.get(&terrain).copied()
    }

    /// Наименьшая возможная стоимость шага; множитель оценки для A*
    pub fn min_step_cost(&self) -> f64 {
        self.rules
            .values()
            .map(|r| r.cost)
            .chain(self.cache.values().copied())
            .fold(IMPASSABLE_COST, f64::min)
            .max(0.0)
    }

    fn base_cost(&mut self, terrain: char) -> f64 {
        if let Some(&cost) = self.cache.get(&terrain) {
            return cost;
        }
        let cost = self.rules.get(&terrain).map_or(IMPASSABLE_COST, |r| r.cost);
        self.cache.insert(terrain, cost);
        cost
    }

    pub fn cost<R: Rng + ?Sized>(&mut self, terrain: &TerrainGrid, loc: HexCoord, rng: &mut R) -> f64 {
        let Some(symbol) = terrain.get(loc) else {
            return IMPASSABLE_COST;
        };
        let windiness = if self.windiness > 1 {
            f64::from(rng.gen_range(1..=self.windiness))
        } else {
            1.0
        };
        self.base_cost(symbol) * windiness
    }
}

/// Граф смежности гексов холста; узел `i` соответствует клетке `(i % w, i / w)`
pub struct HexGraph {
    graph: DiGraph<HexCoord, ()>,
    width: u32,
    height: u32,
}

impl HexGraph {
    pub fn new(width: u32, height: u32) -> Self {
        let cells = (width * height) as usize;
        let mut graph = DiGraph::with_capacity(cells, cells * 6);
        for y in 0..height {
            for x in 0..width {
                graph.add_node(HexCoord::new(x as i32, y as i32));
            }
        }
        let mut this = Self {
            graph,
            width,
            height,
        };
        for y in 0..height {
            for x in 0..width {
                let loc = HexCoord::new(x as i32, y as i32);
                let from = NodeIndex::new((y * width + x) as usize);
                for neighbor in loc.neighbors() {
                    if let Some(to) = this.node(neighbor) {
                        this.graph.add_edge(from, to, ());
                    }
                }
            }
        }
        this
    }

    fn node(&self, loc: HexCoord) -> Option<NodeIndex> {
        if loc.x < 0 || loc.y < 0 || loc.x >= self.width as i32 || loc.y >= self.height as i32 {
            return None;
        }
        Some(NodeIndex::new(loc.y as usize * self.width as usize + loc.x as usize))
    }

    /// Ищет маршрут A*; возвращает суммарную стоимость и клетки от `src` до `dst`
    pub fn find_route<R: Rng + ?Sized>(
        &self,
        terrain: &TerrainGrid,
        calc: &mut RoadCostCalculator<'_>,
        rng: &mut R,
        src: HexCoord,
        dst: HexCoord,
    ) -> Option<(f64, Vec<HexCoord>)> {
        let start = self.node(src)?;
        let goal = self.node(dst)?;
        let step = calc.min_step_cost();
        let graph = &self.graph;

        let (cost, nodes) = astar(
            graph,
            start,
            |n| n == goal,
            |edge| calc.cost(terrain, graph[edge.target()], rng),
            |n| f64::from(graph[n].distance(dst)) * step,
        )?;
        Some((cost, nodes.into_iter().map(|n| graph[n]).collect()))
    }
}

/// Точка на случайной стороне прямоугольника `width × height`.
///
/// Сторона: 0 — верх, 1 — низ, 2 — лево, 3 — право.
pub fn random_point_at_side<R: Rng + ?Sized>(rng: &mut R, width: u32, height: u32) -> (HexCoord, u8) {
    let side = rng.gen_range(0..4u8);
    if side < 2 {
        let x = rng.gen_range(0..width) as i32;
        let y = if side == 0 { 0 } else { height as i32 - 1 };
        (HexCoord::new(x, y), side)
    } else {
        let y = rng.gen_range(0..height) as i32;
        let x = if side == 2 { 0 } else { width as i32 - 1 };
        (HexCoord::new(x, y), side)
    }
}

/// Превращает клетки маршрута в дорогу по правилам `road_cost`.
///
/// Для правил с мостами направление берётся из соседних шагов, мост ставится
/// только на прямом участке; на поворотах клетка не меняется. Символы из
/// `protected` не трогаются. Возвращает число изменённых клеток.
pub fn apply_road(
    terrain: &mut TerrainGrid,
    route: &[HexCoord],
    calc: &RoadCostCalculator<'_>,
    protected: &[char],
) -> usize {
    let mut converted = 0;
    for (i, &step) in route.iter().enumerate() {
        let Some(current) = terrain.get(step) else {
            continue;
        };
        if protected.contains(&current) {
            continue;
        }
        let Some(rule) = calc.rule(current) else {
            continue;
        };

        if rule.convert_to_bridge.is_some() {
            if i == 0 || i + 1 == route.len() {
                continue;
            }
            let bridge = step
                .axis_between(route[i - 1], route[i + 1])
                .and_then(|axis| rule.bridge_for_axis(axis.index()));
            if let Some(bridge) = bridge {
                terrain.set(step, bridge);
                converted += 1;
            }
            continue;
        }

        if let Some(road) = rule.convert_to {
            terrain.set(step, road);
            converted += 1;
        }
    }
    converted
}

/// Прокладывает `params.roads` попыток дорог между границами видимой части карты
pub fn build_roads<R: Rng + ?Sized>(
    rng: &mut R,
    terrain: &mut TerrainGrid,
    graph: &HexGraph,
    rules: &[RoadCostRule],
    params: &RoadParams,
) -> RoadStats {
    let mut stats = RoadStats::default();
    let mut calc = RoadCostCalculator::new(rules, params.windiness);
    let (width, height) = (terrain.width, terrain.height);
    let offset_x = (width / 3) as i32 - 1;
    let offset_y = (height / 3) as i32 - 1;

    for _ in 0..params.roads {
        let (mut src, src_side) = random_point_at_side(rng, width / 3 + 2, height / 3 + 2);
        let (mut dst, dst_side) = random_point_at_side(rng, width / 3 + 2, height / 3 + 2);
        src = HexCoord::new(src.x + offset_x, src.y + offset_y);
        dst = HexCoord::new(dst.x + offset_x, dst.y + offset_y);

        if src_side == dst_side {
            stats.rejected += 1;
            continue;
        }
        if calc.cost(terrain, src, rng) >= PROHIBITIVE_COST
            || calc.cost(terrain, dst, rng) >= PROHIBITIVE_COST
        {
            stats.rejected += 1;
            continue;
        }

        match graph.find_route(terrain, &mut calc, rng, src, dst) {
            Some((cost, route)) if cost <= params.max_cost => {
                stats.converted_cells += apply_road(terrain, &route, &calc, &[]);
                stats.built += 1;
                tracing::trace!(
                    target: "hexgen::roads",
                    cost,
                    length = route.len(),
                    "road built"
                );
            }
            _ => stats.rejected += 1,
        }
    }

    tracing::debug!(
        target: "hexgen::roads",
        built = stats.built,
        rejected = stats.rejected,
        converted = stats.converted_cells,
        "roads done"
    );
    stats
}

/// Соединяет дорогами каждую пару замков, не затрагивая клетки замков
pub fn link_castles<R: Rng + ?Sized>(
    rng: &mut R,
    terrain: &mut TerrainGrid,
    graph: &HexGraph,
    rules: &[RoadCostRule],
    params: &RoadParams,
    centers: &[HexCoord],
    protected: &[char],
) -> RoadStats {
    let mut stats = RoadStats::default();
    let mut calc = RoadCostCalculator::new(rules, params.windiness);
    let step = calc.min_step_cost().max(1.0);
    for &symbol in protected {
        calc.treat_as(symbol, step);
    }

    for (i, &a) in centers.iter().enumerate() {
        for &b in &centers[i + 1..] {
            match graph.find_route(terrain, &mut calc, rng, a, b) {
                Some((cost, route)) if cost <= params.max_cost => {
                    stats.converted_cells += apply_road(terrain, &route, &calc, protected);
                    stats.built += 1;
                }
                _ => stats.rejected += 1,
            }
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn rules() -> Vec<RoadCostRule> {
        vec![
            RoadCostRule {
                terrain: 'g',
                cost: 10.0,
                convert_to: Some('r'),
                convert_to_bridge: None,
            },
            RoadCostRule {
                terrain: 'r',
                cost: 2.0,
                convert_to: None,
                convert_to_bridge: None,
            },
            RoadCostRule {
                terrain: 'c',
                cost: 40.0,
                convert_to: None,
                convert_to_bridge: Some(vec!["|".into(), "/".into(), "\\".into()]),
            },
        ]
    }

    #[test]
    fn unconfigured_terrain_is_impassable_and_cached() {
        let rules = rules();
        let mut calc = RoadCostCalculator::new(&rules, 1);
        let mut grid = TerrainGrid::new(3, 3, 'g');
        grid.set(HexCoord::new(1, 1), 'M');
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(calc.cost(&grid, HexCoord::new(0, 0), &mut rng), 10.0);
        assert_eq!(calc.cost(&grid, HexCoord::new(1, 1), &mut rng), IMPASSABLE_COST);
        assert_eq!(calc.cost(&grid, HexCoord::new(-1, 0), &mut rng), IMPASSABLE_COST);
        assert_eq!(calc.cache.get(&'M'), Some(&IMPASSABLE_COST));
    }

    #[test]
    fn windiness_scales_cost_within_bounds() {
        let rules = rules();
        let mut calc = RoadCostCalculator::new(&rules, 4);
        let grid = TerrainGrid::new(2, 2, 'g');
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let costs: Vec<f64> = (0..200)
            .map(|_| calc.cost(&grid, HexCoord::new(0, 0), &mut rng))
            .collect();
        assert!(costs.iter().all(|&c| (10.0..=40.0).contains(&c)));
        assert!(costs.iter().any(|&c| c > 10.0));
    }

    #[test]
    fn route_is_a_simple_adjacent_path() {
        let rules = rules();
        let mut calc = RoadCostCalculator::new(&rules, 3);
        let grid = TerrainGrid::new(20, 20, 'g');
        let graph = HexGraph::new(20, 20);
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let (src, dst) = (HexCoord::new(1, 2), HexCoord::new(17, 15));

        let (cost, route) = graph
            .find_route(&grid, &mut calc, &mut rng, src, dst)
            .expect("open grassland is routable");
        assert_eq!(route.first(), Some(&src));
        assert_eq!(route.last(), Some(&dst));
        let unique: HashSet<_> = route.iter().collect();
        assert_eq!(unique.len(), route.len());
        for pair in route.windows(2) {
            assert!(pair[0].is_adjacent(pair[1]));
        }
        let steps = (route.len() - 1) as f64;
        // каждый шаг стоит не меньше базовой стоимости травы
        assert!(cost >= steps * 10.0);
        assert!(route.len() as u32 > src.distance(dst));
    }

    #[test]
    fn route_avoids_impassable_wall_with_gap() {
        let rules = rules();
        let mut calc = RoadCostCalculator::new(&rules, 1);
        let mut grid = TerrainGrid::new(10, 10, 'g');
        for y in 0..9 {
            grid.set(HexCoord::new(5, y), 'M');
        }
        let graph = HexGraph::new(10, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (cost, route) = graph
            .find_route(&grid, &mut calc, &mut rng, HexCoord::new(1, 1), HexCoord::new(8, 1))
            .unwrap();
        assert!(cost < IMPASSABLE_COST);
        assert!(route.contains(&HexCoord::new(5, 9)));
    }

    #[test]
    fn bridge_only_on_straight_crossing() {
        let rules = rules();
        let calc = RoadCostCalculator::new(&rules, 1);
        let mut grid = TerrainGrid::new(5, 5, 'g');
        grid.set(HexCoord::new(2, 2), 'c');
        let straight = [HexCoord::new(2, 1), HexCoord::new(2, 2), HexCoord::new(2, 3)];
        apply_road(&mut grid, &straight, &calc, &[]);
        assert_eq!(grid.get(HexCoord::new(2, 2)), Some('|'));
        assert_eq!(grid.get(HexCoord::new(2, 1)), Some('r'));

        let mut grid = TerrainGrid::new(5, 5, 'g');
        grid.set(HexCoord::new(2, 2), 'c');
        let center = HexCoord::new(2, 2);
        let adj = center.neighbors();
        let turn = [adj[0], center, adj[2]];
        apply_road(&mut grid, &turn, &calc, &[]);
        assert_eq!(grid.get(center), Some('c'));
    }

    #[test]
    fn bridge_at_route_end_is_skipped() {
        let rules = rules();
        let calc = RoadCostCalculator::new(&rules, 1);
        let mut grid = TerrainGrid::new(5, 5, 'c');
        let route = [HexCoord::new(2, 1), HexCoord::new(2, 2)];
        assert_eq!(apply_road(&mut grid, &route, &calc, &[]), 0);
    }

    #[test]
    fn protected_cells_are_untouched() {
        let rules = rules();
        let calc = RoadCostCalculator::new(&rules, 1);
        let mut grid = TerrainGrid::new(4, 1, 'g');
        let route = [HexCoord::new(0, 0), HexCoord::new(1, 0), HexCoord::new(2, 0)];
        assert_eq!(apply_road(&mut grid, &route, &calc, &['g']), 0);
    }

    #[test]
    fn side_points_lie_on_the_border() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        for _ in 0..100 {
            let (p, side) = random_point_at_side(&mut rng, 7, 5);
            match side {
                0 => assert_eq!(p.y, 0),
                1 => assert_eq!(p.y, 4),
                2 => assert_eq!(p.x, 0),
                _ => assert_eq!(p.x, 6),
            }
        }
    }

    #[test]
    fn roads_on_open_terrain_get_built() {
        let rules = rules();
        let mut grid = TerrainGrid::new(30, 30, 'g');
        let graph = HexGraph::new(30, 30);
        let params = RoadParams {
            roads: 8,
            windiness: 2,
            max_cost: 10_000.0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(44);
        let stats = build_roads(&mut rng, &mut grid, &graph, &rules, &params);
        assert_eq!(stats.built + stats.rejected, 8);
        if stats.built > 0 {
            assert!(grid.count('r') > 0);
        }
    }

    #[test]
    fn impassable_map_builds_no_roads() {
        let rules = rules();
        let mut grid = TerrainGrid::new(30, 30, 'M');
        let graph = HexGraph::new(30, 30);
        let params = RoadParams {
            roads: 5,
            windiness: 1,
            max_cost: 10_000.0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let stats = build_roads(&mut rng, &mut grid, &graph, &rules, &params);
        assert_eq!(stats.built, 0);
        assert_eq!(stats.rejected, 5);
    }
}
