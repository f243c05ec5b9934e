//! Сборка карты целиком
//!
//! Генерация идёт на холсте втрое больше запрошенного по обеим осям, чтобы
//! реки и дороги могли приходить из-за края. На выход попадает только
//! центральная девятая часть холста.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::castles::{CastlePlacement, place_castles};
use crate::classify::{apply_height_bands, refine_flatland};
use crate::config::{DegradedPolicy, GenerationConfig};
use crate::error::{ConfigError, GenerationError};
use crate::heightmap::{Heightmap, IslandShape, generate_heightmap};
use crate::hex::HexCoord;
use crate::hydrology::{HydrologyParams, WaterSymbols, generate_lakes_and_rivers};
use crate::report::{GenerationReport, Outcome};
use crate::roads::{HexGraph, RoadParams, build_roads, link_castles};
use crate::terrain::TerrainGrid;
use crate::villages::place_villages;

/// Во сколько раз холст больше итоговой карты по каждой оси
pub const OVERSAMPLE: u32 = 3;
/// Сколько раз внешний цикл повторяет генерацию после ошибки
pub const MAX_ATTEMPTS: usize = 10;

#[derive(Debug, Clone)]
pub struct GeneratedMap {
    /// Строки символов местности, разделённые `\n`
    pub map: String,
    pub width: u32,
    pub height: u32,
    pub report: GenerationReport,
    /// Карта высот всего холста из удавшейся попытки
    pub heightmap: Heightmap,
}

/// Генерирует карту с генератором случайных чисел, засеянным `config.seed`
pub fn generate_map(config: &GenerationConfig) -> Result<GeneratedMap, GenerationError> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    generate_map_with_rng(config, &mut rng)
}

/// Проверяет конфигурацию и запускает генерацию, повторяя её до [`MAX_ATTEMPTS`] раз.
///
/// Ошибки конфигурации не повторяются. Повторы продолжают тот же поток
/// случайных чисел, промежуточные результаты не сохраняются.
pub fn generate_map_with_rng<R: Rng + ?Sized>(
    config: &GenerationConfig,
    rng: &mut R,
) -> Result<GeneratedMap, GenerationError> {
    let mut config = config.clone();
    config.validate()?;

    let mut last = None;
    for attempt in 1..=MAX_ATTEMPTS {
        match generate_attempt(&config, rng) {
            Ok(mut generated) => {
                generated.report.attempts = attempt;
                tracing::info!(
                    target: "hexgen::generator",
                    width = generated.width,
                    height = generated.height,
                    attempt,
                    exact = generated.report.is_exact(),
                    "map generated"
                );
                return Ok(generated);
            }
            Err(err) if err.is_retryable() => {
                tracing::warn!(target: "hexgen::generator", attempt, error = %err, "generation attempt failed");
                last = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(GenerationError::RetriesExhausted {
        attempts: MAX_ATTEMPTS,
        last: Box::new(last.unwrap_or(GenerationError::Degraded {
            stage: "generator",
            reason: "no attempts were made".into(),
        })),
    })
}

/// Карта высот холста (первый этап конвейера, с учётом режима острова)
pub fn canvas_heightmap<R: Rng + ?Sized>(config: &GenerationConfig, rng: &mut R) -> Heightmap {
    let width = config.effective_width() * OVERSAMPLE;
    let height = config.map_height * OVERSAMPLE;
    let island = IslandShape::from_scale(
        rng,
        config.island_size,
        config.island_off_center,
        width,
        height,
    );
    let iterations = if IslandShape::is_true_island(config.island_size) {
        config.iterations / 10
    } else {
        config.iterations
    };
    generate_heightmap(rng, width, height, iterations, config.hill_size, island)
}

/// Применяет политику к приближённому результату этапа
fn handle_degraded(
    policy: DegradedPolicy,
    stage: &'static str,
    outcome: &Outcome,
) -> Result<(), GenerationError> {
    let Outcome::Degraded { reason } = outcome else {
        return Ok(());
    };
    match policy {
        DegradedPolicy::Ignore => Ok(()),
        DegradedPolicy::Warn => {
            tracing::warn!(target: "hexgen::generator", stage, %reason, "stage degraded");
            Ok(())
        }
        DegradedPolicy::Fail => Err(GenerationError::Degraded {
            stage,
            reason: reason.clone(),
        }),
    }
}

/// Одна попытка полного конвейера. Конфигурация должна быть проверена заранее.
pub fn generate_attempt<R: Rng + ?Sized>(
    config: &GenerationConfig,
    rng: &mut R,
) -> Result<GeneratedMap, GenerationError> {
    let castle_rule = config
        .castle
        .as_ref()
        .ok_or(GenerationError::Config(ConfigError::MissingCastle))?;

    let out_width = config.effective_width();
    let out_height = config.map_height;
    let width = out_width * OVERSAMPLE;
    let height = out_height * OVERSAMPLE;

    // острова выглядят лучше с меньшим числом холмов и озёр
    let max_lakes = if IslandShape::is_true_island(config.island_size) {
        config.max_lakes / 9
    } else {
        config.max_lakes
    };

    let mut report = GenerationReport {
        seed: config.seed,
        ..GenerationReport::default()
    };

    // === 1. Карта высот ===
    let heightmap = canvas_heightmap(config, rng);

    // === 2. Местность: высотные пояса и уточнение равнин ===
    let mut terrain = TerrainGrid::new(width, height, config.default_flatland);
    apply_height_bands(&mut terrain, &heightmap, &config.height);
    let temperature = generate_heightmap(
        rng,
        width,
        height,
        config.temperature_iterations,
        config.temperature_size,
        None,
    );
    refine_flatland(
        &mut terrain,
        &heightmap,
        &temperature,
        &config.flatland,
        config.default_flatland,
    );

    // === 3. Озёра и реки ===
    let hydrology = generate_lakes_and_rivers(
        rng,
        &heightmap,
        &mut terrain,
        &HydrologyParams {
            max_lakes,
            min_lake_height: config.min_lake_height,
            river_uphill: config.river_frequency,
            lake_fall_off: config.lake_size,
            water: WaterSymbols {
                shallow: config.water,
                deep: config.deep_water,
            },
        },
    );
    report.lakes = hydrology.lakes;
    report.lake_cells = hydrology.lake_cells;
    report.rivers_committed = hydrology.rivers.len();
    report.rivers_abandoned = hydrology.abandoned_sources.len();
    if !hydrology.abandoned_sources.is_empty() {
        let outcome = Outcome::Degraded {
            reason: format!(
                "{} of {} rivers never reached water",
                hydrology.abandoned_sources.len(),
                hydrology.lakes
            ),
        };
        handle_degraded(config.on_degraded, "rivers", &outcome)?;
    }

    // === 4. Дороги ===
    let road_params = RoadParams {
        roads: config.roads,
        windiness: config.road_windiness,
        max_cost: config.max_road_cost,
    };
    let graph = (config.roads > 0 || config.link_castles).then(|| HexGraph::new(width, height));
    if let Some(graph) = &graph {
        let roads = build_roads(rng, &mut terrain, graph, &config.road_cost, &road_params);
        report.roads_built = roads.built;
        report.roads_rejected = roads.rejected;
        report.road_cells = roads.converted_cells;
    }

    // === 5. Деревни ===
    report.villages = place_villages(rng, &mut terrain, &config.village, config.villages);

    // === 6. Замки ===
    let CastlePlacement {
        centers,
        outcome,
        attempts,
    } = place_castles(rng, &mut terrain, castle_rule, config.players)?;
    handle_degraded(config.on_degraded, "castles", &outcome)?;
    report.castle_attempts = attempts;
    report.castles = Some(outcome);

    if let Some(graph) = graph.as_ref().filter(|_| config.link_castles) {
        let mut protected: Vec<char> = (0..centers.len())
            .map(crate::castles::player_marker)
            .collect();
        protected.push(castle_rule.terrain);
        let links = link_castles(
            rng,
            &mut terrain,
            graph,
            &config.road_cost,
            &road_params,
            &centers,
            &protected,
        );
        report.castle_links = links.built;
        report.road_cells += links.converted_cells;
    }

    report.castle_centers = centers
        .iter()
        .map(|c| HexCoord::new(c.x - out_width as i32, c.y - out_height as i32))
        .collect();

    // === 7. Центральная девятая часть ===
    let map = terrain.crop_to_string(out_width, out_height, out_width, out_height);
    Ok(GeneratedMap {
        map,
        width: out_width,
        height: out_height,
        report,
        heightmap,
    })
}
