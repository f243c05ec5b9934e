//! Назначение местности по картам высот
//!
//! Два прохода по одной сетке:
//! 1. высотные пояса — первое правило, чей порог достигнут, задаёт символ;
//! 2. уточнение равнин — клетки, оставшиеся равниной, перебирают правила
//!    по температуре и высоте.

use crate::config::{FlatlandRule, HeightRule};
use crate::heightmap::Heightmap;
use crate::terrain::TerrainGrid;

impl HeightRule {
    pub fn matches(&self, height: i32) -> bool {
        height >= self.height
    }
}

fn within(value: i32, min: Option<i32>, max: Option<i32>) -> bool {
    min.is_none_or(|lo| value >= lo) && max.is_none_or(|hi| value <= hi)
}

impl FlatlandRule {
    pub fn matches(&self, temperature: i32, height: i32) -> bool {
        within(temperature, self.min_temperature, self.max_temperature)
            && within(height, self.min_height, self.max_height)
    }
}

/// Первое сработавшее правило для клетки
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Правило сработало и задаёт символ
    Convert(char),
    /// Правило сработало, но символа не задаёт — клетка остаётся как есть
    Keep,
    /// Ни одно правило не подошло
    NoMatch,
}

/// Правила должны идти по убыванию порога (это гарантирует `GenerationConfig::validate`)
pub fn classify_height(rules: &[HeightRule], height: i32) -> Classification {
    rules
        .iter()
        .find(|rule| rule.matches(height))
        .map_or(Classification::NoMatch, |rule| {
            Classification::Convert(rule.terrain)
        })
}

pub fn classify_flatland(rules: &[FlatlandRule], temperature: i32, height: i32) -> Classification {
    rules
        .iter()
        .find(|rule| rule.matches(temperature, height))
        .map_or(Classification::NoMatch, |rule| {
            rule.terrain.map_or(Classification::Keep, Classification::Convert)
        })
}

/// Первый проход: высотные пояса. Возвращает число изменённых клеток.
pub fn apply_height_bands(
    terrain: &mut TerrainGrid,
    heightmap: &Heightmap,
    rules: &[HeightRule],
) -> usize {
    let mut converted = 0;
    for (cell, &elevation) in terrain.cells.iter_mut().zip(&heightmap.data) {
        if let Classification::Convert(symbol) = classify_height(rules, elevation) {
            *cell = symbol;
            converted += 1;
        }
    }
    converted
}

/// Второй проход: уточнение клеток, оставшихся символом `flatland`
pub fn refine_flatland(
    terrain: &mut TerrainGrid,
    heightmap: &Heightmap,
    temperature: &Heightmap,
    rules: &[FlatlandRule],
    flatland: char,
) -> usize {
    let mut converted = 0;
    for (i, cell) in terrain.cells.iter_mut().enumerate() {
        if *cell != flatland {
            continue;
        }
        if let Classification::Convert(symbol) =
            classify_flatland(rules, temperature.data[i], heightmap.data[i])
        {
            *cell = symbol;
            converted += 1;
        }
    }
    converted
}
