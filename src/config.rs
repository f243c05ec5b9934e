// src/config.rs
//! Конфигурация генератора гексагональных карт
//!
//! Этот модуль определяет все параметры, управляющие генерацией:
//! - Скалярные параметры (размеры карты, число итераций, озёр, деревень, дорог)
//! - Блоки правил: высотные пороги, уточнение равнин, стоимость дорог, деревни, замки
//! - Политику обработки деградированных результатов
//!
//! Все структуры поддерживают загрузку из TOML. Символы местности — одиночные символы (`'g'`, `'c'`, ...).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Правило высотного пояса: клетка с высотой `>= height` получает `terrain`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightRule {
    pub height: i32,
    pub terrain: char,
}

/// Правило уточнения равнин по температуре и высоте.
///
/// Отсутствующая граница не ограничивает. Границы включительные.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlatlandRule {
    #[serde(default)]
    pub min_temperature: Option<i32>,
    #[serde(default)]
    pub max_temperature: Option<i32>,
    #[serde(default)]
    pub min_height: Option<i32>,
    #[serde(default)]
    pub max_height: Option<i32>,
    /// `None` — правило только останавливает перебор, клетка остаётся равниной
    #[serde(default)]
    pub terrain: Option<char>,
}

/// Стоимость прокладки дороги по местности и во что её превращать
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadCostRule {
    pub terrain: char,
    pub cost: f64,
    #[serde(default)]
    pub convert_to: Option<char>,
    /// Мосты по осям: `[север–юг, юго-запад–северо-восток, юго-восток–северо-запад]`.
    /// Пустая строка — для этой оси моста нет.
    #[serde(default)]
    pub convert_to_bridge: Option<Vec<String>>,
}

impl RoadCostRule {
    /// Символ моста для оси (индекс 0..3), если он задан
    #[must_use]
    pub fn bridge_for_axis(&self, axis: usize) -> Option<char> {
        self.convert_to_bridge
            .as_ref()
            .and_then(|items| items.get(axis))
            .and_then(|s| s.chars().next())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VillageRule {
    pub terrain: char,
    pub convert_to: char,
}

/// Форма «подножия» замка: клетки вокруг центра, которые проверяются и застраиваются
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastleFootprint {
    /// Квадрат 3×3 по строкам/столбцам (совместимо с ранее сгенерированными картами)
    #[default]
    Square,
    /// Центр и шесть гексагональных соседей
    Hex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastleRule {
    pub valid_terrain: Vec<char>,
    pub min_distance: usize,
    #[serde(default = "default_castle_terrain")]
    pub terrain: char,
    #[serde(default)]
    pub footprint: CastleFootprint,
}

fn default_castle_terrain() -> char {
    'C'
}

/// Что делать, если этап выдал приближённый результат
/// (река не дошла до воды, замки не удовлетворили ограничениям)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegradedPolicy {
    /// Только записать в отчёт
    Ignore,
    /// Записать в отчёт и вывести предупреждение в лог
    #[default]
    Warn,
    /// Считать попытку неудачной (внешний цикл попробует снова)
    Fail,
}

/// Полная конфигурация генерации одной карты
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Сид генератора случайных чисел
    #[serde(default)]
    pub seed: u64,

    /// Ширина итоговой карты в гексах (нечётная округляется вверх до чётной)
    #[serde(default = "default_map_width")]
    pub map_width: u32,
    #[serde(default = "default_map_height")]
    pub map_height: u32,

    /// Число «холмов», накладываемых на карту высот
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Максимальный радиус холма (не меньше 1)
    #[serde(default = "default_hill_size")]
    pub hill_size: u32,

    #[serde(default = "default_max_lakes")]
    pub max_lakes: usize,
    #[serde(default = "default_villages")]
    pub villages: usize,
    #[serde(default = "default_players")]
    pub players: usize,

    /// Размер острова по шкале 0..=10 (0 — без острова, от 5 — настоящий остров)
    #[serde(default)]
    pub island_size: u32,
    /// Смещение центра острова от центра карты, в гексах
    #[serde(default)]
    pub island_off_center: u32,

    #[serde(default = "default_roads")]
    pub roads: usize,
    /// Множитель «извилистости» дорог (1 — кратчайший путь)
    #[serde(default = "default_road_windiness")]
    pub road_windiness: u32,
    /// Маршруты дороже этого значения отбрасываются
    #[serde(default = "default_max_road_cost")]
    pub max_road_cost: f64,
    /// Соединять ли замки дорогами
    #[serde(default)]
    pub link_castles: bool,

    /// Допустимый подъём реки между соседними клетками
    #[serde(default = "default_river_frequency")]
    pub river_frequency: i32,
    #[serde(default = "default_min_lake_height")]
    pub min_lake_height: i32,
    /// Начальная вероятность (в процентах) разлива озера в соседнюю клетку
    #[serde(default = "default_lake_size")]
    pub lake_size: i32,

    #[serde(default = "default_temperature_iterations")]
    pub temperature_iterations: usize,
    #[serde(default = "default_temperature_size")]
    pub temperature_size: u32,

    #[serde(default = "default_flatland")]
    pub default_flatland: char,
    /// Мелководье: этим символом заливаются реки и озёра
    #[serde(default = "default_water")]
    pub water: char,
    #[serde(default = "default_deep_water")]
    pub deep_water: char,

    #[serde(default)]
    pub on_degraded: DegradedPolicy,

    #[serde(default)]
    pub height: Vec<HeightRule>,
    #[serde(default)]
    pub flatland: Vec<FlatlandRule>,
    #[serde(default)]
    pub road_cost: Vec<RoadCostRule>,
    #[serde(default)]
    pub village: Vec<VillageRule>,
    #[serde(default)]
    pub castle: Option<CastleRule>,
}

fn default_map_width() -> u32 {
    40
}
fn default_map_height() -> u32 {
    40
}
fn default_iterations() -> usize {
    1000
}
fn default_hill_size() -> u32 {
    10
}
fn default_max_lakes() -> usize {
    20
}
fn default_villages() -> usize {
    25
}
fn default_players() -> usize {
    2
}
fn default_roads() -> usize {
    12
}
fn default_road_windiness() -> u32 {
    1
}
fn default_max_road_cost() -> f64 {
    10_000.0
}
fn default_river_frequency() -> i32 {
    100
}
fn default_min_lake_height() -> i32 {
    500
}
fn default_lake_size() -> i32 {
    150
}
fn default_temperature_iterations() -> usize {
    100
}
fn default_temperature_size() -> u32 {
    8
}
fn default_flatland() -> char {
    'g'
}
fn default_water() -> char {
    'c'
}
fn default_deep_water() -> char {
    's'
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            map_width: default_map_width(),
            map_height: default_map_height(),
            iterations: default_iterations(),
            hill_size: default_hill_size(),
            max_lakes: default_max_lakes(),
            villages: default_villages(),
            players: default_players(),
            island_size: 0,
            island_off_center: 0,
            roads: default_roads(),
            road_windiness: default_road_windiness(),
            max_road_cost: default_max_road_cost(),
            link_castles: false,
            river_frequency: default_river_frequency(),
            min_lake_height: default_min_lake_height(),
            lake_size: default_lake_size(),
            temperature_iterations: default_temperature_iterations(),
            temperature_size: default_temperature_size(),
            default_flatland: default_flatland(),
            water: default_water(),
            deep_water: default_deep_water(),
            on_degraded: DegradedPolicy::Warn,
            height: Vec::new(),
            flatland: Vec::new(),
            road_cost: Vec::new(),
            village: Vec::new(),
            castle: None,
        }
    }
}

impl GenerationConfig {
    /// Загружает параметры из TOML-файла
    ///
    /// # Пример
    /// ```toml
    /// seed = 42
    /// map_width = 30
    /// map_height = 30
    ///
    /// [[height]]
    /// height = 900
    /// terrain = "m"
    ///
    /// [castle]
    /// valid_terrain = ["g", "f"]
    /// min_distance = 12
    /// ```
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Чётная ширина итоговой карты
    #[must_use]
    pub fn effective_width(&self) -> u32 {
        self.map_width + self.map_width % 2
    }

    /// Проверяет конфигурацию и приводит порядок высотных правил к убывающему.
    ///
    /// Порядок правил — инвариант загрузки: классификатор берёт первое подходящее
    /// правило, поэтому более высокие пороги обязаны идти раньше.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.map_width == 0 || self.map_height == 0 {
            return Err(ConfigError::EmptyMap {
                width: self.map_width,
                height: self.map_height,
            });
        }
        if self.hill_size == 0 {
            return Err(ConfigError::ZeroSize { field: "hill_size" });
        }
        if self.temperature_size == 0 {
            return Err(ConfigError::ZeroSize {
                field: "temperature_size",
            });
        }
        if self.road_windiness == 0 {
            return Err(ConfigError::ZeroSize {
                field: "road_windiness",
            });
        }
        if self.players > 9 {
            return Err(ConfigError::TooManyPlayers(self.players));
        }
        if self.castle.is_none() {
            return Err(ConfigError::MissingCastle);
        }

        let mut seen = HashSet::new();
        for rule in &self.road_cost {
            if !seen.insert(rule.terrain) {
                return Err(ConfigError::DuplicateRule {
                    block: "road_cost",
                    terrain: rule.terrain,
                });
            }
            let bridges = rule.convert_to_bridge.as_ref().map_or(0, Vec::len);
            if bridges > 3 {
                return Err(ConfigError::BridgeArity {
                    terrain: rule.terrain,
                    count: bridges,
                });
            }
        }

        seen.clear();
        for rule in &self.village {
            if !seen.insert(rule.terrain) {
                return Err(ConfigError::DuplicateRule {
                    block: "village",
                    terrain: rule.terrain,
                });
            }
        }

        if !self.height.is_sorted_by(|a, b| a.height >= b.height) {
            tracing::debug!(
                target: "hexgen::config",
                rules = self.height.len(),
                "height rules reordered by descending threshold"
            );
            // стабильная сортировка: равные пороги сохраняют порядок объявления
            self.height.sort_by(|a, b| b.height.cmp(&a.height));
        }

        Ok(())
    }
}
