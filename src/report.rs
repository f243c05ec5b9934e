//! Итоги генерации: точный или приближённый результат этапов и сводный отчёт

use serde::Serialize;

use crate::hex::HexCoord;

/// Результат этапа, который может завершиться «как получилось»
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    /// Все ограничения выполнены
    Exact,
    /// Этап исчерпал попытки и зафиксировал лучший доступный вариант
    Degraded { reason: String },
}

impl Outcome {
    #[must_use]
    pub fn is_exact(&self) -> bool {
        matches!(self, Outcome::Exact)
    }
}

/// Сводка по одной успешной генерации (сериализуется в JSON из CLI)
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    pub seed: u64,
    /// Сколько попыток понадобилось внешнему циклу
    pub attempts: usize,
    pub lakes: usize,
    pub lake_cells: usize,
    pub rivers_committed: usize,
    pub rivers_abandoned: usize,
    pub roads_built: usize,
    pub roads_rejected: usize,
    pub road_cells: usize,
    pub villages: usize,
    pub castle_attempts: usize,
    pub castles: Option<Outcome>,
    /// Центры замков в координатах итоговой карты
    pub castle_centers: Vec<HexCoord>,
    pub castle_links: usize,
}

impl GenerationReport {
    /// Все ли этапы уложились в свои ограничения
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.rivers_abandoned == 0 && self.castles.as_ref().is_none_or(Outcome::is_exact)
    }
}
