pub mod castles;
pub mod classify;
pub mod config;
pub mod error;
pub mod generator;
pub mod heightmap;
pub mod hex;
pub mod hydrology;
pub mod report;
pub mod roads;
pub mod terrain;
pub mod villages;

pub use config::{CastleFootprint, DegradedPolicy, GenerationConfig};
pub use error::{ConfigError, GenerationError};
pub use generator::{GeneratedMap, generate_map, generate_map_with_rng};
pub use heightmap::{Heightmap, generate_heightmap};
pub use hex::HexCoord;
pub use report::{GenerationReport, Outcome};
pub use terrain::TerrainGrid;
