use clap::Parser;
use hexgen::GenerationConfig;
use hexgen::generator::generate_map;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Генератор гексагональных карт для пошаговых сражений
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Путь к конфигурационному файлу в формате TOML
    #[arg(short, long)]
    config: PathBuf,

    /// Куда сохранить карту (по умолчанию: вывод в stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Переопределить сид из конфигурации
    #[arg(short, long)]
    seed: Option<u64>,

    /// Сохранить карту высот холста в PNG (для отладки)
    #[arg(long)]
    heightmap_png: Option<PathBuf>,

    /// Сохранить отчёт о генерации в JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    tracing::info!(config = %cli.config.display(), "loading configuration");
    let mut params = GenerationConfig::from_toml_file(&cli.config)?;
    if let Some(seed) = cli.seed {
        params.seed = seed;
    }

    tracing::info!(
        width = params.map_width,
        height = params.map_height,
        seed = params.seed,
        "generating map"
    );
    let generated = generate_map(&params)?;

    match &cli.output {
        Some(path) => {
            fs::write(path, format!("{}\n", generated.map))?;
            tracing::info!(path = %path.display(), "map saved");
        }
        None => println!("{}", generated.map),
    }

    if let Some(path) = &cli.report {
        fs::write(path, serde_json::to_string_pretty(&generated.report)?)?;
        tracing::info!(path = %path.display(), "report saved");
    }

    if let Some(path) = &cli.heightmap_png {
        generated.heightmap.save_as_png(&path.to_string_lossy())?;
        tracing::info!(path = %path.display(), "heightmap saved");
    }

    Ok(())
}
