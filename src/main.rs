//! Gridiron CLI
//!
//! Imports game data, inspects point-in-time features, trains model versions
//! and manages which version is active.

use clap::{Parser, Subcommand};
use gridiron::{Config, Result};

#[derive(Parser)]
#[command(name = "gridiron")]
#[command(about = "Football game prediction: features, training data and model versions", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project with default config
    Init,
    /// Data management commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Build a training set, fit models and record a new version
    Train {
        /// First season to train on
        #[arg(long, default_value = "2020")]
        start_season: i32,
        /// Last season to train on (inclusive)
        #[arg(long, default_value = "2024")]
        end_season: i32,
        /// Version id (default: v<timestamp>)
        #[arg(long)]
        version: Option<String>,
        /// Activate the new version once recorded
        #[arg(long)]
        activate: bool,
        /// Override the number of recent games averaged per team
        #[arg(long)]
        window_size: Option<usize>,
    },
    /// Show a chronological train/test season split
    Split {
        /// Available seasons, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        seasons: Vec<i32>,
        /// Season held out for testing
        #[arg(long)]
        test_season: i32,
    },
    /// Feature inspection commands
    Features {
        #[command(subcommand)]
        action: FeatureCommands,
    },
    /// Model version commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
}

#[derive(Subcommand)]
enum DataCommands {
    /// Import teams, games and box scores from a JSON file
    Import {
        /// Path to the JSON file
        file: String,
    },
    /// Show database status
    Status,
}

#[derive(Subcommand)]
enum FeatureCommands {
    /// List feature names in vector order
    Names,
    /// Compute the feature vector for a game
    Game {
        /// Game id
        id: String,
    },
}

#[derive(Subcommand)]
enum ModelCommands {
    /// List recorded versions, newest first
    List,
    /// Make a version the active one
    Activate {
        version: String,
    },
    /// Show a version (the active one when omitted)
    Info {
        version: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Init => commands::init(&cli.config, &config),
        Commands::Data { action } => match action {
            DataCommands::Import { file } => commands::data_import(&config, &file),
            DataCommands::Status => commands::data_status(&config),
        },
        Commands::Train {
            start_season,
            end_season,
            version,
            activate,
            window_size,
        } => commands::train(&config, start_season, end_season, version, activate, window_size),
        Commands::Split {
            seasons,
            test_season,
        } => commands::split(&seasons, test_season),
        Commands::Features { action } => match action {
            FeatureCommands::Names => commands::feature_names(),
            FeatureCommands::Game { id } => commands::feature_game(&config, &id),
        },
        Commands::Model { action } => match action {
            ModelCommands::List => commands::model_list(&config),
            ModelCommands::Activate { version } => commands::model_activate(&config, &version),
            ModelCommands::Info { version } => commands::model_info(&config, version.as_deref()),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use gridiron::data::{import_file, train_test_split_by_season, Database};
    use gridiron::features::{self, FeatureExtractor};
    use gridiron::registry::{ModelRegistry, ModelVersion};
    use gridiron::training::{LinearTrainer, TrainingOrchestrator, TrainingRequest};
    use gridiron::{GameId, GridironError};

    pub fn init(config_path: &str, config: &Config) -> Result<()> {
        Config::default().save(config_path)?;
        println!("Created default config at {}", config_path);

        Database::open(&config.data.database_path)?;
        std::fs::create_dir_all(&config.data.model_dir)?;
        println!(
            "Created database {} and model directory {}/",
            config.data.database_path, config.data.model_dir
        );

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'gridiron data import <games.json>' to load games and box scores");
        println!("  3. Run 'gridiron train --activate' to train and activate a model version");

        Ok(())
    }

    pub fn data_import(config: &Config, file: &str) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let summary = import_file(&db, file)?;
        println!(
            "Imported {} teams, {} games, {} box scores from {}",
            summary.teams, summary.games, summary.team_stats, file
        );
        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let stats = db.get_stats()?;

        println!("Database Status");
        println!("───────────────────────────────");
        println!("  Path:       {}", config.data.database_path);
        println!("  Teams:      {}", stats.team_count);
        println!("  Games:      {} ({} completed)", stats.game_count, stats.completed_count);
        println!("  Box scores: {}", stats.stat_count);
        if let (Some(first), Some(last)) = (stats.first_season, stats.last_season) {
            println!("  Seasons:    {} to {}", first, last);
        }

        let registry = ModelRegistry::new(&db);
        match registry.active()? {
            Some(active) => println!("  Active:     {}", active.version),
            None => println!("  Active:     (none)"),
        }

        Ok(())
    }

    pub fn train(
        config: &Config,
        start_season: i32,
        end_season: i32,
        version: Option<String>,
        activate: bool,
        window_size: Option<usize>,
    ) -> Result<()> {
        use burn::backend::{Autodiff, NdArray};

        type MyBackend = NdArray<f32>;
        type MyAutodiffBackend = Autodiff<MyBackend>;

        if end_season < start_season {
            return Err(GridironError::Config(format!(
                "end season {} is before start season {}",
                end_season, start_season
            )));
        }

        let mut features = config.features.clone();
        if let Some(size) = window_size {
            features.window_size = size;
        }

        let db = Database::open(&config.data.database_path)?;
        let trainer = LinearTrainer::<MyAutodiffBackend>::new(Default::default(), config.model.clone());
        let orchestrator = TrainingOrchestrator::new(
            &db,
            trainer,
            features,
            config.training.clone(),
            &config.data.model_dir,
        );

        let request = TrainingRequest {
            version,
            activate,
            ..TrainingRequest::season_range(start_season, end_season)
        };
        let report = orchestrator.run(&request)?;

        println!("\nTraining Data");
        println!("───────────────────────────────");
        println!("{}", report.summary);

        println!("\nModel {}", report.version);
        println!("───────────────────────────────");
        println!("  Winner accuracy: {:.2}%", report.metrics.winner_accuracy * 100.0);
        println!("  Spread MAE:      {:.2}", report.metrics.spread_mae);
        println!("  Total MAE:       {:.2}", report.metrics.total_mae);
        println!("  Winner model:    {}", report.artifacts.winner_model_path.display());
        println!("  Spread model:    {}", report.artifacts.spread_model_path.display());
        println!("  Total model:     {}", report.artifacts.total_model_path.display());

        if !report.top_features.is_empty() {
            println!("\nTop features");
            for (i, (name, score)) in report.top_features.iter().enumerate() {
                println!("  {:>2}. {:<32} {:.4}", i + 1, name, score);
            }
        }

        if report.activated {
            println!("\nVersion {} is now active", report.version);
        } else {
            println!(
                "\nActivate with: gridiron model activate {}",
                report.version
            );
        }

        Ok(())
    }

    pub fn split(seasons: &[i32], test_season: i32) -> Result<()> {
        let (train, test) = train_test_split_by_season(seasons, test_season);
        println!("Train seasons: {:?}", train);
        println!("Test seasons:  {:?}", test);
        Ok(())
    }

    pub fn feature_names() -> Result<()> {
        for (i, name) in features::feature_names().iter().enumerate() {
            println!("{:>2}  {}", i, name);
        }
        Ok(())
    }

    pub fn feature_game(config: &Config, id: &str) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let game = db.get_game(&GameId::from(id))?;

        let extractor = FeatureExtractor::new(&db, config.features.clone());
        let vector = extractor.build_game_features(&game)?.to_array();

        println!(
            "{} | season {} week {} | {} vs {} on {}",
            game.id, game.season, game.week, game.home_team, game.away_team, game.date
        );
        for (name, value) in features::feature_names().iter().zip(vector.iter()) {
            println!("  {:<32} {:>10.3}", name, value);
        }
        Ok(())
    }

    fn print_version(version: &ModelVersion) {
        println!("Version:     {}", version.version);
        println!("Active:      {}", if version.is_active { "yes" } else { "no" });
        println!("Created:     {}", version.created_at.format("%Y-%m-%d %H:%M:%S"));
        println!("Seasons:     {:?}", version.training_seasons);
        println!("Samples:     {}", version.training_samples);
        println!("Metrics:     {}", version.metrics);
        println!("Winner:      {}", version.artifacts.winner_model_path.display());
        println!("Spread:      {}", version.artifacts.spread_model_path.display());
        println!("Total:       {}", version.artifacts.total_model_path.display());
    }

    pub fn model_list(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let versions = ModelRegistry::new(&db).list()?;

        if versions.is_empty() {
            println!("No model versions recorded. Run 'gridiron train' first.");
            return Ok(());
        }
        for version in &versions {
            println!("{}", version);
        }
        Ok(())
    }

    pub fn model_activate(config: &Config, version: &str) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        ModelRegistry::new(&db).activate(version)?;
        println!("Version {} is now active", version);
        Ok(())
    }

    pub fn model_info(config: &Config, version: Option<&str>) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let registry = ModelRegistry::new(&db);

        let entry = match version {
            Some(v) => registry.get(v)?,
            None => match registry.active()? {
                Some(active) => active,
                None => {
                    println!("No active model version");
                    return Ok(());
                }
            },
        };
        print_version(&entry);
        Ok(())
    }
}
