//! Player Performance AI CLI
//!
//! Manage performance records and predict player suitability. Every change
//! to the records retrains the model.

use clap::{Args, Parser, Subcommand};
use player_ai::{Config, PlayerStats, RecordId, Result};

#[derive(Parser)]
#[command(name = "player-ai")]
#[command(about = "Player suitability prediction from performance records", long_about = None)]
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
    /// Add a performance record (retrains the model)
    Add(StatsArgs),
    /// Replace an existing record (retrains the model)
    Update {
        id: i64,
        #[command(flatten)]
        stats: StatsArgs,
    },
    /// Delete a record (retrains the model)
    Delete { id: i64 },
    /// List all records
    List {
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Predict whether a player is suitable
    Predict(PredictArgs),
    /// Retrain the model on all records
    Train,
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Data management commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show model information
    Info,
}

#[derive(Subcommand)]
enum DataCommands {
    /// Show database status
    Status,
}

#[derive(Args)]
struct StatsArgs {
    #[arg(long)]
    average: f64,
    #[arg(long)]
    strike_rate: f64,
    #[arg(long)]
    bowling_average: f64,
    #[arg(long)]
    economy_rate: f64,
    #[arg(long)]
    fielding_stats: i32,
    /// 1 if the player is suitable, 0 otherwise
    #[arg(long)]
    label: i32,
}

impl From<StatsArgs> for PlayerStats {
    fn from(args: StatsArgs) -> Self {
        PlayerStats {
            average: args.average,
            strike_rate: args.strike_rate,
            bowling_average: args.bowling_average,
            economy_rate: args.economy_rate,
            fielding_stats: args.fielding_stats,
            label: args.label,
        }
    }
}

#[derive(Args)]
struct PredictArgs {
    /// JSON object keyed by feature name, e.g. '{"average": 50.5, ...}'
    #[arg(long, conflicts_with_all = ["average", "strike_rate", "bowling_average", "economy_rate", "fielding_stats"])]
    json: Option<String>,
    #[arg(long)]
    average: Option<f32>,
    #[arg(long)]
    strike_rate: Option<f32>,
    #[arg(long)]
    bowling_average: Option<f32>,
    #[arg(long)]
    economy_rate: Option<f32>,
    #[arg(long)]
    fielding_stats: Option<f32>,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use table, json, or csv.", s)),
        }
    }
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
        Commands::Add(stats) => commands::add(&config, stats.into()),
        Commands::Update { id, stats } => commands::update(&config, RecordId(id), stats.into()),
        Commands::Delete { id } => commands::delete(&config, RecordId(id)),
        Commands::List { format } => commands::list(&config, format),
        Commands::Predict(args) => commands::predict(&config, args),
        Commands::Train => commands::train(&config),
        Commands::Model { action } => match action {
            ModelCommands::Info => commands::model_info(&config),
        },
        Commands::Data { action } => match action {
            DataCommands::Status => commands::data_status(&config),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use player_ai::data::{Database, PerformanceRepository, PerformanceSource};
    use player_ai::model::{LoadOutcome, ModelStore};
    use player_ai::predict::ModelHandle;
    use player_ai::service::PerformanceService;
    use player_ai::training::RetrainOutcome;
    use player_ai::{DefaultBackend, PerformanceRecord, PlayerAiError};
    use std::collections::HashMap;

    fn open_service(config: &Config) -> Result<PerformanceService<Database, DefaultBackend>> {
        let db = Database::open(&config.data.database_path)?;
        let store = ModelStore::new(&config.data.model_path);
        let (classifier, outcome) = store.load_or_initialize::<DefaultBackend>(
            Default::default(),
            config.model.clone(),
            config.training.clone(),
        );
        if let LoadOutcome::Reinitialized { reason, save } = &outcome {
            log::debug!("Model reinitialized ({}), save: {:?}", reason, save);
        }
        Ok(PerformanceService::new(db, ModelHandle::new(classifier), store))
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        std::fs::create_dir_all("model")?;
        println!("Created data/ and model/ directories");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'player-ai add ...' to store performance records");
        println!("  3. Run 'player-ai predict ...' to check a player");

        Ok(())
    }

    pub fn add(config: &Config, stats: PlayerStats) -> Result<()> {
        let service = open_service(config)?;
        let record = service.add(stats)?;
        println!("Added record {}", record.id.0);
        print_records(&[record], &OutputFormat::Table)
    }

    pub fn update(config: &Config, id: RecordId, stats: PlayerStats) -> Result<()> {
        let service = open_service(config)?;
        let record = service
            .update(id, stats)?
            .ok_or(PlayerAiError::RecordNotFound(id))?;
        println!("Updated record {}", record.id.0);
        print_records(&[record], &OutputFormat::Table)
    }

    pub fn delete(config: &Config, id: RecordId) -> Result<()> {
        let service = open_service(config)?;
        if !service.delete(id)? {
            return Err(PlayerAiError::RecordNotFound(id));
        }
        println!("Deleted record {}", id.0);
        Ok(())
    }

    pub fn list(config: &Config, format: OutputFormat) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let records = db.find_all()?;
        print_records(&records, &format)
    }

    pub fn predict(config: &Config, args: PredictArgs) -> Result<()> {
        let values: HashMap<String, f32> = match args.json {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| PlayerAiError::Parse(format!("Invalid feature map: {}", e)))?,
            None => [
                ("average", args.average),
                ("strikeRate", args.strike_rate),
                ("bowlingAverage", args.bowling_average),
                ("economyRate", args.economy_rate),
                ("fieldingStats", args.fielding_stats),
            ]
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name.to_string(), v)))
            .collect(),
        };

        let service = open_service(config)?;
        let suitable = service.predict(&values)?;
        let features = player_ai::features::FeatureVector::from_named(&values)?;
        let probability = service.model().probability(&features);

        println!(
            "{} (p = {:.3})",
            if suitable { "Suitable" } else { "Not suitable" },
            probability
        );
        Ok(())
    }

    pub fn train(config: &Config) -> Result<()> {
        let service = open_service(config)?;
        match service.train()? {
            RetrainOutcome::Trained {
                examples,
                report,
                save,
            } => {
                println!("Trained on {} records", examples);
                if let Some(last) = report.last() {
                    println!("  Final: {}", last);
                }
                if let Some(improvement) = report.improvement() {
                    println!("  Loss improvement: {:.4}", improvement);
                }
                if !save.is_saved() {
                    println!("  Warning: model could not be saved ({:?})", save);
                }
            }
            RetrainOutcome::Skipped => println!("No records, nothing to train"),
        }
        Ok(())
    }

    pub fn model_info(config: &Config) -> Result<()> {
        let store = ModelStore::new(&config.data.model_path);

        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Path:       {}", store.path().display());

        if !store.exists() {
            println!("  Status:     no model yet (created on first add or train)");
            return Ok(());
        }

        let classifier = match store.load::<DefaultBackend>(
            Default::default(),
            config.model.clone(),
            config.training.clone(),
        ) {
            Ok(Ok(classifier)) => classifier,
            Ok(Err(reason)) => {
                println!("  Status:     will be reinitialized ({})", reason);
                return Ok(());
            }
            Err(e) => {
                println!("  Status:     unreadable ({})", e);
                return Ok(());
            }
        };

        println!("  Status:     loaded");
        println!(
            "  Layers:     {} → {:?} → 1",
            player_ai::features::FeatureVector::DIM,
            classifier.model_config().hidden_dims
        );
        println!("  Parameters: {}", classifier.num_params());
        println!("  Features:   {}", player_ai::features::FEATURE_ORDER);
        println!(
            "  Training:   {} epochs, lr {}, seed {}",
            classifier.training_config().epochs,
            classifier.training_config().learning_rate,
            classifier.training_config().seed
        );

        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let stats = db.get_stats()?;

        println!("Database Status");
        println!("───────────────────────────────");
        println!("  Path:      {}", config.data.database_path);
        println!("  Records:   {}", stats.record_count);
        println!("  Suitable:  {}", stats.suitable_count);

        Ok(())
    }

    fn print_records(records: &[PerformanceRecord], format: &OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(records)
                    .map_err(|e| PlayerAiError::Parse(e.to_string()))?;
                println!("{}", json);
            }
            OutputFormat::Csv => {
                println!("id,average,strikeRate,bowlingAverage,economyRate,fieldingStats,label");
                for r in records {
                    let s = &r.stats;
                    println!(
                        "{},{},{},{},{},{},{}",
                        r.id.0,
                        s.average,
                        s.strike_rate,
                        s.bowling_average,
                        s.economy_rate,
                        s.fielding_stats,
                        s.label
                    );
                }
            }
            OutputFormat::Table => {
                println!(
                    "{:>5}  {:>8}  {:>8}  {:>8}  {:>8}  {:>8}  {:>8}",
                    "ID", "Avg", "SR", "BowlAvg", "Econ", "Field", "Suitable"
                );
                println!("{}", "─".repeat(67));
                for r in records {
                    let s = &r.stats;
                    println!(
                        "{:>5}  {:>8.2}  {:>8.2}  {:>8.2}  {:>8.2}  {:>8}  {:>8}",
                        r.id.0,
                        s.average,
                        s.strike_rate,
                        s.bowling_average,
                        s.economy_rate,
                        s.fielding_stats,
                        if r.is_suitable() { "yes" } else { "no" }
                    );
                }
            }
        }
        Ok(())
    }
}
