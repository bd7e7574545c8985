//! Trainspotter CLI
//!
//! Command-line entry point for training and running the board spot
//! classifiers: datasets of labeled crops in, persisted models and
//! per-crop color predictions out.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use trainspotter::backend::{backend_name, default_device, DefaultBackend, TrainingBackend};
use trainspotter::utils::logging::{init_logging, LogConfig};
use trainspotter::{
    run_training, DatasetConfig, EntityKind, Predictor, SpotDataset, TrainConfig,
};

/// Board spot color classification
///
/// Trains small CNN classifiers on labeled crops of board regions and
/// classifies new crops into piece colors.
#[derive(Parser, Debug)]
#[command(name = "trainspotter")]
#[command(version)]
#[command(about = "Board piece color classification with Burn", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train a classifier on a directory of labeled crops
    Train {
        /// Path to the dataset root (one subfolder per capture session)
        #[arg(short, long)]
        data_dir: String,

        /// Entity type to train for (station or train)
        #[arg(short, long)]
        entity: EntityKind,

        /// Number of training epochs
        #[arg(long, default_value_t = trainspotter::training::DEFAULT_EPOCHS)]
        epochs: usize,

        /// Batch size
        #[arg(short, long, default_value_t = trainspotter::training::DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Learning rate
        #[arg(short, long, default_value_t = trainspotter::training::DEFAULT_LEARNING_RATE)]
        learning_rate: f64,

        /// Fraction of samples assigned to the train split (0.0-1.0 exclusive)
        #[arg(long, default_value_t = trainspotter::training::DEFAULT_TRAIN_FRACTION)]
        train_fraction: f64,

        /// Random seed for split and shuffle reproducibility
        #[arg(long, default_value_t = trainspotter::dataset::DEFAULT_SEED)]
        seed: u64,

        /// Drop unknown-labeled samples instead of training on them
        #[arg(long, default_value = "false")]
        exclude_unknown: bool,

        /// Output path for the model weights (extension appended by the recorder)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Classify one crop image with a trained model
    Predict {
        /// Path to trained model weights
        #[arg(short, long)]
        model: PathBuf,

        /// Entity type the model was trained for
        #[arg(short, long)]
        entity: EntityKind,

        /// Path to the input image
        #[arg(short, long)]
        image: PathBuf,
    },

    /// Show dataset statistics
    Stats {
        /// Path to the dataset root
        #[arg(short, long)]
        data_dir: String,

        /// Entity type (controls resize target and augmentation)
        #[arg(short, long)]
        entity: EntityKind,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    let _ = init_logging(&log_config);

    match cli.command {
        Commands::Train {
            data_dir,
            entity,
            epochs,
            batch_size,
            learning_rate,
            train_fraction,
            seed,
            exclude_unknown,
            output,
        } => {
            let train_config = TrainConfig {
                epochs,
                batch_size,
                learning_rate,
                train_fraction,
                seed,
            };
            let dataset_config = DatasetConfig {
                include_unknown: !exclude_unknown,
            };
            cmd_train(&data_dir, entity, &train_config, &dataset_config, &output)?;
        }

        Commands::Predict {
            model,
            entity,
            image,
        } => {
            cmd_predict(&model, entity, &image)?;
        }

        Commands::Stats { data_dir, entity } => {
            cmd_stats(&data_dir, entity)?;
        }
    }

    Ok(())
}

fn cmd_train(
    data_dir: &str,
    entity: EntityKind,
    train_config: &TrainConfig,
    dataset_config: &DatasetConfig,
    output: &Path,
) -> Result<()> {
    println!("{}", "Training Configuration:".cyan().bold());
    println!("  Data:     {}", data_dir);
    println!("  Entity:   {}", entity);
    println!("  Epochs:   {}", train_config.epochs);
    println!("  Batch:    {}", train_config.batch_size);
    println!("  LR:       {}", train_config.learning_rate);
    println!("  Split:    {:.0}% train", train_config.train_fraction * 100.0);
    println!("  Seed:     {}", train_config.seed);
    println!("  Backend:  {}", backend_name());
    println!();

    let curve = run_training::<TrainingBackend>(
        data_dir,
        entity,
        train_config,
        dataset_config,
        output,
    )?;

    println!();
    println!("{}", curve);

    if let Some(best) = curve.best_test_accuracy() {
        println!(
            "{} best test accuracy {:.2}%",
            "Done:".green().bold(),
            best * 100.0
        );
    }
    println!("Model saved to {}", output.display());

    Ok(())
}

fn cmd_predict(model: &Path, entity: EntityKind, image_path: &Path) -> Result<()> {
    info!("Running inference on {}", image_path.display());

    let device = default_device();
    let predictor = Predictor::<DefaultBackend>::from_file(model, entity, device)?;

    let image = image::open(image_path)?;
    let prediction = predictor.predict(&image)?;

    println!("{}", "Prediction:".cyan().bold());
    println!(
        "  Color:      {}",
        prediction.color.to_string().green().bold()
    );
    println!("  Confidence: {:.2}%", prediction.confidence * 100.0);
    println!();
    println!("{}", "Class probabilities:".yellow());
    for (color, prob) in trainspotter::PieceColor::ALL
        .iter()
        .zip(&prediction.probabilities)
    {
        println!("  {:<8} {:.4}", color.to_string(), prob);
    }

    Ok(())
}

fn cmd_stats(data_dir: &str, entity: EntityKind) -> Result<()> {
    if !Path::new(data_dir).exists() {
        println!(
            "{} Dataset directory not found: {}",
            "Error:".red(),
            data_dir
        );
        return Ok(());
    }

    let dataset = SpotDataset::from_dir(data_dir, entity, &DatasetConfig::default())?;
    let stats = dataset.stats();

    println!("{}", "Dataset Statistics:".cyan().bold());
    println!("{}", stats);

    Ok(())
}
