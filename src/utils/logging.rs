//! Logging Module
//!
//! Structured logging via the `tracing` crate, plus an epoch-level training
//! logger for long runs.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Whether to include target (module path)
    pub include_target: bool,
    /// Whether to use ANSI colors
    pub ansi_colors: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            include_target: false,
            ansi_colors: true,
        }
    }
}

impl LogConfig {
    /// Verbose config for debugging
    pub fn verbose() -> Self {
        Self {
            level: Level::DEBUG,
            include_target: true,
            ansi_colors: true,
        }
    }

    /// Errors only
    pub fn quiet() -> Self {
        Self {
            level: Level::ERROR,
            include_target: false,
            ansi_colors: false,
        }
    }
}

/// Initialize global logging with the given configuration
pub fn init_logging(config: &LogConfig) -> Result<(), String> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.level)
        .with_ansi(config.ansi_colors)
        .with_target(config.include_target)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("failed to initialize logging: {e}"))
}

/// Epoch-level progress logger for a training run
pub struct TrainingLogger {
    epoch: usize,
    total_epochs: usize,
    run_start: std::time::Instant,
}

impl TrainingLogger {
    pub fn new(total_epochs: usize) -> Self {
        Self {
            epoch: 0,
            total_epochs,
            run_start: std::time::Instant::now(),
        }
    }

    /// Log the start of an epoch
    pub fn start_epoch(&mut self, epoch: usize) {
        self.epoch = epoch;
        tracing::info!("Epoch {}/{} started", epoch + 1, self.total_epochs);
    }

    /// Log the end of an epoch with its metrics
    pub fn end_epoch(&self, record: &crate::utils::metrics::EpochRecord) {
        tracing::info!(
            "Epoch {}/{} done in {:.1}s | train loss {:.4} acc {:.2}% | test loss {:.4} acc {:.2}%",
            self.epoch + 1,
            self.total_epochs,
            record.duration_secs,
            record.train_loss,
            record.train_accuracy * 100.0,
            record.test_loss,
            record.test_accuracy * 100.0,
        );
    }

    /// Log completion of the whole run
    pub fn log_complete(&self, best_accuracy: Option<f64>) {
        let elapsed = self.run_start.elapsed().as_secs_f64();
        match best_accuracy {
            Some(best) => tracing::info!(
                "Training complete: {} epochs in {:.1}s | best test accuracy {:.2}%",
                self.total_epochs,
                elapsed,
                best * 100.0
            ),
            None => tracing::info!(
                "Training complete: {} epochs in {:.1}s",
                self.total_epochs,
                elapsed
            ),
        }
    }
}
