use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Text, validator::Validation};
use weather_etl_core::{Config, Pipeline, RunSchedule, WeatherRecord, run_scheduled};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-etl", version, about = "Fetch current weather and store it")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the pipeline once: fetch, transform, load.
    Run {
        /// Override the configured latitude.
        #[arg(long, allow_hyphen_values = true)]
        latitude: Option<String>,

        /// Override the configured longitude.
        #[arg(long, allow_hyphen_values = true)]
        longitude: Option<String>,

        /// Override the configured database file.
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Run the pipeline on the configured schedule until interrupted.
    Schedule {
        /// Override the configured cron expression, e.g. "@daily" or "30 6 * * *".
        #[arg(long)]
        cron: Option<String>,
    },

    /// Interactively write the configuration file.
    Configure,

    /// Print the effective configuration.
    Config,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };
        let mut config = Config::load_from(&config_path)?;

        match self.command {
            Command::Run {
                latitude,
                longitude,
                db,
            } => {
                if let Some(latitude) = latitude {
                    config.location.latitude = latitude;
                }
                if let Some(longitude) = longitude {
                    config.location.longitude = longitude;
                }
                if db.is_some() {
                    config.database.path = db;
                }
                config.validate()?;

                let pipeline = Pipeline::from_config(&config)?;
                let report = pipeline.run().await.context("Weather ETL run failed")?;

                print_record(&report.record);
                println!(
                    "Stored 1 row in {} ({} ms)",
                    config.database_path()?.display(),
                    report.elapsed.as_millis()
                );
            }
            Command::Schedule { cron } => {
                if let Some(cron) = cron {
                    config.schedule.cron = cron;
                }
                config.validate()?;

                let schedule = RunSchedule::parse(&config.schedule.cron)?;
                let pipeline = Pipeline::from_config(&config)?;

                let next = schedule.next_after(chrono::Utc::now())?;
                println!(
                    "Scheduling weather ETL for {} ('{}'), first run at {}. Press Ctrl-C to stop.",
                    config.location,
                    schedule.expr(),
                    next.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M %Z"),
                );

                let shutdown = async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        log::error!("Failed to listen for Ctrl-C: {e}");
                        std::future::pending::<()>().await;
                    }
                };
                let runs = run_scheduled(&pipeline, &schedule, shutdown).await?;
                println!("Stopped after {runs} run(s).");
            }
            Command::Configure => {
                let config = configure_interactive(config)?;
                config.save_to(&config_path)?;
                println!("Configuration saved to {}", config_path.display());
            }
            Command::Config => {
                println!("# {}", config_path.display());
                print!(
                    "{}",
                    toml::to_string_pretty(&config).context("Failed to render configuration")?
                );
                println!("# database file: {}", config.database_path()?.display());
            }
        }

        Ok(())
    }
}

fn configure_interactive(mut config: Config) -> anyhow::Result<Config> {
    config.api.base_url = Text::new("Weather API base URL:")
        .with_default(&config.api.base_url)
        .prompt()?;

    config.location.latitude = Text::new("Latitude (decimal degrees):")
        .with_default(&config.location.latitude)
        .with_validator(degrees_validator(90.0))
        .prompt()?;

    config.location.longitude = Text::new("Longitude (decimal degrees):")
        .with_default(&config.location.longitude)
        .with_validator(degrees_validator(180.0))
        .prompt()?;

    let db_default = config.database_path()?.display().to_string();
    let db = Text::new("Database file:")
        .with_default(&db_default)
        .prompt()?;
    config.database.path = Some(PathBuf::from(db));

    config.schedule.cron = Text::new("Schedule (cron or @daily):")
        .with_default(&config.schedule.cron)
        .with_validator(|input: &str| {
            Ok(match RunSchedule::parse(input) {
                Ok(_) => Validation::Valid,
                Err(e) => Validation::Invalid(e.to_string().into()),
            })
        })
        .prompt()?;

    config.validate()?;
    Ok(config)
}

fn degrees_validator(
    limit: f64,
) -> impl Fn(&str) -> Result<Validation, inquire::CustomUserError> + Clone {
    move |input: &str| {
        Ok(match input.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v.abs() <= limit => Validation::Valid,
            _ => Validation::Invalid(format!("Enter a number between -{limit} and {limit}").into()),
        })
    }
}

fn print_record(record: &WeatherRecord) {
    fn show<T: std::fmt::Display>(value: Option<T>) -> String {
        value.map_or_else(|| "-".to_string(), |v| v.to_string())
    }

    println!("Location:       ({}, {})", record.latitude, record.longitude);
    println!("Temperature:    {}", show(record.temperature.as_ref()));
    println!("Wind speed:     {}", show(record.windspeed.as_ref()));
    println!("Wind direction: {}", show(record.winddirection.as_ref()));
    println!("Weather code:   {}", show(record.weathercode.as_ref()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "weather-etl",
            "run",
            "--latitude",
            "-33.8688",
            "--longitude",
            "151.2093",
        ])
        .unwrap();

        match cli.command {
            Command::Run {
                latitude, longitude, ..
            } => {
                assert_eq!(latitude.as_deref(), Some("-33.8688"));
                assert_eq!(longitude.as_deref(), Some("151.2093"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli =
            Cli::try_parse_from(["weather-etl", "schedule", "--config", "/tmp/c.toml", "-v"])
                .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(cli.command, Command::Schedule { cron: None }));
    }

    #[test]
    fn degrees_validator_bounds() {
        let lat = degrees_validator(90.0);
        assert!(matches!(lat("51.5074").unwrap(), Validation::Valid));
        assert!(matches!(lat("-90").unwrap(), Validation::Valid));
        assert!(matches!(lat("90.1").unwrap(), Validation::Invalid(_)));
        assert!(matches!(lat("north").unwrap(), Validation::Invalid(_)));
    }
}
