//! Core application

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::data::{Datastore, DuckdbBackend, StoreSettings};
use crate::filter::Filter;

pub struct CoreApp {
    pub config: AppConfig,
    pub store: Arc<Datastore>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::init(&cli_config)?;
        let stdout = std::io::stdout();
        app.dispatch(command, &mut stdout.lock())
    }

    /// Load configuration and open the datastore with all configured classes
    pub fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let store = Self::open_store(&config)?;
        Ok(Self { config, store })
    }

    fn open_store(config: &AppConfig) -> Result<Arc<Datastore>> {
        let backend = match &config.database.path {
            Some(path) => DuckdbBackend::open(path)
                .with_context(|| format!("Failed to open database: {}", path.display()))?,
            None => DuckdbBackend::open_in_memory().context("Failed to open in-memory database")?,
        };
        let mut store = Datastore::new(backend).with_settings(StoreSettings {
            max_scan_rows: config.filter.max_scan_rows,
        });
        for class in &config.classes {
            store
                .register(class.clone())
                .with_context(|| format!("Failed to register class '{}'", class.name))?;
        }
        store.registry().check_references()?;
        tracing::debug!(store = ?store, "Datastore ready");
        Ok(Arc::new(store))
    }

    /// Execute one command, writing its output to `out`
    pub fn dispatch(&self, command: Commands, out: &mut impl Write) -> Result<()> {
        match command {
            Commands::Init => {
                self.store.create_tables()?;
                for class in self.store.registry().classes() {
                    writeln!(out, "{} -> {}", class.name, class.table)?;
                }
            }
            Commands::Query {
                filter,
                limit,
                start,
            } => {
                let mut filter = self.parse_filter(&filter)?;
                if let Some(limit) = limit
                    .or(filter.result_limit())
                    .or(self.config.filter.default_limit)
                {
                    filter.set_result_limit(limit);
                }
                if let Some(start) = start {
                    filter.set_result_start(start);
                }
                // Tables are created on demand so in-memory stores can be queried
                self.store.create_tables()?;
                let records = filter.execute()?;
                for record in &records {
                    writeln!(out, "{}", record.to_json())?;
                }
                if records.is_truncated() {
                    tracing::warn!(
                        returned = records.len(),
                        "Result truncated by the scan limit; raise --max-scan-rows for a complete result"
                    );
                }
            }
            Commands::Sql { filter } => {
                let filter = self.parse_filter(&filter)?;
                writeln!(out, "{}", filter.get_sql())?;
                if filter.filter_after_sql() {
                    writeln!(out, "-- rows are re-checked in memory after the query")?;
                }
            }
            Commands::Validate { filter } => {
                let mut filter = self.parse_filter(&filter)?;
                if !filter.is_valid() {
                    for problem in filter.get_errors() {
                        writeln!(out, "{}", problem)?;
                    }
                    anyhow::bail!("Filter has {} problem(s)", filter.get_errors().len());
                }
                writeln!(out, "Filter is valid")?;
            }
        }
        Ok(())
    }

    fn parse_filter(&self, json: &str) -> Result<Filter> {
        Filter::from_json(&self.store, json).context("Failed to decode filter")
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::record::Record;

    const CONFIG: &str = r#"{
        "classes": [
            {
                "name": "person",
                "table": "people",
                "fields": [
                    { "name": "name", "type": "text" },
                    { "name": "status", "type": "enumeration", "options": ["active", "inactive"] },
                    { "name": "nickname", "type": "text", "storage": "metadata" }
                ]
            }
        ]
    }"#;

    fn app(dir: &tempfile::TempDir) -> CoreApp {
        let path = dir.path().join("datarecord.json");
        fs::write(&path, CONFIG).unwrap();
        CoreApp::init(&CliConfig {
            config: Some(path),
            database: Some(dir.path().join("records.duckdb")),
            max_scan_rows: None,
        })
        .unwrap()
    }

    fn run(app: &CoreApp, command: Commands) -> Result<String> {
        let mut out = Vec::new();
        app.dispatch(command, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_init_and_query() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        assert_eq!(run(&app, Commands::Init).unwrap(), "person -> people\n");

        let class = app.store.class("person").unwrap();
        for (name, nickname) in [("Ann", "annie"), ("Bob", "bobby"), ("Cid", "annie")] {
            let mut record = Record::new(&class)
                .with("name", name)
                .with("status", "active")
                .with("nickname", nickname);
            app.store.save(&mut record).unwrap();
        }

        let output = run(
            &app,
            Commands::Query {
                filter: r#"{"base_class": "person",
                    "base_condition": {"type": "Match", "fieldname": "nickname", "value": "annie"}}"#
                    .to_string(),
                limit: Some(1),
                start: Some(1),
            },
        )
        .unwrap();
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["name"], "Cid");
    }

    #[test]
    fn test_sql_marks_manual_filtering() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        let output = run(
            &app,
            Commands::Sql {
                filter: r#"{"base_class": "person",
                    "base_condition": {"type": "Match", "fieldname": "nickname", "value": "x"}}"#
                    .to_string(),
            },
        )
        .unwrap();
        assert!(output.starts_with("SELECT id, name, status, metadata FROM people WHERE TRUE"));
        assert!(output.contains("re-checked in memory"));
    }

    #[test]
    fn test_validate_reports_problems() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        let filter = r#"{"base_class": "person",
            "base_condition": {"type": "Greater", "fieldname": "missing", "value": 1}}"#;

        let mut out = Vec::new();
        let err = app
            .dispatch(
                Commands::Validate {
                    filter: filter.to_string(),
                },
                &mut out,
            )
            .unwrap_err();
        assert!(err.to_string().contains("1 problem"));
        assert!(String::from_utf8(out).unwrap().contains("Unknown field 'missing'"));
    }

    #[test]
    fn test_unknown_discriminator_fails_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        let err = run(
            &app,
            Commands::Sql {
                filter: r#"{"base_class": "person",
                    "base_condition": {"type": "Near", "fieldname": "name"}}"#
                    .to_string(),
            },
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid filter definition"));
    }
}
