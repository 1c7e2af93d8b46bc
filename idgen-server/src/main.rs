use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use idgen_proto::config::Config;
use idgen_proto::engine::{MySqlStore, Registry};
use idgen_proto::logsink::LogSink;
use idgen_proto::schema::create_schema;

mod dispatch;
mod server;

const DEFAULT_CONFIG_PATH: &str = "Config.toml";

fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let init_schema = args.iter().any(|a| a == "--init-schema");
    let config_path = args
        .iter()
        .skip(1)
        .find(|a| !a.starts_with("--"))
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_PATH);

    let config = Config::from_file(config_path)?.with_env_overrides()?;

    if init_schema {
        create_schema(&config.database_url, &config.table_name)?;
        log::info!("schema bootstrap complete for table {}", config.table_name);
        return Ok(());
    }

    let store = Arc::new(MySqlStore::new(&config.database_url, &config.table_name)?);
    let log = LogSink::new(|message| log::debug!("{message}"));
    let registry = Registry::new(store, config.skip, log);
    registry.enable_keys(&config.enabled_keys)?;

    log::info!("listening on {}", config.listen_addr);
    server::serve(config.listen_addr, config.idle_timeout, Arc::new(registry))?;

    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = run() {
        eprintln!("fatal: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
