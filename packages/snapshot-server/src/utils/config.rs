use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;

pub static CONFIG: Lazy<Config> = Lazy::new(Config::new);

pub struct Config {
    pub data_dir: PathBuf,
    pub addr: String,
}

impl Config {
    fn new() -> Self {
        Self {
            data_dir: PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "database".to_string())),
            addr: env::var("SNAPSHOT_SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8800".to_string()),
        }
    }
}
