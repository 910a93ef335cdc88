const PLUGIN_CONFIG: &str = "PLUGIN_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "./config.json";

pub fn get_config_path() -> String {
    std::env::var(PLUGIN_CONFIG).unwrap_or_else(|_| String::from(DEFAULT_CONFIG_PATH))
}

const PLUGIN_INTERVAL: &str = "PLUGIN_INTERVAL";

const DEFAULT_INTERVAL: u64 = 60;

pub fn get_interval() -> u64 {
    let interval_from_env = std::env::var(PLUGIN_INTERVAL);
    interval_from_env.map_or(DEFAULT_INTERVAL, |res| {
        res.parse().unwrap_or(DEFAULT_INTERVAL)
    })
}
