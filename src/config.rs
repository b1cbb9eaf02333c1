use crate::Result;
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const CONFIG_PATHS: [&str; 2] = ["./vdkdemux.toml", "./config.toml"];

/// Tunables shared by the demuxers and parsers.
///
/// A `Config` is an ordinary value: build one with [`Config::default`] or
/// [`Config::load`] and hand it to [`crate::format::Registry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Upper bound on frames a parser keeps queued before the caller drains them.
    pub packet_cache_size: usize,
    /// Number of leading bytes handed to format probes.
    pub probe_size: usize,
    /// Bytes requested from the source each time a parser reports `NeedData`.
    pub read_chunk_size: usize,
    /// Maximum nesting depth accepted by the box reader.
    pub max_box_depth: usize,
    /// Capacity step used when growing sample lists and seek indexes.
    pub index_reserve_chunk: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            packet_cache_size: 16,
            probe_size: 4096,
            read_chunk_size: 4096,
            max_box_depth: 32,
            index_reserve_chunk: 256,
        }
    }
}

impl Config {
    /// Loads defaults, then the first readable config file, then
    /// `VDKDEMUX_*` environment variables.
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        for path in &CONFIG_PATHS {
            if let Ok(mut file) = File::open(path) {
                let mut content = String::new();
                if file.read_to_string(&mut content).is_ok() {
                    config.apply_file(&content)?;
                    break;
                }
            }
        }

        for key in Self::keys() {
            let var = format!("VDKDEMUX_{}", key.to_ascii_uppercase());
            if let Ok(value) = env::var(&var) {
                config.set(key, &value)?;
            }
        }

        Ok(config)
    }

    /// Applies `key = value` lines; comments and unknown keys are ignored.
    pub fn apply_file(&mut self, content: &str) -> Result<()> {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let value = value.trim().trim_matches('"').trim_matches('\'');
                self.set(key.trim(), value)?;
            }
        }
        Ok(())
    }

    fn keys() -> [&'static str; 5] {
        [
            "packet_cache_size",
            "probe_size",
            "read_chunk_size",
            "max_box_depth",
            "index_reserve_chunk",
        ]
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "packet_cache_size" => self.packet_cache_size = value.parse::<usize>()?.max(1),
            "probe_size" => self.probe_size = value.parse::<usize>()?.max(16),
            "read_chunk_size" => self.read_chunk_size = value.parse::<usize>()?.max(1),
            "max_box_depth" => self.max_box_depth = value.parse()?,
            "index_reserve_chunk" => self.index_reserve_chunk = value.parse::<usize>()?.max(1),
            _ => log::debug!("ignoring unknown config key {}", key),
        }
        Ok(())
    }
}

/// Creates a default config template file if it doesn't exist
pub fn create_default_config_template<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    if !path.as_ref().exists() {
        let template = r#"# VDKDEMUX Configuration
# Values shown are the built-in defaults.

packet_cache_size = 16
probe_size = 4096
read_chunk_size = 4096
max_box_depth = 32
index_reserve_chunk = 256
"#;
        std::fs::write(path, template)?;
    }
    Ok(())
}
