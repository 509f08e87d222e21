use std::{
    error::Error,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use crate::AccessRecord;
use cache_policy::OnUpdate;
use clap::Parser;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use serfig::collectors::{from_file, from_self};
use serfig::parsers::Toml;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[clap(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Path to the configuration file
    #[arg(long, value_name = "FILE")]
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// Path to the trace file
    #[arg(long, value_name = "FILE")]
    pub trace: PathBuf,

    /// Path to the output file
    #[arg(long, value_name = "FILE")]
    pub output: PathBuf,

    /// Cache policies to simulate (lru, tinylfu)
    #[arg(long, value_enum, use_value_delimiter = true, value_delimiter = ',')]
    pub policies: Vec<PolicyKind>,

    /// Largest cache size of the curve (e.g., 100KB, 2MB)
    #[arg(short, long, value_parser = parse_size)]
    #[serde(deserialize_with = "deserialize_cache_size")]
    pub cache_size: u64,

    /// Number of cache sizes sampled on the curve
    #[arg(long, default_value_t = default_points())]
    pub points: usize,

    /// Keys the admission filter is sized for (defaults to the capacity in objects)
    #[arg(long)]
    pub cardinality: Option<u32>,

    /// Whether an update refreshes recency
    #[arg(long, value_parser = parse_on_update, default_value = "promote")]
    pub on_update: OnUpdate,

    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,

    #[arg(long)]
    pub timestamp: Option<i32>,

    #[arg(long)]
    pub command: Option<i32>,

    #[arg(long)]
    pub key: Option<i32>,

    #[arg(long)]
    pub size: Option<i32>,

    #[arg(long)]
    pub ttl: Option<i32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_file: None,
            trace: PathBuf::new(),
            output: PathBuf::new(),
            policies: default_policies(),
            cache_size: 0,
            points: default_points(),
            cardinality: None,
            on_update: OnUpdate::default(),
            log_level: default_log_level(),
            timestamp: None,
            command: None,
            key: None,
            size: None,
            ttl: None,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let content = std::fs::read_to_string(path)?;
        let mut args: Config = toml::from_str(&content)?;
        args.config_file = Some(path.to_path_buf());
        Ok(args)
    }

    /// Merges the configuration file (if any) under the command line arguments.
    pub fn load(arg_conf: Self) -> Result<Self, Box<dyn Error>> {
        let mut builder: serfig::Builder<Self> = serfig::Builder::default();

        if let Some(config_file) = &arg_conf.config_file {
            let path = config_file
                .to_str()
                .ok_or_else(|| format!("non UTF-8 config path: {}", config_file.display()))?;
            builder = builder.collect(from_file(Toml, path));
        }

        builder = builder.collect(from_self(arg_conf));

        let mut config = builder.build().map_err(|e| e.to_string())?;
        if config.policies.is_empty() {
            config.policies = default_policies();
        }
        config.points = config.points.max(1);
        Ok(config)
    }
}

fn default_policies() -> Vec<PolicyKind> {
    vec![PolicyKind::Lru, PolicyKind::TinyLfu]
}

fn default_points() -> usize {
    20
}

fn default_log_level() -> String {
    "info".to_string()
}

fn deserialize_cache_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    // Files carry "64KB" style strings, merged command line values are already bytes.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Bytes(u64),
        Text(String),
    }

    match Size::deserialize(deserializer)? {
        Size::Bytes(bytes) => Ok(bytes),
        Size::Text(s) => parse_size(&s).map_err(serde::de::Error::custom),
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// LRU eviction, every miss admitted
    Lru,
    /// LRU eviction behind a TinyLFU admission filter
    #[value(name = "tinylfu")]
    TinyLfu,
}

impl PolicyKind {
    pub fn label(&self) -> &'static str {
        match self {
            PolicyKind::Lru => "LRU",
            PolicyKind::TinyLfu => "TinyLFU-LRU",
        }
    }
}

fn parse_on_update(s: &str) -> Result<OnUpdate, String> {
    match s.trim().to_lowercase().as_str() {
        "promote" => Ok(OnUpdate::Promote),
        "retain" => Ok(OnUpdate::Retain),
        other => Err(format!("unknown update mode `{other}` (expected promote or retain)")),
    }
}

fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim().to_uppercase();
    let (digits, unit) = if let Some(n) = s.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else {
        (s.as_str(), 1)
    };
    let n = digits.trim().parse::<u64>().map_err(|e| e.to_string())?;
    n.checked_mul(unit)
        .ok_or_else(|| format!("cache size `{s}` overflows u64"))
}

pub fn load_access_records(arg: &Config) -> Result<Vec<AccessRecord>, Box<dyn Error>> {
    let file = File::open(&arg.trace)?;
    let reader = BufReader::new(file);
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);

    if is_default_parsing(arg) {
        parse_default(&mut rdr)
    } else {
        parse_custom(arg, &mut rdr)
    }
}

fn is_default_parsing(arg: &Config) -> bool {
    arg.timestamp.is_none()
        && arg.command.is_none()
        && arg.key.is_none()
        && arg.size.is_none()
        && arg.ttl.is_none()
}

fn parse_default(
    rdr: &mut csv::Reader<BufReader<File>>,
) -> Result<Vec<AccessRecord>, Box<dyn Error>> {
    debug!("Parsing access records with default fields");
    let mut access_records = Vec::new();
    for result in rdr.deserialize() {
        let record: AccessRecord = result?;
        access_records.push(record);
    }
    Ok(access_records)
}

fn parse_custom(
    arg: &Config,
    rdr: &mut csv::Reader<BufReader<File>>,
) -> Result<Vec<AccessRecord>, Box<dyn Error>> {
    debug!("Parsing access records with custom column mapping");
    let mut access_records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let timestamp = parse_field(&record, arg.timestamp, 0)?;
        let command = parse_field(&record, arg.command, 0)? as u8;
        let key = parse_field(&record, arg.key, 0)?;
        let size = parse_field(&record, arg.size, 1)? as u32;
        let ttl = parse_field(&record, arg.ttl, 0)? as u32;

        access_records.push(AccessRecord {
            timestamp,
            command,
            key,
            size,
            ttl,
        });
    }
    Ok(access_records)
}

fn parse_field(
    record: &csv::StringRecord,
    field_opt: Option<i32>,
    default: u64,
) -> Result<u64, Box<dyn Error>> {
    match field_opt {
        Some(index) if index >= 0 => {
            let field = record
                .get(index as usize)
                .ok_or_else(|| format!("trace row has no column {index}"))?;
            Ok(field.trim().parse()?)
        }
        _ => Ok(default),
    }
}
