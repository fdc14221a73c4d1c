use clap::ValueEnum;
use serde::{
    Deserialize,
    Serialize,
};
use strum::Display;

/// Output format for log lines.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
