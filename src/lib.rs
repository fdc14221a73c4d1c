#[macro_use]
extern crate tracing;

mod app;
mod collector;
mod exporter;
mod logging;

pub use app::App;
pub use collector::PlexCollector;
pub use exporter::{
    Exporter,
    ExporterError,
};
pub use logging::init_logging;
