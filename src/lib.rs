pub mod cache;
pub mod config;
pub mod dashboard;
pub mod dimensions;
pub mod error;
pub mod export;
pub mod fields;
pub mod filter;
pub mod frame;
pub mod generator;
pub mod rng;
pub mod series;

pub use cache::{FactCache, FactTable};
pub use config::GeneratorConfig;
pub use dashboard::{Dashboard, DashboardQuery, DashboardView};
pub use dimensions::DimensionTables;
pub use error::{InsightsError, Result};
pub use fields::{Field, Measure};
pub use filter::{filter_records, FilterCriteria, FilterSelection};
pub use generator::{FactGenerator, FactRecord};
pub use rng::SeededRng;
