pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{HttpProductCatalog, LocalStorage};
pub use core::{etl::EtlEngine, pipeline::SalesPipeline};
pub use utils::error::{EtlError, Result};
