pub mod enricher;
pub mod etl;
pub mod filter;
pub mod pipeline;
pub mod reader;
pub mod report;
pub mod writer;

pub use crate::domain::model::{EnrichedTransaction, ReportSummary, Transaction, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, ProductCatalog, Storage};
pub use crate::utils::error::Result;
