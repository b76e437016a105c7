#![doc = include_str!("../README.md")]

pub use crate::config::*;
pub use crate::error::Error;
pub use crate::policy::{NonSensitivePolicy, PartitionedProperties, PropertyPolicy, SensitiveKeySet};
pub use crate::regulations::{RegulationService, RegulationsClient};
pub use crate::storage::{MemoryStorage, Storage, AGREED, DENIED};
pub use crate::tracker::{MetaMetrics, MetaMetricsBuilder};
pub use crate::transport::Transport;
pub use crate::types::*;

pub mod config;
pub mod error;
pub mod policy;
pub mod regulations;
pub mod storage;
pub mod tracker;
pub mod transport;
pub mod types;
