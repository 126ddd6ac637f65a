pub mod config;

pub use config::{
    ConfigError, FabricConfig, FabricScaleConfig, StatusConfig, StoreConfig,
    DEFAULT_FABRIC_LABEL_KEY, SCALE_UP_STATUS_SUFFIX,
};
