mod load;
mod types;

pub use load::{apply_env_overrides, get_recce_data_dir, load_default};
pub use types::{AppConfig, CloudConfig, LoggingConfig, ObjectStoreConfig, DEFAULT_CLOUD_API_HOST};
