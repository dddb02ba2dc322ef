pub mod config_service;
pub mod image_file;
pub mod logging;
pub mod paths;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::paths::RoomcraftPaths;
pub use crate::storage::FileKeyValueStore;
