//! Domain layer of Roomcraft: session state machine types, selection model,
//! image payloads, the transformation contract and persistence seams.

pub mod catalog;
pub mod config;
pub mod credential;
pub mod design;
pub mod error;
pub mod image;
pub mod store;
pub mod transform;

// Re-export common types
pub use credential::Credential;
pub use design::{SelectedItem, Selection, Session, Stage};
pub use error::{Result, RoomcraftError};
pub use image::{EncodedImage, ImageNormalizer};
pub use store::{DesignStore, KeyValueStore};
pub use transform::{ImageTransformer, ProgressPhase, ProgressSink, TransformFailure, TransformResult};
