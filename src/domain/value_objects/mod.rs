pub mod image_upload;
pub mod storage_key;

pub use image_upload::ImageUpload;
pub use storage_key::StorageKey;
