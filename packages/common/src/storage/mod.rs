mod error;
mod filesystem;
mod key;
mod traits;

pub use error::StorageError;
pub use filesystem::FilesystemBlobStore;
pub use key::BlobKey;
pub use traits::BlobStore;
