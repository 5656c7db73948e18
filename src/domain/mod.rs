pub mod error;
pub mod model;

pub use error::{AppError, MediaLoadError};
pub use model::{
    DownloadResult, MediaFile, MediaKind, PostReference, TransactionId, TransactionState,
};
