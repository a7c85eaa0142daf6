pub mod loader;
pub mod preprocess;

pub use loader::{ImageLoader, ImageSet};
pub use preprocess::Preprocessor;
