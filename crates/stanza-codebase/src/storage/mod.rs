//! Persisted structural summaries of declarations.
//!
//! Storages are produced once by the scan pass and are independent of any
//! particular file version's source text. They serialize as a whole for the
//! file-storage cache.

mod class_like;
mod file;
mod function_like;

pub use class_like::{ClassLikeStorage, PropertyStorage};
pub use file::FileStorage;
pub use function_like::{FunctionLikeStorage, ParamStorage};
