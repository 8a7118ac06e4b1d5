pub mod pad;
pub mod header;
pub mod error;
pub mod save;
pub mod parts;
pub mod store;
pub mod convert;

pub use header::{SaveHeader, HEADER_SIZE, MAGIC, VERSION};
pub use error::{SaveError, ErrorKind};
pub use save::{SaveContainer, Diagnostics};
pub use parts::{SaveParts, HEADER_FILE_NAME};
pub use store::{SaveStore, BlobContainer, DirStore, MemoryStore};
pub use convert::{ConvertOptions, ConvertError, export_save, import_save, list_saves};
