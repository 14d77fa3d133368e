mod loader;

pub use loader::{LaborLoader, LaborRecord, LineItemLoader, LineItemRecord, LoaderError};
