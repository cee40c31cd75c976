pub mod source;
pub mod synthetic;
pub mod text;

pub use source::{DirectorySource, MemorySource, Recording, SignalSource};
