mod primitive;
mod reader;

pub use primitive::PrimitiveReader;
pub use reader::{load_manifest, Reader, Section};
