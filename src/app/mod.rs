pub mod export;

pub use export::AssetExporter;
