pub mod compression;
pub mod models;

pub use compression::{
    from_binary, from_compressed, to_binary, to_compressed, validate_compressed_data, CodecError,
    SNAPSHOT_VERSION,
};
pub use models::{
    CatalogMetadata, CatalogSnapshot, CollectionError, MapCollection, MapDocument, MapId,
};
