// reserved record fields
pub const DOC_ID: &str = "id";
pub const DOC_COLLECTION_PATH: &str = "collectionPath";
pub const RESERVED_FIELDS: [&str; 2] = [DOC_ID, DOC_COLLECTION_PATH];

// store schema
pub const COLLECTION_PATH_INDEX: &str = "collectionPath";

// defaults
pub const DEFAULT_DATABASE_NAME: &str = "CinderDB";
pub const INITIAL_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_POLL_INTERVAL_MILLIS: u64 = 100;

pub const PATH_SEPARATOR: char = '/';
pub const FIELD_SEPARATOR: &str = ".";
pub const AUTO_ID_LENGTH: usize = 20;
