// doc constants
pub const DOC_ID: &str = "id";
pub const DOC_ETAG: &str = "_etag";
pub const DOC_TIMESTAMP: &str = "_ts";

// field path constants
pub const FIELD_SEPARATOR: char = '.';
pub const PARTITION_PATH_SEPARATOR: char = '/';

// query constants
pub const QUERY_ROOT_ALIAS: &str = "r";
pub const QUERY_PARAMETER_PREFIX: &str = "@p";

// collection constants
pub const DEFAULT_MAX_ITEM_COUNT: u32 = 100;
pub const DEFAULT_OFFER_THROUGHPUT: u32 = 400;
pub const MIN_OFFER_THROUGHPUT: u32 = 400;
pub const DEFAULT_STRING_INDEX_PRECISION: i32 = -1;
pub const MAX_ID_LENGTH: usize = 255;

// characters the remote store refuses inside resource ids
pub const FORBIDDEN_ID_CHARACTERS: [char; 4] = ['/', '\\', '?', '#'];
