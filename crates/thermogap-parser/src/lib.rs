pub mod errors;
pub mod model;
pub mod normalize;
pub mod reader;

pub use errors::IngestError;
pub use model::{MalformedRecordPolicy, RawRecord, RawTable, SkippedRecord};
pub use normalize::{coerce_numeric, normalize_column, normalize_columns, ColumnSpec, NumericColumn};
pub use reader::{read_from, read_path, read_str, ReaderOptions};
