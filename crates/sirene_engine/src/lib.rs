//! Sirene engine: the IO side of the resolver. Paginated registry
//! fetching, batch orchestration, workbook export, input loading and
//! atomic output persistence.
mod batch;
mod export;
mod fetch;
mod input;
mod persist;
mod types;

pub use batch::fetch_batch;
pub use export::{build_workbook, ExportError, DETAIL_SHEET, SUMMARY_LABELS, SUMMARY_SHEET};
pub use fetch::{FetchSettings, ProgressSink, SireneClient, SiretSource, FIRST_PAGE_CURSOR};
pub use input::{load_sirens, InputError};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use types::{CancelFlag, FetchError, ProgressEvent, SirenFetch};
