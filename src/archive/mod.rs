mod end_record;
mod format;
mod local_entry;
mod reader;
mod writer;

pub use end_record::{EndRecord, END_RECORD_SIGNATURE, END_RECORD_SIZE};
pub use format::{
    CompressionMethod, DosDateTime, EntryInfo, CD_ENTRY_SIZE, FLAG_UTF8, MAX_PATH_LENGTH,
};
pub use local_entry::{LocalEntryHeader, LOCAL_ENTRY_SIGNATURE, LOCAL_ENTRY_SIZE};
pub use reader::ArchiveReader;
pub use writer::ArchiveWriter;

pub(crate) use writer::normalize_path;
