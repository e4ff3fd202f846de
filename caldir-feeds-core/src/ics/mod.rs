//! ICS handling.
//!
//! Feed text is scanned with the lightweight field extractor in `fields`;
//! destination events are written and read back as standalone .ics files.

pub mod fields;
mod generate;
mod parse;

pub use fields::{ParsedField, RawEventRecord, decode_text, split_records, unfold};
pub use generate::generate_ics;
pub use parse::parse_destination_event;
