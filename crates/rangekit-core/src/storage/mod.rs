//! Storage for the in-memory host document (`.nrd` files).

mod parser;
mod writer;

pub use parser::{parse_nrd, parse_nrd_content};
pub use writer::{write_nrd, write_nrd_content};

use crate::host::SavePayload;

/// Everything a `.nrd` file holds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentContents {
    pub sheets: Vec<String>,
    /// Current selection address, with sheet prefix.
    pub selection: Option<String>,
    pub names: Vec<SavePayload>,
}
