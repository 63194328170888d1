//! In-memory host document.

mod io;
mod ops;
mod state;

pub use state::MemoryHost;
