//! rangekit-core - comment tag codec, host document port and name manager.

pub mod document;
pub mod error;
pub mod host;
pub mod manager;
pub mod storage;
pub mod tags;

pub use document::MemoryHost;
pub use error::{RangekitError, Result};
pub use host::{
    EditToken, EditTokens, HostDocument, NamedRangeRecord, SavePayload, Scope, SelectionSnapshot,
};
pub use manager::{DefineRequest, NameManager, NamedRangeView, RangeSource};
pub use tags::{CommentTags, ORIGIN_TAG, OverflowMap, Tag, compose_comment, strip_tags};
