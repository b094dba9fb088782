// Item model shared by the tree store and the selection tracker

pub mod item;

pub use item::{ItemId, Metadata, SourceItem};
