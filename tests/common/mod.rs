pub mod tracing;

use source_list::{ItemId, SourceItem};

pub fn id(n: u128) -> ItemId {
    ItemId::from_u128(n)
}

pub fn leaf(n: u128, title: &str) -> SourceItem {
    SourceItem::item(title).id(id(n))
}

pub fn group(n: u128, title: &str, children: Vec<SourceItem>) -> SourceItem {
    SourceItem::group(title, children).id(id(n))
}
