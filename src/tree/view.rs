use crate::model::item::rebuild_forest;
use crate::model::{ItemId, SourceItem};

/// A row in the flattened, expansion-aware view of the forest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleItem {
    pub id: ItemId,
    /// Indent level (roots are 0)
    pub depth: usize,
}

/// Build a filtered copy of `items` for a search query.
///
/// Matching is a case-insensitive substring test on the title. An item with
/// a children container is kept when it matches or any descendant matches;
/// kept containers hold only the matching descendants and are marked
/// expanded so the matches are visible. Leaves are kept only when they
/// match. An empty query returns the items unchanged.
pub fn filter_items(items: &[SourceItem], query: &str) -> Vec<SourceItem> {
    if query.is_empty() {
        return items.to_vec();
    }
    let needle = query.to_lowercase();

    rebuild_forest(items, |item, children| {
        let matches = item.title.to_lowercase().contains(&needle);
        match children {
            Some(children) if matches || !children.is_empty() => {
                let mut kept = item.copy_with_children(Some(children));
                kept.is_expanded = true;
                Some(kept)
            }
            Some(_) => None,
            None if matches => Some(item.copy_with_children(None)),
            None => None,
        }
    })
}

/// Render a plain text outline of `items`, one item per line.
///
/// Expanded groups are marked `v`, collapsed groups `>`, everything else `-`.
/// Children are listed regardless of expansion, indented two spaces per level.
pub fn outline(items: &[SourceItem]) -> String {
    let mut lines = Vec::new();
    let mut stack: Vec<(&SourceItem, usize)> = items.iter().rev().map(|i| (i, 0)).collect();

    while let Some((item, depth)) = stack.pop() {
        let marker = match (item.has_children(), item.is_expanded) {
            (true, true) => 'v',
            (true, false) => '>',
            (false, _) => '-',
        };
        let mut line = format!("{}{} {}", "  ".repeat(depth), marker, item.title);
        if let Some(badge) = &item.badge {
            line.push_str(&format!(" ({badge})"));
        }
        lines.push(line);

        if let Some(children) = &item.children {
            stack.extend(children.iter().rev().map(|c| (c, depth + 1)));
        }
    }
    lines.join("\n")
}
