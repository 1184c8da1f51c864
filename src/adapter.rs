use crate::youtube::PlaylistItem;

/// What one list row displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub published_at: &'a str,
    /// The `high` thumbnail only; other variants are never substituted.
    pub image_url: Option<&'a str>,
}

/// Positional view over the presenter's dataset. Row `i` is item `i`.
#[derive(Debug, Clone, Copy)]
pub struct PlaylistAdapter<'a> {
    items: &'a [PlaylistItem],
}

impl<'a> PlaylistAdapter<'a> {
    pub fn new(items: &'a [PlaylistItem]) -> Self {
        Self { items }
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn row(&self, position: usize) -> Option<Row<'a>> {
        self.items.get(position).map(bind_row)
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'a>> + 'a {
        let items = self.items;
        items.iter().map(bind_row)
    }
}

fn bind_row(item: &PlaylistItem) -> Row<'_> {
    match &item.snippet {
        Some(snippet) => Row {
            title: &snippet.title,
            description: &snippet.description,
            published_at: &snippet.published_at,
            image_url: snippet.thumbnails.high.as_ref().map(|high| high.url.as_str()),
        },
        None => Row {
            title: "",
            description: "",
            published_at: "",
            image_url: None,
        },
    }
}
