//! Cursor-based pagination for `*/list` operations.
//!
//! The cursor is a base64-encoded decimal offset — opaque to clients per
//! the protocol, but trivial to produce and parse on our side since the
//! backing collections are small, static, in-memory lists.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub const PAGE_SIZE: usize = 50;

pub struct Page<'a, T> {
    pub items: &'a [T],
    pub next_cursor: Option<String>,
}

pub fn encode_cursor(offset: usize) -> String {
    STANDARD.encode(offset.to_string())
}

pub fn decode_cursor(cursor: &str) -> Option<usize> {
    let decoded = STANDARD.decode(cursor).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    text.parse().ok()
}

pub fn paginate<T>(items: &[T], cursor: Option<&str>) -> Page<'_, T> {
    let offset = cursor.and_then(decode_cursor).unwrap_or(0);
    let offset = offset.min(items.len());
    let end = (offset + PAGE_SIZE).min(items.len());
    let next_cursor = (end < items.len()).then(|| encode_cursor(end));
    Page {
        items: &items[offset..end],
        next_cursor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_round_trips() {
        let cursor = encode_cursor(50);
        assert_eq!(decode_cursor(&cursor), Some(50));
    }

    #[test]
    fn pagination_splits_into_pages() {
        let items: Vec<u32> = (0..120).collect();
        let first = paginate(&items, None);
        assert_eq!(first.items.len(), PAGE_SIZE);
        assert!(first.next_cursor.is_some());

        let second = paginate(&items, first.next_cursor.as_deref());
        assert_eq!(second.items.len(), PAGE_SIZE);
        assert!(second.next_cursor.is_some());

        let third = paginate(&items, second.next_cursor.as_deref());
        assert_eq!(third.items.len(), 20);
        assert!(third.next_cursor.is_none());
    }

    #[test]
    fn garbage_cursor_falls_back_to_start() {
        let items: Vec<u32> = (0..10).collect();
        let page = paginate(&items, Some("not-a-cursor"));
        assert_eq!(page.items.len(), 10);
    }
}
