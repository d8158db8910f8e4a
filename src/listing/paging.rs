//! Page windows for paginated listings.

use std::collections::BTreeSet;

/// Page numbers to show around `current`: up to `siblings` pages on each side,
/// plus the first and last page. A gap between consecutive numbers is drawn as
/// an ellipsis by the client.
pub fn visible_pages(current: u32, total: u32, siblings: u32) -> Vec<u32> {
    if total == 0 {
        return Vec::new();
    }

    let mut pages = BTreeSet::new();
    let first = current.saturating_sub(siblings).max(1);
    let last = current.saturating_add(siblings).min(total);
    pages.extend(first..=last);
    pages.insert(1);
    pages.insert(total);

    pages.into_iter().collect()
}

/// Number of pages needed for `len` items.
pub fn total_pages(len: usize, per_page: usize) -> usize {
    if per_page == 0 { 0 } else { len.div_ceil(per_page) }
}

/// Items on 1-based `page`. Out of range pages are empty.
pub fn page_slice<T>(items: &[T], page: usize, per_page: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(per_page);
    if page == 0 || start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(per_page).min(items.len());
    &items[start..end]
}

/// Parse a positive page or limit from a query string value, like the
/// dashboard links do: anything unparseable or zero becomes `default`.
pub fn parse_positive(value: Option<&str>, default: u32) -> u32 {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(default)
}
