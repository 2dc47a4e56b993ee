use serde::Serialize;

/// Number of pages needed for `total` items, `0` when nothing can be paged.
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Contiguous window of page numbers around `current`, clamped into
/// `[1, page_count]`. An out-of-range `current` is not an error; it simply
/// pins the window to the nearest edge.
pub fn paginate(current: usize, _page_size: usize, page_count: usize, window: usize) -> Vec<usize> {
    if page_count < window {
        return (1..=page_count).collect();
    }

    let mut first = current.saturating_add(1).saturating_sub(window / 2).max(1);
    if first.saturating_add(window) > page_count {
        first = page_count + 1 - window;
    }

    (first..first + window).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub first_page_num: Option<usize>,
    pub last_page_num: Option<usize>,
    pub current_page_num: usize,
    pub page_count: usize,
    pub page_nums: Vec<usize>,
}

impl Pagination {
    pub fn new(current: usize, page_size: usize, total: usize, window: usize) -> Self {
        Self::from_page_count(current, page_size, page_count(total, page_size), window)
    }

    pub fn from_page_count(current: usize, page_size: usize, page_count: usize, window: usize) -> Self {
        let page_nums = paginate(current, page_size, page_count, window);
        Self {
            first_page_num: page_nums.first().copied(),
            last_page_num: page_nums.last().copied(),
            current_page_num: current,
            page_count,
            page_nums,
        }
    }
}
