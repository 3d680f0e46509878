// Pagination - fixed-size pages over an ordered listing
// Out-of-range requests resolve to the last page instead of failing

use serde::Serialize;

/// Page geometry for a listing of `total` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total: u64,
    per_page: u64,
}

impl Paginator {
    pub fn new(total: u64, per_page: u32) -> Self {
        Self {
            total,
            per_page: u64::from(per_page.max(1)),
        }
    }

    /// Number of pages; an empty listing still has one (empty) page.
    pub fn num_pages(&self) -> u64 {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.per_page)
        }
    }

    /// Resolve a raw `?page=` value. Missing or non-numeric means page 1,
    /// anything below 1 or past the end means the last page.
    pub fn resolve(&self, raw: Option<&str>) -> u64 {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return 1;
        };
        match raw.parse::<i64>() {
            Ok(n) if n >= 1 && (n as u64) <= self.num_pages() => n as u64,
            Ok(_) => self.num_pages(),
            // Digits too large for i64 are still a number, just out of range
            Err(_) if is_integer_literal(raw) => self.num_pages(),
            Err(_) => 1,
        }
    }

    /// `(limit, offset)` of a resolved page number.
    pub fn window(&self, number: u64) -> (u64, u64) {
        let number = number.clamp(1, self.num_pages());
        (self.per_page, (number - 1) * self.per_page)
    }

    pub fn page<T>(&self, number: u64, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: number.clamp(1, self.num_pages()),
            num_pages: self.num_pages(),
            total: self.total,
        }
    }
}

fn is_integer_literal(raw: &str) -> bool {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn previous_page_number(&self) -> Option<u64> {
        (self.number > 1).then(|| self.number - 1)
    }

    pub fn next_page_number(&self) -> Option<u64> {
        (self.number < self.num_pages).then(|| self.number + 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
        }
    }
}
