use super::error::DomainError;
use serde::Serialize;

pub const PAGE_SIZE: i64 = 10;

/// The `?page=` a listing was asked for, before the total is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    Number(i64),
    Last,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::Number(1)
    }
}

impl PageRequest {
    /// Accepts a positive integer or `last`; a missing value means page 1.
    pub fn parse(raw: Option<&str>) -> Result<Self, DomainError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some("last") => Ok(Self::Last),
            Some(value) => value
                .parse::<i64>()
                .map(Self::Number)
                .map_err(|_| DomainError::PageNotFound),
        }
    }

    /// Resolves the request against `total` items, rejecting out-of-range
    /// pages. The first page of an empty listing is valid.
    pub fn resolve(self, total: i64) -> Result<Pagination, DomainError> {
        let num_pages = if total <= 0 {
            1
        } else {
            (total + PAGE_SIZE - 1) / PAGE_SIZE
        };
        let number = match self {
            Self::Last => num_pages,
            Self::Number(n) => n,
        };
        if number < 1 || number > num_pages {
            return Err(DomainError::PageNotFound);
        }

        Ok(Pagination {
            number,
            num_pages,
            per_page: PAGE_SIZE,
            total: total.max(0),
            has_previous: number > 1,
            has_next: number < num_pages,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub number: i64,
    pub num_pages: i64,
    pub per_page: i64,
    pub total: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl Pagination {
    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_numbers_and_last() {
        assert_eq!(PageRequest::parse(None).unwrap(), PageRequest::Number(1));
        assert_eq!(PageRequest::parse(Some("3")).unwrap(), PageRequest::Number(3));
        assert_eq!(PageRequest::parse(Some("last")).unwrap(), PageRequest::Last);
        assert!(PageRequest::parse(Some("two")).unwrap_err().is_not_found());
    }

    #[test]
    fn twenty_five_items_make_three_pages() {
        let first = PageRequest::Number(1).resolve(25).unwrap();
        assert_eq!((first.offset(), first.limit()), (0, 10));
        assert!(first.has_next && !first.has_previous);

        let third = PageRequest::Number(3).resolve(25).unwrap();
        assert_eq!(third.offset(), 20);
        assert_eq!(third.num_pages, 3);
        assert!(!third.has_next && third.has_previous);

        assert_eq!(PageRequest::Last.resolve(25).unwrap(), third);
        assert!(PageRequest::Number(4).resolve(25).is_err());
        assert!(PageRequest::Number(0).resolve(25).is_err());
    }

    #[test]
    fn empty_listing_has_one_empty_page() {
        let page = PageRequest::default().resolve(0).unwrap();
        assert_eq!(page.num_pages, 1);
        assert_eq!(page.total, 0);
        assert!(PageRequest::Number(2).resolve(0).is_err());
    }
}
