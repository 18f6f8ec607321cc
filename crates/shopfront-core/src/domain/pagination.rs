//! Skip/limit pagination and sorting primitives shared by list queries.

use std::str::FromStr;

use serde::Serialize;

use crate::error::DomainError;

/// A 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(page: u64, limit: u64) -> Result<Self, DomainError> {
        if page == 0 {
            return Err(DomainError::Validation("page must be at least 1".to_string()));
        }
        if limit == 0 {
            return Err(DomainError::Validation("limit must be at least 1".to_string()));
        }
        Ok(Self { page, limit })
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        self.limit.saturating_mul(self.page - 1)
    }

    /// Slice an already-ordered collection.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let len = usize::try_from(self.limit).unwrap_or(usize::MAX);
        items.iter().skip(start).take(len).cloned().collect()
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(DomainError::Validation(format!(
                "order must be 'asc' or 'desc', got '{other}'"
            ))),
        }
    }
}

/// One page of results plus the total number of matching rows.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(1, 10).unwrap().offset(), 0);
        assert_eq!(PageRequest::new(3, 10).unwrap().offset(), 20);
    }

    #[test]
    fn test_zero_values_rejected() {
        assert!(PageRequest::new(0, 10).is_err());
        assert!(PageRequest::new(1, 0).is_err());
    }

    #[test]
    fn test_slice_past_end_is_empty() {
        let items: Vec<u32> = (0..5).collect();
        assert_eq!(PageRequest::new(2, 3).unwrap().slice(&items), vec![3, 4]);
        assert!(PageRequest::new(4, 3).unwrap().slice(&items).is_empty());
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
