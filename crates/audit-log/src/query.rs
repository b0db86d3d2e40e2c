use crate::{PartitionKey, SortKey};

/// Direction in which records of a partition are returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest sort key first.
    #[default]
    Ascending,
    /// Largest sort key first.
    Descending,
}

/// A range query over a single partition.
///
/// Every query names exactly one partition; records from other partitions are
/// never returned. Within the partition, records can be narrowed by a sort-key
/// prefix (e.g. one event type) and an inclusive sort-key range.
#[derive(Debug, Clone)]
pub struct AuditQuery {
    /// The partition to read.
    pub partition: PartitionKey,

    /// Only return records whose sort key starts with this prefix.
    pub sort_key_prefix: Option<String>,

    /// Lower sort-key bound (inclusive).
    pub from_sort_key: Option<SortKey>,

    /// Upper sort-key bound (inclusive).
    pub to_sort_key: Option<SortKey>,

    /// Result ordering.
    pub order: SortOrder,

    /// Maximum number of records to return.
    pub limit: Option<usize>,
}

impl AuditQuery {
    /// Creates a query returning the whole partition in ascending sort-key order.
    pub fn for_partition(partition: PartitionKey) -> Self {
        Self {
            partition,
            sort_key_prefix: None,
            from_sort_key: None,
            to_sort_key: None,
            order: SortOrder::Ascending,
            limit: None,
        }
    }

    /// Restricts results to sort keys beginning with `prefix`.
    pub fn sort_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.sort_key_prefix = Some(prefix.into());
        self
    }

    /// Restricts results to one event type.
    pub fn event_type(self, event_type: &str) -> Self {
        self.sort_key_prefix(format!("{event_type}#"))
    }

    /// Sets the inclusive lower sort-key bound.
    pub fn from_sort_key(mut self, sk: SortKey) -> Self {
        self.from_sort_key = Some(sk);
        self
    }

    /// Sets the inclusive upper sort-key bound.
    pub fn to_sort_key(mut self, sk: SortKey) -> Self {
        self.to_sort_key = Some(sk);
        self
    }

    /// Returns records in descending sort-key order.
    pub fn descending(mut self) -> Self {
        self.order = SortOrder::Descending;
        self
    }

    /// Limits the number of records returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true if `sk` satisfies the prefix and range conditions.
    pub fn matches_sort_key(&self, sk: &SortKey) -> bool {
        if let Some(ref prefix) = self.sort_key_prefix
            && !sk.starts_with(prefix)
        {
            return false;
        }
        if let Some(ref from) = self.from_sort_key
            && sk < from
        {
            return false;
        }
        if let Some(ref to) = self.to_sort_key
            && sk > to
        {
            return false;
        }
        true
    }
}
