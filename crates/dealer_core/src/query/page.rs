//! Sort and pagination requests passed through to the executor untouched.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    /// Column name as requested by the caller.
    pub field: String,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Optional ordering and paging for `find`, `search` and `list_all`.
///
/// Without a sort the executor orders by ascending identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub sort: Vec<SortOrder>,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl PageRequest {
    pub fn sorted_by(order: SortOrder) -> Self {
        Self {
            sort: vec![order],
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }
}
