use crate::ids::{INTERNAL_ID, PUBLIC_ID};
use crate::models::ListParams;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    #[must_use]
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Sort requested by a list call, React Admin style: `_sort=title&_order=ASC`.
///
/// Both parameters must be present and non-empty, otherwise the store's
/// natural order is kept. Sorting on `id` sorts on the internal identifier.
#[must_use]
pub fn parse_sorting(params: &ListParams) -> Option<SortSpec> {
    let sort = params.sort.as_deref().filter(|s| !s.is_empty())?;
    let order = params.order.as_deref().filter(|o| !o.is_empty())?;

    let field = if sort == PUBLIC_ID { INTERNAL_ID } else { sort };
    Some(SortSpec::new(field, parse_order(order)))
}

/// `ASC` in any case is ascending, anything else descending.
#[must_use]
pub fn parse_order(order: &str) -> SortDirection {
    if order.eq_ignore_ascii_case("ASC") {
        SortDirection::Asc
    } else {
        SortDirection::Desc
    }
}
