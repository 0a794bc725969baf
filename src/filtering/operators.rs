use std::fmt;

/// Operator suffixes recognized on filter keys, e.g. `price_gte`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Ne,
}

impl Operator {
    pub const ALL: [Self; 8] = [
        Self::Eq,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::In,
        Self::Nin,
        Self::Ne,
    ];

    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.suffix() == suffix)
    }

    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::Nin => "nin",
            Self::Ne => "ne",
        }
    }

    /// `nin` builds an inclusion list exactly like `in`.
    #[must_use]
    pub const fn comparator(self) -> Comparator {
        match self {
            Self::Eq => Comparator::Eq,
            Self::Gt => Comparator::Gt,
            Self::Gte => Comparator::Gte,
            Self::Lt => Comparator::Lt,
            Self::Lte => Comparator::Lte,
            Self::Ne => Comparator::Ne,
            Self::In | Self::Nin => Comparator::In,
        }
    }

    /// Whether the operand is a list of values.
    #[must_use]
    pub const fn takes_list(self) -> bool {
        matches!(self, Self::In | Self::Nin)
    }
}

/// Store-native comparison primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Comparator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Ne,
    In,
}

impl Comparator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::Ne => "$ne",
            Self::In => "$in",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Splits `field_operator` on the last underscore.
///
/// Returns `None` when the suffix is not a known operator or nothing is left
/// for the field name, in which case the whole key is a plain field.
#[must_use]
pub fn split_operator(key: &str) -> Option<(&str, Operator)> {
    let (field, suffix) = key.rsplit_once('_')?;
    if field.is_empty() {
        return None;
    }
    Operator::from_suffix(suffix).map(|op| (field, op))
}
