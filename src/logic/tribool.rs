use super::errors::{LogicError, LogicResult};
use std::convert::TryFrom;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

///
/// Three-valued logic value.
///
/// Discriminants are ordered so that `False < Other < True`, which makes
/// Kleene conjunction the minimum and disjunction the maximum of the operands.
///
/// There is no implicit coercion into [`bool`]. Use [`Tribool::to_bool`] or
/// [`TryFrom`] and decide what an indeterminate value means at the call site.
#[repr(i8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tribool {
    False = -1,
    Other = 0,
    True = 1,
}

impl Tribool {
    /// Alias of [`Tribool::Other`].
    pub const UNKNOWN: Tribool = Tribool::Other;

    #[inline]
    pub const fn negate(self) -> Tribool {
        match self {
            Tribool::False => Tribool::True,
            Tribool::Other => Tribool::Other,
            Tribool::True => Tribool::False,
        }
    }

    #[inline]
    pub fn and(self, other: Tribool) -> Tribool {
        self.min(other)
    }

    #[inline]
    pub fn or(self, other: Tribool) -> Tribool {
        self.max(other)
    }

    #[inline]
    pub const fn is_true(self) -> bool {
        matches!(self, Tribool::True)
    }

    #[inline]
    pub const fn is_false(self) -> bool {
        matches!(self, Tribool::False)
    }

    #[inline]
    pub const fn is_other(self) -> bool {
        matches!(self, Tribool::Other)
    }

    ///
    /// Explicit conversion into a two-valued boolean.
    ///
    /// Fails with [`LogicError::ValueNotDeterminate`] for [`Tribool::Other`].
    pub fn to_bool(self) -> LogicResult<bool> {
        match self {
            Tribool::False => Ok(false),
            Tribool::True => Ok(true),
            Tribool::Other => Err(LogicError::ValueNotDeterminate),
        }
    }

    #[inline]
    pub(crate) const fn as_repr(self) -> i8 {
        self as i8
    }

    /// Total over `i8`, any value outside the three discriminants collapses by sign.
    #[inline]
    pub(crate) const fn from_repr(repr: i8) -> Tribool {
        if repr < 0 {
            Tribool::False
        } else if repr > 0 {
            Tribool::True
        } else {
            Tribool::Other
        }
    }
}

impl Default for Tribool {
    fn default() -> Self {
        Tribool::Other
    }
}

impl Not for Tribool {
    type Output = Tribool;

    #[inline]
    fn not(self) -> Tribool {
        self.negate()
    }
}

impl BitAnd for Tribool {
    type Output = Tribool;

    #[inline]
    fn bitand(self, rhs: Tribool) -> Tribool {
        self.and(rhs)
    }
}

impl BitOr for Tribool {
    type Output = Tribool;

    #[inline]
    fn bitor(self, rhs: Tribool) -> Tribool {
        self.or(rhs)
    }
}

impl From<bool> for Tribool {
    fn from(v: bool) -> Self {
        if v {
            Tribool::True
        } else {
            Tribool::False
        }
    }
}

impl From<Option<bool>> for Tribool {
    fn from(v: Option<bool>) -> Self {
        v.map_or(Tribool::Other, Tribool::from)
    }
}

impl TryFrom<Tribool> for bool {
    type Error = LogicError;

    fn try_from(v: Tribool) -> LogicResult<bool> {
        v.to_bool()
    }
}

impl fmt::Display for Tribool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tribool::False => "false",
            Tribool::Other => "other",
            Tribool::True => "true",
        };
        f.pad(s)
    }
}
