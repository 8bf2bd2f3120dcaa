/// Result of one translation step.
///
/// `Skip` is a control outcome, not a value: on save the property is left
/// out of its parent map, on load the parent leaves the field as it was.
/// It is distinct from a stored null.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T> {
    /// Write or assign this value.
    Assign(T),
    /// Leave the destination untouched.
    Skip,
}

impl<T> Outcome<T> {
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip)
    }

    pub fn is_assign(&self) -> bool {
        matches!(self, Self::Assign(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Assign(value) => Outcome::Assign(f(value)),
            Self::Skip => Outcome::Skip,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Assign(value) => Some(value),
            Self::Skip => None,
        }
    }

    /// Store an assigned value into `slot`. Returns `true` if it did.
    pub fn assign_to(self, slot: &mut T) -> bool {
        match self {
            Self::Assign(value) => {
                *slot = value;
                true
            }
            Self::Skip => false,
        }
    }
}

/// What a recycling container did with the value it was handed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Recycle<T> {
    /// The recycled value already held the loaded content; nothing moved.
    Unchanged,
    /// New content. When a recycled value was supplied this is that same
    /// storage, populated in place and moved out for reassignment.
    Changed(T),
}

impl<T> Recycle<T> {
    /// Convert to the outcome reported to the parent.
    pub fn into_outcome(self) -> Outcome<T> {
        match self {
            Self::Unchanged => Outcome::Skip,
            Self::Changed(value) => Outcome::Assign(value),
        }
    }
}
