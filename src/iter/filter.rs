use core::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Lazily filters a single-pass iterator through a fallible predicate,
/// looking ahead by one element so the next match can be reported without
/// being consumed.
///
/// A predicate failure is captured during lookahead and surfaces on every
/// later call; the decorator never resumes past the failing element.
///
/// # Example
///
/// ```rust
/// use sift::iter::filter::FilterLookahead1;
///
/// let mut iter = FilterLookahead1::new(1..=12, |x: &i32| Ok(x % 2 == 0));
/// assert!(iter.has_next().unwrap());
/// assert_eq!(iter.next().unwrap(), 2);
/// assert_eq!(iter.next().unwrap(), 4);
/// assert_eq!(iter.next().unwrap(), 6);
/// assert_eq!(iter.next().unwrap(), 8);
/// assert_eq!(iter.next().unwrap(), 10);
/// assert_eq!(iter.next().unwrap(), 12);
/// assert!(!iter.has_next().unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct FilterLookahead1<I, T, P> {
    iter: I,
    matches: P,
    slot: Slot<T>,
}

/// One-element buffer between the source and the caller.
///
/// End and failure are distinct states rather than sentinel values: a
/// buffered element may itself be a legitimately absent value such as `None`.
#[derive(Debug, Clone)]
enum Slot<T> {
    Empty,
    Ready(T),
    Failed(FilterError),
}

impl<I, T, P> FilterLookahead1<I, T, P>
where
    I: Iterator<Item = T>,
    T: fmt::Debug,
    P: FnMut(&T) -> anyhow::Result<bool>,
{
    /// Wraps `iter`, buffering its first match eagerly.
    ///
    /// A predicate failure on the way to the first match is stored, not
    /// raised; it surfaces on the first [`Self::has_next`] or [`Self::next`].
    #[must_use]
    pub fn new(iter: I, matches: P) -> Self {
        let mut this = Self {
            iter,
            matches,
            slot: Slot::Empty,
        };
        this.look_ahead();
        this
    }

    /// Like [`Self::new`], but fails with [`FilterError::MissingInput`]
    /// before touching the source if either collaborator is absent.
    pub fn try_new(iter: Option<I>, matches: Option<P>) -> Result<Self, FilterError> {
        let (Some(iter), Some(matches)) = (iter, matches) else {
            return Err(FilterError::MissingInput);
        };
        Ok(Self::new(iter, matches))
    }

    /// Reports whether a matching element is buffered. Never advances the
    /// source.
    pub fn has_next(&self) -> Result<bool, FilterError> {
        match &self.slot {
            Slot::Empty => Ok(false),
            Slot::Ready(_) => Ok(true),
            Slot::Failed(err) => Err(err.clone()),
        }
    }

    /// Returns the buffered element and advances the source to the next
    /// match.
    pub fn next(&mut self) -> Result<T, FilterError> {
        match core::mem::replace(&mut self.slot, Slot::Empty) {
            Slot::Empty => Err(FilterError::Exhausted),
            Slot::Ready(item) => {
                self.look_ahead();
                Ok(item)
            }
            Slot::Failed(err) => {
                self.slot = Slot::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// The source cursor is already past the last returned element (and past
    /// every rejected one), so removal is never supported.
    pub fn remove(&mut self) -> Result<(), FilterError> {
        Err(FilterError::RemoveUnsupported)
    }

    fn look_ahead(&mut self) {
        self.slot = Slot::Empty;
        while let Some(item) = self.iter.next() {
            match (self.matches)(&item) {
                Ok(true) => {
                    self.slot = Slot::Ready(item);
                    return;
                }
                Ok(false) => {}
                Err(cause) => {
                    // poisoned: no further elements are pulled
                    self.slot = Slot::Failed(FilterError::Predicate {
                        element: format!("{item:?}"),
                        cause: Arc::new(cause),
                    });
                    return;
                }
            }
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum FilterError {
    #[error("a source iterator and a predicate are both required")]
    MissingInput,
    #[error("predicate failed while matching {element}")]
    Predicate {
        element: String,
        #[source]
        cause: Arc<anyhow::Error>,
    },
    #[error("no element left")]
    Exhausted,
    #[error("removing from the underlying iterator is not supported")]
    RemoveUnsupported,
}

pub trait FilterLookahead1Ext: Iterator + Sized {
    fn filter_lookahead1<P>(self, matches: P) -> FilterLookahead1<Self, Self::Item, P>
    where
        Self::Item: fmt::Debug,
        P: FnMut(&Self::Item) -> anyhow::Result<bool>,
    {
        FilterLookahead1::new(self, matches)
    }
}
impl<T> FilterLookahead1Ext for T where T: Iterator {}
