//! Target sets: one element or a fixed collection of elements.

/// The element or elements a single call registers for observation.
///
/// Elements are host handles; a target set only clones handles, it never owns
/// the underlying page element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target<E> {
    /// A single element.
    Element(E),
    /// An ordered collection; may be empty.
    Collection(Vec<E>),
}

impl<E> Target<E> {
    /// Collapse the target set into one ordered sequence.
    ///
    /// A single element becomes a one-element sequence; a collection is
    /// returned as is.
    #[must_use]
    pub fn into_elements(self) -> Vec<E> {
        match self {
            Self::Element(element) => vec![element],
            Self::Collection(elements) => elements,
        }
    }

    /// Number of elements in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Element(_) => 1,
            Self::Collection(elements) => elements.len(),
        }
    }

    /// Returns true for an empty collection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E> From<Vec<E>> for Target<E> {
    fn from(elements: Vec<E>) -> Self {
        Self::Collection(elements)
    }
}

impl<E, const N: usize> From<[E; N]> for Target<E> {
    fn from(elements: [E; N]) -> Self {
        Self::Collection(elements.into())
    }
}

impl<E: Clone> From<&[E]> for Target<E> {
    fn from(elements: &[E]) -> Self {
        Self::Collection(elements.to_vec())
    }
}
