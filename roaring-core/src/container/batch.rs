use super::{Container, ContainerIter, ContainerOps, PeekableIterator};

/// Reusable batch iterator over one container at a time
///
/// A `BatchIterator` can be released from its container and wrapped around another, so a
/// single instance walks every chunk of a bitmap. A released (or never wrapped) iterator
/// reports no values.
///
/// # Examples
///
/// ```
/// use roaring_core::container::{BatchIterator, Container};
///
/// let first = Container::from_range(0..3);
/// let second = Container::from_range(7..9);
///
/// let mut batch = BatchIterator::new();
/// let mut buf = [0u32; 8];
///
/// batch.wrap(&first);
/// assert_eq!(batch.next_batch(0, &mut buf), 3);
/// assert!(!batch.has_next());
///
/// batch.release_container();
/// assert_eq!(batch.next_batch(0, &mut buf), 0);
///
/// batch.wrap(&second);
/// assert_eq!(batch.next_batch(0x0001_0000, &mut buf), 2);
/// assert_eq!(&buf[..2], &[0x0001_0007, 0x0001_0008]);
/// ```
#[derive(Clone, Default)]
pub struct BatchIterator<'a> {
    iter: Option<ContainerIter<'a>>,
}

impl<'a> BatchIterator<'a> {
    /// Creates an iterator not wrapping any container
    #[inline]
    pub const fn new() -> Self {
        Self { iter: None }
    }

    /// Starts iterating `container` from its first value, replacing any previous container
    #[inline]
    pub fn wrap(&mut self, container: &'a Container) {
        self.iter = Some(container.iter());
    }

    /// Fills `buf` with the next values combined with the chunk base `key`, returning how
    /// many were written
    ///
    /// See [`ContainerIter::next_batch`].
    #[inline]
    pub fn next_batch(&mut self, key: u32, buf: &mut [u32]) -> usize {
        match &mut self.iter {
            Some(iter) => iter.next_batch(key, buf),
            None => 0,
        }
    }

    /// Returns true if the wrapped container has values left
    #[inline]
    pub fn has_next(&self) -> bool {
        self.iter.as_ref().map_or(false, |iter| iter.has_next())
    }

    /// Skips the values of the wrapped container below `min`
    #[inline]
    pub fn advance_if_needed(&mut self, min: u16) {
        if let Some(iter) = &mut self.iter {
            iter.advance_if_needed(min);
        }
    }

    /// Drops the reference to the wrapped container
    #[inline]
    pub fn release_container(&mut self) {
        self.iter = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_advance_independently() {
        let container = Container::from_range(0..100);
        let mut batch = container.batch_iter();
        let mut buf = [0u32; 10];
        assert_eq!(batch.next_batch(0, &mut buf), 10);

        let mut copy = batch.clone();
        copy.next_batch(0, &mut buf);
        assert_eq!(copy.next_batch(0, &mut buf), 10);
        assert_eq!(buf[0], 20);
        assert_eq!(batch.next_batch(0, &mut buf), 10);
        assert_eq!(buf[0], 10);
    }

    #[test]
    fn advance_then_batch() {
        let container: Container = [1u16, 5, 9, 400].into_iter().collect();
        let mut batch = container.batch_iter();
        batch.advance_if_needed(6);
        let mut buf = [0u32; 4];
        assert_eq!(batch.next_batch(0, &mut buf), 2);
        assert_eq!(&buf[..2], &[9, 400]);
        assert!(!batch.has_next());
    }
}
