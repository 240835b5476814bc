use super::{
    ArrayContainer, BitmapContainer, Container, ContainerOps, RunContainer, ARRAY_MAX_SIZE,
    MAX_CARDINALITY,
};

/// Size estimate of a bitmap container
pub(crate) const BITMAP_SIZE_IN_BYTES: usize = 8192;

/// Size estimate of an array container holding `cardinality` values
#[inline]
pub(crate) const fn array_size_in_bytes(cardinality: usize) -> usize {
    2 * cardinality
}

/// Size estimate of a run container holding `runs` runs
#[inline]
pub(crate) const fn run_size_in_bytes(runs: usize) -> usize {
    2 + 4 * runs
}

/// The encoding used by a [`Container`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Array,
    Bitmap,
    Run,
}

impl Container {
    /// The encoding currently used
    #[inline]
    pub fn kind(&self) -> ContainerKind {
        match self {
            Container::Array(_) => ContainerKind::Array,
            Container::Bitmap(_) => ContainerKind::Bitmap,
            Container::Run(_) => ContainerKind::Run,
        }
    }

    /// Converts to the encoding with the smallest size estimate
    ///
    /// Arrays are only considered up to [`ARRAY_MAX_SIZE`] values. A run encoding is chosen
    /// only when it is strictly smaller than the alternative.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::container::{Container, ContainerKind, ContainerOps};
    ///
    /// let mut container = Container::new();
    /// container.add_range(0..3000);
    /// assert_eq!(container.kind(), ContainerKind::Array);
    ///
    /// let container = container.into_efficient();
    /// assert_eq!(container.kind(), ContainerKind::Run);
    /// assert_eq!(container.cardinality(), 3000);
    /// ```
    pub fn into_efficient(self) -> Container {
        let target = best_kind(&self);
        self.into_kind(target)
    }

    /// Switches to run encoding when it is smaller than the current one.
    ///
    /// A run container whose runs no longer pay off becomes an array or a bitmap.
    pub fn run_optimize(self) -> Container {
        match self {
            Container::Run(_) => self.into_efficient(),
            other => {
                let runs = other.number_of_runs() as usize;
                if run_size_in_bytes(runs) < other.size_in_bytes() {
                    other.into_kind(ContainerKind::Run)
                } else {
                    other
                }
            }
        }
    }

    /// Replaces run encoding with an array or a bitmap, chosen by cardinality
    pub fn remove_run_compression(self) -> Container {
        match self {
            Container::Run(run) => dense_or_sparse(&run),
            other => other,
        }
    }

    /// Applies the array/bitmap density rule, leaving run containers alone
    pub(crate) fn normalize(self) -> Container {
        match self {
            Container::Array(array) if array.cardinality() as usize > ARRAY_MAX_SIZE => {
                Container::Bitmap(BitmapContainer::from(&array))
            }
            Container::Bitmap(bitmap) if bitmap.cardinality() as usize <= ARRAY_MAX_SIZE => {
                Container::Array(ArrayContainer::from(&bitmap))
            }
            other => other,
        }
    }

    /// Converts to `kind`, reusing `self` when it already has that encoding
    pub fn into_kind(self, kind: ContainerKind) -> Container {
        match (self, kind) {
            (Container::Array(array), ContainerKind::Bitmap) => {
                Container::Bitmap(BitmapContainer::from(&array))
            }
            (Container::Array(array), ContainerKind::Run) => {
                Container::Run(RunContainer::from(&array))
            }
            (Container::Bitmap(bitmap), ContainerKind::Array) => {
                Container::Array(ArrayContainer::from(&bitmap))
            }
            (Container::Bitmap(bitmap), ContainerKind::Run) => {
                Container::Run(RunContainer::from(&bitmap))
            }
            (Container::Run(run), ContainerKind::Array) => {
                Container::Array(ArrayContainer::from(&run))
            }
            (Container::Run(run), ContainerKind::Bitmap) => {
                Container::Bitmap(BitmapContainer::from(&run))
            }
            (same, _) => same,
        }
    }

    /// Releases unused capacity of array and run encodings
    pub fn shrink_to_fit(&mut self) {
        match self {
            Container::Array(array) => array.shrink_to_fit(),
            Container::Bitmap(_) => {}
            Container::Run(run) => run.shrink_to_fit(),
        }
    }
}

fn best_kind(container: &Container) -> ContainerKind {
    let cardinality = container.cardinality() as usize;
    let run_size = run_size_in_bytes(container.number_of_runs() as usize);
    let (kind, size) = if cardinality <= ARRAY_MAX_SIZE {
        (ContainerKind::Array, array_size_in_bytes(cardinality))
    } else {
        (ContainerKind::Bitmap, BITMAP_SIZE_IN_BYTES)
    };
    if run_size < size {
        ContainerKind::Run
    } else {
        kind
    }
}

fn dense_or_sparse(run: &RunContainer) -> Container {
    if run.cardinality() as usize <= ARRAY_MAX_SIZE {
        Container::Array(ArrayContainer::from(run))
    } else {
        Container::Bitmap(BitmapContainer::from(run))
    }
}

impl From<&ArrayContainer> for BitmapContainer {
    fn from(array: &ArrayContainer) -> Self {
        let mut bitmap = BitmapContainer::new();
        bitmap.add_many(array.as_slice());
        bitmap
    }
}

impl From<&BitmapContainer> for ArrayContainer {
    fn from(bitmap: &BitmapContainer) -> Self {
        let mut values = Vec::with_capacity(bitmap.cardinality() as usize);
        values.extend(bitmap.iter());
        ArrayContainer::from_sorted_unchecked(values)
    }
}

impl From<&RunContainer> for ArrayContainer {
    fn from(run: &RunContainer) -> Self {
        let mut values = Vec::with_capacity(run.cardinality() as usize);
        for interval in run.runs() {
            values.extend(interval.range().map(|v| v as u16));
        }
        ArrayContainer::from_sorted_unchecked(values)
    }
}

impl From<&RunContainer> for BitmapContainer {
    fn from(run: &RunContainer) -> Self {
        let mut bitmap = BitmapContainer::new();
        for interval in run.runs() {
            bitmap.add_range(interval.range());
        }
        bitmap
    }
}

impl From<&ArrayContainer> for RunContainer {
    fn from(array: &ArrayContainer) -> Self {
        let mut run = RunContainer::new();
        for &value in array.as_slice() {
            let value = u32::from(value);
            run.push_range(value..value + 1);
        }
        run
    }
}

impl From<&BitmapContainer> for RunContainer {
    fn from(bitmap: &BitmapContainer) -> Self {
        let mut run = RunContainer::new();
        let mut pos = 0;
        while let Some(start) = bitmap.next_set_bit(pos) {
            let end = bitmap.next_clear_bit(start);
            run.push_range(start..end);
            if end == MAX_CARDINALITY {
                break;
            }
            pos = end;
        }
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_values_stay_arrays() {
        let container: Container = (0..100u16).map(|v| v * 3).collect();
        assert_eq!(container.clone().run_optimize().kind(), ContainerKind::Array);
        assert_eq!(container.into_efficient().kind(), ContainerKind::Array);
    }

    #[test]
    fn dense_runs_leave_bitmaps() {
        let mut container = Container::Bitmap(BitmapContainer::new());
        container.add_range(0..30000);
        let optimized = container.clone().run_optimize();
        assert_eq!(optimized.kind(), ContainerKind::Run);
        assert_eq!(optimized, container);

        let restored = optimized.remove_run_compression();
        assert_eq!(restored.kind(), ContainerKind::Bitmap);
        assert_eq!(restored, container);
    }

    #[test]
    fn scattered_runs_become_bitmap() {
        let mut run = RunContainer::new();
        for start in (0..65536u32).step_by(4) {
            run.push_range(start..start + 2);
        }
        let container = Container::Run(run).run_optimize();
        assert_eq!(container.kind(), ContainerKind::Bitmap);
        assert_eq!(container.cardinality(), 32768);
    }

    #[test]
    fn normalize_applies_density_rule() {
        let array = Container::Array(ArrayContainer::from_range(0..5000));
        assert_eq!(array.normalize().kind(), ContainerKind::Bitmap);

        let mut bitmap = BitmapContainer::new();
        bitmap.add_range(0..10);
        assert_eq!(Container::Bitmap(bitmap).normalize().kind(), ContainerKind::Array);
    }

    #[test]
    fn full_bitmap_to_runs() {
        let run = RunContainer::from(&BitmapContainer::full());
        assert_eq!(run.runs().len(), 1);
        assert!(run.is_full());
    }
}
