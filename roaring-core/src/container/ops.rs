use std::cmp::{self, Ordering};
use std::ops::Range;

use super::bitmap::for_each_masked_word;
use super::{
    ArrayContainer, BitmapContainer, Container, ContainerOps, Interval, PeekableIterator,
    RunContainer, BITMAP_WORDS,
};

use Container::{Array, Bitmap, Run};

impl Container {
    /// Values present in both containers
    pub fn and(&self, other: &Container) -> Container {
        match (self, other) {
            (Array(a), Array(b)) => Array(array_and(a.as_slice(), b.as_slice())),
            (Array(a), Bitmap(b)) | (Bitmap(b), Array(a)) => {
                Array(array_filter(a, |value| b.contains(value)))
            }
            (Array(a), Run(b)) | (Run(b), Array(a)) => Array(array_and_run(a, b, true)),
            (Bitmap(a), Bitmap(b)) => Bitmap(bitmap_words(a, b, |x, y| x & y)).normalize(),
            (Bitmap(a), Run(b)) | (Run(b), Bitmap(a)) => {
                if b.is_full() {
                    return Bitmap(a.clone()).normalize();
                }
                Bitmap(bitmap_and_run(a, b)).normalize()
            }
            (Run(a), Run(b)) => Run(run_and(a, b)).into_efficient(),
        }
    }

    /// Values present in either container
    pub fn or(&self, other: &Container) -> Container {
        if self.is_full() || other.is_full() {
            return Container::full();
        }
        match (self, other) {
            (Array(a), Array(b)) => {
                Array(ArrayContainer::from_sorted_unchecked(merge_union(a, b))).normalize()
            }
            (Array(a), Bitmap(b)) | (Bitmap(b), Array(a)) => {
                let mut bitmap = b.clone();
                bitmap.add_many(a.as_slice());
                Bitmap(bitmap)
            }
            (Array(a), Run(b)) | (Run(b), Array(a)) => {
                let values = a.as_slice().iter().map(|&v| unit_range(v));
                Run(run_union(values, b.runs().iter().map(|run| run.range()))).into_efficient()
            }
            (Bitmap(a), Bitmap(b)) => Bitmap(bitmap_words(a, b, |x, y| x | y)),
            (Bitmap(a), Run(b)) | (Run(b), Bitmap(a)) => {
                let mut bitmap = a.clone();
                for run in b.runs() {
                    bitmap.add_range(run.range());
                }
                Bitmap(bitmap).into_efficient()
            }
            (Run(a), Run(b)) => {
                let left = a.runs().iter().map(|run| run.range());
                Run(run_union(left, b.runs().iter().map(|run| run.range()))).into_efficient()
            }
        }
    }

    /// Values present in `self` but not in `other`
    pub fn andnot(&self, other: &Container) -> Container {
        match (self, other) {
            (Array(a), Array(b)) => Array(array_andnot(a.as_slice(), b.as_slice())),
            (Array(a), Bitmap(b)) => Array(array_filter(a, |value| !b.contains(value))),
            (Array(a), Run(b)) => Array(array_and_run(a, b, false)),
            (Bitmap(a), Array(b)) => {
                let mut bitmap = a.clone();
                for &value in b.as_slice() {
                    bitmap.remove(value);
                }
                Bitmap(bitmap).normalize()
            }
            (Bitmap(a), Bitmap(b)) => Bitmap(bitmap_words(a, b, |x, y| x & !y)).normalize(),
            (Bitmap(a), Run(b)) => {
                let mut bitmap = a.clone();
                for run in b.runs() {
                    bitmap.remove_range(run.range());
                }
                Bitmap(bitmap).normalize()
            }
            (Run(a), Array(b)) => {
                let mut run = a.clone();
                for &value in b.as_slice() {
                    run.remove(value);
                }
                Run(run).into_efficient()
            }
            (Run(a), Bitmap(b)) => {
                let bitmap = BitmapContainer::from(a);
                Bitmap(bitmap_words(&bitmap, b, |x, y| x & !y)).into_efficient()
            }
            (Run(a), Run(b)) => {
                let mut run = a.clone();
                for interval in b.runs() {
                    run.remove_range(interval.range());
                }
                Run(run).into_efficient()
            }
        }
    }

    /// Values present in exactly one of the containers
    pub fn xor(&self, other: &Container) -> Container {
        match (self, other) {
            (Array(a), Array(b)) => {
                Array(ArrayContainer::from_sorted_unchecked(merge_xor(a, b))).normalize()
            }
            (Array(a), Bitmap(b)) | (Bitmap(b), Array(a)) => {
                let mut bitmap = b.clone();
                for &value in a.as_slice() {
                    let value = u32::from(value);
                    bitmap.flip_range(value..value + 1);
                }
                Bitmap(bitmap).normalize()
            }
            (Bitmap(a), Bitmap(b)) => Bitmap(bitmap_words(a, b, |x, y| x ^ y)).normalize(),
            (Bitmap(a), Run(b)) | (Run(b), Bitmap(a)) => {
                let mut bitmap = a.clone();
                for run in b.runs() {
                    bitmap.flip_range(run.range());
                }
                Bitmap(bitmap).into_efficient()
            }
            (Array(_), Run(_)) | (Run(_), Array(_)) | (Run(_), Run(_)) => {
                self.or(other).andnot(&self.and(other))
            }
        }
    }

    /// Returns true if the containers share at least one value
    pub fn intersects(&self, other: &Container) -> bool {
        match (self, other) {
            (Array(a), Array(b)) => {
                let (mut a, mut b) = (a.iter(), b.iter());
                while let (Some(x), Some(y)) = (a.peek_next(), b.peek_next()) {
                    match x.cmp(&y) {
                        Ordering::Less => a.advance_if_needed(y),
                        Ordering::Greater => b.advance_if_needed(x),
                        Ordering::Equal => return true,
                    }
                }
                false
            }
            (Array(a), Bitmap(b)) | (Bitmap(b), Array(a)) => {
                a.as_slice().iter().any(|&value| b.contains(value))
            }
            (Array(a), Run(b)) | (Run(b), Array(a)) => {
                a.as_slice().iter().any(|&value| b.contains(value))
            }
            (Bitmap(a), Bitmap(b)) => a
                .words()
                .iter()
                .zip(b.words().iter())
                .any(|(x, y)| x & y != 0),
            (Bitmap(a), Run(b)) | (Run(b), Bitmap(a)) => b
                .runs()
                .iter()
                .any(|run| a.range_cardinality(run.range()) != 0),
            (Run(a), Run(b)) => run_overlaps(a.runs(), b.runs()).next().is_some(),
        }
    }

    /// Number of values present in both containers, without building the intersection
    pub fn and_cardinality(&self, other: &Container) -> u32 {
        match (self, other) {
            (Array(a), Array(b)) => {
                let (mut a, mut b) = (a.iter(), b.iter());
                let mut count = 0;
                while let (Some(x), Some(y)) = (a.peek_next(), b.peek_next()) {
                    match x.cmp(&y) {
                        Ordering::Less => a.advance_if_needed(y),
                        Ordering::Greater => b.advance_if_needed(x),
                        Ordering::Equal => {
                            count += 1;
                            a.next();
                            b.next();
                        }
                    }
                }
                count
            }
            (Array(a), other) | (other, Array(a)) => {
                a.as_slice().iter().filter(|&&value| other.contains(value)).count() as u32
            }
            (Bitmap(a), Bitmap(b)) => a
                .words()
                .iter()
                .zip(b.words().iter())
                .map(|(x, y)| (x & y).count_ones())
                .sum(),
            (Bitmap(a), Run(b)) | (Run(b), Bitmap(a)) => b
                .runs()
                .iter()
                .map(|run| a.range_cardinality(run.range()))
                .sum(),
            (Run(a), Run(b)) => run_overlaps(a.runs(), b.runs())
                .map(|range| range.end - range.start)
                .sum(),
        }
    }

    /// Flips the presence of every value in `range`
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::container::{Container, ContainerOps};
    ///
    /// let mut container = Container::from_range(0..10);
    /// container.flip_range(5..15);
    /// assert_eq!(container.iter().collect::<Vec<_>>(), [0, 1, 2, 3, 4, 10, 11, 12, 13, 14]);
    /// ```
    pub fn flip_range(&mut self, range: Range<u32>) {
        if range.is_empty() {
            return;
        }
        match self {
            Bitmap(bitmap) => {
                bitmap.flip_range(range);
                self.replace_with(Container::normalize);
            }
            _ => *self = self.xor(&Container::from_range(range)),
        }
    }

    /// Copying version of [`Container::flip_range`]
    pub fn not(&self, range: Range<u32>) -> Container {
        let mut flipped = self.clone();
        flipped.flip_range(range);
        flipped
    }

    /// In-place version of [`Container::and`]
    pub fn and_inplace(&mut self, other: &Container) {
        match (&mut *self, other) {
            (Bitmap(a), Bitmap(b)) => {
                bitmap_words_inplace(a, b, |x, y| x & y);
                self.replace_with(Container::normalize);
            }
            (Array(a), Bitmap(b)) => {
                let kept = array_filter(a, |value| b.contains(value));
                *a = kept;
            }
            _ => *self = self.and(other),
        }
    }

    /// In-place version of [`Container::or`]
    pub fn or_inplace(&mut self, other: &Container) {
        match (&mut *self, other) {
            (Bitmap(a), Bitmap(b)) => bitmap_words_inplace(a, b, |x, y| x | y),
            (Bitmap(a), Array(b)) => a.add_many(b.as_slice()),
            (Run(a), Run(b)) if !a.is_full() => {
                for run in b.runs() {
                    a.add_range(run.range());
                }
                self.replace_with(Container::into_efficient);
            }
            _ => *self = self.or(other),
        }
    }

    /// In-place version of [`Container::andnot`]
    pub fn andnot_inplace(&mut self, other: &Container) {
        match (&mut *self, other) {
            (Bitmap(a), Bitmap(b)) => {
                bitmap_words_inplace(a, b, |x, y| x & !y);
                self.replace_with(Container::normalize);
            }
            (Array(a), Bitmap(b)) => {
                let kept = array_filter(a, |value| !b.contains(value));
                *a = kept;
            }
            _ => *self = self.andnot(other),
        }
    }

    /// In-place version of [`Container::xor`]
    pub fn xor_inplace(&mut self, other: &Container) {
        match (&mut *self, other) {
            (Bitmap(a), Bitmap(b)) => {
                bitmap_words_inplace(a, b, |x, y| x ^ y);
                self.replace_with(Container::normalize);
            }
            _ => *self = self.xor(other),
        }
    }
}

#[inline]
fn unit_range(value: u16) -> Range<u32> {
    let value = u32::from(value);
    value..value + 1
}

fn array_filter(array: &ArrayContainer, mut keep: impl FnMut(u16) -> bool) -> ArrayContainer {
    let values = array.as_slice().iter().copied().filter(|&v| keep(v)).collect();
    ArrayContainer::from_sorted_unchecked(values)
}

fn array_and(a: &[u16], b: &[u16]) -> ArrayContainer {
    let mut out = Vec::with_capacity(cmp::min(a.len(), b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    ArrayContainer::from_sorted_unchecked(out)
}

fn array_andnot(a: &[u16], b: &[u16]) -> ArrayContainer {
    let mut out = Vec::with_capacity(a.len());
    let mut j = 0;
    for &value in a {
        j += b[j..].partition_point(|&other| other < value);
        if b.get(j) != Some(&value) {
            out.push(value);
        }
    }
    ArrayContainer::from_sorted_unchecked(out)
}

/// Keeps the array values inside (`keep_inside`) or outside the runs
fn array_and_run(array: &ArrayContainer, run: &RunContainer, keep_inside: bool) -> ArrayContainer {
    let mut runs = run.iter();
    array_filter(array, |value| {
        runs.advance_if_needed(value);
        (runs.peek_next() == Some(value)) == keep_inside
    })
}

fn merge_union(a: &ArrayContainer, b: &ArrayContainer) -> Vec<u16> {
    let (a, b) = (a.as_slice(), b.as_slice());
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

fn merge_xor(a: &ArrayContainer, b: &ArrayContainer) -> Vec<u16> {
    let (a, b) = (a.as_slice(), b.as_slice());
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

fn bitmap_words(
    a: &BitmapContainer,
    b: &BitmapContainer,
    op: impl Fn(u64, u64) -> u64,
) -> BitmapContainer {
    let mut words = Box::new([0u64; BITMAP_WORDS]);
    for ((out, &x), &y) in words.iter_mut().zip(a.words().iter()).zip(b.words().iter()) {
        *out = op(x, y);
    }
    BitmapContainer::from_words(words)
}

fn bitmap_words_inplace(
    a: &mut BitmapContainer,
    b: &BitmapContainer,
    op: impl Fn(u64, u64) -> u64,
) {
    for (x, &y) in a.words_mut_deferred().iter_mut().zip(b.words().iter()) {
        *x = op(*x, y);
    }
    a.recount();
}

fn bitmap_and_run(bitmap: &BitmapContainer, run: &RunContainer) -> BitmapContainer {
    let mut words = Box::new([0u64; BITMAP_WORDS]);
    for interval in run.runs() {
        for_each_masked_word(interval.range(), |index, mask| {
            words[index] |= bitmap.words()[index] & mask;
        });
    }
    BitmapContainer::from_words(words)
}

/// The non-empty overlaps of two canonical run lists, in ascending order
fn run_overlaps<'a>(a: &'a [Interval], b: &'a [Interval]) -> impl Iterator<Item = Range<u32>> + 'a {
    let (mut i, mut j) = (0, 0);
    std::iter::from_fn(move || {
        while i < a.len() && j < b.len() {
            let (x, y) = (a[i].range(), b[j].range());
            let start = cmp::max(x.start, y.start);
            let end = cmp::min(x.end, y.end);
            if x.end <= y.end {
                i += 1;
            } else {
                j += 1;
            }
            if start < end {
                return Some(start..end);
            }
        }
        None
    })
}

fn run_and(a: &RunContainer, b: &RunContainer) -> RunContainer {
    let overlaps = run_overlaps(a.runs(), b.runs()).map(Interval::from_range);
    RunContainer::from_runs_unchecked(overlaps.collect())
}

/// Unions two ascending streams of ranges
fn run_union(
    a: impl Iterator<Item = Range<u32>>,
    b: impl Iterator<Item = Range<u32>>,
) -> RunContainer {
    let mut out = RunContainer::new();
    let (mut a, mut b) = (a.peekable(), b.peekable());
    loop {
        let next = match (a.peek(), b.peek()) {
            (Some(x), Some(y)) if x.start <= y.start => a.next(),
            (Some(_), Some(_)) => b.next(),
            (Some(_), None) => a.next(),
            (None, Some(_)) => b.next(),
            (None, None) => break,
        };
        if let Some(range) = next {
            out.push_range(range);
        }
    }
    out
}
