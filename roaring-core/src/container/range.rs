use std::cmp;

use super::{BitmapContainer, Interval};

/// Receives the presence or absence of every position of a queried range.
///
/// For a query over `from..to`, positions are offsets from `from`: the events cover each
/// of `0..to - from` exactly once, in ascending order. `accept_all_present` and
/// `accept_all_absent` receive non-empty half-open ranges.
/// Containers that know about runs (bitmap and run encodings) report maximal runs; array
/// containers report present values one at a time and coalesce the gaps between them.
pub trait RelativeRangeConsumer {
    /// `pos` is present
    fn accept_present(&mut self, pos: u32);

    /// `pos` is absent
    fn accept_absent(&mut self, pos: u32);

    /// Every position in `from..to` is present
    fn accept_all_present(&mut self, from: u32, to: u32) {
        for pos in from..to {
            self.accept_present(pos);
        }
    }

    /// Every position in `from..to` is absent
    fn accept_all_absent(&mut self, from: u32, to: u32) {
        for pos in from..to {
            self.accept_absent(pos);
        }
    }
}

/// Forwards present positions to a closure as `start + pos`, ignoring absent ones
///
/// # Examples
///
/// ```
/// use roaring_core::container::{Container, ContainerOps, ValueConsumer};
///
/// let container = Container::from_range(10..13);
/// let mut values = Vec::new();
/// container.for_all_in_range(0, 100, &mut ValueConsumer::new(1000, |v| values.push(v)));
/// assert_eq!(values, [1010, 1011, 1012]);
///
/// // Positions are relative to the start of the query
/// let mut values = Vec::new();
/// container.for_all_in_range(11, 100, &mut ValueConsumer::new(11, |v| values.push(v)));
/// assert_eq!(values, [11, 12]);
/// ```
pub struct ValueConsumer<F> {
    pub start: u32,
    pub f: F,
}

impl<F: FnMut(u32)> ValueConsumer<F> {
    #[inline]
    pub fn new(start: u32, f: F) -> Self {
        Self { start, f }
    }
}

impl<F: FnMut(u32)> RelativeRangeConsumer for ValueConsumer<F> {
    #[inline]
    fn accept_present(&mut self, pos: u32) {
        (self.f)(self.start + pos);
    }

    #[inline]
    fn accept_absent(&mut self, _pos: u32) {}

    #[inline]
    fn accept_all_present(&mut self, from: u32, to: u32) {
        for pos in from..to {
            (self.f)(self.start + pos);
        }
    }

    #[inline]
    fn accept_all_absent(&mut self, _from: u32, _to: u32) {}
}

impl<C: RelativeRangeConsumer + ?Sized> RelativeRangeConsumer for &mut C {
    #[inline]
    fn accept_present(&mut self, pos: u32) {
        (**self).accept_present(pos);
    }

    #[inline]
    fn accept_absent(&mut self, pos: u32) {
        (**self).accept_absent(pos);
    }

    #[inline]
    fn accept_all_present(&mut self, from: u32, to: u32) {
        (**self).accept_all_present(from, to);
    }

    #[inline]
    fn accept_all_absent(&mut self, from: u32, to: u32) {
        (**self).accept_all_absent(from, to);
    }
}

/// Reports the local positions `from..to` as present, relative to `origin`
#[inline]
fn present<C>(consumer: &mut C, origin: u32, from: u32, to: u32)
where
    C: RelativeRangeConsumer + ?Sized,
{
    if to - from == 1 {
        consumer.accept_present(from - origin);
    } else {
        consumer.accept_all_present(from - origin, to - origin);
    }
}

/// Reports the local positions `from..to` as absent, relative to `origin`
#[inline]
fn absent<C>(consumer: &mut C, origin: u32, from: u32, to: u32)
where
    C: RelativeRangeConsumer + ?Sized,
{
    if to - from == 1 {
        consumer.accept_absent(from - origin);
    } else {
        consumer.accept_all_absent(from - origin, to - origin);
    }
}

pub(super) fn array_for_all<C>(values: &[u16], from: u32, to: u32, consumer: &mut C)
where
    C: RelativeRangeConsumer + ?Sized,
{
    if from >= to {
        return;
    }
    let first = values.partition_point(|&v| u32::from(v) < from);
    let mut pos = from;
    for value in values[first..].iter().map(|&v| u32::from(v)) {
        if value >= to {
            break;
        }
        if value > pos {
            absent(consumer, from, pos, value);
        }
        consumer.accept_present(value - from);
        pos = value + 1;
    }
    if pos < to {
        absent(consumer, from, pos, to);
    }
}

pub(super) fn bitmap_for_all<C>(bitmap: &BitmapContainer, from: u32, to: u32, consumer: &mut C)
where
    C: RelativeRangeConsumer + ?Sized,
{
    let mut pos = from;
    while pos < to {
        let set = bitmap.next_set_bit(pos).map_or(to, |v| cmp::min(v, to));
        if set > pos {
            absent(consumer, from, pos, set);
            pos = set;
            if pos == to {
                break;
            }
        }
        let clear = cmp::min(bitmap.next_clear_bit(pos), to);
        present(consumer, from, pos, clear);
        pos = clear;
    }
}

pub(super) fn run_for_all<C>(runs: &[Interval], from: u32, to: u32, consumer: &mut C)
where
    C: RelativeRangeConsumer + ?Sized,
{
    if from >= to {
        return;
    }
    let first = runs.partition_point(|run| run.end() <= from);
    let mut pos = from;
    for run in &runs[first..] {
        let start = cmp::max(u32::from(run.start()), pos);
        if start >= to {
            break;
        }
        if start > pos {
            absent(consumer, from, pos, start);
        }
        let end = cmp::min(run.end(), to);
        present(consumer, from, start, end);
        pos = end;
    }
    if pos < to {
        absent(consumer, from, pos, to);
    }
}

#[cfg(test)]
mod tests {
    use crate::container::{Container, ContainerOps, RelativeRangeConsumer};

    #[derive(Debug, PartialEq)]
    enum Event {
        Present(u32),
        Absent(u32),
        AllPresent(u32, u32),
        AllAbsent(u32, u32),
    }

    #[derive(Default)]
    struct Recorder(Vec<Event>);

    impl RelativeRangeConsumer for Recorder {
        fn accept_present(&mut self, pos: u32) {
            self.0.push(Event::Present(pos));
        }
        fn accept_absent(&mut self, pos: u32) {
            self.0.push(Event::Absent(pos));
        }
        fn accept_all_present(&mut self, from: u32, to: u32) {
            self.0.push(Event::AllPresent(from, to));
        }
        fn accept_all_absent(&mut self, from: u32, to: u32) {
            self.0.push(Event::AllAbsent(from, to));
        }
    }

    fn record(container: &Container, from: u32, to: u32) -> Vec<Event> {
        let mut recorder = Recorder::default();
        container.for_all_in_range(from, to, &mut recorder);
        recorder.0
    }

    #[test]
    fn array_reports_singles_and_gaps() {
        let container: Container = [2u16, 3, 7].into_iter().collect();
        use Event::*;
        assert_eq!(
            record(&container, 1, 10),
            [Absent(0), Present(1), Present(2), AllAbsent(3, 6), Present(6), AllAbsent(7, 9)]
        );
    }

    #[test]
    fn run_reports_maximal_runs() {
        let container = Container::from_range(5..10);
        use Event::*;
        assert_eq!(
            record(&container, 0, 20),
            [AllAbsent(0, 5), AllPresent(5, 10), AllAbsent(10, 20)]
        );
        assert_eq!(record(&container, 7, 9), [AllPresent(0, 2)]);
        assert_eq!(record(&container, 9, 11), [Present(0), Absent(1)]);
    }

    #[test]
    fn bitmap_reports_maximal_runs() {
        let mut container = Container::Bitmap(Default::default());
        container.add_range(64..200);
        container.add(65535);
        use Event::*;
        assert_eq!(
            record(&container, 60, 65536),
            [AllAbsent(0, 4), AllPresent(4, 140), AllAbsent(140, 65475), Present(65475)]
        );
    }

    #[test]
    fn empty_query_reports_nothing() {
        let container = Container::full();
        assert!(record(&container, 10, 10).is_empty());
    }
}
