//! Deferred unions.
//!
//! [`lazy_or`] skips the cardinality bookkeeping of bitmap containers, leaving them in a
//! state where the cached cardinality is stale. Such containers must go through
//! [`repair`] before any other operation observes them.

use super::bitmap::for_each_masked_word;
use super::{Container, ContainerKind, ContainerOps, ARRAY_MAX_SIZE};

/// Unions `other` into `target`, possibly leaving `target` unrepaired
pub(crate) fn lazy_or(target: &mut Container, other: &Container) {
    let promote = match (&*target, other) {
        (Container::Array(array), Container::Array(other)) => {
            array.cardinality() + other.cardinality() > ARRAY_MAX_SIZE as u32
        }
        (Container::Array(_), Container::Bitmap(_)) => true,
        _ => false,
    };
    if promote {
        target.replace_with(|container| container.into_kind(ContainerKind::Bitmap));
    }
    match (target, other) {
        (Container::Bitmap(bitmap), other) => {
            let words = bitmap.words_mut_deferred();
            match other {
                Container::Array(array) => {
                    for &value in array.as_slice() {
                        words[usize::from(value / 64)] |= 1u64 << (value % 64);
                    }
                }
                Container::Bitmap(other) => {
                    for (word, &bits) in words.iter_mut().zip(other.words().iter()) {
                        *word |= bits;
                    }
                }
                Container::Run(run) => {
                    for interval in run.runs() {
                        for_each_masked_word(interval.range(), |index, mask| words[index] |= mask);
                    }
                }
            }
        }
        (target, other) => target.or_inplace(other),
    }
}

/// Restores a container left behind by [`lazy_or`] to its canonical form
pub(crate) fn repair(container: &mut Container) {
    if let Container::Bitmap(bitmap) = container {
        bitmap.recount();
    }
    container.replace_with(Container::normalize);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repair_restores_cardinality() {
        let mut target = Container::new();
        let parts: Vec<Container> = vec![
            (0..3000u16).map(|v| v * 2).collect(),
            (0..3000u16).map(|v| v * 2 + 1).collect(),
            Container::from_range(10000..12000),
            (20000..26000u16).collect(),
        ];
        for part in &parts {
            lazy_or(&mut target, part);
        }
        repair(&mut target);

        let mut expected = Container::new();
        for part in &parts {
            expected.or_inplace(part);
        }
        assert_eq!(target, expected);
        assert_eq!(target.cardinality() as usize, target.iter().count());
    }

    #[test]
    fn small_unions_stay_arrays() {
        let mut target: Container = [1u16, 2, 3].into_iter().collect();
        lazy_or(&mut target, &[4u16, 5].into_iter().collect());
        repair(&mut target);
        assert_eq!(target.kind(), ContainerKind::Array);
        assert_eq!(target.cardinality(), 5);
    }
}
