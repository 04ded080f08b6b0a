use std::fmt::{Debug, Error, Formatter};
use std::result::Result;
use std::slice::Iter;

/// Elements with a width (eg. when used in an `OffsetVec`)
pub trait Width {
    fn width(&self) -> usize;
}

/// A vector of elements of different logical "widths", where offsets into the vector are given in
/// terms of the sum of the widths of the previous elements (as opposed to the number of preceding
/// elements).
///
/// The constant pool is the motivating example: indexing starts at 1 and `long`/`double` entries
/// take up two slots, so the offset of an entry is not the same as its position.
#[derive(Clone)]
pub struct OffsetVec<T: Sized> {
    /// Entries, along with their offset
    entries: Vec<(Offset, T)>,

    /// Offset of the next element to be added
    offset_len: Offset,
}

/// Offset into an `OffsetVec`
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Offset(pub usize);

impl<T: Sized + Width> OffsetVec<T> {
    /// New empty offset vector, with a custom starting offset
    pub fn new_starting_at(initial_offset: Offset) -> OffsetVec<T> {
        OffsetVec {
            entries: vec![],
            offset_len: initial_offset,
        }
    }

    /// Length of the `OffsetVec` (aka. number of entries)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current offset size of the `OffsetVec` (aka. offset of the next element to be added)
    pub fn offset_len(&self) -> Offset {
        self.offset_len
    }

    /// Add an entry to the back
    pub fn push(&mut self, slot: T) -> Offset {
        let offset = self.offset_len;
        self.offset_len.0 += slot.width();
        self.entries.push((offset, slot));
        offset
    }

    /// Get an entry by its offset in the vector
    ///
    /// Note: this uses binary search to find the offset, and offsets falling in the middle of a
    /// wide entry are rejected.
    pub fn get_offset(&self, offset: Offset) -> Option<&T> {
        self.entries
            .binary_search_by_key(&offset, |(off, _)| *off)
            .ok()
            .map(|found_idx| &self.entries[found_idx].1)
    }

    /// Get a mutable entry by its offset in the vector
    pub fn get_offset_mut(&mut self, offset: Offset) -> Option<&mut T> {
        match self.entries.binary_search_by_key(&offset, |(off, _)| *off) {
            Ok(found_idx) => Some(&mut self.entries[found_idx].1),
            Err(_) => None,
        }
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Offset, &T)> + '_ {
        OffsetVecIter(self.entries.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Offset, &mut T)> + '_ {
        self.entries.iter_mut().map(|(off, elem)| (*off, elem))
    }
}

struct OffsetVecIter<'a, T>(Iter<'a, (Offset, T)>);

impl<'a, T> Iterator for OffsetVecIter<'a, T> {
    type Item = (Offset, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(off, elem)| (*off, elem))
    }
}

impl<'a, T> DoubleEndedIterator for OffsetVecIter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|(off, elem)| (*off, elem))
    }
}

impl<A: PartialEq> PartialEq for OffsetVec<A> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<T: Debug> Debug for OffsetVec<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let mut list = f.debug_list();
        for (off, elem) in &self.entries {
            list.entry(&format_args!("#{} = {:?}", off.0, elem));
        }
        list.finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    enum Slot {
        OneWide(u8),
        TwoWide(u8),
    }

    impl Width for Slot {
        fn width(&self) -> usize {
            match self {
                Slot::OneWide(_) => 1,
                Slot::TwoWide(_) => 2,
            }
        }
    }

    #[test]
    fn offsets_skip_over_wide_slots() {
        let mut slots = OffsetVec::new_starting_at(Offset(1));
        assert_eq!(slots.push(Slot::OneWide(1)), Offset(1));
        assert_eq!(slots.push(Slot::TwoWide(2)), Offset(2));
        assert_eq!(slots.push(Slot::OneWide(3)), Offset(4));
        assert_eq!(slots.offset_len(), Offset(5));
        assert_eq!(slots.len(), 3);

        assert_eq!(slots.get_offset(Offset(2)), Some(&Slot::TwoWide(2)));
        assert_eq!(slots.get_offset(Offset(3)), None);
        assert_eq!(slots.get_offset(Offset(0)), None);
        assert_eq!(slots.get_offset(Offset(5)), None);
    }

    #[test]
    fn mutate_in_place() {
        let mut slots = OffsetVec::new_starting_at(Offset(0));
        slots.push(Slot::OneWide(1));
        slots.push(Slot::OneWide(2));
        if let Some(slot) = slots.get_offset_mut(Offset(1)) {
            *slot = Slot::OneWide(7);
        }
        let collected: Vec<_> = slots.iter().map(|(off, slot)| (off.0, *slot)).collect();
        assert_eq!(collected, vec![(0, Slot::OneWide(1)), (1, Slot::OneWide(7))]);
    }
}
