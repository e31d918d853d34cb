use crate::models::{SlotEntry, TitleId};

/// Maximum number of recommendations a user may attach to one title
pub const SLOT_CAPACITY: usize = 3;

/// Why an entry could not be inserted into a [`SlotSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotInsertError {
    /// The title already occupies a slot
    Duplicate,
    /// All slots are occupied
    Full,
}

/// Fixed-capacity ordered container of recommendation slots.
///
/// Occupied slots are always left-packed (no gaps) and hold pairwise
/// distinct titles. Both invariants are enforced here rather than at call
/// sites: `insert` refuses duplicates and fills the first free slot,
/// `without` produces the compacted remainder for a removal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotSet {
    slots: [Option<SlotEntry>; SLOT_CAPACITY],
}

impl SlotSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from entries in order, filling from slot 0.
    ///
    /// Entries beyond capacity are ignored; stores never produce them.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = SlotEntry>,
    {
        let mut set = Self::new();
        for entry in entries.into_iter().take(SLOT_CAPACITY) {
            let index = set.first_free_index().unwrap_or(SLOT_CAPACITY - 1);
            set.slots[index] = Some(entry);
        }
        set
    }

    /// Rebuilds a set from the stored column pairs, skipping empty columns
    /// so the result is left-packed even if the row is not.
    pub fn from_columns(columns: [(Option<String>, Option<String>); SLOT_CAPACITY]) -> Self {
        Self::from_entries(columns.into_iter().filter_map(|(id, note)| {
            id.map(|id| SlotEntry {
                title: TitleId::unchecked(id),
                note,
            })
        }))
    }

    /// Occupied entries in slot order
    pub fn occupied(&self) -> impl Iterator<Item = &SlotEntry> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.occupied().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == SLOT_CAPACITY
    }

    /// The entry in slot 0, if any
    pub fn first(&self) -> Option<&SlotEntry> {
        self.slots[0].as_ref()
    }

    pub fn get(&self, index: usize) -> Option<&SlotEntry> {
        self.slots.get(index).and_then(|slot| slot.as_ref())
    }

    pub fn contains(&self, title: &TitleId) -> bool {
        self.occupied().any(|entry| &entry.title == title)
    }

    /// Index of the first unoccupied slot, or `None` when full
    pub fn first_free_index(&self) -> Option<usize> {
        self.slots.iter().position(|slot| slot.is_none())
    }

    /// Writes `entry` into the first free slot and returns its index.
    pub fn insert(&mut self, entry: SlotEntry) -> Result<usize, SlotInsertError> {
        if self.contains(&entry.title) {
            return Err(SlotInsertError::Duplicate);
        }
        let index = self.first_free_index().ok_or(SlotInsertError::Full)?;
        self.slots[index] = Some(entry);
        Ok(index)
    }

    /// The occupied entries with `title` removed, relative order preserved.
    ///
    /// Pure compaction: the caller persists the result in one write. When the
    /// returned length equals `len()`, the title was not present.
    pub fn without(&self, title: &TitleId) -> Vec<SlotEntry> {
        self.occupied()
            .filter(|entry| &entry.title != title)
            .cloned()
            .collect()
    }

    /// Overwrites one slot directly; the caller is responsible for keeping
    /// the set left-packed.
    pub(crate) fn set_at(&mut self, index: usize, entry: SlotEntry) {
        if index < SLOT_CAPACITY {
            self.slots[index] = Some(entry);
        }
    }

    /// True when no occupied slot follows a free one
    pub fn is_left_packed(&self) -> bool {
        let mut seen_free = false;
        for slot in &self.slots {
            match slot {
                None => seen_free = true,
                Some(_) if seen_free => return false,
                Some(_) => {}
            }
        }
        true
    }

    /// Column pairs in slot order, for stores that persist discrete columns
    pub fn as_columns(&self) -> [(Option<String>, Option<String>); SLOT_CAPACITY] {
        let mut columns: [(Option<String>, Option<String>); SLOT_CAPACITY] = Default::default();
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(entry) = slot {
                columns[index] = (Some(entry.title.to_string()), entry.note.clone());
            }
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str) -> SlotEntry {
        SlotEntry {
            title: TitleId::new(title).unwrap(),
            note: None,
        }
    }

    #[test]
    fn test_insert_fills_first_free_slot() {
        let mut set = SlotSet::new();
        assert_eq!(set.first_free_index(), Some(0));
        assert_eq!(set.insert(entry("tt1")).unwrap(), 0);
        assert_eq!(set.insert(entry("tt2")).unwrap(), 1);
        assert_eq!(set.insert(entry("tt3")).unwrap(), 2);
        assert!(set.is_full());
        assert_eq!(set.first_free_index(), None);
    }

    #[test]
    fn test_insert_rejects_duplicate() {
        let mut set = SlotSet::new();
        set.insert(entry("tt1")).unwrap();
        assert_eq!(set.insert(entry("tt1")), Err(SlotInsertError::Duplicate));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_insert_rejects_when_full() {
        let mut set = SlotSet::from_entries([entry("tt1"), entry("tt2"), entry("tt3")]);
        assert_eq!(set.insert(entry("tt4")), Err(SlotInsertError::Full));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_without_preserves_relative_order() {
        let set = SlotSet::from_entries([entry("tt1"), entry("tt2"), entry("tt3")]);
        let remaining = set.without(&TitleId::new("tt2").unwrap());
        let titles: Vec<&str> = remaining.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["tt1", "tt3"]);
    }

    #[test]
    fn test_without_missing_title_returns_same_length() {
        let set = SlotSet::from_entries([entry("tt1"), entry("tt2")]);
        let remaining = set.without(&TitleId::new("tt9").unwrap());
        assert_eq!(remaining.len(), set.len());
    }

    #[test]
    fn test_from_columns_compacts_gaps() {
        let set = SlotSet::from_columns([
            (None, None),
            (Some("tt2".to_string()), Some("great pairing".to_string())),
            (Some("tt3".to_string()), None),
        ]);
        assert!(set.is_left_packed());
        assert_eq!(set.len(), 2);
        assert_eq!(set.first().unwrap().title.as_str(), "tt2");
        assert_eq!(
            set.first().unwrap().note.as_deref(),
            Some("great pairing")
        );
    }

    #[test]
    fn test_left_packing_holds_after_insert_and_without() {
        let mut set = SlotSet::new();
        for id in ["tt1", "tt2", "tt3"] {
            set.insert(entry(id)).unwrap();
            assert!(set.is_left_packed());
        }
        let remaining = set.without(&TitleId::new("tt1").unwrap());
        let compacted = SlotSet::from_entries(remaining);
        assert!(compacted.is_left_packed());
        assert_eq!(compacted.first().unwrap().title.as_str(), "tt2");
    }

    #[test]
    fn test_as_columns_round_trip() {
        let set = SlotSet::from_entries([entry("tt1"), entry("tt2")]);
        let rebuilt = SlotSet::from_columns(set.as_columns());
        assert_eq!(rebuilt, set);
    }
}
