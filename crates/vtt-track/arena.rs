//! Generation-checked cue storage.
//!
//! The event index and the run chains both refer to cues; neither owns
//! them. Cues live in this arena and are addressed by [`CueHandle`], an
//! index plus a generation counter, so a stale handle left behind by a
//! concurrent eviction resolves to `None` instead of aliasing a recycled
//! slot. A slot is freed only once the cue is out of *both* the index and
//! its run chain.

use std::sync::Arc;

use vtt_core::cue::{Cue, RunId};

/// Stable, copyable reference to a cue in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CueHandle {
    index: u32,
    generation: u32,
}

/// Arena-resident cue plus engine bookkeeping
#[derive(Debug)]
pub(crate) struct CueEntry {
    /// The parsed cue record, shared with renderer snapshots
    pub cue: Arc<Cue>,
    /// Decoder-assigned batch id
    pub run_id: RunId,
    /// Next cue in the same run's chain
    pub next_in_run: Option<CueHandle>,
    /// Cue has events in the index
    pub in_index: bool,
    /// Cue is linked into a run chain
    pub in_run_chain: bool,
    /// Most recent inner-time event fired for this cue
    pub last_inner_time_ms: Option<i64>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<CueEntry>,
}

/// Slab-style arena with generation-checked handles
#[derive(Debug, Default)]
pub(crate) struct CueArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl CueArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live cues
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Store a cue and return its handle
    pub fn insert(&mut self, cue: Arc<Cue>, run_id: RunId) -> CueHandle {
        let entry = CueEntry {
            cue,
            run_id,
            next_in_run: None,
            in_index: false,
            in_run_chain: false,
            last_inner_time_ms: None,
        };
        self.len += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return CueHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        CueHandle {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, handle: CueHandle) -> Option<&CueEntry> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    pub fn get_mut(&mut self, handle: CueHandle) -> Option<&mut CueEntry> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    /// Mark the cue as removed from the event index; frees the slot when it
    /// is no longer referenced from a run chain either
    pub fn release_from_index(&mut self, handle: CueHandle) {
        if let Some(entry) = self.get_mut(handle) {
            entry.in_index = false;
            if !entry.in_run_chain {
                self.free_slot(handle);
            }
        }
    }

    /// Unlink the cue from its run chain; frees the slot when it is no
    /// longer in the event index either
    pub fn release_from_run(&mut self, handle: CueHandle) {
        if let Some(entry) = self.get_mut(handle) {
            entry.in_run_chain = false;
            entry.next_in_run = None;
            if !entry.in_index {
                self.free_slot(handle);
            }
        }
    }

    /// Drop everything, invalidating all outstanding handles
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.entry.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.len = 0;
    }

    fn free_slot(&mut self, handle: CueHandle) {
        let slot = &mut self.slots[handle.index as usize];
        debug_assert_eq!(slot.generation, handle.generation);
        if slot.entry.take().is_some() {
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(handle.index);
            self.len -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vtt_core::cue::{CueKind, CueSettings};

    fn cue(start_ms: i64, end_ms: i64) -> Arc<Cue> {
        Arc::new(Cue {
            id: None,
            start_ms,
            end_ms,
            settings: CueSettings::default(),
            text: String::new(),
            kind: CueKind::Simple,
        })
    }

    #[test]
    fn freed_only_when_out_of_both_structures() {
        let mut arena = CueArena::new();
        let handle = arena.insert(cue(0, 10), RunId(5));
        {
            let entry = arena.get_mut(handle).unwrap();
            entry.in_index = true;
            entry.in_run_chain = true;
        }

        arena.release_from_index(handle);
        assert!(arena.get(handle).is_some(), "still chained to its run");

        arena.release_from_run(handle);
        assert!(arena.get(handle).is_none());
        assert!(arena.is_empty());
    }

    #[test]
    fn stale_handles_do_not_alias_recycled_slots() {
        let mut arena = CueArena::new();
        let first = arena.insert(cue(0, 10), RunId::EPHEMERAL);
        arena.get_mut(first).unwrap().in_index = true;
        arena.release_from_index(first);

        let second = arena.insert(cue(20, 30), RunId::EPHEMERAL);
        assert_eq!(
            first.index, second.index,
            "slot should be recycled for this test to mean anything"
        );
        assert!(arena.get(first).is_none());
        assert_eq!(arena.get(second).unwrap().cue.start_ms, 20);
    }

    #[test]
    fn clear_invalidates_everything() {
        let mut arena = CueArena::new();
        let a = arena.insert(cue(0, 10), RunId(1));
        let b = arena.insert(cue(5, 15), RunId(2));
        arena.clear();
        assert!(arena.get(a).is_none());
        assert!(arena.get(b).is_none());
        assert!(arena.is_empty());
    }
}
