//! Entity storage partitioned by kind
//!
//! Each kind lives in its own append-only `Vec`. Lists only shrink in
//! [`EntityStore::compact`], and new entities only appear in
//! [`EntityStore::merge_pending`], so indices handed out during a tick stay
//! valid until the tick ends.

use super::entity::{Entity, Kind};

/// Stable-for-one-tick reference to a stored entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    pub id: u32,
    pub kind: Kind,
    pub index: u32,
}

#[derive(Debug, Clone)]
pub struct EntityStore {
    lists: [Vec<Entity>; Kind::COUNT],
    /// Spawned this tick, merged between ticks
    pending: Vec<Entity>,
    next_id: u32,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            lists: Default::default(),
            pending: Vec::new(),
            next_id: 1,
        }
    }

    /// Queue an entity for insertion. Assigns and returns a fresh id.
    pub fn add(&mut self, mut entity: Entity) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        entity.id = id;
        self.pending.push(entity);
        id
    }

    /// Move queued entities into their kind lists (in queue order)
    pub fn merge_pending(&mut self) -> usize {
        let count = self.pending.len();
        for entity in self.pending.drain(..) {
            self.lists[entity.kind().index()].push(entity);
        }
        count
    }

    /// Drop every entity with `alive == false`, keeping survivor order.
    /// Returns the number removed.
    pub fn compact(&mut self) -> usize {
        let mut removed = 0;
        for list in &mut self.lists {
            let before = list.len();
            list.retain(|e| e.alive);
            removed += before - list.len();
        }
        removed
    }

    /// Live entities of one kind
    pub fn live(&self, kind: Kind) -> impl Iterator<Item = &Entity> {
        self.lists[kind.index()].iter().filter(|e| e.alive)
    }

    /// All stored entities of one kind, including ones awaiting compaction
    pub fn all(&self, kind: Kind) -> &[Entity] {
        &self.lists[kind.index()]
    }

    pub fn for_each<F: FnMut(&Entity)>(&self, kind: Kind, mut f: F) {
        for entity in self.live(kind) {
            f(entity);
        }
    }

    pub fn for_each_mut<F: FnMut(&mut Entity)>(&mut self, kind: Kind, mut f: F) {
        for entity in self.lists[kind.index()].iter_mut().filter(|e| e.alive) {
            f(entity);
        }
    }

    /// Handles for every live entity of `kind`
    pub fn handles(&self, kind: Kind) -> Vec<Handle> {
        self.lists[kind.index()]
            .iter()
            .enumerate()
            .filter(|(_, e)| e.alive)
            .map(|(i, e)| Handle {
                id: e.id,
                kind,
                index: i as u32,
            })
            .collect()
    }

    pub fn get(&self, handle: Handle) -> Option<&Entity> {
        self.lists[handle.kind.index()]
            .get(handle.index as usize)
            .filter(|e| e.id == handle.id)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut Entity> {
        self.lists[handle.kind.index()]
            .get_mut(handle.index as usize)
            .filter(|e| e.id == handle.id)
    }

    /// Mutable access to two distinct entities at once
    pub fn pair_mut(&mut self, a: Handle, b: Handle) -> Option<(&mut Entity, &mut Entity)> {
        if a.id == b.id {
            return None;
        }
        let (ai, bi) = (a.index as usize, b.index as usize);
        let (ea, eb) = if a.kind == b.kind {
            let list = &mut self.lists[a.kind.index()];
            if ai.max(bi) >= list.len() {
                return None;
            }
            if ai < bi {
                let (lo, hi) = list.split_at_mut(bi);
                (&mut lo[ai], &mut hi[0])
            } else {
                let (lo, hi) = list.split_at_mut(ai);
                (&mut hi[0], &mut lo[bi])
            }
        } else {
            let (ka, kb) = (a.kind.index(), b.kind.index());
            let (la, lb) = if ka < kb {
                let (lo, hi) = self.lists.split_at_mut(kb);
                (&mut lo[ka], &mut hi[0])
            } else {
                let (lo, hi) = self.lists.split_at_mut(ka);
                (&mut hi[0], &mut lo[kb])
            };
            (la.get_mut(ai)?, lb.get_mut(bi)?)
        };
        (ea.id == a.id && eb.id == b.id).then_some((ea, eb))
    }

    /// Find any stored entity by id (linear; used for homing/target lookups)
    pub fn find(&self, id: u32) -> Option<&Entity> {
        self.lists.iter().flat_map(|l| l.iter()).find(|e| e.id == id)
    }

    /// The player ship, if present
    pub fn player(&self) -> Option<&Entity> {
        self.lists[Kind::Player.index()].first()
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        self.lists[Kind::Player.index()].first_mut()
    }

    pub fn live_count(&self, kind: Kind) -> usize {
        self.live(kind).count()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Queued entities of `kind` that have not been merged yet
    pub fn pending(&self, kind: Kind) -> impl Iterator<Item = &Entity> {
        self.pending.iter().filter(move |e| e.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop queued entities of one kind before they are ever merged
    pub fn discard_pending(&mut self, kind: Kind) -> usize {
        let before = self.pending.len();
        self.pending.retain(|e| e.kind() != kind);
        before - self.pending.len()
    }

    /// Remove everything of one kind immediately (level transitions only)
    pub fn clear_kind(&mut self, kind: Kind) {
        self.lists[kind.index()].clear();
        self.discard_pending(kind);
    }
}
