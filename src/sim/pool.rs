//! Fixed-capacity arena with free-list reuse and generation-checked handles
//!
//! Projectiles and particles churn every frame. Slots are recycled in place;
//! a slot is fully reset before it is handed out again and again when it is
//! returned, so nothing from a previous lease survives. Stale handles (kept
//! by homing projectiles or boss tasks) fail the generation check instead of
//! aliasing whatever now occupies the slot.

use serde::{Deserialize, Serialize};

/// Types that can be reinitialised in place
pub trait Recycle {
    /// Restore every field to its freshly constructed state.
    /// Allocations (e.g. hit lists) may keep their capacity.
    fn reset(&mut self);
}

/// Generation-checked index into a [`Pool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Slot<T> {
    generation: u32,
    live: bool,
    value: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    /// Free slot indices, popped from the back
    free: Vec<u32>,
    capacity: usize,
    /// Number of times the pool had to grow past its capacity
    overflow: u32,
}

impl<T: Recycle + Default> Default for Pool<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<T: Recycle + Default> Pool<T> {
    /// Pre-allocate `capacity` free slots
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot {
                generation: 0,
                live: false,
                value: T::default(),
            })
            .collect();
        // Reverse so index 0 is handed out first
        let free = (0..capacity as u32).rev().collect();
        Self {
            slots,
            free,
            capacity,
            overflow: 0,
        }
    }

    /// Lease a slot, reset it, then let `init` fill it in.
    ///
    /// Never fails: an exhausted pool grows by one fresh slot.
    pub fn acquire(&mut self, init: impl FnOnce(&mut T)) -> Handle {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.overflow += 1;
                log::debug!(
                    "pool exhausted at {} live slots (capacity {}), growing",
                    self.slots.len(),
                    self.capacity
                );
                self.slots.push(Slot {
                    generation: 0,
                    live: false,
                    value: T::default(),
                });
                (self.slots.len() - 1) as u32
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.value.reset();
        init(&mut slot.value);
        slot.live = true;
        Handle {
            index,
            generation: slot.generation,
        }
    }

    /// Return a slot to the free list. Stale or double releases are ignored.
    pub fn release(&mut self, handle: Handle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            return false;
        };
        if !slot.live || slot.generation != handle.generation {
            return false;
        }
        slot.live = false;
        slot.generation = slot.generation.wrapping_add(1);
        slot.value.reset();
        self.free.push(handle.index);
        true
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.live && s.generation == handle.generation)
            .map(|s| &s.value)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.live && s.generation == handle.generation)
            .map(|s| &mut s.value)
    }

    pub fn is_live(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Snapshot of live handles in slot order. Iterate this when the loop
    /// body may release or acquire slots.
    pub fn handles(&self) -> Vec<Handle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.live)
            .map(|(i, s)| Handle {
                index: i as u32,
                generation: s.generation,
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter(|s| s.live).map(|s| &s.value)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots
            .iter_mut()
            .filter(|s| s.live)
            .map(|s| &mut s.value)
    }

    /// Release every live slot for which `keep` returns false
    pub fn retain(&mut self, mut keep: impl FnMut(&mut T) -> bool) {
        for handle in self.handles() {
            let drop_it = self.get_mut(handle).is_some_and(|v| !keep(v));
            if drop_it {
                self.release(handle);
            }
        }
    }

    pub fn clear(&mut self) {
        for handle in self.handles() {
            self.release(handle);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.live).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn overflow_count(&self) -> u32 {
        self.overflow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Shot {
        damage: f32,
        hits: Vec<u32>,
    }

    impl Recycle for Shot {
        fn reset(&mut self) {
            self.damage = 0.0;
            self.hits.clear();
        }
    }

    #[test]
    fn test_acquire_fully_resets_previous_lease() {
        let mut pool: Pool<Shot> = Pool::with_capacity(1);
        let a = pool.acquire(|s| {
            s.damage = 5.0;
            s.hits.push(42);
        });
        assert!(pool.release(a));

        let b = pool.acquire(|_| {});
        let shot = pool.get(b).unwrap();
        assert_eq!(shot.damage, 0.0);
        assert!(shot.hits.is_empty());
        assert_eq!(a.index(), b.index());
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let mut pool: Pool<Shot> = Pool::with_capacity(2);
        let a = pool.acquire(|s| s.damage = 1.0);
        pool.release(a);
        let _b = pool.acquire(|s| s.damage = 2.0);

        assert!(pool.get(a).is_none());
        assert!(!pool.release(a));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_exhaustion_grows_instead_of_failing() {
        let mut pool: Pool<Shot> = Pool::with_capacity(2);
        let handles: Vec<_> = (0..5).map(|i| pool.acquire(|s| s.damage = i as f32)).collect();
        assert_eq!(pool.len(), 5);
        assert_eq!(pool.overflow_count(), 3);
        assert_eq!(pool.capacity(), 2);
        assert!(handles.iter().all(|h| pool.is_live(*h)));
    }

    #[test]
    fn test_retain_tolerates_removal_during_iteration() {
        let mut pool: Pool<Shot> = Pool::with_capacity(4);
        for i in 0..4 {
            pool.acquire(|s| s.damage = i as f32);
        }
        pool.retain(|s| s.damage as u32 % 2 == 0);
        let mut left: Vec<f32> = pool.iter().map(|s| s.damage).collect();
        left.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(left, vec![0.0, 2.0]);
    }

    #[test]
    fn test_release_clears_references() {
        let mut pool: Pool<Shot> = Pool::with_capacity(1);
        let a = pool.acquire(|s| s.hits.extend([1, 2, 3]));
        pool.release(a);
        // Reach into the freed slot through a fresh lease without init
        let b = pool.acquire(|_| {});
        assert!(pool.get(b).unwrap().hits.is_empty());
    }
}
