//! Brute-force pairwise collision detection.
//!
//! Every ordered pair of distinct entities is tested, so an overlapping pair
//! produces two reactions per frame: one for each side. Reactions run in
//! traversal order and read the neighbor's tag as it is at that moment, which
//! includes flips made earlier in the same pass.

use crate::behavior::Behavior;
use crate::debug::DebugOverlay;
use crate::entity::Tag;
use crate::registry::EntityRegistry;
use actorloop_common::EntityId;

/// A positive box test for the ordered pair (`entity`, `other`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub entity: EntityId,
    pub other: EntityId,
    /// Whether `entity`'s collision reaction ran.
    pub reacted: bool,
    pub tag_before: Tag,
    pub tag_after: Tag,
}

impl Contact {
    pub fn flipped(&self) -> bool {
        self.tag_before != self.tag_after
    }
}

impl EntityRegistry {
    /// Test all ordered pairs and run collision reactions. Clears `overlay`
    /// first; reactions refill it for this frame.
    ///
    /// Bounding volumes must be current; see
    /// [`EntityRegistry::update_bounding_volumes`].
    pub fn detect_collisions(&mut self, overlay: &mut DebugOverlay) -> Vec<Contact> {
        overlay.clear();
        let mut contacts = Vec::new();
        let count = self.entities.len();

        for i in 0..count {
            for j in 0..count {
                let other = self.entities[j].neighbor();
                let entity = &mut self.entities[i];
                if entity.id() == other.id {
                    continue;
                }
                if !entity.bounds().intersects(&other.bounds) {
                    continue;
                }

                let (behavior, state, bounds) = entity.collision_parts();
                let tag_before = state.tag;
                let reacted = behavior.reacts_to_collisions();
                if reacted {
                    behavior.on_collision(state, bounds, &other, overlay);
                }
                let contact = Contact {
                    entity: entity.id(),
                    other: other.id,
                    reacted,
                    tag_before,
                    tag_after: entity.tag(),
                };
                tracing::trace!(
                    entity = %contact.entity,
                    other = %contact.other,
                    reacted,
                    "contact {} -> {}",
                    contact.tag_before,
                    contact.tag_after
                );
                contacts.push(contact);
            }
        }
        contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{BehaviorKind, Oscillator};
    use actorloop_assets::{AssetStore, BUILTIN_CUBE};
    use glam::Vec3;

    fn build(assets: &mut AssetStore, spawns: &[(f32, BehaviorKind)]) -> EntityRegistry {
        let mut reg = EntityRegistry::new();
        for &(x, behavior) in spawns {
            let handle = assets.load(BUILTIN_CUBE).unwrap();
            reg.insert_end(assets, handle, Vec3::new(x, 0.0, 0.0), behavior)
                .unwrap();
        }
        reg.update_bounding_volumes(assets).unwrap();
        reg
    }

    fn osc() -> BehaviorKind {
        BehaviorKind::Oscillator(Oscillator::default())
    }

    #[test]
    fn separated_entities_do_not_collide() {
        let mut assets = AssetStore::new();
        let mut reg = build(&mut assets, &[(0.0, osc()), (2.0, osc()), (-2.0, osc())]);
        let mut overlay = DebugOverlay::default();
        assert!(reg.detect_collisions(&mut overlay).is_empty());
        assert!(overlay.is_empty());
        reg.destroy(&mut assets).unwrap();
    }

    #[test]
    fn overlap_fires_both_orderings_once() {
        let mut assets = AssetStore::new();
        let mut reg = build(
            &mut assets,
            &[(0.0, osc()), (5.0, osc()), (0.8, osc())],
        );
        let mut overlay = DebugOverlay::default();
        let contacts = reg.detect_collisions(&mut overlay);

        let pairs: Vec<(EntityId, EntityId)> =
            contacts.iter().map(|c| (c.entity, c.other)).collect();
        assert_eq!(
            pairs,
            vec![(EntityId(0), EntityId(2)), (EntityId(2), EntityId(0))]
        );
        assert!(contacts.iter().all(|c| c.reacted));
        reg.destroy(&mut assets).unwrap();
    }

    #[test]
    fn symmetry_does_not_depend_on_insertion_order() {
        for order in [[0.0, 0.7], [0.7, 0.0]] {
            let mut assets = AssetStore::new();
            let mut reg = build(&mut assets, &[(order[0], osc()), (order[1], osc())]);
            let contacts = reg.detect_collisions(&mut DebugOverlay::default());
            assert_eq!(contacts.len(), 2);
            let a_side = contacts.iter().filter(|c| c.entity == EntityId(0)).count();
            let b_side = contacts.iter().filter(|c| c.entity == EntityId(1)).count();
            assert_eq!((a_side, b_side), (1, 1));
            reg.destroy(&mut assets).unwrap();
        }
    }

    #[test]
    fn never_reports_self_contact() {
        let mut assets = AssetStore::new();
        // Identical positions: every box overlaps every other box.
        let mut reg = build(&mut assets, &[(1.0, osc()), (1.0, osc()), (1.0, osc())]);
        let contacts = reg.detect_collisions(&mut DebugOverlay::default());
        assert_eq!(contacts.len(), 6);
        assert!(contacts.iter().all(|c| c.entity != c.other));
        reg.destroy(&mut assets).unwrap();
    }

    #[test]
    fn stationary_is_hit_but_does_not_react() {
        let mut assets = AssetStore::new();
        let mut reg = build(
            &mut assets,
            &[(0.0, BehaviorKind::Stationary), (0.2, osc())],
        );
        let contacts = reg.detect_collisions(&mut DebugOverlay::default());
        assert_eq!(contacts.len(), 2);
        let stationary = contacts.iter().find(|c| c.entity == EntityId(0)).unwrap();
        assert!(!stationary.reacted);
        let mover = contacts.iter().find(|c| c.entity == EntityId(1)).unwrap();
        assert!(mover.reacted);
        reg.destroy(&mut assets).unwrap();
    }

    #[test]
    fn reactions_see_earlier_flips_in_the_same_pass() {
        let mut assets = AssetStore::new();
        // Both spawn Backward (x >= 0) and sit closer than contact distance.
        let mut reg = build(&mut assets, &[(0.0, osc()), (0.25, osc())]);
        let contacts = reg.detect_collisions(&mut DebugOverlay::default());

        // First: 0 sees 1 as B and flips B -> F.
        assert_eq!(contacts[0].entity, EntityId(0));
        assert_eq!((contacts[0].tag_before, contacts[0].tag_after), (Tag::Backward, Tag::Forward));
        // Then: 1 sees 0 already F; B next to F keeps B.
        assert_eq!(contacts[1].entity, EntityId(1));
        assert!(!contacts[1].flipped());
        assert_eq!(reg.get(EntityId(0)).unwrap().tag(), Tag::Forward);
        assert_eq!(reg.get(EntityId(1)).unwrap().tag(), Tag::Backward);
        reg.destroy(&mut assets).unwrap();
    }

    #[test]
    fn distant_overlap_fills_overlay_and_pass_clears_it() {
        let mut assets = AssetStore::new();
        let mut reg = build(&mut assets, &[(0.0, osc()), (0.9, osc())]);
        let mut overlay = DebugOverlay::default();
        reg.detect_collisions(&mut overlay);
        // Two reactions, each a wire box plus a sphere.
        assert_eq!(overlay.len(), 4);

        reg.detect_collisions(&mut overlay);
        assert_eq!(overlay.len(), 4);
        reg.destroy(&mut assets).unwrap();
    }
}
