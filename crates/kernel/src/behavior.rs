//! Behavior hooks: spawn, tick and collision reaction.
//!
//! Behaviors are chosen per entity at creation and never change afterwards.
//! A hook only ever receives the state of its own entity mutably; neighbors
//! are visible through a read-only [`Neighbor`] view.

use crate::debug::DebugOverlay;
use crate::entity::{EntityState, Neighbor, Tag};
use actorloop_common::{Aabb, Color};
use serde::{Deserialize, Serialize};

/// Per-entity policy.
pub trait Behavior {
    /// Runs once, when the entity is created.
    fn on_spawn(&self, _state: &mut EntityState) {}

    /// Runs once per frame during the render traversal.
    fn on_tick(&self, _state: &mut EntityState) {}

    /// Runs for every other entity whose box overlaps this one this frame.
    /// `bounds` is this entity's current world-space box.
    fn on_collision(
        &self,
        _state: &mut EntityState,
        _bounds: &Aabb,
        _other: &Neighbor,
        _overlay: &mut DebugOverlay,
    ) {
    }

    /// Whether `on_collision` should be invoked at all.
    fn reacts_to_collisions(&self) -> bool {
        false
    }
}

/// The closed set of behaviors an entity can be created with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BehaviorKind {
    /// Patrols back and forth along X and negotiates direction on contact.
    Oscillator(Oscillator),
    /// Never moves and ignores contacts. Other entities still collide with it.
    Stationary,
}

impl Default for BehaviorKind {
    fn default() -> Self {
        Self::Oscillator(Oscillator::default())
    }
}

impl Behavior for BehaviorKind {
    fn on_spawn(&self, state: &mut EntityState) {
        match self {
            Self::Oscillator(o) => o.on_spawn(state),
            Self::Stationary => {}
        }
    }

    fn on_tick(&self, state: &mut EntityState) {
        match self {
            Self::Oscillator(o) => o.on_tick(state),
            Self::Stationary => {}
        }
    }

    fn on_collision(
        &self,
        state: &mut EntityState,
        bounds: &Aabb,
        other: &Neighbor,
        overlay: &mut DebugOverlay,
    ) {
        match self {
            Self::Oscillator(o) => o.on_collision(state, bounds, other, overlay),
            Self::Stationary => {}
        }
    }

    fn reacts_to_collisions(&self) -> bool {
        match self {
            Self::Oscillator(o) => o.reacts_to_collisions(),
            Self::Stationary => false,
        }
    }
}

/// Radius of the purple contact marker.
const MARKER_RADIUS: f32 = 0.5;
/// Where the contact marker sits between the two entities, from this one.
const MARKER_LERP: f32 = 0.1;

/// Bounded patrol along the X axis.
///
/// The tag is the direction: `Forward` moves toward +X, anything else toward
/// -X. Crossing `bound` on either side turns the entity around.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Oscillator {
    /// Turnaround distance from the origin on X.
    pub bound: f32,
    /// Distance moved per frame.
    pub speed: f32,
    /// Centres closer than this count as touching; farther overlaps only
    /// produce debug markers.
    pub contact_distance: f32,
}

impl Default for Oscillator {
    fn default() -> Self {
        Self {
            bound: 3.0,
            speed: 0.025,
            contact_distance: 0.5,
        }
    }
}

impl Behavior for Oscillator {
    fn on_spawn(&self, state: &mut EntityState) {
        let p = state.position;
        tracing::info!("spawned actor at ({:.3}, {:.3}, {:.3})", p.x, p.y, p.z);
        state.tag = if p.x < 0.0 { Tag::Forward } else { Tag::Backward };
    }

    fn on_tick(&self, state: &mut EntityState) {
        if state.position.x < -self.bound {
            state.tag = Tag::Forward;
        } else if state.position.x > self.bound {
            state.tag = Tag::Backward;
        }
        state.position.x += if state.tag == Tag::Forward {
            self.speed
        } else {
            -self.speed
        };
    }

    fn on_collision(
        &self,
        state: &mut EntityState,
        bounds: &Aabb,
        other: &Neighbor,
        overlay: &mut DebugOverlay,
    ) {
        if state.position.distance(other.position) >= self.contact_distance {
            overlay.wire_box(*bounds, Color::RED);
            overlay.wire_sphere(
                state.position.lerp(other.position, MARKER_LERP),
                MARKER_RADIUS,
                Color::PURPLE,
            );
            return;
        }
        match (state.tag, other.tag) {
            (Tag::Forward, Tag::Backward) => state.tag = Tag::Backward,
            (Tag::Backward, Tag::Backward) => state.tag = Tag::Forward,
            _ => {}
        }
    }

    fn reacts_to_collisions(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::DebugPrimitive;
    use actorloop_common::EntityId;
    use glam::Vec3;

    fn state(x: f32, tag: Tag) -> EntityState {
        EntityState {
            position: Vec3::new(x, 0.0, 0.0),
            tag,
        }
    }

    fn neighbor(x: f32, tag: Tag) -> Neighbor {
        let position = Vec3::new(x, 0.0, 0.0);
        Neighbor {
            id: EntityId(99),
            position,
            tag,
            bounds: Aabb::new(position - 0.5, position + 0.5),
        }
    }

    fn unit_at(x: f32) -> Aabb {
        Aabb::new(Vec3::new(x - 0.5, -0.5, -0.5), Vec3::new(x + 0.5, 0.5, 0.5))
    }

    #[test]
    fn spawn_picks_side_from_sign_of_x() {
        let osc = Oscillator::default();
        for (x, expected) in [
            (0.0, Tag::Backward),
            (2.0, Tag::Backward),
            (-2.0, Tag::Forward),
            (-0.001, Tag::Forward),
        ] {
            let mut s = state(x, Tag::Unset);
            osc.on_spawn(&mut s);
            assert_eq!(s.tag, expected, "x = {x}");
        }
    }

    #[test]
    fn tick_moves_by_speed_in_tag_direction() {
        let osc = Oscillator::default();
        let mut fwd = state(0.0, Tag::Forward);
        osc.on_tick(&mut fwd);
        assert_eq!(fwd.position.x, 0.025);

        let mut back = state(0.0, Tag::Backward);
        osc.on_tick(&mut back);
        assert_eq!(back.position.x, -0.025);
    }

    #[test]
    fn tick_turns_around_past_bounds() {
        let osc = Oscillator::default();
        let mut s = state(3.01, Tag::Forward);
        osc.on_tick(&mut s);
        assert_eq!(s.tag, Tag::Backward);
        assert!(s.position.x < 3.01);

        let mut s = state(-3.01, Tag::Backward);
        osc.on_tick(&mut s);
        assert_eq!(s.tag, Tag::Forward);
        assert!(s.position.x > -3.01);
    }

    #[test]
    fn tick_at_exact_bound_keeps_direction() {
        let osc = Oscillator::default();
        let mut s = state(3.0, Tag::Forward);
        osc.on_tick(&mut s);
        assert_eq!(s.tag, Tag::Forward);
    }

    #[test]
    fn close_contact_forward_meets_backward() {
        let osc = Oscillator::default();
        let mut overlay = DebugOverlay::default();
        let mut s = state(0.0, Tag::Forward);
        osc.on_collision(&mut s, &unit_at(0.0), &neighbor(0.2, Tag::Backward), &mut overlay);
        assert_eq!(s.tag, Tag::Backward);
        assert!(overlay.is_empty());
    }

    #[test]
    fn close_contact_two_backward_flips_to_forward() {
        let osc = Oscillator::default();
        let mut overlay = DebugOverlay::default();
        let mut s = state(0.0, Tag::Backward);
        osc.on_collision(&mut s, &unit_at(0.0), &neighbor(0.3, Tag::Backward), &mut overlay);
        assert_eq!(s.tag, Tag::Forward);
    }

    #[test]
    fn close_contact_other_combinations_keep_tag() {
        let osc = Oscillator::default();
        let mut overlay = DebugOverlay::default();
        for (mine, theirs) in [
            (Tag::Forward, Tag::Forward),
            (Tag::Backward, Tag::Forward),
            (Tag::Unset, Tag::Backward),
            (Tag::Forward, Tag::Unset),
        ] {
            let mut s = state(0.0, mine);
            osc.on_collision(&mut s, &unit_at(0.0), &neighbor(0.1, theirs), &mut overlay);
            assert_eq!(s.tag, mine);
        }
    }

    #[test]
    fn distant_overlap_only_requests_markers() {
        let osc = Oscillator::default();
        let mut overlay = DebugOverlay::default();
        let mut s = state(0.0, Tag::Backward);
        let own = unit_at(0.0);
        osc.on_collision(&mut s, &own, &neighbor(1.0, Tag::Backward), &mut overlay);

        assert_eq!(s.tag, Tag::Backward);
        let prims: Vec<_> = overlay.iter().copied().collect();
        assert_eq!(
            prims,
            vec![
                DebugPrimitive::WireBox {
                    bounds: own,
                    color: Color::RED
                },
                DebugPrimitive::WireSphere {
                    center: Vec3::new(0.1, 0.0, 0.0),
                    radius: 0.5,
                    color: Color::PURPLE
                },
            ]
        );
    }

    #[test]
    fn contact_distance_boundary_is_distant() {
        let osc = Oscillator::default();
        let mut overlay = DebugOverlay::default();
        let mut s = state(0.0, Tag::Forward);
        osc.on_collision(&mut s, &unit_at(0.0), &neighbor(0.5, Tag::Backward), &mut overlay);
        assert_eq!(s.tag, Tag::Forward);
        assert_eq!(overlay.len(), 2);
    }

    #[test]
    fn stationary_does_nothing() {
        let b = BehaviorKind::Stationary;
        let mut s = state(1.0, Tag::Unset);
        b.on_spawn(&mut s);
        b.on_tick(&mut s);
        assert_eq!(s, state(1.0, Tag::Unset));
        assert!(!b.reacts_to_collisions());
    }

    #[test]
    fn behavior_kind_parses_with_defaults() {
        let b: BehaviorKind = serde_json::from_str(r#"{"kind":"oscillator","speed":0.5}"#).unwrap();
        assert_eq!(
            b,
            BehaviorKind::Oscillator(Oscillator {
                speed: 0.5,
                ..Oscillator::default()
            })
        );
        let s: BehaviorKind = serde_json::from_str(r#"{"kind":"stationary"}"#).unwrap();
        assert_eq!(s, BehaviorKind::Stationary);
    }
}
