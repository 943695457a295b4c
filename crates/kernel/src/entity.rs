use crate::KernelError;
use crate::behavior::{Behavior, BehaviorKind};
use actorloop_assets::{AssetHandle, AssetId, AssetStore};
use actorloop_common::{Aabb, EntityId};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Behavior state slot. Starts `Unset`; the spawn hook usually picks a side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tag {
    #[default]
    Unset,
    Forward,
    Backward,
}

impl Tag {
    pub fn as_char(self) -> char {
        match self {
            Self::Unset => '-',
            Self::Forward => 'F',
            Self::Backward => 'B',
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// The part of an entity its behavior may mutate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityState {
    pub position: Vec3,
    pub tag: Tag,
}

/// Read-only view of the other party in a collision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: EntityId,
    pub position: Vec3,
    pub tag: Tag,
    pub bounds: Aabb,
}

/// One simulated actor: a renderable asset at a position, with a behavior.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    asset: AssetHandle,
    state: EntityState,
    bounds: Aabb,
    behavior: BehaviorKind,
}

impl Entity {
    /// Build an entity and run its spawn hook once. The hook is not kept.
    pub(crate) fn create(
        id: EntityId,
        assets: &AssetStore,
        asset: AssetHandle,
        position: Vec3,
        behavior: BehaviorKind,
    ) -> Result<Self, KernelError> {
        let bounds = assets.local_bounds(asset.id())?.translated(position);
        let mut entity = Self {
            id,
            asset,
            state: EntityState {
                position,
                tag: Tag::Unset,
            },
            bounds,
            behavior,
        };
        entity.behavior.on_spawn(&mut entity.state);
        Ok(entity)
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn asset_id(&self) -> AssetId {
        self.asset.id()
    }

    pub fn position(&self) -> Vec3 {
        self.state.position
    }

    pub fn tag(&self) -> Tag {
        self.state.tag
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    /// World-space bounding box as of the last refresh.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn behavior(&self) -> &BehaviorKind {
        &self.behavior
    }

    pub fn neighbor(&self) -> Neighbor {
        Neighbor {
            id: self.id,
            position: self.state.position,
            tag: self.state.tag,
            bounds: self.bounds,
        }
    }

    /// Recompute the world-space box from the asset's local bounds.
    pub(crate) fn refresh_bounds(&mut self, assets: &AssetStore) -> Result<(), KernelError> {
        self.bounds = assets
            .local_bounds(self.asset.id())?
            .translated(self.state.position);
        Ok(())
    }

    pub(crate) fn tick(&mut self) {
        self.behavior.on_tick(&mut self.state);
    }

    /// Split borrow used by the collision detector.
    pub(crate) fn collision_parts(
        &mut self,
    ) -> (&BehaviorKind, &mut EntityState, &Aabb) {
        (&self.behavior, &mut self.state, &self.bounds)
    }

    pub(crate) fn into_asset(self) -> AssetHandle {
        self.asset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::Oscillator;
    use actorloop_assets::BUILTIN_CUBE;

    #[test]
    fn create_translates_bounds_and_runs_spawn() {
        let mut assets = AssetStore::new();
        let handle = assets.load(BUILTIN_CUBE).unwrap();
        let e = Entity::create(
            EntityId(0),
            &assets,
            handle,
            Vec3::new(-2.0, 1.0, 0.0),
            BehaviorKind::Oscillator(Oscillator::default()),
        )
        .unwrap();
        assert_eq!(e.bounds().min, Vec3::new(-2.5, 0.5, -0.5));
        assert_eq!(e.bounds().max, Vec3::new(-1.5, 1.5, 0.5));
        assert_eq!(e.tag(), Tag::Forward);
        assets.unload(e.into_asset()).unwrap();
    }

    #[test]
    fn stationary_tag_stays_unset() {
        let mut assets = AssetStore::new();
        let handle = assets.load(BUILTIN_CUBE).unwrap();
        let e = Entity::create(
            EntityId(0),
            &assets,
            handle,
            Vec3::ZERO,
            BehaviorKind::Stationary,
        )
        .unwrap();
        assert_eq!(e.tag(), Tag::Unset);
        assets.unload(e.into_asset()).unwrap();
    }

    #[test]
    fn tag_chars() {
        assert_eq!(Tag::default(), Tag::Unset);
        assert_eq!(Tag::Forward.to_string(), "F");
        assert_eq!(Tag::Backward.as_char(), 'B');
        assert_eq!(Tag::Unset.as_char(), '-');
    }
}
