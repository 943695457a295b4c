use crate::KernelError;
use crate::behavior::BehaviorKind;
use crate::entity::Entity;
use actorloop_assets::{AssetError, AssetHandle, AssetStore};
use actorloop_common::EntityId;
use glam::Vec3;

/// Ordered owner of every entity.
///
/// Conceptually a ring: traversal starts at the head, visits each entity once
/// in insertion order and stops when it would wrap back to the head. Entities
/// live in an arena indexed by [`EntityId`], so the ring needs no links.
///
/// Dropping a registry that still owns entities leaks their asset handles;
/// call [`EntityRegistry::destroy`] to release them.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    pub(crate) entities: Vec<Entity>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Create an entity and append it as the new tail. The entity's spawn
    /// hook runs before this returns.
    pub fn insert_end(
        &mut self,
        assets: &AssetStore,
        asset: AssetHandle,
        position: Vec3,
        behavior: BehaviorKind,
    ) -> Result<EntityId, KernelError> {
        let id = next_id(self.entities.len())?;
        let entity = Entity::create(id, assets, asset, position, behavior)?;
        self.entities.push(entity);
        Ok(id)
    }

    /// First entity in traversal order.
    pub fn head(&self) -> Option<&Entity> {
        self.entities.first()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.index())
    }

    /// Next entity in the ring. The tail's successor is the head.
    pub fn successor(&self, id: EntityId) -> Option<EntityId> {
        if id.index() >= self.entities.len() {
            return None;
        }
        let next = (id.index() + 1) % self.entities.len();
        Some(self.entities[next].id())
    }

    /// Entities in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().map(Entity::id)
    }

    pub fn for_each(&self, mut visit: impl FnMut(&Entity)) {
        for entity in &self.entities {
            visit(entity);
        }
    }

    /// Recompute every entity's world-space box from its asset and current
    /// position. Must run before collision detection each frame.
    pub fn update_bounding_volumes(&mut self, assets: &AssetStore) -> Result<(), KernelError> {
        for entity in &mut self.entities {
            entity.refresh_bounds(assets)?;
        }
        Ok(())
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    /// Release every entity's asset and drop the entities. Each handle is
    /// unloaded exactly once; a failing unload is logged and the remaining
    /// entities are still released. Returns the number of handles released.
    pub fn destroy(self, assets: &mut AssetStore) -> Result<usize, KernelError> {
        let mut released = 0;
        let mut first_error = None;
        self.release_all(assets, |_, result| match result {
            Ok(()) => released += 1,
            Err(e) => {
                first_error.get_or_insert(e);
            }
        });
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(released),
        }
    }

    /// Unload every handle in traversal order, reporting each outcome.
    pub(crate) fn release_all(
        mut self,
        assets: &mut AssetStore,
        mut outcome: impl FnMut(EntityId, Result<(), AssetError>),
    ) {
        for entity in std::mem::take(&mut self.entities) {
            let id = entity.id();
            let result = assets.unload(entity.into_asset());
            if let Err(e) = &result {
                tracing::warn!(entity = %id, "failed to release asset: {e}");
            }
            outcome(id, result);
        }
    }
}

/// Id for the entity stored at arena slot `len`.
fn next_id(len: usize) -> Result<EntityId, KernelError> {
    u32::try_from(len)
        .map(EntityId)
        .map_err(|_| KernelError::RegistryFull(len))
}

impl Drop for EntityRegistry {
    fn drop(&mut self) {
        if !self.entities.is_empty() {
            tracing::warn!(
                entities = self.entities.len(),
                "entity registry dropped without destroy; asset handles leaked"
            );
        }
    }
}
