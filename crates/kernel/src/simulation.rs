use crate::KernelError;
use crate::behavior::BehaviorKind;
use crate::collision::Contact;
use crate::debug::DebugOverlay;
use crate::entity::{Entity, Tag};
use crate::registry::EntityRegistry;
use actorloop_assets::{AssetHandle, AssetStore};
use actorloop_common::EntityId;
use glam::Vec3;
use serde::Serialize;
use std::collections::VecDeque;

/// Events kept by default before the oldest are discarded.
pub const DEFAULT_EVENT_CAPACITY: usize = 4096;

/// Why a tag changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TagCause {
    /// Collision reaction.
    Contact,
    /// Tick hook turning around at a patrol bound.
    Boundary,
}

/// A record of something that happened in the simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimEvent {
    Spawned {
        id: EntityId,
        position: Vec3,
        tag: Tag,
    },
    Contact {
        entity: EntityId,
        other: EntityId,
        reacted: bool,
    },
    TagChanged {
        id: EntityId,
        from: Tag,
        to: Tag,
        cause: TagCause,
    },
    /// A frame finished; `frame` is the new frame count.
    Stepped { frame: u64 },
    /// The entity's asset handle was released at teardown.
    Destroyed { id: EntityId },
    /// Teardown dropped the entity but its asset could not be unloaded.
    ReleaseFailed { id: EntityId, error: String },
}

/// Bounded event log. Once full, each new event evicts the oldest.
#[derive(Debug)]
struct EventLog {
    events: VecDeque<SimEvent>,
    capacity: usize,
    dropped: u64,
}

impl EventLog {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_CAPACITY)),
            capacity,
            dropped: 0,
        }
    }

    fn push(&mut self, event: SimEvent) {
        if self.capacity == 0 {
            self.dropped += 1;
            return;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }
}

/// Counts from one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: u64,
    pub contacts: usize,
    pub reactions: usize,
    pub flips: usize,
    pub debug_primitives: usize,
}

/// The registry plus frame bookkeeping: frame counter, event log and the
/// debug overlay filled by collision reactions.
///
/// A frame is `update_bounding_volumes`, then `detect_collisions`, then
/// `advance`. [`Simulation::step`] runs all three without drawing.
///
/// The event log holds the most recent [`DEFAULT_EVENT_CAPACITY`] events
/// unless configured otherwise, so long runs need not drain it.
#[derive(Debug)]
pub struct Simulation {
    registry: EntityRegistry,
    frame: u64,
    overlay: DebugOverlay,
    events: EventLog,
    pending: FrameReport,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }
}

impl Simulation {
    pub fn new() -> Self {
        Self::default()
    }

    /// A simulation whose event log keeps at most `capacity` events. Zero
    /// disables the log.
    pub fn with_event_capacity(capacity: usize) -> Self {
        Self {
            registry: EntityRegistry::default(),
            frame: 0,
            overlay: DebugOverlay::default(),
            events: EventLog::with_capacity(capacity),
            pending: FrameReport::default(),
        }
    }

    /// Frames completed so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn entity_count(&self) -> usize {
        self.registry.len()
    }

    /// Debug primitives requested during this frame's collision pass.
    pub fn overlay(&self) -> &DebugOverlay {
        &self.overlay
    }

    /// Take the overlay, leaving an empty one. The next collision pass
    /// refills it either way.
    pub fn take_overlay(&mut self) -> DebugOverlay {
        std::mem::take(&mut self.overlay)
    }

    /// Read-only access to the event log, oldest first.
    pub fn events(&self) -> &VecDeque<SimEvent> {
        &self.events.events
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.events.drain(..).collect()
    }

    /// Events evicted from a full log since the simulation was created.
    pub fn events_dropped(&self) -> u64 {
        self.events.dropped
    }

    /// Add an entity at the end of the traversal order.
    pub fn spawn(
        &mut self,
        assets: &AssetStore,
        asset: AssetHandle,
        position: Vec3,
        behavior: BehaviorKind,
    ) -> Result<EntityId, KernelError> {
        let id = self.registry.insert_end(assets, asset, position, behavior)?;
        let tag = self.registry.get(id).map(Entity::tag).unwrap_or_default();
        self.events.push(SimEvent::Spawned { id, position, tag });
        Ok(id)
    }

    pub fn update_bounding_volumes(&mut self, assets: &AssetStore) -> Result<(), KernelError> {
        self.registry.update_bounding_volumes(assets)
    }

    /// Collision pass. Refills the overlay and logs contacts and flips.
    pub fn detect_collisions(&mut self) -> Vec<Contact> {
        let contacts = self.registry.detect_collisions(&mut self.overlay);
        for c in &contacts {
            self.events.push(SimEvent::Contact {
                entity: c.entity,
                other: c.other,
                reacted: c.reacted,
            });
            if c.flipped() {
                self.events.push(SimEvent::TagChanged {
                    id: c.entity,
                    from: c.tag_before,
                    to: c.tag_after,
                    cause: TagCause::Contact,
                });
                self.pending.flips += 1;
            }
        }
        self.pending.contacts += contacts.len();
        self.pending.reactions += contacts.iter().filter(|c| c.reacted).count();
        self.pending.debug_primitives = self.overlay.len();
        contacts
    }

    /// Render traversal: call `visit` on each entity in order, then run that
    /// entity's tick hook. Ends the frame.
    pub fn advance(&mut self, mut visit: impl FnMut(&Entity)) -> FrameReport {
        for entity in self.registry.iter_mut() {
            visit(entity);
            let before = entity.tag();
            entity.tick();
            if entity.tag() != before {
                self.events.push(SimEvent::TagChanged {
                    id: entity.id(),
                    from: before,
                    to: entity.tag(),
                    cause: TagCause::Boundary,
                });
                self.pending.flips += 1;
            }
        }
        self.frame += 1;
        self.events.push(SimEvent::Stepped { frame: self.frame });

        let report = FrameReport {
            frame: self.frame,
            ..std::mem::take(&mut self.pending)
        };
        tracing::debug!(
            frame = report.frame,
            contacts = report.contacts,
            flips = report.flips,
            "frame advanced"
        );
        report
    }

    /// One whole frame without drawing.
    pub fn step(&mut self, assets: &AssetStore) -> Result<FrameReport, KernelError> {
        self.update_bounding_volumes(assets)?;
        self.detect_collisions();
        Ok(self.advance(|_| {}))
    }

    /// Release every entity's asset, leaving the simulation empty. Returns
    /// the number of handles released, or the first unload error after
    /// every entity has been dropped. Each entity logs either `Destroyed` or
    /// `ReleaseFailed`.
    pub fn teardown(&mut self, assets: &mut AssetStore) -> Result<usize, KernelError> {
        let registry = std::mem::take(&mut self.registry);
        let events = &mut self.events;
        let mut released = 0;
        let mut first_error = None;
        registry.release_all(assets, |id, result| match result {
            Ok(()) => {
                released += 1;
                events.push(SimEvent::Destroyed { id });
            }
            Err(e) => {
                events.push(SimEvent::ReleaseFailed {
                    id,
                    error: e.to_string(),
                });
                first_error.get_or_insert(e);
            }
        });
        if let Some(e) = first_error {
            return Err(e.into());
        }
        tracing::info!(released, frames = self.frame, "simulation torn down");
        Ok(released)
    }

    /// Deterministic hash of frame count, positions and tags, for comparing
    /// runs.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.frame.to_le_bytes());
        for entity in self.registry.iter() {
            let p = entity.position();
            mix(&mut h, &entity.id().0.to_le_bytes());
            mix(&mut h, &p.x.to_le_bytes());
            mix(&mut h, &p.y.to_le_bytes());
            mix(&mut h, &p.z.to_le_bytes());
            mix(&mut h, &[entity.tag().as_char() as u8]);
        }
        h
    }
}
