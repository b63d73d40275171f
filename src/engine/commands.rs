//! Deferred structural mutation.
//!
//! Systems must not mutate archetype structure while queries iterate; they
//! enqueue spawns and despawns here instead. The scheduler replays the buffer
//! at stage boundaries, which is the barrier at which later stages observe the
//! effects of earlier ones.

use crate::engine::component::ComponentBundle;
use crate::engine::error::ECSResult;
use crate::engine::types::Entity;
use crate::engine::world::World;

type SpawnOp = Box<dyn FnOnce(&mut World) -> ECSResult<()> + Send>;

enum Command {
    Spawn(SpawnOp),
    Despawn(Entity),
}

/// FIFO buffer of deferred structural operations.
#[derive(Default)]
pub struct Commands {
    ops: Vec<Command>,
}

impl Commands {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a deferred spawn, capturing the component values.
    pub fn spawn<B: ComponentBundle>(&mut self, bundle: B) {
        self.ops.push(Command::Spawn(Box::new(move |world| {
            world.spawn(bundle).map(|_| ())
        })));
    }

    /// Enqueues a deferred despawn.
    pub fn despawn(&mut self, entity: Entity) {
        self.ops.push(Command::Despawn(entity));
    }

    /// Number of enqueued operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` if nothing is enqueued.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Discards all enqueued operations without replaying them.
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Replays every enqueued operation in FIFO order, then clears.
    ///
    /// The first failing operation aborts the replay; operations already
    /// replayed stay applied, the rest are dropped with the buffer.
    pub fn flush(&mut self, world: &mut World) -> ECSResult<()> {
        if !self.ops.is_empty() {
            log::trace!("commands: flushing {} deferred ops", self.ops.len());
        }
        for op in self.ops.drain(..) {
            match op {
                Command::Spawn(run) => run(world)?,
                Command::Despawn(entity) => world.despawn(entity),
            }
        }
        Ok(())
    }
}
