//! ECS system scheduling and execution.
//!
//! This module is responsible for:
//! * registering systems with their declared component access,
//! * building a dependency graph from write-to-read and write-to-write
//!   conflicts,
//! * layering the graph into stages and executing them serially with a
//!   command-flush barrier between stages.
//!
//! ## Scheduling model
//!
//! For every ordered pair of systems, an edge `i -> j` is added when system
//! `i` *conflicts into* system `j`: some component written by `i` is read or
//! written by `j`. A writer therefore always precedes any later reader or
//! writer of the same component.
//!
//! The DAG is layered with Kahn's algorithm; each batch of zero-in-degree
//! systems forms a stage, in registration order. If a cycle remains (for
//! example two systems that both write the same component), the remaining
//! systems are placed into a final serial stage in registration order rather
//! than rejected; best-effort execution is preferred over refusal.
//!
//! Stages are executed **serially**. The layering nevertheless identifies
//! groups that a future backend could run concurrently.
//!
//! ## Structural synchronization
//!
//! Each run owns one command buffer. After every stage, the buffer is flushed
//! into the world; that flush is the barrier at which later stages observe
//! structural effects of earlier ones.

use crate::engine::commands::Commands;
use crate::engine::error::ECSResult;
use crate::engine::query::{Query, TermList};
use crate::engine::types::{SystemId, TypeId};
use crate::engine::world::World;

type SystemFn = Box<dyn Fn(&mut World, &mut Commands) -> ECSResult<()> + Send + Sync>;

/// A registered unit of logic with its declared component access.
pub struct SystemDescriptor {
    /// Human-readable name, used in logs.
    pub name: &'static str,

    /// Component types the system reads.
    pub reads: Vec<TypeId>,

    /// Component types the system writes.
    pub writes: Vec<TypeId>,

    run: SystemFn,
}

impl SystemDescriptor {
    /// Creates a descriptor from explicit access sets.
    pub fn new(
        name: &'static str,
        reads: Vec<TypeId>,
        writes: Vec<TypeId>,
        run: impl Fn(&mut World, &mut Commands) -> ECSResult<()> + Send + Sync + 'static,
    ) -> Self {
        Self { name, reads, writes, run: Box::new(run) }
    }
}

/// Builds a [`SystemDescriptor`] with access inferred from query terms.
///
/// `Read<T>` terms populate the read set and `Write<T>` terms the write set;
/// all other term kinds are ignored for scheduling.
///
/// ```ignore
/// let system = make_system::<(Write<Transform>, Read<Velocity>)>("integrate", |world, _commands| {
///     Query::<(Write<Transform>, Read<Velocity>)>::new().for_chunks(world, |view| {
///         // ...
///         Ok(())
///     })
/// });
/// ```
pub fn make_system<L: TermList>(
    name: &'static str,
    run: impl Fn(&mut World, &mut Commands) -> ECSResult<()> + Send + Sync + 'static,
) -> SystemDescriptor {
    let query = Query::<L>::new();
    SystemDescriptor::new(
        name,
        query.spec().reads.clone(),
        query.spec().writes.clone(),
        run,
    )
}

/// Registers systems, layers them into stages, and runs them serially with a
/// command-flush barrier per stage.
#[derive(Default)]
pub struct Scheduler {
    systems: Vec<SystemDescriptor>,
    stages: Vec<Vec<SystemId>>,
    dirty: bool,
}

impl Scheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered systems.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns `true` if no systems are registered.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Registers a system and returns its id (the registration index).
    pub fn register(&mut self, system: SystemDescriptor) -> SystemId {
        let id = self.systems.len() as SystemId;
        self.systems.push(system);
        self.dirty = true;
        id
    }

    /// (Re)computes the stage layout from the current descriptor set.
    pub fn build(&mut self) {
        let n = self.systems.len();
        let mut edges: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut in_degree: Vec<usize> = vec![0; n];

        // Edge direction: writer -> later reader or writer of the same type.
        let conflicts_into = |a: &SystemDescriptor, b: &SystemDescriptor| {
            a.writes
                .iter()
                .any(|t| b.writes.contains(t) || b.reads.contains(t))
        };

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                if conflicts_into(&self.systems[i], &self.systems[j]) {
                    edges[i].push(j);
                    in_degree[j] += 1;
                }
            }
        }

        // Kahn's algorithm with stage grouping: every batch of zero-in-degree
        // systems is one stage, in registration order.
        self.stages.clear();
        let mut zero: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();

        while !zero.is_empty() {
            let current = std::mem::take(&mut zero);
            self.stages
                .push(current.iter().map(|&i| i as SystemId).collect());

            for &u in &current {
                for &v in &edges[u] {
                    in_degree[v] -= 1;
                    if in_degree[v] == 0 {
                        zero.push(v);
                    }
                }
            }
            zero.sort_unstable();
        }

        // Cycles (e.g. two systems both writing the same type) leave nodes
        // with nonzero in-degree; batch them into a final serial stage in
        // registration order rather than refusing to run.
        let remaining: Vec<SystemId> = (0..n)
            .filter(|&i| in_degree[i] > 0)
            .map(|i| i as SystemId)
            .collect();
        if !remaining.is_empty() {
            log::warn!(
                "scheduler: dependency cycle; {} system(s) placed in final serial stage: {:?}",
                remaining.len(),
                remaining
                    .iter()
                    .map(|&i| self.systems[i as usize].name)
                    .collect::<Vec<_>>(),
            );
            self.stages.push(remaining);
        }

        log::debug!(
            "scheduler: built {} stage(s) for {} system(s)",
            self.stages.len(),
            n,
        );
        self.dirty = false;
    }

    /// Number of stages in the current plan.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// System ids of stage `index`, in execution order.
    pub fn stage_at(&self, index: usize) -> &[SystemId] {
        &self.stages[index]
    }

    /// Runs the schedule once.
    ///
    /// Rebuilds the plan if descriptors changed since the last build, then
    /// executes each stage in order, flushing the run's command buffer after
    /// every stage.
    pub fn run(&mut self, world: &mut World) -> ECSResult<()> {
        if self.dirty {
            self.build();
        }

        let mut commands = Commands::new();
        for stage in &self.stages {
            for &id in stage {
                let system = &self.systems[id as usize];
                log::trace!("scheduler: running system {} ({})", id, system.name);
                (system.run)(world, &mut commands)?;
            }
            // Barrier: later stages observe the effects of earlier ones.
            commands.flush(world)?;
        }
        Ok(())
    }
}
