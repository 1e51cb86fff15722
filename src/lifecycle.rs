//! Simulation lifecycle driven through the state machine.
//!
//! Reproduces the reference usage: a machine over `loading → loaded →
//! started`/`error`, where `loaded` is reached when an external module query
//! settles, `started` is entered by an explicit `start` request, and loader
//! failure becomes the `error` state instead of a thrown error. Animation
//! timing and actual drawing stay with the host; the simulation and its
//! drawing surface are opaque payloads here.

use crate::core::{StateEvent, StateKey};
use crate::error::MachineError;
use crate::machine::{ListenerMap, StateMachine};
use crate::query::{LoadFailure, Query, QueryState};
use crate::key_enum;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Grid size used when `start` builds a fresh simulation.
pub const DEFAULT_SIZE: (u32, u32) = (160, 120);

/// Contract of a simulation instance (external collaborator).
///
/// The lifecycle treats implementations as opaque: it only forwards `tick`,
/// `render` and `insert_around` calls while started.
pub trait Simulation {
    /// Drawing surface the simulation renders into.
    type Surface;
    /// Visual styling applied when rendering. Opaque to the lifecycle.
    type Style;

    /// Advance one generation.
    fn tick(&mut self);

    /// Draw the current generation onto `surface`.
    fn render(&self, surface: &mut Self::Surface);

    /// Toggle cells to life around `center`, within `radius`.
    fn insert_around(&mut self, surface: &mut Self::Surface, center: (f64, f64), radius: u32);

    /// Grid size as `(width, height)`.
    fn size(&self) -> (u32, u32);

    /// Current rendering style.
    fn style(&self) -> &Self::Style;

    /// Replace the rendering style.
    fn set_style(&mut self, style: Self::Style);
}

/// Factory for simulation instances (the loaded module's constructors).
pub trait SimulationModule: 'static {
    /// Drawing surface type shared with the produced simulations.
    type Surface;
    /// Simulation type this module constructs.
    type Sim: Simulation<Surface = Self::Surface> + 'static;

    /// Build an all-dead simulation.
    fn dead(&self, width: u32, height: u32) -> Self::Sim;

    /// Build a randomly seeded simulation.
    fn random(&self, width: u32, height: u32) -> Self::Sim;

    /// Build the fixed demo pattern.
    fn fixed(&self, width: u32, height: u32) -> Self::Sim;
}

key_enum! {
    /// Key set of the lifecycle state space.
    pub enum LifeKey {
        Loading => "loading",
        Loaded => "loaded",
        Started => "started",
        Error => "error",
    }
}

/// Lifecycle state: one payload shape per key.
///
/// `C` is the host's canvas handle, carried through every live state. The
/// simulation handle only exists while started; stopping drops it.
pub enum LifeState<M: SimulationModule, C> {
    Loading {
        surface: C,
    },
    Loaded {
        surface: C,
        module: Rc<M>,
    },
    Started {
        surface: C,
        module: Rc<M>,
        sim: Rc<RefCell<M::Sim>>,
    },
    Error {
        failure: LoadFailure,
    },
}

impl<M: SimulationModule, C: Clone> Clone for LifeState<M, C> {
    fn clone(&self) -> Self {
        match self {
            Self::Loading { surface } => Self::Loading {
                surface: surface.clone(),
            },
            Self::Loaded { surface, module } => Self::Loaded {
                surface: surface.clone(),
                module: Rc::clone(module),
            },
            Self::Started {
                surface,
                module,
                sim,
            } => Self::Started {
                surface: surface.clone(),
                module: Rc::clone(module),
                sim: Rc::clone(sim),
            },
            Self::Error { failure } => Self::Error {
                failure: failure.clone(),
            },
        }
    }
}

impl<M: SimulationModule, C> fmt::Debug for LifeState<M, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading { .. } => f.write_str("LifeState::Loading"),
            Self::Loaded { .. } => f.write_str("LifeState::Loaded"),
            Self::Started { .. } => f.write_str("LifeState::Started"),
            Self::Error { failure } => write!(f, "LifeState::Error({failure})"),
        }
    }
}

impl<M: SimulationModule, C: Clone + 'static> StateEvent for LifeState<M, C> {
    type Key = LifeKey;

    fn key(&self) -> LifeKey {
        match self {
            Self::Loading { .. } => LifeKey::Loading,
            Self::Loaded { .. } => LifeKey::Loaded,
            Self::Started { .. } => LifeKey::Started,
            Self::Error { .. } => LifeKey::Error,
        }
    }
}

/// The lifecycle front-end: wires a module query into the machine and
/// exposes the legal lifecycle requests.
///
/// Hosts observe progress through [`GameLifecycle::machine`] (`on`,
/// `subscribe`); the machine is the single source of truth for what is
/// currently legal.
pub struct GameLifecycle<M: SimulationModule, C: Clone + 'static> {
    machine: StateMachine<LifeState<M, C>>,
}

impl<M: SimulationModule, C: Clone + 'static> GameLifecycle<M, C> {
    /// Create the lifecycle in `loading` and bridge `loader` into it.
    ///
    /// The bridge is a one-shot subscription: on resolution it emits
    /// `loaded`, on failure it emits `error` carrying the loader's failure
    /// as state data. If the loader already settled, the bridge fires during
    /// construction and the machine comes back past `loading`.
    pub fn new(surface: C, loader: &Query<Rc<M>>) -> Result<Self, MachineError> {
        let machine = StateMachine::new(
            ListenerMap::new(),
            LifeState::Loading {
                surface: surface.clone(),
            },
        )?;

        let forward = machine.clone();
        loader.once(move |state| {
            // No auto-transitions are wired, so these emits cannot hit the
            // cascade cap.
            match state {
                QueryState::Done(module) => {
                    let _ = forward.emit(LifeState::Loaded {
                        surface: surface.clone(),
                        module: Rc::clone(module),
                    });
                }
                QueryState::Failed(failure) => {
                    let _ = forward.emit(LifeState::Error {
                        failure: failure.clone(),
                    });
                }
                QueryState::Pending => {}
            }
        });

        Ok(Self { machine })
    }

    /// The underlying machine, for observation.
    pub fn machine(&self) -> &StateMachine<LifeState<M, C>> {
        &self.machine
    }

    /// Clone of the current lifecycle state.
    pub fn state(&self) -> LifeState<M, C> {
        self.machine.state()
    }

    /// Key of the current lifecycle state.
    pub fn key(&self) -> LifeKey {
        self.machine.key()
    }

    /// Request a start.
    ///
    /// From `loaded`, starts immediately with a fresh dead simulation at
    /// [`DEFAULT_SIZE`]. From `loading`, arms a one-shot that starts as soon
    /// as the module arrives. From `started` or `error` this is illegal and
    /// fails with [`MachineError::InvalidStateTransition`].
    pub fn start(&self) -> Result<(), MachineError> {
        match self.machine.state() {
            LifeState::Loading { .. } => {
                let machine = self.machine.clone();
                self.machine.once(LifeKey::Loaded, move |state| {
                    if let LifeState::Loaded { surface, module } = state {
                        let _ = machine.emit(started_state(surface.clone(), module));
                    }
                });
                Ok(())
            }
            LifeState::Loaded { surface, module } => {
                self.machine.emit(started_state(surface, &module))
            }
            _ => Err(MachineError::InvalidStateTransition {
                from: self.machine.key().name(),
                attempted: "start",
            }),
        }
    }

    /// Request a stop.
    ///
    /// From `started`, returns to `loaded` and drops the simulation. While
    /// still `loading` or `loaded` this is a no-op. From `error` it fails
    /// with [`MachineError::InvalidStateTransition`].
    pub fn stop(&self) -> Result<(), MachineError> {
        match self.machine.state() {
            LifeState::Loading { .. } | LifeState::Loaded { .. } => Ok(()),
            LifeState::Started {
                surface, module, ..
            } => self.machine.emit(LifeState::Loaded { surface, module }),
            LifeState::Error { .. } => Err(MachineError::InvalidStateTransition {
                from: "error",
                attempted: "stop",
            }),
        }
    }

    /// Advance the running simulation one generation.
    pub fn tick(&self) -> Result<(), MachineError> {
        let sim = self.running_sim("tick")?;
        sim.borrow_mut().tick();
        Ok(())
    }

    /// Draw the running simulation onto `surface`.
    pub fn render(&self, surface: &mut M::Surface) -> Result<(), MachineError> {
        let sim = self.running_sim("render")?;
        sim.borrow().render(surface);
        Ok(())
    }

    /// Toggle cells to life around `center` in the running simulation.
    pub fn insert_around(
        &self,
        surface: &mut M::Surface,
        center: (f64, f64),
        radius: u32,
    ) -> Result<(), MachineError> {
        let sim = self.running_sim("insert_around")?;
        sim.borrow_mut().insert_around(surface, center, radius);
        Ok(())
    }

    fn running_sim(&self, attempted: &'static str) -> Result<Rc<RefCell<M::Sim>>, MachineError> {
        match self.machine.state() {
            LifeState::Started { sim, .. } => Ok(sim),
            _ => Err(MachineError::InvalidStateTransition {
                from: self.machine.key().name(),
                attempted,
            }),
        }
    }
}

fn started_state<M: SimulationModule, C>(surface: C, module: &Rc<M>) -> LifeState<M, C> {
    let (width, height) = DEFAULT_SIZE;
    LifeState::Started {
        surface,
        module: Rc::clone(module),
        sim: Rc::new(RefCell::new(module.dead(width, height))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::LoadFailure;
    use std::cell::Cell;

    /// In-memory life grid used as the test double for the external module.
    struct GridSim {
        width: u32,
        height: u32,
        cells: Vec<bool>,
        style: String,
    }

    impl GridSim {
        fn index(&self, col: i64, row: i64) -> Option<usize> {
            if col < 0 || row < 0 || col >= i64::from(self.width) || row >= i64::from(self.height) {
                return None;
            }
            Some((row * i64::from(self.width) + col) as usize)
        }

        fn set_alive(&mut self, col: i64, row: i64) {
            if let Some(i) = self.index(col, row) {
                self.cells[i] = true;
            }
        }

        fn is_alive(&self, col: i64, row: i64) -> bool {
            self.index(col, row).map(|i| self.cells[i]).unwrap_or(false)
        }

        fn neighbors(&self, col: i64, row: i64) -> u8 {
            let mut count = 0;
            for dc in -1..=1 {
                for dr in -1..=1 {
                    if (dc, dr) != (0, 0) && self.is_alive(col + dc, row + dr) {
                        count += 1;
                    }
                }
            }
            count
        }
    }

    impl Simulation for GridSim {
        type Surface = Vec<String>;
        type Style = String;

        fn tick(&mut self) {
            let mut next = self.cells.clone();
            for row in 0..i64::from(self.height) {
                for col in 0..i64::from(self.width) {
                    let i = (row * i64::from(self.width) + col) as usize;
                    let neighbors = self.neighbors(col, row);
                    next[i] = if self.cells[i] {
                        (2..=3).contains(&neighbors)
                    } else {
                        neighbors == 3
                    };
                }
            }
            self.cells = next;
        }

        fn render(&self, surface: &mut Vec<String>) {
            let alive = self.cells.iter().filter(|c| **c).count();
            surface.push(format!("render {}x{} alive={alive}", self.width, self.height));
        }

        fn insert_around(&mut self, surface: &mut Vec<String>, center: (f64, f64), radius: u32) {
            let (cx, cy) = (center.0 as i64, center.1 as i64);
            let r = i64::from(radius);
            for row in (cy - r)..=(cy + r) {
                for col in (cx - r)..=(cx + r) {
                    self.set_alive(col, row);
                }
            }
            surface.push(format!("insert ({cx},{cy}) r={radius}"));
        }

        fn size(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        fn style(&self) -> &String {
            &self.style
        }

        fn set_style(&mut self, style: String) {
            self.style = style;
        }
    }

    struct GridModule;

    impl SimulationModule for GridModule {
        type Surface = Vec<String>;
        type Sim = GridSim;

        fn dead(&self, width: u32, height: u32) -> GridSim {
            GridSim {
                width,
                height,
                cells: vec![false; (width * height) as usize],
                style: "cells:1px".to_string(),
            }
        }

        fn random(&self, width: u32, height: u32) -> GridSim {
            let mut sim = self.dead(width, height);
            let mut seed: u64 = 0x5eed;
            for cell in &mut sim.cells {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                *cell = seed >> 63 == 1;
            }
            sim
        }

        fn fixed(&self, width: u32, height: u32) -> GridSim {
            let mut sim = self.dead(width, height);
            for i in 0..sim.cells.len() {
                if i % 2 == 0 || i % 7 == 0 || i % 13 == 0 {
                    sim.cells[i] = true;
                }
            }
            sim
        }
    }

    fn pending_loader() -> Query<Rc<GridModule>> {
        Query::new()
    }

    fn lifecycle_with_pending() -> (GameLifecycle<GridModule, String>, Query<Rc<GridModule>>) {
        let loader = pending_loader();
        let lifecycle = GameLifecycle::new("canvas#1".to_string(), &loader).unwrap();
        (lifecycle, loader)
    }

    #[test]
    fn stays_loading_while_loader_is_pending() {
        let (lifecycle, _loader) = lifecycle_with_pending();
        assert_eq!(lifecycle.key(), LifeKey::Loading);
    }

    #[test]
    fn loader_completion_moves_to_loaded() {
        let (lifecycle, loader) = lifecycle_with_pending();
        loader.complete(Rc::new(GridModule));

        assert_eq!(lifecycle.key(), LifeKey::Loaded);
        assert_eq!(
            lifecycle.machine().trace().path(),
            vec!["loading", "loaded"]
        );
    }

    #[test]
    fn already_settled_loader_resolves_during_construction() {
        let loader = pending_loader();
        loader.complete(Rc::new(GridModule));

        let lifecycle = GameLifecycle::new("canvas#1".to_string(), &loader).unwrap();
        assert_eq!(lifecycle.key(), LifeKey::Loaded);
    }

    #[test]
    fn loader_failure_becomes_error_state() {
        let (lifecycle, loader) = lifecycle_with_pending();

        let reported = Rc::new(RefCell::new(None));
        let r = Rc::clone(&reported);
        lifecycle.machine().on(LifeKey::Error, move |state| {
            if let LifeState::Error { failure } = state {
                *r.borrow_mut() = Some(failure.message.clone());
            }
        });

        loader.fail(LoadFailure::new("module not found"));

        assert_eq!(lifecycle.key(), LifeKey::Error);
        assert_eq!(reported.borrow().as_deref(), Some("module not found"));
    }

    #[test]
    fn start_from_loaded_builds_a_dead_simulation() {
        let (lifecycle, loader) = lifecycle_with_pending();
        loader.complete(Rc::new(GridModule));

        lifecycle.start().unwrap();

        assert_eq!(lifecycle.key(), LifeKey::Started);
        match lifecycle.state() {
            LifeState::Started { sim, .. } => {
                assert_eq!(sim.borrow().size(), DEFAULT_SIZE);
                assert!(sim.borrow().cells.iter().all(|c| !*c));
            }
            other => panic!("expected started, got {other:?}"),
        }
    }

    #[test]
    fn start_while_loading_defers_until_loaded() {
        let (lifecycle, loader) = lifecycle_with_pending();

        lifecycle.start().unwrap();
        assert_eq!(lifecycle.key(), LifeKey::Loading);

        loader.complete(Rc::new(GridModule));
        assert_eq!(lifecycle.key(), LifeKey::Started);
        assert_eq!(
            lifecycle.machine().trace().path(),
            vec!["loading", "loaded", "started"]
        );
    }

    #[test]
    fn start_is_illegal_when_started_or_errored() {
        let (lifecycle, loader) = lifecycle_with_pending();
        loader.complete(Rc::new(GridModule));
        lifecycle.start().unwrap();

        let err = lifecycle.start().unwrap_err();
        assert!(matches!(
            err,
            MachineError::InvalidStateTransition {
                from: "started",
                attempted: "start"
            }
        ));

        let loader = pending_loader();
        let errored = GameLifecycle::new("canvas#2".to_string(), &loader).unwrap();
        loader.fail(LoadFailure::new("boom"));

        let err = errored.start().unwrap_err();
        assert!(matches!(
            err,
            MachineError::InvalidStateTransition {
                from: "error",
                attempted: "start"
            }
        ));
    }

    #[test]
    fn stop_returns_to_loaded_and_drops_the_simulation() {
        let (lifecycle, loader) = lifecycle_with_pending();
        loader.complete(Rc::new(GridModule));
        lifecycle.start().unwrap();

        lifecycle.stop().unwrap();

        assert_eq!(lifecycle.key(), LifeKey::Loaded);
        assert!(lifecycle.tick().is_err());
    }

    #[test]
    fn stop_is_a_no_op_before_start() {
        let (lifecycle, loader) = lifecycle_with_pending();
        lifecycle.stop().unwrap();
        assert_eq!(lifecycle.key(), LifeKey::Loading);

        loader.complete(Rc::new(GridModule));
        lifecycle.stop().unwrap();
        assert_eq!(lifecycle.key(), LifeKey::Loaded);
    }

    #[test]
    fn restart_after_stop_is_legal() {
        let (lifecycle, loader) = lifecycle_with_pending();
        loader.complete(Rc::new(GridModule));

        lifecycle.start().unwrap();
        lifecycle.stop().unwrap();
        lifecycle.start().unwrap();

        assert_eq!(lifecycle.key(), LifeKey::Started);
    }

    #[test]
    fn simulation_operations_require_started() {
        let (lifecycle, _loader) = lifecycle_with_pending();
        let mut surface = Vec::new();

        assert!(lifecycle.tick().is_err());
        assert!(lifecycle.render(&mut surface).is_err());
        assert!(lifecycle.insert_around(&mut surface, (2.0, 2.0), 1).is_err());
        assert!(surface.is_empty());
    }

    #[test]
    fn insert_then_tick_follows_life_rules() {
        let (lifecycle, loader) = lifecycle_with_pending();
        loader.complete(Rc::new(GridModule));
        lifecycle.start().unwrap();

        let mut surface = Vec::new();
        // A 3x3 block around (5,5).
        lifecycle.insert_around(&mut surface, (5.0, 5.0), 1).unwrap();
        lifecycle.tick().unwrap();
        lifecycle.render(&mut surface).unwrap();

        match lifecycle.state() {
            LifeState::Started { sim, .. } => {
                let sim = sim.borrow();
                // Corners of a 3x3 block survive; its center dies.
                assert!(sim.is_alive(4, 4));
                assert!(!sim.is_alive(5, 5));
            }
            other => panic!("expected started, got {other:?}"),
        }
        assert_eq!(surface.len(), 2);
        assert!(surface[0].starts_with("insert"));
        assert!(surface[1].starts_with("render"));
    }

    #[test]
    fn style_mutation_round_trips_on_the_running_simulation() {
        let (lifecycle, loader) = lifecycle_with_pending();
        loader.complete(Rc::new(GridModule));
        lifecycle.start().unwrap();

        match lifecycle.state() {
            LifeState::Started { sim, .. } => {
                assert_eq!(sim.borrow().style().as_str(), "cells:1px");
                sim.borrow_mut().set_style("cells:3px".to_string());
                assert_eq!(sim.borrow().style().as_str(), "cells:3px");
            }
            other => panic!("expected started, got {other:?}"),
        }
    }

    #[test]
    fn module_constructors_produce_expected_patterns() {
        let module = GridModule;

        assert!(module.dead(8, 8).cells.iter().all(|c| !*c));
        assert!(module.fixed(8, 8).cells[0]);
        assert!(!module.fixed(8, 8).cells[3]);

        let random = module.random(8, 8);
        assert!(random.cells.iter().any(|c| *c));
        assert!(random.cells.iter().any(|c| !*c));
    }

    #[test]
    fn subscriber_observes_whole_lifecycle() {
        let (lifecycle, loader) = lifecycle_with_pending();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        lifecycle.machine().subscribe(move |_| c.set(c.get() + 1));

        loader.complete(Rc::new(GridModule));
        lifecycle.start().unwrap();
        lifecycle.stop().unwrap();

        // loaded, started, loaded again
        assert_eq!(count.get(), 3);
    }
}
