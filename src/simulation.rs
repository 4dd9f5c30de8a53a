use crate::{
    body::Body,
    config::SimulationConfig,
    quadtree::{Quad, Quadtree, Traversal},
    utils,
};

use anyhow::{Result, ensure};
use ultraviolet::DVec2;

/// Summary of one completed tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Frame count after the tick.
    pub frame: usize,
    /// Bodies simulated during the tick.
    pub bodies: usize,
    /// Bodies added from the insertion queue at the start of the tick.
    pub inserted: usize,
    /// Bodies left out of the tree for lying outside the domain.
    pub dropped: usize,
    /// Nodes in the tree built for the tick.
    pub nodes: usize,
    /// Tree-walk work summed over all bodies.
    pub traversal: Traversal,
}

/// Manages the Barnes-Hut N-body simulation state and logic.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    /// Current frame count.
    frame: usize,
    /// Collection of all bodies in the simulation.
    bodies: Vec<Body>,
    /// Bodies waiting for the next tick boundary.
    pending: Vec<Body>,
    /// Rebuilt from scratch at every tick; kept only to reuse its allocations.
    quadtree: Quadtree,
}

impl Simulation {
    /// Initializes a new simulation with a random body set drawn from `config.spawn`.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let bodies = utils::random_bodies(&config.spawn, config.extent);
        Self::with_bodies(config, bodies)
    }

    /// Initializes a new simulation with the given bodies.
    pub fn with_bodies(config: SimulationConfig, bodies: Vec<Body>) -> Result<Self> {
        config.validate()?;
        ensure!(
            bodies.iter().all(|b| b.mass.is_finite() && b.mass > 0.0),
            "every body needs a positive, finite mass"
        );
        ensure!(
            bodies
                .iter()
                .all(|b| b.pos.x.is_finite() && b.pos.y.is_finite()),
            "every body needs a finite position"
        );

        log::info!(
            "simulation with {} bodies in a {} wide domain (theta {}, softening {})",
            bodies.len(),
            config.extent,
            config.gravity.opening_angle,
            config.gravity.softening_length
        );

        let quadtree = Quadtree::new(&config.gravity, &config.tree);
        Ok(Self {
            config,
            frame: 0,
            bodies,
            pending: Vec::new(),
            quadtree,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    /// The current bodies, as of the last completed tick.
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Bodies queued for the next tick.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Replaces the bodies with `n` freshly generated ones and restarts the frame count.
    pub fn reset(&mut self, n: usize) {
        self.config.spawn.num_bodies = n;
        self.bodies = utils::random_bodies(&self.config.spawn, self.config.extent);
        self.pending.clear();
        self.frame = 0;
        log::info!("simulation reset with {n} bodies");
    }

    /// Queues a resting body of `spawn.inserted_mass` at `pos`. It joins the
    /// simulation at the start of the next [`step`](Self::step).
    pub fn queue_body(&mut self, pos: DVec2) -> Result<()> {
        ensure!(
            Quad::domain(self.config.extent).contains(pos),
            "cannot insert a body at {pos:?}: outside the [0, {}] domain",
            self.config.extent
        );
        self.pending
            .push(Body::new(pos, DVec2::zero(), self.config.spawn.inserted_mass));
        Ok(())
    }

    /// Advances the simulation by one tick: pending insertions, tree build and
    /// force evaluation (attract), then integration (iterate).
    pub fn step(&mut self) -> StepReport {
        let inserted = self.pending.len();
        self.bodies.append(&mut self.pending);

        let (dropped, traversal) = self.attract();
        self.iterate();
        self.frame += 1;

        if dropped > 0 {
            log::warn!(
                "frame {}: {dropped} bodies outside the domain were left out of the tree",
                self.frame
            );
        }

        let report = StepReport {
            frame: self.frame,
            bodies: self.bodies.len(),
            inserted,
            dropped,
            nodes: self.quadtree.nodes.len(),
            traversal,
        };
        log::debug!("{report:?}");
        report
    }

    /// Calculates gravitational forces for all bodies using the Barnes-Hut algorithm.
    /// 1. Rebuilds the Quadtree over the whole domain from current body positions.
    /// 2. Resets every body's force and accumulates it from the tree.
    ///
    /// Returns the number of bodies left out of the tree and the summed walk statistics.
    pub fn attract(&mut self) -> (usize, Traversal) {
        self.quadtree.clear(Quad::domain(self.config.extent));
        let dropped = self.quadtree.insert_all(&self.bodies);

        let mut traversal = Traversal::default();
        for (index, body) in self.bodies.iter_mut().enumerate() {
            body.reset_force();
            traversal += self.quadtree.update_force(index, body);
        }

        (dropped, traversal)
    }

    /// Updates the position and velocity of all bodies from their accumulated forces.
    pub fn iterate(&mut self) {
        let (dt, extent) = (self.config.dt, self.config.extent);
        for body in &mut self.bodies {
            body.update(dt, extent);
        }
    }
}
