//! C entry points for a presentation layer: it owns the window and the
//! timer, drives [`Simulation_Step`], reads the bodies back for drawing
//! and forwards clicks to [`Simulation_AddBody`].
#![allow(non_snake_case)]

use crate::{body::Body, config::SimulationConfig, simulation::Simulation};
use std::ptr;
use ultraviolet::DVec2;

fn create(config: SimulationConfig) -> *mut Simulation {
    match Simulation::new(config) {
        Ok(sim) => Box::into_raw(Box::new(sim)),
        Err(err) => {
            log::error!("failed to create simulation: {err:#}");
            ptr::null_mut()
        }
    }
}

/// Creates a simulation with the default configuration.
#[unsafe(no_mangle)]
pub extern "C" fn Simulation_Create() -> *mut Simulation {
    create(SimulationConfig::default())
}

/// Creates a simulation of `n` reproducible bodies.
#[unsafe(no_mangle)]
pub extern "C" fn Simulation_CreateWithSeed(n: usize, seed: u64) -> *mut Simulation {
    let mut config = SimulationConfig::default();
    config.spawn.num_bodies = n;
    config.spawn.seed = Some(seed);
    create(config)
}

/// # Safety
/// `handle` must be null or come from one of the create functions, and must
/// not be used afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_Destroy(handle: *mut Simulation) {
    if !handle.is_null() {
        unsafe { drop(Box::from_raw(handle)) };
    }
}

/// # Safety
/// `handle` must be null or a live simulation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_Step(handle: *mut Simulation) {
    if let Some(sim) = unsafe { handle.as_mut() } {
        sim.step();
    }
}

/// # Safety
/// `handle` must be null or a live simulation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_Reset(handle: *mut Simulation, n: usize) {
    if let Some(sim) = unsafe { handle.as_mut() } {
        sim.reset(n);
    }
}

/// # Safety
/// `handle` must be null or a live simulation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_GetBodyCount(handle: *const Simulation) -> usize {
    let sim = unsafe { handle.as_ref() };
    sim.map_or(0, |sim| sim.bodies().len())
}

/// The returned array holds [`Simulation_GetBodyCount`] bodies and stays
/// valid until the next call that mutates the simulation.
///
/// # Safety
/// `handle` must be null or a live simulation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_GetBodies(handle: *const Simulation) -> *const Body {
    let sim = unsafe { handle.as_ref() };
    sim.map_or(ptr::null(), |sim| sim.bodies().as_ptr())
}

/// Queues a resting body at `(x, y)` for the next step.
/// Returns `false` if the position is outside the domain.
///
/// # Safety
/// `handle` must be null or a live simulation.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_AddBody(handle: *mut Simulation, x: f64, y: f64) -> bool {
    let Some(sim) = (unsafe { handle.as_mut() }) else {
        return false;
    };
    match sim.queue_body(DVec2::new(x, y)) {
        Ok(()) => true,
        Err(err) => {
            log::debug!("{err}");
            false
        }
    }
}
