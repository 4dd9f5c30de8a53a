use crate::body::Body;
use crate::config::{GravityParameters, SpawnConfig};
use ultraviolet::DVec2;

/// Generates the initial body set: positions uniform over the `[0, extent]²`
/// domain, velocity components uniform in `[-max_speed, max_speed)`, masses
/// uniform in `[min_mass, max_mass)`.
pub fn random_bodies(spawn: &SpawnConfig, extent: f64) -> Vec<Body> {
    let mut rng = match spawn.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };

    (0..spawn.num_bodies)
        .map(|_| {
            let pos = DVec2::new(rng.f64() * extent, rng.f64() * extent);
            let vel = DVec2::new(rng.f64() - 0.5, rng.f64() - 0.5) * (2.0 * spawn.max_speed);
            let mass = spawn.min_mass + rng.f64() * (spawn.max_mass - spawn.min_mass);
            Body::new(pos, vel, mass)
        })
        .collect()
}

/// Replaces every body's force with the exact pairwise sum over all others.
/// O(n²); the reference the tree walk is checked against.
pub fn direct_sum(bodies: &mut [Body], gravity: &GravityParameters) {
    for i in 0..bodies.len() {
        bodies[i].reset_force();
        for j in 0..bodies.len() {
            if i != j {
                let (pos, mass) = (bodies[j].pos, bodies[j].mass);
                bodies[i].add_force(pos, mass, gravity);
            }
        }
    }
}

pub fn total_mass(bodies: &[Body]) -> f64 {
    bodies.iter().map(|b| b.mass).sum()
}

/// Mass-weighted centroid, or the origin for an empty set.
pub fn center_of_mass(bodies: &[Body]) -> DVec2 {
    let mass = total_mass(bodies);
    if mass == 0.0 {
        return DVec2::zero();
    }
    bodies
        .iter()
        .fold(DVec2::zero(), |acc, b| acc + b.pos * b.mass)
        / mass
}
