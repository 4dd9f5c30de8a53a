use ultraviolet::DVec2;

use crate::config::GravityParameters;

/// A point mass in the simulation plane.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    /// Position vector.
    pub pos: DVec2,
    /// Velocity vector.
    pub vel: DVec2,
    /// Force accumulated during the current tick.
    pub force: DVec2,
    /// Mass of the body. Always strictly positive.
    pub mass: f64,
}

impl Body {
    /// Creates a new Body with the given properties.
    /// Initial force is zero.
    pub fn new(pos: DVec2, vel: DVec2, mass: f64) -> Self {
        debug_assert!(mass > 0.0, "body mass must be positive, got {mass}");
        Self {
            pos,
            vel,
            force: DVec2::zero(),
            mass,
        }
    }

    pub fn reset_force(&mut self) {
        self.force = DVec2::zero();
    }

    /// Adds the softened gravitational pull of a (pseudo-)body of mass `mass`
    /// located at `pos`.
    ///
    /// The magnitude is `G * m1 * m2 / (d² + ε²)`, directed along the
    /// unsoftened separation. A source at exactly zero distance has no
    /// direction and contributes nothing, and neither does one so close that
    /// the unsoftened pull overflows.
    pub fn add_force(&mut self, pos: DVec2, mass: f64, gravity: &GravityParameters) {
        let d = pos - self.pos;
        let dist_sq = d.mag_sq();
        if dist_sq == 0.0 {
            return;
        }
        let eps = gravity.softening_length;
        let force = gravity.g * self.mass * mass / (dist_sq + eps * eps);
        let scale = force / dist_sq.sqrt();
        if !scale.is_finite() {
            return;
        }
        self.force += d * scale;
    }

    /// Advances velocity and position by `dt` (semi-implicit Euler: velocity first),
    /// then reflects off the walls of the `[0, extent]²` domain.
    pub fn update(&mut self, dt: f64, extent: f64) {
        self.vel += self.force * (dt / self.mass);
        self.pos += self.vel * dt;

        if self.pos.x < 0.0 {
            self.pos.x = 0.0;
            self.vel.x = -self.vel.x;
        } else if self.pos.x > extent {
            self.pos.x = extent;
            self.vel.x = -self.vel.x;
        }
        if self.pos.y < 0.0 {
            self.pos.y = 0.0;
            self.vel.y = -self.vel.y;
        } else if self.pos.y > extent {
            self.pos.y = extent;
            self.vel.y = -self.vel.y;
        }
    }
}
