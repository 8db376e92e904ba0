//! Floating score particles spawned by play events.
//!
//! Purely cosmetic: nothing in scoring or lifecycle reads this field.

use std::time::Duration;

use serde::Serialize;

use crate::types::PointKind;

/// How long a particle stays on screen.
pub const PARTICLE_LIFETIME: Duration = Duration::from_millis(800);

/// Upper bound on live particles; the oldest are dropped first.
pub const MAX_PARTICLES: usize = 64;

/// Rise speed in board units per second.
const RISE_PER_SEC: f32 = 40.0;

/// One floating score marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Particle {
    /// Horizontal position.
    pub x: f32,
    /// Vertical position (decreases as the particle rises).
    pub y: f32,
    /// Event that spawned it.
    pub kind: PointKind,
    /// Score delta displayed.
    pub points: i64,
    /// Time alive so far.
    #[serde(skip)]
    pub age: Duration,
}

/// Set of live particles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleField {
    particles: Vec<Particle>,
}

impl ParticleField {
    /// Empty field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a particle at the event coordinates.
    pub fn spawn(&mut self, x: f32, y: f32, kind: PointKind, points: i64) {
        if self.particles.len() == MAX_PARTICLES {
            self.particles.remove(0);
        }
        self.particles.push(Particle {
            x,
            y,
            kind,
            points,
            age: Duration::ZERO,
        });
    }

    /// Ages every particle by `dt`, moves it, and drops expired ones.
    pub fn step(&mut self, dt: Duration) {
        let rise = RISE_PER_SEC * dt.as_secs_f32();
        for particle in &mut self.particles {
            particle.age += dt;
            particle.y -= rise;
        }
        self.particles.retain(|p| p.age < PARTICLE_LIFETIME);
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Live particles, oldest first.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Number of live particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// True when nothing is on screen.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particles_expire() {
        let mut field = ParticleField::new();
        field.spawn(10.0, 50.0, PointKind::Perfect, 200);
        field.step(Duration::from_millis(400));
        assert_eq!(field.len(), 1);
        assert!(field.particles()[0].y < 50.0);
        field.step(Duration::from_millis(400));
        assert!(field.is_empty());
    }

    #[test]
    fn test_field_is_bounded() {
        let mut field = ParticleField::new();
        for i in 0..(MAX_PARTICLES + 5) {
            field.spawn(i as f32, 0.0, PointKind::Good, 1);
        }
        assert_eq!(field.len(), MAX_PARTICLES);
        assert_eq!(field.particles()[0].x, 5.0);
    }
}
