//! Win-screen splash: droplets burst from where the player scored and a
//! cheer is spelled out in the middle of the screen.

use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Instant;

const SPARKS: [char; 5] = ['💧', '💦', '✨', '•', '∘'];
const CHEERS: [&str; 4] = ["CLEAN WATER!", "WELL DONE!", "SPLASH!", "CRYSTAL CLEAR!"];

const GRAVITY: f64 = 18.0;
/// Fraction of vertical speed kept when a droplet hits the bottom edge
const BOUNCE: f64 = 0.45;
const SPRING: f64 = 9.0;
const DAMPING: f64 = 4.5;
const STEP: f64 = 0.1;
const DROPLETS_PER_SPLASH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// Ballistic, bounces once or twice off the floor
    Falling,
    /// Pulled towards a fixed slot in the cheer text
    Spring { slot_x: f64, slot_y: f64 },
}

/// One particle, in terminal cell coordinates
#[derive(Debug, Clone)]
pub struct Droplet {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
    pub motion: Motion,
}

impl Droplet {
    fn splash<R: Rng>(x: f64, y: f64, rng: &mut R) -> Self {
        Self {
            x,
            y,
            vel_x: rng.gen_range(-6.0..6.0),
            vel_y: rng.gen_range(-9.0..-3.0),
            symbol: *SPARKS.choose(rng).unwrap_or(&'💧'),
            color_index: rng.gen_range(0..2),
            age: 0.0,
            max_age: rng.gen_range(1.5..3.0),
            motion: Motion::Falling,
        }
    }

    fn letter<R: Rng>(from: (f64, f64), slot: (f64, f64), symbol: char, rng: &mut R) -> Self {
        Self {
            x: from.0,
            y: from.1,
            vel_x: 0.0,
            vel_y: 0.0,
            symbol,
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: f64::INFINITY,
            motion: Motion::Spring {
                slot_x: slot.0,
                slot_y: slot.1,
            },
        }
    }

    pub fn is_letter(&self) -> bool {
        matches!(self.motion, Motion::Spring { .. })
    }

    /// Returns false once the droplet should disappear
    fn step(&mut self, dt: f64, floor: f64) -> bool {
        match self.motion {
            Motion::Falling => {
                self.vel_y += GRAVITY * dt;
                self.x += self.vel_x * dt;
                self.y += self.vel_y * dt;
                if self.y > floor && self.vel_y > 0.0 {
                    self.y = floor;
                    self.vel_y = -self.vel_y * BOUNCE;
                    self.vel_x *= 0.6;
                }
            }
            Motion::Spring { slot_x, slot_y } => {
                self.vel_x += (SPRING * (slot_x - self.x) - DAMPING * self.vel_x) * dt;
                self.vel_y += (SPRING * (slot_y - self.y) - DAMPING * self.vel_y) * dt;
                self.x += self.vel_x * dt;
                self.y += self.vel_y * dt;
            }
        }
        self.age += dt;
        self.age < self.max_age
    }
}

/// Shown on the results screen after a win
#[derive(Debug)]
pub struct Celebration {
    pub particles: Vec<Droplet>,
    pub started_at: Instant,
    pub duration: f64,
    pub is_active: bool,
    pub width: f64,
    pub height: f64,
}

impl Celebration {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            started_at: Instant::now(),
            duration: 3.0,
            is_active: false,
            width: 80.0,
            height: 24.0,
        }
    }

    /// `splashes` are the cells of the winning hits; with none, the burst
    /// comes from the centre of the screen.
    pub fn start(&mut self, width: u16, height: u16, splashes: &[(u16, u16)]) {
        let mut rng = rand::thread_rng();

        self.particles.clear();
        self.started_at = Instant::now();
        self.is_active = true;
        self.width = f64::from(width);
        self.height = f64::from(height);

        let centre = (self.width / 2.0, self.height / 2.0);
        let origins: Vec<(f64, f64)> = if splashes.is_empty() {
            vec![centre]
        } else {
            splashes
                .iter()
                .map(|&(col, row)| (f64::from(col), f64::from(row)))
                .collect()
        };

        let cheer = CHEERS.choose(&mut rng).unwrap_or(&"WELL DONE!");
        self.spell(cheer, &origins, &mut rng);

        for &(x, y) in &origins {
            for _ in 0..DROPLETS_PER_SPLASH {
                self.particles.push(Droplet::splash(x, y, &mut rng));
            }
        }
    }

    /// Letters fly in from the splash origins, round robin
    fn spell<R: Rng>(&mut self, text: &str, origins: &[(f64, f64)], rng: &mut R) {
        let spacing = 2.0;
        let left = self.width / 2.0 - (text.chars().count() as f64 - 1.0) * spacing / 2.0;
        let row = self.height / 2.0 - 4.0;

        for (i, ch) in text.chars().enumerate().filter(|(_, c)| *c != ' ') {
            let from = origins[i % origins.len()];
            let slot = (left + i as f64 * spacing, row);
            self.particles.push(Droplet::letter(from, slot, ch, rng));
        }
    }

    pub fn stop(&mut self) {
        self.is_active = false;
        self.particles.clear();
    }

    pub fn update(&mut self) {
        if !self.is_active {
            return;
        }
        if self.started_at.elapsed().as_secs_f64() >= self.duration {
            self.stop();
            return;
        }

        let floor = self.height - 1.0;
        let width = self.width;
        self.particles
            .retain_mut(|p| p.step(STEP, floor) && p.x >= -2.0 && p.x <= width + 2.0);
    }
}

impl Default for Celebration {
    fn default() -> Self {
        Self::new()
    }
}
