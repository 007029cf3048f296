// Operata
// Copyright (C) 2021  Wesley Merkel
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Deterministic chaotic generators.
//!
//! These are small iterated systems used as sources of variation. They are fully deterministic:
//! the same generator stepped the same number of times always yields the same value, and
//! [`Chaos::reset`] returns it to where it started. Frames step them once per element, and
//! multiplying a generator by `n` steps a copy of it `n` times.

use crate::operand::{assign_common, Op, Operand, Operate};
use serde::{Deserialize, Serialize};

/// An iterated system that produces a number at each step.
pub trait Chaos {
    /// Advances the system by one iteration.
    fn step(&mut self);

    /// The current value of the system.
    fn value(&self) -> f64;

    /// Returns the system to its initial state.
    fn reset(&mut self);

    /// Advances the system and returns its new value.
    fn next_value(&mut self) -> f64 {
        self.step();
        self.value()
    }
}

/// Counts up by `steps`, wrapping around at `amplitude`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modulus {
    pub amplitude: f64,
    pub steps: f64,
    xn: f64,
    x0: f64,
}

impl Modulus {
    pub fn new(amplitude: f64, steps: f64) -> Modulus {
        Modulus {
            amplitude,
            steps,
            xn: 0.0,
            x0: 0.0,
        }
    }

    /// Moves the counter and its starting point to `xn`.
    pub fn start_at(&mut self, xn: f64) {
        self.xn = self.wrap(xn);
        self.x0 = self.xn;
    }

    fn wrap(&self, value: f64) -> f64 {
        if self.amplitude == 0.0 {
            value
        } else {
            value.rem_euclid(self.amplitude)
        }
    }
}

impl Default for Modulus {
    fn default() -> Self {
        Modulus::new(12.0, 1.0)
    }
}

impl Chaos for Modulus {
    fn step(&mut self) {
        self.xn = self.wrap(self.xn + self.steps);
    }

    fn value(&self) -> f64 {
        self.xn
    }

    fn reset(&mut self) {
        self.xn = self.x0;
    }
}

/// A two state [`Modulus`] that yields 0 below `split` and 1 from it on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Flipper {
    pub modulus: Modulus,
    pub split: f64,
}

impl Default for Flipper {
    fn default() -> Self {
        Flipper {
            modulus: Modulus::new(2.0, 1.0),
            split: 1.0,
        }
    }
}

impl Chaos for Flipper {
    fn step(&mut self) {
        self.modulus.step();
    }

    fn value(&self) -> f64 {
        if self.modulus.value() < self.split {
            0.0
        } else {
            1.0
        }
    }

    fn reset(&mut self) {
        self.modulus.reset();
    }
}

/// A point bouncing around the inside of a `width` by `height` box.
///
/// Its value is the point's distance from the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bouncer {
    pub width: f64,
    pub height: f64,
    pub dx: f64,
    pub dy: f64,
    x: f64,
    y: f64,
    start: (f64, f64),
}

impl Bouncer {
    pub fn new(width: f64, height: f64, dx: f64, dy: f64) -> Bouncer {
        let start = (width / 2.0, height / 2.0);
        Bouncer {
            width,
            height,
            dx,
            dy,
            x: start.0,
            y: start.1,
            start,
        }
    }

    /// The current point.
    pub fn point(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

impl Default for Bouncer {
    fn default() -> Self {
        Bouncer::new(16.0, 9.0, 0.555, 0.555)
    }
}

fn bounce(position: f64, delta: &mut f64, limit: f64) -> f64 {
    let moved = position + *delta;
    if limit <= 0.0 {
        moved
    } else if moved < 0.0 {
        *delta = -*delta;
        (-moved).rem_euclid(limit)
    } else if moved >= limit {
        *delta = -*delta;
        limit - moved.rem_euclid(limit)
    } else {
        moved
    }
}

impl Chaos for Bouncer {
    fn step(&mut self) {
        self.x = bounce(self.x, &mut self.dx, self.width);
        self.y = bounce(self.y, &mut self.dy, self.height);
    }

    fn value(&self) -> f64 {
        self.x.hypot(self.y)
    }

    fn reset(&mut self) {
        self.x = self.start.0;
        self.y = self.start.1;
    }
}

/// The iterated map `x = x + lambda * sin(x)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SinX {
    pub lambda: f64,
    xn: f64,
    x0: f64,
}

impl SinX {
    pub fn new(lambda: f64, x0: f64) -> SinX {
        SinX { lambda, xn: x0, x0 }
    }
}

impl Default for SinX {
    fn default() -> Self {
        SinX::new(8.0, 2.0)
    }
}

impl Chaos for SinX {
    fn step(&mut self) {
        self.xn += self.lambda * self.xn.sin();
    }

    fn value(&self) -> f64 {
        self.xn
    }

    fn reset(&mut self) {
        self.xn = self.x0;
    }
}

macro_rules! chaos_operand {
    ($name:ident, |$this:ident, $start:ident| $start_at:expr) => {
        impl Operate for $name {
            fn extract(&self, selector: &Operand) -> Operand {
                match selector {
                    Operand::$name(_) => Operand::$name(*self),
                    Operand::Int(_) => Operand::Int(self.value().trunc() as i64),
                    Operand::Float(_) => Operand::Float(self.value()),
                    Operand::Str(_) => Operand::Str(self.value().to_string()),
                    _ => selector.clone(),
                }
            }

            fn assign(&mut self, source: &Operand) {
                if assign_common(self, source) {
                    return;
                }
                match source {
                    Operand::$name(chaos) => *self = *chaos,
                    Operand::Null => self.reset(),
                    Operand::Int(_) | Operand::Float(_) | Operand::Fraction(_) => {
                        if let Some($start) = source.as_f64() {
                            let $this = self;
                            $start_at
                        }
                    }
                    _ => {}
                }
            }

            /// Multiplying by `n` steps a copy `n` times.
            fn combine(&self, op: Op, operand: &Operand) -> Operand {
                let mut chaos = *self;
                if let (Op::Mul, Some(iterations)) = (op, operand.as_i64()) {
                    for _ in 0..iterations.max(0) {
                        chaos.step();
                    }
                }
                Operand::$name(chaos)
            }

            fn scalar(&self) -> Option<f64> {
                Some(self.value())
            }
        }
    };
}

chaos_operand!(Modulus, |this, start| this.start_at(start));
chaos_operand!(Flipper, |this, start| this.modulus.start_at(start));
chaos_operand!(Bouncer, |this, start| {
    this.start = (start, start);
    this.reset();
});
chaos_operand!(SinX, |this, start| {
    this.x0 = start;
    this.reset();
});

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(chaos: &mut impl Chaos, count: usize) -> Vec<f64> {
        (0..count).map(|_| chaos.next_value()).collect()
    }

    #[test]
    fn modulus_wraps() {
        let mut modulus = Modulus::new(4.0, 3.0);
        assert_eq!(vec![3.0, 2.0, 1.0, 0.0, 3.0], run(&mut modulus, 5));
        modulus.reset();
        assert_eq!(0.0, modulus.value());
    }

    #[test]
    fn flipper_alternates() {
        let mut flipper = Flipper::default();
        assert_eq!(vec![1.0, 0.0, 1.0, 0.0], run(&mut flipper, 4));
    }

    #[test]
    fn bouncer_stays_inside_its_box() {
        let mut bouncer = Bouncer::new(2.0, 1.0, 0.7, 0.3);
        for _ in 0..100 {
            bouncer.step();
            let (x, y) = bouncer.point();
            assert!((0.0..=2.0).contains(&x), "x out of bounds: {}", x);
            assert!((0.0..=1.0).contains(&y), "y out of bounds: {}", y);
        }
    }

    #[test]
    fn generators_are_deterministic() {
        let mut first = SinX::default();
        let mut second = SinX::default();
        assert_eq!(run(&mut first, 10), run(&mut second, 10));
        first.reset();
        assert_eq!(SinX::default(), first);
    }

    #[test]
    fn multiplying_steps_a_copy() {
        let modulus = Modulus::default();
        assert_eq!(Operand::Int(5), &(&modulus * 5) % 0);
        assert_eq!(0.0, modulus.value());
        assert_eq!(Operand::Int(7), &(Modulus::default() << 7) % 0);
    }
}
