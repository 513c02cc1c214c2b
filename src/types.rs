use std::ops::{Add, AddAssign, Deref, Sub};

use parse_display::Display;
use serde::{Deserialize, Serialize};

/// A point on the simulation clock, in seconds
#[derive(Debug, Clone, Copy, Default, PartialOrd, PartialEq, Display, Serialize, Deserialize)]
#[display("{0:.3}")]
pub struct Time(pub f64);

/// A span of simulation time, in seconds
#[derive(Debug, Clone, Copy, Default, PartialOrd, PartialEq, Display, Serialize, Deserialize)]
#[display("{0:.3}")]
pub struct Duration(pub f64);

impl Duration {
    pub const ZERO: Duration = Duration(0.0);

    pub fn millis(self) -> f64 {
        self.0 * 1000.0
    }
}

impl Deref for Duration {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Add<Duration> for Time {
    type Output = Time;

    fn add(self, rhs: Duration) -> Self::Output {
        Time(self.0 + rhs.0)
    }
}

impl AddAssign<Duration> for Time {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.0;
    }
}

impl Sub for Time {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        Duration(self.0 - rhs.0)
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Self) -> Self::Output {
        Duration(self.0 + rhs.0)
    }
}
