//! Simplified engine and drivetrain model.
//!
//! A pure function chain maps throttle input to per-wheel drive force:
//!
//! ```text
//! throttle ──▶ RPM ──▶ engine torque ──▶ × gear × final drive ──▶ / radius
//! ```
//!
//! RPM is a linear map of throttle between idle and max; there is no
//! flywheel state and no engine braking. The torque curve is piecewise:
//! a ramp to 60 % of peak below 20 % of max RPM, a peak plateau to 50 %,
//! and a linear fall-off above. The fall-off is intentionally unclamped and
//! goes negative past 175 % of max RPM; with RPM capped at max this never
//! triggers, but the behavior is preserved as-is rather than papered over.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, VehicleError};

/// Piecewise engine torque curve.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TorqueCurve {
    /// Peak torque (N·m).
    pub max_torque: f64,
    /// RPM at which the curve is normalized.
    pub max_rpm: f64,
}

impl TorqueCurve {
    /// Engine torque at the given RPM.
    #[must_use]
    pub fn torque_at(&self, rpm: f64) -> f64 {
        let n = rpm / self.max_rpm;
        if n < 0.2 {
            // Ramp from zero to 60 % of peak over the low range.
            self.max_torque * 0.6 * (n / 0.2)
        } else if n <= 0.5 {
            self.max_torque
        } else {
            // Unclamped linear fall-off; crosses zero at n = 1.75.
            self.max_torque * (1.0 - (n - 0.5) * 0.8)
        }
    }
}

/// Engine and gearbox configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DrivetrainConfig {
    /// Idle engine speed (RPM).
    pub idle_rpm: f64,
    /// Maximum engine speed (RPM).
    pub max_rpm: f64,
    /// Peak engine torque (N·m).
    pub max_torque: f64,
    /// Gear ratios, first gear first.
    pub gear_ratios: Vec<f64>,
    /// Final drive ratio.
    pub final_drive: f64,
}

impl Default for DrivetrainConfig {
    fn default() -> Self {
        Self {
            idle_rpm: 800.0,
            max_rpm: 7000.0,
            max_torque: 300.0,
            gear_ratios: vec![3.5, 2.2, 1.5, 1.1, 0.8],
            final_drive: 3.9,
        }
    }
}

impl DrivetrainConfig {
    fn validate(&self) -> Result<()> {
        if self.gear_ratios.is_empty() {
            return Err(VehicleError::invalid_drivetrain("gear table is empty"));
        }
        if self.max_rpm <= self.idle_rpm || self.idle_rpm < 0.0 {
            return Err(VehicleError::invalid_drivetrain(format!(
                "RPM range [{}, {}] is not usable",
                self.idle_rpm, self.max_rpm
            )));
        }
        Ok(())
    }
}

/// Engine/gearbox state: current gear and current RPM.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Drivetrain {
    config: DrivetrainConfig,
    curve: TorqueCurve,
    /// 1-based gear index into `config.gear_ratios`.
    current_gear: usize,
    rpm: f64,
}

impl Drivetrain {
    /// Create a drivetrain in first gear at idle.
    pub fn new(config: DrivetrainConfig) -> Result<Self> {
        config.validate()?;
        let curve = TorqueCurve {
            max_torque: config.max_torque,
            max_rpm: config.max_rpm,
        };
        let rpm = config.idle_rpm;
        Ok(Self {
            config,
            curve,
            current_gear: 1,
            rpm,
        })
    }

    /// The drivetrain configuration.
    #[must_use]
    pub const fn config(&self) -> &DrivetrainConfig {
        &self.config
    }

    /// The torque curve derived from the configuration.
    #[must_use]
    pub const fn torque_curve(&self) -> &TorqueCurve {
        &self.curve
    }

    /// Current engine speed (RPM).
    #[must_use]
    pub const fn rpm(&self) -> f64 {
        self.rpm
    }

    /// Current gear, 1-based.
    #[must_use]
    pub const fn current_gear(&self) -> usize {
        self.current_gear
    }

    /// Select a gear. Out-of-range selections are ignored so the current
    /// gear always indexes validly into the gear table.
    pub fn set_gear(&mut self, gear: usize) {
        if gear >= 1 && gear <= self.config.gear_ratios.len() {
            self.current_gear = gear;
        }
    }

    /// Drop back to idle RPM.
    pub fn set_idle(&mut self) {
        self.rpm = self.config.idle_rpm;
    }

    /// Total drive force at the wheels for a throttle input.
    ///
    /// Throttle ≤ 0 drops the engine to idle and produces zero force (no
    /// engine braking model). Otherwise RPM is mapped linearly between idle
    /// and max, run through the torque curve, multiplied through the current
    /// gear and final drive, and divided by the wheel radius. The caller
    /// splits the result evenly across driven wheels.
    pub fn wheel_force(&mut self, throttle: f64, wheel_radius: f64) -> f64 {
        if throttle <= 0.0 {
            self.rpm = self.config.idle_rpm;
            return 0.0;
        }
        let throttle = throttle.min(1.0);
        self.rpm = self.config.idle_rpm + (self.config.max_rpm - self.config.idle_rpm) * throttle;

        let engine_torque = self.curve.torque_at(self.rpm);
        let gear_ratio = self.config.gear_ratios[self.current_gear - 1];
        let wheel_torque = engine_torque * gear_ratio * self.config.final_drive;
        wheel_torque / wheel_radius
    }
}
