//! Simulation configuration: an immutable per-tick snapshot.
//!
//! The step function reads the configuration but never mutates it. Callers
//! assemble a [`SimConfig`] once (e.g. from UI controls) and pass it by
//! reference each tick. Out-of-range values are a contract violation for
//! the step function, so [`SimConfig::validate`] must be called at the
//! boundary; the engine constructor does this.

use crate::fixed::{fx, Fixed64};

/// Highest accepted emission rate. Keeps the gate interval at or above
/// one millisecond and the rate inside the fixed-point integer range.
pub const MAX_PPM: u32 = 60_000;

/// Largest sensor capacity that still places the sensor coordinate on
/// the line, downstream of the source.
pub const MAX_SENSOR_CAP: u32 = 70;

// ---------------------------------------------------------------------------
// Distribution policy selector
// ---------------------------------------------------------------------------

/// Which policy picks the receiving path for the next emitted unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DistributionLogic {
    /// Rotate through the paths, feeding the next requesting one.
    RoundRobin,
    /// Lock onto the oldest requester and feed it until it stops requesting.
    Batch,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Feeding-line configuration, read-only per tick.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SimConfig {
    /// Active distribution policy.
    pub logic: DistributionLogic,
    /// Emission rate in units per minute. Must be within `1..=MAX_PPM`.
    pub ppm: u32,
    /// MIN sensor position, in unit-slot counts back from the take point.
    pub min_cap: u32,
    /// MAX sensor position, in unit-slot counts back from the take point.
    /// Must be >= `min_cap` (the MAX sensor sits farther upstream) and
    /// <= `MAX_SENSOR_CAP`.
    pub max_cap: u32,
    /// Global-outage likelihood knob, 0..=100.
    pub prob_global: u32,
    /// Unit advance rate, distance per reference tick. Must be >= 0.
    pub path_speed: Fixed64,
    /// Time-scale multiplier applied by the caller-side stepping loop
    /// ([`crate::engine::Engine::advance`]). The step function itself
    /// never reads this. Must be >= 0.
    pub speed: Fixed64,
}

impl Default for SimConfig {
    /// Defaults mirror the reference line: 55 ppm, sensors at slots 5/10,
    /// 4% outage knob, Round-Robin.
    fn default() -> Self {
        Self {
            logic: DistributionLogic::RoundRobin,
            ppm: 55,
            min_cap: 5,
            max_cap: 10,
            prob_global: 4,
            path_speed: fx(3),
            speed: fx(1),
        }
    }
}

/// A configuration value the step contract cannot accept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("ppm must be > 0 (got {0}); the emission gate would never open")]
    ZeroPpm(u32),
    #[error("ppm must be <= {MAX_PPM} (got {0}); the gate interval would drop below 1 ms")]
    PpmTooHigh(u32),
    #[error("max_cap ({0}) must be <= {MAX_SENSOR_CAP}; the sensor would sit behind the source")]
    CapBeyondLine(u32),
    #[error("max_cap ({max_cap}) must be >= min_cap ({min_cap}); sensors would be inverted")]
    InvertedSensorCaps { min_cap: u32, max_cap: u32 },
    #[error("prob_global must be within 0..=100 (got {0})")]
    ProbOutOfRange(u32),
    #[error("path_speed must be >= 0")]
    NegativePathSpeed,
    #[error("speed must be >= 0")]
    NegativeSpeed,
}

impl SimConfig {
    /// Check every boundary-input precondition of the step contract.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ppm == 0 {
            return Err(ConfigError::ZeroPpm(self.ppm));
        }
        if self.ppm > MAX_PPM {
            return Err(ConfigError::PpmTooHigh(self.ppm));
        }
        if self.max_cap < self.min_cap {
            return Err(ConfigError::InvertedSensorCaps {
                min_cap: self.min_cap,
                max_cap: self.max_cap,
            });
        }
        if self.max_cap > MAX_SENSOR_CAP {
            return Err(ConfigError::CapBeyondLine(self.max_cap));
        }
        if self.prob_global > 100 {
            return Err(ConfigError::ProbOutOfRange(self.prob_global));
        }
        if self.path_speed < Fixed64::ZERO {
            return Err(ConfigError::NegativePathSpeed);
        }
        if self.speed < Fixed64::ZERO {
            return Err(ConfigError::NegativeSpeed);
        }
        Ok(())
    }

    /// Emission gate interval in milliseconds: `60000 / ppm`.
    pub fn ms_per_unit(&self) -> Fixed64 {
        fx(60_000) / Fixed64::from_num(self.ppm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_ppm_rejected() {
        let config = SimConfig {
            ppm: 0,
            ..SimConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroPpm(0)));
    }

    #[test]
    fn inverted_caps_rejected() {
        let config = SimConfig {
            min_cap: 10,
            max_cap: 5,
            ..SimConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedSensorCaps {
                min_cap: 10,
                max_cap: 5
            })
        );
    }

    #[test]
    fn huge_ppm_rejected_before_it_can_overflow() {
        let config = SimConfig {
            ppm: u32::MAX,
            ..SimConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::PpmTooHigh(u32::MAX)));

        // The highest accepted rate still converts cleanly.
        let config = SimConfig {
            ppm: MAX_PPM,
            ..SimConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.ms_per_unit(), fx(1));
    }

    #[test]
    fn huge_caps_rejected_before_they_can_overflow() {
        let config = SimConfig {
            max_cap: u32::MAX,
            ..SimConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::CapBeyondLine(u32::MAX)));

        // The largest accepted capacity keeps the sensor on the line.
        let config = SimConfig {
            max_cap: MAX_SENSOR_CAP,
            ..SimConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
        assert!(crate::path::sensor_x(MAX_SENSOR_CAP) > crate::path::SOURCE_X);
    }

    #[test]
    fn prob_out_of_range_rejected() {
        let config = SimConfig {
            prob_global: 101,
            ..SimConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ProbOutOfRange(101)));
    }

    #[test]
    fn negative_rates_rejected() {
        let config = SimConfig {
            path_speed: fx(-1),
            ..SimConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NegativePathSpeed));

        let config = SimConfig {
            speed: fx(-1),
            ..SimConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NegativeSpeed));
    }

    #[test]
    fn ms_per_unit_at_60_ppm() {
        let config = SimConfig {
            ppm: 60,
            ..SimConfig::default()
        };
        assert_eq!(config.ms_per_unit(), fx(1000));
    }

    #[test]
    fn error_messages_name_the_field() {
        let err = ConfigError::InvertedSensorCaps {
            min_cap: 7,
            max_cap: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("max_cap (3)"));
        assert!(msg.contains("min_cap (7)"));
    }
}
