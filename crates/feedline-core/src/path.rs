//! One conveyor lane: its unit queue, motion, sensors, and demand state.
//!
//! A path owns an ordered queue of [`Unit`]s, lead first. Each tick the
//! units compact toward the take point (lead targets the take-point
//! coordinate, every trailing unit targets one spacing behind the unit
//! ahead), two virtual occupancy sensors are re-evaluated with a dwell
//! debounce, and the request-for-material flag is derived from them.

use crate::fixed::{fx, Fixed64, Millis};
use crate::unit::Unit;

// ---------------------------------------------------------------------------
// Line geometry and sensor timing
// ---------------------------------------------------------------------------

/// Radius of one unit; also the tolerance band at the take point.
pub const UNIT_RADIUS: Fixed64 = fx(4);

/// Minimum gap between adjacent units (two radii plus clearance).
pub const UNIT_SPACING: Fixed64 = fx(11);

/// Coordinate at which the source emits new units.
pub const SOURCE_X: Fixed64 = fx(50);

/// Coordinate of the take point at the downstream end of every path.
pub const TAKE_POINT_X: Fixed64 = fx(820);

/// Continuous occupancy required before a sensor activates.
pub const SENSOR_DWELL_MS: Millis = fx(500);

/// Half-width of the occupancy window around a sensor coordinate
/// (0.6 * UNIT_SPACING, exact in Q32.32 as 33/5).
pub const SENSOR_WINDOW: Fixed64 = Fixed64::from_bits((33i64 << 32) / 5);

/// Sensor coordinate for a capacity expressed in unit slots back from
/// the take point: `TAKE_POINT_X - (cap - 0.5) * UNIT_SPACING`.
pub fn sensor_x(cap: u32) -> Fixed64 {
    TAKE_POINT_X - (Fixed64::from_num(cap) - Fixed64::from_num(0.5)) * UNIT_SPACING
}

// ---------------------------------------------------------------------------
// Path
// ---------------------------------------------------------------------------

/// One conveyor lane with its own queue, sensors, and demand state.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Path {
    /// Lane index, 0..N-1, fixed at construction.
    pub id: usize,
    /// Unit queue ordered from lead (closest to take point) to tail.
    pub units: Vec<Unit>,
    /// True while blocked by global downtime.
    pub is_down: bool,
    /// Timestamp until which the path is flagged as starved after a miss.
    pub starvation_until: Millis,
    /// Timestamp of the last synchronized take evaluation.
    pub last_take_time: Millis,
    /// When continuous MIN occupancy began (0 = not timing).
    pub min_sensor_since: Millis,
    /// When continuous MAX occupancy began (0 = not timing).
    pub max_sensor_since: Millis,
    /// Debounced MIN sensor activation flag.
    pub min_active: bool,
    /// Debounced MAX sensor activation flag.
    pub max_active: bool,
    /// Demand flag: true while the path wants more material.
    pub request_material: bool,
    /// When the current request began (0 = not requesting). Breaks ties
    /// in the Batch policy: oldest request served first.
    pub request_start_time: Millis,
    /// Units successfully taken.
    pub processed_units: u64,
    /// Take cycles missed.
    pub missed_units: u64,
    /// Cumulative time spent down, for statistics.
    pub total_downtime: Millis,
    /// Start of the currently open downtime interval (0 = not down).
    pub downtime_start: Millis,
}

impl Path {
    /// A fresh, empty lane. New lanes start out requesting material.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            units: Vec::new(),
            is_down: false,
            starvation_until: Fixed64::ZERO,
            last_take_time: Fixed64::ZERO,
            min_sensor_since: Fixed64::ZERO,
            max_sensor_since: Fixed64::ZERO,
            min_active: false,
            max_active: false,
            request_material: true,
            request_start_time: Fixed64::ZERO,
            processed_units: 0,
            missed_units: 0,
            total_downtime: Fixed64::ZERO,
            downtime_start: Fixed64::ZERO,
        }
    }

    // -----------------------------------------------------------------------
    // Motion
    // -----------------------------------------------------------------------

    /// Advance every unit toward its target by `path_speed * dt_ratio`,
    /// clamped so it never overshoots.
    ///
    /// The lead unit targets [`TAKE_POINT_X`]; unit `i` targets one
    /// [`UNIT_SPACING`] behind unit `i-1`'s position as already advanced
    /// this tick, which compacts the queue without overlap.
    pub fn advance_units(&mut self, path_speed: Fixed64, dt_ratio: Fixed64) {
        let step = path_speed * dt_ratio;
        for i in 0..self.units.len() {
            let target = if i == 0 {
                TAKE_POINT_X
            } else {
                self.units[i - 1].position - UNIT_SPACING
            };
            let unit = &mut self.units[i];
            if unit.position < target {
                unit.position += step;
                unit.is_moving = true;
                if unit.position >= target {
                    unit.position = target;
                    unit.is_moving = false;
                }
            } else {
                unit.is_moving = false;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Sensors
    // -----------------------------------------------------------------------

    /// Whether any unit sits within the occupancy window of `x`.
    pub fn sensor_occupied(&self, x: Fixed64) -> bool {
        self.units.iter().any(|u| {
            let d = u.position - x;
            d > -SENSOR_WINDOW && d < SENSOR_WINDOW
        })
    }

    /// Re-evaluate both sensors with the dwell debounce.
    ///
    /// Activation requires continuous occupancy longer than
    /// [`SENSOR_DWELL_MS`]; deactivation is immediate and resets the
    /// dwell timer. MIN and MAX use the identical rule.
    pub fn update_sensors(&mut self, now: Millis, min_x: Fixed64, max_x: Fixed64) {
        if self.sensor_occupied(min_x) {
            if self.min_sensor_since == Fixed64::ZERO {
                self.min_sensor_since = now;
            }
            if now - self.min_sensor_since > SENSOR_DWELL_MS {
                self.min_active = true;
            }
        } else {
            self.min_sensor_since = Fixed64::ZERO;
            self.min_active = false;
        }

        if self.sensor_occupied(max_x) {
            if self.max_sensor_since == Fixed64::ZERO {
                self.max_sensor_since = now;
            }
            if now - self.max_sensor_since > SENSOR_DWELL_MS {
                self.max_active = true;
            }
        } else {
            self.max_sensor_since = Fixed64::ZERO;
            self.max_active = false;
        }
    }

    /// Derive the request flag from the sensors.
    ///
    /// MIN inactive forces the flag on (space upstream); MAX active
    /// forces it off and wins when both conditions hold; otherwise the
    /// flag persists. Stamps `request_start_time` on the off-to-on edge.
    pub fn update_request(&mut self, now: Millis) {
        let prev = self.request_material;
        if !self.min_active {
            self.request_material = true;
        }
        if self.max_active {
            self.request_material = false;
        }
        if self.request_material && !prev {
            self.request_start_time = now;
        }
        if !self.request_material {
            self.request_start_time = Fixed64::ZERO;
        }
    }

    // -----------------------------------------------------------------------
    // Bookkeeping
    // -----------------------------------------------------------------------

    /// Fold open downtime intervals into the cumulative counter.
    pub fn update_downtime_clock(&mut self, now: Millis) {
        if self.is_down && self.downtime_start == Fixed64::ZERO {
            self.downtime_start = now;
        }
        if !self.is_down && self.downtime_start != Fixed64::ZERO {
            self.total_downtime += now - self.downtime_start;
            self.downtime_start = Fixed64::ZERO;
        }
    }

    /// Ready for a take: at least one unit, and the lead unit at or past
    /// the take point (within the radius tolerance). An empty queue
    /// degrades to "not ready", never to an illegal access.
    pub fn lead_ready(&self) -> bool {
        self.units
            .first()
            .is_some_and(|u| u.position >= TAKE_POINT_X - UNIT_RADIUS)
    }

    /// Whether the path is currently flagged as starved (render surface).
    pub fn is_starved(&self, now: Millis) -> bool {
        self.starvation_until > now
    }
}

// ===========================================================================
// Tests
// ===========================================================================
