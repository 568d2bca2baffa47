//! Field keys sent by the school monitoring firmware.
//!
//! ```
//! use sensorlink_protocol::fields;
//!
//! assert_eq!(fields::SONAR_SWEEP, [fields::SONAR_ANGLES, fields::SONAR_DISTANCES]);
//! ```

/// UID of a scanned RFID staff card (`str`).
pub const CARD_ID: &str = "IUD";

/// Gas sensor reading (`number`).
pub const GAS: &str = "Gas";

/// Flame sensor reading (`number`).
pub const FLAME: &str = "Fire";

/// Single ultrasonic distance reading (`number`).
pub const ULTRASONIC: &str = "Ultrasonic";

/// Servo angles of a sonar sweep (`collection` of `number`).
pub const SONAR_ANGLES: &str = "angles";

/// Distances measured at each sweep angle (`collection` of `number`).
pub const SONAR_DISTANCES: &str = "distances";

/// A sonar sweep is only usable with both halves, so it is watched as a group.
pub const SONAR_SWEEP: [&str; 2] = [SONAR_ANGLES, SONAR_DISTANCES];
