//! Integer weight units.
//!
//! Weights travel as fractional kilograms but are stored and compared as
//! centiunits (1/100 kg) so that capacity arithmetic stays exact.

/// Weight in hundredths of a kilogram.
pub type Centiunits = i64;

pub const CENTIUNITS_PER_KILOGRAM: Centiunits = 100;

/// Convert kilograms to centiunits, rounding to the nearest unit.
pub fn kilograms_to_centiunits(kilograms: f64) -> Centiunits {
    (kilograms * CENTIUNITS_PER_KILOGRAM as f64).round() as Centiunits
}
