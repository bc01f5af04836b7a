use std::f64::consts::PI;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use time::OffsetDateTime;

/// Fraction of the current UTC day elapsed, in `[0, 1)`.
pub fn day_fraction(now: OffsetDateTime) -> f64 {
    let (hour, minute, second) = now.to_hms();
    let seconds_since_midnight = hour as u32 * 3600 + minute as u32 * 60 + second as u32;
    seconds_since_midnight as f64 / 86400.0
}

/// Indoor temperature following the sun with a peak mid afternoon.
pub fn simulated_temperature(day_fraction: f64) -> f64 {
    let radians = (day_fraction - 0.375) * 2.0 * PI;
    radians.sin() * 3.0 + 26.0
}

pub fn simulated_humidity(day_fraction: f64) -> f64 {
    let radians = day_fraction * 2.0 * PI;

    if (0.3..=0.7).contains(&day_fraction) {
        (radians.sin().max(0.0) * 10.0) + 55.0
    } else {
        (radians.cos().max(0.0) * 12.0) + 58.0
    }
}

/// First reading of a freshly installed sensor: temperature in `[25, 30)`,
/// humidity in `[50, 70)`.
pub fn first_reading<R: Rng + ?Sized>(rng: &mut R) -> (f32, f32) {
    let temperature = floor_tenth(rng.random_range(25.0..30.0));
    let humidity = floor_tenth(rng.random_range(50.0..70.0));
    (temperature, humidity)
}

/// Moves a reading a step toward the daily curve, plus some sensor noise.
pub fn drift_reading<R: Rng + ?Sized>(
    rng: &mut R,
    temperature: f32,
    humidity: f32,
    day_fraction: f64,
) -> (f32, f32) {
    const PULL: f64 = 0.1;

    let temperature = temperature as f64;
    let humidity = humidity as f64;

    let temperature = temperature
        + (simulated_temperature(day_fraction) - temperature) * PULL
        + noise(rng, 0.15);
    let humidity = humidity
        + (simulated_humidity(day_fraction) - humidity) * PULL
        + noise(rng, 0.5);

    (
        round_tenth(temperature) as f32,
        round_tenth(humidity.clamp(0.0, 100.0)) as f32,
    )
}

fn noise<R: Rng + ?Sized>(rng: &mut R, deviation: f64) -> f64 {
    Normal::new(0.0, deviation)
        .map(|normal| normal.sample(rng))
        .unwrap_or(0.0)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn floor_tenth(value: f32) -> f32 {
    (value * 10.0).floor() / 10.0
}
