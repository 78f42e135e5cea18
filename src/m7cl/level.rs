//! Metering level codes to display levels.

/// Lower bound of the metering range, in dB.
pub const FLOOR_DB: f32 = -95.0;

/// Calibrated dB value for each metering code.
///
/// The top two codes both stand for 0 dB, as encoded by the console.
#[rustfmt::skip]
pub const METER_TO_DB: [f32; 128] = [
    -95.0, -94.0, -93.0, -92.0, -91.5, -91.0, -90.5, -90.0,
    -89.0, -88.0, -87.0, -86.0, -85.5, -85.0, -84.5, -84.0,
    -83.0, -82.0, -81.0, -80.0, -79.5, -79.0, -78.5, -78.0,
    -77.0, -76.0, -75.0, -74.0, -73.5, -73.0, -72.5, -72.0,
    -71.0, -70.0, -69.0, -68.0, -67.6, -67.0, -66.5, -66.0,
    -65.0, -64.0, -63.0, -62.0, -61.5, -61.0, -60.5, -60.0,
    -59.0, -58.0, -57.0, -56.0, -55.5, -55.0, -54.5, -54.0,
    // Code 62 reads -48.5 dB: -49.5 dB would break monotonicity.
    -53.0, -52.0, -51.0, -50.0, -49.5, -49.0, -48.5, -48.0,
    -47.0, -46.0, -45.0, -44.0, -43.5, -43.0, -42.5, -42.0,
    -41.0, -40.0, -39.0, -38.0, -37.5, -37.0, -36.5, -36.0,
    -35.0, -34.0, -33.0, -32.0, -31.5, -31.0, -30.5, -30.0,
    -29.0, -28.0, -27.0, -26.0, -25.5, -25.0, -24.5, -24.0,
    -23.0, -22.0, -21.0, -20.0, -19.5, -19.0, -18.5, -18.0,
    -17.0, -16.0, -15.0, -14.0, -13.5, -13.0, -12.5, -12.0,
    -11.0, -10.0,  -9.0,  -8.0,  -7.5,  -7.0,  -6.5,  -6.0,
     -5.0,  -4.0,  -3.0,  -2.0,  -1.5,  -1.0,   0.0,   0.0,
];

/// First code standing for 0 dB.
pub const ZERO_DB_CODE: u8 = 126;

/// Maps a dB value in `[FLOOR_DB, 0]` to a display level in `[0, 1]`.
///
/// The quadratic curve shapes the level for perceived loudness.
#[inline]
pub fn normalize(db: f32) -> f32 {
    (1.0 - db / FLOOR_DB).powi(2)
}

/// Returns the dB value for the metering `code`, if it's a valid code.
#[inline]
pub fn db(code: u8) -> Option<f32> {
    METER_TO_DB.get(code as usize).copied()
}

/// Returns the display level for the metering `code`, if it's a valid code.
#[inline]
pub fn level(code: u8) -> Option<f32> {
    db(code).map(normalize)
}
