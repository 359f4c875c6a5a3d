// THEORY:
// The `colormap` module turns a normalized difference field into something a
// person can look at. It owns the palettes and nothing else: no file I/O, no
// knowledge of how the field was produced.
//
// - `Palette::Jet` is the continuous cold-to-hot ramp (dark blue, blue, cyan,
//   yellow, red, dark red). It reads the normalized value and saturates at both
//   ends: exactly `COLDEST` at 0.0 and exactly `HOTTEST` at 1.0.
// - `Palette::Banded` is the hard-threshold palette paired with the gray
//   difference metric. It reads the raw distance and paints four fixed bands,
//   still ordered from cold to hot.

pub mod colormap {
    use crate::core_modules::field::field::Field;
    use crate::error::{Result, ScoreError};
    use image::{Rgb, RgbImage};

    /// Jet at 0.0.
    pub const COLDEST: Rgb<u8> = Rgb([0, 0, 127]);
    /// Jet at 1.0.
    pub const HOTTEST: Rgb<u8> = Rgb([127, 0, 0]);

    /// Raw-distance thresholds for the banded palette (gray levels, 0..255).
    pub const BAND_THRESHOLDS: [f32; 4] = [0.0, 50.0, 100.0, 150.0];
    /// One color per threshold, coldest first.
    pub const BAND_COLORS: [Rgb<u8>; 4] = [
        Rgb([173, 216, 230]), // light blue
        Rgb([0, 255, 0]),     // green
        Rgb([255, 165, 0]),   // orange
        Rgb([255, 0, 0]),     // red
    ];

    // Piecewise-linear anchors (position, intensity) of the classic jet ramp.
    const JET_RED: &[(f32, f32)] = &[(0.0, 0.0), (0.35, 0.0), (0.66, 1.0), (0.89, 1.0), (1.0, 0.5)];
    const JET_GREEN: &[(f32, f32)] = &[
        (0.0, 0.0),
        (0.125, 0.0),
        (0.375, 1.0),
        (0.64, 1.0),
        (0.91, 0.0),
        (1.0, 0.0),
    ];
    const JET_BLUE: &[(f32, f32)] =
        &[(0.0, 0.5), (0.11, 1.0), (0.34, 1.0), (0.65, 0.0), (1.0, 0.0)];

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Palette {
        Jet,
        Banded,
    }

    impl Palette {
        /// Color for one pixel, given its normalized value and its raw distance.
        pub fn color(&self, normalized: f32, distance: f32) -> Rgb<u8> {
            match self {
                Palette::Jet => jet(normalized),
                Palette::Banded => banded(distance),
            }
        }

        /// Renders a whole field. Both fields must share dimensions.
        pub fn render(&self, normalized: &Field, distance: &Field) -> Result<RgbImage> {
            let mismatch = || ScoreError::DimensionMismatch {
                left: normalized.dimensions(),
                right: distance.dimensions(),
            };
            if normalized.dimensions() != distance.dimensions()
                || normalized.values.len() != distance.values.len()
            {
                return Err(mismatch());
            }

            let (width, height) = normalized.dimensions();
            let mut buffer = Vec::with_capacity(normalized.values.len() * 3);
            for (n, d) in normalized.values.iter().zip(&distance.values) {
                let Rgb([r, g, b]) = self.color(*n, *d);
                buffer.extend_from_slice(&[r, g, b]);
            }
            RgbImage::from_raw(width, height, buffer).ok_or_else(mismatch)
        }
    }

    fn interpolate(anchors: &[(f32, f32)], t: f32) -> f32 {
        for pair in anchors.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            if t <= x1 {
                let ratio = if x1 > x0 { (t - x0) / (x1 - x0) } else { 0.0 };
                return y0 + (y1 - y0) * ratio;
            }
        }
        anchors.last().map(|(_, y)| *y).unwrap_or(0.0)
    }

    /// Continuous jet color for a value in [0,1]; out-of-range values saturate.
    pub fn jet(value: f32) -> Rgb<u8> {
        let t = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        let to_byte = |v: f32| (v * 255.0) as u8;
        Rgb([
            to_byte(interpolate(JET_RED, t)),
            to_byte(interpolate(JET_GREEN, t)),
            to_byte(interpolate(JET_BLUE, t)),
        ])
    }

    /// Banded color for a raw gray-level distance.
    pub fn banded(distance: f32) -> Rgb<u8> {
        let band = BAND_THRESHOLDS
            .iter()
            .rposition(|threshold| distance >= *threshold)
            .unwrap_or(0);
        BAND_COLORS[band]
    }

}
