// THEORY:
// The `SmartPixel` module provides the comparative half of the pixel layer. A
// `SmartPixel` wraps a "dumb" `Pixel` and quantifies how far it is from another
// one. Two "lenses" are offered, selected through `DistanceMetric`:
//
// - `EuclideanRgb`: straight-line distance between the two colors in RGB space.
//   Ranges from 0 to sqrt(3) * 255 (about 441.67).
// - `ThresholdBanded`: luminance of the per-channel absolute difference, a single
//   gray value in 0..255 that is later painted with hard color bands.
//
// Both lenses are non-decreasing in every per-channel difference, so moving one
// image's color further from the other's never lowers the distance.

pub mod smart_pixel {
    use crate::core_modules::pixel::pixel::*;
    use serde::{Deserialize, Serialize};

    pub type Distance = f32;

    /// The per-pixel color distance used to build a distance field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum DistanceMetric {
        /// `sqrt(dr^2 + dg^2 + db^2)` on the 0..255 channel scale.
        #[default]
        EuclideanRgb,
        /// Rec. 601 gray value of `|dr|, |dg|, |db|`.
        ThresholdBanded,
    }

    impl DistanceMetric {
        pub fn distance(&self, a: &Pixel, b: &Pixel) -> Distance {
            let left = SmartPixel::new(*a);
            let right = SmartPixel::new(*b);
            match self {
                DistanceMetric::EuclideanRgb => left.euclidean_distance(&right),
                DistanceMetric::ThresholdBanded => left.gray_difference(&right),
            }
        }
    }

    /// An analytical tool that wraps a `Pixel` to provide comparison methods.
    pub struct SmartPixel {
        /// The raw `Pixel` data this `SmartPixel` is analyzing.
        pub pixel: Pixel,
    }

    impl SmartPixel {
        pub fn new(pixel: Pixel) -> Self {
            Self { pixel }
        }

        /// Per-channel absolute difference, as a pixel-shaped triple.
        pub fn absolute_difference(&self, other: &SmartPixel) -> [ComputedChannel; CHANNELS] {
            let a = self.pixel.computed();
            let b = other.pixel.computed();
            [(a[0] - b[0]).abs(), (a[1] - b[1]).abs(), (a[2] - b[2]).abs()]
        }

        pub fn euclidean_distance(&self, other: &SmartPixel) -> Distance {
            self.absolute_difference(other)
                .iter()
                .map(|d| d * d)
                .sum::<Distance>()
                .sqrt()
        }

        pub fn gray_difference(&self, other: &SmartPixel) -> Distance {
            Pixel::from_computed(self.absolute_difference(other)).luminance()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn black_to_white_is_full_diagonal() {
            let black = Pixel::new(0, 0, 0);
            let white = Pixel::new(255, 255, 255);
            let d = DistanceMetric::EuclideanRgb.distance(&black, &white);
            assert!((d - 441.672_94).abs() < 1e-2, "got {d}");
        }

        #[test]
        fn identical_pixels_have_zero_distance() {
            let p = Pixel::new(12, 34, 56);
            assert_eq!(DistanceMetric::EuclideanRgb.distance(&p, &p), 0.0);
            assert_eq!(DistanceMetric::ThresholdBanded.distance(&p, &p), 0.0);
        }

        #[test]
        fn distance_is_symmetric() {
            let a = Pixel::new(200, 10, 90);
            let b = Pixel::new(20, 100, 250);
            for metric in [DistanceMetric::EuclideanRgb, DistanceMetric::ThresholdBanded] {
                assert_eq!(metric.distance(&a, &b), metric.distance(&b, &a));
            }
        }

        #[test]
        fn growing_channel_difference_never_shrinks_distance() {
            let reference = Pixel::new(100, 100, 100);
            for metric in [DistanceMetric::EuclideanRgb, DistanceMetric::ThresholdBanded] {
                let mut previous = 0.0;
                for red in 100..=255u8 {
                    let d = metric.distance(&reference, &Pixel::new(red, 100, 100));
                    assert!(d >= previous, "{metric:?} decreased at red={red}");
                    previous = d;
                }
            }
        }

        #[test]
        fn gray_difference_of_white_on_black_is_full_scale() {
            let d = DistanceMetric::ThresholdBanded
                .distance(&Pixel::new(0, 0, 0), &Pixel::new(255, 255, 255));
            assert!((d - 255.0).abs() < 1e-3);
        }
    }
}
