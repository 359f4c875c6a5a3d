// THEORY:
// The `Pixel` module is the most fundamental unit of the scoring engine. It is a
// "dumb" data container for a single RGB sample plus the one single-pixel
// heuristic the engine needs: Rec. 601 luminance. Anything that involves a
// second pixel (distances, deltas) belongs in `SmartPixel`.
//
// Channels are kept both as the raw bytes and as "computed" f32 copies in the
// 0..255 range. All arithmetic runs on the computed copies so that subtracting
// two channels can never wrap around. Alpha is never stored: both images are
// flattened to RGB before they reach this module.

pub mod pixel {
    use image::Rgb;

    pub type Byte = u8;
    pub type Channel = Byte;
    pub type ComputedChannel = f32;
    pub type Luminance = f32;

    pub const CHANNELS: usize = 3;

    /// A "dumb" data container representing a single RGB pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The red channel value (0.0-255.0).
        pub red_computed: ComputedChannel,
        /// The green channel value (0.0-255.0).
        pub green_computed: ComputedChannel,
        /// The blue channel value (0.0-255.0).
        pub blue_computed: ComputedChannel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                red_computed: red as ComputedChannel,
                green_computed: green as ComputedChannel,
                blue_computed: blue as ComputedChannel,
            }
        }

        /// Builds a pixel from f32 channels, e.g. a per-channel difference. The
        /// byte channels are the rounded, clamped copies.
        pub fn from_computed(channels: [ComputedChannel; CHANNELS]) -> Self {
            let to_byte = |c: ComputedChannel| c.round().clamp(0.0, 255.0) as Channel;
            let [red_computed, green_computed, blue_computed] = channels;
            Pixel {
                red: to_byte(red_computed),
                green: to_byte(green_computed),
                blue: to_byte(blue_computed),
                red_computed,
                green_computed,
                blue_computed,
            }
        }

        /// Luminance estimate (Rec. 601 luma) on the 0..255 scale.
        ///
        /// Same weights OpenCV uses for its BGR to gray conversion.
        pub fn luminance(&self) -> Luminance {
            0.299 * self.red_computed + 0.587 * self.green_computed + 0.114 * self.blue_computed
        }

        /// Computed channels as an array, in R, G, B order.
        #[inline]
        pub fn computed(&self) -> [ComputedChannel; CHANNELS] {
            [self.red_computed, self.green_computed, self.blue_computed]
        }
    }

    impl From<&Rgb<Byte>> for Pixel {
        fn from(rgb: &Rgb<Byte>) -> Self {
            Pixel::new(rgb[0], rgb[1], rgb[2])
        }
    }

    impl From<Pixel> for Rgb<Byte> {
        fn from(pixel: Pixel) -> Self {
            Rgb([pixel.red, pixel.green, pixel.blue])
        }
    }

}
