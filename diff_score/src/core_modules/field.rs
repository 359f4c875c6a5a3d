// THEORY:
// A `Field` is a flat, row-major 2D grid of f32 values sharing the width and
// height of the images it was derived from. The engine produces two of them per
// call: the raw distance field and its normalized [0,1] counterpart. Like `Pixel`
// and `Band`, a `Field` is a "dumb" container; the mapper fills it and the
// aggregator reads it.

pub mod field {
    pub type Value = f32;

    #[derive(Debug, Clone, PartialEq)]
    pub struct Field {
        pub width: u32,
        pub height: u32,
        /// Row-major values; `values.len() == width * height`.
        pub values: Vec<Value>,
    }

    /// Per-pixel color distance between two images.
    pub type DistanceField = Field;
    /// Distance field rescaled against a score window and clipped to [0,1].
    pub type NormalizedField = Field;

    impl Field {
        pub fn new(width: u32, height: u32, values: Vec<Value>) -> Self {
            debug_assert_eq!(values.len(), (width as usize) * (height as usize));
            Self { width, height, values }
        }

        pub fn filled(width: u32, height: u32, value: Value) -> Self {
            Self::new(width, height, vec![value; (width as usize) * (height as usize)])
        }

        pub fn row(&self, y: u32) -> &[Value] {
            let start = (y as usize) * (self.width as usize);
            &self.values[start..start + self.width as usize]
        }

        pub fn dimensions(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        /// Arithmetic mean of all values, 0.0 for an empty field.
        pub fn mean(&self) -> f64 {
            if self.values.is_empty() {
                return 0.0;
            }
            self.values.iter().map(|v| *v as f64).sum::<f64>() / self.values.len() as f64
        }

        /// Affine rescale against `[min, max]`, clipped to [0,1].
        ///
        /// Callers must ensure `max > min`; the pipeline validates this up front.
        pub fn normalized(&self, min: f64, max: f64) -> NormalizedField {
            let range = max - min;
            let values = self
                .values
                .iter()
                .map(|d| (((*d as f64) - min) / range).clamp(0.0, 1.0) as Value)
                .collect();
            Field::new(self.width, self.height, values)
        }
    }

}
