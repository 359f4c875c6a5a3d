// THEORY:
// The `Band` module represents a horizontal strip of a normalized field. It is
// the unit of work for the score aggregator: the field is cut into a handful of
// non-overlapping row ranges and each range is reduced independently.
//
// Key principles:
// 1.  **Disjoint Partition**: `partition` splits `height` rows into `count` bands
//     of `height / count` rows; the last band absorbs the remainder. Bands never
//     overlap and together cover every row.
// 2.  **Anchored Sampling**: a band samples the rows and columns whose *global*
//     index is even. The sampled set is therefore identical to a single pass over
//     the whole field, whatever the partition, which is what keeps the parallel
//     score equal to the sequential one. Sampling does not restart at a band's
//     first row: a band starting on an odd row begins at the row after it, and
//     an odd-height band never picks up an extra row at its boundary.
// 3.  **Data Container**: a `Band` holds only its row range. It borrows the field
//     when asked for its partial sum and owns no pixel data.

pub mod band {
    use crate::core_modules::field::field::Field;
    use std::ops::Range;

    /// Every `SAMPLE_STRIDE`-th row and column contributes to the score.
    pub const SAMPLE_STRIDE: usize = 2;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Band {
        /// First row of the band (inclusive).
        pub start_row: u32,
        /// One past the last row of the band.
        pub end_row: u32,
    }

    impl Band {
        pub fn new(start_row: u32, end_row: u32) -> Self {
            Self { start_row, end_row }
        }

        pub fn rows(&self) -> Range<u32> {
            self.start_row..self.end_row
        }

        pub fn is_empty(&self) -> bool {
            self.start_row >= self.end_row
        }

        /// Sums `score_min + value * (score_max - score_min)` over the sampled
        /// positions of this band.
        pub fn sampled_sum(&self, field: &Field, score_min: f64, score_max: f64) -> f64 {
            let score_range = score_max - score_min;
            let mut sum = 0.0f64;

            let sampled_rows = self
                .rows()
                .skip_while(|y| y % SAMPLE_STRIDE as u32 != 0)
                .step_by(SAMPLE_STRIDE);
            for y in sampled_rows {
                for value in field.row(y).iter().step_by(SAMPLE_STRIDE) {
                    sum += score_min + (*value as f64) * score_range;
                }
            }
            sum
        }
    }

    /// Splits `height` rows into `count` bands, the last absorbing the remainder.
    pub fn partition(height: u32, count: usize) -> Vec<Band> {
        let count = count.max(1) as u32;
        let step = height / count;
        (0..count)
            .map(|i| {
                let start = i * step;
                let end = if i + 1 == count { height } else { start + step };
                Band::new(start, end)
            })
            .collect()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn partition_covers_every_row_once() {
            for height in [0u32, 1, 3, 4, 7, 10, 101] {
                let bands = partition(height, 4);
                assert_eq!(bands.len(), 4);
                assert_eq!(bands[0].start_row, 0);
                assert_eq!(bands[3].end_row, height);
                for pair in bands.windows(2) {
                    assert_eq!(pair[0].end_row, pair[1].start_row);
                }
            }
        }

        #[test]
        fn last_band_absorbs_the_remainder() {
            let bands = partition(10, 4);
            let heights: Vec<u32> = bands.iter().map(|b| b.end_row - b.start_row).collect();
            assert_eq!(heights, vec![2, 2, 2, 4]);
        }

        #[test]
        fn short_fields_land_in_the_last_band() {
            let bands = partition(3, 4);
            assert!(bands[..3].iter().all(Band::is_empty));
            assert_eq!(bands[3].rows(), 0..3);
        }

        #[test]
        fn sampling_is_anchored_to_the_whole_field() {
            // Value at (x, y) encodes its own coordinates so we can see what got summed.
            let width = 5u32;
            let height = 7u32;
            let values = (0..height)
                .flat_map(|y| (0..width).map(move |x| (y * 10 + x) as f32))
                .collect();
            let field = Field::new(width, height, values);

            let whole = Band::new(0, height).sampled_sum(&field, 0.0, 1.0);
            let split: f64 = partition(height, 4)
                .iter()
                .map(|b| b.sampled_sum(&field, 0.0, 1.0))
                .sum();
            assert_eq!(whole, split);

            // Rows 0, 2, 4, 6 and columns 0, 2, 4.
            let expected: f64 = [0u32, 2, 4, 6]
                .iter()
                .flat_map(|y| [0u32, 2, 4].map(|x| (y * 10 + x) as f64))
                .sum();
            assert_eq!(whole, expected);
        }

        #[test]
        fn single_row_bands_add_no_extra_rows() {
            let field = Field::filled(1, 7, 1.0);
            // Bands 0..1, 1..2, 2..3 and 3..7: rows 0, 2, 4 and 6 only.
            let sum: f64 = partition(7, 4)
                .iter()
                .map(|b| b.sampled_sum(&field, 0.0, 1.0))
                .sum();
            assert_eq!(sum, 4.0);
        }

        #[test]
        fn odd_start_row_skips_to_the_next_even_row() {
            let field = Field::filled(2, 4, 1.0);
            // Rows 1..2 contain no even row.
            assert_eq!(Band::new(1, 2).sampled_sum(&field, 0.0, 10.0), 0.0);
            // Rows 1..4 sample row 2 only, column 0 only.
            assert_eq!(Band::new(1, 4).sampled_sum(&field, 0.0, 10.0), 10.0);
        }
    }
}
