//! Homogeneity summary for a regionalization.
//!
//! The total sum of squared deviations over all valid observations splits
//! into the part explained by region means (between) and the residual inside
//! regions (within). The control constraint plays no part here.

use crate::{error::Result, tree::SsdEvaluator};

/// SSD decomposition of a set of regions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionQuality {
    total_ssd: f64,
    within_ssd: f64,
}

impl RegionQuality {
    /// Scores `regions` against the SSD of `all` observations they cover.
    ///
    /// # Errors
    /// Propagates SSD cache failures.
    pub fn measure<'r>(
        evaluator: &SsdEvaluator<'_>,
        all: &[usize],
        regions: impl IntoIterator<Item = &'r [usize]>,
    ) -> Result<Self> {
        let total_ssd = evaluator.unconstrained_ssd(all)?;
        let mut within_ssd = 0.0;
        for members in regions {
            within_ssd += evaluator.unconstrained_ssd(members)?;
        }
        Ok(Self {
            total_ssd,
            within_ssd,
        })
    }

    /// SSD of all valid observations around the global mean.
    #[must_use]
    #[rustfmt::skip]
    pub fn total_ssd(&self) -> f64 { self.total_ssd }

    /// Sum of each region's SSD around its own mean.
    #[must_use]
    #[rustfmt::skip]
    pub fn within_ssd(&self) -> f64 { self.within_ssd }

    /// Part of the total explained by the regions.
    #[must_use]
    pub fn between_ssd(&self) -> f64 {
        (self.total_ssd - self.within_ssd).max(0.0)
    }

    /// Between-region SSD as a share of the total; `0.0` when the data has
    /// no spread.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.total_ssd > 0.0 {
            self.between_ssd() / self.total_ssd
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::attributes::AttributeMatrix;

    #[rstest]
    fn two_natural_groups_explain_most_variance() {
        let matrix = AttributeMatrix::try_from_rows(
            "groups",
            vec![vec![1.0], vec![2.0], vec![10.0], vec![11.0]],
        )
        .expect("valid rows");
        let evaluator = SsdEvaluator::new(&matrix, None);
        let low = [0, 1];
        let high = [2, 3];
        let quality = RegionQuality::measure(
            &evaluator,
            &[0, 1, 2, 3],
            [low.as_slice(), high.as_slice()],
        )
        .expect("healthy");
        assert_eq!(quality.total_ssd(), 82.0);
        assert_eq!(quality.within_ssd(), 1.0);
        assert_eq!(quality.between_ssd(), 81.0);
        assert!((quality.ratio() - 81.0 / 82.0).abs() < 1e-12);
    }

    #[rstest]
    fn flat_data_has_zero_ratio() {
        let matrix = AttributeMatrix::try_from_rows("flat", vec![vec![2.0]; 3]).expect("valid");
        let evaluator = SsdEvaluator::new(&matrix, None);
        let quality =
            RegionQuality::measure(&evaluator, &[0, 1, 2], [[0, 1, 2].as_slice()]).expect("healthy");
        assert_eq!(quality.ratio(), 0.0);
    }
}
