//! Spatial contiguity input.

use crate::error::{RedcapError, Result};

/// Neighbour lists describing which observations share a border.
///
/// Each observation owns a list of `(neighbour, weight)` pairs. Lists do not
/// need to be symmetric; graph construction treats every listed pair as an
/// undirected link. Weights are carried through to first-order edges but
/// never influence the clustering.
///
/// # Examples
/// ```
/// use redcap_core::Contiguity;
///
/// let chain = Contiguity::from_neighbours(vec![vec![1], vec![0, 2], vec![1]]);
/// assert_eq!(chain.len(), 3);
/// assert_eq!(chain.neighbours(1).map(|(n, _)| n).collect::<Vec<_>>(), vec![0, 2]);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contiguity {
    lists: Vec<Vec<(usize, Option<f64>)>>,
}

impl Contiguity {
    /// Builds an unweighted model from plain neighbour lists.
    #[must_use]
    pub fn from_neighbours(neighbours: Vec<Vec<usize>>) -> Self {
        Self {
            lists: neighbours
                .into_iter()
                .map(|list| list.into_iter().map(|n| (n, None)).collect())
                .collect(),
        }
    }

    /// Builds a weighted model from `(neighbour, weight)` lists.
    #[must_use]
    pub fn from_weighted(neighbours: Vec<Vec<(usize, f64)>>) -> Self {
        Self {
            lists: neighbours
                .into_iter()
                .map(|list| list.into_iter().map(|(n, w)| (n, Some(w))).collect())
                .collect(),
        }
    }

    /// Builds a symmetric model over `observations` from undirected links.
    ///
    /// Repeated links are kept once per direction.
    ///
    /// # Errors
    /// Returns [`RedcapError::InvalidNeighbour`] when a link references an
    /// observation at or beyond `observations`.
    pub fn from_links<I>(observations: usize, links: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, Option<f64>)>,
    {
        let mut lists: Vec<Vec<(usize, Option<f64>)>> = vec![Vec::new(); observations];
        for (a, b, weight) in links {
            for (observation, neighbour) in [(a, b), (b, a)] {
                if observation >= observations || neighbour >= observations {
                    return Err(RedcapError::InvalidNeighbour {
                        observation,
                        neighbour,
                        observations,
                    });
                }
                let list = &mut lists[observation];
                if !list.iter().any(|&(n, _)| n == neighbour) {
                    list.push((neighbour, weight));
                }
            }
        }
        Ok(Self { lists })
    }

    /// Number of observations described.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    /// Returns whether no observations are described.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Iterates the neighbours of `observation` with their optional weights.
    ///
    /// Unknown observations yield nothing.
    pub fn neighbours(&self, observation: usize) -> impl Iterator<Item = (usize, Option<f64>)> + '_ {
        self.lists
            .get(observation)
            .into_iter()
            .flat_map(|list| list.iter().copied())
    }

    /// Checks that the model describes exactly `observations` rows and that
    /// every neighbour index is in range.
    ///
    /// # Errors
    /// Returns [`RedcapError::ContiguityLengthMismatch`] or
    /// [`RedcapError::InvalidNeighbour`].
    pub fn validate(&self, observations: usize) -> Result<()> {
        if self.lists.len() != observations {
            return Err(RedcapError::ContiguityLengthMismatch {
                expected: observations,
                actual: self.lists.len(),
            });
        }
        for (observation, list) in self.lists.iter().enumerate() {
            if let Some(&(neighbour, _)) = list.iter().find(|&&(n, _)| n >= observations) {
                return Err(RedcapError::InvalidNeighbour {
                    observation,
                    neighbour,
                    observations,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn links_are_symmetric_and_deduplicated() {
        let model = Contiguity::from_links(3, [(0, 1, None), (1, 0, None), (1, 2, Some(0.5))])
            .expect("links in range");
        assert_eq!(model.neighbours(0).collect::<Vec<_>>(), vec![(1, None)]);
        assert_eq!(
            model.neighbours(1).collect::<Vec<_>>(),
            vec![(0, None), (2, Some(0.5))]
        );
        assert_eq!(model.neighbours(2).collect::<Vec<_>>(), vec![(1, Some(0.5))]);
    }

    #[rstest]
    fn links_out_of_range_are_rejected() {
        let err = Contiguity::from_links(2, [(0, 5, None)]).expect_err("5 is out of range");
        assert_eq!(
            err,
            RedcapError::InvalidNeighbour {
                observation: 0,
                neighbour: 5,
                observations: 2
            }
        );
    }

    #[rstest]
    #[case::short(2, RedcapError::ContiguityLengthMismatch { expected: 2, actual: 3 })]
    #[case::bad_index(3, RedcapError::InvalidNeighbour { observation: 2, neighbour: 3, observations: 3 })]
    fn validation_reports_problems(#[case] observations: usize, #[case] expected: RedcapError) {
        let model = Contiguity::from_neighbours(vec![vec![1], vec![0], vec![3]]);
        assert_eq!(model.validate(observations), Err(expected));
    }

    #[rstest]
    fn unknown_observations_have_no_neighbours() {
        let model = Contiguity::from_weighted(vec![vec![(1, 2.0)], vec![(0, 2.0)]]);
        assert_eq!(model.neighbours(7).count(), 0);
        assert!(model.validate(2).is_ok());
    }
}
