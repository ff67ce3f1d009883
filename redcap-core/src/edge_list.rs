//! Plain-text edge lists.
//!
//! The format is a header line `0 <observations> <key>` followed by one
//! `a b weight` line per undirected edge. Spanning trees are exported with
//! the constant weight `1`. When reading, the header and the weight column
//! are optional; blank lines and lines starting with `#` are ignored.

use std::io::{self, BufRead, Write};

use crate::{
    contiguity::Contiguity,
    error::{RedcapError, Result},
    tree::{SpanningTree, TreeEdge},
};

/// Key written in the header line.
pub const EDGE_LIST_KEY: &str = "redcap id";

/// Writes `edges` as an edge list describing `observations` rows.
///
/// # Errors
/// Propagates I/O errors from `writer`.
pub fn write_edge_list<W: Write>(
    writer: &mut W,
    observations: usize,
    edges: &[TreeEdge],
) -> io::Result<()> {
    writeln!(writer, "0 {observations} {EDGE_LIST_KEY}")?;
    for edge in edges {
        writeln!(writer, "{} {} 1", edge.a(), edge.b())?;
    }
    Ok(())
}

impl SpanningTree {
    /// Writes this tree's edges as an edge list.
    ///
    /// # Errors
    /// Propagates I/O errors from `writer`.
    pub fn write_edge_list<W: Write>(&self, writer: &mut W, observations: usize) -> io::Result<()> {
        write_edge_list(writer, observations, self.edges())
    }
}

/// Parses an edge list into a symmetric [`Contiguity`].
///
/// Without a header the observation count is one more than the largest id
/// seen.
///
/// # Errors
/// Returns [`RedcapError::EdgeList`] for unreadable or malformed lines and
/// [`RedcapError::InvalidNeighbour`] when an id exceeds the header's count.
///
/// # Examples
/// ```
/// use redcap_core::read_contiguity_edge_list;
///
/// let text = "0 3 redcap id\n0 1 1\n1 2 0.5\n";
/// let contiguity = read_contiguity_edge_list(text.as_bytes())?;
/// assert_eq!(contiguity.len(), 3);
/// assert_eq!(contiguity.neighbours(2).collect::<Vec<_>>(), vec![(1, Some(0.5))]);
/// # Ok::<(), redcap_core::RedcapError>(())
/// ```
pub fn read_contiguity_edge_list<R: BufRead>(reader: R) -> Result<Contiguity> {
    let mut declared = None;
    let mut links = Vec::new();
    let mut largest = None;

    for (index, line) in reader.lines().enumerate() {
        let number = index + 1;
        let line = line.map_err(|err| RedcapError::edge_list(number, err.to_string()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if declared.is_none() && links.is_empty() && is_header(&fields) {
            declared = Some(parse_id(fields[1], number)?);
            continue;
        }
        let (a, b, weight) = parse_link(&fields, number)?;
        largest = largest.max(Some(a.max(b)));
        links.push((a, b, weight));
    }

    let observations = declared.unwrap_or_else(|| largest.map_or(0, |id| id + 1));
    Contiguity::from_links(observations, links)
}

fn is_header(fields: &[&str]) -> bool {
    fields.len() >= 3 && fields[2].parse::<f64>().is_err()
}

fn parse_link(fields: &[&str], line: usize) -> Result<(usize, usize, Option<f64>)> {
    match fields {
        [a, b] => Ok((parse_id(a, line)?, parse_id(b, line)?, None)),
        [a, b, weight] => {
            let weight = weight
                .parse::<f64>()
                .map_err(|_| RedcapError::edge_list(line, format!("invalid weight `{weight}`")))?;
            Ok((parse_id(a, line)?, parse_id(b, line)?, Some(weight)))
        }
        _ => Err(RedcapError::edge_list(
            line,
            format!("expected 2 or 3 fields, found {}", fields.len()),
        )),
    }
}

fn parse_id(field: &str, line: usize) -> Result<usize> {
    field
        .parse()
        .map_err(|_| RedcapError::edge_list(line, format!("invalid id `{field}`")))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn tree_export_uses_the_constant_weight() {
        let mut tree = SpanningTree::covering(0..3);
        tree.add_edge(0, 1, 3.5);
        tree.add_edge(1, 2, 0.25);
        let mut out = Vec::new();
        tree.write_edge_list(&mut out, 3).expect("writing to memory");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "0 3 redcap id\n0 1 1\n1 2 1\n"
        );
    }

    #[rstest]
    fn exported_tree_reads_back_as_contiguity() {
        let mut tree = SpanningTree::covering(0..4);
        tree.add_edge(2, 3, 1.0);
        tree.add_edge(3, 0, 1.0);
        tree.add_edge(0, 1, 1.0);
        let mut out = Vec::new();
        tree.write_edge_list(&mut out, 5).expect("writing to memory");

        let contiguity = read_contiguity_edge_list(out.as_slice()).expect("valid list");
        assert_eq!(contiguity.len(), 5);
        assert_eq!(
            contiguity.neighbours(3).map(|(n, _)| n).collect::<Vec<_>>(),
            vec![2, 0]
        );
        assert_eq!(contiguity.neighbours(4).count(), 0);
    }

    #[rstest]
    fn headerless_lists_infer_the_size() {
        let contiguity =
            read_contiguity_edge_list("# rook\n\n0 1\n1 4\n".as_bytes()).expect("valid list");
        assert_eq!(contiguity.len(), 5);
        assert_eq!(contiguity.neighbours(1).collect::<Vec<_>>(), vec![(0, None), (4, None)]);
    }

    #[rstest]
    #[case::fields("0 1 1 1\n", 1)]
    #[case::id("0 3 redcap id\n0 x\n", 2)]
    #[case::weight("0 1\n1 2 heavy\n", 2)]
    fn malformed_lines_are_reported(#[case] text: &str, #[case] line: usize) {
        let err = read_contiguity_edge_list(text.as_bytes()).expect_err("malformed input");
        assert!(
            matches!(err, RedcapError::EdgeList { line: reported, .. } if reported == line),
            "unexpected error {err:?}"
        );
    }

    #[rstest]
    fn ids_beyond_the_header_are_rejected() {
        let err = read_contiguity_edge_list("0 2 redcap id\n0 5 1\n".as_bytes())
            .expect_err("5 exceeds the declared count");
        assert_eq!(err.code().as_str(), "REDCAP_INVALID_NEIGHBOUR");
    }
}
