use crate::error::PlotError;
use log::{debug, info, warn};
use rustc_hash::FxHashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One row of the linkage matrix: two clusters joined at `distance`.
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    pub distance: f64,
    pub size: f64,
}

/// A validated merge history.
///
/// With `n` leaves, ids `0..n` name the leaves and id `n + i` names the
/// cluster formed by row `i`. Every row only references leaves or clusters
/// formed by earlier rows, and every cluster is merged at most once, so the
/// rows always describe a single binary tree rooted at the last row.
#[derive(Debug, Clone)]
pub struct Linkage {
    merges: Vec<Merge>,
}

impl Linkage {
    pub fn from_merges(merges: Vec<Merge>, strict: bool) -> Result<Self, PlotError> {
        if merges.is_empty() {
            return Err(PlotError::EmptyLinkage);
        }

        let n = merges.len() + 1;
        let mut merged = vec![false; 2 * n - 1];
        let mut sizes = vec![1.0f64; 2 * n - 1];
        let mut previous = f64::NEG_INFINITY;

        for (row, merge) in merges.iter().enumerate() {
            let limit = n + row;
            for id in [merge.left, merge.right] {
                if id >= limit {
                    return Err(PlotError::invalid(
                        row + 1,
                        format!("cluster {} is not formed before this row", id),
                    ));
                }
            }
            if merge.left == merge.right {
                return Err(PlotError::invalid(
                    row + 1,
                    format!("cluster {} is merged with itself", merge.left),
                ));
            }
            for id in [merge.left, merge.right] {
                if merged[id] {
                    return Err(PlotError::invalid(
                        row + 1,
                        format!("cluster {} is merged more than once", id),
                    ));
                }
                merged[id] = true;
            }

            let expected = sizes[merge.left] + sizes[merge.right];
            if (merge.size - expected).abs() > 1e-9 {
                warn!(
                    "Row {}: size column says {} but the merged clusters hold {}",
                    row + 1,
                    merge.size,
                    expected
                );
            }
            sizes[limit] = expected;

            if merge.distance < previous {
                if strict {
                    return Err(PlotError::NonMonotonic {
                        row: row + 1,
                        distance: merge.distance,
                        previous,
                    });
                }
                warn!(
                    "Row {}: merge distance {} is below the previous {}; branches may cross",
                    row + 1,
                    merge.distance,
                    previous
                );
            }
            previous = merge.distance;
        }

        Ok(Linkage { merges })
    }

    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    pub fn leaf_count(&self) -> usize {
        self.merges.len() + 1
    }

    /// Id of the cluster formed by the last row.
    pub fn root(&self) -> usize {
        2 * self.merges.len()
    }

    pub fn max_distance(&self) -> f64 {
        self.merges.iter().map(|m| m.distance).fold(0.0, f64::max)
    }
}

fn parse_number(token: &str, line: usize) -> Result<f64, PlotError> {
    let value: f64 = token
        .parse()
        .map_err(|_| PlotError::malformed(line, format!("'{}' is not a number", token)))?;
    if !value.is_finite() {
        return Err(PlotError::malformed(line, format!("'{}' is not finite", token)));
    }
    Ok(value)
}

fn parse_cluster_id(token: &str, line: usize) -> Result<usize, PlotError> {
    let value = parse_number(token, line)?;
    if value < 0.0 || value.fract() != 0.0 {
        return Err(PlotError::malformed(
            line,
            format!("cluster id '{}' is not a non-negative integer", token),
        ));
    }
    Ok(value as usize)
}

/// Parse whitespace-separated rows of `left right distance size`.
/// Blank lines and `#` comments are skipped.
pub fn parse_merges<R: BufRead>(reader: R) -> Result<Vec<Merge>, PlotError> {
    let mut merges = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => PlotError::malformed(line_no, "line is not valid UTF-8"),
            _ => PlotError::Io(e),
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != 4 {
            return Err(PlotError::malformed(
                line_no,
                format!("expected 4 fields, found {}", fields.len()),
            ));
        }

        let left = parse_cluster_id(fields[0], line_no)?;
        let right = parse_cluster_id(fields[1], line_no)?;
        let distance = parse_number(fields[2], line_no)?;
        let size = parse_number(fields[3], line_no)?;
        if distance < 0.0 {
            return Err(PlotError::malformed(line_no, "merge distance is negative"));
        }
        if size < 0.0 {
            return Err(PlotError::malformed(line_no, "cluster size is negative"));
        }

        merges.push(Merge { left, right, distance, size });
    }

    Ok(merges)
}

/// Read the linkage file at `path`. Failing to open or read it names the file.
pub fn read_merges(path: &Path) -> Result<Vec<Merge>, PlotError> {
    let unreadable = |source| PlotError::LinkageUnreadable {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(unreadable)?;
    match parse_merges(BufReader::new(file)) {
        Err(PlotError::Io(source)) => Err(unreadable(source)),
        other => other,
    }
}

/// Split the leaf labels on commas. Tokens are kept exactly as given.
pub fn parse_labels(csv: &str) -> Vec<String> {
    let labels: Vec<String> = csv.split(',').map(str::to_owned).collect();

    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for label in &labels {
        if !seen.insert(label.as_str()) {
            warn!("Label '{}' appears more than once", label);
        }
    }

    labels
}

/// Load and cross-check the linkage matrix and its labels.
pub fn load_inputs(
    path: &Path,
    labels_csv: &str,
    strict: bool,
) -> Result<(Linkage, Vec<String>), PlotError> {
    info!("Loading linkage matrix from {:?}...", path);

    let merges = read_merges(path)?;
    let labels = parse_labels(labels_csv);
    debug!("Read {} merges and {} labels", merges.len(), labels.len());

    let leaves = merges.len() + 1;
    if leaves != labels.len() {
        return Err(PlotError::DimensionMismatch {
            leaves,
            labels: labels.len(),
        });
    }

    let linkage = Linkage::from_merges(merges, strict)?;
    info!("Found {} leaves, {} merges", linkage.leaf_count(), linkage.merges().len());

    Ok((linkage, labels))
}
