use super::*;

/// Pearson coefficients between per-paper component means. Only papers that
/// scored both components contribute to a pair; the diagonal is 1.
pub fn build_correlation_matrix(papers: &BTreeMap<String, PaperAggregate>) -> CorrelationMatrix {
    let mut matrix = CorrelationMatrix::default();

    for left in ComponentKind::ALL {
        for right in ComponentKind::ALL {
            let (xs, ys): (Vec<f64>, Vec<f64>) = papers
                .values()
                .filter_map(|paper| {
                    let x = paper.components.get(&left).filter(|summary| summary.count > 0)?;
                    let y = paper.components.get(&right).filter(|summary| summary.count > 0)?;
                    Some((x.mean, y.mean))
                })
                .unzip();

            let coefficient = if left == right {
                1.0
            } else {
                round5(stats::pearson_correlation(&xs, &ys))
            };

            matrix
                .coefficients
                .entry(left)
                .or_default()
                .insert(right, coefficient);
            matrix
                .paired_papers
                .entry(left)
                .or_default()
                .insert(right, xs.len());
        }
    }

    matrix
}
