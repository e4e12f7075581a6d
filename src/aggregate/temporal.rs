use super::*;

/// Evaluation counts and mean overall score per calendar day, oldest first.
/// Records without a parseable timestamp are left out.
pub fn build_temporal_activity(records: &[ScoredRecord<'_>]) -> Vec<DailyActivity> {
    let mut days = BTreeMap::<&str, (usize, Vec<f64>)>::new();
    for record in records {
        let Some(date) = record.date.as_deref() else {
            continue;
        };
        let day = days.entry(date).or_default();
        day.0 += 1;
        if let Some(score) = record.overall_score {
            day.1.push(score);
        }
    }

    days.into_iter()
        .map(|(date, (evaluation_count, scores))| DailyActivity {
            date: date.to_string(),
            evaluation_count,
            mean_score: round5(stats::mean(&scores)),
        })
        .collect()
}
