use super::*;

#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub research_field: Option<String>,
    pub venue: Option<String>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub has_ground_truth: Option<bool>,
    pub has_system_output: Option<bool>,
    pub has_user_evaluations: Option<bool>,
    pub min_accuracy: Option<f64>,
    pub max_accuracy: Option<f64>,
}

impl SearchFilter {
    fn needs_accuracy(&self) -> bool {
        self.min_accuracy.is_some() || self.max_accuracy.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub key: String,
    pub classification: MatchClass,
    pub title: Option<String>,
    pub doi: Option<String>,
    pub venue: Option<String>,
    pub year: Option<i32>,
    pub research_field: Option<String>,
    pub user_evaluation_count: usize,
    pub accuracy: Option<f64>,
}

fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|value| value.to_lowercase().contains(needle))
        .unwrap_or(false)
}

fn snapshot_matches(paper: &PaperSnapshot, needle: &str) -> bool {
    contains_ignore_case(paper.title.as_deref(), needle)
        || paper
            .authors
            .iter()
            .any(|author| contains_ignore_case(Some(author), needle))
        || contains_ignore_case(paper.venue.as_deref(), needle)
        || contains_ignore_case(paper.doi.as_deref(), needle)
        || contains_ignore_case(paper.research_field.as_deref(), needle)
        || contains_ignore_case(paper.research_problem.as_deref(), needle)
}

/// Case-insensitive substring search over the papers' title, authors, venue,
/// DOI, research field and research problem. An empty term returns every entry.
pub fn search_entries<'i, 'a>(
    index: &'i MatchIndex<'a>,
    term: Option<&str>,
) -> Vec<&'i MatchEntry<'a>> {
    let needle = term
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty());

    let mut results = index
        .entries()
        .filter(|entry| match needle.as_deref() {
            Some(needle) => entry
                .snapshots()
                .into_iter()
                .any(|paper| snapshot_matches(paper, needle)),
            None => true,
        })
        .collect::<Vec<&MatchEntry>>();
    results.sort_by(|left, right| left.primary_key().cmp(right.primary_key()));
    results
}

/// Mean overall score of the entry's user evaluations.
pub fn entry_accuracy(entry: &MatchEntry<'_>, resolver: &ScoreResolver<'_>) -> Option<f64> {
    let scores = entry
        .user_evaluations
        .iter()
        .filter_map(|evaluation| crate::aggregate::record_overall_score(evaluation, resolver))
        .collect::<Vec<f64>>();
    if scores.is_empty() {
        None
    } else {
        Some(stats::mean(&scores))
    }
}

/// Narrows search results one predicate at a time; every predicate must hold.
pub fn apply_filters<'i, 'a>(
    results: Vec<&'i MatchEntry<'a>>,
    filter: &SearchFilter,
    resolver: &ScoreResolver<'_>,
) -> Vec<&'i MatchEntry<'a>> {
    let mut current = results;

    if let Some(field) = filter.research_field.as_deref() {
        let needle = field.trim().to_lowercase();
        current.retain(|entry| {
            entry
                .snapshots()
                .into_iter()
                .any(|paper| contains_ignore_case(paper.research_field.as_deref(), &needle))
        });
    }

    if let Some(venue) = filter.venue.as_deref() {
        let needle = venue.trim().to_lowercase();
        current.retain(|entry| {
            entry
                .snapshots()
                .into_iter()
                .any(|paper| contains_ignore_case(paper.venue.as_deref(), &needle))
        });
    }

    if filter.year_min.is_some() || filter.year_max.is_some() {
        let low = filter.year_min.unwrap_or(i32::MIN);
        let high = filter.year_max.unwrap_or(i32::MAX);
        current.retain(|entry| entry.year().is_some_and(|year| (low..=high).contains(&year)));
    }

    if let Some(expected) = filter.has_ground_truth {
        current.retain(|entry| entry.ground_truth.is_some() == expected);
    }
    if let Some(expected) = filter.has_system_output {
        current.retain(|entry| entry.system_output.is_some() == expected);
    }
    if let Some(expected) = filter.has_user_evaluations {
        current.retain(|entry| !entry.user_evaluations.is_empty() == expected);
    }

    if filter.needs_accuracy() {
        let low = filter.min_accuracy.unwrap_or(f64::NEG_INFINITY);
        let high = filter.max_accuracy.unwrap_or(f64::INFINITY);
        current.retain(|entry| {
            entry_accuracy(entry, resolver)
                .is_some_and(|accuracy| accuracy >= low && accuracy <= high)
        });
    }

    debug!(remaining = current.len(), "applied search filters");
    current
}

fn first_text<'p>(
    snapshots: &[&'p PaperSnapshot],
    select: impl Fn(&'p PaperSnapshot) -> Option<&'p str>,
) -> Option<String> {
    snapshots
        .iter()
        .copied()
        .find_map(|paper| non_empty(select(paper)))
        .map(ToOwned::to_owned)
}

pub fn search_hit(entry: &MatchEntry<'_>, resolver: &ScoreResolver<'_>) -> SearchHit {
    let snapshots = entry.snapshots();

    SearchHit {
        key: entry.primary_key().to_string(),
        classification: entry.classification(),
        title: first_text(&snapshots, |paper| paper.title.as_deref()),
        doi: first_text(&snapshots, |paper| paper.doi.as_deref()),
        venue: first_text(&snapshots, |paper| paper.venue.as_deref()),
        year: entry.year(),
        research_field: first_text(&snapshots, |paper| paper.research_field.as_deref()),
        user_evaluation_count: entry.user_evaluations.len(),
        accuracy: entry_accuracy(entry, resolver),
    }
}

pub fn count_by_classification(entries: &[&MatchEntry<'_>]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::<&'static str, usize>::new();
    for entry in entries {
        let label = match entry.classification() {
            MatchClass::Complete => "complete",
            MatchClass::TwoWay => "two-way",
            MatchClass::OneSource => "one-source",
        };
        *counts.entry(label).or_default() += 1;
    }
    counts
}
