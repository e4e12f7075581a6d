use super::*;

static DOI_RESOLVER_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:dx\.)?doi\.org/").expect("valid doi resolver prefix regex")
});

/// Lowercases, trims and strips a leading `http(s)://(dx.)doi.org/`.
pub fn normalize_identifier(doi: &str) -> String {
    let lowered = doi.trim().to_lowercase();
    DOI_RESOLVER_PREFIX
        .replace(&lowered, "")
        .trim()
        .to_string()
}

pub fn doi_key(doi: &str) -> Option<String> {
    let normalized = normalize_identifier(doi);
    if normalized.is_empty() {
        None
    } else {
        Some(format!("doi:{normalized}"))
    }
}

pub fn paper_id_key(paper_id: &str) -> Option<String> {
    non_empty(Some(paper_id)).map(|value| format!("id:{value}"))
}

/// Every index key a record can be reached through.
pub fn identifier_keys(doi: Option<&str>, paper_id: Option<&str>) -> BTreeSet<String> {
    doi.and_then(doi_key)
        .into_iter()
        .chain(paper_id.and_then(paper_id_key))
        .collect()
}

pub fn ground_truth_keys(record: &GroundTruthRecord) -> BTreeSet<String> {
    identifier_keys(record.paper.doi.as_deref(), record.paper_id.as_deref())
}

pub fn system_output_keys(record: &SystemOutput) -> BTreeSet<String> {
    identifier_keys(record.paper.doi.as_deref(), record.paper_id.as_deref())
}

pub fn evaluation_keys(record: &EvaluationRecord) -> BTreeSet<String> {
    identifier_keys(record.doi(), record.paper_key().as_deref())
}
