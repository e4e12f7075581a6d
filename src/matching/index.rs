use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    GroundTruth,
    SystemOutput,
    UserEvaluation,
}

impl MatchSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GroundTruth => "ground truth",
            Self::SystemOutput => "system output",
            Self::UserEvaluation => "evaluation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchClass {
    Complete,
    TwoWay,
    OneSource,
}

#[derive(Debug, Clone)]
pub struct MatchEntry<'a> {
    pub keys: BTreeSet<String>,
    pub ground_truth: Option<&'a GroundTruthRecord>,
    pub system_output: Option<&'a SystemOutput>,
    pub user_evaluations: Vec<&'a EvaluationRecord>,
}

impl<'a> MatchEntry<'a> {
    fn empty() -> Self {
        Self {
            keys: BTreeSet::new(),
            ground_truth: None,
            system_output: None,
            user_evaluations: Vec::new(),
        }
    }

    /// First key in sort order; DOI keys sort ahead of paper-id keys.
    pub fn primary_key(&self) -> &str {
        self.keys.iter().next().map(String::as_str).unwrap_or("")
    }

    pub fn source_count(&self) -> usize {
        usize::from(self.ground_truth.is_some())
            + usize::from(self.system_output.is_some())
            + usize::from(!self.user_evaluations.is_empty())
    }

    pub fn classification(&self) -> MatchClass {
        match self.source_count() {
            3 => MatchClass::Complete,
            2 => MatchClass::TwoWay,
            _ => MatchClass::OneSource,
        }
    }

    /// Paper snapshots carried by the entry, ground truth first.
    pub fn snapshots(&self) -> Vec<&'a PaperSnapshot> {
        let mut out = Vec::<&PaperSnapshot>::new();
        if let Some(ground_truth) = self.ground_truth {
            out.push(&ground_truth.paper);
        }
        if let Some(system_output) = self.system_output {
            out.push(&system_output.paper);
        }
        for evaluation in self.user_evaluations.iter().copied() {
            if let Some(paper) = evaluation.paper.as_ref() {
                out.push(paper);
            }
        }
        out
    }

    pub fn title(&self) -> Option<&'a str> {
        self.snapshots()
            .into_iter()
            .find_map(|paper| non_empty(paper.title.as_deref()))
    }

    pub fn year(&self) -> Option<i32> {
        self.snapshots().into_iter().find_map(|paper| paper.year)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCounts {
    pub ground_truth: usize,
    pub system_output: usize,
    pub user_evaluations: usize,
}

impl SourceCounts {
    pub fn total(&self) -> usize {
        self.ground_truth + self.system_output + self.user_evaluations
    }

    fn bump(&mut self, source: MatchSource) {
        match source {
            MatchSource::GroundTruth => self.ground_truth += 1,
            MatchSource::SystemOutput => self.system_output += 1,
            MatchSource::UserEvaluation => self.user_evaluations += 1,
        }
    }
}

enum SourceRecord<'a> {
    GroundTruth(&'a GroundTruthRecord),
    SystemOutput(&'a SystemOutput),
    UserEvaluation(&'a EvaluationRecord),
}

impl SourceRecord<'_> {
    fn source(&self) -> MatchSource {
        match self {
            Self::GroundTruth(_) => MatchSource::GroundTruth,
            Self::SystemOutput(_) => MatchSource::SystemOutput,
            Self::UserEvaluation(_) => MatchSource::UserEvaluation,
        }
    }
}

/// Three-way join of ground truth, system output and user evaluations.
/// Entries that share any identifier key are merged into one.
#[derive(Debug, Clone, Default)]
pub struct MatchIndex<'a> {
    slots: Vec<Option<MatchEntry<'a>>>,
    key_lookup: HashMap<String, usize>,
    duplicates: SourceCounts,
    unidentified: SourceCounts,
}

impl<'a> MatchIndex<'a> {
    pub fn build(
        ground_truth: &'a [GroundTruthRecord],
        system_outputs: &'a [SystemOutput],
        evaluations: &'a [EvaluationRecord],
    ) -> Self {
        let mut index = Self::default();
        for record in ground_truth {
            index.insert(ground_truth_keys(record), SourceRecord::GroundTruth(record));
        }
        for record in system_outputs {
            index.insert(system_output_keys(record), SourceRecord::SystemOutput(record));
        }
        for record in evaluations {
            index.insert(evaluation_keys(record), SourceRecord::UserEvaluation(record));
        }

        info!(
            entries = index.len(),
            ground_truth = ground_truth.len(),
            system_outputs = system_outputs.len(),
            evaluations = evaluations.len(),
            "built match index"
        );
        index
    }

    fn insert(&mut self, keys: BTreeSet<String>, record: SourceRecord<'a>) {
        if keys.is_empty() {
            self.unidentified.bump(record.source());
            return;
        }

        let mut targets = keys
            .iter()
            .filter_map(|key| self.key_lookup.get(key).copied())
            .collect::<Vec<usize>>();
        targets.sort_unstable();
        targets.dedup();

        let slot = match targets.split_first() {
            Some((first, rest)) => {
                for other in rest {
                    self.merge_into(*first, *other);
                }
                *first
            }
            None => {
                self.slots.push(Some(MatchEntry::empty()));
                self.slots.len() - 1
            }
        };

        for key in &keys {
            self.key_lookup.insert(key.clone(), slot);
        }

        let source = record.source();
        let Some(entry) = self.slots[slot].as_mut() else {
            return;
        };
        entry.keys.extend(keys);
        let duplicate = match record {
            SourceRecord::GroundTruth(value) => fill_once(&mut entry.ground_truth, value),
            SourceRecord::SystemOutput(value) => fill_once(&mut entry.system_output, value),
            SourceRecord::UserEvaluation(value) => {
                entry.user_evaluations.push(value);
                false
            }
        };
        if duplicate {
            debug!(key = %entry.primary_key(), "duplicate source record ignored");
            self.duplicates.bump(source);
        }
    }

    fn merge_into(&mut self, target: usize, other: usize) {
        let Some(absorbed) = self.slots[other].take() else {
            return;
        };
        for key in &absorbed.keys {
            self.key_lookup.insert(key.clone(), target);
        }

        let mut duplicate_sources = Vec::<MatchSource>::new();
        if let Some(entry) = self.slots[target].as_mut() {
            entry.keys.extend(absorbed.keys);
            if let Some(value) = absorbed.ground_truth {
                if fill_once(&mut entry.ground_truth, value) {
                    duplicate_sources.push(MatchSource::GroundTruth);
                }
            }
            if let Some(value) = absorbed.system_output {
                if fill_once(&mut entry.system_output, value) {
                    duplicate_sources.push(MatchSource::SystemOutput);
                }
            }
            entry.user_evaluations.extend(absorbed.user_evaluations);
        }
        for source in duplicate_sources {
            self.duplicates.bump(source);
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &MatchEntry<'a>> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn report(&self) -> MatchReport {
        let mut report = MatchReport {
            duplicates: self.duplicates,
            unidentified: self.unidentified,
            ..MatchReport::default()
        };

        for entry in self.entries() {
            let classification = entry.classification();
            match classification {
                MatchClass::Complete => report.complete += 1,
                MatchClass::TwoWay => report.two_way += 1,
                MatchClass::OneSource => {
                    report.one_source += 1;
                    let key = entry.primary_key().to_string();
                    if entry.ground_truth.is_some() {
                        report.orphans.ground_truth_only.push(key);
                    } else if entry.system_output.is_some() {
                        report.orphans.system_output_only.push(key);
                    } else {
                        report.orphans.user_evaluation_only.push(key);
                    }
                }
            }
            report.total_entries += 1;
            report.entries.push(MatchEntrySummary {
                key: entry.primary_key().to_string(),
                keys: entry.keys.iter().cloned().collect(),
                classification,
                title: entry.title().map(ToOwned::to_owned),
                has_ground_truth: entry.ground_truth.is_some(),
                has_system_output: entry.system_output.is_some(),
                user_evaluation_count: entry.user_evaluations.len(),
            });
        }

        report.entries.sort_by(|left, right| left.key.cmp(&right.key));
        report.orphans.ground_truth_only.sort();
        report.orphans.system_output_only.sort();
        report.orphans.user_evaluation_only.sort();
        report
    }
}

/// Stores `value` when the slot is empty; returns true when it was taken.
fn fill_once<T>(slot: &mut Option<T>, value: T) -> bool {
    if slot.is_some() {
        true
    } else {
        *slot = Some(value);
        false
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanReport {
    pub ground_truth_only: Vec<String>,
    pub system_output_only: Vec<String>,
    pub user_evaluation_only: Vec<String>,
}

impl OrphanReport {
    pub fn total(&self) -> usize {
        self.ground_truth_only.len() + self.system_output_only.len() + self.user_evaluation_only.len()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchEntrySummary {
    pub key: String,
    pub keys: Vec<String>,
    pub classification: MatchClass,
    pub title: Option<String>,
    pub has_ground_truth: bool,
    pub has_system_output: bool,
    pub user_evaluation_count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    /// Merged entries; an entry may be reachable through several keys.
    pub total_entries: usize,
    pub complete: usize,
    pub two_way: usize,
    pub one_source: usize,
    pub orphans: OrphanReport,
    pub duplicates: SourceCounts,
    pub unidentified: SourceCounts,
    /// Input records dropped before indexing because they did not parse.
    pub malformed: SourceCounts,
    pub entries: Vec<MatchEntrySummary>,
}

/// Owned source sets flattened from an integrated export.
#[derive(Debug, Clone, Default)]
pub struct MatchInputs {
    pub ground_truth: Vec<GroundTruthRecord>,
    pub system_outputs: Vec<SystemOutput>,
    pub evaluations: Vec<EvaluationRecord>,
    pub malformed: SourceCounts,
}

fn parse_source<T: DeserializeOwned>(
    value: Option<&Value>,
    source: MatchSource,
    position: usize,
    malformed: &mut SourceCounts,
) -> Option<T> {
    let value = value.filter(|value| !value.is_null())?;
    let parsed = parse_record(value, source.as_str(), position);
    if parsed.is_none() {
        malformed.bump(source);
    }
    parsed
}

impl MatchInputs {
    /// Reads an integrated export record by record. A paper whose ground
    /// truth or system output does not parse keeps its other sources.
    pub fn from_integrated_value(value: &Value) -> Self {
        let mut malformed = SourceCounts::default();
        let papers = value
            .get("papers")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut data = IntegratedData::default();
        for (position, paper) in papers.iter().enumerate() {
            if !paper.is_object() {
                warn!(position, "skipping integrated paper that is not an object");
                continue;
            }
            let user_evaluations = paper
                .get("userEvaluations")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default()
                .iter()
                .filter_map(|evaluation| {
                    parse_source(
                        Some(evaluation),
                        MatchSource::UserEvaluation,
                        position,
                        &mut malformed,
                    )
                })
                .collect::<Vec<EvaluationRecord>>();
            data.papers.push(IntegratedPaper {
                ground_truth: parse_source(
                    paper.get("groundTruth"),
                    MatchSource::GroundTruth,
                    position,
                    &mut malformed,
                ),
                system_output: parse_source(
                    paper.get("systemOutput"),
                    MatchSource::SystemOutput,
                    position,
                    &mut malformed,
                ),
                user_evaluations,
            });
        }

        let mut inputs = Self::from_integrated(data);
        inputs.malformed = malformed;
        inputs
    }

    pub fn from_integrated(data: IntegratedData) -> Self {
        let mut inputs = Self::default();
        for paper in data.papers {
            if let Some(ground_truth) = paper.ground_truth {
                inputs.ground_truth.push(ground_truth);
            }
            if let Some(system_output) = paper.system_output {
                inputs.system_outputs.push(system_output);
            }
            inputs.evaluations.extend(paper.user_evaluations);
        }
        inputs
    }

    pub fn index(&self) -> MatchIndex<'_> {
        MatchIndex::build(&self.ground_truth, &self.system_outputs, &self.evaluations)
    }

    pub fn report(&self) -> MatchReport {
        let mut report = self.index().report();
        report.malformed = self.malformed;
        report
    }
}
