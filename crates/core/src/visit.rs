//! Visit aggregation.
//!
//! Raw observations and procedures arrive as a flat, unordered list. This
//! module clusters them into discrete clinical visits using the configured
//! time-proximity window, with one exception that takes precedence over any
//! window: a procedure explicitly linked to an observation always joins that
//! observation's visit, because clinicians record outcomes hours or days
//! after the date on the form was set.
//!
//! Aggregation is a pure function of its inputs. Visits are derived fresh on
//! every run and never persisted; a re-run over an unchanged feed yields
//! structurally identical output.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chairside_records::{Attachment, Observation, Procedure, RecordFeed};
use chairside_types::ToothNumber;

use crate::config::EngineConfig;

/// Identifier of a derived visit.
///
/// Derived deterministically from the visit's calendar date and its ordinal
/// among same-day visits (`"20251201-1"`), so that re-running aggregation on
/// an unchanged feed reproduces the same identifiers. Random identifiers
/// would silently break selections held by the UI between runs.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct VisitId(String);

impl VisitId {
    fn derive(date: DateTime<Utc>, ordinal: usize) -> Self {
        Self(format!("{}-{}", date.format("%Y%m%d"), ordinal))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Selection toggles arrive from the UI as plain strings; they are matched
// against derived ids, never trusted to exist.
impl From<&str> for VisitId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for VisitId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for VisitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One clinical encounter, derived from the records that cluster around it.
///
/// A visit owns copies of its constituent records; the originals in the feed
/// stay untouched. Its `date` is the timestamp of the earliest record that
/// clustered into it (a linked procedure that joined through its observation
/// does not move the date).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Visit {
    pub id: VisitId,
    pub date: DateTime<Utc>,
    pub observations: Vec<Observation>,
    pub procedures: Vec<Procedure>,
    /// Union of the attachments belonging to this visit's records,
    /// de-duplicated, in record order.
    pub attachments: Vec<Attachment>,
}

impl Visit {
    /// Distinct teeth referenced by any record of this visit, in canonical
    /// FDI order.
    pub fn teeth(&self) -> BTreeSet<ToothNumber> {
        let mut teeth = BTreeSet::new();
        for observation in &self.observations {
            teeth.extend(observation.teeth.iter().copied());
        }
        for procedure in &self.procedures {
            teeth.extend(procedure.teeth.iter().copied());
        }
        teeth
    }

    pub fn observation_ids(&self) -> impl Iterator<Item = &str> {
        self.observations.iter().map(|o| o.id.as_str())
    }

    pub fn procedure_ids(&self) -> impl Iterator<Item = &str> {
        self.procedures.iter().map(|p| p.id.as_str())
    }

    pub fn attachment_ids(&self) -> impl Iterator<Item = &str> {
        self.attachments.iter().map(|a| a.id.as_str())
    }
}

/// A record placed on the clustering timeline: an observation, or a procedure
/// with no usable observation link.
enum TimelineRecord<'a> {
    Observation(&'a Observation),
    Procedure(&'a Procedure, DateTime<Utc>),
}

impl TimelineRecord<'_> {
    fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Observation(observation) => observation.recorded_at,
            Self::Procedure(_, date) => *date,
        }
    }

    fn id(&self) -> &str {
        match self {
            Self::Observation(observation) => &observation.id,
            Self::Procedure(procedure, _) => &procedure.id,
        }
    }
}

/// Clusters a patient's records into an ordered list of visits.
///
/// The clustering window comes from `config`; see
/// [`ClusterWindow`](crate::config::ClusterWindow) for the exact rule.
/// Unlinked procedures with no scheduled or completion date cannot be placed
/// on the timeline — they are skipped with a warning rather than guessed at.
pub fn aggregate_visits(feed: &RecordFeed, config: &EngineConfig) -> Vec<Visit> {
    let window = config.cluster_window();

    // Procedures with a resolvable observation link join that observation's
    // visit later; everything else clusters by its own date.
    let mut linked: HashMap<&str, Vec<&Procedure>> = HashMap::new();
    let mut timeline: Vec<TimelineRecord<'_>> = Vec::new();

    for observation in &feed.observations {
        timeline.push(TimelineRecord::Observation(observation));
    }

    for procedure in &feed.procedures {
        match procedure.observation_id.as_deref() {
            Some(observation_id) if feed.observation(observation_id).is_some() => {
                linked.entry(observation_id).or_default().push(procedure);
            }
            Some(observation_id) => {
                tracing::warn!(
                    procedure = %procedure.id,
                    observation = %observation_id,
                    "procedure links an observation missing from the feed; clustering by date"
                );
                push_by_date(&mut timeline, procedure);
            }
            None => push_by_date(&mut timeline, procedure),
        }
    }

    timeline.sort_by(|a, b| {
        a.timestamp()
            .cmp(&b.timestamp())
            .then_with(|| a.id().cmp(b.id()))
    });

    // One pass over the timeline: a record within the window of the current
    // cluster's anchor (its earliest record) extends the cluster, otherwise
    // it starts a new one.
    let mut clusters: Vec<Vec<&TimelineRecord<'_>>> = Vec::new();
    let mut anchors: Vec<DateTime<Utc>> = Vec::new();
    for record in &timeline {
        match (anchors.last(), clusters.last_mut()) {
            (Some(&anchor), Some(cluster)) if window.same_visit(anchor, record.timestamp()) => {
                cluster.push(record);
            }
            _ => {
                anchors.push(record.timestamp());
                clusters.push(vec![record]);
            }
        }
    }

    let mut per_day_ordinal: HashMap<String, usize> = HashMap::new();
    let mut visits = Vec::with_capacity(clusters.len());

    for (cluster, anchor) in clusters.into_iter().zip(anchors) {
        let mut observations = Vec::new();
        let mut procedures = Vec::new();

        for record in cluster {
            match record {
                TimelineRecord::Observation(observation) => {
                    observations.push((*observation).clone());
                    if let Some(followers) = linked.get(observation.id.as_str()) {
                        procedures.extend(followers.iter().map(|p| (*p).clone()));
                    }
                }
                TimelineRecord::Procedure(procedure, _) => {
                    procedures.push((*procedure).clone());
                }
            }
        }

        let attachments = resolve_attachments(feed, &observations, &procedures);

        let day = anchor.format("%Y%m%d").to_string();
        let ordinal = per_day_ordinal.entry(day).or_insert(0);
        *ordinal += 1;

        visits.push(Visit {
            id: VisitId::derive(anchor, *ordinal),
            date: anchor,
            observations,
            procedures,
            attachments,
        });
    }

    visits
}

fn push_by_date<'a>(timeline: &mut Vec<TimelineRecord<'a>>, procedure: &'a Procedure) {
    match procedure.record_date() {
        Some(date) => timeline.push(TimelineRecord::Procedure(procedure, date)),
        None => {
            tracing::warn!(
                procedure = %procedure.id,
                "unlinked procedure has no scheduled or completion date; excluded from visits"
            );
        }
    }
}

/// Resolves the attachment ids referenced by a visit's records into the
/// attachments themselves, de-duplicated in first-reference order.
fn resolve_attachments(
    feed: &RecordFeed,
    observations: &[Observation],
    procedures: &[Procedure],
) -> Vec<Attachment> {
    let mut seen = BTreeSet::new();
    let mut attachments = Vec::new();

    let ids = observations
        .iter()
        .flat_map(|o| o.attachment_ids.iter())
        .chain(procedures.iter().flat_map(|p| p.attachment_ids.iter()));

    for id in ids {
        if !seen.insert(id.as_str()) {
            continue;
        }
        match feed.attachment(id) {
            Some(attachment) => attachments.push(attachment.clone()),
            None => {
                tracing::warn!(attachment = %id, "record references an attachment missing from the feed");
            }
        }
    }

    attachments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClusterWindow;
    use chairside_records::{AttachmentKind, ProcedureStatus, Severity};
    use chairside_types::PatientRef;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn observation(id: &str, tooth: &str, at: DateTime<Utc>) -> Observation {
        Observation {
            id: id.to_string(),
            teeth: vec![ToothNumber::parse(tooth).unwrap()],
            condition: "caries".to_string(),
            severity: Severity::Moderate,
            notes: None,
            recorded_at: at,
            attachment_ids: vec![],
        }
    }

    fn procedure(id: &str, tooth: &str, at: Option<DateTime<Utc>>) -> Procedure {
        Procedure {
            id: id.to_string(),
            teeth: vec![ToothNumber::parse(tooth).unwrap()],
            name: "Composite Filling".to_string(),
            code: "D2391".to_string(),
            status: ProcedureStatus::Completed,
            scheduled_at: at,
            completed_at: None,
            observation_id: None,
            attachment_ids: vec![],
        }
    }

    fn attachment(id: &str) -> Attachment {
        Attachment {
            id: id.to_string(),
            kind: AttachmentKind::Before,
            caption: None,
            taken_at: None,
            location: format!("files/{id}.jpg"),
        }
    }

    fn feed(
        observations: Vec<Observation>,
        procedures: Vec<Procedure>,
        attachments: Vec<Attachment>,
    ) -> RecordFeed {
        RecordFeed {
            patient: PatientRef::new(Uuid::new_v4()),
            observations,
            procedures,
            attachments,
        }
    }

    #[test]
    fn linked_procedure_joins_the_observations_visit() {
        // Scenario: O1 and P1 on the same day, P1 linked to O1.
        let at = date(2025, 12, 1, 9);
        let mut p1 = procedure("p1", "16", Some(at));
        p1.observation_id = Some("o1".to_string());

        let visits = aggregate_visits(
            &feed(vec![observation("o1", "16", at)], vec![p1], vec![]),
            &EngineConfig::default(),
        );

        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].date, at);
        assert_eq!(visits[0].observations.len(), 1);
        assert_eq!(visits[0].procedures.len(), 1);
    }

    #[test]
    fn link_precedence_overrides_date_proximity() {
        // The outcome was recorded three days after the observation; the
        // link still pulls it into the observation's visit.
        let observed = date(2025, 12, 1, 9);
        let mut late = procedure("p1", "16", Some(date(2025, 12, 4, 15)));
        late.observation_id = Some("o1".to_string());

        let visits = aggregate_visits(
            &feed(vec![observation("o1", "16", observed)], vec![late], vec![]),
            &EngineConfig::default(),
        );

        assert_eq!(visits.len(), 1, "link precedence must not split the visit");
        assert_eq!(visits[0].date, observed);
        assert_eq!(visits[0].procedures[0].id, "p1");
    }

    #[test]
    fn standalone_procedure_forms_its_own_visit() {
        // Scenario: O1+P1 on Dec 1, unlinked P2 on Dec 5.
        let first = date(2025, 12, 1, 9);
        let mut p1 = procedure("p1", "16", Some(first));
        p1.observation_id = Some("o1".to_string());
        let p2 = procedure("p2", "16", Some(date(2025, 12, 5, 10)));

        let visits = aggregate_visits(
            &feed(vec![observation("o1", "16", first)], vec![p1, p2], vec![]),
            &EngineConfig::default(),
        );

        assert_eq!(visits.len(), 2);
        assert_eq!(visits[0].date, first);
        assert_eq!(visits[1].procedures[0].id, "p2");
        assert!(visits[0].date < visits[1].date);
    }

    #[test]
    fn same_day_records_share_a_visit() {
        let visits = aggregate_visits(
            &feed(
                vec![
                    observation("o1", "16", date(2025, 12, 1, 9)),
                    observation("o2", "21", date(2025, 12, 1, 16)),
                ],
                vec![],
                vec![],
            ),
            &EngineConfig::default(),
        );

        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].observations.len(), 2);
    }

    #[test]
    fn fixed_window_clusters_across_midnight() {
        let config = EngineConfig::new(ClusterWindow::Within(Duration::hours(12))).unwrap();
        let visits = aggregate_visits(
            &feed(
                vec![
                    observation("o1", "16", date(2025, 12, 1, 22)),
                    observation("o2", "16", date(2025, 12, 2, 3)),
                ],
                vec![],
                vec![],
            ),
            &config,
        );

        assert_eq!(visits.len(), 1, "records 5h apart share a 12h window");
    }

    #[test]
    fn undated_unlinked_procedure_is_excluded() {
        let visits = aggregate_visits(
            &feed(
                vec![observation("o1", "16", date(2025, 12, 1, 9))],
                vec![procedure("p1", "16", None)],
                vec![],
            ),
            &EngineConfig::default(),
        );

        assert_eq!(visits.len(), 1);
        assert!(visits[0].procedures.is_empty());
    }

    #[test]
    fn attachments_join_transitively_and_deduplicate() {
        let at = date(2025, 12, 1, 9);
        let mut o1 = observation("o1", "16", at);
        o1.attachment_ids = vec!["a1".to_string(), "a2".to_string()];
        let mut p1 = procedure("p1", "16", Some(at));
        p1.observation_id = Some("o1".to_string());
        p1.attachment_ids = vec!["a2".to_string(), "missing".to_string()];

        let visits = aggregate_visits(
            &feed(vec![o1], vec![p1], vec![attachment("a1"), attachment("a2")]),
            &EngineConfig::default(),
        );

        let ids: Vec<&str> = visits[0].attachment_ids().collect();
        assert_eq!(ids, vec!["a1", "a2"], "deduplicated, unresolved id skipped");
    }

    #[test]
    fn aggregation_is_idempotent() {
        let mut p1 = procedure("p1", "16", Some(date(2025, 12, 1, 10)));
        p1.observation_id = Some("o1".to_string());
        let input = feed(
            vec![
                observation("o1", "16", date(2025, 12, 1, 9)),
                observation("o2", "21", date(2025, 12, 5, 9)),
            ],
            vec![p1, procedure("p2", "21", Some(date(2025, 12, 5, 11)))],
            vec![],
        );

        let first = aggregate_visits(&input, &EngineConfig::default());
        let second = aggregate_visits(&input, &EngineConfig::default());
        assert_eq!(first, second);
    }

    #[test]
    fn visit_ids_are_stable_and_ordered_within_a_day() {
        let config = EngineConfig::new(ClusterWindow::Within(Duration::hours(2))).unwrap();
        let visits = aggregate_visits(
            &feed(
                vec![
                    observation("o1", "16", date(2025, 12, 1, 8)),
                    observation("o2", "16", date(2025, 12, 1, 15)),
                ],
                vec![],
                vec![],
            ),
            &config,
        );

        assert_eq!(visits.len(), 2, "8h apart exceeds the 2h window");
        assert_eq!(visits[0].id.as_str(), "20251201-1");
        assert_eq!(visits[1].id.as_str(), "20251201-2");
    }
}
