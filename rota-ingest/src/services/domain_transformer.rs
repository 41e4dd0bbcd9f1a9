//! Domain Transformer
//!
//! Projects canonical records into two nested, role-grouped views:
//! - **preaching** — sermon content and the preacher
//! - **roster** — worship team and technical support assignments
//!
//! Each view is keyed by service date and partitioned by calendar year, plus
//! a `latest` partition holding the full set. Output is regenerated in full
//! on every run; there is no incremental path.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::models::{CanonicalRecord, Person};
use crate::services::field_cleaner::CANONICAL_DATE_FORMAT;

pub const PREACHING_VIEW: &str = "preaching";
pub const ROSTER_VIEW: &str = "roster";
pub const LATEST_PARTITION: &str = "latest";

// ============================================================================
// View Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sermon {
    pub title: String,
    pub series: String,
    pub scripture: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Liturgy {
    pub catechism: String,
    pub reading: String,
    pub songs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreachingRecord {
    pub service_date: String,
    pub service_slot: String,
    pub service_week: Option<u32>,
    pub sermon: Sermon,
    pub preacher: Option<Person>,
    pub liturgy: Liturgy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorshipGroup {
    pub lead: Option<Person>,
    pub team: Vec<Person>,
    pub pianist: Option<Person>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalGroup {
    pub audio: Option<Person>,
    pub video: Option<Person>,
    pub propresenter_play: Option<Person>,
    pub propresenter_update: Option<Person>,
    pub video_editor: Option<Person>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRecord {
    pub service_date: String,
    pub service_slot: String,
    pub service_week: Option<u32>,
    pub worship: WorshipGroup,
    pub technical: TechnicalGroup,
    pub notes: String,
}

impl From<&CanonicalRecord> for PreachingRecord {
    fn from(r: &CanonicalRecord) -> Self {
        Self {
            service_date: r.service_date.clone(),
            service_slot: r.service_slot.clone(),
            service_week: r.service_week,
            sermon: Sermon {
                title: r.sermon_title.clone(),
                series: r.series.clone(),
                scripture: r.scripture.clone(),
            },
            preacher: r.preacher.clone(),
            liturgy: Liturgy {
                catechism: r.catechism.clone(),
                reading: r.reading.clone(),
                songs: r.songs.clone(),
            },
        }
    }
}

impl From<&CanonicalRecord> for RosterRecord {
    fn from(r: &CanonicalRecord) -> Self {
        Self {
            service_date: r.service_date.clone(),
            service_slot: r.service_slot.clone(),
            service_week: r.service_week,
            worship: WorshipGroup {
                lead: r.worship_lead.clone(),
                team: r.worship_team.clone(),
                pianist: r.pianist.clone(),
            },
            technical: TechnicalGroup {
                audio: r.audio.clone(),
                video: r.video.clone(),
                propresenter_play: r.propresenter_play.clone(),
                propresenter_update: r.propresenter_update.clone(),
                video_editor: r.video_editor.clone(),
            },
            notes: r.notes.clone(),
        }
    }
}

// ============================================================================
// Partitioning
// ============================================================================

/// One view split into `latest` and per-year partitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partitioned<T> {
    pub latest: Vec<T>,
    pub by_year: BTreeMap<i32, Vec<T>>,
}

impl<T> Partitioned<T> {
    /// Partition names in write order: `latest`, then years ascending
    pub fn partition_names(&self) -> Vec<String> {
        std::iter::once(LATEST_PARTITION.to_string())
            .chain(self.by_year.keys().map(|y| y.to_string()))
            .collect()
    }

    pub fn partition(&self, name: &str) -> Option<&[T]> {
        if name == LATEST_PARTITION {
            return Some(&self.latest);
        }
        let year: i32 = name.parse().ok()?;
        self.by_year.get(&year).map(Vec::as_slice)
    }
}

/// Both views produced by one transform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainViews {
    pub preaching: Partitioned<PreachingRecord>,
    pub roster: Partitioned<RosterRecord>,
}

/// Envelope written for each view partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDocument {
    pub view: String,
    pub partition: String,
    pub generated_at: String,
    pub record_count: usize,
    pub records: serde_json::Value,
}

impl DomainViews {
    /// Render every partition of both views as documents
    pub fn documents(&self, generated_at: &DateTime<Utc>) -> rota_common::Result<Vec<ViewDocument>> {
        let stamp = rota_common::time::to_rfc3339(generated_at);
        let mut docs = Vec::new();
        push_documents(&mut docs, PREACHING_VIEW, &self.preaching, &stamp)?;
        push_documents(&mut docs, ROSTER_VIEW, &self.roster, &stamp)?;
        Ok(docs)
    }
}

fn push_documents<T: Serialize>(
    docs: &mut Vec<ViewDocument>,
    view: &str,
    partitioned: &Partitioned<T>,
    stamp: &str,
) -> rota_common::Result<()> {
    for name in partitioned.partition_names() {
        let records = partitioned.partition(&name).unwrap_or(&[]);
        docs.push(ViewDocument {
            view: view.to_string(),
            partition: name.clone(),
            generated_at: stamp.to_string(),
            record_count: records.len(),
            records: serde_json::to_value(records)?,
        });
    }
    Ok(())
}

// ============================================================================
// Transform
// ============================================================================

/// Project canonical records into both domain views
///
/// Records whose `service_date` is not a canonical date cannot be placed in a
/// year partition; they are logged and left out of every partition.
pub fn transform(records: &[CanonicalRecord]) -> DomainViews {
    let mut dated: Vec<(i32, &CanonicalRecord)> = records
        .iter()
        .filter_map(|r| match NaiveDate::parse_from_str(&r.service_date, CANONICAL_DATE_FORMAT) {
            Ok(date) => Some((date.year(), r)),
            Err(_) => {
                warn!(
                    row = r.source_row,
                    service_date = %r.service_date,
                    "Record without a valid service date left out of domain views"
                );
                None
            }
        })
        .collect();

    // ISO dates sort lexically; slot breaks ties
    dated.sort_by(|(_, a), (_, b)| a.key().cmp(&b.key()));

    let preaching = partition(&dated, |r| PreachingRecord::from(r));
    let roster = partition(&dated, |r| RosterRecord::from(r));

    debug!(
        records = dated.len(),
        years = preaching.by_year.len(),
        "Domain views generated"
    );

    DomainViews { preaching, roster }
}

fn partition<T: Clone>(
    dated: &[(i32, &CanonicalRecord)],
    project: impl Fn(&CanonicalRecord) -> T,
) -> Partitioned<T> {
    let mut latest = Vec::with_capacity(dated.len());
    let mut by_year: BTreeMap<i32, Vec<T>> = BTreeMap::new();
    for (year, record) in dated {
        let item = project(record);
        by_year.entry(*year).or_default().push(item.clone());
        latest.push(item);
    }
    Partitioned { latest, by_year }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(row: usize, date: &str) -> CanonicalRecord {
        let mut r = CanonicalRecord::new(row);
        r.service_date = date.to_string();
        r.sermon_title = format!("Sermon {}", row);
        r.preacher = Some(Person::new("preacher_zhang", "张牧师"));
        r.worship_team = vec![Person::new("person_chenming", "陈明")];
        r.audio = Some(Person::new("person_audio", "Audio Tech"));
        r
    }

    #[test]
    fn test_year_partitions_and_latest() {
        let views = transform(&[record(1, "2024-01-07"), record(2, "2025-01-05")]);

        assert_eq!(views.preaching.latest.len(), 2);
        assert_eq!(views.preaching.by_year[&2024].len(), 1);
        assert_eq!(views.preaching.by_year[&2025].len(), 1);
        assert_eq!(views.preaching.by_year[&2024][0].service_date, "2024-01-07");
        assert_eq!(views.roster.by_year.len(), 2);
        assert_eq!(
            views.preaching.partition_names(),
            vec!["latest".to_string(), "2024".to_string(), "2025".to_string()]
        );
    }

    #[test]
    fn test_records_nest_under_groups() {
        let views = transform(&[record(1, "2025-10-05")]);
        let preaching = &views.preaching.latest[0];
        assert_eq!(preaching.sermon.title, "Sermon 1");
        assert_eq!(preaching.preacher.as_ref().unwrap().id, "preacher_zhang");

        let roster = &views.roster.latest[0];
        assert_eq!(roster.worship.team[0].id, "person_chenming");
        assert_eq!(roster.technical.audio.as_ref().unwrap().name, "Audio Tech");
        assert!(roster.technical.video.is_none());
    }

    #[test]
    fn test_output_sorted_by_date_regardless_of_input_order() {
        let views = transform(&[record(1, "2025-02-02"), record(2, "2024-12-29"), record(3, "2025-01-05")]);
        let dates: Vec<&str> = views.roster.latest.iter().map(|r| r.service_date.as_str()).collect();
        assert_eq!(dates, vec!["2024-12-29", "2025-01-05", "2025-02-02"]);
    }

    #[test]
    fn test_undated_records_are_left_out() {
        let views = transform(&[record(1, ""), record(2, "2025-10-05")]);
        assert_eq!(views.preaching.latest.len(), 1);
    }

    #[test]
    fn test_documents_cover_every_partition() {
        let views = transform(&[record(1, "2024-01-07"), record(2, "2025-01-05")]);
        let ts = Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap();
        let docs = views.documents(&ts).unwrap();

        // 3 partitions × 2 views
        assert_eq!(docs.len(), 6);
        let latest = docs
            .iter()
            .find(|d| d.view == ROSTER_VIEW && d.partition == LATEST_PARTITION)
            .unwrap();
        assert_eq!(latest.record_count, 2);
        assert_eq!(latest.generated_at, "2025-01-06T00:00:00Z");
        assert_eq!(latest.records[0]["worship"]["team"][0]["id"], "person_chenming");
    }

    #[test]
    fn test_empty_input_yields_empty_latest_only() {
        let views = transform(&[]);
        assert!(views.preaching.latest.is_empty());
        assert_eq!(views.preaching.partition_names(), vec!["latest".to_string()]);
    }
}
