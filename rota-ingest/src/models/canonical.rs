//! Canonical schedule record
//!
//! One record per service date (and slot). Records are built once per run
//! and never mutated afterwards; the next full run supersedes them.
//!
//! Identity fields are stored as `Option<Person>` / `Vec<Person>` so an id
//! can never exist without its display name. The flat `<role>_id` /
//! `<role>_name` columns consumers see are produced by [`CanonicalRecord::to_row`]
//! and the `Serialize` impl, both in [`FIELD_ORDER`].

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::person::Person;

/// Fixed output field order. Positional consumers depend on this sequence.
pub const FIELD_ORDER: [&str; 29] = [
    "service_date",
    "service_week",
    "service_slot",
    "sermon_title",
    "series",
    "scripture",
    "catechism",
    "reading",
    "preacher_id",
    "preacher_name",
    "worship_lead_id",
    "worship_lead_name",
    "worship_team_ids",
    "worship_team_names",
    "pianist_id",
    "pianist_name",
    "songs",
    "audio_id",
    "audio_name",
    "video_id",
    "video_name",
    "propresenter_play_id",
    "propresenter_play_name",
    "propresenter_update_id",
    "propresenter_update_name",
    "video_editor_id",
    "video_editor_name",
    "notes",
    "source_row",
];

/// Separator used when a list field is flattened into a single cell
pub const LIST_SEPARATOR: &str = ", ";

/// Single-occupant roles (one person per service)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Preacher,
    WorshipLead,
    Pianist,
    Audio,
    Video,
    ProPresenterPlay,
    ProPresenterUpdate,
    VideoEditor,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::Preacher,
        Role::WorshipLead,
        Role::Pianist,
        Role::Audio,
        Role::Video,
        Role::ProPresenterPlay,
        Role::ProPresenterUpdate,
        Role::VideoEditor,
    ];

    /// Prefix of the `<role>_id` / `<role>_name` field pair
    pub fn field_prefix(self) -> &'static str {
        match self {
            Role::Preacher => "preacher",
            Role::WorshipLead => "worship_lead",
            Role::Pianist => "pianist",
            Role::Audio => "audio",
            Role::Video => "video",
            Role::ProPresenterPlay => "propresenter_play",
            Role::ProPresenterUpdate => "propresenter_update",
            Role::VideoEditor => "video_editor",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalRecord {
    /// `YYYY-MM-DD`, or empty when the source date was missing/unparseable
    pub service_date: String,
    /// ISO week of `service_date`
    pub service_week: Option<u32>,
    /// Distinguishes multiple services on one date; empty for a single service
    pub service_slot: String,

    pub sermon_title: String,
    pub series: String,
    pub scripture: String,
    pub catechism: String,
    pub reading: String,

    pub preacher: Option<Person>,
    pub worship_lead: Option<Person>,
    pub worship_team: Vec<Person>,
    pub pianist: Option<Person>,
    pub songs: Vec<String>,
    pub audio: Option<Person>,
    pub video: Option<Person>,
    pub propresenter_play: Option<Person>,
    pub propresenter_update: Option<Person>,
    pub video_editor: Option<Person>,

    pub notes: String,

    /// 1-based position of the raw row this record came from
    pub source_row: usize,
}

impl CanonicalRecord {
    pub fn new(source_row: usize) -> Self {
        Self {
            source_row,
            ..Default::default()
        }
    }

    /// Uniqueness key: (service_date, service_slot)
    pub fn key(&self) -> (&str, &str) {
        (&self.service_date, &self.service_slot)
    }

    pub fn role(&self, role: Role) -> Option<&Person> {
        match role {
            Role::Preacher => self.preacher.as_ref(),
            Role::WorshipLead => self.worship_lead.as_ref(),
            Role::Pianist => self.pianist.as_ref(),
            Role::Audio => self.audio.as_ref(),
            Role::Video => self.video.as_ref(),
            Role::ProPresenterPlay => self.propresenter_play.as_ref(),
            Role::ProPresenterUpdate => self.propresenter_update.as_ref(),
            Role::VideoEditor => self.video_editor.as_ref(),
        }
    }

    pub fn set_role(&mut self, role: Role, person: Option<Person>) {
        let slot = match role {
            Role::Preacher => &mut self.preacher,
            Role::WorshipLead => &mut self.worship_lead,
            Role::Pianist => &mut self.pianist,
            Role::Audio => &mut self.audio,
            Role::Video => &mut self.video,
            Role::ProPresenterPlay => &mut self.propresenter_play,
            Role::ProPresenterUpdate => &mut self.propresenter_update,
            Role::VideoEditor => &mut self.video_editor,
        };
        *slot = person;
    }

    pub fn worship_team_ids(&self) -> Vec<&str> {
        self.worship_team.iter().map(|p| p.id.as_str()).collect()
    }

    pub fn worship_team_names(&self) -> Vec<&str> {
        self.worship_team.iter().map(|p| p.name.as_str()).collect()
    }

    /// Flattened cell text of a named field, `None` for unknown names
    pub fn field_text(&self, field: &str) -> Option<String> {
        let role_part = |role: Role, want_id: bool| {
            self.role(role)
                .map(|p| if want_id { p.id.clone() } else { p.name.clone() })
                .unwrap_or_default()
        };

        let text = match field {
            "service_date" => self.service_date.clone(),
            "service_week" => self.service_week.map(|w| w.to_string()).unwrap_or_default(),
            "service_slot" => self.service_slot.clone(),
            "sermon_title" => self.sermon_title.clone(),
            "series" => self.series.clone(),
            "scripture" => self.scripture.clone(),
            "catechism" => self.catechism.clone(),
            "reading" => self.reading.clone(),
            "worship_team_ids" => self.worship_team_ids().join(LIST_SEPARATOR),
            "worship_team_names" => self.worship_team_names().join(LIST_SEPARATOR),
            "songs" => self.songs.join(LIST_SEPARATOR),
            "notes" => self.notes.clone(),
            "source_row" => self.source_row.to_string(),
            other => {
                let role = Role::ALL.iter().copied().find(|r| {
                    other.strip_prefix(r.field_prefix())
                        .map(|rest| rest == "_id" || rest == "_name")
                        .unwrap_or(false)
                })?;
                role_part(role, other.ends_with("_id"))
            }
        };
        Some(text)
    }

    /// All fields flattened to cells, in [`FIELD_ORDER`]
    pub fn to_row(&self) -> Vec<String> {
        FIELD_ORDER
            .iter()
            .map(|f| self.field_text(f).unwrap_or_default())
            .collect()
    }
}

impl Serialize for CanonicalRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FIELD_ORDER.len()))?;
        for field in FIELD_ORDER {
            match field {
                "worship_team_ids" => map.serialize_entry(field, &self.worship_team_ids())?,
                "worship_team_names" => map.serialize_entry(field, &self.worship_team_names())?,
                "songs" => map.serialize_entry(field, &self.songs)?,
                "service_week" => map.serialize_entry(field, &self.service_week)?,
                "source_row" => map.serialize_entry(field, &self.source_row)?,
                _ => map.serialize_entry(field, &self.field_text(field).unwrap_or_default())?,
            }
        }
        map.end()
    }
}
