//! Raw column header → canonical source field mapping
//!
//! The set of fields is closed (`SourceField`); only the header text each
//! field is read from is configuration. Unknown field names in a config
//! override are rejected at load time, not at row-processing time.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rota_common::{Error, Result};

/// A field read from the raw source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceField {
    ServiceDate,
    ServiceSlot,
    SermonTitle,
    Series,
    Scripture,
    Catechism,
    Reading,
    Preacher,
    WorshipLead,
    WorshipTeam1,
    WorshipTeam2,
    Pianist,
    Songs,
    Audio,
    Video,
    ProPresenterPlay,
    ProPresenterUpdate,
    VideoEditor,
    Notes,
}

impl SourceField {
    pub const ALL: [SourceField; 19] = [
        SourceField::ServiceDate,
        SourceField::ServiceSlot,
        SourceField::SermonTitle,
        SourceField::Series,
        SourceField::Scripture,
        SourceField::Catechism,
        SourceField::Reading,
        SourceField::Preacher,
        SourceField::WorshipLead,
        SourceField::WorshipTeam1,
        SourceField::WorshipTeam2,
        SourceField::Pianist,
        SourceField::Songs,
        SourceField::Audio,
        SourceField::Video,
        SourceField::ProPresenterPlay,
        SourceField::ProPresenterUpdate,
        SourceField::VideoEditor,
        SourceField::Notes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceField::ServiceDate => "service_date",
            SourceField::ServiceSlot => "service_slot",
            SourceField::SermonTitle => "sermon_title",
            SourceField::Series => "series",
            SourceField::Scripture => "scripture",
            SourceField::Catechism => "catechism",
            SourceField::Reading => "reading",
            SourceField::Preacher => "preacher",
            SourceField::WorshipLead => "worship_lead",
            SourceField::WorshipTeam1 => "worship_team_1",
            SourceField::WorshipTeam2 => "worship_team_2",
            SourceField::Pianist => "pianist",
            SourceField::Songs => "songs",
            SourceField::Audio => "audio",
            SourceField::Video => "video",
            SourceField::ProPresenterPlay => "propresenter_play",
            SourceField::ProPresenterUpdate => "propresenter_update",
            SourceField::VideoEditor => "video_editor",
            SourceField::Notes => "notes",
        }
    }

    /// Header used by the schedule spreadsheet this tool was built for
    pub fn default_header(self) -> &'static str {
        match self {
            SourceField::ServiceDate => "主日日期",
            SourceField::ServiceSlot => "场次",
            SourceField::SermonTitle => "讲道题目",
            SourceField::Series => "系列",
            SourceField::Scripture => "经文",
            SourceField::Catechism => "要理问答",
            SourceField::Reading => "读经",
            SourceField::Preacher => "讲员",
            SourceField::WorshipLead => "敬拜带领",
            SourceField::WorshipTeam1 => "敬拜同工1",
            SourceField::WorshipTeam2 => "敬拜同工2",
            SourceField::Pianist => "司琴",
            SourceField::Songs => "诗歌",
            SourceField::Audio => "音控",
            SourceField::Video => "导播/摄影",
            SourceField::ProPresenterPlay => "ProPresenter播放",
            SourceField::ProPresenterUpdate => "ProPresenter更新",
            SourceField::VideoEditor => "视频剪辑",
            SourceField::Notes => "备注",
        }
    }
}

impl fmt::Display for SourceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SourceField::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| Error::Config(format!("Unknown column map field: {}", s)))
    }
}

/// Canonical field → raw header text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    headers: BTreeMap<SourceField, String>,
}

impl ColumnMap {
    /// Map with no headers; every field reads as absent until set
    pub fn empty() -> Self {
        Self {
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, field: SourceField, header: impl Into<String>) -> Self {
        self.headers.insert(field, header.into());
        self
    }

    /// Defaults with per-field overrides keyed by canonical field name
    pub fn from_overrides<'a, I>(overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut map = Self::default();
        for (name, header) in overrides {
            let field: SourceField = name.parse()?;
            if header.trim().is_empty() {
                return Err(Error::Config(format!(
                    "Empty header configured for column map field: {}",
                    name
                )));
            }
            map.headers.insert(field, header.clone());
        }
        Ok(map)
    }

    pub fn header(&self, field: SourceField) -> Option<&str> {
        self.headers.get(&field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (SourceField, &str)> {
        self.headers.iter().map(|(f, h)| (*f, h.as_str()))
    }
}

impl Default for ColumnMap {
    fn default() -> Self {
        let headers = SourceField::ALL
            .iter()
            .map(|f| (*f, f.default_header().to_string()))
            .collect();
        Self { headers }
    }
}
