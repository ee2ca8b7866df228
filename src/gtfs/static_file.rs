//! Static GTFS files that can be read out of the schedule archive.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TransitError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaticFileKind {
    Agency,
    Stops,
    Routes,
    Trips,
    StopTimes,
    Calendar,
    CalendarDates,
    FareAttributes,
    FareRules,
    Shapes,
    Frequencies,
    Transfers,
    Pathways,
    Levels,
    FeedInfo,
}

impl StaticFileKind {
    pub const ALL: [StaticFileKind; 15] = [
        StaticFileKind::Agency,
        StaticFileKind::Stops,
        StaticFileKind::Routes,
        StaticFileKind::Trips,
        StaticFileKind::StopTimes,
        StaticFileKind::Calendar,
        StaticFileKind::CalendarDates,
        StaticFileKind::FareAttributes,
        StaticFileKind::FareRules,
        StaticFileKind::Shapes,
        StaticFileKind::Frequencies,
        StaticFileKind::Transfers,
        StaticFileKind::Pathways,
        StaticFileKind::Levels,
        StaticFileKind::FeedInfo,
    ];

    /// Identifier used in cache keys and URLs, e.g. `stop_times`.
    pub fn slug(&self) -> &'static str {
        match self {
            StaticFileKind::Agency => "agency",
            StaticFileKind::Stops => "stops",
            StaticFileKind::Routes => "routes",
            StaticFileKind::Trips => "trips",
            StaticFileKind::StopTimes => "stop_times",
            StaticFileKind::Calendar => "calendar",
            StaticFileKind::CalendarDates => "calendar_dates",
            StaticFileKind::FareAttributes => "fare_attributes",
            StaticFileKind::FareRules => "fare_rules",
            StaticFileKind::Shapes => "shapes",
            StaticFileKind::Frequencies => "frequencies",
            StaticFileKind::Transfers => "transfers",
            StaticFileKind::Pathways => "pathways",
            StaticFileKind::Levels => "levels",
            StaticFileKind::FeedInfo => "feed_info",
        }
    }

    /// Member name inside the archive.
    pub fn file_name(&self) -> String {
        format!("{}.txt", self.slug())
    }
}

impl fmt::Display for StaticFileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Accepts the slug, the file name or the display name (`Stop Times`),
/// ignoring case.
impl FromStr for StaticFileKind {
    type Err = TransitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .trim_end_matches(".txt")
            .to_ascii_lowercase()
            .replace([' ', '-'], "_");

        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == normalized)
            .ok_or_else(|| TransitError::InvalidArgument(format!("Unknown static file: {}", s)))
    }
}
