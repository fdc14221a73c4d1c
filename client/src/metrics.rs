use crate::api;

/// Aggregate result of one extraction cycle. Constructed fresh per scrape
/// and discarded once translated into metric observations. Fields a failing
/// retrieval could not populate stay at their zero value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerSnapshot {
    pub version: String,
    pub platform: String,
    pub active_sessions: i64,
    pub sessions: Vec<SessionMetric>,
    pub players: Vec<PlayerMetric>,
    pub libraries: Vec<LibraryMetric>,
}

/// One active playback session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMetric {
    pub bandwidth: i64,
    pub location: String,
    pub player: PlayerMetric,
}

/// The player half of a session, index-aligned with its session entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerMetric {
    pub device: String,
    pub platform: String,
    pub profile: String,
    pub state: String,
    pub local: bool,
    pub relayed: bool,
    pub secure: bool,
}

impl From<api::Player> for PlayerMetric {
    fn from(player: api::Player) -> Self {
        Self {
            device: player.device,
            platform: player.platform,
            profile: player.profile,
            state: player.state,
            local: player.local,
            relayed: player.relayed,
            secure: player.secure,
        }
    }
}

/// Item count of one library section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryMetric {
    pub name: String,
    pub kind: String,
    pub size: i64,
}
