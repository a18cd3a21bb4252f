pub mod epg;
pub mod playlist;

pub use epg::{EpgLoadResponse, NowNext, NowNextQuery, NowNextResponse, Program};
pub use playlist::{
    ContentCategory, EntriesQuery, EntriesResponse, EntryView, LoadEpgRequest, LoadPlaylistRequest,
    LoadResponse, ParsedPlaylist, PlaylistEntry, PlaylistStats,
};
