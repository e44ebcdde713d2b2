//! Panel queries built on the multicall and batchcall engines.
//!
//! These return plain data for a rendering layer to sort, filter and
//! display. Every query re-derives its values from a fresh round trip.

pub mod details;
pub mod torrents;
pub mod trackers;

pub use details::{scrape_trackers, set_comment, set_tags, torrent_details, torrent_name};
pub use torrents::{Eta, TorrentStatus, TorrentSummary, list_torrents};
pub use trackers::{TorrentTrackers, TrackerStatus, TrackerSummary, torrent_trackers};
