//! Torrent list: one multicall over every download in the `default` view.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::rpc::error::DecodeResult;
use crate::rpc::{Caller, ResultRecord, RpcResult, Transport};
use crate::util::record::RecordView;

/// Fields fetched for every torrent, in request order.
pub const TORRENT_FIELDS: [&str; 22] = [
    "hash",
    "name",
    "hashing",
    "state",
    "is_active",
    "complete",
    "size_bytes",
    "bytes_done",
    "size_chunks",
    "wanted_chunks",
    "completed_chunks",
    "chunk_size",
    "peers_accounted",
    "peers_complete",
    "down.rate",
    "up.rate",
    "ratio",
    "up.total",
    "timestamp.started",
    "timestamp.finished",
    "custom1",
    "custom=icon",
];

/// Download state as shown in the status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TorrentStatus {
    /// Started and still missing chunks
    Downloading,
    /// Closed or stopped
    Stopped,
    /// Started but not active
    Paused,
    /// Hash check in progress
    Hashing,
    /// Started with nothing left to fetch
    Seeding,
}

/// Estimated time until the download completes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Eta {
    /// Nothing left to download
    Done,
    /// Seconds remaining at the current rate
    Seconds(f64),
    /// No download rate, no estimate
    Infinite,
}

/// One row of the torrent list with its derived values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TorrentSummary {
    /// Info-hash
    pub hash: String,
    /// Display name
    pub name: String,
    /// Icon URL stored in `custom=icon`
    pub icon: String,
    /// Total size in bytes
    pub size_bytes: i64,
    /// Completion percentage of the wanted data
    pub done: f64,
    /// Current state
    pub status: TorrentStatus,
    /// Connected seeders
    pub seeders: i64,
    /// Connected leechers
    pub leechers: i64,
    /// Download rate in bytes per second
    pub down_rate: i64,
    /// Upload rate in bytes per second
    pub up_rate: i64,
    /// Upload/download ratio
    pub ratio: f64,
    /// Total bytes uploaded
    pub up_total: i64,
    /// Estimated time of arrival
    pub eta: Eta,
    /// When the download started
    pub started: Option<DateTime<Utc>>,
    /// When the download finished
    pub finished: Option<DateTime<Utc>>,
    /// Tab labels: `all`, `incomplete` when chunks are wanted, then `custom1`
    pub tags: Vec<String>,
}

/// Raw chunk and byte counters the derived values are computed from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Progress {
    /// `d.size_bytes`
    pub size_bytes: i64,
    /// `d.bytes_done`
    pub bytes_done: i64,
    /// `d.size_chunks`
    pub size_chunks: i64,
    /// `d.wanted_chunks`
    pub wanted_chunks: i64,
    /// `d.completed_chunks`
    pub completed_chunks: i64,
    /// `d.chunk_size`
    pub chunk_size: i64,
}

impl Progress {
    fn expected_chunks(&self) -> i64 {
        self.wanted_chunks + self.completed_chunks
    }

    fn whole_torrent(&self) -> bool {
        self.expected_chunks() == self.size_chunks
    }

    /// Completion percentage, capped at 100.
    pub fn done_percent(&self) -> f64 {
        if self.whole_torrent() {
            if self.size_bytes == 0 {
                return 0.0;
            }
            100.0 * self.bytes_done as f64 / self.size_bytes as f64
        } else {
            let expected = self.expected_chunks();
            if expected == 0 {
                return 0.0;
            }
            (100.0 * self.completed_chunks as f64 / expected as f64).min(100.0)
        }
    }

    /// Time remaining at `down_rate` bytes per second.
    pub fn eta(&self, down_rate: i64) -> Eta {
        if self.wanted_chunks == 0 {
            Eta::Done
        } else if down_rate > 0 {
            let remaining = if self.whole_torrent() {
                (self.size_bytes - self.bytes_done) as f64
            } else {
                (self.wanted_chunks * self.chunk_size) as f64
            };
            Eta::Seconds(remaining / down_rate as f64)
        } else {
            Eta::Infinite
        }
    }
}

/// Classify a torrent from its raw state flags.
pub fn torrent_status(hashing: i64, state: i64, is_active: i64, wanted_chunks: i64) -> TorrentStatus {
    if hashing > 0 {
        TorrentStatus::Hashing
    } else if state == 0 {
        TorrentStatus::Stopped
    } else if is_active == 0 {
        TorrentStatus::Paused
    } else if wanted_chunks > 0 {
        TorrentStatus::Downloading
    } else {
        TorrentStatus::Seeding
    }
}

impl TorrentSummary {
    /// Build a summary from a record keyed by [`TORRENT_FIELDS`].
    pub fn from_record(record: &ResultRecord) -> DecodeResult<Self> {
        let view = RecordView::new(record);
        let progress = Progress {
            size_bytes: view.field_i64("sizeBytes")?,
            bytes_done: view.field_i64("bytesDone")?,
            size_chunks: view.field_i64("sizeChunks")?,
            wanted_chunks: view.field_i64("wantedChunks")?,
            completed_chunks: view.field_i64("completedChunks")?,
            chunk_size: view.field_i64("chunkSize")?,
        };
        let down_rate = view.field_i64("downRate")?;

        let mut tags = vec!["all".to_string()];
        if progress.wanted_chunks > 0 {
            tags.push("incomplete".to_string());
        }
        tags.extend(view.field_str("custom1")?.split_whitespace().map(str::to_string));

        Ok(Self {
            hash: view.field_str("hash")?.to_string(),
            name: view.field_str("name")?.to_string(),
            icon: view.field_str("customIcon")?.to_string(),
            size_bytes: progress.size_bytes,
            done: progress.done_percent(),
            status: torrent_status(
                view.field_i64("hashing")?,
                view.field_i64("state")?,
                view.field_i64("isActive")?,
                progress.wanted_chunks,
            ),
            seeders: view.field_i64("peersComplete")?,
            leechers: view.field_i64("peersAccounted")?,
            down_rate,
            up_rate: view.field_i64("upRate")?,
            ratio: view.field_f64("ratio")? / 1000.0,
            up_total: view.field_i64("upTotal")?,
            eta: progress.eta(down_rate),
            started: view.field_epoch("timestampStarted")?,
            finished: view.field_epoch("timestampFinished")?,
            tags,
        })
    }
}

/// Fetch every torrent of the `default` view.
pub async fn list_torrents<T: Transport>(caller: &Caller<T>) -> RpcResult<Vec<TorrentSummary>> {
    let records = caller.multicall("d.", "", "default", &TORRENT_FIELDS).await?;
    let summaries = records
        .iter()
        .map(TorrentSummary::from_record)
        .collect::<DecodeResult<Vec<_>>>()?;
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_precedence() {
        assert_eq!(torrent_status(1, 0, 0, 5), TorrentStatus::Hashing);
        assert_eq!(torrent_status(0, 0, 1, 5), TorrentStatus::Stopped);
        assert_eq!(torrent_status(0, 1, 0, 5), TorrentStatus::Paused);
        assert_eq!(torrent_status(0, 1, 1, 5), TorrentStatus::Downloading);
        assert_eq!(torrent_status(0, 1, 1, 0), TorrentStatus::Seeding);
    }

    #[test]
    fn done_uses_bytes_for_whole_torrents() {
        let progress = Progress {
            size_bytes: 1000,
            bytes_done: 250,
            size_chunks: 10,
            wanted_chunks: 8,
            completed_chunks: 2,
            chunk_size: 100,
        };
        assert_eq!(progress.done_percent(), 25.0);
        assert_eq!(progress.eta(50), Eta::Seconds(15.0));
    }

    #[test]
    fn done_uses_chunks_for_partial_selection() {
        let progress = Progress {
            size_bytes: 1000,
            bytes_done: 300,
            size_chunks: 10,
            wanted_chunks: 1,
            completed_chunks: 3,
            chunk_size: 100,
        };
        assert_eq!(progress.done_percent(), 75.0);
        assert_eq!(progress.eta(20), Eta::Seconds(5.0));
    }

    #[test]
    fn eta_edges() {
        let finished = Progress {
            size_chunks: 4,
            completed_chunks: 4,
            ..Default::default()
        };
        assert_eq!(finished.eta(0), Eta::Done);

        let stalled = Progress {
            size_chunks: 4,
            wanted_chunks: 4,
            ..Default::default()
        };
        assert_eq!(stalled.eta(0), Eta::Infinite);
        assert_eq!(stalled.done_percent(), 0.0);
    }
}
