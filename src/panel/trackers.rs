//! Tracker list of a single torrent.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::rpc::error::DecodeResult;
use crate::rpc::{BatchCommand, Caller, Command, ResultRecord, RpcResult, Transport};
use crate::util::record::RecordView;

/// Fields fetched for every tracker, in request order.
pub const TRACKER_FIELDS: [&str; 12] = [
    "is_enabled",
    "url",
    "latest_new_peers",
    "latest_sum_peers",
    "failed_counter",
    "success_counter",
    "success_time_last",
    "failed_time_last",
    "scrape_complete",
    "scrape_incomplete",
    "scrape_downloaded",
    "scrape_time_last",
];

/// Tracker health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerStatus {
    /// Announces succeed
    Working,
    /// No announce has completed yet
    Updating,
    /// Tracker disabled
    Inactive,
    /// Torrent stopped
    Stopped,
    /// At least one announce failed
    Faulty,
}

/// Classify a tracker; a stopped torrent overrides the tracker's own state.
pub fn tracker_status(
    torrent_state: i64,
    is_enabled: i64,
    failed_counter: i64,
    success_counter: i64,
) -> TrackerStatus {
    if torrent_state == 0 {
        TrackerStatus::Stopped
    } else if is_enabled == 0 {
        TrackerStatus::Inactive
    } else if failed_counter == 0 && success_counter == 0 {
        TrackerStatus::Updating
    } else if failed_counter == 0 {
        TrackerStatus::Working
    } else {
        TrackerStatus::Faulty
    }
}

/// One tracker row with derived values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerSummary {
    /// Position in the torrent's tracker list
    pub index: usize,
    /// Announce URL
    pub url: String,
    /// Whether the tracker is enabled
    pub enabled: bool,
    /// Derived health
    pub status: TrackerStatus,
    /// Peers new to us from the last announce
    pub new_peers: i64,
    /// Peers returned by the last announce
    pub sum_peers: i64,
    /// Seeders reported by the last scrape
    pub seeds: i64,
    /// Leechers reported by the last scrape
    pub leeches: i64,
    /// Completed downloads reported by the last scrape
    pub downloads: i64,
    /// Seconds since the last scrape attempt, `None` if never scraped
    pub since_last_scrape: Option<i64>,
    /// Last successful announce
    pub last_success: Option<DateTime<Utc>>,
    /// Last failed announce
    pub last_failure: Option<DateTime<Utc>>,
}

impl TrackerSummary {
    /// Build a summary from a record keyed by [`TRACKER_FIELDS`].
    pub fn from_record(
        index: usize,
        record: &ResultRecord,
        torrent_state: i64,
        now: DateTime<Utc>,
    ) -> DecodeResult<Self> {
        let view = RecordView::new(record);
        let is_enabled = view.field_i64("isEnabled")?;
        let last_scrape = view
            .field_i64("scrapeTimeLast")?
            .max(view.field_i64("failedTimeLast")?);

        Ok(Self {
            index,
            url: view.field_str("url")?.to_string(),
            enabled: is_enabled != 0,
            status: tracker_status(
                torrent_state,
                is_enabled,
                view.field_i64("failedCounter")?,
                view.field_i64("successCounter")?,
            ),
            new_peers: view.field_i64("latestNewPeers")?,
            sum_peers: view.field_i64("latestSumPeers")?,
            seeds: view.field_i64("scrapeComplete")?,
            leeches: view.field_i64("scrapeIncomplete")?,
            downloads: view.field_i64("scrapeDownloaded")?,
            since_last_scrape: (last_scrape != 0).then(|| now.timestamp() - last_scrape),
            last_success: view.field_epoch("successTimeLast")?,
            last_failure: view.field_epoch("failedTimeLast")?,
        })
    }
}

/// A torrent's name, state and trackers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TorrentTrackers {
    /// Torrent display name
    pub name: String,
    /// `d.state` of the torrent
    pub state: i64,
    /// `d.is_active` of the torrent
    pub is_active: i64,
    /// Trackers in server order
    pub trackers: Vec<TrackerSummary>,
}

/// Fetch the torrent header and its trackers.
pub async fn torrent_trackers<T: Transport>(
    caller: &Caller<T>,
    hash: &str,
    now: DateTime<Utc>,
) -> RpcResult<TorrentTrackers> {
    let header: Vec<BatchCommand> = ["name", "state", "is_active"]
        .into_iter()
        .map(|field| BatchCommand::from(&Command::new("d.", field).arg(hash)))
        .collect();
    let torrent = caller.batchcall(&header).await?;
    let view = RecordView::new(&torrent);
    let name = view.field_str("name")?.to_string();
    let state = view.field_i64("state")?;
    let is_active = view.field_i64("isActive")?;

    let records = caller.multicall("t.", hash, "", &TRACKER_FIELDS).await?;
    let trackers = records
        .iter()
        .enumerate()
        .map(|(index, record)| TrackerSummary::from_record(index, record, state, now))
        .collect::<DecodeResult<Vec<_>>>()?;

    Ok(TorrentTrackers {
        name,
        state,
        is_active,
        trackers,
    })
}
