use super::schema::{TableSpec, STAGING_EVENTS, STAGING_SONGS};
use super::Dialect;

/// Keeps, for every non-null natural key, only the row with the highest surrogate identifier.
///
/// Surrogate identifiers grow in ingestion order, so the surviving row is the latest record
/// loaded for that key. Rows whose key is null never survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatestRecordFilter {
    pub table: &'static TableSpec,
    pub partition_key: &'static str,
    pub tie_break: &'static str,
}

impl LatestRecordFilter {
    pub const fn new(
        table: &'static TableSpec,
        partition_key: &'static str,
        tie_break: &'static str,
    ) -> Self {
        Self {
            table,
            partition_key,
            tie_break,
        }
    }

    /// Set of surviving surrogate identifiers.
    pub fn subquery(&self) -> String {
        format!(
            "SELECT latest_id\n\
             FROM (\n    \
                 SELECT {key}, MAX({tie}) AS latest_id\n    \
                 FROM {table}\n    \
                 WHERE {key} IS NOT NULL\n    \
                 GROUP BY {key}\n\
             ) filter_records",
            key = self.partition_key,
            tie = self.tie_break,
            table = self.table.quoted_name()
        )
    }

    /// Predicate restricting a scan of the staging table to surviving rows.
    pub fn predicate(&self) -> String {
        format!("{} IN (\n{}\n)", self.tie_break, self.subquery())
    }
}

pub static LATEST_USER_EVENT: LatestRecordFilter =
    LatestRecordFilter::new(&STAGING_EVENTS, "user_id", "event_id");

pub static LATEST_SONG_RECORD: LatestRecordFilter =
    LatestRecordFilter::new(&STAGING_SONGS, "song_id", "songplay_id");

pub static LATEST_ARTIST_RECORD: LatestRecordFilter =
    LatestRecordFilter::new(&STAGING_SONGS, "artist_id", "songplay_id");

pub static LATEST_TITLE_RECORD: LatestRecordFilter =
    LatestRecordFilter::new(&STAGING_SONGS, "title", "songplay_id");

/// Distinct event timestamps, decoded from epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistinctTimestamps {
    pub table: &'static TableSpec,
    pub column: &'static str,
}

pub static EVENT_TIMESTAMPS: DistinctTimestamps = DistinctTimestamps {
    table: &STAGING_EVENTS,
    column: "ts",
};

impl DistinctTimestamps {
    /// Yields a single column named `ts`.
    pub fn subquery(&self, dialect: Dialect) -> String {
        format!(
            "SELECT DISTINCT {} AS ts\nFROM {}",
            dialect.epoch_millis_to_timestamp(self.column),
            self.table.quoted_name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_user_event_subquery() {
        let sql = LATEST_USER_EVENT.subquery();

        assert!(sql.contains("SELECT user_id, MAX(event_id) AS latest_id"));
        assert!(sql.contains("FROM \"staging_events\""));
        assert!(sql.contains("WHERE user_id IS NOT NULL"));
        assert!(sql.contains("GROUP BY user_id"));
    }

    #[test]
    fn test_songs_and_artists_share_staging_table() {
        assert_eq!(LATEST_SONG_RECORD.table, LATEST_ARTIST_RECORD.table);
        assert_eq!(LATEST_SONG_RECORD.tie_break, "songplay_id");
        assert!(LATEST_ARTIST_RECORD.subquery().contains("GROUP BY artist_id"));
    }

    #[test]
    fn test_predicate_filters_on_tie_break() {
        let predicate = LATEST_SONG_RECORD.predicate();
        assert!(predicate.starts_with("songplay_id IN (\nSELECT latest_id"));
        assert!(predicate.ends_with(") filter_records\n)"));
    }

    #[test]
    fn test_latest_title_record() {
        let predicate = LATEST_TITLE_RECORD.predicate();
        assert!(predicate.contains("SELECT title, MAX(songplay_id) AS latest_id"));
        assert!(predicate.contains("WHERE title IS NOT NULL"));
    }

    #[test]
    fn test_distinct_timestamps() {
        assert_eq!(
            EVENT_TIMESTAMPS.subquery(Dialect::Redshift),
            "SELECT DISTINCT TIMESTAMP 'epoch' + ts/1000 * INTERVAL '1 second' AS ts\nFROM \"staging_events\""
        );
        assert_eq!(
            EVENT_TIMESTAMPS.subquery(Dialect::DataFusion),
            "SELECT DISTINCT to_timestamp(ts / 1000) AS ts\nFROM \"staging_events\""
        );
    }
}
