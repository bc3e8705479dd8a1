use super::dedup::{
    LatestRecordFilter, EVENT_TIMESTAMPS, LATEST_ARTIST_RECORD, LATEST_SONG_RECORD,
    LATEST_TITLE_RECORD, LATEST_USER_EVENT,
};
use super::schema::{TableSpec, ARTISTS, SONGPLAYS, SONGS, STAGING_EVENTS, STAGING_SONGS, TIME, USERS};
use super::{DatePart, Dialect};

/// `INSERT INTO <target> (<columns>) <select>`; select items map onto columns by position.
#[derive(Debug, Clone)]
pub struct InsertStatement {
    pub target: &'static TableSpec,
    pub columns: Vec<&'static str>,
    pub select: String,
}

impl InsertStatement {
    pub fn to_sql(&self) -> String {
        format!(
            "INSERT INTO {} ({})\n{};",
            self.target.quoted_name(),
            self.columns.join(", "),
            self.select
        )
    }
}

/// Transform statements in execution order: the fact table first, then the dimensions.
pub fn transform_statements(dialect: Dialect) -> Vec<InsertStatement> {
    vec![
        songplays(dialect),
        users(),
        songs(),
        artists(),
        time(dialect),
    ]
}

/// One fact row per staging event, matched to a song by title alone.
///
/// Events without a title match keep null `song_id` and `artist_id`. A title shared by
/// several catalog entries resolves to the latest loaded entry, so each event yields exactly
/// one row.
pub fn songplays(dialect: Dialect) -> InsertStatement {
    let mut columns = Vec::new();
    let mut items = Vec::new();

    if let Some(surrogate) = dialect.surrogate_key("e.event_id") {
        columns.push("songplay_id");
        items.push(surrogate);
    }

    columns.extend([
        "start_time",
        "user_id",
        "level",
        "song_id",
        "artist_id",
        "session_id",
        "location",
        "user_agent",
    ]);
    items.push(format!("{} AS start_time", dialect.epoch_millis_to_timestamp("e.ts")));
    items.extend(
        [
            "e.user_id",
            "e.user_level",
            "s.song_id",
            "s.artist_id",
            "e.session_id",
            "e.location",
            "e.user_agent",
        ]
        .map(String::from),
    );

    InsertStatement {
        target: &SONGPLAYS,
        columns,
        select: format!(
            "SELECT\n    {}\nFROM {} e\nLEFT JOIN (\nSELECT title, song_id, artist_id\nFROM {}\nWHERE {}\n) s ON e.song_title = s.title",
            items.join(",\n    "),
            STAGING_EVENTS.quoted_name(),
            STAGING_SONGS.quoted_name(),
            LATEST_TITLE_RECORD.predicate()
        ),
    }
}

pub fn users() -> InsertStatement {
    latest_projection(
        &USERS,
        &LATEST_USER_EVENT,
        &[
            ("user_id", "user_id"),
            ("first_name", "user_first_name"),
            ("last_name", "user_last_name"),
            ("gender", "user_gender"),
            ("level", "user_level"),
        ],
    )
}

pub fn songs() -> InsertStatement {
    latest_projection(
        &SONGS,
        &LATEST_SONG_RECORD,
        &[
            ("song_id", "song_id"),
            ("title", "title"),
            ("artist_id", "artist_id"),
            ("year", "year"),
            ("duration", "duration"),
        ],
    )
}

pub fn artists() -> InsertStatement {
    latest_projection(
        &ARTISTS,
        &LATEST_ARTIST_RECORD,
        &[
            ("artist_id", "artist_id"),
            ("name", "artist_name"),
            ("location", "artist_location"),
            ("latitude", "artist_latitude"),
            ("longitude", "artist_longitude"),
        ],
    )
}

/// Calendar breakdown of every distinct event timestamp.
pub fn time(dialect: Dialect) -> InsertStatement {
    let mut columns = vec!["start_time"];
    let mut items = vec!["ts".to_string()];

    for part in DatePart::ALL {
        columns.push(part.column());
        items.push(dialect.extract(part, "ts"));
    }

    InsertStatement {
        target: &TIME,
        columns,
        select: format!(
            "SELECT\n    {}\nFROM (\n{}\n) distinct_times",
            items.join(",\n    "),
            EVENT_TIMESTAMPS.subquery(dialect)
        ),
    }
}

// (target column, staging column) pairs, restricted to the rows the filter keeps.
fn latest_projection(
    target: &'static TableSpec,
    filter: &LatestRecordFilter,
    mapping: &[(&'static str, &'static str)],
) -> InsertStatement {
    let columns = mapping.iter().map(|(column, _)| *column).collect();
    let items = mapping
        .iter()
        .map(|(_, source)| *source)
        .collect::<Vec<_>>()
        .join(", ");

    InsertStatement {
        target,
        columns,
        select: format!(
            "SELECT {}\nFROM {}\nWHERE {}",
            items,
            filter.table.quoted_name(),
            filter.predicate()
        ),
    }
}
