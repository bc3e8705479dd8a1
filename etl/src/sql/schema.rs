use super::{quote_ident, Dialect};

/// Column types used by the warehouse tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    BigInt,
    Integer,
    SmallInt,
    Double,
    Varchar(Option<u32>),
    Text,
    Timestamp,
}

/// Redshift stores `VARCHAR` without a length, and `TEXT`, as `VARCHAR(256)`.
const REDSHIFT_DEFAULT_VARCHAR_BYTES: u32 = 256;

impl ColumnType {
    pub fn render(&self, dialect: Dialect) -> String {
        match (self, dialect) {
            (ColumnType::BigInt, _) => "BIGINT".to_string(),
            (ColumnType::Integer, _) => "INTEGER".to_string(),
            (ColumnType::SmallInt, _) => "SMALLINT".to_string(),
            (ColumnType::Double, Dialect::Redshift) => "DOUBLE PRECISION".to_string(),
            (ColumnType::Double, Dialect::DataFusion) => "DOUBLE".to_string(),
            (ColumnType::Varchar(Some(len)), Dialect::Redshift) => format!("VARCHAR({})", len),
            (ColumnType::Varchar(_), _) => "VARCHAR".to_string(),
            (ColumnType::Text, _) => "TEXT".to_string(),
            (ColumnType::Timestamp, _) => "TIMESTAMP".to_string(),
        }
    }

    /// Longest value in bytes a character column accepts.
    pub fn max_bytes(&self) -> Option<usize> {
        match self {
            ColumnType::Varchar(Some(len)) => Some(*len as usize),
            ColumnType::Varchar(None) | ColumnType::Text => {
                Some(REDSHIFT_DEFAULT_VARCHAR_BYTES as usize)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub identity: bool,
    pub primary_key: bool,
    pub not_null: bool,
    pub sort_key: bool,
    pub dist_key: bool,
}

impl Column {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            identity: false,
            primary_key: false,
            not_null: false,
            sort_key: false,
            dist_key: false,
        }
    }

    /// Auto-assigned, ingestion-ordered surrogate identifier.
    pub const fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub const fn sort_key(mut self) -> Self {
        self.sort_key = true;
        self
    }

    pub const fn dist_key(mut self) -> Self {
        self.dist_key = true;
        self
    }

    fn render(&self, dialect: Dialect) -> String {
        let mut parts = vec![self.name.to_string(), self.ty.render(dialect)];

        if self.identity && dialect == Dialect::Redshift {
            parts.push("IDENTITY(1,1)".to_string());
        }
        if self.not_null {
            parts.push("NOT NULL".to_string());
        }
        if self.primary_key {
            parts.push("PRIMARY KEY".to_string());
        }
        if dialect.supports_physical_hints() {
            if self.sort_key {
                parts.push("SORTKEY".to_string());
            }
            if self.dist_key {
                parts.push("DISTKEY".to_string());
            }
        }

        parts.join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Staging,
    Fact,
    Dimension,
}

/// How rows of a table are spread across the cluster's slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistStyle {
    /// Engine default, or keyed when a column carries `DISTKEY`.
    Auto,
    /// Full copy on every node, for small dimensions joined broadcast-style.
    All,
}

#[derive(Debug, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub kind: TableKind,
    pub columns: &'static [Column],
    pub dist_style: DistStyle,
}

impl TableSpec {
    pub fn quoted_name(&self) -> String {
        quote_ident(self.name)
    }

    pub fn identity_column(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.identity)
    }

    /// Columns a bulk load fills, in table order. Identity columns are assigned by the engine.
    pub fn load_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.identity)
    }

    /// Business key of a dimension; `None` for staging and fact tables.
    pub fn natural_key(&self) -> Option<&Column> {
        match self.kind {
            TableKind::Dimension => self.columns.iter().find(|c| c.primary_key),
            _ => None,
        }
    }

    pub fn create_sql(&self, dialect: Dialect) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("    {}", c.render(dialect)))
            .collect::<Vec<_>>()
            .join(",\n");

        let dist_style = match (self.dist_style, dialect.supports_physical_hints()) {
            (DistStyle::All, true) => "\nDISTSTYLE ALL",
            _ => "",
        };

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n){};",
            self.quoted_name(),
            columns,
            dist_style
        )
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {};", self.quoted_name())
    }
}

pub static STAGING_EVENTS: TableSpec = TableSpec {
    name: "staging_events",
    kind: TableKind::Staging,
    columns: &[
        Column::new("event_id", ColumnType::BigInt).identity().primary_key(),
        Column::new("artist_name", ColumnType::Varchar(Some(255))),
        Column::new("auth", ColumnType::Varchar(Some(50))),
        Column::new("user_first_name", ColumnType::Varchar(Some(255))),
        Column::new("user_gender", ColumnType::Varchar(Some(1))),
        Column::new("item_in_session", ColumnType::Integer),
        Column::new("user_last_name", ColumnType::Varchar(Some(255))),
        Column::new("song_length", ColumnType::Double),
        Column::new("user_level", ColumnType::Varchar(Some(50))),
        Column::new("location", ColumnType::Varchar(Some(255))),
        Column::new("method", ColumnType::Varchar(Some(4))),
        Column::new("page", ColumnType::Varchar(Some(35))),
        Column::new("registration", ColumnType::Varchar(Some(50))),
        Column::new("session_id", ColumnType::BigInt),
        Column::new("song_title", ColumnType::Varchar(Some(255))),
        Column::new("status", ColumnType::SmallInt),
        Column::new("ts", ColumnType::BigInt),
        Column::new("user_agent", ColumnType::Text),
        Column::new("user_id", ColumnType::BigInt),
    ],
    dist_style: DistStyle::Auto,
};

pub static STAGING_SONGS: TableSpec = TableSpec {
    name: "staging_songs",
    kind: TableKind::Staging,
    columns: &[
        Column::new("songplay_id", ColumnType::BigInt).identity().primary_key(),
        Column::new("num_songs", ColumnType::Integer),
        Column::new("artist_id", ColumnType::Varchar(None)),
        Column::new("artist_latitude", ColumnType::Double),
        Column::new("artist_longitude", ColumnType::Double),
        Column::new("artist_location", ColumnType::Varchar(None)),
        Column::new("artist_name", ColumnType::Varchar(Some(255))),
        Column::new("song_id", ColumnType::Varchar(None)),
        Column::new("title", ColumnType::Varchar(Some(255))),
        Column::new("duration", ColumnType::Double),
        Column::new("year", ColumnType::Integer),
    ],
    dist_style: DistStyle::Auto,
};

pub static SONGPLAYS: TableSpec = TableSpec {
    name: "songplays",
    kind: TableKind::Fact,
    columns: &[
        Column::new("songplay_id", ColumnType::BigInt).identity().primary_key(),
        Column::new("start_time", ColumnType::Timestamp).sort_key(),
        Column::new("user_id", ColumnType::BigInt).dist_key(),
        Column::new("level", ColumnType::Varchar(None)),
        Column::new("song_id", ColumnType::Varchar(None)),
        Column::new("artist_id", ColumnType::Varchar(None)),
        Column::new("session_id", ColumnType::Integer),
        Column::new("location", ColumnType::Varchar(None)),
        Column::new("user_agent", ColumnType::Varchar(None)),
    ],
    dist_style: DistStyle::Auto,
};

pub static USERS: TableSpec = TableSpec {
    name: "users",
    kind: TableKind::Dimension,
    columns: &[
        Column::new("user_id", ColumnType::BigInt).primary_key().sort_key().dist_key(),
        Column::new("first_name", ColumnType::Varchar(None)).not_null(),
        Column::new("last_name", ColumnType::Varchar(None)).not_null(),
        Column::new("gender", ColumnType::Varchar(None)),
        Column::new("level", ColumnType::Varchar(None)).not_null(),
    ],
    dist_style: DistStyle::Auto,
};

pub static SONGS: TableSpec = TableSpec {
    name: "songs",
    kind: TableKind::Dimension,
    columns: &[
        Column::new("song_id", ColumnType::Varchar(None)).primary_key(),
        Column::new("title", ColumnType::Varchar(Some(255))).not_null(),
        Column::new("artist_id", ColumnType::Varchar(None)).not_null().dist_key(),
        Column::new("year", ColumnType::Integer).sort_key(),
        Column::new("duration", ColumnType::Double),
    ],
    dist_style: DistStyle::Auto,
};

pub static ARTISTS: TableSpec = TableSpec {
    name: "artists",
    kind: TableKind::Dimension,
    columns: &[
        Column::new("artist_id", ColumnType::Varchar(None)).primary_key().sort_key(),
        Column::new("name", ColumnType::Varchar(None)).not_null(),
        Column::new("location", ColumnType::Varchar(None)),
        Column::new("latitude", ColumnType::Double),
        Column::new("longitude", ColumnType::Double),
    ],
    dist_style: DistStyle::All,
};

pub static TIME: TableSpec = TableSpec {
    name: "time",
    kind: TableKind::Dimension,
    columns: &[
        Column::new("start_time", ColumnType::Timestamp).primary_key(),
        Column::new("hour", ColumnType::Integer).not_null(),
        Column::new("day", ColumnType::Integer).not_null(),
        Column::new("week", ColumnType::Integer).not_null(),
        Column::new("month", ColumnType::Integer).not_null(),
        Column::new("year", ColumnType::Integer).not_null(),
        Column::new("weekday", ColumnType::Integer).not_null(),
    ],
    dist_style: DistStyle::All,
};

/// Every table, in creation (and drop) order.
pub static ALL_TABLES: [&TableSpec; 7] = [
    &STAGING_EVENTS,
    &STAGING_SONGS,
    &SONGPLAYS,
    &USERS,
    &SONGS,
    &ARTISTS,
    &TIME,
];

pub static DIMENSION_TABLES: [&TableSpec; 4] = [&USERS, &SONGS, &ARTISTS, &TIME];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redshift_staging_ddl_keeps_identity() {
        let sql = STAGING_EVENTS.create_sql(Dialect::Redshift);

        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"staging_events\" ("));
        assert!(sql.contains("event_id BIGINT IDENTITY(1,1) PRIMARY KEY"));
        assert!(sql.contains("song_length DOUBLE PRECISION"));
        assert!(sql.contains("user_gender VARCHAR(1)"));
        assert!(sql.ends_with(");"));
    }

    #[test]
    fn test_redshift_fact_hints() {
        let sql = SONGPLAYS.create_sql(Dialect::Redshift);

        assert!(sql.contains("start_time TIMESTAMP SORTKEY"));
        assert!(sql.contains("user_id BIGINT DISTKEY"));
        assert!(!sql.contains("DISTSTYLE"));
    }

    #[test]
    fn test_broadcast_dimensions_are_replicated() {
        assert!(ARTISTS.create_sql(Dialect::Redshift).ends_with("DISTSTYLE ALL;"));
        assert!(TIME.create_sql(Dialect::Redshift).ends_with("DISTSTYLE ALL;"));
        assert!(
            USERS
                .create_sql(Dialect::Redshift)
                .contains("user_id BIGINT PRIMARY KEY SORTKEY DISTKEY")
        );
        assert!(
            SONGS
                .create_sql(Dialect::Redshift)
                .contains("artist_id VARCHAR NOT NULL DISTKEY")
        );
    }

    #[test]
    fn test_local_ddl_has_no_physical_hints() {
        for table in ALL_TABLES {
            let sql = table.create_sql(Dialect::DataFusion);
            assert!(!sql.contains("IDENTITY"), "{}", sql);
            assert!(!sql.contains("SORTKEY"), "{}", sql);
            assert!(!sql.contains("DISTKEY"), "{}", sql);
            assert!(!sql.contains("DISTSTYLE"), "{}", sql);
        }
    }

    #[test]
    fn test_drop_is_idempotent_statement() {
        assert_eq!(TIME.drop_sql(), "DROP TABLE IF EXISTS \"time\";");
    }

    #[test]
    fn test_natural_keys() {
        assert_eq!(USERS.natural_key().map(|c| c.name), Some("user_id"));
        assert_eq!(SONGS.natural_key().map(|c| c.name), Some("song_id"));
        assert_eq!(ARTISTS.natural_key().map(|c| c.name), Some("artist_id"));
        assert_eq!(TIME.natural_key().map(|c| c.name), Some("start_time"));
        assert!(STAGING_SONGS.natural_key().is_none());
        assert!(SONGPLAYS.natural_key().is_none());
    }

    #[test]
    fn test_load_columns_skip_identity() {
        let names: Vec<_> = STAGING_SONGS.load_columns().map(|c| c.name).collect();
        assert_eq!(names.len(), 10);
        assert_eq!(names[0], "num_songs");
        assert!(!names.contains(&"songplay_id"));
    }

    #[test]
    fn test_text_width_follows_redshift() {
        assert_eq!(ColumnType::Text.max_bytes(), Some(256));
        assert_eq!(ColumnType::Varchar(Some(35)).max_bytes(), Some(35));
        assert_eq!(ColumnType::BigInt.max_bytes(), None);
    }
}
