use crate::frames::enriched_frame::EnrichedFrame;
use crate::sink::error::SinkError;
use crate::sink::Sink;
use crate::utils::is_plain_identifier;
use log::info;
use polars::prelude::*;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn sql_type(dtype: &DataType) -> &'static str {
    match dtype {
        DataType::Float32 | DataType::Float64 => "REAL",
        DataType::Boolean
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => "INTEGER",
        _ => "TEXT",
    }
}

/// Converts one frame column into SQLite values, one per row.
fn column_values(column: &Column) -> PolarsResult<Vec<Value>> {
    let values = match column.dtype() {
        DataType::Float64 => column
            .f64()?
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::Real))
            .collect(),
        DataType::Boolean => column
            .bool()?
            .into_iter()
            .map(|v| v.map_or(Value::Null, |b| Value::Integer(i64::from(b))))
            .collect(),
        DataType::Datetime(_, _) => column
            .datetime()?
            .as_datetime_iter()
            .map(|v| {
                v.map_or(Value::Null, |dt| {
                    Value::Text(dt.format(DATETIME_FORMAT).to_string())
                })
            })
            .collect(),
        DataType::String => column
            .str()?
            .into_iter()
            .map(|v| v.map_or(Value::Null, |s| Value::Text(s.to_string())))
            .collect(),
        dtype if dtype.is_integer() => column
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::Integer))
            .collect(),
        DataType::Float32 => column
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::Real))
            .collect(),
        _ => column
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.map_or(Value::Null, |s| Value::Text(s.to_string())))
            .collect(),
    };
    Ok(values)
}

/// Appends enriched frames to a SQLite table.
///
/// The table is created from the first frame's schema if it does not exist. Datetimes are
/// stored as `YYYY-MM-DD HH:MM:SS` text and booleans as 0/1 integers.
pub struct SqliteSink {
    connection: Connection,
    table: String,
}

impl SqliteSink {
    /// Opens (or creates) the database file at `path`, creating its parent directory.
    pub fn open(path: impl AsRef<Path>, table: &str) -> Result<Self, SinkError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SinkError::DirCreation(parent.to_path_buf(), e))?;
        }
        Self::from_connection(Connection::open(path)?, table)
    }

    pub fn in_memory(table: &str) -> Result<Self, SinkError> {
        Self::from_connection(Connection::open_in_memory()?, table)
    }

    pub fn from_connection(connection: Connection, table: &str) -> Result<Self, SinkError> {
        if !is_plain_identifier(table) {
            return Err(SinkError::InvalidTableName(table.to_string()));
        }
        Ok(Self {
            connection,
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Number of rows currently in the table, 0 if it does not exist yet.
    pub fn row_count(&self) -> Result<usize, SinkError> {
        let exists: bool = self.connection.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            [&self.table],
            |row| row.get(0),
        )?;
        if !exists {
            return Ok(0);
        }
        let count: i64 = self.connection.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote(&self.table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn create_table_sql(&self, df: &DataFrame) -> String {
        let columns: Vec<String> = df
            .get_columns()
            .iter()
            .map(|c| format!("{} {}", quote(c.name()), sql_type(c.dtype())))
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote(&self.table),
            columns.join(", ")
        )
    }

    fn insert_sql(&self, df: &DataFrame) -> String {
        let names: Vec<String> = df.get_columns().iter().map(|c| quote(c.name())).collect();
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(&self.table),
            names.join(", "),
            placeholders.join(", ")
        )
    }
}

impl Sink for SqliteSink {
    fn append(&mut self, frame: &EnrichedFrame) -> Result<usize, SinkError> {
        let df = &frame.frame;
        let columns = df
            .get_columns()
            .iter()
            .map(column_values)
            .collect::<PolarsResult<Vec<_>>>()?;
        let create_sql = self.create_table_sql(df);
        let insert_sql = self.insert_sql(df);

        let tx = self.connection.transaction()?;
        tx.execute(&create_sql, [])?;
        {
            let mut statement = tx.prepare(&insert_sql)?;
            for row in 0..df.height() {
                statement.execute(params_from_iter(columns.iter().map(|values| &values[row])))?;
            }
        }
        tx.commit()?;

        info!("Appended {} rows to SQLite table '{}'", df.height(), self.table);
        Ok(df.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::forecast;
    use crate::{FeaturePipeline, PipelineConfig};

    fn enriched(hours: usize) -> EnrichedFrame {
        FeaturePipeline::new(PipelineConfig::default())
            .and_then(|pipeline| pipeline.run(&forecast(hours)))
            .expect("synthetic forecast is valid")
    }

    #[test]
    fn test_appends_rows_and_accepts_duplicates() -> Result<(), SinkError> {
        let frame = enriched(5);
        let mut sink = SqliteSink::in_memory("weather")?;
        assert_eq!(sink.row_count()?, 0);

        assert_eq!(sink.append(&frame)?, 5);
        assert_eq!(sink.row_count()?, 5);
        sink.append(&frame)?;
        assert_eq!(sink.row_count()?, 10);
        Ok(())
    }

    #[test]
    fn test_stores_dates_as_text_and_flags_as_integers() -> Result<(), SinkError> {
        let mut sink = SqliteSink::in_memory("weather")?;
        sink.append(&enriched(3))?;

        let (date, is_colder, is_rain, direction): (String, i64, i64, String) =
            sink.connection().query_row(
                "SELECT date, is_colder, is_rain, wind_direction FROM weather ORDER BY date LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;
        assert_eq!(date, "2025-03-01 00:00:00");
        assert_eq!(is_colder, 1);
        assert_eq!(is_rain, 1);
        assert_eq!(direction, "N");
        Ok(())
    }

    #[test]
    fn test_missing_values_become_null() -> Result<(), SinkError> {
        let mut sink = SqliteSink::in_memory("weather")?;
        sink.append(&enriched(3))?;
        let nulls: i64 = sink.connection().query_row(
            "SELECT COUNT(*) FROM weather WHERE temp_3_hour_average IS NULL",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(nulls, 2);
        Ok(())
    }

    #[test]
    fn test_creates_typed_columns() -> Result<(), SinkError> {
        let mut sink = SqliteSink::in_memory("forecast_2025")?;
        sink.append(&enriched(3))?;
        let mut statement = sink
            .connection()
            .prepare("SELECT name, type FROM pragma_table_info('forecast_2025')")?;
        let columns: Vec<(String, String)> = statement
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<_, _>>()?;
        assert!(columns.contains(&("date".to_string(), "TEXT".to_string())));
        assert!(columns.contains(&("temperature_2m".to_string(), "REAL".to_string())));
        assert!(columns.contains(&("is_daytime".to_string(), "INTEGER".to_string())));
        assert!(columns.contains(&("is_warmer".to_string(), "INTEGER".to_string())));
        Ok(())
    }

    #[test]
    fn test_rejects_unsafe_table_names() {
        assert!(matches!(
            SqliteSink::in_memory("weather; DROP TABLE weather"),
            Err(SinkError::InvalidTableName(_))
        ));
        assert!(matches!(
            SqliteSink::in_memory(""),
            Err(SinkError::InvalidTableName(_))
        ));
    }

    #[test]
    fn test_opens_database_file_in_new_directory() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("db").join("weather.db");
        {
            let mut sink = SqliteSink::open(&path, "weather")?;
            sink.append(&enriched(4))?;
        }
        let reopened = SqliteSink::open(&path, "weather")?;
        assert_eq!(reopened.row_count()?, 4);
        Ok(())
    }
}
