/// SQLite implementation of the habit storage interface
///
/// This module provides the concrete SQLite implementation for storing
/// and retrieving habit data. A habit is spread over three tables (the row,
/// its days, its time periods) and is put back together here.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use chrono::Local;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Params, Row, ToSql};

use crate::domain::{
    Category, Completion, CompletionId, Day, Habit, HabitId, HabitStats, HabitUpdate, NewHabit,
    TimePeriod, TimeProgress, TimeSlot,
};
use crate::storage::{migrations, HabitStorage, StorageError};

/// Habit row columns, in the order `habit_from_row` reads them
const HABIT_COLUMNS: &str = r#"ID, "Desc", Priority, Preferences, Type, Time, Remarks"#;

/// SQLite-based storage implementation
///
/// The connection sits behind a mutex: one writer at a time is all this
/// workload needs, and every multi-statement write runs in a transaction.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    ///
    /// This opens the database file and runs any necessary migrations
    /// to ensure the schema is up to date.
    pub fn new(db_path: PathBuf) -> Result<Self, StorageError> {
        let conn = Connection::open(&db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        let storage = Self::from_connection(conn)?;
        tracing::info!("SQLite storage initialized at: {:?}", db_path);
        Ok(storage)
    }

    /// Storage backed by a private in-memory database
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        // Cascading deletes depend on this
        conn.execute("PRAGMA foreign_keys = ON", [])
            .map_err(|e| StorageError::Connection(format!("Failed to enable foreign keys: {}", e)))?;

        migrations::initialize_database(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Run a read-only closure against the raw connection
    ///
    /// Used by tests and diagnostics that need to look at the tables directly.
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StorageError> {
        let conn = self.lock()?;
        Ok(f(&*conn)?)
    }
}

impl HabitStorage for SqliteStorage {
    fn create_habit(&self, habit: &NewHabit) -> Result<HabitId, StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"INSERT INTO Habits ("Desc", Priority, Preferences, Type, Time, Remarks)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                habit.description,
                habit.priority,
                habit.preferences,
                habit.category,
                habit.time,
                habit.remarks,
            ],
        )?;
        let habit_id = HabitId(tx.last_insert_rowid());

        insert_days(&tx, habit_id, &habit.days)?;
        insert_times(&tx, habit_id, &habit.times)?;

        tx.commit()?;

        tracing::debug!(
            "Created habit {} ({}) with {} days and {} times",
            habit_id,
            habit.description,
            habit.days.len(),
            habit.times.len()
        );
        Ok(habit_id)
    }

    fn set_days(&self, habit_id: HabitId, days: &[Day]) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        ensure_habit_exists(&tx, habit_id)?;
        replace_days(&tx, habit_id, days)?;

        tx.commit()?;
        tracing::debug!("Replaced days of habit {}: {:?}", habit_id, days);
        Ok(())
    }

    fn set_times(&self, habit_id: HabitId, times: &[TimePeriod]) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        ensure_habit_exists(&tx, habit_id)?;
        replace_times(&tx, habit_id, times)?;

        tx.commit()?;
        tracing::debug!("Replaced times of habit {}: {:?}", habit_id, times);
        Ok(())
    }

    fn update_habit(&self, habit_id: HabitId, update: &HabitUpdate) -> Result<HabitId, StorageError> {
        update.validate()?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        ensure_habit_exists(&tx, habit_id)?;

        if update.touches_row() {
            let mut assignments: Vec<&str> = Vec::new();
            let mut values: Vec<&dyn ToSql> = Vec::new();

            if let Some(ref desc) = update.description {
                assignments.push(r#""Desc" = ?"#);
                values.push(desc);
            }
            if let Some(ref priority) = update.priority {
                assignments.push("Priority = ?");
                values.push(priority);
            }
            if let Some(ref preferences) = update.preferences {
                assignments.push("Preferences = ?");
                values.push(preferences);
            }
            if let Some(ref category) = update.category {
                assignments.push("Type = ?");
                values.push(category);
            }
            if let Some(ref time) = update.time {
                assignments.push("Time = ?");
                values.push(time);
            }
            if let Some(ref remarks) = update.remarks {
                assignments.push("Remarks = ?");
                values.push(remarks);
            }
            values.push(&habit_id);

            let sql = format!("UPDATE Habits SET {} WHERE ID = ?", assignments.join(", "));
            tx.execute(&sql, values.as_slice())?;
        }

        if let Some(ref days) = update.days {
            replace_days(&tx, habit_id, days)?;
        }
        if let Some(ref times) = update.times {
            replace_times(&tx, habit_id, times)?;
        }

        tx.commit()?;

        tracing::debug!("Updated habit {}", habit_id);
        Ok(habit_id)
    }

    fn delete_habit(&self, habit_id: HabitId) -> Result<(), StorageError> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM Habits WHERE ID = ?1", params![habit_id])?;

        if rows == 0 {
            tracing::debug!("Delete of habit {} matched nothing", habit_id);
        } else {
            tracing::debug!("Deleted habit {}", habit_id);
        }
        Ok(())
    }

    fn get_habit(&self, habit_id: HabitId) -> Result<Option<Habit>, StorageError> {
        let conn = self.lock()?;
        Ok(load_habit(&conn, habit_id)?)
    }

    fn list_habits(&self, category: Option<Category>) -> Result<Vec<Habit>, StorageError> {
        let conn = self.lock()?;

        let mut habits = match category {
            Some(category) => query_habits(
                &conn,
                &format!(
                    "SELECT {} FROM Habits WHERE Type = ?1
                     ORDER BY Priority DESC, Time ASC, ID ASC",
                    HABIT_COLUMNS
                ),
                params![category],
            )?,
            None => query_habits(
                &conn,
                &format!(
                    "SELECT {} FROM Habits ORDER BY Priority DESC, Time ASC, ID ASC",
                    HABIT_COLUMNS
                ),
                [],
            )?,
        };

        attach_schedules(&conn, &mut habits, category)?;
        Ok(habits)
    }

    fn list_habits_for_day(
        &self,
        day: Day,
        time: Option<TimePeriod>,
    ) -> Result<Vec<Habit>, StorageError> {
        let conn = self.lock()?;

        let habit_ids: Vec<HabitId> = match time {
            Some(time) => query_ids(
                &conn,
                "SELECT DISTINCT h.ID, h.Priority, h.Time
                 FROM Habits h
                 JOIN HabitDays hd ON h.ID = hd.HabitID
                 JOIN HabitTimes ht ON h.ID = ht.HabitID
                 WHERE hd.Day = ?1 AND ht.Time = ?2
                 ORDER BY h.Priority DESC, h.Time ASC, h.ID ASC",
                params![day, time],
            )?,
            None => query_ids(
                &conn,
                "SELECT DISTINCT h.ID, h.Priority, h.Time
                 FROM Habits h
                 JOIN HabitDays hd ON h.ID = hd.HabitID
                 WHERE hd.Day = ?1
                 ORDER BY h.Priority DESC, h.Time ASC, h.ID ASC",
                params![day],
            )?,
        };

        let mut habits = Vec::with_capacity(habit_ids.len());
        for habit_id in habit_ids {
            if let Some(habit) = load_habit(&conn, habit_id)? {
                habits.push(habit);
            }
        }
        Ok(habits)
    }

    fn record_completion(
        &self,
        habit_id: HabitId,
        completed_at: i64,
        notes: Option<&str>,
    ) -> Result<CompletionId, StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        ensure_habit_exists(&tx, habit_id)?;

        tx.execute(
            "INSERT INTO Completions (HabitID, CompletedAt, Notes) VALUES (?1, ?2, ?3)",
            params![habit_id, completed_at, notes],
        )?;
        let completion_id = CompletionId(tx.last_insert_rowid());

        // Every period row counts every completion, whatever the time of day
        let bumped = tx.execute(
            "UPDATE HabitTimes
             SET CompletedCount = CompletedCount + 1,
                 TotalCount = TotalCount + 1
             WHERE HabitID = ?1",
            params![habit_id],
        )?;

        tx.commit()?;

        tracing::debug!(
            "Recorded completion {} for habit {} ({} period counters bumped)",
            completion_id,
            habit_id,
            bumped
        );
        Ok(completion_id)
    }

    fn get_completions(&self, habit_id: HabitId) -> Result<Vec<Completion>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT ID, HabitID, CompletedAt, Notes FROM Completions
             WHERE HabitID = ?1
             ORDER BY CompletedAt DESC, ID DESC",
        )?;

        let completions = stmt
            .query_map(params![habit_id], |row| {
                Ok(Completion {
                    id: CompletionId(row.get(0)?),
                    habit_id: row.get(1)?,
                    completed_at: row.get(2)?,
                    notes: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(completions)
    }

    fn get_stats(&self, habit_id: HabitId) -> Result<HabitStats, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT CompletedAt FROM Completions WHERE HabitID = ?1")?;
        let timestamps = stmt
            .query_map(params![habit_id], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(HabitStats::from_timestamps(&timestamps, &Local))
    }

    fn get_progress(&self, habit_id: HabitId) -> Result<Vec<TimeProgress>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT Time, CompletedCount, TotalCount FROM HabitTimes
             WHERE HabitID = ?1 ORDER BY rowid",
        )?;

        let progress = stmt
            .query_map(params![habit_id], |row| {
                Ok(TimeProgress {
                    time: row.get(0)?,
                    completed: row.get(1)?,
                    total: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(progress)
    }

    fn get_remark(&self, habit_id: HabitId) -> Result<String, StorageError> {
        let conn = self.lock()?;
        let remark: Option<Option<String>> = conn
            .query_row(
                "SELECT Remarks FROM Habits WHERE ID = ?1",
                params![habit_id],
                |row| row.get(0),
            )
            .optional()?;

        match remark {
            Some(remark) => Ok(remark.unwrap_or_default()),
            None => Err(StorageError::HabitNotFound { habit_id }),
        }
    }

    fn set_remark(&self, habit_id: HabitId, remark: &str) -> Result<(), StorageError> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "UPDATE Habits SET Remarks = ?1 WHERE ID = ?2",
            params![remark, habit_id],
        )?;

        if rows == 0 {
            return Err(StorageError::HabitNotFound { habit_id });
        }

        tracing::debug!("Updated remark of habit {}", habit_id);
        Ok(())
    }
}

// Row helpers. They take a plain `&Connection` so they run equally inside a
// transaction (which derefs to one).

fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<Habit> {
    Ok(Habit {
        id: row.get(0)?,
        description: row.get(1)?,
        priority: row.get(2)?,
        preferences: row.get(3)?,
        category: row.get(4)?,
        time: row.get(5)?,
        remarks: row.get(6)?,
        days: Vec::new(),
        times: Vec::new(),
    })
}

fn query_habits<P: Params>(conn: &Connection, sql: &str, params: P) -> rusqlite::Result<Vec<Habit>> {
    let mut stmt = conn.prepare(sql)?;
    let habits = stmt.query_map(params, habit_from_row)?.collect();
    habits
}

fn query_ids<P: Params>(conn: &Connection, sql: &str, params: P) -> rusqlite::Result<Vec<HabitId>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt.query_map(params, |row| row.get(0))?.collect();
    ids
}

fn ensure_habit_exists(conn: &Connection, habit_id: HabitId) -> Result<(), StorageError> {
    let exists = conn
        .query_row("SELECT 1 FROM Habits WHERE ID = ?1", params![habit_id], |_| Ok(()))
        .optional()?
        .is_some();

    if exists {
        Ok(())
    } else {
        Err(StorageError::HabitNotFound { habit_id })
    }
}

/// Load one habit and hydrate its days and times with per-habit queries
fn load_habit(conn: &Connection, habit_id: HabitId) -> rusqlite::Result<Option<Habit>> {
    let habit = conn
        .query_row(
            &format!("SELECT {} FROM Habits WHERE ID = ?1", HABIT_COLUMNS),
            params![habit_id],
            habit_from_row,
        )
        .optional()?;

    let Some(mut habit) = habit else {
        return Ok(None);
    };

    let mut stmt = conn.prepare_cached("SELECT Day FROM HabitDays WHERE HabitID = ?1 ORDER BY rowid")?;
    habit.days = stmt
        .query_map(params![habit_id], |row| row.get(0))?
        .collect::<Result<Vec<Day>, _>>()?;

    let mut stmt = conn.prepare_cached("SELECT Time FROM HabitTimes WHERE HabitID = ?1 ORDER BY rowid")?;
    habit.times = stmt
        .query_map(params![habit_id], |row| row.get::<_, TimePeriod>(0).map(TimeSlot::from))?
        .collect::<Result<Vec<TimeSlot>, _>>()?;

    Ok(Some(habit))
}

/// Fill in days and times for a listed batch of habits with two queries in total
///
/// The association rows are selected by joining back to `Habits` under the
/// same category filter as the listing, so no id list is bound and the
/// query stays within SQLite's variable limit however many habits exist.
fn attach_schedules(
    conn: &Connection,
    habits: &mut [Habit],
    category: Option<Category>,
) -> rusqlite::Result<()> {
    if habits.is_empty() {
        return Ok(());
    }

    let index: HashMap<HabitId, usize> = habits
        .iter()
        .enumerate()
        .map(|(i, habit)| (habit.id, i))
        .collect();
    let filter = if category.is_some() { "WHERE h.Type = ?1" } else { "" };

    let mut stmt = conn.prepare(&format!(
        "SELECT hd.HabitID, hd.Day FROM HabitDays hd
         JOIN Habits h ON h.ID = hd.HabitID {} ORDER BY hd.rowid",
        filter
    ))?;
    let rows = stmt.query_map(params_from_iter(category.iter()), |row| {
        Ok((row.get::<_, HabitId>(0)?, row.get::<_, Day>(1)?))
    })?;
    for row in rows {
        let (habit_id, day) = row?;
        if let Some(&i) = index.get(&habit_id) {
            habits[i].days.push(day);
        }
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT ht.HabitID, ht.Time FROM HabitTimes ht
         JOIN Habits h ON h.ID = ht.HabitID {} ORDER BY ht.rowid",
        filter
    ))?;
    let rows = stmt.query_map(params_from_iter(category.iter()), |row| {
        Ok((row.get::<_, HabitId>(0)?, row.get::<_, TimePeriod>(1)?))
    })?;
    for row in rows {
        let (habit_id, time) = row?;
        if let Some(&i) = index.get(&habit_id) {
            habits[i].times.push(TimeSlot::from(time));
        }
    }

    Ok(())
}

fn insert_days(conn: &Connection, habit_id: HabitId, days: &[Day]) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare_cached("INSERT INTO HabitDays (HabitID, Day) VALUES (?1, ?2)")?;
    for day in days {
        stmt.execute(params![habit_id, day])?;
    }
    Ok(())
}

fn insert_times(conn: &Connection, habit_id: HabitId, times: &[TimePeriod]) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO HabitTimes (HabitID, Time, CompletedCount, TotalCount) VALUES (?1, ?2, 0, 0)",
    )?;
    for time in times {
        stmt.execute(params![habit_id, time])?;
    }
    Ok(())
}

fn replace_days(conn: &Connection, habit_id: HabitId, days: &[Day]) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM HabitDays WHERE HabitID = ?1", params![habit_id])?;
    insert_days(conn, habit_id, days)
}

fn replace_times(conn: &Connection, habit_id: HabitId, times: &[TimePeriod]) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM HabitTimes WHERE HabitID = ?1", params![habit_id])?;
    insert_times(conn, habit_id, times)
}

// Column conversions. Enums are stored by canonical name; an unknown name
// in the database is reported as a conversion error rather than guessed at.

impl ToSql for HabitId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for HabitId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(HabitId)
    }
}

macro_rules! text_enum_sql {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse::<$ty>()
                        .map_err(|e| FromSqlError::Other(Box::new(e)))
                }
            }
        )+
    };
}

text_enum_sql!(Category, Day, TimePeriod);
