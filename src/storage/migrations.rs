/// Database migration management
///
/// This module handles creating and updating the SQLite database schema.
/// It ensures the database has all the required tables and indexes.

use rusqlite::{Connection, OptionalExtension};
use crate::storage::StorageError;

/// Current database schema version
///
/// Increment this when you add new migrations
const CURRENT_VERSION: i32 = 1;

/// Initialize the database schema
///
/// This creates all required tables and indexes if they don't exist.
/// It also sets up the version tracking for future migrations.
pub fn initialize_database(conn: &Connection) -> Result<(), StorageError> {
    // Create version tracking table first
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let current_version = get_current_version(conn)?;

    if current_version > CURRENT_VERSION {
        return Err(StorageError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current_version, CURRENT_VERSION
        )));
    }

    if current_version < CURRENT_VERSION {
        run_migrations(conn, current_version)?;
        set_version(conn, CURRENT_VERSION)?;
    }

    Ok(())
}

/// Get the current database schema version (0 for a fresh database)
fn get_current_version(conn: &Connection) -> Result<i32, StorageError> {
    let version = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get::<_, i32>(0)
        })
        .optional()?
        .unwrap_or(0);

    Ok(version)
}

/// Set the database schema version
fn set_version(conn: &Connection, version: i32) -> Result<(), StorageError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Run database migrations from the current version to the latest
fn run_migrations(conn: &Connection, from_version: i32) -> Result<(), StorageError> {
    if from_version < 1 {
        migration_v1(conn)?;
    }

    Ok(())
}

/// Migration to version 1: habits, their schedule associations, completions
fn migration_v1(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        r#"CREATE TABLE IF NOT EXISTS Habits (
            ID INTEGER PRIMARY KEY AUTOINCREMENT,
            "Desc" TEXT NOT NULL CHECK (length(trim("Desc")) > 0),
            Priority INTEGER NOT NULL,
            Preferences INTEGER NOT NULL,
            Type TEXT NOT NULL CHECK (Type IN ('Health', 'Learning', 'Creativity', 'Productivity')),
            Time TEXT NOT NULL,
            Remarks TEXT
        )"#,
        [],
    )?;

    // Duplicate (HabitID, Day) rows are allowed on purpose
    conn.execute(
        "CREATE TABLE IF NOT EXISTS HabitDays (
            HabitID INTEGER NOT NULL REFERENCES Habits (ID) ON DELETE CASCADE,
            Day TEXT NOT NULL CHECK (Day IN ('Monday', 'Tuesday', 'Wednesday', 'Thursday', 'Friday', 'Saturday', 'Sunday'))
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS HabitTimes (
            HabitID INTEGER NOT NULL REFERENCES Habits (ID) ON DELETE CASCADE,
            Time TEXT NOT NULL CHECK (Time IN ('Morning', 'Afternoon', 'Evening')),
            CompletedCount INTEGER NOT NULL DEFAULT 0 CHECK (CompletedCount >= 0),
            TotalCount INTEGER NOT NULL DEFAULT 0 CHECK (TotalCount >= 0)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS Completions (
            ID INTEGER PRIMARY KEY AUTOINCREMENT,
            HabitID INTEGER NOT NULL REFERENCES Habits (ID) ON DELETE CASCADE,
            CompletedAt INTEGER NOT NULL,
            Notes TEXT
        )",
        [],
    )?;

    create_indexes_v1(conn)?;

    tracing::info!("Applied migration v1: Created initial database schema");
    Ok(())
}

/// Create database indexes for version 1
fn create_indexes_v1(conn: &Connection) -> Result<(), StorageError> {
    // Hydrating a habit's schedule
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_habit_days_habit ON HabitDays (HabitID)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_habit_times_habit ON HabitTimes (HabitID)",
        [],
    )?;

    // "Which habits run on Monday"
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_habit_days_day ON HabitDays (Day)",
        [],
    )?;

    // Stats and completion history
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_completions_habit_completed
         ON Completions (HabitID, CompletedAt)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_habits_type ON Habits (Type)",
        [],
    )?;

    tracing::info!("Created database indexes for v1");
    Ok(())
}
