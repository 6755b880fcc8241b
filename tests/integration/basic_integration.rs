/// Basic integration tests
use habit_wave::config::ServerConfig;
use habit_wave::*;
use tempfile::NamedTempFile;

#[cfg(test)]
mod basic_integration_tests {
    use super::*;

    #[test]
    fn test_server_creation() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let server = HabitTrackerServer::new(ServerConfig::with_database(temp_file.path().to_path_buf()));
        assert!(server.is_ok());
    }

    #[test]
    fn test_database_persistence() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let db_path = temp_file.path().to_path_buf();

        let habit_id = {
            let server = HabitTrackerServer::new(ServerConfig::with_database(db_path.clone()))
                .expect("Failed to create first server");

            let new_habit = NewHabit::new(
                "Meditate".to_string(),
                2,
                0,
                Category::Health,
                "07:00".to_string(),
                None,
            )
            .unwrap()
            .with_days(vec![Day::Sunday])
            .with_times(vec![TimePeriod::Morning]);

            server.storage().create_habit(&new_habit).unwrap()
        };

        // A second server over the same file sees the habit
        let server = HabitTrackerServer::new(ServerConfig::with_database(db_path))
            .expect("Failed to create second server");
        let habit = server.storage().get_habit(habit_id).unwrap().unwrap();
        assert_eq!(habit.description, "Meditate");
        assert_eq!(habit.days, vec![Day::Sunday]);
    }

    #[test]
    fn test_storage_interface() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let storage = SqliteStorage::new(temp_file.path().to_path_buf())
            .expect("Failed to create storage");

        let storage: &dyn HabitStorage = &storage;
        assert!(storage.list_habits(None).unwrap().is_empty());
    }
}
