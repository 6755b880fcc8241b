/// Unit tests over the public library API
use habit_wave::*;
use tempfile::NamedTempFile;

#[cfg(test)]
mod basic_unit_tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn local_noon(y: i32, m: u32, d: u32) -> i64 {
        Local.with_ymd_and_hms(y, m, d, 12, 0, 0).single().unwrap().timestamp()
    }

    fn habit(desc: &str, priority: i64) -> NewHabit {
        NewHabit::new(desc.to_string(), priority, 0, Category::Productivity, "08:00".to_string(), None)
            .unwrap()
            .with_days(vec![Day::Monday, Day::Tuesday])
            .with_times(vec![TimePeriod::Morning, TimePeriod::Evening])
    }

    #[test]
    fn test_habit_creation() {
        let new_habit = NewHabit::new(
            "Test Habit".to_string(),
            2,
            1,
            Category::Health,
            "06:30".to_string(),
            Some("first week".to_string()),
        );

        assert!(new_habit.is_ok());
        let new_habit = new_habit.unwrap();
        assert_eq!(new_habit.description, "Test Habit");
        assert!(new_habit.days.is_empty());
    }

    #[test]
    fn test_enum_parsing_at_the_boundary() {
        assert_eq!("creativity".parse::<Category>().unwrap(), Category::Creativity);
        assert_eq!("Saturday".parse::<Day>().unwrap(), Day::Saturday);
        assert_eq!("AFTERNOON".parse::<TimePeriod>().unwrap(), TimePeriod::Afternoon);
        assert!("Night".parse::<TimePeriod>().is_err());
    }

    #[test]
    fn test_storage_creation() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let storage = SqliteStorage::new(temp_file.path().to_path_buf());
        assert!(storage.is_ok());
    }

    #[test]
    fn test_created_schedule_reads_back() {
        let storage = SqliteStorage::in_memory().unwrap();
        let new_habit = habit("Plan day", 1).with_days(vec![Day::Friday, Day::Friday, Day::Sunday]);
        let habit_id = storage.create_habit(&new_habit).unwrap();

        let stored = storage.get_habit(habit_id).unwrap().unwrap();
        assert_eq!(stored.days, vec![Day::Friday, Day::Friday, Day::Sunday]);
        assert_eq!(stored.time_periods(), vec![TimePeriod::Morning, TimePeriod::Evening]);
    }

    #[test]
    fn test_priority_ordering() {
        let storage = SqliteStorage::in_memory().unwrap();
        for priority in [3, 1, 2] {
            storage.create_habit(&habit(&format!("p{}", priority), priority)).unwrap();
        }

        let ordered: Vec<i64> = storage.list_habits(None).unwrap().iter().map(|h| h.priority).collect();
        assert_eq!(ordered, vec![3, 2, 1]);
    }

    #[test]
    fn test_set_days_twice_is_not_doubled() {
        let storage = SqliteStorage::in_memory().unwrap();
        let habit_id = storage.create_habit(&habit("Inbox zero", 1)).unwrap();

        storage.set_days(habit_id, &[Day::Thursday]).unwrap();
        storage.set_days(habit_id, &[Day::Thursday]).unwrap();

        assert_eq!(storage.get_habit(habit_id).unwrap().unwrap().days, vec![Day::Thursday]);
    }

    #[test]
    fn test_priority_update_round_trip() {
        let storage = SqliteStorage::in_memory().unwrap();
        let habit_id = storage.create_habit(&habit("Deep work", 1)).unwrap();

        let update = HabitUpdate {
            priority: Some(4),
            ..Default::default()
        };
        storage.update_habit(habit_id, &update).unwrap();

        let stored = storage.get_habit(habit_id).unwrap().unwrap();
        assert_eq!(stored.priority, 4);
        assert_eq!(stored.description, "Deep work");
        assert_eq!(stored.category, Category::Productivity);
        assert_eq!(stored.time, "08:00");
    }

    #[test]
    fn test_streak_example() {
        let storage = SqliteStorage::in_memory().unwrap();
        let habit_id = storage.create_habit(&habit("Read", 1)).unwrap();

        for day in [10, 9, 8, 5] {
            storage.record_completion(habit_id, local_noon(2024, 1, day), None).unwrap();
        }

        let stats = storage.get_stats(habit_id).unwrap();
        assert_eq!(stats, HabitStats { total: 4, streak_days: 3 });
    }

    #[test]
    fn test_single_completion_streak() {
        let storage = SqliteStorage::in_memory().unwrap();
        let habit_id = storage.create_habit(&habit("Read", 1)).unwrap();
        storage.record_completion(habit_id, local_noon(2023, 7, 1), None).unwrap();

        assert_eq!(storage.get_stats(habit_id).unwrap(), HabitStats { total: 1, streak_days: 1 });
    }

    #[test]
    fn test_counters_follow_every_completion() {
        let storage = SqliteStorage::in_memory().unwrap();
        let habit_id = storage.create_habit(&habit("Stretch", 1)).unwrap();

        storage.record_completion(habit_id, local_noon(2024, 2, 1), None).unwrap();
        storage.record_completion(habit_id, local_noon(2024, 2, 2), Some("late")).unwrap();

        for progress in storage.get_progress(habit_id).unwrap() {
            assert_eq!((progress.completed, progress.total), (2, 2));
        }
        assert_eq!(storage.get_completions(habit_id).unwrap().len(), 2);
    }

    #[test]
    fn test_delete_then_get() {
        let storage = SqliteStorage::in_memory().unwrap();
        let habit_id = storage.create_habit(&habit("Temp", 1)).unwrap();
        storage.record_completion(habit_id, local_noon(2024, 2, 1), None).unwrap();

        storage.delete_habit(habit_id).unwrap();
        assert!(storage.get_habit(habit_id).unwrap().is_none());
        assert!(storage.get_completions(habit_id).unwrap().is_empty());
        assert!(storage.get_progress(habit_id).unwrap().is_empty());
    }
}
