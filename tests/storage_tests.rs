use insurai_portal::{
    session::{Role, Session, SessionStore},
    storage::{FileStorage, MemoryStorage, ROLE_KEY, SessionStorage, StorageState, TOKEN_KEY},
};
use std::{path::PathBuf, sync::Arc};
use uuid::Uuid;

fn scratch_file() -> PathBuf {
    std::env::temp_dir()
        .join(format!("insurai-portal-test-{}", Uuid::new_v4()))
        .join("session.json")
}

fn open(path: &PathBuf) -> SessionStore {
    SessionStore::initialize(Arc::new(FileStorage::new(path)) as StorageState)
}

#[cfg(test)]
mod file_tests {
    use super::*;

    #[test]
    fn test_session_survives_restart() {
        let path = scratch_file();

        let first_run = open(&path);
        assert_eq!(first_run.current(), Session::default());
        first_run.login("t1", Role::Admin).unwrap();
        drop(first_run);

        let second_run = open(&path);
        assert_eq!(second_run.current(), Session::authenticated("t1", Role::Admin));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_logout_is_durable() {
        let path = scratch_file();

        let store = open(&path);
        store.login("t1", Role::Normal).unwrap();
        store.logout();

        assert_eq!(open(&path).current(), Session::default());
        let raw = FileStorage::new(&path);
        assert!(raw.get(TOKEN_KEY).unwrap().is_none());
        assert!(raw.get(ROLE_KEY).unwrap().is_none());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_set_role_is_durable() {
        let path = scratch_file();

        let store = open(&path);
        store.login("t1", Role::Normal).unwrap();
        store.set_role(Role::Admin);

        assert_eq!(open(&path).current(), Session::authenticated("t1", Role::Admin));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_corrupt_file_starts_unauthenticated() {
        let path = scratch_file();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ broken").unwrap();

        assert_eq!(open(&path).current(), Session::default());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}

#[cfg(test)]
mod degraded_tests {
    use super::*;

    #[test]
    fn test_unavailable_storage_keeps_session_in_memory() {
        let store = SessionStore::initialize(Arc::new(MemoryStorage::new_failing()));

        store.login("t1", Role::Admin).unwrap();
        assert_eq!(store.current(), Session::authenticated("t1", Role::Admin));

        store.set_role(Role::Normal);
        assert_eq!(store.current().role, Role::Normal);

        // Nothing was persisted, so a "restart" on the same broken storage starts over.
        let restarted = SessionStore::initialize(Arc::new(MemoryStorage::new_failing()));
        assert_eq!(restarted.current(), Session::default());
    }
}
