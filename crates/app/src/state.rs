//! Application state management

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use baasbeer_core::members;
use baasbeer_core::{Config, Database, Error, Profile, Result};
use tracing::info;

/// Main application state
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub config: Config,
    /// Email given with `--as`, resolved on demand
    acting_email: Option<String>,
}

impl AppState {
    /// Load configuration and open the database
    pub fn new(
        config_path: Option<&Path>,
        db_override: Option<PathBuf>,
        acting_email: Option<String>,
    ) -> Result<Self> {
        let config = Config::load(config_path)?;
        let db_path = match db_override {
            Some(path) => path,
            None => config.database_path()?,
        };

        info!(path = %db_path.display(), "Opening database");
        let db = Database::open(&db_path)?;
        Ok(Self::with_database(db, config, acting_email))
    }

    pub fn with_database(db: Database, config: Config, acting_email: Option<String>) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            config,
            acting_email,
        }
    }

    pub fn db(&self) -> Result<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|_| Error::InvalidOperation("database lock poisoned".into()))
    }

    /// The profile named by `--as`
    pub fn acting_profile(&self, db: &Database) -> Result<Profile> {
        self.optional_acting_profile(db)?.ok_or_else(|| {
            Error::Validation("this command needs --as <email> to identify the member".into())
        })
    }

    /// Like `acting_profile`, for commands that also work anonymously
    pub fn optional_acting_profile(&self, db: &Database) -> Result<Option<Profile>> {
        let Some(email) = self.acting_email.as_deref() else {
            return Ok(None);
        };
        let profile = members::find_by_email(db, email)?;
        if !profile.active {
            return Err(Error::PermissionDenied(format!(
                "profile '{}' is deactivated",
                profile.email
            )));
        }
        Ok(Some(profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baasbeer_core::Role;
    use tempfile::tempdir;

    #[test]
    fn test_new_with_db_override() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "[voting]\nactive_proposal_limit = 2\n").unwrap();
        let db_path = dir.path().join("data").join("brew.db");

        let state = AppState::new(Some(&config_path), Some(db_path.clone()), None).unwrap();
        assert_eq!(state.config.voting.active_proposal_limit, 2);
        assert!(db_path.exists());
    }

    #[test]
    fn test_acting_profile_resolution() {
        let db = Database::open_in_memory().unwrap();
        db.profiles()
            .create(&Profile::new("ana@baas.beer", Role::Investor))
            .unwrap();
        let state = AppState::with_database(db, Config::default(), Some("ana@baas.beer".into()));

        let db = state.db().unwrap();
        assert_eq!(state.acting_profile(&db).unwrap().email, "ana@baas.beer");

        let anonymous = AppState::with_database(
            Database::open_in_memory().unwrap(),
            Config::default(),
            None,
        );
        let db = anonymous.db().unwrap();
        assert!(matches!(
            anonymous.acting_profile(&db).unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[test]
    fn test_deactivated_profile_cannot_act() {
        let db = Database::open_in_memory().unwrap();
        let leo = Profile::new("leo@baas.beer", Role::Investor);
        db.profiles().create(&leo).unwrap();
        db.profiles().set_active(leo.id, false).unwrap();
        let state = AppState::with_database(db, Config::default(), Some("leo@baas.beer".into()));

        let db = state.db().unwrap();
        assert!(matches!(
            state.acting_profile(&db).unwrap_err(),
            Error::PermissionDenied(_)
        ));
        assert!(matches!(
            state.optional_acting_profile(&db).unwrap_err(),
            Error::PermissionDenied(_)
        ));
    }
}
