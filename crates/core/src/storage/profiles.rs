//! Profile storage operations

use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_decimal_opt, parse_enum, parse_uuid, OptionalExt};
use crate::error::{Error, Result};
use crate::models::{Profile, Role};

const COLUMNS: &str = "id, email, full_name, role, active, investment_limit, created_at";

pub struct ProfileStore<'a> {
    conn: &'a Connection,
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        email: row.get(1)?,
        full_name: row.get(2)?,
        role: parse_enum(&row.get::<_, String>(3)?)?,
        active: row.get::<_, i32>(4)? != 0,
        investment_limit: parse_decimal_opt(row.get::<_, Option<String>>(5)?)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?)?,
    })
}

impl<'a> ProfileStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new profile
    #[instrument(skip(self, profile), fields(email = %profile.email, role = profile.role.as_str()))]
    pub fn create(&self, profile: &Profile) -> Result<()> {
        let result = self.conn.execute(
            "INSERT INTO profiles (id, email, full_name, role, active, investment_limit, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                profile.id.to_string(),
                profile.email,
                profile.full_name,
                profile.role.as_str(),
                profile.active as i32,
                profile.investment_limit.map(|d| d.to_string()),
                profile.created_at.to_rfc3339(),
            ],
        );

        match result.map_err(Error::from) {
            Ok(_) => Ok(()),
            Err(e) if e.is_unique_violation() => Err(Error::Validation(format!(
                "email '{}' is already registered",
                profile.email
            ))),
            Err(e) => Err(e),
        }
    }

    /// Find profile by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>> {
        let sql = format!("SELECT {} FROM profiles WHERE id = ?1", COLUMNS);
        let profile = self
            .conn
            .query_row(&sql, params![id.to_string()], from_row)
            .optional()?;
        Ok(profile)
    }

    /// Find profile by email
    #[instrument(skip(self))]
    pub fn find_by_email(&self, email: &str) -> Result<Option<Profile>> {
        let sql = format!("SELECT {} FROM profiles WHERE email = ?1", COLUMNS);
        let profile = self
            .conn
            .query_row(&sql, params![email], from_row)
            .optional()?;
        Ok(profile)
    }

    /// List profiles, oldest first
    pub fn list(&self) -> Result<Vec<Profile>> {
        let sql = format!("SELECT {} FROM profiles ORDER BY created_at, email", COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let profiles = stmt
            .query_map([], from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(profiles)
    }

    /// Change a profile's role
    #[instrument(skip(self))]
    pub fn update_role(&self, id: Uuid, role: Role) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE profiles SET role = ?1 WHERE id = ?2",
            params![role.as_str(), id.to_string()],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("profile {}", id)));
        }
        Ok(())
    }

    /// Enable or disable a profile
    #[instrument(skip(self))]
    pub fn set_active(&self, id: Uuid, active: bool) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE profiles SET active = ?1 WHERE id = ?2",
            params![active as i32, id.to_string()],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("profile {}", id)));
        }
        Ok(())
    }

    /// Set or clear the cap on total coins invested
    #[instrument(skip(self))]
    pub fn set_investment_limit(&self, id: Uuid, limit: Option<Decimal>) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE profiles SET investment_limit = ?1 WHERE id = ?2",
            params![limit.map(|d| d.to_string()), id.to_string()],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("profile {}", id)));
        }
        Ok(())
    }

    pub fn count(&self) -> Result<u32> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))?;
        Ok(count)
    }
}
