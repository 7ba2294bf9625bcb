//! Database migration system
//!
//! Tracks schema versions and applies migrations in order.

use rusqlite::Connection;
use tracing::{debug, info, instrument};

use crate::error::Result;

/// A database migration
pub struct Migration {
    /// Version number (must be sequential starting from 1)
    pub version: u32,
    /// Description of what this migration does
    pub description: &'static str,
    /// SQL to run for this migration
    pub sql: &'static str,
}

/// All migrations in order
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        sql: r#"
            -- Member profiles
            CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                full_name TEXT,
                role TEXT NOT NULL DEFAULT 'INVESTOR',
                active INTEGER NOT NULL DEFAULT 1,
                investment_limit TEXT,
                created_at TEXT NOT NULL
            );

            -- Issued shares; share_number is the uniqueness guard for allocation
            CREATE TABLE IF NOT EXISTS beer_shares (
                id TEXT PRIMARY KEY,
                share_number INTEGER NOT NULL UNIQUE CHECK (share_number >= 1),
                owner_id TEXT NOT NULL,
                purchase_price TEXT NOT NULL,
                current_value TEXT NOT NULL,
                sale_price TEXT,
                is_for_sale INTEGER NOT NULL DEFAULT 0,
                purchased_at TEXT NOT NULL,
                FOREIGN KEY (owner_id) REFERENCES profiles(id)
            );

            -- Voting proposals (options and results stored as JSON)
            CREATE TABLE IF NOT EXISTS voting_proposals (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                proposal_type TEXT NOT NULL,
                options TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL,
                voting_starts_at TEXT,
                voting_ends_at TEXT NOT NULL,
                results TEXT,
                FOREIGN KEY (created_by) REFERENCES profiles(id)
            );

            -- Ballots, one per voter per proposal
            CREATE TABLE IF NOT EXISTS votes (
                id TEXT PRIMARY KEY,
                proposal_id TEXT NOT NULL,
                voter_id TEXT NOT NULL,
                selected_option INTEGER NOT NULL,
                voting_power INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                FOREIGN KEY (proposal_id) REFERENCES voting_proposals(id) ON DELETE CASCADE,
                FOREIGN KEY (voter_id) REFERENCES profiles(id),
                UNIQUE(proposal_id, voter_id)
            );

            -- Beer Coin ledger
            CREATE TABLE IF NOT EXISTS coin_transactions (
                id TEXT PRIMARY KEY,
                profile_id TEXT NOT NULL,
                amount TEXT NOT NULL,
                transaction_type TEXT NOT NULL,
                description TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Add recipes, productions and investments",
        sql: r#"
            CREATE TABLE IF NOT EXISTS beer_recipes (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                style TEXT,
                abv REAL,
                ibu INTEGER,
                srm INTEGER,
                ingredients TEXT NOT NULL,
                process_steps TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'DRAFT',
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (created_by) REFERENCES profiles(id)
            );

            CREATE TABLE IF NOT EXISTS productions (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                recipe_id TEXT,
                brewer_id TEXT,
                status TEXT NOT NULL DEFAULT 'funding',
                price_per_liter TEXT NOT NULL,
                max_liters INTEGER NOT NULL,
                liters_committed INTEGER NOT NULL DEFAULT 0,
                funding_deadline TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (recipe_id) REFERENCES beer_recipes(id) ON DELETE SET NULL,
                FOREIGN KEY (brewer_id) REFERENCES profiles(id),
                CHECK (liters_committed <= max_liters)
            );

            CREATE TABLE IF NOT EXISTS investments (
                id TEXT PRIMARY KEY,
                investor_id TEXT NOT NULL,
                production_id TEXT NOT NULL,
                liters INTEGER NOT NULL,
                amount_paid TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (investor_id) REFERENCES profiles(id),
                FOREIGN KEY (production_id) REFERENCES productions(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 3,
        description: "Add indexes for query performance",
        sql: r#"
            CREATE INDEX IF NOT EXISTS idx_shares_owner ON beer_shares(owner_id);
            CREATE INDEX IF NOT EXISTS idx_proposals_status_created
                ON voting_proposals(status, created_at);
            CREATE INDEX IF NOT EXISTS idx_votes_proposal ON votes(proposal_id);
            CREATE INDEX IF NOT EXISTS idx_coins_profile_created
                ON coin_transactions(profile_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_investments_production ON investments(production_id);
            CREATE INDEX IF NOT EXISTS idx_investments_investor ON investments(investor_id);
        "#,
    },
];

/// Initialize the migrations table
fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Highest applied version, 0 on a fresh database
pub(crate) fn current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}

/// Apply one migration and record it in the same transaction
fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.sql)?;
    tx.execute(
        "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            migration.version,
            migration.description,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    tx.commit()?;
    Ok(())
}

/// Run all pending migrations
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    init_migrations_table(conn)?;

    let from = current_version(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > from).collect();
    if pending.is_empty() {
        debug!(version = from, "Schema up to date");
        return Ok(());
    }

    for migration in pending {
        info!(
            version = migration.version,
            description = migration.description,
            "Applying migration"
        );
        apply(conn, migration)?;
    }

    info!(from, to = current_version(conn)?, "Database schema updated");
    Ok(())
}
