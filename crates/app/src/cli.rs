//! Command-line definitions

use std::path::PathBuf;

use baasbeer_core::{Ingredient, Role};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "baasbeer",
    about = "Shares, voting and Beer Coins for a crowdfunded brewery",
    version,
    long_about = None
)]
pub struct Cli {
    /// Log level filter (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overriding the configured location
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Email of the profile performing the action
    #[arg(long = "as", global = true, value_name = "EMAIL")]
    pub acting_as: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage member profiles
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Buy and inspect shares
    #[command(subcommand)]
    Shares(SharesCommand),

    /// Browse and close voting proposals
    #[command(subcommand)]
    Proposals(ProposalsCommand),

    /// Cast a ballot on a proposal
    Vote {
        proposal: Uuid,
        /// Zero-based option index
        option: u32,
    },

    /// Show weighted results for a proposal
    Tally { proposal: Uuid },

    /// Beer Coin balance and history
    #[command(subcommand)]
    Coins(CoinsCommand),

    /// Production batches
    #[command(subcommand)]
    Productions(ProductionsCommand),

    /// Invest Beer Coins in a production batch
    Invest { production: Uuid, liters: u32 },

    /// Submit recipes for approval
    #[command(subcommand)]
    Recipe(RecipeCommand),

    /// Insert sample proposals and recipes
    Seed,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Register a profile (credits the welcome bonus). Roles other than
    /// investor need `--as` with a user manager, unless this is the first profile
    Add {
        email: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long, default_value = "investor")]
        role: Role,
    },
    /// List all profiles
    List,
    /// Change a profile's role
    SetRole { email: String, role: Role },
    /// Stop a member from acting
    Deactivate { email: String },
    /// Allow a deactivated member to act again
    Activate { email: String },
    /// Cap the Beer Coins a member may invest; omit the amount to clear it
    SetLimit {
        email: String,
        amount: Option<Decimal>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SharesCommand {
    /// Buy shares at the current unit price
    Buy { quantity: u32 },
    /// Holdings summary
    Overview,
    /// Share numbers held
    List,
}

#[derive(Subcommand, Debug)]
pub enum ProposalsCommand {
    /// Active proposals, most recent first
    List {
        /// Defaults to voting.active_proposal_limit
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Details of one proposal
    Show { proposal: Uuid },
    /// Close proposals whose voting window has ended
    CloseExpired,
}

#[derive(Subcommand, Debug)]
pub enum CoinsCommand {
    Balance,
    History,
    /// Credit coins to a member
    Credit {
        email: String,
        amount: Decimal,
        #[arg(short, long, default_value = "Manual credit")]
        description: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProductionsCommand {
    /// Open a batch for funding
    Add {
        name: String,
        /// Beer Coins per liter
        #[arg(long)]
        price: Decimal,
        #[arg(long)]
        max_liters: u32,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        recipe: Option<Uuid>,
    },
    List,
    /// Become the brewer of a batch
    Assume { production: Uuid },
}

#[derive(Subcommand, Debug)]
pub enum RecipeCommand {
    /// Store a draft recipe and open its approval vote
    Submit {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        style: Option<String>,
        #[arg(long)]
        abv: Option<f64>,
        #[arg(long)]
        ibu: Option<u32>,
        #[arg(long)]
        srm: Option<u32>,
        /// Ingredient as NAME:AMOUNT:UNIT, repeatable
        #[arg(long = "ingredient", value_parser = parse_ingredient)]
        ingredients: Vec<Ingredient>,
        /// Process step description, repeatable
        #[arg(long = "step")]
        steps: Vec<String>,
    },
}

fn parse_ingredient(s: &str) -> Result<Ingredient, String> {
    let mut parts = s.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(amount), unit) => Ok(Ingredient::new(
            name.trim(),
            amount.trim(),
            unit.unwrap_or("").trim(),
        )),
        _ => Err(format!("expected NAME:AMOUNT[:UNIT], got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_buy_with_globals() {
        let cli = Cli::try_parse_from([
            "baasbeer", "--as", "ana@baas.beer", "shares", "buy", "5", "--db", "/tmp/x.db",
        ])
        .unwrap();
        assert_eq!(cli.acting_as.as_deref(), Some("ana@baas.beer"));
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert!(matches!(cli.command, Commands::Shares(SharesCommand::Buy { quantity: 5 })));
    }

    #[test]
    fn test_parse_role_case_insensitive() {
        let cli = Cli::try_parse_from(["baasbeer", "profile", "add", "b@baas.beer", "--role", "Brewer"])
            .unwrap();
        match cli.command {
            Commands::Profile(ProfileCommand::Add { role, .. }) => assert_eq!(role, Role::Brewer),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_ingredient() {
        let ingredient = parse_ingredient("Citra:50:g").unwrap();
        assert_eq!(ingredient, Ingredient::new("Citra", "50", "g"));
        assert_eq!(parse_ingredient("Yeast:1").unwrap().unit, "");
        assert!(parse_ingredient("Water").is_err());
    }

    #[test]
    fn test_parse_set_limit_optional_amount() {
        let cli = Cli::try_parse_from(["baasbeer", "profile", "set-limit", "ana@baas.beer"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Profile(ProfileCommand::SetLimit { amount: None, .. })
        ));
    }
}
