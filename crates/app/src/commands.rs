//! Command handlers
//!
//! Each subcommand is one synchronous round trip against the store. Output
//! goes to the supplied writer so handlers can be exercised in tests.

use std::io::Write;

use baasbeer_core::allocation::ShareAllocator;
use baasbeer_core::coins::{self, format_coins};
use baasbeer_core::dashboard::shares_overview;
use baasbeer_core::voting::{self, format_percentage};
use baasbeer_core::{
    funding, members, permissions, recipes, seed, Capability, Database, Error, ProcessStep,
    Production, Profile, ProposalTally, Recipe, Result, VotingProposal,
};
use chrono::Utc;
use uuid::Uuid;

use crate::cli::{
    CoinsCommand, Commands, ProductionsCommand, ProfileCommand, ProposalsCommand, RecipeCommand,
    SharesCommand,
};
use crate::state::AppState;

pub fn run<W: Write>(state: &AppState, command: Commands, out: &mut W) -> Result<()> {
    let db = state.db()?;
    match command {
        Commands::Profile(cmd) => profile(state, &db, cmd, out),
        Commands::Shares(cmd) => shares(state, &db, cmd, out),
        Commands::Proposals(cmd) => proposals(state, &db, cmd, out),
        Commands::Vote { proposal, option } => {
            let voter = state.acting_profile(&db)?;
            let vote = voting::cast_vote(&*db, &voter, proposal, option, Utc::now())?;
            writeln!(
                out,
                "Vote recorded for option {} with voting power {}",
                vote.selected_option, vote.voting_power
            )?;
            Ok(())
        }
        Commands::Tally { proposal } => {
            let found = find_proposal(&db, proposal)?;
            let tally = voting::tally(&*db, proposal)?;
            write_tally(out, &found, &tally)
        }
        Commands::Coins(cmd) => coins_cmd(state, &db, cmd, out),
        Commands::Productions(cmd) => productions(state, &db, cmd, out),
        Commands::Invest { production, liters } => {
            let investor = state.acting_profile(&db)?;
            let investment = funding::invest_with_coins(&db, &investor, production, liters)?;
            writeln!(
                out,
                "Invested {}L for {} Beer Coins (balance {})",
                investment.liters,
                format_coins(investment.amount_paid),
                format_coins(coins::balance(&db, investor.id)?)
            )?;
            Ok(())
        }
        Commands::Recipe(cmd) => recipe(state, &db, cmd, out),
        Commands::Seed => {
            let report = seed::seed_sample_data(&db)?;
            if report.proposals == 0 && report.recipes == 0 {
                writeln!(out, "No profiles yet; add one before seeding")?;
            } else {
                writeln!(
                    out,
                    "Seeded {} proposals and {} recipes",
                    report.proposals, report.recipes
                )?;
            }
            Ok(())
        }
    }
}

fn profile<W: Write>(state: &AppState, db: &Database, cmd: ProfileCommand, out: &mut W) -> Result<()> {
    match cmd {
        ProfileCommand::Add { email, name, role } => {
            let actor = state.optional_acting_profile(db)?;
            let mut profile = Profile::new(email.trim(), role);
            if let Some(name) = name {
                profile = profile.with_full_name(name);
            }
            members::register(db, actor.as_ref(), &profile, &state.config.coins)?;
            writeln!(
                out,
                "Registered {} as {} ({} Beer Coins welcome bonus)",
                profile.email,
                profile.role,
                format_coins(state.config.coins.welcome_bonus)
            )?;
        }
        ProfileCommand::List => {
            for p in db.profiles().list()? {
                writeln!(out, "{}  {:<9} {}  {}", p.id, p.role.as_str(), p.email, p.display_name())?;
            }
        }
        ProfileCommand::SetRole { email, role } => {
            let actor = state.acting_profile(db)?;
            let target = members::find_by_email(db, &email)?;
            members::change_role(db, &actor, target.id, role)?;
            writeln!(out, "{} is now {}", target.email, role)?;
        }
        ProfileCommand::Deactivate { email } => {
            let actor = state.acting_profile(db)?;
            let target = members::find_by_email(db, &email)?;
            members::deactivate(db, &actor, target.id)?;
            writeln!(out, "{} is deactivated", target.email)?;
        }
        ProfileCommand::Activate { email } => {
            let actor = state.acting_profile(db)?;
            let target = members::find_by_email(db, &email)?;
            members::reactivate(db, &actor, target.id)?;
            writeln!(out, "{} is active", target.email)?;
        }
        ProfileCommand::SetLimit { email, amount } => {
            let actor = state.acting_profile(db)?;
            let target = members::find_by_email(db, &email)?;
            members::set_investment_limit(db, &actor, target.id, amount)?;
            match amount {
                Some(limit) => writeln!(
                    out,
                    "{} may invest up to {} Beer Coins",
                    target.email,
                    format_coins(limit)
                )?,
                None => writeln!(out, "{} has no investment limit", target.email)?,
            }
        }
    }
    Ok(())
}

fn shares<W: Write>(state: &AppState, db: &Database, cmd: SharesCommand, out: &mut W) -> Result<()> {
    let owner = state.acting_profile(db)?;
    match cmd {
        SharesCommand::Buy { quantity } => {
            let purchase = ShareAllocator::new(&state.config.shares).purchase(db, owner.id, quantity)?;
            writeln!(
                out,
                "Bought {} shares at {} each, total {}",
                purchase.share_numbers.len(),
                format_coins(purchase.unit_price),
                format_coins(purchase.total_price)
            )?;
            writeln!(out, "Share numbers: {}", join_numbers(&purchase.share_numbers))?;
        }
        SharesCommand::Overview => {
            let overview = shares_overview(db, owner.id, &state.config.shares)?;
            writeln!(out, "Your shares:     {}", overview.user_shares)?;
            writeln!(out, "Issued:          {}", overview.total_issued)?;
            writeln!(out, "Available:       {}", overview.available)?;
            writeln!(out, "Share value:     {}", format_coins(overview.share_value))?;
            writeln!(out, "Invested:        {}", format_coins(overview.invested_value))?;
            writeln!(out, "Voting power:    {}%", format_percentage(overview.voting_power_pct))?;
            writeln!(out, "Ballot weight:   {}", voting::current_power(db, owner.id)?)?;
        }
        SharesCommand::List => {
            let numbers: Vec<u32> = db
                .shares()
                .list_by_owner(owner.id)?
                .iter()
                .map(|s| s.share_number)
                .collect();
            if numbers.is_empty() {
                writeln!(out, "No shares held")?;
            } else {
                writeln!(out, "{}", join_numbers(&numbers))?;
            }
        }
    }
    Ok(())
}

fn proposals<W: Write>(
    state: &AppState,
    db: &Database,
    cmd: ProposalsCommand,
    out: &mut W,
) -> Result<()> {
    match cmd {
        ProposalsCommand::List { limit } => {
            let limit = limit.unwrap_or(state.config.voting.active_proposal_limit);
            let active = voting::list_active(db, limit)?;
            if active.is_empty() {
                writeln!(out, "No active proposals")?;
            }
            for p in active {
                writeln!(
                    out,
                    "{}  [{}] {} (closes {})",
                    p.id,
                    p.proposal_type.as_str(),
                    p.title,
                    p.voting_ends_at.format("%Y-%m-%d %H:%M")
                )?;
            }
        }
        ProposalsCommand::Show { proposal } => {
            let p = find_proposal(db, proposal)?;
            writeln!(out, "{}", p.title)?;
            writeln!(out, "{}", p.description)?;
            writeln!(
                out,
                "Status: {}  Closes: {}",
                p.status.as_str(),
                p.voting_ends_at.format("%Y-%m-%d %H:%M")
            )?;
            for (i, option) in p.options.iter().enumerate() {
                match &option.description {
                    Some(d) => writeln!(out, "  [{}] {} - {}", i, option.text, d)?,
                    None => writeln!(out, "  [{}] {}", i, option.text)?,
                }
            }
            if let Some(results) = &p.results {
                write_tally(out, &p, results)?;
            }
        }
        ProposalsCommand::CloseExpired => {
            let closed = voting::close_expired(db, Utc::now())?;
            writeln!(out, "Closed {} proposals", closed.len())?;
        }
    }
    Ok(())
}

fn coins_cmd<W: Write>(state: &AppState, db: &Database, cmd: CoinsCommand, out: &mut W) -> Result<()> {
    let actor = state.acting_profile(db)?;
    match cmd {
        CoinsCommand::Balance => {
            writeln!(out, "{} Beer Coins", format_coins(coins::balance(db, actor.id)?))?;
        }
        CoinsCommand::History => {
            for entry in coins::transactions(db, actor.id)? {
                writeln!(
                    out,
                    "{}  {}{:>10}  {}",
                    entry.created_at.format("%Y-%m-%d %H:%M"),
                    entry.transaction_type.sign(),
                    format_coins(entry.amount.abs()),
                    entry.description
                )?;
            }
        }
        CoinsCommand::Credit {
            email,
            amount,
            description,
        } => {
            permissions::require(actor.role, Capability::ManageUsers)?;
            let target = members::find_by_email(db, &email)?;
            coins::credit(db, target.id, amount, &description)?;
            writeln!(
                out,
                "Credited {} Beer Coins to {}",
                format_coins(amount),
                target.email
            )?;
        }
    }
    Ok(())
}

fn productions<W: Write>(
    state: &AppState,
    db: &Database,
    cmd: ProductionsCommand,
    out: &mut W,
) -> Result<()> {
    match cmd {
        ProductionsCommand::Add {
            name,
            price,
            max_liters,
            description,
            recipe,
        } => {
            let actor = state.acting_profile(db)?;
            let mut production = Production::new(name.trim(), price, max_liters);
            production.description = description;
            production.recipe_id = recipe;
            funding::create_production(db, &actor, &production)?;
            writeln!(out, "Production {} open for funding ({})", production.name, production.id)?;
        }
        ProductionsCommand::List => {
            for p in funding::list_productions(db)? {
                writeln!(
                    out,
                    "{}  {:<9} {}  {}/{}L at {}",
                    p.id,
                    p.status.as_str(),
                    p.name,
                    p.liters_committed,
                    p.max_liters,
                    format_coins(p.price_per_liter)
                )?;
            }
        }
        ProductionsCommand::Assume { production } => {
            let brewer = state.acting_profile(db)?;
            let assumed = funding::assume_production(db, &brewer, production)?;
            writeln!(out, "{} is now brewing {}", brewer.email, assumed.name)?;
        }
    }
    Ok(())
}

fn recipe<W: Write>(state: &AppState, db: &Database, cmd: RecipeCommand, out: &mut W) -> Result<()> {
    match cmd {
        RecipeCommand::Submit {
            name,
            description,
            style,
            abv,
            ibu,
            srm,
            ingredients,
            steps,
        } => {
            let author = state.acting_profile(db)?;
            let mut draft = Recipe::draft(name, author.id);
            draft.description = description;
            draft.style = style;
            draft.abv = abv;
            draft.ibu = ibu;
            draft.srm = srm;
            draft.ingredients = ingredients;
            draft.process_steps = steps
                .into_iter()
                .enumerate()
                .map(|(i, d)| ProcessStep::new(i as u32 + 1, d))
                .collect();

            let submission = recipes::submit(db, &author, draft, &state.config.voting)?;
            writeln!(
                out,
                "Recipe {} submitted; vote on proposal {}",
                submission.recipe.name, submission.proposal.id
            )?;
        }
    }
    Ok(())
}

fn find_proposal(db: &Database, id: Uuid) -> Result<VotingProposal> {
    db.proposals()
        .find_by_id(id)?
        .ok_or_else(|| Error::NotFound(format!("proposal {}", id)))
}

fn write_tally<W: Write>(out: &mut W, proposal: &VotingProposal, tally: &ProposalTally) -> Result<()> {
    writeln!(
        out,
        "{}: {} ballots, total weight {}",
        proposal.title, tally.total_ballots, tally.total_weight
    )?;
    for option in &tally.options {
        writeln!(
            out,
            "  [{}] {:<40} {:>6} {:>7}%  ({} ballots)",
            option.index,
            option.text,
            option.weight,
            format_percentage(option.percentage),
            option.ballots
        )?;
    }
    Ok(())
}

fn join_numbers(numbers: &[u32]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use baasbeer_core::Config;
    use clap::Parser;
    use tempfile::tempdir;

    use crate::cli::Cli;

    fn exec(state_path: &std::path::Path, args: &[&str]) -> Result<String> {
        let mut argv = vec!["baasbeer", "--db"];
        argv.push(state_path.to_str().unwrap());
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).unwrap();

        let db = Database::open(state_path)?;
        let state = AppState::with_database(db, Config::default(), cli.acting_as.clone());
        let mut out = Vec::new();
        run(&state, cli.command, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_buy_shares_end_to_end() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("brew.db");

        exec(&db, &["profile", "add", "ana@baas.beer", "--name", "Ana"]).unwrap();
        exec(&db, &["profile", "add", "leo@baas.beer"]).unwrap();

        let out = exec(&db, &["--as", "ana@baas.beer", "shares", "buy", "3"]).unwrap();
        assert!(out.contains("Share numbers: 1, 2, 3"));
        assert!(out.contains("total 300.00"));

        let out = exec(&db, &["--as", "leo@baas.beer", "shares", "buy", "2"]).unwrap();
        assert!(out.contains("Share numbers: 4, 5"));

        let out = exec(&db, &["--as", "ana@baas.beer", "shares", "overview"]).unwrap();
        assert!(out.contains("Voting power:    0.03%"));
        assert!(out.contains("Ballot weight:   3"));
        assert!(out.contains("Available:       9995"));
    }

    #[test]
    fn test_vote_and_tally() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("brew.db");

        exec(&db, &["profile", "add", "admin@baas.beer", "--role", "admin"]).unwrap();
        exec(&db, &["seed"]).unwrap();

        let proposal = {
            let database = Database::open(&db).unwrap();
            database.proposals().list_active(5).unwrap()[0].id.to_string()
        };

        let out = exec(&db, &["--as", "admin@baas.beer", "vote", &proposal, "1"]).unwrap();
        assert!(out.contains("voting power 1"));

        let err = exec(&db, &["--as", "admin@baas.beer", "vote", &proposal, "0"]).unwrap_err();
        assert!(matches!(err, Error::AlreadyVoted { .. }));

        let out = exec(&db, &["tally", &proposal]).unwrap();
        assert!(out.contains("1 ballots, total weight 1"));
        assert!(out.contains("100.00%"));
    }

    #[test]
    fn test_invest_flow() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("brew.db");

        exec(&db, &["profile", "add", "brewer@baas.beer", "--role", "brewer"]).unwrap();
        exec(&db, &["profile", "add", "ana@baas.beer"]).unwrap();
        exec(
            &db,
            &[
                "--as", "brewer@baas.beer", "productions", "add", "Pilsen", "--price", "2.50",
                "--max-liters", "100",
            ],
        )
        .unwrap();

        let production = {
            let database = Database::open(&db).unwrap();
            database.productions().list().unwrap()[0].id.to_string()
        };

        let out = exec(&db, &["--as", "ana@baas.beer", "invest", &production, "4"]).unwrap();
        assert!(out.contains("Invested 4L for 10.00 Beer Coins (balance 40.00)"));

        let out = exec(&db, &["--as", "ana@baas.beer", "coins", "history"]).unwrap();
        assert!(out.contains("Investment in Pilsen - 4L"));
        assert!(out.contains("Welcome bonus"));
    }

    #[test]
    fn test_commands_need_acting_profile() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("brew.db");
        let err = exec(&db, &["coins", "balance"]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_investor_cannot_credit_coins() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("brew.db");
        exec(&db, &["profile", "add", "ana@baas.beer"]).unwrap();

        let err = exec(
            &db,
            &["--as", "ana@baas.beer", "coins", "credit", "ana@baas.beer", "100"],
        )
        .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
    }

    #[test]
    fn test_unauthorized_admin_registration_is_denied() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("brew.db");
        exec(&db, &["profile", "add", "admin@baas.beer", "--role", "admin"]).unwrap();
        exec(&db, &["profile", "add", "ana@baas.beer"]).unwrap();

        let err = exec(&db, &["profile", "add", "evil@baas.beer", "--role", "admin"]).unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
        let err = exec(
            &db,
            &["--as", "ana@baas.beer", "profile", "add", "evil@baas.beer", "--role", "admin"],
        )
        .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
        let err = exec(
            &db,
            &["--as", "evil@baas.beer", "coins", "credit", "evil@baas.beer", "1000000"],
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let out = exec(
            &db,
            &["--as", "admin@baas.beer", "profile", "add", "bia@baas.beer", "--role", "brewer"],
        )
        .unwrap();
        assert!(out.contains("Registered bia@baas.beer as Brewer"));
    }

    #[test]
    fn test_deactivated_member_cannot_buy_or_vote() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("brew.db");
        exec(&db, &["profile", "add", "admin@baas.beer", "--role", "admin"]).unwrap();
        exec(&db, &["profile", "add", "ana@baas.beer"]).unwrap();
        exec(&db, &["seed"]).unwrap();

        let err = exec(&db, &["--as", "ana@baas.beer", "profile", "deactivate", "admin@baas.beer"])
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));

        let out = exec(&db, &["--as", "admin@baas.beer", "profile", "deactivate", "ana@baas.beer"])
            .unwrap();
        assert!(out.contains("ana@baas.beer is deactivated"));

        let err = exec(&db, &["--as", "ana@baas.beer", "shares", "buy", "1"]).unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
        let proposal = {
            let database = Database::open(&db).unwrap();
            database.proposals().list_active(5).unwrap()[0].id.to_string()
        };
        let err = exec(&db, &["--as", "ana@baas.beer", "vote", &proposal, "0"]).unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));

        exec(&db, &["--as", "admin@baas.beer", "profile", "activate", "ana@baas.beer"]).unwrap();
        let out = exec(&db, &["--as", "ana@baas.beer", "shares", "buy", "1"]).unwrap();
        assert!(out.contains("Share numbers: 1"));
    }

    #[test]
    fn test_investment_limit_from_cli() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("brew.db");
        exec(&db, &["profile", "add", "admin@baas.beer", "--role", "admin"]).unwrap();
        exec(&db, &["profile", "add", "ana@baas.beer"]).unwrap();
        exec(
            &db,
            &[
                "--as", "admin@baas.beer", "productions", "add", "Pilsen", "--price", "2.50",
                "--max-liters", "100",
            ],
        )
        .unwrap();
        let production = {
            let database = Database::open(&db).unwrap();
            database.productions().list().unwrap()[0].id.to_string()
        };

        let out = exec(
            &db,
            &["--as", "admin@baas.beer", "profile", "set-limit", "ana@baas.beer", "10"],
        )
        .unwrap();
        assert!(out.contains("may invest up to 10.00 Beer Coins"));

        let err = exec(&db, &["--as", "ana@baas.beer", "invest", &production, "5"]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        exec(&db, &["--as", "ana@baas.beer", "invest", &production, "4"]).unwrap();

        exec(&db, &["--as", "admin@baas.beer", "profile", "set-limit", "ana@baas.beer"]).unwrap();
        exec(&db, &["--as", "ana@baas.beer", "invest", &production, "5"]).unwrap();
    }
}
