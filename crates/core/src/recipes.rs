//! Recipe submission
//!
//! A new recipe is stored as a draft and put to the shareholders as a
//! `beer_recipe` proposal in the same transaction.

use chrono::Utc;
use tracing::{info, instrument};

use crate::config::VotingConfig;
use crate::error::{Error, Result};
use crate::models::{
    ProposalOption, ProposalType, Profile, Recipe, RecipeStatus, VotingProposal,
};
use crate::permissions::{self, Capability};
use crate::storage::{Database, ProposalStore, RecipeStore};

/// Options every recipe proposal offers
pub const RECIPE_VOTE_OPTIONS: [&str; 3] = ["Approve", "Reject", "Request changes"];

/// A stored recipe and the proposal voting on it
#[derive(Debug, Clone)]
pub struct RecipeSubmission {
    pub recipe: Recipe,
    pub proposal: VotingProposal,
}

/// Drop blank ingredients and steps, renumbering steps from 1
pub fn normalize(mut recipe: Recipe) -> Recipe {
    recipe.name = recipe.name.trim().to_string();
    recipe.ingredients.retain(|i| !i.is_blank());
    recipe
        .process_steps
        .retain(|s| !s.description.trim().is_empty());
    for (i, step) in recipe.process_steps.iter_mut().enumerate() {
        step.step = i as u32 + 1;
    }
    recipe
}

fn approval_proposal(recipe: &Recipe, days: i64) -> VotingProposal {
    let mut description = format!("Vote to approve the recipe \"{}\".", recipe.name);
    if let Some(extra) = recipe.description.as_deref().filter(|d| !d.trim().is_empty()) {
        description.push(' ');
        description.push_str(extra.trim());
    }

    VotingProposal::open_for_days(
        format!("Recipe: {}", recipe.name),
        description,
        ProposalType::BeerRecipe,
        RECIPE_VOTE_OPTIONS
            .iter()
            .map(|text| ProposalOption::new(*text))
            .collect(),
        recipe.created_by,
        days,
    )
}

/// Store a recipe draft and open its approval vote
#[instrument(skip(db, author, recipe, voting), fields(author_id = %author.id, name = %recipe.name))]
pub fn submit(
    db: &Database,
    author: &Profile,
    recipe: Recipe,
    voting: &VotingConfig,
) -> Result<RecipeSubmission> {
    permissions::require(author.role, Capability::CreateRecipes)?;

    let mut recipe = normalize(recipe);
    if recipe.name.is_empty() {
        return Err(Error::Validation("recipe name cannot be empty".into()));
    }
    recipe.created_by = author.id;
    recipe.status = RecipeStatus::Draft;
    recipe.created_at = Utc::now();

    let proposal = approval_proposal(&recipe, voting.recipe_voting_days);

    db.atomically(|conn| {
        RecipeStore::new(conn).create(&recipe)?;
        ProposalStore::new(conn).create(&proposal)
    })?;

    info!(
        ingredients = recipe.ingredients.len(),
        steps = recipe.process_steps.len(),
        proposal_id = %proposal.id,
        "Recipe submitted for voting"
    );
    Ok(RecipeSubmission { recipe, proposal })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ingredient, ProcessStep, ProposalStatus, Role};
    use chrono::Duration;
    use uuid::Uuid;

    fn member(db: &Database, role: Role) -> Profile {
        let profile = Profile::new(format!("{}@baas.beer", Uuid::new_v4()), role);
        db.profiles().create(&profile).unwrap();
        profile
    }

    fn messy_recipe(author: Uuid) -> Recipe {
        let mut recipe = Recipe::draft("  IPA Tropical ", author);
        recipe.description = Some("Citrus forward".into());
        recipe.ingredients = vec![
            Ingredient::new("Pale malt", "5", "kg"),
            Ingredient::new("", "2", "kg"),
            Ingredient::new("Citra", " ", "g"),
            Ingredient::new("Mosaic", "100", "g"),
        ];
        recipe.process_steps = vec![
            ProcessStep::new(1, "Mash at 66C"),
            ProcessStep::new(2, "   "),
            ProcessStep::new(3, "Boil 60 minutes"),
        ];
        recipe
    }

    #[test]
    fn test_normalize_drops_blank_rows() {
        let recipe = normalize(messy_recipe(Uuid::new_v4()));
        assert_eq!(recipe.name, "IPA Tropical");
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.ingredients[1].name, "Mosaic");
        let steps: Vec<u32> = recipe.process_steps.iter().map(|s| s.step).collect();
        assert_eq!(steps, vec![1, 2]);
        assert_eq!(recipe.process_steps[1].description, "Boil 60 minutes");
    }

    #[test]
    fn test_submit_creates_recipe_and_proposal() {
        let db = Database::open_in_memory().unwrap();
        let brewer = member(&db, Role::Brewer);

        let submission = submit(&db, &brewer, messy_recipe(brewer.id), &VotingConfig::default())
            .unwrap();

        let stored = db.recipes().find_by_id(submission.recipe.id).unwrap().unwrap();
        assert_eq!(stored.status, RecipeStatus::Draft);
        assert_eq!(stored.ingredients.len(), 2);
        assert_eq!(stored.process_steps.len(), 2);

        let proposal = db
            .proposals()
            .find_by_id(submission.proposal.id)
            .unwrap()
            .unwrap();
        assert_eq!(proposal.title, "Recipe: IPA Tropical");
        assert_eq!(proposal.proposal_type, ProposalType::BeerRecipe);
        assert_eq!(proposal.status, ProposalStatus::Active);
        assert_eq!(proposal.option_count(), 3);
        assert_eq!(proposal.options[2].text, "Request changes");
        assert!(proposal.description.ends_with("Citrus forward"));

        let window = proposal.voting_ends_at - proposal.created_at;
        assert_eq!(window, Duration::days(7));
    }

    #[test]
    fn test_investor_cannot_submit() {
        let db = Database::open_in_memory().unwrap();
        let investor = member(&db, Role::Investor);
        let err = submit(&db, &investor, messy_recipe(investor.id), &VotingConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
        assert!(db.recipes().list().unwrap().is_empty());
    }

    #[test]
    fn test_blank_name_rejected() {
        let db = Database::open_in_memory().unwrap();
        let brewer = member(&db, Role::Brewer);
        let err = submit(&db, &brewer, Recipe::draft("   ", brewer.id), &VotingConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(db.proposals().list_active(5).unwrap().is_empty());
    }
}
