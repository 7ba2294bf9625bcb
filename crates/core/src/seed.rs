//! Sample data for a fresh installation

use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Ingredient, ProcessStep, ProposalOption, ProposalType, Recipe, RecipeStatus, VotingProposal,
};
use crate::storage::{Database, ProposalStore, RecipeStore};

/// What a seeding run inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub proposals: usize,
    pub recipes: usize,
}

fn option(text: &str, description: &str) -> ProposalOption {
    ProposalOption::new(text).described(description)
}

fn sample_proposals(creator: Uuid) -> Vec<VotingProposal> {
    vec![
        VotingProposal::open_for_days(
            "Recipe for the October Beer",
            "Choose which beer style we should brew in October",
            ProposalType::BeerRecipe,
            vec![
                option(
                    "Tropical IPA with Mango and Passion Fruit",
                    "A refreshing IPA with tropical fruit",
                ),
                option("Imperial Coffee Stout", "Full-bodied stout with roasted coffee notes"),
                option("Craft Pilsen", "Light, crisp pilsen in the traditional style"),
            ],
            creator,
            7,
        ),
        VotingProposal::open_for_days(
            "Label Design - Limited Edition",
            "Vote on the label design for our next limited edition",
            ProposalType::LabelDesign,
            vec![
                option("Minimalist Art", "Clean and modern design"),
                option("Vintage Illustration", "Retro style with handcrafted elements"),
                option("Contemporary Art", "Bold and colourful design"),
            ],
            creator,
            5,
        ),
        VotingProposal::open_for_days(
            "Brewpub Opening Hours",
            "Set the new opening hours for our brewpub",
            ProposalType::Strategic,
            vec![
                option("Tue-Sun 4pm-12am", "Open Tuesday to Sunday"),
                option("Wed-Sat 5pm-1am", "Open Wednesday to Saturday"),
                option("Thu-Sun 6pm-12am", "Open Thursday to Sunday"),
            ],
            creator,
            3,
        ),
    ]
}

fn steps(descriptions: &[&str]) -> Vec<ProcessStep> {
    descriptions
        .iter()
        .enumerate()
        .map(|(i, d)| ProcessStep::new(i as u32 + 1, *d))
        .collect()
}

fn sample_recipes(creator: Uuid) -> Vec<Recipe> {
    let mut ipa = Recipe::draft("IPA Tropical", creator);
    ipa.description = Some("IPA with tropical notes of mango and passion fruit".into());
    ipa.style = Some("IPA".into());
    ipa.abv = Some(6.5);
    ipa.ibu = Some(65);
    ipa.srm = Some(8);
    ipa.status = RecipeStatus::Approved;
    ipa.ingredients = vec![
        Ingredient::new("Pilsen malt", "5", "kg"),
        Ingredient::new("Caramel malt", "0.5", "kg"),
        Ingredient::new("Citra hops", "50", "g"),
        Ingredient::new("Mosaic hops", "30", "g"),
        Ingredient::new("Mango", "2", "kg"),
        Ingredient::new("Passion fruit", "1", "kg"),
    ];
    ipa.process_steps = steps(&[
        "Mill the malts",
        "Mash at 65C for 60 minutes",
        "Boil for 60 minutes with hop additions",
        "Primary fermentation for 7 days",
        "Add fruit during secondary fermentation",
        "Condition for 14 days",
    ]);

    let mut pilsen = Recipe::draft("Pilsen Artesanal", creator);
    pilsen.description = Some("Light and refreshing pilsen".into());
    pilsen.style = Some("Pilsner".into());
    pilsen.abv = Some(4.8);
    pilsen.ibu = Some(25);
    pilsen.srm = Some(3);
    pilsen.ingredients = vec![
        Ingredient::new("Pilsen malt", "4", "kg"),
        Ingredient::new("Saaz hops", "30", "g"),
        Ingredient::new("Lager yeast", "1", "pack"),
    ];
    pilsen.process_steps = steps(&[
        "Mill the malts",
        "Mash at 62C for 90 minutes",
        "Boil for 60 minutes",
        "Ferment at 12C for 14 days",
        "Condition at 2C for 21 days",
    ]);

    vec![ipa, pilsen]
}

/// Insert the sample proposals and recipes, attributed to the oldest profile.
///
/// Does nothing when no profile exists yet.
#[instrument(skip(db))]
pub fn seed_sample_data(db: &Database) -> Result<SeedReport> {
    let Some(creator) = db.profiles().list()?.into_iter().next() else {
        info!("No profiles yet, skipping sample data");
        return Ok(SeedReport::default());
    };

    let proposals = sample_proposals(creator.id);
    let recipes = sample_recipes(creator.id);

    db.atomically(|conn| {
        let proposal_store = ProposalStore::new(conn);
        for proposal in &proposals {
            proposal_store.create(proposal)?;
        }
        let recipe_store = RecipeStore::new(conn);
        for recipe in &recipes {
            recipe_store.create(recipe)?;
        }
        Ok(())
    })?;

    let report = SeedReport {
        proposals: proposals.len(),
        recipes: recipes.len(),
    };
    info!(
        proposals = report.proposals,
        recipes = report.recipes,
        creator = %creator.email,
        "Sample data inserted"
    );
    Ok(report)
}
