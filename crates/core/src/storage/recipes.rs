//! Recipe storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_enum, parse_json, parse_uuid, OptionalExt};
use crate::error::Result;
use crate::models::Recipe;

const COLUMNS: &str = "id, name, description, style, abv, ibu, srm, ingredients, process_steps, status, created_by, created_at";

pub struct RecipeStore<'a> {
    conn: &'a Connection,
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Recipe> {
    Ok(Recipe {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        description: row.get(2)?,
        style: row.get(3)?,
        abv: row.get(4)?,
        ibu: row.get(5)?,
        srm: row.get(6)?,
        ingredients: parse_json(&row.get::<_, String>(7)?)?,
        process_steps: parse_json(&row.get::<_, String>(8)?)?,
        status: parse_enum(&row.get::<_, String>(9)?)?,
        created_by: parse_uuid(&row.get::<_, String>(10)?)?,
        created_at: parse_datetime(&row.get::<_, String>(11)?)?,
    })
}

impl<'a> RecipeStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, recipe), fields(name = %recipe.name))]
    pub fn create(&self, recipe: &Recipe) -> Result<()> {
        self.conn.execute(
            "INSERT INTO beer_recipes
             (id, name, description, style, abv, ibu, srm, ingredients, process_steps, status, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                recipe.id.to_string(),
                recipe.name,
                recipe.description,
                recipe.style,
                recipe.abv,
                recipe.ibu,
                recipe.srm,
                serde_json::to_string(&recipe.ingredients)?,
                serde_json::to_string(&recipe.process_steps)?,
                recipe.status.as_str(),
                recipe.created_by.to_string(),
                recipe.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Recipe>> {
        let sql = format!("SELECT {} FROM beer_recipes WHERE id = ?1", COLUMNS);
        let recipe = self
            .conn
            .query_row(&sql, params![id.to_string()], from_row)
            .optional()?;
        Ok(recipe)
    }

    /// All recipes, newest first
    pub fn list(&self) -> Result<Vec<Recipe>> {
        let sql = format!("SELECT {} FROM beer_recipes ORDER BY created_at DESC", COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let recipes = stmt
            .query_map([], from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(recipes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ingredient, ProcessStep, Profile, RecipeStatus, Role};
    use crate::storage::Database;

    #[test]
    fn test_json_columns_survive() {
        let db = Database::open_in_memory().unwrap();
        let author = Profile::new("brewer@baas.beer", Role::Brewer);
        db.profiles().create(&author).unwrap();

        let mut recipe = Recipe::draft("Saison", author.id);
        recipe.abv = Some(6.2);
        recipe.ibu = Some(28);
        recipe.ingredients = vec![Ingredient::new("Pilsen malt", "4", "kg")];
        let mut step = ProcessStep::new(1, "Ferment warm");
        step.temperature = Some("28C".into());
        recipe.process_steps = vec![step];
        db.recipes().create(&recipe).unwrap();

        let found = db.recipes().find_by_id(recipe.id).unwrap().unwrap();
        assert_eq!(found.status, RecipeStatus::Draft);
        assert_eq!(found.abv, Some(6.2));
        assert_eq!(found.ingredients, recipe.ingredients);
        assert_eq!(found.process_steps[0].temperature.as_deref(), Some("28C"));
        assert!(db.recipes().find_by_id(Uuid::new_v4()).unwrap().is_none());
    }
}
