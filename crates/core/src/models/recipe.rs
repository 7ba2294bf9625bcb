//! Beer recipe model

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecipeStatus {
    Draft,
    Voting,
    Approved,
    Rejected,
}

impl RecipeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeStatus::Draft => "DRAFT",
            RecipeStatus::Voting => "VOTING",
            RecipeStatus::Approved => "APPROVED",
            RecipeStatus::Rejected => "REJECTED",
        }
    }
}

impl FromStr for RecipeStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(RecipeStatus::Draft),
            "VOTING" => Ok(RecipeStatus::Voting),
            "APPROVED" => Ok(RecipeStatus::Approved),
            "REJECTED" => Ok(RecipeStatus::Rejected),
            other => Err(Error::Validation(format!("unknown recipe status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub amount: String,
    pub unit: String,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, amount: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount: amount.into(),
            unit: unit.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty() || self.amount.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessStep {
    pub step: u32,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl ProcessStep {
    pub fn new(step: u32, description: impl Into<String>) -> Self {
        Self {
            step,
            description: description.into(),
            temperature: None,
            duration: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub style: Option<String>,
    pub abv: Option<f64>,
    pub ibu: Option<u32>,
    pub srm: Option<u32>,
    pub ingredients: Vec<Ingredient>,
    pub process_steps: Vec<ProcessStep>,
    pub status: RecipeStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    pub fn draft(name: impl Into<String>, created_by: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            style: None,
            abv: None,
            ibu: None,
            srm: None,
            ingredients: Vec::new(),
            process_steps: Vec::new(),
            status: RecipeStatus::Draft,
            created_by,
            created_at: Utc::now(),
        }
    }
}
