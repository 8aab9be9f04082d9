use serde_derive::{Serialize, Deserialize};

pub mod aggregate;
pub mod bgg;
pub mod cache;
pub mod core;
pub mod db;
pub mod diff;
pub mod locale;
pub mod ranking;
pub mod report;

pub type GameId = u32; // bgg thing id
pub type Member = String; // user name

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct GameInfo {
    pub name: String,
    pub is_expansion: bool
}

/// Reduced ratings of one game across the guild.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct GameStats {
    pub game_id: GameId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub rating_count: u32,
    pub mean_rating: f64,
    pub stdev_rating: f64
}

impl GameStats {
    /// Same stats under a resolved name.
    pub fn named(&self, name: &str) -> GameStats {
        GameStats { name: Some(name.to_string()), ..self.clone() }
    }

    pub fn display_name(&self) -> String {
        match &self.name {
            Some(n) => n.clone(),
            None => format!("#{}", self.game_id)
        }
    }
}
