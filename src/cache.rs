use crate::bgg::RatingsSource;
use crate::core::RegulationToken;
use crate::{GameId, GameInfo};
use failure::{Error, bail};
use std::collections::HashMap;
use std::thread;

/// Static game metadata seen so far. Entries are never evicted or refreshed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameInfoCache {
    entries: HashMap<GameId, GameInfo>
}

impl GameInfoCache {
    pub fn new() -> GameInfoCache {
        GameInfoCache::default()
    }

    pub fn from_entries(entries: HashMap<GameId, GameInfo>) -> GameInfoCache {
        GameInfoCache { entries }
    }

    pub fn get(&self, game_id: GameId) -> Option<&GameInfo> {
        self.entries.get(&game_id)
    }

    pub fn insert(&mut self, game_id: GameId, info: GameInfo) {
        self.entries.insert(game_id, info);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&GameId, &GameInfo)> {
        self.entries.iter()
    }

    /// Cached info, or asks the source until the token stops.
    /// Running out of attempts is fatal for the caller.
    pub fn resolve<S: RatingsSource + ?Sized>(&mut self, game_id: GameId, source: &S,
            mut tkn: RegulationToken, mut on_err: impl FnMut(Error)) -> Result<GameInfo, Error> {
        if let Some(info) = self.entries.get(&game_id) {
            return Ok(info.clone());
        }
        let mut last_err = String::new();
        loop {
            if tkn.is_stopped() {
                bail!("Can't get info for game {}: {}", game_id, last_err);
            }
            thread::sleep(tkn.delay());
            match source.game_info(game_id) {
                Ok(info) => {
                    self.entries.insert(game_id, info.clone());
                    return Ok(info);
                },
                Err(e) => {
                    tkn.harden();
                    last_err = e.to_string();
                    on_err(e);
                }
            }
        }
    }
}
