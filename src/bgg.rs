use failure::{Error, ResultExt, bail};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use select::document::Document;
use select::predicate::Name;
use crate::aggregate::MemberRatings;
use crate::{GameId, GameInfo, Member};

const API_ROOT: &str = "https://boardgamegeek.com/xmlapi2";
const EXPANSION_TYPE: &str = "boardgameexpansion";

/// Where guild members, their ratings and game metadata come from.
/// Every call may fail, callers decide whether to retry.
pub trait RatingsSource {
    fn group_members(&self, group_id: u32) -> Result<Vec<Member>, Error>;
    fn member_ratings(&self, member: &Member) -> Result<MemberRatings, Error>;
    fn game_info(&self, game_id: GameId) -> Result<GameInfo, Error>;
}

pub struct BggClient {
    client: Client,
    token: Option<String>
}

impl BggClient {
    pub fn new(token: Option<String>) -> BggClient {
        BggClient { client: Client::new(), token }
    }

    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Document, Error> {
        let url = format!("{}/{}", API_ROOT, path);
        let mut req = self.client.get(&url).query(query);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req.send()
            .with_context(|_| format!("could not download page `{}` {:?}", url, query))?;
        // bgg answers 202 while it queues a collection
        if resp.status() != StatusCode::OK {
            bail!("Can't get `{}` {:?}. Status: {}", url, query, resp.status());
        }
        let doc = Document::from_read(resp)?;
        Ok(doc)
    }
}

impl RatingsSource for BggClient {
    fn group_members(&self, group_id: u32) -> Result<Vec<Member>, Error> {
        let mut members = Vec::new();
        for page in MemberPages::new(self, group_id) {
            members.extend(page?);
        }
        Ok(members)
    }

    fn member_ratings(&self, member: &Member) -> Result<MemberRatings, Error> {
        let query = [
            ("username", member.clone()),
            ("rated", "1".to_string()),
            ("stats", "1".to_string()),
        ];
        filter_ratings(&self.get("collection", &query)?)
    }

    fn game_info(&self, game_id: GameId) -> Result<GameInfo, Error> {
        let query = [("id", game_id.to_string())];
        filter_game_info(&self.get("thing", &query)?, game_id)
    }
}

/// Walks the pages of a guild member list until a page comes back empty.
pub struct MemberPages<'a> {
    client: &'a BggClient,
    group_id: u32,
    page: u32,
    done: bool
}

impl<'a> MemberPages<'a> {
    pub fn new(client: &'a BggClient, group_id: u32) -> MemberPages<'a> {
        MemberPages { client, group_id, page: 0, done: false }
    }
}

impl<'a> Iterator for MemberPages<'a> {
    type Item = Result<Vec<Member>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.page += 1;
        let query = [
            ("id", self.group_id.to_string()),
            ("members", "1".to_string()),
            ("page", self.page.to_string()),
        ];
        let members = self.client.get("guild", &query).and_then(|doc| filter_members(&doc));
        match members {
            Ok(ref m) if m.is_empty() => {
                self.done = true;
                None
            },
            Ok(m) => Some(Ok(m)),
            Err(e) => {
                // Error will be elevated and next() will never be called again
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn filter_members(doc: &Document) -> Result<Vec<Member>, Error> {
    let mut members = Vec::new();
    for tag in doc.find(Name("member")) {
        match tag.attr("name") {
            Some(n) => members.push(String::from(n)),
            None => bail!("Can't parse member name in the guild list")
        }
    }
    Ok(members)
}

fn filter_ratings(doc: &Document) -> Result<MemberRatings, Error> {
    let mut ratings = MemberRatings::new();
    for item in doc.find(Name("item")) {
        let id = match item.attr("objectid") {
            Some(id) => id.parse::<GameId>()?,
            None => bail!("Can't parse game id in the collection")
        };
        let rating = item.find(Name("rating")).next()
            .and_then(|r| r.attr("value"))
            .and_then(|v| v.parse::<f64>().ok());
        // unrated items carry "N/A"
        if let Some(r) = rating {
            ratings.insert(id, r);
        }
    }
    Ok(ratings)
}

fn filter_game_info(doc: &Document, game_id: GameId) -> Result<GameInfo, Error> {
    let item = match doc.find(Name("item")).next() {
        Some(i) => i,
        None => bail!("No such game: {}", game_id)
    };
    let name = item.find(Name("name"))
        .find(|n| n.attr("type") == Some("primary"))
        .and_then(|n| n.attr("value"));
    let name = match name {
        Some(n) => String::from(n),
        None => bail!("Can't find primary name of {}", game_id)
    };
    Ok(GameInfo {
        name,
        is_expansion: item.attr("type") == Some(EXPANSION_TYPE)
    })
}
