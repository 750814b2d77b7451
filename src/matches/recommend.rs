use std::collections::HashSet;

use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    profiles::{directory, Profile, PublicProfile},
    AppResult,
};

use super::{ledger, registry, score};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(flatten)]
    pub profile: PublicProfile,
    pub match_percentage: u32,
}

/// Ranked candidates for `user_id`: everyone except the user, anyone they have
/// a request with in either direction, and their existing matches.
pub async fn recommend(db_pool: &SqlitePool, user_id: Uuid) -> AppResult<Vec<Candidate>> {
    let me = directory::require(db_pool, user_id).await?;

    let mut excluded: HashSet<Uuid> = ledger::related_users(db_pool, user_id).await?.into_iter().collect();
    excluded.extend(registry::partners(db_pool, user_id).await?);
    excluded.insert(user_id);

    let population = directory::list(db_pool).await?;
    let ranked = rank(&me, population, &excluded);

    tracing::debug!(user_id = %user_id, excluded = excluded.len(), candidates = ranked.len(), "ranked candidates");
    Ok(ranked)
}

/// Scores everyone not in `excluded` and sorts by percentage, highest first.
/// Equal percentages keep `population` order.
pub fn rank(me: &Profile, population: Vec<Profile>, excluded: &HashSet<Uuid>) -> Vec<Candidate> {
    let mut ranked: Vec<Candidate> = population
        .into_iter()
        .filter(|candidate| !excluded.contains(&candidate.id))
        .map(|candidate| {
            let match_percentage = score::match_percentage(me.into(), (&candidate).into());
            Candidate {
                profile: candidate.into(),
                match_percentage,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.match_percentage.cmp(&a.match_percentage));
    ranked
}

#[cfg(test)]
mod tests {
    use crate::{db, profiles::Role};

    use super::*;

    fn person(name: &str, looking_for: &str, interests: &[&str]) -> Profile {
        Profile {
            id: Uuid::now_v7(),
            name: name.to_owned(),
            username: name.to_lowercase(),
            email: format!("{}@example.com", name.to_lowercase()),
            age: 30,
            gender: "other".to_owned(),
            role: Role::User,
            bio: String::new(),
            interests: interests.iter().map(|t| t.to_string()).collect(),
            looking_for: looking_for.to_owned(),
            profile_photo: directory::DEFAULT_PROFILE_PHOTO.to_owned(),
            created_at: db::now(),
        }
    }

    #[test]
    fn sorts_descending_and_keeps_ties_in_fetch_order() {
        let me = person("Me", "dating", &["music", "chess"]);
        let low = person("Low", "friends", &[]);
        let tie_first = person("TieFirst", "dating", &[]);
        let high = person("High", "dating", &["music", "chess"]);
        let tie_second = person("TieSecond", "DATING", &[]);

        let ranked = rank(
            &me,
            vec![low.clone(), tie_first.clone(), high.clone(), tie_second.clone()],
            &HashSet::from([me.id]),
        );

        let order: Vec<&str> = ranked.iter().map(|c| c.profile.name.as_str()).collect();
        assert_eq!(order, vec!["High", "TieFirst", "TieSecond", "Low"]);
        let percentages: Vec<u32> = ranked.iter().map(|c| c.match_percentage).collect();
        assert_eq!(percentages, vec![50, 30, 30, 10]);
    }

    #[test]
    fn excluded_ids_never_appear() {
        let me = person("Me", "dating", &[]);
        let other = person("Other", "dating", &[]);
        let ranked = rank(&me, vec![me.clone(), other.clone()], &HashSet::from([me.id, other.id]));
        assert!(ranked.is_empty());
    }

    #[test]
    fn candidate_json_is_flat() {
        let me = person("Me", "dating", &[]);
        let other = person("Other", "dating", &[]);
        let ranked = rank(&me, vec![other], &HashSet::new());
        let json = serde_json::to_value(&ranked[0]).unwrap();
        assert_eq!(json["name"], "Other");
        assert_eq!(json["matchPercentage"], 30);
    }
}
