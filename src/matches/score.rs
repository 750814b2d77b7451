use std::collections::HashSet;

use crate::profiles::Profile;

/// Awarded when both sides are looking for the same thing.
pub const SHARED_GOAL_BONUS: u32 = 30;
/// Awarded per interest tag both sides list.
pub const SHARED_INTEREST_POINTS: u32 = 10;
pub const MIN_PERCENTAGE: u32 = 10;
pub const MAX_PERCENTAGE: u32 = 99;

/// The parts of a profile the recommender scores on.
#[derive(Debug, Clone, Copy)]
pub struct Preferences<'a> {
    pub looking_for: &'a str,
    pub interests: &'a [String],
}

impl<'a> From<&'a Profile> for Preferences<'a> {
    fn from(profile: &'a Profile) -> Self {
        Self {
            looking_for: &profile.looking_for,
            interests: &profile.interests,
        }
    }
}

/// Stored values are already trimmed by the directory.
fn same_goal(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && a.to_lowercase() == b.to_lowercase()
}

pub fn shared_interests(a: &[String], b: &[String]) -> usize {
    let a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let b: HashSet<&str> = b.iter().map(String::as_str).collect();
    a.intersection(&b).count()
}

pub fn raw_score(me: Preferences<'_>, other: Preferences<'_>) -> u32 {
    let goal = if same_goal(me.looking_for, other.looking_for) { SHARED_GOAL_BONUS } else { 0 };
    let shared = u32::try_from(shared_interests(me.interests, other.interests)).unwrap_or(u32::MAX);
    goal.saturating_add(shared.saturating_mul(SHARED_INTEREST_POINTS))
}

pub fn match_percentage(me: Preferences<'_>, other: Preferences<'_>) -> u32 {
    raw_score(me, other).clamp(MIN_PERCENTAGE, MAX_PERCENTAGE)
}
