//! Accounts, sessions' subjects and the social graph: signup, identity
//! provider login/linking, waitlist capture, profiles and follows.

use crate::auth::TokenVerifier;
use crate::error::AppError;
use crate::models::{Follow, Skill, SkillFile, User, WaitlistEntry};
use crate::services::registry;
use crate::storage::Storage;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub display_name: String,
    pub email: String,
}

/// Self-serve signup. Usernames are lowercased handles of at least two
/// characters; emails are lowercased and must look like an address.
pub async fn signup(storage: &Storage, request: SignupRequest) -> Result<User, AppError> {
    let username = request.username.trim().to_lowercase();
    let display_name = request.display_name.trim().to_string();
    let email = request.email.trim().to_lowercase();

    if username.len() < 2 {
        return Err(AppError::Validation(
            "username must be at least 2 characters".to_string(),
        ));
    }
    if display_name.is_empty() {
        return Err(AppError::Validation("display name is required".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::Validation("valid email is required".to_string()));
    }

    let user = User::new(username, display_name, Some(email));
    storage.users.create(&user)?;
    Ok(user)
}

/// Waitlist capture. Duplicate emails are accepted without error.
pub async fn join_waitlist(storage: &Storage, email: &str) -> Result<(), AppError> {
    let email = email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::Validation("valid email is required".to_string()));
    }

    let entry = WaitlistEntry::new(email);
    storage.waitlist.add(&entry)?;
    Ok(())
}

/// Identity-provider login. Resolves the credential to a subject +
/// email, then finds the account by subject, links by email, or creates
/// a new account (which requires a username).
pub async fn login_with_token(
    storage: &Storage,
    verifier: &dyn TokenVerifier,
    credential: &str,
    username: Option<&str>,
    display_name: Option<&str>,
) -> Result<User, AppError> {
    let identity = verifier.verify(credential)?;
    let email = identity
        .email
        .ok_or_else(|| AppError::Validation("no email in credential".to_string()))?;

    if let Some(user) = storage.users.get_by_subject(&identity.subject)? {
        return Ok(user);
    }

    if let Some(mut user) = storage.users.get_by_email(&email)? {
        // First provider login for an existing account: link the subject.
        user.subject_id = Some(identity.subject);
        user.updated_at = chrono::Utc::now().timestamp_millis();
        storage.users.update(&user)?;
        info!(user_id = %user.id, "linked identity provider subject");
        return Ok(user);
    }

    let username = username
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::Validation("username required for new accounts".to_string()))?
        .to_lowercase();
    let display_name = display_name
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(&username)
        .to_string();

    let mut user = User::new(username, display_name, Some(email));
    user.subject_id = Some(identity.subject);
    storage.users.create(&user)?;
    info!(user_id = %user.id, "created account from provider login");
    Ok(user)
}

/// Plain username login.
pub async fn login_with_username(storage: &Storage, username: &str) -> Result<User, AppError> {
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return Err(AppError::Validation("username required".to_string()));
    }
    storage
        .users
        .get_by_username(&username)?
        .ok_or(AppError::NotFound("User"))
}

pub async fn follow(
    storage: &Storage,
    follower_id: &str,
    username: &str,
) -> Result<(), AppError> {
    let target = storage
        .users
        .get_by_username(username)?
        .ok_or(AppError::NotFound("User"))?;
    if target.id == follower_id {
        return Err(AppError::Validation("cannot follow yourself".to_string()));
    }

    let edge = Follow::new(follower_id.to_string(), target.id);
    storage.follows.create(&edge)?;
    Ok(())
}

pub async fn unfollow(
    storage: &Storage,
    follower_id: &str,
    username: &str,
) -> Result<(), AppError> {
    let target = storage
        .users
        .get_by_username(username)?
        .ok_or(AppError::NotFound("User"))?;
    storage.follows.delete(follower_id, &target.id)?;
    Ok(())
}

/// A skill row on a public profile, carrying its resolved version.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSkill {
    pub name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub installs: u64,
    pub version: String,
    pub content_hash: String,
    pub files: Vec<SkillFile>,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfilePage {
    pub username: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub verified: bool,
    pub topics: Vec<String>,
    pub skills: Vec<ProfileSkill>,
}

/// Public profile page data: the user plus each of their skills with
/// its current version resolved.
pub async fn profile(storage: &Storage, username: &str) -> Result<ProfilePage, AppError> {
    let user = storage
        .users
        .get_by_username(username)?
        .ok_or(AppError::NotFound("User"))?;

    let mut skills = Vec::new();
    for skill in storage.skills.list_by_author(&user.id)? {
        let version = registry::current_version(storage, &skill)?;
        skills.push(ProfileSkill {
            name: skill.name,
            title: skill.title,
            description: skill.description,
            category: skill.category,
            installs: skill.installs,
            version: version.version,
            content_hash: version.content_hash,
            files: version.files,
            updated_at: skill.updated_at,
        });
    }

    Ok(ProfilePage {
        username: user.username,
        display_name: user.display_name,
        bio: user.bio,
        avatar_url: user.avatar_url,
        verified: user.verified,
        topics: user.topics,
        skills,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub profile: User,
    pub skills: Vec<Skill>,
    pub total_installs: u64,
    pub followers: u64,
    pub following: u64,
}

/// The signed-in user's own stats page.
pub async fn dashboard(storage: &Storage, user_id: &str) -> Result<Dashboard, AppError> {
    let profile = storage
        .users
        .get(user_id)?
        .ok_or(AppError::NotFound("User"))?;
    let skills = storage.skills.list_by_author(user_id)?;
    let total_installs = skills.iter().map(|s| s.installs).sum();
    let followers = storage.follows.count_followers(user_id)?;
    let following = storage.follows.count_following(user_id)?;

    Ok(Dashboard {
        profile,
        skills,
        total_installs,
        followers,
        following,
    })
}
