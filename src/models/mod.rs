pub mod follow;
pub mod plugin;
pub mod skill;
pub mod user;
pub mod waitlist;

pub use follow::Follow;
pub use plugin::Plugin;
pub use skill::{Skill, SkillFile, SkillVersion};
pub use user::{User, UserProfile};
pub use waitlist::WaitlistEntry;
