pub mod auth;
pub mod comments;
pub mod friends;
pub mod health;
pub mod likes;
pub mod notifications;
pub mod posts;
pub mod shares;
