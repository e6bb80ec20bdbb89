//! Twitter access: the followings capability and its REST implementation.

mod api;
mod client;
mod types;

pub use api::FollowingsApi;
pub use client::{TwitterClient, DEFAULT_API_BASE};
pub use types::{ExternalId, FollowingPage, END_CURSOR, START_CURSOR};
