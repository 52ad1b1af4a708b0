pub mod api;
pub mod booking;
pub mod conversation;
pub mod info;
pub mod intent;
pub mod knowledge;
pub mod sessions;
pub mod slots;
