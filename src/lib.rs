pub mod app;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod discover;
pub mod feed;
pub mod format;
pub mod full_player;
pub mod input;
pub mod media;
pub mod mpv;
pub mod navigation;
pub mod ranking;
pub mod short_player;
pub mod theme;
pub mod timers;
pub mod ui;
pub mod watchlist;
