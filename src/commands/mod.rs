pub mod app;
pub mod calendar;
pub mod config;
pub mod invite;
pub mod login;
pub mod logout;
pub mod search;
pub mod users;
pub mod whoami;
