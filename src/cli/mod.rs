pub mod convert;
pub mod currencies;
pub mod history;
pub mod session;
pub mod setup;
pub mod swap;
pub mod theme;
pub mod ui;
