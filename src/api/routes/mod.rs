pub mod conf;
pub mod health;
pub mod history;
pub mod report;
