pub mod algolia;
pub mod automate;
pub mod contentstack;
pub mod opportunities;
pub mod personalize;
pub mod query_parser;
