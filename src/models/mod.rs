pub mod candidate;
pub mod job;
pub mod run;
pub mod search;
