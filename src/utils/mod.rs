pub mod logger;
pub mod io;
pub mod report;
