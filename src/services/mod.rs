pub mod classifier;
pub mod fetcher;
pub mod loader;
pub mod m3u_parser;
pub mod metrics;
pub mod xmltv;
pub mod xtream;
