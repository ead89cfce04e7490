// Library root
// -----------
// The binary (`main.rs`) only does bootstrap; everything it runs lives here
// so it can be driven from tests with a mocked API.
//
// Module responsibilities:
// - `api`: blocking Strava client, wire types and the `UploadApi` /
//   `AthleteApi` seams.
// - `config`: command line / environment configuration.
// - `files`: finding activity files in a directory.
// - `upload`: per-file upload, status polling and the run report.
// - `waiting`: sleeping between remote calls.
// - `error`: the error taxonomy shared by all of the above.
pub mod api;
pub mod config;
pub mod error;
pub mod files;
pub mod upload;
pub mod waiting;

pub use error::Error;
