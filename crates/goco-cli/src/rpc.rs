//! The client/daemon wire protocol: one JSON object per line.

use serde::{Deserialize, Serialize};

use goco_common::BuildEnv;
use goco_engine::Candidate;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    AutoComplete {
        filename: String,
        /// Source text. Files are assumed UTF-8; the client substitutes
        /// replacement characters otherwise.
        source: String,
        /// Byte offset of the cursor; negative means "no cursor".
        cursor: isize,
        env: BuildEnv,
    },
    /// Shut the daemon down.
    Exit,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AutoCompleteReply {
    pub candidates: Vec<Candidate>,
    /// Bytes of trailing text the completion replaces.
    pub len: usize,
}
