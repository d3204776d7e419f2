//! Session id and email token extraction from user-supplied text.
//!
//! Users paste whatever their browser or mail client gives them, so both
//! extractors tolerate several shapes. The session id is strict (it
//! addresses third-party state and a wrong id burns nothing — the protocol
//! rejects it); the email token is deliberately lax and falls back to the
//! input verbatim so unknown future link formats still work.

use crate::error::ExtractionError;
use regex::Regex;
use std::sync::OnceLock;

/// Session ids are 24 lowercase hex characters.
const SESSION_ID_LEN: usize = 24;

fn query_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"verificationId=([0-9a-f]+)").unwrap())
}

fn path_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/verification/([0-9a-f]+)").unwrap())
}

fn token_res() -> &'static [Regex; 4] {
    static RES: OnceLock<[Regex; 4]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            Regex::new(r"[?&]emailToken=(\d+)").unwrap(),
            Regex::new(r"[?&]token=(\d+)").unwrap(),
            Regex::new(r"/token/(\d+)").unwrap(),
            Regex::new(r"[?&]t=(\d+)").unwrap(),
        ]
    })
}

/// Pull the verification session id out of a free-form URL.
///
/// A `verificationId=` query value wins over a `/verification/{id}` path
/// segment when both are present. Candidates that are not exactly 24 hex
/// characters are ignored.
pub fn extract_session_id(url: &str) -> Result<String, ExtractionError> {
    for re in [query_id_re(), path_id_re()] {
        if let Some(caps) = re.captures(url) {
            let id = &caps[1];
            if id.len() == SESSION_ID_LEN {
                return Ok(id.to_string());
            }
        }
    }
    Err(ExtractionError)
}

/// Pull the numeric email token out of step-2 input.
///
/// Accepts a bare token or a URL carrying it under one of the known
/// parameter names. Unrecognized input is returned trimmed, verbatim —
/// the third party is the authority on token validity, not this parser.
pub fn extract_email_token(input: &str) -> String {
    let trimmed = input.trim();
    for re in token_res() {
        if let Some(caps) = re.captures(trimmed) {
            return caps[1].to_string();
        }
    }
    trimmed.to_string()
}
