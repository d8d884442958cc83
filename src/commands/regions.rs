//! Known regions and their network metadata

use super::Session;
use crate::output::Envelope;

pub fn run(session: &Session) -> Envelope {
    Envelope::ok(&session.regions)
}
