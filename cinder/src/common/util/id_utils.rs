use crate::common::AUTO_ID_LENGTH;
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Generates a random document id of [AUTO_ID_LENGTH] alphanumeric
/// characters (62^20 possible values).
pub fn generate_auto_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LENGTH)
        .map(char::from)
        .collect()
}
