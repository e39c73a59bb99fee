//! Small shared helpers.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Generates a random alphanumeric token of the given length, used to make
/// consumer and connection names collision-resistant across process
/// restarts and between concurrent consumers sharing a tag.
pub(crate) fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_has_requested_length_and_is_alphanumeric() {
        let token = random_token(6);
        assert_eq!(token.len(), 6);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn tokens_are_not_trivially_repeated() {
        let a = random_token(6);
        let b = random_token(6);
        assert_ne!(a, b, "two random 6-char tokens collided — suspicious");
    }
}
