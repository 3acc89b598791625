use rand::{Rng, distributions::Alphanumeric};

/// Generates a random alphanumeric string of the specified length.
///
/// The generated string contains uppercase letters (A-Z), lowercase letters (a-z),
/// and digits (0-9). This function is cryptographically secure and suitable for
/// generating tokens, passwords, or other random identifiers. At 32 characters
/// the result carries roughly 190 bits of entropy.
///
/// # Arguments
///
/// * `length` - The desired length of the generated string
///
/// # Returns
///
/// A `String` containing random alphanumeric characters
pub fn generate_random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
