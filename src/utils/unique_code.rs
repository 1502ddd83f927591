use rand::Rng;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
pub const UNIQUE_CODE_LENGTH: usize = 10;

/// Public product code printed in QR links. Uniqueness is left to the database.
pub fn generate_unique_code() -> String {
    let mut rng = rand::rng();

    (0..UNIQUE_CODE_LENGTH)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_ten_alphanumerics() {
        for _ in 0..200 {
            let code = generate_unique_code();
            assert_eq!(code.len(), UNIQUE_CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn codes_vary() {
        assert_ne!(generate_unique_code(), generate_unique_code());
    }
}
