use rand::Rng;

use crate::threadrand::SecureRng;

pub struct Otp {}

impl Otp {
    pub fn generate(length: usize) -> String {
        let mut rng = SecureRng;
        (0..length)
            .map(|_| (b'0' + rng.gen_range(0..10)) as char)
            .collect()
    }

    pub fn are_equal(given: &str, saved: &str) -> bool {
        let given = given.as_bytes();
        let saved = saved.as_bytes();

        if given.len() != saved.len() {
            return false;
        }

        let mut otps_dont_match = 0u8;

        // Do bitwise comparison to prevent timing attacks
        for (i, saved_char) in saved.iter().enumerate() {
            unsafe {
                otps_dont_match |= saved_char ^ given.get_unchecked(i);
            }
        }

        otps_dont_match == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_all_digits() {
        let otp = Otp::generate(6);
        assert_eq!(otp.len(), 6);
        assert!(otp.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_verify() {
        let otp = Otp::generate(6);
        assert!(Otp::are_equal(&otp, &otp));

        let mut different = String::from(&otp);
        let first = different.remove(0);
        different.insert(0, if first == '0' { '1' } else { '0' });
        assert!(!Otp::are_equal(&otp, &different));

        assert!(!Otp::are_equal(&otp, &otp[..5]));

        let mut longer_otp = String::from(&otp);
        longer_otp.push('9');
        assert!(!Otp::are_equal(&otp, &longer_otp));
    }
}
