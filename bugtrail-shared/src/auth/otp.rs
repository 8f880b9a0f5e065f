/// One-time code generation and verification
///
/// Registration and password-reset flows email the user a 6-digit code that
/// is valid for 10 minutes. The code and its expiry are stored on the user
/// record and cleared once the flow completes.
///
/// Verification here is a pure function over the stored pair; callers fetch
/// the user, check the submitted code against it, and then perform the
/// state transition (mark verified, or accept the new password).

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// How long a freshly issued code stays valid
pub const OTP_TTL_MINUTES: i64 = 10;

/// Outcome of checking a submitted code against the stored one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpCheck {
    /// Code matches and has not expired
    Valid,

    /// Code does not match the stored one, or no code is pending
    Mismatch,

    /// Code matches but its validity window has passed
    Expired,
}

/// Generates a random 6-digit code
///
/// Zero-padded, so "004217" is a possible output. Codes are compared as
/// strings end to end.
pub fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", n)
}

/// Computes the expiry timestamp for a code issued now
pub fn expiry_from_now() -> DateTime<Utc> {
    Utc::now() + Duration::minutes(OTP_TTL_MINUTES)
}

/// Checks a submitted code against the stored code and expiry
///
/// A missing stored code or expiry means no flow is in progress, which is
/// reported as `Mismatch` so callers can return the same error as for a
/// wrong code.
pub fn check_code(
    submitted: &str,
    stored: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
) -> OtpCheck {
    let (Some(stored), Some(expires_at)) = (stored, expires_at) else {
        return OtpCheck::Mismatch;
    };

    if submitted != stored {
        return OtpCheck::Mismatch;
    }

    if Utc::now() >= expires_at {
        return OtpCheck::Expired;
    }

    OtpCheck::Valid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code_shape() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_check_code_valid() {
        let expiry = Utc::now() + Duration::minutes(5);
        assert_eq!(
            check_code("123456", Some("123456"), Some(expiry)),
            OtpCheck::Valid
        );
    }

    #[test]
    fn test_check_code_mismatch() {
        let expiry = Utc::now() + Duration::minutes(5);
        assert_eq!(
            check_code("000000", Some("123456"), Some(expiry)),
            OtpCheck::Mismatch
        );
    }

    #[test]
    fn test_check_code_expired() {
        let expiry = Utc::now() - Duration::seconds(1);
        assert_eq!(
            check_code("123456", Some("123456"), Some(expiry)),
            OtpCheck::Expired
        );
    }

    #[test]
    fn test_check_code_no_pending_flow() {
        assert_eq!(check_code("123456", None, None), OtpCheck::Mismatch);
        assert_eq!(
            check_code("123456", Some("123456"), None),
            OtpCheck::Mismatch
        );
    }

    #[test]
    fn test_expiry_from_now_window() {
        let expiry = expiry_from_now();
        let delta = expiry - Utc::now();
        assert!(delta <= Duration::minutes(OTP_TTL_MINUTES));
        assert!(delta > Duration::minutes(OTP_TTL_MINUTES - 1));
    }
}
