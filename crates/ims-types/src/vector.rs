use serde::{Deserialize, Serialize};

/// An authentication vector returned by a Multimedia-Auth-Answer: either SIP
/// digest material or 3G/LTE AKA challenge material. The core stores and
/// forwards this opaquely; it never validates a challenge/response itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "kebab-case")]
pub enum AuthVector {
    Digest {
        realm: String,
        qop: String,
        ha1: String,
    },
    Aka {
        challenge: String,
        response: String,
        crypt_key: String,
        integrity_key: String,
    },
}

impl AuthVector {
    pub fn scheme(&self) -> &'static str {
        match self {
            AuthVector::Digest { .. } => "digest",
            AuthVector::Aka { .. } => "aka",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_vector_reports_its_scheme() {
        let av = AuthVector::Digest {
            realm: "example.com".into(),
            qop: "auth".into(),
            ha1: "deadbeef".into(),
        };
        assert_eq!(av.scheme(), "digest");
    }

    #[test]
    fn aka_vector_round_trips_through_json() {
        let av = AuthVector::Aka {
            challenge: "c".into(),
            response: "r".into(),
            crypt_key: "ck".into(),
            integrity_key: "ik".into(),
        };
        let json = serde_json::to_string(&av).unwrap();
        let back: AuthVector = serde_json::from_str(&json).unwrap();
        assert_eq!(av, back);
    }
}
