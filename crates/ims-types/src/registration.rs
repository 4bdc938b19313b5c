use serde::{Deserialize, Serialize};

/// Registration state of a default IMPU record.
///
/// Ordered for conflict resolution so that `REGISTERED > UNREGISTERED >
/// NOT_REGISTERED`: an observation of registration is strictly newer evidence
/// than a no-registration snapshot, and a racing CAS write must never regress
/// it (see `ims_cache::engine::merge_registration_state`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationState {
    NotRegistered,
    Unregistered,
    Registered,
}

impl RegistrationState {
    fn rank(self) -> u8 {
        match self {
            RegistrationState::NotRegistered => 0,
            RegistrationState::Unregistered => 1,
            RegistrationState::Registered => 2,
        }
    }
}

impl PartialOrd for RegistrationState {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RegistrationState {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_outranks_unregistered_and_not_registered() {
        assert!(RegistrationState::Registered > RegistrationState::Unregistered);
        assert!(RegistrationState::Unregistered > RegistrationState::NotRegistered);
        assert!(RegistrationState::Registered > RegistrationState::NotRegistered);
    }

    #[test]
    fn max_of_two_states_picks_more_registered() {
        let a = RegistrationState::NotRegistered;
        let b = RegistrationState::Registered;
        assert_eq!(a.max(b), RegistrationState::Registered);
    }
}
