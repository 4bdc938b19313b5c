use serde::{Deserialize, Serialize};

/// Charging Collection Function / Event Charging Function addresses,
/// propagated to every IRS of a subscriber via a Push-Profile-Request.
///
/// `refreshed_at` is the write's origin timestamp (unix millis); the merge
/// rule for a racing CAS write is last-refreshed-wins, so both sides of a
/// conflict compare this field rather than the address lists themselves.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChargingAddresses {
    pub ccf: Vec<String>,
    pub ecf: Vec<String>,
    pub refreshed_at: i64,
}

impl ChargingAddresses {
    pub fn new(ccf: Vec<String>, ecf: Vec<String>, refreshed_at: i64) -> Self {
        Self {
            ccf,
            ecf,
            refreshed_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ccf.is_empty() && self.ecf.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_addresses_report_empty() {
        assert!(ChargingAddresses::default().is_empty());
    }

    #[test]
    fn non_empty_addresses_report_non_empty() {
        let addrs = ChargingAddresses::new(vec!["ccf1".into()], vec![], 100);
        assert!(!addrs.is_empty());
    }
}
