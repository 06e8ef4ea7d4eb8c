//! Proposal investigators.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvestigatorKind {
    Pi,
    Coi,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investigator {
    pub person_name: String,
    #[serde(rename = "type")]
    pub kind: InvestigatorKind,
    #[serde(default)]
    pub for_phd: bool,
}

/// Number of principal investigators, derived from the current list on demand.
pub fn pi_count(investigators: &[Investigator]) -> usize {
    investigators
        .iter()
        .filter(|i| i.kind == InvestigatorKind::Pi)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn investigator(name: &str, kind: InvestigatorKind) -> Investigator {
        Investigator {
            person_name: name.to_string(),
            kind,
            for_phd: false,
        }
    }

    #[test]
    fn test_pi_count_tracks_list() {
        let mut list = vec![
            investigator("A. Observer", InvestigatorKind::Pi),
            investigator("B. Student", InvestigatorKind::Coi),
        ];
        assert_eq!(pi_count(&list), 1);

        list.push(investigator("C. Second", InvestigatorKind::Pi));
        assert_eq!(pi_count(&list), 2);

        list.retain(|i| i.kind != InvestigatorKind::Pi);
        assert_eq!(pi_count(&list), 0);
    }

    #[test]
    fn test_kind_wire_names() {
        let json = r#"{"personName":"X","type":"COI"}"#;
        let parsed: Investigator = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.kind, InvestigatorKind::Coi);
        assert!(!parsed.for_phd);
    }
}
