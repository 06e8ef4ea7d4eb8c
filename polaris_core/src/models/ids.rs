//! Database identifiers used by the proposal tool backend.

crate::define_id_type!(i64, ProposalId);
crate::define_id_type!(i64, ObservationId);
crate::define_id_type!(i64, CycleId);
crate::define_id_type!(i64, AllocatedProposalId);
crate::define_id_type!(i64, AllocatedBlockId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_conversion() {
        let id = ProposalId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(i64::from(id), 42);
        assert_eq!(ObservationId::from(7).value(), 7);
    }

    #[test]
    fn test_id_from_str() {
        assert_eq!("15".parse::<CycleId>().unwrap(), CycleId(15));
        assert_eq!(" 3 ".parse::<ObservationId>().unwrap(), ObservationId(3));

        let err = "abc".parse::<ProposalId>().unwrap_err();
        assert!(err.contains("ProposalId"));
    }
}
