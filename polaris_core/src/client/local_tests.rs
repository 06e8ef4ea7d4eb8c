#[cfg(test)]
mod tests {
    use crate::client::{ClientError, LocalProposalToolApi, ProposalToolApi};
    use crate::models::{
        AllocatedBlock, AllocatedBlockId, AllocatedProposalId, CycleId, FieldKind,
        ObservationConfiguration, ObservationKey,
    };

    const CYCLE: CycleId = CycleId(1);
    const PROPOSAL: AllocatedProposalId = AllocatedProposalId(7);

    #[tokio::test]
    async fn test_default_catalog_is_seeded() {
        let api = LocalProposalToolApi::with_default_catalog().unwrap();

        let names = api.telescope_names().await.unwrap();
        assert_eq!(names.len(), 14);
        assert_eq!(names[0], "TCS");

        let catalog = api.telescope_schemas().await.unwrap();
        let dolores = catalog.instrument("TNG", "DOLORES").unwrap();
        assert_eq!(dolores.field("instrumentMode").unwrap().kind, FieldKind::List);
        assert!(catalog.instrument("LT", "IOI").unwrap().field("telescopeHours").is_some());
        assert!(catalog.telescope("CFHT").unwrap().instruments().next().is_none());
    }

    #[tokio::test]
    async fn test_save_load_delete_configuration() {
        let api = LocalProposalToolApi::new();
        let key = ObservationKey::new(3, 11);
        assert!(api.load_configuration(key).await.unwrap().is_none());

        let cfg = ObservationConfiguration::new(key, "TNG", "GIANO-B")
            .with_element("instrumentComments", "needs AO");
        assert!(api.save_configuration(&cfg).await.unwrap());
        assert_eq!(api.load_configuration(key).await.unwrap(), Some(cfg));

        assert!(api.delete_configuration(key).await.unwrap());
        assert!(!api.delete_configuration(key).await.unwrap());
        assert_eq!(api.request_count("delete_configuration"), 2);
    }

    #[tokio::test]
    async fn test_totals_are_summed_from_blocks() {
        let api = LocalProposalToolApi::new();
        api.insert_block(CYCLE, PROPOSAL, AllocatedBlock::new("telescope", 10.0, "ModeA", "Grade1"));
        api.insert_block(
            CYCLE,
            AllocatedProposalId(8),
            AllocatedBlock::new("telescope", 2.5, "ModeA", "Grade1"),
        );
        api.insert_block(CYCLE, PROPOSAL, AllocatedBlock::new("telescope", 5.0, "ModeA", "Grade2"));
        api.insert_block(CycleId(2), PROPOSAL, AllocatedBlock::new("telescope", 99.0, "ModeA", "Grade1"));

        let totals = api.observing_time_totals(CYCLE).await.unwrap();
        assert_eq!(totals.len(), 2);
        let a1 = totals
            .iter()
            .find(|t| t.mode_name == "ModeA" && t.grade_name == "Grade1")
            .unwrap();
        assert_eq!(a1.total_time, 12.5);
    }

    #[tokio::test]
    async fn test_update_amount_respects_remaining() {
        let api = LocalProposalToolApi::new();
        let id = api.insert_block(CYCLE, PROPOSAL, AllocatedBlock::new("telescope", 4.0, "ModeA", "Grade1"));
        api.set_remaining(CYCLE, "telescope", 6.0);

        api.update_resource_amount(CYCLE, PROPOSAL, id, 9.0).await.unwrap();
        assert_eq!(api.resource_remaining(CYCLE, "telescope").await.unwrap(), 1.0);

        let err = api
            .update_resource_amount(CYCLE, PROPOSAL, id, 20.0)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation { .. }));

        let err = api
            .update_resource_amount(CYCLE, PROPOSAL, id, -1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation { .. }));

        let blocks = api.allocated_blocks(CYCLE, PROPOSAL).await.unwrap();
        assert_eq!(blocks[0].amount, 9.0);
    }

    #[tokio::test]
    async fn test_update_unknown_block_is_not_found() {
        let api = LocalProposalToolApi::new();
        let err = api
            .update_resource_amount(CYCLE, PROPOSAL, AllocatedBlockId(42), 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_injected_failure_until_cleared() {
        let api = LocalProposalToolApi::new();
        api.inject_failure("telescope_names", 500, "boom");

        let err = api.telescope_names().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.context().operation.as_deref(), Some("telescope_names"));

        api.clear_failure("telescope_names");
        assert!(api.telescope_names().await.is_ok());
        assert_eq!(api.request_count("telescope_names"), 2);
    }

    #[tokio::test]
    async fn test_request_log_is_bounded() {
        let api = LocalProposalToolApi::new();
        api.set_request_log_limit(3);
        for _ in 0..4 {
            api.telescope_names().await.unwrap();
        }
        api.polaris_mode().await.unwrap();

        let operations: Vec<String> = api.requests().into_iter().map(|r| r.operation).collect();
        assert_eq!(operations, vec!["telescope_names", "telescope_names", "polaris_mode"]);

        api.set_request_log_limit(0);
        assert!(api.requests().is_empty());
        api.telescope_names().await.unwrap();
        assert_eq!(api.request_count("telescope_names"), 0);
    }
}
