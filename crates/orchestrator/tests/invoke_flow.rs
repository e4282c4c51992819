mod harness;

use harness::*;
use ledger_orchestrator::{
    DeliveryError, DeliveryPhase, EndorsementVerdict, InvokeStatus, OrchestrationConfig, OrchestrationConfigBuilder,
    OrchestrationError,
};
use ledger_protocols::{approve_for_my_org_spec, envelope_tx_id, query_committed_spec, ChaincodeDefinition};
use ledger_types::{Proposal, TransactionSpec, TxValidationCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const VALID: ObserverBehavior = ObserverBehavior::Report(TxValidationCode::Valid);

fn spec(key: &str) -> TransactionSpec {
    TransactionSpec::new("basic").with_version("1.0").with_args(["set", key, "value"])
}

fn observers(sequencer: &Arc<MockSequencer>, behaviors: &[ObserverBehavior]) -> Vec<Arc<MockObserver>> {
    behaviors
        .iter()
        .enumerate()
        .map(|(i, behavior)| Arc::new(MockObserver::new(&format!("peer{}:7051", i), *behavior, sequencer)))
        .collect()
}

fn released(observers: &[Arc<MockObserver>]) -> usize {
    observers.iter().map(|o| o.counters().released()).sum()
}

fn opened(observers: &[Arc<MockObserver>]) -> usize {
    observers.iter().map(|o| o.counters().opened()).sum()
}

#[tokio::test]
async fn test_two_endorsers_commit() {
    let sequencer = Arc::new(MockSequencer::new());
    let endorsers = vec![
        Arc::new(MockEndorser::new("peer0:7051", 200, b"P")),
        Arc::new(MockEndorser::new("peer1:7051", 200, b"P")),
    ];
    let observers = observers(&sequencer, &[VALID, VALID]);
    let service = service(OrchestrationConfig::default(), &endorsers, &observers, &sequencer);

    let receipt = service.submit_and_confirm(&spec("k1"), CHANNEL).await.unwrap();

    assert_eq!(receipt.status, InvokeStatus::Committed);
    let response = receipt.response.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.response.payload, b"P".to_vec());

    let submitted = sequencer.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(envelope_tx_id(&submitted[0]).unwrap(), receipt.tx_id);

    assert_eq!(opened(&observers), 2);
    assert_eq!(released(&observers), 2);
}

#[tokio::test]
async fn test_rejected_endorsement_is_not_submitted() {
    let sequencer = Arc::new(MockSequencer::new());
    let endorsers = vec![Arc::new(MockEndorser::new("peer0:7051", 500, b"boom"))];
    let observers = observers(&sequencer, &[VALID]);
    let service = service(OrchestrationConfig::default(), &endorsers, &observers, &sequencer);

    let receipt = service.submit_and_confirm(&spec("k1"), CHANNEL).await.unwrap();

    assert_eq!(receipt.status, InvokeStatus::Rejected);
    assert_eq!(receipt.response.unwrap().status(), 500);
    assert!(sequencer.submitted().is_empty());
    assert_eq!(opened(&observers), 0);
}

#[tokio::test(start_paused = true)]
async fn test_silent_observer_times_out_at_deadline() {
    let sequencer = Arc::new(MockSequencer::new());
    let endorsers = vec![Arc::new(MockEndorser::new("peer0:7051", 200, b"P"))];
    let observers = observers(&sequencer, &[VALID, ObserverBehavior::Silent]);
    let config = OrchestrationConfigBuilder::new()
        .delivery_timeout(Duration::from_secs(2))
        .build();
    let service = service(config, &endorsers, &observers, &sequencer);

    let start = Instant::now();
    let err = service.submit_and_confirm(&spec("k1"), CHANNEL).await.unwrap_err();
    let elapsed = start.elapsed();

    assert!(matches!(
        err,
        OrchestrationError::DeliveryWait(DeliveryError::Timeout { phase: DeliveryPhase::Wait })
    ));
    assert!(elapsed >= Duration::from_secs(2), "returned early after {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(2100), "returned late after {:?}", elapsed);
    assert_eq!(sequencer.submitted().len(), 1);

    settle().await;
    assert_eq!(released(&observers), 2);
}

#[tokio::test(start_paused = true)]
async fn test_caller_deadline_overrides_configured_timeout() {
    let sequencer = Arc::new(MockSequencer::new());
    let endorsers = vec![Arc::new(MockEndorser::new("peer0:7051", 200, b"P"))];
    let observers = observers(&sequencer, &[ObserverBehavior::Silent]);
    let service = service(OrchestrationConfig::default(), &endorsers, &observers, &sequencer);

    let start = Instant::now();
    let err = service
        .submit_and_confirm_until(&spec("k1"), CHANNEL, start + Duration::from_secs(1))
        .await
        .unwrap_err();
    let elapsed = start.elapsed();

    assert!(matches!(
        err,
        OrchestrationError::DeliveryWait(DeliveryError::Timeout { phase: DeliveryPhase::Wait })
    ));
    assert!(elapsed >= Duration::from_secs(1), "returned early after {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(1100), "returned late after {:?}", elapsed);
    assert_eq!(sequencer.submitted().len(), 1);
}

#[tokio::test]
async fn test_single_invalidation_fails_invoke() {
    let sequencer = Arc::new(MockSequencer::new());
    let endorsers = vec![Arc::new(MockEndorser::new("peer0:7051", 200, b"P"))];
    let observers = observers(
        &sequencer,
        &[VALID, ObserverBehavior::Report(TxValidationCode::MvccReadConflict), VALID],
    );
    let service = service(OrchestrationConfig::default(), &endorsers, &observers, &sequencer);

    let err = service.submit_and_confirm(&spec("k1"), CHANNEL).await.unwrap_err();

    match err {
        OrchestrationError::DeliveryWait(DeliveryError::Invalidated { address, code, .. }) => {
            assert_eq!(address, "peer1:7051");
            assert_eq!(code, TxValidationCode::MvccReadConflict);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(released(&observers), 3);
}

#[tokio::test]
async fn test_stream_end_before_target_fails_invoke() {
    let sequencer = Arc::new(MockSequencer::new());
    let endorsers = vec![Arc::new(MockEndorser::new("peer0:7051", 200, b"P"))];
    let observers = observers(&sequencer, &[VALID, ObserverBehavior::EndStream(503)]);
    let service = service(OrchestrationConfig::default(), &endorsers, &observers, &sequencer);

    let err = service.submit_and_confirm(&spec("k1"), CHANNEL).await.unwrap_err();
    assert!(matches!(
        err,
        OrchestrationError::DeliveryWait(DeliveryError::Protocol { .. })
    ));
}

#[tokio::test]
async fn test_concurrent_invokes_are_independent() {
    let sequencer = Arc::new(MockSequencer::new());
    let endorsers = vec![
        Arc::new(MockEndorser::new("peer0:7051", 200, b"P")),
        Arc::new(MockEndorser::new("peer1:7051", 200, b"P")),
    ];
    let observers = observers(&sequencer, &[VALID, VALID]);
    let service = service(OrchestrationConfig::default(), &endorsers, &observers, &sequencer);

    let first_spec = spec("k1");
    let second_spec = spec("k2");
    let (first, second) = tokio::join!(
        service.submit_and_confirm(&first_spec, CHANNEL),
        service.submit_and_confirm(&second_spec, CHANNEL),
    );
    let first = first.unwrap();
    let second = second.unwrap();

    assert_ne!(first.tx_id, second.tx_id);
    assert_eq!(first.status, InvokeStatus::Committed);
    assert_eq!(second.status, InvokeStatus::Committed);
    assert_eq!(sequencer.submitted().len(), 2);

    // One delivery group per invocation, each with its own streams
    assert_eq!(opened(&observers), 4);
    assert_eq!(released(&observers), 4);
}

#[tokio::test]
async fn test_endorser_transport_error_fails_invoke() {
    let sequencer = Arc::new(MockSequencer::new());
    let endorsers = vec![
        Arc::new(MockEndorser::new("peer0:7051", 200, b"P")),
        Arc::new(MockEndorser::unreachable("peer1:7051")),
    ];
    let observers = observers(&sequencer, &[VALID]);
    let service = service(OrchestrationConfig::default(), &endorsers, &observers, &sequencer);

    let err = service.submit_and_confirm(&spec("k1"), CHANNEL).await.unwrap_err();

    assert!(matches!(err, OrchestrationError::Endorsement(_)));
    assert!(sequencer.submitted().is_empty());
    assert_eq!(opened(&observers), 0);
}

#[tokio::test]
async fn test_connect_failure_aborts_before_submission() {
    let sequencer = Arc::new(MockSequencer::new());
    let endorsers = vec![Arc::new(MockEndorser::new("peer0:7051", 200, b"P"))];
    let observers = observers(&sequencer, &[VALID, ObserverBehavior::Refuse]);
    let service = service(OrchestrationConfig::default(), &endorsers, &observers, &sequencer);

    let err = service.submit_and_confirm(&spec("k1"), CHANNEL).await.unwrap_err();

    assert!(matches!(
        err,
        OrchestrationError::DeliveryConnect(DeliveryError::Transport(_))
    ));
    assert!(sequencer.submitted().is_empty());
    assert_eq!(released(&observers), opened(&observers));
}

#[tokio::test]
async fn test_submission_failure_carries_response() {
    let sequencer = Arc::new(MockSequencer::failing());
    let endorsers = vec![Arc::new(MockEndorser::new("peer0:7051", 200, b"P"))];
    let observers = observers(&sequencer, &[VALID]);
    let service = service(OrchestrationConfig::default(), &endorsers, &observers, &sequencer);

    let err = service.submit_and_confirm(&spec("k1"), CHANNEL).await.unwrap_err();

    match err {
        OrchestrationError::Submission { response, .. } => assert_eq!(response.status(), 200),
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(opened(&observers), 1);
    assert_eq!(released(&observers), 1);
}

#[tokio::test]
async fn test_submit_without_waiting() {
    let sequencer = Arc::new(MockSequencer::new());
    let endorsers = vec![Arc::new(MockEndorser::new("peer0:7051", 200, b"P"))];
    let observers = observers(&sequencer, &[ObserverBehavior::Silent]);
    let config = OrchestrationConfigBuilder::new().wait_for_commit(false).build();
    let service = service(config, &endorsers, &observers, &sequencer);

    let receipt = service.submit_and_confirm(&spec("k1"), CHANNEL).await.unwrap();

    assert_eq!(receipt.status, InvokeStatus::Submitted);
    assert_eq!(sequencer.submitted().len(), 1);
    assert_eq!(opened(&observers), 0);
}

#[tokio::test]
async fn test_inconsistent_endorsements_fail_assembly() {
    let sequencer = Arc::new(MockSequencer::new());
    let endorsers = vec![
        Arc::new(MockEndorser::new("peer0:7051", 200, b"P")),
        Arc::new(MockEndorser::new("peer1:7051", 200, b"Q")),
    ];
    let observers = observers(&sequencer, &[VALID]);
    let service = service(OrchestrationConfig::default(), &endorsers, &observers, &sequencer);

    let err = service.submit_and_confirm(&spec("k1"), CHANNEL).await.unwrap_err();

    assert!(matches!(err, OrchestrationError::Assembly(_)));
    assert!(sequencer.submitted().is_empty());
}

#[tokio::test]
async fn test_evaluate_never_submits() {
    let sequencer = Arc::new(MockSequencer::new());
    let endorser = Arc::new(MockEndorser::new("peer0:7051", 200, br#"{"name":"basic"}"#));
    let observers = observers(&sequencer, &[VALID]);
    let service = service(
        OrchestrationConfig::default(),
        std::slice::from_ref(&endorser),
        &observers,
        &sequencer,
    );

    let query = query_committed_spec(Some("basic")).unwrap();
    let verdict = service.evaluate(&query, CHANNEL).await.unwrap();

    match verdict {
        EndorsementVerdict::Accepted(response) => assert_eq!(response.response.payload, br#"{"name":"basic"}"#.to_vec()),
        other => panic!("unexpected verdict {:?}", other),
    }
    assert!(sequencer.submitted().is_empty());
    assert_eq!(opened(&observers), 0);

    let received = endorser.received();
    assert_eq!(received.len(), 1);
    let proposal: Proposal = ledger_types::from_wire(&received[0].proposal_bytes).unwrap();
    assert_eq!(proposal.payload.input.chaincode_id.name, "_lifecycle");
    assert_eq!(proposal.payload.input.input.args[0], b"QueryChaincodeDefinition".to_vec());
}

#[tokio::test]
async fn test_approve_definition_is_submitted_and_confirmed() {
    let sequencer = Arc::new(MockSequencer::new());
    let endorser = Arc::new(MockEndorser::new("peer0:7051", 200, b""));
    let observers = observers(&sequencer, &[VALID, VALID]);
    let service = service(
        OrchestrationConfig::default(),
        std::slice::from_ref(&endorser),
        &observers,
        &sequencer,
    );

    let definition = ChaincodeDefinition::new("basic", "1.0", 1);
    let approve = approve_for_my_org_spec(&definition, Some("basic_1.0:abc")).unwrap();
    let receipt = service.submit_and_confirm(&approve, CHANNEL).await.unwrap();

    assert_eq!(receipt.status, InvokeStatus::Committed);
    assert_eq!(sequencer.submitted().len(), 1);
    assert_eq!(released(&observers), 2);

    let proposal: Proposal = ledger_types::from_wire(&endorser.received()[0].proposal_bytes).unwrap();
    assert_eq!(proposal.payload.input.chaincode_id.name, "_lifecycle");
    assert_eq!(
        proposal.payload.input.input.args[0],
        b"ApproveChaincodeDefinitionForMyOrg".to_vec()
    );
}
