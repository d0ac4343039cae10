// Property-based tests for projection and simulation (spec.md §8
// "Property-based tests").

use std::collections::HashMap;

use proptest::prelude::*;

use mpst::ast::{GlobalProtocol, Interaction, MessageSignature, Role, Span};
use mpst::config::PipelineConfig;
use mpst::simulator::{NoOpObserver, SimulationState, Simulator};
use mpst::{cfsm::Action, pipeline, registry::ProtocolRegistry};

/// Builds a well-formed linear global protocol over `n` roles: role `i`
/// sends to role `i+1`, ending with the last role sending back to the
/// first. Every generated protocol is, by construction, self-communication
/// free, race-free (no `par`), and choice-deterministic (no `choice`).
fn linear_ring_protocol(labels: &[String]) -> GlobalProtocol {
    let n = labels.len();
    let roles: Vec<Role> = (0..n).map(|i| Role::new(format!("R{i}"))).collect();

    let mut body = Vec::new();
    for i in 0..n {
        let sender = roles[i].clone();
        let receiver = roles[(i + 1) % n].clone();
        body.push(Interaction::MessageTransfer {
            sender,
            receivers: vec![receiver],
            message: MessageSignature::new(labels[i].clone(), Vec::new()),
            span: Span::synthetic(),
        });
    }

    GlobalProtocol { name: "Ring".to_string(), roles, parameters: Vec::new(), body, span: Span::synthetic() }
}

fn label_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-zA-Z0-9]{0,6}".prop_map(|s| s.to_string())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// For a randomly generated well-formed ring protocol, the synchronous
    /// product of every role's CFSM, simulated over FIFO transport, always
    /// terminates without deadlock.
    #[test]
    fn ring_protocol_terminates_without_deadlock(
        labels in prop::collection::vec(label_strategy(), 2..6)
            .prop_filter("distinct labels", |v| v.iter().collect::<std::collections::HashSet<_>>().len() == v.len())
    ) {
        let protocol = linear_ring_protocol(&labels);
        let mut registry = ProtocolRegistry::new();
        registry.insert(protocol);

        let compiled = pipeline::compile(&registry, "Ring", &PipelineConfig::default()).unwrap();
        prop_assert!(compiled.report.is_accepted());

        let roles: Vec<Role> = compiled.cfsms.keys().cloned().collect();
        let cfsms: HashMap<(String, Role), _> =
            compiled.cfsms.iter().map(|(r, c)| (("Ring".to_string(), r.clone()), c.clone())).collect();
        let mut sim = Simulator::new("Ring", &roles, cfsms, mpst::simulator::Scheduler::round_robin()).unwrap();

        let mut observer = NoOpObserver;
        let state = sim.run(labels.len() * 4, &mut observer).unwrap();
        prop_assert_eq!(state, SimulationState::Completed);
    }

    /// For any interleaving the scheduler picks, each role's observed trace
    /// of send/receive labels matches that role's projection: a sender's
    /// trace is exactly its own outgoing labels in protocol order, and a
    /// receiver's trace is exactly its own incoming labels in protocol order.
    #[test]
    fn trace_matches_projection(
        labels in prop::collection::vec(label_strategy(), 2..5)
            .prop_filter("distinct labels", |v| v.iter().collect::<std::collections::HashSet<_>>().len() == v.len())
    ) {
        let protocol = linear_ring_protocol(&labels);
        let mut registry = ProtocolRegistry::new();
        registry.insert(protocol);

        let compiled = pipeline::compile(&registry, "Ring", &PipelineConfig::default()).unwrap();
        let roles: Vec<Role> = compiled.cfsms.keys().cloned().collect();
        let cfsms: HashMap<(String, Role), _> =
            compiled.cfsms.iter().map(|(r, c)| (("Ring".to_string(), r.clone()), c.clone())).collect();
        let mut sim = Simulator::new("Ring", &roles, cfsms, mpst::simulator::Scheduler::random()).unwrap();

        let mut observer = NoOpObserver;
        sim.run(labels.len() * 4, &mut observer).unwrap();

        let n = labels.len();
        for i in 0..n {
            let role = Role::new(format!("R{i}"));
            let sent: Vec<String> = sim
                .get_traces()
                .iter()
                .filter(|t| t.role == role)
                .filter_map(|t| match &t.action {
                    Action::Send { message, .. } => Some(message.label.clone()),
                    _ => None,
                })
                .collect();
            prop_assert_eq!(sent, vec![labels[i].clone()]);

            let received: Vec<String> = sim
                .get_traces()
                .iter()
                .filter(|t| t.role == role)
                .filter_map(|t| match &t.action {
                    Action::Receive { message, .. } => Some(message.label.clone()),
                    _ => None,
                })
                .collect();
            let expected_received = labels[(i + n - 1) % n].clone();
            prop_assert_eq!(received, vec![expected_received]);
        }
    }
}
