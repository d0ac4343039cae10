// End-to-end scenarios (spec.md §8 "Concrete end-to-end scenarios").

use std::collections::HashMap;

use mpst::cfsm::Action;
use mpst::config::{PipelineConfig, SimulatorConfig};
use mpst::simulator::{NoOpObserver, SimulationState, Simulator};
use mpst::{pipeline, Role};

fn compile(source: &str, protocol_name: &str) -> pipeline::CompiledProtocol {
    let registry = pipeline::parse(source).expect("parses");
    pipeline::compile(&registry, protocol_name, &PipelineConfig::default()).expect("compiles")
}

fn simulator_for(compiled: &pipeline::CompiledProtocol, protocol_name: &str, config: &SimulatorConfig) -> Simulator {
    let roles: Vec<Role> = compiled.cfsms.keys().cloned().collect();
    let cfsms: HashMap<(String, Role), _> =
        compiled.cfsms.iter().map(|(r, c)| ((protocol_name.to_string(), r.clone()), c.clone())).collect();
    Simulator::new(protocol_name, &roles, cfsms, config.scheduler.clone()).unwrap()
}

#[test]
fn request_response_completes_in_two_steps() {
    let source = "
        global protocol RequestResponse(role Client, role Server) {
            Client -> Server: Req();
            Server -> Client: Res();
        }
    ";
    let compiled = compile(source, "RequestResponse");
    assert!(compiled.report.is_accepted());

    let mut sim = simulator_for(&compiled, "RequestResponse", &SimulatorConfig::default());
    let mut observer = NoOpObserver;
    let state = sim.run(10, &mut observer).unwrap();
    assert_eq!(state, SimulationState::Completed);

    let client_trace: Vec<_> =
        sim.get_traces().iter().filter(|t| t.role == Role::new("Client")).map(|t| t.action.clone()).collect();
    assert!(matches!(&client_trace[0], Action::Send { .. }));
    assert!(matches!(&client_trace[1], Action::Receive { .. }));
}

#[test]
fn two_phase_commit_reaches_agreement() {
    let source = "
        global protocol TwoPhaseCommit(role Coordinator, role Participant) {
            choice at Coordinator {
                Coordinator -> Participant: Commit();
            } or {
                Coordinator -> Participant: Abort();
            }
        }
    ";
    let compiled = compile(source, "TwoPhaseCommit");
    assert!(compiled.report.is_accepted());

    let mut sim = simulator_for(&compiled, "TwoPhaseCommit", &SimulatorConfig::default());
    let mut observer = NoOpObserver;
    let state = sim.run(10, &mut observer).unwrap();
    assert_eq!(state, SimulationState::Completed);

    let labels: Vec<String> = sim
        .get_traces()
        .iter()
        .filter_map(|t| match &t.action {
            Action::Send { message, .. } | Action::Receive { message, .. } => Some(message.label.clone()),
            _ => None,
        })
        .collect();
    assert!(labels.iter().all(|l| l == "Commit") || labels.iter().all(|l| l == "Abort"));
}

#[test]
fn oauth_style_three_role_protocol_reaches_every_terminal() {
    let source = "
        global protocol Login(role Server, role Client, role Authenticator) {
            Server -> Client: LoginRequest();
            Client -> Authenticator: Passwd();
            Authenticator -> Server: Auth();
        }
    ";
    let compiled = compile(source, "Login");
    assert_eq!(compiled.cfsms.len(), 3);

    let mut sim = simulator_for(&compiled, "Login", &SimulatorConfig::default());
    let mut observer = NoOpObserver;
    let state = sim.run(10, &mut observer).unwrap();
    assert_eq!(state, SimulationState::Completed);
}

#[test]
fn ping_pong_with_recursion_and_exit_terminates() {
    let source = "
        global protocol PingPong(role A, role B) {
            rec Loop {
                choice at A {
                    A -> B: Ping();
                    continue Loop;
                } or {
                    A -> B: Done();
                }
            }
        }
    ";
    let compiled = compile(source, "PingPong");
    assert!(compiled.report.is_accepted());

    let mut sim = simulator_for(&compiled, "PingPong", &SimulatorConfig::default());
    let mut observer = NoOpObserver;
    let state = sim.run(100, &mut observer).unwrap();
    assert_eq!(state, SimulationState::Completed);

    let a_labels: Vec<String> = sim
        .get_traces()
        .iter()
        .filter(|t| t.role == Role::new("A"))
        .filter_map(|t| match &t.action {
            Action::Send { message, .. } => Some(message.label.clone()),
            _ => None,
        })
        .collect();
    assert!(a_labels.contains(&"Done".to_string()));
}

#[test]
fn racy_parallel_is_rejected_before_projection() {
    let source = "
        global protocol Racy(role A, role B) {
            par {
                A -> B: M();
            } and {
                A -> B: M();
            }
        }
    ";
    let registry = pipeline::parse(source).unwrap();
    let err = pipeline::compile(&registry, "Racy", &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, mpst::Error::Rejected(_)));
}

#[test]
fn nondeterministic_choice_is_rejected() {
    let source = "
        global protocol Ambiguous(role A, role B) {
            choice at A {
                A -> B: M();
            } or {
                A -> B: M();
            }
        }
    ";
    let registry = pipeline::parse(source).unwrap();
    let err = pipeline::compile(&registry, "Ambiguous", &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, mpst::Error::Rejected(_)));
}

#[test]
fn every_cfsm_has_exactly_one_initial_and_a_terminal() {
    let source = "
        global protocol Simple(role A, role B) {
            A -> B: X();
        }
    ";
    let compiled = compile(source, "Simple");
    for cfsm in compiled.cfsms.values() {
        assert!(!cfsm.terminals.is_empty());
    }
}
